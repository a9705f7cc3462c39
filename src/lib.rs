// src/lib.rs
//! notion2site library: syncs Notion databases into static JSON feeds and
//! image assets for a community website.
//!
//! # Public API
//!
//! The library exposes types organized by concern:
//! - **Error handling**: `AppError`, `DownloadError`, `TransformError`
//! - **Configuration**: `CommandLineInput`, `RunConfig`
//! - **Remote model**: `RemoteRecord`, `PropertyValue`
//! - **API client**: `NotionClient`, `NotionHttpClient`, `NotionTransport`
//! - **Images**: `ImageSource`, `ImageTranscoder`, `Variant`
//! - **Feeds**: `FeedSync`, `SyncContext`, the four feed runners
//! - **Write-back**: `PendingWriteUpdate`, `apply_pending_file`

pub mod api;
pub mod concurrency;
pub mod config;
pub mod constants;
pub mod error;
pub mod error_recovery;
pub mod feeds;
pub mod images;
pub mod model;
pub mod output;
pub mod pipeline;
pub mod types;
pub mod writeback;

// --- Error Handling ---
pub use crate::error::{AppError, DownloadError, NotionErrorCode, TransformError};
pub use crate::types::ValidationError;

// --- Configuration ---
pub use crate::config::{Command, CommandLineInput, RunConfig, Task};

// --- Remote Model ---
pub use crate::model::{PropertyKind, PropertyValue, RemoteRecord};

// --- Domain Types ---
pub use crate::types::{ApiKey, ConcurrencyLimit, DatabaseId, PropertyName, RecordId};

// --- API Client ---
pub use crate::api::{
    collect_all, DatabaseQuery, HttpMethod, NotionClient, NotionHttpClient, NotionTransport,
    RawResponse, SortDirection, TransportError,
};
pub use crate::error_recovery::RetryPolicy;

// --- Images ---
pub use crate::images::{
    HttpImageSource, ImageAsset, ImageMagick, ImageSource, ImageTranscoder, Variant,
};

// --- Feeds ---
pub use crate::feeds::{
    FailurePolicy, FaqFeed, Feed, GalleryFeed, ProjectFeed, SyncContext, SyncReport, TeamFeed,
    WriteBackMode,
};
pub use crate::output::SiteLayout;
pub use crate::pipeline::{feed_sync, FeedSync};

// --- Write-back ---
pub use crate::writeback::{apply_pending_file, ApplySummary, PendingWriteUpdate, PropertyWrite};
