// src/output/mod.rs
//! Where a sync run's artifacts land inside the site checkout, and the
//! only place that writes feed JSON to disk.

mod paths;
mod writer;

pub use paths::{AssetDir, SiteLayout};
pub use writer::{reset_dir, write_json_pretty};
