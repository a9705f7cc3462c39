//! The four content feeds and the orchestration they share.
//!
//! Every feed run follows the same sequence: query the database, reset the
//! feed's image directories, map records through the bounded runner,
//! partition failures according to the feed's [`FailurePolicy`], write the
//! feed JSON and finally handle staged write-backs per [`WriteBackMode`].

pub mod faq;
pub mod gallery;
pub mod projects;
pub mod team;

use crate::api::NotionClient;
use crate::error::AppError;
use crate::images::{ImageSource, ImageTranscoder};
use crate::model::RemoteRecord;
use crate::output::{write_json_pretty, SiteLayout};
use crate::types::{ConcurrencyLimit, PropertyName};
use crate::writeback::{
    apply_updates, write_pending_file, ApplySummary, PendingWriteUpdate, PropertyWrite,
};
use serde::Serialize;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

pub use faq::{FaqFeed, FaqItem, FaqSchema};
pub use gallery::{GalleryFeed, GalleryItem, GallerySchema};
pub use projects::{Project, ProjectFeed, ProjectSchema, ProjectStatus, Screenshot};
pub use team::{Role, SocialLinks, TeamFeed, TeamMember, TeamSchema};

/// Log tag of the deferred team link apply run.
pub const APPLY_TEAM_LINKS_TAG: &str = "apply-notion-team-links";

/// Pending write-back file of the team feed, relative to the site root.
pub const TEAM_PENDING_UPDATES_FILE: &str = "src/data/team.pending-link-updates.json";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Feed {
    Team,
    Projects,
    Gallery,
    Faq,
}

impl Feed {
    pub const ALL: [Feed; 4] = [Feed::Team, Feed::Projects, Feed::Gallery, Feed::Faq];

    /// Prefix of every log line a run of this feed emits.
    pub fn log_tag(self) -> &'static str {
        match self {
            Feed::Team => "sync-notion-team",
            Feed::Projects => "sync-notion-projects",
            Feed::Gallery => "sync-notion-gallery",
            Feed::Faq => "sync-notion-faq",
        }
    }

    /// Environment variable naming the feed's database.
    pub fn database_env_var(self) -> &'static str {
        match self {
            Feed::Team => "NOTION_TEAM_DATABASE_ID",
            Feed::Projects => "NOTION_PROJECTS_DATABASE_ID",
            Feed::Gallery => "NOTION_GALLERY_DATABASE_ID",
            Feed::Faq => "NOTION_FAQ_DATABASE_ID",
        }
    }
}

impl fmt::Display for Feed {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Feed::Team => "team",
            Feed::Projects => "projects",
            Feed::Gallery => "gallery",
            Feed::Faq => "faq",
        };
        write!(f, "{}", name)
    }
}

/// What a run does with records that failed to map.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailurePolicy {
    /// Any failure, or an empty result, aborts the run before output.
    Strict,
    /// Failures are logged and the affected records omitted.
    BestEffort,
}

/// When staged write-backs reach Notion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WriteBackMode {
    /// Right after the feed JSON is written.
    Inline,
    /// Saved to this file (relative paths resolve against the site root)
    /// for a later `apply-updates` run.
    Deferred(PathBuf),
}

/// Everything a feed run talks to.
#[derive(Clone)]
pub struct SyncContext {
    pub client: NotionClient,
    pub images: Arc<dyn ImageSource>,
    pub transcoder: Arc<dyn ImageTranscoder>,
    pub layout: SiteLayout,
    pub concurrency: ConcurrencyLimit,
    /// Pause between consecutive inline write-backs.
    pub write_back_pacing: Duration,
}

/// Summary of one completed feed run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncReport {
    pub feed: Feed,
    pub output: PathBuf,
    /// Records returned by the database query.
    pub attempted: usize,
    pub written: usize,
    pub excluded: usize,
    /// Records that were omitted, or published without some of their
    /// images, because of an error.
    pub failed: usize,
    /// One message per error, naming the record.
    pub failures: Vec<String>,
    pub staged_updates: usize,
    /// Present when write-backs were applied inline.
    pub applied: Option<ApplySummary>,
}

/// Result of mapping one record.
#[derive(Debug)]
pub(crate) enum RecordOutcome<T> {
    /// Ready for output. Non-empty `warnings` mark a record published
    /// without some of its assets.
    Mapped {
        record: T,
        update: Option<PendingWriteUpdate>,
        warnings: Vec<String>,
    },
    /// Not eligible for output; already logged by the mapper.
    Excluded,
    /// Mapping failed; the message names the record.
    Failed(String),
}

impl<T> RecordOutcome<T> {
    pub(crate) fn mapped(record: T) -> Self {
        RecordOutcome::Mapped {
            record,
            update: None,
            warnings: Vec::new(),
        }
    }
}

/// Mapped records in input order plus everything that was left out.
#[derive(Debug)]
pub(crate) struct Partitioned<T> {
    pub records: Vec<T>,
    pub updates: Vec<PendingWriteUpdate>,
    pub excluded: usize,
    pub failures: Vec<String>,
    /// Published records that carried warnings.
    pub degraded: usize,
    pub warnings: Vec<String>,
}

pub(crate) fn partition<T>(outcomes: Vec<RecordOutcome<T>>) -> Partitioned<T> {
    let mut partitioned = Partitioned {
        records: Vec::new(),
        updates: Vec::new(),
        excluded: 0,
        failures: Vec::new(),
        degraded: 0,
        warnings: Vec::new(),
    };

    for outcome in outcomes {
        match outcome {
            RecordOutcome::Mapped {
                record,
                update,
                warnings,
            } => {
                partitioned.records.push(record);
                partitioned
                    .updates
                    .extend(update.filter(|u| !u.is_empty()));
                if !warnings.is_empty() {
                    partitioned.degraded += 1;
                    partitioned.warnings.extend(warnings);
                }
            }
            RecordOutcome::Excluded => partitioned.excluded += 1,
            RecordOutcome::Failed(message) => partitioned.failures.push(message),
        }
    }

    partitioned
}

impl<T> Partitioned<T> {
    pub(crate) fn attempted(&self) -> usize {
        self.records.len() + self.excluded + self.failures.len()
    }

    pub(crate) fn failed(&self) -> usize {
        self.failures.len() + self.degraded
    }

    /// Applies the failure policy. Strict feeds fail on any failure or on
    /// an empty result; best-effort feeds carry on and report the failures
    /// once the feed is written.
    pub(crate) fn enforce(&self, policy: FailurePolicy, feed: Feed) -> Result<(), AppError> {
        match policy {
            FailurePolicy::Strict => {
                if self.records.is_empty() {
                    return Err(AppError::EmptyFeed);
                }
                if !self.failures.is_empty() {
                    return Err(AppError::FeedIncomplete {
                        failures: self.failures.clone(),
                    });
                }
            }
            FailurePolicy::BestEffort => {
                if self.records.is_empty() {
                    log::warn!("[{}] No records were synced from Notion.", feed.log_tag());
                }
            }
        }
        Ok(())
    }
}

/// Numbers records 1..=n in their current order.
pub(crate) fn assign_ids<T>(records: &mut [T], set_id: impl Fn(&mut T, usize)) {
    for (index, record) in records.iter_mut().enumerate() {
        set_id(record, index + 1);
    }
}

/// Writes the feed JSON and handles write-backs, producing the run report.
pub(crate) async fn finish<T: Serialize>(
    ctx: &SyncContext,
    feed: Feed,
    output: PathBuf,
    partitioned: Partitioned<T>,
    write_back: &WriteBackMode,
) -> Result<SyncReport, AppError> {
    let tag = feed.log_tag();
    write_json_pretty(&output, &partitioned.records)?;
    log_summary(tag, &partitioned);

    let applied = match write_back {
        WriteBackMode::Inline => {
            if partitioned.updates.is_empty() {
                None
            } else {
                let summary = apply_updates(
                    &ctx.client,
                    &partitioned.updates,
                    ctx.write_back_pacing,
                    tag,
                )
                .await;
                log::info!(
                    "[{}] Updated {}/{} Notion page(s).",
                    tag,
                    summary.updated,
                    summary.attempted
                );
                Some(summary)
            }
        }
        WriteBackMode::Deferred(path) => {
            let path = ctx.layout.root().join(path);
            write_pending_file(&path, &partitioned.updates)?;
            log::info!(
                "[{}] Pending Notion link updates: {}",
                tag,
                partitioned.updates.len()
            );
            None
        }
    };

    let attempted = partitioned.attempted();
    let failed = partitioned.failed();
    let Partitioned {
        records,
        updates,
        excluded,
        mut failures,
        warnings,
        ..
    } = partitioned;
    failures.extend(warnings);

    Ok(SyncReport {
        feed,
        output,
        attempted,
        written: records.len(),
        excluded,
        failed,
        failures,
        staged_updates: updates.len(),
        applied,
    })
}

/// `Synced x/y` over the query results, then every error by record.
fn log_summary<T>(tag: &str, partitioned: &Partitioned<T>) {
    let clean = partitioned.records.len() - partitioned.degraded;
    log::info!(
        "[{}] Synced {}/{} record(s).",
        tag,
        clean,
        partitioned.attempted()
    );
    if partitioned.excluded > 0 {
        log::info!("[{}] Excluded: {}", tag, partitioned.excluded);
    }

    let failed = partitioned.failed();
    if failed == 0 {
        return;
    }
    log::warn!("[{}] {} record(s) had errors:", tag, failed);
    for message in partitioned.failures.iter().chain(&partitioned.warnings) {
        log::warn!("[{}]   - {}", tag, message);
    }
}

/// A link write-back typed to the target property's schema type.
///
/// Returns `None`, with a warning, when the record has no such property or
/// it cannot hold a link.
pub(crate) fn typed_link_write(
    record: &RemoteRecord,
    property: &PropertyName,
    link: &str,
    tag: &str,
) -> Option<PropertyWrite> {
    let write = record
        .property(property)
        .and_then(|p| PropertyWrite::for_kind(p.kind(), link));
    if write.is_none() {
        log::warn!(
            "[{}] Page {}: \"{}\" property missing or invalid type. Cannot update it.",
            tag,
            record.id,
            property
        );
    }
    write
}

/// Stores downloaded bytes, creating the parent directory if needed.
pub(crate) async fn store_bytes(path: &Path, bytes: &[u8]) -> std::io::Result<()> {
    if let Some(parent) = path.parent() {
        tokio::fs::create_dir_all(parent).await?;
    }
    tokio::fs::write(path, bytes).await
}
