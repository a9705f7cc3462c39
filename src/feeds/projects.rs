//! Projects feed: validated portfolio entries with thumbnails and screenshots.

use super::{
    assign_ids, finish, partition, store_bytes, typed_link_write, Feed, FailurePolicy,
    RecordOutcome, SyncContext, SyncReport, WriteBackMode,
};
use crate::api::{collect_all, DatabaseQuery, SortDirection};
use crate::concurrency::run_bounded;
use crate::error::AppError;
use crate::images::{guess_extension, Variant};
use crate::model::{extract, PropertyKind, RemoteRecord};
use crate::output::{reset_dir, AssetDir};
use crate::pipeline::FeedSync;
use crate::types::{DatabaseId, PropertyName};
use crate::writeback::{PendingWriteUpdate, PropertyWrite};
use serde::{Deserialize, Serialize};
use serde_json::json;

const OUTPUT_FILE: &str = "projects.generated.json";
const DEFAULT_TITLE: &str = "Untitled Project";
const VALIDATION_PASSED: &str = "✅";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum ProjectStatus {
    InProgress,
    Completed,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Screenshot {
    pub src: String,
    pub title: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Project {
    pub id: usize,
    pub title: String,
    pub status: ProjectStatus,
    pub summary: String,
    pub description: String,
    pub goal: String,
    pub tech_stack: Vec<String>,
    pub members: Vec<String>,
    pub start_date: String,
    pub end_date: String,
    pub thumbnail: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub github: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub demo: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub screenshots: Vec<Screenshot>,
}

/// Property names the projects database uses.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProjectSchema {
    /// Formula that reads `✅` on records fit for publishing.
    pub validation: PropertyName,
    pub thumbnail: PropertyName,
    pub thumbnail_url: PropertyName,
    pub screenshots: PropertyName,
    pub screenshots_info: PropertyName,
    pub status: PropertyName,
    pub date: PropertyName,
    pub tech_stack: PropertyName,
    pub summary: PropertyName,
    pub description: PropertyName,
    pub goal: PropertyName,
    pub github: PropertyName,
    pub demo: PropertyName,
    pub participants: PropertyName,
}

impl Default for ProjectSchema {
    fn default() -> Self {
        Self {
            validation: "유효성 검증".into(),
            thumbnail: "thumbnail".into(),
            thumbnail_url: "thumbnail_url".into(),
            screenshots: "screenshots".into(),
            screenshots_info: "screenshots_info".into(),
            status: "Status".into(),
            date: "Date".into(),
            tech_stack: "tech-stacks".into(),
            summary: "summary".into(),
            description: "description".into(),
            goal: "goal".into(),
            github: "github".into(),
            demo: "demo".into(),
            participants: "participants".into(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct ProjectFeed {
    pub database: DatabaseId,
    pub schema: ProjectSchema,
    pub policy: FailurePolicy,
    pub write_back: WriteBackMode,
}

impl ProjectFeed {
    pub fn new(database: DatabaseId) -> Self {
        Self {
            database,
            schema: ProjectSchema::default(),
            policy: FailurePolicy::BestEffort,
            write_back: WriteBackMode::Inline,
        }
    }

    fn query(&self) -> DatabaseQuery {
        DatabaseQuery::new()
            .with_filter(json!({
                "property": self.schema.validation.as_str(),
                "formula": { "string": { "equals": VALIDATION_PASSED } }
            }))
            .sort_by_timestamp("created_time", SortDirection::Descending)
    }
}

struct ProjectDirs {
    original: AssetDir,
    thumb: AssetDir,
}

#[async_trait::async_trait]
impl FeedSync for ProjectFeed {
    fn feed(&self) -> Feed {
        Feed::Projects
    }

    async fn sync(&self, ctx: &SyncContext) -> Result<SyncReport, AppError> {
        let tag = Feed::Projects.log_tag();
        log::info!("[{}] Fetching pages from Notion database...", tag);

        let records = collect_all(&ctx.client, &self.database, &self.query()).await?;

        let dirs = ProjectDirs {
            original: ctx.layout.asset_dir(&["projects", "original"]),
            thumb: ctx.layout.asset_dir(&["projects", "thumb"]),
        };
        reset_dir(&dirs.original.dir)?;
        reset_dir(&dirs.thumb.dir)?;

        log::info!(
            "[{}] Processing {} pages with concurrency limit: {}",
            tag,
            records.len(),
            ctx.concurrency.get()
        );

        let schema = &self.schema;
        let dirs = &dirs;
        let outcomes = run_bounded(records, ctx.concurrency.get(), |_, record| {
            map_record(ctx, schema, dirs, record)
        })
        .await;

        let mut partitioned = partition(outcomes);
        partitioned.enforce(self.policy, Feed::Projects)?;
        assign_ids(&mut partitioned.records, |project, id| project.id = id);

        finish(
            ctx,
            Feed::Projects,
            ctx.layout.data_file(OUTPUT_FILE),
            partitioned,
            &self.write_back,
        )
        .await
    }
}

/// `completed`, `완료` or `done` (any case) on a status or select property.
pub fn project_status(record: &RemoteRecord, schema: &ProjectSchema) -> ProjectStatus {
    let name = record
        .property(&schema.status)
        .and_then(|p| p.selected_name())
        .map(|n| n.trim().to_lowercase());
    match name.as_deref() {
        Some("completed" | "완료" | "done") => ProjectStatus::Completed,
        _ => ProjectStatus::InProgress,
    }
}

fn project_title(record: &RemoteRecord) -> String {
    let title = record.title_text();
    if title.is_empty() {
        DEFAULT_TITLE.to_string()
    } else {
        title
    }
}

/// Start and end of the date range at month precision.
fn date_range(record: &RemoteRecord, schema: &ProjectSchema) -> (String, String) {
    let Some(date) = record.property(&schema.date).and_then(|p| p.date()) else {
        return (String::new(), String::new());
    };
    let month = |value: &Option<String>| {
        value
            .as_deref()
            .and_then(extract::month_precision)
            .unwrap_or_default()
    };
    (month(&date.start), month(&date.end))
}

/// Screenshots persisted by an earlier run, if the stored JSON is usable.
fn persisted_screenshots(record: &RemoteRecord, schema: &ProjectSchema) -> Option<Vec<Screenshot>> {
    let text = record.text(&schema.screenshots_info);
    if text.is_empty() {
        return None;
    }
    serde_json::from_str::<Vec<Screenshot>>(&text)
        .ok()
        .filter(|shots| !shots.is_empty())
}

fn map_fields(
    record: &RemoteRecord,
    schema: &ProjectSchema,
    thumbnail: String,
    screenshots: Vec<Screenshot>,
) -> Project {
    let text = |name: &PropertyName| {
        record
            .property(name)
            .filter(|p| p.kind() == PropertyKind::RichText)
            .map(|p| p.plain_text())
            .unwrap_or_default()
    };
    let (start_date, end_date) = date_range(record, schema);

    Project {
        id: 0,
        title: project_title(record),
        status: project_status(record, schema),
        summary: text(&schema.summary),
        description: text(&schema.description),
        goal: text(&schema.goal),
        tech_stack: record
            .property(&schema.tech_stack)
            .filter(|p| p.kind() == PropertyKind::MultiSelect)
            .map(|p| p.option_names())
            .unwrap_or_default(),
        members: record
            .property(&schema.participants)
            .map(|p| p.people_names())
            .unwrap_or_default(),
        start_date,
        end_date,
        thumbnail,
        github: record.property(&schema.github).and_then(|p| p.url()),
        demo: record.property(&schema.demo).and_then(|p| p.url()),
        screenshots,
    }
}

async fn map_record(
    ctx: &SyncContext,
    schema: &ProjectSchema,
    dirs: &ProjectDirs,
    record: RemoteRecord,
) -> RecordOutcome<Project> {
    let tag = Feed::Projects.log_tag();
    let title = project_title(&record);
    let mut update = PendingWriteUpdate::new(record.id.clone());
    let mut warnings = Vec::new();

    let mut thumbnail = record
        .property(&schema.thumbnail_url)
        .and_then(|p| p.link())
        .unwrap_or_default();
    if thumbnail.is_empty() {
        if let Some(url) = record
            .property(&schema.thumbnail)
            .and_then(|p| p.first_file_url())
        {
            let stem = format!("{}-thumbnail", record.id);
            match publish_variant(ctx, dirs, &url, &stem).await {
                Ok(link) => {
                    if let Some(write) =
                        typed_link_write(&record, &schema.thumbnail_url, &link, tag)
                    {
                        update = update.with(schema.thumbnail_url.clone(), write);
                    }
                    thumbnail = link;
                }
                Err(e) => warnings.push(format!("Project {}: thumbnail: {}", title, e)),
            }
        }
    }

    let screenshots = match persisted_screenshots(&record, schema) {
        Some(shots) => shots,
        None => {
            let shots =
                publish_screenshots(ctx, dirs, &record, schema, &title, &mut warnings).await;
            if !shots.is_empty() {
                match serde_json::to_string(&shots) {
                    Ok(info) => {
                        update = update
                            .with(schema.screenshots_info.clone(), PropertyWrite::RichText(info));
                    }
                    Err(e) => {
                        log::error!("[{}] Cannot encode screenshots for {}: {}", tag, title, e)
                    }
                }
            }
            shots
        }
    };

    RecordOutcome::Mapped {
        record: map_fields(&record, schema, thumbnail, screenshots),
        update: Some(update),
        warnings,
    }
}

async fn publish_screenshots(
    ctx: &SyncContext,
    dirs: &ProjectDirs,
    record: &RemoteRecord,
    schema: &ProjectSchema,
    title: &str,
    warnings: &mut Vec<String>,
) -> Vec<Screenshot> {
    let urls = record
        .property(&schema.screenshots)
        .map(|p| p.file_urls())
        .unwrap_or_default();

    let mut shots = Vec::new();
    for (index, url) in urls.iter().enumerate() {
        let stem = format!("{}-screenshot-{}", record.id, index);
        match publish_variant(ctx, dirs, url, &stem).await {
            Ok(src) => shots.push(Screenshot {
                src,
                title: format!("Screenshot {}", index + 1),
            }),
            Err(e) => warnings.push(format!("Project {}: screenshot {}: {}", title, index + 1, e)),
        }
    }
    shots
}

/// Downloads `url` to `original/{stem}{ext}` and thumbnails it to
/// `thumb/{stem}.webp`. Returns the thumbnail link, or the original link
/// when thumbnailing fails.
async fn publish_variant(
    ctx: &SyncContext,
    dirs: &ProjectDirs,
    url: &str,
    stem: &str,
) -> Result<String, String> {
    let asset = ctx.images.fetch(url).await.map_err(|e| e.to_string())?;
    let extension = guess_extension(url, asset.content_type.as_deref());

    let original_name = format!("{}{}", stem, extension);
    let thumb_name = format!("{}.webp", stem);
    let original_path = dirs.original.path(&original_name);
    store_bytes(&original_path, &asset.bytes)
        .await
        .map_err(|e| e.to_string())?;

    match ctx
        .transcoder
        .derive_variant(&original_path, &dirs.thumb.path(&thumb_name), Variant::thumbnail())
        .await
    {
        Ok(()) => Ok(dirs.thumb.link(&thumb_name)),
        Err(e) => {
            log::warn!(
                "[{}] {}. Using the original image for {}.",
                Feed::Projects.log_tag(),
                e,
                stem
            );
            Ok(dirs.original.link(&original_name))
        }
    }
}
