//! Gallery feed: one image per record, with an original and a thumbnail.

use super::{
    assign_ids, finish, partition, store_bytes, typed_link_write, Feed, FailurePolicy,
    RecordOutcome, SyncContext, SyncReport, WriteBackMode,
};
use crate::api::{collect_all, DatabaseQuery, SortDirection};
use crate::concurrency::run_bounded;
use crate::constants::DATE_UNKNOWN;
use crate::error::AppError;
use crate::images::{guess_extension, Variant};
use crate::model::{extract, PropertyKind, RemoteRecord};
use crate::output::{reset_dir, AssetDir};
use crate::pipeline::FeedSync;
use crate::types::{DatabaseId, PropertyName};
use crate::writeback::PendingWriteUpdate;
use serde::Serialize;

const OUTPUT_FILE: &str = "gallery.generated.json";
const DEFAULT_ALT: &str = "Notion Gallery Image";

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GalleryItem {
    pub id: usize,
    pub src: String,
    pub thumbnail_src: String,
    pub alt: String,
    pub categories: Vec<String>,
    pub date: String,
}

/// Property names the gallery database uses.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GallerySchema {
    pub image: PropertyName,
    pub category: PropertyName,
    pub date: PropertyName,
    pub persisted_link: PropertyName,
}

impl Default for GallerySchema {
    fn default() -> Self {
        Self {
            image: "파일".into(),
            category: "카테고리".into(),
            date: "날짜".into(),
            persisted_link: "S3 link".into(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct GalleryFeed {
    pub database: DatabaseId,
    pub schema: GallerySchema,
    pub policy: FailurePolicy,
    pub write_back: WriteBackMode,
}

impl GalleryFeed {
    pub fn new(database: DatabaseId) -> Self {
        Self {
            database,
            schema: GallerySchema::default(),
            policy: FailurePolicy::Strict,
            write_back: WriteBackMode::Inline,
        }
    }
}

struct GalleryDirs {
    original: AssetDir,
    thumb: AssetDir,
}

#[async_trait::async_trait]
impl FeedSync for GalleryFeed {
    fn feed(&self) -> Feed {
        Feed::Gallery
    }

    async fn sync(&self, ctx: &SyncContext) -> Result<SyncReport, AppError> {
        let tag = Feed::Gallery.log_tag();
        log::info!("[{}] Fetching pages from Notion database...", tag);

        let query =
            DatabaseQuery::new().sort_by_timestamp("created_time", SortDirection::Descending);
        let mut records = collect_all(&ctx.client, &self.database, &query).await?;
        sort_newest_first(&mut records, &self.schema);

        let dirs = GalleryDirs {
            original: ctx.layout.asset_dir(&["gallery", "original"]),
            thumb: ctx.layout.asset_dir(&["gallery", "thumb"]),
        };
        reset_dir(&dirs.original.dir)?;
        reset_dir(&dirs.thumb.dir)?;

        log::info!(
            "[{}] Processing {} page(s) with concurrency limit: {}",
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
        partitioned.enforce(self.policy, Feed::Gallery)?;
        assign_ids(&mut partitioned.records, |item, id| item.id = id);

        finish(
            ctx,
            Feed::Gallery,
            ctx.layout.data_file(OUTPUT_FILE),
            partitioned,
            &self.write_back,
        )
        .await
    }
}

/// Best timestamp descending, record id descending on ties.
fn sort_newest_first(records: &mut [RemoteRecord], schema: &GallerySchema) {
    records.sort_by(|a, b| {
        sortable_timestamp(b, schema)
            .cmp(&sortable_timestamp(a, schema))
            .then_with(|| b.id.cmp(&a.id))
    });
}

/// Milliseconds of the record's date, else its creation time, else 0.
fn sortable_timestamp(record: &RemoteRecord, schema: &GallerySchema) -> i64 {
    let value = date_start(record, schema).unwrap_or(record.created_time.as_str());
    extract::parse_instant(value)
        .map(|dt| dt.timestamp_millis())
        .unwrap_or(0)
}

fn date_start<'a>(record: &'a RemoteRecord, schema: &GallerySchema) -> Option<&'a str> {
    record
        .property(&schema.date)
        .and_then(|p| p.date())
        .and_then(|d| d.start.as_deref())
        .filter(|s| !s.trim().is_empty())
}

fn display_date(record: &RemoteRecord, schema: &GallerySchema) -> String {
    date_start(record, schema)
        .and_then(extract::day_precision)
        .or_else(|| extract::day_precision(&record.created_time))
        .unwrap_or_else(|| DATE_UNKNOWN.to_string())
}

fn alt_text(record: &RemoteRecord) -> String {
    let title = record.title_text();
    if title.is_empty() {
        DEFAULT_ALT.to_string()
    } else {
        title
    }
}

/// Named files property, then any files property, then the cover.
fn image_source(record: &RemoteRecord, schema: &GallerySchema) -> Option<String> {
    record
        .property(&schema.image)
        .and_then(|p| p.first_file_url())
        .or_else(|| {
            record
                .properties
                .values()
                .filter(|p| p.kind() == PropertyKind::Files)
                .find_map(|p| p.first_file_url())
        })
        .or_else(|| record.cover_url())
}

/// Thumbnail link for a persisted original link.
fn infer_thumbnail_link(link: &str, record: &RemoteRecord, dirs: &GalleryDirs) -> String {
    if link.contains(&dirs.original.link(record.id.as_str())) {
        dirs.thumb.link(&format!("{}-thumb.webp", record.id))
    } else {
        link.to_string()
    }
}

async fn map_record(
    ctx: &SyncContext,
    schema: &GallerySchema,
    dirs: &GalleryDirs,
    record: RemoteRecord,
) -> RecordOutcome<GalleryItem> {
    let tag = Feed::Gallery.log_tag();
    let categories = extract::categories(record.property(&schema.category));
    let date = display_date(&record, schema);
    let alt = alt_text(&record);

    if let Some(link) = record.property(&schema.persisted_link).and_then(|p| p.link()) {
        log::debug!("[{}] Page {} already published at {}", tag, record.id, link);
        return RecordOutcome::mapped(GalleryItem {
            id: 0,
            thumbnail_src: infer_thumbnail_link(&link, &record, dirs),
            src: link,
            alt,
            categories,
            date,
        });
    }

    let Some(url) = image_source(&record, schema) else {
        return RecordOutcome::Failed(format!("Page {}: image URL not found", record.id));
    };

    let asset = match ctx.images.fetch(&url).await {
        Ok(asset) => asset,
        Err(e) => return RecordOutcome::Failed(format!("Page {}: {}", record.id, e)),
    };

    let extension = guess_extension(&url, asset.content_type.as_deref());
    let original_name = format!("{}{}", record.id, extension);
    let thumb_name = format!("{}-thumb.webp", record.id);
    let original_path = dirs.original.path(&original_name);
    let thumb_path = dirs.thumb.path(&thumb_name);

    if let Err(e) = store_bytes(&original_path, &asset.bytes).await {
        return RecordOutcome::Failed(format!("Page {}: {}", record.id, e));
    }

    let src = dirs.original.link(&original_name);
    let thumbnail_src = match ctx
        .transcoder
        .derive_variant(&original_path, &thumb_path, Variant::thumbnail())
        .await
    {
        Ok(()) => dirs.thumb.link(&thumb_name),
        Err(e) => {
            log::warn!(
                "[{}] Page {}: {}. Using the original image as thumbnail.",
                tag,
                record.id,
                e
            );
            src.clone()
        }
    };

    let update = typed_link_write(&record, &schema.persisted_link, &src, tag).map(|write| {
        PendingWriteUpdate::new(record.id.clone()).with(schema.persisted_link.clone(), write)
    });

    RecordOutcome::Mapped {
        record: GalleryItem {
            id: 0,
            src,
            thumbnail_src,
            alt,
            categories,
            date,
        },
        update,
        warnings: Vec::new(),
    }
}
