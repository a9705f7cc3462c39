// src/constants.rs
//! Domain constants that define the operational boundaries of the system.
//!
//! Each constant is named for the domain concept it constrains, not its
//! technical role. Reading these constants should tell you the story
//! of how a sync run behaves: how it talks to Notion, how hard it retries,
//! how many records it works on at once, and what the images look like.

// ---------------------------------------------------------------------------
// Notion API boundaries
// ---------------------------------------------------------------------------

/// Root of every Notion REST endpoint.
pub const NOTION_API_BASE_URL: &str = "https://api.notion.com/v1";

/// The API version pinned in the `Notion-Version` header.
pub const NOTION_API_VERSION: &str = "2022-06-28";

/// How many records the Notion API returns per page of query results.
///
/// The Notion API maximum is 100. We use the maximum to minimize
/// round-trips while collecting a whole database.
pub const NOTION_API_PAGE_SIZE: usize = 100;

/// Total attempts for one logical request, the first one included.
pub const NOTION_API_MAX_ATTEMPTS: u32 = 3;

/// Delay between attempts when the server gives no better hint.
pub const NOTION_API_RETRY_DELAY_MS: u64 = 500;

/// Pause between consecutive PATCHes of a deferred write-back run.
pub const WRITE_BACK_PACING_MS: u64 = 200;

/// Maximum characters in one rich_text segment accepted by Notion.
pub const RICH_TEXT_SEGMENT_LIMIT: usize = 2000;

// ---------------------------------------------------------------------------
// Concurrency
// ---------------------------------------------------------------------------

/// Record-mapping tasks allowed in flight at once.
///
/// Bounds load on the Notion API and on the local ImageMagick processes.
pub const RECORD_CONCURRENCY_LIMIT: usize = 5;

// ---------------------------------------------------------------------------
// Image variants
// ---------------------------------------------------------------------------

/// Maximum width of a fit-to-width thumbnail. Smaller sources are not upscaled.
pub const THUMBNAIL_WIDTH: u32 = 640;

/// Encoder quality for fit-to-width thumbnails.
pub const THUMBNAIL_QUALITY: u32 = 72;

/// Edge length of a square profile crop.
pub const SQUARE_CROP_SIZE: u32 = 512;

/// Encoder quality for square profile crops.
pub const SQUARE_CROP_QUALITY: u32 = 80;

/// ImageMagick entry points, tried in order.
pub const IMAGEMAGICK_COMMANDS: [&str; 2] = ["magick", "convert"];

// ---------------------------------------------------------------------------
// Sentinels rendered into the feeds
// ---------------------------------------------------------------------------

/// Category used when a record carries none.
pub const UNCATEGORIZED: &str = "기타";

/// Display date used when a gallery record has no parseable date.
pub const DATE_UNKNOWN: &str = "날짜 미정";

/// Sort weight of FAQ entries without an explicit weight; sorts them last.
pub const FAQ_DEFAULT_SORT_WEIGHT: f64 = u32::MAX as f64;

// ---------------------------------------------------------------------------
// Error display
// ---------------------------------------------------------------------------

/// Maximum per-record failures listed in a fatal strict-feed message.
pub const FAILURE_SUMMARY_LIMIT: usize = 10;
