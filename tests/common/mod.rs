// tests/common/mod.rs
//! Scripted stand-ins for Notion, image hosts and ImageMagick.
#![allow(dead_code)]

use notion2site::{
    ConcurrencyLimit, DownloadError, HttpMethod, ImageAsset, ImageSource, ImageTranscoder,
    NotionClient, NotionTransport, RawResponse, SiteLayout, SyncContext, TransformError,
    TransportError, Variant,
};
use parking_lot::Mutex;
use serde_json::{json, Value};
use std::collections::{HashMap, VecDeque};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;

pub const DATABASE: &str = "12345678123456781234567812345678";

/// A request as the transport saw it.
#[derive(Debug, Clone)]
pub struct SeenRequest {
    pub method: HttpMethod,
    pub endpoint: String,
    pub body: Option<Value>,
    pub at: Instant,
}

type Reply = Result<RawResponse, TransportError>;

/// Replays queued replies in order. PATCHes draw from their own queue and
/// succeed with `{}` once it is empty.
#[derive(Default)]
pub struct ScriptedTransport {
    replies: Mutex<VecDeque<Reply>>,
    patch_replies: Mutex<VecDeque<Reply>>,
    seen: Mutex<Vec<SeenRequest>>,
}

impl ScriptedTransport {
    pub fn new(replies: impl IntoIterator<Item = Reply>) -> Arc<Self> {
        Arc::new(Self {
            replies: Mutex::new(replies.into_iter().collect()),
            ..Self::default()
        })
    }

    pub fn with_patch_replies(
        self: Arc<Self>,
        replies: impl IntoIterator<Item = Reply>,
    ) -> Arc<Self> {
        self.patch_replies.lock().extend(replies);
        self
    }

    pub fn requests(&self) -> Vec<SeenRequest> {
        self.seen.lock().clone()
    }

    pub fn requests_with(&self, method: HttpMethod) -> Vec<SeenRequest> {
        self.requests()
            .into_iter()
            .filter(|r| r.method == method)
            .collect()
    }
}

#[async_trait::async_trait]
impl NotionTransport for ScriptedTransport {
    async fn execute(
        &self,
        method: HttpMethod,
        endpoint: &str,
        body: Option<&Value>,
    ) -> Result<RawResponse, TransportError> {
        self.seen.lock().push(SeenRequest {
            method,
            endpoint: endpoint.to_string(),
            body: body.cloned(),
            at: Instant::now(),
        });

        if method == HttpMethod::Patch {
            return self
                .patch_replies
                .lock()
                .pop_front()
                .unwrap_or_else(|| ok(json!({})));
        }
        self.replies
            .lock()
            .pop_front()
            .unwrap_or_else(|| Err(TransportError("script exhausted".into())))
    }
}

pub fn ok(body: Value) -> Reply {
    Ok(RawResponse {
        status: 200,
        retry_after: None,
        body: body.to_string(),
    })
}

pub fn status(code: u16, retry_after: Option<&str>) -> Reply {
    Ok(RawResponse {
        status: code,
        retry_after: retry_after.map(str::to_string),
        body: json!({"object": "error", "status": code, "code": "rate_limited"}).to_string(),
    })
}

pub fn network_error() -> Reply {
    Err(TransportError("connection reset by peer".into()))
}

/// One page of a database query response.
pub fn query_page(results: Vec<Value>, next_cursor: Option<&str>) -> Reply {
    ok(json!({
        "object": "list",
        "results": results,
        "has_more": next_cursor.is_some(),
        "next_cursor": next_cursor,
    }))
}

/// Serves images from a fixed table; unknown URLs answer 404.
#[derive(Default)]
pub struct FakeImageSource {
    images: HashMap<String, ImageAsset>,
    fetched: Mutex<Vec<String>>,
}

impl FakeImageSource {
    pub fn with(mut self, url: &str, content_type: &str, bytes: &[u8]) -> Self {
        self.images.insert(
            url.to_string(),
            ImageAsset {
                content_type: Some(content_type.to_string()),
                bytes: bytes.to_vec(),
            },
        );
        self
    }

    pub fn fetched(&self) -> Vec<String> {
        self.fetched.lock().clone()
    }
}

#[async_trait::async_trait]
impl ImageSource for FakeImageSource {
    async fn fetch(&self, url: &str) -> Result<ImageAsset, DownloadError> {
        self.fetched.lock().push(url.to_string());
        self.images
            .get(url)
            .cloned()
            .ok_or_else(|| DownloadError::Status {
                url: url.to_string(),
                status: 404,
            })
    }
}

/// Copies the input to the output, or fails every call when broken.
#[derive(Default)]
pub struct FakeTranscoder {
    broken: bool,
    calls: Mutex<Vec<(PathBuf, PathBuf, Variant)>>,
}

impl FakeTranscoder {
    pub fn broken() -> Self {
        Self {
            broken: true,
            ..Self::default()
        }
    }

    pub fn calls(&self) -> Vec<(PathBuf, PathBuf, Variant)> {
        self.calls.lock().clone()
    }
}

#[async_trait::async_trait]
impl ImageTranscoder for FakeTranscoder {
    async fn derive_variant(
        &self,
        input: &Path,
        output: &Path,
        variant: Variant,
    ) -> Result<(), TransformError> {
        self.calls
            .lock()
            .push((input.to_path_buf(), output.to_path_buf(), variant));
        if self.broken {
            return Err(TransformError::new("ImageMagick is not available"));
        }
        tokio::fs::copy(input, output)
            .await
            .map(|_| ())
            .map_err(|e| TransformError::new(e.to_string()))
    }
}

pub fn context(
    transport: Arc<ScriptedTransport>,
    images: Arc<FakeImageSource>,
    transcoder: Arc<FakeTranscoder>,
    root: &Path,
) -> SyncContext {
    SyncContext {
        client: NotionClient::new(transport),
        images,
        transcoder,
        layout: SiteLayout::new(root),
        concurrency: ConcurrencyLimit::default(),
        write_back_pacing: Duration::ZERO,
    }
}

pub fn read_json(path: &Path) -> Value {
    let text = std::fs::read_to_string(path).expect("feed file should exist");
    serde_json::from_str(&text).expect("feed file should be valid JSON")
}
