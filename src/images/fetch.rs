use crate::error::{AppError, DownloadError};
use reqwest::{header, Client};
use url::Url;

/// Bytes of a downloaded image and the content type the server declared.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageAsset {
    pub content_type: Option<String>,
    pub bytes: Vec<u8>,
}

/// The ability to download an image by URL.
#[async_trait::async_trait]
pub trait ImageSource: Send + Sync {
    /// One GET, no retries. Non-2xx statuses are errors.
    async fn fetch(&self, url: &str) -> Result<ImageAsset, DownloadError>;
}

/// Plain HTTP image downloads. Notion file URLs are pre-signed, so no
/// credentials are sent.
#[derive(Clone)]
pub struct HttpImageSource {
    client: Client,
}

impl HttpImageSource {
    pub fn new() -> Result<Self, AppError> {
        Ok(Self {
            client: Client::builder().build()?,
        })
    }
}

#[async_trait::async_trait]
impl ImageSource for HttpImageSource {
    async fn fetch(&self, url: &str) -> Result<ImageAsset, DownloadError> {
        let network = |e: reqwest::Error| DownloadError::Network {
            url: url.to_string(),
            message: e.to_string(),
        };

        let response = self.client.get(url).send().await.map_err(network)?;
        let status = response.status();
        if !status.is_success() {
            return Err(DownloadError::Status {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        let content_type = response
            .headers()
            .get(header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
        let bytes = response.bytes().await.map_err(network)?.to_vec();

        log::debug!("Downloaded {} bytes from {}", bytes.len(), url);
        Ok(ImageAsset {
            content_type,
            bytes,
        })
    }
}

/// File extension (with leading dot) for a downloaded image.
///
/// The URL path's extension wins, lower-cased. Otherwise the content type
/// decides between png, webp and gif, and everything else is `.jpg`.
pub fn guess_extension(url: &str, content_type: Option<&str>) -> String {
    if let Some(ext) = url_extension(url) {
        return ext;
    }

    match content_type {
        Some(ct) if ct.contains("png") => ".png",
        Some(ct) if ct.contains("webp") => ".webp",
        Some(ct) if ct.contains("gif") => ".gif",
        _ => ".jpg",
    }
    .to_string()
}

fn url_extension(url: &str) -> Option<String> {
    let parsed = Url::parse(url).ok()?;
    let file_name = parsed.path_segments()?.next_back()?;
    // A leading dot marks a hidden file, not an extension.
    let (stem, ext) = file_name.rsplit_once('.')?;
    if stem.is_empty() || ext.is_empty() {
        return None;
    }
    Some(format!(".{}", ext.to_lowercase()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extension_from_url_path() {
        assert_eq!(
            guess_extension("https://s3.example.com/a/b/Photo.PNG?X-Amz-Signature=1", None),
            ".png"
        );
        assert_eq!(
            guess_extension("https://cdn.example.com/img.webp", Some("image/jpeg")),
            ".webp"
        );
    }

    #[test]
    fn extension_from_content_type() {
        assert_eq!(
            guess_extension("https://cdn.example.com/image", Some("image/png")),
            ".png"
        );
        assert_eq!(
            guess_extension("https://cdn.example.com/image/", Some("image/gif")),
            ".gif"
        );
        assert_eq!(
            guess_extension("https://cdn.example.com/.hidden", Some("image/webp")),
            ".webp"
        );
    }

    #[test]
    fn extension_defaults_to_jpg() {
        assert_eq!(guess_extension("https://cdn.example.com/image", None), ".jpg");
        assert_eq!(
            guess_extension("https://cdn.example.com/image", Some("application/octet-stream")),
            ".jpg"
        );
        assert_eq!(guess_extension("not a url", Some("image/png")), ".png");
    }
}
