use crate::constants::{
    IMAGEMAGICK_COMMANDS, SQUARE_CROP_QUALITY, SQUARE_CROP_SIZE, THUMBNAIL_QUALITY,
    THUMBNAIL_WIDTH,
};
use crate::error::TransformError;
use std::path::Path;
use std::process::Stdio;
use tokio::process::Command;

/// A derived image shape.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Variant {
    /// Shrinks to at most `width` pixels wide, keeping the aspect ratio.
    /// Smaller images are left at their size.
    ThumbnailFitWidth { width: u32, quality: u32 },
    /// Covers a `size`×`size` square, then center-crops to exactly that.
    SquareCrop { size: u32, quality: u32 },
}

impl Variant {
    pub fn thumbnail() -> Self {
        Variant::ThumbnailFitWidth {
            width: THUMBNAIL_WIDTH,
            quality: THUMBNAIL_QUALITY,
        }
    }

    pub fn square_crop() -> Self {
        Variant::SquareCrop {
            size: SQUARE_CROP_SIZE,
            quality: SQUARE_CROP_QUALITY,
        }
    }

    /// ImageMagick arguments between the input and output paths.
    pub fn operations(&self) -> Vec<String> {
        match *self {
            Variant::ThumbnailFitWidth { width, quality } => vec![
                "-auto-orient".into(),
                "-resize".into(),
                format!("{}>", width),
                "-quality".into(),
                quality.to_string(),
            ],
            Variant::SquareCrop { size, quality } => vec![
                "-auto-orient".into(),
                "-resize".into(),
                format!("{}x{}^", size, size),
                "-gravity".into(),
                "center".into(),
                "-extent".into(),
                format!("{}x{}", size, size),
                "-quality".into(),
                quality.to_string(),
            ],
        }
    }
}

/// The ability to derive an image variant from a file on disk.
#[async_trait::async_trait]
pub trait ImageTranscoder: Send + Sync {
    async fn derive_variant(
        &self,
        input: &Path,
        output: &Path,
        variant: Variant,
    ) -> Result<(), TransformError>;
}

/// Transcoder backed by the ImageMagick command line.
#[derive(Debug, Clone)]
pub struct ImageMagick {
    commands: Vec<String>,
}

impl Default for ImageMagick {
    fn default() -> Self {
        Self {
            commands: IMAGEMAGICK_COMMANDS.iter().map(|c| c.to_string()).collect(),
        }
    }
}

impl ImageMagick {
    /// Uses the given executables instead, tried in order.
    pub fn with_commands(commands: Vec<String>) -> Self {
        Self { commands }
    }
}

#[async_trait::async_trait]
impl ImageTranscoder for ImageMagick {
    async fn derive_variant(
        &self,
        input: &Path,
        output: &Path,
        variant: Variant,
    ) -> Result<(), TransformError> {
        let mut attempts = Vec::new();

        for command in &self.commands {
            let status = Command::new(command)
                .arg(input.as_os_str())
                .args(variant.operations())
                .arg(output.as_os_str())
                .stdin(Stdio::null())
                .stdout(Stdio::null())
                .stderr(Stdio::null())
                .kill_on_drop(true)
                .status()
                .await;

            match status {
                Ok(s) if s.success() => return Ok(()),
                Ok(s) => attempts.push(format!("{} exited with {}", command, s)),
                Err(e) => attempts.push(format!("{} unavailable: {}", command, e)),
            }
        }

        Err(TransformError::new(format!(
            "{} -> {}: {}",
            input.display(),
            output.display(),
            attempts.join("; ")
        )))
    }
}
