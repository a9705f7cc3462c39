//! Remote image retrieval and local variant derivation.

pub mod fetch;
pub mod transcoder;

pub use fetch::{guess_extension, HttpImageSource, ImageAsset, ImageSource};
pub use transcoder::{ImageMagick, ImageTranscoder, Variant};
