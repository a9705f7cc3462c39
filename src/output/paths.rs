// src/output/paths.rs
//! Pure functions for path calculations and public link generation.
//!
//! Nothing here touches the filesystem.

use std::path::{Path, PathBuf};

/// Directory layout of the site checkout a sync run writes into.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SiteLayout {
    root: PathBuf,
}

impl SiteLayout {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// A generated data file under `src/data`.
    pub fn data_file(&self, file_name: &str) -> PathBuf {
        self.root.join("src").join("data").join(file_name)
    }

    /// An image directory under `public/images`, served from `/images`.
    pub fn asset_dir(&self, segments: &[&str]) -> AssetDir {
        let dir = segments
            .iter()
            .fold(self.root.join("public").join("images"), |dir, s| dir.join(s));
        let public_prefix = segments
            .iter()
            .fold(String::from("/images"), |prefix, s| format!("{}/{}", prefix, s));
        AssetDir { dir, public_prefix }
    }
}

/// A directory of published images and the URL prefix it is served under.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssetDir {
    pub dir: PathBuf,
    pub public_prefix: String,
}

impl AssetDir {
    pub fn path(&self, file_name: &str) -> PathBuf {
        self.dir.join(file_name)
    }

    /// Site-relative link to a file in this directory.
    pub fn link(&self, file_name: &str) -> String {
        format!("{}/{}", self.public_prefix, file_name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn asset_dirs_map_to_public_links() {
        let layout = SiteLayout::new("/site");
        let thumbs = layout.asset_dir(&["gallery", "thumb"]);
        assert_eq!(thumbs.dir, PathBuf::from("/site/public/images/gallery/thumb"));
        assert_eq!(thumbs.public_prefix, "/images/gallery/thumb");
        assert_eq!(thumbs.link("p1-thumb.webp"), "/images/gallery/thumb/p1-thumb.webp");
        assert_eq!(
            thumbs.path("p1-thumb.webp"),
            PathBuf::from("/site/public/images/gallery/thumb/p1-thumb.webp")
        );
    }

    #[test]
    fn data_files_live_under_src_data() {
        let layout = SiteLayout::new("site");
        assert_eq!(
            layout.data_file("team.generated.json"),
            PathBuf::from("site/src/data/team.generated.json")
        );
    }
}
