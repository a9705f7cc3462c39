// src/pipeline.rs
//! Pipeline capability traits: what a feed run needs to be able to do.
//!
//! Each feed implements [`FeedSync`]; the binary drives feeds only through it.

use crate::error::AppError;
use crate::feeds::{
    FaqFeed, Feed, GalleryFeed, ProjectFeed, SyncContext, SyncReport, TeamFeed,
};
use crate::types::DatabaseId;

/// Pulls one feed from Notion and materializes it into the site checkout.
#[async_trait::async_trait]
pub trait FeedSync: Send + Sync {
    fn feed(&self) -> Feed;

    async fn sync(&self, ctx: &SyncContext) -> Result<SyncReport, AppError>;
}

/// The feed runner for `feed`, reading from `database` with its default
/// schema and policies.
pub fn feed_sync(feed: Feed, database: DatabaseId) -> Box<dyn FeedSync> {
    match feed {
        Feed::Team => Box::new(TeamFeed::new(database)),
        Feed::Projects => Box::new(ProjectFeed::new(database)),
        Feed::Gallery => Box::new(GalleryFeed::new(database)),
        Feed::Faq => Box::new(FaqFeed::new(database)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn each_feed_gets_its_own_runner() {
        let database = DatabaseId::parse("12345678123456781234567812345678").unwrap();
        for feed in Feed::ALL {
            assert_eq!(feed_sync(feed, database.clone()).feed(), feed);
        }
    }
}
