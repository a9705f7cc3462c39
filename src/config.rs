// src/config.rs
use crate::error::AppError;
use crate::feeds::{Feed, TEAM_PENDING_UPDATES_FILE};
use crate::types::{ApiKey, ConcurrencyLimit, DatabaseId};
use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// Environment variable holding the Notion integration token.
pub const NOTION_TOKEN_ENV: &str = "NOTION_TOKEN";

/// Parsed command-line input.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct CommandLineInput {
    /// Enable verbose logging (debug level)
    #[arg(short, long, default_value_t = false)]
    pub verbose: bool,

    /// Root of the site checkout that receives feeds and images
    #[arg(long, default_value = ".")]
    pub root: PathBuf,

    /// Records processed at once per feed (default 5, max 32)
    #[arg(long)]
    pub concurrency: Option<usize>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Pull one feed, or all of them, from Notion into the site
    Sync {
        #[arg(value_enum)]
        target: SyncTarget,
    },
    /// Replay staged link write-backs against Notion
    ApplyUpdates {
        #[arg(value_enum)]
        target: ApplyTarget,

        /// Pending update file (defaults to the feed's staging file)
        #[arg(long)]
        file: Option<PathBuf>,
    },
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncTarget {
    Team,
    Projects,
    Gallery,
    Faq,
    All,
}

impl SyncTarget {
    pub fn feeds(self) -> Vec<Feed> {
        match self {
            SyncTarget::Team => vec![Feed::Team],
            SyncTarget::Projects => vec![Feed::Projects],
            SyncTarget::Gallery => vec![Feed::Gallery],
            SyncTarget::Faq => vec![Feed::Faq],
            SyncTarget::All => Feed::ALL.to_vec(),
        }
    }
}

/// Feeds whose write-backs can be deferred to a file.
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApplyTarget {
    Team,
}

/// What a resolved run is going to do.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Task {
    Sync(Vec<(Feed, DatabaseId)>),
    ApplyUpdates { file: PathBuf },
}

/// Resolved run configuration, validated and ready to drive a run.
#[derive(Debug, Clone)]
pub struct RunConfig {
    pub api_key: ApiKey,
    pub root: PathBuf,
    pub concurrency: ConcurrencyLimit,
    pub verbose: bool,
    pub task: Task,
}

impl RunConfig {
    /// Resolves the run configuration from CLI input and the process environment.
    pub fn resolve(cli: CommandLineInput) -> Result<Self, AppError> {
        Self::resolve_with(cli, |name| std::env::var(name).ok())
    }

    /// Same as [`RunConfig::resolve`] with an explicit environment lookup.
    pub fn resolve_with(
        cli: CommandLineInput,
        env: impl Fn(&str) -> Option<String>,
    ) -> Result<Self, AppError> {
        let api_key = ApiKey::new(required(&env, NOTION_TOKEN_ENV)?)?;

        let concurrency = match cli.concurrency {
            Some(limit) => ConcurrencyLimit::new(limit)?,
            None => ConcurrencyLimit::default(),
        };

        let task = match cli.command {
            Command::Sync { target } => {
                let feeds = target
                    .feeds()
                    .into_iter()
                    .map(|feed| {
                        let raw = required(&env, feed.database_env_var())?;
                        Ok((feed, DatabaseId::parse(&raw)?))
                    })
                    .collect::<Result<Vec<_>, AppError>>()?;
                Task::Sync(feeds)
            }
            Command::ApplyUpdates {
                target: ApplyTarget::Team,
                file,
            } => Task::ApplyUpdates {
                file: cli
                    .root
                    .join(file.unwrap_or_else(|| PathBuf::from(TEAM_PENDING_UPDATES_FILE))),
            },
        };

        Ok(RunConfig {
            api_key,
            root: cli.root,
            concurrency,
            verbose: cli.verbose,
            task,
        })
    }
}

/// Reads a variable, treating blank values as unset.
fn required(env: &impl Fn(&str) -> Option<String>, name: &str) -> Result<String, AppError> {
    env(name)
        .filter(|value| !value.trim().is_empty())
        .ok_or_else(|| {
            AppError::MissingConfiguration(format!("{} environment variable not set", name))
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    const TOKEN: &str = "secret_abcdefghijklmnopqrstuvwxyz";
    const DB: &str = "12345678123456781234567812345678";

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name| map.get(name).cloned()
    }

    fn cli(args: &[&str]) -> CommandLineInput {
        CommandLineInput::try_parse_from(std::iter::once("notion2site").chain(args.iter().copied()))
            .unwrap()
    }

    #[test]
    fn sync_single_feed_needs_only_its_database() {
        let config = RunConfig::resolve_with(
            cli(&["sync", "gallery"]),
            env(&[(NOTION_TOKEN_ENV, TOKEN), ("NOTION_GALLERY_DATABASE_ID", DB)]),
        )
        .unwrap();
        assert_eq!(
            config.task,
            Task::Sync(vec![(Feed::Gallery, DatabaseId::parse(DB).unwrap())])
        );
        assert_eq!(config.concurrency.get(), 5);
        assert_eq!(config.root, PathBuf::from("."));
    }

    #[test]
    fn missing_token_or_database_is_a_configuration_error() {
        let no_token = RunConfig::resolve_with(
            cli(&["sync", "faq"]),
            env(&[("NOTION_FAQ_DATABASE_ID", DB)]),
        );
        assert!(
            matches!(no_token, Err(AppError::MissingConfiguration(m)) if m.contains("NOTION_TOKEN"))
        );

        let blank_db = RunConfig::resolve_with(
            cli(&["sync", "all"]),
            env(&[
                (NOTION_TOKEN_ENV, TOKEN),
                ("NOTION_TEAM_DATABASE_ID", DB),
                ("NOTION_PROJECTS_DATABASE_ID", "  "),
            ]),
        );
        match blank_db {
            Err(AppError::MissingConfiguration(m)) => {
                assert!(m.contains("NOTION_PROJECTS_DATABASE_ID"))
            }
            other => panic!("unexpected: {other:?}"),
        }
    }

    #[test]
    fn apply_updates_defaults_to_team_staging_file_under_root() {
        let config = RunConfig::resolve_with(
            cli(&["--root", "/site", "apply-updates", "team"]),
            env(&[(NOTION_TOKEN_ENV, TOKEN)]),
        )
        .unwrap();
        assert_eq!(
            config.task,
            Task::ApplyUpdates {
                file: PathBuf::from("/site/src/data/team.pending-link-updates.json")
            }
        );
    }

    #[test]
    fn concurrency_is_bounded() {
        let result = RunConfig::resolve_with(
            cli(&["--concurrency", "0", "sync", "team"]),
            env(&[(NOTION_TOKEN_ENV, TOKEN), ("NOTION_TEAM_DATABASE_ID", DB)]),
        );
        assert!(matches!(result, Err(AppError::ValidationError(_))));
    }
}
