//! Team feed: the member roster with square profile pictures.

use super::{
    assign_ids, finish, partition, store_bytes, typed_link_write, Feed, FailurePolicy,
    RecordOutcome, SyncContext, SyncReport, WriteBackMode, TEAM_PENDING_UPDATES_FILE,
};
use crate::api::{collect_all, DatabaseQuery, SortDirection};
use crate::concurrency::run_bounded;
use crate::error::AppError;
use crate::images::{guess_extension, Variant};
use crate::model::RemoteRecord;
use crate::output::{reset_dir, AssetDir};
use crate::pipeline::FeedSync;
use crate::types::{DatabaseId, PropertyName};
use crate::writeback::PendingWriteUpdate;
use serde::Serialize;
use std::collections::BTreeSet;
use std::path::PathBuf;

const OUTPUT_FILE: &str = "team.generated.json";

/// A member's standing, in display order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub enum Role {
    #[serde(rename = "Team Lead")]
    TeamLead,
    #[serde(rename = "Project Lead")]
    ProjectLead,
    #[serde(rename = "Member")]
    Member,
    #[serde(rename = "탈퇴 멤버")]
    Alumni,
}

impl Role {
    fn priority(self) -> u8 {
        match self {
            Role::TeamLead => 1,
            Role::ProjectLead => 2,
            Role::Member => 3,
            Role::Alumni => 4,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SocialLinks {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub github: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TeamMember {
    pub id: usize,
    pub name: String,
    pub role: Role,
    pub bio: String,
    pub image: String,
    pub past_projects: Vec<String>,
    pub social: SocialLinks,
    pub is_team_lead: bool,
    pub leave_date: Option<String>,
}

/// Property names the team database uses.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TeamSchema {
    pub join_date: PropertyName,
    pub team_lead: PropertyName,
    pub project_lead: PropertyName,
    pub projects: PropertyName,
    pub past_projects: PropertyName,
    pub leave_date: PropertyName,
    pub bio: PropertyName,
    pub image: PropertyName,
    pub github: PropertyName,
    pub persisted_link: PropertyName,
}

impl Default for TeamSchema {
    fn default() -> Self {
        Self {
            join_date: "가입일".into(),
            team_lead: "팀장".into(),
            project_lead: "프로젝트장".into(),
            projects: "프로젝트".into(),
            past_projects: "참여했던 프로젝트".into(),
            leave_date: "탈퇴일".into(),
            bio: "한 줄 소개".into(),
            image: "프로필 사진".into(),
            github: "github".into(),
            persisted_link: "S3 link".into(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct TeamFeed {
    pub database: DatabaseId,
    pub schema: TeamSchema,
    pub policy: FailurePolicy,
    pub write_back: WriteBackMode,
}

impl TeamFeed {
    pub fn new(database: DatabaseId) -> Self {
        Self {
            database,
            schema: TeamSchema::default(),
            policy: FailurePolicy::BestEffort,
            write_back: WriteBackMode::Deferred(PathBuf::from(TEAM_PENDING_UPDATES_FILE)),
        }
    }
}

#[async_trait::async_trait]
impl FeedSync for TeamFeed {
    fn feed(&self) -> Feed {
        Feed::Team
    }

    async fn sync(&self, ctx: &SyncContext) -> Result<SyncReport, AppError> {
        let tag = Feed::Team.log_tag();
        log::info!("[{}] Fetching all members from Notion database...", tag);

        let query = DatabaseQuery::new()
            .sort_by_property(self.schema.join_date.as_str(), SortDirection::Ascending);
        let records = collect_all(&ctx.client, &self.database, &query).await?;

        let images = ctx.layout.asset_dir(&["team"]);
        reset_dir(&images.dir)?;

        log::info!(
            "[{}] Processing {} members with concurrency limit: {}",
            tag,
            records.len(),
            ctx.concurrency.get()
        );

        let schema = &self.schema;
        let images = &images;
        let outcomes = run_bounded(records, ctx.concurrency.get(), |_, record| {
            map_record(ctx, schema, images, record)
        })
        .await;

        let mut partitioned = partition(outcomes);
        partitioned.enforce(self.policy, Feed::Team)?;
        assign_ids(&mut partitioned.records, |member, id| member.id = id);
        sort_by_role(&mut partitioned.records);

        finish(
            ctx,
            Feed::Team,
            ctx.layout.data_file(OUTPUT_FILE),
            partitioned,
            &self.write_back,
        )
        .await
    }
}

/// Role priority, then discovery order.
pub fn sort_by_role(members: &mut [TeamMember]) {
    members.sort_by_key(|m| (m.role.priority(), m.id));
}

/// Leave date beats everything, then the team-lead flag, then any
/// project-lead entry.
pub fn determine_role(has_left: bool, is_team_lead: bool, leads_projects: bool) -> Role {
    if has_left {
        Role::Alumni
    } else if is_team_lead {
        Role::TeamLead
    } else if leads_projects {
        Role::ProjectLead
    } else {
        Role::Member
    }
}

/// Field values of a member, everything but the image.
struct Profile {
    name: String,
    role: Role,
    bio: String,
    past_projects: Vec<String>,
    social: SocialLinks,
    is_team_lead: bool,
    leave_date: Option<String>,
}

fn read_profile(record: &RemoteRecord, schema: &TeamSchema) -> Option<Profile> {
    let name = record.title_text();
    if name.is_empty() {
        return None;
    }

    let options = |property: &PropertyName| {
        record
            .property(property)
            .map(|p| p.option_names())
            .unwrap_or_default()
    };

    let is_team_lead = record
        .property(&schema.team_lead)
        .is_some_and(|p| p.checkbox());
    let leave_date = record
        .property(&schema.leave_date)
        .and_then(|p| p.date())
        .and_then(|d| d.start.clone())
        .filter(|s| !s.trim().is_empty());
    let project_leads = options(&schema.project_lead);

    let past_projects: BTreeSet<String> = project_leads
        .iter()
        .cloned()
        .chain(options(&schema.projects))
        .chain(options(&schema.past_projects))
        .collect();

    Some(Profile {
        role: determine_role(leave_date.is_some(), is_team_lead, !project_leads.is_empty()),
        bio: record.text(&schema.bio),
        past_projects: past_projects.into_iter().collect(),
        social: SocialLinks {
            github: record.property(&schema.github).and_then(|p| p.url()),
        },
        name,
        is_team_lead,
        leave_date,
    })
}

/// Named files property, then the cover.
fn image_source(record: &RemoteRecord, schema: &TeamSchema) -> Option<String> {
    record
        .property(&schema.image)
        .and_then(|p| p.first_file_url())
        .or_else(|| record.cover_url())
}

async fn map_record(
    ctx: &SyncContext,
    schema: &TeamSchema,
    images: &AssetDir,
    record: RemoteRecord,
) -> RecordOutcome<TeamMember> {
    let tag = Feed::Team.log_tag();
    let Some(profile) = read_profile(&record, schema) else {
        log::warn!("[{}] Page {} skipped: missing name (title).", tag, record.id);
        return RecordOutcome::Excluded;
    };

    let mut image = String::new();
    let mut update = None;
    let mut warnings = Vec::new();

    if let Some(link) = record.property(&schema.persisted_link).and_then(|p| p.link()) {
        image = link;
    } else if let Some(url) = image_source(&record, schema) {
        match publish_image(ctx, images, &record, &url).await {
            Ok(link) => {
                update = typed_link_write(&record, &schema.persisted_link, &link, tag).map(
                    |write| {
                        PendingWriteUpdate::new(record.id.clone())
                            .with(schema.persisted_link.clone(), write)
                    },
                );
                image = link;
            }
            Err(e) => warnings.push(format!("Member {}: image: {}", profile.name, e)),
        }
    }

    RecordOutcome::Mapped {
        record: TeamMember {
            id: 0,
            name: profile.name,
            role: profile.role,
            bio: profile.bio,
            image,
            past_projects: profile.past_projects,
            social: profile.social,
            is_team_lead: profile.is_team_lead,
            leave_date: profile.leave_date,
        },
        update,
        warnings,
    }
}

/// Downloads a profile picture and publishes its square crop, or the
/// original bytes when cropping fails. Returns the public link.
async fn publish_image(
    ctx: &SyncContext,
    images: &AssetDir,
    record: &RemoteRecord,
    url: &str,
) -> Result<String, String> {
    let asset = ctx.images.fetch(url).await.map_err(|e| e.to_string())?;
    let extension = guess_extension(url, asset.content_type.as_deref());

    let temp_path = images.path(&format!("temp-{}{}", record.id, extension));
    let final_name = format!("{}.jpg", record.id);
    store_bytes(&temp_path, &asset.bytes)
        .await
        .map_err(|e| e.to_string())?;

    let published = match ctx
        .transcoder
        .derive_variant(&temp_path, &images.path(&final_name), Variant::square_crop())
        .await
    {
        Ok(()) => Ok(images.link(&final_name)),
        Err(e) => {
            log::warn!(
                "[{}] Page {}: {}. Using original extension.",
                Feed::Team.log_tag(),
                record.id,
                e
            );
            let fallback_name = format!("{}{}", record.id, extension);
            store_bytes(&images.path(&fallback_name), &asset.bytes)
                .await
                .map(|()| images.link(&fallback_name))
                .map_err(|e| e.to_string())
        }
    };

    if let Err(e) = tokio::fs::remove_file(&temp_path).await {
        log::debug!("Could not remove {}: {}", temp_path.display(), e);
    }
    published
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn record(value: serde_json::Value) -> RemoteRecord {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn role_precedence() {
        assert_eq!(determine_role(true, true, true), Role::Alumni);
        assert_eq!(determine_role(false, true, true), Role::TeamLead);
        assert_eq!(determine_role(false, false, true), Role::ProjectLead);
        assert_eq!(determine_role(false, false, false), Role::Member);
    }

    #[test]
    fn roles_serialize_to_display_names() {
        assert_eq!(serde_json::to_value(Role::TeamLead).unwrap(), json!("Team Lead"));
        assert_eq!(serde_json::to_value(Role::Alumni).unwrap(), json!("탈퇴 멤버"));
    }

    #[test]
    fn reads_profile_fields() {
        let schema = TeamSchema::default();
        let member = record(json!({
            "id": "m1",
            "properties": {
                "이름": {"type": "title", "title": [{"plain_text": "Ada"}]},
                "팀장": {"type": "checkbox", "checkbox": false},
                "프로젝트장": {"type": "multi_select", "multi_select": [{"name": "Web"}]},
                "프로젝트": {"type": "select", "select": {"name": "Bot"}},
                "참여했던 프로젝트": {"type": "multi_select", "multi_select": [{"name": "Web"}, {"name": "App"}]},
                "한 줄 소개": {"type": "rich_text", "rich_text": [{"plain_text": "Hello"}]},
                "github": {"type": "url", "url": "https://github.com/ada"}
            }
        }));

        let profile = read_profile(&member, &schema).unwrap();
        assert_eq!(profile.name, "Ada");
        assert_eq!(profile.role, Role::ProjectLead);
        assert_eq!(profile.past_projects, vec!["App", "Bot", "Web"]);
        assert_eq!(profile.bio, "Hello");
        assert_eq!(profile.social.github.as_deref(), Some("https://github.com/ada"));
        assert_eq!(profile.leave_date, None);
    }

    #[test]
    fn nameless_records_have_no_profile() {
        let schema = TeamSchema::default();
        let nameless = record(json!({
            "id": "m2",
            "properties": {"이름": {"type": "title", "title": []}}
        }));
        assert!(read_profile(&nameless, &schema).is_none());
    }

    #[test]
    fn sorts_by_role_then_id() {
        let member = |id, role| TeamMember {
            id,
            name: format!("m{}", id),
            role,
            bio: String::new(),
            image: String::new(),
            past_projects: Vec::new(),
            social: SocialLinks::default(),
            is_team_lead: role == Role::TeamLead,
            leave_date: None,
        };
        let mut members = vec![
            member(1, Role::Member),
            member(2, Role::Alumni),
            member(3, Role::TeamLead),
            member(4, Role::ProjectLead),
            member(5, Role::Member),
        ];
        sort_by_role(&mut members);
        let ids: Vec<usize> = members.iter().map(|m| m.id).collect();
        assert_eq!(ids, vec![3, 4, 1, 5, 2]);
    }
}
