// tests/team_sync.rs
//! Team runs: role ordering, best-effort images and deferred write-backs.

mod common;

use common::{
    context, query_page, read_json, FakeImageSource, FakeTranscoder, ScriptedTransport, DATABASE,
};
use notion2site::{DatabaseId, FeedSync, HttpMethod, TeamFeed, Variant};
use pretty_assertions::assert_eq;
use serde_json::{json, Value};
use std::sync::Arc;

fn member(id: &str, name: &str, extra: Value) -> Value {
    let mut properties = json!({
        "이름": {"type": "title", "title": [{"plain_text": name}]},
        "팀장": {"type": "checkbox", "checkbox": false},
        "프로젝트장": {"type": "multi_select", "multi_select": []},
        "S3 link": {"type": "url", "url": null},
    });
    if let (Some(target), Some(extra)) = (properties.as_object_mut(), extra.as_object()) {
        for (key, value) in extra {
            target.insert(key.clone(), value.clone());
        }
    }
    json!({"id": id, "created_time": "2024-01-01T00:00:00.000Z", "properties": properties})
}

fn photo(url: &str) -> Value {
    json!({"type": "files", "files": [{"type": "file", "name": "me", "file": {"url": url}}]})
}

#[tokio::test]
async fn members_are_ordered_by_role_and_links_are_staged() {
    let root = tempfile::tempdir().unwrap();
    let transport = ScriptedTransport::new([query_page(
        vec![
            member("t1", "Alice", json!({
                "프로필 사진": photo("https://img.test/alice.png"),
                "프로젝트": {"type": "multi_select", "multi_select": [{"name": "Web"}, {"name": "App"}]},
                "github": {"type": "url", "url": "https://github.com/alice"},
                "한 줄 소개": {"type": "rich_text", "rich_text": [{"plain_text": "Hello"}]}
            })),
            member("t2", "Bob", json!({"팀장": {"type": "checkbox", "checkbox": true}})),
            member("t3", "Carol", json!({
                "팀장": {"type": "checkbox", "checkbox": true},
                "탈퇴일": {"type": "date", "date": {"start": "2024-03-01"}}
            })),
            member("t4", "Dan", json!({
                "프로젝트장": {"type": "multi_select", "multi_select": [{"name": "Web"}]},
                "프로필 사진": photo("https://img.test/missing.png")
            })),
            member("t5", "", json!({})),
        ],
        None,
    )]);
    let images = Arc::new(
        FakeImageSource::default().with("https://img.test/alice.png", "image/png", b"alice"),
    );
    let transcoder = Arc::new(FakeTranscoder::default());
    let ctx = context(transport.clone(), images, transcoder.clone(), root.path());

    let report = TeamFeed::new(DatabaseId::parse(DATABASE).unwrap())
        .sync(&ctx)
        .await
        .unwrap();

    assert_eq!(report.attempted, 5);
    assert_eq!(report.written, 4);
    assert_eq!(report.excluded, 1);
    assert_eq!(report.failed, 1);
    assert!(report.failures[0].contains("Dan"));
    assert_eq!(report.staged_updates, 1);

    let query = &transport.requests()[0];
    assert_eq!(query.body.as_ref().unwrap()["sorts"][0]["property"], json!("가입일"));

    let members = read_json(&root.path().join("src/data/team.generated.json"));
    let summary: Vec<(Value, Value, Value)> = members
        .as_array()
        .unwrap()
        .iter()
        .map(|m| (m["id"].clone(), m["name"].clone(), m["role"].clone()))
        .collect();
    assert_eq!(
        summary,
        vec![
            (json!(2), json!("Bob"), json!("Team Lead")),
            (json!(4), json!("Dan"), json!("Project Lead")),
            (json!(1), json!("Alice"), json!("Member")),
            (json!(3), json!("Carol"), json!("탈퇴 멤버")),
        ]
    );

    let alice = &members[2];
    assert_eq!(alice["image"], json!("/images/team/t1.jpg"));
    assert_eq!(alice["pastProjects"], json!(["App", "Web"]));
    assert_eq!(alice["social"], json!({"github": "https://github.com/alice"}));
    assert_eq!(alice["bio"], json!("Hello"));
    assert_eq!(alice["isTeamLead"], json!(false));
    assert_eq!(alice["leaveDate"], Value::Null);

    // A failed download keeps the member without an image.
    assert_eq!(members[1]["image"], json!(""));
    assert_eq!(members[3]["leaveDate"], json!("2024-03-01"));
    assert_eq!(members[3]["isTeamLead"], json!(true));

    let team_dir = root.path().join("public/images/team");
    assert_eq!(std::fs::read(team_dir.join("t1.jpg")).unwrap(), b"alice");
    assert!(!team_dir.join("temp-t1.png").exists());
    assert!(matches!(transcoder.calls()[0].2, Variant::SquareCrop { size: 512, .. }));

    // Write-backs are deferred, not applied.
    assert!(transport.requests_with(HttpMethod::Patch).is_empty());
    let pending = read_json(&root.path().join("src/data/team.pending-link-updates.json"));
    assert_eq!(
        pending,
        json!([{
            "recordId": "t1",
            "properties": {"S3 link": {"type": "url", "value": "/images/team/t1.jpg"}}
        }])
    );
}

#[tokio::test]
async fn member_with_unreachable_photo_is_kept_and_counted_as_failed() {
    let root = tempfile::tempdir().unwrap();
    let transport = ScriptedTransport::new([query_page(
        vec![member("t1", "Eve", json!({"프로필 사진": photo("https://img.test/gone.png")}))],
        None,
    )]);
    let ctx = context(
        transport,
        Arc::new(FakeImageSource::default()),
        Arc::new(FakeTranscoder::default()),
        root.path(),
    );

    let report = TeamFeed::new(DatabaseId::parse(DATABASE).unwrap())
        .sync(&ctx)
        .await
        .unwrap();

    assert_eq!(
        (report.attempted, report.written, report.failed, report.excluded),
        (1, 1, 1, 0)
    );
    assert_eq!(report.failures.len(), 1);
    assert!(report.failures[0].starts_with("Member Eve: image:"));
    assert_eq!(report.staged_updates, 0);

    let members = read_json(&root.path().join("src/data/team.generated.json"));
    assert_eq!(members[0]["name"], json!("Eve"));
    assert_eq!(members[0]["image"], json!(""));
}

#[tokio::test]
async fn crop_failure_publishes_original_bytes() {
    let root = tempfile::tempdir().unwrap();
    let transport = ScriptedTransport::new([query_page(
        vec![member("t1", "Alice", json!({"프로필 사진": photo("https://img.test/alice.webp")}))],
        None,
    )]);
    let images = Arc::new(
        FakeImageSource::default().with("https://img.test/alice.webp", "image/webp", b"raw"),
    );
    let ctx = context(transport, images, Arc::new(FakeTranscoder::broken()), root.path());

    TeamFeed::new(DatabaseId::parse(DATABASE).unwrap())
        .sync(&ctx)
        .await
        .unwrap();

    let members = read_json(&root.path().join("src/data/team.generated.json"));
    assert_eq!(members[0]["image"], json!("/images/team/t1.webp"));
    let team_dir = root.path().join("public/images/team");
    assert_eq!(std::fs::read(team_dir.join("t1.webp")).unwrap(), b"raw");
    assert!(!team_dir.join("temp-t1.webp").exists());
}

#[tokio::test]
async fn persisted_links_skip_downloads_and_stage_nothing() {
    let root = tempfile::tempdir().unwrap();
    let transport = ScriptedTransport::new([query_page(
        vec![member("t1", "Alice", json!({
            "프로필 사진": photo("https://img.test/alice.png"),
            "S3 link": {"type": "url", "url": "/images/team/t1.jpg"}
        }))],
        None,
    )]);
    let images = Arc::new(FakeImageSource::default());
    let ctx = context(transport, images.clone(), Arc::new(FakeTranscoder::default()), root.path());

    let report = TeamFeed::new(DatabaseId::parse(DATABASE).unwrap())
        .sync(&ctx)
        .await
        .unwrap();

    assert!(images.fetched().is_empty());
    assert_eq!(report.staged_updates, 0);
    let pending = read_json(&root.path().join("src/data/team.pending-link-updates.json"));
    assert_eq!(pending, json!([]));
}
