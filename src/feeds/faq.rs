//! FAQ feed: question/answer pairs ordered by an explicit weight.

use super::{
    assign_ids, finish, partition, Feed, FailurePolicy, RecordOutcome, SyncContext, SyncReport,
    WriteBackMode,
};
use crate::api::{collect_all, DatabaseQuery};
use crate::constants::FAQ_DEFAULT_SORT_WEIGHT;
use crate::error::AppError;
use crate::model::{PropertyKind, RemoteRecord};
use crate::pipeline::FeedSync;
use crate::types::{DatabaseId, PropertyName};
use serde::{Serialize, Serializer};

const OUTPUT_FILE: &str = "contact-faq.generated.json";

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FaqItem {
    pub id: usize,
    pub question: String,
    pub answer: String,
    #[serde(serialize_with = "serialize_weight")]
    pub sort_weight: f64,
}

/// Whole weights are written as integers, matching what the site expects.
fn serialize_weight<S: Serializer>(weight: &f64, serializer: S) -> Result<S::Ok, S::Error> {
    if weight.fract() == 0.0 && weight.abs() < 9.0e15 {
        serializer.serialize_i64(*weight as i64)
    } else {
        serializer.serialize_f64(*weight)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FaqSchema {
    pub question: PropertyName,
    pub answer: PropertyName,
    pub sort_weight: PropertyName,
}

impl Default for FaqSchema {
    fn default() -> Self {
        Self {
            question: "질문".into(),
            answer: "답변".into(),
            sort_weight: "정렬 가중치".into(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct FaqFeed {
    pub database: DatabaseId,
    pub schema: FaqSchema,
    pub policy: FailurePolicy,
}

impl FaqFeed {
    pub fn new(database: DatabaseId) -> Self {
        Self {
            database,
            schema: FaqSchema::default(),
            policy: FailurePolicy::BestEffort,
        }
    }
}

#[async_trait::async_trait]
impl FeedSync for FaqFeed {
    fn feed(&self) -> Feed {
        Feed::Faq
    }

    async fn sync(&self, ctx: &SyncContext) -> Result<SyncReport, AppError> {
        let tag = Feed::Faq.log_tag();
        log::info!("[{}] Fetching FAQ entries from Notion database...", tag);

        let records = collect_all(&ctx.client, &self.database, &DatabaseQuery::new()).await?;
        let outcomes: Vec<_> = records
            .iter()
            .map(|record| map_record(record, &self.schema))
            .collect();

        let mut partitioned = partition(outcomes);
        partitioned.enforce(self.policy, Feed::Faq)?;
        // Stable: equal weights keep their query order.
        partitioned
            .records
            .sort_by(|a, b| a.sort_weight.total_cmp(&b.sort_weight));
        assign_ids(&mut partitioned.records, |item, id| item.id = id);

        // FAQ entries carry no derived links, so nothing is ever staged.
        finish(
            ctx,
            Feed::Faq,
            ctx.layout.data_file(OUTPUT_FILE),
            partitioned,
            &WriteBackMode::Inline,
        )
        .await
    }
}

/// Named property, else the first title.
fn question(record: &RemoteRecord, schema: &FaqSchema) -> String {
    let named = record.text(&schema.question);
    if named.is_empty() {
        record.title_text()
    } else {
        named
    }
}

/// Named property, else the first non-empty rich_text.
fn answer(record: &RemoteRecord, schema: &FaqSchema) -> String {
    let named = record.text(&schema.answer);
    if !named.is_empty() {
        return named;
    }
    record
        .properties
        .values()
        .filter(|p| p.kind() == PropertyKind::RichText)
        .map(|p| p.plain_text())
        .find(|text| !text.is_empty())
        .unwrap_or_default()
}

fn sort_weight(record: &RemoteRecord, schema: &FaqSchema) -> f64 {
    record
        .property(&schema.sort_weight)
        .and_then(|p| p.number())
        .unwrap_or(FAQ_DEFAULT_SORT_WEIGHT)
}

fn map_record(record: &RemoteRecord, schema: &FaqSchema) -> RecordOutcome<FaqItem> {
    let question = question(record, schema);
    let answer = answer(record, schema);

    if question.is_empty() || answer.is_empty() {
        log::warn!(
            "[{}] Page {} skipped: missing question or answer.",
            Feed::Faq.log_tag(),
            record.id
        );
        return RecordOutcome::Excluded;
    }

    RecordOutcome::mapped(FaqItem {
        id: 0,
        question,
        answer,
        sort_weight: sort_weight(record, schema),
    })
}
