use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, SecondsFormat, Utc};
use reqwest::Method;
use reqwest::header::{AUTHORIZATION, HeaderMap, HeaderValue};
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::json;
use tracing::debug;
use uuid::Uuid;

use super::error::{StoreError, StoreResult};
use super::{RecentItemsQuery, Store, lease_expiry};
use crate::constants::ANALYSIS_WRITE_RETRIES;
use crate::model::{
    Claim, ClaimAnalysisUpdate, ClaimStatus, EnrichmentJob, Item, JobStatus, MatchEdge,
    NewNotification, Notification, PotentialMatch, Question, ResolutionStatus,
};

const ITEMS: &str = "items";
const QUESTIONS: &str = "questions";
const CLAIMS: &str = "claims";
const MATCHES: &str = "potential_matches";
const NOTIFICATIONS: &str = "notifications";
const JOBS: &str = "enrichment_jobs";

const RETURN_REPRESENTATION: &str = "return=representation";
const MERGE_DUPLICATES: &str = "resolution=merge-duplicates,return=representation";

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(15);

#[derive(Debug, Clone)]
pub struct RestStoreConfig {
    /// PostgREST root, e.g. `https://<project>.supabase.co/rest/v1`.
    pub base_url: String,
    /// Service key sent as both `apikey` and bearer token.
    pub service_key: String,
    pub timeout: Duration,
}

impl RestStoreConfig {
    pub fn new(base_url: impl Into<String>, service_key: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            service_key: service_key.into(),
            timeout: DEFAULT_TIMEOUT,
        }
    }
}

/// [`Store`] over a PostgREST endpoint.
///
/// Match rows rely on a unique `(item_id, matched_item_id)` constraint and
/// claim analysis writes on an `analysis_version` column.
#[derive(Clone)]
pub struct RestStore {
    http: reqwest::Client,
    base_url: String,
}

impl std::fmt::Debug for RestStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RestStore")
            .field("base_url", &self.base_url)
            .finish()
    }
}

fn eq(value: impl std::fmt::Display) -> String {
    format!("eq.{value}")
}

fn timestamp(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Micros, true)
}

impl RestStore {
    pub fn new(config: RestStoreConfig) -> StoreResult<Self> {
        let invalid = |e: reqwest::header::InvalidHeaderValue| StoreError::InvalidConfig {
            reason: format!("service key is not a valid header value: {e}"),
        };

        let mut headers = HeaderMap::new();
        headers.insert(
            "apikey",
            HeaderValue::from_str(&config.service_key).map_err(invalid)?,
        );
        headers.insert(
            AUTHORIZATION,
            HeaderValue::from_str(&format!("Bearer {}", config.service_key)).map_err(invalid)?,
        );

        let http = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(config.timeout)
            .build()?;

        Ok(Self {
            http,
            base_url: config.base_url.trim_end_matches('/').to_string(),
        })
    }

    fn url(&self, table: &str) -> String {
        format!("{}/{table}", self.base_url)
    }

    async fn select<T: DeserializeOwned>(
        &self,
        table: &str,
        query: &[(&str, String)],
    ) -> StoreResult<Vec<T>> {
        let response = self
            .http
            .get(self.url(table))
            .query(&[("select", "*")])
            .query(query)
            .send()
            .await?;
        Self::rows(table, response).await
    }

    async fn write<T: DeserializeOwned, B: Serialize + ?Sized>(
        &self,
        method: Method,
        table: &str,
        query: &[(&str, String)],
        body: &B,
        prefer: &str,
    ) -> StoreResult<Vec<T>> {
        let response = self
            .http
            .request(method, self.url(table))
            .query(query)
            .header("Prefer", prefer)
            .json(body)
            .send()
            .await?;
        Self::rows(table, response).await
    }

    async fn rows<T: DeserializeOwned>(
        table: &str,
        response: reqwest::Response,
    ) -> StoreResult<Vec<T>> {
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(StoreError::Http {
                table: table.to_string(),
                status: status.as_u16(),
                body,
            });
        }
        response.json().await.map_err(|e| StoreError::Decode {
            table: table.to_string(),
            reason: e.to_string(),
        })
    }

    async fn patch_one<T: DeserializeOwned, B: Serialize + ?Sized>(
        &self,
        table: &str,
        entity: &'static str,
        id: Uuid,
        body: &B,
    ) -> StoreResult<T> {
        self.write(Method::PATCH, table, &[("id", eq(id))], body, RETURN_REPRESENTATION)
            .await?
            .into_iter()
            .next()
            .ok_or(StoreError::NotFound { entity, id })
    }

    async fn insert_one<T: DeserializeOwned, B: Serialize + ?Sized>(
        &self,
        table: &str,
        body: &B,
    ) -> StoreResult<T> {
        self.write(Method::POST, table, &[], body, RETURN_REPRESENTATION)
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| StoreError::Decode {
                table: table.to_string(),
                reason: "insert returned no row".to_string(),
            })
    }

    async fn patch_job(&self, id: Uuid, body: serde_json::Value) -> StoreResult<()> {
        let _: EnrichmentJob = self.patch_one(JOBS, "job", id, &body).await?;
        Ok(())
    }
}

#[async_trait]
impl Store for RestStore {
    async fn insert_item(&self, item: Item) -> StoreResult<Item> {
        self.insert_one(ITEMS, &item).await
    }

    async fn get_item(&self, id: Uuid) -> StoreResult<Option<Item>> {
        let rows: Vec<Item> = self.select(ITEMS, &[("id", eq(id))]).await?;
        Ok(rows.into_iter().next())
    }

    async fn get_items(&self, ids: &[Uuid]) -> StoreResult<Vec<Item>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        let list = ids
            .iter()
            .map(Uuid::to_string)
            .collect::<Vec<_>>()
            .join(",");
        self.select(ITEMS, &[("id", format!("in.({list})"))]).await
    }

    async fn set_item_embedding(&self, id: Uuid, embedding: &[f32]) -> StoreResult<()> {
        let _: Item = self
            .patch_one(ITEMS, "item", id, &json!({ "embedding": embedding }))
            .await?;
        Ok(())
    }

    async fn recent_items(&self, query: RecentItemsQuery) -> StoreResult<Vec<Item>> {
        self.select(
            ITEMS,
            &[
                ("status", eq(query.status)),
                ("is_active", eq(true)),
                ("resolution_status", "neq.confirmed".to_string()),
                ("user_id", format!("neq.{}", query.exclude_owner)),
                ("id", format!("neq.{}", query.exclude_item)),
                ("order", "created_at.desc".to_string()),
                ("limit", query.limit.to_string()),
            ],
        )
        .await
    }

    async fn request_resolution(
        &self,
        item_id: Uuid,
        claim_id: Uuid,
        at: DateTime<Utc>,
    ) -> StoreResult<()> {
        let _: Item = self
            .patch_one(
                ITEMS,
                "item",
                item_id,
                &json!({
                    "resolution_status": ResolutionStatus::Pending,
                    "resolved_claim_id": claim_id,
                    "resolution_requested_at": timestamp(at),
                }),
            )
            .await?;
        Ok(())
    }

    async fn insert_question(&self, question: Question) -> StoreResult<Question> {
        self.insert_one(QUESTIONS, &question).await
    }

    async fn questions_for_item(&self, item_id: Uuid) -> StoreResult<Vec<Question>> {
        self.select(QUESTIONS, &[("item_id", eq(item_id))]).await
    }

    async fn insert_claim(&self, claim: Claim) -> StoreResult<Claim> {
        self.insert_one(CLAIMS, &claim).await
    }

    async fn get_claim(&self, id: Uuid) -> StoreResult<Option<Claim>> {
        let rows: Vec<Claim> = self.select(CLAIMS, &[("id", eq(id))]).await?;
        Ok(rows.into_iter().next())
    }

    /// Read, apply locally, then PATCH conditioned on the version that was
    /// read. An empty representation means another writer got there first.
    async fn update_claim_analysis(
        &self,
        id: Uuid,
        update: &ClaimAnalysisUpdate,
    ) -> StoreResult<Claim> {
        for attempt in 1..=ANALYSIS_WRITE_RETRIES {
            let mut claim = self
                .get_claim(id)
                .await?
                .ok_or(StoreError::NotFound { entity: "claim", id })?;
            let expected = claim.analysis_version;
            claim.apply_analysis_update(update);

            let body = json!({
                "ai_verdict": claim.ai_verdict,
                "ai_analysis": claim.ai_analysis,
                "ai_question_analysis": claim.ai_question_analysis,
                "analysis_version": claim.analysis_version,
            });
            let rows: Vec<Claim> = self
                .write(
                    Method::PATCH,
                    CLAIMS,
                    &[("id", eq(id)), ("analysis_version", eq(expected))],
                    &body,
                    RETURN_REPRESENTATION,
                )
                .await?;

            if let Some(row) = rows.into_iter().next() {
                return Ok(row);
            }
            debug!(claim_id = %id, attempt, "Analysis write raced another writer");
        }

        Err(StoreError::Conflict {
            entity: "claim",
            id,
            attempts: ANALYSIS_WRITE_RETRIES,
        })
    }

    async fn set_claim_status(&self, id: Uuid, status: ClaimStatus) -> StoreResult<Claim> {
        self.patch_one(
            CLAIMS,
            "claim",
            id,
            &json!({ "status": status, "reviewed_at": timestamp(Utc::now()) }),
        )
        .await
    }

    async fn upsert_match(&self, edge: &MatchEdge) -> StoreResult<PotentialMatch> {
        // `is_dismissed` is left out of the payload so a re-score keeps it.
        let body = json!({
            "item_id": edge.item_id,
            "matched_item_id": edge.matched_item_id,
            "confidence_score": edge.confidence_score,
            "reasoning": edge.reasoning,
            "updated_at": timestamp(Utc::now()),
        });
        self.write(
            Method::POST,
            MATCHES,
            &[("on_conflict", "item_id,matched_item_id".to_string())],
            &body,
            MERGE_DUPLICATES,
        )
        .await?
        .into_iter()
        .next()
        .ok_or_else(|| StoreError::Decode {
            table: MATCHES.to_string(),
            reason: "upsert returned no row".to_string(),
        })
    }

    async fn matches_for_item(&self, item_id: Uuid) -> StoreResult<Vec<PotentialMatch>> {
        self.select(
            MATCHES,
            &[
                ("item_id", eq(item_id)),
                ("is_dismissed", eq(false)),
                ("order", "confidence_score.desc,updated_at.desc".to_string()),
            ],
        )
        .await
    }

    async fn dismiss_match(&self, match_id: Uuid) -> StoreResult<PotentialMatch> {
        self.patch_one(
            MATCHES,
            "match",
            match_id,
            &json!({ "is_dismissed": true, "updated_at": timestamp(Utc::now()) }),
        )
        .await
    }

    async fn insert_notification(
        &self,
        notification: NewNotification,
    ) -> StoreResult<Notification> {
        self.insert_one(NOTIFICATIONS, &notification).await
    }

    async fn enqueue_job(&self, job: EnrichmentJob) -> StoreResult<EnrichmentJob> {
        self.insert_one(JOBS, &job).await
    }

    /// Each candidate is claimed with a PATCH conditioned on its attempt
    /// count, so two workers never lease the same row.
    async fn lease_due_jobs(
        &self,
        now: DateTime<Utc>,
        limit: usize,
        lease: Duration,
    ) -> StoreResult<Vec<EnrichmentJob>> {
        let candidates: Vec<EnrichmentJob> = self
            .select(
                JOBS,
                &[
                    ("status", "in.(queued,running)".to_string()),
                    ("run_at", format!("lte.{}", timestamp(now))),
                    ("order", "run_at.asc".to_string()),
                    ("limit", limit.to_string()),
                ],
            )
            .await?;

        let expiry = timestamp(lease_expiry(now, lease));
        let mut leased = Vec::with_capacity(candidates.len());
        for job in candidates {
            let rows: Vec<EnrichmentJob> = self
                .write(
                    Method::PATCH,
                    JOBS,
                    &[
                        ("id", eq(job.id)),
                        ("attempts", eq(job.attempts)),
                        ("status", eq(job.status.as_str())),
                    ],
                    &json!({
                        "status": JobStatus::Running,
                        "attempts": job.attempts + 1,
                        "run_at": expiry,
                    }),
                    RETURN_REPRESENTATION,
                )
                .await?;
            leased.extend(rows);
        }
        Ok(leased)
    }

    async fn complete_job(&self, id: Uuid) -> StoreResult<()> {
        self.patch_job(
            id,
            json!({ "status": JobStatus::Succeeded, "last_error": null }),
        )
        .await
    }

    async fn reschedule_job(
        &self,
        id: Uuid,
        run_at: DateTime<Utc>,
        error: &str,
    ) -> StoreResult<()> {
        self.patch_job(
            id,
            json!({
                "status": JobStatus::Queued,
                "run_at": timestamp(run_at),
                "last_error": error,
            }),
        )
        .await
    }

    async fn fail_job(&self, id: Uuid, error: &str) -> StoreResult<()> {
        self.patch_job(id, json!({ "status": JobStatus::Failed, "last_error": error }))
            .await
    }
}
