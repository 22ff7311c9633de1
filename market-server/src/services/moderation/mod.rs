//! Moderation Workflow
//!
//! Staged-mutation engine shared by the category, product, and merchant
//! domains. A submission is validated and parked in the domain's request
//! table; accepting deletes the request row and applies the mutation in one
//! transaction, rejecting deletes the row and records a reason. The
//! rows-affected count of the request delete is the guard against two
//! moderators consuming the same request.
//!
//! Blob cleanup always happens after commit and never fails the decision.

pub mod category;
pub mod merchant;
pub mod product;

pub use category::CategoryModeration;
pub use merchant::MerchantModeration;
pub use product::ProductModeration;

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use sqlx::{SqliteConnection, SqlitePool};
use std::marker::PhantomData;
use std::sync::Arc;

use crate::db;
use crate::error::{ServiceError, ServiceResult};
use crate::services::blob::{BlobStore, cleanup_best_effort};
use crate::services::notify::{self, NotificationSink};
use crate::validation::{MAX_NOTE_LEN, validate_required_text};
use shared::error::AppError;
use shared::models::{
    MessageKind, ModerationKind, ModerationRequest, Notification, RequestSummary,
};
use shared::util::{now_millis, snowflake_id};

/// Deletion payload, identical across domains
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeleteDoc {
    pub target_id: i64,
}

/// One submission: exactly one proposed mutation, tagged by kind
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "kind", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SubmitPayload<C, U> {
    Create(C),
    Update(U),
    Delete(DeleteDoc),
}

/// What one moderated domain contributes to the shared engine: payload
/// types, validation, and the actual mutation. `apply_*` functions run on
/// the accept transaction and return the blob keys their mutation
/// superseded.
#[async_trait]
pub trait ModerationDomain: Send + Sync + 'static {
    /// Display name used in notifications, e.g. "Category"
    const ENTITY: &'static str;
    /// Pending-request table for this domain
    const REQUEST_TABLE: &'static str;

    type CreateDoc: Serialize + DeserializeOwned + Send + Sync;
    type UpdateDoc: Serialize + DeserializeOwned + Send + Sync;

    async fn validate_create(
        conn: &mut SqliteConnection,
        doc: &Self::CreateDoc,
    ) -> ServiceResult<()>;
    async fn validate_update(
        conn: &mut SqliteConnection,
        doc: &Self::UpdateDoc,
    ) -> ServiceResult<()>;
    async fn validate_delete(conn: &mut SqliteConnection, target_id: i64) -> ServiceResult<()>;

    async fn apply_create(
        conn: &mut SqliteConnection,
        doc: Self::CreateDoc,
        submitter: i64,
    ) -> ServiceResult<Vec<String>>;
    async fn apply_update(
        conn: &mut SqliteConnection,
        doc: Self::UpdateDoc,
    ) -> ServiceResult<Vec<String>>;
    async fn apply_delete(
        conn: &mut SqliteConnection,
        target_id: i64,
    ) -> ServiceResult<Vec<String>>;

    /// Name shown to the submitter in decision notifications
    fn display_name(kind: ModerationKind, payload: &serde_json::Value) -> String;

    /// Live entity a pending request targets, if any (UPDATE/DELETE)
    fn target_id(kind: ModerationKind, payload: &serde_json::Value) -> Option<i64>;

    /// Blob keys uploaded alongside a CREATE submission, deleted when that
    /// submission is rejected. Domains without imagery return none.
    fn speculative_keys(_payload: &serde_json::Value) -> Vec<String> {
        vec![]
    }

    /// Serialized view of the live target entity for request listings
    async fn entity_summary(
        conn: &mut SqliteConnection,
        id: i64,
    ) -> ServiceResult<Option<serde_json::Value>>;
}

pub struct ModerationService<D: ModerationDomain> {
    pool: SqlitePool,
    sink: Arc<dyn NotificationSink>,
    blobs: Arc<dyn BlobStore>,
    _domain: PhantomData<D>,
}

impl<D: ModerationDomain> ModerationService<D> {
    pub fn new(pool: SqlitePool, sink: Arc<dyn NotificationSink>, blobs: Arc<dyn BlobStore>) -> Self {
        Self {
            pool,
            sink,
            blobs,
            _domain: PhantomData,
        }
    }

    /// Validate and park a proposed mutation. Nothing is applied yet.
    pub async fn submit(
        &self,
        submitter: i64,
        payload: SubmitPayload<D::CreateDoc, D::UpdateDoc>,
    ) -> ServiceResult<ModerationRequest> {
        let mut conn = self.pool.acquire().await?;
        let (kind, payload_json) = match &payload {
            SubmitPayload::Create(doc) => {
                D::validate_create(&mut conn, doc).await?;
                (ModerationKind::Create, serde_json::to_string(doc)?)
            }
            SubmitPayload::Update(doc) => {
                D::validate_update(&mut conn, doc).await?;
                (ModerationKind::Update, serde_json::to_string(doc)?)
            }
            SubmitPayload::Delete(doc) => {
                D::validate_delete(&mut conn, doc.target_id).await?;
                (ModerationKind::Delete, serde_json::to_string(doc)?)
            }
        };

        let request = ModerationRequest {
            id: snowflake_id(),
            kind,
            payload_json,
            submitted_by: submitter,
            created_at: now_millis(),
        };
        insert_request(&mut conn, D::REQUEST_TABLE, &request).await?;

        tracing::info!(
            request_id = request.id,
            kind = kind.as_str(),
            entity = D::ENTITY,
            "Moderation request submitted"
        );
        Ok(request)
    }

    /// Consume a pending request and apply its mutation.
    pub async fn accept(&self, request_id: i64) -> ServiceResult<String> {
        let mut tx = self.pool.begin().await?;

        let request = fetch_request(&mut tx, D::REQUEST_TABLE, request_id)
            .await?
            .ok_or_else(|| ServiceError::from(AppError::not_found("No request found")))?;
        consume_request(&mut tx, D::REQUEST_TABLE, request_id).await?;

        let payload: serde_json::Value = serde_json::from_str(&request.payload_json)?;
        let display = D::display_name(request.kind, &payload);

        let superseded = match request.kind {
            ModerationKind::Create => {
                let doc: D::CreateDoc = serde_json::from_value(payload)?;
                D::apply_create(&mut tx, doc, request.submitted_by).await?
            }
            ModerationKind::Update => {
                let doc: D::UpdateDoc = serde_json::from_value(payload)?;
                D::apply_update(&mut tx, doc).await?
            }
            ModerationKind::Delete => {
                let doc: DeleteDoc = serde_json::from_value(payload)?;
                D::apply_delete(&mut tx, doc.target_id).await?
            }
        };
        tx.commit().await?;

        cleanup_best_effort(self.blobs.as_ref(), &superseded).await;
        notify::dispatch(
            &self.sink,
            Notification::new(
                MessageKind::Accept,
                D::ENTITY,
                format!(
                    "Your {} request on {} has been accepted.",
                    request.kind.as_str(),
                    display
                ),
                request.submitted_by,
            ),
        );
        Ok("Request accepted".to_string())
    }

    /// Consume a pending request without applying it. The reason is
    /// mandatory and travels to the submitter verbatim.
    pub async fn reject(&self, request_id: i64, reason: &str) -> ServiceResult<String> {
        let reason = reason.trim();
        validate_required_text(reason, "reason", MAX_NOTE_LEN)?;

        let mut tx = self.pool.begin().await?;
        let request = fetch_request(&mut tx, D::REQUEST_TABLE, request_id)
            .await?
            .ok_or_else(|| ServiceError::from(AppError::not_found("No request found")))?;
        consume_request(&mut tx, D::REQUEST_TABLE, request_id).await?;
        tx.commit().await?;

        let payload: serde_json::Value = serde_json::from_str(&request.payload_json)?;
        if request.kind == ModerationKind::Create {
            // Images uploaded with the proposal are now unreferenced
            cleanup_best_effort(self.blobs.as_ref(), &D::speculative_keys(&payload)).await;
        }

        // The reason is mandatory, so a long one is clipped to the ring
        // limit rather than letting sanitize drop the whole notice
        notify::dispatch(
            &self.sink,
            Notification::new(
                MessageKind::Reject,
                D::ENTITY,
                format!(
                    "Your {} request on {} has been rejected.\n Reason: {reason}",
                    request.kind.as_str(),
                    D::display_name(request.kind, &payload),
                ),
                request.submitted_by,
            )
            .clipped(),
        );
        Ok("Request rejected".to_string())
    }

    /// All pending requests with submitter and live target dereferenced.
    pub async fn list(&self) -> ServiceResult<Vec<RequestSummary>> {
        let mut conn = self.pool.acquire().await?;
        let rows = sqlx::query_as::<_, ModerationRequest>(&format!(
            "SELECT * FROM {} ORDER BY created_at",
            D::REQUEST_TABLE
        ))
        .fetch_all(&mut *conn)
        .await?;

        let mut summaries = Vec::with_capacity(rows.len());
        for row in rows {
            let payload: serde_json::Value = serde_json::from_str(&row.payload_json)?;
            let submitter = db::user_account::summary(&mut conn, row.submitted_by).await?;
            let target = match D::target_id(row.kind, &payload) {
                Some(id) => D::entity_summary(&mut conn, id).await?,
                None => None,
            };
            summaries.push(RequestSummary {
                id: row.id,
                kind: row.kind,
                payload,
                submitter,
                target,
                created_at: row.created_at,
            });
        }
        Ok(summaries)
    }
}

async fn insert_request(
    conn: &mut SqliteConnection,
    table: &str,
    request: &ModerationRequest,
) -> ServiceResult<()> {
    sqlx::query(&format!(
        "INSERT INTO {table} (id, kind, payload_json, submitted_by, created_at)
         VALUES (?, ?, ?, ?, ?)"
    ))
    .bind(request.id)
    .bind(request.kind)
    .bind(&request.payload_json)
    .bind(request.submitted_by)
    .bind(request.created_at)
    .execute(conn)
    .await?;
    Ok(())
}

async fn fetch_request(
    conn: &mut SqliteConnection,
    table: &str,
    id: i64,
) -> ServiceResult<Option<ModerationRequest>> {
    let request =
        sqlx::query_as::<_, ModerationRequest>(&format!("SELECT * FROM {table} WHERE id = ?"))
            .bind(id)
            .fetch_optional(conn)
            .await?;
    Ok(request)
}

/// Delete the request row; zero rows affected means another decision
/// already consumed it, so the caller's mutation must not run.
async fn consume_request(conn: &mut SqliteConnection, table: &str, id: i64) -> ServiceResult<()> {
    let deleted = sqlx::query(&format!("DELETE FROM {table} WHERE id = ?"))
        .bind(id)
        .execute(conn)
        .await?
        .rows_affected();
    if deleted == 0 {
        return Err(AppError::not_found("No request found").into());
    }
    Ok(())
}

/// Any pending request in `table` whose payload carries `value` at the JSON
/// `path` (case-insensitive, for names)
pub(crate) async fn pending_with_text(
    conn: &mut SqliteConnection,
    table: &str,
    path: &str,
    value: &str,
) -> ServiceResult<bool> {
    let count: i64 = sqlx::query_scalar(&format!(
        "SELECT COUNT(*) FROM {table}
         WHERE json_extract(payload_json, '{path}') = ? COLLATE NOCASE"
    ))
    .bind(value)
    .fetch_one(conn)
    .await?;
    Ok(count > 0)
}

/// Any pending request in `table` whose payload carries `value` at the JSON
/// `path` (entity IDs)
pub(crate) async fn pending_with_id(
    conn: &mut SqliteConnection,
    table: &str,
    path: &str,
    value: i64,
) -> ServiceResult<bool> {
    let count: i64 = sqlx::query_scalar(&format!(
        "SELECT COUNT(*) FROM {table}
         WHERE json_extract(payload_json, '{path}') = ?"
    ))
    .bind(value)
    .fetch_one(conn)
    .await?;
    Ok(count > 0)
}

/// Pending request targeting an existing entity, under either the update
/// payload's own ID field or a delete payload's `target_id`
pub(crate) async fn pending_targeting(
    conn: &mut SqliteConnection,
    table: &str,
    id_path: &str,
    id: i64,
) -> ServiceResult<bool> {
    Ok(pending_with_id(conn, table, id_path, id).await?
        || pending_with_id(conn, table, "$.target_id", id).await?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::test_pool;
    use crate::services::blob::testing::RecordingStore;
    use crate::services::notify::testing::RecordingSink;
    use crate::testutil::{seed_category, seed_merchant, seed_product_for, seed_user};
    use shared::models::notification::MAX_BODY_LEN;
    use shared::models::{CategoryCreateDoc, Role};

    fn service<D: ModerationDomain>(
        pool: SqlitePool,
    ) -> (ModerationService<D>, Arc<RecordingSink>, Arc<RecordingStore>) {
        let sink = Arc::new(RecordingSink::default());
        let blobs = Arc::new(RecordingStore::default());
        let svc = ModerationService::new(pool, sink.clone() as _, blobs.clone() as _);
        (svc, sink, blobs)
    }

    fn create_doc(name: &str) -> SubmitPayload<CategoryCreateDoc, shared::models::CategoryUpdateDoc> {
        SubmitPayload::Create(CategoryCreateDoc {
            name: name.to_string(),
            description: "test".to_string(),
        })
    }

    async fn delivered_count(sink: &RecordingSink) -> usize {
        // Dispatch is spawned; yield until the task has run
        for _ in 0..100 {
            tokio::task::yield_now().await;
            let n = sink.delivered.lock().unwrap().len();
            if n > 0 {
                return n;
            }
        }
        0
    }

    #[tokio::test]
    async fn submit_parks_without_applying() {
        let pool = test_pool().await;
        let (svc, _, _) = service::<CategoryModeration>(pool.clone());

        svc.submit(11, create_doc("Shoes")).await.unwrap();

        let mut conn = pool.acquire().await.unwrap();
        assert!(db::category::find_by_name(&mut conn, "Shoes").await.unwrap().is_none());
        drop(conn);
        assert_eq!(svc.list().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn accept_applies_and_consumes_the_request() {
        let pool = test_pool().await;
        let (svc, sink, _) = service::<CategoryModeration>(pool.clone());

        let request = svc.submit(11, create_doc("Shoes")).await.unwrap();
        svc.accept(request.id).await.unwrap();

        let mut conn = pool.acquire().await.unwrap();
        let category = db::category::find_by_name(&mut conn, "Shoes").await.unwrap().unwrap();
        assert_eq!(category.created_by, 11);
        drop(conn);
        assert!(svc.list().await.unwrap().is_empty());

        assert_eq!(delivered_count(&sink).await, 1);
        let delivered = sink.delivered.lock().unwrap();
        assert_eq!(delivered[0].kind, MessageKind::Accept);
        assert_eq!(delivered[0].recipient, 11);
    }

    #[tokio::test]
    async fn accepting_twice_applies_once() {
        let pool = test_pool().await;
        let (svc, _, _) = service::<CategoryModeration>(pool.clone());

        let request = svc.submit(11, create_doc("Shoes")).await.unwrap();
        svc.accept(request.id).await.unwrap();

        let err: AppError = svc.accept(request.id).await.unwrap_err().into();
        assert!(matches!(err, AppError::NotFound(_)));

        // Still exactly one category
        assert_eq!(db::category::count(&pool).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn reject_requires_a_reason() {
        let pool = test_pool().await;
        let (svc, _, _) = service::<CategoryModeration>(pool.clone());

        let request = svc.submit(11, create_doc("Shoes")).await.unwrap();
        let err: AppError = svc.reject(request.id, "   ").await.unwrap_err().into();
        assert!(matches!(err, AppError::Validation(_)));

        // Request survives a malformed decision
        assert_eq!(svc.list().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn reject_consumes_and_relays_the_reason() {
        let pool = test_pool().await;
        let (svc, sink, _) = service::<CategoryModeration>(pool.clone());

        let request = svc.submit(11, create_doc("Shoes")).await.unwrap();
        svc.reject(request.id, "Name is too generic").await.unwrap();

        let mut conn = pool.acquire().await.unwrap();
        assert!(db::category::find_by_name(&mut conn, "Shoes").await.unwrap().is_none());
        drop(conn);
        assert!(svc.list().await.unwrap().is_empty());

        assert_eq!(delivered_count(&sink).await, 1);
        let delivered = sink.delivered.lock().unwrap();
        assert_eq!(delivered[0].kind, MessageKind::Reject);
        assert!(delivered[0].body.contains("Name is too generic"));
    }

    #[tokio::test]
    async fn long_reject_reason_still_reaches_the_submitter() {
        let pool = test_pool().await;
        let (svc, sink, _) = service::<CategoryModeration>(pool.clone());

        let request = svc.submit(11, create_doc("Shoes")).await.unwrap();
        let reason = "too vague ".repeat(30);
        svc.reject(request.id, &reason).await.unwrap();

        assert_eq!(delivered_count(&sink).await, 1);
        let delivered = sink.delivered.lock().unwrap();
        assert_eq!(delivered[0].kind, MessageKind::Reject);
        assert!(delivered[0].body.len() <= MAX_BODY_LEN);
        assert!(delivered[0].body.contains("Reason: too vague"));
    }

    #[tokio::test]
    async fn category_delete_accept_rechecks_the_product_guard() {
        let pool = test_pool().await;
        let category_id = seed_category(&pool, "Shoes").await;
        let (svc, _, _) = service::<CategoryModeration>(pool.clone());

        let request = svc
            .submit(11, SubmitPayload::Delete(DeleteDoc { target_id: category_id }))
            .await
            .unwrap();

        // A product lands in the category while the request sits pending
        let mut conn = pool.acquire().await.unwrap();
        db::category::adjust_product_count(&mut conn, category_id, 1).await.unwrap();
        drop(conn);

        let err: AppError = svc.accept(request.id).await.unwrap_err().into();
        assert!(matches!(err, AppError::Validation(_)));

        // The failed accept consumed nothing
        assert_eq!(svc.list().await.unwrap().len(), 1);
        let mut conn = pool.acquire().await.unwrap();
        assert!(db::category::find_by_id(&mut conn, category_id).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn merchant_delete_accept_rechecks_the_product_guard() {
        let pool = test_pool().await;
        let owner = seed_user(&pool, "shop@example.com", Role::Merchant).await;
        let merchant_id = seed_merchant(&pool, owner, "Bright & Co").await;
        let (svc, _, _) = service::<MerchantModeration>(pool.clone());

        let request = svc
            .submit(11, SubmitPayload::Delete(DeleteDoc { target_id: merchant_id }))
            .await
            .unwrap();
        seed_product_for(&pool, "Lamp", 3, 1, merchant_id).await;

        let err: AppError = svc.accept(request.id).await.unwrap_err().into();
        assert!(matches!(err, AppError::Validation(_)));
        assert_eq!(svc.list().await.unwrap().len(), 1);
        let mut conn = pool.acquire().await.unwrap();
        assert!(db::merchant::find_by_id(&mut conn, merchant_id).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn duplicate_pending_name_conflicts() {
        let pool = test_pool().await;
        let (svc, _, _) = service::<CategoryModeration>(pool.clone());

        svc.submit(11, create_doc("Shoes")).await.unwrap();
        // Case-insensitive: "shoes" collides with the pending "Shoes"
        let err: AppError = svc.submit(12, create_doc("shoes")).await.unwrap_err().into();
        assert!(matches!(err, AppError::Conflict(_)));
    }

    #[tokio::test]
    async fn live_entity_name_conflicts() {
        let pool = test_pool().await;
        seed_category(&pool, "Shoes").await;
        let (svc, _, _) = service::<CategoryModeration>(pool.clone());

        let err: AppError = svc.submit(11, create_doc("Shoes")).await.unwrap_err().into();
        assert!(matches!(err, AppError::Conflict(_)));
    }

    #[tokio::test]
    async fn decision_on_missing_request_is_not_found() {
        let pool = test_pool().await;
        let (svc, _, _) = service::<CategoryModeration>(pool);

        let err: AppError = svc.accept(404).await.unwrap_err().into();
        assert!(matches!(err, AppError::NotFound(_)));
        let err: AppError = svc.reject(404, "why not").await.unwrap_err().into();
        assert!(matches!(err, AppError::NotFound(_)));
    }

    #[tokio::test]
    async fn list_dereferences_submitter_and_target() {
        let pool = test_pool().await;
        let category_id = seed_category(&pool, "Shoes").await;
        let submitter = crate::testutil::seed_user(&pool, "deo@example.com", shared::models::Role::Deo).await;
        let (svc, _, _) = service::<CategoryModeration>(pool.clone());

        svc.submit(
            submitter,
            SubmitPayload::Update(shared::models::CategoryUpdateDoc {
                category_id,
                name: None,
                description: Some("Footwear".to_string()),
                product_count: None,
            }),
        )
        .await
        .unwrap();

        let listed = svc.list().await.unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].kind, ModerationKind::Update);
        assert_eq!(listed[0].submitter.as_ref().unwrap().email, "deo@example.com");
        assert_eq!(listed[0].target.as_ref().unwrap()["name"], "Shoes");
    }
}
