//! Category moderation domain

use async_trait::async_trait;
use sqlx::SqliteConnection;

use super::{ModerationDomain, pending_targeting, pending_with_text};
use crate::db;
use crate::error::{ServiceError, ServiceResult};
use crate::validation::{
    MAX_NAME_LEN, MAX_NOTE_LEN, validate_non_negative, validate_optional_text,
    validate_required_text,
};
use shared::error::AppError;
use shared::models::{Category, CategoryCreateDoc, CategoryUpdateDoc, ModerationKind};
use shared::util::{now_millis, snowflake_id};

pub struct CategoryModeration;

#[async_trait]
impl ModerationDomain for CategoryModeration {
    const ENTITY: &'static str = "Category";
    const REQUEST_TABLE: &'static str = "category_request";

    type CreateDoc = CategoryCreateDoc;
    type UpdateDoc = CategoryUpdateDoc;

    async fn validate_create(
        conn: &mut SqliteConnection,
        doc: &CategoryCreateDoc,
    ) -> ServiceResult<()> {
        validate_required_text(&doc.name, "name", MAX_NAME_LEN)?;
        validate_required_text(&doc.description, "description", MAX_NOTE_LEN)?;
        if db::category::find_by_name(conn, &doc.name).await?.is_some() {
            return Err(
                AppError::conflict(format!("Category {} already exists", doc.name)).into(),
            );
        }
        if pending_with_text(conn, Self::REQUEST_TABLE, "$.name", &doc.name).await? {
            return Err(AppError::conflict("A pending request already targets this name").into());
        }
        Ok(())
    }

    async fn validate_update(
        conn: &mut SqliteConnection,
        doc: &CategoryUpdateDoc,
    ) -> ServiceResult<()> {
        let current = db::category::find_by_id(conn, doc.category_id)
            .await?
            .ok_or_else(|| ServiceError::from(AppError::not_found("No category found")))?;

        if let Some(name) = &doc.name {
            validate_required_text(name, "name", MAX_NAME_LEN)?;
            if let Some(other) = db::category::find_by_name(conn, name).await? {
                if other.id != current.id {
                    return Err(
                        AppError::conflict(format!("Category {name} already exists")).into(),
                    );
                }
            }
        }
        validate_optional_text(&doc.description, "description", MAX_NOTE_LEN)?;
        if let Some(count) = doc.product_count {
            validate_non_negative(count, "product_count")?;
        }
        if pending_targeting(conn, Self::REQUEST_TABLE, "$.category_id", doc.category_id).await? {
            return Err(
                AppError::conflict("A pending request already targets this category").into(),
            );
        }
        Ok(())
    }

    async fn validate_delete(conn: &mut SqliteConnection, target_id: i64) -> ServiceResult<()> {
        let current = db::category::find_by_id(conn, target_id)
            .await?
            .ok_or_else(|| ServiceError::from(AppError::not_found("No category found")))?;
        if current.product_count > 0 {
            return Err(AppError::validation("Category still has products").into());
        }
        if pending_targeting(conn, Self::REQUEST_TABLE, "$.category_id", target_id).await? {
            return Err(
                AppError::conflict("A pending request already targets this category").into(),
            );
        }
        Ok(())
    }

    async fn apply_create(
        conn: &mut SqliteConnection,
        doc: CategoryCreateDoc,
        submitter: i64,
    ) -> ServiceResult<Vec<String>> {
        let category = Category {
            id: snowflake_id(),
            name: doc.name,
            description: doc.description,
            product_count: 0,
            created_by: submitter,
            created_at: now_millis(),
        };
        db::category::insert(conn, &category).await?;
        Ok(vec![])
    }

    async fn apply_update(
        conn: &mut SqliteConnection,
        doc: CategoryUpdateDoc,
    ) -> ServiceResult<Vec<String>> {
        if db::category::find_by_id(conn, doc.category_id).await?.is_none() {
            return Err(AppError::not_found("No category found").into());
        }
        db::category::merge_fields(
            conn,
            doc.category_id,
            doc.name.as_deref(),
            doc.description.as_deref(),
            doc.product_count,
        )
        .await?;
        Ok(vec![])
    }

    async fn apply_delete(
        conn: &mut SqliteConnection,
        target_id: i64,
    ) -> ServiceResult<Vec<String>> {
        let current = db::category::find_by_id(conn, target_id)
            .await?
            .ok_or_else(|| ServiceError::from(AppError::not_found("No category found")))?;
        // Products may have landed here while the request sat in the queue
        if current.product_count > 0 {
            return Err(AppError::validation("Category still has products").into());
        }
        db::category::delete(conn, target_id).await?;
        Ok(vec![])
    }

    fn display_name(kind: ModerationKind, payload: &serde_json::Value) -> String {
        match payload.get("name").and_then(|n| n.as_str()) {
            Some(name) => name.to_string(),
            None => match Self::target_id(kind, payload) {
                Some(id) => format!("category {id}"),
                None => "category".to_string(),
            },
        }
    }

    fn target_id(kind: ModerationKind, payload: &serde_json::Value) -> Option<i64> {
        match kind {
            ModerationKind::Create => None,
            ModerationKind::Update => payload.get("category_id")?.as_i64(),
            ModerationKind::Delete => payload.get("target_id")?.as_i64(),
        }
    }

    async fn entity_summary(
        conn: &mut SqliteConnection,
        id: i64,
    ) -> ServiceResult<Option<serde_json::Value>> {
        match db::category::find_by_id(conn, id).await? {
            Some(category) => Ok(Some(serde_json::to_value(category)?)),
            None => Ok(None),
        }
    }
}
