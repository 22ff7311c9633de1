//! Merchant moderation domain

use async_trait::async_trait;
use sqlx::SqliteConnection;

use super::{ModerationDomain, pending_targeting, pending_with_text};
use crate::db;
use crate::error::{ServiceError, ServiceResult};
use crate::validation::{
    MAX_NAME_LEN, MAX_NOTE_LEN, validate_optional_text, validate_required_text,
};
use shared::error::AppError;
use shared::models::{Merchant, MerchantCreateDoc, MerchantUpdateDoc, ModerationKind};
use shared::util::{now_millis, snowflake_id};

pub struct MerchantModeration;

#[async_trait]
impl ModerationDomain for MerchantModeration {
    const ENTITY: &'static str = "Merchant";
    const REQUEST_TABLE: &'static str = "merchant_request";

    type CreateDoc = MerchantCreateDoc;
    type UpdateDoc = MerchantUpdateDoc;

    async fn validate_create(
        conn: &mut SqliteConnection,
        doc: &MerchantCreateDoc,
    ) -> ServiceResult<()> {
        validate_required_text(&doc.name, "name", MAX_NAME_LEN)?;
        validate_optional_text(&Some(doc.description.clone()), "description", MAX_NOTE_LEN)?;

        if db::user_account::find_by_id(conn, doc.user_id).await?.is_none() {
            return Err(AppError::not_found("No user found").into());
        }
        if db::merchant::find_by_user(conn, doc.user_id).await?.is_some() {
            return Err(AppError::conflict("User already owns a merchant profile").into());
        }
        if db::merchant::find_by_name(conn, &doc.name).await?.is_some() {
            return Err(
                AppError::conflict(format!("Merchant {} already exists", doc.name)).into(),
            );
        }
        if pending_with_text(conn, Self::REQUEST_TABLE, "$.name", &doc.name).await? {
            return Err(AppError::conflict("A pending request already targets this name").into());
        }
        Ok(())
    }

    async fn validate_update(
        conn: &mut SqliteConnection,
        doc: &MerchantUpdateDoc,
    ) -> ServiceResult<()> {
        let current = db::merchant::find_by_id(conn, doc.merchant_id)
            .await?
            .ok_or_else(|| ServiceError::from(AppError::not_found("No merchant found")))?;

        if let Some(name) = &doc.name {
            validate_required_text(name, "name", MAX_NAME_LEN)?;
            if let Some(other) = db::merchant::find_by_name(conn, name).await? {
                if other.id != current.id {
                    return Err(
                        AppError::conflict(format!("Merchant {name} already exists")).into(),
                    );
                }
            }
        }
        validate_optional_text(&doc.description, "description", MAX_NOTE_LEN)?;
        if pending_targeting(conn, Self::REQUEST_TABLE, "$.merchant_id", doc.merchant_id).await? {
            return Err(
                AppError::conflict("A pending request already targets this merchant").into(),
            );
        }
        Ok(())
    }

    async fn validate_delete(conn: &mut SqliteConnection, target_id: i64) -> ServiceResult<()> {
        if db::merchant::find_by_id(conn, target_id).await?.is_none() {
            return Err(AppError::not_found("No merchant found").into());
        }
        if db::product::count_by_merchant(conn, target_id).await? > 0 {
            return Err(AppError::validation("Merchant still has products").into());
        }
        if pending_targeting(conn, Self::REQUEST_TABLE, "$.merchant_id", target_id).await? {
            return Err(
                AppError::conflict("A pending request already targets this merchant").into(),
            );
        }
        Ok(())
    }

    async fn apply_create(
        conn: &mut SqliteConnection,
        doc: MerchantCreateDoc,
        _submitter: i64,
    ) -> ServiceResult<Vec<String>> {
        let merchant = Merchant {
            id: snowflake_id(),
            user_id: doc.user_id,
            name: doc.name,
            description: doc.description,
            created_at: now_millis(),
        };
        db::merchant::insert(conn, &merchant).await?;
        Ok(vec![])
    }

    async fn apply_update(
        conn: &mut SqliteConnection,
        doc: MerchantUpdateDoc,
    ) -> ServiceResult<Vec<String>> {
        if db::merchant::find_by_id(conn, doc.merchant_id).await?.is_none() {
            return Err(AppError::not_found("No merchant found").into());
        }
        db::merchant::merge_fields(
            conn,
            doc.merchant_id,
            doc.name.as_deref(),
            doc.description.as_deref(),
        )
        .await?;
        Ok(vec![])
    }

    async fn apply_delete(
        conn: &mut SqliteConnection,
        target_id: i64,
    ) -> ServiceResult<Vec<String>> {
        if db::merchant::find_by_id(conn, target_id).await?.is_none() {
            return Err(AppError::not_found("No merchant found").into());
        }
        // The catalog may have grown under this merchant since submission
        if db::product::count_by_merchant(conn, target_id).await? > 0 {
            return Err(AppError::validation("Merchant still has products").into());
        }
        db::merchant::delete(conn, target_id).await?;
        Ok(vec![])
    }

    fn display_name(kind: ModerationKind, payload: &serde_json::Value) -> String {
        match payload.get("name").and_then(|n| n.as_str()) {
            Some(name) => name.to_string(),
            None => match Self::target_id(kind, payload) {
                Some(id) => format!("merchant {id}"),
                None => "merchant".to_string(),
            },
        }
    }

    fn target_id(kind: ModerationKind, payload: &serde_json::Value) -> Option<i64> {
        match kind {
            ModerationKind::Create => None,
            ModerationKind::Update => payload.get("merchant_id")?.as_i64(),
            ModerationKind::Delete => payload.get("target_id")?.as_i64(),
        }
    }

    async fn entity_summary(
        conn: &mut SqliteConnection,
        id: i64,
    ) -> ServiceResult<Option<serde_json::Value>> {
        match db::merchant::find_by_id(conn, id).await? {
            Some(merchant) => Ok(Some(serde_json::to_value(merchant)?)),
            None => Ok(None),
        }
    }
}
