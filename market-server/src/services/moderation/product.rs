//! Product moderation domain
//!
//! The only domain carrying imagery. The accept path derives the
//! superseded blob keys from the update's [`ImageUpdate`] case: a thumbnail
//! replacement supersedes only the old thumb key, a gallery replacement
//! only the old gallery keys, and an untouched image field keeps its keys
//! live.

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
use shared::models::{ImageUpdate, ModerationKind, Product, ProductCreateDoc, ProductUpdateDoc};
use shared::util::{now_millis, product_code, snowflake_id};

pub struct ProductModeration;

#[async_trait]
impl ModerationDomain for ProductModeration {
    const ENTITY: &'static str = "Product";
    const REQUEST_TABLE: &'static str = "product_request";

    type CreateDoc = ProductCreateDoc;
    type UpdateDoc = ProductUpdateDoc;

    async fn validate_create(
        conn: &mut SqliteConnection,
        doc: &ProductCreateDoc,
    ) -> ServiceResult<()> {
        validate_required_text(&doc.name, "name", MAX_NAME_LEN)?;
        validate_optional_text(&Some(doc.description.clone()), "description", MAX_NOTE_LEN)?;
        validate_non_negative(doc.price_cents, "price_cents")?;
        validate_non_negative(doc.quantity, "quantity")?;

        if db::category::find_by_id(conn, doc.category_id).await?.is_none() {
            return Err(AppError::not_found("No category found").into());
        }
        if db::merchant::find_by_id(conn, doc.merchant_id).await?.is_none() {
            return Err(AppError::not_found("No merchant found").into());
        }
        if db::product::find_by_name(conn, &doc.name).await?.is_some() {
            return Err(AppError::conflict(format!("Product {} already exists", doc.name)).into());
        }
        if pending_with_text(conn, Self::REQUEST_TABLE, "$.name", &doc.name).await? {
            return Err(AppError::conflict("A pending request already targets this name").into());
        }
        Ok(())
    }

    async fn validate_update(
        conn: &mut SqliteConnection,
        doc: &ProductUpdateDoc,
    ) -> ServiceResult<()> {
        let current = db::product::find_by_id(conn, doc.product_id)
            .await?
            .ok_or_else(|| ServiceError::from(AppError::not_found("No product found")))?;

        if let Some(name) = &doc.name {
            validate_required_text(name, "name", MAX_NAME_LEN)?;
            if let Some(other) = db::product::find_by_name(conn, name).await? {
                if other.id != current.id {
                    return Err(
                        AppError::conflict(format!("Product {name} already exists")).into(),
                    );
                }
            }
        }
        validate_optional_text(&doc.description, "description", MAX_NOTE_LEN)?;
        if let Some(price) = doc.price_cents {
            validate_non_negative(price, "price_cents")?;
        }
        if let Some(quantity) = doc.quantity {
            validate_non_negative(quantity, "quantity")?;
        }
        if pending_targeting(conn, Self::REQUEST_TABLE, "$.product_id", doc.product_id).await? {
            return Err(
                AppError::conflict("A pending request already targets this product").into(),
            );
        }
        Ok(())
    }

    async fn validate_delete(conn: &mut SqliteConnection, target_id: i64) -> ServiceResult<()> {
        if db::product::find_by_id(conn, target_id).await?.is_none() {
            return Err(AppError::not_found("No product found").into());
        }
        if pending_targeting(conn, Self::REQUEST_TABLE, "$.product_id", target_id).await? {
            return Err(
                AppError::conflict("A pending request already targets this product").into(),
            );
        }
        Ok(())
    }

    async fn apply_create(
        conn: &mut SqliteConnection,
        doc: ProductCreateDoc,
        _submitter: i64,
    ) -> ServiceResult<Vec<String>> {
        if db::category::find_by_id(conn, doc.category_id).await?.is_none() {
            return Err(AppError::not_found("No category found").into());
        }
        let product = Product {
            id: snowflake_id(),
            name: doc.name,
            description: doc.description,
            price_cents: doc.price_cents,
            quantity: doc.quantity,
            product_code: product_code(),
            category_id: doc.category_id,
            merchant_id: doc.merchant_id,
            thumb_key: doc.thumb_key,
            gallery_json: serde_json::to_string(&doc.gallery_keys)?,
            created_at: now_millis(),
        };
        db::product::insert(conn, &product).await?;
        db::category::adjust_product_count(conn, product.category_id, 1).await?;
        Ok(vec![])
    }

    async fn apply_update(
        conn: &mut SqliteConnection,
        doc: ProductUpdateDoc,
    ) -> ServiceResult<Vec<String>> {
        let current = db::product::find_by_id(conn, doc.product_id)
            .await?
            .ok_or_else(|| ServiceError::from(AppError::not_found("No product found")))?;

        db::product::merge_fields(
            conn,
            doc.product_id,
            doc.name.as_deref(),
            doc.description.as_deref(),
            doc.price_cents,
            doc.quantity,
        )
        .await?;

        // Only keys whose slot is actually replaced are superseded
        let superseded = match doc.images {
            ImageUpdate::None => vec![],
            ImageUpdate::Thumb { thumb_key } => {
                db::product::set_images(conn, doc.product_id, Some(&thumb_key), None).await?;
                current.thumb_key.into_iter().collect()
            }
            ImageUpdate::Gallery { gallery_keys } => {
                let gallery_json = serde_json::to_string(&gallery_keys)?;
                db::product::set_images(conn, doc.product_id, None, Some(&gallery_json)).await?;
                current.gallery()
            }
            ImageUpdate::Both {
                thumb_key,
                gallery_keys,
            } => {
                let gallery_json = serde_json::to_string(&gallery_keys)?;
                db::product::set_images(conn, doc.product_id, Some(&thumb_key), Some(&gallery_json))
                    .await?;
                current.all_image_keys()
            }
        };
        Ok(superseded)
    }

    async fn apply_delete(
        conn: &mut SqliteConnection,
        target_id: i64,
    ) -> ServiceResult<Vec<String>> {
        let current = db::product::find_by_id(conn, target_id)
            .await?
            .ok_or_else(|| ServiceError::from(AppError::not_found("No product found")))?;
        db::product::delete(conn, target_id).await?;
        db::category::adjust_product_count(conn, current.category_id, -1).await?;
        Ok(current.all_image_keys())
    }

    fn display_name(kind: ModerationKind, payload: &serde_json::Value) -> String {
        match payload.get("name").and_then(|n| n.as_str()) {
            Some(name) => name.to_string(),
            None => match Self::target_id(kind, payload) {
                Some(id) => format!("product {id}"),
                None => "product".to_string(),
            },
        }
    }

    fn target_id(kind: ModerationKind, payload: &serde_json::Value) -> Option<i64> {
        match kind {
            ModerationKind::Create => None,
            ModerationKind::Update => payload.get("product_id")?.as_i64(),
            ModerationKind::Delete => payload.get("target_id")?.as_i64(),
        }
    }

    fn speculative_keys(payload: &serde_json::Value) -> Vec<String> {
        serde_json::from_value::<ProductCreateDoc>(payload.clone())
            .map(|doc| doc.uploaded_keys())
            .unwrap_or_default()
    }

    async fn entity_summary(
        conn: &mut SqliteConnection,
        id: i64,
    ) -> ServiceResult<Option<serde_json::Value>> {
        match db::product::find_by_id(conn, id).await? {
            Some(product) => Ok(Some(serde_json::to_value(product)?)),
            None => Ok(None),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::test_pool;
    use crate::services::blob::testing::RecordingStore;
    use crate::services::moderation::{DeleteDoc, ModerationService, SubmitPayload};
    use crate::services::notify::testing::RecordingSink;
    use crate::testutil::{seed_category, seed_merchant, seed_product_with_images, seed_user};
    use shared::models::Role;
    use sqlx::SqlitePool;
    use std::sync::Arc;

    fn service(
        pool: SqlitePool,
    ) -> (ModerationService<ProductModeration>, Arc<RecordingStore>) {
        let sink = Arc::new(RecordingSink::default());
        let blobs = Arc::new(RecordingStore::default());
        (ModerationService::new(pool, sink as _, blobs.clone() as _), blobs)
    }

    fn update_doc(product_id: i64, images: ImageUpdate) -> SubmitPayload<ProductCreateDoc, ProductUpdateDoc> {
        SubmitPayload::Update(ProductUpdateDoc {
            product_id,
            name: None,
            description: None,
            price_cents: None,
            quantity: None,
            images,
        })
    }

    async fn load(pool: &SqlitePool, id: i64) -> Product {
        let mut conn = pool.acquire().await.unwrap();
        db::product::find_by_id(&mut conn, id).await.unwrap().unwrap()
    }

    #[tokio::test]
    async fn thumb_update_supersedes_only_the_old_thumb() {
        let pool = test_pool().await;
        let id = seed_product_with_images(&pool, "Lamp", Some("thumb-old"), &["g1", "g2"]).await;
        let (svc, blobs) = service(pool.clone());

        let request = svc
            .submit(11, update_doc(id, ImageUpdate::Thumb { thumb_key: "thumb-new".to_string() }))
            .await
            .unwrap();
        svc.accept(request.id).await.unwrap();

        assert_eq!(*blobs.deleted.lock().unwrap(), vec!["thumb-old".to_string()]);
        let product = load(&pool, id).await;
        assert_eq!(product.thumb_key.as_deref(), Some("thumb-new"));
        assert_eq!(product.gallery(), vec!["g1", "g2"]);
    }

    #[tokio::test]
    async fn gallery_update_keeps_the_thumb_live() {
        let pool = test_pool().await;
        let id = seed_product_with_images(&pool, "Lamp", Some("thumb"), &["g1", "g2"]).await;
        let (svc, blobs) = service(pool.clone());

        let request = svc
            .submit(11, update_doc(id, ImageUpdate::Gallery { gallery_keys: vec!["g3".to_string()] }))
            .await
            .unwrap();
        svc.accept(request.id).await.unwrap();

        assert_eq!(*blobs.deleted.lock().unwrap(), vec!["g1".to_string(), "g2".to_string()]);
        let product = load(&pool, id).await;
        assert_eq!(product.thumb_key.as_deref(), Some("thumb"));
        assert_eq!(product.gallery(), vec!["g3"]);
    }

    #[tokio::test]
    async fn no_image_change_supersedes_nothing() {
        let pool = test_pool().await;
        let id = seed_product_with_images(&pool, "Lamp", Some("thumb"), &["g1"]).await;
        let (svc, blobs) = service(pool.clone());

        let request = svc.submit(11, update_doc(id, ImageUpdate::None)).await.unwrap();
        svc.accept(request.id).await.unwrap();

        assert!(blobs.deleted.lock().unwrap().is_empty());
        let product = load(&pool, id).await;
        assert_eq!(product.thumb_key.as_deref(), Some("thumb"));
        assert_eq!(product.gallery(), vec!["g1"]);
    }

    #[tokio::test]
    async fn accepted_delete_removes_every_image_key() {
        let pool = test_pool().await;
        let id = seed_product_with_images(&pool, "Lamp", Some("thumb"), &["g1", "g2"]).await;
        let (svc, blobs) = service(pool.clone());

        let request = svc.submit(11, SubmitPayload::Delete(DeleteDoc { target_id: id })).await.unwrap();
        svc.accept(request.id).await.unwrap();

        let mut deleted = blobs.deleted.lock().unwrap().clone();
        deleted.sort();
        assert_eq!(deleted, vec!["g1", "g2", "thumb"]);

        let mut conn = pool.acquire().await.unwrap();
        assert!(db::product::find_by_id(&mut conn, id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn accepted_create_increments_the_category_counter() {
        let pool = test_pool().await;
        let owner = seed_user(&pool, "shop@example.com", Role::Merchant).await;
        let category_id = seed_category(&pool, "Lighting").await;
        let merchant_id = seed_merchant(&pool, owner, "Bright & Co").await;
        let (svc, _) = service(pool.clone());

        let request = svc
            .submit(
                owner,
                SubmitPayload::Create(ProductCreateDoc {
                    name: "Lamp".to_string(),
                    description: "A lamp".to_string(),
                    price_cents: 2500,
                    quantity: 4,
                    category_id,
                    merchant_id,
                    thumb_key: None,
                    gallery_keys: vec![],
                }),
            )
            .await
            .unwrap();
        svc.accept(request.id).await.unwrap();

        let mut conn = pool.acquire().await.unwrap();
        let category = db::category::find_by_id(&mut conn, category_id).await.unwrap().unwrap();
        assert_eq!(category.product_count, 1);
        let product = db::product::find_by_name(&mut conn, "Lamp").await.unwrap().unwrap();
        assert_eq!(product.quantity, 4);
        assert_eq!(product.product_code.len(), 8);
    }

    #[tokio::test]
    async fn rejected_create_cleans_speculative_uploads() {
        let pool = test_pool().await;
        let owner = seed_user(&pool, "shop@example.com", Role::Merchant).await;
        let category_id = seed_category(&pool, "Lighting").await;
        let merchant_id = seed_merchant(&pool, owner, "Bright & Co").await;
        let (svc, blobs) = service(pool.clone());

        let request = svc
            .submit(
                owner,
                SubmitPayload::Create(ProductCreateDoc {
                    name: "Lamp".to_string(),
                    description: "A lamp".to_string(),
                    price_cents: 2500,
                    quantity: 4,
                    category_id,
                    merchant_id,
                    thumb_key: Some("draft-thumb".to_string()),
                    gallery_keys: vec!["draft-g1".to_string()],
                }),
            )
            .await
            .unwrap();
        svc.reject(request.id, "Blurry photos").await.unwrap();

        let mut deleted = blobs.deleted.lock().unwrap().clone();
        deleted.sort();
        assert_eq!(deleted, vec!["draft-g1", "draft-thumb"]);
        let mut conn = pool.acquire().await.unwrap();
        assert!(db::product::find_by_name(&mut conn, "Lamp").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn create_against_missing_category_fails_at_submit() {
        let pool = test_pool().await;
        let owner = seed_user(&pool, "shop@example.com", Role::Merchant).await;
        let merchant_id = seed_merchant(&pool, owner, "Bright & Co").await;
        let (svc, _) = service(pool.clone());

        let err: AppError = svc
            .submit(
                owner,
                SubmitPayload::Create(ProductCreateDoc {
                    name: "Lamp".to_string(),
                    description: String::new(),
                    price_cents: 2500,
                    quantity: 4,
                    category_id: 404,
                    merchant_id,
                    thumb_key: None,
                    gallery_keys: vec![],
                }),
            )
            .await
            .unwrap_err()
            .into();
        assert!(matches!(err, AppError::NotFound(_)));
    }
}
