//! Product Model
//!
//! Product imagery is referenced by blob keys only; the workflow never
//! holds image bytes. Updates carry an explicit [`ImageUpdate`] case so the
//! accept path can tell which subset of previous keys is superseded.

use serde::{Deserialize, Serialize};

/// Product entity
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
pub struct Product {
    pub id: i64,
    pub name: String,
    pub description: String,
    /// Price in integer cents
    pub price_cents: i64,
    /// Available stock, never negative
    pub quantity: i64,
    /// Human-presentable product code
    pub product_code: String,
    pub category_id: i64,
    pub merchant_id: i64,
    /// Thumbnail blob key
    pub thumb_key: Option<String>,
    /// Gallery blob keys (JSON array)
    pub gallery_json: String,
    pub created_at: i64,
}

impl Product {
    pub fn gallery(&self) -> Vec<String> {
        serde_json::from_str(&self.gallery_json).unwrap_or_default()
    }

    /// Every blob key this product references
    pub fn all_image_keys(&self) -> Vec<String> {
        let mut keys = self.gallery();
        if let Some(thumb) = &self.thumb_key {
            keys.push(thumb.clone());
        }
        keys
    }
}

/// Which image fields a product update replaces.
///
/// Explicit enumerated case rather than inferring from which fields happen
/// to be present: the superseded subset of blob keys is derived from the
/// variant, never from field sniffing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ImageUpdate {
    /// No image change; previous keys stay live
    None,
    /// Replace the thumbnail only; the previous thumb key is superseded
    Thumb { thumb_key: String },
    /// Replace the gallery only; the previous gallery keys are superseded
    Gallery { gallery_keys: Vec<String> },
    /// Replace both
    Both {
        thumb_key: String,
        gallery_keys: Vec<String>,
    },
}

impl ImageUpdate {
    /// Keys uploaded speculatively with the submission (deleted when a
    /// CREATE/UPDATE request is rejected)
    pub fn uploaded_keys(&self) -> Vec<String> {
        match self {
            ImageUpdate::None => vec![],
            ImageUpdate::Thumb { thumb_key } => vec![thumb_key.clone()],
            ImageUpdate::Gallery { gallery_keys } => gallery_keys.clone(),
            ImageUpdate::Both {
                thumb_key,
                gallery_keys,
            } => {
                let mut keys = gallery_keys.clone();
                keys.push(thumb_key.clone());
                keys
            }
        }
    }
}

/// Proposed product creation (moderation payload)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProductCreateDoc {
    pub name: String,
    pub description: String,
    pub price_cents: i64,
    pub quantity: i64,
    pub category_id: i64,
    pub merchant_id: i64,
    pub thumb_key: Option<String>,
    #[serde(default)]
    pub gallery_keys: Vec<String>,
}

impl ProductCreateDoc {
    pub fn uploaded_keys(&self) -> Vec<String> {
        let mut keys = self.gallery_keys.clone();
        if let Some(thumb) = &self.thumb_key {
            keys.push(thumb.clone());
        }
        keys
    }
}

/// Proposed product update (moderation payload, field merge)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProductUpdateDoc {
    pub product_id: i64,
    pub name: Option<String>,
    pub description: Option<String>,
    pub price_cents: Option<i64>,
    pub quantity: Option<i64>,
    #[serde(default = "ImageUpdate::none")]
    pub images: ImageUpdate,
}

impl ImageUpdate {
    fn none() -> Self {
        ImageUpdate::None
    }
}
