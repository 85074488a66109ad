//! Product catalog data model
//!
//! The catalog is a plain ordered `Vec<Product>`, always loaded and saved as one
//! unit. Field names follow the legacy front-end JSON shape (camelCase, with
//! snake_case timestamps), so documents written by earlier revisions of the
//! backend parse unchanged.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Placeholder assigned when a product is created without an image.
pub const DEFAULT_IMAGE_URL: &str = "https://placehold.co/600x400?text=No+Image";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    pub id: u64,
    pub name: String,
    pub price: String,
    /// Either an absolute URL or a `/uploads/<file>` path served by this process
    pub image: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub features: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sku: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub series: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub warranty: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub shipping: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub out_of_stock: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub discount: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub special_offer_price: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_special_offer: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub countdown: Option<bool>,
    #[serde(rename = "created_at", default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(rename = "updated_at", default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

/// Incoming product fields from a create or update request.
///
/// Every field is optional; `CatalogService::create` enforces the required
/// ones. The same shape covers both the multipart admin form and JSON bodies.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ProductInput {
    pub name: Option<String>,
    pub price: Option<String>,
    pub image: Option<String>,
    pub description: Option<String>,
    pub features: Option<Vec<String>>,
    pub category: Option<i64>,
    pub sku: Option<String>,
    pub model: Option<String>,
    pub series: Option<String>,
    pub warranty: Option<String>,
    pub shipping: Option<String>,
    pub category_name: Option<String>,
    pub out_of_stock: Option<bool>,
    pub discount: Option<String>,
    pub special_offer_price: Option<String>,
    pub is_special_offer: Option<bool>,
    pub countdown: Option<bool>,
}

impl ProductInput {
    /// True when no field was supplied at all (an empty patch).
    pub fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.price.is_none()
            && self.image.is_none()
            && self.description.is_none()
            && self.features.is_none()
            && self.category.is_none()
            && self.sku.is_none()
            && self.model.is_none()
            && self.series.is_none()
            && self.warranty.is_none()
            && self.shipping.is_none()
            && self.category_name.is_none()
            && self.out_of_stock.is_none()
            && self.discount.is_none()
            && self.special_offer_price.is_none()
            && self.is_special_offer.is_none()
            && self.countdown.is_none()
    }
}

impl Product {
    /// Build a new product from validated input, filling defaults.
    pub fn from_input(id: u64, input: ProductInput) -> Self {
        let now = Utc::now();
        Self {
            id,
            name: input.name.unwrap_or_default(),
            price: input.price.unwrap_or_default(),
            image: input
                .image
                .filter(|image| !image.is_empty())
                .unwrap_or_else(|| DEFAULT_IMAGE_URL.to_string()),
            description: input.description.unwrap_or_default(),
            features: input.features.unwrap_or_default(),
            category: input.category,
            sku: input.sku,
            model: input.model,
            series: input.series,
            warranty: input.warranty,
            shipping: input.shipping,
            category_name: input.category_name,
            out_of_stock: input.out_of_stock,
            discount: input.discount,
            special_offer_price: input.special_offer_price,
            is_special_offer: input.is_special_offer,
            countdown: input.countdown,
            created_at: Some(now),
            updated_at: Some(now),
        }
    }

    /// Merge supplied fields over the existing product. `id`, `created_at` and
    /// `updated_at` are never taken from input.
    pub fn apply(&mut self, input: ProductInput) {
        if let Some(name) = input.name {
            self.name = name;
        }
        if let Some(price) = input.price {
            self.price = price;
        }
        if let Some(image) = input.image {
            if !image.is_empty() {
                self.image = image;
            }
        }
        if let Some(description) = input.description {
            self.description = description;
        }
        if let Some(features) = input.features {
            self.features = features;
        }
        if let Some(category) = input.category {
            self.category = Some(category);
        }
        if let Some(sku) = input.sku {
            self.sku = Some(sku);
        }
        if let Some(model) = input.model {
            self.model = Some(model);
        }
        if let Some(series) = input.series {
            self.series = Some(series);
        }
        if let Some(warranty) = input.warranty {
            self.warranty = Some(warranty);
        }
        if let Some(shipping) = input.shipping {
            self.shipping = Some(shipping);
        }
        if let Some(category_name) = input.category_name {
            self.category_name = Some(category_name);
        }
        if let Some(out_of_stock) = input.out_of_stock {
            self.out_of_stock = Some(out_of_stock);
        }
        if let Some(discount) = input.discount {
            self.discount = Some(discount);
        }
        if let Some(special_offer_price) = input.special_offer_price {
            self.special_offer_price = Some(special_offer_price);
        }
        if let Some(is_special_offer) = input.is_special_offer {
            self.is_special_offer = Some(is_special_offer);
        }
        if let Some(countdown) = input.countdown {
            self.countdown = Some(countdown);
        }
    }
}

/// Assign the next product id: `max(existing ids, default 0) + 1`.
/// Ids are never reused after deletion.
pub fn next_id(products: &[Product]) -> u64 {
    products.iter().map(|p| p.id).max().unwrap_or(0) + 1
}
