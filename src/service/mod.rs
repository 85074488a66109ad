//service/mod.rs
pub mod catalog_service;
pub mod upload_service;

use actix_multipart::Multipart;
use actix_web::http::header;
use actix_web::{web, HttpRequest, HttpResponse};
use bytes::BytesMut;
use futures::StreamExt;
use log::debug;
use serde_json::json;

use crate::app_state::AppState;
use crate::error::ApiError;
use crate::model::ProductInput;

/// Liveness probe.
pub async fn home() -> HttpResponse {
    HttpResponse::Ok()
        .content_type("text/plain")
        .body("Server is running!")
}

pub async fn list_products(app_state: web::Data<AppState>) -> HttpResponse {
    let products = app_state.catalog_service.list().await;
    HttpResponse::Ok().json(products)
}

pub async fn get_product(
    path: web::Path<u64>,
    app_state: web::Data<AppState>,
) -> Result<HttpResponse, ApiError> {
    let product = app_state.catalog_service.get(path.into_inner()).await?;
    Ok(HttpResponse::Ok().json(product))
}

pub async fn create_product(
    req: HttpRequest,
    payload: web::Payload,
    app_state: web::Data<AppState>,
) -> Result<HttpResponse, ApiError> {
    let (mut input, upload) = read_product_input(&req, payload).await?;
    // Reject invalid input before materializing an uploaded image, otherwise a
    // bad form would leave an unreferenced file locally and on both mirrors.
    catalog_service::validate_new(&input)?;
    if let Some(upload) = upload {
        input.image = Some(
            app_state
                .upload_service
                .store_image(&upload.bytes, &upload.file_name)
                .await?,
        );
    }
    let product = app_state.catalog_service.create(input).await?;
    Ok(HttpResponse::Created().json(product))
}

pub async fn update_product(
    path: web::Path<u64>,
    req: HttpRequest,
    payload: web::Payload,
    app_state: web::Data<AppState>,
) -> Result<HttpResponse, ApiError> {
    let id = path.into_inner();
    let (mut input, upload) = read_product_input(&req, payload).await?;
    if let Some(upload) = upload {
        // The product must exist before its new image is materialized.
        app_state.catalog_service.get(id).await?;
        input.image = Some(
            app_state
                .upload_service
                .store_image(&upload.bytes, &upload.file_name)
                .await?,
        );
    }
    let product = app_state.catalog_service.update(id, input).await?;
    Ok(HttpResponse::Ok().json(product))
}

pub async fn delete_product(
    path: web::Path<u64>,
    app_state: web::Data<AppState>,
) -> Result<HttpResponse, ApiError> {
    app_state.catalog_service.delete(path.into_inner()).await?;
    Ok(HttpResponse::Ok().json(json!({ "message": "Product deleted" })))
}

/// An image file received in a multipart body, buffered but not yet written
/// anywhere. The handler stores it once the rest of the request checks out.
struct PendingUpload {
    file_name: String,
    bytes: BytesMut,
}

/// The admin front-end submits `multipart/form-data` (with an optional image
/// file); programmatic callers send JSON. Both arrive at the same endpoints,
/// so dispatch on the content type.
async fn read_product_input(
    req: &HttpRequest,
    payload: web::Payload,
) -> Result<(ProductInput, Option<PendingUpload>), ApiError> {
    let content_type = req
        .headers()
        .get(header::CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .unwrap_or("");
    if content_type.starts_with("multipart/form-data") {
        read_multipart_input(req, payload).await
    } else {
        Ok((read_json_input(payload).await?, None))
    }
}

async fn read_json_input(mut payload: web::Payload) -> Result<ProductInput, ApiError> {
    let mut bytes = BytesMut::new();
    while let Some(chunk) = payload.next().await {
        let chunk =
            chunk.map_err(|e| ApiError::Internal(format!("failed to read request body: {}", e)))?;
        bytes.extend_from_slice(&chunk);
    }
    serde_json::from_slice(&bytes)
        .map_err(|e| ApiError::Validation(format!("invalid JSON body: {}", e)))
}

async fn read_multipart_input(
    req: &HttpRequest,
    payload: web::Payload,
) -> Result<(ProductInput, Option<PendingUpload>), ApiError> {
    let mut multipart = Multipart::new(req.headers(), payload);
    let mut input = ProductInput::default();
    let mut upload = None;

    while let Some(item) = multipart.next().await {
        let mut field =
            item.map_err(|e| ApiError::Validation(format!("malformed multipart body: {}", e)))?;
        let name = field.name().to_string();
        let file_name = field
            .content_disposition()
            .get_filename()
            .map(str::to_string);

        let mut data = BytesMut::new();
        while let Some(chunk) = field.next().await {
            let chunk = chunk.map_err(|e| {
                ApiError::Internal(format!("failed to read field {}: {}", name, e))
            })?;
            data.extend_from_slice(&chunk);
        }

        // An image part with a filename is a file upload; hold on to the bytes
        // for the handler. Without a filename it is a plain URL string.
        if name == "image" {
            if let Some(file_name) = file_name.filter(|f| !f.is_empty()) {
                if !data.is_empty() {
                    upload = Some(PendingUpload {
                        file_name,
                        bytes: data,
                    });
                }
                continue;
            }
        }

        let value = String::from_utf8_lossy(&data).to_string();
        apply_text_field(&mut input, &name, value)?;
    }

    Ok((input, upload))
}

fn apply_text_field(input: &mut ProductInput, name: &str, value: String) -> Result<(), ApiError> {
    match name {
        "name" => input.name = Some(value),
        "price" => input.price = Some(value),
        "image" => {
            if !value.is_empty() {
                input.image = Some(value);
            }
        }
        "description" => input.description = Some(value),
        "features" => {
            input.features = if value.trim().is_empty() {
                Some(Vec::new())
            } else {
                Some(serde_json::from_str(&value).map_err(|_| {
                    ApiError::Validation("features must be a JSON array of strings".to_string())
                })?)
            };
        }
        "category" => input.category = value.trim().parse().ok(),
        "sku" => input.sku = Some(value),
        "model" => input.model = Some(value),
        "series" => input.series = Some(value),
        "warranty" => input.warranty = Some(value),
        "shipping" => input.shipping = Some(value),
        "categoryName" => input.category_name = Some(value),
        "outOfStock" => input.out_of_stock = Some(value == "true"),
        "discount" => input.discount = Some(value),
        "specialOfferPrice" => input.special_offer_price = Some(value),
        "isSpecialOffer" => input.is_special_offer = Some(value == "true"),
        "countdown" => input.countdown = Some(value == "true"),
        _ => debug!("Ignoring unknown form field {}", name),
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_apply_text_field_basic() {
        let mut input = ProductInput::default();
        apply_text_field(&mut input, "name", "Mug".into()).unwrap();
        apply_text_field(&mut input, "price", "9.99".into()).unwrap();
        apply_text_field(&mut input, "features", r#"["dishwasher safe"]"#.into()).unwrap();
        apply_text_field(&mut input, "outOfStock", "true".into()).unwrap();

        assert_eq!(input.name.as_deref(), Some("Mug"));
        assert_eq!(input.price.as_deref(), Some("9.99"));
        assert_eq!(input.features.unwrap(), vec!["dishwasher safe"]);
        assert_eq!(input.out_of_stock, Some(true));
    }

    #[test]
    fn test_empty_features_field_means_empty_list() {
        let mut input = ProductInput::default();
        apply_text_field(&mut input, "features", "".into()).unwrap();
        assert_eq!(input.features, Some(Vec::new()));
    }

    #[test]
    fn test_invalid_features_json_is_validation_error() {
        let mut input = ProductInput::default();
        let err = apply_text_field(&mut input, "features", "not json".into()).unwrap_err();
        assert!(matches!(err, ApiError::Validation(_)));
    }

    #[test]
    fn test_empty_image_string_is_ignored() {
        // editing a product without touching the image must not wipe it
        let mut input = ProductInput::default();
        apply_text_field(&mut input, "image", "".into()).unwrap();
        assert!(input.image.is_none());
    }

    #[test]
    fn test_unknown_field_is_ignored() {
        let mut input = ProductInput::default();
        apply_text_field(&mut input, "sku2", "whatever".into()).unwrap();
        assert!(input.is_empty());
    }
}
