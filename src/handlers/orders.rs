use axum::{
    extract::{Multipart, State},
    http::StatusCode,
    response::Json,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::entities::order::Model as OrderModel;
use crate::errors::ServiceError;
use crate::models::{Category, PhotoRef};
use crate::services::orders::{OrderDraft, PhotoAction, UploadedPhoto};
use crate::AppState;

/// Order as returned to clients. The internal storage name is never exposed;
/// only the derived `photoUrl`.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct OrderResponse {
    #[serde(rename = "_id")]
    pub id: Uuid,
    pub name: String,
    pub phone: String,
    pub address: String,
    pub city: String,
    pub pincode: String,
    pub food: String,
    pub category: Category,
    #[serde(rename = "photoUrl")]
    pub photo_url: String,
    #[serde(rename = "useDefaultImage")]
    pub use_default_image: bool,
    #[serde(rename = "createdAt")]
    pub created_at: DateTime<Utc>,
    #[serde(rename = "updatedAt")]
    pub updated_at: DateTime<Utc>,
}

/// Multipart form fields accepted by create/update (documentation shape).
#[derive(Debug, Deserialize, ToSchema)]
#[allow(dead_code)]
pub struct OrderFormDoc {
    pub name: String,
    pub phone: String,
    pub address: String,
    pub city: String,
    pub pincode: String,
    pub food: String,
    pub category: String,
    /// "true" to use the bundled default image for the category
    #[serde(rename = "useDefaultImage")]
    pub use_default_image: Option<String>,
    /// Image file, at most 5 MiB
    #[schema(value_type = String, format = Binary)]
    pub photo: Option<String>,
    /// Required for updates only
    #[serde(rename = "_id")]
    pub id: Option<String>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct DeleteOrderRequest {
    #[serde(rename = "_id")]
    pub id: Option<String>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct DeleteOrderResponse {
    pub message: String,
    pub order: OrderResponse,
}

/// Builds the client-facing view of an order, deriving `photoUrl` from the
/// stored reference and the configured public base URL.
fn present(model: &OrderModel, state: &AppState) -> Result<OrderResponse, ServiceError> {
    let photo_ref = PhotoRef::decode(&model.photo_path).ok_or_else(|| {
        ServiceError::InternalError(format!("order {} has no photo reference", model.id))
    })?;
    let category = Category::from_str(&model.category).map_err(|_| {
        ServiceError::InternalError(format!(
            "order {} has unknown stored category {}",
            model.id, model.category
        ))
    })?;
    let photo_url = state
        .images
        .url_for(&photo_ref, &state.config.public_base_url());

    Ok(OrderResponse {
        id: model.id,
        name: model.name.clone(),
        phone: model.phone.clone(),
        address: model.address.clone(),
        city: model.city.clone(),
        pincode: model.pincode.clone(),
        food: model.food.clone(),
        category,
        photo_url,
        use_default_image: model.use_default_image,
        created_at: model.created_at,
        updated_at: model.updated_at,
    })
}

/// Parsed multipart submission: draft fields, the photo decision, and the
/// optional `_id` (updates only).
struct OrderForm {
    draft: OrderDraft,
    photo: PhotoAction,
    id: Option<String>,
}

impl OrderForm {
    /// Reads the multipart body, extracting at most one `photo` file part.
    /// The photo decision is made here, once: `useDefaultImage=true` wins
    /// over an uploaded file, and the absence of both means keep-existing.
    async fn from_multipart(mut multipart: Multipart) -> Result<Self, ServiceError> {
        let mut draft = OrderDraft::default();
        let mut id = None;
        let mut use_default = false;
        let mut upload: Option<UploadedPhoto> = None;

        while let Some(field) = multipart
            .next_field()
            .await
            .map_err(|e| ServiceError::InvalidInput(e.to_string()))?
        {
            let name = field.name().unwrap_or_default().to_string();
            match name.as_str() {
                "photo" => {
                    let original_name = field.file_name().unwrap_or("photo").to_string();
                    let content_type = field.content_type().map(str::to_string);
                    let bytes = field
                        .bytes()
                        .await
                        .map_err(|e| ServiceError::InvalidInput(e.to_string()))?;
                    if !bytes.is_empty() && upload.is_none() {
                        upload = Some(UploadedPhoto {
                            bytes,
                            original_name,
                            content_type,
                        });
                    }
                }
                _ => {
                    let value = field
                        .text()
                        .await
                        .map_err(|e| ServiceError::InvalidInput(e.to_string()))?;
                    match name.as_str() {
                        "name" => draft.name = Some(value),
                        "phone" => draft.phone = Some(value),
                        "address" => draft.address = Some(value),
                        "city" => draft.city = Some(value),
                        "pincode" => draft.pincode = Some(value),
                        "food" => draft.food = Some(value),
                        "category" => draft.category = Some(value),
                        "useDefaultImage" => use_default = value == "true",
                        "_id" => id = Some(value),
                        _ => {}
                    }
                }
            }
        }

        let photo = if use_default {
            PhotoAction::UseDefault
        } else if let Some(file) = upload {
            PhotoAction::Upload(file)
        } else {
            PhotoAction::KeepExisting
        };

        Ok(Self { draft, photo, id })
    }
}

/// Create a new order
#[utoipa::path(
    post,
    path = "/order",
    summary = "Create order",
    request_body(content = OrderFormDoc, content_type = "multipart/form-data"),
    responses(
        (status = 201, description = "Order created", body = OrderResponse),
        (status = 400, description = "Validation error", body = crate::errors::ErrorResponse),
        (status = 500, description = "Internal server error", body = crate::errors::ErrorResponse),
    )
)]
pub async fn create_order(
    State(state): State<AppState>,
    multipart: Multipart,
) -> Result<(StatusCode, Json<OrderResponse>), ServiceError> {
    let form = OrderForm::from_multipart(multipart).await?;
    let order = state.orders.create_order(form.draft, form.photo).await?;
    let body = present(&order, &state)?;
    Ok((StatusCode::CREATED, Json(body)))
}

/// List all orders
#[utoipa::path(
    get,
    path = "/order",
    summary = "List orders",
    responses(
        (status = 200, description = "Orders retrieved", body = [OrderResponse]),
        (status = 500, description = "Internal server error", body = crate::errors::ErrorResponse),
    )
)]
pub async fn list_orders(
    State(state): State<AppState>,
) -> Result<Json<Vec<OrderResponse>>, ServiceError> {
    let orders = state.orders.list_orders().await?;
    let body = orders
        .iter()
        .map(|order| present(order, &state))
        .collect::<Result<Vec<_>, _>>()?;
    Ok(Json(body))
}

/// Update an existing order. All fields must be re-supplied along with `_id`.
#[utoipa::path(
    put,
    path = "/order",
    summary = "Update order",
    request_body(content = OrderFormDoc, content_type = "multipart/form-data"),
    responses(
        (status = 200, description = "Order updated", body = OrderResponse),
        (status = 400, description = "Validation error", body = crate::errors::ErrorResponse),
        (status = 404, description = "Order not found", body = crate::errors::ErrorResponse),
        (status = 500, description = "Internal server error", body = crate::errors::ErrorResponse),
    )
)]
pub async fn update_order(
    State(state): State<AppState>,
    multipart: Multipart,
) -> Result<Json<OrderResponse>, ServiceError> {
    let form = OrderForm::from_multipart(multipart).await?;
    let raw_id = form.id.ok_or_else(|| {
        ServiceError::ValidationError("Order _id required for update".to_string())
    })?;
    let order_id = Uuid::parse_str(&raw_id)
        .map_err(|_| ServiceError::InvalidInput(format!("Invalid order id: {raw_id}")))?;

    let order = state
        .orders
        .update_order(order_id, form.draft, form.photo)
        .await?;
    let body = present(&order, &state)?;
    Ok(Json(body))
}

/// Delete an order by id
#[utoipa::path(
    delete,
    path = "/order",
    summary = "Delete order",
    request_body = DeleteOrderRequest,
    responses(
        (status = 200, description = "Order deleted", body = DeleteOrderResponse),
        (status = 400, description = "Missing or invalid id", body = crate::errors::ErrorResponse),
        (status = 404, description = "Order not found", body = crate::errors::ErrorResponse),
        (status = 500, description = "Internal server error", body = crate::errors::ErrorResponse),
    )
)]
pub async fn delete_order(
    State(state): State<AppState>,
    Json(request): Json<DeleteOrderRequest>,
) -> Result<Json<DeleteOrderResponse>, ServiceError> {
    let raw_id = request.id.ok_or_else(|| {
        ServiceError::ValidationError("Order _id required for deletion".to_string())
    })?;
    let order_id = Uuid::parse_str(&raw_id)
        .map_err(|_| ServiceError::InvalidInput(format!("Invalid order id: {raw_id}")))?;

    let order = state.orders.delete_order(order_id).await?;
    let body = DeleteOrderResponse {
        message: "Order deleted".to_string(),
        order: present(&order, &state)?,
    };
    Ok(Json(body))
}
