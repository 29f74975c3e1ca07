use crate::{
    db::DbPool,
    entities::order::{ActiveModel as OrderActiveModel, Entity as OrderEntity, Model as OrderModel},
    errors::ServiceError,
    models::{Category, PhotoRef},
    services::images::ImageStore,
};
use bytes::Bytes;
use chrono::Utc;
use sea_orm::{ActiveModelTrait, EntityTrait, ModelTrait, Set};
use std::str::FromStr;
use std::sync::Arc;
use tracing::{error, info, instrument, warn};
use uuid::Uuid;

/// An image file received with a create/update request.
#[derive(Debug, Clone)]
pub struct UploadedPhoto {
    pub bytes: Bytes,
    pub original_name: String,
    pub content_type: Option<String>,
}

/// What the client asked to happen with the order's photo, decided once at
/// the API boundary and never re-inferred from field absence.
#[derive(Debug, Clone)]
pub enum PhotoAction {
    /// A new file was uploaded.
    Upload(UploadedPhoto),
    /// Use the shared default image for the order's category.
    UseDefault,
    /// Neither a new file nor a default switch: keep the current photo.
    /// Only meaningful on update; rejected on create.
    KeepExisting,
}

/// Raw order fields as parsed from the form, before validation.
#[derive(Debug, Clone, Default)]
pub struct OrderDraft {
    pub name: Option<String>,
    pub phone: Option<String>,
    pub address: Option<String>,
    pub city: Option<String>,
    pub pincode: Option<String>,
    pub food: Option<String>,
    pub category: Option<String>,
}

/// Draft fields after validation: everything present, category resolved.
#[derive(Debug, Clone)]
struct OrderFields {
    name: String,
    phone: String,
    address: String,
    city: String,
    pincode: String,
    food: String,
    category: Category,
}

/// Validates a draft, collecting ALL missing fields into a single error
/// rather than failing on the first one.
fn validate_draft(draft: &OrderDraft) -> Result<OrderFields, ServiceError> {
    fn require(value: &Option<String>) -> Option<String> {
        value
            .as_deref()
            .map(str::trim)
            .filter(|v| !v.is_empty())
            .map(str::to_string)
    }

    let fields = [
        ("name", require(&draft.name)),
        ("phone", require(&draft.phone)),
        ("address", require(&draft.address)),
        ("city", require(&draft.city)),
        ("pincode", require(&draft.pincode)),
        ("food", require(&draft.food)),
        ("category", require(&draft.category)),
    ];

    let missing: Vec<&str> = fields
        .iter()
        .filter(|(_, value)| value.is_none())
        .map(|(name, _)| *name)
        .collect();

    if !missing.is_empty() {
        return Err(ServiceError::ValidationError(format!(
            "Missing required fields: {}",
            missing.join(", ")
        )));
    }

    let [name, phone, address, city, pincode, food, category_raw] =
        fields.map(|(_, value)| value.unwrap_or_default());

    let category = Category::from_str(&category_raw).map_err(|_| {
        ServiceError::ValidationError(format!("Unknown category: {category_raw}"))
    })?;

    Ok(OrderFields {
        name,
        phone,
        address,
        city,
        pincode,
        food,
        category,
    })
}

/// Stored-file names to delete, in reverse order, if a later step fails.
struct CompensationLog<'a> {
    images: &'a ImageStore,
    stored: Vec<String>,
}

impl<'a> CompensationLog<'a> {
    fn new(images: &'a ImageStore) -> Self {
        Self {
            images,
            stored: Vec::new(),
        }
    }

    fn push(&mut self, stored_name: String) {
        self.stored.push(stored_name);
    }

    /// Best-effort rollback; failures are logged and the original error is
    /// returned to the client unchanged, which can leak orphaned files.
    async fn run(self) {
        for name in self.stored.into_iter().rev() {
            self.images.delete_best_effort(&name).await;
        }
    }
}

/// Service managing order records together with their image lifecycle.
///
/// This is the only place where the upload-vs-default-image policy lives;
/// handlers translate requests and never touch files themselves.
#[derive(Clone)]
pub struct OrderService {
    db_pool: Arc<DbPool>,
    images: Arc<ImageStore>,
}

impl OrderService {
    pub fn new(db_pool: Arc<DbPool>, images: Arc<ImageStore>) -> Self {
        Self { db_pool, images }
    }

    /// Creates a new order from validated form fields and a photo decision.
    #[instrument(skip(self, draft, photo))]
    pub async fn create_order(
        &self,
        draft: OrderDraft,
        photo: PhotoAction,
    ) -> Result<OrderModel, ServiceError> {
        if matches!(photo, PhotoAction::KeepExisting) {
            return Err(ServiceError::ValidationError(
                "Please upload a cake photo or use a default image".to_string(),
            ));
        }

        let mut cleanup = CompensationLog::new(&self.images);

        // Store the upload before field validation (the file arrives first in
        // the request); validation failure rolls it back below.
        let stored = match &photo {
            PhotoAction::Upload(file) => {
                let name = self
                    .images
                    .store(&file.bytes, &file.original_name, file.content_type.as_deref())
                    .await?;
                cleanup.push(name.clone());
                Some(name)
            }
            _ => None,
        };

        let fields = match validate_draft(&draft) {
            Ok(fields) => fields,
            Err(e) => {
                cleanup.run().await;
                return Err(e);
            }
        };

        let photo_ref = match stored {
            Some(name) => PhotoRef::Owned(name),
            None => PhotoRef::Default(fields.category),
        };
        let use_default = photo_ref.is_default();

        let now = Utc::now();
        let order_id = Uuid::new_v4();
        let active = OrderActiveModel {
            id: Set(order_id),
            name: Set(fields.name),
            phone: Set(fields.phone),
            address: Set(fields.address),
            city: Set(fields.city),
            pincode: Set(fields.pincode),
            food: Set(fields.food),
            category: Set(fields.category.to_string()),
            photo_path: Set(photo_ref.encode()),
            use_default_image: Set(use_default),
            created_at: Set(now),
            updated_at: Set(now),
        };

        match active.insert(&*self.db_pool).await {
            Ok(model) => {
                info!(order_id = %order_id, use_default_image = use_default, "Order created");
                Ok(model)
            }
            Err(e) => {
                error!(error = %e, order_id = %order_id, "Failed to insert order");
                cleanup.run().await;
                Err(ServiceError::DatabaseError(e))
            }
        }
    }

    /// Retrieves an order by id.
    #[instrument(skip(self), fields(order_id = %order_id))]
    pub async fn get_order(&self, order_id: Uuid) -> Result<Option<OrderModel>, ServiceError> {
        OrderEntity::find_by_id(order_id)
            .one(&*self.db_pool)
            .await
            .map_err(ServiceError::DatabaseError)
    }

    /// Lists all orders in storage order.
    #[instrument(skip(self))]
    pub async fn list_orders(&self) -> Result<Vec<OrderModel>, ServiceError> {
        OrderEntity::find()
            .all(&*self.db_pool)
            .await
            .map_err(ServiceError::DatabaseError)
    }

    /// Updates an order. All required fields must be re-supplied; the photo
    /// decision follows the explicit [`PhotoAction`] cases.
    #[instrument(skip(self, draft, photo), fields(order_id = %order_id))]
    pub async fn update_order(
        &self,
        order_id: Uuid,
        draft: OrderDraft,
        photo: PhotoAction,
    ) -> Result<OrderModel, ServiceError> {
        let existing = OrderEntity::find_by_id(order_id)
            .one(&*self.db_pool)
            .await
            .map_err(ServiceError::DatabaseError)?
            .ok_or_else(|| {
                warn!(order_id = %order_id, "Order not found for update");
                ServiceError::NotFound("Order not found".to_string())
            })?;

        let existing_ref = PhotoRef::decode(&existing.photo_path);
        let existing_use_default = existing.use_default_image;

        // Unreachable while the invariants hold; the record always carries a
        // photo reference.
        if matches!(photo, PhotoAction::KeepExisting) && existing_ref.is_none() {
            return Err(ServiceError::ValidationError(
                "Photo is required".to_string(),
            ));
        }

        let mut cleanup = CompensationLog::new(&self.images);

        let stored = match &photo {
            PhotoAction::Upload(file) => {
                let name = self
                    .images
                    .store(&file.bytes, &file.original_name, file.content_type.as_deref())
                    .await?;
                cleanup.push(name.clone());
                Some(name)
            }
            _ => None,
        };

        let fields = match validate_draft(&draft) {
            Ok(fields) => fields,
            Err(e) => {
                cleanup.run().await;
                return Err(e);
            }
        };

        // Decide the new reference and which old file (if any) the order
        // stops owning. The old file is removed only after the record update
        // succeeds, so a failed update never orphans the row.
        let (photo_ref, use_default, old_file) = match &photo {
            PhotoAction::UseDefault => (
                PhotoRef::Default(fields.category),
                true,
                existing_ref.as_ref().and_then(|r| r.owned_file()).map(str::to_string),
            ),
            PhotoAction::Upload(_) => {
                let name = stored.clone().ok_or_else(|| {
                    ServiceError::InternalError("upload missing stored name".to_string())
                })?;
                (
                    PhotoRef::Owned(name),
                    false,
                    existing_ref.as_ref().and_then(|r| r.owned_file()).map(str::to_string),
                )
            }
            PhotoAction::KeepExisting => {
                let current = existing_ref.clone().ok_or_else(|| {
                    ServiceError::ValidationError("Photo is required".to_string())
                })?;
                (current, existing_use_default, None)
            }
        };

        let now = Utc::now();
        let mut active: OrderActiveModel = existing.into();
        active.name = Set(fields.name);
        active.phone = Set(fields.phone);
        active.address = Set(fields.address);
        active.city = Set(fields.city);
        active.pincode = Set(fields.pincode);
        active.food = Set(fields.food);
        active.category = Set(fields.category.to_string());
        active.photo_path = Set(photo_ref.encode());
        active.use_default_image = Set(use_default);
        active.updated_at = Set(now);

        let updated = match active.update(&*self.db_pool).await {
            Ok(model) => model,
            Err(e) => {
                error!(error = %e, order_id = %order_id, "Failed to update order");
                cleanup.run().await;
                return Err(ServiceError::DatabaseError(e));
            }
        };

        if let Some(old) = old_file {
            self.images.delete_best_effort(&old).await;
        }

        info!(order_id = %order_id, use_default_image = use_default, "Order updated");
        Ok(updated)
    }

    /// Deletes an order, releasing its owned uploaded file first. Returns the
    /// deleted record.
    #[instrument(skip(self), fields(order_id = %order_id))]
    pub async fn delete_order(&self, order_id: Uuid) -> Result<OrderModel, ServiceError> {
        let existing = OrderEntity::find_by_id(order_id)
            .one(&*self.db_pool)
            .await
            .map_err(ServiceError::DatabaseError)?
            .ok_or_else(|| {
                warn!(order_id = %order_id, "Order not found for deletion");
                ServiceError::NotFound("Order not found".to_string())
            })?;

        if let Some(PhotoRef::Owned(name)) = PhotoRef::decode(&existing.photo_path) {
            self.images.delete(&name).await?;
        }

        existing
            .clone()
            .delete(&*self.db_pool)
            .await
            .map_err(ServiceError::DatabaseError)?;

        info!(order_id = %order_id, "Order deleted");
        Ok(existing)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    fn full_draft() -> OrderDraft {
        OrderDraft {
            name: Some("A".to_string()),
            phone: Some("9999999999".to_string()),
            address: Some("X".to_string()),
            city: Some("Y".to_string()),
            pincode: Some("12345".to_string()),
            food: Some("Choco".to_string()),
            category: Some("Chocolate Cakes".to_string()),
        }
    }

    #[test]
    fn validate_accepts_complete_draft() {
        let fields = validate_draft(&full_draft()).unwrap();
        assert_eq!(fields.name, "A");
        assert_eq!(fields.category, Category::ChocolateCakes);
    }

    #[test]
    fn validate_collects_all_missing_fields() {
        let draft = OrderDraft {
            phone: None,
            city: Some("  ".to_string()),
            ..full_draft()
        };
        let err = validate_draft(&draft).unwrap_err();
        assert_matches!(err, ServiceError::ValidationError(_));
        assert_eq!(err.to_string(), "Missing required fields: phone, city");
    }

    #[test]
    fn validate_reports_every_field_on_empty_draft() {
        let err = validate_draft(&OrderDraft::default()).unwrap_err();
        assert_eq!(
            err.to_string(),
            "Missing required fields: name, phone, address, city, pincode, food, category"
        );
    }

    #[test]
    fn validate_rejects_unknown_category() {
        let draft = OrderDraft {
            category: Some("Ice Cream Cakes".to_string()),
            ..full_draft()
        };
        let err = validate_draft(&draft).unwrap_err();
        assert_eq!(err.to_string(), "Unknown category: Ice Cream Cakes");
    }

    #[test]
    fn validate_trims_whitespace() {
        let draft = OrderDraft {
            name: Some("  Asha  ".to_string()),
            ..full_draft()
        };
        let fields = validate_draft(&draft).unwrap();
        assert_eq!(fields.name, "Asha");
    }
}
