use crate::{
    entities::menu_item::{self, Entity as MenuItemEntity},
    errors::ServiceError,
    events::{Event, EventSender},
};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder, Set,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{info, instrument};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

/// Admin-side menu management: simple point writes against the store, no
/// reconciliation logic. Each operation acts on one record by id and is not
/// transactional with any other operation.
#[derive(Clone)]
pub struct MenuService {
    db: Arc<DatabaseConnection>,
    event_sender: Arc<EventSender>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CreateMenuItemInput {
    #[validate(length(min = 1, max = 120, message = "Name must be 1-120 characters"))]
    pub name: String,
    pub description: Option<String>,
    pub price: Decimal,
    pub category: Option<String>,
    #[serde(default = "default_available")]
    pub available: bool,
}

fn default_available() -> bool {
    true
}

#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct UpdateMenuItemInput {
    pub name: Option<String>,
    pub description: Option<String>,
    pub price: Option<Decimal>,
    pub category: Option<String>,
    pub available: Option<bool>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct MenuItemResponse {
    pub id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub price: Decimal,
    pub category: Option<String>,
    pub available: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
}

impl From<menu_item::Model> for MenuItemResponse {
    fn from(model: menu_item::Model) -> Self {
        Self {
            id: model.id,
            name: model.name,
            description: model.description,
            price: model.price,
            category: model.category,
            available: model.available,
            created_at: model.created_at,
            updated_at: model.updated_at,
        }
    }
}

impl MenuService {
    pub fn new(db: Arc<DatabaseConnection>, event_sender: Arc<EventSender>) -> Self {
        Self { db, event_sender }
    }

    /// Lists menu items ordered by name; `available_only` restricts the
    /// listing to what the ordering screen may sell.
    pub async fn list_items(
        &self,
        available_only: bool,
    ) -> Result<Vec<menu_item::Model>, ServiceError> {
        let mut query = MenuItemEntity::find().order_by_asc(menu_item::Column::Name);
        if available_only {
            query = query.filter(menu_item::Column::Available.eq(true));
        }
        Ok(query.all(&*self.db).await?)
    }

    pub async fn get_item(&self, item_id: Uuid) -> Result<menu_item::Model, ServiceError> {
        MenuItemEntity::find_by_id(item_id)
            .one(&*self.db)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Menu item {} not found", item_id)))
    }

    #[instrument(skip(self, input), fields(name = %input.name))]
    pub async fn create_item(
        &self,
        input: CreateMenuItemInput,
    ) -> Result<menu_item::Model, ServiceError> {
        input.validate()?;
        ensure_non_negative_price(input.price)?;

        let item_id = Uuid::new_v4();
        let model = menu_item::ActiveModel {
            id: Set(item_id),
            name: Set(input.name),
            description: Set(input.description),
            price: Set(input.price),
            category: Set(input.category),
            available: Set(input.available),
            created_at: Set(Utc::now()),
            updated_at: Set(None),
        };
        let created = model.insert(&*self.db).await?;

        self.event_sender
            .send_or_log(Event::MenuItemCreated(item_id))
            .await;
        info!(item_id = %item_id, "menu item created");
        Ok(created)
    }

    #[instrument(skip(self, input), fields(item_id = %item_id))]
    pub async fn update_item(
        &self,
        item_id: Uuid,
        input: UpdateMenuItemInput,
    ) -> Result<menu_item::Model, ServiceError> {
        if let Some(price) = input.price {
            ensure_non_negative_price(price)?;
        }

        let item = self.get_item(item_id).await?;
        let mut active: menu_item::ActiveModel = item.into();

        if let Some(name) = input.name {
            if name.is_empty() {
                return Err(ServiceError::ValidationError(
                    "Name must not be empty".to_string(),
                ));
            }
            active.name = Set(name);
        }
        if let Some(description) = input.description {
            active.description = Set(Some(description));
        }
        if let Some(price) = input.price {
            active.price = Set(price);
        }
        if let Some(category) = input.category {
            active.category = Set(Some(category));
        }
        if let Some(available) = input.available {
            active.available = Set(available);
        }
        active.updated_at = Set(Some(Utc::now()));

        let updated = active.update(&*self.db).await?;
        self.event_sender
            .send_or_log(Event::MenuItemUpdated(item_id))
            .await;
        Ok(updated)
    }

    #[instrument(skip(self), fields(item_id = %item_id))]
    pub async fn delete_item(&self, item_id: Uuid) -> Result<(), ServiceError> {
        let result = MenuItemEntity::delete_by_id(item_id).exec(&*self.db).await?;
        if result.rows_affected == 0 {
            return Err(ServiceError::NotFound(format!(
                "Menu item {} not found",
                item_id
            )));
        }

        self.event_sender
            .send_or_log(Event::MenuItemDeleted(item_id))
            .await;
        info!(item_id = %item_id, "menu item deleted");
        Ok(())
    }

    pub async fn set_price(
        &self,
        item_id: Uuid,
        price: Decimal,
    ) -> Result<menu_item::Model, ServiceError> {
        ensure_non_negative_price(price)?;

        let item = self.get_item(item_id).await?;
        let mut active: menu_item::ActiveModel = item.into();
        active.price = Set(price);
        active.updated_at = Set(Some(Utc::now()));

        let updated = active.update(&*self.db).await?;
        self.event_sender
            .send_or_log(Event::MenuItemUpdated(item_id))
            .await;
        Ok(updated)
    }

    pub async fn set_availability(
        &self,
        item_id: Uuid,
        available: bool,
    ) -> Result<menu_item::Model, ServiceError> {
        let item = self.get_item(item_id).await?;
        let mut active: menu_item::ActiveModel = item.into();
        active.available = Set(available);
        active.updated_at = Set(Some(Utc::now()));

        let updated = active.update(&*self.db).await?;
        self.event_sender
            .send_or_log(Event::MenuItemUpdated(item_id))
            .await;
        Ok(updated)
    }
}

fn ensure_non_negative_price(price: Decimal) -> Result<(), ServiceError> {
    if price < Decimal::ZERO {
        return Err(ServiceError::ValidationError(
            "Price must not be negative".to_string(),
        ));
    }
    Ok(())
}
