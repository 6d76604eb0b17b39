use crate::{
    entities::ingredient::{self, Entity as IngredientEntity},
    entities::menu_item_ingredient::{self, Entity as RecipeLineEntity},
    errors::ServiceError,
    events::{Event, EventSender},
};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder, Set,
};
use serde::Serialize;
use std::sync::Arc;
use tracing::{info, instrument, warn};
use utoipa::ToSchema;
use uuid::Uuid;

/// Stock classification used by the admin screen. Out-of-stock wins over
/// low when both apply.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum StockState {
    OutOfStock,
    Low,
    Healthy,
}

impl StockState {
    pub fn classify(stock: Decimal, minimum: Decimal) -> Self {
        if stock <= Decimal::ZERO {
            StockState::OutOfStock
        } else if stock <= minimum {
            StockState::Low
        } else {
            StockState::Healthy
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct IngredientResponse {
    pub id: Uuid,
    pub name: String,
    pub unit: String,
    pub stock_quantity: Decimal,
    pub minimum_stock: Decimal,
    pub state: StockState,
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
}

impl From<ingredient::Model> for IngredientResponse {
    fn from(model: ingredient::Model) -> Self {
        let state = StockState::classify(model.stock_quantity, model.minimum_stock);
        Self {
            id: model.id,
            name: model.name,
            unit: model.unit,
            stock_quantity: model.stock_quantity,
            minimum_stock: model.minimum_stock,
            state,
            created_at: model.created_at,
            updated_at: model.updated_at,
        }
    }
}

/// Ingredient stock management. Stock is informational for the ordering
/// flow: deduction never blocks an order, it only records consumption and
/// raises low-stock events.
#[derive(Clone)]
pub struct InventoryService {
    db: Arc<DatabaseConnection>,
    event_sender: Arc<EventSender>,
}

impl InventoryService {
    pub fn new(db: Arc<DatabaseConnection>, event_sender: Arc<EventSender>) -> Self {
        Self { db, event_sender }
    }

    pub async fn list_ingredients(&self) -> Result<Vec<IngredientResponse>, ServiceError> {
        let ingredients = IngredientEntity::find()
            .order_by_asc(ingredient::Column::Name)
            .all(&*self.db)
            .await?;
        Ok(ingredients.into_iter().map(Into::into).collect())
    }

    pub async fn get_ingredient(
        &self,
        ingredient_id: Uuid,
    ) -> Result<ingredient::Model, ServiceError> {
        IngredientEntity::find_by_id(ingredient_id)
            .one(&*self.db)
            .await?
            .ok_or_else(|| {
                ServiceError::NotFound(format!("Ingredient {} not found", ingredient_id))
            })
    }

    /// Adds `delta` to an ingredient's stock. The delta must be positive;
    /// consumption goes through [`Self::deduct_for_order`].
    #[instrument(skip(self), fields(ingredient_id = %ingredient_id))]
    pub async fn restock(
        &self,
        ingredient_id: Uuid,
        delta: Decimal,
    ) -> Result<ingredient::Model, ServiceError> {
        if delta <= Decimal::ZERO {
            return Err(ServiceError::ValidationError(
                "Restock quantity must be positive".to_string(),
            ));
        }

        let current = self.get_ingredient(ingredient_id).await?;
        let new_stock = current.stock_quantity + delta;

        let mut active: ingredient::ActiveModel = current.into();
        active.stock_quantity = Set(new_stock);
        active.updated_at = Set(Some(Utc::now()));
        let updated = active.update(&*self.db).await?;

        self.event_sender
            .send_or_log(Event::IngredientRestocked {
                ingredient_id,
                new_stock,
            })
            .await;
        info!(ingredient_id = %ingredient_id, new_stock = %new_stock, "ingredient restocked");
        Ok(updated)
    }

    /// Sets the minimum-stock threshold under which an ingredient reads as
    /// low.
    pub async fn set_minimum(
        &self,
        ingredient_id: Uuid,
        minimum: Decimal,
    ) -> Result<ingredient::Model, ServiceError> {
        if minimum < Decimal::ZERO {
            return Err(ServiceError::ValidationError(
                "Minimum stock must not be negative".to_string(),
            ));
        }

        let current = self.get_ingredient(ingredient_id).await?;
        let mut active: ingredient::ActiveModel = current.into();
        active.minimum_stock = Set(minimum);
        active.updated_at = Set(Some(Utc::now()));
        Ok(active.update(&*self.db).await?)
    }

    /// Restocks every ingredient at or below its minimum by `delta`.
    /// Returns how many ingredients were topped up.
    #[instrument(skip(self))]
    pub async fn bulk_restock(&self, delta: Decimal) -> Result<usize, ServiceError> {
        if delta <= Decimal::ZERO {
            return Err(ServiceError::ValidationError(
                "Restock quantity must be positive".to_string(),
            ));
        }

        let all = IngredientEntity::find().all(&*self.db).await?;
        let mut restocked = 0usize;

        for item in all
            .into_iter()
            .filter(|i| i.stock_quantity <= i.minimum_stock)
        {
            let ingredient_id = item.id;
            let new_stock = item.stock_quantity + delta;

            let mut active: ingredient::ActiveModel = item.into();
            active.stock_quantity = Set(new_stock);
            active.updated_at = Set(Some(Utc::now()));
            active.update(&*self.db).await?;

            self.event_sender
                .send_or_log(Event::IngredientRestocked {
                    ingredient_id,
                    new_stock,
                })
                .await;
            restocked += 1;
        }

        info!(restocked, "bulk restock applied to low-stock ingredients");
        Ok(restocked)
    }

    /// Deducts recipe consumption for a newly created order.
    ///
    /// For every ordered menu item, each recipe line's required quantity is
    /// multiplied by the ordered quantity and subtracted from stock. A
    /// deduction that would drive stock negative is skipped with a warning;
    /// inventory shortfall never blocks an order.
    #[instrument(skip(self, demands))]
    pub async fn deduct_for_order(&self, demands: &[(Uuid, i32)]) -> Result<(), ServiceError> {
        for (menu_item_id, quantity) in demands {
            let recipe = RecipeLineEntity::find()
                .filter(menu_item_ingredient::Column::MenuItemId.eq(*menu_item_id))
                .all(&*self.db)
                .await?;

            for line in recipe {
                let Some(stocked) = IngredientEntity::find_by_id(line.ingredient_id)
                    .one(&*self.db)
                    .await?
                else {
                    warn!(
                        ingredient_id = %line.ingredient_id,
                        menu_item_id = %menu_item_id,
                        "recipe references a missing ingredient; skipping deduction"
                    );
                    continue;
                };

                let required = line.quantity_required * Decimal::from(*quantity);
                let new_stock = stocked.stock_quantity - required;
                if new_stock < Decimal::ZERO {
                    warn!(
                        ingredient = %stocked.name,
                        required = %required,
                        stock = %stocked.stock_quantity,
                        "insufficient stock for ingredient; skipping deduction"
                    );
                    continue;
                }

                let ingredient_id = stocked.id;
                let minimum = stocked.minimum_stock;

                let mut active: ingredient::ActiveModel = stocked.into();
                active.stock_quantity = Set(new_stock);
                active.updated_at = Set(Some(Utc::now()));
                active.update(&*self.db).await?;

                if new_stock <= minimum {
                    self.event_sender
                        .send_or_log(Event::IngredientStockLow {
                            ingredient_id,
                            stock: new_stock,
                            minimum,
                        })
                        .await;
                }
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn classification_thresholds() {
        assert_eq!(
            StockState::classify(dec!(0), dec!(5)),
            StockState::OutOfStock
        );
        assert_eq!(
            StockState::classify(dec!(-1), dec!(5)),
            StockState::OutOfStock
        );
        assert_eq!(StockState::classify(dec!(3), dec!(5)), StockState::Low);
        assert_eq!(StockState::classify(dec!(5), dec!(5)), StockState::Low);
        assert_eq!(StockState::classify(dec!(6), dec!(5)), StockState::Healthy);
    }

    #[test]
    fn out_of_stock_wins_over_low_with_zero_minimum() {
        assert_eq!(
            StockState::classify(dec!(0), dec!(0)),
            StockState::OutOfStock
        );
    }
}
