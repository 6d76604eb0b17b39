use crate::{
    entities::dining_table::{self, Entity as DiningTableEntity, TableStatus},
    errors::ServiceError,
    events::{Event, EventSender},
};
use sea_orm::{ActiveModelTrait, DatabaseConnection, EntityTrait, QueryOrder, Set};
use serde::Serialize;
use std::sync::Arc;
use tracing::{info, instrument};
use utoipa::ToSchema;
use uuid::Uuid;

/// Service for the dining room floor: table listing and occupancy flips.
#[derive(Clone)]
pub struct TableService {
    db: Arc<DatabaseConnection>,
    event_sender: Arc<EventSender>,
}

impl TableService {
    pub fn new(db: Arc<DatabaseConnection>, event_sender: Arc<EventSender>) -> Self {
        Self { db, event_sender }
    }

    /// Lists all tables ordered by their printed table number.
    pub async fn list_tables(&self) -> Result<Vec<dining_table::Model>, ServiceError> {
        Ok(DiningTableEntity::find()
            .order_by_asc(dining_table::Column::TableNumber)
            .all(&*self.db)
            .await?)
    }

    pub async fn get_table(&self, table_id: Uuid) -> Result<dining_table::Model, ServiceError> {
        DiningTableEntity::find_by_id(table_id)
            .one(&*self.db)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Table {} not found", table_id)))
    }

    /// Flips a table's occupancy status.
    #[instrument(skip(self), fields(table_id = %table_id))]
    pub async fn set_status(
        &self,
        table_id: Uuid,
        status: TableStatus,
    ) -> Result<dining_table::Model, ServiceError> {
        let table = self.get_table(table_id).await?;

        let mut active: dining_table::ActiveModel = table.into();
        active.status = Set(status);
        let updated = active.update(&*self.db).await?;

        self.event_sender
            .send_or_log(Event::TableStatusChanged { table_id, status })
            .await;

        info!(table_id = %table_id, status = ?status, "table status updated");
        Ok(updated)
    }
}

/// Table record as exposed over HTTP.
#[derive(Debug, Serialize, ToSchema)]
pub struct TableResponse {
    pub id: Uuid,
    pub table_number: i32,
    pub capacity: i32,
    pub status: TableStatus,
}

impl From<dining_table::Model> for TableResponse {
    fn from(model: dining_table::Model) -> Self {
        Self {
            id: model.id,
            table_number: model.table_number,
            capacity: model.capacity,
            status: model.status,
        }
    }
}
