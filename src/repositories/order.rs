//! Order repository
//!
//! Reads local orders and merges POS push outcomes into them.

use anyhow::Result;
use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, Set,
};
use std::sync::Arc;
use uuid::Uuid;

use crate::models::order::{self, Entity as Order, PosError, PosStatus};

/// Outcome of one push attempt, written over any previous attempt.
#[derive(Debug, Clone, PartialEq)]
pub enum PushRecord {
    Sent {
        pos_order_id: String,
        pos_order_number: String,
    },
    Failed {
        message: String,
    },
}

#[derive(Debug, Clone)]
pub struct OrderRepository {
    pub db: Arc<DatabaseConnection>,
}

impl OrderRepository {
    pub fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Finds an order within a tenant scope.
    pub async fn find(&self, tenant_id: &Uuid, order_id: &Uuid) -> Result<Option<order::Model>> {
        Ok(Order::find_by_id(*order_id)
            .filter(order::Column::TenantId.eq(*tenant_id))
            .one(&*self.db)
            .await?)
    }

    pub async fn record_push(
        &self,
        existing: order::Model,
        record: PushRecord,
    ) -> Result<order::Model> {
        let now = Utc::now();
        let mut active: order::ActiveModel = existing.into();

        match record {
            PushRecord::Sent {
                pos_order_id,
                pos_order_number,
            } => {
                active.pos_order_id = Set(Some(pos_order_id));
                active.pos_status = Set(Some(PosStatus::SentToPos.as_str().to_string()));
                active.pos_error = Set(None);
                active.pos_order_number = Set(Some(pos_order_number));
                active.pos_pushed_at = Set(Some(now.into()));
            }
            PushRecord::Failed { message } => {
                let error = PosError {
                    message,
                    timestamp: now,
                };
                active.pos_order_id = Set(None);
                active.pos_order_number = Set(None);
                active.pos_status = Set(Some(PosStatus::PushFailed.as_str().to_string()));
                active.pos_error = Set(Some(serde_json::to_value(&error)?));
            }
        }

        active.updated_at = Set(now.into());
        Ok(active.update(&*self.db).await?)
    }
}
