//! Storage seam for the alert engine.
//!
//! The evaluator, lifecycle manager, threshold registry and reading ingestion
//! only talk to an [`AlertStore`]. Production uses [`SeaOrmStore`] on
//! PostgreSQL. With the `test-util` feature an in-memory store is available
//! too.
//!
//! # Concurrency
//!
//! Two guarantees have to hold even when readings for the same sensor are
//! evaluated concurrently (manual entry racing the poller):
//!
//! - [`AlertStore::create_alert`] never leaves two open alerts for the same
//!   `(sensor, threshold, severity)`. If one already exists the existing row
//!   is returned instead. On PostgreSQL this is backed by the partial unique
//!   index `alerts_open_unique_idx`.
//! - [`AlertStore::update_alert`] is a compare-and-swap on the status column
//!   and reports whether it won.

use async_trait::async_trait;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, DbErr, EntityTrait, PaginatorTrait,
    QueryFilter, QueryOrder, Set, SqlErr, sea_query::Expr,
};
use uuid::Uuid;

use crate::entity::{
    AlertStatus, Severity, ThresholdKind, alerts, devices, readings, thresholds as threshold_entity,
};
use crate::error::{AppError, AppResult};

/// Filter for alert listings. `None` fields do not filter.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AlertFilter {
    pub sensor_id: Option<Uuid>,
    pub status: Option<AlertStatus>,
    pub kind: Option<ThresholdKind>,
}

impl AlertFilter {
    #[must_use]
    pub fn matches(&self, alert: &alerts::Model) -> bool {
        self.sensor_id.is_none_or(|id| alert.sensor_id == id)
            && self.status.is_none_or(|s| alert.status == s)
            && self.kind.is_none_or(|k| alert.kind == k)
    }
}

#[async_trait]
pub trait AlertStore: Send + Sync {
    async fn get_device(&self, id: Uuid) -> AppResult<Option<devices::Model>>;

    async fn get_threshold(&self, id: Uuid) -> AppResult<Option<threshold_entity::Model>>;

    /// Thresholds of `sensor_id` with `is_active = true`, oldest first.
    async fn active_thresholds(&self, sensor_id: Uuid) -> AppResult<Vec<threshold_entity::Model>>;

    /// Thresholds ordered by sensor then creation time. `None` does not filter.
    async fn list_thresholds(
        &self,
        sensor_id: Option<Uuid>,
        is_active: Option<bool>,
    ) -> AppResult<Vec<threshold_entity::Model>>;

    async fn insert_threshold(
        &self,
        threshold: threshold_entity::Model,
    ) -> AppResult<threshold_entity::Model>;

    /// Overwrite the stored threshold with the same id.
    async fn save_threshold(
        &self,
        threshold: threshold_entity::Model,
    ) -> AppResult<threshold_entity::Model>;

    /// Remove a threshold. Fails while alerts still reference it.
    async fn delete_threshold(&self, id: Uuid) -> AppResult<()>;

    /// Alerts raised from `threshold_id`, resolved ones included.
    async fn count_alerts_for_threshold(&self, threshold_id: Uuid) -> AppResult<u64>;

    async fn insert_reading(&self, reading: readings::Model) -> AppResult<readings::Model>;

    /// The unresolved alert for `(sensor, threshold, severity)`, if any.
    async fn find_open_alert(
        &self,
        sensor_id: Uuid,
        threshold_id: Uuid,
        severity: Severity,
    ) -> AppResult<Option<alerts::Model>>;

    /// Every unresolved alert tied to `(sensor, threshold)`, whatever its severity.
    async fn open_alerts_for_threshold(
        &self,
        sensor_id: Uuid,
        threshold_id: Uuid,
    ) -> AppResult<Vec<alerts::Model>>;

    /// Insert `alert`, or return the alert that is already open for the same
    /// `(sensor, threshold, severity)`.
    async fn create_alert(&self, alert: alerts::Model) -> AppResult<alerts::Model>;

    /// Persist the mutable fields of `alert` if the stored status is still
    /// `expected`. Returns `false` when another writer changed it first.
    async fn update_alert(&self, alert: &alerts::Model, expected: AlertStatus) -> AppResult<bool>;

    async fn get_alert(&self, id: Uuid) -> AppResult<Option<alerts::Model>>;

    /// Alerts matching `filter`, newest first.
    async fn list_alerts(&self, filter: &AlertFilter) -> AppResult<Vec<alerts::Model>>;
}

/// [`AlertStore`] backed by the application database.
#[derive(Clone)]
pub struct SeaOrmStore {
    db: DatabaseConnection,
}

impl SeaOrmStore {
    #[must_use]
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }
}

#[async_trait]
impl AlertStore for SeaOrmStore {
    async fn get_device(&self, id: Uuid) -> AppResult<Option<devices::Model>> {
        Ok(devices::Entity::find_by_id(id).one(&self.db).await?)
    }

    async fn get_threshold(&self, id: Uuid) -> AppResult<Option<threshold_entity::Model>> {
        Ok(threshold_entity::Entity::find_by_id(id).one(&self.db).await?)
    }

    async fn active_thresholds(&self, sensor_id: Uuid) -> AppResult<Vec<threshold_entity::Model>> {
        Ok(threshold_entity::Entity::find()
            .filter(threshold_entity::Column::SensorId.eq(sensor_id))
            .filter(threshold_entity::Column::IsActive.eq(true))
            .order_by_asc(threshold_entity::Column::CreatedAt)
            .all(&self.db)
            .await?)
    }

    async fn list_thresholds(
        &self,
        sensor_id: Option<Uuid>,
        is_active: Option<bool>,
    ) -> AppResult<Vec<threshold_entity::Model>> {
        let mut query = threshold_entity::Entity::find();

        if let Some(sensor_id) = sensor_id {
            query = query.filter(threshold_entity::Column::SensorId.eq(sensor_id));
        }
        if let Some(is_active) = is_active {
            query = query.filter(threshold_entity::Column::IsActive.eq(is_active));
        }

        Ok(query
            .order_by_asc(threshold_entity::Column::SensorId)
            .order_by_asc(threshold_entity::Column::CreatedAt)
            .all(&self.db)
            .await?)
    }

    async fn insert_threshold(
        &self,
        threshold: threshold_entity::Model,
    ) -> AppResult<threshold_entity::Model> {
        Ok(threshold_active_model(threshold).insert(&self.db).await?)
    }

    async fn save_threshold(
        &self,
        threshold: threshold_entity::Model,
    ) -> AppResult<threshold_entity::Model> {
        let id = threshold.id;
        match threshold_active_model(threshold).update(&self.db).await {
            Ok(updated) => Ok(updated),
            Err(DbErr::RecordNotUpdated) => {
                Err(AppError::NotFound(format!("Threshold '{id}' not found")))
            }
            Err(e) => Err(e.into()),
        }
    }

    async fn delete_threshold(&self, id: Uuid) -> AppResult<()> {
        match threshold_entity::Entity::delete_by_id(id).exec(&self.db).await {
            Ok(result) if result.rows_affected == 0 => {
                Err(AppError::NotFound(format!("Threshold '{id}' not found")))
            }
            Ok(_) => Ok(()),
            // An alert was raised between the caller's check and the delete
            Err(e) if matches!(e.sql_err(), Some(SqlErr::ForeignKeyConstraintViolation(_))) => {
                Err(AppError::Validation(format!(
                    "Threshold '{id}' has alerts; deactivate it instead"
                )))
            }
            Err(e) => Err(e.into()),
        }
    }

    async fn count_alerts_for_threshold(&self, threshold_id: Uuid) -> AppResult<u64> {
        Ok(alerts::Entity::find()
            .filter(alerts::Column::ThresholdId.eq(threshold_id))
            .count(&self.db)
            .await?)
    }

    async fn insert_reading(&self, reading: readings::Model) -> AppResult<readings::Model> {
        let model = readings::ActiveModel {
            id: Set(reading.id),
            sensor_id: Set(reading.sensor_id),
            value: Set(reading.value),
            time: Set(reading.time),
            origin: Set(reading.origin),
        };
        Ok(model.insert(&self.db).await?)
    }

    async fn find_open_alert(
        &self,
        sensor_id: Uuid,
        threshold_id: Uuid,
        severity: Severity,
    ) -> AppResult<Option<alerts::Model>> {
        Ok(alerts::Entity::find()
            .filter(alerts::Column::SensorId.eq(sensor_id))
            .filter(alerts::Column::ThresholdId.eq(threshold_id))
            .filter(alerts::Column::Severity.eq(severity))
            .filter(alerts::Column::Status.ne(AlertStatus::Resolved))
            .one(&self.db)
            .await?)
    }

    async fn open_alerts_for_threshold(
        &self,
        sensor_id: Uuid,
        threshold_id: Uuid,
    ) -> AppResult<Vec<alerts::Model>> {
        Ok(alerts::Entity::find()
            .filter(alerts::Column::SensorId.eq(sensor_id))
            .filter(alerts::Column::ThresholdId.eq(threshold_id))
            .filter(alerts::Column::Status.ne(AlertStatus::Resolved))
            .order_by_asc(alerts::Column::CreatedAt)
            .all(&self.db)
            .await?)
    }

    async fn create_alert(&self, alert: alerts::Model) -> AppResult<alerts::Model> {
        let model = alerts::ActiveModel {
            id: Set(alert.id),
            sensor_id: Set(alert.sensor_id),
            threshold_id: Set(alert.threshold_id),
            kind: Set(alert.kind),
            severity: Set(alert.severity),
            status: Set(alert.status),
            message: Set(alert.message.clone()),
            created_at: Set(alert.created_at),
            acknowledged_at: Set(alert.acknowledged_at),
            resolved_at: Set(alert.resolved_at),
        };

        match model.insert(&self.db).await {
            Ok(inserted) => Ok(inserted),
            Err(e) if matches!(e.sql_err(), Some(SqlErr::UniqueConstraintViolation(_))) => {
                // Lost the race against another evaluation of the same sensor
                tracing::debug!(
                    sensor_id = %alert.sensor_id,
                    threshold_id = %alert.threshold_id,
                    severity = alert.severity.as_str(),
                    "Open alert already exists"
                );
                self.find_open_alert(alert.sensor_id, alert.threshold_id, alert.severity)
                    .await?
                    .ok_or(AppError::Database(e))
            }
            Err(e) => Err(e.into()),
        }
    }

    async fn update_alert(&self, alert: &alerts::Model, expected: AlertStatus) -> AppResult<bool> {
        let result = alerts::Entity::update_many()
            .col_expr(alerts::Column::Status, Expr::value(alert.status))
            .col_expr(alerts::Column::Message, Expr::value(alert.message.clone()))
            .col_expr(
                alerts::Column::AcknowledgedAt,
                Expr::value(alert.acknowledged_at),
            )
            .col_expr(alerts::Column::ResolvedAt, Expr::value(alert.resolved_at))
            .filter(alerts::Column::Id.eq(alert.id))
            .filter(alerts::Column::Status.eq(expected))
            .exec(&self.db)
            .await?;

        Ok(result.rows_affected == 1)
    }

    async fn get_alert(&self, id: Uuid) -> AppResult<Option<alerts::Model>> {
        Ok(alerts::Entity::find_by_id(id).one(&self.db).await?)
    }

    async fn list_alerts(&self, filter: &AlertFilter) -> AppResult<Vec<alerts::Model>> {
        let mut query = alerts::Entity::find();

        if let Some(sensor_id) = filter.sensor_id {
            query = query.filter(alerts::Column::SensorId.eq(sensor_id));
        }
        if let Some(status) = filter.status {
            query = query.filter(alerts::Column::Status.eq(status));
        }
        if let Some(kind) = filter.kind {
            query = query.filter(alerts::Column::Kind.eq(kind));
        }

        Ok(query
            .order_by_desc(alerts::Column::CreatedAt)
            .all(&self.db)
            .await?)
    }
}

fn threshold_active_model(threshold: threshold_entity::Model) -> threshold_entity::ActiveModel {
    threshold_entity::ActiveModel {
        id: Set(threshold.id),
        sensor_id: Set(threshold.sensor_id),
        kind: Set(threshold.kind),
        severity: Set(threshold.severity),
        value: Set(threshold.value),
        is_active: Set(threshold.is_active),
        created_at: Set(threshold.created_at),
    }
}
