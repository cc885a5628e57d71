//! In-process [`AlertStore`] for tests, built with the `test-util` feature.
//!
//! Holds everything behind one `RwLock`, so `create_alert` can check for an
//! open alert and insert in a single critical section, the same guarantee
//! the partial unique index gives on PostgreSQL. Deleting a threshold that
//! alerts still reference fails here as it does against the foreign key.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use sea_orm::DbErr;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::alerting::store::{AlertFilter, AlertStore};
use crate::entity::{AlertStatus, Severity, alerts, devices, readings, thresholds};
use crate::error::{AppError, AppResult};

#[derive(Default)]
struct Tables {
    devices: HashMap<Uuid, devices::Model>,
    thresholds: HashMap<Uuid, thresholds::Model>,
    readings: Vec<readings::Model>,
    alerts: Vec<alerts::Model>,
}

#[derive(Default)]
pub struct InMemoryStore {
    tables: RwLock<Tables>,
    fail_writes: AtomicBool,
    fail_alert_writes: AtomicBool,
}

impl InMemoryStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn add_device(&self, device: devices::Model) {
        self.tables.write().await.devices.insert(device.id, device);
    }

    /// Insert or replace a threshold.
    pub async fn add_threshold(&self, threshold: thresholds::Model) {
        self.tables
            .write()
            .await
            .thresholds
            .insert(threshold.id, threshold);
    }

    /// Every alert in insertion order.
    pub async fn alerts(&self) -> Vec<alerts::Model> {
        self.tables.read().await.alerts.clone()
    }

    pub async fn readings(&self) -> Vec<readings::Model> {
        self.tables.read().await.readings.clone()
    }

    /// Make every subsequent write fail with a database error.
    pub fn fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    /// Make alert inserts and updates fail while reading and threshold
    /// writes still succeed.
    pub fn fail_alert_writes(&self, fail: bool) {
        self.fail_alert_writes.store(fail, Ordering::SeqCst);
    }

    fn check_writable(&self) -> AppResult<()> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(write_failure());
        }
        Ok(())
    }

    fn check_alerts_writable(&self) -> AppResult<()> {
        self.check_writable()?;
        if self.fail_alert_writes.load(Ordering::SeqCst) {
            return Err(write_failure());
        }
        Ok(())
    }
}

fn write_failure() -> AppError {
    AppError::Database(DbErr::Custom(
        "in-memory store is failing writes".to_string(),
    ))
}

fn not_found(id: Uuid) -> AppError {
    AppError::NotFound(format!("Threshold '{id}' not found"))
}

#[async_trait]
impl AlertStore for InMemoryStore {
    async fn get_device(&self, id: Uuid) -> AppResult<Option<devices::Model>> {
        Ok(self.tables.read().await.devices.get(&id).cloned())
    }

    async fn get_threshold(&self, id: Uuid) -> AppResult<Option<thresholds::Model>> {
        Ok(self.tables.read().await.thresholds.get(&id).cloned())
    }

    async fn active_thresholds(&self, sensor_id: Uuid) -> AppResult<Vec<thresholds::Model>> {
        let tables = self.tables.read().await;
        let mut active: Vec<_> = tables
            .thresholds
            .values()
            .filter(|t| t.sensor_id == sensor_id && t.is_active)
            .cloned()
            .collect();
        active.sort_by_key(|t| t.created_at);
        Ok(active)
    }

    async fn list_thresholds(
        &self,
        sensor_id: Option<Uuid>,
        is_active: Option<bool>,
    ) -> AppResult<Vec<thresholds::Model>> {
        let tables = self.tables.read().await;
        let mut matching: Vec<_> = tables
            .thresholds
            .values()
            .filter(|t| sensor_id.is_none_or(|id| t.sensor_id == id))
            .filter(|t| is_active.is_none_or(|active| t.is_active == active))
            .cloned()
            .collect();
        matching.sort_by_key(|t| (t.sensor_id, t.created_at));
        Ok(matching)
    }

    async fn insert_threshold(&self, threshold: thresholds::Model) -> AppResult<thresholds::Model> {
        self.check_writable()?;
        self.tables
            .write()
            .await
            .thresholds
            .insert(threshold.id, threshold.clone());
        Ok(threshold)
    }

    async fn save_threshold(&self, threshold: thresholds::Model) -> AppResult<thresholds::Model> {
        self.check_writable()?;
        let mut tables = self.tables.write().await;
        let stored = tables
            .thresholds
            .get_mut(&threshold.id)
            .ok_or_else(|| not_found(threshold.id))?;
        *stored = threshold.clone();
        Ok(threshold)
    }

    async fn delete_threshold(&self, id: Uuid) -> AppResult<()> {
        self.check_writable()?;
        let mut tables = self.tables.write().await;

        if tables.alerts.iter().any(|a| a.threshold_id == id) {
            return Err(AppError::Validation(format!(
                "Threshold '{id}' has alerts; deactivate it instead"
            )));
        }
        tables.thresholds.remove(&id).map(|_| ()).ok_or_else(|| not_found(id))
    }

    async fn count_alerts_for_threshold(&self, threshold_id: Uuid) -> AppResult<u64> {
        let tables = self.tables.read().await;
        let count = tables
            .alerts
            .iter()
            .filter(|a| a.threshold_id == threshold_id)
            .count();
        Ok(count as u64)
    }

    async fn insert_reading(&self, reading: readings::Model) -> AppResult<readings::Model> {
        self.check_writable()?;
        self.tables.write().await.readings.push(reading.clone());
        Ok(reading)
    }

    async fn find_open_alert(
        &self,
        sensor_id: Uuid,
        threshold_id: Uuid,
        severity: Severity,
    ) -> AppResult<Option<alerts::Model>> {
        Ok(self
            .tables
            .read()
            .await
            .alerts
            .iter()
            .find(|a| {
                a.sensor_id == sensor_id
                    && a.threshold_id == threshold_id
                    && a.severity == severity
                    && a.status.is_open()
            })
            .cloned())
    }

    async fn open_alerts_for_threshold(
        &self,
        sensor_id: Uuid,
        threshold_id: Uuid,
    ) -> AppResult<Vec<alerts::Model>> {
        Ok(self
            .tables
            .read()
            .await
            .alerts
            .iter()
            .filter(|a| {
                a.sensor_id == sensor_id && a.threshold_id == threshold_id && a.status.is_open()
            })
            .cloned()
            .collect())
    }

    async fn create_alert(&self, alert: alerts::Model) -> AppResult<alerts::Model> {
        self.check_alerts_writable()?;
        let mut tables = self.tables.write().await;

        if let Some(existing) = tables.alerts.iter().find(|a| {
            a.sensor_id == alert.sensor_id
                && a.threshold_id == alert.threshold_id
                && a.severity == alert.severity
                && a.status.is_open()
        }) {
            return Ok(existing.clone());
        }

        tables.alerts.push(alert.clone());
        Ok(alert)
    }

    async fn update_alert(&self, alert: &alerts::Model, expected: AlertStatus) -> AppResult<bool> {
        self.check_alerts_writable()?;
        let mut tables = self.tables.write().await;

        let Some(stored) = tables
            .alerts
            .iter_mut()
            .find(|a| a.id == alert.id && a.status == expected)
        else {
            return Ok(false);
        };

        stored.status = alert.status;
        stored.message = alert.message.clone();
        stored.acknowledged_at = alert.acknowledged_at;
        stored.resolved_at = alert.resolved_at;
        Ok(true)
    }

    async fn get_alert(&self, id: Uuid) -> AppResult<Option<alerts::Model>> {
        Ok(self
            .tables
            .read()
            .await
            .alerts
            .iter()
            .find(|a| a.id == id)
            .cloned())
    }

    async fn list_alerts(&self, filter: &AlertFilter) -> AppResult<Vec<alerts::Model>> {
        let tables = self.tables.read().await;
        let mut matching: Vec<_> = tables
            .alerts
            .iter()
            .filter(|a| filter.matches(a))
            .cloned()
            .collect();
        // Stable sort keeps insertion order for alerts created in the same instant
        matching.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(matching)
    }
}
