use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Payload returned by a sensor's pull endpoint.
///
/// ```json
/// { "value": 21.4, "timestamp": "2026-03-01T10:00:00Z" }
/// ```
///
/// `value` may be a JSON number or a numeric string. Devices without a clock
/// omit `timestamp`; the ingestion time is used instead.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceReading {
    pub value: Decimal,
    #[serde(default, alias = "time")]
    pub timestamp: Option<DateTime<Utc>>,
}
