//! Common types used throughout the marketplace system.

use chrono::{DateTime, Utc};

/// Unique identifier for a user account.
pub type UserId = uuid::Uuid;

/// Unique identifier for a shipment.
pub type ShipmentId = uuid::Uuid;

/// Unique identifier for an offer.
pub type OfferId = uuid::Uuid;

/// Unique identifier for a notification.
pub type NotificationId = uuid::Uuid;

/// Timestamp used for all entity creation and update times.
pub type Timestamp = DateTime<Utc>;

/// Returns the current timestamp.
pub fn now() -> Timestamp {
	Utc::now()
}
