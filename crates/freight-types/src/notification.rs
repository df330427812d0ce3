//! Notifications: append-only records informing one user of a lifecycle
//! event. Created exclusively as a side effect of lifecycle transitions.

use crate::common::{NotificationId, OfferId, ShipmentId, Timestamp, UserId};
use serde::{Deserialize, Serialize};

/// The lifecycle event a notification reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationType {
	NewOffer,
	OfferAccepted,
	OfferRejected,
}

/// A record informing one recipient of one lifecycle event.
///
/// Immutable except for the `read` flag.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Notification {
	pub id: NotificationId,
	pub user_id: UserId,
	#[serde(rename = "type")]
	pub kind: NotificationType,
	pub title: String,
	pub message: String,
	pub shipment_id: Option<ShipmentId>,
	pub offer_id: Option<OfferId>,
	pub read: bool,
	pub created_at: Timestamp,
}
