//! Notification dispatcher for the marketplace system.
//!
//! Notifications are append-only rows created exclusively as side effects
//! of lifecycle transitions; no client request writes them directly. The
//! poll-based live channel lives in [`live`].

pub mod live;

use freight_types::{
	now, Notification, NotificationType, OfferId, Result, ShipmentId, UserId,
};
use freight_storage::StorageInterface;
use rust_decimal::Decimal;
use std::sync::Arc;
use tracing::debug;

/// Service managing notification rows for lifecycle events.
pub struct NotificationService {
	storage: Arc<dyn StorageInterface>,
}

impl NotificationService {
	pub fn new(storage: Arc<dyn StorageInterface>) -> Self {
		Self { storage }
	}

	/// Appends one unread notification row for the given recipient.
	pub async fn emit(
		&self,
		user_id: UserId,
		kind: NotificationType,
		title: String,
		message: String,
		shipment_id: Option<ShipmentId>,
		offer_id: Option<OfferId>,
	) -> Result<Notification> {
		let notification = Notification {
			id: uuid::Uuid::new_v4(),
			user_id,
			kind,
			title,
			message,
			shipment_id,
			offer_id,
			read: false,
			created_at: now(),
		};
		self.storage.insert_notification(&notification).await?;
		debug!(notification_id = %notification.id, recipient = %user_id, "notification emitted");
		Ok(notification)
	}

	/// All notifications for the given user, newest-first.
	pub async fn list(&self, user_id: &UserId) -> Result<Vec<Notification>> {
		Ok(self.storage.notifications_by_user(user_id).await?)
	}

	/// Tells a client that an agent has bid on their shipment.
	pub async fn notify_new_offer(
		&self,
		client_id: UserId,
		agent_name: &str,
		price: Decimal,
		shipment_id: ShipmentId,
		offer_id: OfferId,
	) -> Result<Notification> {
		self.emit(
			client_id,
			NotificationType::NewOffer,
			"New Offer Received".to_string(),
			format!(
				"You have received a new offer of ${} from {} for your shipment #{}.",
				price, agent_name, shipment_id
			),
			Some(shipment_id),
			Some(offer_id),
		)
		.await
	}

	/// Tells an agent that their offer was accepted.
	pub async fn notify_offer_accepted(
		&self,
		agent_id: UserId,
		price: Decimal,
		shipment_id: ShipmentId,
		offer_id: OfferId,
	) -> Result<Notification> {
		self.emit(
			agent_id,
			NotificationType::OfferAccepted,
			"Offer Accepted".to_string(),
			format!("Your offer of ${} has been accepted!", price),
			Some(shipment_id),
			Some(offer_id),
		)
		.await
	}

	/// Tells an agent that their offer was rejected.
	pub async fn notify_offer_rejected(
		&self,
		agent_id: UserId,
		price: Decimal,
		shipment_id: ShipmentId,
		offer_id: OfferId,
	) -> Result<Notification> {
		self.emit(
			agent_id,
			NotificationType::OfferRejected,
			"Offer Rejected".to_string(),
			format!("Your offer of ${} has been rejected.", price),
			Some(shipment_id),
			Some(offer_id),
		)
		.await
	}
}
