//! In-memory storage implementation.

use crate::{sort_newest_first, StorageError, StorageInterface};
use async_trait::async_trait;
use dashmap::DashMap;
use freight_types::{
	Notification, NotificationId, Offer, OfferId, Shipment, ShipmentId, Timestamp, User, UserId,
};

/// In-memory storage implementation backed by concurrent maps.
///
/// The default backend; rows live only for the lifetime of the process.
#[derive(Default)]
pub struct MemoryStorage {
	users: DashMap<UserId, User>,
	shipments: DashMap<ShipmentId, Shipment>,
	offers: DashMap<OfferId, Offer>,
	notifications: DashMap<NotificationId, Notification>,
}

impl MemoryStorage {
	pub fn new() -> Self {
		Self::default()
	}
}

#[async_trait]
impl StorageInterface for MemoryStorage {
	async fn insert_user(&self, user: &User) -> Result<(), StorageError> {
		self.users.insert(user.id, user.clone());
		Ok(())
	}

	async fn user(&self, id: &UserId) -> Result<Option<User>, StorageError> {
		Ok(self.users.get(id).map(|entry| entry.clone()))
	}

	async fn user_by_email(&self, email: &str) -> Result<Option<User>, StorageError> {
		Ok(self
			.users
			.iter()
			.find(|entry| entry.email == email)
			.map(|entry| entry.clone()))
	}

	async fn insert_shipment(&self, shipment: &Shipment) -> Result<(), StorageError> {
		self.shipments.insert(shipment.id, shipment.clone());
		Ok(())
	}

	async fn shipment(&self, id: &ShipmentId) -> Result<Option<Shipment>, StorageError> {
		Ok(self.shipments.get(id).map(|entry| entry.clone()))
	}

	async fn update_shipment(&self, shipment: &Shipment) -> Result<(), StorageError> {
		if !self.shipments.contains_key(&shipment.id) {
			return Err(StorageError::NotFound);
		}
		self.shipments.insert(shipment.id, shipment.clone());
		Ok(())
	}

	async fn delete_shipment(&self, id: &ShipmentId) -> Result<(), StorageError> {
		self.shipments.remove(id);
		Ok(())
	}

	async fn shipments_by_client(&self, client_id: &UserId) -> Result<Vec<Shipment>, StorageError> {
		let mut rows: Vec<Shipment> = self
			.shipments
			.iter()
			.filter(|entry| entry.client_id == *client_id)
			.map(|entry| entry.clone())
			.collect();
		sort_newest_first(&mut rows, |s| s.created_at, |s| s.id);
		Ok(rows)
	}

	async fn shipments_open_for_offers(&self) -> Result<Vec<Shipment>, StorageError> {
		let mut rows: Vec<Shipment> = self
			.shipments
			.iter()
			.filter(|entry| entry.status.is_open_for_offers())
			.map(|entry| entry.clone())
			.collect();
		sort_newest_first(&mut rows, |s| s.created_at, |s| s.id);
		Ok(rows)
	}

	async fn insert_offer(&self, offer: &Offer) -> Result<(), StorageError> {
		self.offers.insert(offer.id, offer.clone());
		Ok(())
	}

	async fn offer(&self, id: &OfferId) -> Result<Option<Offer>, StorageError> {
		Ok(self.offers.get(id).map(|entry| entry.clone()))
	}

	async fn update_offer(&self, offer: &Offer) -> Result<(), StorageError> {
		if !self.offers.contains_key(&offer.id) {
			return Err(StorageError::NotFound);
		}
		self.offers.insert(offer.id, offer.clone());
		Ok(())
	}

	async fn offers_by_shipment(
		&self,
		shipment_id: &ShipmentId,
	) -> Result<Vec<Offer>, StorageError> {
		let mut rows: Vec<Offer> = self
			.offers
			.iter()
			.filter(|entry| entry.shipment_id == *shipment_id)
			.map(|entry| entry.clone())
			.collect();
		sort_newest_first(&mut rows, |o| o.created_at, |o| o.id);
		Ok(rows)
	}

	async fn offer_by_shipment_and_agent(
		&self,
		shipment_id: &ShipmentId,
		agent_id: &UserId,
	) -> Result<Option<Offer>, StorageError> {
		Ok(self
			.offers
			.iter()
			.find(|entry| entry.shipment_id == *shipment_id && entry.agent_id == *agent_id)
			.map(|entry| entry.clone()))
	}

	async fn delete_offers_by_shipment(
		&self,
		shipment_id: &ShipmentId,
	) -> Result<(), StorageError> {
		self.offers.retain(|_, offer| offer.shipment_id != *shipment_id);
		Ok(())
	}

	async fn insert_notification(&self, notification: &Notification) -> Result<(), StorageError> {
		self.notifications
			.insert(notification.id, notification.clone());
		Ok(())
	}

	async fn notifications_by_user(
		&self,
		user_id: &UserId,
	) -> Result<Vec<Notification>, StorageError> {
		let mut rows: Vec<Notification> = self
			.notifications
			.iter()
			.filter(|entry| entry.user_id == *user_id)
			.map(|entry| entry.clone())
			.collect();
		sort_newest_first(&mut rows, |n| n.created_at, |n| n.id);
		Ok(rows)
	}

	async fn unread_notifications_after(
		&self,
		user_id: &UserId,
		after: Timestamp,
	) -> Result<Vec<Notification>, StorageError> {
		let mut rows: Vec<Notification> = self
			.notifications
			.iter()
			.filter(|entry| entry.user_id == *user_id && !entry.read && entry.created_at > after)
			.map(|entry| entry.clone())
			.collect();
		sort_newest_first(&mut rows, |n| n.created_at, |n| n.id);
		Ok(rows)
	}

	async fn delete_notifications_by_shipment(
		&self,
		shipment_id: &ShipmentId,
	) -> Result<(), StorageError> {
		self.notifications
			.retain(|_, notification| notification.shipment_id != Some(*shipment_id));
		Ok(())
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use chrono::{Duration, Utc};
	use freight_types::{
		Dimensions, NotificationType, OfferStatus, Role, ServiceType, ShipmentStatus,
	};
	use rust_decimal::Decimal;

	fn shipment(client_id: UserId, created_offset_secs: i64) -> Shipment {
		let now = Utc::now() + Duration::seconds(created_offset_secs);
		Shipment {
			id: uuid::Uuid::new_v4(),
			client_id,
			service_type: ServiceType::Transport,
			description: "pallets".to_string(),
			weight: 120.0,
			dimensions: Dimensions {
				length: 1.2,
				width: 0.8,
				height: 1.0,
			},
			pickup_address: "Dock 4".to_string(),
			pickup_date: now,
			delivery_address: "Gate 9".to_string(),
			delivery_date: now,
			required_documents: vec![],
			notes: None,
			status: ShipmentStatus::Pending,
			accepted_offer_id: None,
			created_at: now,
			updated_at: now,
		}
	}

	fn offer(shipment_id: ShipmentId, agent_id: UserId, created_offset_secs: i64) -> Offer {
		let now = Utc::now() + Duration::seconds(created_offset_secs);
		Offer {
			id: uuid::Uuid::new_v4(),
			agent_id,
			shipment_id,
			price: Decimal::new(100, 0),
			notes: None,
			status: OfferStatus::Pending,
			created_at: now,
			updated_at: now,
		}
	}

	#[tokio::test]
	async fn offers_listed_newest_first() {
		let storage = MemoryStorage::new();
		let shipment_id = uuid::Uuid::new_v4();

		let older = offer(shipment_id, uuid::Uuid::new_v4(), -10);
		let newer = offer(shipment_id, uuid::Uuid::new_v4(), 0);
		storage.insert_offer(&older).await.unwrap();
		storage.insert_offer(&newer).await.unwrap();

		let rows = storage.offers_by_shipment(&shipment_id).await.unwrap();
		assert_eq!(rows.len(), 2);
		assert_eq!(rows[0].id, newer.id);
		assert_eq!(rows[1].id, older.id);
	}

	#[tokio::test]
	async fn open_shipments_exclude_decided_ones() {
		let storage = MemoryStorage::new();
		let client = uuid::Uuid::new_v4();

		let open = shipment(client, 0);
		let mut decided = shipment(client, -5);
		decided.status = ShipmentStatus::OfferAccepted;
		storage.insert_shipment(&open).await.unwrap();
		storage.insert_shipment(&decided).await.unwrap();

		let rows = storage.shipments_open_for_offers().await.unwrap();
		assert_eq!(rows.len(), 1);
		assert_eq!(rows[0].id, open.id);
	}

	#[tokio::test]
	async fn unread_filter_respects_checkpoint_and_read_flag() {
		let storage = MemoryStorage::new();
		let user_id = uuid::Uuid::new_v4();
		let checkpoint = Utc::now();

		let old = Notification {
			id: uuid::Uuid::new_v4(),
			user_id,
			kind: NotificationType::NewOffer,
			title: "t".to_string(),
			message: "m".to_string(),
			shipment_id: None,
			offer_id: None,
			read: false,
			created_at: checkpoint - Duration::seconds(5),
		};
		let fresh = Notification {
			created_at: checkpoint + Duration::seconds(5),
			id: uuid::Uuid::new_v4(),
			..old.clone()
		};
		let fresh_but_read = Notification {
			created_at: checkpoint + Duration::seconds(5),
			id: uuid::Uuid::new_v4(),
			read: true,
			..old.clone()
		};
		storage.insert_notification(&old).await.unwrap();
		storage.insert_notification(&fresh).await.unwrap();
		storage.insert_notification(&fresh_but_read).await.unwrap();

		let rows = storage
			.unread_notifications_after(&user_id, checkpoint)
			.await
			.unwrap();
		assert_eq!(rows.len(), 1);
		assert_eq!(rows[0].id, fresh.id);
	}

	#[tokio::test]
	async fn user_lookup_by_email() {
		let storage = MemoryStorage::new();
		let now = Utc::now();
		let user = User {
			id: uuid::Uuid::new_v4(),
			email: "client@example.com".to_string(),
			password_hash: "digest".to_string(),
			name: "Client".to_string(),
			role: Role::Client,
			created_at: now,
			updated_at: now,
		};
		storage.insert_user(&user).await.unwrap();

		let found = storage.user_by_email("client@example.com").await.unwrap();
		assert_eq!(found.map(|u| u.id), Some(user.id));
		assert!(storage.user_by_email("missing@example.com").await.unwrap().is_none());
	}
}
