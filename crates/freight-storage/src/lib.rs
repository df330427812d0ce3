//! Persistence collaborator for the marketplace system.
//!
//! This module provides the storage abstraction the lifecycle managers
//! issue read/write operations against, with in-memory and file-based
//! backend implementations. All mutation of shipment and offer rows goes
//! through the lifecycle managers; no other path writes these tables.

use async_trait::async_trait;
use freight_types::{
	MarketError, Notification, Offer, OfferId, Shipment, ShipmentId, Timestamp, User, UserId,
};
use thiserror::Error;

/// Re-export implementations
pub mod implementations {
	pub mod file;
	pub mod memory;
}

pub use implementations::file::FileStorage;
pub use implementations::memory::MemoryStorage;

/// Sorts rows newest-created-first, breaking creation-time ties by id so
/// the order is stable.
pub(crate) fn sort_newest_first<T>(
	rows: &mut [T],
	created_at: impl Fn(&T) -> Timestamp,
	id: impl Fn(&T) -> uuid::Uuid,
) {
	rows.sort_by(|a, b| {
		created_at(b)
			.cmp(&created_at(a))
			.then_with(|| id(b).cmp(&id(a)))
	});
}

/// Errors that can occur during storage operations.
#[derive(Debug, Error)]
pub enum StorageError {
	/// Error that occurs when a referenced row is absent.
	#[error("Not found")]
	NotFound,
	/// Error that occurs during serialization/deserialization.
	#[error("Serialization error: {0}")]
	Serialization(String),
	/// Error that occurs in the storage backend.
	#[error("Backend error: {0}")]
	Backend(String),
}

impl From<StorageError> for MarketError {
	fn from(err: StorageError) -> Self {
		MarketError::Storage(err.to_string())
	}
}

/// Trait defining the per-entity interface for storage backends.
///
/// Lookups return `Ok(None)` for absent rows; `StorageError` is reserved
/// for backend and serialization failures. Every listing method returns
/// rows ordered newest-created-first.
#[async_trait]
pub trait StorageInterface: Send + Sync {
	// Users

	async fn insert_user(&self, user: &User) -> Result<(), StorageError>;

	async fn user(&self, id: &UserId) -> Result<Option<User>, StorageError>;

	async fn user_by_email(&self, email: &str) -> Result<Option<User>, StorageError>;

	// Shipments

	async fn insert_shipment(&self, shipment: &Shipment) -> Result<(), StorageError>;

	async fn shipment(&self, id: &ShipmentId) -> Result<Option<Shipment>, StorageError>;

	/// Replaces an existing shipment row.
	async fn update_shipment(&self, shipment: &Shipment) -> Result<(), StorageError>;

	async fn delete_shipment(&self, id: &ShipmentId) -> Result<(), StorageError>;

	/// All shipments owned by the given client, newest-first.
	async fn shipments_by_client(&self, client_id: &UserId) -> Result<Vec<Shipment>, StorageError>;

	/// All shipments still open for offers, newest-first.
	async fn shipments_open_for_offers(&self) -> Result<Vec<Shipment>, StorageError>;

	// Offers

	async fn insert_offer(&self, offer: &Offer) -> Result<(), StorageError>;

	async fn offer(&self, id: &OfferId) -> Result<Option<Offer>, StorageError>;

	/// Replaces an existing offer row.
	async fn update_offer(&self, offer: &Offer) -> Result<(), StorageError>;

	/// All offers on the given shipment, newest-first.
	async fn offers_by_shipment(&self, shipment_id: &ShipmentId)
		-> Result<Vec<Offer>, StorageError>;

	async fn offer_by_shipment_and_agent(
		&self,
		shipment_id: &ShipmentId,
		agent_id: &UserId,
	) -> Result<Option<Offer>, StorageError>;

	async fn delete_offers_by_shipment(&self, shipment_id: &ShipmentId)
		-> Result<(), StorageError>;

	// Notifications

	async fn insert_notification(&self, notification: &Notification) -> Result<(), StorageError>;

	/// All notifications for the given user, newest-first.
	async fn notifications_by_user(
		&self,
		user_id: &UserId,
	) -> Result<Vec<Notification>, StorageError>;

	/// Unread notifications for the given user created strictly after the
	/// given instant, newest-first.
	async fn unread_notifications_after(
		&self,
		user_id: &UserId,
		after: Timestamp,
	) -> Result<Vec<Notification>, StorageError>;

	async fn delete_notifications_by_shipment(
		&self,
		shipment_id: &ShipmentId,
	) -> Result<(), StorageError>;
}
