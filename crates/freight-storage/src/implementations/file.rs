//! File-based storage implementation.
//!
//! Persists each table as a JSON file under a base directory, writing
//! atomically by writing to a temp file then renaming. Shipment rows keep
//! the legacy persisted shape: `dimensions` and `requiredDocuments` are
//! serialized JSON text inside the record, and decoding tolerates rows
//! where the field is already a decoded value.

use crate::{sort_newest_first, StorageError, StorageInterface};
use async_trait::async_trait;
use freight_types::{
	documents_from_stored, documents_to_stored, Dimensions, Notification, Offer, OfferId,
	ServiceType, Shipment, ShipmentId, ShipmentStatus, Timestamp, User, UserId,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::path::PathBuf;
use tokio::fs;
use tokio::sync::Mutex;

/// Shipment row as persisted on disk.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct StoredShipment {
	id: ShipmentId,
	client_id: UserId,
	service_type: ServiceType,
	description: String,
	weight: f64,
	dimensions: Value,
	pickup_address: String,
	pickup_date: Timestamp,
	delivery_address: String,
	delivery_date: Timestamp,
	#[serde(default)]
	required_documents: Option<Value>,
	#[serde(default)]
	notes: Option<String>,
	status: ShipmentStatus,
	#[serde(default)]
	accepted_offer_id: Option<OfferId>,
	created_at: Timestamp,
	updated_at: Timestamp,
}

impl StoredShipment {
	fn encode(shipment: &Shipment) -> Self {
		Self {
			id: shipment.id,
			client_id: shipment.client_id,
			service_type: shipment.service_type,
			description: shipment.description.clone(),
			weight: shipment.weight,
			dimensions: Value::String(shipment.dimensions.to_stored()),
			pickup_address: shipment.pickup_address.clone(),
			pickup_date: shipment.pickup_date,
			delivery_address: shipment.delivery_address.clone(),
			delivery_date: shipment.delivery_date,
			required_documents: documents_to_stored(&shipment.required_documents)
				.map(Value::String),
			notes: shipment.notes.clone(),
			status: shipment.status,
			accepted_offer_id: shipment.accepted_offer_id,
			created_at: shipment.created_at,
			updated_at: shipment.updated_at,
		}
	}

	fn decode(&self) -> Shipment {
		Shipment {
			id: self.id,
			client_id: self.client_id,
			service_type: self.service_type,
			description: self.description.clone(),
			weight: self.weight,
			dimensions: Dimensions::from_stored(&self.dimensions),
			pickup_address: self.pickup_address.clone(),
			pickup_date: self.pickup_date,
			delivery_address: self.delivery_address.clone(),
			delivery_date: self.delivery_date,
			required_documents: documents_from_stored(self.required_documents.as_ref()),
			notes: self.notes.clone(),
			status: self.status,
			accepted_offer_id: self.accepted_offer_id,
			created_at: self.created_at,
			updated_at: self.updated_at,
		}
	}
}

#[derive(Default)]
struct Tables {
	users: Vec<User>,
	shipments: Vec<StoredShipment>,
	offers: Vec<Offer>,
	notifications: Vec<Notification>,
}

/// File-based storage implementation.
pub struct FileStorage {
	/// Base directory path for the table files.
	base_path: PathBuf,
	tables: Mutex<Tables>,
}

impl FileStorage {
	/// Opens the storage at the given base path, loading any existing
	/// table files.
	pub async fn open(base_path: PathBuf) -> Result<Self, StorageError> {
		fs::create_dir_all(&base_path)
			.await
			.map_err(|e| StorageError::Backend(e.to_string()))?;

		let tables = Tables {
			users: load_table(&base_path, "users").await?,
			shipments: load_table(&base_path, "shipments").await?,
			offers: load_table(&base_path, "offers").await?,
			notifications: load_table(&base_path, "notifications").await?,
		};

		Ok(Self {
			base_path,
			tables: Mutex::new(tables),
		})
	}

	async fn flush<T: Serialize>(&self, name: &str, rows: &[T]) -> Result<(), StorageError> {
		let path = self.base_path.join(format!("{}.json", name));
		let bytes = serde_json::to_vec_pretty(rows)
			.map_err(|e| StorageError::Serialization(e.to_string()))?;

		// Write atomically by writing to temp file then renaming
		let temp_path = path.with_extension("tmp");
		fs::write(&temp_path, bytes)
			.await
			.map_err(|e| StorageError::Backend(e.to_string()))?;
		fs::rename(&temp_path, &path)
			.await
			.map_err(|e| StorageError::Backend(e.to_string()))?;

		Ok(())
	}
}

async fn load_table<T: serde::de::DeserializeOwned>(
	base_path: &std::path::Path,
	name: &str,
) -> Result<Vec<T>, StorageError> {
	let path = base_path.join(format!("{}.json", name));
	match fs::read(&path).await {
		Ok(bytes) => {
			serde_json::from_slice(&bytes).map_err(|e| StorageError::Serialization(e.to_string()))
		}
		Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(Vec::new()),
		Err(e) => Err(StorageError::Backend(e.to_string())),
	}
}

#[async_trait]
impl StorageInterface for FileStorage {
	async fn insert_user(&self, user: &User) -> Result<(), StorageError> {
		let mut tables = self.tables.lock().await;
		tables.users.retain(|u| u.id != user.id);
		tables.users.push(user.clone());
		self.flush("users", &tables.users).await
	}

	async fn user(&self, id: &UserId) -> Result<Option<User>, StorageError> {
		let tables = self.tables.lock().await;
		Ok(tables.users.iter().find(|u| u.id == *id).cloned())
	}

	async fn user_by_email(&self, email: &str) -> Result<Option<User>, StorageError> {
		let tables = self.tables.lock().await;
		Ok(tables.users.iter().find(|u| u.email == email).cloned())
	}

	async fn insert_shipment(&self, shipment: &Shipment) -> Result<(), StorageError> {
		let mut tables = self.tables.lock().await;
		tables.shipments.retain(|s| s.id != shipment.id);
		tables.shipments.push(StoredShipment::encode(shipment));
		self.flush("shipments", &tables.shipments).await
	}

	async fn shipment(&self, id: &ShipmentId) -> Result<Option<Shipment>, StorageError> {
		let tables = self.tables.lock().await;
		Ok(tables
			.shipments
			.iter()
			.find(|s| s.id == *id)
			.map(StoredShipment::decode))
	}

	async fn update_shipment(&self, shipment: &Shipment) -> Result<(), StorageError> {
		let mut tables = self.tables.lock().await;
		let row = tables
			.shipments
			.iter_mut()
			.find(|s| s.id == shipment.id)
			.ok_or(StorageError::NotFound)?;
		*row = StoredShipment::encode(shipment);
		self.flush("shipments", &tables.shipments).await
	}

	async fn delete_shipment(&self, id: &ShipmentId) -> Result<(), StorageError> {
		let mut tables = self.tables.lock().await;
		tables.shipments.retain(|s| s.id != *id);
		self.flush("shipments", &tables.shipments).await
	}

	async fn shipments_by_client(&self, client_id: &UserId) -> Result<Vec<Shipment>, StorageError> {
		let tables = self.tables.lock().await;
		let mut rows: Vec<Shipment> = tables
			.shipments
			.iter()
			.filter(|s| s.client_id == *client_id)
			.map(StoredShipment::decode)
			.collect();
		sort_newest_first(&mut rows, |s| s.created_at, |s| s.id);
		Ok(rows)
	}

	async fn shipments_open_for_offers(&self) -> Result<Vec<Shipment>, StorageError> {
		let tables = self.tables.lock().await;
		let mut rows: Vec<Shipment> = tables
			.shipments
			.iter()
			.filter(|s| s.status.is_open_for_offers())
			.map(StoredShipment::decode)
			.collect();
		sort_newest_first(&mut rows, |s| s.created_at, |s| s.id);
		Ok(rows)
	}

	async fn insert_offer(&self, offer: &Offer) -> Result<(), StorageError> {
		let mut tables = self.tables.lock().await;
		tables.offers.retain(|o| o.id != offer.id);
		tables.offers.push(offer.clone());
		self.flush("offers", &tables.offers).await
	}

	async fn offer(&self, id: &OfferId) -> Result<Option<Offer>, StorageError> {
		let tables = self.tables.lock().await;
		Ok(tables.offers.iter().find(|o| o.id == *id).cloned())
	}

	async fn update_offer(&self, offer: &Offer) -> Result<(), StorageError> {
		let mut tables = self.tables.lock().await;
		let row = tables
			.offers
			.iter_mut()
			.find(|o| o.id == offer.id)
			.ok_or(StorageError::NotFound)?;
		*row = offer.clone();
		self.flush("offers", &tables.offers).await
	}

	async fn offers_by_shipment(
		&self,
		shipment_id: &ShipmentId,
	) -> Result<Vec<Offer>, StorageError> {
		let tables = self.tables.lock().await;
		let mut rows: Vec<Offer> = tables
			.offers
			.iter()
			.filter(|o| o.shipment_id == *shipment_id)
			.cloned()
			.collect();
		sort_newest_first(&mut rows, |o| o.created_at, |o| o.id);
		Ok(rows)
	}

	async fn offer_by_shipment_and_agent(
		&self,
		shipment_id: &ShipmentId,
		agent_id: &UserId,
	) -> Result<Option<Offer>, StorageError> {
		let tables = self.tables.lock().await;
		Ok(tables
			.offers
			.iter()
			.find(|o| o.shipment_id == *shipment_id && o.agent_id == *agent_id)
			.cloned())
	}

	async fn delete_offers_by_shipment(
		&self,
		shipment_id: &ShipmentId,
	) -> Result<(), StorageError> {
		let mut tables = self.tables.lock().await;
		tables.offers.retain(|o| o.shipment_id != *shipment_id);
		self.flush("offers", &tables.offers).await
	}

	async fn insert_notification(&self, notification: &Notification) -> Result<(), StorageError> {
		let mut tables = self.tables.lock().await;
		tables.notifications.push(notification.clone());
		self.flush("notifications", &tables.notifications).await
	}

	async fn notifications_by_user(
		&self,
		user_id: &UserId,
	) -> Result<Vec<Notification>, StorageError> {
		let tables = self.tables.lock().await;
		let mut rows: Vec<Notification> = tables
			.notifications
			.iter()
			.filter(|n| n.user_id == *user_id)
			.cloned()
			.collect();
		sort_newest_first(&mut rows, |n| n.created_at, |n| n.id);
		Ok(rows)
	}

	async fn unread_notifications_after(
		&self,
		user_id: &UserId,
		after: Timestamp,
	) -> Result<Vec<Notification>, StorageError> {
		let tables = self.tables.lock().await;
		let mut rows: Vec<Notification> = tables
			.notifications
			.iter()
			.filter(|n| n.user_id == *user_id && !n.read && n.created_at > after)
			.cloned()
			.collect();
		sort_newest_first(&mut rows, |n| n.created_at, |n| n.id);
		Ok(rows)
	}

	async fn delete_notifications_by_shipment(
		&self,
		shipment_id: &ShipmentId,
	) -> Result<(), StorageError> {
		let mut tables = self.tables.lock().await;
		tables
			.notifications
			.retain(|n| n.shipment_id != Some(*shipment_id));
		self.flush("notifications", &tables.notifications).await
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use chrono::Utc;
	use freight_types::{Dimensions, ServiceType, ShipmentStatus};
	use serde_json::json;

	fn shipment() -> Shipment {
		let now = Utc::now();
		Shipment {
			id: uuid::Uuid::new_v4(),
			client_id: uuid::Uuid::new_v4(),
			service_type: ServiceType::Customs,
			description: "bonded cargo".to_string(),
			weight: 45.0,
			dimensions: Dimensions {
				length: 0.5,
				width: 0.5,
				height: 0.5,
			},
			pickup_address: "Terminal 2".to_string(),
			pickup_date: now,
			delivery_address: "Warehouse 7".to_string(),
			delivery_date: now,
			required_documents: vec!["invoice".to_string()],
			notes: Some("fragile".to_string()),
			status: ShipmentStatus::Pending,
			accepted_offer_id: None,
			created_at: now,
			updated_at: now,
		}
	}

	#[tokio::test]
	async fn shipment_survives_reopen_with_text_encoded_fields() {
		let dir = tempfile::tempdir().unwrap();
		let original = shipment();

		{
			let storage = FileStorage::open(dir.path().to_path_buf()).await.unwrap();
			storage.insert_shipment(&original).await.unwrap();
		}

		// The on-disk row must hold the serialized-text shape.
		let raw = std::fs::read(dir.path().join("shipments.json")).unwrap();
		let rows: Vec<Value> = serde_json::from_slice(&raw).unwrap();
		assert!(rows[0]["dimensions"].is_string());
		assert!(rows[0]["requiredDocuments"].is_string());

		let reopened = FileStorage::open(dir.path().to_path_buf()).await.unwrap();
		let loaded = reopened.shipment(&original.id).await.unwrap().unwrap();
		assert_eq!(loaded.dimensions, original.dimensions);
		assert_eq!(loaded.required_documents, original.required_documents);
	}

	#[tokio::test]
	async fn legacy_rows_with_decoded_fields_still_load() {
		let dir = tempfile::tempdir().unwrap();
		let original = shipment();
		let mut stored = serde_json::to_value(StoredShipment::encode(&original)).unwrap();
		// Legacy writers stored the decoded object/array directly.
		stored["dimensions"] = json!({"length": 0.5, "width": 0.5, "height": 0.5});
		stored["requiredDocuments"] = json!(["invoice"]);
		std::fs::write(
			dir.path().join("shipments.json"),
			serde_json::to_vec(&vec![stored]).unwrap(),
		)
		.unwrap();

		let storage = FileStorage::open(dir.path().to_path_buf()).await.unwrap();
		let loaded = storage.shipment(&original.id).await.unwrap().unwrap();
		assert_eq!(loaded.dimensions, original.dimensions);
		assert_eq!(loaded.required_documents, vec!["invoice".to_string()]);
	}
}
