//! Shipment lifecycle manager.
//!
//! Owns every write to the shipment table except the accept transition,
//! which belongs to the offer lifecycle manager. Authorization is enforced
//! here per operation against the authenticated requester, never inferred
//! from client-held state.

use freight_types::{
	now, AuthUser, CreateShipmentRequest, MarketError, OfferView, Result, Role, Shipment,
	ShipmentDetail, ShipmentId, ShipmentStatus, ShipmentView, UpdateStatusRequest,
};
use freight_storage::StorageInterface;
use std::sync::Arc;
use tracing::info;

/// Service managing shipment creation, listing, and status transitions.
pub struct ShipmentService {
	storage: Arc<dyn StorageInterface>,
}

impl ShipmentService {
	pub fn new(storage: Arc<dyn StorageInterface>) -> Self {
		Self { storage }
	}

	/// Creates a new shipment for the requesting client.
	pub async fn create(
		&self,
		requester: &AuthUser,
		request: CreateShipmentRequest,
	) -> Result<Shipment> {
		let (
			service_type,
			description,
			weight,
			dimensions,
			pickup_address,
			pickup_date,
			delivery_address,
			delivery_date,
		) = match (
			request.service_type,
			request.description,
			request.weight,
			request.dimensions,
			request.pickup_address,
			request.pickup_date,
			request.delivery_address,
			request.delivery_date,
		) {
			(
				Some(service_type),
				Some(description),
				Some(weight),
				Some(dimensions),
				Some(pickup_address),
				Some(pickup_date),
				Some(delivery_address),
				Some(delivery_date),
			) => (
				service_type,
				description,
				weight,
				dimensions,
				pickup_address,
				pickup_date,
				delivery_address,
				delivery_date,
			),
			_ => return Err(MarketError::Validation("Missing required fields".to_string())),
		};

		let timestamp = now();
		let shipment = Shipment {
			id: uuid::Uuid::new_v4(),
			client_id: requester.user_id,
			service_type,
			description,
			weight,
			dimensions,
			pickup_address,
			pickup_date,
			delivery_address,
			delivery_date,
			required_documents: request.required_documents.unwrap_or_default(),
			notes: request.notes,
			status: ShipmentStatus::Pending,
			accepted_offer_id: None,
			created_at: timestamp,
			updated_at: timestamp,
		};
		self.storage.insert_shipment(&shipment).await?;
		info!(shipment_id = %shipment.id, client_id = %shipment.client_id, "shipment created");
		Ok(shipment)
	}

	/// Returns one shipment with its offers, newest-first.
	///
	/// Agents may read any shipment; clients only their own. Offers are
	/// joined with the bidding agent's name and email.
	pub async fn get(
		&self,
		shipment_id: &ShipmentId,
		requester: &AuthUser,
	) -> Result<ShipmentDetail> {
		let shipment = self
			.storage
			.shipment(shipment_id)
			.await?
			.ok_or_else(|| MarketError::NotFound("Shipment not found".to_string()))?;

		if requester.role == Role::Client && shipment.client_id != requester.user_id {
			return Err(MarketError::Forbidden(
				"You do not have permission to perform this action".to_string(),
			));
		}

		let mut offers = Vec::new();
		for offer in self.storage.offers_by_shipment(shipment_id).await? {
			let agent = self.storage.user(&offer.agent_id).await?;
			offers.push(OfferView {
				offer,
				agent_name: agent.as_ref().map(|a| a.name.clone()),
				agent_email: agent.map(|a| a.email),
			});
		}

		Ok(ShipmentDetail { shipment, offers })
	}

	/// Lists shipments visible to the requester, newest-first.
	///
	/// Clients see their own shipments; agents see the marketplace of
	/// shipments still open for offers, with the owning client's name.
	pub async fn list(&self, requester: &AuthUser) -> Result<Vec<ShipmentView>> {
		match requester.role {
			Role::Client => {
				let shipments = self.storage.shipments_by_client(&requester.user_id).await?;
				Ok(shipments
					.into_iter()
					.map(|shipment| ShipmentView {
						shipment,
						client_name: None,
					})
					.collect())
			}
			Role::Agent => {
				let shipments = self.storage.shipments_open_for_offers().await?;
				let mut views = Vec::with_capacity(shipments.len());
				for shipment in shipments {
					let client = self.storage.user(&shipment.client_id).await?;
					views.push(ShipmentView {
						shipment,
						client_name: client.map(|c| c.name),
					});
				}
				Ok(views)
			}
		}
	}

	/// Deletes a shipment and everything hanging off it.
	///
	/// Owner-only; refused once an offer has been accepted. The cascade
	/// removes the shipment's offers and notifications before the shipment
	/// row itself.
	pub async fn delete(&self, shipment_id: &ShipmentId, requester: &AuthUser) -> Result<()> {
		let shipment = self
			.storage
			.shipment(shipment_id)
			.await?
			.ok_or_else(|| MarketError::NotFound("Shipment not found".to_string()))?;

		if requester.role != Role::Client || shipment.client_id != requester.user_id {
			return Err(MarketError::Forbidden(
				"You do not have permission to perform this action".to_string(),
			));
		}

		if !matches!(
			shipment.status,
			ShipmentStatus::Pending | ShipmentStatus::OffersReceived
		) {
			return Err(MarketError::InvalidState(
				"Cannot delete a shipment after an offer has been accepted".to_string(),
			));
		}

		self.storage.delete_offers_by_shipment(shipment_id).await?;
		self.storage
			.delete_notifications_by_shipment(shipment_id)
			.await?;
		self.storage.delete_shipment(shipment_id).await?;
		info!(shipment_id = %shipment_id, "shipment deleted with offers and notifications");
		Ok(())
	}

	/// Moves a shipment to the given status.
	///
	/// Clients may only move their own shipments; any agent may move any
	/// shipment. The permissiveness is deliberate and load-bearing for
	/// agents driving accepted shipments through `in_progress` and
	/// `completed`.
	pub async fn update_status(
		&self,
		shipment_id: &ShipmentId,
		requester: &AuthUser,
		request: UpdateStatusRequest,
	) -> Result<Shipment> {
		let status = request
			.status
			.as_deref()
			.and_then(ShipmentStatus::parse)
			.ok_or_else(|| MarketError::Validation("Invalid status".to_string()))?;

		let mut shipment = self
			.storage
			.shipment(shipment_id)
			.await?
			.ok_or_else(|| MarketError::NotFound("Shipment not found".to_string()))?;

		if requester.role == Role::Client && shipment.client_id != requester.user_id {
			return Err(MarketError::Forbidden(
				"You do not have permission to perform this action".to_string(),
			));
		}

		shipment.status = status;
		shipment.updated_at = now();
		self.storage.update_shipment(&shipment).await?;
		info!(shipment_id = %shipment.id, status = %status, "shipment status updated");
		Ok(shipment)
	}
}
