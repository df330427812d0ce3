//! Offer lifecycle manager.
//!
//! Owns every write to the offer table and the accept transition on
//! shipments. The accept path is the only section of the system requiring
//! explicit mutual exclusion: a per-shipment lock registry serializes
//! concurrent accepts so that at most one offer per shipment ever reaches
//! `accepted`.

use dashmap::DashMap;
use freight_types::{
	now, AuthUser, CreateOfferRequest, MarketError, Offer, OfferId, OfferStatus, Result, Role,
	ShipmentId, ShipmentStatus,
};
use freight_email::EmailService;
use freight_notify::NotificationService;
use freight_storage::StorageInterface;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::info;

/// Service managing offer creation and the accept/reject decisions.
pub struct OfferService {
	storage: Arc<dyn StorageInterface>,
	notifier: Arc<NotificationService>,
	mailer: Arc<EmailService>,
	accept_locks: DashMap<ShipmentId, Arc<Mutex<()>>>,
}

impl OfferService {
	pub fn new(
		storage: Arc<dyn StorageInterface>,
		notifier: Arc<NotificationService>,
		mailer: Arc<EmailService>,
	) -> Self {
		Self {
			storage,
			notifier,
			mailer,
			accept_locks: DashMap::new(),
		}
	}

	fn accept_lock(&self, shipment_id: ShipmentId) -> Arc<Mutex<()>> {
		self.accept_locks
			.entry(shipment_id)
			.or_insert_with(|| Arc::new(Mutex::new(())))
			.clone()
	}

	fn forbidden() -> MarketError {
		MarketError::Forbidden("You do not have permission to perform this action".to_string())
	}

	/// Submits a new offer by the requesting agent.
	///
	/// Moves the shipment to `offers_received` if this is its first offer
	/// and tells the owning client about the bid.
	pub async fn create(&self, requester: &AuthUser, request: CreateOfferRequest) -> Result<Offer> {
		if requester.role != Role::Agent {
			return Err(Self::forbidden());
		}

		let (shipment_id, price) = match (request.shipment_id, request.price) {
			(Some(shipment_id), Some(price)) => (shipment_id, price),
			_ => return Err(MarketError::Validation("Missing required fields".to_string())),
		};
		if price.is_sign_negative() {
			return Err(MarketError::Validation(
				"Price must be a positive number".to_string(),
			));
		}

		let mut shipment = self
			.storage
			.shipment(&shipment_id)
			.await?
			.ok_or_else(|| MarketError::NotFound("Shipment not found".to_string()))?;

		if !shipment.status.is_open_for_offers() {
			return Err(MarketError::InvalidState(
				"This shipment is no longer accepting offers".to_string(),
			));
		}

		if self
			.storage
			.offer_by_shipment_and_agent(&shipment_id, &requester.user_id)
			.await?
			.is_some()
		{
			return Err(MarketError::DuplicateOffer);
		}

		let timestamp = now();
		let offer = Offer {
			id: uuid::Uuid::new_v4(),
			agent_id: requester.user_id,
			shipment_id,
			price,
			notes: request.notes,
			status: OfferStatus::Pending,
			created_at: timestamp,
			updated_at: timestamp,
		};
		self.storage.insert_offer(&offer).await?;

		if shipment.status == ShipmentStatus::Pending {
			shipment.status = ShipmentStatus::OffersReceived;
			shipment.updated_at = now();
			self.storage.update_shipment(&shipment).await?;
		}
		info!(offer_id = %offer.id, shipment_id = %shipment_id, agent_id = %requester.user_id, "offer submitted");

		let agent = self.storage.user(&requester.user_id).await?;
		let agent_name = agent
			.map(|a| a.name)
			.unwrap_or_else(|| requester.email.clone());
		self.notifier
			.notify_new_offer(
				shipment.client_id,
				&agent_name,
				price,
				shipment_id,
				offer.id,
			)
			.await?;
		if let Some(client) = self.storage.user(&shipment.client_id).await? {
			self.mailer
				.notify_new_offer(&client.email, &client.name, &agent_name, price, shipment_id)
				.await;
		}

		Ok(offer)
	}

	/// Accepts an offer on behalf of the shipment owner.
	///
	/// Under the shipment's lock, state is re-read so the loser of a race
	/// observes the winner's write: the accepted offer wins, every other
	/// offer on the shipment is rejected, and the shipment records the
	/// accepted offer id. Exactly one of two concurrent accepts succeeds.
	pub async fn accept(&self, offer_id: &OfferId, requester: &AuthUser) -> Result<Offer> {
		if requester.role != Role::Client {
			return Err(Self::forbidden());
		}

		let offer = self
			.storage
			.offer(offer_id)
			.await?
			.ok_or_else(|| MarketError::NotFound("Offer not found".to_string()))?;

		let lock = self.accept_lock(offer.shipment_id);
		let guard = lock.lock().await;

		// Re-read both rows inside the critical section.
		let offer = self
			.storage
			.offer(offer_id)
			.await?
			.ok_or_else(|| MarketError::NotFound("Offer not found".to_string()))?;
		let mut shipment = self
			.storage
			.shipment(&offer.shipment_id)
			.await?
			.ok_or_else(|| MarketError::NotFound("Shipment not found".to_string()))?;

		if shipment.client_id != requester.user_id {
			return Err(Self::forbidden());
		}
		if shipment.accepted_offer_id.is_some() || !shipment.status.is_open_for_offers() {
			return Err(MarketError::InvalidState(
				"An offer has already been accepted for this shipment".to_string(),
			));
		}
		if offer.status != OfferStatus::Pending {
			return Err(MarketError::InvalidState(
				"Only pending offers can be accepted".to_string(),
			));
		}

		let timestamp = now();
		let mut accepted = offer.clone();
		accepted.status = OfferStatus::Accepted;
		accepted.updated_at = timestamp;
		self.storage.update_offer(&accepted).await?;

		// No sibling offer may be left pending.
		for mut sibling in self.storage.offers_by_shipment(&offer.shipment_id).await? {
			if sibling.id != accepted.id && sibling.status == OfferStatus::Pending {
				sibling.status = OfferStatus::Rejected;
				sibling.updated_at = timestamp;
				self.storage.update_offer(&sibling).await?;
			}
		}

		shipment.status = ShipmentStatus::OfferAccepted;
		shipment.accepted_offer_id = Some(accepted.id);
		shipment.updated_at = timestamp;
		self.storage.update_shipment(&shipment).await?;
		drop(guard);
		info!(offer_id = %accepted.id, shipment_id = %shipment.id, "offer accepted");

		self.notifier
			.notify_offer_accepted(accepted.agent_id, accepted.price, shipment.id, accepted.id)
			.await?;
		if let Some(agent) = self.storage.user(&accepted.agent_id).await? {
			self.mailer
				.notify_offer_accepted(&agent.email, &agent.name, accepted.price, shipment.id)
				.await;
		}

		Ok(accepted)
	}

	/// Rejects a pending offer on behalf of the shipment owner.
	///
	/// Leaves the shipment untouched; a rejected offer never blocks later
	/// accepts of other offers.
	pub async fn reject(&self, offer_id: &OfferId, requester: &AuthUser) -> Result<Offer> {
		if requester.role != Role::Client {
			return Err(Self::forbidden());
		}

		let offer = self
			.storage
			.offer(offer_id)
			.await?
			.ok_or_else(|| MarketError::NotFound("Offer not found".to_string()))?;
		let shipment = self
			.storage
			.shipment(&offer.shipment_id)
			.await?
			.ok_or_else(|| MarketError::NotFound("Shipment not found".to_string()))?;

		if shipment.client_id != requester.user_id {
			return Err(Self::forbidden());
		}
		if offer.status != OfferStatus::Pending {
			return Err(MarketError::InvalidState(
				"Only pending offers can be rejected".to_string(),
			));
		}

		let mut rejected = offer;
		rejected.status = OfferStatus::Rejected;
		rejected.updated_at = now();
		self.storage.update_offer(&rejected).await?;
		info!(offer_id = %rejected.id, shipment_id = %shipment.id, "offer rejected");

		self.notifier
			.notify_offer_rejected(rejected.agent_id, rejected.price, shipment.id, rejected.id)
			.await?;

		Ok(rejected)
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use freight_email::LogMailer;
	use freight_shipment::ShipmentService;
	use freight_storage::MemoryStorage;
	use freight_types::{
		CreateShipmentRequest, Dimensions, NotificationType, ServiceType, UpdateStatusRequest, User,
	};
	use rust_decimal::Decimal;

	struct Harness {
		storage: Arc<MemoryStorage>,
		shipments: ShipmentService,
		offers: OfferService,
		notifier: Arc<NotificationService>,
	}

	fn harness() -> Harness {
		let storage: Arc<MemoryStorage> = Arc::new(MemoryStorage::new());
		let notifier = Arc::new(NotificationService::new(storage.clone()));
		let mailer = Arc::new(EmailService::new(Box::new(LogMailer::new())));
		Harness {
			storage: storage.clone(),
			shipments: ShipmentService::new(storage.clone()),
			offers: OfferService::new(storage, notifier.clone(), mailer),
			notifier,
		}
	}

	async fn seed_account(harness: &Harness, role: Role, name: &str) -> AuthUser {
		let timestamp = now();
		let user = User {
			id: uuid::Uuid::new_v4(),
			email: format!("{}@example.com", uuid::Uuid::new_v4().simple()),
			password_hash: "x".to_string(),
			name: name.to_string(),
			role,
			created_at: timestamp,
			updated_at: timestamp,
		};
		harness.storage.insert_user(&user).await.unwrap();
		AuthUser {
			user_id: user.id,
			email: user.email,
			role,
		}
	}

	fn shipment_request() -> CreateShipmentRequest {
		CreateShipmentRequest {
			service_type: Some(ServiceType::Shipping),
			description: Some("Container of textiles".to_string()),
			weight: Some(800.0),
			dimensions: Some(Dimensions {
				length: 6.0,
				width: 2.4,
				height: 2.6,
			}),
			pickup_address: Some("Antwerp".to_string()),
			pickup_date: Some(now()),
			delivery_address: Some("Gdansk".to_string()),
			delivery_date: Some(now() + chrono::Duration::days(5)),
			required_documents: None,
			notes: None,
		}
	}

	fn offer_request(shipment_id: ShipmentId, price: i64) -> CreateOfferRequest {
		CreateOfferRequest {
			shipment_id: Some(shipment_id),
			price: Some(Decimal::new(price, 0)),
			notes: None,
		}
	}

	#[tokio::test]
	async fn create_validates_role_price_and_state() {
		let h = harness();
		let client = seed_account(&h, Role::Client, "Shipper").await;
		let agent = seed_account(&h, Role::Agent, "Carrier").await;
		let shipment = h
			.shipments
			.create(&client, shipment_request())
			.await
			.unwrap();

		let err = h
			.offers
			.create(&client, offer_request(shipment.id, 100))
			.await
			.unwrap_err();
		assert!(matches!(err, MarketError::Forbidden(_)));

		let mut negative = offer_request(shipment.id, 100);
		negative.price = Some(Decimal::new(-100, 0));
		let err = h.offers.create(&agent, negative).await.unwrap_err();
		assert!(matches!(err, MarketError::Validation(_)));

		let err = h
			.offers
			.create(&agent, offer_request(uuid::Uuid::new_v4(), 100))
			.await
			.unwrap_err();
		assert!(matches!(err, MarketError::NotFound(_)));

		let offer = h
			.offers
			.create(&agent, offer_request(shipment.id, 100))
			.await
			.unwrap();
		assert_eq!(offer.status, OfferStatus::Pending);

		// First offer moves the shipment out of pending.
		let stored = h.storage.shipment(&shipment.id).await.unwrap().unwrap();
		assert_eq!(stored.status, ShipmentStatus::OffersReceived);
	}

	#[tokio::test]
	async fn create_rejects_duplicates_without_side_effects() {
		let h = harness();
		let client = seed_account(&h, Role::Client, "Shipper").await;
		let agent = seed_account(&h, Role::Agent, "Carrier").await;
		let shipment = h
			.shipments
			.create(&client, shipment_request())
			.await
			.unwrap();

		h.offers
			.create(&agent, offer_request(shipment.id, 100))
			.await
			.unwrap();
		let err = h
			.offers
			.create(&agent, offer_request(shipment.id, 120))
			.await
			.unwrap_err();
		assert!(matches!(err, MarketError::DuplicateOffer));

		assert_eq!(
			h.storage.offers_by_shipment(&shipment.id).await.unwrap().len(),
			1
		);
		// Only the first create notified the client.
		assert_eq!(h.notifier.list(&client.user_id).await.unwrap().len(), 1);
	}

	#[tokio::test]
	async fn create_notifies_the_owning_client_only() {
		let h = harness();
		let client = seed_account(&h, Role::Client, "Shipper").await;
		let agent = seed_account(&h, Role::Agent, "Carrier Co").await;
		let shipment = h
			.shipments
			.create(&client, shipment_request())
			.await
			.unwrap();

		let offer = h
			.offers
			.create(&agent, offer_request(shipment.id, 450))
			.await
			.unwrap();

		let notifications = h.notifier.list(&client.user_id).await.unwrap();
		assert_eq!(notifications.len(), 1);
		assert_eq!(notifications[0].kind, NotificationType::NewOffer);
		assert_eq!(notifications[0].offer_id, Some(offer.id));
		assert_eq!(
			notifications[0].message,
			format!(
				"You have received a new offer of $450 from Carrier Co for your shipment #{}.",
				shipment.id
			)
		);
		assert!(h.notifier.list(&agent.user_id).await.unwrap().is_empty());
	}

	#[tokio::test]
	async fn accept_settles_every_offer_and_marks_the_shipment() {
		let h = harness();
		let client = seed_account(&h, Role::Client, "Shipper").await;
		let first_agent = seed_account(&h, Role::Agent, "Carrier A").await;
		let second_agent = seed_account(&h, Role::Agent, "Carrier B").await;
		let shipment = h
			.shipments
			.create(&client, shipment_request())
			.await
			.unwrap();

		let winning = h
			.offers
			.create(&first_agent, offer_request(shipment.id, 300))
			.await
			.unwrap();
		let losing = h
			.offers
			.create(&second_agent, offer_request(shipment.id, 350))
			.await
			.unwrap();

		let err = h.offers.accept(&winning.id, &first_agent).await.unwrap_err();
		assert!(matches!(err, MarketError::Forbidden(_)));

		let accepted = h.offers.accept(&winning.id, &client).await.unwrap();
		assert_eq!(accepted.status, OfferStatus::Accepted);

		let stored = h.storage.shipment(&shipment.id).await.unwrap().unwrap();
		assert_eq!(stored.status, ShipmentStatus::OfferAccepted);
		assert_eq!(stored.accepted_offer_id, Some(winning.id));

		let offers = h.storage.offers_by_shipment(&shipment.id).await.unwrap();
		assert!(offers.iter().all(|o| o.status != OfferStatus::Pending));
		assert_eq!(
			offers.iter().filter(|o| o.status == OfferStatus::Accepted).count(),
			1
		);
		assert_eq!(
			h.storage
				.offer(&losing.id)
				.await
				.unwrap()
				.unwrap()
				.status,
			OfferStatus::Rejected
		);

		let agent_inbox = h.notifier.list(&first_agent.user_id).await.unwrap();
		assert_eq!(agent_inbox.len(), 1);
		assert_eq!(agent_inbox[0].kind, NotificationType::OfferAccepted);
		assert_eq!(
			agent_inbox[0].message,
			"Your offer of $300 has been accepted!"
		);

		// A second accept on the settled shipment fails.
		let err = h.offers.accept(&losing.id, &client).await.unwrap_err();
		assert!(matches!(err, MarketError::InvalidState(_)));
	}

	#[tokio::test]
	async fn concurrent_accepts_settle_exactly_one_offer() {
		let h = harness();
		let client = seed_account(&h, Role::Client, "Shipper").await;
		let first_agent = seed_account(&h, Role::Agent, "Carrier A").await;
		let second_agent = seed_account(&h, Role::Agent, "Carrier B").await;
		let shipment = h
			.shipments
			.create(&client, shipment_request())
			.await
			.unwrap();

		let first = h
			.offers
			.create(&first_agent, offer_request(shipment.id, 300))
			.await
			.unwrap();
		let second = h
			.offers
			.create(&second_agent, offer_request(shipment.id, 350))
			.await
			.unwrap();

		let (a, b) = tokio::join!(
			h.offers.accept(&first.id, &client),
			h.offers.accept(&second.id, &client),
		);
		let successes = [&a, &b].iter().filter(|r| r.is_ok()).count();
		assert_eq!(successes, 1);
		let loser = if a.is_err() { a.unwrap_err() } else { b.unwrap_err() };
		assert!(matches!(loser, MarketError::InvalidState(_)));

		let offers = h.storage.offers_by_shipment(&shipment.id).await.unwrap();
		assert_eq!(
			offers.iter().filter(|o| o.status == OfferStatus::Accepted).count(),
			1
		);
		let stored = h.storage.shipment(&shipment.id).await.unwrap().unwrap();
		let winner_id = stored.accepted_offer_id.unwrap();
		assert!(winner_id == first.id || winner_id == second.id);
	}

	#[tokio::test]
	async fn reject_settles_one_offer_and_leaves_the_shipment_open() {
		let h = harness();
		let client = seed_account(&h, Role::Client, "Shipper").await;
		let first_agent = seed_account(&h, Role::Agent, "Carrier A").await;
		let second_agent = seed_account(&h, Role::Agent, "Carrier B").await;
		let shipment = h
			.shipments
			.create(&client, shipment_request())
			.await
			.unwrap();

		let unwanted = h
			.offers
			.create(&first_agent, offer_request(shipment.id, 900))
			.await
			.unwrap();
		let kept = h
			.offers
			.create(&second_agent, offer_request(shipment.id, 350))
			.await
			.unwrap();

		let rejected = h.offers.reject(&unwanted.id, &client).await.unwrap();
		assert_eq!(rejected.status, OfferStatus::Rejected);

		let inbox = h.notifier.list(&first_agent.user_id).await.unwrap();
		assert_eq!(inbox[0].kind, NotificationType::OfferRejected);
		assert_eq!(inbox[0].message, "Your offer of $900 has been rejected.");

		// Rejecting one bid never settles the shipment.
		let stored = h.storage.shipment(&shipment.id).await.unwrap().unwrap();
		assert_eq!(stored.status, ShipmentStatus::OffersReceived);
		assert!(stored.accepted_offer_id.is_none());

		let err = h.offers.reject(&unwanted.id, &client).await.unwrap_err();
		assert!(matches!(err, MarketError::InvalidState(_)));

		h.offers.accept(&kept.id, &client).await.unwrap();
	}

	#[tokio::test]
	async fn offers_arrive_after_a_settled_shipment_are_refused() {
		let h = harness();
		let client = seed_account(&h, Role::Client, "Shipper").await;
		let first_agent = seed_account(&h, Role::Agent, "Carrier A").await;
		let late_agent = seed_account(&h, Role::Agent, "Carrier B").await;
		let shipment = h
			.shipments
			.create(&client, shipment_request())
			.await
			.unwrap();

		let offer = h
			.offers
			.create(&first_agent, offer_request(shipment.id, 300))
			.await
			.unwrap();
		h.offers.accept(&offer.id, &client).await.unwrap();

		let err = h
			.offers
			.create(&late_agent, offer_request(shipment.id, 200))
			.await
			.unwrap_err();
		assert!(matches!(err, MarketError::InvalidState(_)));
	}

	#[tokio::test]
	async fn full_marketplace_scenario() {
		let h = harness();
		let client = seed_account(&h, Role::Client, "Shipper GmbH").await;
		let first_agent = seed_account(&h, Role::Agent, "Carrier A").await;
		let second_agent = seed_account(&h, Role::Agent, "Carrier B").await;

		let shipment = h
			.shipments
			.create(&client, shipment_request())
			.await
			.unwrap();
		assert_eq!(shipment.status, ShipmentStatus::Pending);

		// Both agents see the open shipment and bid on it.
		let market = h.shipments.list(&first_agent).await.unwrap();
		assert_eq!(market.len(), 1);
		let first = h
			.offers
			.create(&first_agent, offer_request(shipment.id, 500))
			.await
			.unwrap();
		let second = h
			.offers
			.create(&second_agent, offer_request(shipment.id, 450))
			.await
			.unwrap();

		// The owner reviews offers newest-first and accepts the cheaper one.
		let detail = h.shipments.get(&shipment.id, &client).await.unwrap();
		assert_eq!(detail.offers.len(), 2);
		assert_eq!(detail.offers[0].offer.id, second.id);
		h.offers.accept(&second.id, &client).await.unwrap();

		// The losing agent was rejected, the winner drives the shipment on.
		assert_eq!(
			h.storage.offer(&first.id).await.unwrap().unwrap().status,
			OfferStatus::Rejected
		);
		let updated = h
			.shipments
			.update_status(
				&shipment.id,
				&second_agent,
				UpdateStatusRequest {
					status: Some("in_progress".to_string()),
				},
			)
			.await
			.unwrap();
		assert_eq!(updated.status, ShipmentStatus::InProgress);
		let done = h
			.shipments
			.update_status(
				&shipment.id,
				&second_agent,
				UpdateStatusRequest {
					status: Some("completed".to_string()),
				},
			)
			.await
			.unwrap();
		assert_eq!(done.status, ShipmentStatus::Completed);

		// The settled shipment left the agents' marketplace view.
		assert!(h.shipments.list(&first_agent).await.unwrap().is_empty());
	}
}
