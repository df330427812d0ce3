//! Offers: an agent's priced bid against a specific shipment.

use crate::common::{OfferId, ShipmentId, Timestamp, UserId};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Lifecycle status of an offer. `Accepted` and `Rejected` are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OfferStatus {
	Pending,
	Accepted,
	Rejected,
}

/// A priced bid by one agent against one shipment.
///
/// For a given (shipment, agent) pair at most one offer may exist, and for
/// a given shipment at most one offer may hold status `accepted`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Offer {
	pub id: OfferId,
	pub agent_id: UserId,
	pub shipment_id: ShipmentId,
	pub price: Decimal,
	pub notes: Option<String>,
	pub status: OfferStatus,
	pub created_at: Timestamp,
	pub updated_at: Timestamp,
}
