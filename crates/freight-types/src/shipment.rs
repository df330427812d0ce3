//! Shipments and their lifecycle status.

use crate::common::{OfferId, ShipmentId, Timestamp, UserId};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

/// Service category requested for a shipment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ServiceType {
	Transport,
	Customs,
	Storage,
	Shipping,
}

/// Lifecycle status of a shipment.
///
/// `Pending` and `OffersReceived` are both open for offers. The transition
/// to `OfferAccepted` is one-directional and driven only by the offer
/// lifecycle manager's accept operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ShipmentStatus {
	Pending,
	OffersReceived,
	OfferAccepted,
	InProgress,
	Completed,
}

impl ShipmentStatus {
	/// True while agents may still submit offers.
	pub fn is_open_for_offers(&self) -> bool {
		matches!(self, ShipmentStatus::Pending | ShipmentStatus::OffersReceived)
	}

	/// Parses the persisted snake_case value.
	pub fn parse(value: &str) -> Option<Self> {
		match value {
			"pending" => Some(ShipmentStatus::Pending),
			"offers_received" => Some(ShipmentStatus::OffersReceived),
			"offer_accepted" => Some(ShipmentStatus::OfferAccepted),
			"in_progress" => Some(ShipmentStatus::InProgress),
			"completed" => Some(ShipmentStatus::Completed),
			_ => None,
		}
	}
}

impl fmt::Display for ShipmentStatus {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		let s = match self {
			ShipmentStatus::Pending => "pending",
			ShipmentStatus::OffersReceived => "offers_received",
			ShipmentStatus::OfferAccepted => "offer_accepted",
			ShipmentStatus::InProgress => "in_progress",
			ShipmentStatus::Completed => "completed",
		};
		write!(f, "{}", s)
	}
}

/// Structured dimension triple for a shipment.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Dimensions {
	pub length: f64,
	pub width: f64,
	pub height: f64,
}

impl Dimensions {
	/// Encodes the dimensions to the serialized text shape used by
	/// persisted rows.
	pub fn to_stored(&self) -> String {
		serde_json::to_string(self).unwrap_or_else(|_| "{}".to_string())
	}

	/// Decodes a persisted value leniently.
	///
	/// Accepts the canonical JSON-text encoding as well as legacy rows
	/// where the field is already a decoded object. Malformed data falls
	/// back to the default value rather than failing the read.
	pub fn from_stored(value: &Value) -> Self {
		match value {
			Value::String(text) => serde_json::from_str(text).unwrap_or_default(),
			other => serde_json::from_value(other.clone()).unwrap_or_default(),
		}
	}
}

/// Encodes a required-document list to the serialized text shape used by
/// persisted rows.
pub fn documents_to_stored(documents: &[String]) -> Option<String> {
	if documents.is_empty() {
		None
	} else {
		Some(serde_json::to_string(documents).unwrap_or_else(|_| "[]".to_string()))
	}
}

/// Decodes a persisted required-document value leniently, tolerating
/// legacy rows holding a decoded array and falling back to an empty list.
pub fn documents_from_stored(value: Option<&Value>) -> Vec<String> {
	match value {
		None | Some(Value::Null) => Vec::new(),
		Some(Value::String(text)) => serde_json::from_str(text).unwrap_or_default(),
		Some(other) => serde_json::from_value(other.clone()).unwrap_or_default(),
	}
}

/// A client's request for a logistics service, tracked through a status
/// lifecycle.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Shipment {
	pub id: ShipmentId,
	pub client_id: UserId,
	pub service_type: ServiceType,
	pub description: String,
	pub weight: f64,
	pub dimensions: Dimensions,
	pub pickup_address: String,
	pub pickup_date: Timestamp,
	pub delivery_address: String,
	pub delivery_date: Timestamp,
	pub required_documents: Vec<String>,
	pub notes: Option<String>,
	pub status: ShipmentStatus,
	/// Immutable once set; references an accepted offer on this shipment.
	pub accepted_offer_id: Option<OfferId>,
	pub created_at: Timestamp,
	pub updated_at: Timestamp,
}

#[cfg(test)]
mod tests {
	use super::*;
	use serde_json::json;

	#[test]
	fn dimensions_round_trip_through_stored_text() {
		let dims = Dimensions {
			length: 1.5,
			width: 2.0,
			height: 0.75,
		};
		let stored = dims.to_stored();
		let decoded = Dimensions::from_stored(&Value::String(stored));
		assert_eq!(decoded, dims);
	}

	#[test]
	fn dimensions_decode_tolerates_legacy_object_rows() {
		let legacy = json!({"length": 3.0, "width": 1.0, "height": 2.0});
		let decoded = Dimensions::from_stored(&legacy);
		assert_eq!(decoded.length, 3.0);
		assert_eq!(decoded.height, 2.0);
	}

	#[test]
	fn dimensions_decode_falls_back_on_malformed_data() {
		let decoded = Dimensions::from_stored(&Value::String("not json".to_string()));
		assert_eq!(decoded, Dimensions::default());
	}

	#[test]
	fn documents_round_trip_and_tolerate_legacy_rows() {
		let docs = vec!["invoice".to_string(), "customs_form".to_string()];
		let stored = documents_to_stored(&docs).unwrap();
		assert_eq!(documents_from_stored(Some(&Value::String(stored))), docs);

		let legacy = json!(["packing_list"]);
		assert_eq!(
			documents_from_stored(Some(&legacy)),
			vec!["packing_list".to_string()]
		);

		assert!(documents_from_stored(None).is_empty());
		assert!(documents_from_stored(Some(&Value::String("oops".into()))).is_empty());
	}

	#[test]
	fn status_parse_matches_display() {
		for status in [
			ShipmentStatus::Pending,
			ShipmentStatus::OffersReceived,
			ShipmentStatus::OfferAccepted,
			ShipmentStatus::InProgress,
			ShipmentStatus::Completed,
		] {
			assert_eq!(ShipmentStatus::parse(&status.to_string()), Some(status));
		}
		assert_eq!(ShipmentStatus::parse("cancelled"), None);
	}
}
