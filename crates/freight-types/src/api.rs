//! Request and response shapes for the HTTP API.
//!
//! Request bodies use optional fields so that missing input surfaces as a
//! `Validation` error from the lifecycle operation rather than a decode
//! failure at the transport layer.

use crate::common::{ShipmentId, Timestamp};
use crate::offer::Offer;
use crate::shipment::{Dimensions, ServiceType, Shipment};
use crate::user::{Role, User};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Error payload returned for every failed request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
	pub error: String,
}

impl ErrorResponse {
	pub fn new(message: impl Into<String>) -> Self {
		Self {
			error: message.into(),
		}
	}
}

/// Public view of a user account, without credentials.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserProfile {
	pub id: crate::common::UserId,
	pub email: String,
	pub name: String,
	pub role: Role,
}

impl From<&User> for UserProfile {
	fn from(user: &User) -> Self {
		Self {
			id: user.id,
			email: user.email.clone(),
			name: user.name.clone(),
			role: user.role,
		}
	}
}

#[derive(Debug, Clone, Deserialize)]
pub struct SignupRequest {
	pub email: Option<String>,
	pub password: Option<String>,
	pub name: Option<String>,
	pub role: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoginRequest {
	pub email: Option<String>,
	pub password: Option<String>,
}

/// Successful signup/login response carrying the session token.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthResponse {
	pub user: UserProfile,
	pub token: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateShipmentRequest {
	pub service_type: Option<ServiceType>,
	pub description: Option<String>,
	pub weight: Option<f64>,
	pub dimensions: Option<Dimensions>,
	pub pickup_address: Option<String>,
	pub pickup_date: Option<Timestamp>,
	pub delivery_address: Option<String>,
	pub delivery_date: Option<Timestamp>,
	pub required_documents: Option<Vec<String>>,
	pub notes: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateOfferRequest {
	pub shipment_id: Option<ShipmentId>,
	pub price: Option<Decimal>,
	pub notes: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct UpdateStatusRequest {
	pub status: Option<String>,
}

/// A shipment as listed to a requester; `client_name` is populated for
/// agents browsing open shipments.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShipmentView {
	#[serde(flatten)]
	pub shipment: Shipment,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub client_name: Option<String>,
}

/// An offer as shown to the shipment owner, joined with agent identity.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OfferView {
	#[serde(flatten)]
	pub offer: Offer,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub agent_name: Option<String>,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub agent_email: Option<String>,
}

/// A shipment together with its offers, newest-first.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ShipmentDetail {
	pub shipment: Shipment,
	pub offers: Vec<OfferView>,
}
