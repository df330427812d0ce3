//! User accounts and roles.

use crate::common::{Timestamp, UserId};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Account role. Exactly one role per account, immutable after creation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
	/// Posts shipments and decides on offers.
	Client,
	/// Submits priced offers against shipments.
	Agent,
}

impl fmt::Display for Role {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			Role::Client => write!(f, "client"),
			Role::Agent => write!(f, "agent"),
		}
	}
}

/// A registered account.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
	pub id: UserId,
	pub email: String,
	/// Hex digest of the password; never serialized into API responses.
	pub password_hash: String,
	pub name: String,
	pub role: Role,
	pub created_at: Timestamp,
	pub updated_at: Timestamp,
}

/// The identity attached to an authenticated request.
///
/// Produced by the identity collaborator; authorization decisions are
/// always re-checked server-side against this value, never against any
/// client-held state.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthUser {
	pub user_id: UserId,
	pub email: String,
	pub role: Role,
}
