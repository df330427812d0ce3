//! Error taxonomy for the marketplace system.
//!
//! Every lifecycle and dispatcher failure is reported synchronously to the
//! caller with a discriminable kind. Email delivery failures are the only
//! category that is swallowed after logging.

use thiserror::Error;

pub type Result<T> = std::result::Result<T, MarketError>;

/// Failure kinds surfaced by the lifecycle managers and collaborators.
#[derive(Debug, Error)]
pub enum MarketError {
	/// Missing or malformed input; the caller must resubmit.
	#[error("{0}")]
	Validation(String),

	/// No or invalid identity; the caller must re-authenticate.
	#[error("Authentication required")]
	Unauthorized,

	/// Authenticated but not entitled to this operation.
	#[error("{0}")]
	Forbidden(String),

	/// A referenced entity does not exist.
	#[error("{0}")]
	NotFound(String),

	/// The operation is not legal in the current lifecycle state.
	#[error("{0}")]
	InvalidState(String),

	/// The agent already has an offer on this shipment.
	#[error("You have already submitted an offer for this shipment")]
	DuplicateOffer,

	/// Internal storage failure; callers see a generic indicator only.
	#[error("Storage error: {0}")]
	Storage(String),
}

impl MarketError {
	/// True when the error message is safe to show to the caller verbatim.
	pub fn is_user_visible(&self) -> bool {
		!matches!(self, MarketError::Storage(_))
	}
}
