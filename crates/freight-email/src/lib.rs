//! Outbound-email collaborator for the marketplace system.
//!
//! Delivery is best-effort: send failures are logged and swallowed, never
//! surfaced to the caller of the lifecycle operation that triggered them.

use async_trait::async_trait;
use freight_types::ShipmentId;
use rust_decimal::Decimal;
use thiserror::Error;
use tracing::warn;

/// Re-export implementations
pub mod implementations {
	pub mod log;
	pub mod resend;
}

pub use implementations::log::LogMailer;
pub use implementations::resend::ResendMailer;

/// Errors that can occur while handing a message to a mail provider.
#[derive(Debug, Error)]
pub enum EmailError {
	#[error("Provider error: {0}")]
	Provider(String),
}

/// Trait defining the low-level interface for mail providers.
#[async_trait]
pub trait EmailInterface: Send + Sync {
	/// Hands one message to the provider.
	async fn send(&self, to: &str, subject: &str, body: &str) -> Result<(), EmailError>;
}

/// High-level email service composing the marketplace message templates.
pub struct EmailService {
	provider: Box<dyn EmailInterface>,
}

impl EmailService {
	/// Creates a new EmailService with the specified provider.
	pub fn new(provider: Box<dyn EmailInterface>) -> Self {
		Self { provider }
	}

	/// Tells a client that an agent has bid on their shipment.
	pub async fn notify_new_offer(
		&self,
		client_email: &str,
		client_name: &str,
		agent_name: &str,
		price: Decimal,
		shipment_id: ShipmentId,
	) {
		let subject = format!("New Offer Received for Shipment #{}", shipment_id);
		let body = format!(
			"Hello {},\n\n\
			 You have received a new offer of ${} from {} for your shipment #{}.\n\
			 Please log in to your dashboard to view and accept the offer.\n\n\
			 Best regards,\nThe Freight Match Team",
			client_name, price, agent_name, shipment_id
		);
		self.deliver(client_email, &subject, &body).await;
	}

	/// Tells an agent that their offer was accepted.
	pub async fn notify_offer_accepted(
		&self,
		agent_email: &str,
		agent_name: &str,
		price: Decimal,
		shipment_id: ShipmentId,
	) {
		let subject = format!("Your Offer Has Been Accepted for Shipment #{}", shipment_id);
		let body = format!(
			"Hello {},\n\n\
			 Great news! Your offer of ${} has been accepted for shipment #{}.\n\
			 Please log in to your dashboard to view the shipment details and proceed.\n\n\
			 Best regards,\nThe Freight Match Team",
			agent_name, price, shipment_id
		);
		self.deliver(agent_email, &subject, &body).await;
	}

	async fn deliver(&self, to: &str, subject: &str, body: &str) {
		if let Err(e) = self.provider.send(to, subject, body).await {
			warn!(recipient = to, subject, error = %e, "email delivery failed");
		}
	}
}
