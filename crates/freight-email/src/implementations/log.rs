//! Log-only mail provider.

use crate::{EmailError, EmailInterface};
use async_trait::async_trait;
use tracing::info;

/// Provider used when no mail API is configured; messages are logged
/// instead of sent.
#[derive(Default)]
pub struct LogMailer;

impl LogMailer {
	pub fn new() -> Self {
		Self
	}
}

#[async_trait]
impl EmailInterface for LogMailer {
	async fn send(&self, to: &str, subject: &str, _body: &str) -> Result<(), EmailError> {
		info!(recipient = to, subject, "email notification (mail provider not configured)");
		Ok(())
	}
}
