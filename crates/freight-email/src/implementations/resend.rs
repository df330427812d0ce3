//! Resend mail provider.

use crate::{EmailError, EmailInterface};
use async_trait::async_trait;
use serde_json::json;
use tracing::debug;

const RESEND_API_URL: &str = "https://api.resend.com/emails";

/// Mail provider backed by the Resend HTTP API.
pub struct ResendMailer {
	client: reqwest::Client,
	api_key: String,
	from: String,
}

impl ResendMailer {
	pub fn new(api_key: String, from: String) -> Self {
		Self {
			client: reqwest::Client::new(),
			api_key,
			from,
		}
	}
}

#[async_trait]
impl EmailInterface for ResendMailer {
	async fn send(&self, to: &str, subject: &str, body: &str) -> Result<(), EmailError> {
		let payload = json!({
			"from": self.from,
			"to": [to],
			"subject": subject,
			"text": body,
		});

		let response = self
			.client
			.post(RESEND_API_URL)
			.bearer_auth(&self.api_key)
			.json(&payload)
			.send()
			.await
			.map_err(|e| EmailError::Provider(e.to_string()))?;

		if !response.status().is_success() {
			let status = response.status();
			let detail = response.text().await.unwrap_or_default();
			return Err(EmailError::Provider(format!(
				"Resend returned {}: {}",
				status, detail
			)));
		}

		debug!(recipient = to, subject, "email handed to Resend");
		Ok(())
	}
}
