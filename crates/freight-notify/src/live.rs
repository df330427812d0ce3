//! Poll-based live notification channel.
//!
//! Each connection is an independent stream that acknowledges the
//! subscriber, then polls the store on a fixed cadence for unread
//! notifications created after the last delivered batch. The stream never
//! mutates rows and closes on the first storage failure.

use freight_types::{now, Notification, UserId};
use freight_storage::StorageInterface;
use futures::Stream;
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::MissedTickBehavior;
use tracing::warn;

/// Default cadence between store polls.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(2);

/// One frame on the live channel.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum LiveEvent {
	/// Sent once, immediately after the subscriber connects.
	Connected,
	/// A non-empty batch of notifications newer than the last checkpoint.
	Notifications { data: Vec<Notification> },
}

/// Opens a live channel for one user.
///
/// Yields [`LiveEvent::Connected`] first, then batches of unread
/// notifications created strictly after the previous delivery. The
/// checkpoint only advances when a batch is delivered, so nothing is
/// skipped between polls. Dropping the stream stops polling.
pub fn live_stream(
	storage: Arc<dyn StorageInterface>,
	user_id: UserId,
	poll_interval: Duration,
) -> impl Stream<Item = LiveEvent> {
	async_stream::stream! {
		yield LiveEvent::Connected;

		let mut checkpoint = now();
		let mut ticker = tokio::time::interval(poll_interval);
		ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
		// The first tick of a tokio interval fires immediately.
		ticker.tick().await;

		loop {
			ticker.tick().await;
			match storage.unread_notifications_after(&user_id, checkpoint).await {
				Ok(batch) => {
					if !batch.is_empty() {
						checkpoint = now();
						yield LiveEvent::Notifications { data: batch };
					}
				}
				Err(e) => {
					warn!(user_id = %user_id, error = %e, "live channel poll failed, closing");
					break;
				}
			}
		}
	}
}
