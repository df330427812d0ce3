//! Service wiring: builds the storage backend and the lifecycle services
//! from the loaded configuration.

use anyhow::{Context, Result};
use freight_auth::SessionService;
use freight_config::{EmailProvider, MarketConfig, StorageBackend};
use freight_email::{EmailService, LogMailer, ResendMailer};
use freight_notify::NotificationService;
use freight_offer::OfferService;
use freight_shipment::ShipmentService;
use freight_storage::{FileStorage, MemoryStorage, StorageInterface};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

/// Shared application state handed to every request handler.
#[derive(Clone)]
pub struct AppState {
	pub storage: Arc<dyn StorageInterface>,
	pub auth: Arc<SessionService>,
	pub shipments: Arc<ShipmentService>,
	pub offers: Arc<OfferService>,
	pub notifier: Arc<NotificationService>,
	pub live_poll_interval: Duration,
}

impl AppState {
	/// Wires up storage, mail, and the lifecycle services per the
	/// configuration.
	pub async fn from_config(config: &MarketConfig) -> Result<Self> {
		let storage: Arc<dyn StorageInterface> = match config.storage.backend {
			StorageBackend::Memory => {
				info!("using in-memory storage backend");
				Arc::new(MemoryStorage::new())
			}
			StorageBackend::File => {
				let path = config
					.storage
					.path
					.as_ref()
					.context("file storage backend requires storage.path")?;
				info!(%path, "using file storage backend");
				Arc::new(FileStorage::open(PathBuf::from(path)).await?)
			}
		};

		let mailer = match config.email.provider {
			EmailProvider::Log => EmailService::new(Box::new(LogMailer::new())),
			EmailProvider::Resend => {
				let api_key = config
					.email
					.api_key
					.clone()
					.context("resend email provider requires email.api_key")?;
				EmailService::new(Box::new(ResendMailer::new(
					api_key,
					config.email.from.clone(),
				)))
			}
		};
		let mailer = Arc::new(mailer);

		let notifier = Arc::new(NotificationService::new(storage.clone()));
		let auth = Arc::new(SessionService::new(storage.clone()));
		let shipments = Arc::new(ShipmentService::new(storage.clone()));
		let offers = Arc::new(OfferService::new(
			storage.clone(),
			notifier.clone(),
			mailer,
		));

		Ok(Self {
			storage,
			auth,
			shipments,
			offers,
			notifier,
			live_poll_interval: Duration::from_secs(config.live.poll_interval_secs),
		})
	}
}
