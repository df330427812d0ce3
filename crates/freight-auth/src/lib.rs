//! Identity collaborator for the marketplace system.
//!
//! Supplies `(user id, role)` for the current caller given request
//! credentials. The reference implementation keeps opaque session tokens
//! in memory; authorization decisions are always re-checked server-side
//! per operation, never trusted from client-held state.

use async_trait::async_trait;
use dashmap::DashMap;
use freight_types::{
	now, AuthResponse, AuthUser, LoginRequest, MarketError, Result, Role, SignupRequest, User,
	UserProfile,
};
use freight_storage::StorageInterface;
use sha3::{Digest, Sha3_256};
use std::sync::Arc;
use tracing::info;

/// Trait resolving request credentials to an authenticated identity.
#[async_trait]
pub trait IdentityInterface: Send + Sync {
	/// Returns the identity behind a bearer token, or `None` when the
	/// token is absent from the session table.
	async fn authenticate(&self, token: &str) -> Option<AuthUser>;
}

/// Session-token identity service backed by the user table.
///
/// Passwords are stored as SHA3-256 hex digests. This is a reference
/// implementation of the identity boundary, not a production KDF.
pub struct SessionService {
	storage: Arc<dyn StorageInterface>,
	sessions: DashMap<String, AuthUser>,
}

impl SessionService {
	pub fn new(storage: Arc<dyn StorageInterface>) -> Self {
		Self {
			storage,
			sessions: DashMap::new(),
		}
	}

	fn hash_password(password: &str) -> String {
		hex::encode(Sha3_256::digest(password.as_bytes()))
	}

	fn issue_token(&self, user: &User) -> String {
		let token = uuid::Uuid::new_v4().simple().to_string();
		self.sessions.insert(
			token.clone(),
			AuthUser {
				user_id: user.id,
				email: user.email.clone(),
				role: user.role,
			},
		);
		token
	}

	/// Registers a new account and opens a session for it.
	pub async fn signup(&self, request: SignupRequest) -> Result<AuthResponse> {
		let (email, password, name, role) = match (
			request.email,
			request.password,
			request.name,
			request.role,
		) {
			(Some(email), Some(password), Some(name), Some(role)) => {
				(email, password, name, role)
			}
			_ => return Err(MarketError::Validation("Missing required fields".to_string())),
		};

		let role = match role.as_str() {
			"client" => Role::Client,
			"agent" => Role::Agent,
			_ => {
				return Err(MarketError::Validation(
					"Invalid role. Must be \"client\" or \"agent\"".to_string(),
				))
			}
		};

		if self.storage.user_by_email(&email).await?.is_some() {
			return Err(MarketError::Validation(
				"User with this email already exists".to_string(),
			));
		}

		let timestamp = now();
		let user = User {
			id: uuid::Uuid::new_v4(),
			email,
			password_hash: Self::hash_password(&password),
			name,
			role,
			created_at: timestamp,
			updated_at: timestamp,
		};
		self.storage.insert_user(&user).await?;
		info!(user_id = %user.id, role = %user.role, "registered new account");

		let token = self.issue_token(&user);
		Ok(AuthResponse {
			user: UserProfile::from(&user),
			token,
		})
	}

	/// Opens a session for an existing account.
	pub async fn login(&self, request: LoginRequest) -> Result<AuthResponse> {
		let (email, password) = match (request.email, request.password) {
			(Some(email), Some(password)) => (email, password),
			_ => return Err(MarketError::Validation("Missing required fields".to_string())),
		};

		let user = self
			.storage
			.user_by_email(&email)
			.await?
			.ok_or(MarketError::Unauthorized)?;

		if user.password_hash != Self::hash_password(&password) {
			return Err(MarketError::Unauthorized);
		}

		let token = self.issue_token(&user);
		Ok(AuthResponse {
			user: UserProfile::from(&user),
			token,
		})
	}

	/// Drops the session behind the given token, if any.
	pub fn logout(&self, token: &str) {
		self.sessions.remove(token);
	}

	/// Returns the stored profile for an authenticated caller.
	pub async fn me(&self, auth: &AuthUser) -> Result<UserProfile> {
		let user = self
			.storage
			.user(&auth.user_id)
			.await?
			.ok_or_else(|| MarketError::NotFound("User not found".to_string()))?;
		Ok(UserProfile::from(&user))
	}

	/// Resolves a bearer token and optionally gates on role.
	///
	/// A missing or unknown token yields `Unauthorized`; an authenticated
	/// caller whose role is not in `allowed_roles` yields `Forbidden`.
	pub async fn require_auth(
		&self,
		token: Option<&str>,
		allowed_roles: Option<&[Role]>,
	) -> Result<AuthUser> {
		let token = token.ok_or(MarketError::Unauthorized)?;
		let auth = self
			.authenticate(token)
			.await
			.ok_or(MarketError::Unauthorized)?;

		if let Some(roles) = allowed_roles {
			if !roles.contains(&auth.role) {
				return Err(MarketError::Forbidden(
					"You do not have permission to perform this action".to_string(),
				));
			}
		}

		Ok(auth)
	}
}

#[async_trait]
impl IdentityInterface for SessionService {
	async fn authenticate(&self, token: &str) -> Option<AuthUser> {
		self.sessions.get(token).map(|entry| entry.value().clone())
	}
}
