//! HTTP API for the marketplace service.
//!
//! Every route is a thin adapter: extract the bearer token, call the
//! corresponding lifecycle operation, and map its outcome to a status code
//! and JSON body. No business rule lives here.

use crate::state::AppState;
use axum::{
	extract::{Path, State},
	http::{header, HeaderMap, StatusCode},
	response::{
		sse::{Event, KeepAlive, Sse},
		IntoResponse, Response,
	},
	routing::{get, patch, post},
	Json, Router,
};
use freight_notify::live::{live_stream, LiveEvent};
use freight_types::{
	CreateOfferRequest, CreateShipmentRequest, ErrorResponse, LoginRequest, MarketError, OfferId,
	Role, ShipmentId, SignupRequest, UpdateStatusRequest,
};
use futures::{Stream, StreamExt};
use std::convert::Infallible;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::error;

/// Builds the full application router.
pub fn router(state: AppState) -> Router {
	Router::new()
		.route("/api/auth/signup", post(signup))
		.route("/api/auth/login", post(login))
		.route("/api/auth/logout", post(logout))
		.route("/api/auth/me", get(me))
		.route("/api/shipments", get(list_shipments).post(create_shipment))
		.route(
			"/api/shipments/{id}",
			get(get_shipment).delete(delete_shipment),
		)
		.route("/api/shipments/{id}/status", patch(update_shipment_status))
		.route("/api/offers", post(create_offer))
		.route("/api/offers/{id}/accept", post(accept_offer))
		.route("/api/offers/{id}/reject", post(reject_offer))
		.route("/api/notifications", get(list_notifications))
		.route("/api/notifications/sse", get(notification_stream))
		.route("/health", get(health))
		.with_state(state)
		.layer(TraceLayer::new_for_http())
		.layer(CorsLayer::permissive())
}

/// Error wrapper mapping lifecycle errors onto HTTP responses.
struct ApiError(MarketError);

impl From<MarketError> for ApiError {
	fn from(err: MarketError) -> Self {
		Self(err)
	}
}

impl IntoResponse for ApiError {
	fn into_response(self) -> Response {
		if !self.0.is_user_visible() {
			error!(error = %self.0, "request failed internally");
			return (
				StatusCode::INTERNAL_SERVER_ERROR,
				Json(ErrorResponse::new("Internal server error")),
			)
				.into_response();
		}

		let status = match &self.0 {
			MarketError::Validation(_)
			| MarketError::InvalidState(_)
			| MarketError::DuplicateOffer => StatusCode::BAD_REQUEST,
			MarketError::Unauthorized => StatusCode::UNAUTHORIZED,
			MarketError::Forbidden(_) => StatusCode::FORBIDDEN,
			MarketError::NotFound(_) => StatusCode::NOT_FOUND,
			MarketError::Storage(_) => StatusCode::INTERNAL_SERVER_ERROR,
		};
		(status, Json(ErrorResponse::new(self.0.to_string()))).into_response()
	}
}

type ApiResult<T> = std::result::Result<T, ApiError>;

fn bearer_token(headers: &HeaderMap) -> Option<&str> {
	headers
		.get(header::AUTHORIZATION)
		.and_then(|value| value.to_str().ok())
		.and_then(|value| value.strip_prefix("Bearer "))
}

// Auth

async fn signup(
	State(state): State<AppState>,
	Json(request): Json<SignupRequest>,
) -> ApiResult<impl IntoResponse> {
	let response = state.auth.signup(request).await?;
	Ok((StatusCode::CREATED, Json(response)))
}

async fn login(
	State(state): State<AppState>,
	Json(request): Json<LoginRequest>,
) -> ApiResult<impl IntoResponse> {
	let response = state.auth.login(request).await?;
	Ok(Json(response))
}

async fn logout(State(state): State<AppState>, headers: HeaderMap) -> ApiResult<impl IntoResponse> {
	if let Some(token) = bearer_token(&headers) {
		state.auth.logout(token);
	}
	Ok(Json(serde_json::json!({ "message": "Logged out successfully" })))
}

async fn me(State(state): State<AppState>, headers: HeaderMap) -> ApiResult<impl IntoResponse> {
	let auth = state
		.auth
		.require_auth(bearer_token(&headers), None)
		.await?;
	let profile = state.auth.me(&auth).await?;
	Ok(Json(profile))
}

// Shipments

async fn list_shipments(
	State(state): State<AppState>,
	headers: HeaderMap,
) -> ApiResult<impl IntoResponse> {
	let auth = state
		.auth
		.require_auth(bearer_token(&headers), None)
		.await?;
	let shipments = state.shipments.list(&auth).await?;
	Ok(Json(shipments))
}

async fn create_shipment(
	State(state): State<AppState>,
	headers: HeaderMap,
	Json(request): Json<CreateShipmentRequest>,
) -> ApiResult<impl IntoResponse> {
	let auth = state
		.auth
		.require_auth(bearer_token(&headers), Some(&[Role::Client]))
		.await?;
	let shipment = state.shipments.create(&auth, request).await?;
	Ok((StatusCode::CREATED, Json(shipment)))
}

async fn get_shipment(
	State(state): State<AppState>,
	headers: HeaderMap,
	Path(id): Path<ShipmentId>,
) -> ApiResult<impl IntoResponse> {
	let auth = state
		.auth
		.require_auth(bearer_token(&headers), None)
		.await?;
	let detail = state.shipments.get(&id, &auth).await?;
	Ok(Json(detail))
}

async fn delete_shipment(
	State(state): State<AppState>,
	headers: HeaderMap,
	Path(id): Path<ShipmentId>,
) -> ApiResult<impl IntoResponse> {
	let auth = state
		.auth
		.require_auth(bearer_token(&headers), None)
		.await?;
	state.shipments.delete(&id, &auth).await?;
	Ok(Json(serde_json::json!({ "message": "Shipment deleted successfully" })))
}

async fn update_shipment_status(
	State(state): State<AppState>,
	headers: HeaderMap,
	Path(id): Path<ShipmentId>,
	Json(request): Json<UpdateStatusRequest>,
) -> ApiResult<impl IntoResponse> {
	let auth = state
		.auth
		.require_auth(bearer_token(&headers), None)
		.await?;
	let shipment = state.shipments.update_status(&id, &auth, request).await?;
	Ok(Json(shipment))
}

// Offers

async fn create_offer(
	State(state): State<AppState>,
	headers: HeaderMap,
	Json(request): Json<CreateOfferRequest>,
) -> ApiResult<impl IntoResponse> {
	let auth = state
		.auth
		.require_auth(bearer_token(&headers), Some(&[Role::Agent]))
		.await?;
	let offer = state.offers.create(&auth, request).await?;
	Ok((StatusCode::CREATED, Json(offer)))
}

async fn accept_offer(
	State(state): State<AppState>,
	headers: HeaderMap,
	Path(id): Path<OfferId>,
) -> ApiResult<impl IntoResponse> {
	let auth = state
		.auth
		.require_auth(bearer_token(&headers), Some(&[Role::Client]))
		.await?;
	let offer = state.offers.accept(&id, &auth).await?;
	Ok(Json(offer))
}

async fn reject_offer(
	State(state): State<AppState>,
	headers: HeaderMap,
	Path(id): Path<OfferId>,
) -> ApiResult<impl IntoResponse> {
	let auth = state
		.auth
		.require_auth(bearer_token(&headers), Some(&[Role::Client]))
		.await?;
	let offer = state.offers.reject(&id, &auth).await?;
	Ok(Json(offer))
}

// Notifications

async fn list_notifications(
	State(state): State<AppState>,
	headers: HeaderMap,
) -> ApiResult<impl IntoResponse> {
	let auth = state
		.auth
		.require_auth(bearer_token(&headers), None)
		.await?;
	let notifications = state.notifier.list(&auth.user_id).await?;
	Ok(Json(notifications))
}

async fn notification_stream(
	State(state): State<AppState>,
	headers: HeaderMap,
) -> ApiResult<Sse<impl Stream<Item = std::result::Result<Event, Infallible>>>> {
	let auth = state
		.auth
		.require_auth(bearer_token(&headers), None)
		.await?;

	let stream = live_stream(state.storage.clone(), auth.user_id, state.live_poll_interval)
		.map(|event: LiveEvent| Ok(Event::default().json_data(&event).unwrap_or_default()));

	Ok(Sse::new(stream).keep_alive(KeepAlive::default()))
}

async fn health() -> impl IntoResponse {
	Json(serde_json::json!({ "status": "ok" }))
}
