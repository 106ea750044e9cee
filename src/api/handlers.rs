//! API handlers
//!
//! Every handler answers with an `ApiResponse`. Engine rejections carry the
//! error's stable code in `error_code`; failed sender authentication answers
//! 401 with the `Unauthorized` code and never reaches the engine.

use serde::{Deserialize, Serialize};
use tracing::{debug, error};
use warp::http::StatusCode;
use warp::hyper::body::Bytes;
use warp::{Filter, Rejection, Reply};

use crate::auth::{AuthError, SignedEnvelope};
use crate::error::HtlcError;
use crate::service::{HtlcService, DEFAULT_EVENT_PAGE};
use crate::types::{Address, BridgeId, OrderId};

// ============================================================================
// RESPONSE STRUCTURES
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    pub data: Option<T>,
    pub error: Option<String>,
    /// Stable engine error code, when the engine rejected the request
    #[serde(default)]
    pub error_code: Option<u32>,
}

impl<T: Serialize> ApiResponse<T> {
    /// Successful response carrying `data`.
    pub fn ok(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
            error_code: None,
        }
    }

    fn reply(self, status: StatusCode) -> warp::reply::WithStatus<warp::reply::Json> {
        warp::reply::with_status(warp::reply::json(&self), status)
    }
}

impl ApiResponse<()> {
    pub fn failure(message: impl Into<String>) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(message.into()),
            error_code: None,
        }
    }

    /// Failure carrying the engine error's message and stable code.
    pub fn from_engine_error(err: &HtlcError) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(err.to_string()),
            error_code: Some(err.code()),
        }
    }

    /// Failure for an envelope whose sender could not be authenticated.
    pub fn from_auth_error(err: &AuthError) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(err.to_string()),
            error_code: Some(HtlcError::Unauthorized.code()),
        }
    }
}

/// HTTP status for an engine rejection.
fn status_for(err: &HtlcError) -> StatusCode {
    match err {
        HtlcError::Unauthorized => StatusCode::FORBIDDEN,
        HtlcError::OrderNotFound(_) | HtlcError::BridgeNotFound(_) => StatusCode::NOT_FOUND,
        _ => StatusCode::UNPROCESSABLE_ENTITY,
    }
}

// ============================================================================
// HANDLERS
// ============================================================================

/// POST /instructions
///
/// Verifies the envelope's signature against the key registered for its
/// sender, then applies the instruction.
///
/// # Arguments
///
/// * `body` - JSON `SignedEnvelope`
/// * `service` - Shared HTLC service
///
/// # Returns
///
/// * `200` - The emitted event
/// * `400` - Body is not a valid signed envelope
/// * `401` - Unknown signer or bad signature (`error_code` 80)
/// * `403/404/422` - Engine rejection with its stable code
pub async fn apply_instruction_handler(
    body: Bytes,
    service: HtlcService,
) -> Result<impl Reply, Rejection> {
    let signed: SignedEnvelope = serde_json::from_slice(&body).map_err(|e| {
        error!("Instruction deserialization failed: {}", e);
        warp::reject::custom(JsonDeserializeError(format!("Invalid JSON: {}", e)))
    })?;
    debug!(
        "POST /instructions - {} from {}",
        signed.envelope.instruction.name(),
        signed.envelope.sender
    );

    if let Err(e) = service.verify(&signed) {
        return Ok(ApiResponse::<()>::from_auth_error(&e).reply(StatusCode::UNAUTHORIZED));
    }

    match service.apply(signed.envelope).await {
        Ok(event) => Ok(ApiResponse::ok(event).reply(StatusCode::OK)),
        Err(e) => Ok(ApiResponse::<()>::from_engine_error(&e).reply(status_for(&e))),
    }
}

/// GET /orders/:id
///
/// Returns the order record, or 404 with `OrderNotFound`.
pub async fn get_order_handler(
    order_id: OrderId,
    service: HtlcService,
) -> Result<impl Reply, Rejection> {
    match service.order(order_id).await {
        Some(order) => Ok(ApiResponse::ok(order).reply(StatusCode::OK)),
        None => Ok(ApiResponse::<()>::from_engine_error(&HtlcError::OrderNotFound(order_id))
            .reply(StatusCode::NOT_FOUND)),
    }
}

/// GET /orders/:id/secret
///
/// Returns the preimage revealed by the order's first fill. 404 until then.
pub async fn get_secret_handler(
    order_id: OrderId,
    service: HtlcService,
) -> Result<impl Reply, Rejection> {
    match service.revealed_secret(order_id).await {
        Some(secret) => Ok(ApiResponse::ok(secret).reply(StatusCode::OK)),
        None => Ok(ApiResponse::<()>::failure(format!(
            "No secret revealed for order {}",
            order_id
        ))
        .reply(StatusCode::NOT_FOUND)),
    }
}

/// GET /bridges
pub async fn list_bridges_handler(service: HtlcService) -> Result<impl Reply, Rejection> {
    Ok(ApiResponse::ok(service.bridges().await).reply(StatusCode::OK))
}

/// GET /bridges/:id
pub async fn get_bridge_handler(
    bridge_id: BridgeId,
    service: HtlcService,
) -> Result<impl Reply, Rejection> {
    match service.bridge(bridge_id).await {
        Some(bridge) => Ok(ApiResponse::ok(bridge).reply(StatusCode::OK)),
        None => Ok(ApiResponse::<()>::from_engine_error(&HtlcError::BridgeNotFound(bridge_id))
            .reply(StatusCode::NOT_FOUND)),
    }
}

/// Response of GET /whitelist/:address.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WhitelistStatus {
    pub resolver: Address,
    pub whitelisted: bool,
}

/// GET /whitelist/:address
pub async fn get_whitelist_handler(
    address: String,
    service: HtlcService,
) -> Result<impl Reply, Rejection> {
    let resolver = Address::new(address);
    let whitelisted = service.is_whitelisted(&resolver).await;
    Ok(ApiResponse::ok(WhitelistStatus {
        resolver,
        whitelisted,
    })
    .reply(StatusCode::OK))
}

/// Query string of GET /events.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct EventsQuery {
    /// First event index wanted (default 0)
    pub since: Option<u64>,
    /// Page size (default 100, at most 500)
    pub limit: Option<usize>,
}

/// GET /events?since=<index>&limit=<n>
///
/// # Arguments
///
/// * `query` - Paging cursor; resume with the returned `next_index`
/// * `service` - Shared HTLC service
///
/// # Returns
///
/// An `EventPage` of retained events in application order
pub async fn get_events_handler(
    query: EventsQuery,
    service: HtlcService,
) -> Result<impl Reply, Rejection> {
    let page = service
        .events_page(
            query.since.unwrap_or(0),
            query.limit.unwrap_or(DEFAULT_EVENT_PAGE),
        )
        .await;
    Ok(ApiResponse::ok(page).reply(StatusCode::OK))
}

// ============================================================================
// FILTER HELPERS
// ============================================================================

/// Injects a clone of the shared service into handlers.
pub fn with_service(
    service: HtlcService,
) -> impl Filter<Extract = (HtlcService,), Error = std::convert::Infallible> + Clone {
    warp::any().map(move || service.clone())
}

// ============================================================================
// REJECTIONS
// ============================================================================

#[derive(Debug)]
pub struct JsonDeserializeError(pub String);

impl warp::reject::Reject for JsonDeserializeError {}

/// Converts warp rejections into `ApiResponse` errors.
pub async fn handle_rejection(rej: Rejection) -> Result<impl Reply, std::convert::Infallible> {
    let (status, message) = if let Some(err) = rej.find::<JsonDeserializeError>() {
        (StatusCode::BAD_REQUEST, err.0.clone())
    } else if let Some(err) = rej.find::<warp::reject::InvalidQuery>() {
        (StatusCode::BAD_REQUEST, err.to_string())
    } else if rej.is_not_found() {
        (StatusCode::NOT_FOUND, "Endpoint not found".to_string())
    } else if rej.find::<warp::reject::MethodNotAllowed>().is_some() {
        (StatusCode::METHOD_NOT_ALLOWED, "Method not allowed".to_string())
    } else {
        error!("Unhandled rejection: {:?}", rej);
        (StatusCode::INTERNAL_SERVER_ERROR, "Internal server error".to_string())
    };

    Ok(ApiResponse::<()>::failure(message).reply(status))
}
