//! HTTP request handlers for the URL shortener API
//!
//! Handlers stay thin: they extract the caller, delegate to the allocator,
//! recorder, analytics and ownership service, and shape the JSON.

use axum::{
    extract::{Path, Query, State},
    http::{header, HeaderMap, StatusCode},
    response::IntoResponse,
    Json,
};
use chrono::Utc;
use serde_json::json;

use crate::allocator::{MAX_CODE_LENGTH, MIN_CODE_LENGTH};
use crate::analytics::{daily_histogram, recent_clicks, recent_clicks_newest_first, summarize};
use crate::error::AppError;
use crate::middleware::{ClientIp, Owner};
use crate::model::{
    AnalyticsBlock, LinkDetailResponse, LinkResponse, ListParams, Pagination, UrlRequest,
};
use crate::recorder::record_click_best_effort;
use crate::service;
use crate::state::AppState;

/// Clicks included with each link in list responses
const LIST_RECENT_CLICKS: usize = 10;

/// Times a create request re-runs allocation after losing a unique-index race
const DUPLICATE_CODE_RETRIES: usize = 3;

/// Creates a new short URL for the caller
///
/// # Request Body
///
/// ```json
/// {
///   "url": "https://example.com/very/long/url"
/// }
/// ```
///
/// # Response
///
/// - **201 Created** - A new short link was minted
/// - **200 OK** - The caller had already shortened this URL; the existing link is returned
/// - **400 Bad Request** - URL is not a valid http(s) URL
/// - **409 Conflict** - Concurrent writers kept claiming the minted code
/// - **429 Too Many Requests** - Create quota for this client is spent
/// - **503 Service Unavailable** - No free code found within the retry budget
pub async fn create_short_url(
    State(state): State<AppState>,
    Owner(owner): Owner,
    client_ip: ClientIp,
    Json(payload): Json<UrlRequest>,
) -> Result<impl IntoResponse, AppError> {
    state.shorten_limit.check(client_ip.limit_key())?;

    let mut retries = 0;
    let allocation = loop {
        match state.allocator.allocate_tracked(&payload.url, &owner) {
            Err(AppError::DuplicateCode(code)) if retries < DUPLICATE_CODE_RETRIES => {
                retries += 1;
                tracing::warn!(code = %code, retries, "short code taken concurrently, retrying");
            }
            other => break other?,
        }
    };

    let status = if allocation.is_created() {
        StatusCode::CREATED
    } else {
        StatusCode::OK
    };
    let link = allocation.into_link();

    Ok((status, Json(LinkResponse::from_link(&link, &state.config.base_url))))
}

/// Redirects a short code to its original destination
///
/// When a visitor opens `http://localhost:8080/Xy3_k9A`, this handler:
/// 1. Looks up "Xy3_k9A" in the code index
/// 2. Records the click (user agent and client IP)
/// 3. Sends a 302 Found response pointing at the original URL
///
/// Click recording is best-effort: if it fails the failure is logged and
/// the visitor is still redirected.
///
/// # Response
///
/// - **302 Found** - Redirects to the original URL
/// - **404 Not Found** - Code is malformed or does not exist
pub async fn redirect_url(
    Path(code): Path<String>,
    State(state): State<AppState>,
    ClientIp(ip): ClientIp,
    headers: HeaderMap,
) -> Result<impl IntoResponse, AppError> {
    if !(MIN_CODE_LENGTH..=MAX_CODE_LENGTH).contains(&code.len()) {
        return Ok((StatusCode::NOT_FOUND, "URL not found").into_response());
    }

    let Some(link) = state.store.find_by_code(&code)? else {
        return Ok((StatusCode::NOT_FOUND, "URL not found").into_response());
    };

    let user_agent = headers
        .get(header::USER_AGENT)
        .and_then(|value| value.to_str().ok())
        .unwrap_or_default();

    let destination = link.original_url.clone();
    record_click_best_effort(&state.store, &link, user_agent, &ip);

    Ok((StatusCode::FOUND, [(header::LOCATION, destination)]).into_response())
}

/// Lists the caller's links, newest first
///
/// # Query Parameters
///
/// - `page` (optional) - Page number, starts from 1 (default: 1)
/// - `limit` (optional) - Items per page, max 100 (default: 10)
///
/// Each entry carries its last 10 clicks in the order they happened.
pub async fn list_urls(
    State(state): State<AppState>,
    Owner(owner): Owner,
    Query(params): Query<ListParams>,
) -> Result<impl IntoResponse, AppError> {
    let page = params.page.unwrap_or(1).max(1);
    let limit = params.limit.unwrap_or(10).clamp(1, 100);
    let offset = (page - 1) * limit;

    let links = state.store.list_by_owner(&owner)?;
    let total_urls = links.len();
    let total_pages = total_urls.div_ceil(limit);

    let urls: Vec<LinkResponse> = links
        .iter()
        .skip(offset)
        .take(limit)
        .map(|link| {
            let mut response = LinkResponse::from_link(link, &state.config.base_url);
            response.recent_clicks = Some(recent_clicks(link, LIST_RECENT_CLICKS).to_vec());
            response
        })
        .collect();

    let pagination = Pagination {
        current_page: page,
        total_pages,
        total_urls,
        has_next_page: page < total_pages,
        has_prev_page: page > 1,
    };

    Ok(Json(json!({
        "urls": urls,
        "pagination": pagination,
    })))
}

/// Returns one link with its full retained click log and daily breakdown
///
/// - **403 Forbidden** - The link belongs to another user
/// - **404 Not Found** - No link with this id
pub async fn get_url_details(
    State(state): State<AppState>,
    Owner(owner): Owner,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let link = service::get_owned(&state.store, &id, &owner)?;

    Ok(Json(LinkDetailResponse {
        link: LinkResponse::from_link(&link, &state.config.base_url),
        recent_clicks_desc: recent_clicks_newest_first(&link, LIST_RECENT_CLICKS),
        analytics: AnalyticsBlock {
            clicks_by_day: daily_histogram(&link),
            total_clicks: link.click_count,
        },
        clicks: link.clicks,
    }))
}

/// Changes the destination of an existing link
///
/// The short code and click history are kept.
pub async fn update_url(
    State(state): State<AppState>,
    Owner(owner): Owner,
    Path(id): Path<String>,
    Json(payload): Json<UrlRequest>,
) -> Result<impl IntoResponse, AppError> {
    let link = service::update_url(&state.store, &id, &owner, &payload.url)?;
    Ok(Json(LinkResponse::from_link(&link, &state.config.base_url)))
}

/// Deletes a short link with ownership verification
///
/// # Response
///
/// - **200 OK** - URL successfully deleted
/// - **404 Not Found** - URL does not exist
/// - **403 Forbidden** - Caller is not the owner
pub async fn delete_short_url(
    State(state): State<AppState>,
    Owner(owner): Owner,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let removed = service::delete_owned(&state.store, &id, &owner)?;

    Ok(Json(json!({
        "message": "Short link deleted successfully",
        "deleted_id": removed.id,
        "short_code": removed.short_code,
    })))
}

/// Totals over all of the caller's links
pub async fn get_stats(
    State(state): State<AppState>,
    Owner(owner): Owner,
) -> Result<impl IntoResponse, AppError> {
    let links = state.store.list_by_owner(&owner)?;
    Ok(Json(summarize(&links)))
}

pub async fn health() -> impl IntoResponse {
    Json(json!({
        "status": "ok",
        "timestamp": Utc::now(),
    }))
}
