//! Route definitions for the URL shortener API
//!
//! This module configures all HTTP routes and maps them to their respective handlers.

use axum::middleware;
use axum::routing::get;
use axum::Router;

use crate::handler::{
    create_short_url, delete_short_url, get_stats, get_url_details, health, list_urls,
    redirect_url, update_url,
};
use crate::middleware::{auth_middleware, rate_limit_middleware};
use crate::state::AppState;

/// Creates and configures the Axum application router with all routes
///
/// # Route Definitions
///
/// - `GET /{code}` - Redirects to the original URL (public endpoint)
/// - `GET /api/health` - Liveness check
/// - `GET /api/urls` - Lists the caller's URLs with pagination
/// - `POST /api/urls` - Creates a short URL (or returns the caller's existing one)
/// - `GET /api/urls/{id}` - Link details with click analytics
/// - `PUT /api/urls/{id}` - Changes the destination URL
/// - `DELETE /api/urls/{id}` - Deletes a short URL
/// - `GET /api/stats` - Totals over the caller's URLs
///
/// Everything under `/api` passes the rate limiter and, when configured,
/// the API key check. Routes that act on a user's links read the caller from
/// the `X-User-Id` header.
///
/// # Example Usage
///
/// ```no_run
/// # use linkvault::config::Config;
/// # use linkvault::database::Store;
/// # use linkvault::route::create_app;
/// # use linkvault::state::AppState;
/// # let store = Store::open("data.db").unwrap();
/// let state = AppState::new(store, Config::default());
/// let app = create_app(state);
/// // axum::serve(listener, app).await.unwrap();
/// ```
pub fn create_app(state: AppState) -> Router {
    let api_routes = Router::new()
        .route("/health", get(health))
        .route("/urls", get(list_urls).post(create_short_url))
        .route(
            "/urls/{id}",
            get(get_url_details).put(update_url).delete(delete_short_url),
        )
        .route("/stats", get(get_stats))
        .layer(middleware::from_fn_with_state(state.clone(), auth_middleware))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            rate_limit_middleware,
        ));

    Router::new()
        .route("/{code}", get(redirect_url))
        .nest("/api", api_routes)
        .with_state(state)
}
