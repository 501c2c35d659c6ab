use axum::{
    middleware,
    routing::{get, post},
    Router,
};
use domain::services::BookingNotifier;
use domain::store::TicketStore;
use shared::jwt::JwtConfig;
use std::sync::Arc;
use std::time::Duration;
use tower_http::{
    compression::CompressionLayer,
    cors::{AllowOrigin, Any, CorsLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};

use crate::config::Config;
use crate::middleware::{metrics_handler, metrics_middleware, security_headers_middleware, trace_id};
use crate::routes::{bookings, events, health, organizer, reviews};
use crate::services::EventListCache;

#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn TicketStore>,
    pub config: Arc<Config>,
    pub jwt: Arc<JwtConfig>,
    pub notifier: Arc<dyn BookingNotifier>,
    pub event_cache: Arc<EventListCache>,
}

impl AppState {
    /// Builds the shared state; the listing cache TTL comes from config.
    pub fn new(
        config: Config,
        store: Arc<dyn TicketStore>,
        jwt: JwtConfig,
        notifier: Arc<dyn BookingNotifier>,
    ) -> Self {
        let event_cache = Arc::new(EventListCache::new(Duration::from_secs(
            config.cache.event_list_ttl_secs,
        )));
        Self {
            store,
            config: Arc::new(config),
            jwt: Arc::new(jwt),
            notifier,
            event_cache,
        }
    }
}

pub fn create_app(state: AppState) -> Router {
    let config = state.config.clone();

    // Build CORS layer based on configuration
    let cors = if config.security.cors_origins.is_empty() {
        // Default: allow any origin (for development)
        CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any)
    } else {
        let origins: Vec<_> = config
            .security
            .cors_origins
            .iter()
            .filter_map(|o| o.parse().ok())
            .collect();
        CorsLayer::new()
            .allow_origin(AllowOrigin::list(origins))
            .allow_methods(Any)
            .allow_headers(Any)
    };

    // Catalog and attendee routes. Authentication is resolved per handler by
    // the extractors, so anonymous search shares the router.
    let event_routes = Router::new()
        .route(
            "/api/event",
            get(events::search_events).post(events::create_event),
        )
        .route(
            "/api/event/:event_id",
            get(events::get_event)
                .put(events::update_event)
                .delete(events::delete_event),
        )
        .route(
            "/api/event/:event_id/book",
            post(bookings::reserve).delete(bookings::cancel),
        )
        .route("/api/my-bookings", get(bookings::my_bookings))
        .route("/api/reviews", post(reviews::upsert_review));

    let organizer_routes = Router::new()
        .route("/api/organizer/events", get(events::list_organizer_events))
        .route(
            "/api/organizer/event/:event_id",
            get(events::get_organizer_event),
        )
        .route("/api/organizer/bookings", get(organizer::list_bookings))
        .route(
            "/api/organizer/booking/:booking_id/approve",
            post(organizer::approve),
        )
        .route(
            "/api/organizer/booking/:booking_id/reject",
            post(organizer::reject),
        )
        .route(
            "/api/organizer/booking/:booking_id/audit",
            get(organizer::audit_trail),
        );

    // Public routes (no authentication required)
    let public_routes = Router::new()
        .route("/api/health", get(health::health_check))
        .route("/api/health/ready", get(health::ready))
        .route("/api/health/live", get(health::live))
        .route("/metrics", get(metrics_handler));

    Router::new()
        .merge(public_routes)
        .merge(event_routes)
        .merge(organizer_routes)
        // Global middleware (order matters: bottom layers run first)
        .layer(middleware::from_fn_with_state(
            state.clone(),
            security_headers_middleware,
        ))
        .layer(CompressionLayer::new())
        .layer(TimeoutLayer::new(Duration::from_secs(
            config.server.request_timeout_secs,
        )))
        .layer(middleware::from_fn(metrics_middleware))
        .layer(TraceLayer::new_for_http())
        .layer(middleware::from_fn(trace_id))
        .layer(cors)
        .with_state(state)
}
