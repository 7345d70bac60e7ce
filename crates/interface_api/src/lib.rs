//! HTTP API Layer
//!
//! REST API for the collision claims core using Axum.
//!
//! # Architecture
//!
//! - **Handlers**: Request handlers for claims, estimates, scheduling and messaging
//! - **Middleware**: Authentication, tracing, audit logging
//! - **DTOs**: Request/Response data transfer objects
//! - **Error Handling**: Consistent error responses
//!
//! Every route under `/api/v1` requires a bearer token; the token's subject
//! is the signed-in user for the request.
//!
//! # Example
//!
//! ```rust,ignore
//! use interface_api::{create_router, AppState};
//!
//! let state = AppState::new(config, storage, notifier);
//! axum::serve(listener, create_router(state)).await?;
//! ```

pub mod config;
pub mod error;
pub mod middleware;
pub mod handlers;
pub mod dto;
pub mod auth;

use std::sync::Arc;

use axum::{
    Router,
    routing::{get, post, put},
    middleware as axum_middleware,
};
use tokio::sync::Mutex;
use tower_http::trace::TraceLayer;
use tower_http::cors::{CorsLayer, Any};

use core_kernel::{KeyValueStore, NotificationPort, SeededRandom};
use domain_claims::ClaimStore;
use domain_estimate::{DamageAnalyzer, EstimateGenerator};
use domain_messaging::MessagingService;
use domain_scheduling::AppointmentBook;

use crate::config::ApiConfig;
use crate::middleware::{auth_middleware, audit_middleware};
use crate::handlers::{claims, estimates, health, messaging, scheduling};

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub config: ApiConfig,
    pub storage: Arc<dyn KeyValueStore>,
    pub claims: Arc<ClaimStore>,
    pub appointments: Arc<AppointmentBook>,
    pub messaging: Arc<MessagingService>,
    pub analyzer: Arc<DamageAnalyzer>,
    pub estimates: Arc<EstimateGenerator>,
    /// Drives the mock analyzer, pricing, fraud and photo-quality services
    pub rng: Arc<Mutex<SeededRandom>>,
}

impl AppState {
    /// Wires every service onto one storage backend and notifier
    pub fn new(
        config: ApiConfig,
        storage: Arc<dyn KeyValueStore>,
        notifier: Arc<dyn NotificationPort>,
    ) -> Self {
        let claims = ClaimStore::new(storage.clone(), config.store_config())
            .with_notifier(notifier.clone());
        let appointments = AppointmentBook::new(storage.clone()).with_notifier(notifier.clone());
        let messaging = MessagingService::new(storage.clone()).with_notifier(notifier);

        Self {
            analyzer: Arc::new(DamageAnalyzer::new(config.analysis_latency())),
            estimates: Arc::new(EstimateGenerator::with_mock_pricing()),
            rng: Arc::new(Mutex::new(SeededRandom::from_optional_seed(config.rng_seed))),
            claims: Arc::new(claims),
            appointments: Arc::new(appointments),
            messaging: Arc::new(messaging),
            storage,
            config,
        }
    }
}

/// Creates the main API router
///
/// # Returns
///
/// Configured Axum router with all routes and middleware
pub fn create_router(state: AppState) -> Router {
    // Public routes (no auth required)
    let public_routes = Router::new()
        .route("/health", get(health::health_check))
        .route("/health/ready", get(health::readiness_check))
        .route("/auth/token", post(health::issue_token));

    let claims_routes = Router::new()
        .route("/", post(claims::create_claim).get(claims::list_claims))
        .route("/active", get(claims::get_active_claim))
        .route("/pending", get(claims::list_pending))
        .route("/:id", get(claims::get_claim).delete(claims::delete_claim))
        .route("/:id/activate", post(claims::activate_claim))
        .route("/:id/vehicle", put(claims::update_vehicle))
        .route("/:id/photos", post(claims::add_photos))
        .route("/:id/analyze", post(claims::analyze_damage))
        .route("/:id/submit", post(claims::submit_claim))
        .route("/:id/review", post(claims::review_claim))
        .route("/:id/fraud", get(claims::fraud_analysis))
        .route("/:id/timeline", get(claims::timeline))
        .route("/:id/insurance", put(claims::update_insurance))
        .route("/:id/insurance/flags", post(claims::flag_insurance))
        .route("/:id/insurance/lock", post(claims::lock_insurance))
        .route("/:id/estimate", post(estimates::generate_estimate).get(estimates::formatted_estimate))
        .route("/:id/estimate/options", get(estimates::estimate_options))
        .route("/:id/auto-approval", get(estimates::auto_approval))
        .route("/:id/appointments", get(scheduling::appointments_for_claim));

    let schedule_routes = Router::new()
        .route("/", put(scheduling::set_schedule))
        .route("/:shop_id", get(scheduling::get_schedule))
        .route("/:shop_id/slots", get(scheduling::available_slots))
        .route("/:shop_id/dates", get(scheduling::available_dates));

    let appointment_routes = Router::new()
        .route("/", post(scheduling::book_appointment))
        .route("/:id", get(scheduling::get_appointment))
        .route("/:id/confirm", post(scheduling::confirm_appointment))
        .route("/:id/reschedule", post(scheduling::reschedule_appointment))
        .route("/:id/cancel", post(scheduling::cancel_appointment))
        .route("/:id/complete", post(scheduling::complete_appointment));

    let conversation_routes = Router::new()
        .route("/", post(messaging::create_conversation).get(messaging::list_conversations))
        .route("/unread", get(messaging::unread_count))
        .route("/:id/messages", get(messaging::list_messages).post(messaging::send_message))
        .route("/:id/delivered", post(messaging::mark_delivered))
        .route("/:id/read", post(messaging::mark_read));

    // Protected API routes
    let api_routes = Router::new()
        .nest("/claims", claims_routes)
        .route("/photos/quality", post(estimates::photo_quality))
        .nest("/schedules", schedule_routes)
        .nest("/appointments", appointment_routes)
        .nest("/conversations", conversation_routes)
        .layer(axum_middleware::from_fn_with_state(state.clone(), audit_middleware))
        .layer(axum_middleware::from_fn_with_state(state.clone(), auth_middleware));

    Router::new()
        .merge(public_routes)
        .nest("/api/v1", api_routes)
        .layer(TraceLayer::new_for_http())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .with_state(state)
}
