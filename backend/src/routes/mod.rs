//! Route definitions for the SmartDrinkStore ledger API

use axum::{
    middleware,
    routing::{delete, get, post},
    Router,
};

use crate::{handlers, middleware::auth_middleware, AppState};

/// Create API routes
pub fn api_routes() -> Router<AppState> {
    Router::new()
        // Health check (public)
        .route("/health", get(handlers::health_check))
        // Protected routes - packaging type catalog
        .nest("/deposit-types", deposit_type_routes())
        // Protected routes - deposit ledger
        .nest("/deposits", deposit_routes())
        // Protected routes - credit ledger
        .nest("/credits", credit_routes())
}

/// Packaging type catalog routes (protected)
fn deposit_type_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/",
            get(handlers::list_deposit_types).post(handlers::create_deposit_type),
        )
        .route(
            "/:type_id",
            get(handlers::get_deposit_type)
                .put(handlers::update_deposit_type)
                .delete(handlers::delete_deposit_type),
        )
        .route_layer(middleware::from_fn(auth_middleware))
}

/// Deposit ledger routes (protected)
fn deposit_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(handlers::list_deposits))
        .route("/outgoing", post(handlers::issue_outgoing_deposit))
        .route("/incoming", post(handlers::issue_incoming_deposit))
        .route("/pending", get(handlers::list_pending_deposits))
        .route("/stats/summary", get(handlers::get_deposit_stats))
        .route(
            "/:deposit_id",
            get(handlers::get_deposit).delete(handlers::delete_deposit),
        )
        .route("/:deposit_id/return", post(handlers::process_deposit_return))
        .route("/:deposit_id/returns", get(handlers::list_deposit_returns))
        .route("/:deposit_id/write-off", post(handlers::write_off_deposit))
        .route_layer(middleware::from_fn(auth_middleware))
}

/// Credit ledger routes (protected)
fn credit_routes() -> Router<AppState> {
    Router::new()
        .route("/payments", post(handlers::record_credit_payment))
        .route("/payments/:payment_id", delete(handlers::void_credit_payment))
        .route("/sales", get(handlers::list_credit_sales))
        .route("/sales/:sale_id/payments", get(handlers::list_sale_payments))
        .route(
            "/customers/:customer_id/summary",
            get(handlers::get_customer_credit_summary),
        )
        .route_layer(middleware::from_fn(auth_middleware))
}
