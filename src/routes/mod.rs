use axum::{
    middleware,
    routing::{delete, get, patch, post, put},
    Router,
};

use crate::handlers::{admin, agent, auth, booking, customer, payment, review, vehicle};
use crate::middleware::auth::{auth_middleware, require_admin, require_agent, require_customer};
use crate::middleware::role_rate_limit::{create_role_governor, RateLimitedRole};
use crate::AppState;

pub fn create_router(state: AppState) -> Router {
    // Per-user governors. Admin routes rely on the global IP limiter only.
    let agent_governor = create_role_governor(RateLimitedRole::Agent);
    let customer_governor = create_role_governor(RateLimitedRole::Customer);

    // Public auth routes
    let auth_routes = Router::new()
        .route("/register", post(auth::register))
        .route("/login", post(auth::login))
        .route("/verify-email", get(auth::verify_email))
        .route("/request-password-reset", post(auth::request_password_reset))
        .route("/confirm-password-reset", post(auth::confirm_password_reset));

    // Password change for any authenticated role
    let account_routes = Router::new()
        .route("/change-password", post(auth::change_password))
        .layer(middleware::from_fn_with_state(state.clone(), auth_middleware));

    // Public catalog routes
    let public_routes = Router::new()
        .route("/vehicles", get(vehicle::search_vehicles))
        .route("/vehicles/featured", get(vehicle::featured_vehicles))
        .route("/vehicles/{id}", get(vehicle::get_vehicle))
        .route("/vehicles/{id}/reviews", get(review::vehicle_reviews));

    // Admin routes (requires auth + admin role)
    let admin_routes = Router::new()
        // Agent provisioning and user management
        .route("/agents", post(admin::create_agent))
        .route("/users", get(admin::list_users))
        .route("/users/{id}", put(admin::update_user))
        .route("/users/{id}", delete(admin::delete_user))
        .route("/users/{id}/block", patch(admin::set_user_blocked))
        // Vehicle management
        .route("/vehicles", get(admin::list_vehicles))
        .route("/vehicles/{id}", put(admin::update_vehicle))
        .route("/vehicles/{id}", delete(admin::delete_vehicle))
        // Booking management
        .route("/bookings", get(admin::list_bookings))
        .route("/bookings/{id}/status", patch(admin::update_booking_status))
        // Reporting
        .route("/stats", get(admin::system_stats))
        .layer(middleware::from_fn(require_admin))
        .layer(middleware::from_fn_with_state(state.clone(), auth_middleware));

    // Agent routes (requires auth + agent role)
    let agent_routes = Router::new()
        .route("/vehicles", post(agent::create_vehicle))
        .route("/vehicles", get(agent::my_vehicles))
        .route("/vehicles/{id}", put(agent::update_my_vehicle))
        .route("/vehicles/{id}", delete(agent::delete_my_vehicle))
        .route("/bookings", get(booking::bookings_for_my_vehicles))
        .route("/bookings/{id}/status", patch(booking::update_booking_status))
        .route("/customers", get(agent::my_customers))
        .route("/income", get(agent::my_income))
        .route("/profile", get(agent::get_profile))
        .route("/profile", patch(agent::update_profile))
        .layer(agent_governor)
        .layer(middleware::from_fn(require_agent))
        .layer(middleware::from_fn_with_state(state.clone(), auth_middleware));

    // Customer routes (requires auth + customer role)
    let customer_routes = Router::new()
        .route("/profile", get(customer::get_profile))
        .route("/profile", patch(customer::update_profile))
        .route("/bookings", post(customer::create_booking))
        .route("/rentals", get(customer::rental_history))
        .layer(customer_governor.clone())
        .layer(middleware::from_fn(require_customer))
        .layer(middleware::from_fn_with_state(state.clone(), auth_middleware));

    // Payment routes (customer only)
    let payment_routes = Router::new()
        .route("/", post(payment::create_payment))
        .route("/", get(payment::my_payments))
        .route("/invoice/{id}", get(payment::get_invoice))
        .layer(customer_governor.clone())
        .layer(middleware::from_fn(require_customer))
        .layer(middleware::from_fn_with_state(state.clone(), auth_middleware));

    // Review routes (customer only)
    let review_routes = Router::new()
        .route("/", post(review::create_review))
        .route("/my", get(review::my_reviews))
        .route("/{id}", patch(review::update_review))
        .route("/{id}", delete(review::delete_review))
        .layer(customer_governor)
        .layer(middleware::from_fn(require_customer))
        .layer(middleware::from_fn_with_state(state.clone(), auth_middleware));

    // Combine all routes
    Router::new()
        .nest("/api/auth", auth_routes.merge(account_routes))
        .nest("/api", public_routes)
        .nest("/api/admin", admin_routes)
        .nest("/api/agent", agent_routes)
        .nest("/api/customer", customer_routes)
        .nest("/api/payments", payment_routes)
        .nest("/api/reviews", review_routes)
        .with_state(state)
}
