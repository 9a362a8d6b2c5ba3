pub mod config;
pub mod database;
pub mod dto;
pub mod error;
pub mod middleware;
pub mod models;
pub mod repository;
pub mod routes;
pub mod services;
pub mod utils;

use axum::{
    extract::DefaultBodyLimit,
    routing::{get, patch, post, put},
    Router,
};
use std::sync::Arc;
use tower_http::{services::ServeDir, trace::TraceLayer};

use crate::config::Config;
use crate::middleware::{auth::require_auth, cors::permissive_cors};
use crate::repository::{CarRepository, UserRepository};
use crate::services::{
    auth_service::AuthService, car_service::CarService, media_service::MediaStore,
};

/// Five 5MB images plus the text fields of a listing form.
const MAX_BODY_BYTES: usize = 30 * 1024 * 1024;

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub auth_service: AuthService,
    pub car_service: CarService,
}

impl AppState {
    pub fn new(
        config: Arc<Config>,
        users: Arc<dyn UserRepository>,
        cars: Arc<dyn CarRepository>,
        media: Arc<dyn MediaStore>,
    ) -> Self {
        let auth_service = AuthService::new(
            users.clone(),
            cars.clone(),
            media.clone(),
            config.jwt_secret.clone(),
            config.jwt_expires_in_days,
        );
        let car_service = CarService::new(cars, users, media);

        Self {
            config,
            auth_service,
            car_service,
        }
    }
}

pub fn build_router(state: AppState) -> Router {
    let public_api = Router::new()
        .route("/", get(routes::health::root))
        .route("/health", get(routes::health::health))
        .route("/api/auth/register", post(routes::auth::register))
        .route("/api/auth/login", post(routes::auth::login))
        .route("/api/cars", get(routes::cars::list_cars))
        .route("/api/cars/:id", get(routes::cars::get_car));

    let protected_api = Router::new()
        .route("/api/auth/me", get(routes::auth::me))
        .route("/api/auth/update", put(routes::auth::update_profile))
        .route("/api/auth/update-password", put(routes::auth::update_password))
        .route("/api/auth/update-image", put(routes::auth::update_image))
        .route("/api/auth/delete", axum::routing::delete(routes::auth::delete_account))
        .route("/api/auth/logout", post(routes::auth::logout))
        .route("/api/cars", post(routes::cars::create_car))
        .route(
            "/api/cars/:id",
            put(routes::cars::update_car).delete(routes::cars::delete_car),
        )
        .route("/api/cars/user/mycars", get(routes::cars::my_cars))
        .route(
            "/api/cars/:id/availability",
            patch(routes::cars::set_availability),
        )
        .route("/api/images/upload", post(routes::images::upload_images))
        .route_layer(axum::middleware::from_fn_with_state(
            state.clone(),
            require_auth,
        ));

    let uploads_dir = state.config.uploads_dir.clone();

    public_api
        .merge(protected_api)
        .nest_service("/uploads", ServeDir::new(uploads_dir))
        .fallback(routes::health::not_found)
        .with_state(state)
        .layer(permissive_cors())
        .layer(TraceLayer::new_for_http())
        .layer(DefaultBodyLimit::max(MAX_BODY_BYTES))
}
