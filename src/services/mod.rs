pub mod auth_service;
pub mod car_service;
pub mod media_service;
