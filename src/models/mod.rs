pub mod car;
pub mod user;
