pub mod auth_handler;
pub mod category_handler;
pub mod extract;
pub mod health_handler;
pub mod profile_handler;
pub mod user_handler;
