pub mod auth_service;
pub mod category_service;
pub mod mail_service;
pub mod password;
pub mod profile_service;
pub mod token_service;
pub mod user_service;
