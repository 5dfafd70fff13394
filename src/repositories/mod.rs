pub mod category_repository;
pub mod memory;
pub mod user_repository;

pub use category_repository::{CategoryRepository, NewCategory, PgCategoryRepository};
pub use memory::{InMemoryCategoryRepository, InMemoryUserRepository};
pub use user_repository::{PgUserRepository, UserRepository};
