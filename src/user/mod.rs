pub mod user_models;
pub mod user_repository;
pub mod user_service;

pub use user_models::{DuplicatePolicy, User};
pub use user_repository::UserRepository;
pub use user_service::UserService;
