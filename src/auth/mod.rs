pub mod validation;

pub mod auth_dto;
pub mod auth_flow;
pub mod auth_models;
pub mod auth_service;

pub use auth_flow::AuthFlow;
pub use auth_service::AuthService;
