use serde::{Deserialize, Serialize};

use crate::user::user_models::User;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuthStep {
    Phone,
    Password,
    Register,
}

impl std::fmt::Display for AuthStep {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AuthStep::Phone => write!(f, "phone"),
            AuthStep::Password => write!(f, "password"),
            AuthStep::Register => write!(f, "register"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuthView {
    Auth,
    Main,
}

/// What the front end needs to render the login screen or the main screen.
#[derive(Debug, Clone, Serialize)]
pub struct AuthState {
    pub view: AuthView,
    pub step: AuthStep,
    pub phone: String,
    pub error: Option<String>,
    pub current_user: Option<User>,
}
