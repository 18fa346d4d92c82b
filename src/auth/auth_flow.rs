//! Login screen state machine.
//!
//! `phone` leads to `password` for a known number or `register` for an unknown
//! one; either successful submit switches the view to `main`. Every failure is
//! parked in a single `error` field which the next attempt or step change clears.

use crate::{
    auth::{
        auth_dto::RegisterRequest,
        auth_models::{AuthState, AuthStep, AuthView},
        auth_service::AuthService,
    },
    error::{AppError, Result},
    user::user_models::User,
};

pub struct AuthFlow {
    service: AuthService,
    view: AuthView,
    step: AuthStep,
    phone: String,
    password: String,
    error: Option<String>,
    current_user: Option<User>,
}

impl AuthFlow {
    pub fn new(service: AuthService) -> Self {
        Self {
            service,
            view: AuthView::Auth,
            step: AuthStep::Phone,
            phone: String::new(),
            password: String::new(),
            error: None,
            current_user: None,
        }
    }

    pub fn state(&self) -> AuthState {
        AuthState {
            view: self.view,
            step: self.step,
            phone: self.phone.clone(),
            error: self.error.clone(),
            current_user: self.current_user.clone(),
        }
    }

    /// The logged-in user, or an authentication error for commands that need one.
    pub fn require_user(&self) -> Result<&User> {
        self.current_user
            .as_ref()
            .ok_or_else(|| AppError::Authentication("Log in first".to_string()))
    }

    pub async fn submit_phone(&mut self, phone: &str) -> Result<AuthStep> {
        self.error = None;
        self.expect_step(AuthStep::Phone)?;
        self.phone = phone.trim().to_string();

        let outcome = self.service.lookup_phone(&self.phone).await;
        match self.record(outcome)? {
            Some(_) => self.step = AuthStep::Password,
            None => self.step = AuthStep::Register,
        }
        tracing::debug!(step = %self.step, "phone submitted");
        Ok(self.step)
    }

    pub async fn submit_password(&mut self, password: &str) -> Result<User> {
        self.error = None;
        self.expect_step(AuthStep::Password)?;
        self.password = password.to_string();

        let outcome = self.service.login(&self.phone, &self.password).await;
        let user = self.record(outcome)?;
        self.enter_main(user.clone());
        Ok(user)
    }

    pub async fn submit_register(&mut self, request: RegisterRequest) -> Result<User> {
        self.error = None;
        self.expect_step(AuthStep::Register)?;
        self.phone = request.phone.trim().to_string();
        self.password = request.password.clone();

        let outcome = self.service.register(request).await;
        let user = self.record(outcome)?;
        self.enter_main(user.clone());
        Ok(user)
    }

    /// The "Register" button on the phone step.
    pub fn go_to_register(&mut self) -> Result<()> {
        self.error = None;
        self.expect_step(AuthStep::Phone)?;
        self.change_step(AuthStep::Register);
        Ok(())
    }

    /// The "Back" button on the password and register steps.
    pub fn back(&mut self) -> Result<()> {
        self.error = None;
        if self.view == AuthView::Main || self.step == AuthStep::Phone {
            return Err(AppError::BadRequest("Nothing to go back to".to_string()));
        }
        self.password.clear();
        self.change_step(AuthStep::Phone);
        Ok(())
    }

    pub async fn logout(&mut self) -> Result<()> {
        let user_id = self.current_user.as_ref().map(|u| u.id);
        self.service.logout(user_id).await?;

        self.view = AuthView::Auth;
        self.step = AuthStep::Phone;
        self.phone.clear();
        self.password.clear();
        self.error = None;
        self.current_user = None;
        Ok(())
    }

    fn expect_step(&self, step: AuthStep) -> Result<()> {
        if self.view != AuthView::Auth || self.step != step {
            return Err(AppError::BadRequest(format!(
                "Not on the {} step",
                step
            )));
        }
        Ok(())
    }

    fn change_step(&mut self, step: AuthStep) {
        self.step = step;
        self.error = None;
    }

    fn enter_main(&mut self, user: User) {
        self.view = AuthView::Main;
        self.password.clear();
        self.current_user = Some(user);
    }

    /// Mirrors a failed outcome into the visible error field.
    fn record<T>(&mut self, outcome: Result<T>) -> Result<T> {
        if let Err(ref e) = outcome {
            tracing::debug!(error = %e, step = %self.step, "auth attempt failed");
            self.error = Some(e.user_message().to_string());
        }
        outcome
    }
}
