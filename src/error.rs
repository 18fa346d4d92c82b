use thiserror::Error;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Authentication error: {0}")]
    Authentication(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Configuration error: {0}")]
    Config(String),
}

impl AppError {
    /// Message shown to the user, without the category prefix.
    pub fn user_message(&self) -> &str {
        match self {
            AppError::Authentication(msg)
            | AppError::Validation(msg)
            | AppError::NotFound(msg)
            | AppError::Conflict(msg)
            | AppError::BadRequest(msg)
            | AppError::Config(msg) => msg.as_str(),
        }
    }
}

impl From<validator::ValidationErrors> for AppError {
    fn from(err: validator::ValidationErrors) -> Self {
        // Fields are visited by name so the reported message is stable.
        let mut fields: Vec<_> = err.field_errors().into_iter().collect();
        fields.sort_by(|(a, _), (b, _)| a.cmp(b));

        let message = fields
            .iter()
            .flat_map(|(_, errors)| errors.iter())
            .find_map(|e| e.message.as_ref().map(|m| m.to_string()))
            .unwrap_or_else(|| err.to_string());
        AppError::Validation(message)
    }
}

pub type Result<T> = std::result::Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;
    use validator::Validate;

    #[derive(Validate)]
    struct Sample {
        #[validate(length(min = 6, message = "Password must be at least 6 characters"))]
        password: String,
    }

    #[test]
    fn test_validation_errors_use_field_message() {
        let err: AppError = Sample { password: "abc".into() }.validate().unwrap_err().into();
        match err {
            AppError::Validation(msg) => assert_eq!(msg, "Password must be at least 6 characters"),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[derive(Validate)]
    struct Form {
        #[validate(length(min = 3, message = "Username is too short"))]
        username: String,
        #[validate(length(min = 6, message = "Password must be at least 6 characters"))]
        password: String,
    }

    #[test]
    fn test_several_invalid_fields_report_the_same_message() {
        for _ in 0..20 {
            let form = Form {
                username: "a".into(),
                password: "abc".into(),
            };
            let err: AppError = form.validate().unwrap_err().into();
            assert_eq!(err.user_message(), "Password must be at least 6 characters");
        }
    }

    #[test]
    fn test_user_message_strips_prefix() {
        let err = AppError::NotFound("Chat not found".to_string());
        assert_eq!(err.to_string(), "Not found: Chat not found");
        assert_eq!(err.user_message(), "Chat not found");
    }
}
