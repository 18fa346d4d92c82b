use std::borrow::Cow;
use validator::ValidationError;

pub const PHONE_PREFIX: &str = "+7";
pub const PHONE_DIGITS: usize = 10;
pub const USERNAME_MIN: usize = 3;
pub const USERNAME_MAX: usize = 20;

/// `+7` followed by exactly ten ASCII digits.
pub fn validate_phone(phone: &str) -> bool {
    phone
        .strip_prefix(PHONE_PREFIX)
        .map(|rest| rest.len() == PHONE_DIGITS && rest.bytes().all(|b| b.is_ascii_digit()))
        .unwrap_or(false)
}

/// 3 to 20 characters from `[a-zA-Z0-9_]`.
pub fn validate_username(username: &str) -> bool {
    (USERNAME_MIN..=USERNAME_MAX).contains(&username.len())
        && username
            .bytes()
            .all(|b| b.is_ascii_alphanumeric() || b == b'_')
}

fn error(code: &'static str, message: &'static str) -> ValidationError {
    let mut err = ValidationError::new(code);
    err.message = Some(Cow::Borrowed(message));
    err
}

pub fn phone_format(phone: &str) -> Result<(), ValidationError> {
    if validate_phone(phone) {
        Ok(())
    } else {
        Err(error("phone", "Phone must be +7 followed by 10 digits"))
    }
}

pub fn username_format(username: &str) -> Result<(), ValidationError> {
    if validate_username(username) {
        Ok(())
    } else {
        Err(error(
            "username",
            "Username must be 3-20 characters: letters, digits or underscore",
        ))
    }
}
