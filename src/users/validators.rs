use regex::Regex;

use super::models::UpdateUserRequest;
use crate::common::{ValidationResult, Validator};

/// Loose email shape check; the provider already verified ownership.
pub fn is_valid_email(email: &str) -> bool {
    Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").is_ok_and(|re| re.is_match(email))
}

impl Validator<UpdateUserRequest> for UpdateUserRequest {
    fn validate(&self, data: &UpdateUserRequest) -> ValidationResult {
        let mut result = ValidationResult::new();

        if data.name.trim().is_empty() {
            result.add_error("name", "Name is required");
        }

        if data.name.len() > 255 {
            result.add_error("name", "Name must not exceed 255 characters");
        }

        if let Some(avatar_url) = &data.avatar_url {
            if !avatar_url.is_empty()
                && !avatar_url.starts_with("http://")
                && !avatar_url.starts_with("https://")
            {
                result.add_error(
                    "avatar_url",
                    "Avatar URL must start with http:// or https://",
                );
            }
        }

        result
    }
}
