//! Small helpers for auth request validation.

use regex::Regex;

use super::types::RegisterRequest;

/// Basic email format check. Emails are stored exactly as submitted, so this
/// does not normalize.
pub(crate) fn valid_email(email: &str) -> bool {
    Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").is_ok_and(|regex| regex.is_match(email))
}

/// Every problem with a registration body, in field order.
pub(super) fn registration_problems(request: &RegisterRequest) -> Vec<String> {
    let mut problems = Vec::new();
    if request.name.trim().is_empty() {
        problems.push("name is required".to_string());
    }
    if request.email.trim().is_empty() {
        problems.push("email is required".to_string());
    } else if !valid_email(&request.email) {
        problems.push("email is invalid".to_string());
    }
    if request.password.is_empty() {
        problems.push("password is required".to_string());
    }
    problems
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn valid_email_accepts_common_shapes() {
        assert!(valid_email("a@x.com"));
        assert!(valid_email("first.last+tag@sub.example.org"));
    }

    #[test]
    fn valid_email_rejects_garbage() {
        assert!(!valid_email("a@x"));
        assert!(!valid_email("no-at-sign.com"));
        assert!(!valid_email("a b@x.com"));
        assert!(!valid_email(""));
    }

    #[test]
    fn registration_problems_lists_every_field() {
        let problems = registration_problems(&RegisterRequest::default());
        assert_eq!(
            problems,
            vec![
                "name is required".to_string(),
                "email is required".to_string(),
                "password is required".to_string(),
            ]
        );
    }

    #[test]
    fn registration_problems_flags_bad_email_only() {
        let request = RegisterRequest {
            name: "Alice".to_string(),
            email: "alice".to_string(),
            password: "secret1".to_string(),
        };
        assert_eq!(registration_problems(&request), vec!["email is invalid"]);
    }
}
