use regex::Regex;
use std::sync::OnceLock;

use crate::errors::{AppError, AppResult};

fn email_regex() -> &'static Regex {
    static EMAIL: OnceLock<Regex> = OnceLock::new();
    EMAIL.get_or_init(|| {
        Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").expect("email pattern is valid")
    })
}

/// Email validation
pub fn validate_email(email: &str) -> AppResult<()> {
    if email.is_empty() {
        return Err(AppError::validation("Email cannot be empty"));
    }

    if email.len() > 255 {
        return Err(AppError::validation("Email cannot be longer than 255 characters"));
    }

    if !email_regex().is_match(email) {
        return Err(AppError::validation("Invalid email format"));
    }

    Ok(())
}

pub fn validate_display_name(name: &str) -> AppResult<()> {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        return Err(AppError::validation("Display name cannot be empty"));
    }
    if trimmed.chars().count() > 40 {
        return Err(AppError::validation("Display name cannot be longer than 40 characters"));
    }
    Ok(())
}

/// Non-empty, bounded free text such as titles and names
pub fn validate_title(value: &str, field_name: &str, max_len: usize) -> AppResult<()> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(AppError::validation(format!("{} cannot be empty", field_name)));
    }
    if trimmed.chars().count() > max_len {
        return Err(AppError::validation(format!(
            "{} cannot be longer than {} characters",
            field_name, max_len
        )));
    }
    Ok(())
}

/// RPE on the 1-10 scale in half-point steps
pub fn validate_rpe(rpe: f64) -> AppResult<()> {
    if !(1.0..=10.0).contains(&rpe) {
        return Err(AppError::validation("RPE must be between 1 and 10"));
    }
    if (rpe * 2.0).fract() != 0.0 {
        return Err(AppError::validation("RPE must be given in half-point steps"));
    }
    Ok(())
}

pub fn validate_weight(weight: f64) -> AppResult<()> {
    if !weight.is_finite() || weight < 0.0 || weight > 1500.0 {
        return Err(AppError::validation("Weight must be between 0 and 1500"));
    }
    Ok(())
}

pub fn validate_reps(reps: i32) -> AppResult<()> {
    if !(0..=100).contains(&reps) {
        return Err(AppError::validation("Reps must be between 0 and 100"));
    }
    Ok(())
}

pub fn validate_positive(value: f64, field_name: &str) -> AppResult<()> {
    if !value.is_finite() || value <= 0.0 {
        return Err(AppError::validation(format!("{} must be positive", field_name)));
    }
    Ok(())
}

/// `%term%` pattern for ILIKE with the term's own wildcards escaped.
/// Blank searches give `None`.
pub fn like_pattern(search: Option<&str>) -> Option<String> {
    search.map(str::trim).filter(|s| !s.is_empty()).map(|s| {
        let escaped = s
            .replace('\\', "\\\\")
            .replace('%', "\\%")
            .replace('_', "\\_");
        format!("%{}%", escaped)
    })
}

/// Clamp optional pagination parameters to the API limits
pub fn pagination(limit: Option<i64>, offset: Option<i64>) -> (i64, i64) {
    (limit.unwrap_or(50).clamp(1, 100), offset.unwrap_or(0).max(0))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_email_validation() {
        assert!(validate_email("lifter@example.com").is_ok());
        assert!(validate_email("").is_err());
        assert!(validate_email("no-at-sign.com").is_err());
        assert!(validate_email("two@@example.com").is_err());
    }

    #[test]
    fn test_rpe_validation() {
        assert!(validate_rpe(8.0).is_ok());
        assert!(validate_rpe(9.5).is_ok());
        assert!(validate_rpe(8.3).is_err());
        assert!(validate_rpe(0.5).is_err());
        assert!(validate_rpe(11.0).is_err());
    }

    #[test]
    fn test_title_validation() {
        assert!(validate_title("Push day", "Title", 10).is_ok());
        assert!(validate_title("   ", "Title", 10).is_err());
        assert!(validate_title("A very long title", "Title", 5).is_err());
    }

    #[test]
    fn test_like_pattern_escapes_wildcards() {
        assert_eq!(like_pattern(Some(" squat ")).as_deref(), Some("%squat%"));
        assert_eq!(like_pattern(Some("100%")).as_deref(), Some("%100\\%%"));
        assert_eq!(like_pattern(Some("iron_club")).as_deref(), Some("%iron\\_club%"));
        assert_eq!(like_pattern(Some("a\\b")).as_deref(), Some("%a\\\\b%"));
        assert_eq!(like_pattern(Some("   ")), None);
        assert_eq!(like_pattern(None), None);
    }

    #[test]
    fn test_pagination_clamps() {
        assert_eq!(pagination(None, None), (50, 0));
        assert_eq!(pagination(Some(500), Some(-3)), (100, 0));
        assert_eq!(pagination(Some(0), Some(20)), (1, 20));
    }
}
