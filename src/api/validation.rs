use super::ApiError;

pub fn validate_username(username: &str) -> Result<&str, ApiError> {
    let trimmed = username.trim();
    if trimmed.is_empty() {
        return Err(ApiError::validation("Username and password are required"));
    }

    if trimmed.len() > 50 {
        return Err(ApiError::validation(
            "Username must be 50 characters or less",
        ));
    }

    if !trimmed
        .chars()
        .all(|c| c.is_alphanumeric() || c == '.' || c == '-' || c == '_')
    {
        return Err(ApiError::validation(
            "Username can only contain letters, numbers, dots, hyphens, and underscores",
        ));
    }

    Ok(trimmed)
}

pub fn validate_password(password: &str) -> Result<&str, ApiError> {
    if password.is_empty() {
        return Err(ApiError::validation("Username and password are required"));
    }

    if password.len() < 6 {
        return Err(ApiError::validation(
            "Password must be at least 6 characters",
        ));
    }

    Ok(password)
}

pub fn validate_limit(limit: u64) -> Result<u64, ApiError> {
    const MAX_LIMIT: u64 = 1000;
    const MIN_LIMIT: u64 = 1;

    if !(MIN_LIMIT..=MAX_LIMIT).contains(&limit) {
        return Err(ApiError::validation(format!(
            "Invalid limit: {}. Limit must be between {} and {}",
            limit, MIN_LIMIT, MAX_LIMIT
        )));
    }
    Ok(limit)
}

/// Entry dates travel as "YYYY-MM-DD"; anything else breaks the
/// lexicographic date ordering the log and analytics rely on.
pub fn validate_date(date: &str) -> Result<&str, ApiError> {
    if chrono::NaiveDate::parse_from_str(date, "%Y-%m-%d").is_err() {
        return Err(ApiError::validation(format!(
            "Invalid date: '{}'. Expected YYYY-MM-DD",
            date
        )));
    }
    Ok(date)
}

pub fn validate_portion_size(portion: f64) -> Result<f64, ApiError> {
    if !portion.is_finite() || portion <= 0.0 {
        return Err(ApiError::validation(format!(
            "Invalid portion_size: {}. Must be a positive number",
            portion
        )));
    }
    Ok(portion)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_username() {
        assert!(validate_username("erin").is_ok());
        assert!(validate_username("erin_92").is_ok());
        assert_eq!(validate_username("  erin  ").unwrap(), "erin");
        assert!(validate_username("").is_err());
        assert!(validate_username("   ").is_err());
        assert!(validate_username(&"a".repeat(51)).is_err());
        assert!(validate_username("no spaces").is_err());
        assert!(validate_username("nope!").is_err());
    }

    #[test]
    fn test_validate_password() {
        assert!(validate_password("secret1").is_ok());
        assert!(validate_password("123456").is_ok());
        assert!(validate_password("12345").is_err());
        assert!(validate_password("").is_err());
    }

    #[test]
    fn test_validate_limit() {
        assert!(validate_limit(1).is_ok());
        assert!(validate_limit(100).is_ok());
        assert!(validate_limit(1000).is_ok());
        assert!(validate_limit(0).is_err());
        assert!(validate_limit(1001).is_err());
    }

    #[test]
    fn test_validate_date() {
        assert!(validate_date("2026-03-01").is_ok());
        assert!(validate_date("2026-3-1").is_err());
        assert!(validate_date("03/01/2026").is_err());
        assert!(validate_date("2026-13-01").is_err());
        assert!(validate_date("").is_err());
    }

    #[test]
    fn test_validate_portion_size() {
        assert!(validate_portion_size(1.0).is_ok());
        assert!(validate_portion_size(0.25).is_ok());
        assert!(validate_portion_size(0.0).is_err());
        assert!(validate_portion_size(-2.0).is_err());
        assert!(validate_portion_size(f64::NAN).is_err());
    }
}
