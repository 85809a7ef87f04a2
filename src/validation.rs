use url::Url;

use crate::error::{AppError, AppResult};

pub fn normalize_email(raw: &str) -> AppResult<String> {
    let email = raw.trim().to_lowercase();
    let valid = match email.split_once('@') {
        Some((local, domain)) => {
            !local.is_empty()
                && !domain.contains('@')
                && domain.contains('.')
                && !domain.starts_with('.')
                && !domain.ends_with('.')
                && !email.chars().any(char::is_whitespace)
        }
        None => false,
    };
    if !valid {
        return Err(AppError::BadRequest("email is invalid".into()));
    }
    Ok(email)
}

pub fn min_chars(field: &str, value: &str, min: usize) -> AppResult<()> {
    if value.trim().chars().count() < min {
        return Err(AppError::BadRequest(format!(
            "{field} must be at least {min} characters"
        )));
    }
    Ok(())
}

pub fn in_range<T>(field: &str, value: Option<T>, min: T, max: T) -> AppResult<()>
where
    T: PartialOrd + std::fmt::Display + Copy,
{
    match value {
        Some(v) if v < min || v > max => Err(AppError::BadRequest(format!(
            "{field} must be between {min} and {max}"
        ))),
        _ => Ok(()),
    }
}

pub fn non_negative(field: &str, value: Option<i32>) -> AppResult<()> {
    in_range(field, value, 0, i32::MAX)
}

pub fn positive_price(price: i64) -> AppResult<()> {
    if price <= 0 {
        return Err(AppError::BadRequest("price must be a positive integer".into()));
    }
    Ok(())
}

pub fn currency_code(raw: &str) -> AppResult<String> {
    let code = raw.trim().to_ascii_uppercase();
    if code.len() != 3 || !code.chars().all(|c| c.is_ascii_alphabetic()) {
        return Err(AppError::BadRequest("currency must be a 3-letter code".into()));
    }
    Ok(code)
}

/// Absolute http(s) URL, returned unchanged.
pub fn http_url(raw: &str) -> AppResult<String> {
    let parsed = Url::parse(raw.trim())
        .map_err(|_| AppError::BadRequest(format!("invalid photo url: {raw}")))?;
    match parsed.scheme() {
        "http" | "https" => Ok(raw.trim().to_string()),
        _ => Err(AppError::BadRequest(format!("invalid photo url: {raw}"))),
    }
}

/// Empty strings clear optional text fields.
pub fn blank_to_none(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn emails_are_normalized_and_checked() {
        assert_eq!(normalize_email("  Ana@Example.COM ").unwrap(), "ana@example.com");
        assert!(normalize_email("no-at-sign").is_err());
        assert!(normalize_email("a@b").is_err());
        assert!(normalize_email("a b@c.io").is_err());
    }

    #[test]
    fn ranges_skip_missing_values() {
        assert!(in_range("year_built", None::<i32>, 1800, 2100).is_ok());
        assert!(in_range("year_built", Some(1799), 1800, 2100).is_err());
        assert!(in_range("latitude", Some(45.5), -90.0, 90.0).is_ok());
        assert!(non_negative("bedrooms", Some(-1)).is_err());
    }

    #[test]
    fn photo_urls_must_be_http() {
        assert!(http_url("https://img.example.com/a.jpg").is_ok());
        assert!(http_url("ftp://example.com/a.jpg").is_err());
        assert!(http_url("not a url").is_err());
    }

    #[test]
    fn currency_is_upper_cased() {
        assert_eq!(currency_code("usd").unwrap(), "USD");
        assert!(currency_code("dollars").is_err());
        assert!(positive_price(0).is_err());
    }
}
