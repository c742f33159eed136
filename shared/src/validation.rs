//! Validation utilities for the brewery directory
//!
//! Format rules for addresses, contact details, prices and ratings. Every
//! validator returns a static message suitable for a field-level error.

use chrono::{Datelike, NaiveDate};
use rust_decimal::Decimal;

use crate::models::Address;

// ============================================================================
// Address Validations
// ============================================================================

/// Validate a US state code: exactly two uppercase letters
pub fn validate_state(state: &str) -> Result<(), &'static str> {
    if state.len() == 2 && state.chars().all(|c| c.is_ascii_uppercase()) {
        Ok(())
    } else {
        Err("State must be a two-letter uppercase code")
    }
}

/// Validate a five-digit postal code
pub fn validate_zip_code(zip: &str) -> Result<(), &'static str> {
    if zip.len() == 5 && zip.chars().all(|c| c.is_ascii_digit()) {
        Ok(())
    } else {
        Err("Zip code must be 5 digits")
    }
}

/// Validate every part of a street address
pub fn validate_address(address: &Address) -> Result<(), &'static str> {
    if address.street.trim().is_empty() {
        return Err("Street cannot be empty");
    }
    if address.city.trim().is_empty() {
        return Err("City cannot be empty");
    }
    validate_state(&address.state)?;
    validate_zip_code(&address.zip_code)
}

// ============================================================================
// Contact Validations
// ============================================================================

/// Validate a phone number.
/// Accepts: 555-123-4567, 5551234567
pub fn validate_phone_number(phone: &str) -> Result<(), &'static str> {
    let bytes = phone.as_bytes();
    let dashed = bytes.len() == 12
        && bytes[3] == b'-'
        && bytes[7] == b'-'
        && bytes
            .iter()
            .enumerate()
            .all(|(i, b)| i == 3 || i == 7 || b.is_ascii_digit());
    let plain = bytes.len() == 10 && bytes.iter().all(|b| b.is_ascii_digit());

    if dashed || plain {
        Ok(())
    } else {
        Err("Phone number must be XXX-XXX-XXXX or 10 digits")
    }
}

/// Validate email format (basic check)
pub fn validate_email(email: &str) -> Result<(), &'static str> {
    let Some((local, domain)) = email.split_once('@') else {
        return Err("Invalid email format");
    };
    if local.is_empty() || !domain.contains('.') || domain.starts_with('.') || domain.ends_with('.')
    {
        return Err("Invalid email format");
    }
    if email.chars().any(char::is_whitespace) {
        return Err("Invalid email format");
    }
    Ok(())
}

/// Validate a website address (scheme or `www.` prefix, dotted host)
pub fn validate_website(url: &str) -> Result<(), &'static str> {
    if url.chars().any(char::is_whitespace) {
        return Err("Invalid website URL");
    }
    let host = url
        .strip_prefix("https://")
        .or_else(|| url.strip_prefix("http://"))
        .or_else(|| url.starts_with("www.").then_some(url))
        .ok_or("Website must start with http://, https:// or www.")?;
    let host = host.split('/').next().unwrap_or_default();
    if host.len() < 4 || !host.contains('.') || host.ends_with('.') {
        return Err("Invalid website URL");
    }
    Ok(())
}

/// Validate password strength
pub fn validate_password(password: &str) -> Result<(), &'static str> {
    if password.chars().count() < 10 {
        return Err("Password must be at least 10 characters");
    }
    Ok(())
}

/// Minimum age to hold an account
pub const LEGAL_DRINKING_AGE: i32 = 21;

/// Whether someone born on `birth_date` is at least 21 on `today`
pub fn is_of_drinking_age(birth_date: NaiveDate, today: NaiveDate) -> bool {
    let mut age = today.year() - birth_date.year();
    if (today.month(), today.day()) < (birth_date.month(), birth_date.day()) {
        age -= 1;
    }
    age >= LEGAL_DRINKING_AGE
}

// ============================================================================
// Listing and Review Validations
// ============================================================================

/// Highest price tier ($$$$)
pub const MAX_PRICE_TIER: i16 = 4;

/// Validate a price tier (0-4)
pub fn validate_price_tier(price: i16) -> Result<(), &'static str> {
    if (0..=MAX_PRICE_TIER).contains(&price) {
        Ok(())
    } else {
        Err("Price tier must be between 0 and 4")
    }
}

/// Decimal places a stored review rating keeps
pub const RATING_SCALE: u32 = 2;

/// Validate a review rating (1-5 inclusive, at most two decimal places).
///
/// The aggregate is computed from the submitted value, so it must be the
/// exact value the review row stores.
pub fn validate_review_rating(rating: Decimal) -> Result<(), &'static str> {
    if rating < Decimal::ONE || rating > Decimal::from(5) {
        return Err("Rating must be between 1 and 5");
    }
    if rating.normalize().scale() > RATING_SCALE {
        return Err("Rating can have at most two decimal places");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn address() -> Address {
        Address {
            street: "123 Main St".to_string(),
            city: "Asheville".to_string(),
            state: "NC".to_string(),
            zip_code: "28801".to_string(),
        }
    }

    #[test]
    fn test_validate_state() {
        assert!(validate_state("NC").is_ok());
        assert!(validate_state("nc").is_err());
        assert!(validate_state("N").is_err());
        assert!(validate_state("NCA").is_err());
        assert!(validate_state("N1").is_err());
    }

    #[test]
    fn test_validate_zip_code() {
        assert!(validate_zip_code("28801").is_ok());
        assert!(validate_zip_code("2880").is_err());
        assert!(validate_zip_code("288011").is_err());
        assert!(validate_zip_code("2880a").is_err());
    }

    #[test]
    fn test_validate_address() {
        assert!(validate_address(&address()).is_ok());

        let mut missing_street = address();
        missing_street.street = "  ".to_string();
        assert!(validate_address(&missing_street).is_err());

        let mut bad_state = address();
        bad_state.state = "North Carolina".to_string();
        assert!(validate_address(&bad_state).is_err());
    }

    #[test]
    fn test_validate_phone_number() {
        assert!(validate_phone_number("828-555-0100").is_ok());
        assert!(validate_phone_number("8285550100").is_ok());
        assert!(validate_phone_number("828-5550-100").is_err());
        assert!(validate_phone_number("828555010").is_err());
        assert!(validate_phone_number("(828) 555-0100").is_err());
    }

    #[test]
    fn test_validate_email() {
        assert!(validate_email("brewer@example.com").is_ok());
        assert!(validate_email("first.last@beer.co.uk").is_ok());
        assert!(validate_email("invalid").is_err());
        assert!(validate_email("no@domain").is_err());
        assert!(validate_email("@example.com").is_err());
        assert!(validate_email("a b@example.com").is_err());
    }

    #[test]
    fn test_validate_website() {
        assert!(validate_website("https://wickedweedbrewing.com").is_ok());
        assert!(validate_website("http://example.org/taproom").is_ok());
        assert!(validate_website("www.example.com").is_ok());
        assert!(validate_website("example").is_err());
        assert!(validate_website("ftp://example.com").is_err());
        assert!(validate_website("https://nodot").is_err());
    }

    #[test]
    fn test_validate_password() {
        assert!(validate_password("hoppy-ipa-2024").is_ok());
        assert!(validate_password("short").is_err());
    }

    #[test]
    fn test_drinking_age() {
        let today = NaiveDate::from_ymd_opt(2024, 6, 15).unwrap();
        assert!(is_of_drinking_age(NaiveDate::from_ymd_opt(2003, 6, 15).unwrap(), today));
        assert!(!is_of_drinking_age(NaiveDate::from_ymd_opt(2003, 6, 16).unwrap(), today));
        assert!(is_of_drinking_age(NaiveDate::from_ymd_opt(1980, 1, 1).unwrap(), today));
    }

    #[test]
    fn test_price_tier() {
        for tier in 0..=4 {
            assert!(validate_price_tier(tier).is_ok());
        }
        assert!(validate_price_tier(-1).is_err());
        assert!(validate_price_tier(5).is_err());
    }

    #[test]
    fn test_review_rating() {
        assert!(validate_review_rating(Decimal::ONE).is_ok());
        assert!(validate_review_rating(Decimal::new(45, 1)).is_ok());
        assert!(validate_review_rating(Decimal::from(5)).is_ok());
        assert!(validate_review_rating(Decimal::ZERO).is_err());
        assert!(validate_review_rating(Decimal::new(51, 1)).is_err());
        assert!(validate_review_rating(Decimal::new(4555, 3)).is_err());
        assert!(validate_review_rating(Decimal::new(4500, 3)).is_ok());
        assert!(validate_review_rating(Decimal::new(456, 2)).is_ok());
    }
}
