//! Input validation helpers
//!
//! Centralized text length constants and validation functions for request
//! payloads. Failures are `ValidationFailed` (400).

use rust_decimal::Decimal;
use shared::error::AppError;
use shared::models::{BuyNowRequest, CheckoutSelectedRequest, MAX_SPECIAL_INSTRUCTIONS_LEN};

// ── Text length limits ──────────────────────────────────────────────

/// Entity names: food items, categories
pub const MAX_NAME_LEN: usize = 200;

/// Notes and descriptions
pub const MAX_NOTE_LEN: usize = 500;

/// Delivery addresses
pub const MAX_ADDRESS_LEN: usize = 500;

/// Phone numbers
pub const MAX_PHONE_LEN: usize = 20;

/// URLs / image paths
pub const MAX_URL_LEN: usize = 2048;

// ── Validation helpers ──────────────────────────────────────────────

/// Validate that a required string is non-empty and within the length limit.
pub fn validate_required_text(value: &str, field: &str, max_len: usize) -> Result<(), AppError> {
    if value.trim().is_empty() {
        return Err(AppError::validation(format!("{field} must not be empty")));
    }
    if value.chars().count() > max_len {
        return Err(AppError::validation(format!(
            "{field} is too long ({} chars, max {max_len})",
            value.chars().count()
        )));
    }
    Ok(())
}

/// Validate that an optional string, if present, is within the length limit.
pub fn validate_optional_text(
    value: &Option<String>,
    field: &str,
    max_len: usize,
) -> Result<(), AppError> {
    if let Some(v) = value
        && v.chars().count() > max_len
    {
        return Err(AppError::validation(format!(
            "{field} is too long ({} chars, max {max_len})",
            v.chars().count()
        )));
    }
    Ok(())
}

/// Digits with optional `+`, spaces, dashes, dots and parentheses
pub fn validate_phone(value: &str) -> Result<(), AppError> {
    validate_required_text(value, "phone_number", MAX_PHONE_LEN)?;
    let allowed = |c: char| c.is_ascii_digit() || matches!(c, '+' | ' ' | '-' | '.' | '(' | ')');
    if !value.chars().all(allowed) || !value.chars().any(|c| c.is_ascii_digit()) {
        return Err(AppError::validation("phone_number is not a valid phone number"));
    }
    Ok(())
}

pub fn validate_delivery_fee(fee: Option<Decimal>) -> Result<(), AppError> {
    if let Some(fee) = fee
        && fee < Decimal::ZERO
    {
        return Err(AppError::validation("delivery_fee must not be negative"));
    }
    Ok(())
}

/// Trim, and map blank to None
pub fn normalize_optional_text(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

// ── Request validators ──────────────────────────────────────────────

pub fn validate_checkout_request(req: &CheckoutSelectedRequest) -> Result<(), AppError> {
    if req.seller_ids.is_empty() {
        return Err(AppError::validation("seller_ids must not be empty"));
    }
    validate_required_text(&req.delivery_address, "delivery_address", MAX_ADDRESS_LEN)?;
    validate_phone(&req.phone_number)?;
    validate_optional_text(&req.notes, "notes", MAX_NOTE_LEN)?;
    validate_delivery_fee(req.delivery_fee)
}

/// Quantity is checked later, after the item lookup
pub fn validate_buy_now_request(req: &BuyNowRequest) -> Result<(), AppError> {
    validate_required_text(&req.delivery_address, "delivery_address", MAX_ADDRESS_LEN)?;
    validate_phone(&req.phone_number)?;
    validate_optional_text(&req.notes, "notes", MAX_NOTE_LEN)?;
    validate_optional_text(
        &req.special_instructions,
        "special_instructions",
        MAX_SPECIAL_INSTRUCTIONS_LEN,
    )?;
    validate_delivery_fee(req.delivery_fee)
}

#[cfg(test)]
mod tests {
    use super::*;
    use shared::error::ErrorCode;

    fn checkout(seller_ids: Vec<&str>, phone: &str) -> CheckoutSelectedRequest {
        CheckoutSelectedRequest {
            seller_ids: seller_ids.into_iter().map(String::from).collect(),
            delivery_address: "12 Rizal Ave".into(),
            phone_number: phone.into(),
            notes: None,
            delivery_fee: None,
        }
    }

    #[test]
    fn test_required_text() {
        assert!(validate_required_text("ok", "name", 10).is_ok());
        assert!(validate_required_text("   ", "name", 10).is_err());
        assert!(validate_required_text("01234567890", "name", 10).is_err());
    }

    #[test]
    fn test_phone_rules() {
        assert!(validate_phone("+63 (917) 555-0101").is_ok());
        assert!(validate_phone("555-CALL").is_err());
        assert!(validate_phone("---").is_err());
        assert!(validate_phone("123456789012345678901").is_err());
    }

    #[test]
    fn test_checkout_request() {
        assert!(validate_checkout_request(&checkout(vec!["s1"], "5550101")).is_ok());

        let err = validate_checkout_request(&checkout(vec![], "5550101")).unwrap_err();
        assert_eq!(err.code, ErrorCode::ValidationFailed);

        let mut req = checkout(vec!["s1"], "5550101");
        req.delivery_fee = Some("-1".parse().unwrap());
        assert!(validate_checkout_request(&req).is_err());

        let mut req = checkout(vec!["s1"], "5550101");
        req.delivery_address = "x".repeat(MAX_ADDRESS_LEN + 1);
        assert!(validate_checkout_request(&req).is_err());
    }

    #[test]
    fn test_normalize_optional_text() {
        assert_eq!(normalize_optional_text(Some("  ".into())), None);
        assert_eq!(
            normalize_optional_text(Some(" no onions ".into())),
            Some("no onions".into())
        );
        assert_eq!(normalize_optional_text(None), None);
    }
}
