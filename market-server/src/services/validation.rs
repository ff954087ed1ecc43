//! Cart validation: snapshot vs live price, availability
//!
//! Pure reads. Snapshots are never refreshed here; the customer re-adds an
//! item to accept a new price.

use shared::models::{CartLine, ValidationIssue, ValidationIssueType, ValidationResult};

use crate::db::MarketStore;
use crate::error::ServiceResult;

/// Issues for one line: availability and price drift are reported independently
pub fn check_line(line: &CartLine) -> Vec<ValidationIssue> {
    let mut issues = Vec::new();
    if !line.is_available {
        issues.push(ValidationIssue {
            issue_type: ValidationIssueType::Unavailable,
            item_id: line.id,
            item_name: line.food_item_name.clone(),
            old_price: None,
            new_price: None,
            price_difference: None,
            message: format!("{} is no longer available", line.food_item_name),
        });
    }
    if line.price_changed() {
        let (issue_type, verb) = if line.price > line.price_snapshot {
            (ValidationIssueType::PriceIncrease, "increased")
        } else {
            (ValidationIssueType::PriceDecrease, "decreased")
        };
        issues.push(ValidationIssue {
            issue_type,
            item_id: line.id,
            item_name: line.food_item_name.clone(),
            old_price: Some(line.price_snapshot),
            new_price: Some(line.price),
            price_difference: Some(line.price - line.price_snapshot),
            message: format!(
                "Price of {} {verb} from {} to {}",
                line.food_item_name, line.price_snapshot, line.price
            ),
        });
    }
    issues
}

pub fn validate_lines<'a>(lines: impl IntoIterator<Item = &'a CartLine>) -> ValidationResult {
    ValidationResult::from_issues(lines.into_iter().flat_map(check_line).collect())
}

/// Validate the whole cart; a customer without a cart gets an empty, valid result
pub async fn validate_cart(
    store: &dyn MarketStore,
    customer_id: &str,
) -> ServiceResult<ValidationResult> {
    let Some(cart) = store.find_cart(customer_id).await? else {
        return Ok(ValidationResult::from_issues(Vec::new()));
    };
    let lines = store.load_cart_lines(cart.id).await?;
    Ok(validate_lines(&lines))
}

pub async fn validate_seller_cart(
    store: &dyn MarketStore,
    customer_id: &str,
    seller_id: &str,
) -> ServiceResult<ValidationResult> {
    let Some(cart) = store.find_cart(customer_id).await? else {
        return Ok(ValidationResult::from_issues(Vec::new()));
    };
    let lines = store.load_cart_lines(cart.id).await?;
    Ok(validate_lines(lines.iter().filter(|l| l.seller_id == seller_id)))
}
