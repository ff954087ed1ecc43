//! Unified error codes for the marketplace
//!
//! Error codes are organized by category:
//! - 0xxx: General errors
//! - 1xxx: Authentication errors
//! - 2xxx: Permission errors
//! - 3xxx: Cart errors
//! - 4xxx: Order errors
//! - 6xxx: Catalog errors
//! - 9xxx: System errors

use serde::{Deserialize, Serialize};
use std::fmt;

/// Unified error code enum
///
/// All error codes are represented as u16 values for efficient serialization
/// and cross-language compatibility with API clients.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "u16", try_from = "u16")]
#[repr(u16)]
pub enum ErrorCode {
    // ==================== 0xxx: General ====================
    /// Operation completed successfully
    Success = 0,
    /// Validation failed
    ValidationFailed = 2,
    /// Resource not found
    NotFound = 3,
    /// Resource already exists
    AlreadyExists = 4,
    /// Value out of range
    ValueOutOfRange = 8,

    // ==================== 1xxx: Auth ====================
    /// User is not authenticated
    NotAuthenticated = 1001,
    /// Token has expired
    TokenExpired = 1003,
    /// Token is invalid
    TokenInvalid = 1004,

    // ==================== 2xxx: Permission ====================
    /// Permission denied
    PermissionDenied = 2001,
    /// Seller role required
    SellerRequired = 2006,

    // ==================== 3xxx: Cart ====================
    /// Customer has no cart yet
    CartNotFound = 3001,
    /// Cart item not found in the customer's cart
    CartItemNotFound = 3002,
    /// Cart has no items
    CartEmpty = 3003,
    /// None of the selected sellers has items in the cart
    NoItemsForSelectedSellers = 3004,
    /// Quantity outside the accepted range
    InvalidQuantity = 3005,
    /// Another checkout for the same cart is in progress
    CheckoutConflict = 3006,

    // ==================== 4xxx: Order ====================
    /// Order not found
    OrderNotFound = 4001,
    /// Requested status change is not a legal transition
    InvalidStatusTransition = 4002,
    /// Checkout failed for every selected seller
    CheckoutFailed = 4003,
    /// Could not allocate a unique order number
    OrderNumberUnavailable = 4004,
    /// Order status was changed by a concurrent request
    StatusChanged = 4005,

    // ==================== 6xxx: Catalog ====================
    /// Food item not found
    FoodItemNotFound = 6001,
    /// Food item has invalid price
    FoodItemInvalidPrice = 6002,
    /// Food item is currently unavailable
    FoodItemUnavailable = 6003,

    // ==================== 9xxx: System ====================
    /// Internal server error
    InternalError = 9001,
}

impl ErrorCode {
    /// Get the numeric code value
    #[inline]
    pub const fn code(&self) -> u16 {
        *self as u16
    }

    /// Get the developer-facing English message for this error code
    pub const fn message(&self) -> &'static str {
        match self {
            // General
            ErrorCode::Success => "Operation completed successfully",
            ErrorCode::ValidationFailed => "Validation failed",
            ErrorCode::NotFound => "Resource not found",
            ErrorCode::AlreadyExists => "Resource already exists",
            ErrorCode::ValueOutOfRange => "Value is out of range",

            // Auth
            ErrorCode::NotAuthenticated => "User is not authenticated",
            ErrorCode::TokenExpired => "Authentication token has expired",
            ErrorCode::TokenInvalid => "Authentication token is invalid",

            // Permission
            ErrorCode::PermissionDenied => "Permission denied",
            ErrorCode::SellerRequired => "Seller role is required",

            // Cart
            ErrorCode::CartNotFound => "Cart not found",
            ErrorCode::CartItemNotFound => "Cart item not found",
            ErrorCode::CartEmpty => "Cart is empty",
            ErrorCode::NoItemsForSelectedSellers => "No items found for selected sellers",
            ErrorCode::InvalidQuantity => "Quantity must be between 1 and 100",
            ErrorCode::CheckoutConflict => "Another checkout is already processing this cart",

            // Order
            ErrorCode::OrderNotFound => "Order not found",
            ErrorCode::InvalidStatusTransition => "Invalid order status transition",
            ErrorCode::CheckoutFailed => "Checkout failed for all selected sellers",
            ErrorCode::OrderNumberUnavailable => "Could not allocate an order number",
            ErrorCode::StatusChanged => "Order status was changed by another request",

            // Catalog
            ErrorCode::FoodItemNotFound => "Food item not found",
            ErrorCode::FoodItemInvalidPrice => "Food item price must be greater than zero",
            ErrorCode::FoodItemUnavailable => "This item is currently unavailable",

            // System
            ErrorCode::InternalError => "Internal server error",
        }
    }
}

impl From<ErrorCode> for u16 {
    #[inline]
    fn from(code: ErrorCode) -> Self {
        code.code()
    }
}

/// Error when converting from an invalid u16 to ErrorCode
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InvalidErrorCode(pub u16);

impl fmt::Display for InvalidErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid error code: {}", self.0)
    }
}

impl std::error::Error for InvalidErrorCode {}

impl TryFrom<u16> for ErrorCode {
    type Error = InvalidErrorCode;

    fn try_from(value: u16) -> Result<Self, Self::Error> {
        match value {
            // General
            0 => Ok(ErrorCode::Success),
            2 => Ok(ErrorCode::ValidationFailed),
            3 => Ok(ErrorCode::NotFound),
            4 => Ok(ErrorCode::AlreadyExists),
            8 => Ok(ErrorCode::ValueOutOfRange),

            // Auth
            1001 => Ok(ErrorCode::NotAuthenticated),
            1003 => Ok(ErrorCode::TokenExpired),
            1004 => Ok(ErrorCode::TokenInvalid),

            // Permission
            2001 => Ok(ErrorCode::PermissionDenied),
            2006 => Ok(ErrorCode::SellerRequired),

            // Cart
            3001 => Ok(ErrorCode::CartNotFound),
            3002 => Ok(ErrorCode::CartItemNotFound),
            3003 => Ok(ErrorCode::CartEmpty),
            3004 => Ok(ErrorCode::NoItemsForSelectedSellers),
            3005 => Ok(ErrorCode::InvalidQuantity),
            3006 => Ok(ErrorCode::CheckoutConflict),

            // Order
            4001 => Ok(ErrorCode::OrderNotFound),
            4002 => Ok(ErrorCode::InvalidStatusTransition),
            4003 => Ok(ErrorCode::CheckoutFailed),
            4004 => Ok(ErrorCode::OrderNumberUnavailable),
            4005 => Ok(ErrorCode::StatusChanged),

            // Catalog
            6001 => Ok(ErrorCode::FoodItemNotFound),
            6002 => Ok(ErrorCode::FoodItemInvalidPrice),
            6003 => Ok(ErrorCode::FoodItemUnavailable),

            // System
            9001 => Ok(ErrorCode::InternalError),

            _ => Err(InvalidErrorCode(value)),
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}
