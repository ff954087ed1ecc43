//! Order Model

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Order lifecycle status
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "db", derive(sqlx::Type))]
#[cfg_attr(
    feature = "db",
    sqlx(type_name = "order_status", rename_all = "PascalCase")
)]
pub enum OrderStatus {
    #[default]
    Pending,
    Confirmed,
    Preparing,
    Ready,
    OutForDelivery,
    Delivered,
    Cancelled,
}

impl OrderStatus {
    pub const ALL: [OrderStatus; 7] = [
        OrderStatus::Pending,
        OrderStatus::Confirmed,
        OrderStatus::Preparing,
        OrderStatus::Ready,
        OrderStatus::OutForDelivery,
        OrderStatus::Delivered,
        OrderStatus::Cancelled,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::Pending => "Pending",
            OrderStatus::Confirmed => "Confirmed",
            OrderStatus::Preparing => "Preparing",
            OrderStatus::Ready => "Ready",
            OrderStatus::OutForDelivery => "OutForDelivery",
            OrderStatus::Delivered => "Delivered",
            OrderStatus::Cancelled => "Cancelled",
        }
    }

    /// No transition leaves a terminal status
    pub fn is_terminal(&self) -> bool {
        matches!(self, OrderStatus::Delivered | OrderStatus::Cancelled)
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OrderStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        OrderStatus::ALL
            .into_iter()
            .find(|status| status.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| format!("unknown order status: {s}"))
    }
}

/// Order entity (one seller, one customer)
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
pub struct Order {
    pub id: i64,
    /// `ORD-YYYYMMDD-XXXXXX`, unique
    pub order_number: String,
    pub customer_id: String,
    pub seller_id: String,
    pub sub_total: Decimal,
    pub delivery_fee: Decimal,
    pub tax: Decimal,
    /// sub_total + delivery_fee + tax
    pub total: Decimal,
    pub status: OrderStatus,
    pub delivery_address: String,
    pub phone_number: String,
    pub notes: Option<String>,
    /// Minutes
    pub estimated_delivery_time: i32,
    pub created_at: i64,
    pub confirmed_at: Option<i64>,
    pub preparing_at: Option<i64>,
    pub ready_at: Option<i64>,
    pub out_for_delivery_at: Option<i64>,
    pub delivered_at: Option<i64>,
    pub cancelled_at: Option<i64>,
}

impl Order {
    /// Lifecycle timestamp stamped on entering `status` (None for Pending)
    pub fn status_timestamp(&self, status: OrderStatus) -> Option<i64> {
        match status {
            OrderStatus::Pending => None,
            OrderStatus::Confirmed => self.confirmed_at,
            OrderStatus::Preparing => self.preparing_at,
            OrderStatus::Ready => self.ready_at,
            OrderStatus::OutForDelivery => self.out_for_delivery_at,
            OrderStatus::Delivered => self.delivered_at,
            OrderStatus::Cancelled => self.cancelled_at,
        }
    }

    /// Move to `status`, stamping its lifecycle timestamp
    pub fn stamp_status(&mut self, status: OrderStatus, now: i64) {
        self.status = status;
        let slot = match status {
            OrderStatus::Pending => return,
            OrderStatus::Confirmed => &mut self.confirmed_at,
            OrderStatus::Preparing => &mut self.preparing_at,
            OrderStatus::Ready => &mut self.ready_at,
            OrderStatus::OutForDelivery => &mut self.out_for_delivery_at,
            OrderStatus::Delivered => &mut self.delivered_at,
            OrderStatus::Cancelled => &mut self.cancelled_at,
        };
        *slot = Some(now);
    }
}

/// Order line entity
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
pub struct OrderItem {
    pub id: i64,
    pub order_id: i64,
    pub food_item_id: i64,
    /// Denormalized at order time
    pub food_item_name: String,
    pub quantity: i32,
    /// Live catalog price at order time
    pub price: Decimal,
    pub special_instructions: Option<String>,
}

/// Order line as returned to clients
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
pub struct OrderItemView {
    pub id: i64,
    pub food_item_id: i64,
    pub food_item_name: String,
    pub quantity: i32,
    pub price: Decimal,
    pub special_instructions: Option<String>,
    pub line_total: Decimal,
    pub main_image_url: Option<String>,
}

/// Order with its lines and party names
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct OrderView {
    pub order: Order,
    pub customer_name: String,
    pub customer_email: String,
    pub seller_name: String,
    pub seller_email: String,
    pub items: Vec<OrderItemView>,
}

/// Checkout of selected sellers payload
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CheckoutSelectedRequest {
    pub seller_ids: Vec<String>,
    pub delivery_address: String,
    pub phone_number: String,
    pub notes: Option<String>,
    pub delivery_fee: Option<Decimal>,
}

/// Single-item direct purchase payload
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BuyNowRequest {
    pub food_item_id: i64,
    pub quantity: i32,
    pub delivery_address: String,
    pub phone_number: String,
    pub notes: Option<String>,
    pub special_instructions: Option<String>,
    pub delivery_fee: Option<Decimal>,
}

/// Status change payload
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpdateOrderStatusRequest {
    pub status: OrderStatus,
}

/// Why a seller partition failed at checkout
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum CheckoutErrorType {
    UnavailableItems,
    PriceChanges,
    SystemError,
}

/// Snapshot vs live price of one line
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PriceChange {
    pub item_name: String,
    pub old_price: Decimal,
    pub new_price: Decimal,
}

/// Per-seller checkout failure (never persisted)
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CheckoutError {
    pub seller_id: String,
    pub seller_name: String,
    pub error_type: CheckoutErrorType,
    pub message: String,
    /// Unavailable item names
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub items: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub price_changes: Vec<PriceChange>,
}

/// Overall checkout classification
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum CheckoutOutcome {
    Success,
    Partial,
    Failed,
}

/// Result of a split checkout
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CheckoutResponse {
    /// At least one order was created
    pub success: bool,
    pub orders_created: usize,
    /// Seller partitions attempted
    pub total_orders: usize,
    pub orders: Vec<OrderView>,
    pub errors: Vec<CheckoutError>,
}

impl CheckoutResponse {
    pub fn new(total_orders: usize, orders: Vec<OrderView>, errors: Vec<CheckoutError>) -> Self {
        Self {
            success: !orders.is_empty(),
            orders_created: orders.len(),
            total_orders,
            orders,
            errors,
        }
    }

    pub fn outcome(&self) -> CheckoutOutcome {
        match (self.orders.is_empty(), self.errors.is_empty()) {
            (_, true) => CheckoutOutcome::Success,
            (false, false) => CheckoutOutcome::Partial,
            (true, false) => CheckoutOutcome::Failed,
        }
    }
}

/// Sort direction on `created_at`
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    Asc,
    #[default]
    Desc,
}

/// Order listing filters
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OrdersQuery {
    /// Substring of the order number
    pub order_number: Option<String>,
    /// Upper bound on `total`
    pub max_total: Option<Decimal>,
    pub status: Option<OrderStatus>,
    pub sort: Option<SortDirection>,
    pub page: Option<u32>,
    pub page_size: Option<u32>,
}

impl OrdersQuery {
    pub const DEFAULT_PAGE_SIZE: u32 = 20;
    pub const MAX_PAGE_SIZE: u32 = 100;

    pub fn page_number(&self) -> u32 {
        self.page.unwrap_or(1).max(1)
    }

    pub fn page_size(&self) -> u32 {
        self.page_size
            .unwrap_or(Self::DEFAULT_PAGE_SIZE)
            .clamp(1, Self::MAX_PAGE_SIZE)
    }

    pub fn offset(&self) -> u64 {
        u64::from(self.page_number() - 1) * u64::from(self.page_size())
    }

    /// Whether an order passes the filters (ignores paging)
    pub fn matches(&self, order: &Order) -> bool {
        if let Some(fragment) = &self.order_number
            && !order.order_number.contains(fragment.as_str())
        {
            return false;
        }
        if let Some(max_total) = self.max_total
            && order.total > max_total
        {
            return false;
        }
        if let Some(status) = self.status
            && order.status != status
        {
            return false;
        }
        true
    }
}

/// One page of results
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Page<T> {
    pub total: u64,
    pub page_number: u32,
    pub page_size: u32,
    pub items: Vec<T>,
}
