//! Order status state machine
//!
//! ```text
//! Pending → Confirmed → Preparing → Ready → OutForDelivery → Delivered
//!    └──────────┴──→ Cancelled
//! ```
//!
//! Each table edge names the roles allowed to take it. Admins may take any
//! edge in the table; nobody may take an edge outside it.

use shared::error::{AppError, ErrorCode};
use shared::models::{Order, OrderStatus, OrderView};
use shared::util::now_millis;

use crate::auth::Identity;
use crate::db::MarketStore;
use crate::error::ServiceResult;

use super::orders::order_view;

/// How the acting user relates to an order
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActorRole {
    Customer,
    Seller,
    Admin,
}

use ActorRole::{Customer, Seller};
use OrderStatus::*;

/// (from, to, roles other than admin)
const TRANSITIONS: &[(OrderStatus, OrderStatus, &[ActorRole])] = &[
    (Pending, Confirmed, &[Seller]),
    (Pending, Cancelled, &[Seller, Customer]),
    (Confirmed, Preparing, &[Seller]),
    (Confirmed, Cancelled, &[Seller, Customer]),
    (Preparing, Ready, &[Seller]),
    (Ready, OutForDelivery, &[Seller]),
    (OutForDelivery, Delivered, &[Seller]),
];

/// Role-keyed transition policy
pub struct TransitionPolicy;

impl TransitionPolicy {
    /// Roles (besides admin) allowed on an edge; None when the edge is not in the table
    pub fn allowed_roles(from: OrderStatus, to: OrderStatus) -> Option<&'static [ActorRole]> {
        TRANSITIONS
            .iter()
            .find(|(f, t, _)| *f == from && *t == to)
            .map(|(_, _, roles)| *roles)
    }

    pub fn permits(role: ActorRole, from: OrderStatus, to: OrderStatus) -> bool {
        match Self::allowed_roles(from, to) {
            None => false,
            Some(_) if role == ActorRole::Admin => true,
            Some(roles) => roles.contains(&role),
        }
    }

    /// Targets reachable from `from` for `role`
    pub fn next_statuses(role: ActorRole, from: OrderStatus) -> Vec<OrderStatus> {
        OrderStatus::ALL
            .into_iter()
            .filter(|to| Self::permits(role, from, *to))
            .collect()
    }
}

/// Admin flag first, then customer, then seller; None for unrelated users
pub fn resolve_role(order: &Order, actor: &Identity) -> Option<ActorRole> {
    if actor.is_admin() {
        Some(ActorRole::Admin)
    } else if order.customer_id == actor.user_id {
        Some(ActorRole::Customer)
    } else if order.seller_id == actor.user_id {
        Some(ActorRole::Seller)
    } else {
        None
    }
}

/// Check whether `role` may move `order` to `to`
pub fn authorize_transition(order: &Order, role: ActorRole, to: OrderStatus) -> Result<(), AppError> {
    if role == ActorRole::Customer && to != Cancelled {
        return Err(AppError::forbidden("Customers can only cancel orders"));
    }
    if order.status.is_terminal() {
        return Err(AppError::with_message(
            ErrorCode::InvalidStatusTransition,
            format!("Order is already {}", order.status),
        ));
    }
    if !TransitionPolicy::permits(role, order.status, to) {
        return Err(AppError::with_message(
            ErrorCode::InvalidStatusTransition,
            format!("Cannot transition from {} to {}", order.status, to),
        ));
    }
    Ok(())
}

pub async fn update_order_status(
    store: &dyn MarketStore,
    order_id: i64,
    new_status: OrderStatus,
    actor: &Identity,
) -> ServiceResult<OrderView> {
    let order = store
        .find_order(order_id)
        .await?
        .ok_or_else(|| AppError::new(ErrorCode::OrderNotFound))?;

    let role = resolve_role(&order, actor)
        .ok_or_else(|| AppError::forbidden("You are not allowed to update this order"))?;
    authorize_transition(&order, role, new_status)?;

    let updated = store
        .update_order_status(order.id, order.status, new_status, now_millis())
        .await?
        .ok_or_else(|| AppError::new(ErrorCode::StatusChanged))?;

    tracing::info!(
        order_id = updated.id,
        order_number = %updated.order_number,
        from = %order.status,
        to = %updated.status,
        actor = %actor.user_id,
        "Order status updated"
    );
    order_view(store, updated).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::UserRole;

    fn order(status: OrderStatus) -> Order {
        Order {
            id: 1,
            order_number: "ORD-20250101-AAAAAA".into(),
            customer_id: "cust".into(),
            seller_id: "sell".into(),
            sub_total: Default::default(),
            delivery_fee: Default::default(),
            tax: Default::default(),
            total: Default::default(),
            status,
            delivery_address: "addr".into(),
            phone_number: "555".into(),
            notes: None,
            estimated_delivery_time: 30,
            created_at: 0,
            confirmed_at: None,
            preparing_at: None,
            ready_at: None,
            out_for_delivery_at: None,
            delivered_at: None,
            cancelled_at: None,
        }
    }

    fn identity(user_id: &str, role: UserRole) -> Identity {
        Identity {
            user_id: user_id.into(),
            role,
        }
    }

    #[test]
    fn test_edges_outside_table_always_rejected() {
        for from in OrderStatus::ALL {
            for to in OrderStatus::ALL {
                if TransitionPolicy::allowed_roles(from, to).is_none() {
                    for role in [ActorRole::Customer, ActorRole::Seller, ActorRole::Admin] {
                        assert!(!TransitionPolicy::permits(role, from, to), "{from}->{to}");
                    }
                }
            }
        }
    }

    #[test]
    fn test_terminal_states_have_no_exits() {
        for role in [ActorRole::Customer, ActorRole::Seller, ActorRole::Admin] {
            assert!(TransitionPolicy::next_statuses(role, Delivered).is_empty());
            assert!(TransitionPolicy::next_statuses(role, Cancelled).is_empty());
        }
    }

    #[test]
    fn test_seller_walks_the_happy_path() {
        let path = [Pending, Confirmed, Preparing, Ready, OutForDelivery, Delivered];
        for pair in path.windows(2) {
            assert!(TransitionPolicy::permits(ActorRole::Seller, pair[0], pair[1]));
        }
        assert!(!TransitionPolicy::permits(ActorRole::Seller, Pending, Ready));
    }

    #[test]
    fn test_customer_may_only_cancel_early() {
        assert_eq!(
            TransitionPolicy::next_statuses(ActorRole::Customer, Pending),
            vec![Cancelled]
        );
        assert_eq!(
            TransitionPolicy::next_statuses(ActorRole::Customer, Confirmed),
            vec![Cancelled]
        );
        assert!(TransitionPolicy::next_statuses(ActorRole::Customer, Preparing).is_empty());
    }

    #[test]
    fn test_role_resolution_order() {
        let o = order(Pending);
        assert_eq!(
            resolve_role(&o, &identity("cust", UserRole::Admin)),
            Some(ActorRole::Admin)
        );
        assert_eq!(
            resolve_role(&o, &identity("cust", UserRole::Customer)),
            Some(ActorRole::Customer)
        );
        assert_eq!(
            resolve_role(&o, &identity("sell", UserRole::Seller)),
            Some(ActorRole::Seller)
        );
        assert_eq!(resolve_role(&o, &identity("other", UserRole::Seller)), None);
    }

    #[test]
    fn test_customer_non_cancel_is_forbidden() {
        let err = authorize_transition(&order(Pending), ActorRole::Customer, Confirmed).unwrap_err();
        assert_eq!(err.code, ErrorCode::PermissionDenied);
    }

    #[test]
    fn test_customer_late_cancel_is_invalid_transition() {
        let err =
            authorize_transition(&order(Preparing), ActorRole::Customer, Cancelled).unwrap_err();
        assert_eq!(err.code, ErrorCode::InvalidStatusTransition);
        assert_eq!(err.message, "Cannot transition from Preparing to Cancelled");
    }

    #[test]
    fn test_admin_uses_table() {
        assert!(authorize_transition(&order(Ready), ActorRole::Admin, OutForDelivery).is_ok());
        let err = authorize_transition(&order(Ready), ActorRole::Admin, Pending).unwrap_err();
        assert_eq!(err.code, ErrorCode::InvalidStatusTransition);
    }

    #[test]
    fn test_terminal_order_rejects_every_actor() {
        for status in [Delivered, Cancelled] {
            for role in [ActorRole::Seller, ActorRole::Admin] {
                let err = authorize_transition(&order(status), role, Cancelled).unwrap_err();
                assert_eq!(err.code, ErrorCode::InvalidStatusTransition);
                assert_eq!(err.message, format!("Order is already {status}"));
            }
        }
    }
}
