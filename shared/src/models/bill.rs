//! Monthly bill models

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Bill payment status
///
/// The stored column is only ever written as `Pending` at generation time;
/// the value callers see is re-derived from payments on every read.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[cfg_attr(feature = "db", derive(sqlx::Type))]
#[cfg_attr(
    feature = "db",
    sqlx(type_name = "bill_status", rename_all = "snake_case")
)]
pub enum BillStatus {
    #[default]
    Pending,
    Partial,
    Paid,
}

impl BillStatus {
    /// Derive status from what has been paid against the bill total
    pub fn derive(paid_amount: Decimal, total_amount: Decimal) -> Self {
        if paid_amount >= total_amount {
            Self::Paid
        } else if paid_amount > Decimal::ZERO {
            Self::Partial
        } else {
            Self::Pending
        }
    }
}

/// Stored monthly bill, one per (user_id, month, year)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
pub struct MonthlyBill {
    pub id: Uuid,
    pub user_id: Uuid,
    pub month: i32,
    pub year: i32,
    pub half_meal_count: i64,
    pub full_meal_count: i64,
    pub half_meal_cost: Decimal,
    pub full_meal_cost: Decimal,
    pub total_amount: Decimal,
    pub due_amount: Decimal,
    pub status: BillStatus,
    pub created_at: i64,
    pub updated_at: i64,
}

/// Per-user aggregate produced by the bill calculator
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BillLine {
    pub user_id: Uuid,
    pub user_name: Option<String>,
    pub user_email: Option<String>,
    pub half_meal_count: i64,
    pub full_meal_count: i64,
    pub half_meal_cost: Decimal,
    pub full_meal_cost: Decimal,
    pub total_amount: Decimal,
}

/// Period-wide totals across all bill lines
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BillingSummary {
    pub total_users: usize,
    pub total_half_meals: i64,
    pub total_full_meals: i64,
    pub total_amount: Decimal,
}

/// Bill as returned to callers, with paid/due/status reconciled from payments
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnrichedBill {
    pub id: Uuid,
    pub user_id: Uuid,
    pub user_name: Option<String>,
    pub user_email: Option<String>,
    pub month: i32,
    pub year: i32,
    pub half_meal_count: i64,
    pub full_meal_count: i64,
    pub half_meal_cost: Decimal,
    pub full_meal_cost: Decimal,
    pub total_amount: Decimal,
    pub paid_amount: Decimal,
    pub due_amount: Decimal,
    pub status: BillStatus,
    pub created_at: i64,
    pub updated_at: i64,
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_status_boundaries() {
        assert_eq!(BillStatus::derive(dec!(300), dec!(300)), BillStatus::Paid);
        assert_eq!(BillStatus::derive(dec!(150), dec!(300)), BillStatus::Partial);
        assert_eq!(BillStatus::derive(dec!(0), dec!(300)), BillStatus::Pending);
    }

    #[test]
    fn test_overpaid_is_paid() {
        assert_eq!(BillStatus::derive(dec!(345), dec!(300)), BillStatus::Paid);
    }

    #[test]
    fn test_status_serializes_snake_case() {
        assert_eq!(
            serde_json::to_string(&BillStatus::Partial).unwrap(),
            "\"partial\""
        );
    }
}
