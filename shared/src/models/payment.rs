//! Payment ledgers
//!
//! Two ledgers exist side by side:
//! - [`PaymentRecord`]: one row per payment transaction against a bill
//! - [`MealPayment`]: one row per paid meal, the ground truth for paid/unpaid

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// How a payment was tendered
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[cfg_attr(feature = "db", derive(sqlx::Type))]
#[cfg_attr(
    feature = "db",
    sqlx(type_name = "payment_method", rename_all = "snake_case")
)]
pub enum PaymentMethod {
    Cash,
    Upi,
    Card,
}

impl PaymentMethod {
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "cash" => Some(Self::Cash),
            "upi" => Some(Self::Upi),
            "card" => Some(Self::Card),
            _ => None,
        }
    }
}

/// Period-level payment transaction (append-only)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
pub struct PaymentRecord {
    pub id: Uuid,
    pub bill_id: Uuid,
    pub user_id: Uuid,
    pub amount: Decimal,
    pub payment_method: PaymentMethod,
    pub notes: Option<String>,
    pub recorded_by: Uuid,
    pub created_at: i64,
}

/// Payment of exactly one meal at its tier price
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
pub struct MealPayment {
    pub id: Uuid,
    /// Attendance row being paid; unique across the table
    pub poll_response_id: Uuid,
    pub user_id: Uuid,
    pub amount: Decimal,
    pub payment_date: NaiveDate,
    pub payment_method: PaymentMethod,
    pub recorded_by: Uuid,
    pub notes: Option<String>,
    pub created_at: i64,
}
