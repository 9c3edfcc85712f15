//! Request payloads for the billing API
//!
//! Every field is optional at the serde level so that a missing value
//! surfaces as a validation error with the field name, rather than as a
//! generic body rejection.

use rust_decimal::Decimal;
use serde::Deserialize;
use uuid::Uuid;

/// Query string shared by all billing actions
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BillingQuery {
    pub action: Option<String>,
    pub month: Option<i32>,
    pub year: Option<i32>,
    pub user_id: Option<Uuid>,
}

/// Body of `POST action=generate-bills`
#[derive(Debug, Clone, Default, Deserialize)]
pub struct GenerateBillsRequest {
    pub month: Option<i32>,
    pub year: Option<i32>,
}

/// Body of `POST action=record-payment`
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecordPaymentRequest {
    pub user_id: Option<Uuid>,
    pub month: Option<i32>,
    pub year: Option<i32>,
    pub amount: Option<Decimal>,
    pub payment_method: Option<String>,
    pub notes: Option<String>,
}
