//! Response payloads for the billing API

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::{BillLine, BillingSummary, EnrichedBill, MealPayment, PaymentRecord};

/// `GET action=calculate-monthly`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CalculateBillsResponse {
    pub bills: Vec<BillLine>,
    pub month: i32,
    pub year: i32,
    pub summary: BillingSummary,
}

/// `GET action=get-all-bills` / `get-user-bills`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BillsResponse {
    pub bills: Vec<EnrichedBill>,
}

/// `GET action=get-user-bill`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BillResponse {
    pub bill: Option<EnrichedBill>,
}

/// `POST action=generate-bills`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerateBillsResponse {
    pub message: String,
    pub bills_generated: usize,
    pub bills: Vec<BillLine>,
}

/// Which meals a payment covered and what was left over
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AllocationSummary {
    pub meals_paid: Vec<Uuid>,
    pub allocated_amount: Decimal,
    pub unallocated_amount: Decimal,
}

/// `POST action=record-payment`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecordPaymentResponse {
    pub message: String,
    pub payment: PaymentRecord,
    pub allocation: AllocationSummary,
}

/// `GET action=get-payment-history`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaymentHistoryResponse {
    pub payments: Vec<MealPayment>,
}
