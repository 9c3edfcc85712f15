//! Persistence layer
//!
//! [`BillingStore`] is the only seam between the billing core and storage.
//! Two implementations ship: [`PgBillingStore`] for PostgreSQL and
//! [`MemoryBillingStore`] for tests and local runs.

mod memory;
mod postgres;

pub use memory::MemoryBillingStore;
pub use postgres::PgBillingStore;

use async_trait::async_trait;
use shared::models::{BillLine, BillableMeal, MealPayment, MonthlyBill, PaymentRecord, UserProfile};
use thiserror::Error;
use uuid::Uuid;

use crate::billing::BillingPeriod;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// A uniqueness rule rejected the write; nothing was persisted
    #[error("write conflict: {0}")]
    Conflict(String),

    #[error("{0} not found")]
    NotFound(String),
}

pub type StoreResult<T> = Result<T, StoreError>;

#[async_trait]
pub trait BillingStore: Send + Sync {
    /// Present + confirmed meals in `period`, ordered by date then id.
    /// `user_ids = None` means every user.
    async fn billable_meals(
        &self,
        period: &BillingPeriod,
        user_ids: Option<&[Uuid]>,
    ) -> StoreResult<Vec<BillableMeal>>;

    /// Batch profile lookup; unknown ids are simply absent from the result
    async fn profiles(&self, user_ids: &[Uuid]) -> StoreResult<Vec<UserProfile>>;

    /// Overwrite-upsert on (user_id, month, year). Totals are replaced,
    /// `due_amount` resets to the total and `status` to pending.
    async fn upsert_bills(
        &self,
        period: &BillingPeriod,
        lines: &[BillLine],
    ) -> StoreResult<Vec<MonthlyBill>>;

    async fn bills_for_period(&self, period: &BillingPeriod) -> StoreResult<Vec<MonthlyBill>>;

    /// Newest period first
    async fn bills_for_user(&self, user_id: Uuid) -> StoreResult<Vec<MonthlyBill>>;

    async fn bill_for_user(
        &self,
        user_id: Uuid,
        period: &BillingPeriod,
    ) -> StoreResult<Option<MonthlyBill>>;

    async fn meal_payments_for(&self, meal_ids: &[Uuid]) -> StoreResult<Vec<MealPayment>>;

    /// Persist the period-level record and its per-meal payments as one
    /// unit. If any meal already carries a payment the whole commit fails
    /// with [`StoreError::Conflict`].
    async fn commit_payment(
        &self,
        payment: &PaymentRecord,
        meal_payments: &[MealPayment],
    ) -> StoreResult<()>;

    async fn payments_for_bill(&self, bill_id: Uuid) -> StoreResult<Vec<PaymentRecord>>;

    /// Per-meal payments for meals dated inside `period`, oldest meal first
    async fn meal_payments_for_user(
        &self,
        user_id: Uuid,
        period: &BillingPeriod,
    ) -> StoreResult<Vec<MealPayment>>;
}
