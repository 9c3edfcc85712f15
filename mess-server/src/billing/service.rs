//! Billing service
//!
//! Orchestrates the calculator, the allocator and reconciliation over a
//! [`BillingStore`]. Holds no state of its own beyond the store handle and
//! the price list.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use rust_decimal::Decimal;
use shared::error::{AppError, ErrorCode};
use shared::models::{
    BillLine, BillableMeal, BillingSummary, EnrichedBill, MealPayment, PaymentMethod,
    PaymentRecord,
};
use shared::response::AllocationSummary;
use shared::util::{now_millis, today};
use uuid::Uuid;

use super::allocator::{Allocation, allocate};
use super::calculator::{billed_users, calculate, summarize};
use super::period::BillingPeriod;
use super::pricing::MealPricing;
use super::reconcile::{enrich, paid_amount};
use crate::db::{BillingStore, StoreError};
use crate::error::ServiceResult;

/// Attempts at allocating a payment before giving up on a contended period
pub const MAX_ALLOCATION_ATTEMPTS: usize = 3;

/// A validated payment, ready to allocate
#[derive(Debug, Clone)]
pub struct RecordPayment {
    pub user_id: Uuid,
    pub period: BillingPeriod,
    pub amount: Decimal,
    pub payment_method: PaymentMethod,
    pub notes: Option<String>,
    pub recorded_by: Uuid,
}

#[derive(Debug, Clone)]
pub struct PaymentOutcome {
    pub payment: PaymentRecord,
    pub allocation: AllocationSummary,
}

#[derive(Clone)]
pub struct BillingService {
    store: Arc<dyn BillingStore>,
    pricing: MealPricing,
}

impl BillingService {
    pub fn new(store: Arc<dyn BillingStore>, pricing: MealPricing) -> Self {
        Self { store, pricing }
    }

    /// Aggregate billable meals of `period` into one line per user
    pub async fn calculate_monthly_bills(
        &self,
        period: BillingPeriod,
    ) -> ServiceResult<(Vec<BillLine>, BillingSummary)> {
        let meals = self.store.billable_meals(&period, None).await?;
        let profiles = self.store.profiles(&billed_users(&meals)).await?;
        let lines = calculate(&meals, &profiles, &self.pricing);
        let summary = summarize(&lines);

        tracing::debug!(
            period = %period,
            meals = meals.len(),
            users = summary.total_users,
            "Calculated monthly bills"
        );
        Ok((lines, summary))
    }

    /// Recalculate `period` and overwrite the stored bills
    pub async fn generate_bills(&self, period: BillingPeriod) -> ServiceResult<Vec<BillLine>> {
        let (lines, summary) = self.calculate_monthly_bills(period).await?;
        let saved = self.store.upsert_bills(&period, &lines).await?;

        tracing::info!(
            month = period.month(),
            year = period.year(),
            bills = saved.len(),
            total_amount = %summary.total_amount,
            "Generated monthly bills"
        );
        Ok(lines)
    }

    /// Record a payment and allocate it to the user's unpaid meals
    ///
    /// The period record and the per-meal payments are committed together.
    /// If another payment grabs one of the chosen meals first, the unpaid
    /// set is re-read and the allocation redone, up to
    /// [`MAX_ALLOCATION_ATTEMPTS`] times.
    pub async fn record_payment(&self, cmd: RecordPayment) -> ServiceResult<PaymentOutcome> {
        let bill = self
            .store
            .bill_for_user(cmd.user_id, &cmd.period)
            .await?
            .ok_or_else(|| {
                AppError::with_message(
                    ErrorCode::BillNotFound,
                    format!(
                        "No bill for user {} in {}; generate bills first",
                        cmd.user_id, cmd.period
                    ),
                )
            })?;

        for attempt in 1..=MAX_ALLOCATION_ATTEMPTS {
            let unpaid = self.unpaid_meals(cmd.user_id, &cmd.period).await?;
            let allocation = allocate(&unpaid, cmd.amount, &self.pricing);

            let now = now_millis();
            let payment = PaymentRecord {
                id: Uuid::new_v4(),
                bill_id: bill.id,
                user_id: cmd.user_id,
                amount: cmd.amount,
                payment_method: cmd.payment_method,
                notes: cmd.notes.clone(),
                recorded_by: cmd.recorded_by,
                created_at: now,
            };
            let meal_payments = meal_payments(&cmd, &allocation, now);

            match self.store.commit_payment(&payment, &meal_payments).await {
                Ok(()) => {
                    tracing::info!(
                        user_id = %cmd.user_id,
                        period = %cmd.period,
                        amount = %cmd.amount,
                        meals_paid = meal_payments.len(),
                        unallocated = %allocation.unallocated,
                        "Recorded payment"
                    );
                    return Ok(PaymentOutcome {
                        payment,
                        allocation: AllocationSummary {
                            meals_paid: allocation.meals.iter().map(|m| m.meal.id).collect(),
                            allocated_amount: allocation.allocated,
                            unallocated_amount: allocation.unallocated,
                        },
                    });
                }
                Err(StoreError::Conflict(reason)) => {
                    tracing::warn!(
                        user_id = %cmd.user_id,
                        period = %cmd.period,
                        attempt,
                        %reason,
                        "Payment allocation raced another payment, retrying"
                    );
                }
                Err(e) => return Err(e.into()),
            }
        }

        Err(AppError::with_message(
            ErrorCode::PaymentConflict,
            format!(
                "Could not allocate payment after {MAX_ALLOCATION_ATTEMPTS} attempts; try again"
            ),
        )
        .into())
    }

    /// All bills of a period, reconciled against per-meal payments
    ///
    /// Meals and payments for every billed user are fetched in one batch
    /// each, not per bill.
    pub async fn all_bills(&self, period: BillingPeriod) -> ServiceResult<Vec<EnrichedBill>> {
        let bills = self.store.bills_for_period(&period).await?;
        if bills.is_empty() {
            return Ok(Vec::new());
        }

        let user_ids: Vec<Uuid> = bills.iter().map(|b| b.user_id).collect();
        let profiles = self.store.profiles(&user_ids).await?;
        let meals = self.store.billable_meals(&period, Some(&user_ids)).await?;
        let meal_ids: Vec<Uuid> = meals.iter().map(|m| m.id).collect();
        let payments = self.store.meal_payments_for(&meal_ids).await?;

        let owner: HashMap<Uuid, Uuid> = meals.iter().map(|m| (m.id, m.user_id)).collect();
        let mut paid_by_user: HashMap<Uuid, Decimal> = HashMap::new();
        for p in &payments {
            if let Some(user_id) = owner.get(&p.poll_response_id) {
                *paid_by_user.entry(*user_id).or_default() += p.amount;
            }
        }
        let profiles: HashMap<Uuid, _> = profiles.iter().map(|p| (p.id, p)).collect();

        Ok(bills
            .iter()
            .map(|bill| {
                let paid = paid_by_user
                    .get(&bill.user_id)
                    .copied()
                    .unwrap_or_default();
                enrich(bill, profiles.get(&bill.user_id).copied(), paid)
            })
            .collect())
    }

    /// Every bill of one user, newest period first
    pub async fn user_bills(&self, user_id: Uuid) -> ServiceResult<Vec<EnrichedBill>> {
        let bills = self.store.bills_for_user(user_id).await?;
        if bills.is_empty() {
            return Ok(Vec::new());
        }
        let profiles = self.store.profiles(&[user_id]).await?;
        let profile = profiles.first();

        let mut enriched = Vec::with_capacity(bills.len());
        for bill in &bills {
            let period = BillingPeriod::new(bill.month, bill.year)?;
            let paid = self.paid_for(user_id, &period).await?;

            let recorded: Decimal = self
                .store
                .payments_for_bill(bill.id)
                .await?
                .iter()
                .map(|p| p.amount)
                .sum();
            if recorded != paid {
                tracing::debug!(
                    bill_id = %bill.id,
                    recorded = %recorded,
                    allocated = %paid,
                    "Payment records and meal payments differ"
                );
            }

            enriched.push(enrich(bill, profile, paid));
        }
        Ok(enriched)
    }

    pub async fn user_bill(
        &self,
        user_id: Uuid,
        period: BillingPeriod,
    ) -> ServiceResult<Option<EnrichedBill>> {
        let Some(bill) = self.store.bill_for_user(user_id, &period).await? else {
            return Ok(None);
        };
        let profiles = self.store.profiles(&[user_id]).await?;
        let paid = self.paid_for(user_id, &period).await?;
        Ok(Some(enrich(&bill, profiles.first(), paid)))
    }

    pub async fn payment_history(
        &self,
        user_id: Uuid,
        period: BillingPeriod,
    ) -> ServiceResult<Vec<MealPayment>> {
        Ok(self.store.meal_payments_for_user(user_id, &period).await?)
    }

    async fn paid_for(&self, user_id: Uuid, period: &BillingPeriod) -> ServiceResult<Decimal> {
        let meals = self
            .store
            .billable_meals(period, Some(std::slice::from_ref(&user_id)))
            .await?;
        let ids: Vec<Uuid> = meals.iter().map(|m| m.id).collect();
        let payments = self.store.meal_payments_for(&ids).await?;
        Ok(paid_amount(&meals, &payments))
    }

    async fn unpaid_meals(
        &self,
        user_id: Uuid,
        period: &BillingPeriod,
    ) -> ServiceResult<Vec<BillableMeal>> {
        let meals = self
            .store
            .billable_meals(period, Some(std::slice::from_ref(&user_id)))
            .await?;
        let ids: Vec<Uuid> = meals.iter().map(|m| m.id).collect();
        let paid: HashSet<Uuid> = self
            .store
            .meal_payments_for(&ids)
            .await?
            .into_iter()
            .map(|p| p.poll_response_id)
            .collect();
        Ok(meals.into_iter().filter(|m| !paid.contains(&m.id)).collect())
    }
}

fn meal_payments(cmd: &RecordPayment, allocation: &Allocation, now: i64) -> Vec<MealPayment> {
    let payment_date = today();
    allocation
        .meals
        .iter()
        .map(|m| MealPayment {
            id: Uuid::new_v4(),
            poll_response_id: m.meal.id,
            user_id: cmd.user_id,
            amount: m.price,
            payment_date,
            payment_method: cmd.payment_method,
            recorded_by: cmd.recorded_by,
            notes: cmd.notes.clone(),
            created_at: now,
        })
        .collect()
}
