//! In-memory store
//!
//! Same semantics as the PostgreSQL store, held behind one `RwLock` so a
//! commit is all-or-nothing. Attendance and profile rows belong to other
//! subsystems; the `insert_*` helpers stand in for them.

use std::collections::{HashMap, HashSet};

use async_trait::async_trait;
use shared::models::{
    BillLine, BillStatus, BillableMeal, MealAttendanceRecord, MealPayment, MonthlyBill,
    PaymentRecord, UserProfile,
};
use shared::util::now_millis;
use tokio::sync::RwLock;
use uuid::Uuid;

use super::{BillingStore, StoreError, StoreResult};
use crate::billing::BillingPeriod;

#[derive(Debug, Default)]
struct Tables {
    attendance: Vec<MealAttendanceRecord>,
    profiles: HashMap<Uuid, UserProfile>,
    bills: Vec<MonthlyBill>,
    payment_records: Vec<PaymentRecord>,
    meal_payments: Vec<MealPayment>,
}

impl Tables {
    fn billable_in(&self, period: &BillingPeriod) -> impl Iterator<Item = BillableMeal> + '_ {
        let period = *period;
        self.attendance
            .iter()
            .filter(move |r| period.contains(r.date))
            .filter_map(MealAttendanceRecord::to_billable)
    }
}

#[derive(Debug, Default)]
pub struct MemoryBillingStore {
    tables: RwLock<Tables>,
}

impl MemoryBillingStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn insert_attendance(&self, record: MealAttendanceRecord) {
        self.tables.write().await.attendance.push(record);
    }

    pub async fn insert_profile(&self, profile: UserProfile) {
        self.tables
            .write()
            .await
            .profiles
            .insert(profile.id, profile);
    }
}

fn sort_meals(meals: &mut [BillableMeal]) {
    meals.sort_by(|a, b| a.date.cmp(&b.date).then_with(|| a.id.cmp(&b.id)));
}

#[async_trait]
impl BillingStore for MemoryBillingStore {
    async fn billable_meals(
        &self,
        period: &BillingPeriod,
        user_ids: Option<&[Uuid]>,
    ) -> StoreResult<Vec<BillableMeal>> {
        let tables = self.tables.read().await;
        let mut meals: Vec<BillableMeal> = tables
            .billable_in(period)
            .filter(|m| user_ids.is_none_or(|ids| ids.contains(&m.user_id)))
            .collect();
        sort_meals(&mut meals);
        Ok(meals)
    }

    async fn profiles(&self, user_ids: &[Uuid]) -> StoreResult<Vec<UserProfile>> {
        let tables = self.tables.read().await;
        Ok(user_ids
            .iter()
            .filter_map(|id| tables.profiles.get(id).cloned())
            .collect())
    }

    async fn upsert_bills(
        &self,
        period: &BillingPeriod,
        lines: &[BillLine],
    ) -> StoreResult<Vec<MonthlyBill>> {
        let mut tables = self.tables.write().await;
        let now = now_millis();
        let mut saved = Vec::with_capacity(lines.len());

        for line in lines {
            let existing = tables.bills.iter().position(|b| {
                b.user_id == line.user_id && b.month == period.month() && b.year == period.year()
            });
            let bill = match existing {
                Some(idx) => {
                    let bill = &mut tables.bills[idx];
                    bill.half_meal_count = line.half_meal_count;
                    bill.full_meal_count = line.full_meal_count;
                    bill.half_meal_cost = line.half_meal_cost;
                    bill.full_meal_cost = line.full_meal_cost;
                    bill.total_amount = line.total_amount;
                    bill.due_amount = line.total_amount;
                    bill.status = BillStatus::Pending;
                    bill.updated_at = now;
                    bill.clone()
                }
                None => {
                    let bill = MonthlyBill {
                        id: Uuid::new_v4(),
                        user_id: line.user_id,
                        month: period.month(),
                        year: period.year(),
                        half_meal_count: line.half_meal_count,
                        full_meal_count: line.full_meal_count,
                        half_meal_cost: line.half_meal_cost,
                        full_meal_cost: line.full_meal_cost,
                        total_amount: line.total_amount,
                        due_amount: line.total_amount,
                        status: BillStatus::Pending,
                        created_at: now,
                        updated_at: now,
                    };
                    tables.bills.push(bill.clone());
                    bill
                }
            };
            saved.push(bill);
        }

        Ok(saved)
    }

    async fn bills_for_period(&self, period: &BillingPeriod) -> StoreResult<Vec<MonthlyBill>> {
        let tables = self.tables.read().await;
        let mut bills: Vec<MonthlyBill> = tables
            .bills
            .iter()
            .filter(|b| b.month == period.month() && b.year == period.year())
            .cloned()
            .collect();
        bills.sort_by_key(|b| b.user_id);
        Ok(bills)
    }

    async fn bills_for_user(&self, user_id: Uuid) -> StoreResult<Vec<MonthlyBill>> {
        let tables = self.tables.read().await;
        let mut bills: Vec<MonthlyBill> = tables
            .bills
            .iter()
            .filter(|b| b.user_id == user_id)
            .cloned()
            .collect();
        bills.sort_by(|a, b| (b.year, b.month).cmp(&(a.year, a.month)));
        Ok(bills)
    }

    async fn bill_for_user(
        &self,
        user_id: Uuid,
        period: &BillingPeriod,
    ) -> StoreResult<Option<MonthlyBill>> {
        let tables = self.tables.read().await;
        Ok(tables
            .bills
            .iter()
            .find(|b| b.user_id == user_id && b.month == period.month() && b.year == period.year())
            .cloned())
    }

    async fn meal_payments_for(&self, meal_ids: &[Uuid]) -> StoreResult<Vec<MealPayment>> {
        let wanted: HashSet<&Uuid> = meal_ids.iter().collect();
        let tables = self.tables.read().await;
        Ok(tables
            .meal_payments
            .iter()
            .filter(|p| wanted.contains(&p.poll_response_id))
            .cloned()
            .collect())
    }

    async fn commit_payment(
        &self,
        payment: &PaymentRecord,
        meal_payments: &[MealPayment],
    ) -> StoreResult<()> {
        let mut tables = self.tables.write().await;

        if !tables.bills.iter().any(|b| b.id == payment.bill_id) {
            return Err(StoreError::NotFound(format!("bill {}", payment.bill_id)));
        }

        let mut taken: HashSet<Uuid> = tables
            .meal_payments
            .iter()
            .map(|p| p.poll_response_id)
            .collect();
        for mp in meal_payments {
            if !taken.insert(mp.poll_response_id) {
                return Err(StoreError::Conflict(format!(
                    "poll response {} is already paid",
                    mp.poll_response_id
                )));
            }
        }

        tables.payment_records.push(payment.clone());
        tables.meal_payments.extend_from_slice(meal_payments);
        Ok(())
    }

    async fn payments_for_bill(&self, bill_id: Uuid) -> StoreResult<Vec<PaymentRecord>> {
        let tables = self.tables.read().await;
        Ok(tables
            .payment_records
            .iter()
            .filter(|p| p.bill_id == bill_id)
            .cloned()
            .collect())
    }

    async fn meal_payments_for_user(
        &self,
        user_id: Uuid,
        period: &BillingPeriod,
    ) -> StoreResult<Vec<MealPayment>> {
        let tables = self.tables.read().await;
        let meal_dates: HashMap<Uuid, _> = tables
            .attendance
            .iter()
            .filter(|r| r.user_id == user_id && period.contains(r.date))
            .map(|r| (r.id, r.date))
            .collect();

        let mut payments: Vec<_> = tables
            .meal_payments
            .iter()
            .filter_map(|p| meal_dates.get(&p.poll_response_id).map(|d| (*d, p.clone())))
            .collect();
        payments.sort_by(|(da, a), (db, b)| {
            da.cmp(db)
                .then_with(|| a.created_at.cmp(&b.created_at))
        });
        Ok(payments.into_iter().map(|(_, p)| p).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use rust_decimal_macros::dec;
    use shared::models::{CONFIRMED_ATTENDED, PaymentMethod, PortionSize};

    fn attendance(user_id: Uuid, day: u32, present: bool, status: &str) -> MealAttendanceRecord {
        MealAttendanceRecord {
            id: Uuid::new_v4(),
            user_id,
            date: NaiveDate::from_ymd_opt(2025, 3, day).unwrap(),
            portion_size: PortionSize::Full,
            present,
            confirmation_status: status.to_string(),
        }
    }

    fn line(user_id: Uuid, total: rust_decimal::Decimal) -> BillLine {
        BillLine {
            user_id,
            user_name: None,
            user_email: None,
            half_meal_count: 0,
            full_meal_count: 1,
            half_meal_cost: dec!(0),
            full_meal_cost: total,
            total_amount: total,
        }
    }

    fn meal_payment(poll_response_id: Uuid) -> MealPayment {
        MealPayment {
            id: Uuid::new_v4(),
            poll_response_id,
            user_id: Uuid::nil(),
            amount: dec!(60),
            payment_date: NaiveDate::from_ymd_opt(2025, 3, 31).unwrap(),
            payment_method: PaymentMethod::Cash,
            recorded_by: Uuid::nil(),
            notes: None,
            created_at: 0,
        }
    }

    fn record(bill_id: Uuid) -> PaymentRecord {
        PaymentRecord {
            id: Uuid::new_v4(),
            bill_id,
            user_id: Uuid::nil(),
            amount: dec!(60),
            payment_method: PaymentMethod::Cash,
            notes: None,
            recorded_by: Uuid::nil(),
            created_at: 0,
        }
    }

    #[tokio::test]
    async fn billable_filter_and_order() {
        let store = MemoryBillingStore::new();
        let user = Uuid::new_v4();
        store
            .insert_attendance(attendance(user, 9, true, CONFIRMED_ATTENDED))
            .await;
        store
            .insert_attendance(attendance(user, 2, true, CONFIRMED_ATTENDED))
            .await;
        store
            .insert_attendance(attendance(user, 3, false, CONFIRMED_ATTENDED))
            .await;
        store.insert_attendance(attendance(user, 4, true, "pending")).await;

        let period = BillingPeriod::new(3, 2025).unwrap();
        let meals = store.billable_meals(&period, None).await.unwrap();
        let days: Vec<u32> = meals.iter().map(|m| chrono::Datelike::day(&m.date)).collect();
        assert_eq!(days, vec![2, 9]);

        let other = store
            .billable_meals(&period, Some(&[Uuid::new_v4()]))
            .await
            .unwrap();
        assert!(other.is_empty());
    }

    #[tokio::test]
    async fn upsert_overwrites_totals_in_place() {
        let store = MemoryBillingStore::new();
        let period = BillingPeriod::new(3, 2025).unwrap();
        let user = Uuid::new_v4();

        let first = store.upsert_bills(&period, &[line(user, dec!(60))]).await.unwrap();
        let second = store.upsert_bills(&period, &[line(user, dec!(120))]).await.unwrap();

        assert_eq!(first[0].id, second[0].id);
        assert_eq!(second[0].total_amount, dec!(120));
        assert_eq!(second[0].due_amount, dec!(120));
        assert_eq!(store.bills_for_period(&period).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn commit_rejects_already_paid_meal() {
        let store = MemoryBillingStore::new();
        let period = BillingPeriod::new(3, 2025).unwrap();
        let bill = store
            .upsert_bills(&period, &[line(Uuid::new_v4(), dec!(60))])
            .await
            .unwrap()
            .remove(0);
        let meal_id = Uuid::new_v4();

        store
            .commit_payment(&record(bill.id), &[meal_payment(meal_id)])
            .await
            .unwrap();
        let err = store
            .commit_payment(&record(bill.id), &[meal_payment(meal_id)])
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::Conflict(_)));

        // The rejected commit wrote neither ledger
        assert_eq!(store.payments_for_bill(bill.id).await.unwrap().len(), 1);
        assert_eq!(store.meal_payments_for(&[meal_id]).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn commit_requires_existing_bill() {
        let store = MemoryBillingStore::new();
        let err = store
            .commit_payment(&record(Uuid::new_v4()), &[])
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::NotFound(_)));
    }
}
