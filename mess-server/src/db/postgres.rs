//! PostgreSQL store

use async_trait::async_trait;
use shared::models::{BillLine, BillableMeal, MealPayment, MonthlyBill, PaymentRecord, UserProfile};
use shared::util::now_millis;
use sqlx::PgPool;
use uuid::Uuid;

use super::{BillingStore, StoreError, StoreResult};
use crate::billing::BillingPeriod;

const FOREIGN_KEY_VIOLATION: &str = "23503";

const BILL_COLUMNS: &str = "id, user_id, month, year, half_meal_count, full_meal_count, \
     half_meal_cost, full_meal_cost, total_amount, due_amount, status, created_at, updated_at";

const MEAL_PAYMENT_COLUMNS: &str = "mp.id, mp.poll_response_id, mp.user_id, mp.amount, \
     mp.payment_date, mp.payment_method, mp.recorded_by, mp.notes, mp.created_at";

#[derive(Debug, Clone)]
pub struct PgBillingStore {
    pool: PgPool,
}

impl PgBillingStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Connect and bring the schema up to date
    pub async fn connect(database_url: &str) -> StoreResult<Self> {
        let pool = PgPool::connect(database_url).await?;
        sqlx::migrate!("./migrations")
            .run(&pool)
            .await
            .map_err(sqlx::Error::from)?;
        Ok(Self::new(pool))
    }
}

fn is_foreign_key_violation(err: &sqlx::Error) -> bool {
    err.as_database_error()
        .and_then(|e| e.code())
        .is_some_and(|code| code == FOREIGN_KEY_VIOLATION)
}

#[async_trait]
impl BillingStore for PgBillingStore {
    async fn billable_meals(
        &self,
        period: &BillingPeriod,
        user_ids: Option<&[Uuid]>,
    ) -> StoreResult<Vec<BillableMeal>> {
        let meals = sqlx::query_as::<_, BillableMeal>(
            r#"
            SELECT id, user_id, date, portion_size
            FROM poll_responses
            WHERE present
              AND confirmation_status = 'confirmed_attended'
              AND date BETWEEN $1 AND $2
              AND ($3::uuid[] IS NULL OR user_id = ANY($3))
            ORDER BY date ASC, id ASC
            "#,
        )
        .bind(period.first_day())
        .bind(period.last_day())
        .bind(user_ids.map(<[Uuid]>::to_vec))
        .fetch_all(&self.pool)
        .await?;
        Ok(meals)
    }

    async fn profiles(&self, user_ids: &[Uuid]) -> StoreResult<Vec<UserProfile>> {
        if user_ids.is_empty() {
            return Ok(Vec::new());
        }
        let profiles = sqlx::query_as::<_, UserProfile>(
            "SELECT id, full_name, email FROM profiles WHERE id = ANY($1)",
        )
        .bind(user_ids)
        .fetch_all(&self.pool)
        .await?;
        Ok(profiles)
    }

    async fn upsert_bills(
        &self,
        period: &BillingPeriod,
        lines: &[BillLine],
    ) -> StoreResult<Vec<MonthlyBill>> {
        let now = now_millis();
        let mut tx = self.pool.begin().await?;
        let mut saved = Vec::with_capacity(lines.len());

        for line in lines {
            let bill = sqlx::query_as::<_, MonthlyBill>(&format!(
                r#"
                INSERT INTO monthly_bills (
                    id, user_id, month, year,
                    half_meal_count, full_meal_count, half_meal_cost, full_meal_cost,
                    total_amount, due_amount, status, created_at, updated_at
                )
                VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $9, 'pending', $10, $10)
                ON CONFLICT (user_id, month, year)
                DO UPDATE SET half_meal_count = EXCLUDED.half_meal_count,
                              full_meal_count = EXCLUDED.full_meal_count,
                              half_meal_cost = EXCLUDED.half_meal_cost,
                              full_meal_cost = EXCLUDED.full_meal_cost,
                              total_amount = EXCLUDED.total_amount,
                              due_amount = EXCLUDED.total_amount,
                              status = 'pending',
                              updated_at = EXCLUDED.updated_at
                RETURNING {BILL_COLUMNS}
                "#
            ))
            .bind(Uuid::new_v4())
            .bind(line.user_id)
            .bind(period.month())
            .bind(period.year())
            .bind(line.half_meal_count)
            .bind(line.full_meal_count)
            .bind(line.half_meal_cost)
            .bind(line.full_meal_cost)
            .bind(line.total_amount)
            .bind(now)
            .fetch_one(&mut *tx)
            .await?;
            saved.push(bill);
        }

        tx.commit().await?;
        Ok(saved)
    }

    async fn bills_for_period(&self, period: &BillingPeriod) -> StoreResult<Vec<MonthlyBill>> {
        let bills = sqlx::query_as::<_, MonthlyBill>(&format!(
            "SELECT {BILL_COLUMNS} FROM monthly_bills WHERE month = $1 AND year = $2 ORDER BY user_id"
        ))
        .bind(period.month())
        .bind(period.year())
        .fetch_all(&self.pool)
        .await?;
        Ok(bills)
    }

    async fn bills_for_user(&self, user_id: Uuid) -> StoreResult<Vec<MonthlyBill>> {
        let bills = sqlx::query_as::<_, MonthlyBill>(&format!(
            "SELECT {BILL_COLUMNS} FROM monthly_bills WHERE user_id = $1 ORDER BY year DESC, month DESC"
        ))
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(bills)
    }

    async fn bill_for_user(
        &self,
        user_id: Uuid,
        period: &BillingPeriod,
    ) -> StoreResult<Option<MonthlyBill>> {
        let bill = sqlx::query_as::<_, MonthlyBill>(&format!(
            "SELECT {BILL_COLUMNS} FROM monthly_bills WHERE user_id = $1 AND month = $2 AND year = $3"
        ))
        .bind(user_id)
        .bind(period.month())
        .bind(period.year())
        .fetch_optional(&self.pool)
        .await?;
        Ok(bill)
    }

    async fn meal_payments_for(&self, meal_ids: &[Uuid]) -> StoreResult<Vec<MealPayment>> {
        if meal_ids.is_empty() {
            return Ok(Vec::new());
        }
        let payments = sqlx::query_as::<_, MealPayment>(&format!(
            "SELECT {MEAL_PAYMENT_COLUMNS} FROM meal_payments mp WHERE mp.poll_response_id = ANY($1)"
        ))
        .bind(meal_ids)
        .fetch_all(&self.pool)
        .await?;
        Ok(payments)
    }

    async fn commit_payment(
        &self,
        payment: &PaymentRecord,
        meal_payments: &[MealPayment],
    ) -> StoreResult<()> {
        let mut tx = self.pool.begin().await?;

        sqlx::query(
            r#"
            INSERT INTO payment_records (
                id, bill_id, user_id, amount, payment_method, notes, recorded_by, created_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            "#,
        )
        .bind(payment.id)
        .bind(payment.bill_id)
        .bind(payment.user_id)
        .bind(payment.amount)
        .bind(payment.payment_method)
        .bind(&payment.notes)
        .bind(payment.recorded_by)
        .bind(payment.created_at)
        .execute(&mut *tx)
        .await
        .map_err(|e| {
            if is_foreign_key_violation(&e) {
                StoreError::NotFound(format!("bill {}", payment.bill_id))
            } else {
                StoreError::Database(e)
            }
        })?;

        for mp in meal_payments {
            let inserted = sqlx::query(
                r#"
                INSERT INTO meal_payments (
                    id, poll_response_id, user_id, amount, payment_date,
                    payment_method, recorded_by, notes, created_at
                )
                VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
                ON CONFLICT (poll_response_id) DO NOTHING
                "#,
            )
            .bind(mp.id)
            .bind(mp.poll_response_id)
            .bind(mp.user_id)
            .bind(mp.amount)
            .bind(mp.payment_date)
            .bind(mp.payment_method)
            .bind(mp.recorded_by)
            .bind(&mp.notes)
            .bind(mp.created_at)
            .execute(&mut *tx)
            .await?
            .rows_affected();

            if inserted == 0 {
                // Dropping the transaction rolls back the payment record too
                return Err(StoreError::Conflict(format!(
                    "poll response {} is already paid",
                    mp.poll_response_id
                )));
            }
        }

        tx.commit().await?;
        Ok(())
    }

    async fn payments_for_bill(&self, bill_id: Uuid) -> StoreResult<Vec<PaymentRecord>> {
        let payments = sqlx::query_as::<_, PaymentRecord>(
            r#"
            SELECT id, bill_id, user_id, amount, payment_method, notes, recorded_by, created_at
            FROM payment_records
            WHERE bill_id = $1
            ORDER BY created_at ASC
            "#,
        )
        .bind(bill_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(payments)
    }

    async fn meal_payments_for_user(
        &self,
        user_id: Uuid,
        period: &BillingPeriod,
    ) -> StoreResult<Vec<MealPayment>> {
        let payments = sqlx::query_as::<_, MealPayment>(&format!(
            r#"
            SELECT {MEAL_PAYMENT_COLUMNS}
            FROM meal_payments mp
            JOIN poll_responses pr ON pr.id = mp.poll_response_id
            WHERE pr.user_id = $1
              AND pr.date BETWEEN $2 AND $3
            ORDER BY pr.date ASC, mp.created_at ASC
            "#
        ))
        .bind(user_id)
        .bind(period.first_day())
        .bind(period.last_day())
        .fetch_all(&self.pool)
        .await?;
        Ok(payments)
    }
}
