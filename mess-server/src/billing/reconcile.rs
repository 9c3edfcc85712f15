//! Bill reconciliation
//!
//! The stored `due_amount`/`status` on a bill are snapshots from generation
//! time. What callers see is re-derived from per-meal payments against the
//! meals that are billable in the bill's period.

use std::collections::HashSet;

use rust_decimal::Decimal;
use shared::models::{BillStatus, BillableMeal, EnrichedBill, MealPayment, MonthlyBill, UserProfile};
use uuid::Uuid;

/// Sum of per-meal payments that land on one of `meals`
pub fn paid_amount(meals: &[BillableMeal], payments: &[MealPayment]) -> Decimal {
    let ids: HashSet<Uuid> = meals.iter().map(|m| m.id).collect();
    payments
        .iter()
        .filter(|p| ids.contains(&p.poll_response_id))
        .map(|p| p.amount)
        .sum()
}

/// Outstanding amount, floored at zero
pub fn due_amount(total_amount: Decimal, paid_amount: Decimal) -> Decimal {
    (total_amount - paid_amount).max(Decimal::ZERO)
}

/// Attach profile data and the derived paid/due/status to a stored bill
pub fn enrich(bill: &MonthlyBill, profile: Option<&UserProfile>, paid: Decimal) -> EnrichedBill {
    EnrichedBill {
        id: bill.id,
        user_id: bill.user_id,
        user_name: profile.and_then(|p| p.full_name.clone()),
        user_email: profile.and_then(|p| p.email.clone()),
        month: bill.month,
        year: bill.year,
        half_meal_count: bill.half_meal_count,
        full_meal_count: bill.full_meal_count,
        half_meal_cost: bill.half_meal_cost,
        full_meal_cost: bill.full_meal_cost,
        total_amount: bill.total_amount,
        paid_amount: paid,
        due_amount: due_amount(bill.total_amount, paid),
        status: BillStatus::derive(paid, bill.total_amount),
        created_at: bill.created_at,
        updated_at: bill.updated_at,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use rust_decimal_macros::dec;
    use shared::models::{PaymentMethod, PortionSize};

    fn bill(total: Decimal) -> MonthlyBill {
        MonthlyBill {
            id: Uuid::new_v4(),
            user_id: Uuid::new_v4(),
            month: 3,
            year: 2025,
            half_meal_count: 0,
            full_meal_count: 5,
            half_meal_cost: dec!(0),
            full_meal_cost: total,
            total_amount: total,
            due_amount: total,
            status: BillStatus::Pending,
            created_at: 0,
            updated_at: 0,
        }
    }

    fn meal() -> BillableMeal {
        BillableMeal {
            id: Uuid::new_v4(),
            user_id: Uuid::nil(),
            date: NaiveDate::from_ymd_opt(2025, 3, 1).unwrap(),
            portion_size: PortionSize::Full,
        }
    }

    fn payment_for(meal: &BillableMeal, amount: Decimal) -> MealPayment {
        MealPayment {
            id: Uuid::new_v4(),
            poll_response_id: meal.id,
            user_id: meal.user_id,
            amount,
            payment_date: meal.date,
            payment_method: PaymentMethod::Cash,
            recorded_by: Uuid::nil(),
            notes: None,
            created_at: 0,
        }
    }

    #[test]
    fn status_boundaries() {
        let b = bill(dec!(300));
        assert_eq!(enrich(&b, None, dec!(300)).status, BillStatus::Paid);
        assert_eq!(enrich(&b, None, dec!(150)).status, BillStatus::Partial);
        assert_eq!(enrich(&b, None, dec!(0)).status, BillStatus::Pending);
    }

    #[test]
    fn due_never_negative() {
        let enriched = enrich(&bill(dec!(300)), None, dec!(360));
        assert_eq!(enriched.due_amount, dec!(0));
        assert_eq!(enriched.status, BillStatus::Paid);
        assert_eq!(due_amount(dec!(270), dec!(165)), dec!(105));
    }

    #[test]
    fn only_payments_for_listed_meals_count() {
        let m1 = meal();
        let m2 = meal();
        let elsewhere = meal();
        let payments = vec![
            payment_for(&m1, dec!(60)),
            payment_for(&elsewhere, dec!(60)),
        ];
        assert_eq!(paid_amount(&[m1, m2], &payments), dec!(60));
    }

    #[test]
    fn profile_fields_are_attached() {
        let b = bill(dec!(120));
        let profile = UserProfile {
            id: b.user_id,
            full_name: Some("Ravi".into()),
            email: None,
        };
        let enriched = enrich(&b, Some(&profile), dec!(0));
        assert_eq!(enriched.user_name.as_deref(), Some("Ravi"));
        assert!(enriched.user_email.is_none());
        assert_eq!(enriched.due_amount, dec!(120));
    }
}
