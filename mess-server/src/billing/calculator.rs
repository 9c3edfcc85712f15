//! Bill calculator
//!
//! Folds billable meals into one [`BillLine`] per user. Pure: the caller
//! fetches meals and profiles, this module only counts and prices them.

use std::collections::{BTreeMap, HashMap};

use rust_decimal::Decimal;
use shared::models::{BillLine, BillableMeal, BillingSummary, PortionSize, UserProfile};
use uuid::Uuid;

use super::pricing::MealPricing;

#[derive(Debug, Default, Clone, Copy)]
struct Tally {
    half: i64,
    full: i64,
}

/// Count meals per user and tier
///
/// Users are keyed in a `BTreeMap` so output order is stable across runs.
fn tally(meals: &[BillableMeal]) -> BTreeMap<Uuid, Tally> {
    let mut by_user: BTreeMap<Uuid, Tally> = BTreeMap::new();
    for meal in meals {
        let entry = by_user.entry(meal.user_id).or_default();
        match meal.portion_size {
            PortionSize::Half => entry.half += 1,
            PortionSize::Full => entry.full += 1,
        }
    }
    by_user
}

/// Price one user's counts into a bill line
pub fn price_line(
    user_id: Uuid,
    half_meal_count: i64,
    full_meal_count: i64,
    pricing: &MealPricing,
) -> BillLine {
    let half_meal_cost = pricing.half() * Decimal::from(half_meal_count);
    let full_meal_cost = pricing.full() * Decimal::from(full_meal_count);
    BillLine {
        user_id,
        user_name: None,
        user_email: None,
        half_meal_count,
        full_meal_count,
        half_meal_cost,
        full_meal_cost,
        total_amount: half_meal_cost + full_meal_cost,
    }
}

/// Build one bill line per user with at least one billable meal
///
/// `profiles` only decorates lines with name/email; a missing profile
/// leaves both empty rather than dropping the line.
pub fn calculate(
    meals: &[BillableMeal],
    profiles: &[UserProfile],
    pricing: &MealPricing,
) -> Vec<BillLine> {
    let profiles: HashMap<Uuid, &UserProfile> = profiles.iter().map(|p| (p.id, p)).collect();

    tally(meals)
        .into_iter()
        .map(|(user_id, t)| {
            let mut line = price_line(user_id, t.half, t.full, pricing);
            if let Some(profile) = profiles.get(&user_id) {
                line.user_name = profile.full_name.clone();
                line.user_email = profile.email.clone();
            }
            line
        })
        .collect()
}

/// Distinct users that appear in `meals`, sorted
pub fn billed_users(meals: &[BillableMeal]) -> Vec<Uuid> {
    let mut ids: Vec<Uuid> = meals.iter().map(|m| m.user_id).collect();
    ids.sort_unstable();
    ids.dedup();
    ids
}

pub fn summarize(lines: &[BillLine]) -> BillingSummary {
    lines.iter().fold(
        BillingSummary {
            total_users: lines.len(),
            ..Default::default()
        },
        |mut acc, line| {
            acc.total_half_meals += line.half_meal_count;
            acc.total_full_meals += line.full_meal_count;
            acc.total_amount += line.total_amount;
            acc
        },
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use rust_decimal_macros::dec;

    fn meal(user_id: Uuid, day: u32, portion_size: PortionSize) -> BillableMeal {
        BillableMeal {
            id: Uuid::new_v4(),
            user_id,
            date: NaiveDate::from_ymd_opt(2025, 3, day).unwrap(),
            portion_size,
        }
    }

    #[test]
    fn totals_follow_tier_prices() {
        let pricing = MealPricing::default();
        for (half, full) in [(0, 0), (1, 0), (0, 1), (2, 3), (31, 31), (17, 4)] {
            let line = price_line(Uuid::nil(), half, full, &pricing);
            assert_eq!(
                line.total_amount,
                Decimal::from(half) * dec!(45) + Decimal::from(full) * dec!(60)
            );
            assert_eq!(line.total_amount, line.half_meal_cost + line.full_meal_cost);
        }
    }

    #[test]
    fn groups_by_user_and_tier() {
        let alice = Uuid::new_v4();
        let bob = Uuid::new_v4();
        let meals = vec![
            meal(alice, 1, PortionSize::Full),
            meal(alice, 2, PortionSize::Full),
            meal(alice, 3, PortionSize::Full),
            meal(alice, 4, PortionSize::Half),
            meal(alice, 5, PortionSize::Half),
            meal(bob, 1, PortionSize::Half),
        ];
        let profiles = vec![UserProfile {
            id: alice,
            full_name: Some("Alice".into()),
            email: Some("alice@example.com".into()),
        }];

        let lines = calculate(&meals, &profiles, &MealPricing::default());
        assert_eq!(lines.len(), 2);

        let a = lines.iter().find(|l| l.user_id == alice).unwrap();
        assert_eq!(a.half_meal_count, 2);
        assert_eq!(a.full_meal_count, 3);
        assert_eq!(a.half_meal_cost, dec!(90));
        assert_eq!(a.full_meal_cost, dec!(180));
        assert_eq!(a.total_amount, dec!(270));
        assert_eq!(a.user_name.as_deref(), Some("Alice"));

        let b = lines.iter().find(|l| l.user_id == bob).unwrap();
        assert_eq!(b.total_amount, dec!(45));
        assert!(b.user_name.is_none());
        assert!(b.user_email.is_none());
    }

    #[test]
    fn no_meals_no_lines() {
        assert!(calculate(&[], &[], &MealPricing::default()).is_empty());
        assert_eq!(summarize(&[]), BillingSummary::default());
    }

    #[test]
    fn repeated_runs_are_identical() {
        let users: Vec<Uuid> = (0..5).map(|_| Uuid::new_v4()).collect();
        let meals: Vec<BillableMeal> = users
            .iter()
            .enumerate()
            .flat_map(|(i, u)| {
                (1..=(i as u32 + 2)).map(move |d| {
                    let portion = if d % 2 == 0 {
                        PortionSize::Half
                    } else {
                        PortionSize::Full
                    };
                    meal(*u, d, portion)
                })
            })
            .collect();

        let pricing = MealPricing::default();
        assert_eq!(
            calculate(&meals, &[], &pricing),
            calculate(&meals, &[], &pricing)
        );
    }

    #[test]
    fn custom_pricing_is_applied() {
        let user = Uuid::new_v4();
        let meals = vec![meal(user, 1, PortionSize::Half), meal(user, 2, PortionSize::Full)];
        let pricing = MealPricing::new(dec!(50), dec!(70)).unwrap();
        let lines = calculate(&meals, &[], &pricing);
        assert_eq!(lines[0].total_amount, dec!(120));
    }

    #[test]
    fn summary_adds_up_lines() {
        let pricing = MealPricing::default();
        let lines = vec![
            price_line(Uuid::new_v4(), 2, 3, &pricing),
            price_line(Uuid::new_v4(), 1, 0, &pricing),
        ];
        let summary = summarize(&lines);
        assert_eq!(summary.total_users, 2);
        assert_eq!(summary.total_half_meals, 3);
        assert_eq!(summary.total_full_meals, 3);
        assert_eq!(summary.total_amount, dec!(315));
    }

    #[test]
    fn billed_users_are_distinct() {
        let user = Uuid::new_v4();
        let meals = vec![meal(user, 1, PortionSize::Half), meal(user, 2, PortionSize::Full)];
        assert_eq!(billed_users(&meals), vec![user]);
    }
}
