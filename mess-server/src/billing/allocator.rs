//! Payment allocator
//!
//! Spreads a payment across unpaid meals, oldest first. A meal is either
//! paid at its full tier price or left alone; no partial meal payments.

use rust_decimal::Decimal;
use shared::models::BillableMeal;

use super::pricing::MealPricing;

/// One meal the payment covers, with the tier price charged for it
#[derive(Debug, Clone, PartialEq)]
pub struct AllocatedMeal {
    pub meal: BillableMeal,
    pub price: Decimal,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Allocation {
    pub meals: Vec<AllocatedMeal>,
    pub allocated: Decimal,
    pub unallocated: Decimal,
}

/// Greedy oldest-first allocation
///
/// Walks `unpaid` by (date, id). A meal is taken when its tier price fits
/// in what is left; a meal that does not fit is skipped so a cheaper one
/// later can still be paid. The walk ends once the remainder is below the
/// cheapest tier.
pub fn allocate(unpaid: &[BillableMeal], amount: Decimal, pricing: &MealPricing) -> Allocation {
    let mut ordered: Vec<&BillableMeal> = unpaid.iter().collect();
    ordered.sort_by(|a, b| a.date.cmp(&b.date).then_with(|| a.id.cmp(&b.id)));

    let floor = pricing.min_price();
    let mut remaining = amount.max(Decimal::ZERO);
    let mut meals = Vec::new();

    for meal in ordered {
        if remaining < floor {
            break;
        }
        let price = pricing.price_of(meal.portion_size);
        if price <= remaining {
            remaining -= price;
            meals.push(AllocatedMeal {
                meal: meal.clone(),
                price,
            });
        }
    }

    Allocation {
        allocated: meals.iter().map(|m| m.price).sum(),
        unallocated: remaining,
        meals,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use rust_decimal_macros::dec;
    use shared::models::PortionSize;
    use uuid::Uuid;

    fn meal(day: u32, portion_size: PortionSize) -> BillableMeal {
        BillableMeal {
            id: Uuid::new_v4(),
            user_id: Uuid::nil(),
            date: NaiveDate::from_ymd_opt(2025, 3, day).unwrap(),
            portion_size,
        }
    }

    #[test]
    fn pays_oldest_first_and_leaves_remainder() {
        let d3 = meal(3, PortionSize::Full);
        let d1 = meal(1, PortionSize::Full);
        let d2 = meal(2, PortionSize::Full);
        let unpaid = vec![d3.clone(), d1.clone(), d2.clone()];

        let allocation = allocate(&unpaid, dec!(130), &MealPricing::default());

        let paid: Vec<_> = allocation.meals.iter().map(|m| m.meal.id).collect();
        assert_eq!(paid, vec![d1.id, d2.id]);
        assert_eq!(allocation.allocated, dec!(120));
        assert_eq!(allocation.unallocated, dec!(10));
    }

    #[test]
    fn skips_a_meal_that_does_not_fit() {
        // 105 covers the full meal, then 45 is left: the second full does
        // not fit but the later half meal does
        let first = meal(1, PortionSize::Full);
        let second = meal(2, PortionSize::Full);
        let third = meal(3, PortionSize::Half);
        let allocation = allocate(
            &[first.clone(), second.clone(), third.clone()],
            dec!(105),
            &MealPricing::default(),
        );

        let paid: Vec<_> = allocation.meals.iter().map(|m| m.meal.id).collect();
        assert_eq!(paid, vec![first.id, third.id]);
        assert_eq!(allocation.unallocated, dec!(0));
    }

    #[test]
    fn below_cheapest_tier_allocates_nothing() {
        let allocation = allocate(
            &[meal(1, PortionSize::Half)],
            dec!(44.99),
            &MealPricing::default(),
        );
        assert!(allocation.meals.is_empty());
        assert_eq!(allocation.allocated, dec!(0));
        assert_eq!(allocation.unallocated, dec!(44.99));
    }

    #[test]
    fn never_exceeds_available_meals() {
        let unpaid = vec![meal(1, PortionSize::Half), meal(2, PortionSize::Full)];
        let allocation = allocate(&unpaid, dec!(10000), &MealPricing::default());
        assert_eq!(allocation.meals.len(), 2);
        assert_eq!(allocation.allocated, dec!(105));
        assert_eq!(allocation.unallocated, dec!(9895));
    }

    #[test]
    fn charges_exact_tier_price() {
        let allocation = allocate(
            &[meal(1, PortionSize::Half), meal(2, PortionSize::Full)],
            dec!(200),
            &MealPricing::default(),
        );
        let prices: Vec<_> = allocation.meals.iter().map(|m| m.price).collect();
        assert_eq!(prices, vec![dec!(45), dec!(60)]);
    }

    #[test]
    fn mixed_month_scenario() {
        // Three fulls then two halves, paying 200
        let meals = vec![
            meal(3, PortionSize::Full),
            meal(5, PortionSize::Full),
            meal(7, PortionSize::Full),
            meal(10, PortionSize::Half),
            meal(12, PortionSize::Half),
        ];
        let allocation = allocate(&meals, dec!(200), &MealPricing::default());
        // 60 + 60 + 60 = 180, then 20 left
        assert_eq!(allocation.meals.len(), 3);
        assert_eq!(allocation.allocated, dec!(180));
        assert_eq!(allocation.unallocated, dec!(20));
    }
}
