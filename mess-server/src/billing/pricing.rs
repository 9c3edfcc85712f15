//! Meal tier pricing
//!
//! Prices come from configuration and are handed to the calculator and the
//! allocator explicitly, so a new price list only needs a config change.

use rust_decimal::Decimal;
use shared::models::PortionSize;
use thiserror::Error;

/// Default price of a half meal (₹)
pub const DEFAULT_HALF_PRICE: Decimal = Decimal::from_parts(45, 0, 0, false, 0);
/// Default price of a full meal (₹)
pub const DEFAULT_FULL_PRICE: Decimal = Decimal::from_parts(60, 0, 0, false, 0);

/// Money is stored as `NUMERIC(12,2)`
pub const MONEY_DECIMAL_PLACES: u32 = 2;

/// True when `amount` fits the stored money scale without rounding
pub fn is_money_scale(amount: Decimal) -> bool {
    amount.normalize().scale() <= MONEY_DECIMAL_PLACES
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum PricingError {
    #[error("{tier} meal price must be positive, got {price}")]
    NonPositive { tier: &'static str, price: Decimal },
    #[error("{tier} meal price must have at most {MONEY_DECIMAL_PLACES} decimal places, got {price}")]
    TooPrecise { tier: &'static str, price: Decimal },
}

/// Price per portion tier
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MealPricing {
    half: Decimal,
    full: Decimal,
}

impl Default for MealPricing {
    fn default() -> Self {
        Self {
            half: DEFAULT_HALF_PRICE,
            full: DEFAULT_FULL_PRICE,
        }
    }
}

impl MealPricing {
    pub fn new(half: Decimal, full: Decimal) -> Result<Self, PricingError> {
        Ok(Self {
            half: check_tier("half", half)?,
            full: check_tier("full", full)?,
        })
    }

    pub fn half(&self) -> Decimal {
        self.half
    }

    pub fn full(&self) -> Decimal {
        self.full
    }

    /// Tier price of one meal
    pub fn price_of(&self, portion: PortionSize) -> Decimal {
        match portion {
            PortionSize::Half => self.half,
            PortionSize::Full => self.full,
        }
    }

    /// Cheapest tier; below this no further meal can be paid
    pub fn min_price(&self) -> Decimal {
        self.half.min(self.full)
    }
}

fn check_tier(tier: &'static str, price: Decimal) -> Result<Decimal, PricingError> {
    if price <= Decimal::ZERO {
        return Err(PricingError::NonPositive { tier, price });
    }
    if !is_money_scale(price) {
        return Err(PricingError::TooPrecise { tier, price });
    }
    Ok(price)
}
