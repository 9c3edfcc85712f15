//! Input validation for payment recording

use rust_decimal::Decimal;
use shared::error::{AppError, AppResult, ErrorCode};
use shared::models::PaymentMethod;

use super::pricing::{MONEY_DECIMAL_PLACES, is_money_scale};

/// Notes on a payment
pub const MAX_NOTE_LEN: usize = 500;

/// Upper bound for a single payment (₹)
pub const MAX_PAYMENT_AMOUNT: Decimal = Decimal::from_parts(1_000_000, 0, 0, false, 0);

pub fn validate_amount(amount: Option<Decimal>) -> AppResult<Decimal> {
    let amount = amount.ok_or_else(|| AppError::required("amount"))?;
    if amount <= Decimal::ZERO {
        return Err(AppError::with_message(
            ErrorCode::PaymentInvalidAmount,
            "amount must be greater than zero",
        )
        .with_detail("field", "amount"));
    }
    if !is_money_scale(amount) {
        return Err(AppError::with_message(
            ErrorCode::PaymentInvalidAmount,
            format!("amount must have at most {MONEY_DECIMAL_PLACES} decimal places"),
        )
        .with_detail("field", "amount"));
    }
    if amount > MAX_PAYMENT_AMOUNT {
        return Err(AppError::with_message(
            ErrorCode::ValueOutOfRange,
            format!("amount must not exceed {MAX_PAYMENT_AMOUNT}"),
        )
        .with_detail("field", "amount"));
    }
    Ok(amount)
}

pub fn validate_payment_method(method: Option<&str>) -> AppResult<PaymentMethod> {
    let raw = method.ok_or_else(|| AppError::required("paymentMethod"))?;
    PaymentMethod::parse(raw).ok_or_else(|| {
        AppError::with_message(
            ErrorCode::PaymentInvalidMethod,
            format!("unsupported payment method '{raw}', expected cash, upi or card"),
        )
        .with_detail("field", "paymentMethod")
    })
}

/// Blank notes collapse to `None`
pub fn validate_notes(notes: Option<String>) -> AppResult<Option<String>> {
    let Some(notes) = notes else {
        return Ok(None);
    };
    let trimmed = notes.trim();
    if trimmed.is_empty() {
        return Ok(None);
    }
    let len = trimmed.chars().count();
    if len > MAX_NOTE_LEN {
        return Err(AppError::validation(format!(
            "notes is too long ({len} chars, max {MAX_NOTE_LEN})"
        ))
        .with_detail("field", "notes"));
    }
    Ok(Some(trimmed.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn amount_bounds() {
        assert_eq!(validate_amount(Some(dec!(200))).unwrap(), dec!(200));
        assert_eq!(
            validate_amount(None).unwrap_err().code,
            ErrorCode::RequiredField
        );
        assert_eq!(
            validate_amount(Some(dec!(0))).unwrap_err().code,
            ErrorCode::PaymentInvalidAmount
        );
        assert_eq!(
            validate_amount(Some(dec!(-5))).unwrap_err().code,
            ErrorCode::PaymentInvalidAmount
        );
        assert_eq!(
            validate_amount(Some(dec!(1000000.01))).unwrap_err().code,
            ErrorCode::ValueOutOfRange
        );
        assert!(validate_amount(Some(dec!(1000000))).is_ok());
    }

    #[test]
    fn amount_limited_to_two_decimal_places() {
        assert_eq!(
            validate_amount(Some(dec!(104.995))).unwrap_err().code,
            ErrorCode::PaymentInvalidAmount
        );
        assert_eq!(validate_amount(Some(dec!(104.99))).unwrap(), dec!(104.99));
        assert_eq!(validate_amount(Some(dec!(105.000))).unwrap(), dec!(105));
    }

    #[test]
    fn payment_methods() {
        assert_eq!(validate_payment_method(Some("UPI")).unwrap(), PaymentMethod::Upi);
        assert_eq!(
            validate_payment_method(Some("cheque")).unwrap_err().code,
            ErrorCode::PaymentInvalidMethod
        );
        assert_eq!(
            validate_payment_method(None).unwrap_err().code,
            ErrorCode::RequiredField
        );
    }

    #[test]
    fn notes_are_trimmed_and_bounded() {
        assert_eq!(validate_notes(None).unwrap(), None);
        assert_eq!(validate_notes(Some("   ".into())).unwrap(), None);
        assert_eq!(
            validate_notes(Some(" paid at counter ".into())).unwrap().as_deref(),
            Some("paid at counter")
        );
        let long = "x".repeat(MAX_NOTE_LEN + 1);
        assert_eq!(
            validate_notes(Some(long)).unwrap_err().code,
            ErrorCode::ValidationFailed
        );
    }
}
