//! Billing API handlers

use axum::{
    Json,
    body::Bytes,
    extract::{Query, State, rejection::QueryRejection},
    response::{IntoResponse, Response},
};
use serde::de::DeserializeOwned;
use shared::error::AppError;
use shared::request::{BillingQuery, GenerateBillsRequest, RecordPaymentRequest};
use shared::response::{
    BillResponse, BillsResponse, CalculateBillsResponse, GenerateBillsResponse,
    PaymentHistoryResponse, RecordPaymentResponse,
};
use uuid::Uuid;

use crate::auth::CurrentUser;
use crate::billing::validation::{validate_amount, validate_notes, validate_payment_method};
use crate::billing::{BillingPeriod, RecordPayment};
use crate::error::ServiceResult;
use crate::state::AppState;

fn action(name: Option<&str>) -> Result<&str, AppError> {
    name.map(str::trim)
        .filter(|a| !a.is_empty())
        .ok_or_else(|| AppError::required("action"))
}

fn unknown_action(name: &str) -> AppError {
    AppError::invalid_request(format!("Unknown action '{name}'")).with_detail("action", name)
}

fn required_user(user_id: Option<Uuid>) -> Result<Uuid, AppError> {
    user_id.ok_or_else(|| AppError::required("userId"))
}

/// Empty body reads as `{}` so missing fields are reported by name
fn parse_body<T: DeserializeOwned>(body: &Bytes) -> Result<T, AppError> {
    let raw: &[u8] = if body.iter().all(u8::is_ascii_whitespace) {
        b"{}"
    } else {
        &body[..]
    };
    serde_json::from_slice(raw)
        .map_err(|e| AppError::validation(format!("Invalid request body: {e}")))
}

/// GET /api/billing?action=...
pub async fn query(
    user: CurrentUser,
    State(state): State<AppState>,
    query: Result<Query<BillingQuery>, QueryRejection>,
) -> ServiceResult<Response> {
    let Query(q) = query.map_err(|e| AppError::validation(e.body_text()))?;
    let billing = &state.billing;

    let response = match action(q.action.as_deref())? {
        "calculate-monthly" => {
            user.require_admin()?;
            let period = BillingPeriod::from_parts(q.month, q.year)?;
            let (bills, summary) = billing.calculate_monthly_bills(period).await?;
            Json(CalculateBillsResponse {
                bills,
                month: period.month(),
                year: period.year(),
                summary,
            })
            .into_response()
        }
        "get-all-bills" => {
            user.require_admin()?;
            let period = BillingPeriod::from_parts(q.month, q.year)?;
            let bills = billing.all_bills(period).await?;
            Json(BillsResponse { bills }).into_response()
        }
        "get-user-bills" => {
            let user_id = required_user(q.user_id)?;
            user.require_self_or_admin(user_id)?;
            let bills = billing.user_bills(user_id).await?;
            Json(BillsResponse { bills }).into_response()
        }
        "get-user-bill" => {
            let user_id = required_user(q.user_id)?;
            user.require_self_or_admin(user_id)?;
            let period = BillingPeriod::from_parts(q.month, q.year)?;
            let bill = billing.user_bill(user_id, period).await?;
            Json(BillResponse { bill }).into_response()
        }
        "get-payment-history" => {
            let user_id = required_user(q.user_id)?;
            user.require_self_or_admin(user_id)?;
            let period = BillingPeriod::from_parts(q.month, q.year)?;
            let payments = billing.payment_history(user_id, period).await?;
            Json(PaymentHistoryResponse { payments }).into_response()
        }
        other => return Err(unknown_action(other).into()),
    };

    Ok(response)
}

/// POST /api/billing?action=...
pub async fn command(
    user: CurrentUser,
    State(state): State<AppState>,
    query: Result<Query<BillingQuery>, QueryRejection>,
    body: Bytes,
) -> ServiceResult<Response> {
    let Query(q) = query.map_err(|e| AppError::validation(e.body_text()))?;
    let billing = &state.billing;

    let response = match action(q.action.as_deref())? {
        "generate-bills" => {
            user.require_admin()?;
            let req: GenerateBillsRequest = parse_body(&body)?;
            let period = BillingPeriod::from_parts(req.month, req.year)?;
            let bills = billing.generate_bills(period).await?;
            Json(GenerateBillsResponse {
                message: format!("Generated {} bills for {period}", bills.len()),
                bills_generated: bills.len(),
                bills,
            })
            .into_response()
        }
        "record-payment" => {
            user.require_admin()?;
            let req: RecordPaymentRequest = parse_body(&body)?;
            let cmd = RecordPayment {
                user_id: required_user(req.user_id)?,
                period: BillingPeriod::from_parts(req.month, req.year)?,
                amount: validate_amount(req.amount)?,
                payment_method: validate_payment_method(req.payment_method.as_deref())?,
                notes: validate_notes(req.notes)?,
                recorded_by: user.id,
            };
            let outcome = billing.record_payment(cmd).await?;
            Json(RecordPaymentResponse {
                message: "Payment recorded successfully".to_string(),
                payment: outcome.payment,
                allocation: outcome.allocation,
            })
            .into_response()
        }
        other => return Err(unknown_action(other).into()),
    };

    Ok(response)
}

#[cfg(test)]
mod tests {
    use super::*;
    use shared::error::ErrorCode;

    #[test]
    fn blank_body_reads_as_empty_object() {
        let req: GenerateBillsRequest = parse_body(&Bytes::from_static(b"  \n")).unwrap();
        assert!(req.month.is_none());
    }

    #[test]
    fn malformed_body_is_a_validation_error() {
        let err =
            parse_body::<GenerateBillsRequest>(&Bytes::from_static(b"{month:")).unwrap_err();
        assert_eq!(err.code, ErrorCode::ValidationFailed);
    }

    #[test]
    fn action_must_be_present() {
        assert_eq!(action(None).unwrap_err().code, ErrorCode::RequiredField);
        assert_eq!(action(Some(" ")).unwrap_err().code, ErrorCode::RequiredField);
        assert_eq!(action(Some("get-all-bills")).unwrap(), "get-all-bills");
    }
}
