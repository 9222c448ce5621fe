//! Payment callback handlers
//!
//! Browser-facing callbacks (success / fail / cancel) always end in a
//! redirect so the donor lands on a result page even when the callback is a
//! duplicate or the donation cannot be found. The IPN endpoint rejects
//! malformed payloads with 400 and answers 200 to everything else, otherwise
//! the provider keeps retrying a notification we have already decided about.

use axum::{
    Form,
    extract::{Query, State},
    http::StatusCode,
    response::{Html, IntoResponse, Redirect},
};
use serde::Deserialize;
use tracing::warn;

use crate::core::ServerState;
use crate::reconcile::{IpnNotification, SuccessCallback, SuccessOutcome};

/// Fields the provider sends on every callback; the demo page sends the same
/// shape with only `value_a` populated. `value_a` carries the donation id.
#[derive(Debug, Deserialize, Default)]
pub struct CallbackParams {
    pub value_a: Option<String>,
    pub donation_id: Option<String>,
    pub tran_id: Option<String>,
    pub val_id: Option<String>,
    pub amount: Option<String>,
    pub bank_tran_id: Option<String>,
    pub status: Option<String>,
}

impl CallbackParams {
    fn donation_id(&self) -> Option<String> {
        self.value_a
            .clone()
            .or_else(|| self.donation_id.clone())
            .filter(|v| !v.is_empty())
    }

    fn amount_f64(&self) -> Option<f64> {
        self.amount.as_deref().and_then(|a| a.parse().ok())
    }
}

fn success_redirect(base: &str, donation_id: &str) -> Redirect {
    Redirect::to(&format!(
        "{}/donation-success?donation_id={donation_id}",
        base.trim_end_matches('/')
    ))
}

fn failure_redirect(base: &str, reason: &str) -> Redirect {
    Redirect::to(&format!(
        "{}/donation-failed?reason={reason}",
        base.trim_end_matches('/')
    ))
}

fn cancel_redirect(base: &str, donation_id: &str) -> Redirect {
    Redirect::to(&format!(
        "{}/donation-cancelled?donation_id={donation_id}",
        base.trim_end_matches('/')
    ))
}

async fn handle_success(state: &ServerState, params: CallbackParams) -> Redirect {
    let base = &state.config.base_url;
    let Some(donation_id) = params.donation_id() else {
        return failure_redirect(base, "missing_donation_id");
    };

    let callback = SuccessCallback {
        donation_id: donation_id.clone(),
        validation_id: params.val_id.clone(),
        transaction_id: params.tran_id.clone(),
        amount: params.amount_f64(),
        bank_tran_id: params.bank_tran_id.clone(),
    };

    match state.reconciliation.record_success(callback).await {
        Ok(SuccessOutcome::Completed(_)) => success_redirect(base, &donation_id),
        Ok(SuccessOutcome::Failed { reason, .. }) => failure_redirect(base, reason),
        Err(e) => {
            warn!(donation_id = %donation_id, error = %e, "Success callback rejected");
            failure_redirect(base, "callback_error")
        }
    }
}

async fn handle_fail(state: &ServerState, params: CallbackParams) -> Redirect {
    let base = &state.config.base_url;
    let Some(donation_id) = params.donation_id() else {
        return failure_redirect(base, "missing_donation_id");
    };

    if let Err(e) = state.reconciliation.record_failure(&donation_id).await {
        warn!(donation_id = %donation_id, error = %e, "Fail callback rejected");
    }
    failure_redirect(base, "payment_failed")
}

async fn handle_cancel(state: &ServerState, params: CallbackParams) -> Redirect {
    let base = &state.config.base_url;
    let Some(donation_id) = params.donation_id() else {
        return failure_redirect(base, "missing_donation_id");
    };

    if let Err(e) = state.reconciliation.record_cancellation(&donation_id).await {
        warn!(donation_id = %donation_id, error = %e, "Cancel callback rejected");
    }
    cancel_redirect(base, &donation_id)
}

/// POST /api/payment/success
pub async fn success(
    State(state): State<ServerState>,
    Form(params): Form<CallbackParams>,
) -> Redirect {
    handle_success(&state, params).await
}

/// GET /api/payment/success (demo page link)
pub async fn success_get(
    State(state): State<ServerState>,
    Query(params): Query<CallbackParams>,
) -> Redirect {
    handle_success(&state, params).await
}

/// POST /api/payment/fail
pub async fn fail(State(state): State<ServerState>, Form(params): Form<CallbackParams>) -> Redirect {
    handle_fail(&state, params).await
}

/// GET /api/payment/fail (demo page link)
pub async fn fail_get(
    State(state): State<ServerState>,
    Query(params): Query<CallbackParams>,
) -> Redirect {
    handle_fail(&state, params).await
}

/// POST /api/payment/cancel
pub async fn cancel(
    State(state): State<ServerState>,
    Form(params): Form<CallbackParams>,
) -> Redirect {
    handle_cancel(&state, params).await
}

/// GET /api/payment/cancel
pub async fn cancel_get(
    State(state): State<ServerState>,
    Query(params): Query<CallbackParams>,
) -> Redirect {
    handle_cancel(&state, params).await
}

/// The provider sends `value_a`, `tran_id` and `val_id` on every real IPN;
/// a payload missing any of them is malformed, not a logical failure.
fn ipn_donation_id(params: &CallbackParams) -> Option<String> {
    params.tran_id.as_deref().filter(|v| !v.is_empty())?;
    params.val_id.as_deref().filter(|v| !v.is_empty())?;
    params.donation_id()
}

/// POST /api/payment/ipn - server-to-server notification
///
/// A payload missing the donation id, transaction id, or validation id is
/// malformed and rejected with 400. Parseable notifications always get 200,
/// even on logical failures; a non-2xx response there makes the provider
/// retry a notification we have already decided about.
pub async fn ipn(
    State(state): State<ServerState>,
    Form(params): Form<CallbackParams>,
) -> impl IntoResponse {
    let Some(donation_id) = ipn_donation_id(&params) else {
        warn!("IPN received without the required identifiers");
        return (StatusCode::BAD_REQUEST, "Invalid data");
    };

    let notification = IpnNotification {
        donation_id: donation_id.clone(),
        validation_id: params.val_id.clone(),
        transaction_id: params.tran_id.clone(),
        amount: params.amount_f64(),
        bank_tran_id: params.bank_tran_id.clone(),
        status: params.status.clone().unwrap_or_default(),
    };

    if let Err(e) = state.reconciliation.record_ipn(notification).await {
        warn!(donation_id = %donation_id, error = %e, "IPN processing failed");
    }
    (StatusCode::OK, "IPN received")
}

#[derive(Debug, Deserialize)]
pub struct DemoPageQuery {
    pub donation_id: String,
    #[serde(default)]
    pub amount: Option<String>,
    #[serde(default)]
    pub method: Option<String>,
}

/// GET /payment-demo - simulated payment page
///
/// Served when gateway credentials are absent. The donation already carries a
/// DEMO_ transaction id, so the success link completes it without provider
/// validation.
pub async fn demo_page(Query(query): Query<DemoPageQuery>) -> Html<String> {
    let amount = query.amount.as_deref().unwrap_or("0");
    let method = query.method.as_deref().unwrap_or("UNKNOWN");
    let donation_id = &query.donation_id;

    Html(format!(
        r#"<!DOCTYPE html>
<html>
<head>
  <meta charset="utf-8">
  <title>Demo Payment</title>
  <style>
    body {{ font-family: sans-serif; max-width: 28rem; margin: 4rem auto; }}
    .amount {{ font-size: 2rem; margin: 1rem 0; }}
    a {{ display: inline-block; padding: 0.6rem 1.2rem; margin-right: 0.5rem;
        border-radius: 4px; text-decoration: none; color: #fff; }}
    .pay {{ background: #16a34a; }}
    .fail {{ background: #dc2626; }}
    .cancel {{ background: #6b7280; }}
  </style>
</head>
<body>
  <h1>Demo Payment</h1>
  <p>No live gateway is configured; this page simulates the payment step.</p>
  <div class="amount">&#2547;{amount} <small>({method})</small></div>
  <a class="pay" href="/api/payment/success?value_a={donation_id}">Pay now</a>
  <a class="fail" href="/api/payment/fail?value_a={donation_id}">Simulate failure</a>
  <a class="cancel" href="/api/payment/cancel?value_a={donation_id}">Cancel</a>
</body>
</html>"#
    ))
}
