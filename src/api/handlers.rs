//! Request handlers for the API endpoints.

use std::sync::Arc;

use axum::Json;
use axum::extract::{Query, State};
use tracing::debug;

use super::AppState;
use super::types::{
    BillQuery, IncentiveQuery, IncentiveResponse, SavingsRequest, SolveQuery, SolveResponse,
};
use crate::savings::{SavingsResult, compute_savings};
use crate::tariff::{BillDetails, compute_bill, lookup_incentive_rate, solve_usage};

/// `GET /bill?usage=N&afa=S` → 200 + `BillDetails` JSON
pub async fn get_bill(
    State(state): State<Arc<AppState>>,
    Query(query): Query<BillQuery>,
) -> Json<BillDetails> {
    Json(compute_bill(&state.rates, query.usage, query.afa))
}

/// `GET /solve?bill=RM&afa=S` → 200 + `SolveResponse` JSON
pub async fn get_solve(
    State(state): State<Arc<AppState>>,
    Query(query): Query<SolveQuery>,
) -> Json<SolveResponse> {
    let usage_kwh = solve_usage(&state.rates, query.bill, query.afa);
    let bill_rm = compute_bill(&state.rates, f64::from(usage_kwh), query.afa).total_before_solar;
    Json(SolveResponse { usage_kwh, bill_rm })
}

/// `GET /incentive?usage=N` → 200 + `IncentiveResponse` JSON
pub async fn get_incentive(
    State(state): State<Arc<AppState>>,
    Query(query): Query<IncentiveQuery>,
) -> Json<IncentiveResponse> {
    Json(IncentiveResponse {
        usage_kwh: query.usage,
        rate_rm_per_kwh: lookup_incentive_rate(&state.rates, query.usage),
    })
}

/// `POST /savings` with a `SavingsRequest` body → 200 + `SavingsResult` JSON
///
/// Malformed bodies are rejected by the `Json` extractor with a 4xx status.
pub async fn post_savings(
    State(state): State<Arc<AppState>>,
    Json(request): Json<SavingsRequest>,
) -> Json<SavingsResult> {
    debug!(?request, "savings request");
    Json(compute_savings(
        &state.rates,
        &request.inputs(),
        request.battery_kwh,
    ))
}

#[cfg(test)]
mod tests {
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use tower::util::ServiceExt;

    use super::*;
    use crate::api::router;
    use crate::tariff::RateTable;

    fn make_test_state() -> Arc<AppState> {
        Arc::new(AppState {
            rates: RateTable::domestic(),
        })
    }

    async fn get_json(uri: &str) -> (StatusCode, serde_json::Value) {
        let app = router(make_test_state());
        let req = Request::builder().uri(uri).body(Body::empty()).unwrap();
        let resp = app.oneshot(req).await.unwrap();
        let status = resp.status();
        let body = axum::body::to_bytes(resp.into_body(), usize::MAX)
            .await
            .unwrap();
        let json = serde_json::from_slice(&body).unwrap_or(serde_json::Value::Null);
        (status, json)
    }

    #[tokio::test]
    async fn bill_returns_itemised_total() {
        let (status, json) = get_json("/bill?usage=900&afa=0").await;
        assert_eq!(status, StatusCode::OK);
        let total = json["total_before_solar"].as_f64().unwrap();
        assert!((total - 418.34).abs() < 1e-9);
        assert_eq!(json["service_tax"], 11.22);
    }

    #[tokio::test]
    async fn bill_afa_defaults_to_zero() {
        let (status, json) = get_json("/bill?usage=900").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["afa_total"], 0.0);
    }

    #[tokio::test]
    async fn solve_returns_usage() {
        let (status, json) = get_json("/solve?bill=650").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["usage_kwh"], 1356);
    }

    #[tokio::test]
    async fn incentive_returns_band_rate() {
        let (status, json) = get_json("/incentive?usage=450").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["rate_rm_per_kwh"], -0.145);
    }

    #[tokio::test]
    async fn missing_query_is_rejected() {
        let (status, _) = get_json("/bill").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }
}
