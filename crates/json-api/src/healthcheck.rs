//! Shopfront JSON API Healthcheck Handler

use std::sync::Arc;

use salvo::{oapi::ToSchema, prelude::*};
use serde::{Deserialize, Serialize};

use crate::{extensions::*, state::State};

/// Healthcheck response
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct HealthResponse {
    /// Service status
    pub status: String,

    /// Payment service status (`up` or `down`); checkout fails while it is down
    pub payment_service: String,
}

/// Healthcheck handler
///
/// Returns service health status. A payment service outage is reported but
/// does not fail the check, since browsing and carts keep working.
#[endpoint(tags("health"), summary = "Health check endpoint")]
pub(crate) async fn handler(depot: &mut Depot) -> Result<Json<HealthResponse>, StatusError> {
    let state = depot.obtain_or_500::<Arc<State>>()?;

    let payment_service = if state.app.payments.health_check().await {
        "up"
    } else {
        "down"
    };

    Ok(Json(HealthResponse {
        status: "ok".to_string(),
        payment_service: payment_service.to_string(),
    }))
}

#[cfg(test)]
mod tests {
    use salvo::{
        affix_state::inject,
        prelude::*,
        test::{ResponseExt, TestClient},
    };
    use testresult::TestResult;

    use crate::test_helpers::Mocks;

    use super::*;

    async fn check(payments_up: bool) -> TestResult<HealthResponse> {
        let mut mocks = Mocks::new();

        mocks
            .payments
            .expect_health_check()
            .once()
            .return_once(move || payments_up);

        let router = Router::new()
            .hoop(inject(mocks.into_state()))
            .push(Router::with_path("healthcheck").get(handler));

        Ok(TestClient::get("http://example.com/healthcheck")
            .send(&Service::new(router))
            .await
            .take_json()
            .await?)
    }

    #[tokio::test]
    async fn test_healthcheck() -> TestResult {
        let response = check(true).await?;

        assert_eq!(response.status, "ok");
        assert_eq!(response.payment_service, "up");

        Ok(())
    }

    #[tokio::test]
    async fn test_healthcheck_reports_payment_outage() -> TestResult {
        let response = check(false).await?;

        assert_eq!(response.status, "ok");
        assert_eq!(response.payment_service, "down");

        Ok(())
    }
}
