//! OpenAPI Documentation
//!
//! - OpenAPI JSON: `http://localhost:8080/api-docs/openapi.json`

use utoipa::openapi::security::{ApiKey, ApiKeyValue, SecurityScheme};
use utoipa::{Modify, OpenApi};

use crate::gateway::types::{
    CategoryApiData, DailySpendApiData, HealthResponse, SummaryApiData, TransferApiData,
    TransferApiRequest,
};

/// Identity forwarded by the upstream authenticator
struct IdentityAddon;

impl Modify for IdentityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "forwarded_identity",
                SecurityScheme::ApiKey(ApiKey::Header(ApiKeyValue::with_description(
                    "X-User-Id",
                    "Numeric user id set by the identity proxy. Optional companions: \
                     X-User-Role (ADMIN/USER), X-User-Email, X-Forwarded-For.",
                ))),
            );
        }
    }
}

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Banking Transfer API",
        version = "1.0.0",
        description = "Account-to-account transfers with daily limits, history and receipts.",
        license(name = "MIT")
    ),
    servers(
        (url = "http://localhost:8080", description = "Development"),
    ),
    paths(
        crate::gateway::handlers::health_check,
        crate::gateway::handlers::create_transfer,
        crate::gateway::handlers::get_receipt,
        crate::gateway::handlers::get_history,
        crate::gateway::handlers::get_summary,
        crate::gateway::handlers::get_categories,
        crate::gateway::handlers::get_weekly_trend,
    ),
    components(
        schemas(
            HealthResponse,
            TransferApiRequest,
            TransferApiData,
            SummaryApiData,
            CategoryApiData,
            DailySpendApiData,
        )
    ),
    modifiers(&IdentityAddon),
    security(("forwarded_identity" = [])),
    tags(
        (name = "System", description = "Health and diagnostics"),
        (name = "Transfer", description = "Money transfers and receipts"),
        (name = "Account", description = "Account history and analytics"),
    )
)]
pub struct ApiDoc;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_openapi_lists_every_route() {
        let doc = ApiDoc::openapi();
        let paths: Vec<&String> = doc.paths.paths.keys().collect();
        for expected in [
            "/api/v1/health",
            "/api/v1/transfers",
            "/api/v1/transfers/{id}/receipt",
            "/api/v1/accounts/{iban}/transfers",
            "/api/v1/accounts/{iban}/summary",
            "/api/v1/accounts/{iban}/categories",
            "/api/v1/accounts/{iban}/weekly-trend",
        ] {
            assert!(
                paths.iter().any(|p| p.as_str() == expected),
                "missing {expected}"
            );
        }
    }
}
