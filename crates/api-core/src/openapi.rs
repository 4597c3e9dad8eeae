//! OpenAPI documentation setup.

use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi};

/// API documentation modifier to add security schemes.
pub struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_auth",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .build(),
                ),
            );
        }
    }
}

/// Base OpenAPI configuration.
#[derive(OpenApi)]
#[openapi(
    info(
        title = "Induction Planning Engine API",
        version = "1.0.0",
        description = "Trainset fleet induction planning: constraint evaluation, scoring, optimization, alerting, and what-if simulation",
        license(name = "MIT"),
        contact(
            name = "API Support",
            url = "https://github.com/example/induction-planning-engine"
        )
    ),
    servers(
        (url = "http://localhost:8080", description = "Development")
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "Induction", description = "Induction plan generation, retrieval, and simulation"),
        (name = "Health", description = "Service health and readiness")
    )
)]
pub struct ApiDoc;
