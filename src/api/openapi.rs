//! OpenAPI documentation and schema generation
//!
//! Defines the OpenAPI specification for the media-relay REST API using
//! utoipa for compile-time spec generation.

use utoipa::OpenApi;

/// OpenAPI documentation for the media-relay REST API
///
/// The document is served at:
/// - `/api/v1/openapi.json` - JSON format OpenAPI specification
/// - `/swagger-ui` - Interactive Swagger UI documentation
#[derive(OpenApi)]
#[openapi(
    info(
        title = "media-relay REST API",
        version = "0.1.0",
        description = "Fetch media through an external extraction tool, directly or with live progress over server-sent events",
        license(
            name = "MIT OR Apache-2.0"
        )
    ),
    servers(
        (url = "http://localhost:6790", description = "Local development server")
    ),
    paths(
        // Retrieval
        crate::api::routes::download,

        // System
        crate::api::routes::get_capabilities,
        crate::api::routes::health_check,
        crate::api::routes::openapi_spec,
    ),
    components(schemas(
        // Core types from types.rs
        crate::types::MediaKind,
        crate::types::EventKind,
        crate::types::EventPayload,
        crate::types::RetrievalHandle,
        crate::types::UrlListResponse,
        crate::types::Capabilities,

        // Config types from config.rs
        crate::config::Config,
        crate::config::ExtractorConfig,
        crate::config::StorageConfig,
        crate::config::JobConfig,
        crate::config::ServerIntegrationConfig,
        crate::config::ApiConfig,

        // API request types from routes
        crate::api::routes::DownloadQuery,

        // Error types from error.rs
        crate::error::ApiError,
    )),
    tags(
        (name = "retrieval", description = "Media retrieval - Direct artifact download or progressive event stream"),
        (name = "system", description = "System endpoints - Health checks, capabilities, OpenAPI spec"),
    )
)]
pub struct ApiDoc;
