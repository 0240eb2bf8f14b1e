use utoipa::OpenApi;

#[derive(OpenApi)]
#[openapi(
    paths(
        crate::http::healthz,
        crate::http::metrics,
        crate::http::create_target,
        crate::http::list_client_targets,
        crate::http::deactivate_target,
        crate::http::run_sweep,
    ),
    components(schemas(
        common::api::Target,
        common::api::CreateTargetRequest,
        common::api::ErrorResponse,
        crate::http::HealthResponse,
        crate::http::SweepResponse,
    )),
    tags(
        (name = "targets", description = "Registration and lifecycle of keepalive targets"),
        (name = "system", description = "Operational endpoints")
    )
)]
pub struct ApiDoc;
