use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::handlers;

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Cakeshop API",
        version = "0.1.0",
        description = r#"
Backend for an online cake-ordering shop.

Customers submit orders (contact details, cake category, a photo upload or a
bundled default image); staff browse, edit, and delete them. Uploaded photos
are served under `/uploads`, default category images under `/images/default`.
        "#,
        license(name = "MIT", url = "https://opensource.org/licenses/MIT")
    ),
    paths(
        handlers::orders::create_order,
        handlers::orders::list_orders,
        handlers::orders::update_order,
        handlers::orders::delete_order,
    ),
    components(schemas(
        handlers::orders::OrderResponse,
        handlers::orders::OrderFormDoc,
        handlers::orders::DeleteOrderRequest,
        handlers::orders::DeleteOrderResponse,
        crate::errors::ErrorResponse,
        crate::models::Category,
    )),
    tags(
        (name = "Orders", description = "Order management endpoints"),
    )
)]
pub struct ApiDoc;

/// Swagger UI mounted at `/docs`, serving the generated OpenAPI document.
pub fn swagger_ui() -> SwaggerUi {
    SwaggerUi::new("/docs").url("/api-docs/openapi.json", ApiDoc::openapi())
}
