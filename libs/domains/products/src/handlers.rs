//! HTTP handlers for Products API

use axum::{
    Json, Router,
    extract::State,
    http::{Method, StatusCode},
    response::{IntoResponse, Response},
    routing::get,
};
use axum_helpers::{
    AppError, FormPayload, IdPath, ValidatedForm,
    errors::responses::{
        BadRequestIdResponse, InternalServerErrorResponse, MethodNotAllowedResponse,
        NotFoundResponse, ValidationErrorResponse,
    },
};
use std::sync::Arc;
use utoipa::OpenApi;

use crate::error::ProductResult;
use crate::models::{
    DeletedResponse, Product, ProductEnvelope, ProductForm, ProductInput, ProductUpload,
};
use crate::repository::ProductRepository;
use crate::service::ProductService;

/// Form field carrying the uploaded image
pub const IMAGE_FIELD: &str = "image";

/// OpenAPI documentation for Products API
#[derive(OpenApi)]
#[openapi(
    paths(
        list_products,
        create_product,
        get_product,
        update_product,
        update_product_via_post,
        delete_product,
    ),
    components(
        schemas(Product, ProductUpload, ProductEnvelope, DeletedResponse),
        responses(
            NotFoundResponse,
            ValidationErrorResponse,
            BadRequestIdResponse,
            MethodNotAllowedResponse,
            InternalServerErrorResponse
        )
    ),
    tags(
        (name = "Products", description = "Product listing endpoints")
    )
)]
pub struct ApiDoc;

type SharedService<R> = State<Arc<ProductService<R>>>;

/// Create the products router
pub fn router<R: ProductRepository + 'static>(service: ProductService<R>) -> Router {
    let shared_service = Arc::new(service);

    Router::new()
        .route("/", get(list_products).post(create_product))
        .route(
            "/{id}",
            get(get_product)
                .put(update_product)
                .patch(update_product)
                .post(update_product_via_post)
                .delete(delete_product),
        )
        .with_state(shared_service)
}

/// List all products
#[utoipa::path(
    get,
    path = "",
    tag = "Products",
    responses(
        (status = 200, description = "All products, empty when there are none", body = Vec<Product>),
        (status = 500, response = InternalServerErrorResponse)
    )
)]
async fn list_products<R: ProductRepository>(
    State(service): SharedService<R>,
) -> ProductResult<Json<Vec<Product>>> {
    let products = service.list_products().await?;
    Ok(Json(products))
}

/// Create a new product
#[utoipa::path(
    post,
    path = "",
    tag = "Products",
    request_body(content = ProductUpload, content_type = "multipart/form-data"),
    responses(
        (status = 201, description = "Product created successfully", body = ProductEnvelope),
        (status = 422, response = ValidationErrorResponse),
        (status = 500, response = InternalServerErrorResponse)
    )
)]
async fn create_product<R: ProductRepository>(
    State(service): SharedService<R>,
    form: ValidatedForm<ProductForm>,
) -> Result<impl IntoResponse, AppError> {
    let image = service.store_image(form.file(IMAGE_FIELD)).await;
    let input = ProductInput::try_from(form.data)?.with_image(image);

    let product = service.create_product(input).await?;
    Ok((StatusCode::CREATED, Json(ProductEnvelope::created(product))))
}

/// Get a product by ID
#[utoipa::path(
    get,
    path = "/{id}",
    tag = "Products",
    params(
        ("id" = i64, Path, description = "Product ID")
    ),
    responses(
        (status = 200, description = "Product found", body = Product),
        (status = 400, response = BadRequestIdResponse),
        (status = 404, response = NotFoundResponse),
        (status = 500, response = InternalServerErrorResponse)
    )
)]
async fn get_product<R: ProductRepository>(
    State(service): SharedService<R>,
    IdPath(id): IdPath,
) -> ProductResult<Json<Product>> {
    let product = service.get_product(id).await?;
    Ok(Json(product))
}

/// Update a product
#[utoipa::path(
    put,
    path = "/{id}",
    tag = "Products",
    params(
        ("id" = i64, Path, description = "Product ID")
    ),
    request_body(content = ProductUpload, content_type = "multipart/form-data"),
    responses(
        (status = 200, description = "Product updated successfully", body = ProductEnvelope),
        (status = 400, response = BadRequestIdResponse),
        (status = 404, response = NotFoundResponse),
        (status = 422, response = ValidationErrorResponse),
        (status = 500, response = InternalServerErrorResponse)
    )
)]
async fn update_product<R: ProductRepository>(
    State(service): SharedService<R>,
    IdPath(id): IdPath,
    form: ValidatedForm<ProductForm>,
) -> Result<Json<ProductEnvelope>, AppError> {
    apply_update(&service, id, form).await
}

/// Update or delete a product through a method override
///
/// Browsers cannot send multipart `PUT`, so the form is posted with
/// `_method=PUT` (or an `X-HTTP-Method-Override` header) instead.
#[utoipa::path(
    post,
    path = "/{id}",
    tag = "Products",
    params(
        ("id" = i64, Path, description = "Product ID")
    ),
    request_body(content = ProductUpload, content_type = "multipart/form-data"),
    responses(
        (status = 200, description = "Product updated successfully", body = ProductEnvelope),
        (status = 400, response = BadRequestIdResponse),
        (status = 404, response = NotFoundResponse),
        (status = 405, response = MethodNotAllowedResponse),
        (status = 422, response = ValidationErrorResponse),
        (status = 500, response = InternalServerErrorResponse)
    )
)]
async fn update_product_via_post<R: ProductRepository>(
    State(service): SharedService<R>,
    IdPath(id): IdPath,
    payload: FormPayload,
) -> Result<Response, AppError> {
    match payload.method_override {
        Some(Method::PUT) | Some(Method::PATCH) => {
            let form = payload.validate::<ProductForm>()?;
            Ok(apply_update(&service, id, form).await?.into_response())
        }
        Some(Method::DELETE) => {
            service.delete_product(id).await?;
            Ok(Json(DeletedResponse::default()).into_response())
        }
        other => Err(AppError::MethodNotAllowed(match other {
            Some(method) => format!("Method override {} is not supported", method),
            None => "POST is only accepted with a PUT or PATCH method override".to_string(),
        })),
    }
}

async fn apply_update<R: ProductRepository>(
    service: &ProductService<R>,
    id: i64,
    form: ValidatedForm<ProductForm>,
) -> Result<Json<ProductEnvelope>, AppError> {
    // No file write for a product that is already gone
    service.get_product(id).await?;

    let image = service.store_image(form.file(IMAGE_FIELD)).await;
    let input = ProductInput::try_from(form.data)?.with_image(image);

    let product = service.update_product(id, input).await?;
    Ok(Json(ProductEnvelope::updated(product)))
}

/// Delete a product
#[utoipa::path(
    delete,
    path = "/{id}",
    tag = "Products",
    params(
        ("id" = i64, Path, description = "Product ID")
    ),
    responses(
        (status = 200, description = "Product deleted successfully", body = DeletedResponse),
        (status = 400, response = BadRequestIdResponse),
        (status = 404, response = NotFoundResponse),
        (status = 500, response = InternalServerErrorResponse)
    )
)]
async fn delete_product<R: ProductRepository>(
    State(service): SharedService<R>,
    IdPath(id): IdPath,
) -> ProductResult<Json<DeletedResponse>> {
    service.delete_product(id).await?;
    Ok(Json(DeletedResponse::default()))
}
