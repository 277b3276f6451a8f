use crate::application::category_service::CategoryUseCase;
use crate::domain::error::DomainError;
use crate::presentation::dto::{AttachCategoriesRequest, CategoryRequest, MessageResponse};
use crate::presentation::utils::request_id;
use actix_web::{HttpRequest, HttpResponse, Scope, get, post, put, web};
use tracing::info;
use uuid::Uuid;

pub fn scope() -> Scope {
    web::scope("/categories")
        .service(attach_to_post_version)
        .service(create_category)
        .service(get_category)
        .service(update_category)
}

#[post("")]
async fn create_category(
    req: HttpRequest,
    categories: web::Data<dyn CategoryUseCase>,
    payload: web::Json<CategoryRequest>,
) -> Result<HttpResponse, DomainError> {
    let response = categories.create_category(payload.into_inner()).await?;

    info!(
        request_id = %request_id(&req),
        category_id = %response.id,
        "category created"
    );

    Ok(HttpResponse::Created().json(response))
}

#[get("/{id}")]
async fn get_category(
    categories: web::Data<dyn CategoryUseCase>,
    path: web::Path<Uuid>,
) -> Result<HttpResponse, DomainError> {
    let category = categories.get_category(path.into_inner()).await?;
    Ok(HttpResponse::Ok().json(category))
}

#[put("/{id}")]
async fn update_category(
    req: HttpRequest,
    categories: web::Data<dyn CategoryUseCase>,
    path: web::Path<Uuid>,
    payload: web::Json<CategoryRequest>,
) -> Result<HttpResponse, DomainError> {
    let response = categories
        .update_category(path.into_inner(), payload.into_inner())
        .await?;

    info!(
        request_id = %request_id(&req),
        category_id = %response.id,
        "category updated"
    );

    Ok(HttpResponse::Ok().json(response))
}

#[post("/attach")]
async fn attach_to_post_version(
    req: HttpRequest,
    categories: web::Data<dyn CategoryUseCase>,
    payload: web::Json<AttachCategoriesRequest>,
) -> Result<HttpResponse, DomainError> {
    let request = payload.into_inner();
    let post_version_id = request.post_version_id;
    categories.attach_to_post_version(request).await?;

    info!(
        request_id = %request_id(&req),
        post_version_id = %post_version_id,
        "categories attached"
    );

    Ok(HttpResponse::Ok().json(MessageResponse {
        message: "category attached to post version successfully",
    }))
}
