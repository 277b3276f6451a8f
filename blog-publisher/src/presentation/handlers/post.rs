use crate::application::post_service::PostUseCase;
use crate::domain::error::DomainError;
use crate::presentation::dto::{CreatePostRequest, MessageResponse, UpdatePostRequest};
use crate::presentation::utils::request_id;
use actix_web::{HttpRequest, HttpResponse, Scope, delete, get, post, put, web};
use tracing::info;
use uuid::Uuid;

pub fn scope() -> Scope {
    web::scope("/posts")
        .service(create_post)
        .service(get_version)
        .service(get_post)
        .service(update_post)
        .service(publish_post)
        .service(delete_draft)
}

#[post("")]
async fn create_post(
    req: HttpRequest,
    posts: web::Data<dyn PostUseCase>,
    payload: web::Json<CreatePostRequest>,
) -> Result<HttpResponse, DomainError> {
    let response = posts.create_post(payload.into_inner()).await?;

    info!(
        request_id = %request_id(&req),
        post_id = %response.post_id,
        "post created"
    );

    Ok(HttpResponse::Created().json(response))
}

#[get("/versions/{id}")]
async fn get_version(
    posts: web::Data<dyn PostUseCase>,
    path: web::Path<Uuid>,
) -> Result<HttpResponse, DomainError> {
    let version = posts.get_version(path.into_inner()).await?;
    Ok(HttpResponse::Ok().json(version))
}

#[get("/{id}")]
async fn get_post(
    posts: web::Data<dyn PostUseCase>,
    path: web::Path<Uuid>,
) -> Result<HttpResponse, DomainError> {
    let detail = posts.get_post(path.into_inner()).await?;
    Ok(HttpResponse::Ok().json(detail))
}

#[put("/{id}")]
async fn update_post(
    req: HttpRequest,
    posts: web::Data<dyn PostUseCase>,
    path: web::Path<Uuid>,
    payload: web::Json<UpdatePostRequest>,
) -> Result<HttpResponse, DomainError> {
    let post_id = path.into_inner();
    let response = posts.update_post(post_id, payload.into_inner()).await?;

    info!(
        request_id = %request_id(&req),
        post_id = %post_id,
        version_number = response.version_number,
        "post updated"
    );

    Ok(HttpResponse::Ok().json(response))
}

#[post("/{id}/publish")]
async fn publish_post(
    req: HttpRequest,
    posts: web::Data<dyn PostUseCase>,
    path: web::Path<Uuid>,
) -> Result<HttpResponse, DomainError> {
    let post_id = path.into_inner();
    let response = posts.publish_post(post_id).await?;

    info!(
        request_id = %request_id(&req),
        post_id = %post_id,
        "post published"
    );

    Ok(HttpResponse::Ok().json(response))
}

#[delete("/{id}")]
async fn delete_draft(
    req: HttpRequest,
    posts: web::Data<dyn PostUseCase>,
    path: web::Path<Uuid>,
) -> Result<HttpResponse, DomainError> {
    let post_id = path.into_inner();
    posts.delete_draft(post_id).await?;

    info!(
        request_id = %request_id(&req),
        post_id = %post_id,
        "draft deleted"
    );

    Ok(HttpResponse::Ok().json(MessageResponse {
        message: "post version deleted",
    }))
}
