use actix_multipart::Multipart;
use actix_web::{delete, get, post, put, web, HttpResponse};
use serde_json::json;

use crate::config::AppConfig;
use crate::db::DbPool;
use crate::errors::ApiError;
use crate::middleware::AuthenticatedUser;
use crate::models::{CreateExamRequest, UpdateExamRequest};
use crate::services::{ClinicService, ExamService, UploadService};

#[get("/exames/tipos")]
async fn exam_types(pool: web::Data<DbPool>) -> Result<HttpResponse, ApiError> {
    Ok(HttpResponse::Ok().json(ClinicService::list_exam_types(&pool).await?))
}

#[post("/exames")]
async fn create_exam(
    pool: web::Data<DbPool>,
    auth: AuthenticatedUser,
    body: web::Json<CreateExamRequest>,
) -> Result<HttpResponse, ApiError> {
    let created = ExamService::create(auth.caller(), &body, &pool).await?;
    Ok(HttpResponse::Created().json(created))
}

#[get("/exames/{exam_id}")]
async fn get_exam(
    pool: web::Data<DbPool>,
    auth: AuthenticatedUser,
    path: web::Path<i32>,
) -> Result<HttpResponse, ApiError> {
    Ok(HttpResponse::Ok().json(ExamService::get(path.into_inner(), auth.caller(), &pool).await?))
}

#[put("/exames/{exam_id}")]
async fn update_exam(
    pool: web::Data<DbPool>,
    auth: AuthenticatedUser,
    path: web::Path<i32>,
    body: web::Json<UpdateExamRequest>,
) -> Result<HttpResponse, ApiError> {
    let updated = ExamService::update(path.into_inner(), auth.caller(), &body, &pool).await?;
    Ok(HttpResponse::Ok().json(updated))
}

#[post("/exames/{exam_id}/foto")]
async fn upload_exam_photo(
    pool: web::Data<DbPool>,
    config: web::Data<AppConfig>,
    auth: AuthenticatedUser,
    path: web::Path<i32>,
    payload: Multipart,
) -> Result<HttpResponse, ApiError> {
    let id = path.into_inner();
    let previous = ExamService::get_recordable(id, auth.caller(), &pool).await?.photo_url;

    let db = pool.clone();
    let updated = UploadService::save_and_attach(
        payload,
        config.upload_dir.clone(),
        config.max_upload_bytes,
        |url| async move { ExamService::set_photo(id, url, &db).await },
    )
    .await?;
    UploadService::discard(config.upload_dir.clone(), previous).await;

    Ok(HttpResponse::Ok().json(updated))
}

#[delete("/exames/{exam_id}")]
async fn delete_exam(
    pool: web::Data<DbPool>,
    config: web::Data<AppConfig>,
    auth: AuthenticatedUser,
    path: web::Path<i32>,
) -> Result<HttpResponse, ApiError> {
    let removed = ExamService::delete(path.into_inner(), auth.caller(), &pool).await?;
    UploadService::discard(config.upload_dir.clone(), removed.photo_url).await;
    Ok(HttpResponse::Ok().json(json!({
        "success": true,
        "message": "Exam deleted"
    })))
}

// `tipos` must be registered ahead of `{exam_id}`
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(exam_types)
        .service(create_exam)
        .service(get_exam)
        .service(update_exam)
        .service(upload_exam_photo)
        .service(delete_exam);
}
