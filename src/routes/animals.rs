use actix_multipart::Multipart;
use actix_web::{delete, get, post, put, web, HttpResponse};
use serde_json::json;

use crate::config::AppConfig;
use crate::db::DbPool;
use crate::errors::ApiError;
use crate::middleware::AuthenticatedUser;
use crate::models::{CreateAnimalRequest, UpdateAnimalRequest};
use crate::services::{AnimalService, AppointmentService, ExamService, UploadService, VaccineService};

#[post("/animais")]
async fn create_animal(
    pool: web::Data<DbPool>,
    auth: AuthenticatedUser,
    body: web::Json<CreateAnimalRequest>,
) -> Result<HttpResponse, ApiError> {
    let created = AnimalService::create(auth.caller(), &body, &pool).await?;
    Ok(HttpResponse::Created().json(created))
}

#[get("/animais")]
async fn list_animals(
    pool: web::Data<DbPool>,
    auth: AuthenticatedUser,
) -> Result<HttpResponse, ApiError> {
    Ok(HttpResponse::Ok().json(AnimalService::list_for(auth.caller(), &pool).await?))
}

#[get("/animais/{animal_id}")]
async fn get_animal(
    pool: web::Data<DbPool>,
    auth: AuthenticatedUser,
    path: web::Path<i32>,
) -> Result<HttpResponse, ApiError> {
    let found = AnimalService::get(path.into_inner(), auth.caller(), &pool).await?;
    Ok(HttpResponse::Ok().json(found))
}

#[put("/animais/{animal_id}")]
async fn update_animal(
    pool: web::Data<DbPool>,
    auth: AuthenticatedUser,
    path: web::Path<i32>,
    body: web::Json<UpdateAnimalRequest>,
) -> Result<HttpResponse, ApiError> {
    let updated = AnimalService::update(path.into_inner(), auth.caller(), &body, &pool).await?;
    Ok(HttpResponse::Ok().json(updated))
}

#[delete("/animais/{animal_id}")]
async fn delete_animal(
    pool: web::Data<DbPool>,
    config: web::Data<AppConfig>,
    auth: AuthenticatedUser,
    path: web::Path<i32>,
) -> Result<HttpResponse, ApiError> {
    let removed = AnimalService::delete(path.into_inner(), auth.caller(), &pool).await?;
    UploadService::discard(config.upload_dir.clone(), removed.photo_url).await;
    Ok(HttpResponse::Ok().json(json!({
        "success": true,
        "message": "Animal deleted"
    })))
}

#[post("/animais/{animal_id}/foto")]
async fn upload_animal_photo(
    pool: web::Data<DbPool>,
    config: web::Data<AppConfig>,
    auth: AuthenticatedUser,
    path: web::Path<i32>,
    payload: Multipart,
) -> Result<HttpResponse, ApiError> {
    let id = path.into_inner();
    let previous = AnimalService::get_owned(id, auth.caller(), &pool).await?.photo_url;

    let db = pool.clone();
    let updated = UploadService::save_and_attach(
        payload,
        config.upload_dir.clone(),
        config.max_upload_bytes,
        |url| async move { AnimalService::set_photo(id, url, &db).await },
    )
    .await?;
    UploadService::discard(config.upload_dir.clone(), previous).await;

    Ok(HttpResponse::Ok().json(updated))
}

#[get("/animais/{animal_id}/vacinas")]
async fn animal_vaccines(
    pool: web::Data<DbPool>,
    auth: AuthenticatedUser,
    path: web::Path<i32>,
) -> Result<HttpResponse, ApiError> {
    let records = VaccineService::list_for_animal(path.into_inner(), auth.caller(), &pool).await?;
    Ok(HttpResponse::Ok().json(records))
}

#[get("/animais/{animal_id}/exames")]
async fn animal_exams(
    pool: web::Data<DbPool>,
    auth: AuthenticatedUser,
    path: web::Path<i32>,
) -> Result<HttpResponse, ApiError> {
    let records = ExamService::list_for_animal(path.into_inner(), auth.caller(), &pool).await?;
    Ok(HttpResponse::Ok().json(records))
}

#[get("/animais/{animal_id}/consultas")]
async fn animal_appointments(
    pool: web::Data<DbPool>,
    auth: AuthenticatedUser,
    path: web::Path<i32>,
) -> Result<HttpResponse, ApiError> {
    let records =
        AppointmentService::list_for_animal(path.into_inner(), auth.caller(), &pool).await?;
    Ok(HttpResponse::Ok().json(records))
}

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(create_animal)
        .service(list_animals)
        .service(get_animal)
        .service(update_animal)
        .service(delete_animal)
        .service(upload_animal_photo)
        .service(animal_vaccines)
        .service(animal_exams)
        .service(animal_appointments);
}
