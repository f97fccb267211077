use actix_web::{delete, get, patch, post, web, HttpResponse};
use chrono::Local;

use crate::config::AppConfig;
use crate::db::DbPool;
use crate::errors::ApiError;
use crate::middleware::AuthenticatedUser;
use crate::models::{ApplyVaccineRequest, CreateVaccineRequest};
use crate::services::{ClinicService, VaccineService};

#[get("/vacinas/tipos")]
async fn vaccine_types(pool: web::Data<DbPool>) -> Result<HttpResponse, ApiError> {
    Ok(HttpResponse::Ok().json(ClinicService::list_vaccine_types(&pool).await?))
}

#[get("/vacinas/pendentes")]
async fn pending_vaccines(
    pool: web::Data<DbPool>,
    config: web::Data<AppConfig>,
    auth: AuthenticatedUser,
) -> Result<HttpResponse, ApiError> {
    let today = Local::now().date_naive();
    let due = VaccineService::pending(auth.caller(), today, config.reminder_window_days, &pool).await?;
    Ok(HttpResponse::Ok().json(due))
}

#[post("/vacinas")]
async fn schedule_vaccine(
    pool: web::Data<DbPool>,
    auth: AuthenticatedUser,
    body: web::Json<CreateVaccineRequest>,
) -> Result<HttpResponse, ApiError> {
    let now = Local::now().naive_local();
    let created = VaccineService::schedule(auth.caller(), &body, now, &pool).await?;
    Ok(HttpResponse::Created().json(created))
}

#[patch("/vacinas/{vaccine_id}/aplicar")]
async fn apply_vaccine(
    pool: web::Data<DbPool>,
    auth: AuthenticatedUser,
    path: web::Path<i32>,
    body: web::Json<ApplyVaccineRequest>,
) -> Result<HttpResponse, ApiError> {
    let today = Local::now().date_naive();
    let applied =
        VaccineService::apply(path.into_inner(), auth.caller(), &body, today, &pool).await?;
    Ok(HttpResponse::Ok().json(applied))
}

#[delete("/vacinas/{vaccine_id}")]
async fn cancel_vaccine(
    pool: web::Data<DbPool>,
    auth: AuthenticatedUser,
    path: web::Path<i32>,
) -> Result<HttpResponse, ApiError> {
    let cancelled = VaccineService::cancel(path.into_inner(), auth.caller(), &pool).await?;
    Ok(HttpResponse::Ok().json(cancelled))
}

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(vaccine_types)
        .service(pending_vaccines)
        .service(schedule_vaccine)
        .service(apply_vaccine)
        .service(cancel_vaccine);
}
