use actix_web::{delete, get, patch, post, put, web, HttpResponse};
use chrono::Local;

use crate::db::DbPool;
use crate::errors::ApiError;
use crate::middleware::AuthenticatedUser;
use crate::models::{
    AppointmentStatus, CreateAppointmentRequest, RescheduleAppointmentRequest, UpdateStatusRequest,
};
use crate::services::AppointmentService;

#[post("/consultas")]
async fn book_appointment(
    pool: web::Data<DbPool>,
    auth: AuthenticatedUser,
    body: web::Json<CreateAppointmentRequest>,
) -> Result<HttpResponse, ApiError> {
    let now = Local::now().naive_local();
    let booked = AppointmentService::book(auth.caller(), &body, now, &pool).await?;
    Ok(HttpResponse::Created().json(booked))
}

#[get("/consultas")]
async fn list_appointments(
    pool: web::Data<DbPool>,
    auth: AuthenticatedUser,
) -> Result<HttpResponse, ApiError> {
    Ok(HttpResponse::Ok().json(AppointmentService::list_for(auth.caller(), &pool).await?))
}

#[get("/consultas/{appointment_id}")]
async fn get_appointment(
    pool: web::Data<DbPool>,
    auth: AuthenticatedUser,
    path: web::Path<i32>,
) -> Result<HttpResponse, ApiError> {
    let found = AppointmentService::get(path.into_inner(), auth.caller(), &pool).await?;
    Ok(HttpResponse::Ok().json(found))
}

#[put("/consultas/{appointment_id}")]
async fn reschedule_appointment(
    pool: web::Data<DbPool>,
    auth: AuthenticatedUser,
    path: web::Path<i32>,
    body: web::Json<RescheduleAppointmentRequest>,
) -> Result<HttpResponse, ApiError> {
    let now = Local::now().naive_local();
    let updated =
        AppointmentService::reschedule(path.into_inner(), auth.caller(), &body, now, &pool).await?;
    Ok(HttpResponse::Ok().json(updated))
}

#[patch("/consultas/{appointment_id}/estado")]
async fn update_appointment_status(
    pool: web::Data<DbPool>,
    auth: AuthenticatedUser,
    path: web::Path<i32>,
    body: web::Json<UpdateStatusRequest>,
) -> Result<HttpResponse, ApiError> {
    let next: AppointmentStatus = body.status.parse()?;
    let updated =
        AppointmentService::update_status(path.into_inner(), auth.caller(), next, &pool).await?;
    Ok(HttpResponse::Ok().json(updated))
}

#[delete("/consultas/{appointment_id}")]
async fn cancel_appointment(
    pool: web::Data<DbPool>,
    auth: AuthenticatedUser,
    path: web::Path<i32>,
) -> Result<HttpResponse, ApiError> {
    let cancelled = AppointmentService::cancel(path.into_inner(), auth.caller(), &pool).await?;
    Ok(HttpResponse::Ok().json(cancelled))
}

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(book_appointment)
        .service(list_appointments)
        .service(get_appointment)
        .service(reschedule_appointment)
        .service(update_appointment_status)
        .service(cancel_appointment);
}
