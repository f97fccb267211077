use actix_web::{get, web, HttpResponse};

use crate::db::DbPool;
use crate::errors::ApiError;
use crate::services::ClinicService;

#[get("/clinicas")]
async fn list_clinics(pool: web::Data<DbPool>) -> Result<HttpResponse, ApiError> {
    Ok(HttpResponse::Ok().json(ClinicService::list_clinics(&pool).await?))
}

#[get("/clinicas/{clinic_id}")]
async fn get_clinic(
    pool: web::Data<DbPool>,
    path: web::Path<i32>,
) -> Result<HttpResponse, ApiError> {
    let clinic = ClinicService::get_clinic(path.into_inner(), &pool).await?;
    Ok(HttpResponse::Ok().json(clinic))
}

#[get("/clinicas/{clinic_id}/veterinarios")]
async fn clinic_vets(
    pool: web::Data<DbPool>,
    path: web::Path<i32>,
) -> Result<HttpResponse, ApiError> {
    let vets = ClinicService::list_vets(Some(path.into_inner()), &pool).await?;
    Ok(HttpResponse::Ok().json(vets))
}

#[get("/veterinarios")]
async fn list_vets(pool: web::Data<DbPool>) -> Result<HttpResponse, ApiError> {
    Ok(HttpResponse::Ok().json(ClinicService::list_vets(None, &pool).await?))
}

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(list_clinics)
        .service(get_clinic)
        .service(clinic_vets)
        .service(list_vets);
}
