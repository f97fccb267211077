use actix_web::{get, web, HttpResponse, Responder};
use serde_json::json;

use crate::db::{self, DbPool};

#[get("/")]
async fn index(pool: web::Data<DbPool>) -> impl Responder {
    let database = if db::ping(&pool).await {
        "connected"
    } else {
        "disconnected"
    };

    HttpResponse::Ok().json(json!({
        "name": "vetclinic",
        "version": env!("CARGO_PKG_VERSION"),
        "database": database,
        "endpoints": {
            "usuarios": [
                "POST /usuarios",
                "POST /usuarios/verificar",
                "POST /usuarios/reenviar-codigo",
                "POST /usuarios/pin",
                "POST /usuarios/login",
                "POST /usuarios/logout",
                "GET /usuarios/me",
                "PUT /usuarios/me",
                "DELETE /usuarios/me"
            ],
            "clinicas": [
                "GET /clinicas",
                "GET /clinicas/{id}",
                "GET /clinicas/{id}/veterinarios",
                "GET /veterinarios"
            ],
            "animais": [
                "POST /animais",
                "GET /animais",
                "GET /animais/{id}",
                "PUT /animais/{id}",
                "DELETE /animais/{id}",
                "POST /animais/{id}/foto",
                "GET /animais/{id}/vacinas",
                "GET /animais/{id}/exames",
                "GET /animais/{id}/consultas"
            ],
            "consultas": [
                "POST /consultas",
                "GET /consultas",
                "GET /consultas/{id}",
                "PUT /consultas/{id}",
                "PATCH /consultas/{id}/estado",
                "DELETE /consultas/{id}"
            ],
            "vacinas": [
                "GET /vacinas/tipos",
                "GET /vacinas/pendentes",
                "POST /vacinas",
                "PATCH /vacinas/{id}/aplicar",
                "DELETE /vacinas/{id}"
            ],
            "exames": [
                "GET /exames/tipos",
                "POST /exames",
                "GET /exames/{id}",
                "PUT /exames/{id}",
                "POST /exames/{id}/foto",
                "DELETE /exames/{id}"
            ],
            "arquivos": ["GET /uploads/{file}"],
            "health": ["GET /health"]
        }
    }))
}

#[get("/health")]
async fn health_check() -> impl Responder {
    HttpResponse::Ok().json(json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
        "timestamp": chrono::Utc::now().to_rfc3339()
    }))
}

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(index).service(health_check);
}
