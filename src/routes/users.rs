use actix_web::{delete, get, post, put, web, HttpResponse};
use log::debug;
use serde_json::json;

use crate::config::AppConfig;
use crate::db::DbPool;
use crate::errors::ApiError;
use crate::middleware::AuthenticatedUser;
use crate::models::{
    LoginRequest, RegisterUserRequest, ResendCodeRequest, SetPinRequest, UpdateUserRequest,
    VerifyCodeRequest,
};
use crate::services::{AuthService, UploadService, UserService};

#[post("/usuarios")]
async fn register(
    pool: web::Data<DbPool>,
    body: web::Json<RegisterUserRequest>,
) -> Result<HttpResponse, ApiError> {
    debug!("Registration request for {}", body.email);
    let user = UserService::register(&body, &pool).await?;
    Ok(HttpResponse::Created().json(json!({
        "success": true,
        "message": "User registered, check your verification code",
        "user": user
    })))
}

#[post("/usuarios/verificar")]
async fn verify(
    pool: web::Data<DbPool>,
    body: web::Json<VerifyCodeRequest>,
) -> Result<HttpResponse, ApiError> {
    let user = UserService::verify(&body, &pool).await?;
    Ok(HttpResponse::Ok().json(json!({
        "success": true,
        "message": "Account verified",
        "user": user
    })))
}

#[post("/usuarios/reenviar-codigo")]
async fn resend_code(
    pool: web::Data<DbPool>,
    body: web::Json<ResendCodeRequest>,
) -> Result<HttpResponse, ApiError> {
    UserService::resend_code(&body.email, &pool).await?;
    Ok(HttpResponse::Ok().json(json!({
        "success": true,
        "message": "A new verification code has been sent"
    })))
}

#[post("/usuarios/pin")]
async fn set_pin(
    pool: web::Data<DbPool>,
    config: web::Data<AppConfig>,
    body: web::Json<SetPinRequest>,
) -> Result<HttpResponse, ApiError> {
    UserService::set_pin(&body, &config, &pool).await?;
    Ok(HttpResponse::Ok().json(json!({
        "success": true,
        "message": "PIN set successfully"
    })))
}

#[post("/usuarios/login")]
async fn login(
    pool: web::Data<DbPool>,
    config: web::Data<AppConfig>,
    body: web::Json<LoginRequest>,
) -> Result<HttpResponse, ApiError> {
    debug!("Login attempt for {}", body.email);
    let response = UserService::login(&body, &config, &pool).await?;
    Ok(HttpResponse::Ok().json(response))
}

#[post("/usuarios/logout")]
async fn logout(
    pool: web::Data<DbPool>,
    auth: AuthenticatedUser,
) -> Result<HttpResponse, ApiError> {
    AuthService::invalidate_token(&auth.token, &auth.claims, &pool).await?;
    Ok(HttpResponse::Ok().json(json!({
        "success": true,
        "message": "Logged out"
    })))
}

#[get("/usuarios/me")]
async fn me(pool: web::Data<DbPool>, auth: AuthenticatedUser) -> Result<HttpResponse, ApiError> {
    let user = UserService::get_user_by_id(auth.user_id, &pool).await?;
    Ok(HttpResponse::Ok().json(user))
}

#[put("/usuarios/me")]
async fn update_me(
    pool: web::Data<DbPool>,
    auth: AuthenticatedUser,
    body: web::Json<UpdateUserRequest>,
) -> Result<HttpResponse, ApiError> {
    let user = UserService::update_profile(auth.user_id, &body, &pool).await?;
    Ok(HttpResponse::Ok().json(user))
}

#[delete("/usuarios/me")]
async fn delete_me(
    pool: web::Data<DbPool>,
    config: web::Data<AppConfig>,
    auth: AuthenticatedUser,
) -> Result<HttpResponse, ApiError> {
    let photos = UserService::delete_user(auth.user_id, &pool).await?;
    UploadService::discard_all(config.upload_dir.clone(), photos).await;
    Ok(HttpResponse::Ok().json(json!({
        "success": true,
        "message": "Account deleted"
    })))
}

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(register)
        .service(verify)
        .service(resend_code)
        .service(set_pin)
        .service(login)
        .service(logout)
        .service(me)
        .service(update_me)
        .service(delete_me);
}
