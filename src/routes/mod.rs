//! HTTP surface. Each submodule owns one resource and exposes `configure`.

use actix_web::{web, HttpRequest};

use crate::errors::ApiError;

pub mod animals;
pub mod appointments;
pub mod clinics;
pub mod exams;
pub mod index;
pub mod users;
pub mod vaccines;


fn json_error(err: actix_web::error::JsonPayloadError, _req: &HttpRequest) -> actix_web::Error {
    ApiError::ValidationError(format!("Invalid JSON body: {}", err)).into()
}

fn path_error(err: actix_web::error::PathError, _req: &HttpRequest) -> actix_web::Error {
    ApiError::ValidationError(format!("Invalid path parameter: {}", err)).into()
}

/// Registers every route plus the extractor error handlers, so malformed
/// bodies and ids answer with the same `{"error": ...}` shape as the services.
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.app_data(web::JsonConfig::default().error_handler(json_error))
        .app_data(web::PathConfig::default().error_handler(path_error))
        .configure(index::configure)
        .configure(users::configure)
        .configure(clinics::configure)
        .configure(animals::configure)
        .configure(appointments::configure)
        .configure(vaccines::configure)
        .configure(exams::configure);
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::http::{header, StatusCode};
    use actix_web::{test, App};
    use diesel::pg::PgConnection;
    use diesel::r2d2::{ConnectionManager, Pool};
    use rstest::rstest;
    use serde_json::Value;
    use std::time::Duration;

    use crate::config::AppConfig;
    use crate::db::DbPool;
    use crate::models::UserType;
    use crate::services::AuthService;

    // Nothing listens on port 1, so every checkout fails fast.
    fn offline_pool() -> DbPool {
        let manager = ConnectionManager::<PgConnection>::new("postgres://nobody@127.0.0.1:1/none");
        Pool::builder()
            .max_size(1)
            .connection_timeout(Duration::from_millis(200))
            .build_unchecked(manager)
    }

    fn test_config() -> AppConfig {
        AppConfig {
            jwt_secret: "routes-test-secret-with-enough-length".to_string(),
            ..AppConfig::default()
        }
    }

    fn test_app() -> App<
        impl actix_web::dev::ServiceFactory<
            actix_web::dev::ServiceRequest,
            Config = (),
            Response = actix_web::dev::ServiceResponse,
            Error = actix_web::Error,
            InitError = (),
        >,
    > {
        App::new()
            .app_data(web::Data::new(offline_pool()))
            .app_data(web::Data::new(test_config()))
            .configure(configure)
    }

    #[actix_web::test]
    async fn health_reports_ok() {
        let app = test::init_service(test_app()).await;
        let req = test::TestRequest::get().uri("/health").to_request();
        let body: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body["status"], "ok");
        assert!(body["timestamp"].is_string());
    }

    #[actix_web::test]
    async fn index_degrades_when_database_is_down() {
        let app = test::init_service(test_app()).await;
        let req = test::TestRequest::get().uri("/").to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::OK);

        let body: Value = test::read_body_json(resp).await;
        assert_eq!(body["database"], "disconnected");
        assert!(body["endpoints"]["consultas"].is_array());
    }

    #[rstest]
    #[case::no_header(None)]
    #[case::wrong_scheme(Some("Basic abc"))]
    #[case::empty_bearer(Some("Bearer "))]
    #[case::garbage_token(Some("Bearer not.a.jwt"))]
    #[actix_web::test]
    async fn protected_routes_reject_bad_credentials(#[case] auth: Option<&str>) {
        let app = test::init_service(test_app()).await;
        let mut req = test::TestRequest::get().uri("/animais");
        if let Some(value) = auth {
            req = req.insert_header((header::AUTHORIZATION, value));
        }
        let resp = test::call_service(&app, req.to_request()).await;
        assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);

        let body: Value = test::read_body_json(resp).await;
        assert!(body["error"].is_string());
    }

    #[actix_web::test]
    async fn token_signed_with_another_secret_is_rejected() {
        let app = test::init_service(test_app()).await;
        let other = AppConfig {
            jwt_secret: "some-other-secret-entirely-different".to_string(),
            ..AppConfig::default()
        };
        let (token, _) = AuthService::generate_token(1, "a@b.com", UserType::Tutor, &other).unwrap();

        let req = test::TestRequest::get()
            .uri("/consultas")
            .insert_header((header::AUTHORIZATION, format!("Bearer {}", token)))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    }

    #[actix_web::test]
    async fn valid_token_without_database_is_a_server_error() {
        let app = test::init_service(test_app()).await;
        let (token, _) =
            AuthService::generate_token(1, "a@b.com", UserType::Tutor, &test_config()).unwrap();

        let req = test::TestRequest::get()
            .uri("/usuarios/me")
            .insert_header((header::AUTHORIZATION, format!("Bearer {}", token)))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);

        let body: Value = test::read_body_json(resp).await;
        assert!(!body["error"].as_str().unwrap().contains("127.0.0.1"));
    }

    #[actix_web::test]
    async fn malformed_json_is_a_bad_request() {
        let app = test::init_service(test_app()).await;
        let req = test::TestRequest::post()
            .uri("/usuarios/login")
            .insert_header((header::CONTENT_TYPE, "application/json"))
            .set_payload("{not json")
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

        let body: Value = test::read_body_json(resp).await;
        assert!(body["error"].as_str().unwrap().starts_with("Invalid JSON body"));
    }

    #[actix_web::test]
    async fn non_numeric_id_is_a_bad_request() {
        let app = test::init_service(test_app()).await;
        let req = test::TestRequest::get().uri("/clinicas/abc").to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    }
}
