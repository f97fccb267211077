use actix_web::http::StatusCode;
use actix_web::{error::ResponseError, HttpResponse};
use diesel::result::{DatabaseErrorKind, Error as DieselError};
use log::{debug, error, warn};
use serde_json::json;
use thiserror::Error;

// Every failure leaves the API as {"error": "<message>"}
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Database error: {0}")]
    DatabaseError(String),
    #[error("Validation error: {0}")]
    ValidationError(String),
    #[error("Authentication error: {0}")]
    AuthError(String),
    #[error("Forbidden: {0}")]
    ForbiddenError(String),
    #[error("Not found: {0}")]
    NotFoundError(String),
    #[error("Conflict: {0}")]
    ConflictError(String),
    #[error("Payload too large: {0}")]
    PayloadTooLarge(String),
    #[error("Internal server error: {0}")]
    InternalError(String),
}

impl ApiError {
    /// Message exposed to clients. Database and internal details stay in the logs.
    pub fn public_message(&self) -> String {
        match self {
            ApiError::DatabaseError(_) => "Database error".to_string(),
            ApiError::InternalError(_) => "Internal server error".to_string(),
            ApiError::ValidationError(msg)
            | ApiError::AuthError(msg)
            | ApiError::ForbiddenError(msg)
            | ApiError::NotFoundError(msg)
            | ApiError::ConflictError(msg)
            | ApiError::PayloadTooLarge(msg) => msg.clone(),
        }
    }
}

impl From<DieselError> for ApiError {
    fn from(e: DieselError) -> Self {
        match e {
            DieselError::NotFound => ApiError::NotFoundError("Record not found".to_string()),
            DieselError::DatabaseError(DatabaseErrorKind::UniqueViolation, info) => {
                debug!("Unique constraint violated: {}", info.message());
                ApiError::ConflictError(conflict_message(info.constraint_name()))
            }
            DieselError::DatabaseError(DatabaseErrorKind::ForeignKeyViolation, info) => {
                debug!("Foreign key violated: {}", info.message());
                ApiError::ValidationError("Referenced record does not exist".to_string())
            }
            other => ApiError::DatabaseError(other.to_string()),
        }
    }
}

impl From<r2d2::Error> for ApiError {
    fn from(e: r2d2::Error) -> Self {
        ApiError::DatabaseError(format!("Failed to get database connection: {}", e))
    }
}

impl From<actix_web::error::BlockingError> for ApiError {
    fn from(e: actix_web::error::BlockingError) -> Self {
        ApiError::InternalError(format!("Blocking task failed: {}", e))
    }
}

fn conflict_message(constraint: Option<&str>) -> String {
    match constraint {
        Some("user_account_email_key") => "Email already registered".to_string(),
        Some("user_account_phone_key") => "Phone already registered".to_string(),
        Some("animal_chip_number_key") => "Chip number already registered".to_string(),
        Some("uq_appointment_slot") => {
            "The veterinarian already has an appointment at this date and time".to_string()
        }
        _ => "Resource already exists".to_string(),
    }
}

impl ResponseError for ApiError {
    fn error_response(&self) -> HttpResponse {
        match self {
            ApiError::DatabaseError(msg) | ApiError::InternalError(msg) => error!("{}: {}", self.status_code(), msg),
            ApiError::AuthError(msg) | ApiError::ForbiddenError(msg) => warn!("{}: {}", self.status_code(), msg),
            _ => debug!("{}", self),
        }
        HttpResponse::build(self.status_code()).json(json!({ "error": self.public_message() }))
    }

    fn status_code(&self) -> StatusCode {
        match *self {
            ApiError::DatabaseError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            ApiError::ValidationError(_) => StatusCode::BAD_REQUEST,
            ApiError::AuthError(_) => StatusCode::UNAUTHORIZED,
            ApiError::ForbiddenError(_) => StatusCode::FORBIDDEN,
            ApiError::NotFoundError(_) => StatusCode::NOT_FOUND,
            ApiError::ConflictError(_) => StatusCode::CONFLICT,
            ApiError::PayloadTooLarge(_) => StatusCode::PAYLOAD_TOO_LARGE,
            ApiError::InternalError(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::body::to_bytes;
    use rstest::rstest;

    #[rstest]
    #[case(ApiError::ValidationError("bad".into()), StatusCode::BAD_REQUEST)]
    #[case(ApiError::AuthError("no".into()), StatusCode::UNAUTHORIZED)]
    #[case(ApiError::ForbiddenError("no".into()), StatusCode::FORBIDDEN)]
    #[case(ApiError::NotFoundError("gone".into()), StatusCode::NOT_FOUND)]
    #[case(ApiError::ConflictError("taken".into()), StatusCode::CONFLICT)]
    #[case(ApiError::PayloadTooLarge("big".into()), StatusCode::PAYLOAD_TOO_LARGE)]
    #[case(ApiError::DatabaseError("boom".into()), StatusCode::INTERNAL_SERVER_ERROR)]
    fn status_code_matches_variant(#[case] err: ApiError, #[case] expected: StatusCode) {
        assert_eq!(err.status_code(), expected);
    }

    #[actix_web::test]
    async fn database_details_are_not_exposed() {
        let err = ApiError::DatabaseError("relation \"animal\" does not exist".into());
        let response = err.error_response();
        let body = to_bytes(response.into_body()).await.unwrap();
        let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(json, json!({ "error": "Database error" }));
    }

    #[actix_web::test]
    async fn client_errors_keep_their_message() {
        let err = ApiError::ConflictError("Email already registered".into());
        let body = to_bytes(err.error_response().into_body()).await.unwrap();
        let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(json["error"], "Email already registered");
    }

    #[test]
    fn diesel_not_found_maps_to_404() {
        let err: ApiError = DieselError::NotFound.into();
        assert_eq!(err.status_code(), StatusCode::NOT_FOUND);
    }

    #[test]
    fn known_constraints_have_readable_conflicts() {
        assert_eq!(conflict_message(Some("user_account_phone_key")), "Phone already registered");
        assert_eq!(conflict_message(None), "Resource already exists");
    }
}
