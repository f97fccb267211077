use actix_web::dev::{forward_ready, Payload, Service, ServiceRequest, ServiceResponse, Transform};
use actix_web::http::header::AUTHORIZATION;
use actix_web::{web, Error, FromRequest, HttpRequest};
use log::{debug, log, Level};
use std::future::{ready, Future, Ready};
use std::pin::Pin;
use std::rc::Rc;
use std::time::Instant;

use crate::config::AppConfig;
use crate::db::DbPool;
use crate::errors::ApiError;
use crate::models::{Claims, UserType};
use crate::rules::Caller;
use crate::services::AuthService;

// Logs one line per request with status and latency
pub struct RequestLogger;

impl<S, B> Transform<S, ServiceRequest> for RequestLogger
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type Transform = RequestLoggerMiddleware<S>;
    type InitError = ();
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(RequestLoggerMiddleware {
            service: Rc::new(service),
        }))
    }
}

pub struct RequestLoggerMiddleware<S> {
    service: Rc<S>,
}

impl<S, B> Service<ServiceRequest> for RequestLoggerMiddleware<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type Future = Pin<Box<dyn Future<Output = Result<Self::Response, Self::Error>> + 'static>>;

    forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let method = req.method().clone();
        let path = req.path().to_owned();
        let client_ip = req
            .connection_info()
            .realip_remote_addr()
            .map(|s| s.to_owned())
            .unwrap_or_else(|| String::from("unknown"));

        debug!("→ {} {} from {}", method, path, client_ip);

        let service = self.service.clone();

        Box::pin(async move {
            let start = Instant::now();
            let res = service.call(req).await?;
            let status = res.status();

            let level = if status.is_server_error() {
                Level::Error
            } else if status.is_client_error() {
                Level::Warn
            } else {
                Level::Info
            };
            log!(
                level,
                "{} {} {} {:.2?} ({})",
                method,
                path,
                status.as_u16(),
                start.elapsed(),
                client_ip
            );

            Ok(res)
        })
    }
}

/// Bearer token holder resolved for an authenticated route.
///
/// Extraction rejects with 401 when the header is missing or malformed,
/// when the signature or expiry check fails, and when the token has been
/// revoked by a logout.
#[derive(Debug, Clone)]
pub struct AuthenticatedUser {
    pub user_id: i32,
    pub email: String,
    pub user_type: UserType,
    pub token: String,
    pub claims: Claims,
}

impl AuthenticatedUser {
    pub fn caller(&self) -> Caller {
        Caller {
            user_id: self.user_id,
            user_type: self.user_type,
        }
    }
}

pub fn bearer_token(req: &HttpRequest) -> Result<String, ApiError> {
    let header = req
        .headers()
        .get(AUTHORIZATION)
        .ok_or_else(|| ApiError::AuthError("Missing Authorization header".to_string()))?;
    let value = header
        .to_str()
        .map_err(|_| ApiError::AuthError("Malformed Authorization header".to_string()))?;

    match value.split_once(' ') {
        Some((scheme, token)) if scheme.eq_ignore_ascii_case("bearer") && !token.trim().is_empty() => {
            Ok(token.trim().to_string())
        }
        _ => Err(ApiError::AuthError(
            "Authorization header must be 'Bearer <token>'".to_string(),
        )),
    }
}

impl FromRequest for AuthenticatedUser {
    type Error = ApiError;
    type Future = Pin<Box<dyn Future<Output = Result<Self, Self::Error>>>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        let token = bearer_token(req);
        let config = req.app_data::<web::Data<AppConfig>>().cloned();
        let pool = req.app_data::<web::Data<DbPool>>().cloned();

        Box::pin(async move {
            let token = token?;
            let (config, pool) = match (config, pool) {
                (Some(config), Some(pool)) => (config, pool),
                _ => {
                    return Err(ApiError::InternalError(
                        "Authentication is not configured".to_string(),
                    ))
                }
            };

            let claims = AuthService::decode_token(&token, &config)?;
            if AuthService::is_token_revoked(&token, &pool).await? {
                return Err(ApiError::AuthError("Token has been revoked".to_string()));
            }

            Ok(AuthenticatedUser {
                user_id: claims.user_id,
                email: claims.email.clone(),
                user_type: claims.user_type,
                token,
                claims,
            })
        })
    }
}
