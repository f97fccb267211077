use diesel::prelude::*;
use log::{debug, info};

use crate::config::AppConfig;
use crate::db::{self, DbPool};
use crate::errors::ApiError;
use crate::models::*;
use crate::services::auth::AuthService;
use crate::validation;

pub struct UserService;

impl UserService {
    pub async fn find_by_email(
        email_addr: &str,
        pool: &DbPool,
    ) -> Result<Option<UserAccount>, ApiError> {
        let email_copy = email_addr.trim().to_lowercase();
        db::run(pool, move |conn| {
            use crate::schema::user_account::dsl::*;
            Ok(user_account
                .filter(email.eq(email_copy))
                .select(UserAccount::as_select())
                .first(conn)
                .optional()?)
        })
        .await
    }

    pub async fn get_user_by_id(id: i32, pool: &DbPool) -> Result<UserAccount, ApiError> {
        db::run(pool, move |conn| {
            use crate::schema::user_account::dsl::*;
            user_account
                .find(id)
                .select(UserAccount::as_select())
                .first(conn)
                .optional()?
                .ok_or_else(|| ApiError::NotFoundError("User not found".to_string()))
        })
        .await
    }

    async fn require_by_email(email_addr: &str, pool: &DbPool) -> Result<UserAccount, ApiError> {
        Self::find_by_email(email_addr, pool)
            .await?
            .ok_or_else(|| ApiError::NotFoundError("User not found".to_string()))
    }

    /// Creates an unverified account and logs its verification code.
    pub async fn register(
        req: &RegisterUserRequest,
        pool: &DbPool,
    ) -> Result<UserAccount, ApiError> {
        let new_user = NewUserAccount {
            name: validation::validate_name("name", &req.name)?,
            email: validation::validate_email(&req.email)?,
            phone: validation::validate_phone(&req.phone)?,
            // Self-registration as a veterinarian is open; such accounts can read
            // every animal and record clinical data. There is no vetting step yet.
            user_type: req.user_type.parse::<UserType>()?.as_str().to_string(),
            verification_code: Some(AuthService::generate_verification_code()),
        };

        let user = db::run(pool, move |conn| {
            use crate::schema::user_account::dsl::*;
            Ok(diesel::insert_into(user_account)
                .values(&new_user)
                .returning(UserAccount::as_returning())
                .get_result(conn)?)
        })
        .await?;

        info!("Created new {} account with ID {}", user.user_type, user.user_id);
        Self::deliver_code(&user);
        Ok(user)
    }

    // There is no mail transport; the code goes to the log.
    fn deliver_code(user: &UserAccount) {
        if let Some(code) = &user.verification_code {
            info!("Verification code for {}: {}", user.email, code);
        }
    }

    pub async fn verify(req: &VerifyCodeRequest, pool: &DbPool) -> Result<UserAccount, ApiError> {
        validation::validate_code(&req.code)?;
        let user = Self::require_by_email(&req.email, pool).await?;

        if user.is_verified {
            debug!("User {} is already verified", user.user_id);
            return Ok(user);
        }
        Self::check_code(&user, &req.code)?;

        let id = user.user_id;
        let user = db::run(pool, move |conn| {
            use crate::schema::user_account::dsl::*;
            Ok(diesel::update(user_account.find(id))
                .set(is_verified.eq(true))
                .returning(UserAccount::as_returning())
                .get_result(conn)?)
        })
        .await?;

        info!("User {} verified", user.user_id);
        Ok(user)
    }

    fn check_code(user: &UserAccount, code: &str) -> Result<(), ApiError> {
        match &user.verification_code {
            Some(expected) if expected == code.trim() => Ok(()),
            Some(_) => Err(ApiError::ValidationError("Invalid verification code".to_string())),
            None => Err(ApiError::ValidationError(
                "No verification code pending, request a new one".to_string(),
            )),
        }
    }

    pub async fn resend_code(email_addr: &str, pool: &DbPool) -> Result<(), ApiError> {
        let user = Self::require_by_email(email_addr, pool).await?;
        let id = user.user_id;
        let fresh = AuthService::generate_verification_code();

        let user = db::run(pool, move |conn| {
            use crate::schema::user_account::dsl::*;
            Ok(diesel::update(user_account.find(id))
                .set(verification_code.eq(Some(fresh)))
                .returning(UserAccount::as_returning())
                .get_result(conn)?)
        })
        .await?;

        Self::deliver_code(&user);
        Ok(())
    }

    pub async fn set_pin(
        req: &SetPinRequest,
        config: &AppConfig,
        pool: &DbPool,
    ) -> Result<(), ApiError> {
        validation::validate_pin(&req.pin)?;
        validation::validate_code(&req.code)?;
        let user = Self::require_by_email(&req.email, pool).await?;

        if !user.is_verified {
            return Err(ApiError::ForbiddenError("Account is not verified".to_string()));
        }
        Self::check_code(&user, &req.code)?;

        let hashed = AuthService::hash_pin(&req.pin, config.bcrypt_cost)?;
        let id = user.user_id;
        db::run(pool, move |conn| {
            use crate::schema::user_account::dsl::*;
            diesel::update(user_account.find(id))
                .set((pin_hash.eq(Some(hashed)), verification_code.eq(None::<String>)))
                .execute(conn)?;
            Ok(())
        })
        .await?;

        info!("PIN set for user {}", id);
        Ok(())
    }

    pub async fn login(
        req: &LoginRequest,
        config: &AppConfig,
        pool: &DbPool,
    ) -> Result<LoginResponse, ApiError> {
        let invalid = || ApiError::AuthError("Invalid credentials".to_string());

        let user = match Self::find_by_email(&req.email, pool).await? {
            Some(user) => user,
            None => {
                debug!("Login failed: no user with email {}", req.email);
                return Err(invalid());
            }
        };

        if !user.is_verified {
            return Err(ApiError::ForbiddenError("Account is not verified".to_string()));
        }
        let stored = user
            .pin_hash
            .as_deref()
            .ok_or_else(|| ApiError::ForbiddenError("PIN has not been set".to_string()))?;

        if validation::validate_pin(&req.pin).is_err() || !AuthService::verify_pin(&req.pin, stored)? {
            debug!("Login failed: wrong PIN for user {}", user.user_id);
            return Err(invalid());
        }

        let (token, expires_at) =
            AuthService::generate_token(user.user_id, &user.email, user.kind()?, config)?;
        info!("User {} logged in", user.user_id);

        Ok(LoginResponse { token, expires_at, user })
    }

    pub async fn update_profile(
        id: i32,
        req: &UpdateUserRequest,
        pool: &DbPool,
    ) -> Result<UserAccount, ApiError> {
        let changes = UserChangeset {
            name: req
                .name
                .as_deref()
                .map(|n| validation::validate_name("name", n))
                .transpose()?,
            phone: req.phone.as_deref().map(validation::validate_phone).transpose()?,
        };

        if changes.name.is_none() && changes.phone.is_none() {
            return Self::get_user_by_id(id, pool).await;
        }

        db::run(pool, move |conn| {
            use crate::schema::user_account::dsl::*;
            diesel::update(user_account.find(id))
                .set(&changes)
                .returning(UserAccount::as_returning())
                .get_result(conn)
                .optional()?
                .ok_or_else(|| ApiError::NotFoundError("User not found".to_string()))
        })
        .await
    }

    /// Removes the account; animals, appointments and records cascade.
    /// Returns the photo URLs that belonged to the removed rows.
    pub async fn delete_user(id: i32, pool: &DbPool) -> Result<Vec<String>, ApiError> {
        let photos = db::run(pool, move |conn| {
            conn.transaction::<_, ApiError, _>(|conn| {
                use crate::schema::{animal, exam_record};

                let mut photos: Vec<String> = animal::table
                    .filter(animal::user_id.eq(id))
                    .filter(animal::photo_url.is_not_null())
                    .select(animal::photo_url.assume_not_null())
                    .load(conn)?;
                let exam_photos: Vec<String> = exam_record::table
                    .inner_join(animal::table)
                    .filter(animal::user_id.eq(id))
                    .filter(exam_record::photo_url.is_not_null())
                    .select(exam_record::photo_url.assume_not_null())
                    .load(conn)?;
                photos.extend(exam_photos);

                use crate::schema::user_account::dsl::*;
                let removed = diesel::delete(user_account.find(id)).execute(conn)?;
                if removed == 0 {
                    return Err(ApiError::NotFoundError("User not found".to_string()));
                }
                Ok(photos)
            })
        })
        .await?;

        info!("Deleted user {} ({} photos to remove)", id, photos.len());
        Ok(photos)
    }
}
