use diesel::prelude::*;
use diesel::pg::PgConnection;

use crate::db::{self, DbPool};
use crate::errors::ApiError;
use crate::models::{Clinic, ExamType, VaccineType, Veterinarian};

/// Read access to the seeded reference tables.
pub struct ClinicService;

impl ClinicService {
    pub async fn list_clinics(pool: &DbPool) -> Result<Vec<Clinic>, ApiError> {
        db::run(pool, |conn| {
            use crate::schema::clinic::dsl::*;
            Ok(clinic.order(name.asc()).select(Clinic::as_select()).load(conn)?)
        })
        .await
    }

    pub async fn get_clinic(id: i32, pool: &DbPool) -> Result<Clinic, ApiError> {
        db::run(pool, move |conn| find_clinic(conn, id)).await
    }

    pub async fn list_vets(clinic: Option<i32>, pool: &DbPool) -> Result<Vec<Veterinarian>, ApiError> {
        db::run(pool, move |conn| {
            use crate::schema::veterinarian::dsl::*;
            let mut query = veterinarian.select(Veterinarian::as_select()).into_boxed();
            if let Some(id) = clinic {
                find_clinic(conn, id)?;
                query = query.filter(clinic_id.eq(id));
            }
            Ok(query.order(name.asc()).load(conn)?)
        })
        .await
    }

    pub async fn list_vaccine_types(pool: &DbPool) -> Result<Vec<VaccineType>, ApiError> {
        db::run(pool, |conn| {
            use crate::schema::vaccine_type::dsl::*;
            Ok(vaccine_type.order(name.asc()).select(VaccineType::as_select()).load(conn)?)
        })
        .await
    }

    pub async fn list_exam_types(pool: &DbPool) -> Result<Vec<ExamType>, ApiError> {
        db::run(pool, |conn| {
            use crate::schema::exam_type::dsl::*;
            Ok(exam_type.order(name.asc()).select(ExamType::as_select()).load(conn)?)
        })
        .await
    }
}

pub(crate) fn find_clinic(conn: &mut PgConnection, id: i32) -> Result<Clinic, ApiError> {
    use crate::schema::clinic::dsl::*;
    clinic
        .find(id)
        .select(Clinic::as_select())
        .first(conn)
        .optional()?
        .ok_or_else(|| ApiError::NotFoundError(format!("Clinic {} not found", id)))
}

pub(crate) fn find_vet(conn: &mut PgConnection, id: i32) -> Result<Veterinarian, ApiError> {
    use crate::schema::veterinarian::dsl::*;
    veterinarian
        .find(id)
        .select(Veterinarian::as_select())
        .first(conn)
        .optional()?
        .ok_or_else(|| ApiError::NotFoundError(format!("Veterinarian {} not found", id)))
}

pub(crate) fn find_vaccine_type(conn: &mut PgConnection, id: i32) -> Result<VaccineType, ApiError> {
    use crate::schema::vaccine_type::dsl::*;
    vaccine_type
        .find(id)
        .select(VaccineType::as_select())
        .first(conn)
        .optional()?
        .ok_or_else(|| ApiError::NotFoundError(format!("Vaccine type {} not found", id)))
}

pub(crate) fn find_exam_type(conn: &mut PgConnection, id: i32) -> Result<ExamType, ApiError> {
    use crate::schema::exam_type::dsl::*;
    exam_type
        .find(id)
        .select(ExamType::as_select())
        .first(conn)
        .optional()?
        .ok_or_else(|| ApiError::NotFoundError(format!("Exam type {} not found", id)))
}
