use diesel::pg::PgConnection;
use diesel::prelude::*;
use log::info;

use crate::db::{self, DbPool};
use crate::errors::ApiError;
use crate::models::*;
use crate::rules::{self, Caller};
use crate::services::animals::{find_animal, owned_animal, readable_animal};
use crate::services::clinics::find_exam_type;
use crate::validation;

pub struct ExamService;

impl ExamService {
    pub async fn create(
        caller: Caller,
        req: &CreateExamRequest,
        pool: &DbPool,
    ) -> Result<ExamRecord, ApiError> {
        let record = NewExamRecord {
            animal_id: req.animal_id,
            exam_type_id: req.exam_type_id,
            exam_date: validation::parse_date("date", &req.date)?,
            result: validation::optional_text(req.result.clone()),
            observations: validation::optional_text(req.observations.clone()),
        };

        let created = db::run(pool, move |conn| {
            let pet = find_animal(conn, record.animal_id)?;
            rules::ensure_owner_or_vet(pet.user_id, &caller, "record", "exam")?;
            find_exam_type(conn, record.exam_type_id)?;

            use crate::schema::exam_record::dsl::*;
            Ok(diesel::insert_into(exam_record)
                .values(&record)
                .returning(ExamRecord::as_returning())
                .get_result(conn)?)
        })
        .await?;

        info!("Exam {} recorded for animal {}", created.exam_id, created.animal_id);
        Ok(created)
    }

    pub async fn list_for_animal(
        pet_id: i32,
        caller: Caller,
        pool: &DbPool,
    ) -> Result<Vec<ExamRecord>, ApiError> {
        db::run(pool, move |conn| {
            readable_animal(conn, pet_id, &caller)?;
            use crate::schema::exam_record::dsl::*;
            Ok(exam_record
                .filter(animal_id.eq(pet_id))
                .order(exam_date.desc())
                .select(ExamRecord::as_select())
                .load(conn)?)
        })
        .await
    }

    pub async fn get(id: i32, caller: Caller, pool: &DbPool) -> Result<ExamRecord, ApiError> {
        db::run(pool, move |conn| {
            let found = find_exam(conn, id)?;
            readable_animal(conn, found.animal_id, &caller)?;
            Ok(found)
        })
        .await
    }

    pub async fn update(
        id: i32,
        caller: Caller,
        req: &UpdateExamRequest,
        pool: &DbPool,
    ) -> Result<ExamRecord, ApiError> {
        let changes = ExamChangeset {
            exam_date: req
                .date
                .as_deref()
                .map(|d| validation::parse_date("date", d))
                .transpose()?,
            result: validation::optional_text(req.result.clone()),
            observations: validation::optional_text(req.observations.clone()),
        };

        db::run(pool, move |conn| {
            let current = recordable_exam(conn, id, &caller)?;
            if changes.exam_date.is_none() && changes.result.is_none() && changes.observations.is_none() {
                return Ok(current);
            }

            use crate::schema::exam_record::dsl::*;
            Ok(diesel::update(exam_record.find(id))
                .set(&changes)
                .returning(ExamRecord::as_returning())
                .get_result(conn)?)
        })
        .await
    }

    /// Ownership / vet check before an upload is written to disk.
    pub async fn get_recordable(id: i32, caller: Caller, pool: &DbPool) -> Result<ExamRecord, ApiError> {
        db::run(pool, move |conn| recordable_exam(conn, id, &caller)).await
    }

    pub async fn set_photo(id: i32, url: String, pool: &DbPool) -> Result<ExamRecord, ApiError> {
        db::run(pool, move |conn| {
            use crate::schema::exam_record::dsl::*;
            diesel::update(exam_record.find(id))
                .set(photo_url.eq(Some(url)))
                .returning(ExamRecord::as_returning())
                .get_result(conn)
                .optional()?
                .ok_or_else(|| ApiError::NotFoundError(format!("Exam {} not found", id)))
        })
        .await
    }

    pub async fn delete(id: i32, caller: Caller, pool: &DbPool) -> Result<ExamRecord, ApiError> {
        let removed = db::run(pool, move |conn| {
            let current = find_exam(conn, id)?;
            owned_animal(conn, current.animal_id, &caller)?;
            use crate::schema::exam_record::dsl::*;
            diesel::delete(exam_record.find(id)).execute(conn)?;
            Ok(current)
        })
        .await?;

        info!("Exam {} deleted by user {}", id, caller.user_id);
        Ok(removed)
    }
}

fn find_exam(conn: &mut PgConnection, id: i32) -> Result<ExamRecord, ApiError> {
    use crate::schema::exam_record::dsl::*;
    exam_record
        .find(id)
        .select(ExamRecord::as_select())
        .first(conn)
        .optional()?
        .ok_or_else(|| ApiError::NotFoundError(format!("Exam {} not found", id)))
}

fn recordable_exam(conn: &mut PgConnection, id: i32, caller: &Caller) -> Result<ExamRecord, ApiError> {
    let found = find_exam(conn, id)?;
    let pet = find_animal(conn, found.animal_id)?;
    rules::ensure_owner_or_vet(pet.user_id, caller, "record", "exam")?;
    Ok(found)
}
