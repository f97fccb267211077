use chrono::{Duration, NaiveDate, NaiveDateTime};
use diesel::pg::PgConnection;
use diesel::prelude::*;
use log::info;

use crate::db::{self, DbPool};
use crate::errors::ApiError;
use crate::models::*;
use crate::rules::{self, Caller};
use crate::services::animals::{find_animal, owned_animal, readable_animal};
use crate::services::clinics::find_vaccine_type;
use crate::validation;

pub struct VaccineService;

impl VaccineService {
    pub async fn schedule(
        caller: Caller,
        req: &CreateVaccineRequest,
        now: NaiveDateTime,
        pool: &DbPool,
    ) -> Result<VaccineRecord, ApiError> {
        let date = validation::parse_date("date", &req.date)?;
        let time = validation::parse_time("time", &req.time)?;
        rules::ensure_not_past(date, time, now, "a vaccine")?;

        let record = NewVaccineRecord {
            animal_id: req.animal_id,
            vaccine_type_id: req.vaccine_type_id,
            scheduled_date: date,
            scheduled_time: time,
            status: VaccineStatus::Scheduled.as_str().to_string(),
        };

        let created = db::run(pool, move |conn| {
            owned_animal(conn, record.animal_id, &caller)?;
            find_vaccine_type(conn, record.vaccine_type_id)?;

            use crate::schema::vaccine_record::dsl::*;
            Ok(diesel::insert_into(vaccine_record)
                .values(&record)
                .returning(VaccineRecord::as_returning())
                .get_result(conn)?)
        })
        .await?;

        info!(
            "Vaccine {} scheduled for animal {} on {} {}",
            created.vaccine_id, created.animal_id, date, time
        );
        Ok(created)
    }

    pub async fn list_for_animal(
        pet_id: i32,
        caller: Caller,
        pool: &DbPool,
    ) -> Result<Vec<VaccineRecord>, ApiError> {
        db::run(pool, move |conn| {
            readable_animal(conn, pet_id, &caller)?;
            use crate::schema::vaccine_record::dsl::*;
            Ok(vaccine_record
                .filter(animal_id.eq(pet_id))
                .order((scheduled_date.asc(), scheduled_time.asc()))
                .select(VaccineRecord::as_select())
                .load(conn)?)
        })
        .await
    }

    /// Marks a scheduled vaccine as applied and computes the booster date.
    pub async fn apply(
        id: i32,
        caller: Caller,
        req: &ApplyVaccineRequest,
        today: NaiveDate,
        pool: &DbPool,
    ) -> Result<VaccineRecord, ApiError> {
        let applied_on = match req.applied_date.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
            Some(raw) => validation::parse_date("applied_date", raw)?,
            None => today,
        };
        if applied_on > today {
            return Err(ApiError::ValidationError(
                "Applied date cannot be in the future".to_string(),
            ));
        }

        let updated = db::run(pool, move |conn| {
            let current = find_record(conn, id)?;
            let pet = find_animal(conn, current.animal_id)?;
            rules::ensure_owner_or_vet(pet.user_id, &caller, "record", "vaccine")?;
            rules::ensure_vaccine_pending(current.status.parse()?)?;
            let kind = find_vaccine_type(conn, current.vaccine_type_id)?;
            let due = rules::next_due_date(applied_on, kind.interval_days);

            use crate::schema::vaccine_record::dsl::*;
            Ok(diesel::update(vaccine_record.find(id))
                .set((
                    applied_date.eq(Some(applied_on)),
                    next_due_date.eq(due),
                    status.eq(VaccineStatus::Applied.as_str()),
                ))
                .returning(VaccineRecord::as_returning())
                .get_result(conn)?)
        })
        .await?;

        info!(
            "Vaccine {} applied on {}, next due {:?}",
            id, applied_on, updated.next_due_date
        );
        Ok(updated)
    }

    pub async fn cancel(id: i32, caller: Caller, pool: &DbPool) -> Result<VaccineRecord, ApiError> {
        db::run(pool, move |conn| {
            let current = find_record(conn, id)?;
            owned_animal(conn, current.animal_id, &caller)?;
            rules::ensure_vaccine_pending(current.status.parse()?)?;

            use crate::schema::vaccine_record::dsl::*;
            Ok(diesel::update(vaccine_record.find(id))
                .set(status.eq(VaccineStatus::Cancelled.as_str()))
                .returning(VaccineRecord::as_returning())
                .get_result(conn)?)
        })
        .await
    }

    /// Scheduled vaccines and boosters falling due within `window_days` of `today`.
    pub async fn pending(
        caller: Caller,
        today: NaiveDate,
        window_days: i64,
        pool: &DbPool,
    ) -> Result<Vec<VaccineRecord>, ApiError> {
        let horizon = window_end(today, window_days)?;
        db::run(pool, move |conn| {
            use crate::schema::animal;
            use crate::schema::vaccine_record::dsl::*;

            let due_soon = status
                .eq(VaccineStatus::Scheduled.as_str())
                .and(scheduled_date.between(today, horizon))
                .or(status
                    .eq(VaccineStatus::Applied.as_str())
                    .and(next_due_date.between(today, horizon)));

            let mut query = vaccine_record
                .inner_join(animal::table)
                .filter(due_soon)
                .select(VaccineRecord::as_select())
                .into_boxed();
            if !caller.is_vet() {
                query = query.filter(animal::user_id.eq(caller.user_id));
            }
            Ok(query.order(scheduled_date.asc()).load(conn)?)
        })
        .await
    }

    /// Flags scheduled vaccines inside the reminder window as notified and logs
    /// one reminder each. Returns how many were flagged.
    pub async fn flag_due_reminders(
        today: NaiveDate,
        window_days: i64,
        pool: &DbPool,
    ) -> Result<usize, ApiError> {
        let horizon = window_end(today, window_days)?;
        let flagged = db::run(pool, move |conn| {
            use crate::schema::vaccine_record::dsl::*;
            Ok(diesel::update(
                vaccine_record
                    .filter(status.eq(VaccineStatus::Scheduled.as_str()))
                    .filter(notified.eq(false))
                    .filter(scheduled_date.between(today, horizon)),
            )
            .set(notified.eq(true))
            .returning(VaccineRecord::as_returning())
            .get_results(conn)?)
        })
        .await?;

        for record in &flagged {
            info!(
                "Reminder: vaccine {} for animal {} scheduled on {} at {}",
                record.vaccine_id, record.animal_id, record.scheduled_date, record.scheduled_time
            );
        }
        Ok(flagged.len())
    }
}

/// Last day of the reminder window starting at `today`.
fn window_end(today: NaiveDate, window_days: i64) -> Result<NaiveDate, ApiError> {
    Duration::try_days(window_days)
        .and_then(|span| today.checked_add_signed(span))
        .ok_or_else(|| {
            ApiError::InternalError(format!("Reminder window of {} days is out of range", window_days))
        })
}

fn find_record(conn: &mut PgConnection, id: i32) -> Result<VaccineRecord, ApiError> {
    use crate::schema::vaccine_record::dsl::*;
    vaccine_record
        .find(id)
        .select(VaccineRecord::as_select())
        .first(conn)
        .optional()?
        .ok_or_else(|| ApiError::NotFoundError(format!("Vaccine {} not found", id)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn day(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[rstest]
    #[case(0, day(2026, 10, 17))]
    #[case(7, day(2026, 10, 24))]
    #[case(3650, day(2036, 10, 14))]
    fn window_end_adds_days(#[case] window: i64, #[case] expected: NaiveDate) {
        assert_eq!(window_end(day(2026, 10, 17), window).unwrap(), expected);
    }

    #[rstest]
    #[case(1_000_000_000)]
    #[case(i64::MAX)]
    fn oversized_window_is_an_error_not_a_panic(#[case] window: i64) {
        assert!(matches!(
            window_end(day(2026, 10, 17), window),
            Err(ApiError::InternalError(_))
        ));
    }
}
