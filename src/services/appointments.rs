use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use diesel::pg::PgConnection;
use diesel::prelude::*;
use log::info;

use crate::db::{self, DbPool};
use crate::errors::ApiError;
use crate::models::*;
use crate::rules::{self, Caller};
use crate::services::animals::{find_animal, readable_animal};
use crate::services::clinics::{find_clinic, find_vet};
use crate::validation;

pub struct AppointmentService;

impl AppointmentService {
    /// Books a consulta after running the guard sequence; the slot check and
    /// insert share one transaction.
    pub async fn book(
        caller: Caller,
        req: &CreateAppointmentRequest,
        now: NaiveDateTime,
        pool: &DbPool,
    ) -> Result<Appointment, ApiError> {
        let date = validation::parse_date("date", &req.date)?;
        let time = validation::parse_time("time", &req.time)?;
        rules::ensure_not_past(date, time, now, "an appointment")?;

        let new_appointment = NewAppointment {
            user_id: caller.user_id,
            animal_id: req.animal_id,
            clinic_id: req.clinic_id,
            vet_id: req.vet_id,
            appointment_date: date,
            appointment_time: time,
            reason: validation::optional_text(req.reason.clone()),
            status: AppointmentStatus::Scheduled.as_str().to_string(),
        };

        let booked = db::run(pool, move |conn| {
            let pet = find_animal(conn, new_appointment.animal_id)?;
            rules::ensure_owner(pet.user_id, &caller, "animal")?;
            find_clinic(conn, new_appointment.clinic_id)?;
            let vet = find_vet(conn, new_appointment.vet_id)?;
            rules::ensure_vet_at_clinic(&vet, new_appointment.clinic_id)?;

            conn.transaction::<_, ApiError, _>(|conn| {
                let taken = find_conflict(conn, vet.vet_id, date, time, None)?;
                rules::ensure_slot_free(taken)?;

                use crate::schema::appointment::dsl::*;
                Ok(diesel::insert_into(appointment)
                    .values(&new_appointment)
                    .returning(Appointment::as_returning())
                    .get_result(conn)?)
            })
        })
        .await?;

        info!(
            "Appointment {} booked for animal {} with vet {} on {} {}",
            booked.appointment_id, booked.animal_id, booked.vet_id, date, time
        );
        Ok(booked)
    }

    pub async fn list_for(caller: Caller, pool: &DbPool) -> Result<Vec<Appointment>, ApiError> {
        db::run(pool, move |conn| {
            use crate::schema::appointment::dsl::*;
            let mut query = appointment.select(Appointment::as_select()).into_boxed();
            if !caller.is_vet() {
                query = query.filter(user_id.eq(caller.user_id));
            }
            Ok(query
                .order((appointment_date.asc(), appointment_time.asc()))
                .load(conn)?)
        })
        .await
    }

    pub async fn list_for_animal(
        pet_id: i32,
        caller: Caller,
        pool: &DbPool,
    ) -> Result<Vec<Appointment>, ApiError> {
        db::run(pool, move |conn| {
            readable_animal(conn, pet_id, &caller)?;
            use crate::schema::appointment::dsl::*;
            Ok(appointment
                .filter(animal_id.eq(pet_id))
                .order((appointment_date.asc(), appointment_time.asc()))
                .select(Appointment::as_select())
                .load(conn)?)
        })
        .await
    }

    pub async fn get(id: i32, caller: Caller, pool: &DbPool) -> Result<Appointment, ApiError> {
        db::run(pool, move |conn| {
            let found = find_appointment(conn, id)?;
            rules::ensure_owner_or_vet(found.user_id, &caller, "access", "appointment")?;
            Ok(found)
        })
        .await
    }

    pub async fn reschedule(
        id: i32,
        caller: Caller,
        req: &RescheduleAppointmentRequest,
        now: NaiveDateTime,
        pool: &DbPool,
    ) -> Result<Appointment, ApiError> {
        let date = validation::parse_date("date", &req.date)?;
        let time = validation::parse_time("time", &req.time)?;
        rules::ensure_not_past(date, time, now, "an appointment")?;
        let new_vet = req.vet_id;
        let new_reason = validation::optional_text(req.reason.clone());

        let updated = db::run(pool, move |conn| {
            conn.transaction::<_, ApiError, _>(|conn| {
                let current = find_appointment(conn, id)?;
                rules::ensure_owner(current.user_id, &caller, "appointment")?;
                rules::ensure_reschedulable(current.current_status()?)?;

                let target_vet = match new_vet {
                    Some(v) if v != current.vet_id => {
                        let vet = find_vet(conn, v)?;
                        rules::ensure_vet_at_clinic(&vet, current.clinic_id)?;
                        vet.vet_id
                    }
                    _ => current.vet_id,
                };

                let taken = find_conflict(conn, target_vet, date, time, Some(id))?;
                rules::ensure_slot_free(taken)?;

                use crate::schema::appointment::dsl::*;
                Ok(diesel::update(appointment.find(id))
                    .set((
                        vet_id.eq(target_vet),
                        appointment_date.eq(date),
                        appointment_time.eq(time),
                        reason.eq(new_reason.or(current.reason)),
                    ))
                    .returning(Appointment::as_returning())
                    .get_result(conn)?)
            })
        })
        .await?;

        info!(
            "Appointment {} rescheduled to {} {} with vet {}",
            updated.appointment_id, date, time, updated.vet_id
        );
        Ok(updated)
    }

    pub async fn update_status(
        id: i32,
        caller: Caller,
        next: AppointmentStatus,
        pool: &DbPool,
    ) -> Result<Appointment, ApiError> {
        let updated = db::run(pool, move |conn| {
            let current = find_appointment(conn, id)?;
            rules::ensure_owner_or_vet(current.user_id, &caller, "access", "appointment")?;
            rules::ensure_status_transition(current.current_status()?, next, current.user_id, &caller)?;

            use crate::schema::appointment::dsl::*;
            Ok(diesel::update(appointment.find(id))
                .set(status.eq(next.as_str()))
                .returning(Appointment::as_returning())
                .get_result(conn)?)
        })
        .await?;

        info!("Appointment {} is now {}", id, updated.status);
        Ok(updated)
    }

    pub async fn cancel(id: i32, caller: Caller, pool: &DbPool) -> Result<Appointment, ApiError> {
        let owner = db::run(pool, move |conn| Ok(find_appointment(conn, id)?.user_id)).await?;
        rules::ensure_owner(owner, &caller, "appointment")?;
        Self::update_status(id, caller, AppointmentStatus::Cancelled, pool).await
    }
}

fn find_appointment(conn: &mut PgConnection, id: i32) -> Result<Appointment, ApiError> {
    use crate::schema::appointment::dsl::*;
    appointment
        .find(id)
        .select(Appointment::as_select())
        .first(conn)
        .optional()?
        .ok_or_else(|| ApiError::NotFoundError(format!("Appointment {} not found", id)))
}

/// Id of a non-cancelled appointment already holding `(vet, date, time)`.
fn find_conflict(
    conn: &mut PgConnection,
    vet: i32,
    date: NaiveDate,
    time: NaiveTime,
    exclude: Option<i32>,
) -> Result<Option<i32>, ApiError> {
    use crate::schema::appointment::dsl::*;
    let mut query = appointment
        .filter(vet_id.eq(vet))
        .filter(appointment_date.eq(date))
        .filter(appointment_time.eq(time))
        .filter(status.ne(AppointmentStatus::Cancelled.as_str()))
        .select(appointment_id)
        .into_boxed();
    if let Some(own) = exclude {
        query = query.filter(appointment_id.ne(own));
    }
    Ok(query.first::<i32>(conn).optional()?)
}
