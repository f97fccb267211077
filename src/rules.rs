//! Booking and permission guards.
//!
//! These are the checks every mutating route runs before it touches the
//! database. They are plain functions over already-loaded rows so the
//! services can call them inside a transaction and tests can call them
//! without one.

use chrono::{Duration, NaiveDate, NaiveDateTime, NaiveTime};

use crate::errors::ApiError;
use crate::models::{AppointmentStatus, UserType, VaccineStatus, Veterinarian};

/// Identity of the caller as far as permission checks are concerned.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Caller {
    pub user_id: i32,
    pub user_type: UserType,
}

impl Caller {
    pub fn is_vet(&self) -> bool {
        self.user_type == UserType::Veterinarian
    }
}

/// Only the owning tutor may mutate a record.
pub fn ensure_owner(owner_id: i32, caller: &Caller, what: &str) -> Result<(), ApiError> {
    if owner_id != caller.user_id {
        return Err(ApiError::ForbiddenError(format!(
            "You do not have permission to modify this {}",
            what
        )));
    }
    Ok(())
}

/// Owners and veterinarians may read, and may write clinical records
/// (exams, applied vaccines). `action` names the attempt in the error.
pub fn ensure_owner_or_vet(
    owner_id: i32,
    caller: &Caller,
    action: &str,
    what: &str,
) -> Result<(), ApiError> {
    if owner_id != caller.user_id && !caller.is_vet() {
        return Err(ApiError::ForbiddenError(format!(
            "You do not have permission to {} this {}",
            action, what
        )));
    }
    Ok(())
}

pub fn ensure_tutor(caller: &Caller) -> Result<(), ApiError> {
    if caller.is_vet() {
        return Err(ApiError::ForbiddenError(
            "Only tutors can register animals".to_string(),
        ));
    }
    Ok(())
}

pub fn ensure_not_past(
    date: NaiveDate,
    time: NaiveTime,
    now: NaiveDateTime,
    what: &str,
) -> Result<(), ApiError> {
    if date.and_time(time) <= now {
        return Err(ApiError::ValidationError(format!(
            "Cannot schedule {} in the past",
            what
        )));
    }
    Ok(())
}

pub fn ensure_vet_at_clinic(vet: &Veterinarian, clinic_id: i32) -> Result<(), ApiError> {
    if vet.clinic_id != clinic_id {
        return Err(ApiError::ValidationError(format!(
            "Veterinarian {} does not work at clinic {}",
            vet.vet_id, clinic_id
        )));
    }
    Ok(())
}

pub fn ensure_slot_free(conflicting: Option<i32>) -> Result<(), ApiError> {
    match conflicting {
        Some(id) => Err(ApiError::ConflictError(format!(
            "The veterinarian already has an appointment at this date and time (consulta {})",
            id
        ))),
        None => Ok(()),
    }
}

pub fn ensure_reschedulable(status: AppointmentStatus) -> Result<(), ApiError> {
    if status != AppointmentStatus::Scheduled {
        return Err(ApiError::ValidationError(format!(
            "Cannot change an appointment that is {}",
            status.as_str()
        )));
    }
    Ok(())
}

/// Tutors may only cancel their own appointments; veterinarians may close or cancel any.
pub fn ensure_status_transition(
    current: AppointmentStatus,
    next: AppointmentStatus,
    owner_id: i32,
    caller: &Caller,
) -> Result<(), ApiError> {
    ensure_reschedulable(current)?;
    match next {
        AppointmentStatus::Scheduled => Err(ApiError::ValidationError(
            "Appointment is already scheduled".to_string(),
        )),
        AppointmentStatus::Cancelled if caller.is_vet() || owner_id == caller.user_id => Ok(()),
        AppointmentStatus::Done if caller.is_vet() => Ok(()),
        AppointmentStatus::Done => Err(ApiError::ForbiddenError(
            "Only veterinarians can mark an appointment as done".to_string(),
        )),
        AppointmentStatus::Cancelled => Err(ApiError::ForbiddenError(
            "You do not have permission to modify this appointment".to_string(),
        )),
    }
}

pub fn ensure_vaccine_pending(status: VaccineStatus) -> Result<(), ApiError> {
    if status != VaccineStatus::Scheduled {
        return Err(ApiError::ValidationError(format!(
            "Vaccine is already {}",
            status.as_str()
        )));
    }
    Ok(())
}

pub fn next_due_date(applied: NaiveDate, interval_days: i32) -> Option<NaiveDate> {
    applied.checked_add_signed(Duration::days(i64::from(interval_days)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::{fixture, rstest};

    #[fixture]
    fn tutor() -> Caller {
        Caller { user_id: 1, user_type: UserType::Tutor }
    }

    #[fixture]
    fn vet() -> Caller {
        Caller { user_id: 2, user_type: UserType::Veterinarian }
    }

    fn at(y: i32, m: u32, d: u32, h: u32, min: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(y, m, d)
            .unwrap()
            .and_hms_opt(h, min, 0)
            .unwrap()
    }

    #[rstest]
    fn owner_may_modify_and_others_may_not(tutor: Caller, vet: Caller) {
        assert!(ensure_owner(1, &tutor, "animal").is_ok());
        let err = ensure_owner(1, &vet, "animal").unwrap_err();
        assert!(matches!(err, ApiError::ForbiddenError(_)));
        let stranger = Caller { user_id: 3, ..tutor };
        assert!(ensure_owner(1, &stranger, "animal").is_err());
    }

    #[rstest]
    #[case("access", "animal")]
    #[case("record", "exam")]
    fn vets_pass_but_strangers_do_not(
        tutor: Caller,
        vet: Caller,
        #[case] action: &str,
        #[case] what: &str,
    ) {
        assert!(ensure_owner_or_vet(1, &tutor, action, what).is_ok());
        assert!(ensure_owner_or_vet(1, &vet, action, what).is_ok());
        let stranger = Caller { user_id: 3, ..tutor };
        match ensure_owner_or_vet(1, &stranger, action, what) {
            Err(ApiError::ForbiddenError(msg)) => {
                assert_eq!(msg, format!("You do not have permission to {} this {}", action, what))
            }
            other => panic!("expected forbidden, got {:?}", other),
        }
    }

    #[rstest]
    fn only_tutors_register_animals(tutor: Caller, vet: Caller) {
        assert!(ensure_tutor(&tutor).is_ok());
        assert!(ensure_tutor(&vet).is_err());
    }

    #[test]
    fn rejects_past_and_present_slots() {
        let now = at(2026, 3, 10, 12, 0);
        let past = at(2026, 3, 10, 11, 59);
        let future = at(2026, 3, 10, 12, 30);
        assert!(ensure_not_past(past.date(), past.time(), now, "appointment").is_err());
        assert!(ensure_not_past(now.date(), now.time(), now, "appointment").is_err());
        assert!(ensure_not_past(future.date(), future.time(), now, "appointment").is_ok());
    }

    #[test]
    fn vet_must_belong_to_clinic() {
        let vet_row = Veterinarian { vet_id: 4, name: "Dra. Ana Silva".into(), clinic_id: 1 };
        assert!(ensure_vet_at_clinic(&vet_row, 1).is_ok());
        assert!(matches!(
            ensure_vet_at_clinic(&vet_row, 2),
            Err(ApiError::ValidationError(_))
        ));
    }

    #[test]
    fn occupied_slot_is_a_conflict() {
        assert!(ensure_slot_free(None).is_ok());
        assert!(matches!(ensure_slot_free(Some(7)), Err(ApiError::ConflictError(_))));
    }

    #[rstest]
    fn tutor_can_cancel_but_not_complete(tutor: Caller) {
        use AppointmentStatus::*;
        assert!(ensure_status_transition(Scheduled, Cancelled, 1, &tutor).is_ok());
        assert!(matches!(
            ensure_status_transition(Scheduled, Done, 1, &tutor),
            Err(ApiError::ForbiddenError(_))
        ));
    }

    #[rstest]
    fn vet_can_complete_any_scheduled(vet: Caller) {
        use AppointmentStatus::*;
        assert!(ensure_status_transition(Scheduled, Done, 1, &vet).is_ok());
        assert!(ensure_status_transition(Done, Cancelled, 1, &vet).is_err());
        assert!(ensure_status_transition(Cancelled, Done, 1, &vet).is_err());
    }

    #[rstest]
    fn stranger_cannot_cancel(tutor: Caller) {
        let stranger = Caller { user_id: 9, ..tutor };
        assert!(matches!(
            ensure_status_transition(AppointmentStatus::Scheduled, AppointmentStatus::Cancelled, 1, &stranger),
            Err(ApiError::ForbiddenError(_))
        ));
    }

    #[test]
    fn next_due_adds_interval() {
        let applied = NaiveDate::from_ymd_opt(2026, 1, 31).unwrap();
        assert_eq!(
            next_due_date(applied, 365),
            NaiveDate::from_ymd_opt(2027, 1, 31)
        );
        assert_eq!(next_due_date(applied, 180), NaiveDate::from_ymd_opt(2026, 7, 30));
    }

    #[test]
    fn applied_vaccines_cannot_be_applied_again() {
        assert!(ensure_vaccine_pending(VaccineStatus::Scheduled).is_ok());
        assert!(ensure_vaccine_pending(VaccineStatus::Applied).is_err());
    }
}
