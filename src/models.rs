use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use diesel::prelude::*;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::errors::ApiError;
use crate::schema::{
    animal, appointment, clinic, exam_record, exam_type, invalidated_token, user_account,
    vaccine_record, vaccine_type, veterinarian,
};

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum UserType {
    Tutor,
    Veterinarian,
}

impl UserType {
    pub fn as_str(&self) -> &'static str {
        match self {
            UserType::Tutor => "tutor",
            UserType::Veterinarian => "veterinarian",
        }
    }
}

impl FromStr for UserType {
    type Err = ApiError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "tutor" => Ok(UserType::Tutor),
            "veterinarian" | "veterinario" => Ok(UserType::Veterinarian),
            other => Err(ApiError::ValidationError(format!(
                "Invalid user type '{}', expected 'tutor' or 'veterinarian'",
                other
            ))),
        }
    }
}

impl fmt::Display for UserType {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum AppointmentStatus {
    Scheduled,
    Done,
    Cancelled,
}

impl AppointmentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            AppointmentStatus::Scheduled => "scheduled",
            AppointmentStatus::Done => "done",
            AppointmentStatus::Cancelled => "cancelled",
        }
    }
}

impl FromStr for AppointmentStatus {
    type Err = ApiError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "scheduled" => Ok(AppointmentStatus::Scheduled),
            "done" => Ok(AppointmentStatus::Done),
            "cancelled" => Ok(AppointmentStatus::Cancelled),
            other => Err(ApiError::ValidationError(format!(
                "Invalid appointment status '{}'",
                other
            ))),
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum VaccineStatus {
    Scheduled,
    Applied,
    Cancelled,
}

impl VaccineStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            VaccineStatus::Scheduled => "scheduled",
            VaccineStatus::Applied => "applied",
            VaccineStatus::Cancelled => "cancelled",
        }
    }
}

impl FromStr for VaccineStatus {
    type Err = ApiError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "scheduled" => Ok(VaccineStatus::Scheduled),
            "applied" => Ok(VaccineStatus::Applied),
            "cancelled" => Ok(VaccineStatus::Cancelled),
            other => Err(ApiError::ValidationError(format!("Invalid vaccine status '{}'", other))),
        }
    }
}

// Rows

#[derive(Queryable, Selectable, Serialize, Debug, Clone)]
#[diesel(table_name = user_account, check_for_backend(diesel::pg::Pg))]
pub struct UserAccount {
    pub user_id: i32,
    pub name: String,
    pub email: String,
    pub phone: String,
    pub user_type: String,
    pub date_registered: NaiveDateTime,
    pub is_verified: bool,
    #[serde(skip_serializing)]
    pub verification_code: Option<String>,
    #[serde(skip_serializing)]
    pub pin_hash: Option<String>,
}

impl UserAccount {
    pub fn kind(&self) -> Result<UserType, ApiError> {
        self.user_type.parse()
    }
}

#[derive(Insertable, Debug, Clone)]
#[diesel(table_name = user_account)]
pub struct NewUserAccount {
    pub name: String,
    pub email: String,
    pub phone: String,
    pub user_type: String,
    pub verification_code: Option<String>,
}

#[derive(AsChangeset, Debug, Default)]
#[diesel(table_name = user_account)]
pub struct UserChangeset {
    pub name: Option<String>,
    pub phone: Option<String>,
}

#[derive(Queryable, Selectable, Serialize, Debug, Clone)]
#[diesel(table_name = clinic, check_for_backend(diesel::pg::Pg))]
pub struct Clinic {
    pub clinic_id: i32,
    pub name: String,
}

#[derive(Queryable, Selectable, Serialize, Debug, Clone)]
#[diesel(table_name = veterinarian, check_for_backend(diesel::pg::Pg))]
pub struct Veterinarian {
    pub vet_id: i32,
    pub name: String,
    pub clinic_id: i32,
}

#[derive(Queryable, Selectable, Serialize, Debug, Clone)]
#[diesel(table_name = animal, check_for_backend(diesel::pg::Pg))]
pub struct Animal {
    pub animal_id: i32,
    pub user_id: i32,
    pub name: String,
    pub species: String,
    pub breed: Option<String>,
    pub birth_date: Option<NaiveDate>,
    pub photo_url: Option<String>,
    pub chip_number: Option<String>,
    pub code: String,
    pub created_at: NaiveDateTime,
}

#[derive(Insertable, Debug)]
#[diesel(table_name = animal)]
pub struct NewAnimal {
    pub user_id: i32,
    pub name: String,
    pub species: String,
    pub breed: Option<String>,
    pub birth_date: Option<NaiveDate>,
    pub chip_number: Option<String>,
    pub code: String,
}

#[derive(AsChangeset, Debug, Default)]
#[diesel(table_name = animal)]
pub struct AnimalChangeset {
    pub name: Option<String>,
    pub species: Option<String>,
    // Some(None) writes NULL
    pub breed: Option<Option<String>>,
    pub birth_date: Option<NaiveDate>,
    pub chip_number: Option<Option<String>>,
}

#[derive(Queryable, Selectable, Serialize, Debug, Clone)]
#[diesel(table_name = appointment, check_for_backend(diesel::pg::Pg))]
pub struct Appointment {
    pub appointment_id: i32,
    pub user_id: i32,
    pub animal_id: i32,
    pub clinic_id: i32,
    pub vet_id: i32,
    #[serde(rename = "date")]
    pub appointment_date: NaiveDate,
    #[serde(rename = "time")]
    pub appointment_time: NaiveTime,
    pub reason: Option<String>,
    pub status: String,
    pub created_at: NaiveDateTime,
}

impl Appointment {
    pub fn current_status(&self) -> Result<AppointmentStatus, ApiError> {
        self.status.parse()
    }
}

#[derive(Insertable, Debug)]
#[diesel(table_name = appointment)]
pub struct NewAppointment {
    pub user_id: i32,
    pub animal_id: i32,
    pub clinic_id: i32,
    pub vet_id: i32,
    pub appointment_date: NaiveDate,
    pub appointment_time: NaiveTime,
    pub reason: Option<String>,
    pub status: String,
}

#[derive(Queryable, Selectable, Serialize, Debug, Clone)]
#[diesel(table_name = vaccine_type, check_for_backend(diesel::pg::Pg))]
pub struct VaccineType {
    pub vaccine_type_id: i32,
    pub name: String,
    pub interval_days: i32,
}

#[derive(Queryable, Selectable, Serialize, Debug, Clone)]
#[diesel(table_name = vaccine_record, check_for_backend(diesel::pg::Pg))]
pub struct VaccineRecord {
    pub vaccine_id: i32,
    pub animal_id: i32,
    pub vaccine_type_id: i32,
    pub scheduled_date: NaiveDate,
    pub scheduled_time: NaiveTime,
    pub applied_date: Option<NaiveDate>,
    pub next_due_date: Option<NaiveDate>,
    pub status: String,
    pub notified: bool,
}

#[derive(Insertable, Debug)]
#[diesel(table_name = vaccine_record)]
pub struct NewVaccineRecord {
    pub animal_id: i32,
    pub vaccine_type_id: i32,
    pub scheduled_date: NaiveDate,
    pub scheduled_time: NaiveTime,
    pub status: String,
}

#[derive(Queryable, Selectable, Serialize, Debug, Clone)]
#[diesel(table_name = exam_type, check_for_backend(diesel::pg::Pg))]
pub struct ExamType {
    pub exam_type_id: i32,
    pub name: String,
}

#[derive(Queryable, Selectable, Serialize, Debug, Clone)]
#[diesel(table_name = exam_record, check_for_backend(diesel::pg::Pg))]
pub struct ExamRecord {
    pub exam_id: i32,
    pub animal_id: i32,
    pub exam_type_id: i32,
    pub exam_date: NaiveDate,
    pub result: Option<String>,
    pub observations: Option<String>,
    pub photo_url: Option<String>,
    pub created_at: NaiveDateTime,
}

#[derive(Insertable, Debug)]
#[diesel(table_name = exam_record)]
pub struct NewExamRecord {
    pub animal_id: i32,
    pub exam_type_id: i32,
    pub exam_date: NaiveDate,
    pub result: Option<String>,
    pub observations: Option<String>,
}

#[derive(AsChangeset, Debug, Default)]
#[diesel(table_name = exam_record)]
pub struct ExamChangeset {
    pub exam_date: Option<NaiveDate>,
    pub result: Option<String>,
    pub observations: Option<String>,
}

#[derive(Insertable, Debug)]
#[diesel(table_name = invalidated_token)]
pub struct NewInvalidatedToken {
    pub token: String,
    pub expires_at: NaiveDateTime,
    pub user_id: i32,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct Claims {
    pub sub: String, // user_id
    pub exp: usize,
    pub iat: usize,
    pub jti: String,
    pub user_id: i32,
    pub email: String,
    pub user_type: UserType,
}

// DTOs

#[derive(Deserialize, Debug)]
pub struct RegisterUserRequest {
    pub name: String,
    pub email: String,
    pub phone: String,
    #[serde(default = "default_user_type")]
    pub user_type: String,
}

fn default_user_type() -> String {
    UserType::Tutor.as_str().to_string()
}

#[derive(Deserialize, Debug)]
pub struct VerifyCodeRequest {
    pub email: String,
    pub code: String,
}

#[derive(Deserialize, Debug)]
pub struct ResendCodeRequest {
    pub email: String,
}

#[derive(Deserialize, Debug)]
pub struct SetPinRequest {
    pub email: String,
    pub code: String,
    pub pin: String,
}

#[derive(Deserialize, Debug)]
pub struct LoginRequest {
    pub email: String,
    pub pin: String,
}

#[derive(Serialize, Debug)]
pub struct LoginResponse {
    pub token: String,
    pub expires_at: NaiveDateTime,
    pub user: UserAccount,
}

#[derive(Deserialize, Debug, Default)]
pub struct UpdateUserRequest {
    pub name: Option<String>,
    pub phone: Option<String>,
}

#[derive(Deserialize, Debug)]
pub struct CreateAnimalRequest {
    pub name: String,
    pub species: String,
    pub breed: Option<String>,
    pub birth_date: Option<String>,
    pub chip_number: Option<String>,
}

#[derive(Deserialize, Debug, Default)]
pub struct UpdateAnimalRequest {
    pub name: Option<String>,
    pub species: Option<String>,
    pub breed: Option<String>,
    pub birth_date: Option<String>,
    pub chip_number: Option<String>,
}

#[derive(Deserialize, Debug)]
pub struct CreateAppointmentRequest {
    pub animal_id: i32,
    pub clinic_id: i32,
    pub vet_id: i32,
    pub date: String,
    pub time: String,
    pub reason: Option<String>,
}

#[derive(Deserialize, Debug)]
pub struct RescheduleAppointmentRequest {
    pub date: String,
    pub time: String,
    pub vet_id: Option<i32>,
    pub reason: Option<String>,
}

#[derive(Deserialize, Debug)]
pub struct UpdateStatusRequest {
    pub status: String,
}

#[derive(Deserialize, Debug)]
pub struct CreateVaccineRequest {
    pub animal_id: i32,
    pub vaccine_type_id: i32,
    pub date: String,
    pub time: String,
}

#[derive(Deserialize, Debug, Default)]
pub struct ApplyVaccineRequest {
    pub applied_date: Option<String>,
}

#[derive(Deserialize, Debug)]
pub struct CreateExamRequest {
    pub animal_id: i32,
    pub exam_type_id: i32,
    pub date: String,
    pub result: Option<String>,
    pub observations: Option<String>,
}

#[derive(Deserialize, Debug, Default)]
pub struct UpdateExamRequest {
    pub date: Option<String>,
    pub result: Option<String>,
    pub observations: Option<String>,
}
