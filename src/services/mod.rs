pub mod animals;
pub mod appointments;
pub mod auth;
pub mod clinics;
pub mod exams;
pub mod uploads;
pub mod users;
pub mod vaccines;

pub use animals::AnimalService;
pub use appointments::AppointmentService;
pub use auth::AuthService;
pub use clinics::ClinicService;
pub use exams::ExamService;
pub use uploads::UploadService;
pub use users::UserService;
pub use vaccines::VaccineService;
