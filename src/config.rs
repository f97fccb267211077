use log::warn;
use rand::distributions::Alphanumeric;
use rand::{thread_rng, Rng};
use std::env;

const DEFAULT_JWT_SECRET: &str = "your_jwt_secret_key_here";
/// One year.
pub const MAX_JWT_EXPIRY_MINUTES: i64 = 525_600;
/// Ten years.
pub const MAX_REMINDER_WINDOW_DAYS: i64 = 3650;

// Schema and reference data, applied at every startup
pub const DB_INIT_SQL: &str = r#"
CREATE TABLE IF NOT EXISTS user_account (
    user_id SERIAL PRIMARY KEY,
    name VARCHAR(100) NOT NULL,
    email VARCHAR(255) NOT NULL,
    phone VARCHAR(20) NOT NULL,
    user_type VARCHAR(20) NOT NULL DEFAULT 'tutor',
    date_registered TIMESTAMP NOT NULL DEFAULT NOW(),
    is_verified BOOLEAN NOT NULL DEFAULT FALSE,
    verification_code VARCHAR(6),
    pin_hash VARCHAR(255),
    CONSTRAINT user_account_email_key UNIQUE (email),
    CONSTRAINT user_account_phone_key UNIQUE (phone),
    CONSTRAINT user_account_type_check CHECK (user_type IN ('tutor', 'veterinarian'))
);

CREATE TABLE IF NOT EXISTS clinic (
    clinic_id SERIAL PRIMARY KEY,
    name VARCHAR(150) UNIQUE NOT NULL
);

CREATE TABLE IF NOT EXISTS veterinarian (
    vet_id SERIAL PRIMARY KEY,
    name VARCHAR(100) NOT NULL,
    clinic_id INTEGER NOT NULL REFERENCES clinic(clinic_id) ON DELETE RESTRICT,
    UNIQUE (name, clinic_id)
);

CREATE TABLE IF NOT EXISTS animal (
    animal_id SERIAL PRIMARY KEY,
    user_id INTEGER NOT NULL REFERENCES user_account(user_id) ON DELETE CASCADE,
    name VARCHAR(100) NOT NULL,
    species VARCHAR(50) NOT NULL,
    breed VARCHAR(100),
    birth_date DATE,
    photo_url VARCHAR(255),
    chip_number VARCHAR(50),
    code VARCHAR(20) NOT NULL,
    created_at TIMESTAMP NOT NULL DEFAULT NOW(),
    CONSTRAINT animal_chip_number_key UNIQUE (chip_number),
    CONSTRAINT animal_code_key UNIQUE (code)
);

CREATE TABLE IF NOT EXISTS appointment (
    appointment_id SERIAL PRIMARY KEY,
    user_id INTEGER NOT NULL REFERENCES user_account(user_id) ON DELETE CASCADE,
    animal_id INTEGER NOT NULL REFERENCES animal(animal_id) ON DELETE CASCADE,
    clinic_id INTEGER NOT NULL REFERENCES clinic(clinic_id) ON DELETE RESTRICT,
    vet_id INTEGER NOT NULL REFERENCES veterinarian(vet_id) ON DELETE RESTRICT,
    appointment_date DATE NOT NULL,
    appointment_time TIME NOT NULL,
    reason TEXT,
    status VARCHAR(20) NOT NULL DEFAULT 'scheduled',
    created_at TIMESTAMP NOT NULL DEFAULT NOW()
);

CREATE UNIQUE INDEX IF NOT EXISTS uq_appointment_slot
    ON appointment (vet_id, appointment_date, appointment_time)
    WHERE status <> 'cancelled';

CREATE TABLE IF NOT EXISTS vaccine_type (
    vaccine_type_id SERIAL PRIMARY KEY,
    name VARCHAR(100) UNIQUE NOT NULL,
    interval_days INTEGER NOT NULL
);

CREATE TABLE IF NOT EXISTS vaccine_record (
    vaccine_id SERIAL PRIMARY KEY,
    animal_id INTEGER NOT NULL REFERENCES animal(animal_id) ON DELETE CASCADE,
    vaccine_type_id INTEGER NOT NULL REFERENCES vaccine_type(vaccine_type_id) ON DELETE RESTRICT,
    scheduled_date DATE NOT NULL,
    scheduled_time TIME NOT NULL,
    applied_date DATE,
    next_due_date DATE,
    status VARCHAR(20) NOT NULL DEFAULT 'scheduled',
    notified BOOLEAN NOT NULL DEFAULT FALSE
);

CREATE TABLE IF NOT EXISTS exam_type (
    exam_type_id SERIAL PRIMARY KEY,
    name VARCHAR(100) UNIQUE NOT NULL
);

CREATE TABLE IF NOT EXISTS exam_record (
    exam_id SERIAL PRIMARY KEY,
    animal_id INTEGER NOT NULL REFERENCES animal(animal_id) ON DELETE CASCADE,
    exam_type_id INTEGER NOT NULL REFERENCES exam_type(exam_type_id) ON DELETE RESTRICT,
    exam_date DATE NOT NULL,
    result TEXT,
    observations TEXT,
    photo_url VARCHAR(255),
    created_at TIMESTAMP NOT NULL DEFAULT NOW()
);

CREATE TABLE IF NOT EXISTS invalidated_token (
    token_id SERIAL PRIMARY KEY,
    token TEXT UNIQUE NOT NULL,
    expires_at TIMESTAMP NOT NULL,
    user_id INTEGER NOT NULL REFERENCES user_account(user_id) ON DELETE CASCADE
);

CREATE INDEX IF NOT EXISTS idx_invalidated_token_expires ON invalidated_token (expires_at);

INSERT INTO clinic (name)
VALUES
    ('Clínica Veterinária Central'),
    ('Hospital Veterinário do Porto'),
    ('Clínica Animal Lisboa')
ON CONFLICT (name) DO NOTHING;

INSERT INTO veterinarian (name, clinic_id)
SELECT v.name, c.clinic_id
FROM (VALUES
    ('Dra. Ana Silva', 'Clínica Veterinária Central'),
    ('Dr. João Costa', 'Clínica Veterinária Central'),
    ('Dra. Marta Sousa', 'Hospital Veterinário do Porto'),
    ('Dr. Pedro Almeida', 'Hospital Veterinário do Porto'),
    ('Dra. Rita Fernandes', 'Clínica Animal Lisboa')
) AS v(name, clinic_name)
JOIN clinic c ON c.name = v.clinic_name
ON CONFLICT (name, clinic_id) DO NOTHING;

INSERT INTO vaccine_type (name, interval_days)
VALUES
    ('Raiva', 365),
    ('Polivalente canina', 365),
    ('Trivalente felina', 365),
    ('Leptospirose', 180),
    ('Tosse do canil', 365)
ON CONFLICT (name) DO NOTHING;

INSERT INTO exam_type (name)
VALUES
    ('Hemograma'),
    ('Bioquímica sanguínea'),
    ('Raio-X'),
    ('Ecografia'),
    ('Análise de urina')
ON CONFLICT (name) DO NOTHING;
"#;

#[derive(Clone, Debug)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,
    pub database_url: String,
    pub db_pool_size: u32,
    pub jwt_secret: String,
    pub jwt_expiry_minutes: i64,
    pub bcrypt_cost: u32,
    pub upload_dir: String,
    pub max_upload_bytes: usize,
    pub token_sweep_interval_secs: u64,
    pub reminder_window_days: i64,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
            database_url: String::new(),
            db_pool_size: 10,
            jwt_secret: DEFAULT_JWT_SECRET.to_string(),
            jwt_expiry_minutes: 60,
            bcrypt_cost: bcrypt::DEFAULT_COST,
            upload_dir: "uploads".to_string(),
            max_upload_bytes: 5 * 1024 * 1024,
            token_sweep_interval_secs: 3600,
            reminder_window_days: 7,
        }
    }
}

fn env_or<T: std::str::FromStr>(key: &str, default: T) -> T {
    match env::var(key) {
        Ok(raw) => raw.parse::<T>().unwrap_or_else(|_| {
            warn!("Ignoring unparsable {}={:?}, using default", key, raw);
            default
        }),
        Err(_) => default,
    }
}

impl AppConfig {
    /// Reads the process environment. `main` loads `.env` beforehand.
    pub fn from_env() -> Self {
        let defaults = Self::default();

        let jwt_secret = match env::var("JWT_SECRET") {
            Ok(val) => val,
            Err(e) => {
                warn!("Failed to load JWT_SECRET: {}", e);
                warn!("Using a random per-process JWT secret; tokens will not survive a restart");
                Self::generate_secure_secret()
            }
        };

        Self {
            host: env::var("HOST").unwrap_or(defaults.host),
            port: env_or("PORT", defaults.port),
            database_url: env::var("DATABASE_URL").unwrap_or_default(),
            db_pool_size: env_or("DB_POOL_SIZE", defaults.db_pool_size),
            jwt_secret,
            jwt_expiry_minutes: env_or("JWT_EXPIRY_MINUTES", defaults.jwt_expiry_minutes),
            bcrypt_cost: env_or("BCRYPT_COST", defaults.bcrypt_cost),
            upload_dir: env::var("UPLOAD_DIR").unwrap_or(defaults.upload_dir),
            max_upload_bytes: env_or("MAX_UPLOAD_BYTES", defaults.max_upload_bytes),
            token_sweep_interval_secs: env_or(
                "TOKEN_SWEEP_INTERVAL_SECS",
                defaults.token_sweep_interval_secs,
            ),
            reminder_window_days: env_or("REMINDER_WINDOW_DAYS", defaults.reminder_window_days),
        }
    }

    pub fn validate(&self) -> Result<(), String> {
        if self.jwt_secret == DEFAULT_JWT_SECRET {
            warn!("Using default JWT secret is not secure for production!");
        } else if self.jwt_secret.len() < 32 {
            warn!("JWT_SECRET is shorter than 32 characters");
        }

        if self.database_url.is_empty() {
            return Err("DATABASE_URL must be set".to_string());
        }

        if self.jwt_expiry_minutes <= 0 {
            return Err("JWT_EXPIRY_MINUTES must be positive".to_string());
        }
        if self.jwt_expiry_minutes > MAX_JWT_EXPIRY_MINUTES {
            return Err(format!(
                "JWT_EXPIRY_MINUTES must be at most {}",
                MAX_JWT_EXPIRY_MINUTES
            ));
        }

        if !(4..=31).contains(&self.bcrypt_cost) {
            return Err("BCRYPT_COST must be between 4 and 31".to_string());
        }

        if self.max_upload_bytes == 0 {
            return Err("MAX_UPLOAD_BYTES must be positive".to_string());
        }

        if self.token_sweep_interval_secs == 0 {
            return Err("TOKEN_SWEEP_INTERVAL_SECS must be positive".to_string());
        }

        if self.reminder_window_days < 0 {
            return Err("REMINDER_WINDOW_DAYS must not be negative".to_string());
        }
        if self.reminder_window_days > MAX_REMINDER_WINDOW_DAYS {
            return Err(format!(
                "REMINDER_WINDOW_DAYS must be at most {}",
                MAX_REMINDER_WINDOW_DAYS
            ));
        }

        if self.db_pool_size == 0 {
            return Err("DB_POOL_SIZE must be positive".to_string());
        }

        Ok(())
    }

    pub fn generate_secure_secret() -> String {
        thread_rng()
            .sample_iter(&Alphanumeric)
            .take(32)
            .map(char::from)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn valid() -> AppConfig {
        AppConfig {
            database_url: "postgres://localhost/vetclinic".to_string(),
            ..AppConfig::default()
        }
    }

    #[test]
    fn defaults_validate_once_database_is_set() {
        assert!(valid().validate().is_ok());
        assert!(AppConfig::default().validate().is_err());
    }

    #[test]
    fn rejects_non_positive_expiry() {
        let config = AppConfig { jwt_expiry_minutes: 0, ..valid() };
        assert_eq!(config.validate().unwrap_err(), "JWT_EXPIRY_MINUTES must be positive");
    }

    #[rstest]
    #[case::huge_expiry(AppConfig { jwt_expiry_minutes: i64::MAX / 2, ..valid() })]
    #[case::expiry_over_a_year(AppConfig { jwt_expiry_minutes: MAX_JWT_EXPIRY_MINUTES + 1, ..valid() })]
    #[case::huge_window(AppConfig { reminder_window_days: 1_000_000_000, ..valid() })]
    #[case::window_over_ten_years(AppConfig { reminder_window_days: MAX_REMINDER_WINDOW_DAYS + 1, ..valid() })]
    fn rejects_durations_that_overflow_date_math(#[case] config: AppConfig) {
        assert!(config.validate().unwrap_err().contains("must be at most"));
    }

    #[test]
    fn accepts_upper_bounds() {
        let config = AppConfig {
            jwt_expiry_minutes: MAX_JWT_EXPIRY_MINUTES,
            reminder_window_days: MAX_REMINDER_WINDOW_DAYS,
            ..valid()
        };
        assert!(config.validate().is_ok());
    }

    #[test]
    fn rejects_bcrypt_cost_out_of_range() {
        let config = AppConfig { bcrypt_cost: 2, ..valid() };
        assert!(config.validate().is_err());
    }

    #[test]
    fn generated_secret_is_alphanumeric() {
        let secret = AppConfig::generate_secure_secret();
        assert_eq!(secret.len(), 32);
        assert!(secret.chars().all(|c| c.is_ascii_alphanumeric()));
    }
}
