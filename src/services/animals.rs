use chrono::Local;
use diesel::pg::PgConnection;
use diesel::prelude::*;
use log::info;
use rand::distributions::Alphanumeric;
use rand::{thread_rng, Rng};

use crate::db::{self, DbPool};
use crate::errors::ApiError;
use crate::models::*;
use crate::rules::{self, Caller};
use crate::validation;

pub struct AnimalService;

impl AnimalService {
    /// Public identifier printed on the pet's card, e.g. `ANI-7Q2KD9XZ`.
    pub fn generate_code() -> String {
        let suffix: String = thread_rng()
            .sample_iter(&Alphanumeric)
            .take(8)
            .map(|b| char::from(b).to_ascii_uppercase())
            .collect();
        format!("ANI-{}", suffix)
    }

    pub async fn create(
        caller: Caller,
        req: &CreateAnimalRequest,
        pool: &DbPool,
    ) -> Result<Animal, ApiError> {
        rules::ensure_tutor(&caller)?;
        let today = Local::now().date_naive();

        let new_animal = NewAnimal {
            user_id: caller.user_id,
            name: validation::validate_name("name", &req.name)?,
            species: validation::validate_name("species", &req.species)?,
            breed: validation::optional_text(req.breed.clone()),
            birth_date: parse_birth_date(req.birth_date.as_deref(), today)?,
            chip_number: validation::optional_text(req.chip_number.clone()),
            code: Self::generate_code(),
        };

        let created = db::run(pool, move |conn| {
            use crate::schema::animal::dsl::*;
            Ok(diesel::insert_into(animal)
                .values(&new_animal)
                .returning(Animal::as_returning())
                .get_result(conn)?)
        })
        .await?;

        info!("User {} registered animal {} ({})", caller.user_id, created.animal_id, created.code);
        Ok(created)
    }

    /// Tutors see their own animals, veterinarians see every animal.
    pub async fn list_for(caller: Caller, pool: &DbPool) -> Result<Vec<Animal>, ApiError> {
        db::run(pool, move |conn| {
            use crate::schema::animal::dsl::*;
            let mut query = animal.select(Animal::as_select()).into_boxed();
            if !caller.is_vet() {
                query = query.filter(user_id.eq(caller.user_id));
            }
            Ok(query.order(animal_id.asc()).load(conn)?)
        })
        .await
    }

    pub async fn get(id: i32, caller: Caller, pool: &DbPool) -> Result<Animal, ApiError> {
        db::run(pool, move |conn| readable_animal(conn, id, &caller)).await
    }

    pub async fn update(
        id: i32,
        caller: Caller,
        req: &UpdateAnimalRequest,
        pool: &DbPool,
    ) -> Result<Animal, ApiError> {
        let today = Local::now().date_naive();
        let changes = AnimalChangeset {
            name: req
                .name
                .as_deref()
                .map(|n| validation::validate_name("name", n))
                .transpose()?,
            species: req
                .species
                .as_deref()
                .map(|s| validation::validate_name("species", s))
                .transpose()?,
            breed: validation::clearable_text(req.breed.clone()),
            birth_date: parse_birth_date(req.birth_date.as_deref(), today)?,
            chip_number: validation::clearable_text(req.chip_number.clone()),
        };

        db::run(pool, move |conn| {
            let current = owned_animal(conn, id, &caller)?;
            if changes.name.is_none()
                && changes.species.is_none()
                && changes.breed.is_none()
                && changes.birth_date.is_none()
                && changes.chip_number.is_none()
            {
                return Ok(current);
            }

            use crate::schema::animal::dsl::*;
            Ok(diesel::update(animal.find(id))
                .set(&changes)
                .returning(Animal::as_returning())
                .get_result(conn)?)
        })
        .await
    }

    pub async fn delete(id: i32, caller: Caller, pool: &DbPool) -> Result<Animal, ApiError> {
        let removed = db::run(pool, move |conn| {
            let current = owned_animal(conn, id, &caller)?;
            use crate::schema::animal::dsl::*;
            diesel::delete(animal.find(id)).execute(conn)?;
            Ok(current)
        })
        .await?;

        info!("User {} deleted animal {}", caller.user_id, id);
        Ok(removed)
    }

    /// Checks ownership before an upload is written to disk.
    pub async fn get_owned(id: i32, caller: Caller, pool: &DbPool) -> Result<Animal, ApiError> {
        db::run(pool, move |conn| owned_animal(conn, id, &caller)).await
    }

    pub async fn set_photo(id: i32, url: String, pool: &DbPool) -> Result<Animal, ApiError> {
        db::run(pool, move |conn| {
            use crate::schema::animal::dsl::*;
            diesel::update(animal.find(id))
                .set(photo_url.eq(Some(url)))
                .returning(Animal::as_returning())
                .get_result(conn)
                .optional()?
                .ok_or_else(|| ApiError::NotFoundError(format!("Animal {} not found", id)))
        })
        .await
    }
}

fn parse_birth_date(
    raw: Option<&str>,
    today: chrono::NaiveDate,
) -> Result<Option<chrono::NaiveDate>, ApiError> {
    match raw.map(str::trim).filter(|s| !s.is_empty()) {
        Some(s) => {
            let date = validation::parse_date("birth_date", s)?;
            Ok(Some(validation::validate_birth_date(date, today)?))
        }
        None => Ok(None),
    }
}

pub(crate) fn find_animal(conn: &mut PgConnection, id: i32) -> Result<Animal, ApiError> {
    use crate::schema::animal::dsl::*;
    animal
        .find(id)
        .select(Animal::as_select())
        .first(conn)
        .optional()?
        .ok_or_else(|| ApiError::NotFoundError(format!("Animal {} not found", id)))
}

/// Loads the animal and requires the caller to own it.
pub(crate) fn owned_animal(
    conn: &mut PgConnection,
    id: i32,
    caller: &Caller,
) -> Result<Animal, ApiError> {
    let found = find_animal(conn, id)?;
    rules::ensure_owner(found.user_id, caller, "animal")?;
    Ok(found)
}

/// Loads the animal if the caller owns it or is a veterinarian.
pub(crate) fn readable_animal(
    conn: &mut PgConnection,
    id: i32,
    caller: &Caller,
) -> Result<Animal, ApiError> {
    let found = find_animal(conn, id)?;
    rules::ensure_owner_or_vet(found.user_id, caller, "access", "animal")?;
    Ok(found)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    #[test]
    fn generated_codes_have_prefix_and_uppercase_suffix() {
        let code = AnimalService::generate_code();
        assert!(code.starts_with("ANI-"));
        let suffix = &code[4..];
        assert_eq!(suffix.len(), 8);
        assert!(suffix
            .chars()
            .all(|c| c.is_ascii_digit() || c.is_ascii_uppercase()));
    }

    #[test]
    fn birth_date_is_optional_and_checked() {
        let today = NaiveDate::from_ymd_opt(2026, 6, 1).unwrap();
        assert_eq!(parse_birth_date(None, today).unwrap(), None);
        assert_eq!(parse_birth_date(Some("  "), today).unwrap(), None);
        assert_eq!(
            parse_birth_date(Some("2020-02-29"), today).unwrap(),
            NaiveDate::from_ymd_opt(2020, 2, 29)
        );
        assert!(parse_birth_date(Some("2027-01-01"), today).is_err());
        assert!(parse_birth_date(Some("29-02-2020"), today).is_err());
    }
}
