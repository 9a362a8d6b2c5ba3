use async_trait::async_trait;
use sqlx::types::Json;
use sqlx::{PgPool, Postgres, QueryBuilder};
use std::collections::HashMap;
use uuid::Uuid;

use super::{CarRepository, UserRepository};
use crate::error::{Error, Result};
use crate::models::car::{Car, CarChanges, CarFilter, NewCar};
use crate::models::user::{NewUser, User, UserChanges};

const USER_COLUMNS: &str = "id, name, email, password_hash, profile_image, role, joined_date, \
     response_rate, response_time, created_at, updated_at";

const CAR_COLUMNS: &str = "id, name, images, rating, car_type, location, review_count, passengers, \
     transmission, air_conditioning, doors, price, category, description, features, specs, \
     owner_id, available_dates, is_available, created_at, updated_at";

fn unique_violation(err: sqlx::Error, message: &str) -> Error {
    match &err {
        sqlx::Error::Database(db) if db.is_unique_violation() => {
            Error::BadRequest(message.to_string())
        }
        _ => err.into(),
    }
}

/// `ILIKE` substring pattern with the user's `%`, `_` and `\` taken literally.
fn contains_pattern(needle: &str) -> String {
    let mut pattern = String::with_capacity(needle.len() + 2);
    pattern.push('%');
    for ch in needle.chars() {
        if matches!(ch, '%' | '_' | '\\') {
            pattern.push('\\');
        }
        pattern.push(ch);
    }
    pattern.push('%');
    pattern
}

#[derive(Clone)]
pub struct PgUserRepository {
    pool: PgPool,
}

impl PgUserRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl UserRepository for PgUserRepository {
    async fn create(&self, user: NewUser) -> Result<User> {
        let query = format!(
            "INSERT INTO users (id, name, email, password_hash, role)
             VALUES ($1, $2, LOWER($3), $4, $5)
             RETURNING {}",
            USER_COLUMNS
        );
        sqlx::query_as::<_, User>(&query)
            .bind(Uuid::new_v4())
            .bind(&user.name)
            .bind(&user.email)
            .bind(&user.password_hash)
            .bind(user.role.as_str())
            .fetch_one(&self.pool)
            .await
            .map_err(|e| unique_violation(e, "User already exists"))
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>> {
        let query = format!("SELECT {} FROM users WHERE id = $1", USER_COLUMNS);
        let user = sqlx::query_as::<_, User>(&query)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(user)
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>> {
        let query = format!("SELECT {} FROM users WHERE email = LOWER($1)", USER_COLUMNS);
        let user = sqlx::query_as::<_, User>(&query)
            .bind(email)
            .fetch_optional(&self.pool)
            .await?;
        Ok(user)
    }

    async fn find_by_ids(&self, ids: &[Uuid]) -> Result<HashMap<Uuid, User>> {
        if ids.is_empty() {
            return Ok(HashMap::new());
        }
        let query = format!("SELECT {} FROM users WHERE id = ANY($1)", USER_COLUMNS);
        let users = sqlx::query_as::<_, User>(&query)
            .bind(ids)
            .fetch_all(&self.pool)
            .await?;
        Ok(users.into_iter().map(|u| (u.id, u)).collect())
    }

    async fn update(&self, id: Uuid, changes: UserChanges) -> Result<Option<User>> {
        let query = format!(
            "UPDATE users
             SET
                 name = COALESCE($2, name),
                 email = COALESCE(LOWER($3), email),
                 password_hash = COALESCE($4, password_hash),
                 profile_image = COALESCE($5, profile_image),
                 updated_at = NOW()
             WHERE id = $1
             RETURNING {}",
            USER_COLUMNS
        );
        sqlx::query_as::<_, User>(&query)
            .bind(id)
            .bind(changes.name)
            .bind(changes.email)
            .bind(changes.password_hash)
            .bind(changes.profile_image)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| unique_violation(e, "Email already in use"))
    }

    async fn delete(&self, id: Uuid) -> Result<bool> {
        let result = sqlx::query("DELETE FROM users WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}

#[derive(Clone)]
pub struct PgCarRepository {
    pool: PgPool,
}

impl PgCarRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl CarRepository for PgCarRepository {
    async fn create(&self, car: NewCar) -> Result<Car> {
        let query = format!(
            "INSERT INTO cars (
                 id, name, images, car_type, location, passengers, transmission,
                 air_conditioning, doors, price, category, description, features,
                 specs, owner_id, available_dates, is_available
             ) VALUES (
                 $1, $2, $3, $4, $5, $6, $7,
                 $8, $9, $10, $11, $12, $13,
                 $14, $15, $16, $17
             )
             RETURNING {}",
            CAR_COLUMNS
        );
        let created = sqlx::query_as::<_, Car>(&query)
            .bind(Uuid::new_v4())
            .bind(&car.name)
            .bind(&car.images)
            .bind(&car.car_type)
            .bind(&car.location)
            .bind(car.passengers)
            .bind(&car.transmission)
            .bind(car.air_conditioning)
            .bind(car.doors)
            .bind(car.price)
            .bind(&car.category)
            .bind(&car.description)
            .bind(&car.features)
            .bind(Json(&car.specs))
            .bind(car.owner_id)
            .bind(Json(&car.available_dates))
            .bind(car.is_available)
            .fetch_one(&self.pool)
            .await?;
        Ok(created)
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Car>> {
        let query = format!("SELECT {} FROM cars WHERE id = $1", CAR_COLUMNS);
        let car = sqlx::query_as::<_, Car>(&query)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(car)
    }

    async fn list(&self, filter: CarFilter) -> Result<Vec<Car>> {
        let mut builder: QueryBuilder<Postgres> =
            QueryBuilder::new(format!("SELECT {} FROM cars WHERE TRUE", CAR_COLUMNS));

        if let Some(owner_id) = filter.owner_id {
            builder.push(" AND owner_id = ").push_bind(owner_id);
        }
        if let Some(car_type) = filter.car_type {
            builder
                .push(" AND LOWER(car_type) = LOWER(")
                .push_bind(car_type)
                .push(")");
        }
        if let Some(category) = filter.category {
            builder
                .push(" AND LOWER(category) = LOWER(")
                .push_bind(category)
                .push(")");
        }
        if let Some(location) = filter.location {
            builder
                .push(" AND location ILIKE ")
                .push_bind(contains_pattern(&location));
        }
        if let Some(is_available) = filter.is_available {
            builder.push(" AND is_available = ").push_bind(is_available);
        }
        if let Some(min_price) = filter.min_price {
            builder.push(" AND price >= ").push_bind(min_price);
        }
        if let Some(max_price) = filter.max_price {
            builder.push(" AND price <= ").push_bind(max_price);
        }
        if let Some(search) = filter.search {
            let pattern = contains_pattern(&search);
            builder
                .push(" AND (name ILIKE ")
                .push_bind(pattern.clone())
                .push(" OR description ILIKE ")
                .push_bind(pattern)
                .push(")");
        }
        builder.push(" ORDER BY created_at DESC");

        let cars = builder
            .build_query_as::<Car>()
            .fetch_all(&self.pool)
            .await?;
        Ok(cars)
    }

    async fn update(&self, id: Uuid, changes: CarChanges) -> Result<Option<Car>> {
        let query = format!(
            "UPDATE cars
             SET
                 name = COALESCE($2, name),
                 images = COALESCE($3, images),
                 car_type = COALESCE($4, car_type),
                 location = COALESCE($5, location),
                 passengers = COALESCE($6, passengers),
                 transmission = COALESCE($7, transmission),
                 air_conditioning = COALESCE($8, air_conditioning),
                 doors = COALESCE($9, doors),
                 price = COALESCE($10, price),
                 category = COALESCE($11, category),
                 description = COALESCE($12, description),
                 features = COALESCE($13, features),
                 specs = COALESCE($14, specs),
                 available_dates = COALESCE($15, available_dates),
                 is_available = COALESCE($16, is_available),
                 updated_at = NOW()
             WHERE id = $1
             RETURNING {}",
            CAR_COLUMNS
        );
        let car = sqlx::query_as::<_, Car>(&query)
            .bind(id)
            .bind(changes.name)
            .bind(changes.images)
            .bind(changes.car_type)
            .bind(changes.location)
            .bind(changes.passengers)
            .bind(changes.transmission)
            .bind(changes.air_conditioning)
            .bind(changes.doors)
            .bind(changes.price)
            .bind(changes.category)
            .bind(changes.description)
            .bind(changes.features)
            .bind(changes.specs.map(Json))
            .bind(changes.available_dates.map(Json))
            .bind(changes.is_available)
            .fetch_optional(&self.pool)
            .await?;
        Ok(car)
    }

    async fn delete(&self, id: Uuid) -> Result<bool> {
        let result = sqlx::query("DELETE FROM cars WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn delete_by_owner(&self, owner_id: Uuid) -> Result<u64> {
        let result = sqlx::query("DELETE FROM cars WHERE owner_id = $1")
            .bind(owner_id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected())
    }
}
