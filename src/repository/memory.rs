use async_trait::async_trait;
use chrono::Utc;
use sqlx::types::Json;
use std::collections::HashMap;
use std::sync::RwLock;
use uuid::Uuid;

use super::{CarRepository, UserRepository};
use crate::error::{Error, Result};
use crate::models::car::{Car, CarChanges, CarFilter, NewCar};
use crate::models::user::{NewUser, User, UserChanges, DEFAULT_PROFILE_IMAGE};

fn poisoned() -> Error {
    Error::Internal("in-memory store lock poisoned".to_string())
}

/// In-memory user table.
///
/// Intended for tests/dev. Not optimized for performance.
#[derive(Debug, Default)]
pub struct MemoryUserRepository {
    users: RwLock<HashMap<Uuid, User>>,
}

impl MemoryUserRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl UserRepository for MemoryUserRepository {
    async fn create(&self, user: NewUser) -> Result<User> {
        let mut users = self.users.write().map_err(|_| poisoned())?;
        let email = user.email.to_lowercase();
        if users.values().any(|u| u.email == email) {
            return Err(Error::BadRequest("User already exists".to_string()));
        }

        let now = Utc::now();
        let created = User {
            id: Uuid::new_v4(),
            name: user.name,
            email,
            password_hash: user.password_hash,
            profile_image: DEFAULT_PROFILE_IMAGE.to_string(),
            role: user.role.as_str().to_string(),
            joined_date: now,
            response_rate: 0.0,
            response_time: "N/A".to_string(),
            created_at: now,
            updated_at: now,
        };
        users.insert(created.id, created.clone());
        Ok(created)
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>> {
        let users = self.users.read().map_err(|_| poisoned())?;
        Ok(users.get(&id).cloned())
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>> {
        let users = self.users.read().map_err(|_| poisoned())?;
        let email = email.to_lowercase();
        Ok(users.values().find(|u| u.email == email).cloned())
    }

    async fn find_by_ids(&self, ids: &[Uuid]) -> Result<HashMap<Uuid, User>> {
        let users = self.users.read().map_err(|_| poisoned())?;
        Ok(ids
            .iter()
            .filter_map(|id| users.get(id).map(|u| (*id, u.clone())))
            .collect())
    }

    async fn update(&self, id: Uuid, changes: UserChanges) -> Result<Option<User>> {
        let mut users = self.users.write().map_err(|_| poisoned())?;

        if let Some(email) = changes.email.as_deref() {
            let email = email.to_lowercase();
            if users.values().any(|u| u.id != id && u.email == email) {
                return Err(Error::BadRequest("Email already in use".to_string()));
            }
        }

        let Some(user) = users.get_mut(&id) else {
            return Ok(None);
        };
        if let Some(name) = changes.name {
            user.name = name;
        }
        if let Some(email) = changes.email {
            user.email = email.to_lowercase();
        }
        if let Some(hash) = changes.password_hash {
            user.password_hash = hash;
        }
        if let Some(image) = changes.profile_image {
            user.profile_image = image;
        }
        user.updated_at = Utc::now();
        Ok(Some(user.clone()))
    }

    async fn delete(&self, id: Uuid) -> Result<bool> {
        let mut users = self.users.write().map_err(|_| poisoned())?;
        Ok(users.remove(&id).is_some())
    }
}

/// In-memory listing table. Owner references are not checked here; the
/// services only ever insert cars for an authenticated, existing user.
#[derive(Debug, Default)]
pub struct MemoryCarRepository {
    cars: RwLock<HashMap<Uuid, Car>>,
}

impl MemoryCarRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl CarRepository for MemoryCarRepository {
    async fn create(&self, car: NewCar) -> Result<Car> {
        let now = Utc::now();
        let created = Car {
            id: Uuid::new_v4(),
            name: car.name,
            images: car.images,
            rating: 0.0,
            car_type: car.car_type,
            location: car.location,
            review_count: 0,
            passengers: car.passengers,
            transmission: car.transmission,
            air_conditioning: car.air_conditioning,
            doors: car.doors,
            price: car.price,
            category: car.category,
            description: car.description,
            features: car.features,
            specs: Json(car.specs),
            owner_id: car.owner_id,
            available_dates: Json(car.available_dates),
            is_available: car.is_available,
            created_at: now,
            updated_at: now,
        };

        let mut cars = self.cars.write().map_err(|_| poisoned())?;
        cars.insert(created.id, created.clone());
        Ok(created)
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Car>> {
        let cars = self.cars.read().map_err(|_| poisoned())?;
        Ok(cars.get(&id).cloned())
    }

    async fn list(&self, filter: CarFilter) -> Result<Vec<Car>> {
        let cars = self.cars.read().map_err(|_| poisoned())?;
        let mut items: Vec<Car> = cars.values().filter(|c| filter.matches(c)).cloned().collect();
        items.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(items)
    }

    async fn update(&self, id: Uuid, changes: CarChanges) -> Result<Option<Car>> {
        let mut cars = self.cars.write().map_err(|_| poisoned())?;
        let Some(car) = cars.get_mut(&id) else {
            return Ok(None);
        };
        changes.apply(car);
        car.updated_at = Utc::now();
        Ok(Some(car.clone()))
    }

    async fn delete(&self, id: Uuid) -> Result<bool> {
        let mut cars = self.cars.write().map_err(|_| poisoned())?;
        Ok(cars.remove(&id).is_some())
    }

    async fn delete_by_owner(&self, owner_id: Uuid) -> Result<u64> {
        let mut cars = self.cars.write().map_err(|_| poisoned())?;
        let before = cars.len();
        cars.retain(|_, c| c.owner_id != owner_id);
        Ok((before - cars.len()) as u64)
    }
}
