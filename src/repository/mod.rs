//! Persistence seam for users and car listings.
//!
//! Services only talk to these traits. [`postgres`] is the production
//! mapper; [`memory`] backs tests and database-less local runs.

pub mod memory;
pub mod postgres;

use async_trait::async_trait;
use std::collections::HashMap;
use uuid::Uuid;

use crate::error::Result;
use crate::models::car::{Car, CarChanges, CarFilter, NewCar};
use crate::models::user::{NewUser, User, UserChanges};

#[async_trait]
pub trait UserRepository: Send + Sync {
    async fn create(&self, user: NewUser) -> Result<User>;

    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>>;

    /// Email lookups are case-insensitive; stored emails are lowercase.
    async fn find_by_email(&self, email: &str) -> Result<Option<User>>;

    async fn find_by_ids(&self, ids: &[Uuid]) -> Result<HashMap<Uuid, User>>;

    async fn update(&self, id: Uuid, changes: UserChanges) -> Result<Option<User>>;

    /// Returns whether a row was removed.
    async fn delete(&self, id: Uuid) -> Result<bool>;
}

#[async_trait]
pub trait CarRepository: Send + Sync {
    async fn create(&self, car: NewCar) -> Result<Car>;

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Car>>;

    /// Newest listings first.
    async fn list(&self, filter: CarFilter) -> Result<Vec<Car>>;

    async fn update(&self, id: Uuid, changes: CarChanges) -> Result<Option<Car>>;

    async fn delete(&self, id: Uuid) -> Result<bool>;

    /// Returns the number of listings removed.
    async fn delete_by_owner(&self, owner_id: Uuid) -> Result<u64>;
}
