use std::collections::HashSet;
use std::sync::Arc;
use tracing::info;
use uuid::Uuid;

use crate::dto::car_dto::{CarListQuery, CarPayload, CarResponse};
use crate::error::{Error, Result};
use crate::middleware::auth::AuthUser;
use crate::models::car::{Car, CarChanges, CarFilter, NewCar};
use crate::models::user::Role;
use crate::repository::{CarRepository, UserRepository};
use crate::services::media_service::{MediaStore, UploadTarget, UploadedImage};
use crate::utils::validation::{validate, validate_date_ranges, validate_images};

fn car_not_found() -> Error {
    Error::NotFound("Car not found".to_string())
}

fn missing_field() -> Error {
    Error::BadRequest("Please provide all required fields".to_string())
}

fn non_blank(value: Option<String>) -> Option<String> {
    value.map(|v| v.trim().to_string()).filter(|v| !v.is_empty())
}

#[derive(Clone)]
pub struct CarService {
    cars: Arc<dyn CarRepository>,
    users: Arc<dyn UserRepository>,
    media: Arc<dyn MediaStore>,
}

impl CarService {
    pub fn new(
        cars: Arc<dyn CarRepository>,
        users: Arc<dyn UserRepository>,
        media: Arc<dyn MediaStore>,
    ) -> Self {
        Self { cars, users, media }
    }

    /// Attaches owner summaries, falling back to the bare id for listings
    /// whose owner no longer exists.
    async fn with_owners(&self, cars: Vec<Car>) -> Result<Vec<CarResponse>> {
        let ids: Vec<Uuid> = cars
            .iter()
            .map(|c| c.owner_id)
            .collect::<HashSet<_>>()
            .into_iter()
            .collect();
        let owners = self.users.find_by_ids(&ids).await?;
        Ok(cars
            .into_iter()
            .map(|car| {
                let owner = owners.get(&car.owner_id);
                CarResponse::new(car, owner)
            })
            .collect())
    }

    async fn with_owner(&self, car: Car) -> Result<CarResponse> {
        let owner = self.users.find_by_id(car.owner_id).await?;
        Ok(CarResponse::new(car, owner.as_ref()))
    }

    async fn upload_all(&self, images: Vec<UploadedImage>) -> Result<Vec<String>> {
        validate_images(&images)?;
        let mut urls = Vec::with_capacity(images.len());
        for image in images {
            urls.push(self.media.upload(UploadTarget::CarImage, image).await?);
        }
        Ok(urls)
    }

    async fn find(&self, id: Uuid) -> Result<Car> {
        self.cars.find_by_id(id).await?.ok_or_else(car_not_found)
    }

    /// Tokens outlive deleted accounts, so writes re-check that the caller
    /// still exists before touching a listing.
    async fn ensure_account(&self, caller: &AuthUser) -> Result<()> {
        match self.users.find_by_id(caller.id).await? {
            Some(_) => Ok(()),
            None => Err(Error::NotFound("User not found".to_string())),
        }
    }

    fn ensure_can_modify(car: &Car, caller: &AuthUser, action: &str) -> Result<()> {
        if car.owner_id == caller.id || caller.role == Role::Admin {
            Ok(())
        } else {
            Err(Error::Forbidden(format!(
                "Not authorized to {} this car",
                action
            )))
        }
    }

    pub async fn list(&self, query: CarListQuery) -> Result<Vec<CarResponse>> {
        let filter = CarFilter {
            owner_id: None,
            car_type: non_blank(query.car_type),
            category: non_blank(query.category),
            location: non_blank(query.location),
            is_available: query.available,
            min_price: query.min_price,
            max_price: query.max_price,
            search: non_blank(query.search),
        };
        let cars = self.cars.list(filter).await?;
        self.with_owners(cars).await
    }

    pub async fn get(&self, id: Uuid) -> Result<CarResponse> {
        let car = self.find(id).await?;
        self.with_owner(car).await
    }

    pub async fn list_for_owner(&self, owner_id: Uuid) -> Result<Vec<CarResponse>> {
        let cars = self.cars.list(CarFilter::owned_by(owner_id)).await?;
        self.with_owners(cars).await
    }

    pub async fn create(
        &self,
        caller: &AuthUser,
        payload: CarPayload,
        uploads: Vec<UploadedImage>,
    ) -> Result<CarResponse> {
        self.ensure_account(caller).await?;
        validate(&payload)?;
        if let Some(dates) = payload.available_dates.as_deref() {
            validate_date_ranges(dates)?;
        }

        let name = non_blank(payload.name).ok_or_else(missing_field)?;
        let car_type = non_blank(payload.car_type).ok_or_else(missing_field)?;
        let location = non_blank(payload.location).ok_or_else(missing_field)?;
        let transmission = non_blank(payload.transmission).ok_or_else(missing_field)?;
        let category = non_blank(payload.category).ok_or_else(missing_field)?;
        let description = non_blank(payload.description).ok_or_else(missing_field)?;
        let passengers = payload.passengers.ok_or_else(missing_field)?;
        let doors = payload.doors.ok_or_else(missing_field)?;
        let price = payload.price.ok_or_else(missing_field)?;

        let mut images = payload.images.unwrap_or_default();
        images.retain(|url| !url.trim().is_empty());
        if images.is_empty() && uploads.is_empty() {
            return Err(Error::BadRequest(
                "Please provide at least one image".to_string(),
            ));
        }
        images.extend(self.upload_all(uploads).await?);

        let car = self
            .cars
            .create(NewCar {
                name,
                images,
                car_type,
                location,
                passengers,
                transmission,
                air_conditioning: payload.air_conditioning.unwrap_or(false),
                doors,
                price,
                category,
                description,
                features: payload.features.unwrap_or_default(),
                specs: payload.specs.unwrap_or_default(),
                owner_id: caller.id,
                available_dates: payload.available_dates.unwrap_or_default(),
                is_available: payload.is_available.unwrap_or(true),
            })
            .await?;
        info!(car_id = %car.id, owner_id = %caller.id, "Created car listing");

        self.with_owner(car).await
    }

    /// Uploaded files together with any URLs in the payload replace the image
    /// list; without either the stored images stay as they are.
    pub async fn update(
        &self,
        caller: &AuthUser,
        id: Uuid,
        payload: CarPayload,
        uploads: Vec<UploadedImage>,
    ) -> Result<CarResponse> {
        self.ensure_account(caller).await?;
        let car = self.find(id).await?;
        Self::ensure_can_modify(&car, caller, "update")?;

        validate(&payload)?;
        if let Some(dates) = payload.available_dates.as_deref() {
            validate_date_ranges(dates)?;
        }

        let mut images: Vec<String> = payload
            .images
            .unwrap_or_default()
            .into_iter()
            .filter(|url| !url.trim().is_empty())
            .collect();
        images.extend(self.upload_all(uploads).await?);

        let changes = CarChanges {
            name: non_blank(payload.name),
            images: (!images.is_empty()).then_some(images),
            car_type: non_blank(payload.car_type),
            location: non_blank(payload.location),
            passengers: payload.passengers,
            transmission: non_blank(payload.transmission),
            air_conditioning: payload.air_conditioning,
            doors: payload.doors,
            price: payload.price,
            category: non_blank(payload.category),
            description: non_blank(payload.description),
            features: payload.features,
            specs: payload.specs,
            available_dates: payload.available_dates,
            is_available: payload.is_available,
        };

        let updated = self
            .cars
            .update(id, changes)
            .await?
            .ok_or_else(car_not_found)?;
        info!(car_id = %id, user_id = %caller.id, "Updated car listing");

        self.with_owner(updated).await
    }

    pub async fn delete(&self, caller: &AuthUser, id: Uuid) -> Result<()> {
        let car = self.find(id).await?;
        Self::ensure_can_modify(&car, caller, "delete")?;

        if !self.cars.delete(id).await? {
            return Err(car_not_found());
        }
        info!(car_id = %id, user_id = %caller.id, "Deleted car listing");
        Ok(())
    }

    /// Only the owner may toggle availability; anyone else sees the listing
    /// as missing.
    pub async fn set_availability(
        &self,
        caller: &AuthUser,
        id: Uuid,
        raw: Option<serde_json::Value>,
    ) -> Result<CarResponse> {
        let is_available = match raw {
            Some(serde_json::Value::Bool(flag)) => flag,
            _ => {
                return Err(Error::BadRequest(
                    "Invalid availability status".to_string(),
                ))
            }
        };

        self.ensure_account(caller).await?;
        let not_owned = || Error::NotFound("Car not found or not owned by user".to_string());
        let car = self.cars.find_by_id(id).await?.ok_or_else(not_owned)?;
        if car.owner_id != caller.id {
            return Err(not_owned());
        }

        let updated = self
            .cars
            .update(
                id,
                CarChanges {
                    is_available: Some(is_available),
                    ..CarChanges::default()
                },
            )
            .await?
            .ok_or_else(not_owned)?;
        info!(car_id = %id, is_available, "Changed car availability");

        self.with_owner(updated).await
    }

    /// Standalone upload used by the listing form before the car exists.
    pub async fn upload_images(&self, images: Vec<UploadedImage>) -> Result<Vec<String>> {
        if images.is_empty() {
            return Err(Error::BadRequest(
                "Please upload at least one image".to_string(),
            ));
        }
        self.upload_all(images).await
    }
}
