use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use crate::models::car::{Car, CarSpecs, DateRange};
use crate::models::user::User;

/// Listing fields as sent by clients. Every field is optional so the same
/// payload serves creation (required fields checked by the service) and
/// partial updates.
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CarPayload {
    #[validate(length(min = 1, message = "Please provide a car name"))]
    pub name: Option<String>,
    pub images: Option<Vec<String>>,
    #[serde(rename = "type")]
    #[validate(length(min = 1, message = "Please specify car type"))]
    pub car_type: Option<String>,
    #[validate(length(min = 1, message = "Please provide location"))]
    pub location: Option<String>,
    #[validate(range(min = 1, message = "Passenger capacity must be at least 1"))]
    pub passengers: Option<i32>,
    #[validate(length(min = 1, message = "Please specify transmission type"))]
    pub transmission: Option<String>,
    pub air_conditioning: Option<bool>,
    #[validate(range(min = 1, message = "Number of doors must be at least 1"))]
    pub doors: Option<i32>,
    #[validate(range(min = 0.0, message = "Price per day cannot be negative"))]
    pub price: Option<f64>,
    #[validate(length(min = 1, message = "Please specify car category"))]
    pub category: Option<String>,
    #[validate(length(min = 1, message = "Please provide a description"))]
    pub description: Option<String>,
    pub features: Option<Vec<String>>,
    pub specs: Option<CarSpecs>,
    pub available_dates: Option<Vec<DateRange>>,
    pub is_available: Option<bool>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CarListQuery {
    #[serde(rename = "type")]
    pub car_type: Option<String>,
    pub category: Option<String>,
    pub location: Option<String>,
    pub available: Option<bool>,
    pub min_price: Option<f64>,
    pub max_price: Option<f64>,
    pub search: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AvailabilityPayload {
    pub is_available: Option<serde_json::Value>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OwnerSummary {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub profile_image: String,
}

impl From<&User> for OwnerSummary {
    fn from(value: &User) -> Self {
        Self {
            id: value.id,
            name: value.name.clone(),
            email: value.email.clone(),
            profile_image: value.profile_image.clone(),
        }
    }
}

/// The owner is populated when the account still exists and falls back to
/// the bare id otherwise.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum CarOwner {
    Populated(OwnerSummary),
    Id(Uuid),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CarResponse {
    pub id: Uuid,
    pub name: String,
    pub images: Vec<String>,
    pub rating: f64,
    #[serde(rename = "type")]
    pub car_type: String,
    pub location: String,
    pub review_count: i32,
    pub passengers: i32,
    pub transmission: String,
    pub air_conditioning: bool,
    pub doors: i32,
    pub price: f64,
    pub category: String,
    pub description: String,
    pub features: Vec<String>,
    pub specs: CarSpecs,
    pub owner: CarOwner,
    pub available_dates: Vec<DateRange>,
    pub is_available: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl CarResponse {
    pub fn new(car: Car, owner: Option<&User>) -> Self {
        let owner = match owner {
            Some(user) => CarOwner::Populated(user.into()),
            None => CarOwner::Id(car.owner_id),
        };
        Self {
            id: car.id,
            name: car.name,
            images: car.images,
            rating: car.rating,
            car_type: car.car_type,
            location: car.location,
            review_count: car.review_count,
            passengers: car.passengers,
            transmission: car.transmission,
            air_conditioning: car.air_conditioning,
            doors: car.doors,
            price: car.price,
            category: car.category,
            description: car.description,
            features: car.features,
            specs: car.specs.0,
            owner,
            available_dates: car.available_dates.0,
            is_available: car.is_available,
            created_at: car.created_at,
            updated_at: car.updated_at,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CarEnvelope {
    pub success: bool,
    pub data: CarResponse,
}

impl CarEnvelope {
    pub fn new(data: CarResponse) -> Self {
        Self {
            success: true,
            data,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CarListResponse {
    pub success: bool,
    pub count: usize,
    pub data: Vec<CarResponse>,
}

impl From<Vec<CarResponse>> for CarListResponse {
    fn from(data: Vec<CarResponse>) -> Self {
        Self {
            success: true,
            count: data.len(),
            data,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AvailabilityResponse {
    pub success: bool,
    pub data: CarResponse,
    pub message: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImageUploadResponse {
    pub success: bool,
    pub message: String,
    pub image_urls: Vec<String>,
}
