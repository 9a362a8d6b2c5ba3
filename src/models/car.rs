use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::types::Json;
use sqlx::FromRow;
use uuid::Uuid;

#[derive(Debug, Clone, FromRow)]
pub struct Car {
    pub id: Uuid,
    pub name: String,
    pub images: Vec<String>,
    pub rating: f64,
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
    pub specs: Json<CarSpecs>,
    pub owner_id: Uuid,
    pub available_dates: Json<Vec<DateRange>>,
    pub is_available: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CarSpecs {
    pub passengers: Option<i32>,
    pub luggage: Option<i32>,
    pub range: Option<String>,
    pub fuel_type: Option<String>,
}

impl CarSpecs {
    pub fn is_empty(&self) -> bool {
        self.passengers.is_none()
            && self.luggage.is_none()
            && self.range.is_none()
            && self.fuel_type.is_none()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateRange {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl DateRange {
    pub fn is_ordered(&self) -> bool {
        self.start <= self.end
    }
}

/// A fully validated listing ready to insert.
#[derive(Debug, Clone)]
pub struct NewCar {
    pub name: String,
    pub images: Vec<String>,
    pub car_type: String,
    pub location: String,
    pub passengers: i32,
    pub transmission: String,
    pub air_conditioning: bool,
    pub doors: i32,
    pub price: f64,
    pub category: String,
    pub description: String,
    pub features: Vec<String>,
    pub specs: CarSpecs,
    pub owner_id: Uuid,
    pub available_dates: Vec<DateRange>,
    pub is_available: bool,
}

#[derive(Debug, Clone, Default)]
pub struct CarChanges {
    pub name: Option<String>,
    pub images: Option<Vec<String>>,
    pub car_type: Option<String>,
    pub location: Option<String>,
    pub passengers: Option<i32>,
    pub transmission: Option<String>,
    pub air_conditioning: Option<bool>,
    pub doors: Option<i32>,
    pub price: Option<f64>,
    pub category: Option<String>,
    pub description: Option<String>,
    pub features: Option<Vec<String>>,
    pub specs: Option<CarSpecs>,
    pub available_dates: Option<Vec<DateRange>>,
    pub is_available: Option<bool>,
}

impl CarChanges {
    /// Applies the set fields onto `car`. Shared by every repository so
    /// partial updates behave identically regardless of the backing store.
    pub fn apply(self, car: &mut Car) {
        if let Some(v) = self.name {
            car.name = v;
        }
        if let Some(v) = self.images {
            car.images = v;
        }
        if let Some(v) = self.car_type {
            car.car_type = v;
        }
        if let Some(v) = self.location {
            car.location = v;
        }
        if let Some(v) = self.passengers {
            car.passengers = v;
        }
        if let Some(v) = self.transmission {
            car.transmission = v;
        }
        if let Some(v) = self.air_conditioning {
            car.air_conditioning = v;
        }
        if let Some(v) = self.doors {
            car.doors = v;
        }
        if let Some(v) = self.price {
            car.price = v;
        }
        if let Some(v) = self.category {
            car.category = v;
        }
        if let Some(v) = self.description {
            car.description = v;
        }
        if let Some(v) = self.features {
            car.features = v;
        }
        if let Some(v) = self.specs {
            car.specs = Json(v);
        }
        if let Some(v) = self.available_dates {
            car.available_dates = Json(v);
        }
        if let Some(v) = self.is_available {
            car.is_available = v;
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct CarFilter {
    pub owner_id: Option<Uuid>,
    pub car_type: Option<String>,
    pub category: Option<String>,
    pub location: Option<String>,
    pub is_available: Option<bool>,
    pub min_price: Option<f64>,
    pub max_price: Option<f64>,
    pub search: Option<String>,
}

impl CarFilter {
    pub fn owned_by(owner_id: Uuid) -> Self {
        Self {
            owner_id: Some(owner_id),
            ..Self::default()
        }
    }

    pub fn matches(&self, car: &Car) -> bool {
        fn contains(haystack: &str, needle: &str) -> bool {
            haystack.to_lowercase().contains(&needle.to_lowercase())
        }

        self.owner_id.map_or(true, |id| car.owner_id == id)
            && self
                .car_type
                .as_deref()
                .map_or(true, |t| car.car_type.eq_ignore_ascii_case(t))
            && self
                .category
                .as_deref()
                .map_or(true, |c| car.category.eq_ignore_ascii_case(c))
            && self
                .location
                .as_deref()
                .map_or(true, |l| contains(&car.location, l))
            && self.is_available.map_or(true, |a| car.is_available == a)
            && self.min_price.map_or(true, |p| car.price >= p)
            && self.max_price.map_or(true, |p| car.price <= p)
            && self.search.as_deref().map_or(true, |s| {
                contains(&car.name, s) || contains(&car.description, s)
            })
    }
}
