use axum::{
    async_trait,
    extract::{FromRequest, Multipart, Request, State},
    http::{header::CONTENT_TYPE, StatusCode},
    response::{IntoResponse, Json},
    Extension,
};
use serde_json::json;
use uuid::Uuid;

use crate::{
    dto::{
        car_dto::{
            AvailabilityPayload, AvailabilityResponse, CarEnvelope, CarListQuery,
            CarListResponse, CarPayload,
        },
        car_form::CarForm,
    },
    error::{Error, Result},
    middleware::auth::AuthUser,
    routes::extract::{AppJson, AppPath, AppQuery},
    services::media_service::UploadedImage,
    AppState,
};

/// Car fields from either a JSON body or a multipart form with image files.
pub struct CarInput {
    pub payload: CarPayload,
    pub uploads: Vec<UploadedImage>,
}

#[async_trait]
impl<S> FromRequest<S> for CarInput
where
    S: Send + Sync,
{
    type Rejection = Error;

    async fn from_request(req: Request, state: &S) -> std::result::Result<Self, Self::Rejection> {
        let is_multipart = req
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .is_some_and(|ct| ct.starts_with("multipart/form-data"));

        if is_multipart {
            let multipart = Multipart::from_request(req, state)
                .await
                .map_err(|e| Error::BadRequest(e.body_text()))?;
            let (payload, uploads) = CarForm::from_multipart(multipart).await?.into_payload()?;
            return Ok(Self { payload, uploads });
        }

        let AppJson(payload) = AppJson::<CarPayload>::from_request(req, state).await?;
        Ok(Self {
            payload,
            uploads: Vec::new(),
        })
    }
}

#[utoipa::path(
    get,
    path = "/api/cars",
    params(
        ("type" = Option<String>, Query, description = "Body style, exact match"),
        ("category" = Option<String>, Query, description = "Category, exact match"),
        ("location" = Option<String>, Query, description = "Location substring"),
        ("available" = Option<bool>, Query, description = "Only available or unavailable cars"),
        ("minPrice" = Option<f64>, Query, description = "Lowest price per day"),
        ("maxPrice" = Option<f64>, Query, description = "Highest price per day"),
        ("search" = Option<String>, Query, description = "Name or description substring")
    ),
    responses(
        (status = 200, description = "Cars with owners populated", body = Json<CarListResponse>)
    )
)]
#[axum::debug_handler]
pub async fn list_cars(
    State(state): State<AppState>,
    AppQuery(query): AppQuery<CarListQuery>,
) -> Result<impl IntoResponse> {
    let cars = state.car_service.list(query).await?;
    Ok(Json(CarListResponse::from(cars)))
}

#[utoipa::path(
    get,
    path = "/api/cars/{id}",
    params(
        ("id" = Uuid, Path, description = "Car ID")
    ),
    responses(
        (status = 200, description = "Car found", body = Json<CarEnvelope>),
        (status = 404, description = "Car not found")
    )
)]
#[axum::debug_handler]
pub async fn get_car(
    State(state): State<AppState>,
    AppPath(id): AppPath<Uuid>,
) -> Result<impl IntoResponse> {
    let car = state.car_service.get(id).await?;
    Ok(Json(CarEnvelope::new(car)))
}

#[utoipa::path(
    post,
    path = "/api/cars",
    request_body = CarPayload,
    responses(
        (status = 201, description = "Car created", body = Json<CarEnvelope>),
        (status = 400, description = "Invalid payload"),
        (status = 401, description = "Missing or invalid token")
    )
)]
#[axum::debug_handler]
pub async fn create_car(
    State(state): State<AppState>,
    Extension(caller): Extension<AuthUser>,
    input: CarInput,
) -> Result<impl IntoResponse> {
    let car = state
        .car_service
        .create(&caller, input.payload, input.uploads)
        .await?;
    Ok((StatusCode::CREATED, Json(CarEnvelope::new(car))))
}

#[utoipa::path(
    put,
    path = "/api/cars/{id}",
    params(
        ("id" = Uuid, Path, description = "Car ID")
    ),
    request_body = CarPayload,
    responses(
        (status = 200, description = "Car updated", body = Json<CarEnvelope>),
        (status = 403, description = "Caller is neither owner nor admin"),
        (status = 404, description = "Car not found")
    )
)]
#[axum::debug_handler]
pub async fn update_car(
    State(state): State<AppState>,
    AppPath(id): AppPath<Uuid>,
    Extension(caller): Extension<AuthUser>,
    input: CarInput,
) -> Result<impl IntoResponse> {
    let car = state
        .car_service
        .update(&caller, id, input.payload, input.uploads)
        .await?;
    Ok(Json(CarEnvelope::new(car)))
}

#[utoipa::path(
    delete,
    path = "/api/cars/{id}",
    params(
        ("id" = Uuid, Path, description = "Car ID")
    ),
    responses(
        (status = 200, description = "Car deleted"),
        (status = 403, description = "Caller is neither owner nor admin"),
        (status = 404, description = "Car not found")
    )
)]
#[axum::debug_handler]
pub async fn delete_car(
    State(state): State<AppState>,
    AppPath(id): AppPath<Uuid>,
    Extension(caller): Extension<AuthUser>,
) -> Result<impl IntoResponse> {
    state.car_service.delete(&caller, id).await?;
    Ok(Json(json!({ "success": true, "data": {} })))
}

#[utoipa::path(
    get,
    path = "/api/cars/user/mycars",
    responses(
        (status = 200, description = "Cars owned by the caller", body = Json<CarListResponse>)
    )
)]
#[axum::debug_handler]
pub async fn my_cars(
    State(state): State<AppState>,
    Extension(caller): Extension<AuthUser>,
) -> Result<impl IntoResponse> {
    let cars = state.car_service.list_for_owner(caller.id).await?;
    Ok(Json(CarListResponse::from(cars)))
}

#[utoipa::path(
    patch,
    path = "/api/cars/{id}/availability",
    params(
        ("id" = Uuid, Path, description = "Car ID")
    ),
    request_body = AvailabilityPayload,
    responses(
        (status = 200, description = "Availability changed", body = Json<AvailabilityResponse>),
        (status = 400, description = "Invalid availability status"),
        (status = 404, description = "Car not found or not owned by user")
    )
)]
#[axum::debug_handler]
pub async fn set_availability(
    State(state): State<AppState>,
    AppPath(id): AppPath<Uuid>,
    Extension(caller): Extension<AuthUser>,
    payload: Option<AppJson<AvailabilityPayload>>,
) -> Result<impl IntoResponse> {
    let raw = payload.and_then(|AppJson(p)| p.is_available);
    let car = state
        .car_service
        .set_availability(&caller, id, raw)
        .await?;
    let message = if car.is_available {
        "Car is now available for rent"
    } else {
        "Car is now unavailable for rent"
    };
    Ok(Json(AvailabilityResponse {
        success: true,
        data: car,
        message: message.to_string(),
    }))
}
