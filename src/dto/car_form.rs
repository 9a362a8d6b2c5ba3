use axum::extract::Multipart;
use serde::de::DeserializeOwned;
use std::collections::HashMap;

use crate::dto::car_dto::CarPayload;
use crate::error::{Error, Result};
use crate::models::car::CarSpecs;
use crate::services::media_service::UploadedImage;

/// A car listing submitted as `multipart/form-data`.
///
/// Browsers can only send strings and files, so numbers, booleans, lists and
/// the nested specs object arrive flattened or JSON-encoded. `into_payload`
/// turns them back into a typed [`CarPayload`].
#[derive(Debug, Default)]
pub struct CarForm {
    fields: HashMap<String, Vec<String>>,
    pub uploads: Vec<UploadedImage>,
}

fn is_image_field(name: &str) -> bool {
    name == "images" || name.starts_with("image")
}

impl CarForm {
    pub async fn from_multipart(mut multipart: Multipart) -> Result<Self> {
        let mut form = CarForm::default();

        while let Some(field) = multipart.next_field().await? {
            let name = field.name().unwrap_or_default().to_string();
            let file_name = field.file_name().map(str::to_string);

            match file_name {
                Some(file_name) if is_image_field(&name) => {
                    let content_type = field.content_type().map(str::to_string);
                    let data = field.bytes().await?;
                    if data.is_empty() && file_name.is_empty() {
                        continue;
                    }
                    form.uploads.push(UploadedImage {
                        file_name,
                        content_type,
                        data,
                    });
                }
                _ => {
                    let value = field.text().await?;
                    form.push(name, value);
                }
            }
        }

        tracing::debug!(
            fields = form.fields.len(),
            uploads = form.uploads.len(),
            "Parsed multipart car form"
        );
        Ok(form)
    }

    pub fn push(&mut self, name: impl Into<String>, value: impl Into<String>) {
        let name = name.into();
        let name = name.strip_suffix("[]").map(str::to_string).unwrap_or(name);
        self.fields.entry(name).or_default().push(value.into());
    }

    fn first(&self, name: &str) -> Option<&str> {
        self.fields
            .get(name)
            .and_then(|values| values.first())
            .map(|v| v.trim())
            .filter(|v| !v.is_empty())
    }

    fn text(&self, name: &str) -> Option<String> {
        self.first(name).map(str::to_string)
    }

    fn number<T: std::str::FromStr>(&self, name: &str) -> Result<Option<T>> {
        self.first(name)
            .map(|raw| {
                raw.parse::<T>()
                    .map_err(|_| Error::BadRequest(format!("Invalid value for {}: {}", name, raw)))
            })
            .transpose()
    }

    /// `f64::from_str` accepts `NaN` and `inf`, which no price can be.
    fn decimal(&self, name: &str) -> Result<Option<f64>> {
        match self.number::<f64>(name)? {
            Some(value) if !value.is_finite() => Err(Error::BadRequest(format!(
                "Invalid value for {}: {}",
                name, value
            ))),
            other => Ok(other),
        }
    }

    fn flag(&self, name: &str) -> Result<Option<bool>> {
        self.first(name)
            .map(|raw| match raw.to_ascii_lowercase().as_str() {
                "true" | "on" | "1" => Ok(true),
                "false" | "off" | "0" => Ok(false),
                _ => Err(Error::BadRequest(format!("Invalid value for {}: {}", name, raw))),
            })
            .transpose()
    }

    fn json<T: DeserializeOwned>(&self, name: &str) -> Result<Option<T>> {
        self.first(name)
            .map(|raw| {
                serde_json::from_str(raw)
                    .map_err(|e| Error::BadRequest(format!("Invalid value for {}: {}", name, e)))
            })
            .transpose()
    }

    /// Either one JSON-encoded array or one value per form entry.
    fn list(&self, name: &str) -> Option<Vec<String>> {
        let values = self.fields.get(name)?;
        if let [single] = values.as_slice() {
            if let Ok(list) = serde_json::from_str::<Vec<String>>(single.trim()) {
                return Some(list);
            }
        }
        Some(
            values
                .iter()
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
                .collect(),
        )
    }

    fn specs(&self) -> Result<Option<CarSpecs>> {
        if let Some(raw) = self.first("specs") {
            if let Ok(specs) = serde_json::from_str::<CarSpecs>(raw) {
                return Ok(Some(specs));
            }
        }

        let pick = |key: &str, fallback: &str| {
            self.first(&format!("specs[{}]", key))
                .or_else(|| self.first(fallback))
                .map(|raw| (raw.to_string(), key.to_string()))
        };
        let parse_int = |entry: Option<(String, String)>| -> Result<Option<i32>> {
            entry
                .map(|(raw, key)| {
                    raw.parse::<i32>().map_err(|_| {
                        Error::BadRequest(format!("Invalid value for specs.{}: {}", key, raw))
                    })
                })
                .transpose()
        };

        let specs = CarSpecs {
            passengers: parse_int(pick("passengers", "passengers"))?,
            luggage: parse_int(pick("luggage", "luggage"))?,
            range: pick("range", "range").map(|(raw, _)| raw),
            fuel_type: pick("fuelType", "fuelType").map(|(raw, _)| raw),
        };
        Ok((!specs.is_empty()).then_some(specs))
    }

    pub fn into_payload(self) -> Result<(CarPayload, Vec<UploadedImage>)> {
        let payload = CarPayload {
            name: self.text("name"),
            images: self.list("images"),
            car_type: self.text("type"),
            location: self.text("location"),
            passengers: self.number("passengers")?,
            transmission: self.text("transmission"),
            air_conditioning: self.flag("airConditioning")?,
            doors: self.number("doors")?,
            price: self.decimal("price")?,
            category: self.text("category"),
            description: self.text("description"),
            features: self.list("features"),
            specs: self.specs()?,
            available_dates: self.json("availableDates")?,
            is_available: self.flag("isAvailable")?,
        };
        Ok((payload, self.uploads))
    }
}
