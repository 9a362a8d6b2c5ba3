use validator::Validate;

use crate::error::{Error, Result};
use crate::models::car::DateRange;
use crate::services::media_service::UploadedImage;

pub const ALLOWED_IMAGE_EXTENSIONS: [&str; 4] = ["jpg", "jpeg", "png", "gif"];
pub const MAX_IMAGE_BYTES: usize = 5_000_000;
pub const MAX_IMAGES_PER_UPLOAD: usize = 5;

pub fn validate<T: Validate>(val: &T) -> Result<()> {
    val.validate()?;
    Ok(())
}

pub fn image_extension(file_name: &str) -> Option<String> {
    let (_, ext) = file_name.rsplit_once('.')?;
    let ext = ext.to_ascii_lowercase();
    ALLOWED_IMAGE_EXTENSIONS
        .contains(&ext.as_str())
        .then_some(ext)
}

pub fn validate_image(image: &UploadedImage) -> Result<()> {
    if image_extension(&image.file_name).is_none() {
        return Err(Error::BadRequest("Only image files are allowed!".to_string()));
    }
    if image.data.is_empty() {
        return Err(Error::BadRequest(format!("{} is empty", image.file_name)));
    }
    if image.data.len() > MAX_IMAGE_BYTES {
        return Err(Error::BadRequest(format!(
            "{} exceeds the 5MB size limit",
            image.file_name
        )));
    }
    Ok(())
}

pub fn validate_images(images: &[UploadedImage]) -> Result<()> {
    if images.len() > MAX_IMAGES_PER_UPLOAD {
        return Err(Error::BadRequest(format!(
            "You can upload at most {} images at a time",
            MAX_IMAGES_PER_UPLOAD
        )));
    }
    images.iter().try_for_each(validate_image)
}

pub fn validate_date_ranges(ranges: &[DateRange]) -> Result<()> {
    if ranges.iter().all(DateRange::is_ordered) {
        Ok(())
    } else {
        Err(Error::BadRequest(
            "Availability ranges must start before they end".to_string(),
        ))
    }
}

/// `my car.JPG` -> `my-car.JPG`, keeping only characters safe in a path.
pub fn sanitize_file_name(name: &str) -> String {
    let base = name.rsplit(['/', '\\']).next().unwrap_or(name);
    base.split_whitespace()
        .collect::<Vec<_>>()
        .join("-")
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.'))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use bytes::Bytes;
    use chrono::{Duration, Utc};

    fn image(name: &str, len: usize) -> UploadedImage {
        UploadedImage {
            file_name: name.to_string(),
            content_type: None,
            data: Bytes::from(vec![1u8; len]),
        }
    }

    #[test]
    fn extension_check_is_case_insensitive() {
        assert_eq!(image_extension("Photo.JPG").as_deref(), Some("jpg"));
        assert_eq!(image_extension("scan.pdf"), None);
        assert_eq!(image_extension("noext"), None);
    }

    #[test]
    fn oversized_and_foreign_files_are_rejected() {
        assert!(validate_image(&image("a.png", 10)).is_ok());
        assert!(validate_image(&image("a.png", MAX_IMAGE_BYTES + 1)).is_err());
        assert!(validate_image(&image("a.exe", 10)).is_err());
        assert!(validate_image(&image("a.png", 0)).is_err());
    }

    #[test]
    fn too_many_images_are_rejected() {
        let batch: Vec<_> = (0..6).map(|i| image(&format!("{i}.jpg"), 4)).collect();
        assert!(validate_images(&batch).is_err());
        assert!(validate_images(&batch[..5]).is_ok());
    }

    #[test]
    fn reversed_date_range_is_rejected() {
        let now = Utc::now();
        let ok = DateRange { start: now, end: now + Duration::days(2) };
        let bad = DateRange { start: now, end: now - Duration::days(1) };
        assert!(validate_date_ranges(&[ok]).is_ok());
        assert!(validate_date_ranges(&[ok, bad]).is_err());
    }

    #[test]
    fn file_names_lose_spaces_and_directories() {
        assert_eq!(sanitize_file_name("my  red car.jpg"), "my-red-car.jpg");
        assert_eq!(sanitize_file_name("../../etc/pass wd.png"), "pass-wd.png");
    }
}
