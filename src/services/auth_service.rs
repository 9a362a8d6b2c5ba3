use std::sync::Arc;
use tracing::{info, warn};
use uuid::Uuid;

use crate::dto::auth_dto::{
    ChangePasswordPayload, LoginPayload, RegisterPayload, UpdateProfilePayload,
};
use crate::error::{Error, Result};
use crate::models::user::{NewUser, Role, User, UserChanges};
use crate::repository::{CarRepository, UserRepository};
use crate::services::media_service::{MediaStore, UploadTarget, UploadedImage};
use crate::utils::crypto::{hash_password, verify_password};
use crate::utils::token::issue_token;
use crate::utils::validation::{validate, validate_image};

fn invalid_credentials() -> Error {
    Error::Unauthorized("Invalid credentials".to_string())
}

fn user_not_found() -> Error {
    Error::NotFound("User not found".to_string())
}

#[derive(Clone)]
pub struct AuthService {
    users: Arc<dyn UserRepository>,
    cars: Arc<dyn CarRepository>,
    media: Arc<dyn MediaStore>,
    jwt_secret: String,
    jwt_expires_in_days: i64,
}

impl AuthService {
    pub fn new(
        users: Arc<dyn UserRepository>,
        cars: Arc<dyn CarRepository>,
        media: Arc<dyn MediaStore>,
        jwt_secret: String,
        jwt_expires_in_days: i64,
    ) -> Self {
        Self {
            users,
            cars,
            media,
            jwt_secret,
            jwt_expires_in_days,
        }
    }

    pub fn issue_token(&self, user: &User) -> Result<String> {
        issue_token(user.id, user.role(), &self.jwt_secret, self.jwt_expires_in_days)
    }

    pub async fn register(&self, payload: RegisterPayload) -> Result<(String, User)> {
        let name = payload.name.trim().to_string();
        let email = payload.email.trim().to_lowercase();
        if name.is_empty() || email.is_empty() || payload.password.is_empty() {
            return Err(Error::BadRequest(
                "Please provide all required fields".to_string(),
            ));
        }
        validate(&RegisterPayload {
            name: name.clone(),
            email: email.clone(),
            ..payload.clone()
        })?;

        let role = match payload.role.as_deref().map(str::trim).filter(|r| !r.is_empty()) {
            None => Role::User,
            Some(raw) => raw
                .parse::<Role>()
                .ok()
                .filter(Role::is_self_assignable)
                .ok_or_else(|| {
                    Error::BadRequest("Role must be either user or renter".to_string())
                })?,
        };

        if self.users.find_by_email(&email).await?.is_some() {
            return Err(Error::BadRequest("User already exists".to_string()));
        }

        let user = self
            .users
            .create(NewUser {
                name,
                email,
                password_hash: hash_password(&payload.password)?,
                role,
            })
            .await?;
        info!(user_id = %user.id, role = %role, "Registered user");

        let token = self.issue_token(&user)?;
        Ok((token, user))
    }

    pub async fn login(&self, payload: LoginPayload) -> Result<(String, User)> {
        let email = payload.email.trim();
        if email.is_empty() || payload.password.is_empty() {
            return Err(Error::BadRequest(
                "Please provide email and password".to_string(),
            ));
        }

        let user = self
            .users
            .find_by_email(email)
            .await?
            .ok_or_else(invalid_credentials)?;

        if !verify_password(&payload.password, &user.password_hash)? {
            warn!(user_id = %user.id, "Rejected login with wrong password");
            return Err(invalid_credentials());
        }

        let token = self.issue_token(&user)?;
        Ok((token, user))
    }

    pub async fn current_user(&self, user_id: Uuid) -> Result<User> {
        self.users
            .find_by_id(user_id)
            .await?
            .ok_or_else(user_not_found)
    }

    pub async fn update_profile(
        &self,
        user_id: Uuid,
        payload: UpdateProfilePayload,
    ) -> Result<User> {
        let name = payload
            .name
            .map(|n| n.trim().to_string())
            .filter(|n| !n.is_empty());
        let email = payload
            .email
            .map(|e| e.trim().to_lowercase())
            .filter(|e| !e.is_empty());
        validate(&UpdateProfilePayload {
            name: name.clone(),
            email: email.clone(),
        })?;

        self.current_user(user_id).await?;

        if let Some(email) = email.as_deref() {
            if let Some(existing) = self.users.find_by_email(email).await? {
                if existing.id != user_id {
                    return Err(Error::BadRequest("Email already in use".to_string()));
                }
            }
        }

        self.users
            .update(
                user_id,
                UserChanges {
                    name,
                    email,
                    ..UserChanges::default()
                },
            )
            .await?
            .ok_or_else(user_not_found)
    }

    pub async fn change_password(
        &self,
        user_id: Uuid,
        payload: ChangePasswordPayload,
    ) -> Result<()> {
        if payload.current_password.is_empty() || payload.new_password.is_empty() {
            return Err(Error::BadRequest(
                "Please provide current and new password".to_string(),
            ));
        }
        validate(&payload)?;

        let user = self.current_user(user_id).await?;
        if !verify_password(&payload.current_password, &user.password_hash)? {
            return Err(Error::Unauthorized(
                "Current password is incorrect".to_string(),
            ));
        }

        self.users
            .update(
                user_id,
                UserChanges {
                    password_hash: Some(hash_password(&payload.new_password)?),
                    ..UserChanges::default()
                },
            )
            .await?
            .ok_or_else(user_not_found)?;
        info!(user_id = %user_id, "Password changed");
        Ok(())
    }

    pub async fn update_profile_image(
        &self,
        user_id: Uuid,
        image: Option<UploadedImage>,
    ) -> Result<User> {
        let image = image.ok_or_else(|| Error::BadRequest("No image uploaded".to_string()))?;
        validate_image(&image)?;

        let user = self.current_user(user_id).await?;
        let url = self.media.upload(UploadTarget::ProfileImage, image).await?;

        let updated = self
            .users
            .update(
                user_id,
                UserChanges {
                    profile_image: Some(url),
                    ..UserChanges::default()
                },
            )
            .await?
            .ok_or_else(user_not_found)?;

        if user.has_custom_profile_image() {
            self.discard_image(&user.profile_image).await;
        }
        Ok(updated)
    }

    /// Removes the account's listings, its hosted profile image and finally
    /// the account itself. The steps are independent: a failure part-way
    /// leaves the earlier deletions in place.
    pub async fn delete_account(&self, user_id: Uuid) -> Result<u64> {
        let user = self.current_user(user_id).await?;

        let removed_cars = self.cars.delete_by_owner(user_id).await?;

        if user.has_custom_profile_image() {
            self.discard_image(&user.profile_image).await;
        }

        if !self.users.delete(user_id).await? {
            return Err(user_not_found());
        }
        info!(user_id = %user_id, removed_cars, "Deleted account");
        Ok(removed_cars)
    }

    async fn discard_image(&self, url: &str) {
        if let Err(e) = self.media.destroy(url).await {
            warn!(error = %e, url, "Failed to delete image from media host");
        }
    }
}
