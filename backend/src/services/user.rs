//! Account profile service

use sqlx::PgPool;
use uuid::Uuid;

use super::auth::{hash_password, verify_password};
use crate::error::{AppError, AppResult};
use crate::external::{ImageFolder, ImageSigner};
use shared::models::{
    ChangeEmailInput, ChangePasswordInput, ChangePhoneInput, UpdateProfileInput, User,
    UserProfile,
};
use shared::validation::{validate_email, validate_password, validate_phone_number, validate_zip_code};

#[derive(Clone)]
pub struct UserService {
    db: PgPool,
}

#[derive(Debug, sqlx::FromRow)]
struct UserRow {
    id: Uuid,
    email: String,
    first_name: String,
    last_name: String,
    phone_number: String,
    zip_code: String,
    birth_date: chrono::NaiveDate,
    created_at: chrono::DateTime<chrono::Utc>,
    updated_at: chrono::DateTime<chrono::Utc>,
}

impl From<UserRow> for User {
    fn from(row: UserRow) -> Self {
        User {
            id: row.id,
            email: row.email,
            first_name: row.first_name,
            last_name: row.last_name,
            phone_number: row.phone_number,
            zip_code: row.zip_code,
            birth_date: row.birth_date,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

const USER_COLUMNS: &str = "id, email, first_name, last_name, phone_number, zip_code, birth_date, created_at, updated_at";

impl UserService {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    pub async fn get_user(&self, user_id: Uuid) -> AppResult<User> {
        let row = sqlx::query_as::<_, UserRow>(&format!(
            "SELECT {} FROM users WHERE id = $1",
            USER_COLUMNS
        ))
        .bind(user_id)
        .fetch_optional(&self.db)
        .await?
        .ok_or_else(|| AppError::NotFound("User".to_string()))?;

        Ok(row.into())
    }

    /// Profile with a signed avatar link when one was uploaded
    pub async fn get_profile(&self, images: &ImageSigner, user_id: Uuid) -> AppResult<UserProfile> {
        let user = self.get_user(user_id).await?;
        let avatar_url = images
            .download_url_or_none(ImageFolder::Avatars, user_id)
            .await;

        Ok(UserProfile { user, avatar_url })
    }

    pub async fn update_profile(&self, user_id: Uuid, input: UpdateProfileInput) -> AppResult<User> {
        if let Some(zip) = &input.zip_code {
            validate_zip_code(zip).map_err(|m| AppError::validation("zip_code", m))?;
        }
        for (field, value) in [("first_name", &input.first_name), ("last_name", &input.last_name)] {
            if value.as_deref().is_some_and(|v| v.trim().is_empty()) {
                return Err(AppError::validation(field, "Cannot be empty"));
            }
        }

        let row = sqlx::query_as::<_, UserRow>(&format!(
            r#"
            UPDATE users SET
                first_name = COALESCE($2, first_name),
                last_name = COALESCE($3, last_name),
                zip_code = COALESCE($4, zip_code),
                updated_at = NOW()
            WHERE id = $1
            RETURNING {}
            "#,
            USER_COLUMNS
        ))
        .bind(user_id)
        .bind(input.first_name.as_deref().map(str::trim))
        .bind(input.last_name.as_deref().map(str::trim))
        .bind(&input.zip_code)
        .fetch_optional(&self.db)
        .await?
        .ok_or_else(|| AppError::NotFound("User".to_string()))?;

        tracing::info!(%user_id, "Profile updated");
        Ok(row.into())
    }

    pub async fn change_password(&self, user_id: Uuid, input: ChangePasswordInput) -> AppResult<()> {
        validate_password(&input.new_password)
            .map_err(|m| AppError::validation("new_password", m))?;
        self.confirm_password(user_id, &input.current_password).await?;

        sqlx::query("UPDATE users SET password_hash = $2, updated_at = NOW() WHERE id = $1")
            .bind(user_id)
            .bind(hash_password(&input.new_password)?)
            .execute(&self.db)
            .await?;

        tracing::info!(%user_id, "Password changed");
        Ok(())
    }

    pub async fn change_email(&self, user_id: Uuid, input: ChangeEmailInput) -> AppResult<User> {
        let email = input.email.trim().to_lowercase();
        validate_email(&email).map_err(|m| AppError::validation("email", m))?;
        self.confirm_password(user_id, &input.password).await?;

        let row = sqlx::query_as::<_, UserRow>(&format!(
            "UPDATE users SET email = $2, updated_at = NOW() WHERE id = $1 RETURNING {}",
            USER_COLUMNS
        ))
        .bind(user_id)
        .bind(&email)
        .fetch_one(&self.db)
        .await
        .map_err(|e| match AppError::from(e) {
            AppError::DuplicateEntry(_) => AppError::DuplicateEntry("email".to_string()),
            other => other,
        })?;

        tracing::info!(%user_id, "Email changed");
        Ok(row.into())
    }

    pub async fn change_phone(&self, user_id: Uuid, input: ChangePhoneInput) -> AppResult<User> {
        validate_phone_number(&input.phone_number)
            .map_err(|m| AppError::validation("phone_number", m))?;
        self.confirm_password(user_id, &input.password).await?;

        let row = sqlx::query_as::<_, UserRow>(&format!(
            "UPDATE users SET phone_number = $2, updated_at = NOW() WHERE id = $1 RETURNING {}",
            USER_COLUMNS
        ))
        .bind(user_id)
        .bind(&input.phone_number)
        .fetch_one(&self.db)
        .await?;

        Ok(row.into())
    }

    /// Sensitive changes require the current password
    async fn confirm_password(&self, user_id: Uuid, password: &str) -> AppResult<()> {
        let password_hash =
            sqlx::query_scalar::<_, String>("SELECT password_hash FROM users WHERE id = $1")
                .bind(user_id)
                .fetch_optional(&self.db)
                .await?
                .ok_or_else(|| AppError::NotFound("User".to_string()))?;

        if verify_password(password, &password_hash)? {
            Ok(())
        } else {
            Err(AppError::InvalidCredentials)
        }
    }
}
