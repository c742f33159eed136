//! Authentication service for sign-up, login, token rotation and password
//! resets

use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine as _};
use bcrypt::{hash, verify, DEFAULT_COST};
use chrono::{Duration, NaiveDate, Utc};
use jsonwebtoken::{decode, encode, errors::ErrorKind, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use sqlx::PgPool;
use uuid::Uuid;

use crate::config::Config;
use crate::error::{AppError, AppResult};
use crate::external::Mailer;
use shared::models::RegisterUserInput;
use shared::validation::{is_of_drinking_age, validate_password};

/// Wrong guesses allowed per reset code
const MAX_RESET_ATTEMPTS: i32 = 3;

/// Authentication service
#[derive(Clone)]
pub struct AuthService {
    db: PgPool,
    jwt_secret: String,
    access_token_expiry: i64,
    refresh_token_expiry: i64,
    reset_code_expiry: i64,
}

/// JWT claims structure
#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    /// User ID
    pub sub: String,
    pub exp: i64,
    pub iat: i64,
}

/// Authentication tokens
#[derive(Debug, Serialize)]
pub struct AuthTokens {
    pub user_id: Uuid,
    pub access_token: String,
    pub refresh_token: String,
    pub token_type: String,
    pub expires_in: i64,
}

#[derive(Debug, sqlx::FromRow)]
struct CredentialRow {
    id: Uuid,
    password_hash: String,
}

#[derive(Debug, sqlx::FromRow)]
struct ResetCodeRow {
    user_id: Uuid,
    first_name: String,
    code_hash: String,
}

/// Decode and validate an access token
pub fn decode_access_token(token: &str, secret: &str) -> AppResult<Claims> {
    decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &Validation::default(),
    )
    .map(|data| data.claims)
    .map_err(|e| match e.kind() {
        ErrorKind::ExpiredSignature => AppError::TokenExpired,
        _ => AppError::InvalidToken,
    })
}

/// Bcrypt a password
pub fn hash_password(password: &str) -> AppResult<String> {
    hash(password, DEFAULT_COST)
        .map_err(|e| AppError::Internal(format!("Password hashing failed: {}", e)))
}

/// Check a password against its bcrypt hash
pub fn verify_password(password: &str, password_hash: &str) -> AppResult<bool> {
    verify(password, password_hash)
        .map_err(|e| AppError::Internal(format!("Password verification failed: {}", e)))
}

impl AuthService {
    /// Create a new AuthService instance
    pub fn new(db: PgPool, config: &Config) -> Self {
        Self {
            db,
            jwt_secret: config.jwt.secret.clone(),
            access_token_expiry: config.jwt.access_token_expiry,
            refresh_token_expiry: config.jwt.refresh_token_expiry,
            reset_code_expiry: config.email.reset_code_expiry,
        }
    }

    /// Create an account and sign it in
    pub async fn register(&self, input: RegisterUserInput) -> AppResult<AuthTokens> {
        let today = Utc::now().date_naive();
        check_birth_date(input.birth_date, today)?;
        validate_password(&input.password).map_err(|m| AppError::validation("password", m))?;

        let email = input.email.trim().to_lowercase();
        let password_hash = hash_password(&input.password)?;

        let user_id = sqlx::query_scalar::<_, Uuid>(
            r#"
            INSERT INTO users (email, password_hash, first_name, last_name, phone_number, zip_code, birth_date)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING id
            "#,
        )
        .bind(&email)
        .bind(&password_hash)
        .bind(input.first_name.trim())
        .bind(input.last_name.trim())
        .bind(&input.phone_number)
        .bind(&input.zip_code)
        .bind(input.birth_date)
        .fetch_one(&self.db)
        .await
        .map_err(|e| match AppError::from(e) {
            AppError::DuplicateEntry(_) => AppError::DuplicateEntry("email".to_string()),
            other => other,
        })?;

        tracing::info!(%user_id, "User registered");

        self.issue_tokens(user_id).await
    }

    /// Authenticate user with email and password
    pub async fn login(&self, email: &str, password: &str) -> AppResult<AuthTokens> {
        let user = sqlx::query_as::<_, CredentialRow>(
            "SELECT id, password_hash FROM users WHERE email = $1",
        )
        .bind(email.trim().to_lowercase())
        .fetch_optional(&self.db)
        .await?
        .ok_or(AppError::InvalidCredentials)?;

        if !verify_password(password, &user.password_hash)? {
            return Err(AppError::InvalidCredentials);
        }

        self.issue_tokens(user.id).await
    }

    /// Rotate a refresh token
    pub async fn refresh_token(&self, refresh_token: &str) -> AppResult<AuthTokens> {
        let token_hash = hash_token(refresh_token);

        // Revoke and read in one step so a token cannot be used twice
        let user_id = sqlx::query_scalar::<_, Uuid>(
            r#"
            UPDATE refresh_tokens
            SET revoked_at = NOW()
            WHERE token_hash = $1
              AND expires_at > NOW()
              AND revoked_at IS NULL
            RETURNING user_id
            "#,
        )
        .bind(&token_hash)
        .fetch_optional(&self.db)
        .await?
        .ok_or_else(|| AppError::Unauthorized("Invalid or expired refresh token".to_string()))?;

        self.issue_tokens(user_id).await
    }

    /// Mail a reset code if the address belongs to an account.
    ///
    /// Unknown addresses succeed silently.
    pub async fn forgot_password(&self, mailer: &Mailer, email: &str) -> AppResult<()> {
        let email = email.trim().to_lowercase();
        let user = sqlx::query_as::<_, (Uuid, String)>(
            "SELECT id, first_name FROM users WHERE email = $1",
        )
        .bind(&email)
        .fetch_optional(&self.db)
        .await?;

        let Some((user_id, first_name)) = user else {
            tracing::debug!("Password reset requested for unknown email");
            return Ok(());
        };

        let code = generate_reset_code();
        let expires_at = Utc::now() + Duration::seconds(self.reset_code_expiry);

        sqlx::query(
            r#"
            INSERT INTO password_reset_codes (user_id, code_hash, attempts, expires_at)
            VALUES ($1, $2, 0, $3)
            ON CONFLICT (user_id)
            DO UPDATE SET code_hash = EXCLUDED.code_hash, attempts = 0,
                          expires_at = EXCLUDED.expires_at, created_at = NOW()
            "#,
        )
        .bind(user_id)
        .bind(hash_password(&code)?)
        .bind(expires_at)
        .execute(&self.db)
        .await?;

        // Delivery trouble is not reported to the caller
        if let Err(e) = mailer.send_password_reset_code(&email, &first_name, &code).await {
            tracing::error!(%user_id, "Reset code not delivered: {}", e);
        }
        Ok(())
    }

    /// Set a new password with a mailed reset code
    pub async fn reset_password(
        &self,
        mailer: &Mailer,
        email: &str,
        code: &str,
        new_password: &str,
    ) -> AppResult<()> {
        validate_password(new_password).map_err(|m| AppError::validation("new_password", m))?;

        let invalid_code =
            || AppError::Unauthorized("The reset code is invalid or has expired".to_string());

        let email = email.trim().to_lowercase();
        let record = self
            .claim_reset_attempt(&email)
            .await?
            .ok_or_else(invalid_code)?;

        if !verify_password(code.trim(), &record.code_hash)? {
            return Err(invalid_code());
        }

        let mut tx = self.db.begin().await?;

        sqlx::query("UPDATE users SET password_hash = $2, updated_at = NOW() WHERE id = $1")
            .bind(record.user_id)
            .bind(hash_password(new_password)?)
            .execute(&mut *tx)
            .await?;

        sqlx::query("DELETE FROM password_reset_codes WHERE user_id = $1")
            .bind(record.user_id)
            .execute(&mut *tx)
            .await?;

        // Existing sessions end with the old password
        sqlx::query(
            "UPDATE refresh_tokens SET revoked_at = NOW() WHERE user_id = $1 AND revoked_at IS NULL",
        )
        .bind(record.user_id)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;

        tracing::info!(user_id = %record.user_id, "Password reset");

        if let Err(e) = mailer.send_password_changed(&email, &record.first_name).await {
            tracing::warn!("Password change notice not sent: {}", e);
        }
        Ok(())
    }

    /// Count one guess against the live reset code for `email`.
    ///
    /// Returns `None` once the code has expired or its attempts are used up.
    /// Check and increment happen in one statement.
    async fn claim_reset_attempt(&self, email: &str) -> AppResult<Option<ResetCodeRow>> {
        let record = sqlx::query_as::<_, ResetCodeRow>(
            r#"
            UPDATE password_reset_codes r
            SET attempts = r.attempts + 1
            FROM users u
            WHERE u.id = r.user_id
              AND u.email = $1
              AND r.attempts < $2
              AND r.expires_at > NOW()
            RETURNING r.user_id, u.first_name, r.code_hash
            "#,
        )
        .bind(email)
        .bind(MAX_RESET_ATTEMPTS)
        .fetch_optional(&self.db)
        .await?;

        Ok(record)
    }

    /// Validate access token and return claims
    pub fn validate_token(&self, token: &str) -> AppResult<Claims> {
        decode_access_token(token, &self.jwt_secret)
    }

    async fn issue_tokens(&self, user_id: Uuid) -> AppResult<AuthTokens> {
        let tokens = self.generate_tokens(user_id)?;
        self.store_refresh_token(user_id, &tokens.refresh_token)
            .await?;
        Ok(tokens)
    }

    /// Generate access and refresh tokens
    fn generate_tokens(&self, user_id: Uuid) -> AppResult<AuthTokens> {
        let now = Utc::now();
        let access_exp = now + Duration::seconds(self.access_token_expiry);

        let access_claims = Claims {
            sub: user_id.to_string(),
            exp: access_exp.timestamp(),
            iat: now.timestamp(),
        };

        let access_token = encode(
            &Header::default(),
            &access_claims,
            &EncodingKey::from_secret(self.jwt_secret.as_bytes()),
        )
        .map_err(|e| AppError::Internal(format!("Token generation failed: {}", e)))?;

        Ok(AuthTokens {
            user_id,
            access_token,
            refresh_token: generate_refresh_token(),
            token_type: "Bearer".to_string(),
            expires_in: self.access_token_expiry,
        })
    }

    /// Store refresh token in database
    async fn store_refresh_token(&self, user_id: Uuid, token: &str) -> AppResult<()> {
        let expires_at = Utc::now() + Duration::seconds(self.refresh_token_expiry);

        sqlx::query(
            r#"
            INSERT INTO refresh_tokens (user_id, token_hash, expires_at)
            VALUES ($1, $2, $3)
            "#,
        )
        .bind(user_id)
        .bind(hash_token(token))
        .bind(expires_at)
        .execute(&self.db)
        .await?;

        Ok(())
    }
}

fn check_birth_date(birth_date: NaiveDate, today: NaiveDate) -> AppResult<()> {
    if is_of_drinking_age(birth_date, today) {
        Ok(())
    } else {
        Err(AppError::validation(
            "birth_date",
            "You must be at least 21 years old to sign up",
        ))
    }
}

/// Opaque refresh token: 32 random bytes, URL-safe base64
fn generate_refresh_token() -> String {
    let mut bytes = Vec::with_capacity(32);
    bytes.extend_from_slice(Uuid::new_v4().as_bytes());
    bytes.extend_from_slice(Uuid::new_v4().as_bytes());
    URL_SAFE_NO_PAD.encode(bytes)
}

/// Sixteen hex characters
fn generate_reset_code() -> String {
    hex::encode(&Uuid::new_v4().as_bytes()[..8])
}

/// Hash a token for storage
fn hash_token(token: &str) -> String {
    URL_SAFE_NO_PAD.encode(Sha256::digest(token.as_bytes()))
}
