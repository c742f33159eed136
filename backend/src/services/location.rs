//! Location management service
//!
//! Creation and address edits go through the geocoder and the timezone
//! resolver before anything is written. Schedules are re-encoded in full
//! whenever their hours or their timezone change, and the encoded windows are
//! written in the same transaction as the location row.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;
use sqlx::types::Json;
use sqlx::PgPool;
use uuid::Uuid;

use super::hours::{BusinessHoursStore, LocationWindows};
use crate::error::{AppError, AppResult};
use crate::external::{GeocodingClient, ImageFolder, ImageSigner, TimezoneClient};
use shared::hours::week_seconds_at;
use shared::models::{
    price_label, Accommodations, Address, CreateLocationInput, Location, Schedule, ScheduleKind,
    ScheduleView, UpdateLocationInput, WeeklyHours,
};
use shared::types::GeoPoint;
use shared::validation::{
    validate_address, validate_email, validate_phone_number, validate_price_tier,
    validate_website,
};

#[derive(Clone)]
pub struct LocationService {
    db: PgPool,
    hours: BusinessHoursStore,
}

/// Full location record with both schedules
#[derive(Debug, Clone, Serialize)]
pub struct LocationDetail {
    #[serde(flatten)]
    pub location: Location,
    pub price_label: String,
    pub business_hours: ScheduleView,
    pub kid_friendly_hours: ScheduleView,
    pub open_now: bool,
    pub kid_friendly_now: bool,
    pub image_url: Option<String>,
}

#[derive(Debug, sqlx::FromRow)]
struct LocationRow {
    id: Uuid,
    owner_id: Uuid,
    name: String,
    street: String,
    city: String,
    state: String,
    zip_code: String,
    latitude: f64,
    longitude: f64,
    phone_number: String,
    email: Option<String>,
    website: Option<String>,
    price: i16,
    rating: Decimal,
    review_count: i64,
    accommodations: Json<Accommodations>,
    timezone: String,
    business_hours: Json<WeeklyHours>,
    kid_friendly_hours: Json<WeeklyHours>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl LocationRow {
    fn address(&self) -> Address {
        Address {
            street: self.street.clone(),
            city: self.city.clone(),
            state: self.state.clone(),
            zip_code: self.zip_code.clone(),
        }
    }

    fn into_parts(self) -> (Location, String, WeeklyHours, WeeklyHours) {
        let location = Location {
            address: self.address(),
            id: self.id,
            owner_id: self.owner_id,
            name: self.name,
            coordinates: GeoPoint::new(self.latitude, self.longitude),
            phone_number: self.phone_number,
            email: self.email,
            website: self.website,
            price: self.price,
            rating: self.rating,
            review_count: self.review_count,
            accommodations: self.accommodations.0,
            created_at: self.created_at,
            updated_at: self.updated_at,
        };
        (
            location,
            self.timezone,
            self.business_hours.0,
            self.kid_friendly_hours.0,
        )
    }
}

const LOCATION_COLUMNS: &str = r#"
    id, owner_id, name, street, city, state, zip_code,
    ST_Y(geog::geometry) AS latitude, ST_X(geog::geometry) AS longitude,
    phone_number, email, website, price, rating, review_count, accommodations,
    timezone, business_hours, kid_friendly_hours, created_at, updated_at
"#;

impl LocationService {
    pub fn new(db: PgPool) -> Self {
        let hours = BusinessHoursStore::new(db.clone());
        Self { db, hours }
    }

    /// Create a location owned by `owner_id`
    pub async fn create(
        &self,
        geocoder: &GeocodingClient,
        timezones: &TimezoneClient,
        owner_id: Uuid,
        input: CreateLocationInput,
    ) -> AppResult<Location> {
        validate_name(&input.name)?;
        validate_address(&input.address).map_err(|m| AppError::validation("address", m))?;
        validate_contact(
            Some(&input.phone_number),
            input.email.as_deref(),
            input.website.as_deref(),
        )?;
        validate_price_tier(input.price).map_err(|m| AppError::validation("price", m))?;

        let point = geocoder.geocode(&input.address.one_line()).await?;
        let timezone = timezones.resolve(input.timezone.as_deref(), point).await?;

        let now = Utc::now();
        let general = Schedule::build(&timezone, input.business_hours, now)?;
        let kid_friendly = Schedule::build(&timezone, input.kid_friendly_hours, now)?;

        let mut tx = self.db.begin().await?;

        let row = sqlx::query_as::<_, LocationRow>(&format!(
            r#"
            INSERT INTO locations (
                owner_id, name, street, city, state, zip_code, geog,
                phone_number, email, website, price, accommodations,
                timezone, business_hours, kid_friendly_hours
            )
            VALUES (
                $1, $2, $3, $4, $5, $6,
                ST_SetSRID(ST_MakePoint($7, $8), 4326)::geography,
                $9, $10, $11, $12, $13, $14, $15, $16
            )
            RETURNING {}
            "#,
            LOCATION_COLUMNS
        ))
        .bind(owner_id)
        .bind(input.name.trim())
        .bind(&input.address.street)
        .bind(&input.address.city)
        .bind(&input.address.state)
        .bind(&input.address.zip_code)
        .bind(point.longitude)
        .bind(point.latitude)
        .bind(&input.phone_number)
        .bind(blank_to_none(input.email))
        .bind(blank_to_none(input.website))
        .bind(input.price)
        .bind(Json(input.accommodations))
        .bind(&timezone)
        .bind(Json(&general.hours))
        .bind(Json(&kid_friendly.hours))
        .fetch_one(&mut *tx)
        .await?;

        BusinessHoursStore::replace_windows(&mut *tx, row.id, ScheduleKind::General, &general.windows)
            .await?;
        BusinessHoursStore::replace_windows(
            &mut *tx,
            row.id,
            ScheduleKind::KidFriendly,
            &kid_friendly.windows,
        )
        .await?;

        tx.commit().await?;

        tracing::info!(location_id = %row.id, %owner_id, timezone = %timezone, "Location created");

        let (location, ..) = row.into_parts();
        Ok(location)
    }

    /// Full record with schedules, open flags and image link
    pub async fn get_detail(&self, images: &ImageSigner, id: Uuid) -> AppResult<LocationDetail> {
        let row = self.fetch_row(id).await?;
        let mut windows = self.hours.windows_for(&[id]).await?;
        let LocationWindows {
            general,
            kid_friendly,
        } = windows.remove(&id).unwrap_or_default();

        let (location, timezone, business_hours, kid_friendly_hours) = row.into_parts();
        let general = Schedule {
            timezone: timezone.clone(),
            hours: business_hours,
            windows: general,
        };
        let kid_friendly = Schedule {
            timezone,
            hours: kid_friendly_hours,
            windows: kid_friendly,
        };

        let now = week_seconds_at(Utc::now());
        let image_url = images
            .download_url_or_none(ImageFolder::Locations, id)
            .await;

        Ok(LocationDetail {
            price_label: price_label(location.price),
            open_now: general.is_open_at(now),
            kid_friendly_now: kid_friendly.is_open_at(now),
            business_hours: ScheduleView::from(&general),
            kid_friendly_hours: ScheduleView::from(&kid_friendly),
            image_url,
            location,
        })
    }

    /// Apply an owner's edits.
    ///
    /// A new address is geocoded and its timezone resolved again; a timezone
    /// change re-encodes both schedules even when their hours were not
    /// supplied.
    pub async fn update(
        &self,
        geocoder: &GeocodingClient,
        timezones: &TimezoneClient,
        user_id: Uuid,
        id: Uuid,
        input: UpdateLocationInput,
    ) -> AppResult<Location> {
        let current = self.fetch_row(id).await?;
        ensure_owner(current.owner_id, user_id)?;

        if let Some(name) = &input.name {
            validate_name(name)?;
        }
        if let Some(address) = &input.address {
            validate_address(address).map_err(|m| AppError::validation("address", m))?;
        }
        validate_contact(
            input.phone_number.as_deref(),
            input.email.as_deref(),
            input.website.as_deref(),
        )?;
        if let Some(price) = input.price {
            validate_price_tier(price).map_err(|m| AppError::validation("price", m))?;
        }

        let email = optional_edit(input.email);
        let website = optional_edit(input.website);

        let current_address = current.address();
        let (address, point, timezone) = match input.address {
            Some(address) if address != current_address => {
                let point = geocoder.geocode(&address.one_line()).await?;
                let timezone = timezones.resolve(None, point).await?;
                (address, point, timezone)
            }
            _ => (
                current_address,
                GeoPoint::new(current.latitude, current.longitude),
                current.timezone.clone(),
            ),
        };

        let timezone_changed = timezone != current.timezone;
        let now = Utc::now();
        let rebuild = |supplied: Option<WeeklyHours>, existing: &WeeklyHours| match supplied {
            Some(hours) => Schedule::build(&timezone, hours, now).map(Some),
            None if timezone_changed => Schedule::build(&timezone, existing.clone(), now).map(Some),
            None => Ok(None),
        };
        let general = rebuild(input.business_hours, &current.business_hours.0)?;
        let kid_friendly = rebuild(input.kid_friendly_hours, &current.kid_friendly_hours.0)?;

        let mut tx = self.db.begin().await?;

        let row = sqlx::query_as::<_, LocationRow>(&format!(
            r#"
            UPDATE locations SET
                name = COALESCE($2, name),
                street = $3,
                city = $4,
                state = $5,
                zip_code = $6,
                geog = ST_SetSRID(ST_MakePoint($7, $8), 4326)::geography,
                phone_number = COALESCE($9, phone_number),
                email = CASE WHEN $10 THEN $11 ELSE email END,
                website = CASE WHEN $12 THEN $13 ELSE website END,
                price = COALESCE($14, price),
                accommodations = COALESCE($15, accommodations),
                timezone = $16,
                business_hours = COALESCE($17, business_hours),
                kid_friendly_hours = COALESCE($18, kid_friendly_hours),
                updated_at = NOW()
            WHERE id = $1
            RETURNING {}
            "#,
            LOCATION_COLUMNS
        ))
        .bind(id)
        .bind(input.name.as_deref().map(str::trim))
        .bind(&address.street)
        .bind(&address.city)
        .bind(&address.state)
        .bind(&address.zip_code)
        .bind(point.longitude)
        .bind(point.latitude)
        .bind(&input.phone_number)
        .bind(email.is_some())
        .bind(email.flatten())
        .bind(website.is_some())
        .bind(website.flatten())
        .bind(input.price)
        .bind(input.accommodations.map(Json))
        .bind(&timezone)
        .bind(general.as_ref().map(|s| Json(&s.hours)))
        .bind(kid_friendly.as_ref().map(|s| Json(&s.hours)))
        .fetch_one(&mut *tx)
        .await?;

        if let Some(schedule) = &general {
            BusinessHoursStore::replace_windows(&mut *tx, id, ScheduleKind::General, &schedule.windows)
                .await?;
        }
        if let Some(schedule) = &kid_friendly {
            BusinessHoursStore::replace_windows(
                &mut *tx,
                id,
                ScheduleKind::KidFriendly,
                &schedule.windows,
            )
            .await?;
        }

        tx.commit().await?;

        tracing::info!(
            location_id = %id,
            general_rebuilt = general.is_some(),
            kid_friendly_rebuilt = kid_friendly.is_some(),
            "Location updated"
        );

        let (location, ..) = row.into_parts();
        Ok(location)
    }

    /// Delete a location with its hours and reviews
    pub async fn delete(&self, user_id: Uuid, id: Uuid) -> AppResult<()> {
        let current = self.fetch_row(id).await?;
        ensure_owner(current.owner_id, user_id)?;

        sqlx::query("DELETE FROM locations WHERE id = $1")
            .bind(id)
            .execute(&self.db)
            .await?;

        tracing::info!(location_id = %id, "Location deleted");
        Ok(())
    }

    /// Locations owned by the caller, newest first
    pub async fn list_mine(&self, owner_id: Uuid) -> AppResult<Vec<Location>> {
        let rows = sqlx::query_as::<_, LocationRow>(&format!(
            "SELECT {} FROM locations WHERE owner_id = $1 ORDER BY created_at DESC",
            LOCATION_COLUMNS
        ))
        .bind(owner_id)
        .fetch_all(&self.db)
        .await?;

        Ok(rows.into_iter().map(|r| r.into_parts().0).collect())
    }

    /// Presigned upload link for the location photo
    pub async fn image_upload_url(
        &self,
        images: &ImageSigner,
        user_id: Uuid,
        id: Uuid,
    ) -> AppResult<String> {
        let owner_id = sqlx::query_scalar::<_, Uuid>("SELECT owner_id FROM locations WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.db)
            .await?
            .ok_or(AppError::LocationNotFound(id))?;
        ensure_owner(owner_id, user_id)?;

        images.upload_url(ImageFolder::Locations, id).await
    }

    async fn fetch_row(&self, id: Uuid) -> AppResult<LocationRow> {
        sqlx::query_as::<_, LocationRow>(&format!(
            "SELECT {} FROM locations WHERE id = $1",
            LOCATION_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.db)
        .await?
        .ok_or(AppError::LocationNotFound(id))
    }
}

fn ensure_owner(owner_id: Uuid, user_id: Uuid) -> AppResult<()> {
    if owner_id == user_id {
        Ok(())
    } else {
        Err(AppError::NotOwner("location".to_string()))
    }
}

fn validate_name(name: &str) -> AppResult<()> {
    if name.trim().is_empty() {
        return Err(AppError::validation("name", "Name cannot be empty"));
    }
    if name.trim().chars().count() > 200 {
        return Err(AppError::validation("name", "Name is too long"));
    }
    Ok(())
}

fn validate_contact(
    phone_number: Option<&str>,
    email: Option<&str>,
    website: Option<&str>,
) -> AppResult<()> {
    if let Some(phone) = phone_number {
        validate_phone_number(phone).map_err(|m| AppError::validation("phone_number", m))?;
    }
    if let Some(email) = email.filter(|e| !e.trim().is_empty()) {
        validate_email(email).map_err(|m| AppError::validation("email", m))?;
    }
    if let Some(website) = website.filter(|w| !w.trim().is_empty()) {
        validate_website(website).map_err(|m| AppError::validation("website", m))?;
    }
    Ok(())
}

fn blank_to_none(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

/// Edit of an optional field: `None` keeps the stored value, `Some(None)`
/// clears it (the caller sent a blank), `Some(Some(v))` replaces it
fn optional_edit(value: Option<String>) -> Option<Option<String>> {
    value.map(|v| blank_to_none(Some(v.trim().to_string())))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blank_contact_fields_clear_and_absent_ones_keep() {
        assert_eq!(optional_edit(None), None);
        assert_eq!(optional_edit(Some("   ".to_string())), Some(None));
        assert_eq!(optional_edit(Some(String::new())), Some(None));
        assert_eq!(
            optional_edit(Some(" taproom@hopyard.com ".to_string())),
            Some(Some("taproom@hopyard.com".to_string()))
        );
    }

    #[test]
    fn only_the_owner_passes() {
        let owner = Uuid::new_v4();
        assert!(ensure_owner(owner, owner).is_ok());
        assert!(matches!(
            ensure_owner(owner, Uuid::new_v4()),
            Err(AppError::NotOwner(_))
        ));
    }

    #[test]
    fn contact_fields_are_checked_when_present() {
        assert!(validate_contact(Some("555-123-4567"), None, None).is_ok());
        assert!(validate_contact(None, Some(""), Some("  ")).is_ok());
        assert!(matches!(
            validate_contact(Some("12345"), None, None),
            Err(AppError::Validation { field, .. }) if field == "phone_number"
        ));
        assert!(matches!(
            validate_contact(None, Some("not-an-email"), None),
            Err(AppError::Validation { field, .. }) if field == "email"
        ));
    }

    #[test]
    fn blank_names_are_rejected() {
        assert!(validate_name("Hop Yard").is_ok());
        assert!(validate_name("   ").is_err());
    }
}
