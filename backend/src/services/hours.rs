//! Business hours store
//!
//! Encoded open windows per location and schedule kind. A schedule's windows
//! are always replaced as a set, inside the caller's transaction.

use std::collections::HashMap;

use sqlx::{PgConnection, PgPool};
use uuid::Uuid;

use crate::error::AppResult;
use shared::hours::{OpenWindow, OpenWindows};
use shared::models::ScheduleKind;

#[derive(Clone)]
pub struct BusinessHoursStore {
    db: PgPool,
}

/// Both schedules of one location
#[derive(Debug, Clone, Default)]
pub struct LocationWindows {
    pub general: OpenWindows,
    pub kid_friendly: OpenWindows,
}

impl LocationWindows {
    pub fn of(&self, kind: ScheduleKind) -> &OpenWindows {
        match kind {
            ScheduleKind::General => &self.general,
            ScheduleKind::KidFriendly => &self.kid_friendly,
        }
    }
}

#[derive(Debug, sqlx::FromRow)]
struct WindowRow {
    location_id: Uuid,
    kind: String,
    open_seconds: i64,
    close_seconds: i64,
}

impl BusinessHoursStore {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    /// Swap the stored windows of one schedule for `windows`
    pub async fn replace_windows(
        conn: &mut PgConnection,
        location_id: Uuid,
        kind: ScheduleKind,
        windows: &OpenWindows,
    ) -> AppResult<()> {
        sqlx::query("DELETE FROM location_hours WHERE location_id = $1 AND kind = $2")
            .bind(location_id)
            .bind(kind.as_str())
            .execute(&mut *conn)
            .await?;

        if windows.is_empty() {
            return Ok(());
        }

        let (opens, closes): (Vec<i64>, Vec<i64>) =
            windows.iter().map(|w| (w.open, w.close)).unzip();

        sqlx::query(
            r#"
            INSERT INTO location_hours (location_id, kind, open_seconds, close_seconds)
            SELECT $1, $2, o, c FROM UNNEST($3::BIGINT[], $4::BIGINT[]) AS w(o, c)
            "#,
        )
        .bind(location_id)
        .bind(kind.as_str())
        .bind(&opens)
        .bind(&closes)
        .execute(&mut *conn)
        .await?;

        tracing::debug!(
            %location_id,
            kind = kind.as_str(),
            windows = windows.len(),
            "Replaced open windows"
        );
        Ok(())
    }

    /// Stored windows of one schedule
    pub async fn windows(&self, location_id: Uuid, kind: ScheduleKind) -> AppResult<OpenWindows> {
        let rows = sqlx::query_as::<_, (i64, i64)>(
            r#"
            SELECT open_seconds, close_seconds
            FROM location_hours
            WHERE location_id = $1 AND kind = $2
            ORDER BY open_seconds
            "#,
        )
        .bind(location_id)
        .bind(kind.as_str())
        .fetch_all(&self.db)
        .await?;

        Ok(rows
            .into_iter()
            .map(|(open, close)| OpenWindow { open, close })
            .collect())
    }

    /// Windows of both schedules for many locations in one query.
    ///
    /// Locations without stored windows map to closed schedules.
    pub async fn windows_for(&self, location_ids: &[Uuid]) -> AppResult<HashMap<Uuid, LocationWindows>> {
        if location_ids.is_empty() {
            return Ok(HashMap::new());
        }

        let rows = sqlx::query_as::<_, WindowRow>(
            r#"
            SELECT location_id, kind, open_seconds, close_seconds
            FROM location_hours
            WHERE location_id = ANY($1)
            ORDER BY location_id, kind, open_seconds
            "#,
        )
        .bind(location_ids)
        .fetch_all(&self.db)
        .await?;

        Ok(group_rows(rows))
    }

    /// Whether a location's schedule covers the given week-relative second
    pub async fn is_open_at(
        &self,
        location_id: Uuid,
        kind: ScheduleKind,
        week_seconds: i64,
    ) -> AppResult<bool> {
        let open = sqlx::query_scalar::<_, bool>(
            r#"
            SELECT EXISTS (
                SELECT 1 FROM location_hours
                WHERE location_id = $1 AND kind = $2
                  AND open_seconds <= $3 AND close_seconds >= $3
            )
            "#,
        )
        .bind(location_id)
        .bind(kind.as_str())
        .bind(week_seconds)
        .fetch_one(&self.db)
        .await?;

        Ok(open)
    }
}

fn group_rows(rows: Vec<WindowRow>) -> HashMap<Uuid, LocationWindows> {
    let mut grouped: HashMap<Uuid, (Vec<OpenWindow>, Vec<OpenWindow>)> = HashMap::new();
    for row in rows {
        let entry = grouped.entry(row.location_id).or_default();
        let window = OpenWindow {
            open: row.open_seconds,
            close: row.close_seconds,
        };
        if row.kind == ScheduleKind::KidFriendly.as_str() {
            entry.1.push(window);
        } else {
            entry.0.push(window);
        }
    }

    grouped
        .into_iter()
        .map(|(id, (general, kid_friendly))| {
            (
                id,
                LocationWindows {
                    general: OpenWindows::new(general),
                    kid_friendly: OpenWindows::new(kid_friendly),
                },
            )
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(id: Uuid, kind: ScheduleKind, open: i64, close: i64) -> WindowRow {
        WindowRow {
            location_id: id,
            kind: kind.as_str().to_string(),
            open_seconds: open,
            close_seconds: close,
        }
    }

    #[test]
    fn rows_group_by_location_and_kind() {
        let a = Uuid::new_v4();
        let b = Uuid::new_v4();
        let grouped = group_rows(vec![
            row(a, ScheduleKind::General, 100, 200),
            row(a, ScheduleKind::KidFriendly, 120, 150),
            row(a, ScheduleKind::General, 300, 400),
            row(b, ScheduleKind::General, 10, 20),
        ]);

        let first = &grouped[&a];
        assert_eq!(first.general.len(), 2);
        assert_eq!(first.kid_friendly.len(), 1);
        assert!(first.of(ScheduleKind::General).is_open_at(350));
        assert!(!first.of(ScheduleKind::KidFriendly).is_open_at(350));

        assert!(grouped[&b].kid_friendly.is_empty());
    }
}
