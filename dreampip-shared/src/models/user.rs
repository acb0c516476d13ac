/// User model and database operations
///
/// Users are created by the identity provider sync and referenced here by id.
/// The budget columns are denormalized totals written by the budget ledger;
/// they stay NULL until the first recalculation.
///
/// # Schema
///
/// ```sql
/// CREATE TABLE users (
///     id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
///     email TEXT NOT NULL UNIQUE,
///     name TEXT,
///     used_budget DOUBLE PRECISION,
///     remaining_budget DOUBLE PRECISION,
///     settings JSONB NOT NULL DEFAULT '{}'::jsonb,
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
///     updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
/// );
/// ```
///
/// # Example
///
/// ```no_run
/// use dreampip_shared::models::user::{User, CreateUser};
/// use sqlx::PgPool;
///
/// # async fn example(pool: PgPool) -> Result<(), sqlx::Error> {
/// let user = User::create(&pool, CreateUser {
///     email: "pip@example.com".to_string(),
///     name: Some("Pip".to_string()),
/// }).await?;
///
/// User::write_budget_totals(&pool, user.id, 40.0, 60.0).await?;
/// # Ok(())
/// # }
/// ```

use crate::settings::UserSettings;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use sqlx::PgPool;
use uuid::Uuid;

/// User account row
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct User {
    /// Unique user ID
    pub id: Uuid,

    /// Email address, unique across users
    pub email: String,

    /// Optional display name
    pub name: Option<String>,

    /// Sum of budget percentages over owned task lists
    pub used_budget: Option<f64>,

    /// `max(0, 100 - used_budget)`
    pub remaining_budget: Option<f64>,

    /// Raw settings document; use [`User::settings`] to read it
    pub settings: JsonValue,

    pub created_at: DateTime<Utc>,

    pub updated_at: DateTime<Utc>,
}

/// Input for creating a new user
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateUser {
    pub email: String,
    pub name: Option<String>,
}

impl User {
    /// Typed view of the stored settings document
    pub fn settings(&self) -> UserSettings {
        UserSettings::from_stored(self.settings.clone())
    }

    /// Inserts a user with empty budget totals and default settings
    ///
    /// # Errors
    ///
    /// Returns an error if the email already exists or the database is unreachable
    pub async fn create(pool: &PgPool, data: CreateUser) -> Result<Self, sqlx::Error> {
        sqlx::query_as::<_, User>(
            r#"
            INSERT INTO users (email, name)
            VALUES ($1, $2)
            RETURNING id, email, name, used_budget, remaining_budget, settings,
                      created_at, updated_at
            "#,
        )
        .bind(data.email)
        .bind(data.name)
        .fetch_one(pool)
        .await
    }

    /// Finds a user by ID
    pub async fn find_by_id(pool: &PgPool, id: Uuid) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, User>(
            r#"
            SELECT id, email, name, used_budget, remaining_budget, settings,
                   created_at, updated_at
            FROM users
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(pool)
        .await
    }

    /// Reads the stored `remaining_budget`
    ///
    /// The outer `Option` is the row, the inner one the column.
    pub async fn find_remaining_budget(
        pool: &PgPool,
        id: Uuid,
    ) -> Result<Option<Option<f64>>, sqlx::Error> {
        sqlx::query_scalar::<_, Option<f64>>("SELECT remaining_budget FROM users WHERE id = $1")
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Writes both budget totals in a single statement
    ///
    /// Returns false if the user does not exist.
    pub async fn write_budget_totals(
        pool: &PgPool,
        id: Uuid,
        used_budget: f64,
        remaining_budget: f64,
    ) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            r#"
            UPDATE users
            SET used_budget = $2, remaining_budget = $3, updated_at = NOW()
            WHERE id = $1
            "#,
        )
        .bind(id)
        .bind(used_budget)
        .bind(remaining_budget)
        .execute(pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Replaces the settings document
    ///
    /// Callers pass an already validated document (see `UserSettings::to_stored`).
    pub async fn replace_settings(
        pool: &PgPool,
        id: Uuid,
        settings: JsonValue,
    ) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE users SET settings = $2, updated_at = NOW() WHERE id = $1",
        )
        .bind(id)
        .bind(settings)
        .execute(pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Deletes a user by ID
    pub async fn delete(pool: &PgPool, id: Uuid) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM users WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::settings::Theme;
    use serde_json::json;

    fn user_with_settings(settings: JsonValue) -> User {
        User {
            id: Uuid::new_v4(),
            email: "pip@example.com".to_string(),
            name: None,
            used_budget: None,
            remaining_budget: None,
            settings,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_settings_view() {
        let user = user_with_settings(json!({ "theme": "dark", "currency": "EUR" }));
        let settings = user.settings();
        assert_eq!(settings.theme(), Theme::Dark);
        assert_eq!(settings.currency(), "EUR");
    }

    #[test]
    fn test_settings_view_of_garbage_is_default() {
        let user = user_with_settings(json!("not an object"));
        assert_eq!(user.settings(), UserSettings::default());
    }
}
