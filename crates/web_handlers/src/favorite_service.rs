use sqlx::{PgPool, Row};
use uuid::Uuid;

use crate::campground_types::CampgroundSummary;
use crate::favorite_types::*;

/// Service for a user's favorite campgrounds
pub struct FavoriteService {
    pool: PgPool,
}

impl FavoriteService {
    /// Creates a new instance of `FavoriteService` with the provided database connection pool
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Saves a campground as a favorite of the user
    pub async fn add_favorite(
        &self,
        user_id: &Uuid,
        campground_id: &Uuid,
    ) -> Result<Favorite, FavoriteError> {
        let row = sqlx::query(
            r#"
            INSERT INTO favorites (user_id, campground_id)
            VALUES ($1, $2)
            RETURNING id, user_id, campground_id, created_at
            "#,
        )
        .bind(user_id)
        .bind(campground_id)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            if postgres::database::unique_violation(&e).is_some() {
                FavoriteError::AlreadyFavorited
            } else if let Some(constraint) = postgres::database::foreign_key_violation(&e) {
                FavoriteError::missing_reference(
                    postgres::database::constraint_field(&constraint),
                    *campground_id,
                )
            } else {
                FavoriteError::Database(e)
            }
        })?;

        Ok(Favorite {
            id: row.try_get("id")?,
            user_id: row.try_get("user_id")?,
            campground_id: row.try_get("campground_id")?,
            created_at: row.try_get("created_at")?,
        })
    }

    /// Removes a favorite; removing one that does not exist is not an error
    pub async fn remove_favorite(
        &self,
        user_id: &Uuid,
        campground_id: &Uuid,
    ) -> Result<(), FavoriteError> {
        sqlx::query("DELETE FROM favorites WHERE user_id = $1 AND campground_id = $2")
            .bind(user_id)
            .bind(campground_id)
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    /// Lists the user's favorites with their campgrounds
    pub async fn list_favorites(
        &self,
        user_id: &Uuid,
    ) -> Result<Vec<FavoriteWithCampground>, FavoriteError> {
        let rows = sqlx::query(
            r#"
            SELECT
                f.id, f.user_id, f.created_at,
                c.id AS campground_id, c.name, c.address, c.telephone
            FROM favorites f
            JOIN campgrounds c ON f.campground_id = c.id
            WHERE f.user_id = $1
            ORDER BY f.created_at DESC
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        let favorites = rows
            .iter()
            .map(|row| -> Result<FavoriteWithCampground, sqlx::Error> {
                Ok(FavoriteWithCampground {
                    id: row.try_get("id")?,
                    user: row.try_get("user_id")?,
                    campground: CampgroundSummary {
                        id: row.try_get("campground_id")?,
                        name: row.try_get("name")?,
                        address: row.try_get("address")?,
                        telephone: row.try_get("telephone")?,
                    },
                    created_at: row.try_get("created_at")?,
                })
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(favorites)
    }
}
