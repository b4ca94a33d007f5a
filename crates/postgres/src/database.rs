use sqlx::postgres::PgPoolOptions;
use sqlx::{PgPool, Row};

/// Default connection string used when `DATABASE_URL` is not set.
pub const DEFAULT_DATABASE_URL: &str = "postgres://localhost/campground_booking";

/// Creates a connection pool to the PostgreSQL database.
pub async fn create_connection_pool(
    database_url: &str,
    max_connections: u32,
) -> Result<PgPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(max_connections)
        .connect(database_url)
        .await
}

/// Tests the database connection by executing a simple query.
pub async fn test_connection(pool: &PgPool) -> Result<(), sqlx::Error> {
    let row = sqlx::query("SELECT 1 as test").fetch_one(pool).await?;

    let test_value: i32 = row.get("test");
    log::info!("Database connection successful, test value: {}", test_value);

    Ok(())
}

/// Applies the embedded schema migrations.
pub async fn run_migrations(pool: &PgPool) -> Result<(), sqlx::migrate::MigrateError> {
    sqlx::migrate!("./migrations").run(pool).await?;
    log::info!("Database migrations applied");
    Ok(())
}

/// Returns the violated constraint name when `err` is a unique-key violation.
pub fn unique_violation(err: &sqlx::Error) -> Option<String> {
    match err {
        sqlx::Error::Database(db) if db.is_unique_violation() => {
            Some(db.constraint().unwrap_or_default().to_string())
        }
        _ => None,
    }
}

/// Returns the violated constraint name when `err` is a foreign-key violation.
pub fn foreign_key_violation(err: &sqlx::Error) -> Option<String> {
    match err {
        sqlx::Error::Database(db) if db.is_foreign_key_violation() => {
            Some(db.constraint().unwrap_or_default().to_string())
        }
        _ => None,
    }
}

/// Maps a constraint name such as `campgrounds_telephone_key` or
/// `appointments_user_id_fkey` to the field it guards.
pub fn constraint_field(constraint: &str) -> &str {
    constraint
        .strip_suffix("_fkey")
        .or_else(|| constraint.strip_suffix("_key"))
        .and_then(|rest| rest.split_once('_').map(|(_, field)| field))
        .unwrap_or(constraint)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_constraint_field() {
        assert_eq!(constraint_field("campgrounds_telephone_key"), "telephone");
        assert_eq!(constraint_field("campgrounds_name_key"), "name");
        assert_eq!(constraint_field("users_email_key"), "email");
        assert_eq!(
            constraint_field("favorites_user_id_campground_id_key"),
            "user_id_campground_id"
        );
        assert_eq!(constraint_field("custom"), "custom");
    }

    #[test]
    fn test_constraint_field_for_foreign_keys() {
        assert_eq!(constraint_field("appointments_user_id_fkey"), "user_id");
        assert_eq!(
            constraint_field("appointments_campground_id_fkey"),
            "campground_id"
        );
        assert_eq!(constraint_field("favorites_user_id_fkey"), "user_id");
        assert_eq!(
            constraint_field("favorites_campground_id_fkey"),
            "campground_id"
        );
    }

    #[test]
    fn test_non_database_errors_are_not_violations() {
        let err = sqlx::Error::RowNotFound;
        assert!(unique_violation(&err).is_none());
        assert!(foreign_key_violation(&err).is_none());
    }

    #[tokio::test]
    async fn test_pool_rejects_malformed_url() {
        let result = create_connection_pool("not a database url", 1).await;
        assert!(result.is_err());
    }
}
