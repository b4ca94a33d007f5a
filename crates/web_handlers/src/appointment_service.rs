use chrono::{DateTime, NaiveDate, Utc};
use sqlx::postgres::PgRow;
use sqlx::{PgPool, Row};
use uuid::Uuid;

use crate::appointment_types::*;
use crate::availability::CalendarRange;
use crate::campground_types::CampgroundSummary;

const SELECT_WITH_CAMPGROUND: &str = r#"
    SELECT
        a.id, a.appt_date, a.user_id, a.created_at,
        c.id AS campground_id, c.name AS campground_name,
        c.address AS campground_address, c.telephone AS campground_telephone
    FROM appointments a
    JOIN campgrounds c ON a.campground_id = c.id
"#;

/// Service for reading and writing appointments
pub struct AppointmentService {
    pool: PgPool,
}

impl AppointmentService {
    /// Creates a new instance of `AppointmentService` with the provided database connection pool
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Lists appointments, optionally restricted to one user and/or one campground
    pub async fn list_appointments(
        &self,
        user_id: Option<&Uuid>,
        campground_id: Option<&Uuid>,
    ) -> Result<Vec<AppointmentWithCampground>, AppointmentError> {
        let rows = sqlx::query(&format!(
            r#"
            {SELECT_WITH_CAMPGROUND}
            WHERE ($1::uuid IS NULL OR a.user_id = $1)
              AND ($2::uuid IS NULL OR a.campground_id = $2)
            ORDER BY a.appt_date ASC
            "#
        ))
        .bind(user_id)
        .bind(campground_id)
        .fetch_all(&self.pool)
        .await?;

        let appointments = rows
            .iter()
            .map(appointment_with_campground)
            .collect::<Result<Vec<_>, _>>()?;

        Ok(appointments)
    }

    /// Gets a single appointment with its campground
    pub async fn get_appointment(
        &self,
        id: &Uuid,
        kind: ReservationKind,
    ) -> Result<AppointmentWithCampground, AppointmentError> {
        let row = sqlx::query(&format!("{SELECT_WITH_CAMPGROUND} WHERE a.id = $1"))
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        match row {
            Some(row) => Ok(appointment_with_campground(&row)?),
            None => Err(AppointmentError::NotFound { kind, id: *id }),
        }
    }

    /// Gets the bare appointment row
    pub async fn find_appointment(
        &self,
        id: &Uuid,
        kind: ReservationKind,
    ) -> Result<Appointment, AppointmentError> {
        let row = sqlx::query(&format!(
            "SELECT {} FROM appointments WHERE id = $1",
            Appointment::COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        match row {
            Some(row) => Ok(Appointment::from_row(&row)?),
            None => Err(AppointmentError::NotFound { kind, id: *id }),
        }
    }

    /// Name and daily capacity of a campground
    pub async fn campground_capacity(
        &self,
        campground_id: &Uuid,
    ) -> Result<(String, i32), AppointmentError> {
        let row = sqlx::query("SELECT name, daily_capacity FROM campgrounds WHERE id = $1")
            .bind(campground_id)
            .fetch_optional(&self.pool)
            .await?;

        match row {
            Some(row) => Ok((row.try_get("name")?, row.try_get("daily_capacity")?)),
            None => Err(AppointmentError::CampgroundNotFound(*campground_id)),
        }
    }

    /// Number of appointments held by the user across all campgrounds
    pub async fn count_for_user(&self, user_id: &Uuid) -> Result<i64, AppointmentError> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM appointments WHERE user_id = $1")
            .bind(user_id)
            .fetch_one(&self.pool)
            .await?;

        Ok(count)
    }

    /// Number of appointments at the campground on the given UTC day, not counting `exclude`
    pub async fn count_on_day(
        &self,
        campground_id: &Uuid,
        day: NaiveDate,
        exclude: Option<&Uuid>,
    ) -> Result<i64, AppointmentError> {
        let range = CalendarRange::rolling(day, 1);
        let count: i64 = sqlx::query_scalar(
            r#"
            SELECT COUNT(*) FROM appointments
            WHERE campground_id = $1
              AND appt_date >= $2 AND appt_date < $3
              AND ($4::uuid IS NULL OR id <> $4)
            "#,
        )
        .bind(campground_id)
        .bind(range.start_instant())
        .bind(range.end_instant())
        .bind(exclude)
        .fetch_one(&self.pool)
        .await?;

        Ok(count)
    }

    /// Creates an appointment for the user at the campground
    pub async fn create_appointment(
        &self,
        user_id: &Uuid,
        campground_id: &Uuid,
        appt_date: DateTime<Utc>,
    ) -> Result<Appointment, AppointmentError> {
        let row = sqlx::query(&format!(
            r#"
            INSERT INTO appointments (appt_date, user_id, campground_id)
            VALUES ($1, $2, $3)
            RETURNING {}
            "#,
            Appointment::COLUMNS
        ))
        .bind(appt_date)
        .bind(user_id)
        .bind(campground_id)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            // A referenced row was removed between the lookup and the insert
            match postgres::database::foreign_key_violation(&e) {
                Some(constraint) => AppointmentError::missing_reference(
                    postgres::database::constraint_field(&constraint),
                    *campground_id,
                ),
                None => AppointmentError::Database(e),
            }
        })?;

        let appointment = Appointment::from_row(&row)?;
        log::info!(
            "User {} booked campground {} for {}",
            user_id,
            campground_id,
            appointment.appt_date
        );

        Ok(appointment)
    }

    /// Moves an appointment to a new date
    pub async fn update_appointment(
        &self,
        id: &Uuid,
        appt_date: DateTime<Utc>,
        kind: ReservationKind,
    ) -> Result<Appointment, AppointmentError> {
        let row = sqlx::query(&format!(
            "UPDATE appointments SET appt_date = $2 WHERE id = $1 RETURNING {}",
            Appointment::COLUMNS
        ))
        .bind(id)
        .bind(appt_date)
        .fetch_optional(&self.pool)
        .await?;

        match row {
            Some(row) => Ok(Appointment::from_row(&row)?),
            None => Err(AppointmentError::NotFound { kind, id: *id }),
        }
    }

    /// Deletes an appointment
    pub async fn delete_appointment(
        &self,
        id: &Uuid,
        kind: ReservationKind,
    ) -> Result<(), AppointmentError> {
        let result = sqlx::query("DELETE FROM appointments WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(AppointmentError::NotFound { kind, id: *id });
        }

        log::info!("Deleted {} {}", kind, id);
        Ok(())
    }
}

fn appointment_with_campground(row: &PgRow) -> Result<AppointmentWithCampground, sqlx::Error> {
    Ok(AppointmentWithCampground {
        id: row.try_get("id")?,
        appt_date: row.try_get("appt_date")?,
        user: row.try_get("user_id")?,
        campground: CampgroundSummary {
            id: row.try_get("campground_id")?,
            name: row.try_get("campground_name")?,
            address: row.try_get("campground_address")?,
            telephone: row.try_get("campground_telephone")?,
        },
        created_at: row.try_get("created_at")?,
    })
}
