use std::collections::HashMap;

use chrono::NaiveDate;
use sqlx::{PgPool, Postgres, QueryBuilder, Row};
use uuid::Uuid;

use crate::appointment_types::Appointment;
use crate::availability::CalendarRange;
use crate::campground_query::CampgroundListQuery;
use crate::campground_types::*;

/// Service for campground storage and lookups
pub struct CampgroundService {
    pool: PgPool,
}

impl CampgroundService {
    /// Creates a new instance of `CampgroundService` with the provided database connection pool
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Returns one page of campgrounds matching the query, with the total number of matches
    pub async fn list_campgrounds(
        &self,
        query: &CampgroundListQuery,
    ) -> Result<(Vec<Campground>, i64), CampgroundError> {
        let mut count = QueryBuilder::<Postgres>::new("SELECT COUNT(*) FROM campgrounds");
        query.push_filters(&mut count);
        let total: i64 = count.build_query_scalar().fetch_one(&self.pool).await?;

        let mut select = QueryBuilder::<Postgres>::new(format!(
            "SELECT {} FROM campgrounds",
            Campground::COLUMNS
        ));
        query.push_filters(&mut select);
        query.push_order_and_page(&mut select);

        let rows = select.build().fetch_all(&self.pool).await?;
        let campgrounds = rows
            .iter()
            .map(Campground::from_row)
            .collect::<Result<Vec<_>, _>>()?;

        Ok((campgrounds, total))
    }

    /// Loads the appointments of the given campgrounds, grouped by campground
    pub async fn appointments_for(
        &self,
        campground_ids: &[Uuid],
    ) -> Result<HashMap<Uuid, Vec<Appointment>>, CampgroundError> {
        if campground_ids.is_empty() {
            return Ok(HashMap::new());
        }

        let rows = sqlx::query(&format!(
            r#"
            SELECT {}
            FROM appointments
            WHERE campground_id = ANY($1)
            ORDER BY appt_date ASC
            "#,
            Appointment::COLUMNS
        ))
        .bind(campground_ids)
        .fetch_all(&self.pool)
        .await?;

        let mut grouped: HashMap<Uuid, Vec<Appointment>> = HashMap::new();
        for row in &rows {
            let appointment = Appointment::from_row(row)?;
            grouped
                .entry(appointment.campground_id)
                .or_default()
                .push(appointment);
        }

        Ok(grouped)
    }

    /// Gets a campground by ID
    pub async fn get_campground(&self, id: &Uuid) -> Result<Campground, CampgroundError> {
        let row = sqlx::query(&format!(
            "SELECT {} FROM campgrounds WHERE id = $1",
            Campground::COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        match row {
            Some(row) => Ok(Campground::from_row(&row)?),
            None => Err(CampgroundError::NotFound(*id)),
        }
    }

    /// Creates a campground, trimming its name and defaulting its capacity
    pub async fn create_campground(
        &self,
        request: &CreateCampgroundRequest,
    ) -> Result<Campground, CampgroundError> {
        let row = sqlx::query(&format!(
            r#"
            INSERT INTO campgrounds (name, address, telephone, daily_capacity)
            VALUES ($1, $2, $3, $4)
            RETURNING {}
            "#,
            Campground::COLUMNS
        ))
        .bind(request.name.trim())
        .bind(&request.address)
        .bind(&request.telephone)
        .bind(request.daily_capacity.unwrap_or(DEFAULT_DAILY_CAPACITY))
        .fetch_one(&self.pool)
        .await
        .map_err(CampgroundError::from_write)?;

        let campground = Campground::from_row(&row)?;
        log::info!("Created campground {} ({})", campground.name, campground.id);

        Ok(campground)
    }

    /// Applies the fields present in the request, leaving the others untouched
    pub async fn update_campground(
        &self,
        id: &Uuid,
        request: &UpdateCampgroundRequest,
    ) -> Result<Campground, CampgroundError> {
        let row = sqlx::query(&format!(
            r#"
            UPDATE campgrounds SET
                name = COALESCE($2, name),
                address = COALESCE($3, address),
                telephone = COALESCE($4, telephone),
                daily_capacity = COALESCE($5, daily_capacity)
            WHERE id = $1
            RETURNING {}
            "#,
            Campground::COLUMNS
        ))
        .bind(id)
        .bind(request.name.as_deref().map(str::trim))
        .bind(request.address.as_deref())
        .bind(request.telephone.as_deref())
        .bind(request.daily_capacity)
        .fetch_optional(&self.pool)
        .await
        .map_err(CampgroundError::from_write)?;

        match row {
            Some(row) => Ok(Campground::from_row(&row)?),
            None => Err(CampgroundError::NotFound(*id)),
        }
    }

    /// Deletes a campground together with all of its appointments
    pub async fn delete_campground(&self, id: &Uuid) -> Result<(), CampgroundError> {
        let mut tx = self.pool.begin().await?;

        let removed = sqlx::query("DELETE FROM appointments WHERE campground_id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?
            .rows_affected();

        let result = sqlx::query("DELETE FROM campgrounds WHERE id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        if result.rows_affected() == 0 {
            tx.rollback().await?;
            return Err(CampgroundError::NotFound(*id));
        }

        tx.commit().await?;
        log::info!("Deleted campground {} and {} appointments", id, removed);

        Ok(())
    }

    /// Returns the UTC day of every appointment at the campground within the range
    pub async fn booked_days(
        &self,
        campground_id: &Uuid,
        range: &CalendarRange,
    ) -> Result<Vec<NaiveDate>, CampgroundError> {
        let rows = sqlx::query(
            r#"
            SELECT (appt_date AT TIME ZONE 'UTC')::date AS day
            FROM appointments
            WHERE campground_id = $1 AND appt_date >= $2 AND appt_date < $3
            "#,
        )
        .bind(campground_id)
        .bind(range.start_instant())
        .bind(range.end_instant())
        .fetch_all(&self.pool)
        .await?;

        let days = rows
            .iter()
            .map(|row| row.try_get::<NaiveDate, _>("day"))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(days)
    }
}
