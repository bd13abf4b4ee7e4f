use crate::database::postgres_repository::PostgresRepository;
use crate::error::app_error::AppError;
use crate::models::appointment::{Appointment, AppointmentStatus, BookRequest};
use chrono::{NaiveDate, NaiveTime};
use uuid::Uuid;

#[async_trait::async_trait]
pub trait AppointmentRepository {
    async fn create_appointment(&self, owner_id: &Uuid, request: &BookRequest) -> Result<Appointment, AppError>;
    async fn list_appointments_for_owner(&self, owner_id: &Uuid) -> Result<Vec<Appointment>, AppError>;
    async fn list_all_appointments(&self) -> Result<Vec<Appointment>, AppError>;
    async fn get_appointment_by_id(&self, id: &Uuid) -> Result<Option<Appointment>, AppError>;
    /// Move a scheduled appointment to a new date/time. Returns None when the
    /// appointment is no longer `scheduled` (or does not exist) at update
    /// time, so a stale command cannot touch a terminal row.
    async fn reschedule_appointment(&self, id: &Uuid, date: NaiveDate, time: NaiveTime) -> Result<Option<Appointment>, AppError>;
    /// Transition a scheduled appointment into a terminal status, leaving
    /// date/time untouched. Same conditional-update contract as
    /// `reschedule_appointment`.
    async fn close_appointment(&self, id: &Uuid, status: AppointmentStatus) -> Result<Option<Appointment>, AppError>;
}

#[async_trait::async_trait]
impl AppointmentRepository for PostgresRepository {
    async fn create_appointment(&self, owner_id: &Uuid, request: &BookRequest) -> Result<Appointment, AppError> {
        let appointment = sqlx::query_as::<_, Appointment>(
            r#"
            INSERT INTO appointment (owner_id, date, time, purpose)
            VALUES ($1, $2, $3, $4)
            RETURNING
                id,
                owner_id,
                (SELECT name FROM users WHERE id = owner_id) AS owner_name,
                date,
                time,
                purpose,
                status,
                created_at
            "#,
        )
        .bind(owner_id)
        .bind(request.date)
        .bind(request.time)
        .bind(&request.purpose)
        .fetch_one(&self.pool)
        .await?;

        Ok(appointment)
    }

    async fn list_appointments_for_owner(&self, owner_id: &Uuid) -> Result<Vec<Appointment>, AppError> {
        let appointments = sqlx::query_as::<_, Appointment>(
            r#"
            SELECT a.id, a.owner_id, u.name AS owner_name, a.date, a.time, a.purpose, a.status, a.created_at
            FROM appointment a
            JOIN users u ON u.id = a.owner_id
            WHERE a.owner_id = $1
            ORDER BY a.created_at DESC
            "#,
        )
        .bind(owner_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(appointments)
    }

    async fn list_all_appointments(&self) -> Result<Vec<Appointment>, AppError> {
        let appointments = sqlx::query_as::<_, Appointment>(
            r#"
            SELECT a.id, a.owner_id, u.name AS owner_name, a.date, a.time, a.purpose, a.status, a.created_at
            FROM appointment a
            JOIN users u ON u.id = a.owner_id
            ORDER BY a.created_at DESC
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(appointments)
    }

    async fn get_appointment_by_id(&self, id: &Uuid) -> Result<Option<Appointment>, AppError> {
        let appointment = sqlx::query_as::<_, Appointment>(
            r#"
            SELECT a.id, a.owner_id, u.name AS owner_name, a.date, a.time, a.purpose, a.status, a.created_at
            FROM appointment a
            JOIN users u ON u.id = a.owner_id
            WHERE a.id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(appointment)
    }

    async fn reschedule_appointment(&self, id: &Uuid, date: NaiveDate, time: NaiveTime) -> Result<Option<Appointment>, AppError> {
        let appointment = sqlx::query_as::<_, Appointment>(
            r#"
            UPDATE appointment a
            SET date = $2, time = $3
            FROM users u
            WHERE a.id = $1
              AND a.status = 'scheduled'
              AND u.id = a.owner_id
            RETURNING a.id, a.owner_id, u.name AS owner_name, a.date, a.time, a.purpose, a.status, a.created_at
            "#,
        )
        .bind(id)
        .bind(date)
        .bind(time)
        .fetch_optional(&self.pool)
        .await?;

        Ok(appointment)
    }

    async fn close_appointment(&self, id: &Uuid, status: AppointmentStatus) -> Result<Option<Appointment>, AppError> {
        let appointment = sqlx::query_as::<_, Appointment>(
            r#"
            UPDATE appointment a
            SET status = $2
            FROM users u
            WHERE a.id = $1
              AND a.status = 'scheduled'
              AND u.id = a.owner_id
            RETURNING a.id, a.owner_id, u.name AS owner_name, a.date, a.time, a.purpose, a.status, a.created_at
            "#,
        )
        .bind(id)
        .bind(status)
        .fetch_optional(&self.pool)
        .await?;

        Ok(appointment)
    }
}
