use crate::database::appointment::AppointmentRepository;
use crate::error::app_error::AppError;
use crate::models::appointment::{Appointment, AppointmentResponse, AppointmentStatus, BookRequest, TransitionError, UpdateStatusRequest};
use crate::models::pagination::{PageParams, PaginatedResponse};
use crate::models::user::Role;
use tracing::info;
use uuid::Uuid;
use validator::Validate;

/// Appointment lifecycle commands. Transitions are re-validated here rather
/// than trusted from the caller: a stale dashboard can still send a command
/// against a terminal appointment.
pub struct AppointmentService<'a, R> {
    repo: &'a R,
}

impl<'a, R: AppointmentRepository> AppointmentService<'a, R> {
    pub fn new(repo: &'a R) -> Self {
        Self { repo }
    }

    /// Book a new appointment for `owner_id`. Validation runs before any
    /// storage call; an invalid payload never reaches the repository.
    pub async fn book(&self, owner_id: &Uuid, request: &BookRequest) -> Result<Appointment, AppError> {
        request.validate()?;

        let appointment = self.repo.create_appointment(owner_id, request).await?;
        info!(appointment_id = %appointment.id, owner_id = %owner_id, "appointment booked");
        Ok(appointment)
    }

    /// The caller's own appointments, paginated locally over the full fetch.
    pub async fn list_for_owner(&self, owner_id: &Uuid, params: &PageParams) -> Result<PaginatedResponse<AppointmentResponse>, AppError> {
        let appointments = self.repo.list_appointments_for_owner(owner_id).await?;
        let responses: Vec<AppointmentResponse> = appointments.iter().map(AppointmentResponse::from).collect();
        Ok(PaginatedResponse::paginate(responses, params))
    }

    /// Every appointment regardless of owner (admin view), paginated locally.
    pub async fn list_all(&self, params: &PageParams) -> Result<PaginatedResponse<AppointmentResponse>, AppError> {
        let appointments = self.repo.list_all_appointments().await?;
        let responses: Vec<AppointmentResponse> = appointments.iter().map(AppointmentResponse::from).collect();
        Ok(PaginatedResponse::paginate(responses, params))
    }

    /// Fetch one appointment for `caller`. Owners see their own, admins see
    /// all; anyone else gets the same not-found as a missing row, so
    /// existence is not disclosed.
    pub async fn get_authorized(&self, caller_id: &Uuid, caller_role: Role, id: &Uuid) -> Result<Appointment, AppError> {
        let appointment = self
            .repo
            .get_appointment_by_id(id)
            .await?
            .ok_or_else(|| AppError::NotFound("Appointment not found".to_string()))?;

        if caller_role != Role::Admin && appointment.owner_id != *caller_id {
            return Err(AppError::NotFound("Appointment not found".to_string()));
        }

        Ok(appointment)
    }

    /// Apply a status-transition command. The lifecycle guard rejects any
    /// transition out of a terminal status; only a reschedule (target status
    /// `scheduled`) may change date/time, and a transition into a terminal
    /// status leaves them untouched even when the payload carries values.
    pub async fn update_status(&self, request: &UpdateStatusRequest) -> Result<Appointment, AppError> {
        let current = self
            .repo
            .get_appointment_by_id(&request.id)
            .await?
            .ok_or_else(|| AppError::NotFound("Appointment not found".to_string()))?;

        current.status.validate_transition(request.status)?;

        let updated = match request.status {
            AppointmentStatus::Scheduled => {
                let date = request.date.unwrap_or(current.date);
                let time = request.time.unwrap_or(current.time);
                self.repo.reschedule_appointment(&request.id, date, time).await?
            }
            status => self.repo.close_appointment(&request.id, status).await?,
        };

        match updated {
            Some(appointment) => {
                info!(appointment_id = %appointment.id, status = %appointment.status, "appointment status updated");
                Ok(appointment)
            }
            // The conditional update found no scheduled row: a concurrent
            // command won the race. Report the transition against the row's
            // current status.
            None => {
                let now = self
                    .repo
                    .get_appointment_by_id(&request.id)
                    .await?
                    .ok_or_else(|| AppError::NotFound("Appointment not found".to_string()))?;
                Err(TransitionError {
                    from: now.status,
                    to: request.status,
                }
                .into())
            }
        }
    }
}
