use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use rocket::serde::{Deserialize, Serialize};
use schemars::JsonSchema;
use thiserror::Error;
use uuid::Uuid;
use validator::Validate;

#[derive(Serialize, Deserialize, Debug, Copy, Clone, Eq, PartialEq, Default, JsonSchema, sqlx::Type)]
#[serde(rename_all = "lowercase")]
#[sqlx(type_name = "appointment_status", rename_all = "lowercase")]
pub enum AppointmentStatus {
    #[default]
    Scheduled,
    Completed,
    Canceled,
}

/// A transition out of a terminal status, rejected by the lifecycle guard.
#[derive(Debug, Error, Copy, Clone, PartialEq, Eq)]
#[error("appointment is {from}, cannot become {to}")]
pub struct TransitionError {
    pub from: AppointmentStatus,
    pub to: AppointmentStatus,
}

impl AppointmentStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            AppointmentStatus::Scheduled => "scheduled",
            AppointmentStatus::Completed => "completed",
            AppointmentStatus::Canceled => "canceled",
        }
    }

    /// Completed and canceled appointments admit no further transition.
    pub fn is_terminal(self) -> bool {
        !matches!(self, AppointmentStatus::Scheduled)
    }

    /// The lifecycle guard. Scheduled may move to any status, including
    /// scheduled itself (a reschedule); terminal statuses reject everything.
    /// Callers must not be trusted to pre-check: a stale view can still issue
    /// a transition out of a terminal state.
    pub fn validate_transition(self, to: AppointmentStatus) -> Result<(), TransitionError> {
        if self.is_terminal() {
            Err(TransitionError { from: self, to })
        } else {
            Ok(())
        }
    }
}

impl std::fmt::Display for AppointmentStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Appointment with the owner's display name joined in, since every read
/// surface (dashboards, pass) presents the owner by name.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct Appointment {
    pub id: Uuid,
    pub owner_id: Uuid,
    pub owner_name: String,
    pub date: NaiveDate,
    pub time: NaiveTime,
    pub purpose: String,
    pub status: AppointmentStatus,
    pub created_at: DateTime<Utc>,
}

#[derive(Deserialize, Debug, Validate, JsonSchema)]
pub struct BookRequest {
    pub date: NaiveDate,
    pub time: NaiveTime,
    #[validate(length(min = 5, message = "Purpose must be at least 5 characters"))]
    pub purpose: String,
}

/// Admin status-transition command. `date`/`time` only take effect on a
/// reschedule (target status `scheduled`); transitions into a terminal status
/// leave them untouched even when supplied.
#[derive(Deserialize, Debug, JsonSchema)]
pub struct UpdateStatusRequest {
    pub id: Uuid,
    pub date: Option<NaiveDate>,
    pub time: Option<NaiveTime>,
    pub status: AppointmentStatus,
}

#[derive(Serialize, Debug, JsonSchema)]
pub struct AppointmentResponse {
    pub id: Uuid,
    pub name: String,
    pub date: NaiveDate,
    pub time: NaiveTime,
    pub purpose: String,
    pub status: AppointmentStatus,
}

impl From<&Appointment> for AppointmentResponse {
    fn from(appointment: &Appointment) -> Self {
        Self {
            id: appointment.id,
            name: appointment.owner_name.clone(),
            date: appointment.date,
            time: appointment.time,
            purpose: appointment.purpose.clone(),
            status: appointment.status,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn scheduled_may_transition_anywhere() {
        let from = AppointmentStatus::Scheduled;
        assert!(from.validate_transition(AppointmentStatus::Scheduled).is_ok());
        assert!(from.validate_transition(AppointmentStatus::Completed).is_ok());
        assert!(from.validate_transition(AppointmentStatus::Canceled).is_ok());
    }

    #[test]
    fn terminal_statuses_are_terminal() {
        assert!(!AppointmentStatus::Scheduled.is_terminal());
        assert!(AppointmentStatus::Completed.is_terminal());
        assert!(AppointmentStatus::Canceled.is_terminal());
    }

    fn any_status() -> impl Strategy<Value = AppointmentStatus> {
        prop_oneof![
            Just(AppointmentStatus::Scheduled),
            Just(AppointmentStatus::Completed),
            Just(AppointmentStatus::Canceled),
        ]
    }

    proptest! {
        #[test]
        fn terminal_rejects_every_transition(to in any_status()) {
            for from in [AppointmentStatus::Completed, AppointmentStatus::Canceled] {
                let err = from.validate_transition(to).unwrap_err();
                prop_assert_eq!(err, TransitionError { from, to });
            }
        }
    }

    #[test]
    fn book_request_rejects_short_purpose() {
        let request = BookRequest {
            date: NaiveDate::from_ymd_opt(2025, 6, 1).unwrap(),
            time: NaiveTime::from_hms_opt(10, 30, 0).unwrap(),
            purpose: "hi".to_string(),
        };
        assert!(validator::Validate::validate(&request).is_err());
    }

    #[test]
    fn book_request_accepts_five_character_purpose() {
        let request = BookRequest {
            date: NaiveDate::from_ymd_opt(2025, 6, 1).unwrap(),
            time: NaiveTime::from_hms_opt(10, 30, 0).unwrap(),
            purpose: "check".to_string(),
        };
        assert!(validator::Validate::validate(&request).is_ok());
    }
}
