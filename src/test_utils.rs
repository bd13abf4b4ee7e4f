use crate::database::appointment::AppointmentRepository;
use crate::database::session::SessionRepository;
use crate::database::user::UserRepository;
use crate::error::app_error::AppError;
use crate::models::appointment::{Appointment, AppointmentStatus, BookRequest};
use crate::models::session::{Session, SessionUser};
use crate::models::user::{RegisterRequest, Role, User};
use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use uuid::Uuid;

struct MockSession {
    user_id: Uuid,
    token_hash: String,
    expires_at: DateTime<Utc>,
}

/// In-memory repository for service-level tests.
#[derive(Default)]
pub struct MockRepository {
    users: Mutex<Vec<User>>,
    sessions: Mutex<Vec<MockSession>>,
    appointments: Mutex<Vec<Appointment>>,
    create_appointment_calls: AtomicUsize,
}

impl MockRepository {
    pub fn seed_user(&self, uid: &str, name: &str, email: &str, role: Role) -> User {
        let user = User {
            id: Uuid::new_v4(),
            uid: uid.to_string(),
            name: name.to_string(),
            email: email.to_string(),
            phone_number: "0123456789".to_string(),
            role,
            created_at: Utc::now(),
        };
        self.users.lock().expect("users lock").push(user.clone());
        user
    }

    pub fn seed_appointment(&self, owner_id: &Uuid, date: NaiveDate, time: NaiveTime, purpose: &str, status: AppointmentStatus) -> Appointment {
        let owner_name = self
            .users
            .lock()
            .expect("users lock")
            .iter()
            .find(|u| u.id == *owner_id)
            .map(|u| u.name.clone())
            .unwrap_or_else(|| "Test User".to_string());
        let appointment = Appointment {
            id: Uuid::new_v4(),
            owner_id: *owner_id,
            owner_name,
            date,
            time,
            purpose: purpose.to_string(),
            status,
            created_at: Utc::now(),
        };
        self.appointments.lock().expect("appointments lock").push(appointment.clone());
        appointment
    }

    pub fn session_count(&self) -> usize {
        self.sessions.lock().expect("sessions lock").len()
    }

    pub fn appointment_create_calls(&self) -> usize {
        self.create_appointment_calls.load(Ordering::SeqCst)
    }
}

#[async_trait::async_trait]
impl UserRepository for MockRepository {
    async fn create_user(&self, request: &RegisterRequest) -> Result<User, AppError> {
        let user = User {
            id: Uuid::new_v4(),
            uid: request.uid.clone(),
            name: request.name.clone(),
            email: request.email.clone(),
            phone_number: request.phone_number.clone(),
            role: Role::Customer,
            created_at: Utc::now(),
        };
        self.users.lock().expect("users lock").push(user.clone());
        Ok(user)
    }

    async fn get_user_by_uid(&self, uid: &str) -> Result<Option<User>, AppError> {
        Ok(self.users.lock().expect("users lock").iter().find(|u| u.uid == uid).cloned())
    }

    async fn get_user_by_email(&self, email: &str) -> Result<Option<User>, AppError> {
        Ok(self.users.lock().expect("users lock").iter().find(|u| u.email == email).cloned())
    }
}

#[async_trait::async_trait]
impl SessionRepository for MockRepository {
    async fn create_session(
        &self,
        user_id: &Uuid,
        token_hash: &str,
        expires_at: DateTime<Utc>,
        _user_agent: Option<&str>,
    ) -> Result<Session, AppError> {
        self.delete_expired_sessions_for_user(user_id).await?;
        self.sessions.lock().expect("sessions lock").push(MockSession {
            user_id: *user_id,
            token_hash: token_hash.to_string(),
            expires_at,
        });
        Ok(Session { id: Uuid::new_v4() })
    }

    async fn get_active_session_user(&self, token_hash: &str) -> Result<Option<SessionUser>, AppError> {
        let sessions = self.sessions.lock().expect("sessions lock");
        let session = sessions.iter().find(|s| s.token_hash == token_hash && s.expires_at > Utc::now());
        let Some(session) = session else {
            return Ok(None);
        };
        Ok(self
            .users
            .lock()
            .expect("users lock")
            .iter()
            .find(|u| u.id == session.user_id)
            .map(|u| SessionUser {
                id: u.id,
                name: u.name.clone(),
                email: u.email.clone(),
                role: u.role,
            }))
    }

    async fn delete_session_by_token_hash(&self, token_hash: &str) -> Result<(), AppError> {
        self.sessions.lock().expect("sessions lock").retain(|s| s.token_hash != token_hash);
        Ok(())
    }

    async fn delete_session_if_expired(&self, token_hash: &str) -> Result<(), AppError> {
        self.sessions
            .lock()
            .expect("sessions lock")
            .retain(|s| s.token_hash != token_hash || s.expires_at > Utc::now());
        Ok(())
    }

    async fn delete_expired_sessions_for_user(&self, user_id: &Uuid) -> Result<(), AppError> {
        self.sessions
            .lock()
            .expect("sessions lock")
            .retain(|s| s.user_id != *user_id || s.expires_at > Utc::now());
        Ok(())
    }
}

#[async_trait::async_trait]
impl AppointmentRepository for MockRepository {
    async fn create_appointment(&self, owner_id: &Uuid, request: &BookRequest) -> Result<Appointment, AppError> {
        self.create_appointment_calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.seed_appointment(owner_id, request.date, request.time, &request.purpose, AppointmentStatus::Scheduled))
    }

    async fn list_appointments_for_owner(&self, owner_id: &Uuid) -> Result<Vec<Appointment>, AppError> {
        Ok(self
            .appointments
            .lock()
            .expect("appointments lock")
            .iter()
            .filter(|a| a.owner_id == *owner_id)
            .cloned()
            .collect())
    }

    async fn list_all_appointments(&self) -> Result<Vec<Appointment>, AppError> {
        Ok(self.appointments.lock().expect("appointments lock").clone())
    }

    async fn get_appointment_by_id(&self, id: &Uuid) -> Result<Option<Appointment>, AppError> {
        Ok(self.appointments.lock().expect("appointments lock").iter().find(|a| a.id == *id).cloned())
    }

    async fn reschedule_appointment(&self, id: &Uuid, date: NaiveDate, time: NaiveTime) -> Result<Option<Appointment>, AppError> {
        let mut appointments = self.appointments.lock().expect("appointments lock");
        match appointments.iter_mut().find(|a| a.id == *id && a.status == AppointmentStatus::Scheduled) {
            Some(appointment) => {
                appointment.date = date;
                appointment.time = time;
                Ok(Some(appointment.clone()))
            }
            None => Ok(None),
        }
    }

    async fn close_appointment(&self, id: &Uuid, status: AppointmentStatus) -> Result<Option<Appointment>, AppError> {
        let mut appointments = self.appointments.lock().expect("appointments lock");
        match appointments.iter_mut().find(|a| a.id == *id && a.status == AppointmentStatus::Scheduled) {
            Some(appointment) => {
                appointment.status = status;
                Ok(Some(appointment.clone()))
            }
            None => Ok(None),
        }
    }
}
