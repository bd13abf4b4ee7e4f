use chrono::{DateTime, Utc};
use regex::Regex;
use rocket::serde::{Deserialize, Serialize};
use schemars::JsonSchema;
use std::sync::LazyLock;
use uuid::Uuid;
use validator::{Validate, ValidationError};

#[derive(Serialize, Deserialize, Debug, Copy, Clone, Eq, PartialEq, Hash, Default, JsonSchema, sqlx::Type)]
#[serde(rename_all = "lowercase")]
#[sqlx(type_name = "user_role", rename_all = "lowercase")]
pub enum Role {
    #[default]
    Customer,
    Admin,
}

impl Role {
    pub fn as_str(self) -> &'static str {
        match self {
            Role::Customer => "customer",
            Role::Admin => "admin",
        }
    }

    /// Dashboard path the role lands on after login.
    pub fn home_path(self) -> &'static str {
        match self {
            Role::Customer => "/customer",
            Role::Admin => "/admin",
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct User {
    pub id: Uuid,
    pub uid: String,
    pub name: String,
    pub email: String,
    pub phone_number: String,
    pub role: Role,
    pub created_at: DateTime<Utc>,
}

static PHONE_NUMBER_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^[0-9]{10}$").expect("valid phone number regex"));

fn validate_phone_number(value: &str) -> Result<(), ValidationError> {
    if PHONE_NUMBER_RE.is_match(value) {
        Ok(())
    } else {
        Err(ValidationError::new("phone_number_must_be_10_digits"))
    }
}

/// Registration payload. The caller has already created the identity with the
/// external provider; `uid` is the provider's stable external id.
#[derive(Deserialize, Debug, Validate, JsonSchema)]
pub struct RegisterRequest {
    #[validate(length(min = 1))]
    pub uid: String,
    #[validate(length(min = 3))]
    pub name: String,
    #[validate(email)]
    pub email: String,
    #[validate(custom(function = "validate_phone_number"))]
    pub phone_number: String,
}

/// Identity-exchange payload: the provider identity the client signed in with.
#[derive(Deserialize, Debug, Validate, JsonSchema)]
pub struct LoginRequest {
    #[validate(length(min = 1))]
    pub uid: String,
    #[validate(email)]
    pub email: String,
}

#[derive(Serialize, Debug, JsonSchema)]
pub struct RegisteredResponse {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub role: Role,
}

impl From<&User> for RegisteredResponse {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            name: user.name.clone(),
            email: user.email.clone(),
            role: user.role,
        }
    }
}

/// Profile returned by the identity exchange, with the bearer token the
/// client authenticates subsequent calls with.
#[derive(Serialize, Debug, JsonSchema)]
pub struct SessionUserResponse {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub role: Role,
    pub token: String,
}

#[derive(Serialize, Debug, JsonSchema)]
pub struct LoginResponse {
    pub user: SessionUserResponse,
}
