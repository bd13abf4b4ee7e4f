use crate::authz::{self, AccessDecision};
use crate::database::postgres_repository::PostgresRepository;
use crate::database::session::SessionRepository;
use crate::error::app_error::AppError;
use crate::models::user::Role;
use rocket::http::Status;
use rocket::outcome::Outcome;
use rocket::request::{FromRequest, Outcome as RequestOutcome, Request};
use rocket_okapi::okapi::openapi3::{Object, Responses, SecurityRequirement, SecurityScheme, SecuritySchemeData};
use rocket_okapi::r#gen::OpenApiGenerator;
use rocket_okapi::request::{OpenApiFromRequest, RequestHeaderInput};
use serde::Serialize;
use sha2::{Digest, Sha256};
use sqlx::PgPool;
use uuid::Uuid;

/// The profile behind the bearer token of the current request.
#[derive(Debug, Clone, Serialize)]
pub struct CurrentUser {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub role: Role,
}

pub(crate) fn parse_bearer_token(header: &str) -> Option<&str> {
    let token = header.strip_prefix("Bearer ")?.trim();
    if token.is_empty() { None } else { Some(token) }
}

/// Only the SHA-256 of a token is ever stored or compared.
pub(crate) fn hash_token(token: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(token.as_bytes());
    hex::encode(hasher.finalize())
}

pub(crate) fn bearer_token_from_request<'r>(req: &'r Request<'_>) -> Option<&'r str> {
    req.headers().get_one("Authorization").and_then(parse_bearer_token)
}

#[rocket::async_trait]
impl<'r> FromRequest<'r> for CurrentUser {
    type Error = AppError;

    async fn from_request(req: &'r Request<'_>) -> RequestOutcome<Self, Self::Error> {
        if let Some(token) = bearer_token_from_request(req) {
            let pool = match req.rocket().state::<PgPool>() {
                Some(pool) => pool,
                None => return Outcome::Error((Status::InternalServerError, AppError::Unauthorized)),
            };

            let repo = PostgresRepository { pool: pool.clone() };
            let token_hash = hash_token(token);

            match repo.get_active_session_user(&token_hash).await {
                Ok(Some(user)) => {
                    let current_user = CurrentUser {
                        id: user.id,
                        name: user.name,
                        email: user.email,
                        role: user.role,
                    };
                    req.local_cache(|| Some(current_user.clone()));
                    return Outcome::Success(current_user);
                }
                Ok(None) => {
                    let _ = repo.delete_session_if_expired(&token_hash).await;
                    return Outcome::Error((Status::Unauthorized, AppError::InvalidCredentials));
                }
                Err(err) => return Outcome::Error((Status::InternalServerError, err)),
            }
        }

        Outcome::Error((Status::Unauthorized, AppError::InvalidCredentials))
    }
}

async fn role_guard<'r>(req: &'r Request<'_>, required: Role) -> RequestOutcome<CurrentUser, AppError> {
    match CurrentUser::from_request(req).await {
        Outcome::Success(user) => match authz::check_role(user.role, required) {
            AccessDecision::Allow => Outcome::Success(user),
            _ => Outcome::Error((Status::Forbidden, AppError::Forbidden(format!("{} role required", required)))),
        },
        Outcome::Error(err) => Outcome::Error(err),
        Outcome::Forward(status) => Outcome::Forward(status),
    }
}

/// Session with the customer role.
#[derive(Debug, Clone)]
pub struct CustomerUser(pub CurrentUser);

#[rocket::async_trait]
impl<'r> FromRequest<'r> for CustomerUser {
    type Error = AppError;

    async fn from_request(req: &'r Request<'_>) -> RequestOutcome<Self, Self::Error> {
        role_guard(req, Role::Customer).await.map(CustomerUser)
    }
}

/// Session with the admin role.
#[derive(Debug, Clone)]
pub struct AdminUser(pub CurrentUser);

#[rocket::async_trait]
impl<'r> FromRequest<'r> for AdminUser {
    type Error = AppError;

    async fn from_request(req: &'r Request<'_>) -> RequestOutcome<Self, Self::Error> {
        role_guard(req, Role::Admin).await.map(AdminUser)
    }
}

/// The raw bearer token, when one was sent. Logout accepts requests without
/// one and still succeeds.
#[derive(Debug, Clone)]
pub struct BearerToken(pub Option<String>);

#[rocket::async_trait]
impl<'r> FromRequest<'r> for BearerToken {
    type Error = ();

    async fn from_request(req: &'r Request<'_>) -> RequestOutcome<Self, Self::Error> {
        Outcome::Success(BearerToken(bearer_token_from_request(req).map(str::to_string)))
    }
}

fn bearer_security_scheme() -> (SecurityScheme, SecurityRequirement) {
    let security_scheme = SecurityScheme {
        description: Some("Bearer-token authentication. Exchange a provider identity via POST /api/auth/login to obtain the token.".to_string()),
        data: SecuritySchemeData::Http {
            scheme: "bearer".to_string(),
            bearer_format: None,
        },
        extensions: Object::default(),
    };

    let mut security_req = SecurityRequirement::new();
    security_req.insert("bearerAuth".to_string(), Vec::new());

    (security_scheme, security_req)
}

fn auth_responses(include_forbidden: bool) -> Responses {
    use rocket_okapi::okapi::openapi3::{RefOr, Response};
    let mut responses = Responses::default();
    responses.responses.insert(
        "401".to_string(),
        RefOr::Object(Response {
            description: "Unauthorized - Authentication required".to_string(),
            ..Default::default()
        }),
    );
    if include_forbidden {
        responses.responses.insert(
            "403".to_string(),
            RefOr::Object(Response {
                description: "Forbidden - Wrong role for this route".to_string(),
                ..Default::default()
            }),
        );
    }
    responses
}

impl<'a> OpenApiFromRequest<'a> for CurrentUser {
    fn from_request_input(_gen: &mut OpenApiGenerator, _name: String, _required: bool) -> rocket_okapi::Result<RequestHeaderInput> {
        let (security_scheme, security_req) = bearer_security_scheme();
        Ok(RequestHeaderInput::Security("bearerAuth".to_string(), security_scheme, security_req))
    }

    fn get_responses(_gen: &mut OpenApiGenerator) -> rocket_okapi::Result<Responses> {
        Ok(auth_responses(false))
    }
}

impl<'a> OpenApiFromRequest<'a> for CustomerUser {
    fn from_request_input(_gen: &mut OpenApiGenerator, _name: String, _required: bool) -> rocket_okapi::Result<RequestHeaderInput> {
        let (security_scheme, security_req) = bearer_security_scheme();
        Ok(RequestHeaderInput::Security("bearerAuth".to_string(), security_scheme, security_req))
    }

    fn get_responses(_gen: &mut OpenApiGenerator) -> rocket_okapi::Result<Responses> {
        Ok(auth_responses(true))
    }
}

impl<'a> OpenApiFromRequest<'a> for AdminUser {
    fn from_request_input(_gen: &mut OpenApiGenerator, _name: String, _required: bool) -> rocket_okapi::Result<RequestHeaderInput> {
        let (security_scheme, security_req) = bearer_security_scheme();
        Ok(RequestHeaderInput::Security("bearerAuth".to_string(), security_scheme, security_req))
    }

    fn get_responses(_gen: &mut OpenApiGenerator) -> rocket_okapi::Result<Responses> {
        Ok(auth_responses(true))
    }
}

impl<'a> OpenApiFromRequest<'a> for BearerToken {
    fn from_request_input(_gen: &mut OpenApiGenerator, _name: String, _required: bool) -> rocket_okapi::Result<RequestHeaderInput> {
        Ok(RequestHeaderInput::None)
    }
}
