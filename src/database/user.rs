use crate::database::postgres_repository::PostgresRepository;
use crate::error::app_error::AppError;
use crate::models::user::{RegisterRequest, User};

#[async_trait::async_trait]
pub trait UserRepository {
    async fn create_user(&self, request: &RegisterRequest) -> Result<User, AppError>;
    async fn get_user_by_uid(&self, uid: &str) -> Result<Option<User>, AppError>;
    async fn get_user_by_email(&self, email: &str) -> Result<Option<User>, AppError>;
}

#[async_trait::async_trait]
impl UserRepository for PostgresRepository {
    async fn create_user(&self, request: &RegisterRequest) -> Result<User, AppError> {
        let user = sqlx::query_as::<_, User>(
            r#"
            INSERT INTO users (uid, name, email, phone_number)
            VALUES ($1, $2, $3, $4)
            RETURNING id, uid, name, email, phone_number, role, created_at
            "#,
        )
        .bind(&request.uid)
        .bind(&request.name)
        .bind(&request.email)
        .bind(&request.phone_number)
        .fetch_one(&self.pool)
        .await?;

        Ok(user)
    }

    async fn get_user_by_uid(&self, uid: &str) -> Result<Option<User>, AppError> {
        let user = sqlx::query_as::<_, User>(
            r#"
            SELECT id, uid, name, email, phone_number, role, created_at
            FROM users
            WHERE uid = $1
            "#,
        )
        .bind(uid)
        .fetch_optional(&self.pool)
        .await?;

        Ok(user)
    }

    async fn get_user_by_email(&self, email: &str) -> Result<Option<User>, AppError> {
        let user = sqlx::query_as::<_, User>(
            r#"
            SELECT id, uid, name, email, phone_number, role, created_at
            FROM users
            WHERE email = $1
            "#,
        )
        .bind(email)
        .fetch_optional(&self.pool)
        .await?;

        Ok(user)
    }
}
