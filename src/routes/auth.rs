use crate::{
    auth::{
        generate_token, hash_password, verify_password, AuthResponse, AuthenticatedUserId,
        LoginRateLimiter, LoginRequest, RegisterRequest,
    },
    error::AppError,
    models::User,
    repo,
};
use actix_web::{get, post, web, HttpResponse, Responder};
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use validator::Validate;

/// Register a new user
///
/// Creates a new user account (role `member`) and returns an authentication token.
#[post("/register")]
pub async fn register(
    pool: web::Data<PgPool>,
    register_data: web::Json<RegisterRequest>,
) -> Result<impl Responder, AppError> {
    // Validate input
    register_data.validate()?;

    // Check if email already exists
    let existing: Option<(i32,)> = sqlx::query_as("SELECT id FROM users WHERE email = $1")
        .bind(&register_data.email)
        .fetch_optional(&**pool)
        .await?;

    if existing.is_some() {
        return Err(AppError::Conflict("Email already registered".into()));
    }

    // Hash password
    let password_hash = hash_password(&register_data.password)?;

    // Insert new user
    let user = sqlx::query_as::<_, User>(
        "INSERT INTO users (username, email, password_hash) VALUES ($1, $2, $3)
         RETURNING id, username, email, role, created_at",
    )
    .bind(&register_data.username)
    .bind(&register_data.email)
    .bind(&password_hash)
    .fetch_one(&**pool)
    .await?;

    // Generate token
    let token = generate_token(user.id)?;

    Ok(HttpResponse::Created().json(AuthResponse { token, user }))
}

/// Login user
///
/// Authenticates a user and returns an authentication token. The login rate
/// limiter runs before the credential check, so a drained bucket rejects the
/// attempt whether or not the password is correct.
#[post("/login")]
pub async fn login(
    pool: web::Data<PgPool>,
    limiter: web::Data<LoginRateLimiter>,
    login_data: web::Json<LoginRequest>,
) -> Result<impl Responder, AppError> {
    // Validate input
    login_data.validate()?;

    limiter.check(&login_data.email)?;

    // Get user from database
    type UserRow = (
        i32,
        String,
        String,
        crate::models::UserRole,
        DateTime<Utc>,
        String,
    );
    let row: Option<UserRow> = sqlx::query_as(
        "SELECT id, username, email, role, created_at, password_hash
         FROM users WHERE email = $1",
    )
    .bind(&login_data.email)
    .fetch_optional(&**pool)
    .await?;

    match row {
        Some((id, username, email, role, created_at, password_hash)) => {
            // Verify password
            if verify_password(&login_data.password, &password_hash)? {
                let token = generate_token(id)?;
                Ok(HttpResponse::Ok().json(AuthResponse {
                    token,
                    user: User {
                        id,
                        username,
                        email,
                        role,
                        created_at,
                    },
                }))
            } else {
                Err(AppError::Unauthorized("Invalid credentials".into()))
            }
        }
        None => Err(AppError::Unauthorized("Invalid credentials".into())),
    }
}

/// Returns the authenticated user's own record.
#[get("/me")]
pub async fn me(
    pool: web::Data<PgPool>,
    user_id: AuthenticatedUserId,
) -> Result<impl Responder, AppError> {
    let user = repo::users::find_by_id(&pool, user_id.0).await?;
    Ok(HttpResponse::Ok().json(serde_json::json!({ "user": user })))
}
