use std::sync::Arc;

use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use axum::{
    async_trait,
    extract::{FromRequestParts, Request, State},
    http::request::Parts,
    middleware::{self, Next},
    response::Response,
    routing::{get, post},
    Json, Router,
};
use chrono::{Duration as ChronoDuration, Utc};
use http::{header, HeaderMap, StatusCode};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use sea_orm::{ActiveModelTrait, ColumnTrait, EntityTrait, QueryFilter, Set};
use serde::{Deserialize, Serialize};
use tracing::{info, instrument};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::{
    config::AppConfig,
    db::DbPool,
    entities::user::{self, UserRole},
    errors::ServiceError,
    handlers::users::UserProfile,
    ApiResponse, AppState,
};

/// JWT claim set issued on register/login.
#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    /// User id
    pub sub: String,
    pub name: String,
    pub email: String,
    pub role: String,
    /// Unique token id
    pub jti: String,
    pub iat: i64,
    pub exp: i64,
    pub iss: String,
    pub aud: String,
}

/// Authenticated caller, decoded from the bearer token by the auth
/// middleware and read by handlers through the extractor impl below.
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub user_id: Uuid,
    pub name: String,
    pub email: String,
    pub role: UserRole,
}

impl AuthUser {
    pub fn has_role(&self, role: UserRole) -> bool {
        self.role == role
    }

    pub fn is_admin(&self) -> bool {
        self.role == UserRole::Admin
    }
}

#[async_trait]
impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
{
    type Rejection = ServiceError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<AuthUser>()
            .cloned()
            .ok_or_else(|| ServiceError::Unauthorized("authentication required".to_string()))
    }
}

#[derive(Clone, Debug)]
pub struct AuthConfig {
    pub jwt_secret: String,
    pub jwt_issuer: String,
    pub jwt_audience: String,
    pub token_ttl: ChronoDuration,
}

impl AuthConfig {
    pub fn from_app_config(config: &AppConfig) -> Self {
        Self {
            jwt_secret: config.jwt_secret.clone(),
            jwt_issuer: config.jwt_issuer.clone(),
            jwt_audience: config.jwt_audience.clone(),
            token_ttl: ChronoDuration::seconds(config.jwt_expiration as i64),
        }
    }
}

/// Issues and validates tokens, and owns the register/login flows.
#[derive(Debug, Clone)]
pub struct AuthService {
    config: AuthConfig,
    db: Arc<DbPool>,
}

impl AuthService {
    pub fn new(config: AuthConfig, db: Arc<DbPool>) -> Self {
        Self { config, db }
    }

    /// Create an account and return a signed token for it.
    ///
    /// Fails with `Conflict` when the email is already registered.
    #[instrument(skip(self, request), fields(email = %request.email))]
    pub async fn register(&self, request: RegisterRequest) -> Result<AuthResponse, ServiceError> {
        let existing = user::Entity::find()
            .filter(user::Column::Email.eq(request.email.clone()))
            .one(self.db.as_ref())
            .await?;
        if existing.is_some() {
            return Err(ServiceError::Conflict(format!(
                "email {} is already registered",
                request.email
            )));
        }

        let now = Utc::now();
        let model = user::ActiveModel {
            id: Set(Uuid::new_v4()),
            name: Set(request.name),
            email: Set(request.email),
            password_hash: Set(self.hash_password(&request.password)?),
            phone: Set(request.phone),
            address: Set(request.address),
            role: Set(UserRole::Customer),
            created_at: Set(now),
            updated_at: Set(now),
        };
        let saved = model.insert(self.db.as_ref()).await?;

        info!(user_id = %saved.id, "user registered");
        let token = self.generate_token(&saved)?;
        Ok(AuthResponse {
            token,
            user: UserProfile::from(saved),
        })
    }

    /// Verify credentials and return a fresh token.
    ///
    /// A wrong email and a wrong password produce the same error so the
    /// endpoint cannot be used to probe which addresses have accounts.
    #[instrument(skip(self, request), fields(email = %request.email))]
    pub async fn login(&self, request: LoginRequest) -> Result<AuthResponse, ServiceError> {
        let user = user::Entity::find()
            .filter(user::Column::Email.eq(request.email.clone()))
            .one(self.db.as_ref())
            .await?
            .ok_or_else(|| ServiceError::Unauthorized("invalid credentials".to_string()))?;

        if !self.verify_password(&request.password, &user.password_hash)? {
            return Err(ServiceError::Unauthorized("invalid credentials".to_string()));
        }

        info!(user_id = %user.id, "user logged in");
        let token = self.generate_token(&user)?;
        Ok(AuthResponse {
            token,
            user: UserProfile::from(user),
        })
    }

    pub async fn load_user(&self, auth: &AuthUser) -> Result<user::Model, ServiceError> {
        user::Entity::find_by_id(auth.user_id)
            .one(self.db.as_ref())
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("user {}", auth.user_id)))
    }

    pub fn generate_token(&self, user: &user::Model) -> Result<String, ServiceError> {
        let now = Utc::now();
        let claims = Claims {
            sub: user.id.to_string(),
            name: user.name.clone(),
            email: user.email.clone(),
            role: user.role.to_string(),
            jti: Uuid::new_v4().to_string(),
            iat: now.timestamp(),
            exp: (now + self.config.token_ttl).timestamp(),
            iss: self.config.jwt_issuer.clone(),
            aud: self.config.jwt_audience.clone(),
        };

        encode(
            &Header::new(Algorithm::HS256),
            &claims,
            &EncodingKey::from_secret(self.config.jwt_secret.as_bytes()),
        )
        .map_err(|e| ServiceError::JwtError(format!("token encoding failed: {e}")))
    }

    pub fn validate_token(&self, token: &str) -> Result<AuthUser, ServiceError> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.set_issuer(&[self.config.jwt_issuer.as_str()]);
        validation.set_audience(&[self.config.jwt_audience.as_str()]);

        let data = decode::<Claims>(
            token,
            &DecodingKey::from_secret(self.config.jwt_secret.as_bytes()),
            &validation,
        )
        .map_err(|_| ServiceError::Unauthorized("invalid or expired token".to_string()))?;

        let user_id = data
            .claims
            .sub
            .parse::<Uuid>()
            .map_err(|_| ServiceError::Unauthorized("malformed token subject".to_string()))?;
        let role = data
            .claims
            .role
            .parse::<UserRole>()
            .map_err(|_| ServiceError::Unauthorized("unknown role in token".to_string()))?;

        Ok(AuthUser {
            user_id,
            name: data.claims.name,
            email: data.claims.email,
            role,
        })
    }

    pub fn hash_password(&self, password: &str) -> Result<String, ServiceError> {
        let salt = SaltString::generate(&mut OsRng);
        Argon2::default()
            .hash_password(password.as_bytes(), &salt)
            .map(|hash| hash.to_string())
            .map_err(|e| ServiceError::HashError(e.to_string()))
    }

    pub fn verify_password(&self, password: &str, hash: &str) -> Result<bool, ServiceError> {
        let parsed = PasswordHash::new(hash).map_err(|e| ServiceError::HashError(e.to_string()))?;
        Ok(Argon2::default()
            .verify_password(password.as_bytes(), &parsed)
            .is_ok())
    }
}

/// Requires a valid bearer token and stashes the decoded [`AuthUser`] in the
/// request extensions for handlers to extract.
pub async fn auth_middleware(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, ServiceError> {
    let user = authenticate_request(request.headers(), &state.auth)?;
    request.extensions_mut().insert(user);
    Ok(next.run(request).await)
}

fn authenticate_request(headers: &HeaderMap, auth: &AuthService) -> Result<AuthUser, ServiceError> {
    let header_value = headers
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .ok_or_else(|| ServiceError::Unauthorized("missing authorization header".to_string()))?;

    let token = header_value
        .strip_prefix("Bearer ")
        .ok_or_else(|| ServiceError::Unauthorized("expected a Bearer token".to_string()))?;

    auth.validate_token(token)
}

/// Router sugar for guarding route groups with the auth middleware.
pub trait AuthRouterExt {
    fn with_auth(self, state: AppState) -> Self;
}

impl AuthRouterExt for Router<AppState> {
    fn with_auth(self, state: AppState) -> Self {
        self.route_layer(middleware::from_fn_with_state(state, auth_middleware))
    }
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct RegisterRequest {
    #[validate(length(min = 1, max = 100))]
    pub name: String,
    #[validate(email)]
    pub email: String,
    #[validate(length(min = 6, max = 128))]
    pub password: String,
    #[validate(custom = "crate::handlers::validate_phone")]
    pub phone: Option<String>,
    #[validate(length(max = 300))]
    pub address: Option<String>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct LoginRequest {
    #[validate(email)]
    pub email: String,
    #[validate(length(min = 1))]
    pub password: String,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct AuthResponse {
    pub token: String,
    pub user: UserProfile,
}

#[utoipa::path(
    post,
    path = "/api/v1/auth/register",
    request_body = RegisterRequest,
    responses(
        (status = 201, description = "Account created", body = AuthResponse),
        (status = 409, description = "Email already registered"),
        (status = 400, description = "Invalid request body")
    ),
    tag = "auth"
)]
pub async fn register(
    State(state): State<AppState>,
    Json(payload): Json<RegisterRequest>,
) -> Result<(StatusCode, Json<ApiResponse<AuthResponse>>), ServiceError> {
    payload.validate()?;
    let response = state.auth.register(payload).await?;
    Ok((StatusCode::CREATED, Json(ApiResponse::success(response))))
}

#[utoipa::path(
    post,
    path = "/api/v1/auth/login",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Authenticated", body = AuthResponse),
        (status = 401, description = "Invalid credentials")
    ),
    tag = "auth"
)]
pub async fn login(
    State(state): State<AppState>,
    Json(payload): Json<LoginRequest>,
) -> Result<Json<ApiResponse<AuthResponse>>, ServiceError> {
    payload.validate()?;
    let response = state.auth.login(payload).await?;
    Ok(Json(ApiResponse::success(response)))
}

#[utoipa::path(
    get,
    path = "/api/v1/auth/me",
    responses(
        (status = 200, description = "Current account", body = UserProfile),
        (status = 401, description = "Missing or invalid token")
    ),
    tag = "auth",
    security(("bearer_auth" = []))
)]
pub async fn me(
    State(state): State<AppState>,
    auth_user: AuthUser,
) -> Result<Json<ApiResponse<UserProfile>>, ServiceError> {
    let user = state.auth.load_user(&auth_user).await?;
    Ok(Json(ApiResponse::success(UserProfile::from(user))))
}

pub fn auth_routes(state: AppState) -> Router<AppState> {
    let protected = Router::new().route("/me", get(me)).with_auth(state);

    Router::new()
        .route("/register", post(register))
        .route("/login", post(login))
        .merge(protected)
}

#[cfg(test)]
mod tests {
    use super::*;
    use sea_orm::DatabaseConnection;

    fn test_service() -> AuthService {
        let config = AuthConfig {
            jwt_secret: "0123456789abcdef0123456789abcdef-test".to_string(),
            jwt_issuer: "quickbite-api".to_string(),
            jwt_audience: "quickbite-clients".to_string(),
            token_ttl: ChronoDuration::hours(1),
        };
        AuthService::new(config, Arc::new(DatabaseConnection::Disconnected))
    }

    fn sample_user() -> user::Model {
        let now = Utc::now();
        user::Model {
            id: Uuid::new_v4(),
            name: "Asha Patel".to_string(),
            email: "asha@example.com".to_string(),
            password_hash: String::new(),
            phone: None,
            address: None,
            role: UserRole::RestaurantOwner,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn token_round_trip_preserves_identity() {
        let service = test_service();
        let user = sample_user();

        let token = service.generate_token(&user).unwrap();
        let decoded = service.validate_token(&token).unwrap();

        assert_eq!(decoded.user_id, user.id);
        assert_eq!(decoded.email, user.email);
        assert_eq!(decoded.role, UserRole::RestaurantOwner);
        assert!(!decoded.is_admin());
    }

    #[test]
    fn expired_token_is_rejected() {
        let mut service = test_service();
        service.config.token_ttl = ChronoDuration::seconds(-120);
        let token = service.generate_token(&sample_user()).unwrap();

        assert!(matches!(
            service.validate_token(&token),
            Err(ServiceError::Unauthorized(_))
        ));
    }

    #[test]
    fn token_signed_with_other_secret_is_rejected() {
        let service = test_service();
        let token = service.generate_token(&sample_user()).unwrap();

        let mut other = test_service();
        other.config.jwt_secret = "another-secret-another-secret-another".to_string();
        assert!(other.validate_token(&token).is_err());
    }

    #[test]
    fn password_hash_verifies_and_rejects() {
        let service = test_service();
        let hash = service.hash_password("hunter2hunter2").unwrap();

        assert!(service.verify_password("hunter2hunter2", &hash).unwrap());
        assert!(!service.verify_password("wrong-password", &hash).unwrap());
        assert_ne!(hash, "hunter2hunter2");
    }

    #[test]
    fn garbage_token_is_rejected() {
        let service = test_service();
        assert!(service.validate_token("not-a-jwt").is_err());
    }
}
