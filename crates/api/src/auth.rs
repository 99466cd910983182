use argon2::password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString};
use argon2::Argon2;
use chrono::{Duration, Utc};
use entity::user;
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation};
use rand::rngs::OsRng;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub const SESSION_COOKIE: &str = "hr_session";

#[derive(Clone, Debug)]
pub struct AuthConfig {
    pub jwt_secret: String,
    pub local_auth_enabled: bool,
    pub session_ttl_minutes: i64,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            jwt_secret: "dev-secret".into(),
            local_auth_enabled: true,
            session_ttl_minutes: 60,
        }
    }
}

impl AuthConfig {
    pub fn encoding_key(&self) -> EncodingKey {
        EncodingKey::from_secret(self.jwt_secret.as_bytes())
    }

    pub fn decoding_key(&self) -> DecodingKey {
        DecodingKey::from_secret(self.jwt_secret.as_bytes())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionClaims {
    pub sub: Uuid,
    pub roles: Vec<String>,
    pub exp: usize,
    pub iat: usize,
}

#[derive(Debug, Clone, Copy, Eq, PartialEq, Ord, PartialOrd)]
pub enum UserRole {
    Admin,
    HrManager,
    Employee,
}

impl UserRole {
    pub fn as_str(self) -> &'static str {
        match self {
            UserRole::Admin => "ADMIN",
            UserRole::HrManager => "HR_MANAGER",
            UserRole::Employee => "EMPLOYEE",
        }
    }

    pub fn from_str(value: &str) -> Option<Self> {
        match value {
            "ADMIN" => Some(UserRole::Admin),
            "HR_MANAGER" => Some(UserRole::HrManager),
            "EMPLOYEE" => Some(UserRole::Employee),
            _ => None,
        }
    }

    pub fn level(self) -> u8 {
        match self {
            UserRole::Admin => 3,
            UserRole::HrManager => 2,
            UserRole::Employee => 1,
        }
    }
}

/// Roles implied by the account flags. Everyone is at least an employee.
pub fn roles_for(user: &user::Model) -> Vec<UserRole> {
    let mut roles = vec![UserRole::Employee];
    if user.is_hr_manager {
        roles.push(UserRole::HrManager);
    }
    if user.is_admin {
        roles.push(UserRole::Admin);
    }
    roles
}

#[derive(Debug, Clone)]
pub struct CurrentUser {
    pub user_id: Uuid,
    pub roles: Vec<UserRole>,
}

impl CurrentUser {
    pub fn from_model(user: &user::Model) -> Self {
        Self {
            user_id: user.id,
            roles: roles_for(user),
        }
    }

    pub fn has_role(&self, role: UserRole) -> bool {
        self.roles.iter().any(|r| r.level() >= role.level())
    }

    pub fn highest_role(&self) -> Option<UserRole> {
        self.roles.iter().copied().max_by_key(|r| r.level())
    }

    /// Admins and HR managers.
    pub fn is_management(&self) -> bool {
        self.has_role(UserRole::HrManager)
    }

    pub fn is_self(&self, employee_id: Uuid) -> bool {
        self.user_id == employee_id
    }
}

pub fn issue_token(
    user_id: Uuid,
    roles: &[UserRole],
    config: &AuthConfig,
) -> jsonwebtoken::errors::Result<String> {
    let now = Utc::now();
    let exp = now
        .checked_add_signed(Duration::minutes(config.session_ttl_minutes))
        .unwrap_or(now)
        .timestamp() as usize;
    let claims = SessionClaims {
        sub: user_id,
        roles: roles.iter().map(|r| r.as_str().to_string()).collect(),
        exp,
        iat: now.timestamp() as usize,
    };
    jsonwebtoken::encode(&Header::default(), &claims, &config.encoding_key())
}

pub fn decode_token(
    token: &str,
    config: &AuthConfig,
) -> jsonwebtoken::errors::Result<SessionClaims> {
    jsonwebtoken::decode::<SessionClaims>(token, &config.decoding_key(), &Validation::default())
        .map(|data| data.claims)
}

pub fn hash_password(password: &str) -> Result<String, argon2::password_hash::Error> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
}

pub fn verify_password(password: &str, stored: &str) -> bool {
    PasswordHash::new(stored)
        .map(|parsed| {
            Argon2::default()
                .verify_password(password.as_bytes(), &parsed)
                .is_ok()
        })
        .unwrap_or(false)
}

pub fn session_cookie(token: &str, ttl_minutes: i64) -> String {
    if ttl_minutes < 0 {
        format!("{}=; Max-Age=0; Path=/; HttpOnly; SameSite=Lax", SESSION_COOKIE)
    } else {
        format!(
            "{}={}; Max-Age={}; Path=/; HttpOnly; SameSite=Lax",
            SESSION_COOKIE,
            token,
            ttl_minutes * 60
        )
    }
}
