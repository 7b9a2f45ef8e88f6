// Session tokens: signed HS256 JWTs that are only honoured while they are
// also the user's current token in the store.

use std::time::Duration;

use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation};
use sqlx::{Pool, Sqlite};

use crate::{error::AppError, model::{CurrentUser, User}, store};

pub const TOKEN_TTL: Duration = Duration::from_secs(3600);

#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct Claims {
    pub sub: i64,
    pub usr: String,
    pub jti: uuid::Uuid,
    pub iat: i64,
    pub exp: i64,
}

impl Claims {
    pub fn new(user: &CurrentUser, issued_at: i64) -> Self {
        Self {
            sub: user.id,
            usr: user.username.clone(),
            jti: uuid::Uuid::new_v4(),
            iat: issued_at,
            exp: issued_at + TOKEN_TTL.as_secs() as i64,
        }
    }
}

fn now() -> i64 {
    chrono::Utc::now().timestamp()
}

#[derive(Clone)]
pub struct TokenService {
    encoding: EncodingKey,
    decoding: DecodingKey,
    validation: Validation,
}

impl TokenService {
    pub fn new(secret: &[u8]) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;
        Self {
            encoding: EncodingKey::from_secret(secret),
            decoding: DecodingKey::from_secret(secret),
            validation,
        }
    }

    pub fn encode(&self, claims: &Claims) -> Result<String, jsonwebtoken::errors::Error> {
        jsonwebtoken::encode(&Header::new(Algorithm::HS256), claims, &self.encoding)
    }

    pub fn decode(&self, token: &str) -> Result<Claims, jsonwebtoken::errors::Error> {
        jsonwebtoken::decode::<Claims>(token, &self.decoding, &self.validation).map(|data| data.claims)
    }

    // Signs a fresh token for `user` and makes it the user's only valid one.
    pub async fn issue(&self, db: &Pool<Sqlite>, user: &CurrentUser) -> Result<String, AppError> {
        let claims = Claims::new(user, now());
        let token = self.encode(&claims)?;
        store::set_token(db, user.id, Some(token.as_str())).await?;
        tracing::debug!(user_id = user.id, jti = %claims.jti, "session token issued");
        Ok(token)
    }

    // Resolves a token to its user.
    // Missing, malformed, expired and superseded tokens all come back as
    // `None`; a store failure is logged and treated the same way.
    pub async fn verify(&self, db: &Pool<Sqlite>, token: Option<&str>) -> Option<User> {
        let token = token.filter(|t| !t.is_empty())?;

        let claims = match self.decode(token) {
            Ok(claims) => claims,
            Err(e) => {
                tracing::debug!(error = %e, "rejected session token");
                return None;
            }
        };

        let user = match store::fetch_by_id(db, claims.sub).await {
            Ok(Some(user)) => user,
            Ok(None) => {
                tracing::debug!(user_id = claims.sub, "token for unknown user");
                return None;
            }
            Err(e) => {
                tracing::error!(error = %e, "user lookup failed during token verification");
                return None;
            }
        };

        if user.token.as_deref() != Some(token) {
            tracing::debug!(user_id = user.id, "token is not the current session");
            return None;
        }
        Some(user)
    }

    pub async fn invalidate(&self, db: &Pool<Sqlite>, user: &CurrentUser) -> Result<(), AppError> {
        store::set_token(db, user.id, None).await?;
        tracing::debug!(user_id = user.id, "session token invalidated");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db;

    const SECRET: &[u8] = b"test-secret";

    async fn alice(pool: &Pool<Sqlite>) -> CurrentUser {
        let user = store::register(pool, "alice", "pw1").await.unwrap();
        CurrentUser::from(&user)
    }

    #[tokio::test]
    async fn issued_token_verifies_to_its_user() {
        let pool = db::memory().await;
        let tokens = TokenService::new(SECRET);
        let user = alice(&pool).await;

        let token = tokens.issue(&pool, &user).await.unwrap();
        let verified = tokens.verify(&pool, Some(token.as_str())).await.unwrap();
        assert_eq!(verified.id(), user.id);
        assert_eq!(verified.username(), "alice");

        let claims = tokens.decode(&token).unwrap();
        assert_eq!(claims.exp - claims.iat, 3600);
    }

    #[tokio::test]
    async fn missing_or_empty_token_fails_closed() {
        let pool = db::memory().await;
        let tokens = TokenService::new(SECRET);
        assert!(tokens.verify(&pool, None).await.is_none());
        assert!(tokens.verify(&pool, Some("")).await.is_none());
    }

    #[tokio::test]
    async fn malformed_and_foreign_tokens_fail() {
        let pool = db::memory().await;
        let tokens = TokenService::new(SECRET);
        let user = alice(&pool).await;
        assert!(tokens.verify(&pool, Some("not-a-jwt")).await.is_none());

        // signed with another secret but stored as current
        let forged = TokenService::new(b"other").encode(&Claims::new(&user, now())).unwrap();
        store::set_token(&pool, user.id, Some(forged.as_str())).await.unwrap();
        assert!(tokens.verify(&pool, Some(forged.as_str())).await.is_none());
    }

    #[tokio::test]
    async fn expired_token_fails() {
        let pool = db::memory().await;
        let tokens = TokenService::new(SECRET);
        let user = alice(&pool).await;

        let claims = Claims::new(&user, now() - TOKEN_TTL.as_secs() as i64 - 1);
        let token = tokens.encode(&claims).unwrap();
        store::set_token(&pool, user.id, Some(token.as_str())).await.unwrap();

        assert!(tokens.verify(&pool, Some(token.as_str())).await.is_none());
    }

    #[tokio::test]
    async fn new_token_supersedes_old() {
        let pool = db::memory().await;
        let tokens = TokenService::new(SECRET);
        let user = alice(&pool).await;

        let first = tokens.issue(&pool, &user).await.unwrap();
        let second = tokens.issue(&pool, &user).await.unwrap();
        assert_ne!(first, second);

        assert!(tokens.verify(&pool, Some(first.as_str())).await.is_none());
        assert!(tokens.verify(&pool, Some(second.as_str())).await.is_some());
    }

    #[tokio::test]
    async fn invalidate_revokes_unexpired_token() {
        let pool = db::memory().await;
        let tokens = TokenService::new(SECRET);
        let user = alice(&pool).await;

        let token = tokens.issue(&pool, &user).await.unwrap();
        tokens.invalidate(&pool, &user).await.unwrap();

        assert!(tokens.decode(&token).is_ok());
        assert!(tokens.verify(&pool, Some(token.as_str())).await.is_none());
    }

    #[tokio::test]
    async fn token_for_deleted_user_fails() {
        let pool = db::memory().await;
        let tokens = TokenService::new(SECRET);
        let ghost = CurrentUser { id: 99, username: "ghost".into() };
        let token = tokens.encode(&Claims::new(&ghost, now())).unwrap();
        assert!(tokens.verify(&pool, Some(token.as_str())).await.is_none());
    }
}
