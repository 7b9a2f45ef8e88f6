// Credential store: user accounts and their current session token.

use argon2::{
    password_hash::SaltString, Argon2, PasswordHash, PasswordHasher, PasswordVerifier,
};
use sqlx::{query, query_as, Pool, Sqlite};

use crate::{error::AppError, model::User};

const USER_COLUMNS: &str = "id, username, password_hash, token, created_at";

fn salt() -> Result<SaltString, AppError> {
    use rand::Rng;
    let mut bytes = [0u8; 16];
    rand::rng().fill(&mut bytes);
    Ok(SaltString::encode_b64(&bytes)?)
}

fn hash_password(password: &str) -> Result<String, AppError> {
    let salt = salt()?;
    let hash = Argon2::default().hash_password(password.as_bytes(), &salt)?;
    Ok(hash.to_string())
}

// Creates a user with no current token.
// The username check relies on the `UNIQUE` constraint so two concurrent
// registrations cannot both succeed.
pub async fn register(db: &Pool<Sqlite>, username: &str, password: &str) -> Result<User, AppError> {
    let password_hash = hash_password(password)?;

    let user_result = query_as::<_, User>(&format!(
        "INSERT INTO users (username, password_hash, token, created_at) VALUES (?, ?, NULL, ?) RETURNING {USER_COLUMNS}"
    ))
    .bind(username)
    .bind(password_hash)
    .bind(chrono::Utc::now())
    .fetch_one(db)
    .await;

    match user_result {
        Ok(user) => {
            tracing::info!(username, user_id = user.id, "user registered");
            Ok(user)
        }
        Err(e)
            if e.as_database_error()
                .map(|d| d.is_unique_violation())
                .unwrap_or(false) =>
        {
            Err(AppError::AlreadyExists(username.to_string()))
        }
        Err(e) => Err(e.into()),
    }
}

pub async fn fetch(db: &Pool<Sqlite>, username: &str) -> Result<Option<User>, AppError> {
    let user = query_as::<_, User>(&format!("SELECT {USER_COLUMNS} FROM users WHERE username = ?"))
        .bind(username)
        .fetch_optional(db)
        .await?;
    Ok(user)
}

pub async fn fetch_by_id(db: &Pool<Sqlite>, id: i64) -> Result<Option<User>, AppError> {
    let user = query_as::<_, User>(&format!("SELECT {USER_COLUMNS} FROM users WHERE id = ?"))
        .bind(id)
        .fetch_optional(db)
        .await?;
    Ok(user)
}

// Verifies `password` against the stored argon2 hash.
pub fn check_password(user: &User, password: &str) -> bool {
    PasswordHash::new(&user.password_hash)
        .ok()
        .as_ref()
        .map(|hash| {
            Argon2::default()
                .verify_password(password.as_bytes(), hash)
                .is_ok()
        })
        .unwrap_or(false)
}

// Overwrites (or clears) the single current token of a user
pub(crate) async fn set_token(
    db: &Pool<Sqlite>,
    user_id: i64,
    token: Option<&str>,
) -> Result<(), AppError> {
    query("UPDATE users SET token = ? WHERE id = ?")
        .bind(token)
        .bind(user_id)
        .execute(db)
        .await?;
    Ok(())
}
