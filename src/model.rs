use chrono::{DateTime, Utc};

// Registered account; the password hash never leaves the store
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct User {
    pub(crate) id: i64,
    pub(crate) username: String,
    pub(crate) password_hash: String,
    pub(crate) token: Option<String>,
    pub(crate) created_at: DateTime<Utc>,
}

impl User {
    pub fn id(&self) -> i64 {
        self.id
    }

    pub fn username(&self) -> &str {
        &self.username
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }
}

// Todo item joined with its owner's username
#[derive(Debug, Clone, sqlx::FromRow, serde::Serialize)]
pub struct Todo {
    pub(crate) id: i64,
    pub(crate) body: String,
    pub(crate) status: String,
    #[serde(rename = "created")]
    pub(crate) created_at: DateTime<Utc>,
    pub(crate) owner: String,
}

impl Todo {
    pub fn id(&self) -> i64 {
        self.id
    }

    pub fn body(&self) -> &str {
        &self.body
    }

    pub fn status(&self) -> &str {
        &self.status
    }

    pub fn owner(&self) -> &str {
        &self.owner
    }
}

// Caller resolved by the auth middleware, stored in request extensions
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CurrentUser {
    pub(crate) id: i64,
    pub(crate) username: String,
}

impl From<&User> for CurrentUser {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            username: user.username.clone(),
        }
    }
}
