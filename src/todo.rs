// Owner-scoped access to todo items. Every query filters on `user_id`, so a
// todo belonging to someone else behaves exactly like a missing one.

use sqlx::{query, query_as, Pool, Sqlite};

use crate::{error::AppError, model::Todo};

pub const INITIAL_STATUS: &str = "pending";

const TODO_SELECT: &str = "SELECT t.id, t.body, t.status, t.created_at, u.username AS owner \
     FROM todos t JOIN users u ON u.id = t.user_id";

pub async fn create(db: &Pool<Sqlite>, owner: i64, body: &str, status: &str) -> Result<Todo, AppError> {
    let (id,): (i64,) = query_as(
        "INSERT INTO todos (body, status, created_at, user_id) VALUES (?, ?, ?, ?) RETURNING id",
    )
    .bind(body)
    .bind(status)
    .bind(chrono::Utc::now())
    .bind(owner)
    .fetch_one(db)
    .await?;

    tracing::debug!(todo_id = id, owner, "todo created");
    get_by_id(db, owner, id)
        .await?
        .ok_or_else(|| AppError::NotFound(not_found_message(id)))
}

pub async fn list_all(db: &Pool<Sqlite>, owner: i64) -> Result<Vec<Todo>, AppError> {
    let todos = query_as::<_, Todo>(&format!("{TODO_SELECT} WHERE t.user_id = ? ORDER BY t.id"))
        .bind(owner)
        .fetch_all(db)
        .await?;
    Ok(todos)
}

pub async fn get_by_id(db: &Pool<Sqlite>, owner: i64, id: i64) -> Result<Option<Todo>, AppError> {
    let todo = query_as::<_, Todo>(&format!("{TODO_SELECT} WHERE t.id = ? AND t.user_id = ?"))
        .bind(id)
        .bind(owner)
        .fetch_optional(db)
        .await?;
    Ok(todo)
}

pub async fn update_status(
    db: &Pool<Sqlite>,
    owner: i64,
    id: i64,
    status: &str,
) -> Result<Todo, AppError> {
    let rows_affected = query("UPDATE todos SET status = ? WHERE id = ? AND user_id = ?")
        .bind(status)
        .bind(id)
        .bind(owner)
        .execute(db)
        .await?
        .rows_affected();
    if rows_affected == 0 {
        return Err(AppError::NotFound(not_found_message(id)));
    }

    get_by_id(db, owner, id)
        .await?
        .ok_or_else(|| AppError::NotFound(not_found_message(id)))
}

// Returns whether an owned todo was removed
pub async fn delete(db: &Pool<Sqlite>, owner: i64, id: i64) -> Result<bool, AppError> {
    let rows_affected = query("DELETE FROM todos WHERE id = ? AND user_id = ?")
        .bind(id)
        .bind(owner)
        .execute(db)
        .await?
        .rows_affected();
    Ok(rows_affected > 0)
}

pub async fn delete_all(db: &Pool<Sqlite>, owner: i64) -> Result<u64, AppError> {
    let rows_affected = query("DELETE FROM todos WHERE user_id = ?")
        .bind(owner)
        .execute(db)
        .await?
        .rows_affected();
    tracing::debug!(owner, deleted = rows_affected, "todos cleared");
    Ok(rows_affected)
}

pub fn not_found_message(id: impl std::fmt::Display) -> String {
    format!("Could not find todo with an id of '{id}'.")
}
