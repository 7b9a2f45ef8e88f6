use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Extension, Json,
};
use serde_json::json;

use crate::{
    error::AppError,
    model::{CurrentUser, Todo},
    schema::{present, CreateTodoSchema, CredentialsSchema, Params, UpdateTodoSchema},
    store, todo,
    token::TOKEN_TTL,
    AppState,
};

const MISSING_CREDENTIALS: &str =
    "Some parameters are missing. You need 'username' and 'password'.";

type HandlerResult = Result<(StatusCode, Json<serde_json::Value>), AppError>;

fn expires() -> serde_json::Value {
    json!({ "in": TOKEN_TTL.as_secs(), "units": "seconds" })
}

fn credentials(params: CredentialsSchema) -> Result<(String, String), AppError> {
    match (present(params.username), present(params.password)) {
        (Some(username), Some(password)) => Ok((username, password)),
        _ => Err(AppError::Validation(MISSING_CREDENTIALS.to_string())),
    }
}

// Ids that are not numbers can never match a row
fn parse_id(id: &str) -> Result<i64, AppError> {
    id.parse::<i64>()
        .map_err(|_| AppError::NotFound(todo::not_found_message(id)))
}

fn todo_response(user: &CurrentUser, message: &str, todo: &Todo) -> serde_json::Value {
    json!({
        "logged in as": user.username,
        "message": message,
        "todo": todo,
    })
}

// Handler for the health checker route
pub async fn health_checker_handler() -> impl IntoResponse {
    const MESSAGE: &str = "Multi-user todo API with Rust, SQLx, SQLite, and Axum";

    Json(json!({ "status": "success", "message": MESSAGE }))
}

// POST /register
pub async fn register(
    State(data): State<Arc<AppState>>,
    Params(body): Params<CredentialsSchema>,
) -> HandlerResult {
    let (username, password) = credentials(body)?;
    let user = store::register(&data.db, &username, &password).await?;

    Ok((
        StatusCode::OK,
        Json(json!({
            "message": "Success. User created.",
            "username": user.username(),
            "created at": user.created_at().to_string(),
        })),
    ))
}

// POST /login
pub async fn login(
    State(data): State<Arc<AppState>>,
    Params(body): Params<CredentialsSchema>,
) -> HandlerResult {
    let (username, password) = credentials(body)?;

    let user = store::fetch(&data.db, &username)
        .await?
        .ok_or_else(|| AppError::AuthenticationFailed(format!("{username} could not be found.")))?;

    if !store::check_password(&user, &password) {
        tracing::info!(%username, "login rejected");
        return Err(AppError::AuthenticationFailed("Invalid credentials.".to_string()));
    }

    let token = data.tokens.issue(&data.db, &CurrentUser::from(&user)).await?;
    tracing::info!(%username, "user logged in");

    Ok((
        StatusCode::OK,
        Json(json!({
            "message": "Success.",
            "token": token,
            "expires": expires(),
        })),
    ))
}

// POST /refresh
pub async fn refresh(
    State(data): State<Arc<AppState>>,
    Extension(user): Extension<CurrentUser>,
) -> HandlerResult {
    let token = data.tokens.issue(&data.db, &user).await?;

    Ok((
        StatusCode::OK,
        Json(json!({
            "logged in as": user.username,
            "message": "Success.",
            "token": token,
            "expires": expires(),
        })),
    ))
}

// POST /logout
pub async fn logout(
    State(data): State<Arc<AppState>>,
    Extension(user): Extension<CurrentUser>,
) -> HandlerResult {
    data.tokens.invalidate(&data.db, &user).await?;
    tracing::info!(username = %user.username, "user logged out");

    Ok((
        StatusCode::OK,
        Json(json!({
            "message": "Success. You have now logged out. Your token is now invalidated."
        })),
    ))
}

// GET /todos
pub async fn get_todos(
    State(data): State<Arc<AppState>>,
    Extension(user): Extension<CurrentUser>,
) -> HandlerResult {
    let todos = todo::list_all(&data.db, user.id).await?;

    Ok((
        StatusCode::OK,
        Json(json!({
            "logged in as": user.username,
            "total": todos.len(),
            "todos": todos,
        })),
    ))
}

// DELETE /todos
pub async fn delete_todos(
    State(data): State<Arc<AppState>>,
    Extension(user): Extension<CurrentUser>,
) -> HandlerResult {
    todo::delete_all(&data.db, user.id).await?;

    Ok((
        StatusCode::OK,
        Json(json!({
            "logged in as": user.username,
            "message": "Success. All todos deleted.",
        })),
    ))
}

// POST /todos
pub async fn create_todo(
    State(data): State<Arc<AppState>>,
    Extension(user): Extension<CurrentUser>,
    Params(body): Params<CreateTodoSchema>,
) -> HandlerResult {
    let body = body.body.unwrap_or_default();
    let todo = todo::create(&data.db, user.id, &body, todo::INITIAL_STATUS).await?;

    Ok((
        StatusCode::CREATED,
        Json(todo_response(&user, "Success. Todo created.", &todo)),
    ))
}

// GET /todo/:id
pub async fn get_todo(
    Path(id): Path<String>,
    State(data): State<Arc<AppState>>,
    Extension(user): Extension<CurrentUser>,
) -> HandlerResult {
    let todo = todo::get_by_id(&data.db, user.id, parse_id(&id)?)
        .await?
        .ok_or_else(|| AppError::NotFound(todo::not_found_message(&id)))?;

    Ok((StatusCode::OK, Json(todo_response(&user, "Success.", &todo))))
}

// DELETE /todo/:id
pub async fn delete_todo(
    Path(id): Path<String>,
    State(data): State<Arc<AppState>>,
    Extension(user): Extension<CurrentUser>,
) -> HandlerResult {
    if !todo::delete(&data.db, user.id, parse_id(&id)?).await? {
        return Err(AppError::NotFound(todo::not_found_message(&id)));
    }

    Ok((
        StatusCode::OK,
        Json(json!({
            "logged in as": user.username,
            "message": format!("Success. Todo id {id} deleted."),
        })),
    ))
}

// PUT /todo/:id
pub async fn update_todo(
    Path(id): Path<String>,
    State(data): State<Arc<AppState>>,
    Extension(user): Extension<CurrentUser>,
    Params(body): Params<UpdateTodoSchema>,
) -> HandlerResult {
    let status = present(body.status)
        .ok_or_else(|| AppError::Validation("Missing updated status for todo.".to_string()))?;
    let todo = todo::update_status(&data.db, user.id, parse_id(&id)?, &status).await?;

    Ok((StatusCode::OK, Json(todo_response(&user, "Success.", &todo))))
}
