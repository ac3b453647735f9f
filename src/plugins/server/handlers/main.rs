//! Public catalog and account entry points

use std::sync::Arc;

use axum::{
  Router,
  extract::State,
  http::StatusCode,
  routing::{get, post},
};
use json::{Value, json};
use serde::Deserialize;

use super::{Json, Path, Query};
use crate::{
  entity::user,
  prelude::*,
  state::AppState,
  sv::pack::PackFilter,
};

pub fn router() -> Router<Arc<AppState>> {
  Router::new()
    .route("/register", post(register))
    .route("/login", post(login))
    .route("/packs", get(packs))
    .route("/packs/{id}", get(pack))
    .route("/books", get(books))
    .route("/books/{id}", get(book))
    .route("/sessions", get(sessions))
}

#[derive(Debug, Deserialize)]
pub struct RegisterReq {
  pub username: String,
  pub email: String,
  pub password: String,
}

/// Links the reader to the quiz service. A failure there never blocks
/// registration.
async fn link_quiz(app: &AppState, user: &user::Model) -> Option<String> {
  let quiz = app.quiz.as_ref()?;
  match quiz.register_user(&user.username, &user.email).await {
    Ok(quiz_id) => {
      if let Err(err) = app.sv().user.set_quiz_id(user.id, quiz_id.clone()).await
      {
        warn!("Failed to store quiz id of user #{}: {err}", user.id);
        return None;
      }
      Some(quiz_id)
    }
    Err(err) => {
      warn!("Quiz registration failed for user #{}: {err}", user.id);
      None
    }
  }
}

async fn register(
  State(app): State<Arc<AppState>>,
  Json(req): Json<RegisterReq>,
) -> Result<(StatusCode, Json<Value>)> {
  let mut user =
    app.sv().user.register(&req.username, &req.email, &req.password).await?;
  if let Some(quiz_id) = link_quiz(&app, &user).await {
    user.quiz_id = Some(quiz_id);
  }

  Ok((
    StatusCode::CREATED,
    Json(json!({
      "message": "Account created, waiting for approval",
      "user": user,
    })),
  ))
}

#[derive(Debug, Deserialize)]
pub struct LoginReq {
  pub email: String,
  pub password: String,
}

async fn login(
  State(app): State<Arc<AppState>>,
  Json(req): Json<LoginReq>,
) -> Result<Json<Value>> {
  let user = app.sv().user.login(&req.email, &req.password).await?;
  Ok(Json(json!({
    "message": "Login successful",
    "role": user.role,
    "user": user,
  })))
}

async fn packs(
  State(app): State<Arc<AppState>>,
  Query(filter): Query<PackFilter>,
) -> Result<Json<Value>> {
  let mut packs = app.sv().pack.list(filter).await?;
  packs.retain(|p| p.public);
  Ok(Json(json!({ "packs": packs })))
}

async fn pack(
  State(app): State<Arc<AppState>>,
  Path(id): Path<i32>,
) -> Result<Json<Value>> {
  let sv = app.sv().pack;
  let pack = sv.get(id).await?;
  if !pack.public {
    return Err(Error::PackNotFound);
  }
  let books = sv.books(id).await?;
  Ok(Json(json!({ "pack": pack, "books": books })))
}

async fn books(State(app): State<Arc<AppState>>) -> Result<Json<Value>> {
  let books = app.sv().book.all().await?;
  Ok(Json(json!({ "books": books })))
}

async fn book(
  State(app): State<Arc<AppState>>,
  Path(id): Path<i32>,
) -> Result<Json<Value>> {
  let (book, sessions) = app.sv().book.with_upcoming(id).await?;
  let sessions = app.sv().session.views(sessions).await?;
  Ok(Json(json!({ "book": book, "sessions": sessions })))
}

async fn sessions(State(app): State<Arc<AppState>>) -> Result<Json<Value>> {
  let now = utils::now();
  let mut sessions = app.sv().session.all().await?;
  sessions.retain(|s| s.session.active && s.session.start_date > now);
  Ok(Json(json!({ "sessions": sessions })))
}
