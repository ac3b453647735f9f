//! Routes for the acting teacher. Admins pass the staff check too.

use std::sync::Arc;

use axum::{
  Router,
  extract::State,
  routing::{get, put},
};
use json::{Value, json};
use serde::Deserialize;

use super::{Json, Path};
use crate::{
  entity::{UserRole, session, user},
  prelude::*,
  state::AppState,
  sv::user::UserUpdate,
};

pub fn router() -> Router<Arc<AppState>> {
  Router::new()
    .route("/{teacher_id}", get(profile).put(update))
    .route("/{teacher_id}/sessions", get(sessions))
    .route("/{teacher_id}/sessions/{session_id}/readers", get(readers))
    .route("/{teacher_id}/sessions/{session_id}/quizzes", get(quizzes))
    .route(
      "/{teacher_id}/sessions/{session_id}/presence/{user_id}",
      put(presence),
    )
}

async fn staff(app: &AppState, teacher_id: i32) -> Result<user::Model> {
  let user = app.sv().user.get(teacher_id).await?;
  if !user.is_staff() {
    return Err(Error::Unauthorized);
  }
  Ok(user)
}

/// The session must be taught by this teacher unless an admin asks.
async fn own_session(
  app: &AppState,
  teacher_id: i32,
  session_id: i32,
) -> Result<session::Model> {
  let teacher = staff(app, teacher_id).await?;
  let session = app.sv().session.get(session_id).await?;
  if teacher.role != UserRole::Admin && session.teacher_id != teacher.id {
    return Err(Error::Unauthorized);
  }
  Ok(session)
}

async fn profile(
  State(app): State<Arc<AppState>>,
  Path(teacher_id): Path<i32>,
) -> Result<Json<Value>> {
  let teacher = staff(&app, teacher_id).await?;
  Ok(Json(json!({ "teacher": teacher })))
}

async fn update(
  State(app): State<Arc<AppState>>,
  Path(teacher_id): Path<i32>,
  Json(update): Json<UserUpdate>,
) -> Result<Json<Value>> {
  staff(&app, teacher_id).await?;
  let teacher = app.sv().user.update(teacher_id, update).await?;
  Ok(Json(json!({ "message": "Profile updated", "teacher": teacher })))
}

async fn sessions(
  State(app): State<Arc<AppState>>,
  Path(teacher_id): Path<i32>,
) -> Result<Json<Value>> {
  staff(&app, teacher_id).await?;
  let sessions = app.sv().session.by_teacher(teacher_id).await?;
  Ok(Json(json!({ "sessions": sessions })))
}

async fn readers(
  State(app): State<Arc<AppState>>,
  Path((teacher_id, session_id)): Path<(i32, i32)>,
) -> Result<Json<Value>> {
  own_session(&app, teacher_id, session_id).await?;
  let readers = app.sv().follow.readers_in_session(session_id).await?;
  Ok(Json(json!({ "readers": readers })))
}

async fn quizzes(
  State(app): State<Arc<AppState>>,
  Path((teacher_id, session_id)): Path<(i32, i32)>,
) -> Result<Json<Value>> {
  own_session(&app, teacher_id, session_id).await?;
  let quizzes = app.sv().quiz.of_session(session_id).await?;
  Ok(Json(json!({ "quizzes": quizzes })))
}

#[derive(Debug, Deserialize)]
pub struct PresenceReq {
  pub presence: bool,
}

async fn presence(
  State(app): State<Arc<AppState>>,
  Path((teacher_id, session_id, user_id)): Path<(i32, i32, i32)>,
  Json(req): Json<PresenceReq>,
) -> Result<Json<Value>> {
  own_session(&app, teacher_id, session_id).await?;
  let follow =
    app.sv().follow.set_presence(user_id, session_id, req.presence).await?;
  Ok(Json(json!({ "message": "Presence updated", "follow": follow })))
}
