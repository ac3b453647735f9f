use std::sync::Arc;

use axum::{
  Router,
  extract::State,
  http::StatusCode,
  routing::{get, post},
};
use json::{Value, json};
use serde::Deserialize;

use super::{Json, Path, message};
use crate::{prelude::*, state::AppState, sv::user::UserUpdate};

pub fn router() -> Router<Arc<AppState>> {
  Router::new()
    .route("/{user_id}", get(profile).put(update).delete(delete_account))
    .route("/{user_id}/packs", get(packs))
    .route(
      "/{user_id}/packs/{pack_id}/follow",
      post(follow_pack).delete(unfollow_pack),
    )
    .route("/{user_id}/packs/{pack_id}/redeem", post(redeem))
    .route(
      "/{user_id}/sessions/{session_id}/enroll",
      post(enroll).delete(cancel),
    )
    .route("/{user_id}/dashboard", get(dashboard))
    .route("/{user_id}/books", get(books))
    .route("/{user_id}/application", get(application).post(apply))
}

async fn profile(
  State(app): State<Arc<AppState>>,
  Path(user_id): Path<i32>,
) -> Result<Json<Value>> {
  let user = app.sv().user.get(user_id).await?;
  Ok(Json(json!({ "user": user })))
}

async fn update(
  State(app): State<Arc<AppState>>,
  Path(user_id): Path<i32>,
  Json(update): Json<UserUpdate>,
) -> Result<Json<Value>> {
  let user = app.sv().user.update(user_id, update).await?;
  Ok(Json(json!({ "message": "Profile updated", "user": user })))
}

#[derive(Debug, Deserialize)]
pub struct PasswordReq {
  pub password: String,
}

async fn delete_account(
  State(app): State<Arc<AppState>>,
  Path(user_id): Path<i32>,
  Json(req): Json<PasswordReq>,
) -> Result<Json<Value>> {
  app.sv().user.delete_account(user_id, &req.password).await?;
  Ok(message("Account deleted"))
}

async fn packs(
  State(app): State<Arc<AppState>>,
  Path(user_id): Path<i32>,
) -> Result<Json<Value>> {
  let packs = app.sv().follow.followed_packs(user_id).await?;
  Ok(Json(json!({ "packs": packs })))
}

async fn follow_pack(
  State(app): State<Arc<AppState>>,
  Path((user_id, pack_id)): Path<(i32, i32)>,
) -> Result<(StatusCode, Json<Value>)> {
  let (follow, created) =
    app.sv().follow.request_pack(user_id, pack_id).await?;

  let (status, text) = if created {
    (StatusCode::CREATED, "Follow request sent")
  } else {
    (StatusCode::OK, "Pack already followed")
  };
  Ok((status, Json(json!({ "message": text, "follow": follow }))))
}

async fn unfollow_pack(
  State(app): State<Arc<AppState>>,
  Path((user_id, pack_id)): Path<(i32, i32)>,
) -> Result<Json<Value>> {
  app.sv().follow.unfollow_pack(user_id, pack_id).await?;
  Ok(message("Pack unfollowed"))
}

#[derive(Debug, Deserialize)]
pub struct RedeemReq {
  pub code: String,
}

async fn redeem(
  State(app): State<Arc<AppState>>,
  Path((user_id, pack_id)): Path<(i32, i32)>,
  Json(req): Json<RedeemReq>,
) -> Result<Json<Value>> {
  let follow = app.sv().code.redeem(user_id, pack_id, &req.code).await?;
  Ok(Json(json!({ "message": "Code redeemed", "follow": follow })))
}

async fn enroll(
  State(app): State<Arc<AppState>>,
  Path((user_id, session_id)): Path<(i32, i32)>,
) -> Result<(StatusCode, Json<Value>)> {
  let follow = app.sv().follow.enroll(user_id, session_id).await?;
  Ok((
    StatusCode::CREATED,
    Json(json!({ "message": "Registered for session", "follow": follow })),
  ))
}

async fn cancel(
  State(app): State<Arc<AppState>>,
  Path((user_id, session_id)): Path<(i32, i32)>,
) -> Result<Json<Value>> {
  app.sv().follow.cancel(user_id, session_id).await?;
  Ok(message("Registration cancelled"))
}

async fn dashboard(
  State(app): State<Arc<AppState>>,
  Path(user_id): Path<i32>,
) -> Result<Json<Value>> {
  app.sv().user.get(user_id).await?;
  let dashboard = app.sv().follow.dashboard(user_id).await?;
  Ok(Json(json!(dashboard)))
}

async fn books(
  State(app): State<Arc<AppState>>,
  Path(user_id): Path<i32>,
) -> Result<Json<Value>> {
  let books = app.sv().follow.unlocked_books(user_id).await?;
  Ok(Json(json!({ "books": books })))
}

#[derive(Debug, Deserialize)]
pub struct ApplyReq {
  pub description: String,
  pub study_level: String,
}

async fn apply(
  State(app): State<Arc<AppState>>,
  Path(user_id): Path<i32>,
  Json(req): Json<ApplyReq>,
) -> Result<(StatusCode, Json<Value>)> {
  app.sv().role.apply(user_id, &req.description, &req.study_level).await?;
  Ok((StatusCode::CREATED, message("Application submitted")))
}

async fn application(
  State(app): State<Arc<AppState>>,
  Path(user_id): Path<i32>,
) -> Result<Json<Value>> {
  let status = app.sv().role.application(user_id).await?;
  Ok(Json(json!({ "status": status })))
}
