//! Back-office routes. Access control sits in front of the service.

use std::sync::Arc;

use axum::{
  Router,
  extract::State,
  http::StatusCode,
  routing::{delete, get, post, put},
};
use json::{Value, json};
use serde::Deserialize;

use super::{Json, Path, Query, message};
use crate::{
  entity::{CodeStatus, UserRole},
  prelude::*,
  state::AppState,
  sv::{
    book::BookInput,
    code::DEFAULT_BATCH,
    invoicing::ProductParams,
    pack::{PackFilter, PackInput},
    quiz::QuizInput,
    session::SessionInput,
    user::{NewUser, UserUpdate},
  },
};

pub fn router() -> Router<Arc<AppState>> {
  Router::new()
    // users and roles
    .route("/users", get(users).post(create_user))
    .route("/users/{id}", get(user).put(update_user).delete(delete_user))
    .route("/users/{id}/approve", put(approve_user))
    .route("/users/{id}/quiz", post(link_quiz))
    .route("/users/{id}/revoke-teacher", post(revoke_teacher))
    .route("/users/{id}/promote-admin", post(promote_admin))
    .route("/users/{id}/revoke-admin", post(revoke_admin))
    .route(
      "/users/{id}/notifications",
      get(notifications).post(create_notification),
    )
    .route(
      "/users/{id}/notifications/{notification_id}",
      delete(delete_notification),
    )
    .route("/users/{id}/suggestions", get(suggestions))
    .route("/applications", get(applications))
    .route("/applications/{user_id}", delete(reject))
    .route("/applications/{user_id}/accept", post(accept))
    // catalog
    .route("/books", get(books).post(create_book))
    .route("/books/{id}", put(update_book).delete(delete_book))
    .route("/books/{id}/sessions", get(book_sessions))
    .route(
      "/books/{id}/about",
      get(about).post(create_about).put(update_about).delete(delete_about),
    )
    .route("/packs", get(packs).post(create_pack))
    .route("/packs/{id}", get(pack).put(update_pack).delete(delete_pack))
    .route("/packs/{id}/books/{book_id}", post(add_book).delete(remove_book))
    .route("/packs/{id}/product", post(create_product))
    .route("/packs/{id}/readers", get(pack_readers))
    .route("/packs/{id}/codes", get(codes).post(generate_codes))
    .route("/codes/{code}", get(code).put(set_code_status).delete(delete_code))
    .route("/codes/{code}/sessions", get(code_sessions))
    // sessions
    .route("/sessions", get(sessions).post(create_session))
    .route(
      "/sessions/{id}",
      get(session).put(update_session).delete(delete_session),
    )
    .route("/sessions/{id}/readers", get(session_readers))
    .route("/sessions/{id}/quizzes", get(quizzes).post(attach_quiz))
    .route("/quizzes/{id}", delete(detach_quiz))
    // follows
    .route("/follows/packs", get(pack_follows))
    .route(
      "/follows/packs/{pack_id}/{user_id}",
      put(set_pack_follow).delete(delete_pack_follow),
    )
    .route("/follows/sessions", get(session_follows))
    .route(
      "/follows/sessions/{session_id}/{user_id}",
      put(set_session_follow).delete(delete_session_follow),
    )
    .route(
      "/follows/sessions/{session_id}/{user_id}/presence",
      put(set_presence),
    )
}

#[derive(Debug, Deserialize)]
pub struct RoleQuery {
  pub role: Option<UserRole>,
}

async fn users(
  State(app): State<Arc<AppState>>,
  Query(query): Query<RoleQuery>,
) -> Result<Json<Value>> {
  let users = app.sv().user.by_role(query.role.unwrap_or_default()).await?;
  Ok(Json(json!({ "users": users })))
}

async fn create_user(
  State(app): State<Arc<AppState>>,
  Json(new): Json<NewUser>,
) -> Result<(StatusCode, Json<Value>)> {
  let user = app.sv().user.create(new).await?;
  Ok((
    StatusCode::CREATED,
    Json(json!({ "message": "User created", "user": user })),
  ))
}

async fn user(
  State(app): State<Arc<AppState>>,
  Path(id): Path<i32>,
) -> Result<Json<Value>> {
  let user = app.sv().user.get(id).await?;
  Ok(Json(json!({ "user": user })))
}

async fn update_user(
  State(app): State<Arc<AppState>>,
  Path(id): Path<i32>,
  Json(update): Json<UserUpdate>,
) -> Result<Json<Value>> {
  let user = app.sv().user.update(id, update).await?;
  Ok(Json(json!({ "message": "User updated", "user": user })))
}

async fn delete_user(
  State(app): State<Arc<AppState>>,
  Path(id): Path<i32>,
) -> Result<Json<Value>> {
  app.sv().user.delete(id).await?;
  Ok(message("User deleted"))
}

async fn approve_user(
  State(app): State<Arc<AppState>>,
  Path(id): Path<i32>,
) -> Result<Json<Value>> {
  let user = app.sv().user.approve(id).await?;
  Ok(Json(json!({ "message": "User approved", "user": user })))
}

/// Creates the quiz-side account of a user that has none yet.
async fn link_quiz(
  State(app): State<Arc<AppState>>,
  Path(id): Path<i32>,
) -> Result<Json<Value>> {
  let Some(quiz) = app.quiz.as_ref() else {
    return Err(Error::Upstream("Quiz service not configured".into()));
  };

  let sv = app.sv().user;
  let user = sv.get(id).await?;
  if let Some(quiz_id) = user.quiz_id {
    return Ok(Json(json!({ "quiz_id": quiz_id })));
  }

  let quiz_id = quiz.register_user(&user.username, &user.email).await?;
  sv.set_quiz_id(id, quiz_id.clone()).await?;
  Ok(Json(json!({ "quiz_id": quiz_id })))
}

async fn revoke_teacher(
  State(app): State<Arc<AppState>>,
  Path(id): Path<i32>,
) -> Result<Json<Value>> {
  let user = app.sv().role.revoke_teacher(id).await?;
  Ok(Json(json!({ "message": "Teacher role revoked", "user": user })))
}

async fn promote_admin(
  State(app): State<Arc<AppState>>,
  Path(id): Path<i32>,
) -> Result<Json<Value>> {
  let user = app.sv().role.promote_admin(id).await?;
  Ok(Json(json!({ "message": "User promoted to admin", "user": user })))
}

async fn revoke_admin(
  State(app): State<Arc<AppState>>,
  Path(id): Path<i32>,
) -> Result<Json<Value>> {
  let user = app.sv().role.revoke_admin(id).await?;
  Ok(Json(json!({ "message": "Admin role revoked", "user": user })))
}

async fn notifications(
  State(app): State<Arc<AppState>>,
  Path(id): Path<i32>,
) -> Result<Json<Value>> {
  let notifications = app.sv().notification.of_user(id).await?;
  Ok(Json(json!({ "notifications": notifications })))
}

#[derive(Debug, Deserialize)]
pub struct NotificationReq {
  pub notification_id: Option<String>,
}

async fn create_notification(
  State(app): State<Arc<AppState>>,
  Path(id): Path<i32>,
  Json(req): Json<NotificationReq>,
) -> Result<(StatusCode, Json<Value>)> {
  let notification = app
    .sv()
    .notification
    .create(id, req.notification_id.as_deref())
    .await?;
  Ok((
    StatusCode::CREATED,
    Json(json!({
      "message": "Notification recorded",
      "notification": notification,
    })),
  ))
}

async fn delete_notification(
  State(app): State<Arc<AppState>>,
  Path((id, notification_id)): Path<(i32, String)>,
) -> Result<Json<Value>> {
  app.sv().notification.delete(id, &notification_id).await?;
  Ok(message("Notification deleted"))
}

async fn suggestions(
  State(app): State<Arc<AppState>>,
  Path(id): Path<i32>,
) -> Result<Json<Value>> {
  let (category, books) = app.sv().book.suggest_for(id).await?;
  Ok(Json(json!({ "category": category, "suggestions": books })))
}

async fn applications(
  State(app): State<Arc<AppState>>,
) -> Result<Json<Value>> {
  let list: Vec<Value> = app
    .sv()
    .role
    .applications()
    .await?
    .into_iter()
    .map(|(postulate, user)| json!({ "application": postulate, "user": user }))
    .collect();
  Ok(Json(json!({ "applications": list })))
}

async fn accept(
  State(app): State<Arc<AppState>>,
  Path(user_id): Path<i32>,
) -> Result<Json<Value>> {
  let user = app.sv().role.accept(user_id).await?;
  Ok(Json(json!({ "message": "Application accepted", "user": user })))
}

async fn reject(
  State(app): State<Arc<AppState>>,
  Path(user_id): Path<i32>,
) -> Result<Json<Value>> {
  app.sv().role.reject(user_id).await?;
  Ok(message("Application rejected"))
}

async fn books(State(app): State<Arc<AppState>>) -> Result<Json<Value>> {
  let books = app.sv().book.all().await?;
  Ok(Json(json!({ "books": books })))
}

async fn create_book(
  State(app): State<Arc<AppState>>,
  Json(input): Json<BookInput>,
) -> Result<(StatusCode, Json<Value>)> {
  let book = app.sv().book.create(input).await?;
  Ok((
    StatusCode::CREATED,
    Json(json!({ "message": "Book created", "book": book })),
  ))
}

async fn update_book(
  State(app): State<Arc<AppState>>,
  Path(id): Path<i32>,
  Json(input): Json<BookInput>,
) -> Result<Json<Value>> {
  let book = app.sv().book.update(id, input).await?;
  Ok(Json(json!({ "message": "Book updated", "book": book })))
}

async fn delete_book(
  State(app): State<Arc<AppState>>,
  Path(id): Path<i32>,
) -> Result<Json<Value>> {
  app.sv().book.delete(id).await?;
  Ok(message("Book deleted"))
}

async fn book_sessions(
  State(app): State<Arc<AppState>>,
  Path(id): Path<i32>,
) -> Result<Json<Value>> {
  app.sv().book.get(id).await?;
  let sessions = app.sv().session.by_book(id).await?;
  Ok(Json(json!({ "sessions": sessions })))
}

async fn about(
  State(app): State<Arc<AppState>>,
  Path(id): Path<i32>,
) -> Result<Json<Value>> {
  let about = app.sv().book.about(id).await?;
  Ok(Json(json!({ "about": about })))
}

async fn create_about(
  State(app): State<Arc<AppState>>,
  Path(id): Path<i32>,
  Json(body): Json<Value>,
) -> Result<(StatusCode, Json<Value>)> {
  let about = app.sv().book.create_about(id, body).await?;
  Ok((
    StatusCode::CREATED,
    Json(json!({ "message": "Book details created", "about": about })),
  ))
}

async fn update_about(
  State(app): State<Arc<AppState>>,
  Path(id): Path<i32>,
  Json(body): Json<Value>,
) -> Result<Json<Value>> {
  let about = app.sv().book.update_about(id, body).await?;
  Ok(Json(json!({ "message": "Book details updated", "about": about })))
}

async fn delete_about(
  State(app): State<Arc<AppState>>,
  Path(id): Path<i32>,
) -> Result<Json<Value>> {
  app.sv().book.delete_about(id).await?;
  Ok(message("Book details deleted"))
}

async fn packs(
  State(app): State<Arc<AppState>>,
  Query(filter): Query<PackFilter>,
) -> Result<Json<Value>> {
  let packs = app.sv().pack.list(filter).await?;
  Ok(Json(json!({ "packs": packs })))
}

async fn create_pack(
  State(app): State<Arc<AppState>>,
  Json(input): Json<PackInput>,
) -> Result<(StatusCode, Json<Value>)> {
  let pack = app.sv().pack.create(input).await?;
  Ok((
    StatusCode::CREATED,
    Json(json!({ "message": "Pack created", "pack": pack })),
  ))
}

async fn pack(
  State(app): State<Arc<AppState>>,
  Path(id): Path<i32>,
) -> Result<Json<Value>> {
  let sv = app.sv().pack;
  let pack = sv.get(id).await?;
  let books = sv.books(id).await?;
  Ok(Json(json!({ "pack": pack, "books": books })))
}

async fn update_pack(
  State(app): State<Arc<AppState>>,
  Path(id): Path<i32>,
  Json(input): Json<PackInput>,
) -> Result<Json<Value>> {
  let pack = app.sv().pack.update(id, input).await?;
  Ok(Json(json!({ "message": "Pack updated", "pack": pack })))
}

async fn delete_pack(
  State(app): State<Arc<AppState>>,
  Path(id): Path<i32>,
) -> Result<Json<Value>> {
  app.sv().pack.delete(id).await?;
  Ok(message("Pack deleted"))
}

async fn add_book(
  State(app): State<Arc<AppState>>,
  Path((id, book_id)): Path<(i32, i32)>,
) -> Result<(StatusCode, Json<Value>)> {
  app.sv().pack.add_book(id, book_id).await?;
  Ok((StatusCode::CREATED, message("Book added to pack")))
}

async fn remove_book(
  State(app): State<Arc<AppState>>,
  Path((id, book_id)): Path<(i32, i32)>,
) -> Result<Json<Value>> {
  app.sv().pack.remove_book(id, book_id).await?;
  Ok(message("Book removed from pack"))
}

async fn create_product(
  State(app): State<Arc<AppState>>,
  Path(id): Path<i32>,
) -> Result<Json<Value>> {
  let Some(invoicing) = app.invoicing.as_ref() else {
    return Err(Error::Upstream("Invoicing service not configured".into()));
  };

  let sv = app.sv().pack;
  let pack = sv.get(id).await?;
  if pack.invoice_product_id.is_some() {
    return Err(Error::Conflict("Pack already has a product".into()));
  }

  let product_id =
    invoicing.create_product(&ProductParams::from(&pack)).await?;
  let pack = sv.set_invoice_product(id, product_id).await?;
  Ok(Json(json!({ "message": "Product created", "pack": pack })))
}

async fn pack_readers(
  State(app): State<Arc<AppState>>,
  Path(id): Path<i32>,
) -> Result<Json<Value>> {
  app.sv().pack.get(id).await?;
  let readers = app.sv().follow.readers_in_pack(id).await?;
  Ok(Json(json!({ "readers": readers })))
}

async fn codes(
  State(app): State<Arc<AppState>>,
  Path(id): Path<i32>,
) -> Result<Json<Value>> {
  let codes = app.sv().code.active_in_pack(id).await?;
  Ok(Json(json!({ "codes": codes })))
}

#[derive(Debug, Deserialize)]
pub struct GenerateQuery {
  pub count: Option<usize>,
}

async fn generate_codes(
  State(app): State<Arc<AppState>>,
  Path(id): Path<i32>,
  Query(query): Query<GenerateQuery>,
) -> Result<(StatusCode, Json<Value>)> {
  let count = query.count.unwrap_or(DEFAULT_BATCH);
  let codes = app.sv().code.generate(id, count).await?;
  Ok((
    StatusCode::CREATED,
    Json(json!({ "message": "Codes generated", "codes": codes })),
  ))
}

async fn code(
  State(app): State<Arc<AppState>>,
  Path(code): Path<String>,
) -> Result<Json<Value>> {
  let code = app.sv().code.by_value(&code).await?;
  Ok(Json(json!({ "code": code })))
}

#[derive(Debug, Deserialize)]
pub struct StatusReq {
  pub status: CodeStatus,
}

async fn set_code_status(
  State(app): State<Arc<AppState>>,
  Path(code): Path<String>,
  Json(req): Json<StatusReq>,
) -> Result<Json<Value>> {
  let sv = app.sv().code;
  let code = sv.by_value(&code).await?;
  let code = sv.set_status(code.id, req.status).await?;
  Ok(Json(json!({ "message": "Code updated", "code": code })))
}

async fn delete_code(
  State(app): State<Arc<AppState>>,
  Path(code): Path<String>,
) -> Result<Json<Value>> {
  let sv = app.sv().code;
  let code = sv.by_value(&code).await?;
  sv.delete(code.id).await?;
  Ok(message("Code deleted"))
}

async fn code_sessions(
  State(app): State<Arc<AppState>>,
  Path(code): Path<String>,
) -> Result<Json<Value>> {
  let sessions = app.sv().code.sessions_of_user(&code).await?;
  Ok(Json(json!({ "sessions": sessions })))
}

async fn sessions(State(app): State<Arc<AppState>>) -> Result<Json<Value>> {
  let sessions = app.sv().session.all().await?;
  Ok(Json(json!({ "sessions": sessions })))
}

async fn create_session(
  State(app): State<Arc<AppState>>,
  Json(input): Json<SessionInput>,
) -> Result<(StatusCode, Json<Value>)> {
  let session = app.sv().session.create(input).await?;
  Ok((
    StatusCode::CREATED,
    Json(json!({ "message": "Session created", "session": session })),
  ))
}

async fn session(
  State(app): State<Arc<AppState>>,
  Path(id): Path<i32>,
) -> Result<Json<Value>> {
  let session = app.sv().session.view(id).await?;
  Ok(Json(json!({ "session": session })))
}

async fn update_session(
  State(app): State<Arc<AppState>>,
  Path(id): Path<i32>,
  Json(input): Json<SessionInput>,
) -> Result<Json<Value>> {
  let session = app.sv().session.update(id, input).await?;
  Ok(Json(json!({ "message": "Session updated", "session": session })))
}

async fn delete_session(
  State(app): State<Arc<AppState>>,
  Path(id): Path<i32>,
) -> Result<Json<Value>> {
  app.sv().session.delete(id).await?;
  Ok(message("Session deleted"))
}

async fn session_readers(
  State(app): State<Arc<AppState>>,
  Path(id): Path<i32>,
) -> Result<Json<Value>> {
  app.sv().session.get(id).await?;
  let readers = app.sv().follow.readers_in_session(id).await?;
  Ok(Json(json!({ "readers": readers })))
}

async fn quizzes(
  State(app): State<Arc<AppState>>,
  Path(id): Path<i32>,
) -> Result<Json<Value>> {
  let quizzes = app.sv().quiz.of_session(id).await?;
  Ok(Json(json!({ "quizzes": quizzes })))
}

async fn attach_quiz(
  State(app): State<Arc<AppState>>,
  Path(id): Path<i32>,
  Json(input): Json<QuizInput>,
) -> Result<(StatusCode, Json<Value>)> {
  let quiz = app.sv().quiz.attach(id, input).await?;
  Ok((
    StatusCode::CREATED,
    Json(json!({ "message": "Quiz attached", "quiz": quiz })),
  ))
}

async fn detach_quiz(
  State(app): State<Arc<AppState>>,
  Path(id): Path<i32>,
) -> Result<Json<Value>> {
  app.sv().quiz.detach(id).await?;
  Ok(message("Quiz detached"))
}

#[derive(Debug, Deserialize)]
pub struct PackQuery {
  pub pack_id: Option<i32>,
}

async fn pack_follows(
  State(app): State<Arc<AppState>>,
  Query(query): Query<PackQuery>,
) -> Result<Json<Value>> {
  let follows = app.sv().follow.pack_follows(query.pack_id).await?;
  Ok(Json(json!({ "follows": follows })))
}

#[derive(Debug, Deserialize)]
pub struct ApprovalReq {
  pub approved: bool,
}

async fn set_pack_follow(
  State(app): State<Arc<AppState>>,
  Path((pack_id, user_id)): Path<(i32, i32)>,
  Json(req): Json<ApprovalReq>,
) -> Result<Json<Value>> {
  let follow =
    app.sv().follow.set_pack_approval(user_id, pack_id, req.approved).await?;
  Ok(Json(json!({ "message": "Pack follow updated", "follow": follow })))
}

async fn delete_pack_follow(
  State(app): State<Arc<AppState>>,
  Path((pack_id, user_id)): Path<(i32, i32)>,
) -> Result<Json<Value>> {
  app.sv().follow.unfollow_pack(user_id, pack_id).await?;
  Ok(message("Pack follow deleted"))
}

#[derive(Debug, Deserialize)]
pub struct SessionQuery {
  pub session_id: Option<i32>,
}

async fn session_follows(
  State(app): State<Arc<AppState>>,
  Query(query): Query<SessionQuery>,
) -> Result<Json<Value>> {
  let follows = app.sv().follow.session_follows(query.session_id).await?;
  Ok(Json(json!({ "follows": follows })))
}

async fn set_session_follow(
  State(app): State<Arc<AppState>>,
  Path((session_id, user_id)): Path<(i32, i32)>,
  Json(req): Json<ApprovalReq>,
) -> Result<Json<Value>> {
  let follow = app
    .sv()
    .follow
    .set_session_approval(user_id, session_id, req.approved)
    .await?;
  Ok(Json(json!({ "message": "Session follow updated", "follow": follow })))
}

async fn delete_session_follow(
  State(app): State<Arc<AppState>>,
  Path((session_id, user_id)): Path<(i32, i32)>,
) -> Result<Json<Value>> {
  app.sv().follow.cancel(user_id, session_id).await?;
  Ok(message("Session follow deleted"))
}

#[derive(Debug, Deserialize)]
pub struct PresenceReq {
  pub presence: bool,
}

async fn set_presence(
  State(app): State<Arc<AppState>>,
  Path((session_id, user_id)): Path<(i32, i32)>,
  Json(req): Json<PresenceReq>,
) -> Result<Json<Value>> {
  let follow =
    app.sv().follow.set_presence(user_id, session_id, req.presence).await?;
  Ok(Json(json!({ "message": "Presence updated", "follow": follow })))
}
