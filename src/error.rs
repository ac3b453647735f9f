use axum::{
  Json,
  extract::rejection::{JsonRejection, PathRejection, QueryRejection},
  http::StatusCode,
  response::{IntoResponse, Response},
};
use tracing::{error, warn};

#[derive(Debug, thiserror::Error)]
pub enum Redeem {
  #[error("Code does not belong to this pack")]
  Mismatch,
  #[error("Code already used")]
  Used,
  #[error("Code is not active")]
  Inactive,
}

#[derive(Debug, thiserror::Error)]
pub enum Enroll {
  #[error("No approved pack follow found for this session")]
  PackNotApproved,
  #[error("Session is full")]
  Full,
  #[error("Already registered for this session")]
  Already,
}

#[derive(Debug, thiserror::Error)]
pub enum Error {
  #[error("Database error: {0}")]
  Database(#[from] sea_orm::DbErr),

  #[error("Password hashing failed: {0}")]
  Hash(#[from] bcrypt::BcryptError),

  #[error("Upstream service error: {0}")]
  Upstream(String),

  #[error("{0}")]
  InvalidArgs(String),

  #[error("Invalid email or password")]
  InvalidCredentials,

  #[error("Not allowed")]
  Unauthorized,

  #[error("{0}")]
  Forbidden(&'static str),

  #[error("User not found")]
  UserNotFound,

  #[error("Book not found")]
  BookNotFound,

  #[error("Pack not found")]
  PackNotFound,

  #[error("Session not found")]
  SessionNotFound,

  #[error("Code not found")]
  CodeNotFound,

  #[error("Follow request not found")]
  FollowNotFound,

  #[error("Teacher application not found")]
  PostulateNotFound,

  #[error("Quiz not found")]
  QuizNotFound,

  #[error("Book is not in this pack")]
  NotInPack,

  #[error("Book details not found")]
  AboutNotFound,

  #[error("Notification not found")]
  NotificationNotFound,

  #[error("No suggestion found")]
  NoSuggestion,

  #[error("{0}")]
  Conflict(String),

  #[error(transparent)]
  Redeem(#[from] Redeem),

  #[error(transparent)]
  Enroll(#[from] Enroll),
}

impl From<reqwest::Error> for Error {
  fn from(err: reqwest::Error) -> Self {
    Error::Upstream(err.to_string())
  }
}

impl From<JsonRejection> for Error {
  fn from(rejection: JsonRejection) -> Self {
    Error::InvalidArgs(rejection.body_text())
  }
}

impl From<QueryRejection> for Error {
  fn from(rejection: QueryRejection) -> Self {
    Error::InvalidArgs(rejection.body_text())
  }
}

impl From<PathRejection> for Error {
  fn from(rejection: PathRejection) -> Self {
    Error::InvalidArgs(rejection.body_text())
  }
}

impl Error {
  pub fn status(&self) -> StatusCode {
    match self {
      Error::Database(_) | Error::Hash(_) => {
        StatusCode::INTERNAL_SERVER_ERROR
      }
      Error::Upstream(_) => StatusCode::BAD_GATEWAY,
      Error::InvalidArgs(_) | Error::Redeem(Redeem::Mismatch) => {
        StatusCode::BAD_REQUEST
      }
      Error::Unauthorized => StatusCode::UNAUTHORIZED,
      Error::Forbidden(_) => StatusCode::FORBIDDEN,
      Error::InvalidCredentials
      | Error::UserNotFound
      | Error::BookNotFound
      | Error::PackNotFound
      | Error::SessionNotFound
      | Error::CodeNotFound
      | Error::FollowNotFound
      | Error::PostulateNotFound
      | Error::QuizNotFound
      | Error::NotInPack
      | Error::AboutNotFound
      | Error::NotificationNotFound
      | Error::NoSuggestion
      | Error::Enroll(Enroll::PackNotApproved) => StatusCode::NOT_FOUND,
      Error::Conflict(_)
      | Error::Redeem(_)
      | Error::Enroll(Enroll::Full | Enroll::Already) => StatusCode::CONFLICT,
    }
  }
}

impl IntoResponse for Error {
  fn into_response(self) -> Response {
    let status = self.status();

    let message = match &self {
      Error::Database(_) | Error::Hash(_) => {
        error!("{self}");
        "Internal server error".to_string()
      }
      Error::Upstream(_) => {
        warn!("{self}");
        "Upstream service unavailable".to_string()
      }
      _ => self.to_string(),
    };

    (status, Json(json::json!({ "message": message }))).into_response()
  }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
