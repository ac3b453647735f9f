pub mod admin;
pub mod main;
pub mod reader;
pub mod teacher;

use axum::{
  extract::{FromRequest, FromRequestParts},
  response::{IntoResponse, Response},
};
use json::{Value, json};
use serde::Serialize;

use crate::error::Error;

/// `axum::Json` with rejections reported as `{"message"}` 400s.
#[derive(FromRequest)]
#[from_request(via(axum::Json), rejection(Error))]
pub struct Json<T>(pub T);

impl<T: Serialize> IntoResponse for Json<T> {
  fn into_response(self) -> Response {
    axum::Json(self.0).into_response()
  }
}

#[derive(FromRequestParts)]
#[from_request(via(axum::extract::Query), rejection(Error))]
pub struct Query<T>(pub T);

#[derive(FromRequestParts)]
#[from_request(via(axum::extract::Path), rejection(Error))]
pub struct Path<T>(pub T);

pub async fn health() -> &'static str {
  "OK"
}

pub fn message(text: impl Into<String>) -> Json<Value> {
  Json(json!({ "message": text.into() }))
}
