//! Session quizzes and the external quiz service client

use reqwest::Client;
use serde::{Deserialize, Serialize};

use crate::{
  entity::{session, session_quiz},
  prelude::*,
};

#[derive(Debug, Default, Deserialize)]
pub struct QuizInput {
  pub quiz_token: Option<String>,
  pub release_date: Option<DateTime>,
}

pub struct Quiz<'a> {
  db: &'a DatabaseConnection,
}

impl<'a> Quiz<'a> {
  pub fn new(db: &'a DatabaseConnection) -> Self {
    Self { db }
  }

  pub async fn attach(
    &self,
    session_id: i32,
    input: QuizInput,
  ) -> Result<session_quiz::Model> {
    let token = utils::required("quiz token", input.quiz_token.as_deref())?;

    session::Entity::find_by_id(session_id)
      .one(self.db)
      .await?
      .ok_or(Error::SessionNotFound)?;

    let exists = session_quiz::Entity::find()
      .filter(session_quiz::Column::SessionId.eq(session_id))
      .filter(session_quiz::Column::QuizToken.eq(token))
      .one(self.db)
      .await?;
    if exists.is_some() {
      return Err(Error::Conflict(
        "Quiz already attached to this session".into(),
      ));
    }

    let quiz = session_quiz::ActiveModel {
      session_id: Set(session_id),
      quiz_token: Set(token.to_string()),
      release_date: Set(input.release_date),
      ..Default::default()
    }
    .insert(self.db)
    .await?;
    Ok(quiz)
  }

  pub async fn detach(&self, id: i32) -> Result<()> {
    let res = session_quiz::Entity::delete_by_id(id).exec(self.db).await?;
    if res.rows_affected == 0 {
      return Err(Error::QuizNotFound);
    }
    Ok(())
  }

  pub async fn of_session(
    &self,
    session_id: i32,
  ) -> Result<Vec<session_quiz::Model>> {
    let quizzes = session_quiz::Entity::find()
      .filter(session_quiz::Column::SessionId.eq(session_id))
      .order_by_asc(session_quiz::Column::ReleaseDate)
      .all(self.db)
      .await?;
    Ok(quizzes)
  }
}

#[derive(Debug, Serialize)]
struct RegisterParams<'a> {
  username: &'a str,
  email: &'a str,
}

#[derive(Debug, Deserialize)]
struct Registered {
  #[serde(alias = "_id")]
  id: String,
}

/// Client of the quiz service, which keeps its own user directory.
#[derive(Clone)]
pub struct QuizApi {
  client: Client,
  url: String,
  api_key: String,
}

impl QuizApi {
  pub fn new(url: String, api_key: String) -> Self {
    Self { client: Client::new(), url, api_key }
  }

  /// Registers a reader and returns the quiz-side user id.
  pub async fn register_user(&self, username: &str, email: &str) -> Result<String> {
    let response = self
      .client
      .post(&self.url)
      .header("x-api-key", &self.api_key)
      .json(&RegisterParams { username, email })
      .send()
      .await?;

    let status = response.status();
    if !status.is_success() {
      return Err(Error::Upstream(format!("Quiz service returned {status}")));
    }

    let registered: Registered = response.json().await?;
    debug!("Quiz user `{}` registered for {email}", registered.id);
    Ok(registered.id)
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::sv::test_utils::{fixtures, test_db};

  #[tokio::test]
  async fn test_attach_detach() {
    let db = test_db::setup().await;
    let session = fixtures::session(&db, "Quiz night", 4).await;
    let sv = Quiz::new(&db);

    let input = || QuizInput {
      quiz_token: Some("chapter-1".into()),
      release_date: None,
    };

    let quiz = sv.attach(session.id, input()).await.unwrap();
    assert!(matches!(
      sv.attach(session.id, input()).await,
      Err(Error::Conflict(_))
    ));
    assert!(matches!(
      sv.attach(404, input()).await,
      Err(Error::SessionNotFound)
    ));

    assert_eq!(sv.of_session(session.id).await.unwrap().len(), 1);
    sv.detach(quiz.id).await.unwrap();
    assert!(matches!(sv.detach(quiz.id).await, Err(Error::QuizNotFound)));
  }

  #[test]
  fn test_registered_id_alias() {
    let parsed: Registered =
      json::from_str(r#"{"_id": "65800f77", "username": "alice"}"#).unwrap();
    assert_eq!(parsed.id, "65800f77");
  }
}
