use std::{env, fmt::Display, str::FromStr};

use migration::Migrator;

use crate::{prelude::*, sv};

fn var(key: &str) -> Option<String> {
  env::var(key).ok().filter(|v| !v.trim().is_empty())
}

fn try_load<T: FromStr>(key: &str, default: T) -> T
where
  T::Err: Display,
{
  parse_or(key, var(key).as_deref(), default)
}

/// Blank or unparsable values fall back to `default`.
fn parse_or<T: FromStr>(key: &str, raw: Option<&str>, default: T) -> T
where
  T::Err: Display,
{
  match raw.map(str::trim).filter(|v| !v.is_empty()).map(str::parse) {
    Some(Ok(value)) => value,
    Some(Err(err)) => {
      warn!("Invalid {key} value: {err}, using default");
      default
    }
    None => default,
  }
}

#[derive(Debug, Clone)]
pub struct Config {
  pub database_url: String,
  pub port: u16,
  pub code_length: usize,
  pub quiz_url: Option<String>,
  pub quiz_key: Option<String>,
  pub invoicing_url: Option<String>,
  pub invoicing_token: Option<String>,
  pub rate_per_second: u64,
  pub rate_burst: u32,
}

impl Default for Config {
  fn default() -> Self {
    Self {
      database_url: String::from("sqlite:iread.db?mode=rwc"),
      port: 3000,
      code_length: 8,
      quiz_url: None,
      quiz_key: None,
      invoicing_url: None,
      invoicing_token: None,
      rate_per_second: 2,
      rate_burst: 100,
    }
  }
}

impl Config {
  pub fn from_env() -> Self {
    let default = Self::default();

    let mut code_length = try_load("CODE_LENGTH", default.code_length);
    if !(4..=64).contains(&code_length) {
      warn!("CODE_LENGTH must be within 4..=64, using default");
      code_length = default.code_length;
    }

    Self {
      database_url: var("DATABASE_URL").unwrap_or(default.database_url),
      port: try_load("PORT", default.port),
      code_length,
      quiz_url: var("QUIZ_API_URL"),
      quiz_key: var("QUIZ_API_KEY"),
      invoicing_url: var("INVOICING_API_URL"),
      invoicing_token: var("INVOICING_API_TOKEN"),
      rate_per_second: try_load("RATE_PER_SECOND", default.rate_per_second)
        .max(1),
      rate_burst: try_load("RATE_BURST", default.rate_burst).max(1),
    }
  }
}

pub struct Services<'a> {
  pub user: sv::User<'a>,
  pub role: sv::Role<'a>,
  pub book: sv::Book<'a>,
  pub pack: sv::Pack<'a>,
  pub session: sv::Session<'a>,
  pub follow: sv::Follow<'a>,
  pub code: sv::Code<'a>,
  pub quiz: sv::Quiz<'a>,
  pub notification: sv::Notification<'a>,
}

pub struct AppState {
  pub db: DatabaseConnection,
  pub config: Config,
  pub quiz: Option<sv::QuizApi>,
  pub invoicing: Option<sv::Invoicing>,
}

impl AppState {
  pub async fn new(config: Config) -> anyhow::Result<Self> {
    info!("Connecting to database...");
    let db = Database::connect(&config.database_url)
      .await
      .context("Failed to connect to database")?;

    info!("Running migrations...");
    Migrator::up(&db, None).await.context("Failed to run migrations")?;

    Ok(Self::with_db(db, config))
  }

  pub fn with_db(db: DatabaseConnection, config: Config) -> Self {
    let quiz = match (&config.quiz_url, &config.quiz_key) {
      (Some(url), Some(key)) => Some(sv::QuizApi::new(url.clone(), key.clone())),
      _ => {
        warn!("Quiz service not configured, quiz accounts disabled");
        None
      }
    };
    let invoicing = match (&config.invoicing_url, &config.invoicing_token) {
      (Some(url), Some(token)) => {
        Some(sv::Invoicing::new(url.clone(), token.clone()))
      }
      _ => {
        warn!("Invoicing service not configured, products disabled");
        None
      }
    };

    Self { db, config, quiz, invoicing }
  }

  pub fn sv(&self) -> Services<'_> {
    Services {
      user: sv::User::new(&self.db),
      role: sv::Role::new(&self.db),
      book: sv::Book::new(&self.db),
      pack: sv::Pack::new(&self.db),
      session: sv::Session::new(&self.db),
      follow: sv::Follow::new(&self.db),
      code: sv::Code::new(&self.db, self.config.code_length),
      quiz: sv::Quiz::new(&self.db),
      notification: sv::Notification::new(&self.db),
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_parse_or_fallback() {
    assert_eq!(parse_or("PORT", Some("not-a-port"), 3000u16), 3000);
    assert_eq!(parse_or("PORT", Some("70000"), 3000u16), 3000);
    assert_eq!(parse_or("CODE_LENGTH", Some(" 12 "), 8usize), 12);
    assert_eq!(parse_or("CODE_LENGTH", Some("   "), 8usize), 8);
    assert_eq!(parse_or("RATE_BURST", None, 5u32), 5);
  }

  #[tokio::test]
  async fn test_migrations_match_entities() {
    let config = Config {
      database_url: "sqlite::memory:".into(),
      ..Default::default()
    };
    let app = AppState::new(config).await.unwrap();
    assert!(app.quiz.is_none());

    let user = app.sv().user.register("alice", "alice@iread.test", "pw").await;
    let user = user.unwrap();
    let pack = app
      .sv()
      .pack
      .create(sv::pack::PackInput {
        title: Some("Classics".into()),
        level: Some("B2".into()),
        ..Default::default()
      })
      .await
      .unwrap();

    let codes = app.sv().code.generate(pack.id, 2).await.unwrap();
    let follow =
      app.sv().code.redeem(user.id, pack.id, &codes[0].code).await.unwrap();
    assert!(follow.approved);
  }
}
