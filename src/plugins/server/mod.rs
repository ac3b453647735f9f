mod handlers;

use std::{net::SocketAddr, sync::Arc};

use async_trait::async_trait;
use axum::{Router, routing::get};
use tower::ServiceBuilder;
use tower_governor::{GovernorLayer, governor::GovernorConfigBuilder};
use tower_http::{
  cors::{Any, CorsLayer},
  trace::TraceLayer,
};

use crate::{prelude::*, state::AppState};

pub fn routes(app: Arc<AppState>) -> Router {
  Router::new()
    .route("/health", get(handlers::health))
    .nest("/main", handlers::main::router())
    .nest("/reader", handlers::reader::router())
    .nest("/teacher", handlers::teacher::router())
    .nest("/admin", handlers::admin::router())
    .with_state(app)
}

pub struct Plugin;

#[async_trait]
impl super::Plugin for Plugin {
  async fn start(&self, app: Arc<AppState>) -> anyhow::Result<()> {
    let config = &app.config;
    let governor_conf = Arc::new(
      GovernorConfigBuilder::default()
        .per_second(config.rate_per_second)
        .burst_size(config.rate_burst)
        .finish()
        .context("Failed to build rate limiter config")?,
    );

    let limiter = governor_conf.limiter().clone();
    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));

    let router = routes(app.clone())
      .layer(
        ServiceBuilder::new()
          .layer(TraceLayer::new_for_http())
          .layer(GovernorLayer::new(governor_conf))
          .layer(
            CorsLayer::new()
              .allow_origin(Any)
              .allow_methods(Any)
              .allow_headers(Any),
          ),
      )
      .into_make_service_with_connect_info::<SocketAddr>();

    let listener = tokio::net::TcpListener::bind(addr)
      .await
      .with_context(|| format!("Failed to bind {addr}"))?;
    info!("HTTP Server listening on {addr}");

    let limiter = async {
      loop {
        tokio::time::sleep(Duration::from_secs(60)).await;
        limiter.retain_recent();
      }
    };

    let server = async {
      axum::serve(listener, router).await.context("Axum server error")
    };

    tokio::select! {
      result = server => {
        match &result {
          Ok(_) => info!("Server stopped gracefully"),
          Err(err) => error!("Server stopped with error: {err}"),
        }
        result
      }
      _ = limiter => {
        error!("Rate limiter cleaner stopped unexpectedly!");
        Ok(())
      }
    }
  }
}

#[cfg(test)]
mod tests {
  use axum::{
    body::{Body, to_bytes},
    http::{Method, Request, StatusCode},
  };
  use json::{Value, json};
  use tower::ServiceExt;

  use super::*;
  use crate::{
    entity::UserRole,
    state::Config,
    sv::test_utils::{fixtures, test_db},
  };

  async fn app() -> (Arc<AppState>, Router) {
    let db = test_db::setup().await;
    let app = Arc::new(AppState::with_db(db, Config::default()));
    (app.clone(), routes(app))
  }

  async fn call(
    router: &Router,
    method: Method,
    uri: &str,
    body: Option<Value>,
  ) -> (StatusCode, Value) {
    let mut req = Request::builder().method(method).uri(uri);
    let body = match body {
      Some(body) => {
        req = req.header("content-type", "application/json");
        Body::from(body.to_string())
      }
      None => Body::empty(),
    };

    let res = router.clone().oneshot(req.body(body).unwrap()).await.unwrap();
    let status = res.status();
    let bytes = to_bytes(res.into_body(), usize::MAX).await.unwrap();
    let value = json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, value)
  }

  #[tokio::test]
  async fn test_health() {
    let (_, router) = app().await;
    let res = router
      .oneshot(Request::get("/health").body(Body::empty()).unwrap())
      .await
      .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
  }

  #[tokio::test]
  async fn test_register_then_login_needs_approval() {
    let (app, router) = app().await;

    let body = json!({
      "username": "alice",
      "email": "alice@iread.test",
      "password": "pw",
    });
    let (status, created) =
      call(&router, Method::POST, "/main/register", Some(body.clone())).await;
    assert_eq!(status, StatusCode::CREATED);
    assert!(created["user"].get("password_hash").is_none());

    let (status, _) =
      call(&router, Method::POST, "/main/register", Some(body)).await;
    assert_eq!(status, StatusCode::CONFLICT);

    let login = json!({ "email": "alice@iread.test", "password": "pw" });
    let (status, res) =
      call(&router, Method::POST, "/main/login", Some(login.clone())).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert!(res["message"].is_string());

    let id = created["user"]["id"].as_i64().unwrap() as i32;
    app.sv().user.approve(id).await.unwrap();

    let (status, res) =
      call(&router, Method::POST, "/main/login", Some(login)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(res["role"], "reader");
  }

  #[tokio::test]
  async fn test_bad_requests_answer_json() {
    let (_, router) = app().await;

    let body = json!({ "username": "alice", "password": "pw" });
    let (status, res) =
      call(&router, Method::POST, "/main/register", Some(body)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(res["message"].as_str().is_some_and(|m| m.contains("email")));

    let (status, res) = call(&router, Method::GET, "/main/packs/abc", None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(res["message"].is_string());

    let uri = "/admin/packs/1/codes?count=lots";
    let (status, res) = call(&router, Method::POST, uri, None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(res["message"].is_string());
  }

  #[tokio::test]
  async fn test_enroll_flow_errors() {
    let (app, router) = app().await;
    let session = fixtures::session(&app.db, "Club", 1).await;
    let alice = fixtures::reader(&app.db, "alice").await;
    let bob = fixtures::reader(&app.db, "bob").await;

    let enroll = |user: i32| format!("/reader/{user}/sessions/{}/enroll", session.id);

    let (status, res) = call(&router, Method::POST, &enroll(alice.id), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(res["message"], "No approved pack follow found for this session");

    let codes = app.sv().code.generate(session.pack_id, 2).await.unwrap();
    for (user, code) in [(alice.id, &codes[0].code), (bob.id, &codes[1].code)] {
      let uri = format!("/reader/{user}/packs/{}/redeem", session.pack_id);
      let (status, _) =
        call(&router, Method::POST, &uri, Some(json!({ "code": code }))).await;
      assert_eq!(status, StatusCode::OK);
    }

    let (status, _) = call(&router, Method::POST, &enroll(alice.id), None).await;
    assert_eq!(status, StatusCode::CREATED);
    let (status, res) = call(&router, Method::POST, &enroll(bob.id), None).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(res["message"], "Session is full");
  }

  #[tokio::test]
  async fn test_redeem_twice_conflicts() {
    let (app, router) = app().await;
    let pack = fixtures::pack(&app.db, "Classics").await;
    let alice = fixtures::reader(&app.db, "alice").await;
    let code = app.sv().code.generate(pack.id, 1).await.unwrap().remove(0);

    let uri = format!("/reader/{}/packs/{}/redeem", alice.id, pack.id);
    let body = json!({ "code": code.code });

    let (status, _) = call(&router, Method::POST, &uri, Some(body.clone())).await;
    assert_eq!(status, StatusCode::OK);
    let (status, res) = call(&router, Method::POST, &uri, Some(body)).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(res["message"], "Code already used");

    let other = fixtures::pack(&app.db, "Poetry").await;
    let uri = format!("/reader/{}/packs/{}/redeem", alice.id, other.id);
    let body = json!({ "code": code.code });
    let (status, _) = call(&router, Method::POST, &uri, Some(body)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
  }

  #[tokio::test]
  async fn test_teacher_routes_need_staff() {
    let (app, router) = app().await;
    let session = fixtures::session(&app.db, "Club", 5).await;
    let reader = fixtures::reader(&app.db, "alice").await;
    let other = fixtures::user(&app.db, "zoe", UserRole::Teacher).await;

    let uri = format!("/teacher/{}/sessions", reader.id);
    let (status, _) = call(&router, Method::GET, &uri, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let uri = format!("/teacher/{}/sessions", session.teacher_id);
    let (status, res) = call(&router, Method::GET, &uri, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(res["sessions"].as_array().map(Vec::len), Some(1));

    let uri = format!("/teacher/{}/sessions/{}/readers", other.id, session.id);
    let (status, _) = call(&router, Method::GET, &uri, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
  }

  #[tokio::test]
  async fn test_admin_codes_and_unconfigured_product() {
    let (app, router) = app().await;
    let pack = fixtures::pack(&app.db, "Classics").await;

    let uri = format!("/admin/packs/{}/codes?count=3", pack.id);
    let (status, res) = call(&router, Method::POST, &uri, None).await;
    assert_eq!(status, StatusCode::CREATED);
    let codes = res["codes"].as_array().cloned().unwrap_or_default();
    assert_eq!(codes.len(), 3);

    let value = codes[0]["code"].as_str().unwrap();
    let uri = format!("/admin/codes/{value}");
    let body = json!({ "status": "pending" });
    let (status, res) = call(&router, Method::PUT, &uri, Some(body)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(res["code"]["status"], "pending");

    let uri = format!("/admin/packs/{}/product", pack.id);
    let (status, _) = call(&router, Method::POST, &uri, None).await;
    assert_eq!(status, StatusCode::BAD_GATEWAY);
  }

  #[tokio::test]
  async fn test_admin_book_details_and_notifications() {
    let (app, router) = app().await;
    let book = fixtures::book(&app.db, "Dune").await;
    let alice = fixtures::reader(&app.db, "alice").await;

    let uri = format!("/admin/books/{}/about", book.id);
    let about = json!({ "themes": ["ecology"] });
    let (status, _) = call(&router, Method::POST, &uri, Some(about.clone())).await;
    assert_eq!(status, StatusCode::CREATED);
    let (status, _) = call(&router, Method::POST, &uri, Some(about)).await;
    assert_eq!(status, StatusCode::CONFLICT);
    let (status, res) = call(&router, Method::GET, &uri, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(res["about"]["about"]["themes"][0], "ecology");

    let uri = format!("/admin/users/{}/notifications", alice.id);
    let body = json!({ "notification_id": "welcome" });
    let (status, _) = call(&router, Method::POST, &uri, Some(body.clone())).await;
    assert_eq!(status, StatusCode::CREATED);
    let (status, res) = call(&router, Method::POST, &uri, Some(body)).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert!(res["message"].is_string());

    let (_, res) = call(&router, Method::GET, &uri, None).await;
    assert_eq!(res["notifications"].as_array().map(Vec::len), Some(1));

    let (status, _) =
      call(&router, Method::DELETE, &format!("{uri}/welcome"), None).await;
    assert_eq!(status, StatusCode::OK);
    let (status, _) =
      call(&router, Method::DELETE, &format!("{uri}/welcome"), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let uri = format!("/admin/users/{}/suggestions", alice.id);
    let (status, res) = call(&router, Method::GET, &uri, None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(res["message"], "No suggestion found");
  }
}
