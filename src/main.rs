//! iread - reading platform backend
//!
//! - SeaORM over SQLite or MySQL, migrations in the `migration` crate
//! - Axum REST API split into `/main`, `/reader`, `/teacher` and `/admin`
//! - Optional quiz and invoicing services over HTTP

mod entity;
mod error;
mod plugins;
mod prelude;
mod state;
mod sv;
mod utils;

use tracing_subscriber::{
  EnvFilter, layer::SubscriberExt, util::SubscriberInitExt,
};

use crate::{
  prelude::*,
  state::{AppState, Config},
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
  dotenvy::dotenv().ok();

  tracing_subscriber::registry()
    .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
      "iread=debug,tower_http=debug,axum=trace,sea_orm=warn".into()
    }))
    .with(tracing_subscriber::fmt::layer())
    .init();

  info!("Starting iread v{}", env!("CARGO_PKG_VERSION"));

  let app = Arc::new(AppState::new(Config::from_env()).await?);

  plugins::App::new().register(plugins::server::Plugin).run(app).await;

  tokio::signal::ctrl_c().await.context("Failed to listen for ctrl-c")?;
  info!("Shutting down");
  Ok(())
}
