use actix_web::middleware::NormalizePath;
use actix_web::web::Data;
use actix_web::{App, HttpServer, Responder, get};
use std::sync::Arc;

mod api;
mod config;
mod db;
mod docs;
mod error;
mod model;
mod routes;
mod service;
mod store;
mod utils;

use config::Config;
use db::init_db;

use crate::docs::ApiDoc;
use crate::service::{AttendanceService, LogNotifier, NotificationDispatcher};
use crate::store::{
    Directory, Ledger,
    mysql::{MySqlDirectory, MySqlLedger},
};
use tracing::info;
use tracing_appender::rolling;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

#[get("/")]
async fn index() -> impl Responder {
    "Shift attendance service"
}

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::from_env()?;

    // Rolling daily log
    let file_appender = rolling::daily(&config.log_dir, "app.log");
    let (non_blocking, _guard) = tracing_appender::non_blocking(file_appender);

    tracing_subscriber::fmt()
        .with_writer(non_blocking)
        .with_max_level(tracing::Level::DEBUG)
        .with_ansi(false)
        .with_target(false)
        .with_level(true)
        .with_thread_ids(false)
        .with_thread_names(false)
        .pretty()
        .init();

    info!(
        utc_offset = %config.utc_offset,
        grace_minutes = config.cutover_grace_minutes,
        "Server starting..."
    );

    let pool = init_db(&config.database_url).await?;

    let directory: Arc<dyn Directory> = Arc::new(MySqlDirectory::new(
        pool.clone(),
        std::time::Duration::from_secs(config.shift_cache_ttl_secs),
    ));
    let ledger: Arc<dyn Ledger> = Arc::new(MySqlLedger::new(pool));

    let service = Data::new(AttendanceService::new(
        directory,
        ledger,
        config.utc_offset,
        chrono::Duration::minutes(config.cutover_grace_minutes),
    ));
    let notifications = Data::new(NotificationDispatcher::new(
        Arc::new(LogNotifier),
        config.notify_recipients.clone(),
        config.notify_image_url.clone(),
    ));

    let server_addr = config.server_addr.clone();
    let config_data = config.clone();

    HttpServer::new(move || {
        App::new()
            .wrap(actix_web::middleware::Logger::default())
            .wrap(NormalizePath::trim())
            .service(
                SwaggerUi::new("/swagger-ui/{_:.*}") // wildcard {_:.*} to match JS/CSS files
                    .url("/api-doc/openapi.json", ApiDoc::openapi()),
            )
            .app_data(service.clone())
            .app_data(notifications.clone())
            .service(index)
            .configure(|cfg| routes::configure(cfg, config_data.clone()))
    })
    .bind(server_addr)?
    .run()
    .await?;

    Ok(())
}
