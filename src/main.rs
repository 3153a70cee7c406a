use actix_web::middleware::NormalizePath;
use actix_web::web::Data;
use actix_web::{App, HttpServer, Responder, get};
use dotenvy::dotenv;
use std::sync::Arc;

mod api;
mod attendance;
mod config;
mod db;
mod directory;
mod docs;
mod identity;
mod model;
mod routes;
mod store;
mod utils;

use attendance::service::AttendanceService;
use config::Config;
use db::init_db;
use directory::MySqlEmployeeDirectory;
use store::mysql::MySqlAttendanceStore;

use crate::docs::ApiDoc;
use crate::utils::today_cache;
use tracing::info;
use tracing_appender::rolling;
use utoipa::OpenApi; // ← needed for ApiDoc::openapi()
use utoipa_swagger_ui::SwaggerUi;

#[get("/")]
async fn index() -> impl Responder {
    "Attendance service"
}

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    dotenv().ok();

    let config = Config::from_env();

    // Rolling daily log
    let file_appender = rolling::daily("logs", "app.log");
    let (non_blocking, _guard) = tracing_appender::non_blocking(file_appender);

    tracing_subscriber::fmt()
        .with_writer(non_blocking)
        .with_max_level(tracing::Level::DEBUG)
        .with_ansi(false)
        .with_target(false) // removes module path
        .with_level(true)
        .with_thread_ids(false)
        .with_thread_names(false)
        .pretty()
        .init();

    info!("Server starting...");

    let pool = init_db(&config.database_url).await;

    let service = Data::new(AttendanceService::new(
        Arc::new(MySqlAttendanceStore::new(pool.clone())),
        Arc::new(MySqlEmployeeDirectory::new(pool.clone())),
        config.store_retry_attempts,
    ));

    // Clone values for the closures (avoid move issues)
    let pool_for_cache_warmup = pool.clone();
    let warmup_batch = config.cache_warmup_batch;
    let server_addr = config.server_addr.clone();
    let config_data = config.clone();

    actix_web::rt::spawn(async move {
        if let Err(e) = today_cache::warmup_today_cache(&pool_for_cache_warmup, warmup_batch).await {
            eprintln!("Failed to warmup today cache: {:?}", e);
        }
    });

    HttpServer::new(move || {
        App::new()
            .wrap(actix_web::middleware::Logger::default())
            .wrap(NormalizePath::trim())
            .service(
                SwaggerUi::new("/swagger-ui/{_:.*}") // ← wildcard {_:.*} to match JS/CSS files
                    .url("/api-doc/openapi.json", ApiDoc::openapi()),
            )
            .app_data(service.clone())
            .service(index)
            .configure(|cfg| routes::configure(cfg, config_data.clone()))
    })
    .bind(server_addr)?
    .run()
    .await
}
