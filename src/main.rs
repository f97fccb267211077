use actix_files::Files;
use actix_web::{web, App, HttpServer};
use log::{error, info};
use std::io;

use vetclinic::config::AppConfig;
use vetclinic::logger::setup_logger;
use vetclinic::middleware::RequestLogger;
use vetclinic::services::uploads::PUBLIC_PREFIX;
use vetclinic::{db, maintenance, routes};

fn startup_error(context: &str, e: impl std::fmt::Display) -> io::Error {
    error!("{}: {}", context, e);
    io::Error::new(io::ErrorKind::Other, format!("{}: {}", context, e))
}

#[actix_web::main]
async fn main() -> io::Result<()> {
    // Load environment variables and initialize logger
    dotenvy::dotenv().ok();
    setup_logger("info");

    let config = AppConfig::from_env();
    config
        .validate()
        .map_err(|e| startup_error("Invalid configuration", e))?;

    info!("Connecting to database");
    let pool = db::build_pool(&config).map_err(|e| startup_error("Database pool", e))?;
    db::init_schema(&pool).map_err(|e| startup_error("Database initialization", e))?;

    std::fs::create_dir_all(&config.upload_dir)
        .map_err(|e| startup_error("Cannot create upload directory", e))?;

    maintenance::spawn_sweeper(pool.clone(), &config);

    let bind = (config.host.clone(), config.port);
    let upload_dir = config.upload_dir.clone();
    info!("Starting HTTP server at http://{}:{}", bind.0, bind.1);

    HttpServer::new(move || {
        App::new()
            .wrap(RequestLogger)
            .app_data(web::Data::new(pool.clone()))
            .app_data(web::Data::new(config.clone()))
            .configure(routes::configure)
            .service(Files::new(PUBLIC_PREFIX, upload_dir.clone()))
    })
    .workers(2)
    .keep_alive(std::time::Duration::from_secs(75))
    .shutdown_timeout(30)
    .bind(bind)?
    .run()
    .await
}
