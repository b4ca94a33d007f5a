//! Main entry point for the Campground Booking API server.
//! This crate wires configuration, the database pool and the route table together.

mod config;
mod routes;

use actix_web::{App, HttpServer, middleware::Logger, web};
use auth_services::jwt::{JwtConfig, JwtService};
use postgres::database::*;
use web_handlers::errors::{json_error_handler, path_error_handler, query_error_handler};
use web_handlers::{CookieSettings, health};

use crate::config::ServerConfig;

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    // Load environment variables
    dotenvy::dotenv().ok();

    // Initialize logger
    env_logger::init_from_env(env_logger::Env::new().default_filter_or("info"));

    log::info!("🚀 Starting campground booking server...");

    let config = ServerConfig::from_env();

    // Create database connection pool
    let pool = match create_connection_pool(&config.database_url, config.max_connections).await {
        Ok(pool) => {
            log::info!("🗃️ Database pool created successfully");

            if let Err(e) = test_connection(&pool).await {
                log::error!("❌ Database connection test failed: {}", e);
            }
            pool
        }
        Err(e) => {
            log::error!("❌ Failed to create database pool: {}", e);
            log::error!("💡 Check DATABASE_URL and that PostgreSQL is running");
            std::process::exit(1);
        }
    };

    if let Err(e) = run_migrations(&pool).await {
        log::error!("❌ Failed to apply migrations: {}", e);
        std::process::exit(1);
    }

    let jwt_service = JwtService::new(&JwtConfig::from_env());
    let cookie_settings = CookieSettings {
        secure: config.production,
    };

    let (host, port) = config.bind_address();
    log::info!("🌐 Server will be available at: http://{}:{}", host, port);

    HttpServer::new(move || {
        App::new()
            .app_data(web::Data::new(pool.clone()))
            .app_data(web::Data::new(jwt_service.clone()))
            .app_data(web::Data::new(cookie_settings))
            .app_data(web::JsonConfig::default().error_handler(json_error_handler))
            .app_data(web::QueryConfig::default().error_handler(query_error_handler))
            .app_data(web::PathConfig::default().error_handler(path_error_handler))
            .wrap(Logger::default())
            .configure(|cfg| routes::configure(cfg, &jwt_service))
            .route("/health", web::get().to(health))
    })
    .bind((host, port))?
    .run()
    .await
}
