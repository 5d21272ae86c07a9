//! # Quill API Server
//!
//! The main entry point for the Actix-web HTTP server.

use actix_web::{App, HttpServer, web};
use tracing_actix_web::TracingLogger;

mod background;
mod config;
mod handlers;
mod middleware;
mod observability;
mod state;
mod telemetry;

use background::{Scheduler, SchedulerConfig};
use config::AppConfig;
use observability::RequestIdMiddleware;
use state::AppState;
use telemetry::TelemetryConfig;

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    // Load .env file if present
    dotenvy::dotenv().ok();

    telemetry::init_telemetry(&TelemetryConfig::from_env());

    let config = AppConfig::from_env();

    tracing::info!(
        "Starting Quill API Server on {}:{}",
        config.host,
        config.port
    );

    // Build application state
    let state = AppState::new(&config).await;

    // Worker for queued fire-and-forget newsletter dispatches
    if let Err(e) = background::start_dispatch_worker(&state).await {
        tracing::error!(error = %e, "Failed to start dispatch worker");
    }

    // Periodic publication run; the HTTP trigger stays available either way
    let scheduler_config = SchedulerConfig::from_env();
    let _scheduler = if scheduler_config.enabled {
        match Scheduler::new().await {
            Ok(scheduler) => {
                if let Err(e) =
                    background::register_publication_job(&scheduler, &scheduler_config, &state)
                        .await
                {
                    tracing::error!(error = %e, "Failed to register publication job");
                }
                if let Err(e) = scheduler.start().await {
                    tracing::error!(error = %e, "Failed to start scheduler");
                }
                Some(scheduler)
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to create scheduler");
                None
            }
        }
    } else {
        tracing::info!("Scheduler disabled");
        None
    };

    // Start HTTP server
    HttpServer::new(move || {
        App::new()
            .wrap(TracingLogger::default())
            .wrap(RequestIdMiddleware)
            .app_data(web::Data::new(state.clone()))
            .configure(handlers::configure_routes)
    })
    .bind((config.host.as_str(), config.port))?
    .run()
    .await
}
