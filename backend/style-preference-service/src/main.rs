use actix_cors::Cors;
use actix_web::{web, App, HttpServer};
use std::io;
use std::sync::Arc;
use std::time::Duration;
use tracing_actix_web::TracingLogger;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use style_preference_service::config::Config;
use style_preference_service::handlers;
use style_preference_service::services::{
    catalog, InMemoryProfileStore, JsonFileProfileStore, ProfileStore, QuizService, SessionStore,
};

fn init_tracing(log_format: &str) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "info,actix_web=info".into());
    let registry = tracing_subscriber::registry().with(filter);

    if log_format.eq_ignore_ascii_case("json") {
        registry.with(tracing_subscriber::fmt::layer().json()).init();
    } else {
        registry.with(tracing_subscriber::fmt::layer()).init();
    }
}

async fn build_profile_store(config: &Config) -> io::Result<Arc<dyn ProfileStore>> {
    match &config.profiles.dir {
        Some(dir) => {
            let store = JsonFileProfileStore::open(dir.clone())
                .await
                .map_err(|e| io::Error::new(io::ErrorKind::Other, e.to_string()))?;
            Ok(Arc::new(store))
        }
        None => {
            tracing::info!("PROFILE_DIR not set, profiles are kept in memory");
            Ok(Arc::new(InMemoryProfileStore::new()))
        }
    }
}

#[actix_web::main]
async fn main() -> io::Result<()> {
    let config = Config::from_env()
        .map_err(|e| io::Error::new(io::ErrorKind::InvalidInput, e.to_string()))?;

    init_tracing(&config.app.log_format);

    tracing::info!(
        "Starting style-preference-service v{}",
        env!("CARGO_PKG_VERSION")
    );
    tracing::info!("Environment: {}", config.app.env);
    tracing::info!(
        max_turns = config.quiz.max_turns,
        mandatory_styles = ?config.quiz.mandatory_styles,
        session_ttl_secs = config.quiz.session_ttl_secs,
        "Quiz configuration loaded"
    );

    let catalog = catalog::from_config(&config.catalog)
        .await
        .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e.to_string()))?;
    let profiles = build_profile_store(&config).await?;
    let store = SessionStore::new(config.algorithm, config.quiz.clone());

    let quiz = web::Data::new(QuizService::new(store, catalog, profiles));

    // Abandoned quizzes never reach save_profile; sweep them by age
    let sweeper = quiz.clone();
    let sweep_every = Duration::from_secs(config.quiz.sweep_interval_secs);
    actix_web::rt::spawn(async move {
        let mut interval = tokio::time::interval(sweep_every);
        loop {
            interval.tick().await;
            sweeper.store().evict_expired();
        }
    });

    let bind_addr = format!("0.0.0.0:{}", config.app.port);
    tracing::info!("HTTP server listening on {}", bind_addr);

    HttpServer::new(move || {
        let cors = Cors::default()
            .allow_any_origin()
            .allow_any_method()
            .allow_any_header()
            .max_age(3600);

        App::new()
            .wrap(cors)
            .wrap(TracingLogger::default())
            .app_data(quiz.clone())
            .configure(handlers::configure)
    })
    .bind(bind_addr)?
    .run()
    .await
}
