use crate::application::Collaborators;
use crate::application::category_service::{CategoryService, CategoryUseCase};
use crate::application::post_service::{PostService, PostUseCase};
use crate::data::category_repository::PostgresCategoryRepository;
use crate::data::memory::InMemoryStore;
use crate::data::post_repository::PostgresPostRepository;
use crate::data::post_version_repository::PostgresPostVersionRepository;
use crate::data::transaction::PgTransactor;
use crate::infrastructure::config::{AppConfig, StorageBackend};
use crate::infrastructure::database::connect;
use crate::presentation::handlers;
use crate::presentation::middleware::RequestTracing;
use crate::presentation::utils::{json_config, path_config};
use actix_cors::Cors;
use actix_web::middleware::{DefaultHeaders, Logger};
use actix_web::{App, HttpResponse, HttpServer, Responder, web};
use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::PgPool;
use std::sync::Arc;
use tracing::info;

/// Everything the HTTP layer needs, independent of the storage backend.
#[derive(Clone)]
pub struct UseCases {
    pub posts: Arc<dyn PostUseCase>,
    pub categories: Arc<dyn CategoryUseCase>,
}

impl UseCases {
    pub fn in_memory(store: InMemoryStore, collaborators: Collaborators) -> Self {
        let store = Arc::new(store);
        let posts = PostService::new(
            Arc::clone(&store),
            Arc::clone(&store),
            Arc::clone(&store),
            Arc::clone(&store),
            collaborators.clone(),
        );
        let categories = CategoryService::new(
            Arc::clone(&store),
            Arc::clone(&store),
            store,
            collaborators,
        );
        Self {
            posts: Arc::new(posts),
            categories: Arc::new(categories),
        }
    }

    pub fn postgres(pool: PgPool, collaborators: Collaborators) -> Self {
        let transactor = Arc::new(PgTransactor::new(pool.clone()));
        let post_repo = Arc::new(PostgresPostRepository::new(pool.clone()));
        let version_repo = Arc::new(PostgresPostVersionRepository::new(pool.clone()));
        let category_repo = Arc::new(PostgresCategoryRepository::new(pool));

        let posts = PostService::new(
            Arc::clone(&transactor),
            post_repo,
            Arc::clone(&version_repo),
            Arc::clone(&category_repo),
            collaborators.clone(),
        );
        let categories =
            CategoryService::new(transactor, version_repo, category_repo, collaborators);
        Self {
            posts: Arc::new(posts),
            categories: Arc::new(categories),
        }
    }

    pub async fn from_config(config: &AppConfig) -> anyhow::Result<Self> {
        match config.storage {
            StorageBackend::Memory => {
                info!("using in-memory storage");
                Ok(Self::in_memory(InMemoryStore::new(), Collaborators::default()))
            }
            StorageBackend::Postgres => {
                let pool = connect(config).await?;
                Ok(Self::postgres(pool, Collaborators::default()))
            }
        }
    }
}

/// Routes and extractor settings shared by the server and the HTTP tests.
pub fn configure(use_cases: UseCases) -> impl FnOnce(&mut web::ServiceConfig) {
    move |cfg: &mut web::ServiceConfig| {
        cfg.app_data(web::Data::from(use_cases.posts))
            .app_data(web::Data::from(use_cases.categories))
            .app_data(path_config())
            .app_data(json_config())
            .service(
                web::scope("/api")
                    .route("/health", web::get().to(health))
                    .service(handlers::post::scope())
                    .service(handlers::category::scope()),
            );
    }
}

pub async fn start_rest_server(config: AppConfig, use_cases: UseCases) -> anyhow::Result<()> {
    let bind_address = (config.host.clone(), config.port);
    info!(host = %bind_address.0, port = bind_address.1, "HTTP server starting");

    HttpServer::new(move || {
        let cors = build_cors(&config);

        App::new()
            .wrap(Logger::default())
            .wrap(RequestTracing)
            .wrap(
                DefaultHeaders::new()
                    .add(("X-Content-Type-Options", "nosniff"))
                    .add(("Referrer-Policy", "no-referrer"))
                    .add(("Permissions-Policy", "geolocation=()"))
                    .add(("Cross-Origin-Opener-Policy", "same-origin")),
            )
            .wrap(cors)
            .configure(configure(use_cases.clone()))
    })
    .bind(bind_address)?
    .run()
    .await
    .map_err(anyhow::Error::new)?;

    Ok(())
}

fn build_cors(config: &AppConfig) -> Cors {
    let mut cors = Cors::default()
        .allowed_methods(vec!["GET", "POST", "PUT", "DELETE"])
        .allowed_headers(vec![actix_web::http::header::CONTENT_TYPE])
        .max_age(3600);

    for origin in &config.cors_origins {
        cors = cors.allowed_origin(origin);
    }

    cors
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub timestamp: DateTime<Utc>,
}

async fn health() -> impl Responder {
    HttpResponse::Ok().json(HealthResponse {
        status: "ok",
        timestamp: Utc::now(),
    })
}
