use blog_publisher::infrastructure::config::AppConfig;
use blog_publisher::infrastructure::logging::init_logging;
use blog_publisher::server::{UseCases, start_rest_server};

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    let config = AppConfig::from_env()?;
    init_logging(&config);

    let use_cases = UseCases::from_config(&config).await?;

    start_rest_server(config, use_cases).await
}
