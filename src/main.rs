use anyhow::Result;

use logsink::actor::RateLimiterActor;
use logsink::appender::LogAppender;
use logsink::config::Config;
use logsink::limiter::RateLimiter;
use logsink::server::IngestServer;

#[tokio::main]
async fn main() -> Result<()> {
    // Resolve configuration from CLI arguments, environment variables,
    // and the optional settings file
    let config = Config::from_env_and_args()?;

    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(format!("logsink={}", config.log_level).parse()?),
        )
        .init();

    // Spawn the two actors owning the shared state: the per-client
    // admission map and the log file
    let limiter = RateLimiterActor::spawn(config.buffer_size, RateLimiter::new(config.rate_limit));
    let appender = LogAppender::spawn(config.log_file.clone(), config.buffer_size);

    // Bind failure is fatal; nothing is retried
    let server = IngestServer::bind(&config, limiter, appender).await?;

    tracing::info!(
        "logsink started: appending to {}, rate limit {}s, timestamps in {}",
        config.log_file.display(),
        config.rate_limit.as_secs(),
        config.timezone,
    );

    server.serve().await
}
