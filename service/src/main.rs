use axum::error_handling::HandleErrorLayer;
use common::render::LIBRE;
use common::util::state::{GenerationSettings, S3BaseSettings, Settings};
use reqwest::StatusCode;
use service::routes;
use service::state::ServiceCollection;
use std::env;
use std::net::{IpAddr, Ipv6Addr, SocketAddr};
use std::path::PathBuf;
use std::time::Duration;
use tower::{timeout::TimeoutLayer, ServiceBuilder};
use tower_http::trace::TraceLayer;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();
    let subscriber = tracing_subscriber::fmt()
        .json()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .finish();
    tracing::subscriber::set_global_default(subscriber).expect("Could not init tracing.");

    let settings = Settings {
        generation: GenerationSettings {
            api_url: get_string("GENERATION_API_URL", ""),
            api_token: get_string("GENERATION_API_TOKEN", ""),
            poll_interval: get_seconds("POLL_INTERVAL_SECONDS", 2),
            max_wait: get_seconds("MAX_WAIT_SECONDS", 120),
            submit_timeout: get_seconds("SUBMIT_TIMEOUT_SECONDS", 60),
            poll_timeout: get_seconds("POLL_TIMEOUT_SECONDS", 30),
            download_timeout: get_seconds("DOWNLOAD_TIMEOUT_SECONDS", 20),
        },
        s3: S3BaseSettings {
            endpoint: get_string("S3_ENDPOINT", "http://localhost:9000"),
            region: get_string("S3_REGION", "us-east-1"),
            access_key_id: get_string("S3_ACCESS_KEY_ID", ""),
            secret_access_key: get_string("S3_SECRET_ACCESS_KEY", ""),
            bucket: get_string("S3_BUCKET", "images"),
            public_url: get_public_url(),
            expire_seconds: get_max_age(),
        },
        output_dir: PathBuf::from(get_string("OUTPUT_DIR", "static/generated_images")),
        soffice_path: PathBuf::from(get_string("SOFFICE_PATH", LIBRE)),
        render_timeout: get_seconds("RENDER_TIMEOUT_SECONDS", 30),
    };
    let request_timeout = settings.generation.max_wait + Duration::from_secs(60);

    let missing = settings.missing_configuration();
    if !missing.is_empty() {
        warn!("Missing configuration, generation is disabled: {:?}", missing);
    }

    let services = ServiceCollection::build(settings).unwrap();

    let app = routes::create_router(services).layer(
        ServiceBuilder::new()
            .layer(TraceLayer::new_for_http())
            .layer(HandleErrorLayer::new(|_| async { StatusCode::REQUEST_TIMEOUT }))
            .layer(TimeoutLayer::new(request_timeout)),
    );

    let addr = SocketAddr::new(IpAddr::V6(Ipv6Addr::new(0, 0, 0, 0, 0, 0, 0, 0)), get_port());
    info!("listening on {}", &addr);
    axum::Server::bind(&addr).serve(app.into_make_service()).await.unwrap();
}

fn get_string(name: &str, default: &str) -> String {
    env::var(name).unwrap_or_else(|_| default.to_string())
}

fn get_seconds(name: &str, default: u64) -> Duration {
    let seconds = env::var(name).map(|seconds| seconds.parse::<u64>());

    let seconds = match seconds {
        Ok(Ok(seconds)) => seconds,
        _ => default,
    };
    Duration::from_secs(seconds)
}

fn get_max_age() -> u32 {
    match env::var("MAX_AGE_SECONDS").map(|expire| expire.parse::<u32>()) {
        Ok(Ok(max_age)) => max_age,
        _ => 60 * 60 * 25,
    }
}

fn get_public_url() -> Option<String> {
    env::var("S3_PUBLIC_URL").ok().filter(|url| !url.trim().is_empty())
}

fn get_port() -> u16 {
    match env::var("PORT").map(|port| port.parse::<u16>()) {
        Ok(Ok(port)) => port,
        _ => 8000,
    }
}
