//! ALwrity: outline planning, section generation and content version server.

use std::path::PathBuf;
use std::sync::Arc;

use tower_http::trace::TraceLayer;
use tracing::info;
use tracing_subscriber::EnvFilter;

mod error;
mod routes;
mod state;

use state::AppState;

fn resolve_data_dir() -> PathBuf {
    std::env::var("ALWRITY_DATA_DIR")
        .map(PathBuf::from)
        .unwrap_or_else(|_| {
            let exe_dir = std::env::current_exe()
                .ok()
                .and_then(|p| p.parent().map(|p| p.to_path_buf()));
            if let Some(dir) = exe_dir {
                let parent_data = dir.join("../data");
                if parent_data.exists() {
                    return parent_data;
                }
            }
            PathBuf::from("data")
        })
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let args: Vec<String> = std::env::args().collect();
    let mut data_dir = resolve_data_dir();

    if args.len() > 1 {
        match args[1].as_str() {
            "--data-dir" => {
                let Some(dir) = args.get(2) else {
                    eprintln!("Usage: alwrity --data-dir <dir>");
                    std::process::exit(1);
                };
                data_dir = PathBuf::from(dir);
            }
            "--help" | "-h" | "help" => {
                println!("ALwrity: AI content outline and version server");
                println!();
                println!("Usage: alwrity [--data-dir <dir>]");
                println!();
                println!("Environment:");
                println!("  PORT                 HTTP port (default 3004)");
                println!("  ALWRITY_DATA_DIR     Data directory (default ./data)");
                println!("  OPENAI_API_KEY       OpenAI key, if not set in llm-config.json");
                println!("  GEMINI_API_KEY       Gemini key, if not set in llm-config.json");
                println!("  GSC_ACCESS_TOKEN     Search Console OAuth access token");
                println!("  GSC_SITE_URL         Search Console property URL");
                println!("  RUST_LOG             Log filter (default info)");
                return Ok(());
            }
            _ => {
                eprintln!("Unknown command: {}. Use 'alwrity help' for usage.", args[1]);
                std::process::exit(1);
            }
        }
    }

    info!("Data directory: {}", data_dir.display());

    let config = alwrity_core::AlwrityConfig::from_env(&data_dir)?;
    let port = config.port;

    let versions = alwrity_store::SqliteVersionStore::open(&config.data_paths.db)
        .map_err(|e| anyhow::anyhow!("Failed to open version store: {}", e))?;

    let analytics = alwrity_providers::SearchConsoleClient::new(
        alwrity_providers::AnalyticsConfig::from_env(),
    );

    let state = Arc::new(AppState::new(
        config,
        Arc::new(versions),
        Arc::new(analytics),
        Arc::new(alwrity_core::SystemClock),
    ));

    let app = routes::build_router(state).layer(TraceLayer::new_for_http());

    let addr = format!("0.0.0.0:{}", port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!("ALwrity server listening on {}", addr);

    axum::serve(listener, app).await?;

    Ok(())
}
