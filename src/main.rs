// src/main.rs

use evm_tx_registry::{
    api::create_app,
    config::Config,
    mcp::{
        handler::handle_mcp_request,
        protocol::{error_codes, Request, Response},
    },
    AppState,
};
use std::env;
use std::net::SocketAddr;
use tokio::io::{self, AsyncBufReadExt, AsyncWriteExt};
use tracing::{debug, error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

// --- HTTP Server Logic ---
async fn run_http_server(state: AppState) -> anyhow::Result<()> {
    let addr = SocketAddr::new(state.config.bind_address, state.config.port);
    let default_chain = state.config.default_chain;
    let app = create_app(state);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!("🚀 HTTP Server listening on {}", addr);
    info!("🔗 Health check: http://{}/api/health", addr);
    info!("🔗 Pending transactions: http://{}/api/transactions/pending", addr);
    info!("🌐 Default network: {}", default_chain.as_str().to_uppercase());

    axum::serve(listener, app.into_make_service_with_connect_info::<SocketAddr>()).await?;
    Ok(())
}

// --- MCP Server Logic ---
async fn run_mcp_server(state: AppState) {
    info!("🚀 Starting MCP server on stdin/stdout...");

    let mut stdin = io::BufReader::new(io::stdin());
    let mut stdout = io::stdout();

    loop {
        let mut line = String::new();

        match stdin.read_line(&mut line).await {
            Ok(0) => {
                info!("EOF received, shutting down MCP server");
                break;
            }
            Ok(_) => {
                let line = line.trim();
                if line.is_empty() {
                    continue;
                }

                debug!("Received: {}", line);

                let response = match serde_json::from_str::<Request>(line) {
                    Ok(request) => handle_mcp_request(request, state.clone()).await,
                    Err(parse_error) => {
                        error!("JSON parse error: {}", parse_error);
                        Some(Response::error(
                            serde_json::Value::Null,
                            error_codes::PARSE_ERROR,
                            format!("Parse error: {}", parse_error),
                        ))
                    }
                };

                let Some(response) = response else { continue };
                match serde_json::to_string(&response) {
                    Ok(response_json) => {
                        debug!("Sending: {}", response_json);
                        let mut written = stdout
                            .write_all(format!("{}\n", response_json).as_bytes())
                            .await;
                        if written.is_ok() {
                            written = stdout.flush().await;
                        }
                        if let Err(e) = written {
                            error!("Failed to write response: {}", e);
                            break;
                        }
                    }
                    Err(e) => error!("Failed to serialize response: {}", e),
                }
            }
            Err(e) => {
                error!("Failed to read from stdin: {}", e);
                break;
            }
        }
    }

    info!("MCP server shutting down");
}

#[tokio::main]
async fn main() {
    // Logs go to stderr so stdout stays a clean JSON-RPC channel in MCP mode
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "evm_tx_registry=debug,tx_registry=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    // Load configuration
    let config = match Config::from_env() {
        Ok(cfg) => cfg,
        Err(e) => {
            error!("❌ Failed to load configuration: {:#}", e);
            return;
        }
    };

    if !config.chain_address_rules.is_empty() {
        info!("Loaded {} configured chain routing rule(s)", config.chain_address_rules.len());
    }

    let app_state = AppState::new(config);

    // Check if running in MCP mode (stdin/stdout) or HTTP server mode
    let args: Vec<String> = env::args().collect();
    if args.iter().any(|a| a == "--mcp") || env::var("MCP_MODE").is_ok() {
        run_mcp_server(app_state).await;
    } else if let Err(e) = run_http_server(app_state).await {
        error!("❌ HTTP server error: {:#}", e);
    }
}
