//! fstools MCP server binary.
//!
//! Exposes sandboxed, read-only filesystem tools to MCP clients.
//!
//! Usage:
//!   # stdio transport (spawned by an MCP client)
//!   cargo run -p fstools-mcp -- --root /app/ai-filesystem-agent
//!
//!   # streamable HTTP on 0.0.0.0:8000/mcp
//!   cargo run -p fstools-mcp -- --transport http --config fstools.toml
//!
//! Test with MCP inspector:
//!   npx @modelcontextprotocol/inspector cargo run -p fstools-mcp

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Result;
use clap::{Parser, ValueEnum};
use rmcp::transport::streamable_http_server::{
    StreamableHttpService, session::local::LocalSessionManager,
};
use rmcp::{ServiceExt, transport::stdio};
use tracing_subscriber::{EnvFilter, fmt};

use fstools_kernel::{SandboxConfig, SandboxSettings};
use fstools_mcp::FsToolsMcp;

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum Transport {
    /// MCP over stdin/stdout
    Stdio,
    /// Streamable HTTP under /mcp
    Http,
}

/// MCP server for sandboxed filesystem tools.
#[derive(Parser, Debug)]
#[command(name = "fstools-mcp")]
#[command(about = "MCP server exposing read-only, sandboxed filesystem tools")]
struct Args {
    /// TOML config file; flags below override its values
    #[arg(short, long)]
    config: Option<String>,

    /// Sandbox root directory
    #[arg(long)]
    root: Option<String>,

    /// Entry name to hide from listings and searches (repeatable, replaces the defaults)
    #[arg(long = "exclude")]
    exclude: Vec<String>,

    /// File name whose content is never readable
    #[arg(long)]
    protected_name: Option<String>,

    /// Location of the protected file used by verify_flag
    #[arg(long)]
    protected_path: Option<String>,

    /// Maximum size in bytes for get_file_content
    #[arg(long)]
    max_file_size: Option<u64>,

    /// Upper clamp for get_file_head
    #[arg(long)]
    max_head_lines: Option<usize>,

    /// Per-operation timeout in seconds
    #[arg(long)]
    timeout_secs: Option<u64>,

    /// Transport to serve
    #[arg(long, value_enum, default_value_t = Transport::Stdio)]
    transport: Transport,

    /// Listen address for --transport http
    #[arg(long, default_value = "0.0.0.0:8000")]
    bind: SocketAddr,
}

impl Args {
    fn overrides(&self) -> SandboxSettings {
        SandboxSettings {
            root: self.root.clone(),
            excluded: (!self.exclude.is_empty()).then(|| self.exclude.clone()),
            protected_name: self.protected_name.clone(),
            protected_path: self.protected_path.clone(),
            max_file_size: self.max_file_size,
            max_head_lines: self.max_head_lines,
            timeout_secs: self.timeout_secs,
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing to stderr (stdio transport uses stdout for protocol)
    fmt()
        .with_env_filter(
            EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into())
        )
        .with_writer(std::io::stderr)
        .with_ansi(false)
        .init();

    let args = Args::parse();

    let file_settings = match &args.config {
        Some(path) => SandboxSettings::load(path)?,
        None => SandboxSettings::default(),
    };
    let config = SandboxConfig::from_settings(file_settings.merge(args.overrides()))?;
    tracing::info!(
        root = %config.root().display(),
        excluded = ?config.excluded().iter().collect::<Vec<_>>(),
        protected = %config.protected().name,
        "Sandbox configured"
    );

    let mcp = FsToolsMcp::new(Arc::new(config));
    match args.transport {
        Transport::Stdio => serve_stdio(mcp).await,
        Transport::Http => serve_http(mcp, args.bind).await,
    }
}

async fn serve_stdio(mcp: FsToolsMcp) -> Result<()> {
    let service = mcp
        .serve(stdio())
        .await
        .inspect_err(|e| {
            tracing::error!("MCP server error: {:?}", e);
        })?;

    tracing::info!("fstools-mcp server ready on stdio");

    service.waiting().await?;

    tracing::info!("fstools-mcp server shutting down");
    Ok(())
}

async fn serve_http(mcp: FsToolsMcp, bind: SocketAddr) -> Result<()> {
    let service = StreamableHttpService::new(
        move || Ok(mcp.clone()),
        LocalSessionManager::default().into(),
        Default::default(),
    );
    let router = axum::Router::new().nest_service("/mcp", service);

    let listener = tokio::net::TcpListener::bind(bind).await?;
    tracing::info!(%bind, "fstools-mcp server ready on http://{}/mcp", bind);

    axum::serve(listener, router)
        .with_graceful_shutdown(async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                tracing::error!("failed to listen for shutdown signal: {}", e);
            }
        })
        .await?;

    tracing::info!("fstools-mcp server shutting down");
    Ok(())
}
