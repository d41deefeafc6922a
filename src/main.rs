use clap::{Args, Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use bitbucket_pr_mcp::{api, bitbucket::BitbucketClient, config::Config, mcp};

#[derive(Parser)]
#[command(name = "rpr")]
#[command(about = "Bitbucket Server pull requests over REST and MCP")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Used when no subcommand is given
    #[command(flatten)]
    serve: ServeArgs,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the HTTP server (REST API and MCP endpoint)
    Serve(ServeArgs),
    /// Start MCP server via stdio
    Mcp,
}

#[derive(Args, Debug, Clone, PartialEq, Eq)]
struct ServeArgs {
    /// Address to bind
    #[arg(long, env = "RPR_HOST", default_value = "0.0.0.0")]
    host: String,

    /// Port for HTTP API
    #[arg(short, long, env = "RPR_PORT", default_value = "8000")]
    port: u16,
}

/// Initialize tracing with output to stderr (for MCP mode) or stdout
fn init_tracing(use_stderr: bool) {
    let filter = tracing_subscriber::EnvFilter::new(
        std::env::var("RUST_LOG")
            .unwrap_or_else(|_| "bitbucket_pr_mcp=debug,tower_http=debug".into()),
    );

    if use_stderr {
        // MCP mode: log to stderr so stdout is clean for protocol
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer())
            .init();
    }
}

async fn serve(ServeArgs { host, port }: ServeArgs) -> anyhow::Result<()> {
    let config = Config::from_env()?;
    tracing::info!("Proxying Bitbucket Server at {}", config.base_url);
    let client = BitbucketClient::new(&config)?;

    let app = api::create_router(client);

    let listener = tokio::net::TcpListener::bind(format!("{}:{}", host, port)).await?;
    tracing::info!("Listening on http://{}:{}", host, port);
    tracing::info!("MCP endpoint at http://{}:{}{}", host, port, api::MCP_MOUNT);

    axum::serve(listener, app).await?;
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env before clap so RPR_* variables there are honoured too
    dotenv::dotenv().ok();
    let cli = Cli::parse();

    // MCP mode needs stderr for logging since stdout is the protocol channel
    let use_stderr = matches!(cli.command, Some(Commands::Mcp));
    init_tracing(use_stderr);

    match cli.command {
        Some(Commands::Serve(args)) => serve(args).await?,
        Some(Commands::Mcp) => {
            let config = Config::from_env()?;
            let client = BitbucketClient::new(&config)?;

            mcp::run_stdio_server(client).await?;
        }
        None => serve(cli.serve).await?,
    }

    Ok(())
}
