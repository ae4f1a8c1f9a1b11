use anyhow::Context;
use clap::Parser;
use dotenv::dotenv;
use mcp_for_azure_devops_timelogs::azure::client::AzureDevOpsClient;
use mcp_for_azure_devops_timelogs::config::{Config, Settings};
use mcp_for_azure_devops_timelogs::mcp::server::AzureMcpServer;
use mcp_for_azure_devops_timelogs::server::http;
use rmcp::ServiceExt;
use rmcp::transport::stdio;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Run in server mode
    #[arg(long)]
    server: bool,

    /// Address to bind in server mode
    #[arg(long, default_value = "0.0.0.0")]
    host: String,

    /// Port to run the server on
    #[arg(long, default_value_t = 3000)]
    port: u16,

    /// Settings file (defaults to <config dir>/azure-devops-mcp/config.toml)
    #[arg(long, env = "AZURE_DEVOPS_CONFIG")]
    config: Option<PathBuf>,

    /// Organization URL, e.g. https://dev.azure.com/contoso
    #[arg(long, env = "AZURE_DEVOPS_ORG_URL")]
    org_url: Option<String>,

    /// pat, azure-identity or azure-cli
    #[arg(long, env = "AZURE_DEVOPS_AUTH_METHOD")]
    auth_method: Option<String>,

    /// Personal access token, used with --auth-method pat
    #[arg(long, env = "AZURE_DEVOPS_PAT", hide_env_values = true)]
    pat: Option<String>,

    /// Account name used to look up the current user
    #[arg(long, env = "AZURE_DEVOPS_USERNAME")]
    username: Option<String>,

    /// Project used when a tool call does not name one
    #[arg(long, env = "AZURE_DEVOPS_DEFAULT_PROJECT")]
    default_project: Option<String>,
}

impl Args {
    fn settings(&self) -> Settings {
        Settings {
            org_url: self.org_url.clone(),
            auth_method: self.auth_method.clone(),
            pat: self.pat.clone(),
            username: self.username.clone(),
            default_project: self.default_project.clone(),
        }
    }
}

fn load_config(args: &Args) -> anyhow::Result<Config> {
    let file_settings = match &args.config {
        Some(path) => Settings::load(path)
            .with_context(|| format!("Failed to load settings from {}", path.display()))?,
        None => match Settings::default_path().filter(|path| path.exists()) {
            Some(path) => {
                log::debug!("Loading settings from {}", path.display());
                Settings::load(&path)?
            }
            None => Settings::default(),
        },
    };

    Config::try_from(args.settings().or(file_settings)).context("Invalid configuration")
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv().ok();
    env_logger::init();
    let args = Args::parse();

    let config = load_config(&args)?;
    log::info!(
        "Using organization {} ({:?} auth)",
        config.org_name(),
        config.auth_method
    );

    let client = AzureDevOpsClient::new(config);
    let mcp_server = AzureMcpServer::new(client);

    if args.server {
        log::info!("Starting web server on {}:{}", args.host, args.port);
        http::run_server(mcp_server, &args.host, args.port)
            .await
            .context("HTTP server failed")?;
    } else {
        log::info!("Starting stdio server");
        let service = mcp_server
            .serve(stdio())
            .await
            .context("Failed to start stdio server")?;
        service.waiting().await?;
    }

    Ok(())
}
