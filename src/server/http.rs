use crate::mcp::server::AzureMcpServer;
use hyper_util::{
    rt::{TokioExecutor, TokioIo},
    server::conn::auto::Builder,
    service::TowerToHyperService,
};
use rmcp::transport::streamable_http_server::{
    StreamableHttpService, session::local::LocalSessionManager,
};

/// Serves the MCP endpoint over streamable HTTP until the listener fails.
pub async fn run_server(server: AzureMcpServer, host: &str, port: u16) -> std::io::Result<()> {
    let service = TowerToHyperService::new(StreamableHttpService::new(
        move || Ok(server.clone()),
        LocalSessionManager::default().into(),
        Default::default(),
    ));

    let addr = format!("{}:{}", host, port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    log::info!("Listening on http://{}", addr);

    loop {
        let (stream, peer) = listener.accept().await?;
        log::debug!("Accepted connection from {}", peer);
        let io = TokioIo::new(stream);
        let service = service.clone();

        tokio::spawn(async move {
            if let Err(err) = Builder::new(TokioExecutor::default())
                .serve_connection(io, service)
                .await
            {
                log::error!("Error serving connection from {}: {:?}", peer, err);
            }
        });
    }
}
