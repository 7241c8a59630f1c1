use tokio::net::TcpListener;

#[tokio::main]
async fn main() -> Result<(), std::io::Error> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let coordinator_port = std::env::var("COORDINATOR_PORT").unwrap_or_else(|_| "50070".to_string());
    let worker_port = std::env::var("WORKER_PORT").unwrap_or_else(|_| "50075".to_string());
    let advertised_host = std::env::var("ADVERTISED_HOST").unwrap_or_else(|_| "127.0.0.1".to_string());

    let coordinator = TcpListener::bind(format!("127.0.0.1:{coordinator_port}")).await?;
    let worker = TcpListener::bind(format!("127.0.0.1:{worker_port}")).await?;
    tracing::info!(
        coordinator = %coordinator.local_addr()?,
        worker = %worker.local_addr()?,
        %advertised_host,
        "listening"
    );
    mock_server::run(coordinator, worker, &advertised_host).await
}
