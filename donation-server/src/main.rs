use donation_server::{Server, ServerState, print_banner, setup_environment};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // 1. Environment (dotenv, working directory, logging)
    let config = setup_environment()?;

    print_banner();
    tracing::info!("Donation server starting...");

    // 2. Initialize state (database, gateway adapter, JWT)
    let state = ServerState::initialize(&config).await?;

    // 3. Run the HTTP server until shutdown
    let server = Server::with_state(config, state);
    if let Err(e) = server.run().await {
        tracing::error!("Server error: {}", e);
        return Err(e.into());
    }

    Ok(())
}
