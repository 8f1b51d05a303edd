use clap::Parser;
use skrate::{
    config::{Cli, Command, ServeArgs},
    load_data, router,
    storage::persist_data,
    tricks::seed_tricks,
    AppState,
};
use std::path::Path;
use tracing::info;
use tracing_subscriber::{fmt, EnvFilter};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive(cli.log_directive().parse()?))
        .init();

    match cli.selected_command() {
        Command::DatabaseSetup => database_setup(&cli.data_path).await,
        Command::Serve(args) => serve(&cli.data_path, args).await,
    }
}

async fn database_setup(data_path: &Path) -> Result<(), Box<dyn std::error::Error>> {
    info!("setting up data file {}", data_path.display());
    let mut data = load_data(data_path).await;
    let added = seed_tricks(&mut data);
    persist_data(data_path, &data)
        .await
        .map_err(|err| err.message)?;
    info!("setup complete, {added} tricks added");
    Ok(())
}

async fn serve(data_path: &Path, args: ServeArgs) -> Result<(), Box<dyn std::error::Error>> {
    let mut data = load_data(data_path).await;
    if data.tricks.is_empty() {
        seed_tricks(&mut data);
        persist_data(data_path, &data)
            .await
            .map_err(|err| err.message)?;
    }
    let state = AppState::new(data_path.to_path_buf(), data);
    let app = router(state);

    let addr = args.addr();
    info!("listening on http://{addr}");
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("shut down");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        tracing::error!("failed to listen for ctrl-c: {err}");
        std::future::pending::<()>().await;
    }
}
