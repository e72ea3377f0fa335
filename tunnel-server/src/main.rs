use std::process::ExitCode;

use clap::Parser;
use tokio::net::TcpListener;

use tunnel_server::args::Args;
use tunnel_server::session::SessionSlot;
use tunnel_server::{acceptor, user_acceptor};

#[tokio::main]
async fn main() -> ExitCode {
    let args = Args::parse();
    tunnel_common::logging::init(args.debug);

    let tunnel_listener = match TcpListener::bind(args.tunnel).await {
        Ok(listener) => listener,
        Err(err) => {
            tracing::error!(addr = %args.tunnel, %err, "failed to bind tunnel listener");
            return ExitCode::FAILURE;
        }
    };

    let user_listener = match TcpListener::bind(args.listen).await {
        Ok(listener) => listener,
        Err(err) => {
            tracing::error!(addr = %args.listen, %err, "failed to bind user listener");
            return ExitCode::FAILURE;
        }
    };

    tracing::info!(listen = %args.listen, tunnel = %args.tunnel, "tunnel server starting");

    let slot = SessionSlot::new();

    let acceptor_task = tokio::spawn(acceptor::run(tunnel_listener, slot.clone()));
    let user_acceptor_task = tokio::spawn(user_acceptor::run(user_listener, slot));

    tokio::select! {
        _ = acceptor_task => {}
        _ = user_acceptor_task => {}
        _ = tokio::signal::ctrl_c() => {
            tracing::info!("shutting down");
        }
    }

    ExitCode::SUCCESS
}
