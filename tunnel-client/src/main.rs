use std::process::ExitCode;
use std::time::Duration;

use clap::Parser;

use tunnel_client::args::Args;
use tunnel_client::supervisor;

const RECONNECT_DELAY: Duration = Duration::from_secs(1);

/// `--maxconn 0` means "use the default", same as an unset `maxCount` in
/// the original client.
const DEFAULT_MAXCONN: u32 = 50;

#[tokio::main]
async fn main() -> ExitCode {
    let args = Args::parse();
    tunnel_common::logging::init(args.debug);
    let maxconn = if args.maxconn == 0 { DEFAULT_MAXCONN } else { args.maxconn };
    tracing::info!(tunnel = %args.tunnel, proxy = %args.proxy, maxconn, "tunnel client starting");

    let reconnect_loop = async {
        loop {
            if let Err(err) = supervisor::run(args.tunnel, maxconn, args.proxy, args.rate_limit_kbps).await {
                tracing::info!(%err, "tunnel connection lost, reconnecting");
            }
            tokio::time::sleep(RECONNECT_DELAY).await;
        }
    };

    tokio::select! {
        _ = reconnect_loop => {}
        _ = tokio::signal::ctrl_c() => {
            tracing::info!("shutting down");
        }
    }

    ExitCode::SUCCESS
}
