use log::{Level, error, info, logger};
use slipstream::{config, pattern_byte};
use slipstream_log::SlipstreamLogger;
use slipwire::SendSession;
use slipwire::endpoint::{LossyEndpoint, UdpEndpoint};
use std::env;
use std::net::SocketAddr;
use std::process;
use tokio::net::lookup_host;
use tokio::time::Instant;

#[tokio::main]
async fn main() {
    SlipstreamLogger::init(Level::Info, 1024).expect("logger already installed");

    let mut args = env::args().skip(1);
    let (host, port) = match (args.next(), args.next().and_then(|arg| arg.parse().ok())) {
        (Some(host), Some(port)) => (host, port),
        _ => {
            eprintln!("usage: sender <host> <port>");
            process::exit(2);
        }
    };

    let config = match config::handle() {
        Ok(config) => config,
        Err(err) => {
            error!("configuration: {err}");
            process::exit(1);
        }
    };

    let session = match open_session(&host, port, &config).await {
        Ok(session) => session,
        Err(err) => {
            error!("cannot open session: {err}");
            process::exit(1);
        }
    };

    info!(
        "sending {} payloads of {} bytes to {host}:{port}",
        config.transfer.payload_count, config.transfer.payload_size
    );

    let start = Instant::now();
    for i in 0..config.transfer.payload_count {
        let payload = vec![pattern_byte(i); config.transfer.payload_size];
        session.submit(&payload).await;
    }
    session.flush().await;

    info!(
        "transfer of {} payloads took {:.3}s",
        config.transfer.payload_count,
        start.elapsed().as_secs_f64()
    );
    logger().flush();
}

async fn open_session(
    host: &str,
    port: u16,
    config: &config::Config,
) -> Result<SendSession<LossyEndpoint<UdpEndpoint>>, Box<dyn std::error::Error>> {
    let peer: SocketAddr = lookup_host((host, port))
        .await?
        .next()
        .ok_or_else(|| format!("no address for {host}"))?;
    let endpoint = LossyEndpoint::new(UdpEndpoint::ephemeral().await?, config.loss.probability);
    Ok(SendSession::with_endpoint(
        endpoint,
        peer,
        config.window.send,
    )?)
}
