use log::{Level, error, info, logger};
use slipstream::{config, pattern_byte};
use slipstream_log::SlipstreamLogger;
use slipwire::ReceiveSession;
use slipwire::consts::PAYLOAD_MAX;
use slipwire::endpoint::{LossyEndpoint, UdpEndpoint};
use std::env;
use std::process;
use std::time::Duration;

#[tokio::main]
async fn main() {
    SlipstreamLogger::init(Level::Info, 1024).expect("logger already installed");

    let port = match env::args().nth(1).and_then(|arg| arg.parse().ok()) {
        Some(port) => port,
        None => {
            eprintln!("usage: receiver <port>");
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

    let mut session = match open_session(port, &config).await {
        Ok(session) => session,
        Err(err) => {
            error!("cannot open session: {err}");
            process::exit(1);
        }
    };

    info!(
        "expecting {} payloads of {} bytes on port {port}",
        config.transfer.payload_count, config.transfer.payload_size
    );

    let mut buf = [0u8; PAYLOAD_MAX];
    for i in 0..config.transfer.payload_count {
        let len = session.recv(&mut buf).await;

        if i % 100 == 0 {
            info!("received payload {i}");
            logger().flush();
        }

        if len != config.transfer.payload_size {
            error!(
                "length error at payload {i}: expected {}, received {len}",
                config.transfer.payload_size
            );
            process::exit(1);
        }

        if let Some(position) = buf[..len].iter().position(|&b| b != pattern_byte(i)) {
            error!(
                "data error at payload {i} position {position}: expected {:#04x}, received {:#04x}",
                pattern_byte(i),
                buf[position]
            );
            process::exit(1);
        }
    }

    info!("all {} payloads verified", config.transfer.payload_count);
    logger().flush();

    // linger so retransmitted tails still get re-ACKed
    tokio::time::sleep(Duration::from_secs(1)).await;
}

async fn open_session(
    port: u16,
    config: &config::Config,
) -> Result<ReceiveSession<LossyEndpoint<UdpEndpoint>>, Box<dyn std::error::Error>> {
    let endpoint = LossyEndpoint::new(UdpEndpoint::bind(port).await?, config.loss.probability);
    Ok(ReceiveSession::with_endpoint(
        endpoint,
        config.window.receive,
    )?)
}
