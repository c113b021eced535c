use log::{Level, error};
use slipstream::config;
use slipstream_log::SlipstreamLogger;
use slipwire::ReceiveSession;
use slipwire::consts::PAYLOAD_MAX;
use std::env;
use std::process;

#[tokio::main]
async fn main() {
    SlipstreamLogger::init(Level::Info, 1024).expect("logger already installed");

    let port = match env::args().nth(1).and_then(|arg| arg.parse().ok()) {
        Some(port) => port,
        None => {
            eprintln!("usage: echo <port>");
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

    let mut session = match ReceiveSession::bind(port, config.window.receive).await {
        Ok(session) => session,
        Err(err) => {
            error!("cannot open session: {err}");
            process::exit(1);
        }
    };

    let mut buf = [0u8; PAYLOAD_MAX];
    loop {
        let len = session.recv(&mut buf).await;
        println!("payload received: {}", String::from_utf8_lossy(&buf[..len]));
    }
}
