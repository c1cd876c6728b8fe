//! Server entrypoint: wires the configuration store, the keyboard/mouse
//! engines, the dispatcher, and the `InputMethods` RPC service onto a
//! multi-threaded runtime, then serves until shutdown.
//!
//! Grounded on `examples/original_source/app/main.py` for the bootstrap
//! order (config before logging level, host rewrite, thread-pool sizing)
//! and on the teacher's `main.rs` for how a binary wires its components
//! before handing off to a blocking run loop.

use std::net::{SocketAddr, ToSocketAddrs};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use hid_input_server::config::{self, ConfigStore};
use hid_input_server::dispatcher::Dispatcher;
use hid_input_server::hid_writer::HidWriter;
use hid_input_server::keyboard::Keyboard;
use hid_input_server::mouse::Mouse;
use hid_input_server::rpc::proto::input_methods_server::InputMethodsServer;
use hid_input_server::rpc::InputMethodsService;
use tonic::transport::Server;

/// Command-line flags for the HID input server.
#[derive(Debug, Parser)]
#[command(author, version, about)]
struct Args {
    /// Number of worker threads serving RPC handlers.
    #[arg(long, default_value_t = 10)]
    workers: usize,

    /// Config file path, overriding the default cwd-then-$HOME lookup.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Listen address (`host:port`), overriding the config file's `host`
    /// and `port`.
    #[arg(long)]
    listen: Option<String>,
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let config = Arc::new(ConfigStore::load_from(args.config.clone())?);
    init_logging(config.get()?.debug);

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .worker_threads(args.workers)
        .enable_all()
        .build()?;

    runtime.block_on(run(config, args.listen))
}

fn init_logging(debug: bool) {
    let level = if debug { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level)).init();
}

async fn run(config: Arc<ConfigStore>, listen_override: Option<String>) -> anyhow::Result<()> {
    let values = config.get()?;

    let writer = Arc::new(HidWriter::new(
        values.keyboard_path.clone().into(),
        values.mouse_path.clone().into(),
        values.media_path.clone().into(),
    ));
    let keyboard = Arc::new(Keyboard::new(
        Arc::clone(&writer),
        Duration::from_millis(u64::from(values.key_press_interval_ms)),
    ));
    let mouse = Arc::new(Mouse::new(writer));
    let dispatcher = Arc::new(Dispatcher::new(
        keyboard,
        mouse,
        Duration::from_millis(u64::from(values.key_press_interval_ms)),
    ));

    let addr = match listen_override {
        Some(raw) => raw
            .to_socket_addrs()?
            .next()
            .ok_or_else(|| anyhow::anyhow!("could not resolve listen address {raw}"))?,
        None => listen_addr(&values.host, values.port)?,
    };
    log::info!("Starting server on {addr}");

    let service = InputMethodsService::new(Arc::clone(&dispatcher), Arc::clone(&config));

    Server::builder()
        .add_service(InputMethodsServer::new(service))
        .serve_with_shutdown(addr, async move {
            let _ = tokio::signal::ctrl_c().await;
        })
        .await?;

    log::info!("Shutting down, releasing all held keys and buttons");
    if let Err(err) = dispatcher.release_all() {
        log::warn!("Failed to release input state on shutdown: {err}");
    }

    Ok(())
}

fn listen_addr(host: &str, port: u16) -> anyhow::Result<SocketAddr> {
    let rewritten = config::bind_host(host);
    let candidate = format!("{rewritten}:{port}");
    candidate
        .to_socket_addrs()?
        .next()
        .ok_or_else(|| anyhow::anyhow!("could not resolve listen address {candidate}"))
}
