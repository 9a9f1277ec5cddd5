use acct_server::shutdown::spawn_signal_listener;
use acct_server::state::{StateBackend, ValkeyStateBackend};
use acct_server::{logging, AccountingHandler, AccountingServer, ServerSettings, StateStore};
use clap::Parser;
use std::process;
use std::sync::Arc;
use tracing::{error, info};

#[tokio::main]
async fn main() {
    let settings = ServerSettings::parse();

    if settings.validate {
        println!("✓ Configuration validated successfully!");
        println!();
        println!("Configuration summary:");
        print!("{}", settings.summary());
        process::exit(0);
    }

    if let Err(e) = logging::init(&settings.log) {
        eprintln!("Failed to initialize logging: {}", e);
        process::exit(1);
    }

    info!("RADIUS accounting server v{}", env!("CARGO_PKG_VERSION"));

    let valkey_config = settings.store.valkey_config();
    let backend = match ValkeyStateBackend::new(valkey_config).await {
        Ok(backend) => backend,
        Err(e) => {
            error!(redis_addr = %settings.store.redis_addr, error = %e, "Failed to connect to Valkey");
            process::exit(1);
        }
    };
    if let Err(e) = backend.ping().await {
        error!(redis_addr = %settings.store.redis_addr, error = %e, "Valkey did not answer PING");
        process::exit(1);
    }
    info!(redis_addr = %settings.store.redis_addr, db = settings.store.redis_db, "Connected to Valkey");

    let handler = AccountingHandler::new(settings.secret.as_bytes(), Arc::new(StateStore::new(backend)));

    let server = match AccountingServer::bind(settings.server_config(), handler).await {
        Ok(server) => server,
        Err(e) => {
            error!(bind_addr = %settings.bind_addr(), error = %e, "Failed to bind UDP socket");
            process::exit(1);
        }
    };

    let cancel = spawn_signal_listener();

    if let Err(e) = server.run(cancel).await {
        error!("Server error: {}", e);
        process::exit(1);
    }
}
