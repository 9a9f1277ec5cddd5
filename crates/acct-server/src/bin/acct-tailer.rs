use acct_server::shutdown::spawn_signal_listener;
use acct_server::state::valkey::enable_keyevent_notifications;
use acct_server::state::ValkeyKeyEvents;
use acct_server::{logging, TailerSettings, Tailer};
use clap::Parser;
use std::process;
use tracing::{error, info};

#[tokio::main]
async fn main() {
    let settings = TailerSettings::parse();

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

    let valkey_config = settings.store.valkey_config();

    if settings.enable_notifications {
        match enable_keyevent_notifications(&valkey_config).await {
            Ok(()) => info!("Enabled keyevent notifications for string commands"),
            Err(e) => {
                error!(error = %e, "Failed to enable keyspace notifications");
                process::exit(1);
            }
        }
    }

    let events = match ValkeyKeyEvents::subscribe(&valkey_config).await {
        Ok(events) => events,
        Err(e) => {
            error!(redis_addr = %settings.store.redis_addr, error = %e, "Failed to subscribe to keyspace notifications");
            process::exit(1);
        }
    };
    info!(redis_addr = %settings.store.redis_addr, "Listening for RADIUS accounting key updates");

    let cancel = spawn_signal_listener();

    match Tailer::new().run(events, cancel).await {
        Ok(count) => info!(observed = count, "Tailer stopped"),
        Err(e) => {
            error!(error = %e, "Keyspace notification stream failed");
            process::exit(1);
        }
    }
}
