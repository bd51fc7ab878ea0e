//! CompassKV CLI Client
//!
//! Command-line interface for a sharded key-value store.

use clap::{Parser, Subcommand};
use compasskv::{Config, KvClient};
use tracing_subscriber::{fmt, EnvFilter};

/// CompassKV CLI
#[derive(Parser, Debug)]
#[command(name = "compasskv-cli")]
#[command(about = "CLI for a sharded key-value store")]
#[command(version)]
struct Args {
    /// Server address
    #[arg(short, long, default_value = "127.0.0.1:6648")]
    server: String,

    /// Namespace to route against
    #[arg(short, long, default_value = "default")]
    namespace: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Get a value by key
    Get {
        /// The key to get
        key: String,
    },

    /// Set a key-value pair
    Set {
        /// The key to set
        key: String,

        /// The value to set
        value: String,
    },

    /// Delete a key
    Del {
        /// The key to delete
        key: String,
    },

    /// Show which shard a key routes to
    Route {
        /// The key to route
        key: String,
    },

    /// Ping the server
    Ping,
}

fn main() {
    // Initialize tracing/logging
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("warn,compasskv=info"));

    fmt().with_env_filter(filter).with_target(false).init();

    let args = Args::parse();

    let config = Config::builder()
        .server_addr(&args.server)
        .namespace(&args.namespace)
        .build();

    let client = match KvClient::connect(config) {
        Ok(client) => client,
        Err(e) => {
            eprintln!("Failed to connect to {}: {}", args.server, e);
            std::process::exit(1);
        }
    };

    let result = run_command(&client, &args.command);

    if let Err(e) = client.close() {
        tracing::warn!("Error closing connection: {}", e);
    }

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

fn run_command(client: &KvClient, command: &Commands) -> compasskv::Result<()> {
    match command {
        Commands::Get { key } => {
            match client.get(key)? {
                Some(value) => println!("{}", String::from_utf8_lossy(&value)),
                None => println!("(not found)"),
            }
            Ok(())
        }
        Commands::Set { key, value } => {
            client.put(key, value.as_bytes())?;
            println!("OK");
            Ok(())
        }
        Commands::Del { key } => {
            client.delete(key)?;
            println!("OK");
            Ok(())
        }
        Commands::Route { key } => {
            let shard_id = client.shard_for(key)?;
            println!(
                "{} -> shard {} (of {})",
                key,
                shard_id,
                client.shard_map().shard_count()
            );
            Ok(())
        }
        Commands::Ping => {
            client.ping()?;
            println!("PONG");
            Ok(())
        }
    }
}
