//! nsxlb CLI
//!
//! Evaluates a load balancer configuration offline: resolves the load
//! balancer classes and shows the tags virtual servers would carry.

mod commands;

use anyhow::Context;
use clap::{Parser, Subcommand};
use nsxlb_balancer::{Mapping, ObjectName};
use nsxlb_core::{LbConfig, DEFAULT_LOAD_BALANCER_CLASS};
use std::path::PathBuf;
use tracing::Level;
use tracing_subscriber::FmtSubscriber;

/// nsxlb - correlate NSX-T load balancer objects with Kubernetes Services
#[derive(Parser, Debug)]
#[command(name = "nsxlb")]
#[command(version, about, long_about = None)]
struct Cli {
    /// Load balancer configuration file
    #[arg(short, long, default_value = "nsxlb.toml", global = true)]
    config: PathBuf,

    /// IP pool known to the offline backend
    #[arg(long = "ip-pool", value_name = "NAME=ID", value_parser = parse_ip_pool, global = true)]
    ip_pools: Vec<(String, String)>,

    /// Log level, overrides the configuration file
    #[arg(long, global = true)]
    log_level: Option<String>,

    /// Print JSON instead of text
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Show the resolved load balancer classes
    Classes,

    /// Show the tags of the virtual server for a Service port
    Tags {
        /// Kubernetes cluster name
        #[arg(long)]
        cluster: String,

        /// Service as namespace/name
        #[arg(long)]
        service: ObjectName,

        /// Port mapping (e.g., TCP/80->30080)
        #[arg(long)]
        port: Mapping,

        /// Load balancer class
        #[arg(long, default_value = DEFAULT_LOAD_BALANCER_CLASS)]
        class: String,
    },
}

fn parse_ip_pool(s: &str) -> Result<(String, String), String> {
    match s.split_once('=') {
        Some((name, id)) if !name.is_empty() && !id.is_empty() => {
            Ok((name.to_string(), id.to_string()))
        }
        _ => Err(format!("expected NAME=ID, got {:?}", s)),
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let config = LbConfig::from_file(&cli.config)
        .with_context(|| format!("loading {}", cli.config.display()))?;

    // Initialize logging
    let level = cli.log_level.as_deref().unwrap_or(&config.logging.level);
    let log_level = match level.to_lowercase().as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    };

    let subscriber = FmtSubscriber::builder()
        .with_max_level(log_level)
        .with_target(false)
        .with_writer(std::io::stderr)
        .finish();
    let _ = tracing::subscriber::set_global_default(subscriber);

    let access = commands::offline_backend(&config, &cli.ip_pools).await;

    match cli.command {
        Commands::Classes => {
            commands::classes(&access, &config, cli.json).await?;
        }
        Commands::Tags {
            cluster,
            service,
            port,
            class,
        } => {
            commands::tags(&access, &config, &cluster, &service, &port, &class, cli.json).await?;
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_ip_pool() {
        assert_eq!(
            parse_ip_pool("pool-a=id-a").unwrap(),
            ("pool-a".to_string(), "id-a".to_string())
        );
        assert!(parse_ip_pool("pool-a").is_err());
        assert!(parse_ip_pool("=id").is_err());
    }

    #[test]
    fn test_parse_tags_command() {
        let cli = Cli::try_parse_from([
            "nsxlb",
            "--ip-pool",
            "p=1",
            "tags",
            "--cluster",
            "prod",
            "--service",
            "default/web",
            "--port",
            "TCP/80->30080",
        ])
        .unwrap();
        assert_eq!(cli.ip_pools.len(), 1);
        match cli.command {
            Commands::Tags {
                service, port, class, ..
            } => {
                assert_eq!(service, ObjectName::new("default", "web"));
                assert_eq!(port.node_port, 30080);
                assert_eq!(class, DEFAULT_LOAD_BALANCER_CLASS);
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }
}
