use clap::{Parser, Subcommand};
use color_eyre::eyre::WrapErr;
use color_eyre::Result;
use dynoalloc::config::AllocatorConfig;
use dynoalloc::config_loader::{self, CliOverrides};
use dynoalloc::ip::host_pair;
use dynoalloc::Allocator;
use env_logger::Env;
use ipnet::Ipv4Net;
use log::{info, warn};
use serde_json::json;
use std::path::PathBuf;

/// Reserve per-host dyno UIDs and look up their private networks
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to an allocator configuration YAML file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Working directory root; reservations live in <WORK_DIR>/uids
    #[arg(long)]
    work_dir: Option<PathBuf>,

    /// Private block in anchor/prefix form, e.g. 172.16.0.28/12
    #[arg(long)]
    private_subnet: Option<Ipv4Net>,

    /// Smallest UID handed out
    #[arg(long)]
    min_uid: Option<u32>,

    /// Largest UID handed out
    #[arg(long)]
    max_uid: Option<u32>,

    /// Print results as JSON
    #[arg(long)]
    json: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug, PartialEq)]
enum Command {
    /// Reserve a free UID and print it with its network
    Reserve,
    /// Return a UID to the pool
    Free { uid: u32 },
    /// Print the /30 network of a UID
    Subnet { uid: u32 },
    /// List reserved UIDs
    List,
    /// Show the address plan and UID range
    Info,
}

impl Args {
    fn overrides(&self) -> CliOverrides {
        CliOverrides {
            work_dir: self.work_dir.clone(),
            private_subnet: self.private_subnet,
            min_uid: self.min_uid,
            max_uid: self.max_uid,
        }
    }
}

fn network_json(uid: u32, net: &Ipv4Net) -> serde_json::Value {
    let (gateway, dyno) = host_pair(net);
    json!({
        "uid": uid,
        "network": net.to_string(),
        "gateway": gateway.to_string(),
        "dyno": dyno.to_string(),
    })
}

fn main() -> Result<()> {
    // Initialize error handling
    color_eyre::install()?;

    let args = Args::parse();

    // Logging goes to stderr so stdout stays machine readable
    env_logger::Builder::from_env(Env::default().default_filter_or("info")).init();

    let mut config = match &args.config {
        Some(path) => config_loader::load_config(path)?,
        None => AllocatorConfig::default(),
    };
    config_loader::apply_overrides(&mut config, &args.overrides())?;

    let allocator = Allocator::from_config(&config).wrap_err_with(|| {
        format!("Failed to open allocator in '{}'", config.work_dir.display())
    })?;

    match args.command {
        Command::Reserve => {
            let uid = match allocator.reserve_uid() {
                Ok(uid) => uid,
                Err(e) if e.is_retryable() => {
                    warn!(
                        "Every uid in {} appears taken; free some or widen the range, then retry",
                        allocator.range()
                    );
                    return Err(e.into());
                }
                Err(e) => return Err(e.into()),
            };
            let net = allocator.subnet_for(uid)?;
            if args.json {
                println!("{}", network_json(uid, &net));
            } else {
                println!("{} {}", uid, net);
            }
        }
        Command::Free { uid } => {
            allocator.free_uid(uid)?;
            info!("Released uid {}", uid);
        }
        Command::Subnet { uid } => {
            let net = allocator.subnet_for(uid)?;
            if args.json {
                println!("{}", network_json(uid, &net));
            } else {
                let (gateway, dyno) = host_pair(&net);
                println!("{} {} {}", net, gateway, dyno);
            }
        }
        Command::List => {
            let uids = allocator.reserved_uids()?;
            if args.json {
                println!("{}", json!(uids));
            } else {
                for uid in uids {
                    println!("{}", uid);
                }
            }
        }
        Command::Info => {
            let plan = allocator.plan();
            let range = allocator.range();
            if args.json {
                println!(
                    "{}",
                    json!({
                        "supernet": plan.supernet().to_string(),
                        "anchor": plan.anchor().to_string(),
                        "available_subnets": plan.available_subnets(),
                        "min_uid": range.min(),
                        "max_uid": range.max(),
                        "store": allocator.store().dir(),
                    })
                );
            } else {
                println!("supernet:          {}", plan.supernet());
                println!("anchor:            {}", plan.anchor());
                println!("available subnets: {}", plan.available_subnets());
                println!("uid range:         {}", range);
                println!("store:             {}", allocator.store().dir().display());
            }
        }
    }

    Ok(())
}
