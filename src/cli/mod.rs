use std::{io, path::PathBuf};

use clap::{Parser, Subcommand};
use eyre::{Result, WrapErr};
use strum::IntoEnumIterator;
use tracing_subscriber::EnvFilter;

use crate::{
    client::{
        EcLinkClient,
        defs::{CommandKind, EcSample, FanId, rpm_from_divisor},
    },
    config::ClientConfig,
    misc::ColourDot,
};

#[derive(Parser)]
#[command(version, about)]
pub struct Cli {
    /// YAML client configuration
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Overrides the configured socket directory (Unix only)
    #[arg(long, global = true)]
    pub socket_dir: Option<PathBuf>,

    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Check whether the service is listening
    Probe,

    /// Initialise the service's EC interface
    Init,

    Version,

    /// Fan count and RPM readings
    Fans,

    /// Temperatures and duty of one fan
    Sample {
        #[arg(short, long, default_value_t = 0)]
        fan: u32,
    },

    /// Set a raw duty (0-255)
    SetDuty {
        #[arg(short, long)]
        fan: u32,
        #[arg(short, long)]
        duty: u8,
    },

    /// Return a fan to automatic control
    Auto {
        #[arg(short, long)]
        fan: u32,
    },

    Watchdog {
        #[command(subcommand)]
        action: WatchdogAction,
    },

    /// Dump all telemetry as YAML
    Snapshot,

    /// List every command token
    Commands,
}

#[derive(Subcommand)]
pub enum WatchdogAction {
    Status,
    Start,
    Close,
}

pub fn init(verbose: bool) -> Result<()> {
    color_eyre::install()?;

    let default = if verbose { "eclink=trace" } else { "eclink=info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();

    Ok(())
}

pub fn run(cli: Cli) -> Result<()> {
    let mut config = match &cli.config {
        Some(path) => ClientConfig::load(path).wrap_err("Failed to load client config")?,
        None => ClientConfig::default(),
    };

    if let Some(socket_dir) = cli.socket_dir {
        config.socket_dir = socket_dir;
    }

    tracing::debug!("Using {config:?}");

    let client = EcLinkClient::from_config(&config);

    match cli.command {
        Command::Probe => {
            let started = client.is_server_started();
            println!("{} EC service {}", ColourDot(started), running(started));
        }

        Command::Init => {
            let initialised = client.init_io().wrap_err("Failed to initialise EC")?;
            println!("{} EC interface initialised", ColourDot(initialised));
        }

        Command::Version => {
            println!("{}", client.ec_version().wrap_err("Failed to read EC version")?);
        }

        Command::Fans => {
            let count = client.fan_count().wrap_err("Failed to read fan count")?;
            println!("Fans: {count}");

            let readings = [
                ("CPU", client.cpu_fan_rpm()?),
                ("GPU", client.gpu_fan_rpm()?),
                ("GPU1", client.gpu1_fan_rpm()?),
                ("X72", client.x72_fan_rpm()?),
            ];

            for (name, divisor) in readings {
                match rpm_from_divisor(divisor) {
                    Some(rpm) => println!("{name:>5}: {rpm} RPM"),
                    None => println!("{name:>5}: no reading"),
                }
            }
        }

        Command::Sample { fan } => {
            let sample = client
                .temp_fan_duty(fan)
                .wrap_err_with(|| format!("Failed to sample fan {fan}"))?;

            print_sample(FanId(fan), &sample);
        }

        Command::SetDuty { fan, duty } => {
            client.set_fan_duty(fan, u32::from(duty))?;
            tracing::info!("Fan {fan} duty set to {duty}");
        }

        Command::Auto { fan } => {
            client.set_fan_auto(fan)?;
            tracing::info!("Fan {fan} returned to automatic control");
        }

        Command::Watchdog { action } => match action {
            WatchdogAction::Status => {
                let started = client.is_watchdog_started()?;
                println!("{} Watchdog {}", ColourDot(started), running(started));
            }
            WatchdogAction::Start => client.start_watchdog()?,
            WatchdogAction::Close => client.close_watchdog()?,
        },

        Command::Snapshot => {
            let telemetry = client.snapshot().wrap_err("Failed to read telemetry")?;
            print!("{}", serde_yaml::to_string(&telemetry)?);
        }

        Command::Commands => {
            for kind in CommandKind::iter() {
                println!("{kind}");
            }
        }
    }

    Ok(())
}

fn running(started: bool) -> &'static str {
    if started { "running" } else { "not running" }
}

fn print_sample(fan: FanId, sample: &EcSample) {
    println!(
        "Fan {fan}: remote {} °C, local {} °C, duty {} ({:.0} %)",
        sample.remote,
        sample.local,
        sample.fan_duty,
        sample.duty_percent()
    );
}
