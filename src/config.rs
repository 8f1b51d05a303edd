use clap::{Parser, Subcommand};
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "skrate")]
#[command(version)]
#[command(about = "Skateboarding progression tracker", long_about = None)]
pub struct Cli {
    /// Log at debug level unless RUST_LOG says otherwise
    #[arg(long, global = true)]
    pub debug: bool,

    /// JSON file holding tricks, attempts and games
    #[arg(
        long = "data-path",
        env = "SKRATE_DATA_PATH",
        default_value = "data/skrate.json",
        global = true
    )]
    pub data_path: PathBuf,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Run the web server (the default)
    Serve(ServeArgs),
    /// Create the data file and load the trick catalogue into it
    DatabaseSetup,
}

#[derive(clap::Args, Debug, Clone, PartialEq, Eq)]
pub struct ServeArgs {
    /// Use 0.0.0.0 for LAN, else localhost only
    #[arg(long, env = "HOST", default_value_t = IpAddr::V4(Ipv4Addr::LOCALHOST))]
    pub host: IpAddr,

    #[arg(short, long, env = "PORT", default_value_t = 5000)]
    pub port: u16,
}

impl Default for ServeArgs {
    fn default() -> Self {
        Self {
            host: IpAddr::V4(Ipv4Addr::LOCALHOST),
            port: 5000,
        }
    }
}

impl ServeArgs {
    pub fn addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }
}

impl Cli {
    /// The subcommand to run; no subcommand means `serve` with its
    /// environment and default values.
    pub fn selected_command(&self) -> Command {
        match &self.command {
            Some(command) => command.clone(),
            None => Command::Serve(ServeArgs::from_env()),
        }
    }

    pub fn log_directive(&self) -> &'static str {
        if self.debug { "debug" } else { "info" }
    }
}

impl ServeArgs {
    fn from_env() -> Self {
        #[derive(Parser)]
        struct Standalone {
            #[command(flatten)]
            args: ServeArgs,
        }
        Standalone::try_parse_from(["skrate"])
            .map(|standalone| standalone.args)
            .unwrap_or_default()
    }
}
