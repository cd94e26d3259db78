//! Argument definitions for the `glasslink` binary.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

#[derive(Debug, Parser)]
#[command(
    name = "glasslink",
    version,
    about = "Provision camera glasses over their WiFi hotspot and pull media off them",
    propagate_version = true
)]
pub struct Cli {
    #[command(flatten)]
    pub global: GlobalOpts,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Args)]
pub struct GlobalOpts {
    /// Configuration profile to use
    #[arg(short = 'P', long, global = true, env = "GLASSLINK_PROFILE")]
    pub profile: Option<String>,

    /// Device base URL override (e.g. http://192.168.4.1)
    #[arg(long, global = true, env = "GLASSLINK_DEVICE_URL")]
    pub device_url: Option<String>,

    /// Network join timeout in seconds
    #[arg(long, global = true)]
    pub timeout: Option<u64>,

    /// Increase log verbosity (-v, -vv, -vvv)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Suppress progress output
    #[arg(short, long, global = true)]
    pub quiet: bool,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Check device health over WiFi or the short-range link
    Status(StatusArgs),

    /// Negotiate credentials, join the device hotspot, verify reachability
    Connect(ConnectArgs),

    /// Download all media stored on the device
    Download(DownloadArgs),

    /// Open the on-device media gallery
    Gallery,

    /// Switch the device between capture and transfer modes
    Mode(ModeArgs),

    /// Manage configuration
    Config(ConfigArgs),
}

#[derive(Debug, Args)]
pub struct StatusArgs {
    /// Transport to probe over
    #[arg(long, value_enum, default_value_t = Transport::Wifi)]
    pub transport: Transport,

    /// Retries after the first attempt (defaults to the profile's policy)
    #[arg(long)]
    pub retries: Option<u32>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Transport {
    /// The short-range (BLE) link; no shared network required
    ShortRange,
    /// The device's local HTTP interface
    Wifi,
}

#[derive(Debug, Args)]
pub struct ConnectArgs {
    /// Join this SSID directly instead of negotiating over the link
    #[arg(long, requires = "password")]
    pub ssid: Option<String>,

    /// Hotspot password, required with --ssid
    #[arg(long)]
    pub password: Option<String>,
}

#[derive(Debug, Args)]
pub struct DownloadArgs {
    /// Directory to store downloaded media in
    #[arg(long, default_value = ".")]
    pub dest: PathBuf,
}

#[derive(Debug, Args)]
pub struct ModeArgs {
    #[command(subcommand)]
    pub command: ModeCommand,
}

#[derive(Debug, Subcommand)]
pub enum ModeCommand {
    /// Put the device back in capture mode
    Capture,
    /// Put the device in media transfer mode
    Transfer,
}

#[derive(Debug, Args)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub command: ConfigCommand,
}

#[derive(Debug, Subcommand)]
pub enum ConfigCommand {
    /// Print the merged configuration
    Show,
    /// Print the config file path
    Path,
    /// Write a starter config file
    Init,
}
