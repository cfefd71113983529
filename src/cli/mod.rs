use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

mod commands;
pub use commands::*;

#[derive(Parser)]
#[command(name = "nowplaying")]
#[command(about = "Publish track metadata to the system Now Playing surface")]
#[command(version)]
pub struct Cli {
    /// Config file to use instead of the default location
    #[arg(long, global = true, env = "NOWPLAYING_CONFIG")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Replace the now playing metadata
    Publish(MetadataArgs),

    /// Clear the now playing metadata
    Clear,

    /// Print the record a publish would send, without publishing
    Inspect(MetadataArgs),

    /// Show daemon and backend status
    Status,

    /// Daemon management
    Daemon {
        #[command(subcommand)]
        command: DaemonCommands,
    },
}

/// Fields left out are cleared on publish.
#[derive(Args, Debug, Default)]
pub struct MetadataArgs {
    /// Track title
    #[arg(short, long)]
    pub title: Option<String>,
    /// Artist name
    #[arg(short, long)]
    pub artist: Option<String>,
    /// Album title
    #[arg(short = 'l', long)]
    pub album: Option<String>,
    /// Composer
    #[arg(long)]
    pub composer: Option<String>,
    /// Genre
    #[arg(short, long)]
    pub genre: Option<String>,
    /// Free-form media type (e.g. "music", "podcast")
    #[arg(long)]
    pub media_type: Option<String>,
    /// Opaque stable identifier for the item
    #[arg(long)]
    pub persistent_id: Option<String>,
    /// Cover art image file
    #[arg(long)]
    pub artwork: Option<PathBuf>,
    /// Duration in seconds, MM:SS or HH:MM:SS
    #[arg(short, long)]
    pub duration: Option<String>,
    /// Track number on the album (0 = unknown)
    #[arg(long, default_value_t = 0)]
    pub track: u32,
    /// Number of tracks on the album (0 = unknown)
    #[arg(long, default_value_t = 0)]
    pub track_count: u32,
    /// Disc number (0 = unknown)
    #[arg(long, default_value_t = 0)]
    pub disc: u32,
    /// Number of discs (0 = unknown)
    #[arg(long, default_value_t = 0)]
    pub disc_count: u32,
}

#[derive(Subcommand)]
pub enum DaemonCommands {
    /// Start the daemon
    Start,
    /// Stop the daemon
    Stop,
    /// Show daemon status
    Status,
    /// Run daemon in foreground (internal use)
    Run,
}
