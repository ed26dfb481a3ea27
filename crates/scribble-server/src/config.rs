//! Server configuration, from command-line flags or environment variables.

use clap::Parser;
use std::net::SocketAddr;
use std::path::PathBuf;

/// Room joined when a participant names none.
pub const DEFAULT_ROOM: &str = "default";

/// Outbound messages buffered per participant before backpressure applies.
pub const CHANNEL_CAPACITY: usize = 256;

/// Smallest usable queue: a joining session is sent SYNC_STATE and PRESENCE
/// back to back, before its writer has drained anything.
pub const MIN_CHANNEL_CAPACITY: usize = 2;

/// Largest inbound WebSocket message accepted, in bytes.
pub const MAX_MESSAGE_SIZE: usize = 1024 * 1024;

#[derive(Debug, Clone, Parser)]
#[command(name = "scribble-server", version, about = "Shared canvas room server")]
pub struct ServerConfig {
    /// Address to listen on
    #[arg(long, env = "SCRIBBLE_BIND", default_value = "0.0.0.0:3000")]
    pub bind: SocketAddr,

    /// Room used by connections that do not ask for one
    #[arg(long, env = "SCRIBBLE_DEFAULT_ROOM", default_value = DEFAULT_ROOM)]
    pub default_room: String,

    /// Outbound queue length per participant
    #[arg(
        long,
        env = "SCRIBBLE_CHANNEL_CAPACITY",
        default_value_t = CHANNEL_CAPACITY,
        value_parser = parse_channel_capacity
    )]
    pub channel_capacity: usize,

    /// Largest inbound message in bytes
    #[arg(long, env = "SCRIBBLE_MAX_MESSAGE_SIZE", default_value_t = MAX_MESSAGE_SIZE)]
    pub max_message_size: usize,

    /// Directory of client files to serve at `/`
    #[arg(long, env = "SCRIBBLE_STATIC_DIR")]
    pub static_dir: Option<PathBuf>,
}

impl ServerConfig {
    /// Per-session queue length, raised to the smallest workable size.
    pub fn session_capacity(&self) -> usize {
        self.channel_capacity.max(MIN_CHANNEL_CAPACITY)
    }
}

fn parse_channel_capacity(value: &str) -> Result<usize, String> {
    let capacity: usize = value.parse().map_err(|e| format!("{}", e))?;
    if capacity < MIN_CHANNEL_CAPACITY {
        return Err(format!("must be at least {}", MIN_CHANNEL_CAPACITY));
    }
    Ok(capacity)
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: SocketAddr::from(([0, 0, 0, 0], 3000)),
            default_room: DEFAULT_ROOM.to_string(),
            channel_capacity: CHANNEL_CAPACITY,
            max_message_size: MAX_MESSAGE_SIZE,
            static_dir: None,
        }
    }
}
