use clap::Parser;

/// JSON API serving 2048 game sessions with power-ups.
#[derive(Parser, Debug)]
pub struct Args {
    /// Host interface to bind (default 0.0.0.0).
    #[arg(long, default_value = "0.0.0.0")]
    pub host: String,
    /// Port to bind (default 5001).
    #[arg(long, default_value_t = 5001)]
    pub port: u16,
    /// Maximum live game sessions; creating one past this evicts the oldest.
    #[arg(long, default_value_t = 1024)]
    pub max_games: usize,
    /// Comma-separated list of origins allowed to call the API.
    #[arg(
        long,
        default_value = "https://2048web.com,http://localhost:3000,http://localhost:3002"
    )]
    pub allowed_origins: String,
    /// Optional tracing filter, e.g. "info", "debug".
    #[arg(long, default_value = "info")]
    pub log: String,
}
