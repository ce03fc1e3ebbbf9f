//! Server command - start the match server
//!
//! ## Architecture (4-layer granularity)
//!
//! - Level 1: run() - orchestration
//! - Level 2: configure_server(), start_server()
//! - Level 3: (delegated to parques-server crate)
//! - Level 4: argument validation

use anyhow::Result;
use clap::Args;

use parques_server::{run_server, ServerConfig, DEFAULT_EVENT_CAPACITY};

use crate::options::MatchOptions;

// ============================================================================
// COMMAND ARGUMENTS (Level 4 - Configuration)
// ============================================================================

#[derive(Args)]
pub struct ServerArgs {
    /// Port number to listen on
    #[arg(long, default_value = "8002")]
    pub port: u16,

    /// Turn timeout in milliseconds (0 disables the timer)
    #[arg(long)]
    pub turn_timeout_ms: Option<u64>,

    /// Buffered match events per subscriber
    #[arg(long, default_value_t = DEFAULT_EVENT_CAPACITY)]
    pub event_capacity: usize,

    #[command(flatten)]
    pub match_options: MatchOptions,
}

// ============================================================================
// LEVEL 1 - ORCHESTRATION
// ============================================================================

/// Run server command
///
/// 1. Configure server
/// 2. Start server (blocking)
pub fn run(args: ServerArgs) -> Result<()> {
    let config = configure_server(&args)?;

    tracing::info!(
        "Starting Parqués server on port {} ({} seats)",
        config.port,
        config.match_config.variant.seats()
    );

    start_server(config)
}

// ============================================================================
// LEVEL 2 - PHASES
// ============================================================================

/// Configure server from command arguments
fn configure_server(args: &ServerArgs) -> Result<ServerConfig> {
    validate_event_capacity(args.event_capacity)?;

    Ok(ServerConfig {
        port: args.port,
        match_config: args.match_options.to_match_config()?,
        turn_timeout_ms: args.turn_timeout_ms,
        event_capacity: args.event_capacity,
    })
}

/// Start the server (blocking)
fn start_server(config: ServerConfig) -> Result<()> {
    let runtime = tokio::runtime::Runtime::new()?;

    runtime.block_on(async { run_server(config).await })
}

// ============================================================================
// LEVEL 4 - VALIDATION
// ============================================================================

/// The broadcast channel panics on a zero capacity
fn validate_event_capacity(capacity: usize) -> Result<()> {
    if capacity == 0 {
        anyhow::bail!("--event-capacity must be at least 1");
    }
    Ok(())
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use parques_core::{BoardVariant, CapturePolicy};

    fn args() -> ServerArgs {
        ServerArgs {
            port: 8002,
            turn_timeout_ms: None,
            event_capacity: DEFAULT_EVENT_CAPACITY,
            match_options: MatchOptions {
                variant: "4".to_string(),
                config: None,
                capture_policy: None,
            },
        }
    }

    #[test]
    fn test_configure_server_defaults() {
        let config = configure_server(&args()).unwrap();
        assert_eq!(config.port, 8002);
        assert_eq!(config.match_config.variant, BoardVariant::FourPlayers);
        assert_eq!(config.effective_match_config().turn_timeout_ms, 60_000);
    }

    #[test]
    fn test_configure_server_overrides() {
        let mut args = args();
        args.turn_timeout_ms = Some(0);
        args.match_options.variant = "6".to_string();
        args.match_options.capture_policy = Some("advisory".to_string());

        let config = configure_server(&args).unwrap();
        assert_eq!(config.match_config.variant, BoardVariant::SixPlayers);
        assert_eq!(
            config.match_config.rules.capture_policy,
            CapturePolicy::Advisory
        );
        assert_eq!(config.effective_match_config().turn_timeout_ms, 0);
    }

    #[test]
    fn test_zero_event_capacity_rejected() {
        let mut args = args();
        args.event_capacity = 0;
        assert!(configure_server(&args).is_err());
    }
}
