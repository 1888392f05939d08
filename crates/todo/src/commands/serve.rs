//! `todo serve` command implementation.

use std::path::PathBuf;

use clap::Args;
use todo_config::{CliSettings, Config};
use todo_server::{run_server, server_config_from_config};

use crate::error::CliError;
use crate::output::Output;

/// Arguments for the serve command.
#[derive(Args)]
pub(crate) struct ServeArgs {
    /// Path to configuration file (default: auto-discover todo.toml).
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Host to bind to (overrides config).
    #[arg(long)]
    host: Option<String>,

    /// Port to bind to (overrides config).
    #[arg(short, long)]
    port: Option<u16>,

    /// Built client bundle (overrides config).
    #[arg(long)]
    client: Option<PathBuf>,

    /// Built stylesheet (overrides config).
    #[arg(long)]
    styles: Option<PathBuf>,

    /// Enable verbose output.
    #[arg(short, long)]
    pub verbose: bool,

    /// Enable live reload (default: enabled).
    #[arg(long)]
    live_reload: Option<bool>,

    /// Disable live reload.
    #[arg(long, conflicts_with = "live_reload")]
    no_live_reload: bool,
}

impl ServeArgs {
    /// Execute the serve command.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration fails or the server fails to start.
    pub(crate) async fn execute(self, output: &Output) -> Result<(), CliError> {
        let cli_settings = self.cli_settings();
        let config = Config::load(self.config.as_deref(), Some(&cli_settings))?;

        output.banner(&format!(
            "Starting server on http://{}:{}",
            config.server.host, config.server.port
        ));
        output.setting("Client bundle", config.assets_resolved.client_path.display());
        output.setting("Stylesheet", config.assets_resolved.styles_path.display());
        output.setting(
            "Live reload",
            if config.live_reload.enabled {
                "enabled"
            } else {
                "disabled"
            },
        );

        let server_config = server_config_from_config(&config, self.verbose);
        run_server(server_config)
            .await
            .map_err(|e| CliError::Server(e.to_string()))?;

        Ok(())
    }

    /// Overrides taken from the command line.
    pub(crate) fn cli_settings(&self) -> CliSettings {
        CliSettings {
            host: self.host.clone(),
            port: self.port,
            client_path: self.client.clone(),
            styles_path: self.styles.clone(),
            live_reload_enabled: self.resolve_live_reload_enabled(),
        }
    }

    /// Resolve `live_reload_enabled` from --live-reload/--no-live-reload flags.
    fn resolve_live_reload_enabled(&self) -> Option<bool> {
        self.no_live_reload.then_some(false).or(self.live_reload)
    }
}
