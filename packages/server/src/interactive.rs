//! Interactive mode for the server.
//!
//! Prompts the user for bind address, port, and dataset location before
//! starting the server.

use std::path::PathBuf;

use dialoguer::{Confirm, Input, Select};

use crate::{ServerConfig, ServerError};

/// Runs the server in interactive mode, prompting for configuration.
///
/// Defaults for every prompt come from [`ServerConfig::from_env`].
///
/// # Errors
///
/// Returns [`ServerError`] if a dataset fails to load or the server fails
/// to start.
#[allow(clippy::future_not_send)]
pub async fn run() -> Result<(), ServerError> {
    println!("Crash Map Server");
    println!();

    let defaults = ServerConfig::from_env();

    let bind_addr: String = Input::new()
        .with_prompt("Bind address")
        .default(defaults.bind_addr.clone())
        .interact_text()
        .unwrap_or(defaults.bind_addr);

    let port: u16 = Input::new()
        .with_prompt("Port")
        .default(defaults.port)
        .interact_text()
        .unwrap_or(defaults.port);

    let sources = ["Published URLs", "Local data directory"];
    let from_disk = Select::new()
        .with_prompt("Load datasets from")
        .items(&sources)
        .default(usize::from(defaults.data_dir.is_some()))
        .interact()
        .unwrap_or(0)
        == 1;

    let data_dir = if from_disk {
        let default_dir = defaults
            .data_dir
            .map_or_else(|| "data".to_string(), |d| d.display().to_string());
        let dir: String = Input::new()
            .with_prompt("Data directory")
            .default(default_dir.clone())
            .interact_text()
            .unwrap_or(default_dir);
        Some(PathBuf::from(dir))
    } else {
        None
    };

    if !Confirm::new()
        .with_prompt(format!("Start server on {bind_addr}:{port}?"))
        .default(true)
        .interact()
        .unwrap_or(true)
    {
        println!("Cancelled.");
        return Ok(());
    }

    super::run_server_with(ServerConfig {
        bind_addr,
        port,
        data_dir,
    })
    .await
}
