use std::process::Stdio;

use thiserror::Error;
use tokio::process::{Child, Command};
use tracing::info;
use url::Url;

#[derive(Error, Debug)]
pub enum EmbedError {
    #[error("failed to launch browser '{0}': {1}. Is the command installed and in your PATH?")]
    LaunchError(String, String),
}

/// Hand an embed URL to the external rendering surface (the user's
/// browser). What happens inside the page is the provider's business, not
/// ours.
pub fn open_embed(command: &str, args: &[String], url: &Url) -> Result<Child, EmbedError> {
    info!(command, url = %url, "opening embed surface");

    let mut cmd = Command::new(command);
    cmd.args(args);
    cmd.arg(url.as_str());

    // Suppress all output to not corrupt TUI
    cmd.stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::null());

    cmd.spawn()
        .map_err(|e| EmbedError::LaunchError(command.to_string(), e.to_string()))
}
