// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright 2026 Edgecast Cloud LLC.

//! Invoking the `nova` command-line client
//!
//! The client either runs on this machine, picking credentials up from the
//! inherited `OS_*` environment, or on a controller node over `ssh` after
//! sourcing an openrc file there.

use std::process::Output;

use tokio::process::Command;

use crate::trigger::{MigrationRequest, TriggerError};

/// Where the `nova` program is executed
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Launcher {
    Local,
    /// Run through `ssh <destination>`, optionally sourcing `env_file` first
    Remote {
        destination: String,
        env_file: Option<String>,
    },
}

/// A configured `nova` CLI
#[derive(Debug, Clone)]
pub struct NovaCli {
    pub program: String,
    pub launcher: Launcher,
}

impl Default for NovaCli {
    fn default() -> Self {
        Self {
            program: "nova".to_string(),
            launcher: Launcher::Local,
        }
    }
}

/// Arguments for `nova host-evacuate-live`: block-migrate everything off
/// `source_host` onto `target_host`.
pub fn host_evacuate_live_args(target_host: &str, source_host: &str) -> Vec<String> {
    vec![
        "host-evacuate-live".to_string(),
        "--target-host".to_string(),
        target_host.to_string(),
        "--block-migrate".to_string(),
        source_host.to_string(),
    ]
}

/// Quote a word for a POSIX shell
fn shell_quote(word: &str) -> String {
    if !word.is_empty()
        && word
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || "-_./=:@,".contains(c))
    {
        return word.to_string();
    }
    format!("'{}'", word.replace('\'', r"'\''"))
}

impl NovaCli {
    /// The program and argument vector that will actually be spawned
    pub fn command_line(&self, args: &[String]) -> (String, Vec<String>) {
        match &self.launcher {
            Launcher::Local => (self.program.clone(), args.to_vec()),
            Launcher::Remote {
                destination,
                env_file,
            } => {
                let mut remote = std::iter::once(self.program.as_str())
                    .chain(args.iter().map(String::as_str))
                    .map(shell_quote)
                    .collect::<Vec<_>>()
                    .join(" ");
                if let Some(file) = env_file {
                    remote = format!(". {} && {remote}", shell_quote(file));
                }
                (
                    "ssh".to_string(),
                    vec![
                        "-o".to_string(),
                        "BatchMode=yes".to_string(),
                        destination.clone(),
                        remote,
                    ],
                )
            }
        }
    }

    /// Run `nova <args>` and return its stdout. A non-zero exit is an error
    /// carrying stderr.
    pub async fn run(&self, args: &[String]) -> Result<String, TriggerError> {
        let (program, argv) = self.command_line(args);
        tracing::info!(%program, args = ?argv, "running nova CLI");

        let Output {
            status,
            stdout,
            stderr,
        } = Command::new(&program)
            .args(&argv)
            .kill_on_drop(true)
            .output()
            .await
            .map_err(TriggerError::Spawn)?;

        let stdout = String::from_utf8_lossy(&stdout).into_owned();
        let stderr = String::from_utf8_lossy(&stderr).into_owned();
        tracing::debug!(%stdout, %stderr, ?status, "nova CLI finished");

        if !status.success() {
            return Err(TriggerError::CommandFailed {
                status: status.code(),
                stderr: stderr.trim().to_string(),
            });
        }
        Ok(stdout)
    }
}

/// Parse the result table printed by `nova host-evacuate-live`:
///
/// ```text
/// +--------------------------------------+-------------------------+---------------+
/// | Server UUID                          | Live Migration Accepted | Error Message |
/// +--------------------------------------+-------------------------+---------------+
/// | 7a3c1f0e-...                         | True                    |               |
/// +--------------------------------------+-------------------------+---------------+
/// ```
pub fn parse_evacuate_table(stdout: &str) -> Vec<MigrationRequest> {
    stdout
        .lines()
        .map(str::trim)
        .filter(|line| line.starts_with('|'))
        .filter_map(|line| {
            let cells: Vec<&str> = line.trim_matches('|').split('|').map(str::trim).collect();
            match cells.as_slice() {
                [id, accepted, rest @ ..] if *accepted != "Live Migration Accepted" => {
                    let error = rest.first().filter(|e| !e.is_empty()).map(|e| e.to_string());
                    Some(MigrationRequest {
                        server_id: id.to_string(),
                        accepted: accepted.eq_ignore_ascii_case("true"),
                        error,
                    })
                }
                _ => None,
            }
        })
        .collect()
}
