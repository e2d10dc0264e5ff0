// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Thin protocol client: connects to `fleetd`'s Unix socket, sends one
//! [`Request`], reads back one [`Response`].

use tokio::net::UnixStream;

use fleet_daemon::Config;
use fleet_wire::{read_message, write_message, Request, Response};

use crate::exit_error::ExitError;

#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    #[error("could not load configuration: {0}")]
    Config(#[from] fleet_daemon::LifecycleError),

    #[error("could not reach fleetd at {path}: {source}")]
    Connect {
        path: std::path::PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("protocol error: {0}")]
    Protocol(#[from] fleet_wire::ProtocolError),

    #[error("fleetd returned an error: {0}")]
    Remote(String),
}

impl From<ClientError> for ExitError {
    fn from(err: ClientError) -> Self {
        // Connection failures are an operator/environment problem (daemon
        // not running), distinct from a request the daemon rejected.
        let code = match &err {
            ClientError::Connect { .. } => 69, // EX_UNAVAILABLE
            _ => 1,
        };
        ExitError::new(code, err.to_string())
    }
}

/// A connection to `fleetd`, opened fresh per request (the daemon is
/// request/response, not session-oriented — mirrors the teacher's
/// `DaemonClient::send` one-shot-connection pattern).
pub struct DaemonClient {
    socket_path: std::path::PathBuf,
}

impl DaemonClient {
    pub fn discover() -> Result<Self, ClientError> {
        let config = Config::load()?;
        Ok(Self { socket_path: config.socket_path })
    }

    pub async fn send(&self, request: &Request) -> Result<Response, ClientError> {
        let mut stream =
            UnixStream::connect(&self.socket_path).await.map_err(|source| ClientError::Connect {
                path: self.socket_path.clone(),
                source,
            })?;

        let payload = fleet_wire::encode(request)?;
        write_message(&mut stream, &payload).await?;

        let reply = read_message(&mut stream).await?;
        let response: Response = fleet_wire::decode(&reply)?;
        Ok(response)
    }

    /// Sends a request and rejects an `Error` response as a remote failure,
    /// so call sites don't each have to match on it.
    pub async fn send_checked(&self, request: &Request) -> Result<Response, ClientError> {
        match self.send(request).await? {
            Response::Error { message } => Err(ClientError::Remote(message)),
            other => Ok(other),
        }
    }
}

#[cfg(test)]
#[path = "client_tests.rs"]
mod tests;
