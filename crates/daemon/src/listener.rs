// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Accepts connections on the daemon's Unix socket and dispatches each
//! framed [`fleet_wire::Request`] to the [`Coordinator`]. Unix-only: the
//! fleet control plane has no remote/TCP transport (spec.md §6).

use std::io::ErrorKind;
use std::sync::Arc;

use thiserror::Error;
use tokio::io::{AsyncRead, AsyncWrite};
use tokio::net::UnixListener;
use tracing::{error, warn};

use fleet_adapters::PlaybookAdapter;
use fleet_core::Clock;
use fleet_storage::Store;
use fleet_wire::{read_request, write_response, ProtocolError, Request, Response};

use crate::coordinator::Coordinator;

#[derive(Debug, Error)]
pub enum ConnectionError {
    #[error(transparent)]
    Protocol(#[from] ProtocolError),
}

/// Accepts connections until the listener itself is dropped (daemon
/// shutdown drops the socket, which ends the accept loop with an error
/// that's expected and logged at debug, not warn, by the caller).
pub async fn serve<S, A, C>(listener: UnixListener, coordinator: Arc<Coordinator<S, A, C>>)
where
    S: Store + 'static,
    A: PlaybookAdapter + 'static,
    C: Clock + 'static,
{
    loop {
        match listener.accept().await {
            Ok((stream, _addr)) => {
                let coordinator = Arc::clone(&coordinator);
                tokio::spawn(async move {
                    let (reader, writer) = stream.into_split();
                    if let Err(e) = handle_connection(reader, writer, coordinator.as_ref()).await {
                        warn!(error = %e, "connection error");
                    }
                });
            }
            Err(e) => {
                error!(error = %e, "accept error");
                break;
            }
        }
    }
}

async fn handle_connection<R, W, S, A, C>(
    mut reader: R,
    mut writer: W,
    coordinator: &Coordinator<S, A, C>,
) -> Result<(), ConnectionError>
where
    R: AsyncRead + Unpin + Send,
    W: AsyncWrite + Unpin + Send,
    S: Store + 'static,
    A: PlaybookAdapter + 'static,
    C: Clock + 'static,
{
    loop {
        let request = match read_request(&mut reader).await {
            Ok(request) => request,
            Err(ProtocolError::Io(e)) if e.kind() == ErrorKind::UnexpectedEof => return Ok(()),
            Err(e) => return Err(e.into()),
        };

        let response = dispatch(coordinator, request).await;
        write_response(&mut writer, &response).await?;
    }
}

async fn dispatch<S, A, C>(coordinator: &Coordinator<S, A, C>, request: Request) -> Response
where
    S: Store + 'static,
    A: PlaybookAdapter + 'static,
    C: Clock + 'static,
{
    match request {
        Request::SubmitUpdate {
            app_id,
            distr_url,
            mode,
            orchestrator_playbook,
            drain_wait_time,
        } => submitted_or_error(coordinator.submit_update(app_id, distr_url, mode, orchestrator_playbook, drain_wait_time)),

        Request::SubmitBatchUpdate {
            app_ids,
            distr_url,
            mode,
            orchestrator_playbook,
            drain_wait_time,
        } => submitted_or_error(coordinator.submit_update_batch(app_ids, distr_url, mode, orchestrator_playbook, drain_wait_time)),

        Request::SubmitAction { app_id, action } => submitted_or_error(coordinator.submit_action(app_id, action)),

        Request::SubmitBulkAction { app_ids, action } => submitted_or_error(coordinator.submit_bulk_action(app_ids, action)),

        Request::ListTasks {
            status,
            instance_id,
            server_id,
        } => {
            let filter = fleet_storage::TaskFilter { status, instance_id, server_id };
            match coordinator.list_tasks(&filter) {
                Ok(tasks) => Response::TaskList(tasks),
                Err(e) => error_response(e),
            }
        }

        Request::GetTask { task_id } => match coordinator.get_task(&task_id) {
            Ok(Some(detail)) => Response::TaskDetail {
                task: Box::new(detail.task),
                play_recap: detail.play_recap,
                display_summaries: detail.display_summaries,
            },
            Ok(None) => Response::Error {
                message: format!("task not found: {task_id}"),
            },
            Err(e) => error_response(e),
        },

        Request::CancelTask { task_id } => match coordinator.cancel_task(&task_id).await {
            Ok(fleet_storage::CancelOutcome::Cancelled) => Response::Cancelled { task_id },
            Ok(fleet_storage::CancelOutcome::NotFound) => Response::Error {
                message: format!("task not found: {task_id}"),
            },
            Ok(fleet_storage::CancelOutcome::NotCancelable(status)) => Response::Error {
                message: format!("task {task_id} is {status} and cannot be cancelled"),
            },
            Err(e) => error_response(e),
        },
    }
}

fn submitted_or_error(result: Result<Vec<fleet_core::TaskId>, crate::error::CoordinatorError>) -> Response {
    match result {
        Ok(task_ids) => Response::Submitted { task_ids },
        Err(e) => error_response(e),
    }
}

fn error_response(err: crate::error::CoordinatorError) -> Response {
    Response::Error { message: err.to_string() }
}

#[cfg(test)]
#[path = "listener_tests.rs"]
mod tests;
