// This file is part of Autosend.
//
// Autosend is free software: you can redistribute it and/or modify it under the
// terms of the GNU Lesser General Public License as published by the Free Software
// Foundation, either version 3 of the License, or (at your option) any later version.
//
// Autosend is distributed in the hope that it will be useful, but WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.
// See the GNU General Public License for more details.
//
// You should have received a copy of the GNU General Public License along with Autosend.
// If not, see https://www.gnu.org/licenses/.

//! Task trait and shutdown plumbing.

use async_trait::async_trait;
use futures::Future;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};

/// Long-running unit of work driven until the shutdown token fires.
#[async_trait]
pub trait Task: Sync + Send + 'static {
    async fn run(self: Box<Self>, shutdown_token: CancellationToken) -> anyhow::Result<()>;
}

/// Run a task until it finishes or the signal fires, then cancel the token
/// and wait for the task to wind down. In-flight work completes before the
/// task observes the cancellation.
pub async fn run_task_with_shutdown<T, R, E>(task: Box<dyn Task>, signal: T)
where
    T: Future<Output = Result<R, E>> + Send + 'static,
    E: std::fmt::Debug,
{
    let shutdown_token = CancellationToken::new();
    let mut handle = tokio::spawn(task.run(shutdown_token.clone()));

    tokio::select! {
        res = &mut handle => {
            match res {
                Ok(Ok(())) => info!("Task finished"),
                Ok(Err(err)) => error!("Task exited with error: {err:?}"),
                Err(err) => error!("Task panicked: {err:?}"),
            }
            return;
        }
        res = signal => {
            match res {
                Ok(_) => info!("Received signal, shutting down"),
                Err(err) => error!("Error while waiting for signal: {err:?}"),
            }
        }
    }

    shutdown_token.cancel();
    match handle.await {
        Ok(Ok(())) => {}
        Ok(Err(err)) => error!("Task exited with error during shutdown: {err:?}"),
        Err(err) => error!("Task panicked during shutdown: {err:?}"),
    }
}
