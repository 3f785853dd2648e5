// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Fail-fast task group: the first error cancels every sibling

use crate::error::{Error, Result};
use std::future::Future;
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use tracing::debug;

/// A set of concurrent units of work sharing one cancellation token.
///
/// The first failing task cancels the token; `wait` returns that error once
/// every task has finished. A genuine failure is preferred over the
/// `Cancelled` errors it causes in the siblings.
pub struct TaskGroup {
    token: CancellationToken,
    tasks: JoinSet<Result<()>>,
}

impl TaskGroup {
    pub fn new(token: CancellationToken) -> Self {
        Self {
            token,
            tasks: JoinSet::new(),
        }
    }

    /// Token cancelled when any task in the group fails
    pub fn token(&self) -> CancellationToken {
        self.token.clone()
    }

    pub fn spawn<F>(&mut self, task: F)
    where
        F: Future<Output = Result<()>> + Send + 'static,
    {
        self.tasks.spawn(task);
    }

    pub async fn wait(mut self) -> Result<()> {
        let mut first_error: Option<Error> = None;

        while let Some(joined) = self.tasks.join_next().await {
            let result = match joined {
                Ok(result) => result,
                Err(e) => Err(Error::TaskPanicked(e.to_string())),
            };

            let Err(err) = result else {
                continue;
            };

            if !self.token.is_cancelled() {
                debug!("Task failed, cancelling {} siblings: {}", self.tasks.len(), err);
                self.token.cancel();
            }

            match &first_error {
                None => first_error = Some(err),
                Some(existing) if existing.is_cancellation() && !err.is_cancellation() => {
                    first_error = Some(err)
                }
                Some(_) => {}
            }
        }

        match first_error {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }
}
