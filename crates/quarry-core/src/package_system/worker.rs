use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;

use crate::host::context::{HostContext, LoadOptions};
use crate::host::error::{Error, Result};
use crate::package_system::error::PackageSystemError;
use crate::package_system::lifecycle::{Orchestrator, RuntimeError};
use crate::package_system::sort::resolve_load_order;
use crate::package_system::validator::Validator;

/// External collaborator that compiles a package source into a loadable
/// artifact. Build requests queue on the same worker as load batches and run
/// one at a time.
#[async_trait]
pub trait PackageBuilder: Send + Sync {
    async fn build(&self, name: &str) -> std::result::Result<(), RuntimeError>;
}

/// Run one complete load attempt: select candidates, validate, resolve the
/// load order, and drive the batch through the orchestrator.
///
/// Ordering-stage failures (cycles, stability violations) disable every
/// implicated package before surfacing, matching the validator's behavior.
pub async fn run_load_attempt(
    ctx: &mut HostContext,
    orchestrator: &mut Orchestrator,
    opts: &LoadOptions,
) -> Result<Vec<String>> {
    let candidates = ctx.select_candidates(opts).await?;
    log::info!("Load attempt with {} candidate(s)", candidates.len());

    let enabled = ctx.enabled().clone();
    let mut enabled = enabled.lock().await;

    Validator::new(opts.include_weak).validate(&candidates, &mut enabled)?;

    let order = match resolve_load_order(&candidates, opts.include_weak) {
        Ok(order) => order,
        Err(e) => {
            log::error!("{}", e);
            for name in e.implicated() {
                if let Err(persist) = enabled.disable(&name) {
                    log::warn!("Failed to persist disable for '{}': {}", name, persist);
                }
            }
            return Err(e.into());
        }
    };

    orchestrator.load_batch(&order, &mut enabled).await?;
    Ok(orchestrator.loaded_names())
}

enum Request {
    Load {
        opts: LoadOptions,
        reply: oneshot::Sender<Result<Vec<String>>>,
    },
    Unload {
        reply: oneshot::Sender<Result<()>>,
    },
    Build {
        name: String,
        reply: oneshot::Sender<Result<()>>,
    },
}

/// The single dedicated background worker.
///
/// Owns the context and orchestrator; requests queue on an mpsc channel and
/// are processed strictly one at a time, so batches never overlap and the
/// interactive caller is never blocked. There is no cancellation of an
/// in-flight batch: a new request only starts after the current one
/// terminates.
pub struct LoadWorker {
    tx: mpsc::UnboundedSender<Request>,
    handle: JoinHandle<()>,
}

impl LoadWorker {
    /// Spawn the worker task.
    pub fn spawn(
        mut ctx: HostContext,
        mut orchestrator: Orchestrator,
        builder: Option<Arc<dyn PackageBuilder>>,
    ) -> Self {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let handle = tokio::spawn(async move {
            while let Some(request) = rx.recv().await {
                match request {
                    Request::Load { opts, reply } => {
                        let result = run_load_attempt(&mut ctx, &mut orchestrator, &opts).await;
                        let _ = reply.send(result);
                    }
                    Request::Unload { reply } => {
                        let result = orchestrator.unload_batch().await.map_err(Error::from);
                        let _ = reply.send(result);
                    }
                    Request::Build { name, reply } => {
                        let result = match &builder {
                            Some(builder) => {
                                builder.build(&name).await.map_err(|e| {
                                    Error::PackageSystem(PackageSystemError::BuildFailure {
                                        package: name.clone(),
                                        message: e.to_string(),
                                    })
                                })
                            }
                            None => Err(Error::PackageSystem(PackageSystemError::BuildFailure {
                                package: name.clone(),
                                message: "no builder configured".to_string(),
                            })),
                        };
                        if let Err(e) = &result {
                            log::error!("{}", e);
                        }
                        let _ = reply.send(result);
                    }
                }
            }
        });
        Self { tx, handle }
    }

    /// Queue a load batch and wait for its outcome.
    pub async fn load(&self, opts: LoadOptions) -> Result<Vec<String>> {
        let (reply, rx) = oneshot::channel();
        self.send(Request::Load { opts, reply })?;
        Self::receive(rx).await
    }

    /// Queue an unload batch and wait for its outcome.
    pub async fn unload(&self) -> Result<()> {
        let (reply, rx) = oneshot::channel();
        self.send(Request::Unload { reply })?;
        Self::receive(rx).await
    }

    /// Queue a build request and wait for its outcome.
    pub async fn build(&self, name: &str) -> Result<()> {
        let (reply, rx) = oneshot::channel();
        self.send(Request::Build {
            name: name.to_string(),
            reply,
        })?;
        Self::receive(rx).await
    }

    /// Stop accepting requests and wait for queued ones to finish.
    pub async fn shutdown(self) {
        drop(self.tx);
        if let Err(e) = self.handle.await {
            log::warn!("Load worker task ended abnormally: {}", e);
        }
    }

    fn send(&self, request: Request) -> Result<()> {
        self.tx
            .send(request)
            .map_err(|_| Error::Other("load worker is no longer running".to_string()))
    }

    async fn receive<T>(rx: oneshot::Receiver<Result<T>>) -> Result<T> {
        rx.await
            .map_err(|_| Error::Other("load worker dropped the request".to_string()))?
    }
}
