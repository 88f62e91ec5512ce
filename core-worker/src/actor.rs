//! # Worker Actor
//!
//! Runs a [`CacheCoordinator`] on its own task. Pages reach it only through
//! a [`WorkerHandle`], which sends commands over a channel and awaits the
//! reply; the two sides never share state.

use crate::coordinator::CacheCoordinator;
use crate::error::{Result, WorkerError};
use crate::lifecycle::WorkerState;
use crate::response::FetchOutcome;
use bridge_traits::error::Result as BridgeResult;
use bridge_traits::{BridgeError, HttpRequest, WorkerHost, WorkerMessage, WorkerRegistration};
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tracing::{debug, info};

/// Capacity of the command channel.
const COMMAND_BUFFER: usize = 64;

enum WorkerCommand {
    Register {
        reply: oneshot::Sender<Result<WorkerRegistration>>,
    },
    Message {
        message: WorkerMessage,
        reply: oneshot::Sender<()>,
    },
    Fetch {
        request: HttpRequest,
        reply: oneshot::Sender<FetchOutcome>,
    },
    State {
        reply: oneshot::Sender<WorkerState>,
    },
}

/// Page-side handle to a running worker.
///
/// Cloning is cheap; the worker stops once every handle is dropped.
#[derive(Clone, Debug)]
pub struct WorkerHandle {
    commands: mpsc::Sender<WorkerCommand>,
}

impl std::fmt::Debug for WorkerCommand {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            WorkerCommand::Register { .. } => "Register",
            WorkerCommand::Message { .. } => "Message",
            WorkerCommand::Fetch { .. } => "Fetch",
            WorkerCommand::State { .. } => "State",
        };
        f.write_str(name)
    }
}

/// Start `coordinator` on a new task.
///
/// Must be called from within a tokio runtime.
pub fn spawn_worker(coordinator: CacheCoordinator) -> (WorkerHandle, JoinHandle<()>) {
    let (commands, receiver) = mpsc::channel(COMMAND_BUFFER);
    let task = tokio::spawn(run(coordinator, receiver));
    (WorkerHandle { commands }, task)
}

async fn run(mut coordinator: CacheCoordinator, mut commands: mpsc::Receiver<WorkerCommand>) {
    coordinator.restore().await;
    info!(
        version = %coordinator.version(),
        state = %coordinator.state(),
        "Cache worker started"
    );

    while let Some(command) = commands.recv().await {
        match command {
            WorkerCommand::Register { reply } => {
                let _ = reply.send(coordinator.register().await);
            }
            WorkerCommand::Message { message, reply } => {
                match message {
                    WorkerMessage::SkipWaiting => coordinator.skip_waiting().await,
                }
                let _ = reply.send(());
            }
            WorkerCommand::Fetch { request, reply } => match coordinator.fetch_handler() {
                Some(handler) => {
                    tokio::spawn(async move {
                        let _ = reply.send(handler.handle(request).await);
                    });
                }
                None => {
                    let _ = reply.send(FetchOutcome::PassThrough);
                }
            },
            WorkerCommand::State { reply } => {
                let _ = reply.send(coordinator.state());
            }
        }
    }

    debug!("All worker handles dropped, stopping cache worker");
}

impl WorkerHandle {
    async fn request<T>(&self, build: impl FnOnce(oneshot::Sender<T>) -> WorkerCommand) -> Result<T> {
        let (reply, response) = oneshot::channel();
        self.commands
            .send(build(reply))
            .await
            .map_err(|_| WorkerError::ChannelClosed)?;
        response.await.map_err(|_| WorkerError::ChannelClosed)
    }

    /// Install (and possibly activate) the worker version.
    pub async fn register(&self) -> Result<WorkerRegistration> {
        self.request(|reply| WorkerCommand::Register { reply })
            .await?
    }

    /// Deliver a page message.
    pub async fn post_message(&self, message: WorkerMessage) -> Result<()> {
        self.request(|reply| WorkerCommand::Message { message, reply })
            .await
    }

    /// Route a page request through the worker.
    ///
    /// A stopped worker intercepts nothing, so this yields
    /// [`FetchOutcome::PassThrough`].
    pub async fn fetch(&self, request: HttpRequest) -> FetchOutcome {
        self.request(|reply| WorkerCommand::Fetch { request, reply })
            .await
            .unwrap_or(FetchOutcome::PassThrough)
    }

    /// Current lifecycle state.
    pub async fn state(&self) -> Result<WorkerState> {
        self.request(|reply| WorkerCommand::State { reply }).await
    }
}

#[cfg_attr(target_arch = "wasm32", async_trait::async_trait(?Send))]
#[cfg_attr(not(target_arch = "wasm32"), async_trait::async_trait)]
impl WorkerHost for WorkerHandle {
    async fn register(&self) -> BridgeResult<WorkerRegistration> {
        WorkerHandle::register(self).await.map_err(to_bridge_error)
    }

    async fn post_message(&self, message: WorkerMessage) -> BridgeResult<()> {
        WorkerHandle::post_message(self, message)
            .await
            .map_err(to_bridge_error)
    }
}

fn to_bridge_error(err: WorkerError) -> BridgeError {
    match err {
        WorkerError::ChannelClosed => BridgeError::NotAvailable(err.to_string()),
        WorkerError::Network(message) => BridgeError::Network(message),
        other => BridgeError::OperationFailed(other.to_string()),
    }
}
