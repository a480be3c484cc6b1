//! The process-wide bithorde connection.
//!
//! [`BithordeResolver::start`] spawns one dedicated thread running a
//! single-threaded Tokio runtime that owns the daemon socket for the rest of
//! the process. Callers talk to it through an unbounded command channel, so
//! [`submit`](AssetResolver::submit) never blocks. The background task keeps
//! a correlation table from [`RequestId`] to the pending request and its
//! reply channel, and a single read loop demultiplexes responses onto it.

use std::collections::HashMap;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::mpsc as std_mpsc;
use std::thread::JoinHandle;
use std::time::Duration;

use futures::StreamExt;
use hordebrowse_common::RequestId;
use tokio::io::AsyncWriteExt;
use tokio::net::unix::{OwnedReadHalf, OwnedWriteHalf};
use tokio::net::UnixStream;
use tokio::sync::mpsc;
use tokio_util::codec::{FramedRead, LinesCodec, LinesCodecError};
use tracing::{debug, info, trace, warn};

use super::protocol::{decode_response, encode_line, response_id, LookupRequest};
use super::{
    AssetResolver, Completion, CompletionSender, FailureReason, ResolutionOutcome,
    ResolutionRequest, ResolverError,
};

/// Longest response line accepted from the daemon.
pub const MAX_LINE_LENGTH: usize = 64 * 1024;

type Lines = FramedRead<OwnedReadHalf, LinesCodec>;

enum Command {
    Submit {
        request: ResolutionRequest,
        reply: CompletionSender,
    },
    Clear,
}

/// Handle to the background resolver thread.
///
/// Dropping the handle closes the command channel; the background task then
/// fails whatever is still pending and exits.
pub struct BithordeResolver {
    commands: mpsc::UnboundedSender<Command>,
    thread: Option<JoinHandle<()>>,
}

impl BithordeResolver {
    /// Connect to the daemon socket and start the background thread.
    ///
    /// Blocks until the connection is established or has failed. A failure
    /// here is fatal for the browser: nothing can be resolved without it.
    pub fn start(socket: &Path, connect_timeout: Duration) -> Result<Self, ResolverError> {
        let (commands, command_rx) = mpsc::unbounded_channel();
        let (ready_tx, ready_rx) = std_mpsc::sync_channel(1);
        let socket = socket.to_path_buf();

        let thread = std::thread::Builder::new()
            .name("bithorde-resolver".into())
            .spawn(move || {
                let runtime = match tokio::runtime::Builder::new_current_thread()
                    .enable_all()
                    .build()
                {
                    Ok(runtime) => runtime,
                    Err(e) => {
                        let _ = ready_tx.send(Err(ResolverError::Io(e)));
                        return;
                    }
                };
                runtime.block_on(run(socket, connect_timeout, command_rx, ready_tx));
            })?;

        match ready_rx.recv() {
            Ok(Ok(())) => Ok(Self {
                commands,
                thread: Some(thread),
            }),
            Ok(Err(e)) => {
                let _ = thread.join();
                Err(e)
            }
            Err(_) => {
                let _ = thread.join();
                Err(ResolverError::Startup(
                    "resolver thread exited before connecting".into(),
                ))
            }
        }
    }

    /// Close the connection and wait for the background thread to finish.
    ///
    /// Pending requests complete with [`FailureReason::Disconnected`].
    pub fn shutdown(self) {
        let Self { commands, thread } = self;
        drop(commands);
        if let Some(handle) = thread {
            if handle.join().is_err() {
                warn!("Resolver thread panicked during shutdown");
            }
        }
    }
}

impl fmt::Debug for BithordeResolver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BithordeResolver")
            .field("running", &!self.commands.is_closed())
            .finish_non_exhaustive()
    }
}

impl AssetResolver for BithordeResolver {
    fn submit(&self, request: ResolutionRequest, reply: CompletionSender) {
        trace!(fingerprint = %request.fingerprint, generation = %request.generation, "Submitting lookup");

        if let Err(mpsc::error::SendError(command)) =
            self.commands.send(Command::Submit { request, reply })
        {
            if let Command::Submit { request, reply } = command {
                let completion = Completion {
                    request,
                    outcome: ResolutionOutcome::Failure(FailureReason::Disconnected),
                };
                if let Err(e) = reply.try_send(completion) {
                    warn!(error = %e, "Failed to deliver disconnected completion");
                }
            }
        }
    }

    fn clear(&self) {
        if self.commands.send(Command::Clear).is_err() {
            debug!("Resolver already stopped; nothing to clear");
        }
    }
}

async fn run(
    socket: PathBuf,
    connect_timeout: Duration,
    commands: mpsc::UnboundedReceiver<Command>,
    ready: std_mpsc::SyncSender<Result<(), ResolverError>>,
) {
    let stream = match tokio::time::timeout(connect_timeout, UnixStream::connect(&socket)).await {
        Ok(Ok(stream)) => stream,
        Ok(Err(source)) => {
            let _ = ready.send(Err(ResolverError::Connect {
                path: socket,
                source,
            }));
            return;
        }
        Err(_) => {
            let _ = ready.send(Err(ResolverError::Startup(format!(
                "timed out after {:?} connecting to {:?}",
                connect_timeout, socket
            ))));
            return;
        }
    };

    info!(socket = ?socket, "Connected to bithorde");
    let _ = ready.send(Ok(()));

    Connection::new(stream).serve(commands).await;

    info!("Resolver stopped");
}

struct Pending {
    request: ResolutionRequest,
    reply: CompletionSender,
}

struct Connection {
    reader: Option<Lines>,
    writer: Option<OwnedWriteHalf>,
    next_id: u64,
    pending: HashMap<RequestId, Pending>,
}

impl Connection {
    fn new(stream: UnixStream) -> Self {
        let (read, write) = stream.into_split();
        Self {
            reader: Some(FramedRead::new(
                read,
                LinesCodec::new_with_max_length(MAX_LINE_LENGTH),
            )),
            writer: Some(write),
            next_id: 0,
            pending: HashMap::new(),
        }
    }

    async fn serve(mut self, mut commands: mpsc::UnboundedReceiver<Command>) {
        loop {
            tokio::select! {
                command = commands.recv() => match command {
                    Some(Command::Submit { request, reply }) => self.submit(request, reply).await,
                    Some(Command::Clear) => self.clear().await,
                    None => break,
                },
                line = next_line(&mut self.reader) => match line {
                    Some(Ok(line)) => self.dispatch(&line).await,
                    Some(Err(LinesCodecError::MaxLineLengthExceeded)) => {
                        warn!(max = MAX_LINE_LENGTH, "Response line too long; dropping connection");
                        self.disconnect().await;
                    }
                    None => {
                        warn!("bithorde closed the connection");
                        self.disconnect().await;
                    }
                    Some(Err(LinesCodecError::Io(e))) => {
                        warn!(error = %e, "Failed reading from bithorde");
                        self.disconnect().await;
                    }
                },
            }
        }

        self.disconnect().await;
    }

    async fn submit(&mut self, request: ResolutionRequest, reply: CompletionSender) {
        let Some(writer) = self.writer.as_mut() else {
            complete(reply, request, ResolutionOutcome::Failure(FailureReason::Disconnected))
                .await;
            return;
        };

        self.next_id += 1;
        let id = RequestId::from(self.next_id);
        let message = LookupRequest {
            id,
            tree_tiger: request.fingerprint.as_str().to_string(),
        };

        let written = match encode_line(&message) {
            Ok(line) => writer.write_all(line.as_bytes()).await.map_err(ResolverError::Io),
            Err(e) => Err(e),
        };

        match written {
            Ok(()) => {
                self.pending.insert(id, Pending { request, reply });
            }
            Err(e) => {
                warn!(error = %e, "Failed writing lookup to bithorde");
                complete(reply, request, ResolutionOutcome::Failure(FailureReason::Disconnected))
                    .await;
                self.disconnect().await;
            }
        }
    }

    async fn dispatch(&mut self, line: &str) {
        let response = match decode_response(line) {
            Ok(response) => response,
            Err(e) => {
                warn!(error = %e, "Malformed response from bithorde");
                let pending = response_id(line).and_then(|id| self.pending.remove(&id));
                if let Some(Pending { request, reply }) = pending {
                    let outcome = ResolutionOutcome::Failure(FailureReason::Rejected(e.to_string()));
                    complete(reply, request, outcome).await;
                }
                return;
            }
        };

        let Some(Pending { request, reply }) = self.pending.remove(&response.id) else {
            trace!(id = %response.id, "Response for cleared or unknown request");
            return;
        };

        let outcome = response.into_outcome(request.fingerprint.clone());
        trace!(fingerprint = %request.fingerprint, success = outcome.is_success(), "Lookup completed");
        complete(reply, request, outcome).await;
    }

    async fn clear(&mut self) {
        if !self.pending.is_empty() {
            debug!(pending = self.pending.len(), "Clearing pending lookups");
        }
        self.fail_pending(FailureReason::Cancelled).await;
    }

    async fn disconnect(&mut self) {
        self.reader = None;
        if let Some(mut writer) = self.writer.take() {
            let _ = writer.shutdown().await;
        }
        self.fail_pending(FailureReason::Disconnected).await;
    }

    async fn fail_pending(&mut self, reason: FailureReason) {
        let mut pending: Vec<_> = self.pending.drain().collect();
        pending.sort_by_key(|(id, _)| *id);
        for (_, Pending { request, reply }) in pending {
            complete(reply, request, ResolutionOutcome::Failure(reason.clone())).await;
        }
    }
}

/// Read the next line, or wait forever once the connection is gone.
async fn next_line(reader: &mut Option<Lines>) -> Option<Result<String, LinesCodecError>> {
    match reader {
        Some(lines) => lines.next().await,
        None => std::future::pending().await,
    }
}

async fn complete(reply: CompletionSender, request: ResolutionRequest, outcome: ResolutionOutcome) {
    if reply.send(Completion { request, outcome }).await.is_err() {
        trace!("Completion receiver dropped");
    }
}
