use crate::api::client::MailApi;
use crate::api::types::ApiRequest;
use log::debug;
use std::sync::{mpsc, Arc};
use std::thread;
use thiserror::Error;

/// Commands sent from the page thread to the backend thread.
pub enum BackendCommand {
    Send { op_id: u64, request: ApiRequest },
    Shutdown,
}

/// Responses sent from the backend thread to the page thread.
#[derive(Debug)]
pub enum BackendResponse {
    /// Sent exactly once per `Send`, on success and on failure alike.
    Settled {
        op_id: u64,
        request: ApiRequest,
        result: Result<(), String>,
    },
}

#[derive(Debug, Error)]
pub enum BackendError {
    #[error("backend channel closed")]
    Closed,
}

/// Spawn the backend thread. Returns the command sender and response receiver.
pub fn spawn<A: MailApi>(
    api: A,
) -> (
    mpsc::Sender<BackendCommand>,
    mpsc::Receiver<BackendResponse>,
) {
    let (cmd_tx, cmd_rx) = mpsc::channel::<BackendCommand>();
    let (resp_tx, resp_rx) = mpsc::channel::<BackendResponse>();

    thread::spawn(move || {
        backend_loop(Arc::new(api), cmd_rx, resp_tx);
    });

    (cmd_tx, resp_rx)
}

/// Every request runs on its own thread, so a request that never settles
/// holds back nothing but its own completion.
fn backend_loop<A: MailApi>(
    api: Arc<A>,
    cmd_rx: mpsc::Receiver<BackendCommand>,
    resp_tx: mpsc::Sender<BackendResponse>,
) {
    while let Ok(cmd) = cmd_rx.recv() {
        match cmd {
            BackendCommand::Send { op_id, request } => {
                let api = Arc::clone(&api);
                let resp_tx = resp_tx.clone();
                thread::spawn(move || {
                    let result = api.send(&request).map_err(|e| e.to_string());
                    debug!("op {} ({}) settled: ok={}", op_id, request.name(), result.is_ok());
                    let _ = resp_tx.send(BackendResponse::Settled {
                        op_id,
                        request,
                        result,
                    });
                });
            }
            BackendCommand::Shutdown => {
                break;
            }
        }
    }
}

/// Sending half of the backend, numbering each request it submits.
pub struct Outbox {
    cmd_tx: mpsc::Sender<BackendCommand>,
    next_op_id: u64,
}

impl Outbox {
    pub fn new(cmd_tx: mpsc::Sender<BackendCommand>) -> Self {
        Outbox {
            cmd_tx,
            next_op_id: 0,
        }
    }

    pub fn submit(&mut self, request: ApiRequest) -> Result<u64, BackendError> {
        self.next_op_id += 1;
        let op_id = self.next_op_id;
        self.cmd_tx
            .send(BackendCommand::Send { op_id, request })
            .map_err(|_| BackendError::Closed)?;
        Ok(op_id)
    }
}

impl Drop for Outbox {
    fn drop(&mut self) {
        let _ = self.cmd_tx.send(BackendCommand::Shutdown);
    }
}
