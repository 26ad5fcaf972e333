//! Page controller: owns everything that lives for one page load.

use crate::actions::{ActionDispatcher, AfterSettle, Dispatch};
use crate::api::types::{ApiRequest, MessageRef};
use crate::backend::{BackendCommand, BackendError, BackendResponse, Outbox};
use crate::compose::{ComposeError, ReplyComposer};
use crate::page::{Frame, FrameError, Page};
use crate::tracker::{self, FrameResize, ReadTracker};
use log::{debug, info};
use std::sync::mpsc;

/// Outcome of one settled backend operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settled {
    pub op_id: u64,
    pub request: ApiRequest,
    pub result: Result<(), String>,
    pub reloaded: bool,
}

pub struct PageSession<P: Page> {
    page: P,
    outbox: Outbox,
    resp_rx: mpsc::Receiver<BackendResponse>,
    dispatcher: ActionDispatcher,
    composer: ReplyComposer,
    tracker: ReadTracker,
    min_frame_height: u32,
    /// Settled while waiting for another op; handed out by the next `pump`.
    backlog: Vec<Settled>,
}

impl<P: Page> PageSession<P> {
    pub fn new(
        page: P,
        cmd_tx: mpsc::Sender<BackendCommand>,
        resp_rx: mpsc::Receiver<BackendResponse>,
        composer: ReplyComposer,
        min_frame_height: u32,
    ) -> Self {
        PageSession {
            page,
            outbox: Outbox::new(cmd_tx),
            resp_rx,
            dispatcher: ActionDispatcher,
            composer,
            tracker: ReadTracker::new(),
            min_frame_height,
            backlog: Vec::new(),
        }
    }

    pub fn page(&self) -> &P {
        &self.page
    }

    pub fn page_mut(&mut self) -> &mut P {
        &mut self.page
    }

    pub fn tracker(&self) -> &ReadTracker {
        &self.tracker
    }

    pub fn mark_as_read(&mut self, msg: &MessageRef) -> Result<u64, BackendError> {
        self.dispatcher.mark_as_read(&mut self.outbox, msg)
    }

    pub fn mark_as_unread(&mut self, msg: &MessageRef) -> Result<u64, BackendError> {
        self.dispatcher.mark_as_unread(&mut self.outbox, msg)
    }

    pub fn delete_mail(&mut self, msg: &MessageRef) -> Result<Dispatch, BackendError> {
        self.dispatcher
            .delete_mail(&mut self.outbox, &mut self.page, msg)
    }

    pub fn open_thread(
        &mut self,
        thread_id: &str,
        msg: &MessageRef,
        is_unread: bool,
    ) -> Result<Option<u64>, BackendError> {
        self.tracker
            .open_thread(&mut self.outbox, &mut self.page, thread_id, msg, is_unread)
    }

    pub fn reply_raw(&mut self, uid: &str, from: &str) -> Result<String, ComposeError> {
        self.composer.reply_raw(&mut self.page, uid, from)
    }

    pub fn reply_encoded(&mut self, encoded: &str, from: &str) -> Result<String, ComposeError> {
        self.composer.reply_encoded(&mut self.page, encoded, from)
    }

    /// Fit `frame` to its content. Access failures are logged and the frame
    /// keeps its height; the error is still handed back to the caller.
    pub fn resize_frame<F: Frame>(&self, frame: &mut F) -> Result<FrameResize, FrameError> {
        let result = tracker::resize_frame(frame, self.min_frame_height);
        if let Err(ref e) = result {
            debug!("Frame resize skipped: {}", e);
        }
        result
    }

    /// Route a completion. Read/unread/delete reload the page, which also
    /// discards the read tracker.
    pub fn settle(&mut self, response: BackendResponse) -> Settled {
        let BackendResponse::Settled {
            op_id,
            request,
            result,
        } = response;

        let after = match request {
            ApiRequest::SessionMarkRead(_) => {
                self.tracker.settle(&request, &result);
                AfterSettle::Stay
            }
            ApiRequest::MarkRead(_) | ApiRequest::MarkUnread(_) | ApiRequest::Delete(_) => {
                self.dispatcher.settle(&request, &result)
            }
        };

        let reloaded = after == AfterSettle::Reload;
        if reloaded {
            self.reload();
        }

        Settled {
            op_id,
            request,
            result,
            reloaded,
        }
    }

    fn reload(&mut self) {
        info!("Reloading page");
        self.page.reload();
        self.tracker = ReadTracker::new();
    }

    /// Settle everything that has already completed, without blocking.
    pub fn pump(&mut self) -> Vec<Settled> {
        let mut settled = std::mem::take(&mut self.backlog);
        while let Ok(resp) = self.resp_rx.try_recv() {
            settled.push(self.settle(resp));
        }
        settled
    }

    /// Block until `op_id` settles. Other completions are settled on the way
    /// and kept for the next `pump`.
    pub fn wait_for(&mut self, op_id: u64) -> Result<Settled, BackendError> {
        if let Some(pos) = self.backlog.iter().position(|s| s.op_id == op_id) {
            return Ok(self.backlog.remove(pos));
        }
        loop {
            let resp = self.resp_rx.recv().map_err(|_| BackendError::Closed)?;
            let settled = self.settle(resp);
            if settled.op_id == op_id {
                return Ok(settled);
            }
            self.backlog.push(settled);
        }
    }
}
