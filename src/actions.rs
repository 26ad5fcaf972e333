//! Read, unread and delete actions on a single message.
//!
//! Each action is submitted to the backend and the page reloads once it
//! settles, so the list reflects server state.

use crate::api::types::{ApiRequest, MessageRef};
use crate::backend::{BackendError, Outbox};
use crate::page::Page;
use log::{info, warn};

pub const DELETE_PROMPT: &str = "Vill du radera mejlet?";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dispatch {
    Sent(u64),
    Declined,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AfterSettle {
    Reload,
    Stay,
}

#[derive(Debug, Default)]
pub struct ActionDispatcher;

impl ActionDispatcher {
    pub fn mark_as_read(&self, outbox: &mut Outbox, msg: &MessageRef) -> Result<u64, BackendError> {
        info!("Marking {} as read", msg);
        outbox.submit(ApiRequest::MarkRead(msg.clone()))
    }

    pub fn mark_as_unread(
        &self,
        outbox: &mut Outbox,
        msg: &MessageRef,
    ) -> Result<u64, BackendError> {
        info!("Marking {} as unread", msg);
        outbox.submit(ApiRequest::MarkUnread(msg.clone()))
    }

    /// Asks first; a declined prompt sends nothing.
    pub fn delete_mail<P: Page>(
        &self,
        outbox: &mut Outbox,
        page: &mut P,
        msg: &MessageRef,
    ) -> Result<Dispatch, BackendError> {
        if !page.confirm(DELETE_PROMPT) {
            info!("Delete of {} declined", msg);
            return Ok(Dispatch::Declined);
        }
        info!("Deleting {}", msg);
        outbox.submit(ApiRequest::Delete(msg.clone())).map(Dispatch::Sent)
    }

    /// The page reloads whether or not the request succeeded. A failure is
    /// only logged; nothing is shown to the user.
    pub fn settle(&self, request: &ApiRequest, result: &Result<(), String>) -> AfterSettle {
        if let Err(e) = result {
            warn!(
                "{} failed for {}: {}; reloading anyway",
                request.name(),
                request.message(),
                e
            );
        }
        AfterSettle::Reload
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::testing::RecordingApi;
    use crate::backend::{self, BackendResponse};
    use crate::page::HeadlessPage;

    fn msg() -> MessageRef {
        MessageRef::new("42", "INBOX")
    }

    #[test]
    fn test_declined_delete_sends_nothing() {
        let api = RecordingApi::default();
        let (cmd_tx, resp_rx) = backend::spawn(api.clone());
        let mut outbox = Outbox::new(cmd_tx);
        let mut page = HeadlessPage::new();
        page.answer_next_confirm(false);

        let dispatch = ActionDispatcher
            .delete_mail(&mut outbox, &mut page, &msg())
            .unwrap();
        assert_eq!(dispatch, Dispatch::Declined);
        assert_eq!(page.last_prompt.as_deref(), Some("Vill du radera mejlet?"));

        drop(outbox);
        assert!(resp_rx.recv().is_err());
        assert!(api.paths().is_empty());
    }

    #[test]
    fn test_accepted_delete_is_sent() {
        let api = RecordingApi::default();
        let (cmd_tx, resp_rx) = backend::spawn(api.clone());
        let mut outbox = Outbox::new(cmd_tx);
        let mut page = HeadlessPage::new();
        page.answer_next_confirm(true);

        let dispatch = ActionDispatcher
            .delete_mail(&mut outbox, &mut page, &msg())
            .unwrap();
        assert_eq!(dispatch, Dispatch::Sent(1));

        let BackendResponse::Settled { request, .. } = resp_rx.recv().unwrap();
        assert_eq!(request, ApiRequest::Delete(msg()));
        assert_eq!(api.paths(), vec!["/api/delete/42?folder=INBOX".to_string()]);
    }

    #[test]
    fn test_settle_reloads_on_failure_too() {
        let req = ApiRequest::MarkUnread(msg());
        assert_eq!(ActionDispatcher.settle(&req, &Ok(())), AfterSettle::Reload);
        assert_eq!(
            ActionDispatcher.settle(&req, &Err("HTTP 500".to_string())),
            AfterSettle::Reload
        );
    }
}
