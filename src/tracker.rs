use crate::api::types::{ApiRequest, MessageRef};
use crate::backend::{BackendError, Outbox};
use crate::page::{Frame, FrameError, Page};
use log::{debug, warn};
use std::collections::HashSet;

pub const DEFAULT_MIN_FRAME_HEIGHT: u32 = 20;

/// Uids marked read since the page was loaded.
///
/// Membership is never rolled back: a failed mark-read still suppresses
/// further calls for that uid until the next reload.
#[derive(Debug, Default)]
pub struct ReadTracker {
    marked: HashSet<String>,
}

impl ReadTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_marked(&self, uid: &str) -> bool {
        self.marked.contains(uid)
    }

    pub fn marked(&self) -> impl Iterator<Item = &str> {
        self.marked.iter().map(String::as_str)
    }

    /// Returns the op id of the mark-read call, if one was issued.
    pub fn open_thread<P: Page>(
        &mut self,
        outbox: &mut Outbox,
        page: &mut P,
        thread_id: &str,
        msg: &MessageRef,
        is_unread: bool,
    ) -> Result<Option<u64>, BackendError> {
        page.set_active_thread(thread_id);

        if !is_unread || !self.marked.insert(msg.uid.clone()) {
            return Ok(None);
        }
        debug!("Thread {} opened; marking {} read", thread_id, msg);
        outbox.submit(ApiRequest::SessionMarkRead(msg.clone())).map(Some)
    }

    pub fn settle(&self, request: &ApiRequest, result: &Result<(), String>) {
        if let Err(e) = result {
            warn!("Could not mark {} as read: {}", request.message(), e);
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameResize {
    Resized(u32),
    /// Content not taller than the threshold; likely not loaded yet.
    Unchanged(u32),
}

/// Fit a frame to its content height.
pub fn resize_frame<F: Frame>(frame: &mut F, min_height: u32) -> Result<FrameResize, FrameError> {
    let height = frame.content_height()?;
    if height > min_height {
        frame.set_height(height);
        Ok(FrameResize::Resized(height))
    } else {
        Ok(FrameResize::Unchanged(height))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::testing::RecordingApi;
    use crate::backend::{self, BackendResponse};
    use crate::page::{HeadlessFrame, HeadlessPage};

    #[test]
    fn test_open_thread_marks_once_per_uid() {
        let api = RecordingApi::default();
        let (cmd_tx, resp_rx) = backend::spawn(api.clone());
        let mut outbox = Outbox::new(cmd_tx);
        let mut page = HeadlessPage::new();
        let mut tracker = ReadTracker::new();
        let msg = MessageRef::new("7", "INBOX");

        let first = tracker
            .open_thread(&mut outbox, &mut page, "t7", &msg, true)
            .unwrap();
        let second = tracker
            .open_thread(&mut outbox, &mut page, "t7", &msg, true)
            .unwrap();
        assert_eq!(first, Some(1));
        assert_eq!(second, None);
        assert_eq!(page.active_thread.as_deref(), Some("t7"));

        let BackendResponse::Settled { op_id, .. } = resp_rx.recv().unwrap();
        assert_eq!(op_id, 1);
        drop(outbox);
        assert!(resp_rx.recv().is_err());
        assert_eq!(api.paths(), vec!["/api/mark_read/7?folder=INBOX".to_string()]);
    }

    #[test]
    fn test_open_read_thread_sends_nothing() {
        let (cmd_tx, _resp_rx) = backend::spawn(RecordingApi::default());
        let mut outbox = Outbox::new(cmd_tx);
        let mut page = HeadlessPage::new();
        let mut tracker = ReadTracker::new();

        let op = tracker
            .open_thread(&mut outbox, &mut page, "t1", &MessageRef::new("1", "INBOX"), false)
            .unwrap();
        assert_eq!(op, None);
        assert!(!tracker.is_marked("1"));
        assert_eq!(page.active_thread.as_deref(), Some("t1"));
    }

    #[test]
    fn test_failed_mark_keeps_uid_tracked() {
        let (cmd_tx, resp_rx) = backend::spawn(RecordingApi::default());
        let mut outbox = Outbox::new(cmd_tx);
        let mut page = HeadlessPage::new();
        let mut tracker = ReadTracker::new();
        let msg = MessageRef::new("broken-3", "INBOX");

        tracker
            .open_thread(&mut outbox, &mut page, "t3", &msg, true)
            .unwrap();
        let BackendResponse::Settled { request, result, .. } = resp_rx.recv().unwrap();
        assert!(result.is_err());
        tracker.settle(&request, &result);

        assert!(tracker.is_marked("broken-3"));
        let again = tracker
            .open_thread(&mut outbox, &mut page, "t3", &msg, true)
            .unwrap();
        assert_eq!(again, None);
    }

    #[test]
    fn test_resize_frame_threshold() {
        let mut frame = HeadlessFrame {
            height: 150,
            content: Ok(15),
        };
        assert_eq!(resize_frame(&mut frame, 20), Ok(FrameResize::Unchanged(15)));
        assert_eq!(frame.height, 150);

        frame.content = Ok(20);
        assert_eq!(resize_frame(&mut frame, 20), Ok(FrameResize::Unchanged(20)));
        assert_eq!(frame.height, 150);

        frame.content = Ok(300);
        assert_eq!(resize_frame(&mut frame, 20), Ok(FrameResize::Resized(300)));
        assert_eq!(frame.height, 300);
    }

    #[test]
    fn test_resize_inaccessible_frame_keeps_height() {
        let mut frame = HeadlessFrame {
            height: 120,
            content: Err(FrameError::Inaccessible("cross-origin".to_string())),
        };
        assert!(resize_frame(&mut frame, 20).is_err());
        assert_eq!(frame.height, 120);
    }
}
