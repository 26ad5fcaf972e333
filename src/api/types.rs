use std::fmt;

/// A message as the server renders it into a row: uid is unique within its folder.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct MessageRef {
    pub uid: String,
    pub folder: String,
}

impl MessageRef {
    pub fn new(uid: impl Into<String>, folder: impl Into<String>) -> Self {
        Self {
            uid: uid.into(),
            folder: folder.into(),
        }
    }
}

impl fmt::Display for MessageRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.folder, self.uid)
    }
}

/// One call against the webmail server's action endpoints.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ApiRequest {
    MarkRead(MessageRef),
    MarkUnread(MessageRef),
    Delete(MessageRef),
    /// Mark-read issued when a thread is opened; deduplicated per session.
    SessionMarkRead(MessageRef),
}

impl ApiRequest {
    pub fn message(&self) -> &MessageRef {
        match self {
            ApiRequest::MarkRead(m)
            | ApiRequest::MarkUnread(m)
            | ApiRequest::Delete(m)
            | ApiRequest::SessionMarkRead(m) => m,
        }
    }

    fn route(&self) -> &'static str {
        match self {
            ApiRequest::MarkRead(_) => "/api/mark/read/",
            ApiRequest::MarkUnread(_) => "/api/mark/unread/",
            ApiRequest::Delete(_) => "/api/delete/",
            ApiRequest::SessionMarkRead(_) => "/api/mark_read/",
        }
    }

    /// Path and query, relative to the server root.
    pub fn path(&self) -> String {
        let msg = self.message();
        format!(
            "{}{}?folder={}",
            self.route(),
            urlencoding::encode(&msg.uid),
            urlencoding::encode(&msg.folder)
        )
    }

    pub fn name(&self) -> &'static str {
        match self {
            ApiRequest::MarkRead(_) => "mark_read",
            ApiRequest::MarkUnread(_) => "mark_unread",
            ApiRequest::Delete(_) => "delete",
            ApiRequest::SessionMarkRead(_) => "session_mark_read",
        }
    }
}
