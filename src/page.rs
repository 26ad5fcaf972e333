use log::info;
use std::collections::HashMap;
use thiserror::Error;

/// What the components need from the rendered page.
pub trait Page {
    /// Raw text of a message body as rendered for `uid`, if present.
    fn raw_body(&self, uid: &str) -> Option<String>;
    fn set_reply_text(&mut self, text: &str);
    /// Remove the hidden flag from the reply container.
    fn show_reply(&mut self);
    fn scroll_reply_into_view(&mut self);
    fn focus_reply(&mut self);
    fn set_active_thread(&mut self, thread_id: &str);
    /// Blocking yes/no prompt.
    fn confirm(&mut self, prompt: &str) -> bool;
    /// Full reload. Everything held in memory by the page is discarded.
    fn reload(&mut self);
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FrameError {
    #[error("frame content inaccessible: {0}")]
    Inaccessible(String),
}

/// An embedded frame rendering a message body.
pub trait Frame {
    fn content_height(&self) -> Result<u32, FrameError>;
    fn set_height(&mut self, px: u32);
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReplyBox {
    pub text: String,
    pub hidden: bool,
    pub focused: bool,
    pub scrolled_into_view: bool,
}

impl ReplyBox {
    fn new() -> Self {
        ReplyBox {
            hidden: true,
            ..Default::default()
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HeadlessFrame {
    pub height: u32,
    pub content: Result<u32, FrameError>,
}

impl Default for HeadlessFrame {
    fn default() -> Self {
        HeadlessFrame {
            height: 0,
            content: Ok(0),
        }
    }
}

impl Frame for HeadlessFrame {
    fn content_height(&self) -> Result<u32, FrameError> {
        self.content.clone()
    }

    fn set_height(&mut self, px: u32) {
        self.height = px;
    }
}

/// In-memory page used by the CLI host.
///
/// Confirmation answers are queued ahead of time; an unanswered prompt is a decline.
#[derive(Debug)]
pub struct HeadlessPage {
    bodies: HashMap<String, String>,
    pub frames: HashMap<String, HeadlessFrame>,
    pub reply: ReplyBox,
    pub active_thread: Option<String>,
    pub reloads: u32,
    /// Text of the most recent confirmation prompt.
    pub last_prompt: Option<String>,
    confirm_answer: Option<bool>,
}

impl Default for HeadlessPage {
    fn default() -> Self {
        Self::new()
    }
}

impl HeadlessPage {
    pub fn new() -> Self {
        HeadlessPage {
            bodies: HashMap::new(),
            frames: HashMap::new(),
            reply: ReplyBox::new(),
            active_thread: None,
            reloads: 0,
            last_prompt: None,
            confirm_answer: None,
        }
    }

    /// Server-rendered body text for a message row.
    pub fn render_body(&mut self, uid: &str, body: &str) {
        self.bodies.insert(uid.to_string(), body.to_string());
    }

    pub fn answer_next_confirm(&mut self, answer: bool) {
        self.confirm_answer = Some(answer);
    }

    pub fn frame_mut(&mut self, name: &str) -> &mut HeadlessFrame {
        self.frames.entry(name.to_string()).or_default()
    }
}

impl Page for HeadlessPage {
    fn raw_body(&self, uid: &str) -> Option<String> {
        self.bodies.get(uid).cloned()
    }

    fn set_reply_text(&mut self, text: &str) {
        self.reply.text = text.to_string();
    }

    fn show_reply(&mut self) {
        self.reply.hidden = false;
    }

    fn scroll_reply_into_view(&mut self) {
        self.reply.scrolled_into_view = true;
    }

    fn focus_reply(&mut self) {
        self.reply.focused = true;
    }

    fn set_active_thread(&mut self, thread_id: &str) {
        self.active_thread = Some(thread_id.to_string());
    }

    fn confirm(&mut self, prompt: &str) -> bool {
        let answer = self.confirm_answer.take().unwrap_or(false);
        info!("confirm \"{}\" -> {}", prompt, answer);
        self.last_prompt = Some(prompt.to_string());
        answer
    }

    fn reload(&mut self) {
        // Bodies and frames are server-rendered and come back with the page.
        self.reloads += 1;
        self.reply = ReplyBox::new();
        self.active_thread = None;
        self.confirm_answer = None;
    }
}
