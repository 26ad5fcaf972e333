use crate::page::Page;
use base64::alphabet;
use base64::engine::{DecodePaddingMode, GeneralPurpose, GeneralPurposeConfig};
use base64::Engine;
use log::{debug, error};
use thiserror::Error;

pub const DEFAULT_EXCERPT_CHARS: usize = 500;
pub const DEFAULT_ATTRIBUTION: &str = "skrev";

#[derive(Debug, Error)]
pub enum ComposeError {
    #[error("no rendered body for message {0}")]
    MissingBody(String),
    #[error("reply body is not valid base64: {0}")]
    Decode(#[from] base64::DecodeError),
    #[error("reply body is not valid UTF-8: {0}")]
    Utf8(#[from] std::string::FromUtf8Error),
}

/// Build the quoted reply text.
///
/// Only the first `limit` characters of `body` are quoted. Every newline in
/// the excerpt continues the quote with `"> "`.
pub fn quote_reply(from: &str, body: &str, limit: usize, attribution: &str) -> String {
    let excerpt: String = body.chars().take(limit).collect();
    format!(
        "\n\n--- {} {} ---\n> {}",
        from,
        attribution,
        excerpt.replace('\n', "\n> ")
    )
}

/// Standard alphabet, padding optional, stray trailing bits ignored, as in
/// the browser's `atob`.
const FORGIVING: GeneralPurpose = GeneralPurpose::new(
    &alphabet::STANDARD,
    GeneralPurposeConfig::new()
        .with_decode_padding_mode(DecodePaddingMode::Indifferent)
        .with_decode_allow_trailing_bits(true),
);

/// Decode a base64 transport body into UTF-8 text.
pub fn decode_body(encoded: &str) -> Result<String, ComposeError> {
    let compact: String = encoded
        .chars()
        .filter(|c| !c.is_ascii_whitespace())
        .collect();
    let bytes = FORGIVING.decode(compact)?;
    Ok(String::from_utf8(bytes)?)
}

#[derive(Debug, Clone)]
pub struct ReplyComposer {
    pub excerpt_chars: usize,
    pub attribution: String,
}

impl Default for ReplyComposer {
    fn default() -> Self {
        ReplyComposer {
            excerpt_chars: DEFAULT_EXCERPT_CHARS,
            attribution: DEFAULT_ATTRIBUTION.to_string(),
        }
    }
}

impl ReplyComposer {
    pub fn new(excerpt_chars: usize, attribution: &str) -> Self {
        ReplyComposer {
            excerpt_chars,
            attribution: attribution.to_string(),
        }
    }

    pub fn quote(&self, from: &str, body: &str) -> String {
        quote_reply(from, body, self.excerpt_chars, &self.attribution)
    }

    /// Quote the body already rendered on the page for `uid`.
    pub fn reply_raw<P: Page>(
        &self,
        page: &mut P,
        uid: &str,
        from: &str,
    ) -> Result<String, ComposeError> {
        let body = page
            .raw_body(uid)
            .ok_or_else(|| ComposeError::MissingBody(uid.to_string()))?;
        let text = self.quote(from, &body);
        reveal(page, &text);
        Ok(text)
    }

    /// Quote a base64 body. On a decode failure the page is left untouched.
    pub fn reply_encoded<P: Page>(
        &self,
        page: &mut P,
        encoded: &str,
        from: &str,
    ) -> Result<String, ComposeError> {
        let body = decode_body(encoded).map_err(|e| {
            error!("Could not decode reply body from {}: {}", from, e);
            e
        })?;
        let text = self.quote(from, &body);
        reveal(page, &text);
        Ok(text)
    }
}

fn reveal<P: Page>(page: &mut P, text: &str) {
    debug!("Revealing reply box ({} chars)", text.chars().count());
    page.set_reply_text(text);
    page.show_reply();
    page.scroll_reply_into_view();
    page.focus_reply();
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::page::HeadlessPage;

    fn encode(s: &str) -> String {
        base64::engine::general_purpose::STANDARD.encode(s)
    }

    #[test]
    fn test_quote_single_line() {
        assert_eq!(
            quote_reply("Anna", "Hej!", 500, "skrev"),
            "\n\n--- Anna skrev ---\n> Hej!"
        );
    }

    #[test]
    fn test_quote_prefixes_every_line() {
        assert_eq!(
            quote_reply("Anna", "a\nb", 500, "skrev"),
            "\n\n--- Anna skrev ---\n> a\n> b"
        );
    }

    #[test]
    fn test_quote_truncates_by_chars() {
        let body = "x".repeat(600);
        let quoted = quote_reply("Bo", &body, 500, "skrev");
        assert_eq!(quoted, format!("\n\n--- Bo skrev ---\n> {}", "x".repeat(500)));

        // Multi-byte text is cut on characters, not bytes.
        let body = "å".repeat(600);
        let quoted = quote_reply("Bo", &body, 500, "skrev");
        assert_eq!(quoted.matches('å').count(), 500);
    }

    #[test]
    fn test_decode_body_utf8() {
        assert_eq!(decode_body(&encode("Räksmörgås\nrad 2")).unwrap(), "Räksmörgås\nrad 2");
    }

    #[test]
    fn test_decode_body_ignores_line_wrapping() {
        let encoded = encode("hello world, this is a longer body");
        let wrapped = format!("{}\n{}", &encoded[..8], &encoded[8..]);
        assert_eq!(decode_body(&wrapped).unwrap(), "hello world, this is a longer body");
    }

    #[test]
    fn test_decode_body_accepts_missing_padding() {
        assert_eq!(decode_body("SGk").unwrap(), "Hi");
        assert_eq!(decode_body("SGk=").unwrap(), "Hi");
        assert_eq!(decode_body("w6Q").unwrap(), "ä");
    }

    #[test]
    fn test_decode_body_rejects_garbage() {
        assert!(matches!(decode_body("not base64!!"), Err(ComposeError::Decode(_))));
        let invalid_utf8 = base64::engine::general_purpose::STANDARD.encode([0xff, 0xfe]);
        assert!(matches!(decode_body(&invalid_utf8), Err(ComposeError::Utf8(_))));
    }

    #[test]
    fn test_reply_encoded_reveals_reply_box() {
        let mut page = HeadlessPage::new();
        let text = ReplyComposer::default()
            .reply_encoded(&mut page, &encode("Tack!\nMvh"), "Karin")
            .unwrap();
        assert_eq!(text, "\n\n--- Karin skrev ---\n> Tack!\n> Mvh");
        assert_eq!(page.reply.text, text);
        assert!(!page.reply.hidden);
        assert!(page.reply.focused);
        assert!(page.reply.scrolled_into_view);
    }

    #[test]
    fn test_reply_encoded_failure_keeps_reply_hidden() {
        let mut page = HeadlessPage::new();
        let result = ReplyComposer::default().reply_encoded(&mut page, "%%%", "Karin");
        assert!(result.is_err());
        assert!(page.reply.hidden);
        assert!(page.reply.text.is_empty());
    }

    #[test]
    fn test_reply_raw_uses_rendered_body() {
        let mut page = HeadlessPage::new();
        page.render_body("9", "Ses i morgon");
        let text = ReplyComposer::default()
            .reply_raw(&mut page, "9", "Per")
            .unwrap();
        assert_eq!(text, "\n\n--- Per skrev ---\n> Ses i morgon");
        assert!(!page.reply.hidden);

        let mut empty = HeadlessPage::new();
        assert!(matches!(
            ReplyComposer::default().reply_raw(&mut empty, "9", "Per"),
            Err(ComposeError::MissingBody(_))
        ));
        assert!(empty.reply.hidden);
    }
}
