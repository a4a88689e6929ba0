//! Transient messages for the login screen.
//!
//! A posted notice disappears after a fixed delay unless the sticky
//! predicate matches it, in which case it stays until replaced or cleared.

use std::time::{Duration, Instant};

/// Default time a notice stays visible
pub const DEFAULT_NOTICE_TTL: Duration = Duration::from_secs(3);

/// Notice the server sends when the account's email is not yet confirmed.
/// It must stay visible until the user acts on it.
pub const VERIFY_EMAIL_NOTICE: &str = "Va rugam sa verificati email-ul inainte de a va loga";

type StickyPredicate = Box<dyn Fn(&str) -> bool + Send + Sync>;

struct Posted {
    text: String,
    posted_at: Instant,
    sticky: bool,
}

pub struct NoticeBoard {
    current: Option<Posted>,
    ttl: Duration,
    sticky: StickyPredicate,
}

impl NoticeBoard {
    pub fn new(ttl: Duration, sticky: impl Fn(&str) -> bool + Send + Sync + 'static) -> Self {
        Self {
            current: None,
            ttl,
            sticky: Box::new(sticky),
        }
    }

    /// Board whose sticky notices are exactly `messages`
    pub fn with_sticky_messages(ttl: Duration, messages: Vec<String>) -> Self {
        Self::new(ttl, move |text| messages.iter().any(|m| m == text))
    }

    /// Replace the current notice
    pub fn post(&mut self, text: impl Into<String>, now: Instant) {
        let text = text.into();
        if text.is_empty() {
            self.current = None;
            return;
        }
        let sticky = (self.sticky)(&text);
        self.current = Some(Posted {
            text,
            posted_at: now,
            sticky,
        });
    }

    /// The notice visible at `now`, dropping it once expired
    pub fn current(&mut self, now: Instant) -> Option<&str> {
        let expired = self.current.as_ref().is_some_and(|p| {
            !p.sticky && now.saturating_duration_since(p.posted_at) >= self.ttl
        });
        if expired {
            self.current = None;
        }
        self.current.as_ref().map(|p| p.text.as_str())
    }

    pub fn clear(&mut self) {
        self.current = None;
    }
}

impl Default for NoticeBoard {
    fn default() -> Self {
        Self::with_sticky_messages(DEFAULT_NOTICE_TTL, vec![VERIFY_EMAIL_NOTICE.to_string()])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_notice_expires_after_ttl() {
        let mut board = NoticeBoard::default();
        let start = Instant::now();
        board.post("Email sent", start);
        assert_eq!(board.current(start + Duration::from_secs(2)), Some("Email sent"));
        assert_eq!(board.current(start + Duration::from_secs(3)), None);
        // Stays gone
        assert_eq!(board.current(start + Duration::from_secs(1)), None);
    }

    #[test]
    fn test_verify_email_notice_is_sticky() {
        let mut board = NoticeBoard::default();
        let start = Instant::now();
        board.post(VERIFY_EMAIL_NOTICE, start);
        assert_eq!(
            board.current(start + Duration::from_secs(3600)),
            Some(VERIFY_EMAIL_NOTICE)
        );
        board.clear();
        assert_eq!(board.current(start), None);
    }

    #[test]
    fn test_new_post_replaces_and_restarts_timer() {
        let mut board = NoticeBoard::default();
        let start = Instant::now();
        board.post(VERIFY_EMAIL_NOTICE, start);
        board.post("Check your inbox", start + Duration::from_secs(10));
        assert_eq!(board.current(start + Duration::from_secs(12)), Some("Check your inbox"));
        assert_eq!(board.current(start + Duration::from_secs(13)), None);
    }

    #[test]
    fn test_custom_predicate() {
        let mut board = NoticeBoard::new(Duration::from_millis(10), |t| t.starts_with("!"));
        let start = Instant::now();
        board.post("!keep", start);
        assert_eq!(board.current(start + Duration::from_secs(1)), Some("!keep"));
        board.post("", start);
        assert_eq!(board.current(start), None);
    }
}
