//! Transient confirmation shown after a successful mutation.

use std::time::{Duration, Instant};

use crate::store::{Completion, Mutated};

pub const NOTICE_DURATION: Duration = Duration::from_secs(3);

#[derive(Debug, Clone, Default)]
pub struct Notice {
    current: Option<(String, Instant)>,
}

impl Notice {
    pub fn show(&mut self, message: impl Into<String>, now: Instant) {
        self.current = Some((message.into(), now + NOTICE_DURATION));
    }

    /// The message, unless it has expired by `now`.
    pub fn message(&self, now: Instant) -> Option<&str> {
        match &self.current {
            Some((message, expires_at)) if now < *expires_at => Some(message.as_str()),
            _ => None,
        }
    }

    pub fn expires_at(&self) -> Option<Instant> {
        self.current.as_ref().map(|(_, expires_at)| *expires_at)
    }

    /// Drop the message once it has expired. Returns whether one was dropped.
    pub fn expire(&mut self, now: Instant) -> bool {
        if self.current.as_ref().is_some_and(|(_, expires_at)| now >= *expires_at) {
            self.current = None;
            return true;
        }
        false
    }
}

/// Text announced for a completion. Only successes are announced.
pub fn announcement(completion: &Completion) -> Option<&'static str> {
    match completion {
        Completion::Mutated(Mutated::Created(_)) => Some("User added successfully"),
        Completion::Mutated(Mutated::Updated(_)) => Some("User updated successfully"),
        Completion::Mutated(Mutated::Deleted(_)) => Some("User deleted successfully"),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ApiError;
    use crate::store::MutationKind;

    #[test]
    fn notice_expires_after_duration() {
        let start = Instant::now();
        let mut notice = Notice::default();
        notice.show("saved", start);
        assert_eq!(notice.message(start), Some("saved"));
        assert_eq!(notice.message(start + Duration::from_millis(2999)), Some("saved"));
        assert_eq!(notice.message(start + NOTICE_DURATION), None);
        assert_eq!(notice.expires_at(), Some(start + NOTICE_DURATION));
        assert!(!notice.expire(start));
        assert!(notice.expire(start + NOTICE_DURATION));
        assert_eq!(notice.expires_at(), None);
    }

    #[test]
    fn newer_notice_replaces_older() {
        let start = Instant::now();
        let mut notice = Notice::default();
        notice.show("first", start);
        notice.show("second", start + Duration::from_secs(2));
        assert_eq!(notice.message(start + Duration::from_secs(4)), Some("second"));
    }

    #[test]
    fn failures_are_not_announced() {
        let failed = Completion::MutationFailed {
            kind: MutationKind::Create,
            error: ApiError::NotFound,
        };
        assert_eq!(announcement(&failed), None);
        assert_eq!(
            announcement(&Completion::Mutated(Mutated::Deleted(1))),
            Some("User deleted successfully")
        );
    }
}
