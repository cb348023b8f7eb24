use chrono::{DateTime, Duration, Utc};
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum NoticeLevel {
    Info,
    Success,
    Warning,
    Error,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Notice {
    pub id: u64,
    pub level: NoticeLevel,
    pub message: String,
    pub raised_at: DateTime<Utc>,
}

/// Transient, dismissible messages for one view.
#[derive(Debug, Default)]
pub struct NoticeBoard {
    next_id: u64,
    notices: Vec<Notice>,
}

impl NoticeBoard {
    pub fn ttl() -> Duration {
        Duration::seconds(3)
    }

    pub fn push(&mut self, level: NoticeLevel, message: impl Into<String>) -> u64 {
        self.push_at(level, message, Utc::now())
    }

    pub fn push_at(&mut self, level: NoticeLevel, message: impl Into<String>, now: DateTime<Utc>) -> u64 {
        self.next_id += 1;
        self.notices.push(Notice {
            id: self.next_id,
            level,
            message: message.into(),
            raised_at: now,
        });
        self.next_id
    }

    pub fn dismiss(&mut self, id: u64) -> bool {
        let before = self.notices.len();
        self.notices.retain(|notice| notice.id != id);
        self.notices.len() != before
    }

    /// Drops expired notices and returns the rest, oldest first.
    pub fn active(&mut self, now: DateTime<Utc>) -> Vec<Notice> {
        self.notices.retain(|notice| now - notice.raised_at < Self::ttl());
        self.notices.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn notices_expire_after_ttl() {
        let mut board = NoticeBoard::default();
        let start = Utc::now();
        board.push_at(NoticeLevel::Success, "CSV downloaded successfully!", start);
        board.push_at(NoticeLevel::Error, "Error downloading CSV data", start + Duration::seconds(2));

        assert_eq!(board.active(start + Duration::seconds(1)).len(), 2);
        let left = board.active(start + Duration::seconds(4));
        assert_eq!(left.len(), 1);
        assert_eq!(left[0].level, NoticeLevel::Error);
    }

    #[test]
    fn dismiss_removes_by_id() {
        let mut board = NoticeBoard::default();
        let first = board.push(NoticeLevel::Info, "Preparing CSV download...");
        let second = board.push(NoticeLevel::Warning, "No data available to download");
        assert_ne!(first, second);
        assert!(board.dismiss(first));
        assert!(!board.dismiss(first));
        assert_eq!(board.active(Utc::now()).len(), 1);
    }
}
