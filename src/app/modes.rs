//! Small state types of the grid: sort direction cycling and notifications.
//!
//! # Example
//!
//! ```rust
//! use equilink_admin::app::modes::SortDirection;
//!
//! assert_eq!(SortDirection::Ascending.next(), Some(SortDirection::Descending));
//! assert_eq!(SortDirection::Descending.next(), None);
//! ```

/// Client-side sort direction of one column.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortDirection {
    Ascending,
    Descending,
}

impl SortDirection {
    /// Next step of the ascending → descending → unsorted cycle.
    #[must_use]
    pub const fn next(self) -> Option<Self> {
        match self {
            Self::Ascending => Some(Self::Descending),
            Self::Descending => None,
        }
    }
}

/// One entry of the ordered sort list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SortColumn {
    pub column: String,
    pub direction: SortDirection,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotificationKind {
    Success,
    Error,
}

/// Transient toast shown after a mutation or a failed request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub kind: NotificationKind,
    pub message: String,
}

impl Notification {
    pub fn success(message: impl Into<String>) -> Self {
        Self {
            kind: NotificationKind::Success,
            message: message.into(),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            kind: NotificationKind::Error,
            message: message.into(),
        }
    }
}
