use std::time::{Duration, Instant};

/// How long an alert stays visible unless replaced or dismissed.
pub const ALERT_DURATION: Duration = Duration::from_millis(3000);

pub type AlertToken = u64;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AlertKind {
    #[default]
    Info,
    Success,
    Warning,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AlertState {
    pub message: String,
    pub kind: AlertKind,
    pub visible: bool,
    pub expires_at: Instant,
}

/// The expiry a caller must arrange after [`AlertTimer::show`]. Only the most
/// recently issued token is honoured by [`AlertTimer::expire`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScheduledExpiry {
    pub token: AlertToken,
    pub after: Duration,
}

/// A single transient notification.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct AlertTimer {
    current: Option<AlertState>,
    pending: Option<AlertToken>,
    last_token: AlertToken,
}

impl AlertTimer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces any visible alert. The previous expiry, if any, is superseded.
    pub fn show(
        &mut self,
        message: impl Into<String>,
        kind: AlertKind,
        now: Instant,
    ) -> ScheduledExpiry {
        self.last_token += 1;
        let token = self.last_token;
        self.current = Some(AlertState {
            message: message.into(),
            kind,
            visible: true,
            expires_at: now + ALERT_DURATION,
        });
        self.pending = Some(token);
        ScheduledExpiry {
            token,
            after: ALERT_DURATION,
        }
    }

    /// Hides the alert immediately. Returns the cancelled expiry token.
    pub fn dismiss(&mut self) -> Option<AlertToken> {
        if let Some(alert) = self.current.as_mut() {
            alert.visible = false;
        }
        self.pending.take()
    }

    /// An expiry fired. Stale tokens (from replaced or dismissed alerts) are
    /// ignored; returns `true` when the alert was hidden.
    pub fn expire(&mut self, token: AlertToken) -> bool {
        if self.pending != Some(token) {
            return false;
        }
        self.pending = None;
        if let Some(alert) = self.current.as_mut() {
            alert.visible = false;
        }
        true
    }

    pub fn current(&self) -> Option<&AlertState> {
        self.current.as_ref().filter(|alert| alert.visible)
    }

    pub fn pending_token(&self) -> Option<AlertToken> {
        self.pending
    }
}
