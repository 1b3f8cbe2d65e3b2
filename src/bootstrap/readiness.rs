//! Single-writer cell recording that bootstrap has finished.

use tokio::sync::watch;

/// Writer half, owned by the bootstrap orchestrator.
#[derive(Debug)]
pub struct Readiness {
    sender: watch::Sender<bool>,
}

/// Reader half, handed to listeners that must not act before bootstrap ends.
#[derive(Debug, Clone)]
pub struct ReadinessObserver {
    receiver: watch::Receiver<bool>,
}

/// Creates a readiness cell in the "not yet complete" state.
///
/// # Example
///
/// ```
/// use issuethread::bootstrap::readiness;
///
/// let (cell, observer) = readiness();
/// assert!(!observer.is_complete());
/// cell.mark_complete();
/// assert!(observer.is_complete());
/// ```
#[must_use]
pub fn readiness() -> (Readiness, ReadinessObserver) {
    let (sender, receiver) = watch::channel(false);
    (Readiness { sender }, ReadinessObserver { receiver })
}

impl Readiness {
    /// Records that bootstrap finished, successfully or not.
    pub fn mark_complete(&self) {
        self.sender.send_replace(true);
    }

    /// Returns another observer of this cell.
    #[must_use]
    pub fn observer(&self) -> ReadinessObserver {
        ReadinessObserver {
            receiver: self.sender.subscribe(),
        }
    }
}

impl ReadinessObserver {
    /// Returns true once bootstrap has finished.
    #[must_use]
    pub fn is_complete(&self) -> bool {
        *self.receiver.borrow()
    }

    /// Returns true when the writer went away without completing, so waiting
    /// longer is pointless.
    #[must_use]
    pub fn is_abandoned(&self) -> bool {
        !self.is_complete() && self.receiver.has_changed().is_err()
    }
}
