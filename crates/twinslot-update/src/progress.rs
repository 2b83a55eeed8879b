//! Relays transfer callbacks to the presenter.

use tracing::{debug, warn};

use crate::collaborators::{Presenter, TransferObserver, TransferStatus};

/// Percentage of `received` out of `total`, clamped to 100.
///
/// Returns `None` when the total is unknown or zero.
#[must_use]
pub fn percent(received: usize, total: Option<usize>) -> Option<u8> {
    let total = total.filter(|&t| t > 0)?;
    let scaled = (received as u128).saturating_mul(100) / total as u128;
    Some(u8::try_from(scaled.min(100)).unwrap_or(100))
}

/// [`TransferObserver`] that forwards progress to a [`Presenter`] whenever
/// the integer percentage changes.
#[derive(Debug)]
pub struct ProgressRelay<'a, N: ?Sized> {
    presenter: &'a mut N,
    last_percent: Option<u8>,
    reported_failure: bool,
}

impl<'a, N: Presenter + ?Sized> ProgressRelay<'a, N> {
    /// Relay into `presenter`.
    pub fn new(presenter: &'a mut N) -> Self {
        Self {
            presenter,
            last_percent: None,
            reported_failure: false,
        }
    }

    /// Whether the transfer reported [`TransferStatus::Failed`].
    #[must_use]
    pub fn reported_failure(&self) -> bool {
        self.reported_failure
    }
}

impl<N: Presenter + ?Sized> TransferObserver for ProgressRelay<'_, N> {
    fn on_progress(&mut self, received: usize, total: Option<usize>) {
        let Some(pct) = percent(received, total) else {
            return;
        };
        if self.last_percent != Some(pct) {
            self.last_percent = Some(pct);
            self.presenter.notify_progress(pct);
        }
    }

    fn on_status(&mut self, status: TransferStatus) {
        debug!("transfer status: {:?}", status);
        if status == TransferStatus::Failed {
            warn!("transfer reported failure");
            self.reported_failure = true;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collaborators::StatusKind;
    use crate::error::UpdateErrorKind;
    use alloc::vec::Vec;

    #[derive(Default)]
    struct Percents(Vec<u8>);

    impl Presenter for Percents {
        fn notify_status(&mut self, _status: StatusKind) {}
        fn notify_progress(&mut self, percent: u8) {
            self.0.push(percent);
        }
        fn notify_error(&mut self, _kind: UpdateErrorKind) {}
        fn notify_message(&mut self, _text: &str) {}
    }

    #[test]
    fn test_percent() {
        assert_eq!(percent(0, Some(200)), Some(0));
        assert_eq!(percent(199, Some(200)), Some(99));
        assert_eq!(percent(200, Some(200)), Some(100));
        assert_eq!(percent(500, Some(200)), Some(100));
        assert_eq!(percent(10, None), None);
        assert_eq!(percent(10, Some(0)), None);
    }

    #[test]
    fn test_relays_only_changes() {
        let mut sink = Percents::default();
        {
            let mut relay = ProgressRelay::new(&mut sink);
            for received in [0, 1, 2, 50, 51, 100, 100] {
                relay.on_progress(received, Some(100));
            }
            relay.on_progress(5, None);
        }
        assert_eq!(sink.0, [0, 1, 2, 50, 51, 100]);
    }

    #[test]
    fn test_failure_status_is_remembered() {
        let mut sink = Percents::default();
        let mut relay = ProgressRelay::new(&mut sink);
        relay.on_status(TransferStatus::Downloading);
        assert!(!relay.reported_failure());
        relay.on_status(TransferStatus::Failed);
        assert!(relay.reported_failure());
    }
}
