use std::sync::Mutex;

use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use super::{ProgressEvent, ProvisionEvent};

/// Forwards a backend's progress reports to the subscriber of one
/// acquisition.
///
/// Percentages are clamped to `0..=100` and never move backwards, and
/// nothing is forwarded once the acquisition has been cancelled.
pub struct ProgressSink {
    tx: mpsc::UnboundedSender<ProvisionEvent>,
    cancel: CancellationToken,
    last_percent: Mutex<u8>,
}

impl ProgressSink {
    pub fn new(tx: mpsc::UnboundedSender<ProvisionEvent>, cancel: CancellationToken) -> Self {
        Self {
            tx,
            cancel,
            last_percent: Mutex::new(0),
        }
    }

    /// Returns `false` when the event was dropped because the acquisition was
    /// cancelled or nobody is listening any more.
    pub fn emit(&self, event: ProgressEvent) -> bool {
        if self.cancel.is_cancelled() {
            return false;
        }
        let event = self.normalize(event);
        self.tx.send(ProvisionEvent::Progress(event)).is_ok()
    }

    pub fn last_percent(&self) -> u8 {
        *self
            .last_percent
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Tops the bar up to 100 before the capability is handed over.
    pub(crate) fn complete(&self) {
        if self.last_percent() < 100 {
            self.emit(ProgressEvent::progress(100.0, None));
        }
    }

    fn normalize(&self, mut event: ProgressEvent) -> ProgressEvent {
        if let Some(percent) = event.percent {
            let mut last = self
                .last_percent
                .lock()
                .unwrap_or_else(|poisoned| poisoned.into_inner());
            let clamped = percent.min(100).max(*last);
            *last = clamped;
            event.percent = Some(clamped);
        }
        event
    }
}
