use serde::Serialize;
use tokio::sync::broadcast;

/// High-level liveness of the desktop app as seen by the editor.
///
/// `Available` and `Unavailable` come only from the availability probe;
/// `Busy` is emitted before every outbound command or poll request. The
/// stream is last-write-wins for presentation purposes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum AppState {
    Available,
    Unavailable,
    Busy,
}

pub type StatusTx = broadcast::Sender<AppState>;
pub type StatusRx = broadcast::Receiver<AppState>;

/// Create a liveness channel sized for short bursts of poll updates.
pub fn channel() -> (StatusTx, StatusRx) {
    broadcast::channel(32)
}
