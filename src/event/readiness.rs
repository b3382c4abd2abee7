use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;
use tokio::sync::oneshot;
use tokio::time::timeout;

use super::emitter::EventEmitter;
use super::events::{CLOSE, OPEN};
use crate::shared::ClientError;

/// Where a connection or room is in its lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Readiness {
    Pending,
    Open,
    Closed,
}

/// Wait until `open` fires on `emitter`, racing a local timer
///
/// `readiness` is consulted after the listeners are registered so an `open`
/// fired in between is not missed.
pub(crate) async fn wait_for_open(
    emitter: &EventEmitter,
    readiness: impl Fn() -> Readiness,
    wait: Duration,
) -> Result<(), ClientError> {
    let (sender, receiver) = oneshot::channel::<bool>();
    let sender = Arc::new(Mutex::new(Some(sender)));

    let resolve = |opened: bool| {
        let sender = sender.clone();
        move |_: &serde_json::Value| {
            let taken = sender
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .take();
            if let Some(sender) = taken {
                let _ = sender.send(opened);
            }
        }
    };
    let on_open = emitter.once(OPEN, resolve(true));
    let on_close = emitter.once(CLOSE, resolve(false));

    let result = match readiness() {
        Readiness::Open => Ok(()),
        Readiness::Closed => Err(ClientError::Closed),
        Readiness::Pending => match timeout(wait, receiver).await {
            Ok(Ok(true)) => Ok(()),
            Ok(Ok(false)) | Ok(Err(_)) => Err(ClientError::Closed),
            Err(_) => Err(ClientError::Timeout(wait)),
        },
    };

    emitter.off(OPEN, on_open);
    emitter.off(CLOSE, on_close);
    result
}
