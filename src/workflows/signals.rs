//! Signal channels (spec §4.5 "suspension points"): `newTimer` and
//! `signalChannel.receive` map onto [`tokio::time::timeout`] racing a
//! [`tokio::sync::mpsc::Receiver`].

use std::time::Duration;

use tokio::sync::mpsc;
use tokio::time::timeout;

pub fn channel<T>(capacity: usize) -> (mpsc::Sender<T>, mpsc::Receiver<T>) {
    mpsc::channel(capacity)
}

pub enum Awaited<T> {
    Signal(T),
    TimedOut,
}

/// Wait for the next signal on `rx`, or [`Awaited::TimedOut`] if none
/// arrives within `wait`. A closed channel (all senders dropped) is treated
/// the same as a timeout — there is nothing left to wait for.
pub async fn await_signal<T>(rx: &mut mpsc::Receiver<T>, wait: Duration) -> Awaited<T> {
    match timeout(wait, rx.recv()).await {
        Ok(Some(signal)) => Awaited::Signal(signal),
        Ok(None) | Err(_) => Awaited::TimedOut,
    }
}
