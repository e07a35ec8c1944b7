//! Event debouncing
//!
//! Collapses bursts of raw events per path: an event is emitted only
//! once `delay` has passed with no newer event for that path. Earlier
//! events in a burst are superseded, not queued; distinct paths are
//! independent. This stage cannot fail, only delay.
//!
//! Implemented as one task over a coalescing table with an explicit
//! timer, re-armed on every observe, rather than chained callbacks.

use std::collections::HashMap;
use std::path::PathBuf;
use std::time::Duration;

use log::{trace, warn};
use tokio::sync::mpsc;
use tokio::time::{Instant, sleep_until};

use crate::core::models::{ChangeEvent, DebouncedEvent};

struct Pending {
    event: ChangeEvent,
    coalesced: usize,
    deadline: Instant,
    // Insertion sequence, used to evict oldest entries on overflow
    seq: u64,
}

/// Handle for feeding raw events into the debouncer task
#[derive(Debug, Clone)]
pub struct Debouncer {
    tx: mpsc::Sender<ChangeEvent>,
}

impl Debouncer {
    /// Spawn the debouncer task
    ///
    /// Debounced events are delivered on `out`. `capacity` bounds the
    /// raw-event channel (backpressure for pathological bursts) and
    /// `max_pending` bounds the coalescing table: on overflow the
    /// oldest tenth of pending paths is flushed early with a warning.
    #[must_use]
    pub fn spawn(
        delay: Duration,
        capacity: usize,
        max_pending: usize,
        out: mpsc::Sender<DebouncedEvent>,
    ) -> Self {
        let (tx, rx) = mpsc::channel(capacity.max(1));
        tokio::spawn(run(rx, out, delay, max_pending.max(1)));
        Self { tx }
    }

    /// Feed one raw event
    ///
    /// Waits when the channel is full (backpressure) rather than
    /// dropping; an error only means the engine is shutting down.
    pub async fn observe(&self, event: ChangeEvent) {
        if self.tx.send(event).await.is_err() {
            warn!("debouncer is gone; dropping event");
        }
    }

    /// Blocking variant for non-async callers (the watcher thread)
    pub fn observe_blocking(&self, event: ChangeEvent) {
        if self.tx.blocking_send(event).is_err() {
            warn!("debouncer is gone; dropping event");
        }
    }
}

async fn run(
    mut rx: mpsc::Receiver<ChangeEvent>,
    out: mpsc::Sender<DebouncedEvent>,
    delay: Duration,
    max_pending: usize,
) {
    let mut pending: HashMap<PathBuf, Pending> = HashMap::new();
    let mut seq = 0u64;

    loop {
        let next_deadline = pending.values().map(|p| p.deadline).min();

        tokio::select! {
            received = rx.recv() => {
                match received {
                    Some(event) => {
                        if pending.len() >= max_pending && !pending.contains_key(&event.path) {
                            evict_oldest(&mut pending, &out, max_pending).await;
                        }
                        seq += 1;
                        let deadline = Instant::now() + delay;
                        pending
                            .entry(event.path.clone())
                            .and_modify(|p| {
                                // Latest event supersedes; earlier ones
                                // in the burst are dropped by design
                                p.event = event.clone();
                                p.coalesced += 1;
                                p.deadline = deadline;
                            })
                            .or_insert(Pending { event, coalesced: 1, deadline, seq });
                    }
                    None => {
                        // Intake closed: flush whatever is pending so a
                        // shutdown does not lose observed changes
                        flush_all(&mut pending, &out).await;
                        return;
                    }
                }
            }
            () = sleep_until(next_deadline.unwrap_or_else(Instant::now)), if next_deadline.is_some() => {
                emit_due(&mut pending, &out).await;
            }
        }
    }
}

async fn emit_due(pending: &mut HashMap<PathBuf, Pending>, out: &mpsc::Sender<DebouncedEvent>) {
    let now = Instant::now();
    let due: Vec<PathBuf> = pending
        .iter()
        .filter(|(_, p)| p.deadline <= now)
        .map(|(path, _)| path.clone())
        .collect();
    for path in due {
        if let Some(p) = pending.remove(&path) {
            trace!("debounce elapsed for {} ({} coalesced)", path.display(), p.coalesced);
            let debounced = DebouncedEvent { event: p.event, coalesced: p.coalesced };
            if out.send(debounced).await.is_err() {
                return;
            }
        }
    }
}

async fn evict_oldest(
    pending: &mut HashMap<PathBuf, Pending>,
    out: &mpsc::Sender<DebouncedEvent>,
    max_pending: usize,
) {
    let evict = (max_pending / 10).max(1);
    warn!("debouncer table full ({max_pending} paths); flushing {evict} oldest early");
    let mut oldest: Vec<(PathBuf, u64)> =
        pending.iter().map(|(path, p)| (path.clone(), p.seq)).collect();
    oldest.sort_by_key(|(_, s)| *s);
    for (path, _) in oldest.into_iter().take(evict) {
        if let Some(p) = pending.remove(&path) {
            let debounced = DebouncedEvent { event: p.event, coalesced: p.coalesced };
            if out.send(debounced).await.is_err() {
                return;
            }
        }
    }
}

async fn flush_all(pending: &mut HashMap<PathBuf, Pending>, out: &mpsc::Sender<DebouncedEvent>) {
    let mut remaining: Vec<(PathBuf, u64)> =
        pending.iter().map(|(path, p)| (path.clone(), p.seq)).collect();
    remaining.sort_by_key(|(_, s)| *s);
    for (path, _) in remaining {
        if let Some(p) = pending.remove(&path) {
            let debounced = DebouncedEvent { event: p.event, coalesced: p.coalesced };
            if out.send(debounced).await.is_err() {
                return;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::models::ChangeKind;
    use std::path::Path;
    use tokio::time::timeout;

    const DELAY: Duration = Duration::from_millis(50);

    fn setup() -> (Debouncer, mpsc::Receiver<DebouncedEvent>) {
        let (out_tx, out_rx) = mpsc::channel(64);
        (Debouncer::spawn(DELAY, 64, 100, out_tx), out_rx)
    }

    async fn recv(rx: &mut mpsc::Receiver<DebouncedEvent>) -> DebouncedEvent {
        timeout(Duration::from_secs(2), rx.recv()).await.expect("timed out").expect("closed")
    }

    #[tokio::test]
    async fn test_burst_collapses_to_last_event() {
        let (debouncer, mut rx) = setup();
        debouncer.observe(ChangeEvent::new("a.rs", ChangeKind::Created)).await;
        debouncer.observe(ChangeEvent::new("a.rs", ChangeKind::Modified)).await;
        debouncer.observe(ChangeEvent::new("a.rs", ChangeKind::Modified)).await;

        let emitted = recv(&mut rx).await;
        assert_eq!(emitted.kind(), ChangeKind::Modified);
        assert_eq!(emitted.coalesced, 3);

        // Nothing else follows
        assert!(timeout(DELAY * 3, rx.recv()).await.is_err());
    }

    #[tokio::test]
    async fn test_distinct_paths_are_independent() {
        let (debouncer, mut rx) = setup();
        debouncer.observe(ChangeEvent::new("a.rs", ChangeKind::Modified)).await;
        debouncer.observe(ChangeEvent::new("b.rs", ChangeKind::Modified)).await;

        let first = recv(&mut rx).await;
        let second = recv(&mut rx).await;
        let mut paths = vec![first.path().to_path_buf(), second.path().to_path_buf()];
        paths.sort();
        assert_eq!(paths, vec![PathBuf::from("a.rs"), PathBuf::from("b.rs")]);
    }

    #[tokio::test]
    async fn test_rearms_after_emission() {
        let (debouncer, mut rx) = setup();
        debouncer.observe(ChangeEvent::new("a.rs", ChangeKind::Modified)).await;
        let first = recv(&mut rx).await;
        assert_eq!(first.coalesced, 1);

        debouncer.observe(ChangeEvent::new("a.rs", ChangeKind::Deleted)).await;
        let second = recv(&mut rx).await;
        assert_eq!(second.kind(), ChangeKind::Deleted);
    }

    #[tokio::test]
    async fn test_quiet_period_restarts_on_new_event() {
        let (debouncer, mut rx) = setup();
        debouncer.observe(ChangeEvent::new("a.rs", ChangeKind::Modified)).await;
        tokio::time::sleep(DELAY / 2).await;
        debouncer.observe(ChangeEvent::new("a.rs", ChangeKind::Modified)).await;

        // Past the first event's original deadline nothing has fired yet
        tokio::time::sleep(DELAY / 2).await;
        assert!(rx.try_recv().is_err());

        let emitted = recv(&mut rx).await;
        assert_eq!(emitted.coalesced, 2);
    }

    #[tokio::test]
    async fn test_shutdown_flushes_pending() {
        let (out_tx, mut rx) = mpsc::channel(64);
        let debouncer = Debouncer::spawn(Duration::from_secs(3600), 64, 100, out_tx);
        debouncer.observe(ChangeEvent::new("a.rs", ChangeKind::Modified)).await;
        drop(debouncer);

        let emitted = recv(&mut rx).await;
        assert_eq!(emitted.path(), Path::new("a.rs"));
    }
}
