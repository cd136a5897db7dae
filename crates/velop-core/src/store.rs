// ── Reactive snapshot store ──
//
// Holds the latest published `MeshSnapshot` for read access by
// dependent consumers. Mutated only by the reconciliation cycle, after
// a successful fetch; readers receive `Arc` snapshots and the previous
// state survives any aborted cycle untouched.

use std::pin::Pin;
use std::sync::{Arc, Mutex};
use std::task::{Context, Poll};

use chrono::{DateTime, Utc};
use futures_core::Stream;
use tokio::sync::watch;
use tokio_stream::wrappers::WatchStream;

use crate::diff::KnownEntities;
use crate::model::MeshSnapshot;

/// Out-of-band signals for entities that refresh on their own cadence.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Signal {
    /// Device-tracker entities should re-evaluate now.
    DeviceTrackers,
    /// A speedtest is in flight; status sensors should poll faster.
    SpeedtestStatus,
}

/// Publisher of reconciled mesh state.
pub struct MeshStore {
    snapshot: watch::Sender<Option<Arc<MeshSnapshot>>>,
    last_refresh: watch::Sender<Option<DateTime<Utc>>>,
    /// Identifier sets of the last published snapshot; this is what the
    /// next cycle diffs against — never the in-progress snapshot.
    known: Mutex<Option<KnownEntities>>,
}

impl MeshStore {
    pub fn new() -> Self {
        let (snapshot, _) = watch::channel(None);
        let (last_refresh, _) = watch::channel(None);
        Self {
            snapshot,
            last_refresh,
            known: Mutex::new(None),
        }
    }

    // ── Read access ──────────────────────────────────────────────────

    /// The latest published snapshot, if any cycle has completed.
    pub fn snapshot(&self) -> Option<Arc<MeshSnapshot>> {
        self.snapshot.borrow().clone()
    }

    /// Subscribe to snapshot publications.
    pub fn subscribe(&self) -> SnapshotStream {
        SnapshotStream::new(self.snapshot.subscribe())
    }

    /// Identifier sets of the last published snapshot.
    pub(crate) fn known(&self) -> Option<KnownEntities> {
        self.known.lock().ok().and_then(|g| (*g).clone())
    }

    pub fn last_refresh(&self) -> Option<DateTime<Utc>> {
        *self.last_refresh.borrow()
    }

    /// How long ago the last publish occurred, or `None` if never.
    pub fn data_age(&self) -> Option<chrono::Duration> {
        self.last_refresh().map(|t| Utc::now() - t)
    }

    // ── Write access (reconciliation cycle only) ─────────────────────

    /// Publish a freshly reconciled snapshot and capture its identifier
    /// sets for the next cycle's diff.
    ///
    /// `send_replace` stores the value even when no subscriber exists —
    /// `snapshot()` and `last_refresh()` must reflect the latest publish
    /// regardless of receiver count.
    pub(crate) fn publish(&self, snapshot: Arc<MeshSnapshot>) {
        if let Ok(mut known) = self.known.lock() {
            *known = Some(KnownEntities::of(&snapshot));
        }
        self.snapshot.send_replace(Some(snapshot));
        self.last_refresh.send_replace(Some(Utc::now()));
    }
}

impl Default for MeshStore {
    fn default() -> Self {
        Self::new()
    }
}

/// A subscription to snapshot publications.
///
/// Provides both point-in-time access and reactive change notification
/// via [`changed()`](Self::changed) or by converting to a `Stream`.
pub struct SnapshotStream {
    current: Option<Arc<MeshSnapshot>>,
    receiver: watch::Receiver<Option<Arc<MeshSnapshot>>>,
}

impl SnapshotStream {
    fn new(receiver: watch::Receiver<Option<Arc<MeshSnapshot>>>) -> Self {
        let current = receiver.borrow().clone();
        Self { current, receiver }
    }

    /// The snapshot captured at subscription time.
    pub fn current(&self) -> Option<&Arc<MeshSnapshot>> {
        self.current.as_ref()
    }

    /// The latest published snapshot (may have changed since creation).
    pub fn latest(&self) -> Option<Arc<MeshSnapshot>> {
        self.receiver.borrow().clone()
    }

    /// Wait for the next publication, returning the new snapshot.
    /// Returns `None` if the store has been dropped.
    pub async fn changed(&mut self) -> Option<Arc<MeshSnapshot>> {
        loop {
            self.receiver.changed().await.ok()?;
            let snap = self.receiver.borrow_and_update().clone();
            if let Some(snap) = snap {
                self.current = Some(snap.clone());
                return Some(snap);
            }
        }
    }

    /// Convert into a `Stream` for use with `StreamExt` combinators.
    pub fn into_stream(self) -> SnapshotWatchStream {
        SnapshotWatchStream {
            inner: WatchStream::new(self.receiver),
        }
    }
}

/// `Stream` adapter backed by the store's `watch` channel.
pub struct SnapshotWatchStream {
    inner: WatchStream<Option<Arc<MeshSnapshot>>>,
}

impl Stream for SnapshotWatchStream {
    type Item = Option<Arc<MeshSnapshot>>;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        Pin::new(&mut self.inner).poll_next(cx)
    }
}
