//! Batch execution engine.
//!
//! The backlog is cut into consecutive waves of at most `concurrency` rooms.
//! Every room of a wave is dispatched at once and the wave is joined with a
//! settle-all policy: each room yields its own [`ItemOutcome`] and no failure
//! cancels its siblings. Wave k+1 starts only after wave k has fully settled.

use std::fmt;
use std::num::NonZeroUsize;
use std::time::{Duration, Instant};

use chrono::{DateTime, Utc};
use futures::future::join_all;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::SyncError;
use crate::scrape::Enricher;
use crate::store::{BacklogSource, RecordStore, RoomId, RoomRecord};
use crate::ui::SyncProgress;

/// What to persist for a room whose scrape failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum FailurePolicy {
    /// Always write exactly one record; a failed scrape is stored as
    /// `{id, failed: true}`. Counts every successful write as processed.
    MarkFailed,
    /// Write only successful scrapes. A failed scrape is rejected, nothing is
    /// stored, and the room stays in the backlog for the next run.
    SkipFailed,
}

impl FailurePolicy {
    pub fn from_mark_failed(mark_failed: bool) -> Self {
        if mark_failed {
            FailurePolicy::MarkFailed
        } else {
            FailurePolicy::SkipFailed
        }
    }
}

impl fmt::Display for FailurePolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FailurePolicy::MarkFailed => write!(f, "mark-failed"),
            FailurePolicy::SkipFailed => write!(f, "skip-failed"),
        }
    }
}

/// How a single room settled. Reported, never persisted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ItemOutcome {
    /// The store accepted the write. `marked_failed` is set when the record
    /// written was a failure marker.
    Fulfilled { room_id: RoomId, marked_failed: bool },
    Rejected { room_id: RoomId, reason: String },
}

impl ItemOutcome {
    pub fn room_id(&self) -> &RoomId {
        match self {
            ItemOutcome::Fulfilled { room_id, .. } | ItemOutcome::Rejected { room_id, .. } => {
                room_id
            }
        }
    }

    pub fn is_fulfilled(&self) -> bool {
        matches!(self, ItemOutcome::Fulfilled { .. })
    }
}

/// Aggregate result of one run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunReport {
    pub run_id: String,
    pub policy: FailurePolicy,
    pub concurrency: usize,
    pub total: usize,
    pub waves: usize,
    /// Rooms whose write completed without a store error.
    pub processed: usize,
    /// Processed rooms stored as failure markers.
    pub marked_failed: usize,
    pub rejected: Vec<ItemOutcome>,
    pub started_at: DateTime<Utc>,
    pub completed_at: DateTime<Utc>,
    pub duration_ms: u64,
}

impl RunReport {
    fn new(
        policy: FailurePolicy,
        concurrency: NonZeroUsize,
        outcomes: Vec<ItemOutcome>,
        started_at: DateTime<Utc>,
        elapsed: Duration,
    ) -> Self {
        let total = outcomes.len();
        let processed = outcomes.iter().filter(|o| o.is_fulfilled()).count();
        let marked_failed = outcomes
            .iter()
            .filter(|o| matches!(o, ItemOutcome::Fulfilled { marked_failed: true, .. }))
            .count();
        let rejected = outcomes.into_iter().filter(|o| !o.is_fulfilled()).collect();

        Self {
            run_id: Uuid::new_v4().to_string(),
            policy,
            concurrency: concurrency.get(),
            total,
            waves: total.div_ceil(concurrency.get()),
            processed,
            marked_failed,
            rejected,
            started_at,
            completed_at: Utc::now(),
            duration_ms: u64::try_from(elapsed.as_millis()).unwrap_or(u64::MAX),
        }
    }

    pub fn elapsed_secs(&self) -> f64 {
        Duration::from_millis(self.duration_ms).as_secs_f64()
    }
}

/// Drives rooms through scrape and upsert in waves of bounded concurrency.
///
/// Both clients are borrowed and shared by every in-flight room.
pub struct SyncEngine<'a, E, S> {
    enricher: &'a E,
    store: &'a S,
    concurrency: NonZeroUsize,
    policy: FailurePolicy,
}

impl<'a, E: Enricher, S: RecordStore> SyncEngine<'a, E, S> {
    pub fn new(
        enricher: &'a E,
        store: &'a S,
        concurrency: NonZeroUsize,
        policy: FailurePolicy,
    ) -> Self {
        Self {
            enricher,
            store,
            concurrency,
            policy,
        }
    }

    pub fn waves_for(&self, total: usize) -> usize {
        total.div_ceil(self.concurrency.get())
    }

    /// Process every room, one wave at a time. Returns one outcome per room,
    /// in backlog order.
    pub async fn run(&self, rooms: &[RoomId], progress: &SyncProgress) -> Vec<ItemOutcome> {
        let waves = self.waves_for(rooms.len());
        let mut outcomes = Vec::with_capacity(rooms.len());

        for (index, wave) in rooms.chunks(self.concurrency.get()).enumerate() {
            progress.wave_started(index + 1, waves, wave.len());
            let settled = join_all(
                wave.iter()
                    .map(|room_id| self.process_room(room_id, progress)),
            )
            .await;
            outcomes.extend(settled);
        }

        outcomes
    }

    /// Scrape one room and apply the failure policy. Every error is turned
    /// into an outcome here; nothing escapes to the wave.
    async fn process_room(&self, room_id: &RoomId, progress: &SyncProgress) -> ItemOutcome {
        progress.attempt(room_id);

        let record = match self.enricher.enrich(room_id.as_str()).await {
            Ok(enrichment) => {
                let record = RoomRecord::enriched(room_id, enrichment);
                progress.payload(&record);
                record
            }
            Err(e) => {
                progress.scrape_failed(room_id, &e);
                match self.policy {
                    FailurePolicy::MarkFailed => RoomRecord::failed(room_id),
                    FailurePolicy::SkipFailed => {
                        progress.skipped(room_id);
                        return ItemOutcome::Rejected {
                            room_id: room_id.clone(),
                            reason: e.to_string(),
                        };
                    }
                }
            }
        };

        match self.store.upsert(&record).await {
            Ok(()) => {
                progress.persisted(room_id, record.failed);
                ItemOutcome::Fulfilled {
                    room_id: room_id.clone(),
                    marked_failed: record.failed,
                }
            }
            Err(e) => {
                progress.store_failed(room_id, &e);
                ItemOutcome::Rejected {
                    room_id: room_id.clone(),
                    reason: e.to_string(),
                }
            }
        }
    }
}

/// Read the backlog once and drive it to completion.
///
/// A failed backlog read is the only error returned; in that case no room
/// is scraped and nothing is written.
pub async fn sync<B, E, S>(
    backlog: &B,
    engine: &SyncEngine<'_, E, S>,
    progress: &SyncProgress,
) -> Result<RunReport, SyncError>
where
    B: BacklogSource,
    E: Enricher,
    S: RecordStore,
{
    let started = Instant::now();
    let started_at = Utc::now();

    let rooms = backlog.pending_rooms().await.map_err(SyncError::Backlog)?;
    progress.backlog_loaded(rooms.len(), engine.waves_for(rooms.len()));

    let outcomes = engine.run(&rooms, progress).await;
    let report = RunReport::new(
        engine.policy,
        engine.concurrency,
        outcomes,
        started_at,
        started.elapsed(),
    );
    progress.finish(&report);
    Ok(report)
}
