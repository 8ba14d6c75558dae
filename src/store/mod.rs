//! Backlog source and record store.
//!
//! The engine talks to persistence only through [`BacklogSource`] and
//! [`RecordStore`]. [`SupabaseStore`] implements both over PostgREST.

pub mod error;
#[cfg(test)]
pub mod memory;
pub mod record;
pub mod supabase;

pub use error::StoreError;
pub use record::{RoomId, RoomRecord};
pub use supabase::SupabaseStore;

/// Supplies the snapshot of room identifiers still missing from the store.
#[allow(async_fn_in_trait)]
pub trait BacklogSource {
    async fn pending_rooms(&self) -> Result<Vec<RoomId>, StoreError>;
}

/// Insert-or-replace persistence keyed by [`RoomRecord::id`].
///
/// Must be safe to call concurrently for different keys.
#[allow(async_fn_in_trait)]
pub trait RecordStore {
    async fn upsert(&self, record: &RoomRecord) -> Result<(), StoreError>;
}
