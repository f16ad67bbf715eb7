//! Track allocation and the parent/child track hierarchy.
//!
//! Every stream owns one track. A transaction with a parent gets a track of
//! its own, nested under the parent transaction's track. Root transactions
//! render on their stream's track and allocate nothing.

use std::collections::HashMap;

use crate::ids::IdAllocator;
use crate::model::{StreamId, TransactionId};

/// What a track was allocated for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrackOwner {
    Stream(StreamId),
    Transaction(TransactionId),
}

/// A rendering lane in the trace.
#[derive(Debug, Clone, PartialEq)]
pub struct Track {
    uuid: u64,
    name: String,
    parent_uuid: Option<u64>,
    owner: TrackOwner,
}

impl Track {
    pub fn uuid(&self) -> u64 {
        self.uuid
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn parent_uuid(&self) -> Option<u64> {
        self.parent_uuid
    }

    pub fn owner(&self) -> TrackOwner {
        self.owner
    }
}

#[derive(Debug, Default)]
pub(crate) struct TrackTable {
    tracks: Vec<Track>,
    by_uuid: HashMap<u64, usize>,
}

impl TrackTable {
    /// Allocates a new track uuid and returns its descriptor.
    ///
    /// The track is not part of the table until it is passed to [`register`],
    /// which the caller does once the descriptor packet has been written.
    ///
    /// [`register`]: TrackTable::register
    pub fn allocate(
        &self,
        ids: &mut IdAllocator,
        name: &str,
        parent_uuid: Option<u64>,
        owner: TrackOwner,
    ) -> Track {
        debug_assert!(parent_uuid.map_or(true, |p| self.by_uuid.contains_key(&p)));
        Track {
            uuid: ids.next_track_id(),
            name: name.to_string(),
            parent_uuid,
            owner,
        }
    }

    pub fn register(&mut self, track: Track) {
        self.by_uuid.insert(track.uuid, self.tracks.len());
        self.tracks.push(track);
    }

    pub fn get(&self, uuid: u64) -> Option<&Track> {
        self.by_uuid.get(&uuid).map(|&idx| &self.tracks[idx])
    }

    pub fn iter(&self) -> impl Iterator<Item = &Track> {
        self.tracks.iter()
    }

    /// Walks from `uuid` up to its root track, starting with `uuid` itself.
    pub fn ancestry(&self, uuid: u64) -> impl Iterator<Item = &Track> {
        std::iter::successors(self.get(uuid), move |track| {
            track.parent_uuid.and_then(|p| self.get(p))
        })
    }
}
