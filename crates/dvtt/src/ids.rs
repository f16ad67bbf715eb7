/// Hands out the track, transaction and flow identifiers of a single trace.
///
/// Each counter starts at 1 and only ever moves forward, so an identifier is
/// never reused for the lifetime of the owning trace. Zero is reserved to mean
/// "no id" on the wire.
#[derive(Debug)]
pub struct IdAllocator {
    next_track: u64,
    next_transaction: u64,
    next_flow: u64,
}

impl Default for IdAllocator {
    fn default() -> Self {
        Self::new()
    }
}

impl IdAllocator {
    pub fn new() -> Self {
        IdAllocator {
            next_track: 1,
            next_transaction: 1,
            next_flow: 1,
        }
    }

    #[inline]
    pub fn next_track_id(&mut self) -> u64 {
        bump(&mut self.next_track)
    }

    #[inline]
    pub fn next_transaction_id(&mut self) -> u64 {
        bump(&mut self.next_transaction)
    }

    #[inline]
    pub fn next_flow_id(&mut self) -> u64 {
        bump(&mut self.next_flow)
    }
}

#[inline]
fn bump(counter: &mut u64) -> u64 {
    let id = *counter;
    *counter += 1;
    id
}
