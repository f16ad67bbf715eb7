//! Assembles the trace packets.

pub mod eventbuf;
pub mod fields;

use bytes::Bytes;

use crate::attr::Attribute;
use crate::model::Transaction;
use crate::tracks::Track;
use eventbuf::EventBuffer;

/// `TrackEvent.Type` values.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum EventType {
    SliceBegin = 1,
    SliceEnd = 2,
}

/// The kind of a top-level packet.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PacketKind {
    ClockSnapshot,
    TrackDescriptor,
    SliceBegin,
    SliceEnd,
}

/// An encoded `TracePacket`, not yet framed.
#[derive(Debug, Clone)]
pub struct Packet {
    pub kind: PacketKind,
    pub data: Bytes,
}

/// Fields shared by every packet.
#[derive(Debug, Clone, Copy)]
pub(crate) struct PacketHeader {
    pub timestamp: u64,
    pub sequence_id: Option<u32>,
}

impl PacketHeader {
    fn to_eb(self, extra_space: usize) -> EventBuffer {
        let mut eb = EventBuffer::with_capacity(2 + 10 + 6 + extra_space);
        eb.uint64_field(fields::trace_packet::TIMESTAMP, self.timestamp);
        if let Some(seq) = self.sequence_id {
            eb.uint64_field(
                fields::trace_packet::TRUSTED_PACKET_SEQUENCE_ID,
                seq as u64,
            );
        }
        eb
    }
}

pub(crate) fn clock_snapshot(header: PacketHeader, clock_id: u32) -> Packet {
    use fields::clock_snapshot::{clock, CLOCKS};

    let mut clk = EventBuffer::with_capacity(8);
    clk.uint64_field(clock::CLOCK_ID, clock_id as u64);
    clk.uint64_field(clock::TIMESTAMP, 0);

    let mut snapshot = EventBuffer::with_capacity(clk.len() + 2);
    snapshot.message(CLOCKS, &clk);

    let mut eb = header.to_eb(snapshot.len() + 2);
    eb.message(fields::trace_packet::CLOCK_SNAPSHOT, &snapshot);
    Packet {
        kind: PacketKind::ClockSnapshot,
        data: eb.freeze(),
    }
}

pub(crate) fn track_descriptor(header: PacketHeader, track: &Track) -> Packet {
    use fields::track_descriptor::*;

    let mut desc = EventBuffer::with_capacity(24 + track.name().len());
    desc.uint64_field(UUID, track.uuid());
    desc.string_field(NAME, track.name());
    if let Some(parent) = track.parent_uuid() {
        desc.uint64_field(PARENT_UUID, parent);
    }

    let mut eb = header.to_eb(desc.len() + 3);
    eb.message(fields::trace_packet::TRACK_DESCRIPTOR, &desc);
    Packet {
        kind: PacketKind::TrackDescriptor,
        data: eb.freeze(),
    }
}

pub(crate) fn slice_begin(header: PacketHeader, txn: &Transaction) -> Packet {
    let flow_ids: Vec<u64> = txn.flow_ids().collect();
    SliceEventData {
        typ: EventType::SliceBegin,
        track_uuid: txn.track_uuid(),
        name: Some(txn.name()),
        category: txn.type_name().filter(|t| !t.is_empty()),
        annotations: txn.attributes(),
        flow_ids: &flow_ids,
    }
    .to_packet(header)
}

pub(crate) fn slice_end(header: PacketHeader, txn: &Transaction) -> Packet {
    let flow_ids: Vec<u64> = txn.flow_ids().collect();
    SliceEventData {
        typ: EventType::SliceEnd,
        track_uuid: txn.track_uuid(),
        name: None,
        category: None,
        annotations: &[],
        flow_ids: &flow_ids,
    }
    .to_packet(header)
}

struct SliceEventData<'a> {
    typ: EventType,
    track_uuid: u64,
    name: Option<&'a str>,
    category: Option<&'a str>,
    annotations: &'a [Attribute],
    flow_ids: &'a [u64],
}

impl SliceEventData<'_> {
    fn to_packet(self, header: PacketHeader) -> Packet {
        use fields::track_event::*;

        let name_len = self.name.map(|s| s.len()).unwrap_or(0);
        let category_len = self.category.map(|s| s.len()).unwrap_or(0);
        let mut ev =
            EventBuffer::with_capacity(16 + name_len + category_len + self.flow_ids.len() * 10);

        ev.uint64_field(TYPE, self.typ as u64);
        ev.uint64_field(TRACK_UUID, self.track_uuid);
        if let Some(name) = self.name {
            ev.string_field(NAME, name);
        }
        if let Some(category) = self.category {
            ev.string_field(CATEGORIES, category);
        }
        for attr in self.annotations {
            ev.message(DEBUG_ANNOTATIONS, &attr.encode());
        }
        for flow_id in self.flow_ids {
            ev.fixed64_field(FLOW_IDS, *flow_id);
        }

        let mut eb = header.to_eb(ev.len() + 3);
        eb.message(fields::trace_packet::TRACK_EVENT, &ev);
        Packet {
            kind: match self.typ {
                EventType::SliceBegin => PacketKind::SliceBegin,
                EventType::SliceEnd => PacketKind::SliceEnd,
            },
            data: eb.freeze(),
        }
    }
}
