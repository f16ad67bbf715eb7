//! Hand-written prost types for the part of the Perfetto trace protos that
//! `dvtt` writes.
//!
//! These correspond to `protos/perfetto/trace/trace_packet.proto` and the
//! clock snapshot, track descriptor, track event and debug annotation
//! messages it embeds.

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct TracePacket {
    #[prost(uint64, optional, tag = "8")]
    pub timestamp: ::core::option::Option<u64>,
    #[prost(uint32, optional, tag = "10")]
    pub trusted_packet_sequence_id: ::core::option::Option<u32>,
    #[prost(oneof = "trace_packet::Data", tags = "6, 11, 60")]
    pub data: ::core::option::Option<trace_packet::Data>,
}

pub mod trace_packet {
    #[derive(Clone, PartialEq, ::prost::Oneof)]
    pub enum Data {
        #[prost(message, tag = "6")]
        ClockSnapshot(super::ClockSnapshot),
        #[prost(message, tag = "11")]
        TrackEvent(super::TrackEvent),
        #[prost(message, tag = "60")]
        TrackDescriptor(super::TrackDescriptor),
    }
}

impl TracePacket {
    pub fn clock_snapshot(&self) -> Option<&ClockSnapshot> {
        match &self.data {
            Some(trace_packet::Data::ClockSnapshot(snapshot)) => Some(snapshot),
            _ => None,
        }
    }

    pub fn track_descriptor(&self) -> Option<&TrackDescriptor> {
        match &self.data {
            Some(trace_packet::Data::TrackDescriptor(desc)) => Some(desc),
            _ => None,
        }
    }

    pub fn track_event(&self) -> Option<&TrackEvent> {
        match &self.data {
            Some(trace_packet::Data::TrackEvent(ev)) => Some(ev),
            _ => None,
        }
    }
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct ClockSnapshot {
    #[prost(message, repeated, tag = "1")]
    pub clocks: ::prost::alloc::vec::Vec<clock_snapshot::Clock>,
}

pub mod clock_snapshot {
    #[derive(Clone, PartialEq, ::prost::Message)]
    pub struct Clock {
        #[prost(uint32, optional, tag = "1")]
        pub clock_id: ::core::option::Option<u32>,
        #[prost(uint64, optional, tag = "2")]
        pub timestamp: ::core::option::Option<u64>,
    }
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct TrackDescriptor {
    #[prost(uint64, optional, tag = "1")]
    pub uuid: ::core::option::Option<u64>,
    #[prost(string, optional, tag = "2")]
    pub name: ::core::option::Option<::prost::alloc::string::String>,
    #[prost(uint64, optional, tag = "5")]
    pub parent_uuid: ::core::option::Option<u64>,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct TrackEvent {
    #[prost(message, repeated, tag = "4")]
    pub debug_annotations: ::prost::alloc::vec::Vec<DebugAnnotation>,
    #[prost(enumeration = "track_event::Type", optional, tag = "9")]
    pub r#type: ::core::option::Option<i32>,
    #[prost(uint64, optional, tag = "11")]
    pub track_uuid: ::core::option::Option<u64>,
    #[prost(string, repeated, tag = "22")]
    pub categories: ::prost::alloc::vec::Vec<::prost::alloc::string::String>,
    #[prost(string, optional, tag = "23")]
    pub name: ::core::option::Option<::prost::alloc::string::String>,
    #[prost(fixed64, repeated, packed = "false", tag = "47")]
    pub flow_ids: ::prost::alloc::vec::Vec<u64>,
}

pub mod track_event {
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, ::prost::Enumeration)]
    #[repr(i32)]
    pub enum Type {
        Unspecified = 0,
        SliceBegin = 1,
        SliceEnd = 2,
        Instant = 3,
    }
}

impl TrackEvent {
    /// Finds an annotation by its full name, radix suffix included.
    pub fn annotation(&self, name: &str) -> Option<&debug_annotation::Value> {
        self.debug_annotations
            .iter()
            .find(|a| a.name.as_deref() == Some(name))
            .and_then(|a| a.value.as_ref())
    }
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct DebugAnnotation {
    #[prost(string, optional, tag = "10")]
    pub name: ::core::option::Option<::prost::alloc::string::String>,
    #[prost(oneof = "debug_annotation::Value", tags = "3, 4, 5, 6")]
    pub value: ::core::option::Option<debug_annotation::Value>,
}

pub mod debug_annotation {
    #[derive(Clone, PartialEq, ::prost::Oneof)]
    pub enum Value {
        #[prost(uint64, tag = "3")]
        UintValue(u64),
        #[prost(int64, tag = "4")]
        IntValue(i64),
        #[prost(double, tag = "5")]
        DoubleValue(f64),
        #[prost(string, tag = "6")]
        StringValue(::prost::alloc::string::String),
    }
}
