use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use crate::attr::{Attribute, Radix};
use crate::config::{OpenTransactionPolicy, TraceConfig};
use crate::error::{Error, Result};
use crate::ids::IdAllocator;
use crate::model::{
    FlowLink, LinkDirection, LinkKind, State, Stream, StreamId, TraceInstance, Transaction,
    TransactionId,
};
use crate::protocol::{self, Packet, PacketHeader};
use crate::tracks::{Track, TrackOwner, TrackTable};
use crate::writer::PacketWriter;

/// A trace being recorded.
///
/// The trace owns every stream and transaction and is the only way to reach
/// them: operations take the [`StreamId`] or [`TransactionId`] handles it
/// returns. Packets are written to the output as soon as they are complete.
///
/// A trace has a single writer. It performs no locking, so sharing one between
/// threads is up to the caller.
///
/// Dropping a trace closes it. Use [`Trace::close`] or [`Trace::finish`] to
/// observe errors from the final flush.
pub struct Trace<W: Write = BufWriter<File>> {
    instance: TraceInstance,
    name: String,
    destination: String,
    time_units: String,
    config: TraceConfig,
    ids: IdAllocator,
    tracks: TrackTable,
    streams: Vec<Stream>,
    transactions: Vec<Transaction>,
    packets_written: u64,
    out: Option<PacketWriter<W>>,
}

impl Trace<BufWriter<File>> {
    /// Creates a trace file at `path` with the default config.
    pub fn create(path: impl AsRef<Path>, name: &str, time_units: &str) -> Result<Self> {
        Self::create_with_config(path, name, time_units, TraceConfig::default())
    }

    pub fn create_with_config(
        path: impl AsRef<Path>,
        name: &str,
        time_units: &str,
        config: TraceConfig,
    ) -> Result<Self> {
        let path = path.as_ref();
        let file = File::create(path)?;
        Trace::with_writer(
            BufWriter::new(file),
            path.display().to_string(),
            name,
            time_units,
            config,
        )
    }
}

impl<W: Write> Trace<W> {
    /// Starts a trace on an arbitrary output and writes its clock snapshot.
    ///
    /// `destination` is a label for the output, used in logs and returned by
    /// [`Trace::destination`].
    pub fn with_writer(
        writer: W,
        destination: impl Into<String>,
        name: &str,
        time_units: &str,
        config: TraceConfig,
    ) -> Result<Self> {
        let out = PacketWriter::new(writer, config.framing, config.flush_every_packet);
        let mut trace = Trace {
            instance: TraceInstance::next(),
            name: name.to_string(),
            destination: destination.into(),
            time_units: time_units.to_string(),
            config,
            ids: IdAllocator::new(),
            tracks: TrackTable::default(),
            streams: Vec::new(),
            transactions: Vec::new(),
            packets_written: 0,
            out: Some(out),
        };

        let packet = protocol::clock_snapshot(trace.header(0), trace.config.clock_id);
        trace.emit(&[packet])?;

        log::debug!(
            "opened trace {:?} ({}) writing to {}",
            trace.name,
            trace.time_units,
            trace.destination
        );
        Ok(trace)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn destination(&self) -> &str {
        &self.destination
    }

    pub fn time_units(&self) -> &str {
        &self.time_units
    }

    pub fn config(&self) -> &TraceConfig {
        &self.config
    }

    pub fn is_open(&self) -> bool {
        self.out.is_some()
    }

    pub fn packets_written(&self) -> u64 {
        self.packets_written
    }

    pub fn streams(&self) -> impl Iterator<Item = (StreamId, &Stream)> {
        let instance = self.instance;
        self.streams
            .iter()
            .enumerate()
            .map(move |(index, stream)| (StreamId::new(instance, index), stream))
    }

    pub fn stream(&self, id: StreamId) -> Result<&Stream> {
        self.check(id.trace)?;
        self.streams.get(id.index).ok_or(Error::ForeignHandle)
    }

    pub fn transaction(&self, id: TransactionId) -> Result<&Transaction> {
        self.check(id.trace)?;
        self.transactions.get(id.index).ok_or(Error::ForeignHandle)
    }

    pub fn track(&self, uuid: u64) -> Option<&Track> {
        self.tracks.get(uuid)
    }

    /// Every track allocated so far, in allocation order.
    pub fn tracks(&self) -> impl Iterator<Item = &Track> {
        self.tracks.iter()
    }

    /// The chain of tracks from `uuid` up to its stream's track.
    pub fn track_ancestry(&self, uuid: u64) -> impl Iterator<Item = &Track> {
        self.tracks.ancestry(uuid)
    }

    /// Opens a stream and writes its track descriptor.
    pub fn create_stream(
        &mut self,
        name: &str,
        scope: Option<&str>,
        type_name: Option<&str>,
    ) -> Result<StreamId> {
        self.ensure_open()?;

        let id = StreamId::new(self.instance, self.streams.len());
        let track_uuid = self.open_track(name, None, TrackOwner::Stream(id))?;
        self.streams.push(Stream {
            name: name.to_string(),
            scope: scope.map(str::to_string),
            type_name: type_name.map(str::to_string),
            track_uuid,
            state: State::Open,
            transactions: Vec::new(),
        });

        log::debug!("opened stream {:?} on track {}", name, track_uuid);
        Ok(id)
    }

    /// Opens a transaction on `stream`.
    ///
    /// A transaction with a `parent` gets a track of its own, nested under the
    /// parent's track. The parent must belong to the same stream.
    pub fn begin_transaction(
        &mut self,
        stream: StreamId,
        name: &str,
        start_time: u64,
        type_name: Option<&str>,
        parent: Option<TransactionId>,
    ) -> Result<TransactionId> {
        self.ensure_open()?;

        let s = self.stream(stream)?;
        if s.is_closed() {
            return Err(Error::StreamClosed {
                name: s.name.clone(),
            });
        }
        let stream_track = s.track_uuid;

        let parent_track = match parent {
            Some(parent) => {
                let p = self.transaction(parent)?;
                if p.stream != stream {
                    return Err(Error::ParentStreamMismatch {
                        parent: p.name.clone(),
                        parent_stream: self.stream(p.stream)?.name.clone(),
                        stream: self.stream(stream)?.name.clone(),
                    });
                }
                Some(p.track_uuid)
            }
            None => None,
        };

        let id = TransactionId::new(self.instance, self.transactions.len());
        let txn_id = self.ids.next_transaction_id();
        let track_uuid = match parent_track {
            Some(parent_uuid) => {
                let uuid = self.open_track(name, Some(parent_uuid), TrackOwner::Transaction(id))?;
                log::debug!(
                    "transaction {:?} nested on track {} under {}",
                    name,
                    uuid,
                    parent_uuid
                );
                uuid
            }
            None => stream_track,
        };

        self.transactions.push(Transaction {
            id: txn_id,
            stream,
            name: name.to_string(),
            type_name: type_name.map(str::to_string),
            start_time,
            end_time: None,
            state: State::Open,
            parent,
            track_uuid,
            attributes: Vec::new(),
            links: Vec::new(),
        });
        self.streams[stream.index].transactions.push(id);

        Ok(id)
    }

    pub fn add_int(
        &mut self,
        txn: TransactionId,
        name: &str,
        value: i64,
        radix: Radix,
    ) -> Result<()> {
        self.add_attribute(txn, Attribute::int(name, value, radix))
    }

    pub fn add_uint(
        &mut self,
        txn: TransactionId,
        name: &str,
        value: u64,
        radix: Radix,
    ) -> Result<()> {
        self.add_attribute(txn, Attribute::uint(name, value, radix))
    }

    /// Adds an unsigned attribute from any integer type. Negative values are
    /// rejected with [`Error::UnsignedOutOfRange`].
    pub fn add_uint_checked<U: TryInto<u64>>(
        &mut self,
        txn: TransactionId,
        name: &str,
        value: U,
        radix: Radix,
    ) -> Result<()> {
        let value = value.try_into().map_err(|_| Error::UnsignedOutOfRange {
            name: name.to_string(),
        })?;
        self.add_uint(txn, name, value, radix)
    }

    pub fn add_float(&mut self, txn: TransactionId, name: &str, value: f64) -> Result<()> {
        self.add_attribute(txn, Attribute::float(name, value))
    }

    pub fn add_string(&mut self, txn: TransactionId, name: &str, value: &str) -> Result<()> {
        self.add_attribute(txn, Attribute::string(name, value))
    }

    pub fn add_time(&mut self, txn: TransactionId, name: &str, value: u64) -> Result<()> {
        self.add_attribute(txn, Attribute::time(name, value))
    }

    /// Adds a bit vector given as little-endian bytes, of which the low
    /// `num_bits` bits are significant.
    pub fn add_bits(
        &mut self,
        txn: TransactionId,
        name: &str,
        bits: &[u8],
        num_bits: usize,
        radix: Radix,
    ) -> Result<()> {
        let attr = Attribute::bits(name, bits, num_bits, radix)?;
        self.add_attribute(txn, attr)
    }

    pub fn add_blob(&mut self, txn: TransactionId, name: &str, data: &[u8]) -> Result<()> {
        self.add_attribute(txn, Attribute::blob(name, data))
    }

    pub fn add_attribute(&mut self, txn: TransactionId, attr: Attribute) -> Result<()> {
        self.ensure_open()?;
        self.check_mutable(txn, "attribute", attr.name())?;
        self.transaction_mut(txn)?.attributes.push(attr);
        Ok(())
    }

    /// Links `source` to `target` with a new flow id, which is recorded on both
    /// transactions and returned.
    ///
    /// Only the flow id is written to the trace; `kind` and `relation` are kept
    /// on the in-memory links. A transaction cannot be linked to itself.
    pub fn add_link(
        &mut self,
        source: TransactionId,
        target: TransactionId,
        kind: LinkKind,
        relation: Option<&str>,
    ) -> Result<u64> {
        self.ensure_open()?;
        self.check_mutable(source, "link", "outgoing")?;
        self.check_mutable(target, "link", "incoming")?;
        if source == target {
            return Err(Error::SelfLink {
                name: self.transaction(source)?.name.clone(),
            });
        }

        let flow_id = self.ids.next_flow_id();
        let relation = relation.map(str::to_string);
        self.transaction_mut(source)?.links.push(FlowLink {
            flow_id,
            peer: target,
            direction: LinkDirection::Outgoing,
            kind,
            relation: relation.clone(),
        });
        self.transaction_mut(target)?.links.push(FlowLink {
            flow_id,
            peer: source,
            direction: LinkDirection::Incoming,
            kind,
            relation,
        });
        Ok(flow_id)
    }

    /// Closes the transaction and writes its slice. Closing a closed
    /// transaction does nothing.
    pub fn close_transaction(&mut self, txn: TransactionId, end_time: u64) -> Result<()> {
        let t = self.transaction(txn)?;
        if t.is_closed() {
            return Ok(());
        }
        self.ensure_open()?;

        let begin = protocol::slice_begin(self.header(t.start_time), t);
        let end = protocol::slice_end(self.header(end_time), t);
        self.emit(&[begin, end])?;

        let t = self.transaction_mut(txn)?;
        t.end_time = Some(end_time);
        t.state = State::Closed;
        Ok(())
    }

    /// Closes the stream according to the configured [`OpenTransactionPolicy`].
    pub fn close_stream(&mut self, stream: StreamId) -> Result<()> {
        let s = self.stream(stream)?;
        if s.is_closed() {
            return Ok(());
        }

        if self.config.open_transactions == OpenTransactionPolicy::Reject {
            let open = self.open_transactions(stream).count();
            if open > 0 {
                return Err(Error::OpenTransactions {
                    stream: s.name.clone(),
                    open,
                });
            }
        }
        self.force_close_stream(stream, None)
    }

    /// Closes the stream, closing any open transactions at `end_time`.
    pub fn close_stream_at(&mut self, stream: StreamId, end_time: u64) -> Result<()> {
        if self.stream(stream)?.is_closed() {
            return Ok(());
        }
        self.force_close_stream(stream, Some(end_time))
    }

    /// Closes every open stream and releases the output.
    ///
    /// The output is released even if closing a stream fails; the first error
    /// is returned. Closing a closed trace does nothing.
    pub fn close(&mut self) -> Result<()> {
        self.release().map(|_| ())
    }

    /// Closes the trace and returns the flushed output.
    pub fn finish(mut self) -> Result<W> {
        self.release()?.ok_or(Error::TraceClosed)
    }

    fn release(&mut self) -> Result<Option<W>> {
        if self.out.is_none() {
            return Ok(None);
        }

        let instance = self.instance;
        let cascade = (0..self.streams.len())
            .map(|index| StreamId::new(instance, index))
            .try_for_each(|id| self.force_close_stream(id, None));
        for stream in &mut self.streams {
            stream.state = State::Closed;
        }

        let flushed = match self.out.take() {
            Some(out) => out.into_inner(),
            None => return Ok(None),
        };
        log::debug!(
            "closed trace {:?}: {} packets written to {}",
            self.name,
            self.packets_written,
            self.destination
        );

        cascade?;
        Ok(Some(flushed?))
    }

    fn force_close_stream(&mut self, stream: StreamId, at: Option<u64>) -> Result<()> {
        let open: Vec<TransactionId> = self.open_transactions(stream).collect();
        for txn in open {
            let end_time = match at {
                Some(t) => t,
                None => {
                    let t = self.transaction(txn)?;
                    log::warn!(
                        "transaction {:?} still open when its stream closed, ending it at its start time {}",
                        t.name,
                        t.start_time
                    );
                    t.start_time
                }
            };
            self.close_transaction(txn, end_time)?;
        }

        self.streams[stream.index].state = State::Closed;
        Ok(())
    }

    fn open_transactions(&self, stream: StreamId) -> impl Iterator<Item = TransactionId> + '_ {
        self.streams[stream.index]
            .transactions
            .iter()
            .copied()
            .filter(move |id| self.transactions[id.index].is_open())
    }

    /// Allocates a track, writes its descriptor and records it.
    fn open_track(
        &mut self,
        name: &str,
        parent_uuid: Option<u64>,
        owner: TrackOwner,
    ) -> Result<u64> {
        let track = self.tracks.allocate(&mut self.ids, name, parent_uuid, owner);
        let packet = protocol::track_descriptor(self.header(0), &track);
        self.emit(&[packet])?;

        let uuid = track.uuid();
        self.tracks.register(track);
        Ok(uuid)
    }

    fn emit(&mut self, packets: &[Packet]) -> Result<()> {
        let out = self.out.as_mut().ok_or(Error::TraceClosed)?;
        out.write(packets)?;
        self.packets_written += packets.len() as u64;
        Ok(())
    }

    fn header(&self, timestamp: u64) -> PacketHeader {
        PacketHeader {
            timestamp,
            sequence_id: self
                .config
                .emit_sequence_id
                .then_some(self.config.sequence_id),
        }
    }

    fn ensure_open(&self) -> Result<()> {
        if self.out.is_some() {
            Ok(())
        } else {
            Err(Error::TraceClosed)
        }
    }

    fn check(&self, instance: TraceInstance) -> Result<()> {
        if instance == self.instance {
            Ok(())
        } else {
            Err(Error::ForeignHandle)
        }
    }

    /// Mutating a closed transaction can't change what was already written.
    /// Strict traces reject it; others keep the change in memory only.
    fn check_mutable(&self, txn: TransactionId, what: &str, detail: &str) -> Result<()> {
        let t = self.transaction(txn)?;
        if t.is_open() {
            return Ok(());
        }
        if self.config.strict_closed_transactions {
            return Err(Error::TransactionClosed {
                name: t.name.clone(),
            });
        }
        log::warn!(
            "{what} {detail:?} added to closed transaction {:?} will not be written",
            t.name
        );
        Ok(())
    }

    fn transaction_mut(&mut self, id: TransactionId) -> Result<&mut Transaction> {
        self.check(id.trace)?;
        self.transactions.get_mut(id.index).ok_or(Error::ForeignHandle)
    }
}

impl<W: Write> Drop for Trace<W> {
    fn drop(&mut self) {
        if self.out.is_some() {
            if let Err(err) = self.close() {
                log::error!("failed to close trace {:?}: {err}", self.name);
            }
        }
    }
}
