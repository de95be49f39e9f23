//! AXI4 Channel Checker.
//!
//! The last-level cache model in front of the memory backend prints a
//! block for every channel handshake: a `<CHANNEL> FIRE BEGIN` header
//! followed by a fixed number of `name: value` lines. Read and write
//! requests are queued on `AR`/`AW`, forwarded to the backend on
//! `ARQUEUE DEQUEUE`/`AWQUEUE DEQUEUE`, and retired on the final `R` beat
//! or on `B`.
//!
//! ```text
//! AR FIRE BEGIN
//!   id: 0x3
//!   user: 0x0
//!   addr: 0x80001000
//!   ...
//! ```
//!
//! The backend cannot tell two transactions with the same ID apart, so
//! forwarding an ID that is still in flight is the protocol violation this
//! checker looks for. Queues are FIFO; a dequeue must name the queue head.

use std::collections::{BTreeMap, VecDeque};
use std::fmt;
use std::io::BufRead;

use log::debug;
use regex::Regex;

use super::capture;
use crate::common::{MempressError, Result};

/// A request accepted on an address channel.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct AxiRequest {
    /// Transaction ID.
    pub id: u64,
    /// Start address of the burst.
    pub addr: u64,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Channel {
    Ar,
    ArDequeue,
    R,
    Aw,
    AwDequeue,
    B,
}

impl Channel {
    fn from_label(label: &str) -> Option<Self> {
        match label {
            "AR" => Some(Channel::Ar),
            "ARQUEUE DEQUEUE" => Some(Channel::ArDequeue),
            "R" => Some(Channel::R),
            "AW" => Some(Channel::Aw),
            "AWQUEUE DEQUEUE" => Some(Channel::AwDequeue),
            "B" => Some(Channel::B),
            _ => None,
        }
    }

    /// Lines printed after the header.
    fn field_lines(self) -> usize {
        match self {
            // id user addr len size burst pendingReads maxReads
            Channel::Ar => 8,
            // id len arQueueLength maxReads
            Channel::ArDequeue => 4,
            // id user data last resp pendingReads maxReads
            Channel::R => 7,
            // id user addr len size burst pendingAWReq pendingWReq maxWrites
            Channel::Aw => 9,
            // id awQueueLength maxWrites
            Channel::AwDequeue => 3,
            // id user resp pendingAWReq pendingWReq maxWrites
            Channel::B => 6,
        }
    }
}

impl fmt::Display for Channel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Channel::Ar => "AR",
            Channel::ArDequeue => "ARQUEUE DEQUEUE",
            Channel::R => "R",
            Channel::Aw => "AW",
            Channel::AwDequeue => "AWQUEUE DEQUEUE",
            Channel::B => "B",
        };
        f.write_str(label)
    }
}

#[derive(Clone, Copy, Debug)]
enum Field {
    Id,
    Addr,
    Last,
}

impl Field {
    fn name(self) -> &'static str {
        match self {
            Field::Id => "id",
            Field::Addr => "addr",
            Field::Last => "last",
        }
    }
}

struct Patterns {
    begin: Regex,
    id: Regex,
    addr: Regex,
    last: Regex,
}

impl Patterns {
    fn new() -> Self {
        Self {
            begin: Regex::new(r"\b(AR|ARQUEUE DEQUEUE|R|AW|AWQUEUE DEQUEUE|B) FIRE BEGIN\b").unwrap(),
            id: Regex::new(r"\bid\s*:\s*0x([0-9a-fA-F]+)").unwrap(),
            addr: Regex::new(r"\baddr\s*:\s*0x([0-9a-fA-F]+)").unwrap(),
            last: Regex::new(r"\blast\s*:\s*0x([0-9a-fA-F]+)").unwrap(),
        }
    }

    fn get(&self, field: Field) -> &Regex {
        match field {
            Field::Id => &self.id,
            Field::Addr => &self.addr,
            Field::Last => &self.last,
        }
    }
}

/// A block whose field lines are still being collected.
struct Block {
    channel: Channel,
    start: usize,
    fields: Vec<String>,
}

/// Replays AXI4 handshake blocks and tracks in-flight transaction IDs.
pub struct Axi4Checker {
    patterns: Patterns,
    queued_reads: VecDeque<AxiRequest>,
    queued_writes: VecDeque<AxiRequest>,
    sent_reads: BTreeMap<u64, u64>,
    sent_writes: BTreeMap<u64, u64>,
    block: Option<Block>,
    line: usize,
}

impl Default for Axi4Checker {
    fn default() -> Self {
        Self::new()
    }
}

impl Axi4Checker {
    /// Creates a checker with empty queues.
    pub fn new() -> Self {
        Self {
            patterns: Patterns::new(),
            queued_reads: VecDeque::new(),
            queued_writes: VecDeque::new(),
            sent_reads: BTreeMap::new(),
            sent_writes: BTreeMap::new(),
            block: None,
            line: 0,
        }
    }

    /// Applies every line of `reader` and checks no block was cut short.
    ///
    /// State applied before a failing block is kept.
    pub fn replay<R: BufRead>(&mut self, reader: R) -> Result<()> {
        for line in reader.lines() {
            self.observe(&line?)?;
        }
        self.finish()?;
        debug!(
            "replayed {} lines: {} reads and {} writes in flight",
            self.line,
            self.sent_reads.len(),
            self.sent_writes.len()
        );
        Ok(())
    }

    /// Applies one log line.
    ///
    /// # Errors
    ///
    /// `Trace`, reported at the block's header line, if the block lacks a
    /// field, dequeues out of order, forwards an ID already in flight, or
    /// retires an ID the backend never received.
    pub fn observe(&mut self, text: &str) -> Result<()> {
        self.line += 1;

        if let Some(mut block) = self.block.take() {
            block.fields.push(text.to_string());
            if block.fields.len() < block.channel.field_lines() {
                self.block = Some(block);
                return Ok(());
            }
            return self.apply(&block);
        }

        let channel = self
            .patterns
            .begin
            .captures(text)
            .and_then(|caps| Channel::from_label(caps.get(1)?.as_str()));
        if let Some(channel) = channel {
            self.block = Some(Block {
                channel,
                start: self.line,
                fields: Vec::with_capacity(channel.field_lines()),
            });
        }
        Ok(())
    }

    /// Fails if the log ended inside a block.
    pub fn finish(&self) -> Result<()> {
        match &self.block {
            Some(block) => Err(self.error(
                block.start,
                format!(
                    "{} block truncated after {} of {} lines",
                    block.channel,
                    block.fields.len(),
                    block.channel.field_lines()
                ),
            )),
            None => Ok(()),
        }
    }

    /// Reads accepted on AR but not yet forwarded, oldest first.
    pub fn queued_reads(&self) -> &VecDeque<AxiRequest> {
        &self.queued_reads
    }

    /// Writes accepted on AW but not yet forwarded, oldest first.
    pub fn queued_writes(&self) -> &VecDeque<AxiRequest> {
        &self.queued_writes
    }

    /// Read IDs at the backend awaiting their last beat, with addresses.
    pub fn sent_reads(&self) -> &BTreeMap<u64, u64> {
        &self.sent_reads
    }

    /// Write IDs at the backend awaiting a response, with addresses.
    pub fn sent_writes(&self) -> &BTreeMap<u64, u64> {
        &self.sent_writes
    }

    fn apply(&mut self, block: &Block) -> Result<()> {
        let id = self.field(block, Field::Id)?;
        let outcome = match block.channel {
            Channel::Ar => {
                let addr = self.field(block, Field::Addr)?;
                self.queued_reads.push_back(AxiRequest { id, addr });
                Ok(())
            }
            Channel::Aw => {
                let addr = self.field(block, Field::Addr)?;
                self.queued_writes.push_back(AxiRequest { id, addr });
                Ok(())
            }
            Channel::ArDequeue => forward(&mut self.queued_reads, &mut self.sent_reads, id, "read"),
            Channel::AwDequeue => {
                forward(&mut self.queued_writes, &mut self.sent_writes, id, "write")
            }
            Channel::R => {
                if self.field(block, Field::Last)? == 1 {
                    retire(&mut self.sent_reads, id, "read")
                } else {
                    Ok(())
                }
            }
            Channel::B => retire(&mut self.sent_writes, id, "write"),
        };
        outcome.map_err(|detail| self.error(block.start, detail))
    }

    fn field(&self, block: &Block, field: Field) -> Result<u64> {
        let re = self.patterns.get(field);
        block
            .fields
            .iter()
            .find_map(|line| capture(re, line, 16))
            .ok_or_else(|| {
                self.error(
                    block.start,
                    format!("{} block has no {} field", block.channel, field.name()),
                )
            })
    }

    fn error(&self, line: usize, detail: String) -> MempressError {
        MempressError::Trace { line, detail }
    }
}

/// Moves the queue head to the backend. The head must carry `id`, and `id`
/// must not already be in flight.
fn forward(
    queue: &mut VecDeque<AxiRequest>,
    sent: &mut BTreeMap<u64, u64>,
    id: u64,
    direction: &str,
) -> std::result::Result<(), String> {
    let head = queue
        .pop_front()
        .ok_or_else(|| format!("{direction} ID {id:#x} dequeued from an empty queue"))?;
    if head.id != id {
        return Err(format!(
            "{direction} ID {id:#x} dequeued but the queue head is ID {:#x}",
            head.id
        ));
    }
    if sent.contains_key(&id) {
        return Err(format!("sending duplicate {direction} ID {id:#x} to backend"));
    }
    sent.insert(id, head.addr);
    Ok(())
}

fn retire(sent: &mut BTreeMap<u64, u64>, id: u64, direction: &str) -> std::result::Result<(), String> {
    sent.remove(&id)
        .map(|_| ())
        .ok_or_else(|| format!("{direction} response for ID {id:#x} never sent to backend"))
}
