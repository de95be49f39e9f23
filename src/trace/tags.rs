//! Tag and address ledger.
//!
//! The accelerator prints one line whenever a request tag is issued or
//! returned to the free queue, and whenever a read address enters or leaves
//! the outstanding-address table. Replaying those lines shows which tags
//! leaked and which addresses were never released.

use std::collections::BTreeMap;
use std::io::BufRead;

use log::debug;
use regex::Regex;

use super::capture;
use crate::common::{MempressError, Result};

struct Patterns {
    send_tag: Regex,
    add_back_tag: Regex,
    ar_fire: Regex,
    ar_release: Regex,
}

impl Patterns {
    fn new() -> Self {
        Self {
            send_tag: Regex::new(r"sendtag:\s*(\d+)").unwrap(),
            add_back_tag: Regex::new(r"tags_for_issue_Q add back tag\s*(\d+)").unwrap(),
            ar_fire: Regex::new(r"AR FIRE: adding address 0x([0-9a-fA-F]+)").unwrap(),
            ar_release: Regex::new(r"releasing address 0x([0-9a-fA-F]+)").unwrap(),
        }
    }
}

/// Outstanding tags and addresses after replaying a log.
///
/// Tag counts are signed: a tag returned more often than it was sent shows
/// up with a negative count rather than stopping the replay. Only a tag that
/// was never sent at all is an error.
pub struct TagLedger {
    patterns: Patterns,
    tags: BTreeMap<u64, i64>,
    addresses: BTreeMap<u64, u64>,
    line: usize,
}

impl Default for TagLedger {
    fn default() -> Self {
        Self::new()
    }
}

impl TagLedger {
    /// Creates an empty ledger.
    pub fn new() -> Self {
        Self {
            patterns: Patterns::new(),
            tags: BTreeMap::new(),
            addresses: BTreeMap::new(),
            line: 0,
        }
    }

    /// Applies every line of `reader`, stopping at the first error.
    ///
    /// The ledger keeps everything applied before the failing line, so it
    /// can still be printed.
    pub fn replay<R: BufRead>(&mut self, reader: R) -> Result<()> {
        for line in reader.lines() {
            self.observe(&line?)?;
        }
        debug!(
            "replayed {} lines: {} tags, {} addresses outstanding",
            self.line,
            self.tags.len(),
            self.addresses.len()
        );
        Ok(())
    }

    /// Applies one log line.
    ///
    /// # Errors
    ///
    /// `Trace` if a tag is returned that was never sent or an address is
    /// released that was never added.
    pub fn observe(&mut self, text: &str) -> Result<()> {
        self.line += 1;

        if let Some(tag) = capture(&self.patterns.send_tag, text, 10) {
            *self.tags.entry(tag).or_insert(0) += 1;
        }

        if let Some(tag) = capture(&self.patterns.add_back_tag, text, 10) {
            match self.tags.get_mut(&tag) {
                Some(count) => *count -= 1,
                None => return Err(self.error(format!("tag {tag} returned but never sent"))),
            }
        }

        if let Some(addr) = capture(&self.patterns.ar_fire, text, 16) {
            *self.addresses.entry(addr).or_insert(0) += 1;
        }

        if let Some(addr) = capture(&self.patterns.ar_release, text, 16) {
            match self.addresses.get_mut(&addr) {
                Some(count) => {
                    *count -= 1;
                    if *count == 0 {
                        self.addresses.remove(&addr);
                    }
                }
                None => {
                    return Err(self.error(format!("address {addr:#x} released but never added")));
                }
            }
        }

        Ok(())
    }

    /// Every tag ever sent with sends minus returns.
    pub fn tags(&self) -> &BTreeMap<u64, i64> {
        &self.tags
    }

    /// Addresses still outstanding with their reference count.
    pub fn addresses(&self) -> &BTreeMap<u64, u64> {
        &self.addresses
    }

    /// Tags with more sends than returns.
    pub fn leaked_tags(&self) -> impl Iterator<Item = (u64, i64)> + '_ {
        self.tags.iter().filter(|(_, &n)| n > 0).map(|(&t, &n)| (t, n))
    }

    fn error(&self, detail: String) -> MempressError {
        MempressError::Trace {
            line: self.line,
            detail,
        }
    }
}
