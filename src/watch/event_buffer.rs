// src/watch/event_buffer.rs

//! Parsing of raw inotify event records.
//!
//! A single `read(2)` on an inotify descriptor returns any number of
//! back-to-back records laid out as `struct inotify_event`:
//!
//! ```text
//! i32 wd | u32 mask | u32 cookie | u32 len | [u8; len] name (NUL padded)
//! ```
//!
//! The parser walks the buffer record by record, advancing by the fixed
//! header plus `len`. It is kept free of any OS calls so it can be exercised
//! on every platform.

use crate::errors::{Result, RewatchError};

/// Size of the fixed part of an inotify record.
pub const EVENT_HEADER_LEN: usize = 16;

/// Event bits we care about (values from `<sys/inotify.h>`).
pub mod mask {
    pub const IN_MODIFY: u32 = 0x0000_0002;
    pub const IN_MOVED_TO: u32 = 0x0000_0080;
    pub const IN_Q_OVERFLOW: u32 = 0x0000_4000;
    pub const IN_IGNORED: u32 = 0x0000_8000;
    pub const IN_ISDIR: u32 = 0x4000_0000;

    /// Interest mask registered for every target.
    pub const WATCH_MASK: u32 = IN_MODIFY | IN_MOVED_TO;
}

/// One record borrowed from the read buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RawEvent<'a> {
    pub wd: i32,
    pub mask: u32,
    pub cookie: u32,
    /// Entry name inside a watched directory, without NUL padding. Empty for
    /// events on the watched path itself.
    pub name: &'a [u8],
}

impl RawEvent<'_> {
    /// Whether this record reports a content change worth triggering on.
    pub fn is_change(&self) -> bool {
        self.mask & mask::WATCH_MASK != 0 && self.mask & mask::IN_ISDIR == 0
    }

    pub fn is_overflow(&self) -> bool {
        self.mask & mask::IN_Q_OVERFLOW != 0
    }

    pub fn is_ignored(&self) -> bool {
        self.mask & mask::IN_IGNORED != 0
    }
}

/// Split `buf` into records.
///
/// A record whose header or name runs past the end of the buffer means the
/// buffer is malformed; this is reported as an error rather than skipped so
/// no change is ever silently lost.
pub fn parse_events(buf: &[u8]) -> Result<Vec<RawEvent<'_>>> {
    let mut events = Vec::new();
    let mut offset = 0;

    while offset < buf.len() {
        let header = buf.get(offset..offset + EVENT_HEADER_LEN).ok_or_else(|| {
            RewatchError::EventParse(format!(
                "truncated header at offset {offset} ({} bytes left, need {EVENT_HEADER_LEN})",
                buf.len() - offset
            ))
        })?;

        let wd = i32::from_ne_bytes(word(header, 0));
        let mask = u32::from_ne_bytes(word(header, 4));
        let cookie = u32::from_ne_bytes(word(header, 8));
        let len = u32::from_ne_bytes(word(header, 12)) as usize;

        let name_start = offset + EVENT_HEADER_LEN;
        let name_end = name_start.checked_add(len).filter(|end| *end <= buf.len());
        let Some(name_end) = name_end else {
            return Err(RewatchError::EventParse(format!(
                "record at offset {offset} declares a {len}-byte name but only {} bytes follow",
                buf.len() - name_start
            )));
        };

        let padded = &buf[name_start..name_end];
        let name = match padded.iter().position(|b| *b == 0) {
            Some(nul) => &padded[..nul],
            None => padded,
        };

        events.push(RawEvent {
            wd,
            mask,
            cookie,
            name,
        });
        offset = name_end;
    }

    Ok(events)
}

fn word(header: &[u8], at: usize) -> [u8; 4] {
    [header[at], header[at + 1], header[at + 2], header[at + 3]]
}
