// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! Layout of one entry file.
//!
//! ```text
//! offset  size  field
//! 0       4     magic "STRD"
//! 4       2     format version (little endian)
//! 6       2     flags: bit 0 = timestamp present, bit 1 = per-entry TTL present
//! 8       8     write time, nanoseconds since the Unix epoch
//! 16      8     per-entry TTL, nanoseconds
//! 24      4     key length in bytes
//! 28      ..    key bytes (UTF-8), then value bytes
//! ```

use std::time::{Duration, SystemTime};

use bytes::Bytes;
use stratum_tier::CacheEntry;

pub(crate) const MAGIC: [u8; 4] = *b"STRD";
pub(crate) const VERSION: u16 = 1;
pub(crate) const HEADER_LEN: usize = 28;

const FLAG_TIMESTAMP: u16 = 0b01;
const FLAG_TTL: u16 = 0b10;

/// A structurally invalid entry file.
#[ohno::error]
#[display("corrupt cache entry file: {reason}")]
pub(crate) struct CorruptEntry {
    reason: &'static str,
}

/// The fixed-size part of an entry file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Header {
    pub(crate) cached_at: Option<SystemTime>,
    pub(crate) ttl: Option<Duration>,
    pub(crate) key_len: usize,
}

impl Header {
    pub(crate) fn parse(bytes: &[u8]) -> Result<Self, CorruptEntry> {
        if bytes.len() < HEADER_LEN {
            return Err(CorruptEntry::new("truncated header"));
        }
        if bytes[0..4] != MAGIC {
            return Err(CorruptEntry::new("bad magic"));
        }
        if read_u16(bytes, 4) != VERSION {
            return Err(CorruptEntry::new("unsupported format version"));
        }

        let flags = read_u16(bytes, 6);
        let cached_at = (flags & FLAG_TIMESTAMP != 0).then(|| SystemTime::UNIX_EPOCH + Duration::from_nanos(read_u64(bytes, 8)));
        let ttl = (flags & FLAG_TTL != 0).then(|| Duration::from_nanos(read_u64(bytes, 16)));
        let key_len = usize::try_from(read_u32(bytes, 24)).map_err(|e| CorruptEntry::caused_by("key length overflow", e))?;

        Ok(Self { cached_at, ttl, key_len })
    }

    /// Returns `true` if this entry is expired at `now` under the tier TTL.
    pub(crate) fn is_expired_at(&self, now: SystemTime, tier_ttl: Option<Duration>) -> bool {
        let mut stamp = CacheEntry::new(());
        if let Some(cached_at) = self.cached_at {
            stamp.set_cached_at(cached_at);
        }
        if let Some(ttl) = self.ttl {
            stamp.set_ttl(ttl);
        }
        stamp.is_expired_at(now, tier_ttl)
    }
}

/// Serializes an entry into the bytes of its file.
pub(crate) fn encode(key: &str, entry: &CacheEntry<Bytes>) -> Result<Vec<u8>, CorruptEntry> {
    let mut flags = 0;
    let mut cached_at_nanos = 0;
    let mut ttl_nanos = 0;

    if let Some(cached_at) = entry.cached_at() {
        let since_epoch = cached_at
            .duration_since(SystemTime::UNIX_EPOCH)
            .map_err(|e| CorruptEntry::caused_by("write time before the Unix epoch", e))?;
        cached_at_nanos = u64::try_from(since_epoch.as_nanos()).map_err(|e| CorruptEntry::caused_by("write time out of range", e))?;
        flags |= FLAG_TIMESTAMP;
    }
    if let Some(ttl) = entry.ttl() {
        ttl_nanos = u64::try_from(ttl.as_nanos()).map_err(|e| CorruptEntry::caused_by("ttl out of range", e))?;
        flags |= FLAG_TTL;
    }
    let key_len = u32::try_from(key.len()).map_err(|e| CorruptEntry::caused_by("key too long", e))?;

    let mut buf = Vec::with_capacity(HEADER_LEN + key.len() + entry.value().len());
    buf.extend_from_slice(&MAGIC);
    buf.extend_from_slice(&VERSION.to_le_bytes());
    buf.extend_from_slice(&flags.to_le_bytes());
    buf.extend_from_slice(&cached_at_nanos.to_le_bytes());
    buf.extend_from_slice(&ttl_nanos.to_le_bytes());
    buf.extend_from_slice(&key_len.to_le_bytes());
    buf.extend_from_slice(key.as_bytes());
    buf.extend_from_slice(entry.value());
    Ok(buf)
}

/// Parses a whole entry file, returning the stored key and the entry.
pub(crate) fn decode(file: Bytes) -> Result<(String, CacheEntry<Bytes>), CorruptEntry> {
    let header = Header::parse(&file)?;
    let key_end = HEADER_LEN
        .checked_add(header.key_len)
        .filter(|end| *end <= file.len())
        .ok_or_else(|| CorruptEntry::new("truncated key"))?;

    let key = std::str::from_utf8(&file[HEADER_LEN..key_end])
        .map_err(|e| CorruptEntry::caused_by("key is not UTF-8", e))?
        .to_owned();

    let mut entry = CacheEntry::new(file.slice(key_end..));
    if let Some(cached_at) = header.cached_at {
        entry.set_cached_at(cached_at);
    }
    if let Some(ttl) = header.ttl {
        entry.set_ttl(ttl);
    }
    Ok((key, entry))
}

fn read_u16(bytes: &[u8], at: usize) -> u16 {
    u16::from_le_bytes([bytes[at], bytes[at + 1]])
}

fn read_u32(bytes: &[u8], at: usize) -> u32 {
    u32::from_le_bytes([bytes[at], bytes[at + 1], bytes[at + 2], bytes[at + 3]])
}

fn read_u64(bytes: &[u8], at: usize) -> u64 {
    let mut buf = [0; 8];
    buf.copy_from_slice(&bytes[at..at + 8]);
    u64::from_le_bytes(buf)
}
