//! HTTP `Range` header parsing and resolution (RFC 7233).
//!
//! Parsing and resolution are split: [`parse_range_header`] only checks the
//! grammar and needs no knowledge of the resource, while [`resolve_range`]
//! clamps one parsed spec against the resource's total length.
//!
//! # First range only
//!
//! A header may list several comma-separated ranges. All of them are parsed,
//! but the server only ever services the first one ([`first_range`]).
//! `multipart/byteranges` responses are not supported.

use thiserror::Error;

use crate::protocol_constants::RANGE_UNIT;

/// One byte-range-spec as written by the client, not yet clamped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RangeSpec {
    /// `bytes=from-to`
    Bounded { from: u64, to: u64 },
    /// `bytes=-len` (the last `len` bytes)
    Suffix { len: u64 },
    /// `bytes=from-` (from `from` to the end)
    OpenEnded { from: u64 },
}

/// An inclusive, resolved byte window within a resource.
///
/// Invariant: `start <= end < total_len` of the resource it was resolved against.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ByteRange {
    pub start: u64,
    pub end: u64,
}

impl ByteRange {
    /// Number of bytes in the window.
    #[must_use]
    pub fn len(&self) -> u64 {
        self.end - self.start + 1
    }

    /// Always false; a resolved window holds at least one byte.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        false
    }

    /// `Content-Range` header value for this window.
    #[must_use]
    pub fn content_range(&self, total_len: u64) -> String {
        format!("{} {}-{}/{}", RANGE_UNIT, self.start, self.end, total_len)
    }
}

/// Errors produced while parsing or resolving a range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum RangeError {
    /// The header does not follow the `bytes=...` grammar.
    #[error("malformed Range header")]
    Malformed,

    /// The header is well-formed but lists no ranges.
    #[error("Range header contains no ranges")]
    Empty,

    /// The window is empty once clamped to the resource.
    #[error("range not satisfiable")]
    Unsatisfiable,
}

/// Parses a `Range` header value into its byte-range-specs.
///
/// Supports:
/// - `bytes=start-end`
/// - `bytes=start-`
/// - `bytes=-suffix_len`
///
/// Empty list elements (`bytes=0-1,,5-`) are skipped. A header with no
/// elements left is [`RangeError::Empty`], which callers must reject rather
/// than treat as "no range".
pub fn parse_range_header(value: &str) -> Result<Vec<RangeSpec>, RangeError> {
    let (unit, set) = value.trim().split_once('=').ok_or(RangeError::Malformed)?;
    if !unit.trim().eq_ignore_ascii_case(RANGE_UNIT) {
        return Err(RangeError::Malformed);
    }

    let specs = set
        .split(',')
        .map(str::trim)
        .filter(|part| !part.is_empty())
        .map(parse_spec)
        .collect::<Result<Vec<_>, _>>()?;

    if specs.is_empty() {
        return Err(RangeError::Empty);
    }
    Ok(specs)
}

/// Parses a header and returns only the first range.
///
/// This is the entry point the server uses: ranges after the first are
/// validated but ignored.
pub fn first_range(value: &str) -> Result<RangeSpec, RangeError> {
    parse_range_header(value)?
        .into_iter()
        .next()
        .ok_or(RangeError::Empty)
}

fn parse_spec(part: &str) -> Result<RangeSpec, RangeError> {
    let (first, last) = part.split_once('-').ok_or(RangeError::Malformed)?;
    let (first, last) = (first.trim(), last.trim());

    match (first.is_empty(), last.is_empty()) {
        (true, true) => Err(RangeError::Malformed),
        (true, false) => Ok(RangeSpec::Suffix {
            len: parse_pos(last)?,
        }),
        (false, true) => Ok(RangeSpec::OpenEnded {
            from: parse_pos(first)?,
        }),
        (false, false) => {
            let from = parse_pos(first)?;
            let to = parse_pos(last)?;
            // last-byte-pos below first-byte-pos is syntactically invalid.
            if to < from {
                return Err(RangeError::Malformed);
            }
            Ok(RangeSpec::Bounded { from, to })
        }
    }
}

/// Parses a byte position: ASCII digits only, no sign, must fit in `u64`.
fn parse_pos(s: &str) -> Result<u64, RangeError> {
    if s.is_empty() || !s.bytes().all(|b| b.is_ascii_digit()) {
        return Err(RangeError::Malformed);
    }
    s.parse().map_err(|_| RangeError::Malformed)
}

/// Resolves a parsed spec against a resource of `total_len` bytes.
///
/// The start is floored at 0 and the end capped at `total_len - 1` before the
/// window is checked, so a suffix longer than the resource yields the whole
/// resource instead of an error. An empty window after clamping (including
/// any request against an empty resource) is [`RangeError::Unsatisfiable`].
pub fn resolve_range(spec: RangeSpec, total_len: u64) -> Result<ByteRange, RangeError> {
    let last = match total_len.checked_sub(1) {
        Some(last) => last,
        None => return Err(RangeError::Unsatisfiable),
    };

    let (start, end) = match spec {
        RangeSpec::Bounded { from, to } => (from, to),
        RangeSpec::OpenEnded { from } => (from, last),
        RangeSpec::Suffix { len } => (total_len.saturating_sub(len), last),
    };

    // A zero-length suffix starts at total_len and is rejected below.
    let end = end.min(last);

    if end < start {
        return Err(RangeError::Unsatisfiable);
    }
    Ok(ByteRange { start, end })
}
