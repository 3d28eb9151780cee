//! Byte-range handling and response streaming.
//!
//! - [`range`]: `Range` header parsing and clamping (RFC 7233)
//! - [`responder`]: 200/206 response construction and the body pump
//! - [`guard`]: per-response delivery logging

pub mod guard;
pub mod range;
pub mod responder;

pub use guard::{StreamEnd, StreamGuard};
pub use range::{first_range, parse_range_header, resolve_range, ByteRange, RangeError, RangeSpec};
pub use responder::{StreamPlan, Streamer, Window};
