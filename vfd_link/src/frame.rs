//! Command envelope: one request/response unit exchanged with the drive.
//!
//! An envelope owns the outbound payload (leading bus address included,
//! trailing checksum excluded), the expected reply length, a criticality
//! flag and an optional reply kind. Ownership passes from the producer to
//! the transaction executor and the envelope is consumed after one
//! send/receive cycle.

use vfd_common::consts::MAX_FRAME_LEN;

use crate::crc;

// Room for the longest request plus its two checksum bytes.
static_assertions::const_assert!(MAX_FRAME_LEN >= 8);

/// Closed set of reply payloads the link knows how to interpret.
///
/// Decoding is dispatched by matching on the kind and calling the vendor
/// profile's typed decode method; no parser callbacks are stored in the
/// envelope itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReplyKind {
    /// Capability discovery: the drive's maximum speed.
    MaxRpm,
    /// Current output speed read-back.
    Rpm,
    /// Current rotation direction read-back.
    Direction,
    /// Generic health/status check.
    Health,
}

/// One framed request plus reply expectations.
#[derive(Debug, Clone)]
pub struct CommandEnvelope {
    /// Address byte followed by the vendor payload (checksum not included).
    payload: heapless::Vec<u8, MAX_FRAME_LEN>,
    /// Expected reply byte count before the checksum.
    reply_len: usize,
    /// Failure of this envelope must raise a machine alarm.
    critical: bool,
    /// How to interpret the reply, if at all.
    reply: Option<ReplyKind>,
}

impl CommandEnvelope {
    /// Start an envelope addressed to `address`.
    pub fn new(address: u8) -> Self {
        let mut payload = heapless::Vec::new();
        // MAX_FRAME_LEN >= 8, the address always fits.
        let _ = payload.push(address);
        Self {
            payload,
            reply_len: 0,
            critical: false,
            reply: None,
        }
    }

    /// Append payload bytes. Returns `false` if the frame bound is exceeded,
    /// leaving the envelope unusable (callers treat that as a build error).
    #[must_use]
    pub fn extend(&mut self, bytes: &[u8]) -> bool {
        self.payload.extend_from_slice(bytes).is_ok()
    }

    /// Set the expected reply length (pre-checksum bytes).
    pub fn expect_reply(mut self, len: usize) -> Self {
        self.reply_len = len;
        self
    }

    /// Attach a reply interpretation.
    pub fn with_reply(mut self, kind: ReplyKind) -> Self {
        self.reply = Some(kind);
        self
    }

    /// Mark or clear the criticality flag.
    pub fn set_critical(&mut self, critical: bool) {
        self.critical = critical;
    }

    /// Target address of this envelope.
    #[inline]
    pub fn address(&self) -> u8 {
        self.payload[0]
    }

    /// Address + payload bytes, checksum not yet appended.
    #[inline]
    pub fn payload(&self) -> &[u8] {
        &self.payload
    }

    /// Expected reply length on the wire, checksum included.
    ///
    /// Zero when no reply payload is expected beyond the echo of the
    /// address; a bare status poll with `reply_len == 0` is still a valid
    /// envelope.
    #[inline]
    pub fn wire_reply_len(&self) -> usize {
        if self.reply_len == 0 {
            0
        } else {
            self.reply_len + 2
        }
    }

    /// Whether failure must escalate to a machine alarm.
    #[inline]
    pub fn is_critical(&self) -> bool {
        self.critical
    }

    /// Reply interpretation, if any.
    #[inline]
    pub fn reply_kind(&self) -> Option<ReplyKind> {
        self.reply
    }

    /// Produce the wire frame: payload with the checksum appended low byte
    /// first. Returns `None` if the checksum no longer fits the frame bound.
    pub fn wire_frame(&self) -> Option<heapless::Vec<u8, MAX_FRAME_LEN>> {
        let mut frame = self.payload.clone();
        crc::append_crc(&mut frame).then_some(frame)
    }
}
