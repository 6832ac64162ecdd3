//! Unified error type for the light switch.
//!
//! We avoid `alloc` - all error variants carry only fixed-size data.
//! Implements `defmt::Format` (behind the `defmt` feature) for on-target
//! logging.

/// Top-level error type used across the application.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Error {
    // Scheduler
    /// The alarm or deferred-callback queue is full.
    QueueFull,

    /// Cancellation found no matching alarm.
    NotFound,

    // Buffers
    /// A buffer id was freed twice or never belonged to the pool.
    InvalidBuffer,

    // Stack link
    /// A frame to or from the network co-processor was rejected.
    Link(LinkError),
}

/// Errors raised by the stack link codec.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum LinkError {
    /// Output buffer too small for the encoded frame.
    BufferTooSmall,
    /// Payload exceeds the maximum frame payload.
    PayloadTooLarge,
    /// Checksum mismatch on a received frame.
    InvalidChecksum,
    /// Frame type not known to this side of the link.
    UnknownType(u8),
    /// Payload length doesn't match the frame type.
    Malformed,
}

impl Error {
    /// Errors a caller may recover from by dropping the work at hand.
    /// Everything else is a scheduler fault.
    pub fn is_resource_exhaustion(&self) -> bool {
        matches!(self, Error::QueueFull)
    }
}

// Convenience conversions

impl From<LinkError> for Error {
    fn from(e: LinkError) -> Self {
        Error::Link(e)
    }
}
