//! Fixed pool of stack buffers.
//!
//! Every outgoing request needs one buffer. Ids are 1-based, which keeps
//! `Option<BufId>` the size of a byte.

use core::num::NonZeroU8;

use crate::error::Error;

/// Handle to an allocated buffer.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct BufId(NonZeroU8);

impl BufId {
    pub fn get(self) -> u8 {
        self.0.get()
    }

    fn index(self) -> usize {
        self.0.get() as usize - 1
    }
}

pub struct BufferPool<const N: usize> {
    in_use: [bool; N],
}

impl<const N: usize> BufferPool<N> {
    pub const fn new() -> Self {
        Self { in_use: [false; N] }
    }

    /// Take a free buffer, if any.
    pub fn alloc(&mut self) -> Option<BufId> {
        let index = self.in_use.iter().position(|used| !used)?;
        self.in_use[index] = true;
        // N is bounded well below u8::MAX by configuration.
        NonZeroU8::new(index as u8 + 1).map(BufId)
    }

    /// Return a buffer to the pool.
    pub fn free(&mut self, buf: BufId) -> Result<(), Error> {
        match self.in_use.get_mut(buf.index()) {
            Some(slot) if *slot => {
                *slot = false;
                Ok(())
            }
            _ => Err(Error::InvalidBuffer),
        }
    }

    pub fn available(&self) -> usize {
        self.in_use.iter().filter(|used| !**used).count()
    }
}

impl<const N: usize> Default for BufferPool<N> {
    fn default() -> Self {
        Self::new()
    }
}
