//! Arena configuration parameters.

use crate::error::ArenaError;

/// Configuration for an [`Arena`](crate::Arena).
///
/// Controls block sizing, the block cap and the growth step of sequence
/// chunks. Validated at construction; immutable afterwards.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ArenaConfig {
    /// Size of each storage block in bytes.
    ///
    /// Default: 65_408 (64KB minus allocator bookkeeping). Requests larger
    /// than a block get a dedicated block of their own.
    pub block_size: u32,

    /// Maximum number of blocks the arena may hold.
    ///
    /// Default: 4096, i.e. roughly 256MB at the default block size.
    pub max_blocks: u32,

    /// Target size in bytes of one element chunk.
    ///
    /// A sequence grows by `max(chunk_bytes / elem_size, 1)` elements at a
    /// time. Must not exceed `block_size`.
    pub chunk_bytes: u32,
}

impl ArenaConfig {
    /// Default block size in bytes.
    pub const DEFAULT_BLOCK_SIZE: u32 = 65_408;

    /// Default block cap.
    pub const DEFAULT_MAX_BLOCKS: u32 = 4096;

    /// Default chunk size in bytes.
    pub const DEFAULT_CHUNK_BYTES: u32 = 1024;

    /// Smallest accepted block size.
    pub const MIN_BLOCK_SIZE: u32 = 64;

    /// Create a config with the given block size and defaults elsewhere.
    pub fn new(block_size: u32) -> Self {
        Self {
            block_size,
            max_blocks: Self::DEFAULT_MAX_BLOCKS,
            chunk_bytes: Self::DEFAULT_CHUNK_BYTES.min(block_size),
        }
    }

    /// Check the invariants documented on each field.
    pub fn validate(&self) -> Result<(), ArenaError> {
        if self.block_size < Self::MIN_BLOCK_SIZE {
            return Err(ArenaError::InvalidConfig {
                reason: format!(
                    "block_size {} is below the minimum of {}",
                    self.block_size,
                    Self::MIN_BLOCK_SIZE
                ),
            });
        }
        if self.max_blocks == 0 {
            return Err(ArenaError::InvalidConfig {
                reason: "max_blocks must be at least 1".into(),
            });
        }
        if self.chunk_bytes == 0 || self.chunk_bytes > self.block_size {
            return Err(ArenaError::InvalidConfig {
                reason: format!(
                    "chunk_bytes {} must be in 1..={}",
                    self.chunk_bytes, self.block_size
                ),
            });
        }
        Ok(())
    }

    /// Upper bound on arena memory in bytes, ignoring dedicated oversize blocks.
    pub fn capacity_bytes(&self) -> usize {
        self.block_size as usize * self.max_blocks as usize
    }
}

impl Default for ArenaConfig {
    fn default() -> Self {
        Self::new(Self::DEFAULT_BLOCK_SIZE)
    }
}
