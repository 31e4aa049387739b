//! Bump-allocated storage blocks.
//!
//! A [`Block`] is a fixed-size `Box<[u8]>` with a cursor. The
//! [`BlockStore`] keeps every live block keyed by [`BlockId`] and fills
//! them in order; memory is never returned until the store is cleared.

use indexmap::IndexMap;
use tracing::trace;

use crate::error::ArenaError;

/// Identifies a block within one arena.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct BlockId(pub(crate) u32);

/// A single contiguous block with bump allocation.
pub(crate) struct Block {
    data: Box<[u8]>,
    cursor: usize,
}

impl Block {
    fn new(size: usize) -> Self {
        Self {
            data: vec![0u8; size].into_boxed_slice(),
            cursor: 0,
        }
    }

    /// Bump-allocate `len` bytes, or `None` if the block is too full.
    fn alloc(&mut self, len: usize) -> Option<usize> {
        let end = self.cursor.checked_add(len)?;
        if end > self.data.len() {
            return None;
        }
        let offset = self.cursor;
        self.cursor = end;
        Some(offset)
    }
}

/// The set of live blocks owned by an arena.
pub(crate) struct BlockStore {
    blocks: IndexMap<BlockId, Block>,
    /// Block currently being filled by regular-sized requests.
    current: Option<BlockId>,
    next_id: u32,
    block_size: usize,
    max_blocks: usize,
}

impl BlockStore {
    pub fn new(block_size: u32, max_blocks: u32) -> Self {
        Self {
            blocks: IndexMap::new(),
            current: None,
            next_id: 0,
            block_size: block_size as usize,
            max_blocks: max_blocks as usize,
        }
    }

    /// Allocate `len` bytes, returning the block and byte offset.
    ///
    /// Requests larger than a block get a dedicated block of exactly `len`
    /// bytes. Allocations never span blocks.
    pub fn alloc(&mut self, len: usize) -> Result<(BlockId, usize), ArenaError> {
        if len <= self.block_size {
            if let Some(id) = self.current {
                if let Some(offset) = self.blocks.get_mut(&id).and_then(|b| b.alloc(len)) {
                    return Ok((id, offset));
                }
            }
        }

        if self.blocks.len() >= self.max_blocks {
            return Err(ArenaError::CapacityExceeded {
                requested: len,
                capacity: self.memory_bytes(),
            });
        }

        let size = len.max(self.block_size);
        let id = BlockId(self.next_id);
        self.next_id += 1;
        let mut block = Block::new(size);
        let offset = block.alloc(len).unwrap_or(0);
        self.blocks.insert(id, block);
        if size == self.block_size {
            self.current = Some(id);
        }
        trace!(block = id.0, size, requested = len, "arena block allocated");
        Ok((id, offset))
    }

    /// Bytes at `offset..offset + len` of block `id`.
    pub fn bytes(&self, id: BlockId, offset: usize, len: usize) -> Option<&[u8]> {
        self.blocks.get(&id)?.data.get(offset..offset + len)
    }

    /// Mutable bytes at `offset..offset + len` of block `id`.
    pub fn bytes_mut(&mut self, id: BlockId, offset: usize, len: usize) -> Option<&mut [u8]> {
        self.blocks.get_mut(&id)?.data.get_mut(offset..offset + len)
    }

    /// Drop every block.
    pub fn clear(&mut self) {
        self.blocks.clear();
        self.current = None;
    }

    pub fn block_count(&self) -> usize {
        self.blocks.len()
    }

    pub fn memory_bytes(&self) -> usize {
        self.blocks.values().map(|b| b.data.len()).sum()
    }

    pub fn used_bytes(&self) -> usize {
        self.blocks.values().map(|b| b.cursor).sum()
    }
}
