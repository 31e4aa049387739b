//! The shared arena and its native sequence operations.
//!
//! Every operation takes a [`SeqHandle`] and resolves it against the
//! arena's header table. Typed element access goes through
//! [`bytemuck::Pod`], so elements are copied in and out verbatim.

use std::cell::RefCell;
use std::fmt;
use std::ops::Range;
use std::rc::Rc;
use std::sync::atomic::{AtomicU64, Ordering};

use bytemuck::Pod;
use tracing::debug;

use cvarr_core::SeqFlags;

use crate::block::BlockStore;
use crate::config::ArenaConfig;
use crate::error::ArenaError;
use crate::handle::{HandleTable, SeqHandle};
use crate::header::{Chunk, Link, SeqEntry, SeqHeader};

static ARENA_COUNTER: AtomicU64 = AtomicU64::new(1);

/// Process-unique identifier of an arena.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ArenaId(u64);

impl ArenaId {
    fn next() -> Self {
        Self(ARENA_COUNTER.fetch_add(1, Ordering::Relaxed))
    }
}

impl fmt::Display for ArenaId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

struct Storage {
    config: ArenaConfig,
    blocks: BlockStore,
    seqs: HandleTable<SeqEntry>,
    released: bool,
}

impl Storage {
    fn check_live(&self) -> Result<(), ArenaError> {
        if self.released {
            Err(ArenaError::Released)
        } else {
            Ok(())
        }
    }

    fn entry(&self, handle: SeqHandle) -> Result<&SeqEntry, ArenaError> {
        self.check_live()?;
        self.seqs
            .get(handle)
            .ok_or(ArenaError::StaleHandle { handle })
    }

    fn entry_mut(&mut self, handle: SeqHandle) -> Result<&mut SeqEntry, ArenaError> {
        self.check_live()?;
        self.seqs
            .get_mut(handle)
            .ok_or(ArenaError::StaleHandle { handle })
    }

    fn element_bytes(&self, handle: SeqHandle, index: usize) -> Result<&[u8], ArenaError> {
        let entry = self.entry(handle)?;
        let len = entry.header.total as usize;
        let (chunk_idx, within) = entry
            .locate(index)
            .ok_or(ArenaError::InvalidIndex { index, len })?;
        let chunk = &entry.chunks[chunk_idx];
        let es = entry.header.elem_size as usize;
        self.blocks
            .bytes(chunk.block, chunk.offset + within * es, es)
            .ok_or(ArenaError::StaleHandle { handle })
    }

    fn push_bytes(&mut self, handle: SeqHandle, bytes: &[u8]) -> Result<(), ArenaError> {
        self.check_live()?;
        let Storage {
            config,
            blocks,
            seqs,
            ..
        } = self;
        let entry = seqs
            .get_mut(handle)
            .ok_or(ArenaError::StaleHandle { handle })?;
        let es = entry.header.elem_size as usize;
        if bytes.len() != es {
            return Err(ArenaError::ElementSizeMismatch {
                expected: es,
                found: bytes.len(),
            });
        }

        while entry.fill < entry.chunks.len() && entry.chunks[entry.fill].is_full() {
            entry.fill += 1;
        }
        if entry.fill == entry.chunks.len() {
            let capacity = (config.chunk_bytes as usize / es).max(1);
            let (block, offset) = blocks.alloc(capacity * es)?;
            entry.chunks.push(Chunk {
                block,
                offset,
                capacity,
                len: 0,
                shared: false,
            });
        }

        let chunk = &mut entry.chunks[entry.fill];
        let at = chunk.offset + chunk.len * es;
        blocks
            .bytes_mut(chunk.block, at, es)
            .ok_or(ArenaError::StaleHandle { handle })?
            .copy_from_slice(bytes);
        chunk.len += 1;
        entry.header.total += 1;
        Ok(())
    }
}

/// A growable memory pool owning the storage of one or more sequences.
///
/// Cloning an `Arena` clones the shared reference, not the storage. Memory
/// is returned when the last clone is dropped or on [`Arena::release`].
#[derive(Clone)]
pub struct Arena {
    id: ArenaId,
    inner: Rc<RefCell<Storage>>,
}

impl Arena {
    /// Create an arena with the default configuration.
    pub fn new() -> Self {
        Self::build(ArenaConfig::default())
    }

    /// Create an arena with a validated configuration.
    pub fn with_config(config: ArenaConfig) -> Result<Self, ArenaError> {
        config.validate()?;
        Ok(Self::build(config))
    }

    fn build(config: ArenaConfig) -> Self {
        let id = ArenaId::next();
        debug!(arena = %id, block_size = config.block_size, "arena created");
        let storage = Storage {
            blocks: BlockStore::new(config.block_size, config.max_blocks),
            seqs: HandleTable::new(),
            released: false,
            config,
        };
        Self {
            id,
            inner: Rc::new(RefCell::new(storage)),
        }
    }

    /// This arena's identifier.
    pub fn id(&self) -> ArenaId {
        self.id
    }

    /// Whether `other` refers to the same storage.
    pub fn ptr_eq(&self, other: &Arena) -> bool {
        Rc::ptr_eq(&self.inner, &other.inner)
    }

    /// The configuration this arena was built with.
    pub fn config(&self) -> ArenaConfig {
        self.inner.borrow().config.clone()
    }

    /// Free every block and sequence header.
    ///
    /// All sequences built on this arena become invalid and report
    /// [`ArenaError::Released`]. Idempotent.
    pub fn release(&self) {
        let mut storage = self.inner.borrow_mut();
        if storage.released {
            return;
        }
        debug!(
            arena = %self.id,
            blocks = storage.blocks.block_count(),
            sequences = storage.seqs.len(),
            "arena released"
        );
        storage.blocks.clear();
        storage.seqs.clear();
        storage.released = true;
    }

    /// Whether [`release`](Self::release) has been called.
    pub fn is_released(&self) -> bool {
        self.inner.borrow().released
    }

    /// Number of live blocks.
    pub fn block_count(&self) -> usize {
        self.inner.borrow().blocks.block_count()
    }

    /// Bytes reserved by live blocks.
    pub fn memory_bytes(&self) -> usize {
        self.inner.borrow().blocks.memory_bytes()
    }

    /// Bytes handed out from live blocks.
    pub fn used_bytes(&self) -> usize {
        self.inner.borrow().blocks.used_bytes()
    }

    /// Number of live sequence headers.
    pub fn sequence_count(&self) -> usize {
        self.inner.borrow().seqs.len()
    }

    /// Create an empty sequence of `elem_size`-byte elements.
    pub fn create_seq(&self, flags: SeqFlags, elem_size: usize) -> Result<SeqHandle, ArenaError> {
        if elem_size == 0 {
            return Err(ArenaError::ZeroSizedElement);
        }
        let mut storage = self.inner.borrow_mut();
        storage.check_live()?;
        let handle = storage
            .seqs
            .insert(SeqEntry::new(SeqHeader::new(flags, elem_size as u32)));
        debug!(arena = %self.id, %handle, %flags, elem_size, "sequence created");
        Ok(handle)
    }

    /// Copy of the sequence's native header.
    pub fn header(&self, handle: SeqHandle) -> Result<SeqHeader, ArenaError> {
        Ok(self.inner.borrow().entry(handle)?.header)
    }

    /// Whether `handle` resolves in this arena.
    pub fn contains(&self, handle: SeqHandle) -> bool {
        let storage = self.inner.borrow();
        !storage.released && storage.seqs.contains(handle)
    }

    /// Element count, read from the header.
    pub fn total(&self, handle: SeqHandle) -> Result<usize, ArenaError> {
        Ok(self.header(handle)?.total as usize)
    }

    /// Append raw element bytes.
    pub fn push_bytes(&self, handle: SeqHandle, bytes: &[u8]) -> Result<(), ArenaError> {
        self.inner.borrow_mut().push_bytes(handle, bytes)
    }

    /// Append a typed element.
    pub fn push<T: Pod>(&self, handle: SeqHandle, value: &T) -> Result<(), ArenaError> {
        self.push_bytes(handle, bytemuck::bytes_of(value))
    }

    /// Read element `index` as `T`.
    pub fn get<T: Pod>(&self, handle: SeqHandle, index: usize) -> Result<T, ArenaError> {
        let storage = self.inner.borrow();
        let bytes = storage.element_bytes(handle, index)?;
        if bytes.len() != std::mem::size_of::<T>() {
            return Err(ArenaError::ElementSizeMismatch {
                expected: bytes.len(),
                found: std::mem::size_of::<T>(),
            });
        }
        Ok(bytemuck::pod_read_unaligned(bytes))
    }

    /// Remove all elements without returning memory. O(1) in the common
    /// case; owned chunks are refilled by later pushes.
    pub fn clear(&self, handle: SeqHandle) -> Result<(), ArenaError> {
        self.inner.borrow_mut().entry_mut(handle)?.clear();
        Ok(())
    }

    /// Read one structural link.
    pub fn link(&self, handle: SeqHandle, link: Link) -> Result<Option<SeqHandle>, ArenaError> {
        Ok(self.header(handle)?.link(link))
    }

    /// Rewrite one structural link. `target` must live in this arena.
    pub fn set_link(
        &self,
        handle: SeqHandle,
        link: Link,
        target: Option<SeqHandle>,
    ) -> Result<(), ArenaError> {
        let mut storage = self.inner.borrow_mut();
        if let Some(t) = target {
            storage.entry(t)?;
        }
        storage.entry_mut(handle)?.header.set_link(link, target);
        Ok(())
    }

    /// Create a sequence holding elements `range` of `handle`.
    ///
    /// `range.end` is clamped to the element count. With `copy_data` the
    /// elements are copied into `target`; otherwise the new header shares the
    /// source chunks, which requires `target` to be this arena.
    pub fn slice(
        &self,
        handle: SeqHandle,
        range: Range<usize>,
        target: &Arena,
        copy_data: bool,
    ) -> Result<SeqHandle, ArenaError> {
        let (header, range) = {
            let storage = self.inner.borrow();
            let header = storage.entry(handle)?.header;
            let total = header.total as usize;
            let end = range.end.min(total);
            if range.start > end {
                return Err(ArenaError::InvalidIndex {
                    index: range.start,
                    len: total,
                });
            }
            (header, range.start..end)
        };

        if copy_data {
            let staged = self.copy_range(handle, range)?;
            let es = header.elem_size as usize;
            let out = target.create_seq(header.flags, es)?;
            for element in staged.chunks_exact(es) {
                target.push_bytes(out, element)?;
            }
            return Ok(out);
        }

        if !self.ptr_eq(target) {
            return Err(ArenaError::ForeignArena);
        }
        let mut storage = self.inner.borrow_mut();
        let shared = {
            let entry = storage.entry(handle)?;
            alias_chunks(entry, range.clone())
        };
        let mut slice_header = SeqHeader::new(header.flags, header.elem_size);
        slice_header.total = range.len() as u32;
        let mut entry = SeqEntry::new(slice_header);
        entry.fill = shared.len();
        entry.chunks.extend(shared);
        Ok(storage.seqs.insert(entry))
    }

    fn copy_range(&self, handle: SeqHandle, range: Range<usize>) -> Result<Vec<u8>, ArenaError> {
        let storage = self.inner.borrow();
        let mut staged = Vec::new();
        for index in range {
            staged.extend_from_slice(storage.element_bytes(handle, index)?);
        }
        Ok(staged)
    }
}

/// Chunk views covering elements `range` of `entry`, marked shared.
fn alias_chunks(entry: &SeqEntry, range: Range<usize>) -> Vec<Chunk> {
    let es = entry.header.elem_size as usize;
    let mut out = Vec::new();
    let mut base = 0usize;
    for chunk in &entry.chunks {
        let lo = range.start.max(base);
        let hi = range.end.min(base + chunk.len);
        if lo < hi {
            out.push(Chunk {
                block: chunk.block,
                offset: chunk.offset + (lo - base) * es,
                capacity: hi - lo,
                len: hi - lo,
                shared: true,
            });
        }
        base += chunk.len;
        if base >= range.end {
            break;
        }
    }
    out
}

impl Default for Arena {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Arena {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let storage = self.inner.borrow();
        f.debug_struct("Arena")
            .field("id", &self.id)
            .field("blocks", &storage.blocks.block_count())
            .field("sequences", &storage.seqs.len())
            .field("released", &storage.released)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn small_arena() -> Arena {
        Arena::with_config(ArenaConfig {
            block_size: 256,
            max_blocks: 64,
            chunk_bytes: 32,
        })
        .unwrap()
    }

    #[test]
    fn push_then_get() {
        let arena = Arena::new();
        let h = arena.create_seq(SeqFlags::EMPTY, 4).unwrap();
        for v in 0..10i32 {
            arena.push(h, &v).unwrap();
        }
        assert_eq!(arena.total(h).unwrap(), 10);
        assert_eq!(arena.get::<i32>(h, 7).unwrap(), 7);
        assert!(matches!(
            arena.get::<i32>(h, 10),
            Err(ArenaError::InvalidIndex { index: 10, len: 10 })
        ));
    }

    #[test]
    fn push_spans_many_chunks() {
        let arena = small_arena();
        let h = arena.create_seq(SeqFlags::EMPTY, 8).unwrap();
        for v in 0..100u64 {
            arena.push(h, &v).unwrap();
        }
        for v in 0..100u64 {
            assert_eq!(arena.get::<u64>(h, v as usize).unwrap(), v);
        }
    }

    #[test]
    fn wrong_element_size_rejected() {
        let arena = Arena::new();
        let h = arena.create_seq(SeqFlags::EMPTY, 4).unwrap();
        assert!(matches!(
            arena.push(h, &1u64),
            Err(ArenaError::ElementSizeMismatch {
                expected: 4,
                found: 8
            })
        ));
        arena.push(h, &1u32).unwrap();
        assert!(arena.get::<u16>(h, 0).is_err());
    }

    #[test]
    fn zero_sized_elements_rejected() {
        let arena = Arena::new();
        assert_eq!(
            arena.create_seq(SeqFlags::EMPTY, 0),
            Err(ArenaError::ZeroSizedElement)
        );
    }

    #[test]
    fn clear_preserves_capacity() {
        let arena = small_arena();
        let h = arena.create_seq(SeqFlags::EMPTY, 4).unwrap();
        for v in 0..50i32 {
            arena.push(h, &v).unwrap();
        }
        let blocks = arena.block_count();
        let used = arena.used_bytes();
        arena.clear(h).unwrap();
        assert_eq!(arena.total(h).unwrap(), 0);
        for v in 0..50i32 {
            arena.push(h, &(v * 2)).unwrap();
        }
        assert_eq!(arena.block_count(), blocks);
        assert_eq!(arena.used_bytes(), used);
        assert_eq!(arena.get::<i32>(h, 49).unwrap(), 98);
    }

    #[test]
    fn links_round_trip_and_allow_cycles() {
        let arena = Arena::new();
        let a = arena.create_seq(SeqFlags::EMPTY, 4).unwrap();
        let b = arena.create_seq(SeqFlags::EMPTY, 4).unwrap();
        arena.set_link(a, Link::HNext, Some(b)).unwrap();
        arena.set_link(b, Link::HNext, Some(a)).unwrap();
        assert_eq!(arena.link(a, Link::HNext).unwrap(), Some(b));
        assert_eq!(arena.link(b, Link::HNext).unwrap(), Some(a));
        arena.set_link(a, Link::HNext, None).unwrap();
        assert_eq!(arena.link(a, Link::HNext).unwrap(), None);
    }

    #[test]
    fn aliasing_slice_shares_storage() {
        let arena = small_arena();
        let h = arena.create_seq(SeqFlags::EMPTY, 4).unwrap();
        for v in 0..20i32 {
            arena.push(h, &v).unwrap();
        }
        let used = arena.used_bytes();
        let s = arena.slice(h, 5..15, &arena, false).unwrap();
        assert_eq!(arena.used_bytes(), used);
        assert_eq!(arena.total(s).unwrap(), 10);
        for i in 0..10 {
            assert_eq!(arena.get::<i32>(s, i).unwrap(), 5 + i as i32);
        }
    }

    #[test]
    fn clearing_alias_never_overwrites_source() {
        let arena = small_arena();
        let h = arena.create_seq(SeqFlags::EMPTY, 4).unwrap();
        for v in 0..4i32 {
            arena.push(h, &v).unwrap();
        }
        let s = arena.slice(h, 0..4, &arena, false).unwrap();
        arena.clear(s).unwrap();
        arena.push(s, &99i32).unwrap();
        assert_eq!(arena.get::<i32>(h, 0).unwrap(), 0);
        assert_eq!(arena.get::<i32>(s, 0).unwrap(), 99);
    }

    #[test]
    fn copying_slice_into_other_arena() {
        let src = Arena::new();
        let dst = Arena::new();
        let h = src.create_seq(SeqFlags::POLYGON, 4).unwrap();
        for v in 0..8i32 {
            src.push(h, &v).unwrap();
        }
        let s = src.slice(h, 2..100, &dst, true).unwrap();
        assert_eq!(dst.total(s).unwrap(), 6);
        assert_eq!(dst.get::<i32>(s, 0).unwrap(), 2);
        assert_eq!(dst.header(s).unwrap().flags, SeqFlags::POLYGON);
        assert_eq!(src.total(h).unwrap(), 8);
    }

    #[test]
    fn aliasing_into_foreign_arena_rejected() {
        let src = Arena::new();
        let dst = Arena::new();
        let h = src.create_seq(SeqFlags::EMPTY, 4).unwrap();
        assert_eq!(
            src.slice(h, 0..0, &dst, false),
            Err(ArenaError::ForeignArena)
        );
    }

    #[test]
    fn release_invalidates_handles() {
        let arena = Arena::new();
        let h = arena.create_seq(SeqFlags::EMPTY, 4).unwrap();
        arena.push(h, &1i32).unwrap();
        let alias = arena.clone();
        alias.release();
        assert!(arena.is_released());
        assert_eq!(arena.block_count(), 0);
        assert_eq!(arena.total(h), Err(ArenaError::Released));
        assert_eq!(arena.push(h, &2i32), Err(ArenaError::Released));
        assert_eq!(
            arena.create_seq(SeqFlags::EMPTY, 4),
            Err(ArenaError::Released)
        );
        arena.release();
    }

    proptest! {
        #[test]
        fn slice_matches_source_range(
            values in proptest::collection::vec(any::<i32>(), 0..200),
            a in 0usize..200,
            b in 0usize..200,
            copy in any::<bool>(),
        ) {
            let arena = small_arena();
            let h = arena.create_seq(SeqFlags::EMPTY, 4).unwrap();
            for v in &values {
                arena.push(h, v).unwrap();
            }
            let (start, end) = (a.min(b).min(values.len()), a.max(b));
            let s = arena.slice(h, start..end, &arena, copy).unwrap();
            let expected = &values[start..end.min(values.len())];
            prop_assert_eq!(arena.total(s).unwrap(), expected.len());
            for (i, v) in expected.iter().enumerate() {
                prop_assert_eq!(arena.get::<i32>(s, i).unwrap(), *v);
            }
        }
    }
}
