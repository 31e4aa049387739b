//! Native sequence headers and their element chunks.

use smallvec::SmallVec;

use cvarr_core::SeqFlags;

use crate::block::BlockId;
use crate::handle::SeqHandle;

/// Fixed-layout header of a native sequence.
///
/// Mirrors the foreign sequence header: flags, sizes, element count and the
/// four structural links. Links are plain handle edges and never own the
/// sequence they point to; cycles are representable and harmless.
#[repr(C)]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SeqHeader {
    /// Element type, kind and shape flags.
    pub flags: SeqFlags,
    /// Size of this header in bytes.
    pub header_size: u32,
    /// Size of one element in bytes.
    pub elem_size: u32,
    /// Number of elements.
    pub total: u32,
    /// Previous sibling at the same level.
    pub h_prev: Option<SeqHandle>,
    /// Next sibling at the same level.
    pub h_next: Option<SeqHandle>,
    /// Parent (or previous level).
    pub v_prev: Option<SeqHandle>,
    /// First child (or next level).
    pub v_next: Option<SeqHandle>,
}

impl SeqHeader {
    pub(crate) fn new(flags: SeqFlags, elem_size: u32) -> Self {
        Self {
            flags,
            header_size: std::mem::size_of::<Self>() as u32,
            elem_size,
            total: 0,
            h_prev: None,
            h_next: None,
            v_prev: None,
            v_next: None,
        }
    }

    /// Read one of the four links.
    pub fn link(&self, link: Link) -> Option<SeqHandle> {
        match link {
            Link::HPrev => self.h_prev,
            Link::HNext => self.h_next,
            Link::VPrev => self.v_prev,
            Link::VNext => self.v_next,
        }
    }

    pub(crate) fn set_link(&mut self, link: Link, target: Option<SeqHandle>) {
        let field = match link {
            Link::HPrev => &mut self.h_prev,
            Link::HNext => &mut self.h_next,
            Link::VPrev => &mut self.v_prev,
            Link::VNext => &mut self.v_next,
        };
        *field = target;
    }
}

/// Selects one of the four structural links of a [`SeqHeader`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Link {
    /// Previous sibling.
    HPrev,
    /// Next sibling.
    HNext,
    /// Parent.
    VPrev,
    /// Child.
    VNext,
}

/// A contiguous run of elements inside one block.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) struct Chunk {
    pub block: BlockId,
    /// Byte offset of the first element within the block.
    pub offset: usize,
    /// Elements the chunk can hold.
    pub capacity: usize,
    /// Elements currently stored.
    pub len: usize,
    /// Borrowed from another sequence by an aliasing slice.
    pub shared: bool,
}

impl Chunk {
    pub fn is_full(&self) -> bool {
        self.len >= self.capacity
    }
}

/// Header plus element storage of one sequence.
///
/// Chunks before `fill` are full; pushes go into `chunks[fill]`.
pub(crate) struct SeqEntry {
    pub header: SeqHeader,
    pub chunks: SmallVec<[Chunk; 4]>,
    pub fill: usize,
}

impl SeqEntry {
    pub fn new(header: SeqHeader) -> Self {
        Self {
            header,
            chunks: SmallVec::new(),
            fill: 0,
        }
    }

    /// Chunk index and element offset holding element `index`.
    pub fn locate(&self, mut index: usize) -> Option<(usize, usize)> {
        for (i, chunk) in self.chunks.iter().enumerate() {
            if index < chunk.len {
                return Some((i, index));
            }
            index -= chunk.len;
        }
        None
    }

    /// Reset to empty, keeping owned chunks for reuse.
    pub fn clear(&mut self) {
        self.chunks.retain(|c| !c.shared);
        for chunk in &mut self.chunks {
            chunk.len = 0;
        }
        self.fill = 0;
        self.header.total = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn chunk(len: usize, capacity: usize, shared: bool) -> Chunk {
        Chunk {
            block: BlockId(0),
            offset: 0,
            capacity,
            len,
            shared,
        }
    }

    #[test]
    fn header_size_is_recorded() {
        let h = SeqHeader::new(SeqFlags::POLYGON, 8);
        assert_eq!(h.header_size as usize, std::mem::size_of::<SeqHeader>());
        assert_eq!(h.total, 0);
        assert_eq!(h.link(Link::HNext), None);
    }

    #[test]
    fn locate_walks_chunks() {
        let mut entry = SeqEntry::new(SeqHeader::new(SeqFlags::EMPTY, 4));
        entry.chunks.push(chunk(3, 3, false));
        entry.chunks.push(chunk(2, 4, false));
        assert_eq!(entry.locate(0), Some((0, 0)));
        assert_eq!(entry.locate(2), Some((0, 2)));
        assert_eq!(entry.locate(3), Some((1, 0)));
        assert_eq!(entry.locate(4), Some((1, 1)));
        assert_eq!(entry.locate(5), None);
    }

    #[test]
    fn clear_drops_shared_chunks_and_keeps_owned() {
        let mut entry = SeqEntry::new(SeqHeader::new(SeqFlags::EMPTY, 4));
        entry.chunks.push(chunk(3, 3, true));
        entry.chunks.push(chunk(2, 4, false));
        entry.header.total = 5;
        entry.fill = 1;
        entry.clear();
        assert_eq!(entry.chunks.len(), 1);
        assert_eq!(entry.chunks[0].len, 0);
        assert!(!entry.chunks[0].shared);
        assert_eq!(entry.header.total, 0);
        assert_eq!(entry.fill, 0);
    }
}
