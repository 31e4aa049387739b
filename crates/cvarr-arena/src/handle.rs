//! Slot+generation handles for native sequence headers.
//!
//! A [`SeqHandle`] is the arena-relative identity of a sequence. Released
//! slots bump their generation, so a handle that outlived its header is
//! detected instead of resolving to whatever reused the slot.

use std::fmt;
use std::num::NonZeroU64;

/// Handle to a sequence header inside an arena.
///
/// Upper 32 bits = slot index, lower 32 bits = generation. Generations start
/// at 1, so the encoded value is never zero and `Option<SeqHandle>` has the
/// layout of a nullable `u64` in a `repr(C)` header.
#[repr(transparent)]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct SeqHandle(NonZeroU64);

impl SeqHandle {
    fn encode(slot: u32, generation: u32) -> Option<Self> {
        NonZeroU64::new(((slot as u64) << 32) | generation as u64).map(Self)
    }

    /// Slot index within the header table.
    pub fn slot(self) -> u32 {
        (self.0.get() >> 32) as u32
    }

    /// Generation the slot had when this handle was issued.
    pub fn generation(self) -> u32 {
        self.0.get() as u32
    }

    /// Raw encoded value.
    pub fn to_raw(self) -> u64 {
        self.0.get()
    }

    /// Rebuild a handle from its raw value; `0` is the null handle.
    pub fn from_raw(raw: u64) -> Option<Self> {
        NonZeroU64::new(raw).map(Self)
    }
}

impl fmt::Display for SeqHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SeqHandle(slot={}, gen={})", self.slot(), self.generation())
    }
}

struct Slot<T> {
    generation: u32,
    data: Option<T>,
}

/// Slot table mapping [`SeqHandle`]s to owned values.
///
/// Reuses slots via a free list. A slot whose generation would wrap to 0 is
/// retired instead of recycled.
pub(crate) struct HandleTable<T> {
    slots: Vec<Slot<T>>,
    free_list: Vec<u32>,
    live: usize,
}

impl<T> HandleTable<T> {
    pub const fn new() -> Self {
        Self {
            slots: Vec::new(),
            free_list: Vec::new(),
            live: 0,
        }
    }

    /// Insert a value and return its handle.
    pub fn insert(&mut self, value: T) -> SeqHandle {
        self.live += 1;
        if let Some(slot_idx) = self.free_list.pop() {
            let slot = &mut self.slots[slot_idx as usize];
            slot.data = Some(value);
            return SeqHandle::encode(slot_idx, slot.generation)
                .unwrap_or_else(|| unreachable!("free-listed slots have nonzero generation"));
        }
        let slot_idx = self.slots.len() as u32;
        self.slots.push(Slot {
            generation: 1,
            data: Some(value),
        });
        SeqHandle::encode(slot_idx, 1).unwrap_or_else(|| unreachable!("generation 1 is nonzero"))
    }

    pub fn get(&self, handle: SeqHandle) -> Option<&T> {
        let slot = self.slots.get(handle.slot() as usize)?;
        if slot.generation != handle.generation() {
            return None;
        }
        slot.data.as_ref()
    }

    pub fn get_mut(&mut self, handle: SeqHandle) -> Option<&mut T> {
        let slot = self.slots.get_mut(handle.slot() as usize)?;
        if slot.generation != handle.generation() {
            return None;
        }
        slot.data.as_mut()
    }

    /// Whether `handle` currently resolves.
    pub fn contains(&self, handle: SeqHandle) -> bool {
        self.get(handle).is_some()
    }

    /// Remove the value behind a handle. Double-remove returns `None`.
    #[cfg_attr(not(test), allow(dead_code))]
    pub fn remove(&mut self, handle: SeqHandle) -> Option<T> {
        let slot_idx = handle.slot();
        let slot = self.slots.get_mut(slot_idx as usize)?;
        if slot.generation != handle.generation() {
            return None;
        }
        let value = slot.data.take()?;
        self.live -= 1;
        slot.generation = slot.generation.wrapping_add(1);
        if slot.generation != 0 {
            self.free_list.push(slot_idx);
        }
        Some(value)
    }

    /// Remove every value, invalidating all outstanding handles.
    pub fn clear(&mut self) {
        self.free_list.clear();
        for (idx, slot) in self.slots.iter_mut().enumerate() {
            if slot.data.take().is_some() {
                slot.generation = slot.generation.wrapping_add(1);
            }
            if slot.generation != 0 {
                self.free_list.push(idx as u32);
            }
        }
        self.live = 0;
    }

    /// Number of live values.
    pub fn len(&self) -> usize {
        self.live
    }
}
