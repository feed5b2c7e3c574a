//! Generation-checked slot table backing the buffer pool's cache.
//!
//! Bucket entries hold a [`SlotRef`], never the buffer itself. When the
//! pool evicts or reclaims a buffer, the slot's generation moves on and
//! every outstanding reference to it goes dead; a later lookup through a
//! dead reference yields `None` and the entry is discarded.

/// A reference to a cached value: slot index plus the generation it was
/// issued at.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub(crate) struct SlotRef {
    index: u32,
    generation: u32,
}

struct Slot<T> {
    generation: u32,
    value: Option<T>,
}

/// Owns cached values and hands out [`SlotRef`]s to them.
///
/// Freed slots are recycled; a slot whose generation would wrap back to
/// zero is retired instead, so an ancient reference can never resolve to
/// a newer value.
pub(crate) struct SlotTable<T> {
    slots: Vec<Slot<T>>,
    free: Vec<u32>,
    live: usize,
}

impl<T> SlotTable<T> {
    pub(crate) const fn new() -> Self {
        Self {
            slots: Vec::new(),
            free: Vec::new(),
            live: 0,
        }
    }

    /// Store `value` and return a reference to it.
    pub(crate) fn insert(&mut self, value: T) -> SlotRef {
        self.live += 1;
        if let Some(index) = self.free.pop() {
            let slot = &mut self.slots[index as usize];
            slot.value = Some(value);
            return SlotRef {
                index,
                generation: slot.generation,
            };
        }
        let index = u32::try_from(self.slots.len()).unwrap_or(u32::MAX);
        self.slots.push(Slot {
            generation: 0,
            value: Some(value),
        });
        SlotRef {
            index,
            generation: 0,
        }
    }

    /// Whether `slot` still refers to a stored value.
    pub(crate) fn is_live(&self, slot: SlotRef) -> bool {
        self.slots
            .get(slot.index as usize)
            .is_some_and(|s| s.generation == slot.generation && s.value.is_some())
    }

    /// Remove and return the value behind `slot`.
    ///
    /// Returns `None` for a dead reference; taking twice is harmless.
    pub(crate) fn take(&mut self, slot: SlotRef) -> Option<T> {
        let entry = self.slots.get_mut(slot.index as usize)?;
        if entry.generation != slot.generation {
            return None;
        }
        let value = entry.value.take()?;
        entry.generation = entry.generation.wrapping_add(1);
        if entry.generation != 0 {
            self.free.push(slot.index);
        }
        self.live -= 1;
        Some(value)
    }

    /// Remove every stored value, invalidating all references.
    pub(crate) fn drain(&mut self) -> Vec<T> {
        let mut out = Vec::with_capacity(self.live);
        for index in 0..self.slots.len() {
            let slot = &self.slots[index];
            let handle = SlotRef {
                index: index as u32,
                generation: slot.generation,
            };
            if let Some(value) = self.take(handle) {
                out.push(value);
            }
        }
        out
    }

    /// Number of stored values.
    pub(crate) fn live(&self) -> usize {
        self.live
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn insert_take_round_trip() {
        let mut table = SlotTable::new();
        let r = table.insert(7u8);
        assert!(table.is_live(r));
        assert_eq!(table.take(r), Some(7));
        assert!(!table.is_live(r));
        assert_eq!(table.live(), 0);
    }

    #[test]
    fn double_take_is_none() {
        let mut table = SlotTable::new();
        let r = table.insert(1u8);
        assert_eq!(table.take(r), Some(1));
        assert_eq!(table.take(r), None);
    }

    #[test]
    fn recycled_slot_does_not_revive_old_reference() {
        let mut table = SlotTable::new();
        let old = table.insert(1u8);
        table.take(old);
        let new = table.insert(2u8);
        assert_eq!(old.index, new.index);
        assert_ne!(old.generation, new.generation);
        assert!(!table.is_live(old));
        assert_eq!(table.take(old), None);
        assert_eq!(table.take(new), Some(2));
    }

    #[test]
    fn drain_kills_every_reference() {
        let mut table = SlotTable::new();
        let refs: Vec<_> = (0..5u8).map(|v| table.insert(v)).collect();
        table.take(refs[2]);
        let mut drained = table.drain();
        drained.sort_unstable();
        assert_eq!(drained, vec![0, 1, 3, 4]);
        assert!(refs.iter().all(|&r| !table.is_live(r)));
        assert_eq!(table.live(), 0);
    }

    #[test]
    fn wrapped_generation_retires_slot() {
        let mut table = SlotTable::new();
        let r = table.insert(1u8);
        table.take(r);
        table.slots[0].generation = u32::MAX;
        let last = table.insert(2u8);
        assert_eq!(last.generation, u32::MAX);
        table.take(last);
        assert_eq!(table.slots[0].generation, 0);
        assert!(!table.free.contains(&0));

        let stale = SlotRef {
            index: 0,
            generation: 0,
        };
        assert!(!table.is_live(stale));
        let fresh = table.insert(3u8);
        assert_ne!(fresh.index, 0);
    }
}
