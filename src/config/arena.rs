//! Generational row arena backing the configuration tables.
//!
//! Rows are addressed by [`RowHandle`]s rather than references. A handle
//! carries the generation of the slot it was issued for, so a handle to a
//! deleted row can never resolve to a different row that reused the slot.
//! Snapshots copy row data out of the arena; iteration never touches live
//! storage.

/// Stable handle to a row in an [`Arena`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RowHandle {
    index: u32,
    generation: u32,
}

impl RowHandle {
    /// Slot index. Only meaningful to the arena that issued the handle.
    pub fn index(&self) -> u32 {
        self.index
    }
}

struct Slot<R> {
    generation: u32,
    row: Option<R>,
}

/// Arena of table rows with generational handles.
pub struct Arena<R> {
    slots: Vec<Slot<R>>,
    free: Vec<u32>,
    len: usize,
}

impl<R> Default for Arena<R> {
    fn default() -> Self {
        Self::new()
    }
}

impl<R> Arena<R> {
    /// Create an empty arena.
    pub fn new() -> Self {
        Self {
            slots: Vec::new(),
            free: Vec::new(),
            len: 0,
        }
    }

    /// Number of live rows.
    pub fn len(&self) -> usize {
        self.len
    }

    /// True if there are no live rows.
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Insert a row, returning its handle.
    pub fn insert(&mut self, row: R) -> RowHandle {
        self.len += 1;
        if let Some(index) = self.free.pop() {
            let slot = &mut self.slots[index as usize];
            slot.row = Some(row);
            return RowHandle {
                index,
                generation: slot.generation,
            };
        }
        let index = self.slots.len() as u32;
        self.slots.push(Slot {
            generation: 0,
            row: Some(row),
        });
        RowHandle {
            index,
            generation: 0,
        }
    }

    /// Remove a row. Returns the row if the handle was live.
    ///
    /// The slot's generation is bumped so outstanding handles to the removed
    /// row become stale instead of resolving to a future occupant.
    pub fn remove(&mut self, handle: RowHandle) -> Option<R> {
        let slot = self.slots.get_mut(handle.index as usize)?;
        if slot.generation != handle.generation || slot.row.is_none() {
            return None;
        }
        let row = slot.row.take();
        slot.generation = slot.generation.wrapping_add(1);
        self.free.push(handle.index);
        self.len -= 1;
        row
    }

    /// Get a row by handle.
    pub fn get(&self, handle: RowHandle) -> Option<&R> {
        let slot = self.slots.get(handle.index as usize)?;
        if slot.generation != handle.generation {
            return None;
        }
        slot.row.as_ref()
    }

    /// Get a row mutably by handle.
    pub fn get_mut(&mut self, handle: RowHandle) -> Option<&mut R> {
        let slot = self.slots.get_mut(handle.index as usize)?;
        if slot.generation != handle.generation {
            return None;
        }
        slot.row.as_mut()
    }

    /// Iterate live rows with their handles.
    pub fn iter(&self) -> impl Iterator<Item = (RowHandle, &R)> {
        self.slots.iter().enumerate().filter_map(|(i, slot)| {
            slot.row.as_ref().map(|row| {
                (
                    RowHandle {
                        index: i as u32,
                        generation: slot.generation,
                    },
                    row,
                )
            })
        })
    }

    /// Find the first row matching a predicate.
    pub fn find(&self, mut pred: impl FnMut(&R) -> bool) -> Option<(RowHandle, &R)> {
        self.iter().find(|(_, row)| pred(row))
    }
}

impl<R: Clone> Arena<R> {
    /// Copy all live rows out of the arena.
    ///
    /// The returned vector is internally consistent at capture time and safe
    /// to iterate with no lock held; concurrent table mutation cannot
    /// invalidate it.
    pub fn snapshot(&self) -> Vec<(RowHandle, R)> {
        self.iter().map(|(h, row)| (h, row.clone())).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_insert_get_remove() {
        let mut arena = Arena::new();
        let a = arena.insert("a");
        let b = arena.insert("b");
        assert_eq!(arena.len(), 2);
        assert_eq!(arena.get(a), Some(&"a"));
        assert_eq!(arena.remove(a), Some("a"));
        assert_eq!(arena.get(a), None);
        assert_eq!(arena.get(b), Some(&"b"));
        assert_eq!(arena.len(), 1);
    }

    #[test]
    fn test_stale_handle_after_slot_reuse() {
        let mut arena = Arena::new();
        let a = arena.insert("a");
        arena.remove(a);
        let c = arena.insert("c"); // reuses the freed slot
        assert_eq!(c.index(), a.index());
        assert_eq!(arena.get(a), None, "stale handle must not see new row");
        assert_eq!(arena.get(c), Some(&"c"));
    }

    #[test]
    fn test_double_remove_is_noop() {
        let mut arena = Arena::new();
        let a = arena.insert(1);
        assert_eq!(arena.remove(a), Some(1));
        assert_eq!(arena.remove(a), None);
        assert_eq!(arena.len(), 0);
    }

    #[test]
    fn test_snapshot_is_independent_of_mutation() {
        let mut arena = Arena::new();
        let a = arena.insert(String::from("a"));
        arena.insert(String::from("b"));
        let snap = arena.snapshot();
        arena.remove(a);
        assert_eq!(snap.len(), 2);
        assert!(snap.iter().any(|(_, r)| r == "a"));
    }

    #[test]
    fn test_find() {
        let mut arena = Arena::new();
        arena.insert(10);
        let h = arena.insert(20);
        let (found, row) = arena.find(|r| *r == 20).unwrap();
        assert_eq!(found, h);
        assert_eq!(*row, 20);
    }
}
