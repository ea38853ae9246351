//! ProbedTable: fixed-capacity linear probing with tombstones and a recency list.

use crate::error::TableError;
use crate::recency::{Linked, Links, RecencyList};
use core::borrow::Borrow;
use core::hash::{BuildHasher, Hash};
use slotmap::{DefaultKey, SlotMap};
use std::collections::hash_map::RandomState;

/// Stable reference to one live entry. Handles are generational: once an
/// entry is removed its handle never resolves again, even if the arena
/// storage is reused.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub struct Handle(DefaultKey);

impl Handle {
    pub(crate) fn new(k: DefaultKey) -> Self {
        Handle(k)
    }
    pub(crate) fn raw_handle(&self) -> DefaultKey {
        self.0
    }
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
enum Slot {
    /// Never used. Probing for a key stops here.
    Empty,
    /// Held an entry that was removed. Probing continues past it.
    Tombstone,
    Occupied(Handle),
}

#[derive(Debug)]
struct Entry<K> {
    key: K,
    value: i64,
    links: Links,
}

impl<K> Linked for Entry<K> {
    fn links(&self) -> &Links {
        &self.links
    }
    fn links_mut(&mut self) -> &mut Links {
        &mut self.links
    }
}

/// Outcome of scanning a key's probe sequence.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
enum Probe {
    Found(usize),
    /// Key absent; the index is the first reusable slot on the sequence.
    Vacant(usize),
    /// Key absent and no reusable slot anywhere.
    Full,
}

/// Largest supported capacity. The arena addresses entries with 32-bit
/// indices and reserves one of them.
pub const MAX_CAPACITY: usize = (u32::MAX - 1) as usize;

pub struct ProbedTable<K, S = RandomState> {
    hasher: S,
    slots: Box<[Slot]>,
    entries: SlotMap<DefaultKey, Entry<K>>, // sole owner of entries; slots hold handles
    recency: RecencyList,
    tombstones: usize,
}

impl<K> ProbedTable<K>
where
    K: Eq + Hash,
{
    pub fn new(capacity: usize) -> Result<Self, TableError> {
        Self::with_hasher(capacity, Default::default())
    }
}

/// Iterator over `(key, value)` pairs from earliest- to latest-touched.
pub struct Iter<'a, K> {
    walk: crate::recency::Walk<'a, Entry<K>>,
    remaining: usize,
}

impl<'a, K> Iterator for Iter<'a, K> {
    type Item = (&'a K, i64);

    #[inline]
    fn next(&mut self) -> Option<Self::Item> {
        let (_, e) = self.walk.next()?;
        self.remaining -= 1;
        Some((&e.key, e.value))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl<K> ExactSizeIterator for Iter<'_, K> {}

impl<K, S> ProbedTable<K, S>
where
    K: Eq + Hash,
    S: BuildHasher,
{
    pub fn with_hasher(capacity: usize, hasher: S) -> Result<Self, TableError> {
        if capacity == 0 {
            return Err(TableError::ZeroCapacity);
        }
        if capacity > MAX_CAPACITY {
            return Err(TableError::CapacityTooLarge {
                requested: capacity,
                max: MAX_CAPACITY,
            });
        }
        log::debug!("allocating probed table with {capacity} slots");
        let mut slots = Vec::new();
        slots
            .try_reserve_exact(capacity)
            .map_err(|_| TableError::AllocationFailed { capacity })?;
        slots.resize(capacity, Slot::Empty);
        Ok(Self {
            hasher,
            slots: slots.into_boxed_slice(),
            // Grows with the live entries instead of reserving every slot up front.
            entries: SlotMap::with_key(),
            recency: RecencyList::new(),
            tombstones: 0,
        })
    }

    /// Number of slots, fixed at construction.
    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Number of slots currently holding a tombstone.
    pub fn tombstones(&self) -> usize {
        self.tombstones
    }

    fn start_index<Q>(&self, q: &Q) -> usize
    where
        Q: ?Sized + Hash,
    {
        (self.hasher.hash_one(q) % self.slots.len() as u64) as usize
    }

    /// Scan the circular probe sequence for `q`, remembering the first
    /// reusable slot. Tombstones are transparent; a never-used slot ends
    /// the scan because no insert of `q` could have passed it.
    fn probe<Q>(&self, q: &Q) -> Probe
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        let cap = self.slots.len();
        let start = self.start_index(q);
        let mut reusable = None;

        for i in 0..cap {
            let idx = (start + i) % cap;
            match self.slots[idx] {
                Slot::Occupied(h) => {
                    if self.entries[h.raw_handle()].key.borrow() == q {
                        return Probe::Found(idx);
                    }
                }
                Slot::Tombstone => {
                    reusable.get_or_insert(idx);
                }
                Slot::Empty => {
                    reusable.get_or_insert(idx);
                    break;
                }
            }
        }

        match reusable {
            Some(idx) => Probe::Vacant(idx),
            None => Probe::Full,
        }
    }

    fn handle_at(&self, idx: usize) -> Handle {
        match self.slots[idx] {
            Slot::Occupied(h) => h,
            other => unreachable!("probe reported slot {idx} as found but it is {other:?}"),
        }
    }

    /// Handle of the live entry for `q`, if any.
    pub fn find<Q>(&self, q: &Q) -> Option<Handle>
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        match self.probe(q) {
            Probe::Found(idx) => Some(self.handle_at(idx)),
            Probe::Vacant(_) | Probe::Full => None,
        }
    }

    pub fn contains_key<Q>(&self, q: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        self.find(q).is_some()
    }

    /// Store `value` under `key` and make it the latest-touched entry.
    ///
    /// An existing key is updated in place. A new key takes the first
    /// reusable slot on its probe sequence; if there is none the table is
    /// left unchanged and `CapacityExhausted` is returned.
    pub fn insert(&mut self, key: K, value: i64) -> Result<(), TableError> {
        match self.probe(&key) {
            Probe::Found(idx) => {
                let k = self.handle_at(idx).raw_handle();
                self.entries[k].value = value;
                self.recency.move_to_back(&mut self.entries, k);
            }
            Probe::Vacant(idx) => {
                let k = self.entries.insert(Entry {
                    key,
                    value,
                    links: Links::default(),
                });
                if self.slots[idx] == Slot::Tombstone {
                    self.tombstones -= 1;
                }
                self.slots[idx] = Slot::Occupied(Handle::new(k));
                self.recency.push_back(&mut self.entries, k);
            }
            Probe::Full => {
                log::warn!(
                    "insert rejected: all {} slots are occupied",
                    self.slots.len()
                );
                return Err(TableError::CapacityExhausted {
                    capacity: self.slots.len(),
                });
            }
        }
        self.debug_check();
        Ok(())
    }

    /// Remove `q` and return its value. Removing a missing key is a no-op.
    ///
    /// The freed slot becomes a tombstone so later probes keep scanning
    /// past it.
    pub fn remove<Q>(&mut self, q: &Q) -> Option<i64>
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        let idx = match self.probe(q) {
            Probe::Found(idx) => idx,
            Probe::Vacant(_) | Probe::Full => return None,
        };
        let k = self.handle_at(idx).raw_handle();

        // Unlink before the arena forgets the entry.
        self.recency.unlink(&mut self.entries, k);
        let entry = match self.entries.remove(k) {
            Some(e) => e,
            None => unreachable!("slot {idx} holds a handle with no arena entry"),
        };
        self.slots[idx] = Slot::Tombstone;
        self.tombstones += 1;

        self.debug_check();
        Some(entry.value)
    }

    /// Value stored under `q`. Absence is `None`, never a sentinel value.
    pub fn get<Q>(&self, q: &Q) -> Option<i64>
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        let h = self.find(q)?;
        self.entries.get(h.raw_handle()).map(|e| e.value)
    }

    /// Key of the most recently inserted or updated entry.
    pub fn latest(&self) -> Option<&K> {
        self.recency.tail().map(|k| &self.entries[k].key)
    }

    /// Key of the least recently inserted or updated entry.
    pub fn earliest(&self) -> Option<&K> {
        self.recency.head().map(|k| &self.entries[k].key)
    }

    /// Key behind a handle, or `None` once the entry has been removed.
    pub fn handle_key(&self, h: Handle) -> Option<&K> {
        self.entries.get(h.raw_handle()).map(|e| &e.key)
    }

    /// Value behind a handle, or `None` once the entry has been removed.
    pub fn handle_value(&self, h: Handle) -> Option<i64> {
        self.entries.get(h.raw_handle()).map(|e| e.value)
    }

    /// Entries from earliest- to latest-touched.
    pub fn iter(&self) -> Iter<'_, K> {
        Iter {
            walk: self.recency.iter(&self.entries),
            remaining: self.entries.len(),
        }
    }

    /// Full consistency sweep after every mutation, in unit tests only: it
    /// is O(capacity).
    #[inline]
    fn debug_check(&self) {
        #[cfg(test)]
        self.check_invariants();
    }

    /// Cross-check slots, arena and recency list. Panics on any mismatch.
    #[cfg(test)]
    pub(crate) fn check_invariants(&self) {
        let mut occupied = 0;
        let mut tombstones = 0;
        for slot in self.slots.iter() {
            match slot {
                Slot::Occupied(h) => {
                    assert!(
                        self.entries.contains_key(h.raw_handle()),
                        "slot holds a dead handle"
                    );
                    occupied += 1;
                }
                Slot::Tombstone => tombstones += 1,
                Slot::Empty => {}
            }
        }
        assert_eq!(occupied, self.entries.len(), "each entry owns exactly one slot");
        assert_eq!(tombstones, self.tombstones, "tombstone count drifted");

        assert_eq!(self.recency.is_empty(), self.entries.is_empty());
        assert_eq!(self.recency.tail().is_none(), self.entries.is_empty());

        let mut prev = None;
        let mut listed = 0;
        for (k, e) in self.recency.iter(&self.entries) {
            assert_eq!(e.links.prev, prev, "broken back link");
            prev = Some(k);
            listed += 1;
            assert!(listed <= self.entries.len(), "recency list has a cycle");
        }
        assert_eq!(prev, self.recency.tail(), "tail is not the last node");
        assert_eq!(listed, self.entries.len(), "list and arena disagree");
    }
}

impl<K, S> core::fmt::Debug for ProbedTable<K, S>
where
    K: Eq + Hash + core::fmt::Debug,
    S: BuildHasher,
{
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_map().entries(self.iter()).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_log::test;

    #[derive(Clone, Default)]
    struct ConstBuildHasher;
    struct ConstHasher;
    impl BuildHasher for ConstBuildHasher {
        type Hasher = ConstHasher;
        fn build_hasher(&self) -> Self::Hasher {
            ConstHasher
        }
    }
    impl core::hash::Hasher for ConstHasher {
        fn write(&mut self, _bytes: &[u8]) {}
        fn finish(&self) -> u64 {
            0
        } // every key starts probing at slot 0
    }

    fn colliding(capacity: usize) -> ProbedTable<String, ConstBuildHasher> {
        ProbedTable::with_hasher(capacity, ConstBuildHasher).unwrap()
    }

    fn slot_of(m: &ProbedTable<String, ConstBuildHasher>, key: &str) -> usize {
        match m.probe(key) {
            Probe::Found(idx) => idx,
            other => panic!("{key} not found: {other:?}"),
        }
    }

    /// Invariant: zero slots is rejected at construction.
    #[test]
    fn zero_capacity_rejected() {
        assert_eq!(
            ProbedTable::<String>::new(0).err(),
            Some(TableError::ZeroCapacity)
        );
    }

    /// Invariant: capacities the arena cannot address are rejected with an
    /// error before anything is allocated.
    #[test]
    fn oversized_capacity_rejected() {
        assert_eq!(
            ProbedTable::<String>::new(usize::MAX).err(),
            Some(TableError::CapacityTooLarge {
                requested: usize::MAX,
                max: MAX_CAPACITY,
            })
        );
        assert!(matches!(
            ProbedTable::<String>::new(MAX_CAPACITY + 1),
            Err(TableError::CapacityTooLarge { .. })
        ));
    }

    /// Invariant: a removed entry leaves exactly one tombstone and its arena
    /// storage is released.
    #[test]
    fn remove_tombstones_slot_and_frees_entry() {
        let mut m = colliding(4);
        m.insert("a".to_string(), 1).unwrap();
        m.insert("b".to_string(), 2).unwrap();
        let h = m.find("a").unwrap();
        assert_eq!(m.remove("a"), Some(1));
        assert_eq!(m.slots[0], Slot::Tombstone);
        assert_eq!(m.tombstones(), 1);
        assert_eq!(m.entries.len(), 1);
        assert!(m.handle_value(h).is_none());
        assert_eq!(m.remove("a"), None);
        assert_eq!(m.tombstones(), 1);
    }

    /// Invariant: colliding keys occupy consecutive slots from their common origin.
    #[test]
    fn collisions_probe_linearly() {
        let mut m = colliding(4);
        for (i, k) in ["a", "b", "c"].iter().enumerate() {
            m.insert(k.to_string(), i as i64).unwrap();
        }
        assert_eq!(slot_of(&m, "a"), 0);
        assert_eq!(slot_of(&m, "b"), 1);
        assert_eq!(slot_of(&m, "c"), 2);
        assert_eq!(m.probe("d"), Probe::Vacant(3));
    }

    /// Invariant: a tombstone is transparent to lookups; keys further along the
    /// chain stay reachable.
    #[test]
    fn tombstone_does_not_break_chain() {
        let mut m = colliding(8);
        m.insert("a".to_string(), 1).unwrap();
        m.insert("b".to_string(), 2).unwrap();
        m.insert("c".to_string(), 3).unwrap();

        assert_eq!(m.remove("b"), Some(2));
        assert_eq!(m.slots[1], Slot::Tombstone);
        assert_eq!(m.tombstones(), 1);
        assert_eq!(m.get("c"), Some(3));
        assert_eq!(m.get("a"), Some(1));
        assert_eq!(m.get("b"), None);
    }

    /// Invariant: an insert-miss reuses the first tombstone on the chain, but only
    /// after confirming the key is not present deeper in the chain.
    #[test]
    fn insert_reuses_first_tombstone_without_duplicating() {
        let mut m = colliding(8);
        m.insert("a".to_string(), 1).unwrap();
        m.insert("b".to_string(), 2).unwrap();
        m.insert("c".to_string(), 3).unwrap();
        m.remove("a");

        // "c" lives past the tombstone: update in place, no second copy.
        m.insert("c".to_string(), 30).unwrap();
        assert_eq!(m.len(), 2);
        assert_eq!(slot_of(&m, "c"), 2);
        assert_eq!(m.slots[0], Slot::Tombstone);

        // A new key lands in the tombstone.
        m.insert("d".to_string(), 4).unwrap();
        assert_eq!(slot_of(&m, "d"), 0);
        assert_eq!(m.tombstones(), 0);
        assert_eq!(m.get("c"), Some(30));
    }

    /// Invariant: a never-used slot stops the scan.
    #[test]
    fn empty_slot_stops_probe() {
        let mut m = colliding(4);
        m.insert("a".to_string(), 1).unwrap();
        assert_eq!(m.probe("zzz"), Probe::Vacant(1));
    }

    /// Invariant: probing wraps around the end of the slot array.
    #[test]
    fn probe_wraps_around() {
        #[derive(Clone, Default)]
        struct LastSlot;
        struct LastSlotHasher;
        impl BuildHasher for LastSlot {
            type Hasher = LastSlotHasher;
            fn build_hasher(&self) -> Self::Hasher {
                LastSlotHasher
            }
        }
        impl core::hash::Hasher for LastSlotHasher {
            fn write(&mut self, _bytes: &[u8]) {}
            fn finish(&self) -> u64 {
                2
            }
        }

        let mut m: ProbedTable<String, LastSlot> = ProbedTable::with_hasher(3, LastSlot).unwrap();
        m.insert("x".to_string(), 1).unwrap();
        m.insert("y".to_string(), 2).unwrap();
        assert_eq!(m.slots[2], Slot::Occupied(m.find("x").unwrap()));
        assert_eq!(m.slots[0], Slot::Occupied(m.find("y").unwrap()));
        assert_eq!(m.get("y"), Some(2));
    }

    /// Invariant: a table with every slot tombstoned still accepts inserts and
    /// still answers misses without scanning forever.
    #[test]
    fn all_tombstones_still_usable() {
        let mut m = colliding(3);
        for k in ["a", "b", "c"] {
            m.insert(k.to_string(), 0).unwrap();
        }
        for k in ["a", "b", "c"] {
            m.remove(k);
        }
        assert_eq!(m.tombstones(), 3);
        assert_eq!(m.get("a"), None);
        assert_eq!(m.probe("q"), Probe::Vacant(0));
        m.insert("q".to_string(), 9).unwrap();
        assert_eq!(m.get("q"), Some(9));
        assert_eq!(m.earliest().map(String::as_str), Some("q"));
    }

    /// Invariant: a full table rejects new keys, keeps existing ones updatable,
    /// and answers misses with `None`.
    #[test]
    fn full_table_behaviour() {
        let mut m = colliding(2);
        m.insert("a".to_string(), 1).unwrap();
        m.insert("b".to_string(), 2).unwrap();

        assert_eq!(m.probe("c"), Probe::Full);
        assert_eq!(
            m.insert("c".to_string(), 3),
            Err(TableError::CapacityExhausted { capacity: 2 })
        );
        assert_eq!(m.get("c"), None);
        assert_eq!(m.remove("c"), None);
        assert_eq!(m.latest().map(String::as_str), Some("b"));

        m.insert("a".to_string(), 10).unwrap();
        assert_eq!(m.get("a"), Some(10));
        assert_eq!(m.latest().map(String::as_str), Some("a"));
    }

    /// Invariant: handles are generational and never alias a later entry that
    /// reuses the same slot.
    #[test]
    fn stale_handle_does_not_alias_new_entry() {
        let mut m = colliding(2);
        m.insert("old".to_string(), 1).unwrap();
        let h1 = m.find("old").unwrap();
        m.remove("old");
        m.insert("new".to_string(), 2).unwrap();
        let h2 = m.find("new").unwrap();
        assert_ne!(h1, h2);
        assert!(m.handle_value(h1).is_none());
        assert_eq!(m.handle_key(h2).map(String::as_str), Some("new"));
        assert_eq!(m.handle_value(h2), Some(2));
    }

    /// Invariant: iteration follows recency, not slot order.
    #[test]
    fn iter_follows_recency() {
        let mut m = colliding(4);
        m.insert("a".to_string(), 1).unwrap();
        m.insert("b".to_string(), 2).unwrap();
        m.insert("a".to_string(), 3).unwrap();
        let items: Vec<_> = m.iter().map(|(k, v)| (k.as_str(), v)).collect();
        assert_eq!(items, vec![("b", 2), ("a", 3)]);
        assert_eq!(m.iter().len(), 2);
        assert_eq!(format!("{m:?}"), r#"{"b": 2, "a": 3}"#);
    }

    #[test]
    fn check_invariants_after_mixed_ops() {
        let mut m = colliding(5);
        for (i, k) in ["a", "b", "c", "d"].iter().enumerate() {
            m.insert(k.to_string(), i as i64).unwrap();
        }
        m.remove("b");
        m.insert("a".to_string(), 7).unwrap();
        m.remove("d");
        m.insert("e".to_string(), 8).unwrap();
        m.check_invariants();
    }
}
