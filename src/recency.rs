//! Recency: an intrusive doubly-linked list threaded through arena entries.
//!
//! The list owns nothing. Each entry in the arena carries its own `prev` and
//! `next` links (as generational keys), and `RecencyList` only remembers the
//! two ends. Head is the earliest-touched entry, tail the latest.
//!
//! Every method takes the arena explicitly so the caller keeps a single
//! owner for the entries. A key handed to these methods must be live in the
//! arena; callers remove an entry from the arena only after `unlink`.

use slotmap::{DefaultKey, SlotMap};

/// Link fields embedded in every listed entry.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub(crate) struct Links {
    pub(crate) prev: Option<DefaultKey>,
    pub(crate) next: Option<DefaultKey>,
}

/// Access to the intrusive links of an arena element.
pub(crate) trait Linked {
    fn links(&self) -> &Links;
    fn links_mut(&mut self) -> &mut Links;
}

#[derive(Debug, Default)]
pub(crate) struct RecencyList {
    head: Option<DefaultKey>,
    tail: Option<DefaultKey>,
}

impl RecencyList {
    pub(crate) const fn new() -> Self {
        Self {
            head: None,
            tail: None,
        }
    }

    /// Earliest-touched entry.
    pub(crate) fn head(&self) -> Option<DefaultKey> {
        self.head
    }

    /// Latest-touched entry.
    pub(crate) fn tail(&self) -> Option<DefaultKey> {
        self.tail
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.head.is_none()
    }

    /// Append an entry that is not currently in the list.
    pub(crate) fn push_back<T: Linked>(
        &mut self,
        arena: &mut SlotMap<DefaultKey, T>,
        k: DefaultKey,
    ) {
        debug_assert_eq!(*arena[k].links(), Links::default(), "entry already linked");
        match self.tail {
            None => {
                self.head = Some(k);
                self.tail = Some(k);
            }
            Some(old) => {
                arena[old].links_mut().next = Some(k);
                arena[k].links_mut().prev = Some(old);
                self.tail = Some(k);
            }
        }
    }

    /// Detach an entry, patching its neighbours and the list ends. The
    /// entry's own links are cleared.
    pub(crate) fn unlink<T: Linked>(
        &mut self,
        arena: &mut SlotMap<DefaultKey, T>,
        k: DefaultKey,
    ) {
        let Links { prev, next } = core::mem::take(arena[k].links_mut());

        match prev {
            Some(p) => arena[p].links_mut().next = next,
            None => {
                debug_assert_eq!(self.head, Some(k));
                self.head = next;
            }
        }
        match next {
            Some(n) => arena[n].links_mut().prev = prev,
            None => {
                debug_assert_eq!(self.tail, Some(k));
                self.tail = prev;
            }
        }
    }

    /// Mark an already-listed entry as the latest touched.
    pub(crate) fn move_to_back<T: Linked>(
        &mut self,
        arena: &mut SlotMap<DefaultKey, T>,
        k: DefaultKey,
    ) {
        if self.tail == Some(k) {
            return;
        }
        self.unlink(arena, k);
        self.push_back(arena, k);
    }

    /// Walk the list from head to tail.
    pub(crate) fn iter<'a, T: Linked>(&self, arena: &'a SlotMap<DefaultKey, T>) -> Walk<'a, T> {
        Walk {
            arena,
            cursor: self.head,
        }
    }
}

/// Head-to-tail walk over a [`RecencyList`].
pub(crate) struct Walk<'a, T> {
    arena: &'a SlotMap<DefaultKey, T>,
    cursor: Option<DefaultKey>,
}

impl<'a, T: Linked> Iterator for Walk<'a, T> {
    type Item = (DefaultKey, &'a T);

    #[inline]
    fn next(&mut self) -> Option<Self::Item> {
        let k = self.cursor?;
        let item = self.arena.get(k)?;
        self.cursor = item.links().next;
        Some((k, item))
    }
}
