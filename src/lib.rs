//! probed-table: a fixed-capacity, open-addressed table from keys to `i64`
//! counters that also remembers which entry was touched least and most
//! recently.
//!
//! Internal Design:
//!
//! Summary
//! - Slots: a boxed slice of `capacity` slots, each `Empty`, `Tombstone`
//!   or `Occupied(Handle)`. Linear probing from `hash(key) % capacity`.
//! - Arena: entries live in a `SlotMap`; a slot holds the only handle that
//!   owns an entry. Handles are generational, so a removed entry's handle
//!   never resolves to whatever reuses its storage.
//! - Recency: an intrusive doubly-linked list. `prev`/`next` are arena keys
//!   stored inside each entry; the list keeps only head (earliest) and tail
//!   (latest).
//!
//! Probing
//! - A scan visits at most `capacity` slots. A matching key ends it with a
//!   hit. The first `Empty` or `Tombstone` seen is remembered as the slot a
//!   new key would take.
//! - A `Tombstone` is transparent: the key may still live further along.
//!   An `Empty` slot is opaque: no insert of the key could have skipped it.
//! - A full circle with no reusable slot means the table is full.
//!
//! Constraints
//! - Capacity is fixed at construction; there is no rehashing. Inserting a
//!   new key into a full table fails with `TableError::CapacityExhausted`
//!   and changes nothing.
//! - Single-threaded. Probing, slot updates and list surgery form one unit
//!   per call; shared use needs one external lock around the whole table.
//! - Missing keys are not errors: `get` returns `None`, `remove` is a no-op.
//!
//! Layers on top
//! - `tokenize::WordSplitter` turns a byte stream into lowercase ASCII words.
//! - `counter::WordCounter` feeds those words into a `ProbedTable<String>`
//!   to build frequency counts; the `word-freq` binary drives it.

pub mod counter;
mod error;
pub mod probed_table;
mod probed_table_proptest;
mod recency;
pub mod tokenize;

// Public surface
pub use counter::{CountSummary, CounterConfig, WordCounter};
pub use error::{CounterError, TableError};
pub use probed_table::{Handle, ProbedTable, MAX_CAPACITY};
