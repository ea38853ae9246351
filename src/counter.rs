//! WordCounter: word frequencies over a byte stream, stored in a ProbedTable.

use crate::error::{CounterError, TableError};
use crate::probed_table::ProbedTable;
use crate::tokenize::WordSplitter;
use std::io::{ErrorKind, Read};

/// Environment variable overriding [`CounterConfig::capacity`].
pub const CAPACITY_ENV: &str = "WORD_FREQ_CAPACITY";
/// Environment variable overriding [`CounterConfig::chunk_size`].
pub const CHUNK_SIZE_ENV: &str = "WORD_FREQ_CHUNK_SIZE";

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct CounterConfig {
    /// Slots in the backing table; bounds the number of distinct words.
    pub capacity: usize,
    /// Bytes requested per read from the input.
    pub chunk_size: usize,
}

impl Default for CounterConfig {
    fn default() -> Self {
        Self {
            capacity: 10_000,
            chunk_size: 16 * 1024,
        }
    }
}

impl CounterConfig {
    /// Defaults overridden by `WORD_FREQ_CAPACITY` and `WORD_FREQ_CHUNK_SIZE`.
    /// Unparsable values are ignored with a warning.
    pub fn from_env() -> Self {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    pub(crate) fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut cfg = Self::default();
        if let Some(v) = parse_var(&lookup, CAPACITY_ENV) {
            cfg.capacity = v;
        }
        if let Some(v) = parse_var(&lookup, CHUNK_SIZE_ENV) {
            cfg.chunk_size = v;
        }
        cfg
    }
}

fn parse_var<F>(lookup: &F, name: &str) -> Option<usize>
where
    F: Fn(&str) -> Option<String>,
{
    let raw = lookup(name)?;
    match raw.trim().parse::<usize>() {
        Ok(v) if v > 0 => Some(v),
        _ => {
            log::warn!("ignoring {name}={raw:?}: expected a positive integer");
            None
        }
    }
}

/// Totals reported after a stream has been fully counted.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct CountSummary {
    pub total_words: u64,
    pub distinct_words: usize,
    /// Least recently counted word.
    pub earliest: Option<String>,
    /// Most recently counted word.
    pub latest: Option<String>,
}

/// Counts words fed to it in chunks.
///
/// A table error while counting (the table filling up) halts the counter:
/// the remainder of the failing chunk is not counted, so every later
/// `feed`, `finish` or `count_reader` returns [`CounterError::Halted`].
/// Counts gathered before the error stay readable.
#[derive(Debug)]
pub struct WordCounter {
    table: ProbedTable<String>,
    splitter: WordSplitter,
    chunk_size: usize,
    total: u64,
    halted: bool,
}

impl WordCounter {
    pub fn new(config: &CounterConfig) -> Result<Self, TableError> {
        Ok(Self {
            table: ProbedTable::new(config.capacity)?,
            splitter: WordSplitter::new(),
            chunk_size: config.chunk_size.max(1),
            total: 0,
            halted: false,
        })
    }

    fn count_word(
        table: &mut ProbedTable<String>,
        total: &mut u64,
        word: &str,
    ) -> Result<(), TableError> {
        let current = table.get(word).unwrap_or(0);
        log::trace!("word {word:?}, current {current}");
        table.insert(word.to_string(), current + 1)?;
        *total += 1;
        Ok(())
    }

    /// Count every word completed by `chunk`. A trailing partial word is
    /// held until the next call or [`finish`](Self::finish).
    pub fn feed(&mut self, chunk: &[u8]) -> Result<(), CounterError> {
        if self.halted {
            return Err(CounterError::Halted);
        }
        let Self {
            table,
            splitter,
            total,
            halted,
            ..
        } = self;
        splitter
            .try_feed(chunk, |w| Self::count_word(table, total, w))
            .map_err(|e| {
                *halted = true;
                e.into()
            })
    }

    /// Count the trailing word, if any, and summarize.
    pub fn finish(&mut self) -> Result<CountSummary, CounterError> {
        if self.halted {
            return Err(CounterError::Halted);
        }
        if let Some(word) = self.splitter.finish() {
            if let Err(e) = Self::count_word(&mut self.table, &mut self.total, &word) {
                self.halted = true;
                return Err(e.into());
            }
        }
        Ok(self.summary())
    }

    /// Whether a table error has stopped the counter.
    pub fn is_halted(&self) -> bool {
        self.halted
    }

    /// Read `reader` to the end in fixed-size chunks and count its words.
    pub fn count_reader<R: Read>(&mut self, mut reader: R) -> Result<CountSummary, CounterError> {
        if self.halted {
            return Err(CounterError::Halted);
        }
        let mut buf = vec![0u8; self.chunk_size];
        loop {
            let n = match reader.read(&mut buf) {
                Ok(0) => break,
                Ok(n) => n,
                Err(e) if e.kind() == ErrorKind::Interrupted => continue,
                Err(e) => return Err(e.into()),
            };
            self.feed(&buf[..n])?;
        }
        let summary = self.finish()?;
        log::debug!(
            "counted {} words, {} distinct",
            summary.total_words,
            summary.distinct_words
        );
        Ok(summary)
    }

    pub fn summary(&self) -> CountSummary {
        CountSummary {
            total_words: self.total,
            distinct_words: self.table.len(),
            earliest: self.table.earliest().cloned(),
            latest: self.table.latest().cloned(),
        }
    }

    /// Occurrences of `word` so far; zero when never seen.
    pub fn count(&self, word: &str) -> i64 {
        self.table.get(word).unwrap_or(0)
    }

    /// The `n` most frequent words, ties broken alphabetically.
    pub fn top(&self, n: usize) -> Vec<(&str, i64)> {
        let mut all: Vec<(&str, i64)> =
            self.table.iter().map(|(k, v)| (k.as_str(), v)).collect();
        all.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(b.0)));
        all.truncate(n);
        all
    }

    pub fn table(&self) -> &ProbedTable<String> {
        &self.table
    }
}
