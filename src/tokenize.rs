//! Streaming word splitter for arbitrary byte input.
//!
//! A word is a maximal run of ASCII letters, lowercased. Every other byte is
//! a separator. Input may arrive in chunks of any size; a word cut by a chunk
//! boundary is held back until the next chunk (or [`WordSplitter::finish`])
//! completes it.

use core::convert::Infallible;

#[derive(Debug, Default)]
pub struct WordSplitter {
    leftover: String,
}

impl WordSplitter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Consume `chunk`, calling `sink` once per completed word.
    pub fn feed<F>(&mut self, chunk: &[u8], mut sink: F)
    where
        F: FnMut(&str),
    {
        let res: Result<(), Infallible> = self.try_feed(chunk, |w| {
            sink(w);
            Ok(())
        });
        match res {
            Ok(()) => {}
            Err(never) => match never {},
        }
    }

    /// Like [`feed`](Self::feed) but stops at the first error returned by `sink`.
    /// The word that failed is discarded.
    pub fn try_feed<F, E>(&mut self, chunk: &[u8], mut sink: F) -> Result<(), E>
    where
        F: FnMut(&str) -> Result<(), E>,
    {
        for &b in chunk {
            if b.is_ascii_alphabetic() {
                self.leftover.push(char::from(b.to_ascii_lowercase()));
            } else if !self.leftover.is_empty() {
                let res = sink(&self.leftover);
                self.leftover.clear();
                res?;
            }
        }
        Ok(())
    }

    /// Word carried over from the last chunk, not yet emitted.
    pub fn pending(&self) -> &str {
        &self.leftover
    }

    /// Emit the trailing word, if any, and reset.
    pub fn finish(&mut self) -> Option<String> {
        if self.leftover.is_empty() {
            None
        } else {
            Some(core::mem::take(&mut self.leftover))
        }
    }
}

/// Split a complete buffer into words.
pub fn words(input: &[u8]) -> Vec<String> {
    let mut out = Vec::new();
    let mut splitter = WordSplitter::new();
    splitter.feed(input, |w| out.push(w.to_string()));
    out.extend(splitter.finish());
    out
}
