use core::sync::atomic::{AtomicU8, AtomicUsize, Ordering};
use syncbench_common::{Error, Result};

/// Append-only sequence of ASCII characters, shared by all workers of a benchmark run.
///
/// The sequence has a fixed number of slots, sized for the whole run up front.
/// Each append claims the next free slot, so a slot is written exactly once, and no appended character can be lost or duplicated,
/// whatever primitive (if any) the writers hold.
///
/// The contents should only be read after all writers have been joined, joining is what makes their writes visible.
pub struct SharedSequence {
    slots : Box<[AtomicU8]>,
    len   : AtomicUsize,
}

impl SharedSequence {
    /// Create an empty sequence with room for `capacity` characters.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            slots: (0..capacity).map(|_| AtomicU8::new(0)).collect(),
            len: AtomicUsize::new(0),
        }
    }

    /// Append a character, returning the index it was stored at.
    ///
    /// # Error
    ///
    /// Returns an error if the character is not ASCII, or if all slots have been used.
    pub fn push(&self, symbol: char) -> Result<usize> {
        if !symbol.is_ascii() {
            return Err(Error::InvalidParameter("only ASCII characters can be appended to a shared sequence"));
        }

        let capacity = self.slots.len();
        let idx = self.len
            .fetch_update(Ordering::Relaxed, Ordering::Relaxed, |len| (len < capacity).then_some(len + 1))
            .map_err(|_| Error::SequenceFull(capacity))?;
        self.slots[idx].store(symbol as u8, Ordering::Relaxed);
        Ok(idx)
    }

    /// Get the number of appended characters.
    pub fn len(&self) -> usize {
        self.len.load(Ordering::Relaxed)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    /// Get the character at `index`.
    pub fn get(&self, index: usize) -> Option<char> {
        if index < self.len() {
            Some(self.slots[index].load(Ordering::Relaxed) as char)
        } else {
            None
        }
    }

    /// Iterate over all appended characters, in the order they were appended.
    pub fn iter(&self) -> impl Iterator<Item = char> + '_ {
        self.slots[..self.len()].iter().map(|slot| slot.load(Ordering::Relaxed) as char)
    }

    /// Sum of all appended characters, used to check that every character made it into the sequence.
    pub fn checksum(&self) -> u64 {
        self.iter().map(|ch| ch as u64).sum()
    }

    /// Remove all characters.
    ///
    /// Requires exclusive access, so no worker can still be appending.
    pub fn clear(&mut self) {
        for slot in &mut self.slots[..*self.len.get_mut()] {
            *slot.get_mut() = 0;
        }
        *self.len.get_mut() = 0;
    }
}

#[cfg(test)]
mod tests {
    use std::{sync::Arc, thread};
    use super::*;

    #[test]
    fn push_and_read() {
        let seq = SharedSequence::with_capacity(3);
        assert!(seq.is_empty());
        assert_eq!(seq.push('a'), Ok(0));
        assert_eq!(seq.push('b'), Ok(1));
        assert_eq!(seq.len(), 2);
        assert_eq!(seq.get(1), Some('b'));
        assert_eq!(seq.get(2), None);
        assert_eq!(seq.iter().collect::<String>(), "ab");
        assert_eq!(seq.checksum(), 'a' as u64 + 'b' as u64);
    }

    #[test]
    fn full_and_invalid() {
        let seq = SharedSequence::with_capacity(1);
        assert_eq!(seq.push('é'), Err(Error::InvalidParameter("only ASCII characters can be appended to a shared sequence")));
        assert_eq!(seq.push('x'), Ok(0));
        assert_eq!(seq.push('y'), Err(Error::SequenceFull(1)));
        assert_eq!(seq.len(), 1);
    }

    #[test]
    fn clear_allows_reuse() {
        let mut seq = SharedSequence::with_capacity(2);
        seq.push('a').unwrap();
        seq.push('b').unwrap();
        seq.clear();
        assert!(seq.is_empty());
        assert_eq!(seq.capacity(), 2);
        assert_eq!(seq.push('c'), Ok(0));
    }

    #[test]
    fn concurrent_appends_fill_every_slot() {
        const WORKERS: usize = 4;
        const PER_WORKER: usize = 2500;

        let seq = Arc::new(SharedSequence::with_capacity(WORKERS * PER_WORKER));
        let workers: Vec<_> = (0..WORKERS).map(|i| {
            let seq = seq.clone();
            thread::spawn(move || {
                let symbol = (b'a' + i as u8) as char;
                for _ in 0..PER_WORKER {
                    seq.push(symbol).unwrap();
                }
            })
        }).collect();
        for worker in workers {
            worker.join().unwrap();
        }

        assert_eq!(seq.len(), WORKERS * PER_WORKER);
        for i in 0..WORKERS {
            let symbol = (b'a' + i as u8) as char;
            assert_eq!(seq.iter().filter(|&ch| ch == symbol).count(), PER_WORKER);
        }
    }
}
