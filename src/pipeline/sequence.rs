use std::sync::atomic::{AtomicU64, Ordering};

/// Issues the sequence ids that fix output order
#[derive(Debug, Default)]
pub struct SequenceAllocator {
    next: AtomicU64,
}

impl SequenceAllocator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Next id: strictly increasing from 0, never reused.
    ///
    /// Safe under concurrent callers. Exhausting u64 is fatal.
    pub fn next(&self) -> u64 {
        self.next
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |id| id.checked_add(1))
            .expect("sequence ids exhausted")
    }

    /// Number of ids issued so far
    pub fn issued(&self) -> u64 {
        self.next.load(Ordering::SeqCst)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;
    use std::sync::Arc;

    #[test]
    fn test_starts_at_zero_and_increments() {
        let allocator = SequenceAllocator::new();
        assert_eq!(allocator.next(), 0);
        assert_eq!(allocator.next(), 1);
        assert_eq!(allocator.next(), 2);
        assert_eq!(allocator.issued(), 3);
    }

    #[test]
    fn test_unique_under_concurrency() {
        let allocator = Arc::new(SequenceAllocator::new());
        let handles: Vec<_> = (0..8)
            .map(|_| {
                let allocator = Arc::clone(&allocator);
                std::thread::spawn(move || (0..500).map(|_| allocator.next()).collect::<Vec<_>>())
            })
            .collect();

        let mut seen = HashSet::new();
        for handle in handles {
            for id in handle.join().unwrap() {
                assert!(seen.insert(id), "id {} issued twice", id);
            }
        }

        assert_eq!(seen.len(), 4000);
        assert_eq!(seen.iter().max(), Some(&3999));
    }
}
