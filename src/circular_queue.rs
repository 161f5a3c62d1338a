use std::collections::VecDeque;
use std::fmt;

/// Bounded FIFO. Items are kept oldest first; pushing into a full queue
/// drops the oldest item.
pub struct CircularQueue<T> {
    deque: VecDeque<T>,
    capacity: usize,
}

impl<T: Clone> Clone for CircularQueue<T> {
    fn clone(&self) -> Self {
        Self {
            deque: self.deque.clone(),
            capacity: self.capacity,
        }
    }
}

impl<T: fmt::Debug> fmt::Debug for CircularQueue<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.deque.fmt(f)
    }
}

impl<T> CircularQueue<T> {
    /// A zero capacity is bumped to one so the latest item is always kept.
    #[inline]
    pub fn with_capacity(cap: usize) -> Self {
        let capacity = cap.max(1);

        Self {
            deque: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    #[inline]
    pub fn push(&mut self, item: T) -> Option<T> {
        let popped = if self.is_full() {
            self.deque.pop_front()
        } else {
            None
        };

        self.deque.push_back(item);

        popped
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.deque.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.deque.is_empty()
    }

    #[inline]
    pub fn is_full(&self) -> bool {
        self.deque.len() == self.capacity
    }

    #[inline]
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    #[inline]
    pub fn clear(&mut self) {
        self.deque.clear()
    }

    #[inline]
    pub fn last(&self) -> Option<&T> {
        self.deque.back()
    }

    /// The two newest items as `(previous, latest)`.
    #[inline]
    pub fn last_pair(&self) -> Option<(&T, &T)> {
        let n = self.deque.len();
        if n < 2 {
            return None;
        }

        Some((&self.deque[n - 2], &self.deque[n - 1]))
    }

    /// Oldest to newest.
    #[inline]
    pub fn iter(&self) -> impl Iterator<Item = &'_ T> {
        self.deque.iter()
    }

    /// The newest `count` items, oldest first.
    #[inline]
    pub fn recent(&self, count: usize) -> impl Iterator<Item = &'_ T> {
        let skip = self.deque.len().saturating_sub(count);
        self.deque.iter().skip(skip)
    }
}
