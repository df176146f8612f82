//! Min-priority structures used by the searches.
//!
//! [PriorityQueue] is a plain binary heap whose entries can be relocated by
//! equality, which is linear in the number of entries. [IndexedPriorityQueue]
//! is keyed by node-arena index and keeps a slot per key, so relocating an
//! entry is logarithmic. The grid engines use the indexed variant; the HPA*
//! abstract search, whose graphs are tiny, uses the linear one.

/// Binary min-heap of `(item, priority)` pairs.
#[derive(Clone, Debug)]
pub struct PriorityQueue<T, P = f64> {
    heap: Vec<(T, P)>,
}

impl<T, P> Default for PriorityQueue<T, P> {
    fn default() -> Self {
        PriorityQueue { heap: Vec::new() }
    }
}

impl<T, P: PartialOrd + Copy> PriorityQueue<T, P> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn enqueue(&mut self, item: T, priority: P) {
        self.heap.push((item, priority));
        self.bubble_up(self.heap.len() - 1);
    }

    /// Removes and returns the entry with the smallest priority.
    pub fn dequeue(&mut self) -> Option<(T, P)> {
        if self.heap.is_empty() {
            return None;
        }
        let last = self.heap.len() - 1;
        self.heap.swap(0, last);
        let min = self.heap.pop();
        if !self.heap.is_empty() {
            self.sink_down(0);
        }
        min
    }

    pub fn peek(&self) -> Option<(&T, P)> {
        self.heap.first().map(|(item, p)| (item, *p))
    }

    pub fn peek_priority(&self) -> Option<P> {
        self.heap.first().map(|(_, p)| *p)
    }

    pub fn is_empty(&self) -> bool {
        self.heap.is_empty()
    }

    pub fn len(&self) -> usize {
        self.heap.len()
    }

    pub fn clear(&mut self) {
        self.heap.clear();
    }

    pub fn contains<F>(&self, mut eq: F) -> bool
    where
        F: FnMut(&T) -> bool,
    {
        self.heap.iter().any(|(item, _)| eq(item))
    }

    /// Gives the first entry matching `eq` a new priority and moves it to its
    /// new place in the heap. Returns `false` if no entry matched.
    pub fn update_priority<F>(&mut self, new_priority: P, mut eq: F) -> bool
    where
        F: FnMut(&T) -> bool,
    {
        let Some(ix) = self.heap.iter().position(|(item, _)| eq(item)) else {
            return false;
        };
        let old = self.heap[ix].1;
        self.heap[ix].1 = new_priority;
        if new_priority < old {
            self.bubble_up(ix);
        } else {
            self.sink_down(ix);
        }
        true
    }

    fn bubble_up(&mut self, mut ix: usize) {
        while ix > 0 {
            let parent = (ix - 1) / 2;
            if self.heap[ix].1 < self.heap[parent].1 {
                self.heap.swap(ix, parent);
                ix = parent;
            } else {
                break;
            }
        }
    }

    fn sink_down(&mut self, mut ix: usize) {
        let n = self.heap.len();
        loop {
            let left = 2 * ix + 1;
            let right = left + 1;
            let mut smallest = ix;
            if left < n && self.heap[left].1 < self.heap[smallest].1 {
                smallest = left;
            }
            if right < n && self.heap[right].1 < self.heap[smallest].1 {
                smallest = right;
            }
            if smallest == ix {
                break;
            }
            self.heap.swap(ix, smallest);
            ix = smallest;
        }
    }
}

/// Binary min-heap over arena indices. Each key occurs at most once;
/// `slots[key]` records where it currently sits in the heap.
#[derive(Clone, Debug)]
pub struct IndexedPriorityQueue<P> {
    heap: Vec<(usize, P)>,
    slots: Vec<Option<usize>>,
}

impl<P> Default for IndexedPriorityQueue<P> {
    fn default() -> Self {
        IndexedPriorityQueue {
            heap: Vec::new(),
            slots: Vec::new(),
        }
    }
}

impl<P: Ord + Copy> IndexedPriorityQueue<P> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.heap.len()
    }

    pub fn is_empty(&self) -> bool {
        self.heap.is_empty()
    }

    pub fn contains(&self, key: usize) -> bool {
        matches!(self.slots.get(key), Some(Some(_)))
    }

    pub fn priority(&self, key: usize) -> Option<P> {
        let slot = (*self.slots.get(key)?)?;
        Some(self.heap[slot].1)
    }

    pub fn peek(&self) -> Option<(usize, P)> {
        self.heap.first().copied()
    }

    /// Inserts `key`, or moves it if it is already queued.
    pub fn push_or_update(&mut self, key: usize, priority: P) {
        if key >= self.slots.len() {
            self.slots.resize(key + 1, None);
        }
        match self.slots[key] {
            Some(slot) => {
                let old = self.heap[slot].1;
                self.heap[slot].1 = priority;
                if priority < old {
                    self.bubble_up(slot);
                } else {
                    self.sink_down(slot);
                }
            }
            None => {
                self.heap.push((key, priority));
                let slot = self.heap.len() - 1;
                self.slots[key] = Some(slot);
                self.bubble_up(slot);
            }
        }
    }

    pub fn pop(&mut self) -> Option<(usize, P)> {
        if self.heap.is_empty() {
            return None;
        }
        let last = self.heap.len() - 1;
        self.swap(0, last);
        let (key, priority) = self.heap.pop()?;
        self.slots[key] = None;
        if !self.heap.is_empty() {
            self.sink_down(0);
        }
        Some((key, priority))
    }

    fn swap(&mut self, a: usize, b: usize) {
        self.heap.swap(a, b);
        self.slots[self.heap[a].0] = Some(a);
        self.slots[self.heap[b].0] = Some(b);
    }

    fn bubble_up(&mut self, mut ix: usize) {
        while ix > 0 {
            let parent = (ix - 1) / 2;
            if self.heap[ix].1 < self.heap[parent].1 {
                self.swap(ix, parent);
                ix = parent;
            } else {
                break;
            }
        }
    }

    fn sink_down(&mut self, mut ix: usize) {
        let n = self.heap.len();
        loop {
            let left = 2 * ix + 1;
            let right = left + 1;
            let mut smallest = ix;
            if left < n && self.heap[left].1 < self.heap[smallest].1 {
                smallest = left;
            }
            if right < n && self.heap[right].1 < self.heap[smallest].1 {
                smallest = right;
            }
            if smallest == ix {
                break;
            }
            self.swap(ix, smallest);
            ix = smallest;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Position;

    #[test]
    fn dequeues_in_priority_order() {
        let mut queue = PriorityQueue::new();
        for (i, p) in [5.0, 1.0, 4.0, 2.0, 3.0].into_iter().enumerate() {
            queue.enqueue(i, p);
        }
        assert_eq!(queue.len(), 5);
        assert_eq!(queue.peek_priority(), Some(1.0));
        let order: Vec<f64> = std::iter::from_fn(|| queue.dequeue().map(|(_, p)| p)).collect();
        assert_eq!(order, vec![1.0, 2.0, 3.0, 4.0, 5.0]);
        assert!(queue.is_empty());
        assert!(queue.dequeue().is_none());
    }

    /// Entries are found by coordinate, not identity.
    #[test]
    fn update_priority_by_equality() {
        let mut queue = PriorityQueue::new();
        queue.enqueue(Position::new(0, 0), 3.0);
        queue.enqueue(Position::new(1, 0), 2.0);
        queue.enqueue(Position::new(2, 0), 1.0);
        let target = Position::new(0, 0);
        assert!(queue.update_priority(0.5, |p| *p == target));
        assert_eq!(queue.dequeue(), Some((target, 0.5)));
        // Moving an entry down must also work.
        let target = Position::new(2, 0);
        assert!(queue.update_priority(9.0, |p| *p == target));
        assert_eq!(queue.dequeue().map(|(p, _)| p), Some(Position::new(1, 0)));
        assert!(!queue.update_priority(1.0, |p| *p == Position::new(7, 7)));
        assert!(queue.contains(|p| *p == target));
        queue.clear();
        assert!(queue.is_empty());
    }

    #[test]
    fn indexed_queue_relocates_keys() {
        let mut queue = IndexedPriorityQueue::new();
        queue.push_or_update(0, 10);
        queue.push_or_update(3, 5);
        queue.push_or_update(7, 8);
        assert!(queue.contains(3));
        assert!(!queue.contains(2));
        assert_eq!(queue.priority(7), Some(8));

        queue.push_or_update(0, 1);
        assert_eq!(queue.len(), 3);
        assert_eq!(queue.peek(), Some((0, 1)));
        queue.push_or_update(0, 20);
        assert_eq!(queue.pop(), Some((3, 5)));
        assert_eq!(queue.pop(), Some((7, 8)));
        assert_eq!(queue.pop(), Some((0, 20)));
        assert!(queue.is_empty());
        assert!(!queue.contains(0));
    }
}
