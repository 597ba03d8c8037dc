// src/path.rs
// Trail of recently visited second-body positions, oldest first.

use std::collections::VecDeque;

/// FIFO buffer holding at most `depth` points; a depth of 0 never evicts.
/// With depth 0 the buffer grows for the whole playback.
#[derive(Debug, Clone, PartialEq)]
pub struct PathHistory<P> {
    points: VecDeque<P>,
    depth: usize,
}

impl<P> PathHistory<P> {
    pub fn new(depth: usize) -> Self {
        Self {
            points: VecDeque::with_capacity(depth),
            depth,
        }
    }

    /// Pushes to the tail, then drops from the head until at most `depth` remain.
    pub fn append(&mut self, point: P) {
        self.points.push_back(point);
        if self.depth > 0 {
            while self.points.len() > self.depth {
                self.points.pop_front();
            }
        }
    }

    pub fn depth(&self) -> usize {
        self.depth
    }

    pub fn is_unbounded(&self) -> bool {
        self.depth == 0
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn clear(&mut self) {
        self.points.clear();
    }

    pub fn iter(&self) -> impl DoubleEndedIterator<Item = &P> + ExactSizeIterator {
        self.points.iter()
    }

    /// Consecutive (older, newer) pairs, for drawing the trail as line segments.
    pub fn segments(&self) -> impl Iterator<Item = (&P, &P)> {
        self.points.iter().zip(self.points.iter().skip(1))
    }

    pub fn newest(&self) -> Option<&P> {
        self.points.back()
    }
}

impl<P: Clone> PathHistory<P> {
    pub fn to_vec(&self) -> Vec<P> {
        self.points.iter().cloned().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn bounded_keeps_most_recent_in_order() {
        let mut path = PathHistory::new(3);
        for p in [(1, 1), (2, 2), (3, 3), (4, 4), (5, 5)] {
            path.append(p);
        }
        assert_eq!(path.to_vec(), vec![(3, 3), (4, 4), (5, 5)]);
        assert_eq!(path.newest(), Some(&(5, 5)));
    }

    #[test]
    fn zero_depth_is_unbounded() {
        let mut path = PathHistory::new(0);
        for p in 1..=5 {
            path.append(p);
        }
        assert!(path.is_unbounded());
        assert_eq!(path.to_vec(), vec![1, 2, 3, 4, 5]);
    }

    #[test]
    fn segments_pair_neighbours() {
        let mut path = PathHistory::new(0);
        assert_eq!(path.segments().count(), 0);
        path.append('a');
        assert_eq!(path.segments().count(), 0);
        path.append('b');
        path.append('c');
        let segs: Vec<_> = path.segments().map(|(a, b)| (*a, *b)).collect();
        assert_eq!(segs, vec![('a', 'b'), ('b', 'c')]);
    }

    #[test]
    fn clear_empties() {
        let mut path = PathHistory::new(2);
        path.append(1.0);
        path.clear();
        assert!(path.is_empty());
        assert_eq!(path.depth(), 2);
    }

    proptest! {
        #[test]
        fn never_exceeds_depth(depth in 1usize..20, n in 0usize..100) {
            let mut path = PathHistory::new(depth);
            for i in 0..n {
                path.append(i);
                prop_assert!(path.len() <= depth);
            }
            let expected: Vec<usize> = (n.saturating_sub(depth)..n).collect();
            prop_assert_eq!(path.to_vec(), expected);
        }
    }
}
