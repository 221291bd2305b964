/// A Fenwick tree over non-negative integer weights, supporting weighted sampling.
///
/// Grows on demand when weights are set beyond its current length.
#[derive(Clone, Debug, Default)]
pub struct Fenwick {
    tree: Vec<u64>,
    values: Vec<u64>,
    total: u64,
}

impl Fenwick {
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            tree: vec![0; capacity + 1],
            values: vec![0; capacity],
            total: 0,
        }
    }

    fn len(&self) -> usize {
        self.values.len()
    }

    fn grow(&mut self, min_len: usize) {
        let len = min_len.max(2 * self.len()).max(16);
        self.values.resize(len, 0);

        // Rebuild in linear time
        self.tree = vec![0; len + 1];
        for i in 1..=len {
            self.tree[i] += self.values[i - 1];
            let j = i + lowbit(i);
            if j <= len {
                self.tree[j] += self.tree[i];
            }
        }
    }

    pub fn set(&mut self, index: usize, value: u64) {
        if index >= self.len() {
            self.grow(index + 1);
        }

        let old = std::mem::replace(&mut self.values[index], value);
        self.total = self.total - old + value;

        let mut i = index + 1;
        while i <= self.len() {
            self.tree[i] = self.tree[i] - old + value;
            i += lowbit(i);
        }
    }

    pub fn total(&self) -> u64 {
        self.total
    }

    /// Returns the index `i` such that the sum of weights before `i` is at most `target` and
    /// the sum including `i` exceeds it, along with the remainder of `target` within `i`.
    ///
    /// `target` must be less than the total.
    pub fn find(&self, target: u64) -> (usize, u64) {
        let mut pos = 0;
        let mut remainder = target;
        let mut step = self.len().next_power_of_two();

        while step > 0 {
            let next = pos + step;
            if next <= self.len() && self.tree[next] <= remainder {
                pos = next;
                remainder -= self.tree[next];
            }
            step /= 2;
        }

        (pos, remainder)
    }
}

fn lowbit(i: usize) -> usize {
    i & i.wrapping_neg()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_find() {
        let mut fenwick = Fenwick::with_capacity(4);
        fenwick.set(0, 3);
        fenwick.set(1, 0);
        fenwick.set(2, 5);
        fenwick.set(3, 1);

        assert_eq!(fenwick.total(), 9);
        assert_eq!(fenwick.find(0), (0, 0));
        assert_eq!(fenwick.find(2), (0, 2));
        assert_eq!(fenwick.find(3), (2, 0));
        assert_eq!(fenwick.find(7), (2, 4));
        assert_eq!(fenwick.find(8), (3, 0));
    }

    #[test]
    fn test_update_and_grow() {
        let mut fenwick = Fenwick::with_capacity(1);
        fenwick.set(0, 2);
        fenwick.set(20, 4);
        fenwick.set(0, 1);

        assert_eq!(fenwick.total(), 5);
        assert_eq!(fenwick.find(0), (0, 0));
        assert_eq!(fenwick.find(1), (20, 0));
        assert_eq!(fenwick.find(4), (20, 3));
    }
}
