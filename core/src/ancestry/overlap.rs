use std::collections::BTreeMap;

/// The number of lineages carrying ancestral material at each position of the genome.
///
/// Stored as a step function: each key starts an interval that runs until the next key.
#[derive(Clone, Debug)]
pub struct OverlapCounts {
    counts: BTreeMap<u64, u32>,
}

impl OverlapCounts {
    pub fn new(sequence_length: u64, lineages: u32) -> Self {
        let mut counts = BTreeMap::new();
        counts.insert(0, lineages);
        counts.insert(sequence_length, 0);
        Self { counts }
    }

    fn split_at(&mut self, x: u64) {
        if !self.counts.contains_key(&x) {
            let count = self
                .counts
                .range(..x)
                .next_back()
                .map(|(_, &count)| count)
                .unwrap_or(0);
            self.counts.insert(x, count);
        }
    }

    /// Records that two lineages carrying `[left, right)` merged into one.
    ///
    /// Returns the sub-intervals that are still carried by more than one lineage, i.e. that
    /// have not yet reached their most recent common ancestor.
    pub fn decrement(&mut self, left: u64, right: u64) -> Vec<(u64, u64)> {
        self.split_at(left);
        self.split_at(right);

        let keys = self
            .counts
            .range(left..right)
            .map(|(&key, _)| key)
            .collect::<Vec<_>>();
        let ends = keys.iter().skip(1).copied().chain(std::iter::once(right));

        let mut unresolved: Vec<(u64, u64)> = Vec::new();
        for (&start, end) in keys.iter().zip(ends) {
            let count = self.counts.entry(start).or_insert(0);
            *count = count.saturating_sub(1);

            if *count > 1 {
                match unresolved.last_mut() {
                    Some(last) if last.1 == start => last.1 = end,
                    _ => unresolved.push((start, end)),
                }
            }
        }

        unresolved
    }

    #[cfg(test)]
    fn count_at(&self, x: u64) -> u32 {
        self.counts
            .range(..=x)
            .next_back()
            .map(|(_, &count)| count)
            .unwrap_or(0)
    }
}
