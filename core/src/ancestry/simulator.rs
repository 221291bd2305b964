use rand::{Rng, RngCore};
use rand_distr::Exp1;

use crate::{
    demography::{self, Event},
    tree_sequence::{NodeId, PopulationId, TableCollection, TableError},
};

use super::{fenwick::Fenwick, overlap::OverlapCounts, AncestryError};

/// A contiguous interval of ancestral material carried by a lineage.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
struct Segment {
    left: u64,
    right: u64,
    node: NodeId,
}

#[derive(Clone, Debug)]
struct Lineage {
    population: usize,
    /// Index of the lineage in its population's list of lineages.
    slot: usize,
    /// Non-overlapping and sorted by position.
    segments: Vec<Segment>,
}

impl Lineage {
    fn links(&self) -> u64 {
        match (self.segments.first(), self.segments.last()) {
            (Some(first), Some(last)) => last.right - first.left - 1,
            _ => 0,
        }
    }
}

pub(super) struct Simulator<'a, R> {
    rng: R,
    time: f64,
    tables: TableCollection,
    lineages: Vec<Option<Lineage>>,
    free: Vec<usize>,
    by_population: Vec<Vec<usize>>,
    sizes: Vec<f64>,
    links: Fenwick,
    overlaps: OverlapCounts,
    recombination_rate: f64,
    ploidy: f64,
    events: &'a [Event],
    next_event: usize,
    num_events: usize,
}

impl<'a, R> Simulator<'a, R>
where
    R: RngCore,
{
    pub fn new(
        tables: TableCollection,
        sizes: Vec<f64>,
        events: &'a [Event],
        recombination_rate: f64,
        ploidy: usize,
        rng: R,
    ) -> Self {
        let populations = sizes.len();
        let sequence_length = tables.sequence_length();

        Self {
            rng,
            time: 0.0,
            tables,
            lineages: Vec::new(),
            free: Vec::new(),
            by_population: vec![Vec::new(); populations],
            sizes,
            links: Fenwick::with_capacity(64),
            overlaps: OverlapCounts::new(sequence_length, 0),
            recombination_rate,
            ploidy: ploidy as f64,
            events,
            next_event: 0,
            num_events: 0,
        }
    }

    /// Adds sample nodes and their lineages.
    pub fn add_samples(
        &mut self,
        samples: &[(demography::PopulationId, usize)],
    ) -> Result<(), TableError> {
        let sequence_length = self.tables.sequence_length();

        let mut total = 0;
        for &(population, count) in samples {
            for _ in 0..count {
                let node = self
                    .tables
                    .add_node(0.0, table_population(population.0), true)?;
                let segment = Segment {
                    left: 0,
                    right: sequence_length,
                    node,
                };
                self.insert_lineage(population.0, vec![segment]);
                total += 1;
            }
        }

        self.overlaps = OverlapCounts::new(sequence_length, total);

        Ok(())
    }

    fn num_lineages(&self) -> usize {
        self.by_population.iter().map(Vec::len).sum()
    }

    fn insert_lineage(&mut self, population: usize, segments: Vec<Segment>) {
        let slot = self.by_population[population].len();
        let lineage = Lineage {
            population,
            slot,
            segments,
        };
        let links = lineage.links();

        let id = match self.free.pop() {
            Some(id) => {
                self.lineages[id] = Some(lineage);
                id
            }
            None => {
                self.lineages.push(Some(lineage));
                self.lineages.len() - 1
            }
        };

        self.links.set(id, links);
        self.by_population[population].push(id);
    }

    fn remove_lineage(&mut self, id: usize) -> Option<Lineage> {
        let lineage = self.lineages.get_mut(id)?.take()?;
        self.free.push(id);
        self.links.set(id, 0);

        let members = &mut self.by_population[lineage.population];
        members.swap_remove(lineage.slot);
        if let Some(&moved) = members.get(lineage.slot) {
            if let Some(other) = self.lineages[moved].as_mut() {
                other.slot = lineage.slot;
            }
        }

        Some(lineage)
    }

    fn coalescence_rate(&self, population: usize) -> f64 {
        let k = self.by_population[population].len() as f64;
        k * (k - 1.0) / 2.0 / (self.ploidy * self.sizes[population])
    }

    /// Runs the simulation back in time until all ancestral material has coalesced.
    pub fn run(mut self) -> Result<TableCollection, AncestryError> {
        while self.num_lineages() > 0 {
            let recombination = self.recombination_rate * self.links.total() as f64;
            let coalescence = (0..self.sizes.len())
                .map(|population| self.coalescence_rate(population))
                .collect::<Vec<_>>();
            let total = recombination + coalescence.iter().sum::<f64>();

            let wait = if total > 0.0 {
                self.rng.sample::<f64, _>(Exp1) / total
            } else {
                f64::INFINITY
            };

            let next_event_time = self
                .events
                .get(self.next_event)
                .map(Event::time)
                .unwrap_or(f64::INFINITY);

            if self.time + wait >= next_event_time {
                if next_event_time.is_infinite() {
                    return Err(AncestryError::InfiniteWaitingTime {
                        time: self.time,
                        lineages: self.num_lineages(),
                    });
                }

                self.time = next_event_time;
                self.apply_demographic_event();
                continue;
            }

            self.time += wait;
            self.num_events += 1;

            let mut x = self.rng.random::<f64>() * total;
            if x < recombination {
                self.recombine();
            } else {
                x -= recombination;

                // Fall back to the last population with a positive rate on rounding
                let mut chosen = None;
                for (population, &rate) in coalescence.iter().enumerate() {
                    if rate > 0.0 {
                        chosen = Some(population);
                        if x < rate {
                            break;
                        }
                        x -= rate;
                    }
                }

                if let Some(population) = chosen {
                    self.common_ancestor(population)?;
                }
            }
        }

        log::debug!(
            "Finished coalescent after {} events at time {:.1} with {} nodes",
            self.num_events,
            self.time,
            self.tables.num_nodes()
        );

        Ok(self.tables)
    }

    fn apply_demographic_event(&mut self) {
        let events = self.events;
        let Some(event) = events.get(self.next_event) else {
            return;
        };
        self.next_event += 1;

        match event {
            Event::Split(split) => {
                let ancestral = split.ancestral().0;

                for derived in split.derived() {
                    let moved = std::mem::take(&mut self.by_population[derived.0]);
                    for id in moved {
                        if let Some(lineage) = self.lineages[id].as_mut() {
                            lineage.population = ancestral;
                            lineage.slot = self.by_population[ancestral].len();
                        }
                        self.by_population[ancestral].push(id);
                    }
                }

                log::trace!(
                    "Split at time {}: {} lineages in population {ancestral}",
                    self.time,
                    self.by_population[ancestral].len()
                );
            }
            Event::ParametersChange(change) => {
                self.sizes[change.population().0] = change.initial_size();

                log::trace!(
                    "Size change at time {}: population {} now {}",
                    self.time,
                    change.population(),
                    change.initial_size()
                );
            }
        }
    }

    fn recombine(&mut self) {
        let target = self.rng.random_range(0..self.links.total());
        let (id, offset) = self.links.find(target);

        let Some(lineage) = self.lineages[id].as_mut() else {
            return;
        };

        let breakpoint = lineage.segments[0].left + 1 + offset;

        let split = lineage.segments.partition_point(|s| s.right <= breakpoint);
        let mut right = lineage.segments.split_off(split);
        if right[0].left < breakpoint {
            let straddling = right[0];
            lineage.segments.push(Segment {
                right: breakpoint,
                ..straddling
            });
            right[0].left = breakpoint;
        }

        let population = lineage.population;
        let links = lineage.links();
        self.links.set(id, links);
        self.insert_lineage(population, right);
    }

    fn common_ancestor(&mut self, population: usize) -> Result<(), TableError> {
        let k = self.by_population[population].len();
        let i = self.rng.random_range(0..k);
        let mut j = self.rng.random_range(0..k - 1);
        if j >= i {
            j += 1;
        }

        let a = self.by_population[population][i];
        let b = self.by_population[population][j];

        let (Some(a), Some(b)) = (self.remove_lineage(a), self.remove_lineage(b)) else {
            return Ok(());
        };

        let segments = self.merge(&a.segments, &b.segments, table_population(population))?;
        if !segments.is_empty() {
            self.insert_lineage(population, segments);
        }

        Ok(())
    }

    /// Merges the ancestral material of two lineages into a common ancestor, recording edges
    /// where both carry material.
    fn merge(
        &mut self,
        a: &[Segment],
        b: &[Segment],
        population: PopulationId,
    ) -> Result<Vec<Segment>, TableError> {
        let mut boundaries = a
            .iter()
            .chain(b.iter())
            .flat_map(|s| [s.left, s.right])
            .collect::<Vec<_>>();
        boundaries.sort_unstable();
        boundaries.dedup();

        let mut merged = Vec::new();
        let mut parent = None;
        let (mut ia, mut ib) = (0, 0);

        for window in boundaries.windows(2) {
            let (left, right) = (window[0], window[1]);

            while ia < a.len() && a[ia].right <= left {
                ia += 1;
            }
            while ib < b.len() && b[ib].right <= left {
                ib += 1;
            }

            let u = a.get(ia).filter(|s| s.left <= left).map(|s| s.node);
            let v = b.get(ib).filter(|s| s.left <= left).map(|s| s.node);

            match (u, v) {
                (None, None) => (),
                (Some(node), None) | (None, Some(node)) => {
                    push_segment(&mut merged, left, right, node)
                }
                (Some(u), Some(v)) => {
                    let p = match parent {
                        Some(p) => p,
                        None => {
                            let p = self.tables.add_node(self.time, population, false)?;
                            parent = Some(p);
                            p
                        }
                    };
                    self.tables.add_edge(left, right, p, u);
                    self.tables.add_edge(left, right, p, v);

                    for (l, r) in self.overlaps.decrement(left, right) {
                        push_segment(&mut merged, l, r, p);
                    }
                }
            }
        }

        Ok(merged)
    }
}

/// Populations are added to the tables in demography order.
fn table_population(index: usize) -> PopulationId {
    PopulationId::from(index as i32)
}

fn push_segment(segments: &mut Vec<Segment>, left: u64, right: u64, node: NodeId) {
    match segments.last_mut() {
        Some(last) if last.right == left && last.node == node => last.right = right,
        _ => segments.push(Segment { left, right, node }),
    }
}
