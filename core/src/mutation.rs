//! Mutation overlay.
//!
//! Places mutations on the branches of a tree sequence under the Jukes-Cantor model: sites get a
//! uniformly drawn ancestral nucleotide, and each mutation changes the inherited nucleotide to
//! one of the three others with equal probability.

use std::{error::Error, fmt};

use rand::{Rng, SeedableRng};
use rand_distr::{Distribution, Poisson};
use rand_xoshiro::Xoshiro256PlusPlus;
use tskit::{prelude::StreamingIterator, TreeFlags};

use crate::tree_sequence::{MutationId, NodeId, TableCollection, TableError, TreeSequence};

/// The nucleotide alphabet.
pub const NUCLEOTIDES: [char; 4] = ['A', 'C', 'G', 'T'];

/// Overlays mutations onto a tree sequence at a rate per unit of sequence per generation.
///
/// Any existing sites and mutations are replaced. If `seed` is `None`, the generator is seeded
/// from entropy.
pub fn sim_mutations(
    ts: &TreeSequence,
    rate: f64,
    seed: Option<u64>,
) -> Result<TreeSequence, MutationError> {
    if !(rate.is_finite() && rate >= 0.0) {
        return Err(MutationError::InvalidRate(rate));
    }

    let mut rng = match seed {
        Some(seed) => Xoshiro256PlusPlus::seed_from_u64(seed),
        None => Xoshiro256PlusPlus::from_seed(rand::rng().random()),
    };

    let mut tables = TableCollection::from_tree_sequence(ts)?;

    let mut placed = Vec::new();
    for edge in ts.edges() {
        let (Some(parent), Some(child)) = (ts.node(edge.parent), ts.node(edge.child)) else {
            continue;
        };

        let branch_length = parent.time - child.time;
        let mean = rate * (edge.right - edge.left) as f64 * branch_length;
        if mean <= 0.0 {
            continue;
        }

        let poisson = Poisson::new(mean).map_err(|_| MutationError::InvalidRate(rate))?;
        let count = poisson.sample(&mut rng) as u64;

        for _ in 0..count {
            let position = rng.random_range(edge.left..edge.right);
            let time = child.time + rng.random::<f64>() * branch_length;
            placed.push((position, time, edge.child));
        }
    }

    // By position, and oldest first within a position
    placed.sort_by(|a, b| a.0.cmp(&b.0).then(b.1.total_cmp(&a.1)));

    let mut groups = placed.chunk_by(|a, b| a.0 == b.0).peekable();
    let mut num_sites = 0;

    let mut trees = ts
        .as_tskit()
        .tree_iterator(TreeFlags::default())
        .map_err(TableError::from)?;
    while let Some(tree) = trees.next() {
        let right = f64::from(tree.interval().1);

        while let Some(group) = groups.next_if(|group| (group[0].0 as f64) < right) {
            let ancestral_state = NUCLEOTIDES[rng.random_range(0..NUCLEOTIDES.len())];
            let site = tables.add_site(group[0].0, ancestral_state)?;
            num_sites += 1;

            let mut site_mutations: Vec<(NodeId, MutationId, char)> = Vec::new();
            for &(_, time, node) in group {
                // All mutations recorded so far are older; the closest one above is the parent
                let parent = tree.parents(node).find_map(|u| {
                    site_mutations
                        .iter()
                        .rev()
                        .find(|(v, _, _)| *v == u)
                        .map(|&(_, id, state)| (id, state))
                });

                let inherited = parent.map(|(_, state)| state).unwrap_or(ancestral_state);
                let derived_state = mutate(&mut rng, inherited);
                let id = tables.add_mutation(
                    site,
                    node,
                    time,
                    derived_state,
                    parent.map(|(id, _)| id),
                )?;
                site_mutations.push((node, id, derived_state));
            }
        }
    }

    log::debug!("Placed {} mutations at {num_sites} sites", placed.len());

    Ok(tables.into_tree_sequence()?)
}

fn mutate<R: Rng>(rng: &mut R, from: char) -> char {
    let others = NUCLEOTIDES
        .iter()
        .copied()
        .filter(|&c| c != from)
        .collect::<Vec<_>>();
    others[rng.random_range(0..others.len())]
}

/// An error associated with simulating mutations.
#[derive(Debug)]
pub enum MutationError {
    /// Mutation rate is negative or not finite.
    InvalidRate(f64),
    /// The mutated tables are invalid.
    Tables(TableError),
}

impl fmt::Display for MutationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MutationError::InvalidRate(rate) => write!(f, "invalid mutation rate {rate}"),
            MutationError::Tables(e) => write!(f, "{e}"),
        }
    }
}

impl Error for MutationError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            MutationError::InvalidRate(_) => None,
            MutationError::Tables(e) => Some(e),
        }
    }
}

impl From<TableError> for MutationError {
    fn from(e: TableError) -> Self {
        Self::Tables(e)
    }
}
