use std::{collections::HashMap, fmt};

use tskit::{prelude::StreamingIterator, TreeFlags, TskitError};

/// The alleles carried by each sample at a site.
#[derive(Clone, Debug, PartialEq)]
pub struct Variant {
    /// Index of the site.
    pub site: usize,
    /// Position of the site.
    pub position: u64,
    /// Alleles at the site, starting with the ancestral state.
    pub alleles: Vec<char>,
    /// For each sample, in sample order, the index of its allele.
    pub genotypes: Vec<usize>,
}

impl Variant {
    /// Returns the number of samples carrying each allele.
    pub fn allele_counts(&self) -> Vec<usize> {
        let mut counts = vec![0; self.alleles.len()];
        for &genotype in self.genotypes.iter() {
            counts[genotype] += 1;
        }
        counts
    }

    /// Returns the number of samples carrying each allele, restricted to a subset of samples
    /// given by their index in sample order.
    pub fn allele_counts_in(&self, indices: &[usize]) -> Vec<usize> {
        let mut counts = vec![0; self.alleles.len()];
        for &i in indices {
            counts[self.genotypes[i]] += 1;
        }
        counts
    }
}

impl fmt::Display for Variant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let alleles = self
            .alleles
            .iter()
            .map(|allele| format!("'{allele}'"))
            .collect::<Vec<_>>()
            .join(", ");
        let genotypes = self
            .genotypes
            .iter()
            .map(|genotype| genotype.to_string())
            .collect::<Vec<_>>()
            .join(" ");

        write!(
            f,
            "Variant(site={}, position={}, alleles=({alleles}), genotypes=[{genotypes}])",
            self.site, self.position
        )
    }
}

/// Decodes the variant at every site by walking the marginal trees from left to right.
pub(super) fn decode_variants(ts: &tskit::TreeSequence) -> Result<Vec<Variant>, TskitError> {
    let samples = ts.sample_nodes();
    let mut sites = ts.sites_iter().peekable();
    let mut mutations = ts.mutations_iter().peekable();
    let mut variants = Vec::with_capacity(ts.sites().num_rows().as_usize());

    let mut trees = ts.tree_iterator(TreeFlags::default())?;
    while let Some(tree) = trees.next() {
        let (_, right) = tree.interval();

        while let Some(site) = sites.next_if(|site| site.position < right) {
            let ancestral_state = decode_state(site.ancestral_state.as_deref());
            let mut alleles = vec![ancestral_state];

            // Mutations are sorted by site and from oldest to youngest, so the last one
            // inserted for a node is the one closest to its descendants
            let mut youngest = HashMap::new();
            while let Some(mutation) = mutations.next_if(|mutation| mutation.site == site.id) {
                let derived_state = decode_state(mutation.derived_state.as_deref());
                youngest.insert(mutation.node, derived_state);
                if !alleles.contains(&derived_state) {
                    alleles.push(derived_state);
                }
            }

            let genotypes = samples
                .iter()
                .map(|&sample| {
                    let state = tree
                        .parents(sample)
                        .find_map(|u| youngest.get(&u).copied())
                        .unwrap_or(ancestral_state);

                    alleles
                        .iter()
                        .position(|&allele| allele == state)
                        .unwrap_or(0)
                })
                .collect();

            variants.push(Variant {
                site: site.id.as_usize(),
                position: f64::from(site.position) as u64,
                alleles,
                genotypes,
            });
        }
    }

    Ok(variants)
}

/// Decodes a single-character allelic state.
///
/// Missing or empty states decode as `N`.
pub(super) fn decode_state(state: Option<&[u8]>) -> char {
    state
        .and_then(|state| std::str::from_utf8(state).ok())
        .and_then(|state| state.chars().next())
        .unwrap_or('N')
}
