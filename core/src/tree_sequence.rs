//! Tree sequences.
//!
//! A [`TreeSequence`] stores the genealogies of a set of sampled genomes along a genome as
//! tables of nodes and edges, together with the sites and mutations placed on them. Storage,
//! sorting and tree traversal are provided by [`tskit`]. Genome coordinates are integers in
//! `[0, sequence_length)`.

use std::fmt;

use tskit::{metadata::MetadataRoundtrip, TableEqualityOptions};
pub use tskit::{MutationId, NodeId, PopulationId, SiteId};

mod tables;
use tables::PopulationName;
pub use tables::{Edge, Mutation, Node, Site, TableCollection, TableError};

mod variant;
use variant::decode_state;
pub use variant::Variant;

/// An immutable, sorted and indexed tree sequence.
///
/// Built from a [`TableCollection`]. The variant at each site is decoded once on construction.
pub struct TreeSequence {
    inner: tskit::TreeSequence,
    sequence_length: u64,
    populations: Vec<String>,
    variants: Vec<Variant>,
}

impl TreeSequence {
    fn new(inner: tskit::TreeSequence, sequence_length: u64) -> Result<Self, TableError> {
        let populations = inner
            .populations_iter()
            .map(|row| match row.metadata {
                Some(metadata) => PopulationName::decode(&metadata).map(|name| name.0),
                None => Ok(String::new()),
            })
            .collect::<Result<Vec<_>, _>>()
            .map_err(tskit::TskitError::from)?;

        let variants = variant::decode_variants(&inner)?;

        Ok(Self {
            inner,
            sequence_length,
            populations,
            variants,
        })
    }

    /// Returns the underlying tskit tree sequence.
    pub fn as_tskit(&self) -> &tskit::TreeSequence {
        &self.inner
    }

    /// Returns the edges, sorted by parent time.
    pub fn edges(&self) -> Vec<Edge> {
        self.inner
            .edges_iter()
            .map(|row| Edge {
                left: f64::from(row.left) as u64,
                right: f64::from(row.right) as u64,
                parent: row.parent,
                child: row.child,
            })
            .collect()
    }

    /// Returns a haplotype string for each sample, in sample order.
    ///
    /// Each haplotype has one character per site, the allele the sample carries there.
    pub fn haplotypes(&self) -> Vec<String> {
        let mut haplotypes = vec![String::with_capacity(self.num_sites()); self.num_samples()];

        for variant in self.variants() {
            for (haplotype, &genotype) in haplotypes.iter_mut().zip(variant.genotypes.iter()) {
                haplotype.push(variant.alleles[genotype]);
            }
        }

        haplotypes
    }

    /// Returns the mutations, sorted by site and from oldest to youngest within a site.
    pub fn mutations(&self) -> Vec<Mutation> {
        self.inner
            .mutations_iter()
            .map(|row| Mutation {
                site: row.site,
                node: row.node,
                time: f64::from(row.time),
                derived_state: decode_state(row.derived_state.as_deref()),
                parent: (!row.parent.is_null()).then_some(row.parent),
            })
            .collect()
    }

    /// Returns the node with the given id.
    pub fn node(&self, id: NodeId) -> Option<Node> {
        let nodes = self.inner.nodes();

        Some(Node {
            time: f64::from(nodes.time(id)?),
            population: nodes.population(id)?,
            is_sample: nodes.flags(id)?.is_sample(),
        })
    }

    /// Returns the nodes.
    pub fn nodes(&self) -> Vec<Node> {
        self.inner
            .nodes_iter()
            .map(|row| Node {
                time: f64::from(row.time),
                population: row.population,
                is_sample: row.flags.is_sample(),
            })
            .collect()
    }

    /// Returns the number of edges.
    pub fn num_edges(&self) -> usize {
        self.inner.edges().num_rows().as_usize()
    }

    /// Returns the number of mutations.
    pub fn num_mutations(&self) -> usize {
        self.inner.mutations().num_rows().as_usize()
    }

    /// Returns the number of nodes.
    pub fn num_nodes(&self) -> usize {
        self.inner.nodes().num_rows().as_usize()
    }

    /// Returns the number of populations.
    pub fn num_populations(&self) -> usize {
        self.populations.len()
    }

    /// Returns the number of samples.
    pub fn num_samples(&self) -> usize {
        self.samples().len()
    }

    /// Returns the number of sites.
    pub fn num_sites(&self) -> usize {
        self.inner.sites().num_rows().as_usize()
    }

    /// Returns the number of marginal trees along the genome.
    pub fn num_trees(&self) -> usize {
        self.inner.num_trees().as_usize()
    }

    /// Returns the name of a population.
    pub fn population_name(&self, id: PopulationId) -> Option<&str> {
        self.populations
            .get(id.to_usize()?)
            .map(String::as_str)
    }

    /// Returns the id of the population with the given name.
    pub fn population_id(&self, name: &str) -> Option<PopulationId> {
        self.populations
            .iter()
            .position(|population| population == name)
            .map(|i| PopulationId::from(i as i32))
    }

    /// Returns the sample nodes, in node order.
    pub fn samples(&self) -> &[NodeId] {
        self.inner.sample_nodes()
    }

    /// Returns the sample nodes from one population.
    pub fn samples_in(&self, population: PopulationId) -> Vec<NodeId> {
        let nodes = self.inner.nodes();

        self.samples()
            .iter()
            .copied()
            .filter(|&u| nodes.population(u) == Some(population))
            .collect()
    }

    /// Returns the sequence length.
    pub fn sequence_length(&self) -> u64 {
        self.sequence_length
    }

    /// Returns a displayable site table.
    pub fn site_table(&self) -> SiteTable<'_> {
        SiteTable(self)
    }

    /// Returns the sites, sorted by position.
    pub fn sites(&self) -> Vec<Site> {
        self.inner
            .sites_iter()
            .map(|row| Site {
                position: f64::from(row.position) as u64,
                ancestral_state: decode_state(row.ancestral_state.as_deref()),
            })
            .collect()
    }

    /// Returns the variants at each site, in site order.
    pub fn variants(&self) -> impl Iterator<Item = &Variant> + '_ {
        self.variants.iter()
    }
}

impl fmt::Debug for TreeSequence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TreeSequence")
            .field("sequence_length", &self.sequence_length)
            .field("populations", &self.populations)
            .field("nodes", &self.num_nodes())
            .field("edges", &self.num_edges())
            .field("variants", &self.variants)
            .finish()
    }
}

impl PartialEq for TreeSequence {
    fn eq(&self, other: &Self) -> bool {
        match (self.inner.dump_tables(), other.inner.dump_tables()) {
            (Ok(lhs), Ok(rhs)) => lhs.equals(&rhs, TableEqualityOptions::NONE),
            _ => false,
        }
    }
}

impl fmt::Display for TreeSequence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "TreeSequence")?;
        writeln!(f, "  {:<16} {}", "trees", self.num_trees())?;
        writeln!(f, "  {:<16} {}", "sequence_length", self.sequence_length())?;
        writeln!(f, "  {:<16} {}", "samples", self.num_samples())?;
        writeln!(f, "  {:<16} {}", "nodes", self.num_nodes())?;
        writeln!(f, "  {:<16} {}", "edges", self.num_edges())?;
        writeln!(f, "  {:<16} {}", "sites", self.num_sites())?;
        writeln!(f, "  {:<16} {}", "mutations", self.num_mutations())?;
        writeln!(f, "  {:<16} {}", "populations", self.num_populations())
    }
}

/// A display wrapper for the site table of a tree sequence.
pub struct SiteTable<'a>(&'a TreeSequence);

impl<'a> fmt::Display for SiteTable<'a> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mutations = self.0.mutations();

        writeln!(f, "{:<6} {:>10} {:>16} {:>10}", "id", "position", "ancestral_state", "mutations")?;
        for (id, site) in self.0.sites().iter().enumerate() {
            let count = mutations
                .iter()
                .filter(|mutation| mutation.site.as_usize() == id)
                .count();

            writeln!(
                f,
                "{:<6} {:>10} {:>16} {:>10}",
                id, site.position, site.ancestral_state, count
            )?;
        }
        Ok(())
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    use tskit::{prelude::StreamingIterator, TreeFlags};

    // Four samples over ten bases, two populations, and two trees:
    //
    //   [0, 5)          [5, 10)
    //      6               6
    //    /   \           /   \
    //   4     5         4     \
    //  / \   / \       / \     \
    // 0   1 2   3     0   2     5
    //                          / \
    //                         1   3
    //
    // Sites at 2 (mutation above 4, all of 0 and 1 derived) and 7 (mutation above 5, i.e. 1
    // and 3) plus a back mutation at 7 above 3.
    pub fn ts_two_trees() -> TreeSequence {
        let mut tables = TableCollection::new(10).unwrap();
        let a = tables.add_population("A").unwrap();
        let b = tables.add_population("B").unwrap();

        let n = [
            tables.add_node(0., a, true).unwrap(),
            tables.add_node(0., a, true).unwrap(),
            tables.add_node(0., b, true).unwrap(),
            tables.add_node(0., b, true).unwrap(),
            tables.add_node(1., a, false).unwrap(),
            tables.add_node(2., b, false).unwrap(),
            tables.add_node(3., b, false).unwrap(),
        ];

        tables.add_edge(0, 5, n[4], n[0]);
        tables.add_edge(0, 5, n[4], n[1]);
        tables.add_edge(0, 5, n[5], n[2]);
        tables.add_edge(0, 5, n[5], n[3]);
        tables.add_edge(0, 10, n[6], n[4]);
        tables.add_edge(0, 10, n[6], n[5]);
        tables.add_edge(5, 10, n[4], n[0]);
        tables.add_edge(5, 10, n[4], n[2]);
        tables.add_edge(5, 10, n[5], n[1]);
        tables.add_edge(5, 10, n[5], n[3]);

        let s0 = tables.add_site(2, 'A').unwrap();
        tables.add_mutation(s0, n[4], 1.5, 'T', None).unwrap();
        let s1 = tables.add_site(7, 'C').unwrap();
        let m = tables.add_mutation(s1, n[5], 2.5, 'G', None).unwrap();
        tables.add_mutation(s1, n[3], 0.5, 'C', Some(m)).unwrap();

        tables.into_tree_sequence().unwrap()
    }

    #[test]
    fn test_summary_counts() {
        let ts = ts_two_trees();

        assert_eq!(ts.num_samples(), 4);
        assert_eq!(ts.num_nodes(), 7);
        assert_eq!(ts.num_edges(), 10);
        assert_eq!(ts.num_trees(), 2);
        assert_eq!(ts.num_sites(), 2);
        assert_eq!(ts.num_mutations(), 3);
        assert_eq!(ts.num_populations(), 2);
        assert_eq!(ts.population_id("B"), Some(PopulationId::from(1)));
        assert_eq!(ts.population_name(PopulationId::from(0)), Some("A"));
        assert_eq!(ts.population_id("AFR"), None);
        assert_eq!(
            ts.samples_in(PopulationId::from(1)),
            vec![NodeId::from(2), NodeId::from(3)]
        );
    }

    #[test]
    fn test_marginal_trees() {
        let ts = ts_two_trees();
        let mut trees = ts.as_tskit().tree_iterator(TreeFlags::default()).unwrap();

        let left = trees.next().unwrap();
        assert_eq!(f64::from(left.interval().1), 5.);
        assert_eq!(left.parent(NodeId::from(1)), Some(NodeId::from(4)));
        assert_eq!(left.parent(NodeId::from(6)), Some(NodeId::NULL));

        let right = trees.next().unwrap();
        assert_eq!(right.parent(NodeId::from(1)), Some(NodeId::from(5)));
        assert_eq!(
            right.parents(NodeId::from(2)).collect::<Vec<_>>(),
            vec![NodeId::from(2), NodeId::from(4), NodeId::from(6)]
        );

        assert!(trees.next().is_none());
    }

    #[test]
    fn test_node_views() {
        let ts = ts_two_trees();

        let node = ts.node(NodeId::from(5)).unwrap();
        assert_eq!(node.time, 2.);
        assert_eq!(node.population, PopulationId::from(1));
        assert!(!node.is_sample);
        assert!(ts.node(NodeId::from(7)).is_none());

        let times = ts.nodes().iter().map(|node| node.time).collect::<Vec<_>>();
        assert_eq!(times, vec![0., 0., 0., 0., 1., 2., 3.]);
    }

    #[test]
    fn test_variants() {
        let ts = ts_two_trees();
        let variants = ts.variants().collect::<Vec<_>>();

        assert_eq!(variants[0].alleles, vec!['A', 'T']);
        assert_eq!(variants[0].genotypes, vec![1, 1, 0, 0]);

        assert_eq!(variants[1].alleles, vec!['C', 'G']);
        assert_eq!(variants[1].genotypes, vec![0, 1, 0, 0]);
        assert_eq!(variants[1].allele_counts(), vec![3, 1]);
    }

    #[test]
    fn test_haplotypes() {
        let ts = ts_two_trees();

        assert_eq!(ts.haplotypes(), vec!["TC", "TG", "AC", "AC"]);
    }

    #[test]
    fn test_equality() {
        assert_eq!(ts_two_trees(), ts_two_trees());

        let mut tables = TableCollection::new(10).unwrap();
        let a = tables.add_population("A").unwrap();
        tables.add_node(0., a, true).unwrap();
        let other = tables.into_tree_sequence().unwrap();

        assert_ne!(ts_two_trees(), other);
    }

    #[test]
    fn test_display_variant() {
        let ts = ts_two_trees();
        let variant = ts.variants().next().unwrap();

        assert_eq!(
            variant.to_string(),
            "Variant(site=0, position=2, alleles=('A', 'T'), genotypes=[1 1 0 0])"
        );
    }

    #[test]
    fn test_display_site_table() {
        let ts = ts_two_trees();
        let table = ts.site_table().to_string();
        let lines = table.lines().collect::<Vec<_>>();

        assert_eq!(lines.len(), 3);
        assert!(lines[2].starts_with("1 "));
        assert!(lines[2].ends_with('2'));
    }
}
