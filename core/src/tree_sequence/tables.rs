use std::{error::Error, fmt, io};

use tskit::{
    metadata::{MetadataError, MetadataRoundtrip, PopulationMetadata},
    IndividualId, MutationId, NodeFlags, NodeId, PopulationId, SiteId, TableSortOptions,
    TreeSequenceFlags, TskitError,
};

use super::TreeSequence;

/// A population name, stored as population metadata.
#[derive(Clone, Debug, Eq, PartialEq)]
pub(crate) struct PopulationName(pub String);

impl MetadataRoundtrip for PopulationName {
    fn encode(&self) -> Result<Vec<u8>, MetadataError> {
        Ok(self.0.as_bytes().to_vec())
    }

    fn decode(metadata: &[u8]) -> Result<Self, MetadataError>
    where
        Self: Sized,
    {
        String::from_utf8(metadata.to_vec())
            .map(Self)
            .map_err(|err| MetadataError::RoundtripError {
                value: Box::new(io::Error::new(io::ErrorKind::InvalidData, err.to_string())),
            })
    }
}

impl PopulationMetadata for PopulationName {}

/// A node, i.e. a genome at a point in time.
#[derive(Clone, Debug, PartialEq)]
pub struct Node {
    /// Time in generations before the present.
    pub time: f64,
    /// Population the genome lived in.
    pub population: PopulationId,
    /// Whether the node is a sample.
    pub is_sample: bool,
}

/// An edge, recording that `parent` is the parent of `child` over `[left, right)`.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Edge {
    /// Inclusive left coordinate.
    pub left: u64,
    /// Exclusive right coordinate.
    pub right: u64,
    /// Parent node.
    pub parent: NodeId,
    /// Child node.
    pub child: NodeId,
}

/// A site at which mutations occurred.
#[derive(Clone, Debug, PartialEq)]
pub struct Site {
    /// Position on the genome.
    pub position: u64,
    /// State of the root at this position.
    pub ancestral_state: char,
}

/// A mutation above a node at a site.
#[derive(Clone, Debug, PartialEq)]
pub struct Mutation {
    /// The site.
    pub site: SiteId,
    /// Node directly below the mutation.
    pub node: NodeId,
    /// Time of the mutation in generations before the present.
    pub time: f64,
    /// State the mutation changes to.
    pub derived_state: char,
    /// The closest older mutation at the same site on the path to the root.
    pub parent: Option<MutationId>,
}

/// Mutable tables from which a [`TreeSequence`] is built.
///
/// Nodes, sites and mutations go straight into a [`tskit::TableCollection`]. Edges are buffered
/// so that edges with the same parent and child over adjacent intervals can be merged before
/// they are added.
pub struct TableCollection {
    tables: tskit::TableCollection,
    sequence_length: u64,
    edges: Vec<Edge>,
}

impl TableCollection {
    /// Creates empty tables for a genome of the given length.
    pub fn new(sequence_length: u64) -> Result<Self, TableError> {
        if sequence_length == 0 {
            return Err(TableError::ZeroSequenceLength);
        }

        Ok(Self {
            tables: tskit::TableCollection::new(sequence_length as f64)?,
            sequence_length,
            edges: Vec::new(),
        })
    }

    /// Creates tables holding the nodes, edges and populations of a tree sequence, without its
    /// sites and mutations.
    pub fn from_tree_sequence(ts: &TreeSequence) -> Result<Self, TableError> {
        let mut tables = ts.as_tskit().dump_tables()?;
        tables.set_sites(&tskit::OwningSiteTable::default())?;
        tables.set_mutations(&tskit::OwningMutationTable::default())?;

        Ok(Self {
            tables,
            sequence_length: ts.sequence_length(),
            edges: Vec::new(),
        })
    }

    /// Adds a named population, returning its id.
    pub fn add_population(&mut self, name: &str) -> Result<PopulationId, TableError> {
        Ok(self
            .tables
            .add_population_with_metadata(&PopulationName(name.to_string()))?)
    }

    /// Adds a node, returning its id.
    pub fn add_node(
        &mut self,
        time: f64,
        population: PopulationId,
        is_sample: bool,
    ) -> Result<NodeId, TableError> {
        let flags = if is_sample {
            NodeFlags::new_sample()
        } else {
            NodeFlags::default()
        };

        Ok(self
            .tables
            .add_node(flags, time, population, IndividualId::NULL)?)
    }

    /// Adds an edge.
    pub fn add_edge(&mut self, left: u64, right: u64, parent: NodeId, child: NodeId) {
        self.edges.push(Edge {
            left,
            right,
            parent,
            child,
        });
    }

    /// Adds a site, returning its id.
    pub fn add_site(&mut self, position: u64, ancestral_state: char) -> Result<SiteId, TableError> {
        let mut buffer = [0; 4];
        let state = ancestral_state.encode_utf8(&mut buffer);

        Ok(self
            .tables
            .add_site(position as f64, Some(state.as_bytes()))?)
    }

    /// Adds a mutation, returning its id.
    pub fn add_mutation(
        &mut self,
        site: SiteId,
        node: NodeId,
        time: f64,
        derived_state: char,
        parent: Option<MutationId>,
    ) -> Result<MutationId, TableError> {
        let mut buffer = [0; 4];
        let state = derived_state.encode_utf8(&mut buffer);

        Ok(self.tables.add_mutation(
            site,
            node,
            parent.unwrap_or(MutationId::NULL),
            time,
            Some(state.as_bytes()),
        )?)
    }

    /// Returns the number of nodes.
    pub fn num_nodes(&self) -> usize {
        self.tables.nodes().num_rows().as_usize()
    }

    /// Returns the sequence length.
    pub fn sequence_length(&self) -> u64 {
        self.sequence_length
    }

    /// Sorts and indexes the tables, building a tree sequence.
    ///
    /// Buffered edges with the same parent and child over adjacent intervals are merged first.
    /// Sites are then sorted by position, and mutations by site and from oldest to youngest.
    pub fn into_tree_sequence(mut self) -> Result<TreeSequence, TableError> {
        self.flush_edges()?;
        self.tables.full_sort(TableSortOptions::NONE)?;

        let inner = self
            .tables
            .tree_sequence(TreeSequenceFlags::BUILD_INDEXES)?;

        TreeSequence::new(inner, self.sequence_length)
    }

    fn flush_edges(&mut self) -> Result<(), TableError> {
        self.edges
            .sort_by(|a, b| (a.parent, a.child, a.left).cmp(&(b.parent, b.child, b.left)));

        let mut squashed: Vec<Edge> = Vec::with_capacity(self.edges.len());
        for edge in self.edges.drain(..) {
            match squashed.last_mut() {
                Some(last)
                    if last.parent == edge.parent
                        && last.child == edge.child
                        && last.right == edge.left =>
                {
                    last.right = edge.right;
                }
                _ => squashed.push(edge),
            }
        }

        for edge in squashed {
            self.tables.add_edge(
                edge.left as f64,
                edge.right as f64,
                edge.parent,
                edge.child,
            )?;
        }

        Ok(())
    }
}

/// An error associated with building a tree sequence from tables.
#[derive(Debug)]
pub enum TableError {
    /// The genome has length zero.
    ZeroSequenceLength,
    /// The tables were rejected by tskit.
    Tskit(TskitError),
}

impl fmt::Display for TableError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TableError::ZeroSequenceLength => write!(f, "sequence length must be positive"),
            TableError::Tskit(e) => write!(f, "invalid tables: {e}"),
        }
    }
}

impl Error for TableError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            TableError::ZeroSequenceLength => None,
            TableError::Tskit(e) => Some(e),
        }
    }
}

impl From<TskitError> for TableError {
    fn from(e: TskitError) -> Self {
        Self::Tskit(e)
    }
}
