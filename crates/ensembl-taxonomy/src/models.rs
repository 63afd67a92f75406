//! NCBI taxonomy database models.
//!
//! The schema is the classic `ncbi_taxa_node`/`ncbi_taxa_name` pair: nodes
//! carry the tree structure (adjacency list plus nested-set indexes), names
//! attach one or more classified labels to each node.

use sqlx::FromRow;

/// A row of `ncbi_taxa_node`: one node of the taxonomy tree.
///
/// `left_index` and `right_index` are the nested-set bounds; every
/// descendant's interval is strictly contained in its ancestors' intervals.
#[derive(Debug, Clone, PartialEq, Eq, FromRow)]
pub struct TaxaNode {
    pub taxon_id: i64,
    pub parent_id: i64,
    pub rank: String,
    pub genbank_hidden_flag: i64,
    pub left_index: i64,
    pub right_index: i64,
    pub root_id: i64,
}

impl TaxaNode {
    /// Number of descendants below this node, straight from the nested-set
    /// interval width.
    pub fn num_descendants(&self) -> i64 {
        (self.right_index - self.left_index - 1) / 2
    }
}

/// A row of `ncbi_taxa_name`: one classified name for a node.
#[derive(Debug, Clone, PartialEq, Eq, FromRow)]
pub struct TaxaName {
    pub taxon_id: i64,
    pub name: String,
    pub name_class: String,
}

/// A taxonomy node joined with one of its names.
#[derive(Debug, Clone, PartialEq, Eq, FromRow)]
pub struct Taxon {
    pub taxon_id: i64,
    pub name: String,
    pub name_class: String,
    pub parent_id: i64,
    pub rank: String,
    pub genbank_hidden_flag: i64,
    pub left_index: i64,
    pub right_index: i64,
    pub root_id: i64,
}
