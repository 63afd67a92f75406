//! Taxonomy query API.
//!
//! A set of queries over an NCBI taxonomy database. Tree navigation relies on
//! the nested-set encoding: a node A is an ancestor of B exactly when
//! `A.left_index < B.left_index && B.right_index < A.right_index`, so
//! ancestor chains and subtree sizes come from interval arithmetic instead of
//! recursive walks.

use sqlx::AnyPool;
use tracing::debug;

use crate::error::{TaxonomyError, TaxonomyResult};
use crate::models::{TaxaNode, Taxon};

/// Columns of a node joined with one classified name
const TAXON_COLUMNS: &str = "node.taxon_id AS taxon_id, name.name AS name, \
     name.name_class AS name_class, node.parent_id AS parent_id, \
     node.`rank` AS `rank`, node.genbank_hidden_flag AS genbank_hidden_flag, \
     node.left_index AS left_index, node.right_index AS right_index, \
     node.root_id AS root_id";

/// Taxonomy queries over the `ncbi_taxa_node`/`ncbi_taxa_name` tables.
pub struct Taxonomy;

impl Taxonomy {
    /// Taxonomy node (with one of its names) by `taxon_id`.
    pub async fn fetch_node_by_id(pool: &AnyPool, taxon_id: i64) -> TaxonomyResult<Taxon> {
        let sql = format!(
            "SELECT {TAXON_COLUMNS} \
             FROM ncbi_taxa_node AS node \
             JOIN ncbi_taxa_name AS name ON node.taxon_id = name.taxon_id \
             WHERE node.taxon_id = ? LIMIT 1"
        );
        sqlx::query_as::<_, Taxon>(&sql)
            .bind(taxon_id)
            .fetch_optional(pool)
            .await?
            .ok_or(TaxonomyError::NoResultFound)
    }

    /// First taxonomy node matching the given species name.
    ///
    /// Underscores are normalised to spaces and the match ignores case, so
    /// production names such as `canis_lupus_familiaris` match their
    /// scientific name on every backend.
    pub async fn fetch_taxon_by_species_name(pool: &AnyPool, name: &str) -> TaxonomyResult<Taxon> {
        let species_name = name.replace('_', " ");
        let sql = format!(
            "SELECT {TAXON_COLUMNS} \
             FROM ncbi_taxa_node AS node \
             JOIN ncbi_taxa_name AS name ON node.taxon_id = name.taxon_id \
             WHERE LOWER(name.name) = LOWER(?) \
             AND name.name_class = 'scientific name' LIMIT 1"
        );
        sqlx::query_as::<_, Taxon>(&sql)
            .bind(species_name)
            .fetch_optional(pool)
            .await?
            .ok_or(TaxonomyError::NoResultFound)
    }

    /// Parent node of `taxon_id`, with its scientific name.
    ///
    /// The root node has no parent, so looking its parent up is an error.
    pub async fn parent(pool: &AnyPool, taxon_id: i64) -> TaxonomyResult<Taxon> {
        let sql = format!(
            "SELECT {TAXON_COLUMNS} \
             FROM ncbi_taxa_node AS child \
             JOIN ncbi_taxa_node AS node ON child.parent_id = node.taxon_id \
             JOIN ncbi_taxa_name AS name ON node.taxon_id = name.taxon_id \
             WHERE child.taxon_id = ? AND name.name_class = 'scientific name' LIMIT 1"
        );
        sqlx::query_as::<_, Taxon>(&sql)
            .bind(taxon_id)
            .fetch_optional(pool)
            .await?
            .ok_or(TaxonomyError::NoResultFound)
    }

    /// Direct children of `taxon_id` with their scientific names, in tree
    /// order. A node without children is an error, like a missing node.
    pub async fn children(pool: &AnyPool, taxon_id: i64) -> TaxonomyResult<Vec<Taxon>> {
        let sql = format!(
            "SELECT {TAXON_COLUMNS} \
             FROM ncbi_taxa_node AS node \
             JOIN ncbi_taxa_name AS name ON node.taxon_id = name.taxon_id \
             WHERE node.parent_id = ? AND name.name_class = 'scientific name' \
             ORDER BY node.left_index"
        );
        let children = sqlx::query_as::<_, Taxon>(&sql)
            .bind(taxon_id)
            .fetch_all(pool)
            .await?;
        if children.is_empty() {
            return Err(TaxonomyError::NoResultFound);
        }
        Ok(children)
    }

    /// Whether `taxon_id` is the root of its tree.
    pub async fn is_root(pool: &AnyPool, taxon_id: i64) -> TaxonomyResult<bool> {
        let row =
            sqlx::query("SELECT 1 FROM ncbi_taxa_node WHERE taxon_id = ? AND root_id = taxon_id")
                .bind(taxon_id)
                .fetch_optional(pool)
                .await?;
        Ok(row.is_some())
    }

    /// Number of descendants below `taxon_id`.
    pub async fn num_descendants(pool: &AnyPool, taxon_id: i64) -> TaxonomyResult<i64> {
        let node = sqlx::query_as::<_, TaxaNode>(
            "SELECT taxon_id, parent_id, `rank`, genbank_hidden_flag, \
                    left_index, right_index, root_id \
             FROM ncbi_taxa_node WHERE taxon_id = ?",
        )
        .bind(taxon_id)
        .fetch_optional(pool)
        .await?
        .ok_or(TaxonomyError::NoResultFound)?;
        Ok(node.num_descendants())
    }

    /// Whether `taxon_id` is a leaf of the tree.
    pub async fn is_leaf(pool: &AnyPool, taxon_id: i64) -> TaxonomyResult<bool> {
        Ok(Self::num_descendants(pool, taxon_id).await? == 0)
    }

    /// All ancestor nodes of `taxon_id`, ordered by `taxon_id`.
    ///
    /// Uses the nested-set containment query: ancestors are exactly the nodes
    /// whose interval strictly contains this node's `left_index`.
    pub async fn fetch_ancestors(pool: &AnyPool, taxon_id: i64) -> TaxonomyResult<Vec<TaxaNode>> {
        let ancestors = sqlx::query_as::<_, TaxaNode>(
            "SELECT anc.taxon_id AS taxon_id, anc.parent_id AS parent_id, \
                    anc.`rank` AS `rank`, anc.genbank_hidden_flag AS genbank_hidden_flag, \
                    anc.left_index AS left_index, anc.right_index AS right_index, \
                    anc.root_id AS root_id \
             FROM ncbi_taxa_node AS anc \
             JOIN ncbi_taxa_node AS node \
               ON node.left_index > anc.left_index AND node.left_index < anc.right_index \
             WHERE node.taxon_id = ? \
             ORDER BY anc.taxon_id",
        )
        .bind(taxon_id)
        .fetch_all(pool)
        .await?;
        if ancestors.is_empty() {
            return Err(TaxonomyError::NoResultFound);
        }
        Ok(ancestors)
    }

    /// All common ancestors of two taxa, ordered from the root down to the
    /// most recent one.
    pub async fn all_common_ancestors(
        pool: &AnyPool,
        taxon_id_1: i64,
        taxon_id_2: i64,
    ) -> TaxonomyResult<Vec<Taxon>> {
        let ancestors_1 = Self::fetch_ancestors(pool, taxon_id_1).await?;
        let ancestors_2 = Self::fetch_ancestors(pool, taxon_id_2).await?;

        let mut common: Vec<&TaxaNode> = ancestors_1
            .iter()
            .filter(|node| ancestors_2.iter().any(|other| other.taxon_id == node.taxon_id))
            .collect();
        if common.is_empty() {
            return Err(TaxonomyError::NoResultFound);
        }
        // Root first: wider nested-set intervals mean more descendants
        common.sort_by_key(|node| (-node.num_descendants(), node.taxon_id));
        debug!(taxon_id_1, taxon_id_2, count = common.len(), "Common ancestors found");

        let mut results = Vec::with_capacity(common.len());
        for node in common {
            results.push(Self::fetch_node_by_id(pool, node.taxon_id).await?);
        }
        Ok(results)
    }

    /// Most recent common ancestor shared between two taxa.
    pub async fn last_common_ancestor(
        pool: &AnyPool,
        taxon_id_1: i64,
        taxon_id_2: i64,
    ) -> TaxonomyResult<Taxon> {
        let mut common = Self::all_common_ancestors(pool, taxon_id_1, taxon_id_2).await?;
        common.pop().ok_or(TaxonomyError::NoResultFound)
    }
}
