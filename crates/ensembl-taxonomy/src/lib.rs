//! Ensembl NCBI Taxonomy Library
//!
//! Models and queries for NCBI taxonomy databases, where the taxonomy tree is
//! stored with a nested-set encoding (`left_index`/`right_index` interval
//! bounds) on top of an adjacency list (`parent_id`), so ancestor and
//! descendant lookups never need a recursive traversal.
//!
//! # Example
//!
//! ```no_run
//! use ensembl_db::DbConnection;
//! use ensembl_taxonomy::Taxonomy;
//!
//! # async fn demo() -> Result<(), Box<dyn std::error::Error>> {
//! let dbc = DbConnection::connect("mysql://user@mysql-host:4242/ncbi_taxonomy").await?;
//! // Get the last common ancestor of dog and mouse
//! let dog = Taxonomy::fetch_taxon_by_species_name(dbc.pool(), "canis_lupus_familiaris").await?;
//! let mouse = Taxonomy::fetch_taxon_by_species_name(dbc.pool(), "mus_musculus").await?;
//! let ancestor = Taxonomy::last_common_ancestor(dbc.pool(), dog.taxon_id, mouse.taxon_id).await?;
//! # Ok(())
//! # }
//! ```

pub mod api;
pub mod error;
pub mod models;

// Re-export commonly used types
pub use api::Taxonomy;
pub use error::{TaxonomyError, TaxonomyResult};
pub use models::{TaxaName, TaxaNode, Taxon};
