// ABOUTME: DOM traversal, query and mutation over scraper's ego-tree backed documents.
// ABOUTME: Re-exports the predicate type and the query/mutation function families.

//! DOM utilities for HTML document inspection and manipulation.
//!
//! Every operation walks the tree once through [`traverse`]. Queries return
//! borrowed references in document order; mutations detach subtrees in place.

pub mod mutate;
pub mod predicate;
pub mod query;
pub mod traverse;

pub use predicate::{AttrFilter, Predicate, TagSet};
