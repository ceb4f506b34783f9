//! GA4GH JSON-over-HTTP bindings for the pagination checker.
//!
//! Provides [`SearchPage`](paging_verify::SearchPage) implementations for the
//! reads and variant annotation search endpoints, a generic JSON search for any
//! other endpoint following the same paging convention, and resolvers that find
//! identifiers to search with.

pub mod client;
pub mod json;
pub mod models;
pub mod reads;
pub mod resolve;
pub mod variant_annotations;

pub use client::{Ga4ghClient, SearchRequest, DEFAULT_TIMEOUT};
pub use json::{JsonFilter, JsonRecord, JsonSearch};
pub use models::{
    CigarUnit, LinearAlignment, OntologyTerm, Position, ReadAlignment, ReadKey, TranscriptEffect,
    VariantAnnotation, VariantAnnotationKey,
};
pub use reads::{ReadsFilter, ReadsSearch, READS_SEARCH_PATH};
pub use resolve::{NamedRecord, Resolver};
pub use variant_annotations::{
    VariantAnnotationsFilter, VariantAnnotationsSearch, VARIANT_ANNOTATIONS_SEARCH_PATH,
};
