//! CPF-Evidence: reference sources for the CPF housing advisor
//!
//! This crate owns everything between a user query and the cleaned text the
//! reasoning layers cite:
//!
//! - [`catalog`]: the category → URL reference catalog and lexical source
//!   selection
//! - [`fetcher`]: HTTP page retrieval behind the [`PageFetcher`] trait
//! - [`extract`]: main-content text extraction from HTML
//! - [`assembler`]: concurrent, deadline-bounded evidence gathering
//!
//! ## Layer 1 - Retrieval
//!
//! Focus: fetch failures are recovered here and never propagate upward.

pub mod assembler;
pub mod catalog;
pub mod error;
pub mod extract;
pub mod fakes;
pub mod fetcher;

pub use assembler::{
    clean_content, EvidenceAssembler, EvidenceRecord, FetchFailure, GatherConfig, GatherReport,
    DEFAULT_MAX_CONTENT_CHARS, TRUNCATION_MARKER,
};
pub use catalog::{
    select_urls, CatalogCategory, ReferenceCatalog, SourceSet, GENERAL_INFO, HOUSING_POLICIES,
};
pub use error::{CatalogError, FetchError, FetchResult};
pub use extract::extract_main_text;
pub use fetcher::{
    FetcherConfig, HttpFetcher, PageFetcher, DEFAULT_FETCH_TIMEOUT, DEFAULT_MAX_BODY_BYTES,
    DEFAULT_USER_AGENT,
};
