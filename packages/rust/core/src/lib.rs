//! Core pipeline orchestration and content derivation for KeywordForge.
//!
//! This crate ties normalization, clustering, and storage together into
//! end-to-end operations (`ingest`, `group`, `generate_outlines`,
//! `refine_latest`, `history`) and holds the two pure content transforms:
//! outline synthesis and outline refinement.

pub mod pipeline;
pub mod refine;
pub mod synthesis;
