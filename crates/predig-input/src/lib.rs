//! predig-input — Schema Normalizer.
//!
//! Canonicalizes the three accepted submission shapes into a `Batch`:
//!   1. PAIR_CSV: a headered CSV of (epitope, allele) pairs
//!   2. PAIR_TEXT: free-text pairs, one per line
//!   3. PROTEIN_SCAN: one FASTA protein plus an allele list
//!
//! Column-name synonyms are resolved here, once; downstream components only
//! ever see the canonical vocabulary. All row-count, field-count and allele
//! grammar checks run before any external predictor is spawned.

pub mod scan;
pub mod synonyms;
pub mod tabular;

pub use scan::{expand_scan, parse_allele_list, parse_single_fasta, ProteinScan};
pub use tabular::{parse_pair_csv, parse_pair_text};
