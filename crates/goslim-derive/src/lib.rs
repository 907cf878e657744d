//! # goslim-derive
//!
//! Derives the files a refresh run publishes from the fetched annotation
//! set:
//! - [`EvidenceFilter`] writes the published annotation set and the
//!   further-filtered mapper input
//! - [`SlimDeriver`] runs the external mapping tool once per slim aspect

mod error;
mod filter;
mod mapper;

pub use error::DeriveError;
pub use filter::{Disposition, EvidenceFilter, FilterStats, count_records};
pub use mapper::{Derivation, DerivationResult, MapperCommand, SlimDeriver};
