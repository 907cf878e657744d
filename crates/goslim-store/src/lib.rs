//! # goslim-store
//!
//! Filesystem side of publication: rotating the currently published file
//! into its backup slot, then replacing it with the staged version.
//!
//! Every write goes through a temporary file in the destination directory
//! followed by a rename, so a reader of the published directory only ever
//! sees complete files.

mod archive;
mod atomic;
mod error;
mod publish;

pub use archive::{Rotation, rotate};
pub use error::StoreError;
pub use publish::{Replacement, artifact_name, publish, replace, replace_blocking};
