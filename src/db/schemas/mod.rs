//! Database schemas for Papergate
//!
//! Defines MongoDB document structures for papers and users.

mod metadata;
mod paper;
mod user;

pub use metadata::Metadata;
pub use paper::{PaperDoc, PAPER_COLLECTION};
pub use user::{UserDoc, USER_COLLECTION};
