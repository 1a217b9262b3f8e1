//! Workflow services

pub mod paper;

pub use paper::{EnrichedPaper, PaperDetails, PaperService, REVIEW_REWARD, SUBMISSION_REWARD};
