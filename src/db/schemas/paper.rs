//! Paper document schema
//!
//! One record per uploaded paper, keyed by the content identifier the
//! content store assigned to the file bytes. On-chain state (status,
//! rating, reviewers) is never mirrored into this record.

use bson::{doc, oid::ObjectId, Document};
use mongodb::options::IndexOptions;
use serde::{Deserialize, Serialize};

use crate::db::mongo::{IntoIndexes, MutMetadata};
use crate::db::schemas::Metadata;

/// Collection name for papers
pub const PAPER_COLLECTION: &str = "papers";

/// Paper document stored in MongoDB
#[derive(Serialize, Deserialize, Clone, Debug, Default)]
pub struct PaperDoc {
    /// MongoDB document ID
    #[serde(skip_serializing_if = "Option::is_none")]
    pub _id: Option<ObjectId>,

    /// Common metadata (created_at, updated_at)
    #[serde(default)]
    pub metadata: Metadata,

    /// Content identifier assigned by the content store, immutable
    pub location: String,

    /// Paper title supplied at upload time
    pub title: String,
}

impl PaperDoc {
    /// Create a new paper document
    pub fn new(location: String, title: String) -> Self {
        Self {
            _id: None,
            metadata: Metadata::new(),
            location,
            title,
        }
    }
}

impl IntoIndexes for PaperDoc {
    fn into_indices() -> Vec<(Document, Option<IndexOptions>)> {
        vec![
            // Unique index on location: a duplicate insert must fail loudly
            (
                doc! { "location": 1 },
                Some(
                    IndexOptions::builder()
                        .unique(true)
                        .name("location_unique".to_string())
                        .build(),
                ),
            ),
        ]
    }
}

impl MutMetadata for PaperDoc {
    fn mut_metadata(&mut self) -> &mut Metadata {
        &mut self.metadata
    }
}
