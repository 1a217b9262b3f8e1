//! User document schema
//!
//! Stores the chain account mapping, privilege level and the ordered list
//! of owned paper identifiers. Entries are appended on upload and never
//! removed.

use bson::{doc, oid::ObjectId, Document};
use mongodb::options::IndexOptions;
use serde::{Deserialize, Serialize};

use crate::db::mongo::{IntoIndexes, MutMetadata};
use crate::db::schemas::Metadata;

/// Collection name for users
pub const USER_COLLECTION: &str = "users";

/// User document stored in MongoDB
#[derive(Serialize, Deserialize, Clone, Debug, Default)]
pub struct UserDoc {
    /// MongoDB document ID
    #[serde(skip_serializing_if = "Option::is_none")]
    pub _id: Option<ObjectId>,

    /// Common metadata (created_at, updated_at)
    #[serde(default)]
    pub metadata: Metadata,

    /// Account email, the user identifier
    pub email: String,

    /// Chain account address (0x-prefixed)
    pub account: String,

    /// Privilege level; > 0 denotes an elevated reviewer/admin
    #[serde(default)]
    pub user_type: i32,

    /// Ordered owned-paper content identifiers
    #[serde(default)]
    pub papers: Vec<String>,
}

impl UserDoc {
    /// Create a new user document with standard privilege
    pub fn new(email: String, account: String) -> Self {
        Self {
            _id: None,
            metadata: Metadata::new(),
            email,
            account,
            user_type: 0,
            papers: Vec::new(),
        }
    }

    /// Whether this user holds elevated reviewer/admin privilege
    pub fn is_elevated(&self) -> bool {
        self.user_type > 0
    }
}

impl IntoIndexes for UserDoc {
    fn into_indices() -> Vec<(Document, Option<IndexOptions>)> {
        vec![
            // Unique index on email
            (
                doc! { "email": 1 },
                Some(
                    IndexOptions::builder()
                        .unique(true)
                        .name("email_unique".to_string())
                        .build(),
                ),
            ),
            // Index on account for reverse lookups
            (
                doc! { "account": 1 },
                Some(
                    IndexOptions::builder()
                        .name("account_index".to_string())
                        .build(),
                ),
            ),
        ]
    }
}

impl MutMetadata for UserDoc {
    fn mut_metadata(&mut self) -> &mut Metadata {
        &mut self.metadata
    }
}
