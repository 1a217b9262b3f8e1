//! MongoDB metadata store

pub mod directory;
pub mod mongo;
pub mod schemas;

pub use directory::{Directory, MongoDirectory};
pub use mongo::{IntoIndexes, MongoClient, MongoCollection, MutMetadata};
pub use schemas::{Metadata, PaperDoc, UserDoc, PAPER_COLLECTION, USER_COLLECTION};
