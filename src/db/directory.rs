//! Directory - the metadata store seam used by the workflow service
//!
//! `Directory` is the narrow contract the workflow service needs from the
//! document database; `MongoDirectory` is the production implementation.
//! Tests substitute an in-memory double.

use async_trait::async_trait;
use bson::doc;
use tracing::debug;

use crate::db::mongo::{MongoClient, MongoCollection};
use crate::db::schemas::{PaperDoc, UserDoc, PAPER_COLLECTION, USER_COLLECTION};
use crate::types::{GatewayError, Result};

/// Paper and user record access
#[async_trait]
pub trait Directory: Send + Sync {
    /// Look up a user by email
    async fn find_user(&self, email: &str) -> Result<Option<UserDoc>>;

    /// Persist an updated user record (matched by email)
    async fn save_user(&self, user: &UserDoc) -> Result<()>;

    /// Insert a paper record; fails with `DuplicatePaper` if the location
    /// is already present
    async fn insert_paper(&self, paper: PaperDoc) -> Result<()>;

    /// Look up a paper by content identifier
    async fn find_paper(&self, location: &str) -> Result<Option<PaperDoc>>;

    /// Every paper record, in the store's natural order
    async fn all_papers(&self) -> Result<Vec<PaperDoc>>;

    /// Paper records whose location is in the given set
    async fn papers_in(&self, locations: &[String]) -> Result<Vec<PaperDoc>>;
}

/// MongoDB-backed directory
#[derive(Clone)]
pub struct MongoDirectory {
    papers: MongoCollection<PaperDoc>,
    users: MongoCollection<UserDoc>,
}

impl MongoDirectory {
    /// Open the paper and user collections and apply their indexes
    pub async fn new(client: &MongoClient) -> Result<Self> {
        let papers = client.collection::<PaperDoc>(PAPER_COLLECTION).await?;
        let users = client.collection::<UserDoc>(USER_COLLECTION).await?;

        Ok(Self { papers, users })
    }
}

#[async_trait]
impl Directory for MongoDirectory {
    async fn find_user(&self, email: &str) -> Result<Option<UserDoc>> {
        self.users.find_one(doc! { "email": email }).await
    }

    async fn save_user(&self, user: &UserDoc) -> Result<()> {
        self.users
            .replace_one(doc! { "email": &user.email }, user.clone())
            .await
    }

    async fn insert_paper(&self, paper: PaperDoc) -> Result<()> {
        let location = paper.location.clone();

        // Pre-read keeps the duplicate error deterministic; the unique index
        // on location is the backstop when two uploads race.
        if self.find_paper(&location).await?.is_some() {
            return Err(GatewayError::DuplicatePaper(location));
        }

        debug!(location = %location, "Inserting paper metadata record");

        self.papers.insert_one(paper).await.map_err(|e| match e {
            GatewayError::Database(msg) if msg.starts_with("duplicate key") => {
                GatewayError::DuplicatePaper(location)
            }
            other => other,
        })
    }

    async fn find_paper(&self, location: &str) -> Result<Option<PaperDoc>> {
        self.papers.find_one(doc! { "location": location }).await
    }

    async fn all_papers(&self) -> Result<Vec<PaperDoc>> {
        self.papers.find_many(doc! {}).await
    }

    async fn papers_in(&self, locations: &[String]) -> Result<Vec<PaperDoc>> {
        self.papers
            .find_many(doc! { "location": { "$in": locations } })
            .await
    }
}
