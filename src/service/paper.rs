//! Paper workflow service
//!
//! Orchestrates the content store, the ledger and the metadata directory
//! for the submission, listing, detail and review use cases. Every
//! unlock/act/lock sequence holds the per-account slot from before the
//! unlock until after the re-lock, and the re-lock runs on every exit
//! path once the unlock has succeeded.

use serde::Serialize;
use std::sync::Arc;
use tracing::{info, warn};

use crate::db::schemas::PaperDoc;
use crate::db::Directory;
use crate::ledger::{AccountLocks, PaperLedger};
use crate::store::ContentStore;
use crate::types::{GatewayError, Result};

/// Units credited to the collection account per submission
pub const SUBMISSION_REWARD: u64 = 100;

/// Units credited to the collection account per rating update
pub const REVIEW_REWARD: u64 = 10;

/// Paper record enriched with on-chain review state, as listed to users
#[derive(Debug, Clone, Serialize)]
pub struct EnrichedPaper {
    pub location: String,
    pub title: String,
    pub status: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rating: Option<u64>,
}

/// Full aggregate for one paper: metadata plus on-chain state
#[derive(Debug, Clone, Serialize)]
pub struct PaperDetails {
    /// Public gateway URL for the stored content
    pub location: String,
    pub title: String,
    pub owner: String,
    pub author: String,
    pub status: bool,
    pub rating: u64,
    pub reviewers: Vec<String>,
}

/// Orchestrates submission, listing, details and review operations
pub struct PaperService {
    directory: Arc<dyn Directory>,
    store: Arc<dyn ContentStore>,
    ledger: Arc<dyn PaperLedger>,
    accounts: AccountLocks,
    coinbase: String,
    coinbase_password: String,
}

impl PaperService {
    pub fn new(
        directory: Arc<dyn Directory>,
        store: Arc<dyn ContentStore>,
        ledger: Arc<dyn PaperLedger>,
        coinbase: String,
        coinbase_password: String,
    ) -> Self {
        Self {
            directory,
            store,
            ledger,
            accounts: AccountLocks::new(),
            coinbase,
            coinbase_password,
        }
    }

    /// Submit a paper: store the bytes, record metadata, register on-chain.
    ///
    /// The duplicate check runs before any ledger interaction. The content
    /// blob and the metadata record are not rolled back if a later step
    /// fails; callers must tolerate the orphans.
    ///
    /// Returns the submitter's full owned-paper identifier list.
    pub async fn submit_paper(
        &self,
        email: &str,
        account: &str,
        password: &str,
        title: String,
        file: Vec<u8>,
    ) -> Result<Vec<String>> {
        let mut user = self
            .directory
            .find_user(email)
            .await?
            .ok_or_else(|| GatewayError::UserNotFound(email.to_string()))?;

        let content_id = self.store.add(file).await?;
        info!(email = %email, cid = %content_id, "Stored paper content");

        self.directory
            .insert_paper(PaperDoc::new(content_id.clone(), title))
            .await?;

        user.papers.push(content_id.clone());

        {
            let _slot = self.accounts.acquire(account).await;
            self.ledger.unlock_account(account, password).await?;

            let outcome = self.register_on_ledger(account, &content_id).await;
            self.relock(account).await;
            outcome?;
        }

        self.directory.save_user(&user).await?;
        info!(email = %email, cid = %content_id, "Paper submitted");

        Ok(user.papers)
    }

    async fn register_on_ledger(&self, account: &str, content_id: &str) -> Result<()> {
        self.ledger
            .transfer(account, &self.coinbase, SUBMISSION_REWARD)
            .await?;
        self.ledger.create_paper(account, content_id).await
    }

    /// List papers for a user.
    ///
    /// Elevated users see every paper still pending review, regardless of
    /// ownership. Standard users see their own papers with status, plus
    /// rating once reviewed. A single failing on-chain query aborts the
    /// whole batch.
    pub async fn list_papers(&self, email: &str) -> Result<Vec<EnrichedPaper>> {
        let user = self
            .directory
            .find_user(email)
            .await?
            .ok_or_else(|| GatewayError::UserNotFound(email.to_string()))?;

        let mut result = Vec::new();

        if user.is_elevated() {
            for paper in self.directory.all_papers().await? {
                if !self.ledger.status_of(&paper.location).await? {
                    result.push(EnrichedPaper {
                        location: paper.location,
                        title: paper.title,
                        status: false,
                        rating: None,
                    });
                }
            }
        } else {
            for paper in self.directory.papers_in(&user.papers).await? {
                let status = self.ledger.status_of(&paper.location).await?;
                let rating = if status {
                    Some(self.ledger.rating_of(&paper.location).await?)
                } else {
                    None
                };
                result.push(EnrichedPaper {
                    location: paper.location,
                    title: paper.title,
                    status,
                    rating,
                });
            }
        }

        Ok(result)
    }

    /// Aggregate metadata and on-chain state for one paper.
    ///
    /// The six lookups are independent and run concurrently. Any failing
    /// lookup fails the whole operation; an unknown identifier never
    /// yields a partially-populated record.
    pub async fn paper_details(&self, content_id: &str) -> Result<PaperDetails> {
        let (paper, owner, author, status, rating, reviewers) = tokio::join!(
            self.directory.find_paper(content_id),
            self.ledger.owner_of(content_id),
            self.ledger.author_of(content_id),
            self.ledger.status_of(content_id),
            self.ledger.rating_of(content_id),
            self.ledger.reviewers_of(content_id),
        );

        let status = status?;
        let paper = paper?.ok_or_else(|| {
            GatewayError::LookupFailed(format!("no paper record for {}", content_id))
        })?;

        Ok(PaperDetails {
            location: self.store.public_url(content_id),
            title: paper.title,
            owner: owner?,
            author: author?,
            status,
            rating: rating?,
            reviewers: reviewers?,
        })
    }

    /// Add the calling account as a reviewer of a paper.
    ///
    /// Returns the paper's resulting status flag.
    pub async fn add_reviewer(
        &self,
        content_id: &str,
        account: &str,
        password: &str,
    ) -> Result<bool> {
        let _slot = self.accounts.acquire(account).await;
        self.ledger.unlock_account(account, password).await?;

        let outcome = self.ledger.add_reviewer(account, content_id, account).await;
        self.relock(account).await;

        let status = outcome?;
        info!(cid = %content_id, reviewer = %account, "Reviewer added");
        Ok(status)
    }

    /// Update a paper's rating.
    ///
    /// The reviewer pays the review reward from their own account, which is
    /// re-locked; the rating write itself is charged to the collection
    /// account. The collection account stays unlocked after the write,
    /// matching the legacy flow.
    pub async fn update_rating(
        &self,
        content_id: &str,
        account: &str,
        rating: u64,
        password: &str,
    ) -> Result<()> {
        {
            let _slot = self.accounts.acquire(account).await;
            self.ledger.unlock_account(account, password).await?;

            let outcome = self
                .ledger
                .transfer(account, &self.coinbase, REVIEW_REWARD)
                .await;
            self.relock(account).await;
            outcome?;
        }

        let _slot = self.accounts.acquire(&self.coinbase).await;
        self.ledger
            .unlock_account(&self.coinbase, &self.coinbase_password)
            .await?;
        self.ledger
            .set_rating(&self.coinbase, content_id, rating)
            .await?;

        info!(cid = %content_id, rating, "Rating updated");
        Ok(())
    }

    /// Best-effort re-lock; runs on every exit path after a successful
    /// unlock. A failure here leaves the account unlocked on the node, so
    /// it is logged loudly but does not mask the operation's own outcome.
    async fn relock(&self, account: &str) {
        if let Err(e) = self.ledger.lock_account(account).await {
            warn!(account = %account, error = %e, "Failed to re-lock account");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::schemas::UserDoc;
    use async_trait::async_trait;
    use sha3::{Digest, Keccak256};
    use std::collections::{HashMap, HashSet};
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
    use std::sync::Mutex;

    const COINBASE: &str = "0xc01nbase";
    const COINBASE_PWD: &str = "vault";

    #[derive(Default)]
    struct MemoryDirectory {
        users: Mutex<HashMap<String, UserDoc>>,
        papers: Mutex<Vec<PaperDoc>>,
    }

    impl MemoryDirectory {
        fn with_user(self, email: &str, account: &str, user_type: i32) -> Self {
            let mut user = UserDoc::new(email.to_string(), account.to_string());
            user.user_type = user_type;
            self.users.lock().unwrap().insert(email.to_string(), user);
            self
        }
    }

    #[async_trait]
    impl Directory for MemoryDirectory {
        async fn find_user(&self, email: &str) -> Result<Option<UserDoc>> {
            Ok(self.users.lock().unwrap().get(email).cloned())
        }

        async fn save_user(&self, user: &UserDoc) -> Result<()> {
            self.users
                .lock()
                .unwrap()
                .insert(user.email.clone(), user.clone());
            Ok(())
        }

        async fn insert_paper(&self, paper: PaperDoc) -> Result<()> {
            let mut papers = self.papers.lock().unwrap();
            if papers.iter().any(|p| p.location == paper.location) {
                return Err(GatewayError::DuplicatePaper(paper.location));
            }
            papers.push(paper);
            Ok(())
        }

        async fn find_paper(&self, location: &str) -> Result<Option<PaperDoc>> {
            Ok(self
                .papers
                .lock()
                .unwrap()
                .iter()
                .find(|p| p.location == location)
                .cloned())
        }

        async fn all_papers(&self) -> Result<Vec<PaperDoc>> {
            Ok(self.papers.lock().unwrap().clone())
        }

        async fn papers_in(&self, locations: &[String]) -> Result<Vec<PaperDoc>> {
            Ok(self
                .papers
                .lock()
                .unwrap()
                .iter()
                .filter(|p| locations.contains(&p.location))
                .cloned()
                .collect())
        }
    }

    /// Content-addressed: identical bytes get identical identifiers
    struct MemoryStore;

    #[async_trait]
    impl ContentStore for MemoryStore {
        async fn add(&self, bytes: Vec<u8>) -> Result<String> {
            let digest = Keccak256::digest(&bytes);
            Ok(format!("Qm{}", hex::encode(&digest[..8])))
        }

        fn public_url(&self, content_id: &str) -> String {
            format!("http://localhost:8080/ipfs/{}", content_id)
        }
    }

    #[derive(Clone, Default)]
    struct ChainPaper {
        author: String,
        owner: String,
        status: bool,
        rating: u64,
        reviewers: Vec<String>,
    }

    #[derive(Default)]
    struct MemoryLedger {
        papers: Mutex<HashMap<String, ChainPaper>>,
        unlocked: Mutex<HashSet<String>>,
        create_calls: AtomicUsize,
        transfer_calls: AtomicUsize,
        fail_create: AtomicBool,
    }

    impl MemoryLedger {
        fn require_unlocked(&self, account: &str) -> Result<()> {
            if self.unlocked.lock().unwrap().contains(account) {
                Ok(())
            } else {
                Err(GatewayError::LedgerRejected(format!(
                    "account {} is locked",
                    account
                )))
            }
        }

        fn is_unlocked(&self, account: &str) -> bool {
            self.unlocked.lock().unwrap().contains(account)
        }
    }

    #[async_trait]
    impl PaperLedger for MemoryLedger {
        async fn unlock_account(&self, account: &str, password: &str) -> Result<()> {
            if password == "wrong" {
                return Err(GatewayError::AuthenticationRejected(account.to_string()));
            }
            self.unlocked.lock().unwrap().insert(account.to_string());
            Ok(())
        }

        async fn lock_account(&self, account: &str) -> Result<()> {
            self.unlocked.lock().unwrap().remove(account);
            Ok(())
        }

        async fn transfer(&self, from: &str, _to: &str, _amount: u64) -> Result<()> {
            self.require_unlocked(from)
                .map_err(|_| GatewayError::TransferFailed(format!("{} is locked", from)))?;
            self.transfer_calls.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }

        async fn create_paper(&self, from: &str, content_id: &str) -> Result<()> {
            self.require_unlocked(from)?;
            self.create_calls.fetch_add(1, Ordering::SeqCst);
            if self.fail_create.load(Ordering::SeqCst) {
                return Err(GatewayError::LedgerRejected("out of gas".to_string()));
            }
            self.papers.lock().unwrap().insert(
                content_id.to_string(),
                ChainPaper {
                    author: from.to_string(),
                    owner: from.to_string(),
                    ..Default::default()
                },
            );
            Ok(())
        }

        async fn author_of(&self, content_id: &str) -> Result<String> {
            self.with_paper(content_id, |p| p.author.clone()).await
        }

        async fn owner_of(&self, content_id: &str) -> Result<String> {
            self.with_paper(content_id, |p| p.owner.clone()).await
        }

        async fn status_of(&self, content_id: &str) -> Result<bool> {
            self.with_paper(content_id, |p| p.status).await
        }

        async fn rating_of(&self, content_id: &str) -> Result<u64> {
            self.with_paper(content_id, |p| p.rating).await
        }

        async fn reviewers_of(&self, content_id: &str) -> Result<Vec<String>> {
            self.with_paper(content_id, |p| p.reviewers.clone()).await
        }

        async fn add_reviewer(&self, from: &str, content_id: &str, reviewer: &str) -> Result<bool> {
            self.require_unlocked(from)?;
            let mut papers = self.papers.lock().unwrap();
            let paper = papers
                .get_mut(content_id)
                .ok_or_else(|| GatewayError::LedgerRejected("unknown paper".to_string()))?;
            paper.reviewers.push(reviewer.to_string());
            Ok(paper.status)
        }

        async fn set_rating(&self, from: &str, content_id: &str, rating: u64) -> Result<()> {
            self.require_unlocked(from)?;
            let mut papers = self.papers.lock().unwrap();
            let paper = papers
                .get_mut(content_id)
                .ok_or_else(|| GatewayError::LedgerRejected("unknown paper".to_string()))?;
            paper.rating = rating;
            paper.status = true;
            Ok(())
        }
    }

    impl MemoryLedger {
        async fn with_paper<T>(
            &self,
            content_id: &str,
            f: impl FnOnce(&ChainPaper) -> T,
        ) -> Result<T> {
            self.papers
                .lock()
                .unwrap()
                .get(content_id)
                .map(f)
                .ok_or_else(|| GatewayError::LookupFailed(format!("no paper {}", content_id)))
        }
    }

    struct Harness {
        service: PaperService,
        ledger: Arc<MemoryLedger>,
        directory: Arc<MemoryDirectory>,
    }

    fn harness(directory: MemoryDirectory) -> Harness {
        let directory = Arc::new(directory);
        let ledger = Arc::new(MemoryLedger::default());
        let service = PaperService::new(
            Arc::clone(&directory) as Arc<dyn Directory>,
            Arc::new(MemoryStore),
            Arc::clone(&ledger) as Arc<dyn PaperLedger>,
            COINBASE.to_string(),
            COINBASE_PWD.to_string(),
        );
        Harness {
            service,
            ledger,
            directory,
        }
    }

    #[tokio::test]
    async fn submission_registers_paper_and_tracks_ownership() {
        let h = harness(MemoryDirectory::default().with_user("a@x.com", "0xA1", 0));

        let papers = h
            .service
            .submit_paper("a@x.com", "0xA1", "pw", "Paper One".into(), b"hello".to_vec())
            .await
            .unwrap();

        assert_eq!(papers.len(), 1);
        let cid = &papers[0];

        // owned-paper list persisted with the new id exactly once
        let user = h.directory.find_user("a@x.com").await.unwrap().unwrap();
        assert_eq!(user.papers.iter().filter(|p| *p == cid).count(), 1);

        // metadata record exists with the title
        let paper = h.directory.find_paper(cid).await.unwrap().unwrap();
        assert_eq!(paper.title, "Paper One");

        // registered on-chain, pending review, account re-locked
        let details = h.service.paper_details(cid).await.unwrap();
        assert!(!details.status);
        assert_eq!(details.owner, "0xA1");
        assert!(!h.ledger.is_unlocked("0xA1"));
    }

    #[tokio::test]
    async fn duplicate_content_is_rejected_before_any_ledger_call() {
        let h = harness(
            MemoryDirectory::default()
                .with_user("a@x.com", "0xA1", 0)
                .with_user("b@x.com", "0xB2", 0),
        );

        h.service
            .submit_paper("a@x.com", "0xA1", "pw", "Paper One".into(), b"hello".to_vec())
            .await
            .unwrap();

        // byte-identical content from a different user
        let err = h
            .service
            .submit_paper("b@x.com", "0xB2", "pw", "Copy".into(), b"hello".to_vec())
            .await
            .unwrap_err();

        assert!(matches!(err, GatewayError::DuplicatePaper(_)));
        // only the first submission reached the ledger
        assert_eq!(h.ledger.create_calls.load(Ordering::SeqCst), 1);
        assert_eq!(h.ledger.transfer_calls.load(Ordering::SeqCst), 1);

        // the second user's record is untouched
        let user = h.directory.find_user("b@x.com").await.unwrap().unwrap();
        assert!(user.papers.is_empty());
    }

    #[tokio::test]
    async fn unknown_user_cannot_submit() {
        let h = harness(MemoryDirectory::default());

        let err = h
            .service
            .submit_paper("ghost@x.com", "0xA1", "pw", "T".into(), b"x".to_vec())
            .await
            .unwrap_err();

        assert!(matches!(err, GatewayError::UserNotFound(_)));
    }

    #[tokio::test]
    async fn account_is_relocked_when_ledger_rejects_creation() {
        let h = harness(MemoryDirectory::default().with_user("a@x.com", "0xA1", 0));
        h.ledger.fail_create.store(true, Ordering::SeqCst);

        let err = h
            .service
            .submit_paper("a@x.com", "0xA1", "pw", "T".into(), b"hello".to_vec())
            .await
            .unwrap_err();

        assert!(matches!(err, GatewayError::LedgerRejected(_)));
        assert!(!h.ledger.is_unlocked("0xA1"));

        // the ownership append was not persisted
        let user = h.directory.find_user("a@x.com").await.unwrap().unwrap();
        assert!(user.papers.is_empty());
    }

    #[tokio::test]
    async fn rejected_credential_stops_before_transfer() {
        let h = harness(MemoryDirectory::default().with_user("a@x.com", "0xA1", 0));

        let err = h
            .service
            .submit_paper("a@x.com", "0xA1", "wrong", "T".into(), b"hello".to_vec())
            .await
            .unwrap_err();

        assert!(matches!(err, GatewayError::AuthenticationRejected(_)));
        assert_eq!(h.ledger.transfer_calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn standard_listing_only_shows_own_papers() {
        let h = harness(
            MemoryDirectory::default()
                .with_user("a@x.com", "0xA1", 0)
                .with_user("b@x.com", "0xB2", 0),
        );

        h.service
            .submit_paper("a@x.com", "0xA1", "pw", "Mine".into(), b"alpha".to_vec())
            .await
            .unwrap();
        h.service
            .submit_paper("b@x.com", "0xB2", "pw", "Theirs".into(), b"beta".to_vec())
            .await
            .unwrap();

        let listed = h.service.list_papers("a@x.com").await.unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].title, "Mine");
        assert!(!listed[0].status);
        assert!(listed[0].rating.is_none());
    }

    #[tokio::test]
    async fn elevated_listing_is_exactly_the_pending_set() {
        let h = harness(
            MemoryDirectory::default()
                .with_user("a@x.com", "0xA1", 0)
                .with_user("r@x.com", "0xR1", 1),
        );

        let submitted = h
            .service
            .submit_paper("a@x.com", "0xA1", "pw", "One".into(), b"alpha".to_vec())
            .await
            .unwrap();
        h.service
            .submit_paper("a@x.com", "0xA1", "pw", "Two".into(), b"beta".to_vec())
            .await
            .unwrap();

        // close out the first paper
        h.service
            .update_rating(&submitted[0], "0xR1", 4, "pw")
            .await
            .unwrap();

        let queue = h.service.list_papers("r@x.com").await.unwrap();
        assert_eq!(queue.len(), 1);
        assert_eq!(queue[0].title, "Two");
    }

    #[tokio::test]
    async fn reviewed_papers_carry_their_rating_for_owners() {
        let h = harness(
            MemoryDirectory::default()
                .with_user("a@x.com", "0xA1", 0)
                .with_user("r@x.com", "0xR1", 1),
        );

        let submitted = h
            .service
            .submit_paper("a@x.com", "0xA1", "pw", "One".into(), b"alpha".to_vec())
            .await
            .unwrap();
        h.service
            .update_rating(&submitted[0], "0xR1", 4, "pw")
            .await
            .unwrap();

        let listed = h.service.list_papers("a@x.com").await.unwrap();
        assert_eq!(listed.len(), 1);
        assert!(listed[0].status);
        assert_eq!(listed[0].rating, Some(4));
    }

    #[tokio::test]
    async fn details_for_unknown_identifier_fail() {
        let h = harness(MemoryDirectory::default().with_user("a@x.com", "0xA1", 0));

        let err = h.service.paper_details("QmNope").await.unwrap_err();
        assert!(matches!(err, GatewayError::LookupFailed(_)));
    }

    #[tokio::test]
    async fn rating_update_is_visible_on_next_detail_query() {
        let h = harness(
            MemoryDirectory::default()
                .with_user("a@x.com", "0xA1", 0)
                .with_user("r@x.com", "0xR1", 1),
        );

        let submitted = h
            .service
            .submit_paper("a@x.com", "0xA1", "pw", "One".into(), b"hello".to_vec())
            .await
            .unwrap();

        h.service
            .update_rating(&submitted[0], "0xR1", 4, "pw")
            .await
            .unwrap();

        let details = h.service.paper_details(&submitted[0]).await.unwrap();
        assert_eq!(details.rating, 4);

        // reviewer account re-locked; collection account deliberately not
        assert!(!h.ledger.is_unlocked("0xR1"));
        assert!(h.ledger.is_unlocked(COINBASE));
    }

    #[tokio::test]
    async fn add_reviewer_relocks_and_reports_status() {
        let h = harness(
            MemoryDirectory::default()
                .with_user("a@x.com", "0xA1", 0)
                .with_user("r@x.com", "0xR1", 1),
        );

        let submitted = h
            .service
            .submit_paper("a@x.com", "0xA1", "pw", "One".into(), b"hello".to_vec())
            .await
            .unwrap();

        let status = h
            .service
            .add_reviewer(&submitted[0], "0xR1", "pw")
            .await
            .unwrap();

        assert!(!status);
        assert!(!h.ledger.is_unlocked("0xR1"));
        let details = h.service.paper_details(&submitted[0]).await.unwrap();
        assert_eq!(details.reviewers, vec!["0xR1".to_string()]);
    }
}
