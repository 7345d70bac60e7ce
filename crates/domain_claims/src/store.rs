//! Claim store
//!
//! Keeps every claim in an in-memory index backed by a [`KeyValueStore`].
//! The full claim set lives under one key as a JSON array; each write
//! replaces it wholesale. With a zero flush interval a mutation is staged on
//! a copy of the index and only committed once storage accepts it, so a
//! failed write leaves the index untouched. Otherwise mutations update the
//! index, mark it dirty, and are written back by [`ClaimStore::flush`] or the
//! background flush task.
//!
//! There is no conflict detection: concurrent edits to the same claim are
//! applied in lock order and the last write wins.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::Utc;
use tokio::sync::RwLock;
use tokio::task::JoinHandle;

use core_kernel::{ClaimId, KeyValueStore, NotificationPort, UserId};
use domain_estimate::{DamageAssessment, Estimate, Photo, VehicleUpdate};

use crate::claim::{Claim, ClaimStatus, ReviewDecision};
use crate::error::ClaimError;
use crate::insurance::{InsuranceInfo, InsuranceInfoStatus};
use crate::user::{User, UserRole};
use crate::workflow::notifications_for_status;

/// Storage key holding the serialized claim list
pub const CLAIMS_KEY: &str = "claims";

/// Cache and write-back settings
#[derive(Debug, Clone)]
pub struct StoreConfig {
    /// How long a clean index is trusted before it is re-read from storage
    pub cache_ttl: Duration,
    /// Write-back period; zero writes through on every mutation
    pub flush_interval: Duration,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            cache_ttl: Duration::from_secs(30),
            flush_interval: Duration::ZERO,
        }
    }
}

#[derive(Debug, Default)]
struct StoreState {
    index: HashMap<ClaimId, Claim>,
    loaded_at: Option<Instant>,
    dirty: bool,
    active_claims: HashMap<UserId, ClaimId>,
}

pub struct ClaimStore {
    storage: Arc<dyn KeyValueStore>,
    notifier: Option<Arc<dyn NotificationPort>>,
    config: StoreConfig,
    state: RwLock<StoreState>,
}

impl ClaimStore {
    pub fn new(storage: Arc<dyn KeyValueStore>, config: StoreConfig) -> Self {
        Self {
            storage,
            notifier: None,
            config,
            state: RwLock::new(StoreState::default()),
        }
    }

    /// Sends status-change notifications through `notifier`
    pub fn with_notifier(mut self, notifier: Arc<dyn NotificationPort>) -> Self {
        self.notifier = Some(notifier);
        self
    }

    pub fn config(&self) -> &StoreConfig {
        &self.config
    }

    /// Reloads the index when it is clean and older than the cache TTL
    ///
    /// A failed first load leaves an empty index; a failed reload keeps the
    /// current one. Both are logged, neither is returned to the caller.
    async fn ensure_loaded(&self, state: &mut StoreState) {
        let fresh = state
            .loaded_at
            .map(|at| at.elapsed() < self.config.cache_ttl)
            .unwrap_or(false);
        if state.dirty || fresh {
            return;
        }

        match self.read_all().await {
            Ok(claims) => {
                tracing::debug!(count = claims.len(), "Claim index loaded");
                state.index = claims.into_iter().map(|c| (c.id, c)).collect();
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to load claims; keeping current index");
            }
        }
        state.loaded_at = Some(Instant::now());
    }

    async fn read_all(&self) -> Result<Vec<Claim>, ClaimError> {
        match self.storage.get(CLAIMS_KEY).await? {
            Some(bytes) if !bytes.is_empty() => Ok(serde_json::from_slice(&bytes)?),
            _ => Ok(Vec::new()),
        }
    }

    async fn write_all(&self, index: &HashMap<ClaimId, Claim>) -> Result<(), ClaimError> {
        let mut claims: Vec<&Claim> = index.values().collect();
        claims.sort_by_key(|c| (c.created_at, c.id));
        let bytes = serde_json::to_vec(&claims)?;

        if let Err(e) = self.storage.set(CLAIMS_KEY, bytes).await {
            tracing::error!(error = %e, "Failed to save claims");
            return Err(e.into());
        }
        tracing::debug!(count = claims.len(), "Claim index written");
        Ok(())
    }

    /// Applies `change` to the index
    ///
    /// Write-through: the change is made on a copy that replaces the index
    /// only after it is stored. Write-back: the index changes in place and is
    /// marked dirty.
    async fn commit<F>(&self, state: &mut StoreState, change: F) -> Result<(), ClaimError>
    where
        F: FnOnce(&mut HashMap<ClaimId, Claim>),
    {
        if !self.config.flush_interval.is_zero() {
            change(&mut state.index);
            state.dirty = true;
            return Ok(());
        }

        let mut staged = state.index.clone();
        change(&mut staged);
        self.write_all(&staged).await?;
        state.index = staged;
        state.loaded_at = Some(Instant::now());
        Ok(())
    }

    /// Writes the index to storage if it has unsaved changes
    pub async fn flush(&self) -> Result<(), ClaimError> {
        let mut state = self.state.write().await;
        if state.dirty {
            self.write_all(&state.index).await?;
            state.dirty = false;
            state.loaded_at = Some(Instant::now());
        }
        Ok(())
    }

    /// Flushes on a fixed period until the store is dropped by every other owner
    ///
    /// Does nothing when the flush interval is zero.
    pub fn spawn_flush_task(self: &Arc<Self>) -> Option<JoinHandle<()>> {
        if self.config.flush_interval.is_zero() {
            return None;
        }
        let store = Arc::downgrade(self);
        let period = self.config.flush_interval;

        Some(tokio::spawn(async move {
            let mut ticker = tokio::time::interval(period);
            loop {
                ticker.tick().await;
                let Some(store) = store.upgrade() else {
                    break;
                };
                if let Err(e) = store.flush().await {
                    tracing::error!(error = %e, "Background claim flush failed");
                }
            }
        }))
    }

    /// Applies `f` to a claim, persists and notifies on status change
    async fn mutate<F>(&self, claim_id: ClaimId, f: F) -> Result<Claim, ClaimError>
    where
        F: FnOnce(&mut Claim) -> Result<(), ClaimError>,
    {
        let mut state = self.state.write().await;
        self.ensure_loaded(&mut state).await;

        let mut updated = state
            .index
            .get(&claim_id)
            .cloned()
            .ok_or_else(|| ClaimError::not_found(claim_id))?;
        let before = updated.status;
        f(&mut updated)?;

        let staged = updated.clone();
        self.commit(&mut state, move |index| {
            index.insert(claim_id, staged);
        })
        .await?;
        drop(state);

        if updated.status != before {
            tracing::info!(
                claim_id = %claim_id,
                from = before.as_str(),
                to = updated.status.as_str(),
                "Claim status changed"
            );
            self.notify_status(&updated).await;
        }
        Ok(updated)
    }

    async fn notify_status(&self, claim: &Claim) {
        let Some(notifier) = &self.notifier else {
            return;
        };
        for notification in notifications_for_status(claim, claim.status) {
            if let Err(e) = notifier.dispatch(notification).await {
                tracing::warn!(claim_id = %claim.id, error = %e, "Failed to dispatch claim notification");
            }
        }
    }

    /// Creates a draft claim and makes it the user's active claim
    ///
    /// # Errors
    ///
    /// `Unauthenticated` when no user is signed in.
    pub async fn create_claim(&self, user: Option<&User>) -> Result<Claim, ClaimError> {
        let user = user.ok_or(ClaimError::Unauthenticated)?;
        let claim = Claim::new(user, Utc::now());

        let mut state = self.state.write().await;
        self.ensure_loaded(&mut state).await;
        let staged = claim.clone();
        self.commit(&mut state, move |index| {
            index.insert(staged.id, staged);
        })
        .await?;
        state.active_claims.insert(user.id, claim.id);

        tracing::info!(claim_id = %claim.id, user_id = %user.id, role = user.role.as_str(), "Claim created");
        Ok(claim)
    }

    pub async fn add_vehicle(&self, claim_id: ClaimId, vehicle: VehicleUpdate) -> Result<Claim, ClaimError> {
        self.mutate(claim_id, |claim| {
            claim.update_vehicle(vehicle, Utc::now());
            Ok(())
        })
        .await
    }

    pub async fn add_photos(&self, claim_id: ClaimId, photos: Vec<Photo>) -> Result<Claim, ClaimError> {
        self.mutate(claim_id, |claim| {
            claim.add_photos(photos, Utc::now());
            Ok(())
        })
        .await
    }

    /// Moves the claim to `analyzing` while the damage analyzer runs
    pub async fn mark_analyzing(&self, claim_id: ClaimId) -> Result<Claim, ClaimError> {
        self.mutate(claim_id, |claim| claim.start_analysis(Utc::now())).await
    }

    /// Stores the assessment with its derived pre-estimate; the claim becomes pending review
    pub async fn set_damage_assessment(
        &self,
        claim_id: ClaimId,
        assessment: DamageAssessment,
    ) -> Result<Claim, ClaimError> {
        self.mutate(claim_id, |claim| {
            claim.set_damage_assessment(assessment, Utc::now());
            Ok(())
        })
        .await
    }

    pub async fn set_estimate(&self, claim_id: ClaimId, estimate: Estimate) -> Result<Claim, ClaimError> {
        self.mutate(claim_id, |claim| {
            claim.set_estimate(estimate, Utc::now());
            Ok(())
        })
        .await
    }

    /// Submits the claim for review
    ///
    /// A body-shop submission also locks the insurance info, once; later
    /// resubmissions leave the original lock time in place.
    pub async fn submit_claim(&self, claim_id: ClaimId, submitter: &User) -> Result<Claim, ClaimError> {
        let mut locked = false;
        let claim = self
            .mutate(claim_id, |claim| {
                let now = Utc::now();
                claim.submit(now);
                if submitter.role == UserRole::BodyShop && !claim.is_insurance_locked() {
                    claim.lock_insurance_info(now)?;
                    locked = true;
                }
                Ok(())
            })
            .await?;

        if locked {
            tracing::info!(claim_id = %claim_id, submitter = %submitter.id, "Insurance info locked at submission");
        }
        Ok(claim)
    }

    /// Records an adjuster decision on a pending claim
    ///
    /// # Errors
    ///
    /// `Forbidden` unless `reviewer` is an adjuster; `InvalidStatusTransition`
    /// unless the claim is pending review.
    pub async fn review_claim(
        &self,
        claim_id: ClaimId,
        decision: ReviewDecision,
        reviewer: &User,
        fraud_score: Option<u8>,
    ) -> Result<Claim, ClaimError> {
        if !reviewer.is_adjuster() {
            return Err(ClaimError::forbidden("only adjusters can review claims"));
        }
        self.mutate(claim_id, |claim| {
            claim.review(&decision, reviewer.id, fraud_score, Utc::now())
        })
        .await
    }

    /// Replaces insurance info and returns the derived status
    pub async fn update_insurance_info(
        &self,
        claim_id: ClaimId,
        info: InsuranceInfo,
        editor: &User,
    ) -> Result<InsuranceInfoStatus, ClaimError> {
        let result = self
            .mutate(claim_id, |claim| {
                claim.update_insurance_info(info, editor.id, Utc::now()).map(|_| ())
            })
            .await;

        match result {
            Ok(claim) => Ok(claim.insurance_info_status),
            Err(ClaimError::Locked(id)) => {
                tracing::warn!(claim_id = %id, editor = %editor.id, "Rejected edit of locked insurance info");
                Err(ClaimError::Locked(id))
            }
            Err(e) => Err(e),
        }
    }

    pub async fn flag_insurance_info(&self, claim_id: ClaimId, flags: Vec<String>) -> Result<Claim, ClaimError> {
        self.mutate(claim_id, |claim| {
            claim.flag_insurance_info(flags, Utc::now());
            Ok(())
        })
        .await
    }

    pub async fn lock_insurance_info(&self, claim_id: ClaimId) -> Result<Claim, ClaimError> {
        self.mutate(claim_id, |claim| claim.lock_insurance_info(Utc::now())).await
    }

    /// Removes a claim permanently and clears any active-claim pointer to it
    pub async fn delete_claim(&self, claim_id: ClaimId) -> Result<(), ClaimError> {
        let mut state = self.state.write().await;
        self.ensure_loaded(&mut state).await;

        if !state.index.contains_key(&claim_id) {
            return Err(ClaimError::not_found(claim_id));
        }
        self.commit(&mut state, |index| {
            index.remove(&claim_id);
        })
        .await?;
        state.active_claims.retain(|_, active| *active != claim_id);

        tracing::info!(claim_id = %claim_id, "Claim deleted");
        Ok(())
    }

    pub async fn get_claim(&self, claim_id: ClaimId) -> Result<Claim, ClaimError> {
        let mut state = self.state.write().await;
        self.ensure_loaded(&mut state).await;
        state
            .index
            .get(&claim_id)
            .cloned()
            .ok_or_else(|| ClaimError::not_found(claim_id))
    }

    /// Claims visible to `user`, newest first
    pub async fn list_claims(&self, user: &User) -> Vec<Claim> {
        let mut state = self.state.write().await;
        self.ensure_loaded(&mut state).await;

        let mut claims: Vec<Claim> = state
            .index
            .values()
            .filter(|c| c.is_visible_to(user))
            .cloned()
            .collect();
        claims.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        claims
    }

    pub async fn active_claim(&self, user: &User) -> Option<Claim> {
        let mut state = self.state.write().await;
        self.ensure_loaded(&mut state).await;
        let id = state.active_claims.get(&user.id)?;
        state.index.get(id).cloned()
    }

    pub async fn set_active_claim(&self, user: &User, claim_id: ClaimId) -> Result<(), ClaimError> {
        let mut state = self.state.write().await;
        self.ensure_loaded(&mut state).await;
        if !state.index.contains_key(&claim_id) {
            return Err(ClaimError::not_found(claim_id));
        }
        state.active_claims.insert(user.id, claim_id);
        Ok(())
    }

    /// Claims with the given status, oldest first
    pub async fn claims_with_status(&self, status: ClaimStatus) -> Vec<Claim> {
        let mut state = self.state.write().await;
        self.ensure_loaded(&mut state).await;

        let mut claims: Vec<Claim> = state
            .index
            .values()
            .filter(|c| c.status == status)
            .cloned()
            .collect();
        claims.sort_by_key(|c| c.created_at);
        claims
    }
}
