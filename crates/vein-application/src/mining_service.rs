//! Mining use case.
//!
//! `MiningService` orchestrates the session registry, the accrual engine
//! and the account store behind the three operations every surface (bot,
//! HTTP API) exposes: start, stop and status.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;

use vein_core::account::{AccountRepository, AccountStatus};
use vein_core::accrual::AccrualEngine;
use vein_core::error::{Result, VeinError};
use vein_core::session::{SessionRegistry, SubjectId};

/// Result of a start request.
#[derive(Debug, Clone, Serialize)]
pub struct StartOutcome {
    /// `false` when a session was already open for this subject; the
    /// request is then a no-op, not an error.
    pub started: bool,
    pub mining_power: f64,
    pub base_rate_per_minute: f64,
}

/// Final report of a stopped session.
#[derive(Debug, Clone, Serialize)]
pub struct StopSummary {
    pub identity: String,
    pub duration_minutes: f64,
    pub session_earned: f64,
    pub total_mined: f64,
}

/// Snapshot of an account's mining state.
#[derive(Debug, Clone, Serialize)]
pub struct MiningStatus {
    pub is_active: bool,
    pub mining_power: f64,
    pub total_mined: f64,
    /// Earnings of the open session including the not-yet-credited tail,
    /// estimated the same way reconciliation would credit it. Zero when no
    /// session is open.
    pub session_earned: f64,
    pub account_status: AccountStatus,
}

pub struct MiningService {
    registry: Arc<SessionRegistry>,
    engine: Arc<AccrualEngine>,
    repository: Arc<dyn AccountRepository>,
}

impl MiningService {
    pub fn new(
        registry: Arc<SessionRegistry>,
        engine: Arc<AccrualEngine>,
        repository: Arc<dyn AccountRepository>,
    ) -> Self {
        Self {
            registry,
            engine,
            repository,
        }
    }

    pub fn registry(&self) -> &Arc<SessionRegistry> {
        &self.registry
    }

    /// Opens a mining session for `subject_id`, creating the account on
    /// first contact.
    ///
    /// # Errors
    ///
    /// - `InvalidInput` if `identity` is empty (rejected before any side
    ///   effect) or the account has been deactivated
    /// - store errors from account lookup/creation
    pub async fn start(&self, subject_id: SubjectId, identity: &str) -> Result<StartOutcome> {
        self.start_at(subject_id, identity, Utc::now()).await
    }

    pub async fn start_at(
        &self,
        subject_id: SubjectId,
        identity: &str,
        now: DateTime<Utc>,
    ) -> Result<StartOutcome> {
        if identity.is_empty() {
            return Err(VeinError::invalid_input(
                "an identity is required to start mining",
            ));
        }

        let account = match self.repository.find_by_identity(identity).await? {
            Some(account) => {
                if !account.is_active() {
                    return Err(VeinError::invalid_input(format!(
                        "account '{identity}' is deactivated"
                    )));
                }
                self.repository.touch(identity).await?
            }
            None => {
                self.repository
                    .create(vein_core::account::Account::new(identity, now))
                    .await?
            }
        };

        let started = self
            .registry
            .start(subject_id.clone(), identity, account.mining_power, now)
            .await;
        if started {
            tracing::info!(%subject_id, identity, power = account.mining_power, "mining session started");
        }

        Ok(StartOutcome {
            started,
            mining_power: account.mining_power,
            base_rate_per_minute: self.engine.base_rate(),
        })
    }

    /// Stops the subject's session after one final reconciliation, so no
    /// earned time between the last periodic tick and the stop is lost.
    ///
    /// Returns `None` when no session is open. If the final reconciliation
    /// fails the session is kept registered and the error surfaced; the
    /// elapsed interval stays intact for the retry.
    pub async fn stop(&self, subject_id: &SubjectId) -> Result<Option<StopSummary>> {
        self.stop_at(subject_id, Utc::now()).await
    }

    pub async fn stop_at(
        &self,
        subject_id: &SubjectId,
        now: DateTime<Utc>,
    ) -> Result<Option<StopSummary>> {
        let Some(handle) = self.registry.get(subject_id).await else {
            return Ok(None);
        };

        let mut session = handle.lock().await;
        self.engine.reconcile_at(&mut session, now).await?;

        // Only a fully reconciled session leaves the registry. A racing
        // stop may have removed it already; that racer produced the
        // summary, so this call reports no session.
        if self.registry.end(subject_id).await.is_none() {
            return Ok(None);
        }

        let account = self
            .repository
            .find_by_identity(&session.identity)
            .await?
            .ok_or_else(|| VeinError::not_found("account", session.identity.clone()))?;

        let summary = StopSummary {
            identity: session.identity.clone(),
            duration_minutes: session.duration_minutes(now),
            session_earned: session.session_earned,
            total_mined: account.total_mined,
        };
        tracing::info!(
            %subject_id,
            identity = %summary.identity,
            duration_minutes = summary.duration_minutes,
            earned = summary.session_earned,
            "mining session stopped"
        );
        Ok(Some(summary))
    }

    /// Reports the account's mining state. A pure read: nothing is
    /// credited or rewound.
    ///
    /// # Errors
    ///
    /// `NotFound` if the account does not exist (status requests do not
    /// create accounts implicitly).
    pub async fn status(&self, subject_id: &SubjectId, identity: &str) -> Result<MiningStatus> {
        self.status_at(subject_id, identity, Utc::now()).await
    }

    pub async fn status_at(
        &self,
        subject_id: &SubjectId,
        identity: &str,
        now: DateTime<Utc>,
    ) -> Result<MiningStatus> {
        let account = self
            .repository
            .find_by_identity(identity)
            .await?
            .ok_or_else(|| VeinError::not_found("account", identity))?;

        let session_earned = match self.registry.get(subject_id).await {
            Some(handle) => {
                let session = handle.lock().await;
                session.session_earned + self.engine.preview_at(&session, now)
            }
            None => 0.0,
        };

        Ok(MiningStatus {
            is_active: self.registry.is_active(subject_id).await,
            mining_power: account.mining_power,
            total_mined: account.total_mined,
            session_earned,
            account_status: account.status,
        })
    }
}
