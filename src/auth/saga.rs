//! Sign-up after the provider account exists.
//!
//! ```text
//! ProviderCreated --create ok--> LocallyPersisted            (success)
//!        |
//!   create err
//!        v
//! LocalWriteFailed --no pool id----------> Failed(UserCreatedInCognitoButDbWriteFailed)
//!        |--------- delete ok -----------> Failed(UserRolledBackAfterDbWriteFailure)
//!        '--------- delete err ----------> Failed(DbWriteFailedAndRollbackFailed)
//! ```
//!
//! The compensating delete runs at most once and only after the profile write
//! was observed to fail.

use crate::{
    identity::{IdentityProvider, SignUpOutput},
    store::{NewUser, StoreError, UserProfile, UserStore},
};
use std::fmt;
use tracing::{error, info};

/// Terminal failure after the provider account was created.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SagaFailure {
    /// No admin pool configured; provider account left behind.
    UserCreatedInCognitoButDbWriteFailed,
    /// Provider account left behind; the delete was rejected.
    DbWriteFailedAndRollbackFailed,
    /// Provider account removed; the caller may retry sign-up.
    UserRolledBackAfterDbWriteFailure,
}

impl SagaFailure {
    #[must_use]
    pub const fn tag(self) -> &'static str {
        match self {
            Self::UserCreatedInCognitoButDbWriteFailed => "UserCreatedInCognitoButDbWriteFailed",
            Self::DbWriteFailedAndRollbackFailed => "DbWriteFailedAndRollbackFailed",
            Self::UserRolledBackAfterDbWriteFailure => "UserRolledBackAfterDbWriteFailure",
        }
    }

    /// Whether provider and store agree again (no operator action needed).
    #[must_use]
    pub const fn is_consistent(self) -> bool {
        matches!(self, Self::UserRolledBackAfterDbWriteFailure)
    }
}

impl fmt::Display for SagaFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

#[derive(Debug)]
enum SagaState {
    ProviderCreated(SignUpOutput),
    LocalWriteFailed(StoreError),
    LocallyPersisted {
        output: SignUpOutput,
        profile: UserProfile,
    },
    Failed(SagaFailure),
}

pub(super) struct SignUpSaga<'a> {
    pub(super) provider: &'a dyn IdentityProvider,
    pub(super) store: &'a dyn UserStore,
    pub(super) user_pool_id: Option<&'a str>,
    pub(super) email: &'a str,
    pub(super) full_name: &'a str,
}

impl SignUpSaga<'_> {
    /// Drive the saga from an accepted provider sign-up to a terminal state.
    pub(super) async fn run(
        &self,
        created: SignUpOutput,
    ) -> Result<(SignUpOutput, UserProfile), SagaFailure> {
        let mut state = SagaState::ProviderCreated(created);
        loop {
            state = match state {
                SagaState::LocallyPersisted { output, profile } => return Ok((output, profile)),
                SagaState::Failed(failure) => return Err(failure),
                SagaState::ProviderCreated(output) => self.persist(output).await,
                SagaState::LocalWriteFailed(err) => self.compensate(&err).await,
            };
        }
    }

    async fn persist(&self, output: SignUpOutput) -> SagaState {
        let new_user = NewUser {
            email: self.email.to_string(),
            full_name: self.full_name.to_string(),
        };
        match self.store.create(&new_user).await {
            Ok(profile) => SagaState::LocallyPersisted { output, profile },
            Err(err) => SagaState::LocalWriteFailed(err),
        }
    }

    async fn compensate(&self, write_error: &StoreError) -> SagaState {
        let Some(user_pool_id) = self.user_pool_id else {
            error!(
                email = self.email,
                error = %write_error,
                tag = SagaFailure::UserCreatedInCognitoButDbWriteFailed.tag(),
                "profile write failed and no user pool is configured for rollback; manual cleanup required"
            );
            return SagaState::Failed(SagaFailure::UserCreatedInCognitoButDbWriteFailed);
        };

        match self
            .provider
            .admin_delete_user(user_pool_id, self.email)
            .await
        {
            Ok(()) => {
                info!(
                    email = self.email,
                    error = %write_error,
                    tag = SagaFailure::UserRolledBackAfterDbWriteFailure.tag(),
                    "profile write failed; provider account rolled back"
                );
                SagaState::Failed(SagaFailure::UserRolledBackAfterDbWriteFailure)
            }
            Err(rollback_error) => {
                error!(
                    email = self.email,
                    error = %write_error,
                    rollback_error = %rollback_error,
                    tag = SagaFailure::DbWriteFailedAndRollbackFailed.tag(),
                    "profile write failed and provider rollback failed; manual cleanup required"
                );
                SagaState::Failed(SagaFailure::DbWriteFailedAndRollbackFailed)
            }
        }
    }
}
