//! Mutation confirmation gate - a shared-password check in front of every add, edit and delete.
//!
//! A requested mutation waits in the gate until someone supplies the password. On a match the
//! mutation is sent to the store exactly once; on a mismatch it is dropped and the store is
//! never contacted. Either way the gate ends up idle again.
//!
//! This is not access control. The password is a single static value known to every client
//! and it only guards against accidental changes. There is no lockout, no rate limiting and
//! no per-user identity.

use crate::{
    core::{NeedDraft, NeedPatch, ProductDraft, ProductPatch},
    errors::{ConfirmationError, Result},
    store::{Collection, Fields, RemoteStore},
};
use std::{collections::HashMap, fmt, hash::Hash, mem, sync::Arc};
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

/// The static shared password. Never printed.
#[derive(Clone, PartialEq, Eq)]
pub struct ConfirmationSecret(String);

impl ConfirmationSecret {
    /// Wraps the configured password
    #[must_use]
    pub fn new(secret: impl Into<String>) -> Self {
        Self(secret.into())
    }

    /// Exact, case-sensitive comparison
    #[must_use]
    pub fn matches(&self, candidate: &str) -> bool {
        self.0 == candidate
    }
}

impl fmt::Debug for ConfirmationSecret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("ConfirmationSecret(<redacted>)")
    }
}

/// Kind of change a mutation makes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MutationKind {
    /// Add a record
    Create,
    /// Edit a record
    Update,
    /// Remove a record
    Delete,
}

impl fmt::Display for MutationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Create => "add",
            Self::Update => "edit",
            Self::Delete => "delete",
        })
    }
}

/// A store write waiting for confirmation
#[derive(Debug, Clone, PartialEq)]
pub enum Mutation {
    /// Create a record with these fields
    Create {
        /// Target collection
        collection: Collection,
        /// Validated fields
        fields: Fields,
    },
    /// Merge fields into a record
    Update {
        /// Target collection
        collection: Collection,
        /// Record to edit
        id: String,
        /// Validated partial fields
        fields: Fields,
    },
    /// Remove a record
    Delete {
        /// Target collection
        collection: Collection,
        /// Record to remove
        id: String,
    },
}

impl Mutation {
    /// Validated product creation
    ///
    /// # Errors
    /// Returns `Error::Validation` if the draft is invalid.
    pub fn create_product(draft: ProductDraft) -> Result<Self> {
        Ok(Self::Create {
            collection: Collection::Products,
            fields: draft.into_fields()?,
        })
    }

    /// Validated product edit
    ///
    /// # Errors
    /// Returns `Error::Validation` if the patch is invalid or empty.
    pub fn update_product(id: impl Into<String>, patch: ProductPatch) -> Result<Self> {
        Ok(Self::Update {
            collection: Collection::Products,
            id: id.into(),
            fields: patch.into_fields()?,
        })
    }

    /// Product removal
    #[must_use]
    pub fn delete_product(id: impl Into<String>) -> Self {
        Self::Delete {
            collection: Collection::Products,
            id: id.into(),
        }
    }

    /// Validated need creation
    ///
    /// # Errors
    /// Returns `Error::Validation` if the draft is invalid.
    pub fn create_need(draft: NeedDraft) -> Result<Self> {
        Ok(Self::Create {
            collection: Collection::Needs,
            fields: draft.into_fields()?,
        })
    }

    /// Validated need edit
    ///
    /// # Errors
    /// Returns `Error::Validation` if the patch is invalid or empty.
    pub fn update_need(id: impl Into<String>, patch: NeedPatch) -> Result<Self> {
        Ok(Self::Update {
            collection: Collection::Needs,
            id: id.into(),
            fields: patch.into_fields()?,
        })
    }

    /// Need removal
    #[must_use]
    pub fn delete_need(id: impl Into<String>) -> Self {
        Self::Delete {
            collection: Collection::Needs,
            id: id.into(),
        }
    }

    /// What kind of change this is
    #[must_use]
    pub const fn kind(&self) -> MutationKind {
        match self {
            Self::Create { .. } => MutationKind::Create,
            Self::Update { .. } => MutationKind::Update,
            Self::Delete { .. } => MutationKind::Delete,
        }
    }

    /// Collection the change targets
    #[must_use]
    pub const fn collection(&self) -> Collection {
        match self {
            Self::Create { collection, .. }
            | Self::Update { collection, .. }
            | Self::Delete { collection, .. } => *collection,
        }
    }

    async fn apply<S: RemoteStore>(self, store: &S) -> Result<MutationOutcome> {
        match self {
            Self::Create { collection, fields } => {
                let id = store.create(collection, fields).await?;
                Ok(MutationOutcome::Created { collection, id })
            }
            Self::Update {
                collection,
                id,
                fields,
            } => {
                store.update(collection, &id, fields).await?;
                Ok(MutationOutcome::Updated { collection, id })
            }
            Self::Delete { collection, id } => {
                store.delete(collection, &id).await?;
                Ok(MutationOutcome::Deleted { collection, id })
            }
        }
    }
}

/// Result of a confirmed mutation
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MutationOutcome {
    /// A record was added under this id
    Created {
        /// Collection written to
        collection: Collection,
        /// New id
        id: String,
    },
    /// A record was edited
    Updated {
        /// Collection written to
        collection: Collection,
        /// Edited id
        id: String,
    },
    /// A record was removed (or was already gone)
    Deleted {
        /// Collection written to
        collection: Collection,
        /// Removed id
        id: String,
    },
}

/// A mutation parked in the gate together with what the requester was shown
#[derive(Debug, Clone, PartialEq)]
pub struct PendingConfirmation {
    /// The write to perform once confirmed
    pub mutation: Mutation,
    /// Human-readable target, usually the record's name
    pub context: String,
}

/// What the requester is asked to confirm
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfirmationPrompt {
    /// Kind of change
    pub action: MutationKind,
    /// Target collection
    pub collection: Collection,
    /// Human-readable target
    pub context: String,
}

/// Gate lifecycle
#[derive(Debug, Clone, PartialEq)]
pub enum GateState {
    /// Nothing pending
    Idle,
    /// A mutation waits for the password
    AwaitingConfirmation(PendingConfirmation),
    /// Password accepted, mutation being applied
    Confirmed,
    /// Password refused, mutation dropped
    Rejected,
}

impl GateState {
    const fn name(&self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::AwaitingConfirmation(_) => "awaiting_confirmation",
            Self::Confirmed => "confirmed",
            Self::Rejected => "rejected",
        }
    }
}

/// Shared-password check in front of a store.
pub struct ConfirmationGate<S: RemoteStore> {
    store: Arc<S>,
    secret: ConfirmationSecret,
    state: GateState,
}

impl<S: RemoteStore> ConfirmationGate<S> {
    /// Creates an idle gate in front of `store`.
    #[must_use]
    pub const fn new(store: Arc<S>, secret: ConfirmationSecret) -> Self {
        Self {
            store,
            secret,
            state: GateState::Idle,
        }
    }

    /// Current state
    #[must_use]
    pub const fn state(&self) -> &GateState {
        &self.state
    }

    /// The parked mutation, if any
    #[must_use]
    pub const fn pending(&self) -> Option<&PendingConfirmation> {
        match &self.state {
            GateState::AwaitingConfirmation(pending) => Some(pending),
            _ => None,
        }
    }

    fn transition(&mut self, next: GateState) -> GateState {
        debug!(from = self.state.name(), to = next.name(), "Gate transition");
        mem::replace(&mut self.state, next)
    }

    /// Parks `mutation` until [`ConfirmationGate::confirm`] is called.
    ///
    /// A request made while another is still waiting replaces it.
    pub fn request_confirmation(
        &mut self,
        mutation: Mutation,
        context: impl Into<String>,
    ) -> ConfirmationPrompt {
        let context = context.into();
        let prompt = ConfirmationPrompt {
            action: mutation.kind(),
            collection: mutation.collection(),
            context: context.clone(),
        };

        let previous = self.transition(GateState::AwaitingConfirmation(PendingConfirmation {
            mutation,
            context,
        }));
        if let GateState::AwaitingConfirmation(replaced) = previous {
            info!(
                action = %replaced.mutation.kind(),
                context = %replaced.context,
                "Pending confirmation replaced by a new request"
            );
        }
        prompt
    }

    /// Drops the parked mutation without touching the store.
    pub fn cancel(&mut self) -> Option<PendingConfirmation> {
        match self.transition(GateState::Idle) {
            GateState::AwaitingConfirmation(pending) => Some(pending),
            _ => None,
        }
    }

    /// Checks `secret` and, if it matches, applies the parked mutation.
    ///
    /// # Errors
    /// - `ConfirmationError::NothingPending` if no mutation is parked
    /// - `ConfirmationError::SecretMismatch` if the password is wrong; the store is not called
    /// - `Error::Store` if the confirmed write fails; it is not retried
    pub async fn confirm(&mut self, secret: &str) -> Result<MutationOutcome> {
        let GateState::AwaitingConfirmation(pending) = self.transition(GateState::Idle) else {
            return Err(ConfirmationError::NothingPending.into());
        };
        let action = pending.mutation.kind();

        if !self.secret.matches(secret) {
            self.transition(GateState::Rejected);
            warn!(%action, context = %pending.context, "Confirmation rejected");
            self.transition(GateState::Idle);
            return Err(ConfirmationError::SecretMismatch { action }.into());
        }

        self.transition(GateState::Confirmed);
        info!(%action, context = %pending.context, "Confirmation accepted");
        let outcome = pending.mutation.apply(self.store.as_ref()).await;
        self.transition(GateState::Idle);
        outcome
    }
}

impl<S: RemoteStore> fmt::Debug for ConfirmationGate<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConfirmationGate")
            .field("state", &self.state)
            .finish_non_exhaustive()
    }
}

/// One gate per requester, holding only requesters with a change waiting.
///
/// A gate leaves the map before its write runs, so one requester's slow write never holds up
/// another requester's request, confirm or cancel.
pub struct GateMap<K, S: RemoteStore> {
    store: Arc<S>,
    secret: ConfirmationSecret,
    gates: Mutex<HashMap<K, ConfirmationGate<S>>>,
}

impl<K: Eq + Hash, S: RemoteStore> GateMap<K, S> {
    /// Creates an empty map whose gates write to `store`.
    #[must_use]
    pub fn new(store: Arc<S>, secret: ConfirmationSecret) -> Self {
        Self {
            store,
            secret,
            gates: Mutex::new(HashMap::new()),
        }
    }

    /// Parks `mutation` in `requester`'s gate, replacing anything they had pending.
    pub async fn request_confirmation(
        &self,
        requester: K,
        mutation: Mutation,
        context: impl Into<String>,
    ) -> ConfirmationPrompt {
        let mut gates = self.gates.lock().await;
        gates
            .entry(requester)
            .or_insert_with(|| {
                ConfirmationGate::new(Arc::clone(&self.store), self.secret.clone())
            })
            .request_confirmation(mutation, context)
    }

    /// Confirms `requester`'s pending change with `secret`.
    ///
    /// # Errors
    /// See [`ConfirmationGate::confirm`].
    pub async fn confirm(&self, requester: &K, secret: &str) -> Result<MutationOutcome> {
        let gate = self.gates.lock().await.remove(requester);
        match gate {
            Some(mut gate) => gate.confirm(secret).await,
            None => Err(ConfirmationError::NothingPending.into()),
        }
    }

    /// Drops `requester`'s pending change, if any.
    pub async fn cancel(&self, requester: &K) -> Option<PendingConfirmation> {
        let gate = self.gates.lock().await.remove(requester);
        gate.and_then(|mut gate| gate.cancel())
    }

    /// Number of requesters with a change waiting
    pub async fn pending_count(&self) -> usize {
        self.gates.lock().await.len()
    }
}

impl<K, S: RemoteStore> fmt::Debug for GateMap<K, S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GateMap").finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;
    use crate::{
        core::{NeedStatus, Priority},
        errors::{Error, StoreError},
        store::RealtimeStore,
        test_utils::{
            RecordingStore, StoreCall, TEST_SECRET, init_test_tracing, setup_test_store,
        },
    };
    use std::time::Duration;
    use tokio::sync::Semaphore;

    fn gate(store: &Arc<RecordingStore>) -> ConfirmationGate<RecordingStore> {
        ConfirmationGate::new(Arc::clone(store), ConfirmationSecret::new(TEST_SECRET))
    }

    #[tokio::test]
    async fn test_wrong_secret_never_reaches_store() -> Result<()> {
        let store = Arc::new(RecordingStore::default());
        let mut gate = gate(&store);

        for mutation in [
            Mutation::create_product(ProductDraft::new("Gloves", 3))?,
            Mutation::update_need(
                "n1",
                NeedPatch {
                    quantity: Some(2),
                    ..NeedPatch::default()
                },
            )?,
            Mutation::delete_product("p1"),
        ] {
            let kind = mutation.kind();
            gate.request_confirmation(mutation, "target");
            let result = gate.confirm("wrong").await;
            assert!(matches!(
                result,
                Err(Error::Confirmation(ConfirmationError::SecretMismatch { action }))
                    if action == kind
            ));
            assert_eq!(*gate.state(), GateState::Idle);
        }

        assert!(store.calls().is_empty());
        Ok(())
    }

    #[tokio::test]
    async fn test_secret_is_case_sensitive() -> Result<()> {
        let store = Arc::new(RecordingStore::default());
        let mut gate =
            ConfirmationGate::new(Arc::clone(&store), ConfirmationSecret::new("Lab-Key"));

        gate.request_confirmation(Mutation::delete_need("n1"), "Gloves");
        assert!(gate.confirm("lab-key").await.is_err());
        assert!(store.calls().is_empty());
        Ok(())
    }

    #[tokio::test]
    async fn test_correct_secret_applies_exactly_once() -> Result<()> {
        let store = Arc::new(RecordingStore::default());
        let mut gate = gate(&store);

        let patch = NeedPatch {
            status: Some(NeedStatus::Received),
            priority: Some(Priority::Low),
            ..NeedPatch::default()
        };
        let mutation = Mutation::update_need("n7", patch)?;
        let expected_fields = match &mutation {
            Mutation::Update { fields, .. } => fields.clone(),
            _ => unreachable!(),
        };

        let prompt = gate.request_confirmation(mutation, "Pipette tips");
        assert_eq!(prompt.action, MutationKind::Update);
        assert_eq!(prompt.collection, Collection::Needs);
        assert_eq!(prompt.context, "Pipette tips");

        let outcome = gate.confirm(TEST_SECRET).await?;
        assert_eq!(
            outcome,
            MutationOutcome::Updated {
                collection: Collection::Needs,
                id: "n7".to_string()
            }
        );
        assert_eq!(
            store.calls(),
            vec![StoreCall::Update {
                collection: Collection::Needs,
                id: "n7".to_string(),
                fields: expected_fields,
            }]
        );

        // The gate is idle again; a second confirm has nothing to apply
        assert!(matches!(
            gate.confirm(TEST_SECRET).await,
            Err(Error::Confirmation(ConfirmationError::NothingPending))
        ));
        assert_eq!(store.calls().len(), 1);
        Ok(())
    }

    #[tokio::test]
    async fn test_new_request_replaces_pending_one() -> Result<()> {
        let store = Arc::new(RecordingStore::default());
        let mut gate = gate(&store);

        gate.request_confirmation(Mutation::delete_product("first"), "First");
        gate.request_confirmation(Mutation::delete_product("second"), "Second");
        assert_eq!(gate.pending().unwrap().context, "Second");

        gate.confirm(TEST_SECRET).await?;
        assert_eq!(
            store.calls(),
            vec![StoreCall::Delete {
                collection: Collection::Products,
                id: "second".to_string()
            }]
        );
        Ok(())
    }

    #[tokio::test]
    async fn test_cancel_drops_pending() -> Result<()> {
        let store = Arc::new(RecordingStore::default());
        let mut gate = gate(&store);

        assert!(gate.cancel().is_none());
        gate.request_confirmation(Mutation::delete_need("n1"), "Gloves");
        assert!(matches!(
            gate.state(),
            GateState::AwaitingConfirmation(pending) if pending.context == "Gloves"
        ));
        assert_eq!(gate.cancel().unwrap().context, "Gloves");
        assert_eq!(*gate.state(), GateState::Idle);
        assert!(gate.confirm(TEST_SECRET).await.is_err());
        assert!(store.calls().is_empty());
        Ok(())
    }

    #[tokio::test]
    async fn test_store_failure_surfaces_and_is_not_retried() -> Result<()> {
        let store = Arc::new(RecordingStore::failing());
        let mut gate = gate(&store);

        gate.request_confirmation(Mutation::create_need(NeedDraft::new("Gloves"))?, "Gloves");
        let result = gate.confirm(TEST_SECRET).await;

        assert!(matches!(result, Err(Error::Store(StoreError::Database(_)))));
        assert_eq!(store.calls().len(), 1);
        assert_eq!(*gate.state(), GateState::Idle);
        Ok(())
    }

    #[tokio::test]
    async fn test_confirmed_delete_against_realtime_store() -> Result<()> {
        init_test_tracing();
        let store = Arc::new(setup_test_store().await?);
        let mut gate: ConfirmationGate<RealtimeStore> =
            ConfirmationGate::new(Arc::clone(&store), ConfirmationSecret::new(TEST_SECRET));

        let create = Mutation::create_product(ProductDraft::new("Scale", 1))?;
        gate.request_confirmation(create, "Scale");
        let MutationOutcome::Created { id, .. } = gate.confirm(TEST_SECRET).await? else {
            panic!("expected a created outcome");
        };
        assert_eq!(store.snapshot(Collection::Products).await?.len(), 1);

        gate.request_confirmation(Mutation::delete_product(id.clone()), "Scale");
        assert!(gate.confirm("nope").await.is_err());
        assert_eq!(store.snapshot(Collection::Products).await?.len(), 1);

        gate.request_confirmation(Mutation::delete_product(id), "Scale");
        gate.confirm(TEST_SECRET).await?;
        assert!(store.snapshot(Collection::Products).await?.is_empty());
        Ok(())
    }

    #[test]
    fn test_secret_is_not_printed() {
        let secret = ConfirmationSecret::new("3395509");
        assert!(!format!("{secret:?}").contains("3395509"));
        assert!(secret.matches("3395509"));
    }

    #[tokio::test]
    async fn test_gate_map_forgets_settled_requesters() -> Result<()> {
        let store = Arc::new(RecordingStore::default());
        let gates = GateMap::new(Arc::clone(&store), ConfirmationSecret::new(TEST_SECRET));

        gates
            .request_confirmation(1_u64, Mutation::delete_product("a"), "A")
            .await;
        gates
            .request_confirmation(2_u64, Mutation::delete_product("b"), "B")
            .await;
        gates
            .request_confirmation(3_u64, Mutation::delete_product("c"), "C")
            .await;
        assert_eq!(gates.pending_count().await, 3);

        gates.confirm(&1, TEST_SECRET).await?;
        assert!(gates.confirm(&2, "wrong").await.is_err());
        assert_eq!(gates.cancel(&3).await.unwrap().context, "C");
        assert_eq!(gates.pending_count().await, 0);

        assert!(matches!(
            gates.confirm(&1, TEST_SECRET).await,
            Err(Error::Confirmation(ConfirmationError::NothingPending))
        ));
        assert_eq!(store.calls().len(), 1);
        Ok(())
    }

    #[tokio::test]
    async fn test_slow_write_does_not_block_other_requesters() -> Result<()> {
        let hold = Arc::new(Semaphore::new(0));
        let store = Arc::new(RecordingStore::held(Arc::clone(&hold)));
        let gates = Arc::new(GateMap::new(
            Arc::clone(&store),
            ConfirmationSecret::new(TEST_SECRET),
        ));

        gates
            .request_confirmation(1_u64, Mutation::delete_product("slow"), "Slow")
            .await;
        let slow = tokio::spawn({
            let gates = Arc::clone(&gates);
            async move { gates.confirm(&1, TEST_SECRET).await }
        });
        while store.waiting() == 0 {
            tokio::task::yield_now().await;
        }

        let other = tokio::time::timeout(Duration::from_secs(1), async {
            gates
                .request_confirmation(2_u64, Mutation::delete_need("n1"), "Gloves")
                .await;
            gates.cancel(&2).await
        })
        .await;
        assert!(matches!(other, Ok(Some(pending)) if pending.context == "Gloves"));
        assert!(!slow.is_finished());

        hold.add_permits(1);
        let outcome = slow.await.unwrap()?;
        assert_eq!(
            outcome,
            MutationOutcome::Deleted {
                collection: Collection::Products,
                id: "slow".to_string()
            }
        );
        assert_eq!(gates.pending_count().await, 0);
        Ok(())
    }
}
