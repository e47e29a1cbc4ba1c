//! Remote list synchronizer.
//!
//! Keeps a filter-scoped list (exercises of one muscle group) consistent with
//! the selected filter:
//! - the filter values are fetched once per mount
//! - every item fetch carries a request id; only the latest id may write state
//! - the loading flag is raised before the call and lowered by the latest
//!   fetch on every exit path
//! - after [`ListSynchronizer::teardown`] every resolution is dropped
//!
//! State sits behind a mutex that is never held across an await, so the
//! synchronizer can be driven from a single event loop without further
//! coordination.

use crate::feedback::{FallbackMessages, Notifier, Operation};
use crate::transport::{decode, Resource, Transport};
use crate::{Exercise, FilterDimension, RemoteError};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

/// Point-in-time copy of what the screen renders
#[derive(Clone, Debug, PartialEq)]
pub struct SyncSnapshot {
    pub dimensions: Vec<FilterDimension>,
    pub items: Vec<Exercise>,
    pub selection: FilterDimension,
    pub loading: bool,
}

#[derive(Debug)]
struct SyncState {
    dimensions: Vec<FilterDimension>,
    items: Vec<Exercise>,
    selection: FilterDimension,
    loading: bool,
    latest_request: u64,
    active: bool,
}

pub struct ListSynchronizer {
    transport: Arc<dyn Transport>,
    notifier: Arc<dyn Notifier>,
    messages: FallbackMessages,
    state: Mutex<SyncState>,
}

impl ListSynchronizer {
    /// `default_selection` is the filter value active before the user picks one.
    /// The loading flag starts raised: nothing has been fetched yet.
    pub fn new(
        transport: Arc<dyn Transport>,
        notifier: Arc<dyn Notifier>,
        messages: FallbackMessages,
        default_selection: FilterDimension,
    ) -> Self {
        Self {
            transport,
            notifier,
            messages,
            state: Mutex::new(SyncState {
                dimensions: Vec::new(),
                items: Vec::new(),
                selection: default_selection,
                loading: true,
                latest_request: 0,
                active: true,
            }),
        }
    }

    fn state(&self) -> MutexGuard<'_, SyncState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn snapshot(&self) -> SyncSnapshot {
        let state = self.state();
        SyncSnapshot {
            dimensions: state.dimensions.clone(),
            items: state.items.clone(),
            selection: state.selection.clone(),
            loading: state.loading,
        }
    }

    pub fn selection(&self) -> FilterDimension {
        self.state().selection.clone()
    }

    pub fn is_loading(&self) -> bool {
        self.state().loading
    }

    pub fn is_active(&self) -> bool {
        self.state().active
    }

    /// Fetch the filter values. Failures are reported but never touch the
    /// loading flag, which belongs to the item list.
    pub async fn load_filter_dimensions(&self) {
        if !self.is_active() {
            return;
        }
        let resource = Resource::Groups;
        let result = match self.transport.get(&resource).await {
            Ok(payload) => decode::<Vec<FilterDimension>>(&resource, payload),
            Err(e) => Err(e),
        };

        let mut state = self.state();
        if !state.active {
            tracing::debug!("Dropping {} result: screen torn down", resource);
            return;
        }

        match result {
            Ok(dimensions) => {
                tracing::debug!("Loaded {} filter values", dimensions.len());
                state.dimensions = dimensions;
            }
            Err(e) => {
                drop(state);
                self.report(Operation::LoadGroups, &e);
            }
        }
    }

    /// Fetch the items for `selection`.
    ///
    /// On failure the previous items stay visible. The result is applied only
    /// if no newer fetch was issued in the meantime.
    pub async fn load_items_for_selection(&self, selection: FilterDimension) {
        let request_id = {
            let mut state = self.state();
            if !state.active {
                return;
            }
            state.latest_request += 1;
            state.loading = true;
            state.latest_request
        };

        let resource = Resource::ExercisesByGroup(selection);
        tracing::debug!(request_id, "Fetching {}", resource);

        let result = match self.transport.get(&resource).await {
            Ok(payload) => decode::<Vec<Exercise>>(&resource, payload),
            Err(e) => Err(e),
        };

        let mut state = self.state();
        if !state.active {
            tracing::debug!(request_id, "Dropping {} result: screen torn down", resource);
            return;
        }
        if request_id != state.latest_request {
            tracing::debug!(
                request_id,
                latest = state.latest_request,
                "Dropping superseded {} result",
                resource
            );
            return;
        }

        state.loading = false;
        match result {
            Ok(items) => {
                tracing::debug!(request_id, "Loaded {} items from {}", items.len(), resource);
                state.items = items;
            }
            Err(e) => {
                drop(state);
                self.report(Operation::LoadExercises, &e);
            }
        }
    }

    /// Re-fetch the items of the current selection
    pub async fn refresh(&self) {
        let selection = self.selection();
        self.load_items_for_selection(selection).await;
    }

    /// Change the active filter. Returns whether the value changed; fetching
    /// is left to the caller.
    ///
    /// A change supersedes any fetch still in flight, so a result for the old
    /// value can never land under the new one.
    pub fn select_filter_dimension(&self, value: FilterDimension) -> bool {
        let mut state = self.state();
        if state.selection == value {
            return false;
        }
        tracing::debug!("Selection {} -> {}", state.selection, value);
        state.selection = value;
        state.latest_request += 1;
        true
    }

    /// Stop applying results. Fetches still in flight resolve into nothing.
    pub fn teardown(&self) {
        let mut state = self.state();
        state.active = false;
        tracing::debug!("List synchronizer torn down");
    }

    fn report(&self, operation: Operation, error: &RemoteError) {
        tracing::warn!(?operation, "Remote call failed: {}", error);
        self.notifier
            .show(self.messages.failure(operation, error.domain_message()));
    }
}
