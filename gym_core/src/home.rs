//! Home screen driver: muscle-group filter plus exercise list.
//!
//! Turns screen lifecycle events into synchronizer calls. Item fetches are a
//! reaction to two things only: the screen becoming visible, and the selection
//! changing while it is visible.

use crate::feedback::{FallbackMessages, Notifier};
use crate::navigation::{Navigator, Route};
use crate::sync::{ListSynchronizer, SyncSnapshot};
use crate::transport::Transport;
use crate::FilterDimension;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

pub struct HomeScreen {
    sync: ListSynchronizer,
    navigator: Arc<dyn Navigator>,
    visible: AtomicBool,
}

impl HomeScreen {
    pub fn new(
        transport: Arc<dyn Transport>,
        notifier: Arc<dyn Notifier>,
        navigator: Arc<dyn Navigator>,
        messages: FallbackMessages,
        default_group: FilterDimension,
    ) -> Self {
        Self {
            sync: ListSynchronizer::new(transport, notifier, messages, default_group),
            navigator,
            visible: AtomicBool::new(false),
        }
    }

    /// First appearance: groups and the default group's exercises load side by side
    pub async fn mount(&self) {
        tracing::info!("Home screen mounted");
        tokio::join!(self.sync.load_filter_dimensions(), self.focus_gained());
    }

    /// Hidden -> visible. Always re-fetches the current selection, even when it
    /// did not change, since the server data may have moved on meanwhile.
    pub async fn focus_gained(&self) {
        if self.visible.swap(true, Ordering::SeqCst) {
            return;
        }
        self.sync.refresh().await;
    }

    pub fn focus_lost(&self) {
        self.visible.store(false, Ordering::SeqCst);
    }

    pub fn is_visible(&self) -> bool {
        self.visible.load(Ordering::SeqCst)
    }

    /// Pick a muscle group. A hidden screen fetches on its next focus gain.
    pub async fn select_group(&self, group: FilterDimension) {
        if self.sync.select_filter_dimension(group.clone()) && self.is_visible() {
            self.sync.load_items_for_selection(group).await;
        }
    }

    pub fn open_exercise(&self, exercise_id: &str) {
        self.navigator.navigate_to(Route::ExerciseDetail {
            exercise_id: exercise_id.to_string(),
        });
    }

    pub fn unmount(&self) {
        self.visible.store(false, Ordering::SeqCst);
        self.sync.teardown();
        tracing::info!("Home screen unmounted");
    }

    pub fn snapshot(&self) -> SyncSnapshot {
        self.sync.snapshot()
    }
}
