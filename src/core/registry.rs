//! # Live-task registry.
//!
//! Maps each event id to the handle of its running [`EventActor`]. The
//! supervisor is the only writer; the map is guarded by an async `RwLock`.
//!
//! ```text
//! tick ──► prune_finished() ──► TaskPruned(exit)
//!      └─► spawn_if_absent(event) ──► TaskSpawned | already live
//! cancel(id) / refresh(id) ──► cancel token ──► join ──► TaskCancelled
//! stop() ──► cancel_all(grace) ──► stuck ids (aborted)
//! ```
//!
//! ## Rules
//! - At most one handle per event id.
//! - A handle whose task has finished counts as absent.
//! - Cancellation always joins the task before returning, so the caller can
//!   respawn without two tasks overlapping.

use std::collections::HashMap;
use std::time::Duration;

use tokio::sync::RwLock;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::core::actor::{ActorContext, ActorExit, EventActor};
use crate::events::{Bus, RuntimeEvent, RuntimeEventKind};
use crate::model::{Event, EventId};

/// Handle to a running event actor.
struct Handle {
    join: JoinHandle<ActorExit>,
    cancel: CancellationToken,
}

/// Outcome of [`Registry::spawn_if_absent`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum Spawn {
    Spawned,
    AlreadyLive,
}

/// Registry of live event tasks.
pub(crate) struct Registry {
    tasks: RwLock<HashMap<EventId, Handle>>,
    bus: Bus,
}

impl Registry {
    pub(crate) fn new(bus: Bus) -> Self {
        Self {
            tasks: RwLock::new(HashMap::new()),
            bus,
        }
    }

    /// Spawns an actor for `event` unless a live one is registered.
    pub(crate) async fn spawn_if_absent(&self, event: Event, ctx: &ActorContext) -> Spawn {
        let id = event.id.clone();
        let mut tasks = self.tasks.write().await;

        if let Some(h) = tasks.get(&id) {
            if !h.join.is_finished() {
                return Spawn::AlreadyLive;
            }
            if let Some(h) = tasks.remove(&id) {
                self.report_exit(&id, h.join).await;
            }
        }

        let cancel = CancellationToken::new();
        let actor = EventActor::new(ctx.clone(), event);
        let join = tokio::spawn(actor.run(cancel.clone()));
        tasks.insert(id.clone(), Handle { join, cancel });
        drop(tasks);

        self.bus
            .publish(RuntimeEvent::new(RuntimeEventKind::TaskSpawned).with_event(&id));
        Spawn::Spawned
    }

    /// Removes handles whose task has finished. Returns how many were removed.
    pub(crate) async fn prune_finished(&self) -> usize {
        let finished: Vec<(EventId, Handle)> = {
            let mut tasks = self.tasks.write().await;
            let ids: Vec<EventId> = tasks
                .iter()
                .filter(|(_, h)| h.join.is_finished())
                .map(|(id, _)| id.clone())
                .collect();
            ids.into_iter()
                .filter_map(|id| tasks.remove(&id).map(|h| (id, h)))
                .collect()
        };

        let n = finished.len();
        for (id, h) in finished {
            self.report_exit(&id, h.join).await;
        }
        n
    }

    /// Cancels and joins the task for `id`. Returns `false` if none was registered.
    pub(crate) async fn cancel(&self, id: &EventId) -> bool {
        let Some(h) = self.tasks.write().await.remove(id) else {
            return false;
        };
        h.cancel.cancel();
        let _ = h.join.await;
        self.bus
            .publish(RuntimeEvent::new(RuntimeEventKind::TaskCancelled).with_event(id));
        true
    }

    /// Cancels every task and waits up to `grace` for them to exit.
    ///
    /// Tasks still running after `grace` are aborted; their ids are returned.
    pub(crate) async fn cancel_all(&self, grace: Duration) -> Vec<EventId> {
        let handles: Vec<(EventId, Handle)> = self.tasks.write().await.drain().collect();
        for (_, h) in &handles {
            h.cancel.cancel();
        }

        let deadline = tokio::time::Instant::now() + grace;
        let mut stuck = Vec::new();
        for (id, mut h) in handles {
            match tokio::time::timeout_at(deadline, &mut h.join).await {
                Ok(_) => {
                    self.bus
                        .publish(RuntimeEvent::new(RuntimeEventKind::TaskCancelled).with_event(&id));
                }
                Err(_) => {
                    h.join.abort();
                    stuck.push(id);
                }
            }
        }
        stuck.sort_unstable();
        stuck
    }

    /// Sorted ids of registered tasks that are still running.
    pub(crate) async fn list(&self) -> Vec<EventId> {
        let tasks = self.tasks.read().await;
        let mut ids: Vec<EventId> = tasks
            .iter()
            .filter(|(_, h)| !h.join.is_finished())
            .map(|(id, _)| id.clone())
            .collect();
        ids.sort_unstable();
        ids
    }

    async fn report_exit(&self, id: &EventId, join: JoinHandle<ActorExit>) {
        let reason = match join.await {
            Ok(exit) => exit.as_label(),
            Err(_) => "actor_panic",
        };
        self.bus.publish(
            RuntimeEvent::new(RuntimeEventKind::TaskPruned)
                .with_event(id)
                .with_reason(reason),
        );
    }
}
