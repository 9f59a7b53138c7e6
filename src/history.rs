use crate::error::SnapshotError;
use crate::event::{EventBus, EventHandler, HistoryEvent, RestoreDirection};
use crate::snapshot::{RestoreFailure, Snapshot, SnapshotStore};
use crate::surface::{Surface, SurfaceHandle};
use futures::future::{FutureExt, LocalBoxFuture};
use std::cell::RefCell;
use std::future::Future;
use std::pin::Pin;
use std::rc::Rc;
use std::task::{Context, Poll};

#[derive(Debug, Default)]
struct Stacks {
    /// Oldest first; the last entry is the state before the most recent action
    undo: Vec<Snapshot>,
    /// Oldest first; the last entry is the next redo
    redo: Vec<Snapshot>,
    /// Incremented on every stack mutation
    generation: u64,
    /// Content of restores still in flight, oldest first, keyed by the id
    /// of the snapshot being restored
    pending: Vec<(usize, Snapshot)>,
}

impl Stacks {
    fn changed_event(&self) -> HistoryEvent {
        HistoryEvent::Changed {
            can_undo: !self.undo.is_empty(),
            can_redo: !self.redo.is_empty(),
            undo_depth: self.undo.len(),
            redo_depth: self.redo.len(),
        }
    }

    /// Source and destination stacks for a restore in `direction`
    fn stacks_for(&mut self, direction: RestoreDirection) -> (&mut Vec<Snapshot>, &mut Vec<Snapshot>) {
        match direction {
            RestoreDirection::Undo => (&mut self.undo, &mut self.redo),
            RestoreDirection::Redo => (&mut self.redo, &mut self.undo),
        }
    }

    /// Forget the in-flight content once the restore of `target_id` settles
    fn settle(&mut self, target_id: usize) {
        self.pending.retain(|(id, _)| *id != target_id);
    }
}

/// Undo/redo history built on whole-surface snapshots.
///
/// One snapshot is recorded per action boundary, before the action touches
/// the surface. Undo and redo move the current content onto the opposite
/// stack and restore the popped snapshot asynchronously.
pub struct History<S: Surface> {
    surface: SurfaceHandle<S>,
    store: SnapshotStore,
    stacks: Rc<RefCell<Stacks>>,
    events: Rc<EventBus>,
}

impl<S: Surface> std::fmt::Debug for History<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let stacks = self.stacks.borrow();
        f.debug_struct("History")
            .field("undo_depth", &stacks.undo.len())
            .field("redo_depth", &stacks.redo.len())
            .field("generation", &stacks.generation)
            .finish()
    }
}

impl<S: Surface + 'static> History<S> {
    /// Creates an empty history for `surface`
    pub fn new(surface: SurfaceHandle<S>, store: SnapshotStore) -> Self {
        Self {
            surface,
            store,
            stacks: Rc::new(RefCell::new(Stacks::default())),
            events: Rc::new(EventBus::new()),
        }
    }

    /// Returns the surface this history restores into
    pub fn surface(&self) -> &SurfaceHandle<S> {
        &self.surface
    }

    /// Registers a handler for history events
    pub fn subscribe(&self, handler: impl EventHandler + 'static) {
        self.events.subscribe(handler);
    }

    /// Capture the current surface as the state before a new action.
    ///
    /// Clears the redo stack. If the capture fails nothing changes.
    pub fn record(&mut self) -> Result<(), SnapshotError> {
        let snapshot = self.capture_current()?;
        let event = {
            let mut stacks = self.stacks.borrow_mut();
            log::debug!("Recorded snapshot {} ({} bytes)", snapshot.id(), snapshot.data().len());
            stacks.undo.push(snapshot);
            stacks.redo.clear();
            stacks.generation += 1;
            stacks.changed_event()
        };
        self.events.emit(event);
        Ok(())
    }

    /// Step back one action. Returns `Ok(None)` when there is nothing to undo.
    ///
    /// The stacks are updated immediately; the surface changes when the
    /// returned [`Restore`] completes.
    pub fn undo(&mut self) -> Result<Option<Restore>, SnapshotError> {
        self.step(RestoreDirection::Undo)
    }

    /// Reapply one undone action. Returns `Ok(None)` when there is nothing to redo.
    pub fn redo(&mut self) -> Result<Option<Restore>, SnapshotError> {
        self.step(RestoreDirection::Redo)
    }

    /// Returns true if there is an action to undo
    pub fn can_undo(&self) -> bool {
        !self.stacks.borrow().undo.is_empty()
    }

    /// Returns true if there is an undone action to redo
    pub fn can_redo(&self) -> bool {
        !self.stacks.borrow().redo.is_empty()
    }

    /// Number of snapshots on the undo stack
    pub fn undo_depth(&self) -> usize {
        self.stacks.borrow().undo.len()
    }

    /// Number of snapshots on the redo stack
    pub fn redo_depth(&self) -> usize {
        self.stacks.borrow().redo.len()
    }

    /// Drop every snapshot on both stacks
    pub fn reset(&mut self) {
        let event = {
            let mut stacks = self.stacks.borrow_mut();
            stacks.undo.clear();
            stacks.redo.clear();
            stacks.generation += 1;
            stacks.changed_event()
        };
        self.events.emit(event);
    }

    /// Content the surface shows once every scheduled restore has landed.
    ///
    /// While a restore is in flight the surface still holds older pixels, so
    /// the pending target stands in for them.
    fn capture_current(&self) -> Result<Snapshot, SnapshotError> {
        if let Some((_, pending)) = self.stacks.borrow().pending.last() {
            return Ok(pending.duplicate());
        }
        self.store.capture(&*self.surface.borrow())
    }

    fn step(&mut self, direction: RestoreDirection) -> Result<Option<Restore>, SnapshotError> {
        if self.stacks.borrow_mut().stacks_for(direction).0.is_empty() {
            return Ok(None);
        }

        // The state being left goes onto the opposite stack
        let current = self.capture_current()?;

        let (target, target_id, generation, event) = {
            let mut stacks = self.stacks.borrow_mut();
            let (source, destination) = stacks.stacks_for(direction);
            let Some(target) = source.pop() else {
                return Ok(None);
            };
            destination.push(current);
            let target_id = target.id();
            let in_flight = target.duplicate();
            stacks.pending.push((target_id, in_flight));
            stacks.generation += 1;
            (target, target_id, stacks.generation, stacks.changed_event())
        };
        log::debug!("Scheduling {} restore of snapshot {}", direction, target.id());
        self.events.emit(event);

        let pending = self.store.restore(Rc::clone(&self.surface), target);
        let stacks = Rc::clone(&self.stacks);
        let events = Rc::clone(&self.events);
        let settle = SettleOnDrop {
            stacks: Rc::clone(&stacks),
            target_id,
        };
        let task = async move {
            let result = pending.await;
            drop(settle);
            match result {
                Ok(()) => {
                    events.emit(HistoryEvent::Restored { direction });
                    Ok(())
                }
                Err(RestoreFailure { snapshot, error }) => {
                    log::error!("Failed to restore {} snapshot {}: {}", direction, snapshot.id(), error);
                    let rolled_back = roll_back(&stacks, direction, generation, snapshot);
                    if rolled_back {
                        let event = stacks.borrow().changed_event();
                        events.emit(event);
                    }
                    events.emit(HistoryEvent::RestoreFailed {
                        direction,
                        rolled_back,
                        reason: error.to_string(),
                    });
                    Err(error)
                }
            }
        };

        Ok(Some(Restore {
            direction,
            task: task.boxed_local(),
        }))
    }
}

/// Marks a restore as no longer in flight, whether it completed or was dropped
struct SettleOnDrop {
    stacks: Rc<RefCell<Stacks>>,
    target_id: usize,
}

impl Drop for SettleOnDrop {
    fn drop(&mut self) {
        self.stacks.borrow_mut().settle(self.target_id);
    }
}

/// Undo the stack mutation of a failed restore, but only if nothing else
/// touched the history since it was scheduled.
fn roll_back(
    stacks: &RefCell<Stacks>,
    direction: RestoreDirection,
    generation: u64,
    snapshot: Snapshot,
) -> bool {
    let mut stacks = stacks.borrow_mut();
    if stacks.generation != generation {
        log::warn!(
            "History changed while {} restore was pending; dropping snapshot {}",
            direction,
            snapshot.id()
        );
        return false;
    }
    let (source, destination) = stacks.stacks_for(direction);
    destination.pop();
    source.push(snapshot);
    stacks.generation += 1;
    true
}

/// A pending undo or redo. Resolves once the snapshot has been decoded and
/// drawn, or with the decode error if it could not be.
///
/// Dropping a `Restore` without polling it leaves the surface unchanged
/// while the stacks keep their new shape.
#[must_use = "the surface is only restored when the Restore is driven to completion"]
pub struct Restore {
    direction: RestoreDirection,
    task: LocalBoxFuture<'static, Result<(), SnapshotError>>,
}

impl Restore {
    /// Whether this restore undoes or redoes an action
    pub fn direction(&self) -> RestoreDirection {
        self.direction
    }
}

impl std::fmt::Debug for Restore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Restore")
            .field("direction", &self.direction)
            .finish_non_exhaustive()
    }
}

impl Future for Restore {
    type Output = Result<(), SnapshotError>;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        self.task.poll_unpin(cx)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::surface::RasterSurface;
    use egui::pos2;
    use futures::executor::block_on;

    fn history() -> History<RasterSurface> {
        History::new(RasterSurface::new(8, 8).into_handle(), SnapshotStore::default())
    }

    fn scribble(history: &History<RasterSurface>, y: f32) {
        let mut surface = history.surface().borrow_mut();
        surface.set_line_width(2.0);
        surface.draw_line_segment(pos2(0.0, y), pos2(8.0, y));
    }

    #[test]
    fn test_record_clears_redo() {
        let mut history = history();
        history.record().unwrap();
        scribble(&history, 2.0);
        block_on(history.undo().unwrap().unwrap()).unwrap();
        assert!(history.can_redo());

        history.record().unwrap();
        assert!(!history.can_redo());
        assert_eq!(history.undo_depth(), 1);
    }

    #[test]
    fn test_undo_on_empty_history_is_noop() {
        let mut history = history();
        let version = history.surface().borrow().version();

        assert!(history.undo().unwrap().is_none());
        assert!(history.redo().unwrap().is_none());
        assert!(!history.can_undo());
        assert_eq!(history.surface().borrow().version(), version);
    }

    #[test]
    fn test_stacks_move_before_restore_completes() {
        let mut history = history();
        history.record().unwrap();
        scribble(&history, 4.0);

        let restore = history.undo().unwrap().unwrap();
        assert_eq!(restore.direction(), RestoreDirection::Undo);
        assert_eq!(history.undo_depth(), 0);
        assert_eq!(history.redo_depth(), 1);
        // Not restored yet
        assert!(!history.surface().borrow().is_blank());

        block_on(restore).unwrap();
        assert!(history.surface().borrow().is_blank());
    }

    #[test]
    fn test_dropped_restore_is_no_longer_in_flight() {
        let mut history = history();
        history.record().unwrap();
        scribble(&history, 4.0);

        drop(history.undo().unwrap().unwrap());
        assert!(history.stacks.borrow().pending.is_empty());

        // The next capture reads the surface, which never went blank
        history.record().unwrap();
        block_on(history.undo().unwrap().unwrap()).unwrap();
        assert!(!history.surface().borrow().is_blank());
    }

    #[test]
    fn test_reset_drops_everything() {
        let mut history = history();
        history.record().unwrap();
        history.record().unwrap();
        history.reset();
        assert!(!history.can_undo());
        assert!(!history.can_redo());
    }
}
