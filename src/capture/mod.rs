//! Pointer-driven capture of new markings.
//!
//! [`MarkingCapture`] owns at most one in-progress [`Capture`] per canvas. It writes the
//! temporary marking into the canvas store while the gesture runs and hands the finished
//! marking back as [`CaptureOutcome::Committed`], leaving the history to record it.

mod machine;

pub use machine::{Capture, CaptureContext, Seed, Stage, Step, POLYGON_SNAP_DISTANCE};

use egui::Pos2;
use std::cell::Cell;
use std::rc::Rc;

use crate::error::MarkingResult;
use crate::marking::{Marking, MarkingType};
use crate::state::MarkingsStore;

/// Result of feeding a pointer event to a capture.
#[derive(Debug, Clone, PartialEq)]
pub enum CaptureOutcome {
    /// No capture is running.
    Idle,
    Pending,
    Committed(Marking),
    /// The capture finished but its temporary marking was gone.
    Abandoned,
}

/// Capture controller of one canvas.
#[derive(Debug, Default)]
pub struct MarkingCapture {
    active: Option<Capture>,
}

impl MarkingCapture {
    pub fn is_active(&self) -> bool {
        self.active.is_some()
    }

    pub fn current(&self) -> Option<&Capture> {
        self.active.as_ref()
    }

    /// Starts a capture for `marking_type` at `screen`.
    ///
    /// Refused while another capture or a temporary marking exists, or when no type is selected.
    pub fn begin(&mut self, ctx: &mut CaptureContext<'_>, marking_type: Option<&MarkingType>, screen: Pos2) -> bool {
        if self.active.is_some() || ctx.store.temporary().is_some() {
            log::debug!("Ignoring capture start, a marking is already in progress");
            return false;
        }
        let Some(marking_type) = marking_type else {
            log::debug!("Ignoring capture start, no marking type is selected");
            return false;
        };

        let label = ctx.store.labels_mut().get_label();
        let seed = Seed {
            label,
            type_id: &marking_type.id,
        };
        let (capture, marking) = Capture::begin(marking_type.marking_class, ctx, screen, seed);
        log::debug!("Started {} capture with label {}", marking_type.marking_class, label);
        ctx.store.set_temporary(Some(marking));
        self.active = Some(capture);
        true
    }

    pub fn pointer_move(&mut self, ctx: &mut CaptureContext<'_>, screen: Pos2) -> MarkingResult<()> {
        let Some(capture) = self.active.as_mut() else {
            return Ok(());
        };
        if let Err(err) = capture.pointer_move(ctx, screen) {
            self.interrupt(ctx.store);
            return Err(err);
        }
        Ok(())
    }

    pub fn pointer_up(&mut self, ctx: &mut CaptureContext<'_>, screen: Pos2) -> MarkingResult<CaptureOutcome> {
        self.advance(ctx, screen, Capture::pointer_up)
    }

    pub fn pointer_down(&mut self, ctx: &mut CaptureContext<'_>, screen: Pos2) -> MarkingResult<CaptureOutcome> {
        self.advance(ctx, screen, Capture::pointer_down)
    }

    fn advance(
        &mut self,
        ctx: &mut CaptureContext<'_>,
        screen: Pos2,
        event: fn(&mut Capture, &mut CaptureContext<'_>, Pos2) -> MarkingResult<Step>,
    ) -> MarkingResult<CaptureOutcome> {
        let Some(capture) = self.active.as_mut() else {
            return Ok(CaptureOutcome::Idle);
        };
        match event(capture, ctx, screen) {
            Ok(Step::Continue) => Ok(CaptureOutcome::Pending),
            Ok(Step::Commit) => {
                self.active = None;
                match ctx.store.take_temporary() {
                    Some(marking) => Ok(CaptureOutcome::Committed(marking)),
                    None => {
                        log::warn!("Capture finished without a temporary marking");
                        Ok(CaptureOutcome::Abandoned)
                    }
                }
            }
            Err(err) => {
                self.interrupt(ctx.store);
                Err(err)
            }
        }
    }

    /// Drops the running capture and its temporary marking. Returns whether a capture was running.
    pub fn interrupt(&mut self, store: &mut MarkingsStore) -> bool {
        store.set_temporary(None);
        let interrupted = self.active.take().is_some();
        if interrupted {
            log::debug!("Marking capture interrupted");
        }
        interrupted
    }
}

/// Shared flag asking every running capture to stop at its next event.
#[derive(Debug, Clone, Default)]
pub struct InterruptSignal(Rc<Cell<bool>>);

impl InterruptSignal {
    pub fn raise(&self) {
        self.0.set(true);
    }

    pub fn is_raised(&self) -> bool {
        self.0.get()
    }

    /// Returns the flag and clears it.
    pub fn take(&self) -> bool {
        self.0.replace(false)
    }
}
