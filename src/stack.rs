//! The active-effect stack.
//!
//! At every reactive read the engine must know which effect, if any, should
//! be subscribed. Because effect bodies can register and run further
//! effects, "the currently running effect" is a stack rather than a single
//! slot: the topmost frame receives new trackings, and finishing a nested
//! run reinstates the frame below it.
//!
//! Frames are pushed and popped exclusively through [`FrameGuard`], so the
//! stack is rebalanced on every exit path, including unwinding out of a
//! panicking effect body. An unbalanced stack would misattribute every
//! subsequent read in the program.

use parking_lot::Mutex;

use crate::arena::EffectId;

/// One pushed entry: `Some` while an effect runs, `None` for an untracked
/// region that masks the frames below it.
pub(crate) type Frame = Option<EffectId>;

#[derive(Default)]
pub(crate) struct ActiveStack {
    frames: Mutex<Vec<Frame>>,
}

impl ActiveStack {
    /// The effect currently eligible to receive trackings: the topmost
    /// frame, unless that frame is an untracked mask.
    pub(crate) fn current(&self) -> Option<EffectId> {
        self.frames.lock().last().copied().flatten()
    }

    /// Push a frame; the returned guard pops it on drop.
    pub(crate) fn enter(&self, frame: Frame) -> FrameGuard<'_> {
        self.frames.lock().push(frame);
        FrameGuard { stack: self, frame }
    }

    #[cfg(test)]
    pub(crate) fn depth(&self) -> usize {
        self.frames.lock().len()
    }
}

/// Pops its frame when dropped, keeping push/pop balanced even when the
/// effect body panics.
pub(crate) struct FrameGuard<'a> {
    stack: &'a ActiveStack,
    frame: Frame,
}

impl Drop for FrameGuard<'_> {
    fn drop(&mut self) {
        let popped = self.stack.frames.lock().pop();
        debug_assert_eq!(
            popped,
            Some(self.frame),
            "active-effect stack out of balance"
        );
    }
}
