//! A rectangular content region with a top-down fill cursor.

use crate::canvas::Canvas;
use crate::context::RenderContext;
use crate::flowable::Flowable;
use crate::types::Rect;
use std::collections::VecDeque;

/// Fit tolerance; a flowable measuring the exact remaining height (a
/// conditional break does) must count as fitting despite float noise.
const FIT_EPSILON: f32 = 0.001;

/// Outcome of offering one flowable to a frame.
pub enum AddResult {
    /// Fully drawn into this frame.
    Placed,
    /// A head was drawn here; these continuations go to the next frame.
    Split(Vec<Box<dyn Flowable>>),
    /// Nothing fit and the item refused to split; try the next frame.
    Overflow(Box<dyn Flowable>),
}

#[derive(Debug)]
pub struct Frame {
    rect: Rect,
    cursor: f32,
}

impl Frame {
    pub fn new(rect: Rect) -> Self {
        Self { rect, cursor: 0.0 }
    }

    pub fn remaining(&self) -> f32 {
        self.rect.height - self.cursor
    }

    pub fn is_untouched(&self) -> bool {
        self.cursor == 0.0
    }

    /// No usable space left; a page break leaves the frame in this state.
    pub fn is_full(&self) -> bool {
        self.remaining() <= FIT_EPSILON
    }

    /// Measures, then draws, splits or rejects the flowable.
    pub fn add(
        &mut self,
        mut flowable: Box<dyn Flowable>,
        canvas: &mut Canvas,
        ctx: &mut RenderContext,
    ) -> AddResult {
        let avail_w = self.rect.width;
        let avail_h = self.remaining();
        let size = flowable.wrap(ctx, avail_w, avail_h);
        if size.height <= avail_h + FIT_EPSILON {
            flowable.draw(canvas, ctx, self.rect.x, self.rect.y + self.cursor);
            self.cursor += size.height;
            return AddResult::Placed;
        }
        let mut parts = flowable.split(ctx, avail_w, avail_h);
        if parts.is_empty() {
            return AddResult::Overflow(flowable);
        }
        let mut head = parts.remove(0);
        let head_size = head.wrap(ctx, avail_w, avail_h);
        if head_size.height > avail_h + FIT_EPSILON {
            log::warn!(
                "{} produced a head taller than the frame ({} > {})",
                head.debug_name(),
                head_size.height,
                avail_h
            );
        }
        head.draw(canvas, ctx, self.rect.x, self.rect.y + self.cursor);
        self.cursor += head_size.height;
        if parts.is_empty() {
            AddResult::Placed
        } else {
            AddResult::Split(parts)
        }
    }

    /// Lays a whole list into the frame, stopping at the first item that
    /// does not fully fit. Returns how many items (or continuations) were
    /// left over.
    pub fn add_from_list(
        &mut self,
        items: Vec<Box<dyn Flowable>>,
        canvas: &mut Canvas,
        ctx: &mut RenderContext,
    ) -> usize {
        let mut queue = VecDeque::from(items);
        while let Some(item) = queue.pop_front() {
            match self.add(item, canvas, ctx) {
                AddResult::Placed => {}
                AddResult::Split(rest) => return rest.len() + queue.len(),
                AddResult::Overflow(_) => return 1 + queue.len(),
            }
        }
        0
    }
}
