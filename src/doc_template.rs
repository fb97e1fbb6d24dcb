//! Document driver: feeds the story through pages and frames, applies
//! template transitions, and re-renders until forward references settle.

use crate::canvas::{Canvas, Document};
use crate::context::{PassSnapshot, RenderContext};
use crate::error::PlatenError;
use crate::flowable::Flowable;
use crate::frame::{AddResult, Frame};
use crate::image_box::ImageCache;
use crate::page_template::{PageTemplate, TemplateSelection, apply_directive};
use crate::types::Rect;
use std::collections::VecDeque;

/// Upper bound on re-render passes. A document whose forward references
/// still move after this many rounds is oscillating, not converging.
pub const MAX_RENDER_PASSES: usize = 10;

#[derive(Default)]
pub struct DocTemplate {
    templates: Vec<PageTemplate>,
    story: Vec<Box<dyn Flowable>>,
    images: ImageCache,
    producer: Option<String>,
}

impl DocTemplate {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_template(mut self, template: PageTemplate) -> Self {
        self.templates.push(template);
        self
    }

    pub fn with_producer(mut self, producer: impl Into<String>) -> Self {
        self.producer = Some(producer.into());
        self
    }

    pub fn add_flowable(&mut self, flowable: Box<dyn Flowable>) {
        self.story.push(flowable);
    }

    /// Shared decode cache; preload images here to report failures early.
    pub fn image_cache(&mut self) -> &mut ImageCache {
        &mut self.images
    }

    /// Runs layout passes until every story item reports its forward
    /// references stable, then returns that final pass's document.
    pub fn build(mut self) -> Result<Document, PlatenError> {
        if self.templates.is_empty() {
            return Err(PlatenError::MissingPageTemplate);
        }
        let mut prior = PassSnapshot::default();
        for pass in 0..MAX_RENDER_PASSES {
            let (document, snapshot) = self.run_pass(pass, &prior)?;
            let satisfied = self
                .story
                .iter()
                .all(|item| item.is_satisfied(&snapshot, &prior));
            if satisfied {
                log::debug!(
                    "document stabilized after {} pass(es), {} page(s)",
                    pass + 1,
                    snapshot.page_count
                );
                return Ok(document);
            }
            prior = snapshot;
        }
        Err(PlatenError::PassLimitExceeded(MAX_RENDER_PASSES))
    }

    /// One full layout pass over a deep copy of the story. The originals
    /// stay untouched so the next pass starts from the same state.
    fn run_pass(
        &mut self,
        pass: usize,
        prior: &PassSnapshot,
    ) -> Result<(Document, PassSnapshot), PlatenError> {
        let mut story: VecDeque<Box<dyn Flowable>> = self.story.iter().cloned().collect();
        let images = std::mem::take(&mut self.images);
        let mut ctx = RenderContext::new(pass, prior.clone(), images);
        let mut canvas = Canvas::new(self.templates[0].effective_size());
        if let Some(producer) = &self.producer {
            canvas.set_producer(producer);
        }

        let mut selection = TemplateSelection::Fixed(0);
        let mut next_selection: Option<TemplateSelection> = None;
        let mut template_index = selection.next_template();
        let mut frames = begin_page(&self.templates[template_index], &mut canvas, &mut ctx);
        let mut frame_index = 0;
        let mut placed_on_page = false;

        while let Some(item) = story.pop_front() {
            if let Some(directive) = item.template_directive() {
                // Takes effect when the next page starts.
                next_selection = Some(apply_directive(&self.templates, &directive)?);
                continue;
            }
            let outline = item.outline_entry();
            let mut move_on = false;
            match frames[frame_index].add(item, &mut canvas, &mut ctx) {
                AddResult::Placed => {
                    placed_on_page = true;
                    if let Some((level, text)) = outline {
                        ctx.notify_toc(level, text);
                    }
                    // A break that filled the frame must take effect now,
                    // so the next item sees the right page number.
                    move_on = frames[frame_index].is_full();
                }
                AddResult::Split(rest) => {
                    placed_on_page = true;
                    if let Some((level, text)) = outline {
                        ctx.notify_toc(level, text);
                    }
                    for part in rest.into_iter().rev() {
                        story.push_front(part);
                    }
                    move_on = true;
                }
                AddResult::Overflow(item) => {
                    if frame_index + 1 >= frames.len() && !placed_on_page {
                        // The next page would offer no more room than this
                        // untouched one did.
                        return Err(PlatenError::UnplaceableFlowable(
                            item.debug_name().to_string(),
                        ));
                    }
                    story.push_front(item);
                    move_on = true;
                }
            }
            if move_on {
                if frame_index + 1 < frames.len() {
                    frame_index += 1;
                } else if !story.is_empty() {
                    canvas.show_page();
                    if let Some(sel) = next_selection.take() {
                        selection = sel;
                    }
                    template_index = selection.next_template();
                    frames = begin_page(&self.templates[template_index], &mut canvas, &mut ctx);
                    frame_index = 0;
                    placed_on_page = false;
                }
            }
        }
        // The last page could be a fresh one a trailing break opened;
        // don't emit it unless something was actually placed.
        if placed_on_page || canvas.pages_recorded() == 0 {
            canvas.show_page();
        }

        let page_count = canvas.pages_recorded();
        let (toc_entries, images) = ctx.finish();
        self.images = images;
        let snapshot = PassSnapshot {
            page_count,
            toc_entries,
        };
        Ok((canvas.finish(), snapshot))
    }
}

/// Sizes the canvas for the template, paints decorations, and returns the
/// content frames. A template without declared frames gets the full page
/// as its single frame.
fn begin_page(template: &PageTemplate, canvas: &mut Canvas, ctx: &mut RenderContext) -> Vec<Frame> {
    canvas.set_page_size(template.effective_size());
    ctx.begin_page(canvas.page_number());
    template.draw_decorations(canvas, ctx);
    let mut frames: Vec<Frame> = template.frames().iter().map(|r| Frame::new(*r)).collect();
    if frames.is_empty() {
        let size = template.effective_size();
        frames.push(Frame::new(Rect::new(0.0, 0.0, size.width, size.height)));
    }
    frames
}
