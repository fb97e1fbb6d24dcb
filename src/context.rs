//! Per-pass render state.
//!
//! One [`RenderContext`] lives for exactly one layout pass. It carries the
//! pass counter, the page the driver is currently filling, an immutable
//! snapshot of the previous pass (page count and collected TOC entries),
//! the TOC accumulator for the running pass, the max-height smoothing state
//! and the image cache that survives across passes.

use crate::image_box::ImageCache;

/// One table-of-contents notification: outline level, display text and the
/// page the entry was drawn on.
#[derive(Debug, Clone, PartialEq)]
pub struct TocEntry {
    pub level: usize,
    pub text: String,
    pub page: usize,
}

/// What a completed pass leaves behind for the next one.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct PassSnapshot {
    pub page_count: usize,
    pub toc_entries: Vec<TocEntry>,
}

/// Heights below this are treated as genuine frame constraints; anything at
/// or above it is a degenerate "effectively unbounded" probe and passes
/// through untracked.
pub const SMALL_FRAME_THRESHOLD: f32 = 70_000.0;

/// Smooths the available height over repeated measurement probes.
///
/// The driver may probe a flowable with a temporarily shrunken height before
/// settling; without smoothing, line breaks computed against the transient
/// value would stick. The tracker remembers the largest constrained height
/// seen in the current page context and answers with that maximum.
#[derive(Debug, Clone, Default)]
pub struct MaxHeightTracker {
    seen: f32,
}

impl MaxHeightTracker {
    pub fn track(&mut self, proposed: f32) -> f32 {
        if proposed < SMALL_FRAME_THRESHOLD {
            self.seen = self.seen.max(proposed);
            self.seen
        } else {
            proposed
        }
    }

    /// Largest constrained height seen since the last reset.
    pub fn current(&self) -> f32 {
        self.seen
    }

    pub fn reset(&mut self) {
        self.seen = 0.0;
    }
}

pub struct RenderContext {
    pass: usize,
    page_number: usize,
    prior: PassSnapshot,
    toc_entries: Vec<TocEntry>,
    outline_last: Option<usize>,
    pub max_height: MaxHeightTracker,
    images: ImageCache,
}

impl RenderContext {
    pub fn new(pass: usize, prior: PassSnapshot, images: ImageCache) -> Self {
        Self {
            pass,
            page_number: 1,
            prior,
            toc_entries: Vec::new(),
            outline_last: None,
            max_height: MaxHeightTracker::default(),
            images,
        }
    }

    /// 0-based pass counter; anything past 0 is a re-render with forward
    /// references resolved from the prior snapshot.
    pub fn pass(&self) -> usize {
        self.pass
    }

    pub fn page_number(&self) -> usize {
        self.page_number
    }

    /// Best known total page count: the prior pass's final count once one
    /// exists, otherwise the highest page reached so far.
    pub fn page_count(&self) -> usize {
        if self.prior.page_count > 0 {
            self.prior.page_count
        } else {
            self.page_number
        }
    }

    pub fn prior(&self) -> &PassSnapshot {
        &self.prior
    }

    /// Called by the driver when a new page starts; the max-height state is
    /// scoped to a single page.
    pub fn begin_page(&mut self, page_number: usize) {
        self.page_number = page_number;
        self.max_height.reset();
    }

    /// Records a TOC entry for the page currently being drawn.
    pub fn notify_toc(&mut self, level: usize, text: String) {
        self.toc_entries.push(TocEntry {
            level,
            text,
            page: self.page_number,
        });
    }

    pub fn images(&mut self) -> &mut ImageCache {
        &mut self.images
    }

    pub fn last_outline_level(&self) -> Option<usize> {
        self.outline_last
    }

    pub fn set_last_outline_level(&mut self, level: usize) {
        self.outline_last = Some(level);
    }

    /// Tears the context down at pass end, releasing the collected TOC
    /// entries and the image cache back to the driver.
    pub(crate) fn finish(self) -> (Vec<TocEntry>, ImageCache) {
        (self.toc_entries, self.images)
    }
}
