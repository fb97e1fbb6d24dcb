//! The flow-item contract and the simple built-in flowables.
//!
//! Everything that travels through the story implements [`Flowable`]:
//! measure under a constraint (`wrap`), divide at a legal boundary
//! (`split`), record drawing commands (`draw`). The remaining methods are
//! hooks with no-op defaults that most implementors never touch.

use crate::canvas::Canvas;
use crate::context::{PassSnapshot, RenderContext};
use crate::types::{Color, Size};
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};

/// A template-selection request carried by a story item. The driver applies
/// it when the next page starts.
#[derive(Debug, Clone, PartialEq)]
pub enum TemplateDirective {
    /// Select one template by name; duplex pairs expand to a cycle.
    Name(String),
    /// Select one template by position.
    Index(usize),
    /// Install a repeating cycle; a `"*"` entry marks the restart point.
    List(Vec<String>),
}

pub trait Flowable: FlowableClone + fmt::Debug + Send + Sync {
    /// Measures under the given constraint and returns the size the item
    /// will occupy. May be called repeatedly with different constraints;
    /// intrinsic inputs stay untouched, only derived layout state is
    /// recomputed.
    fn wrap(&mut self, ctx: &mut RenderContext, avail_width: f32, avail_height: f32) -> Size;

    /// Divides the item at a legal boundary so the head fits the constraint.
    /// An empty vector means the item refuses to split here.
    fn split(
        &mut self,
        _ctx: &mut RenderContext,
        _avail_width: f32,
        _avail_height: f32,
    ) -> Vec<Box<dyn Flowable>> {
        Vec::new()
    }

    /// Records drawing commands at the given top-left position. Must not
    /// change layout state.
    fn draw(&self, canvas: &mut Canvas, ctx: &mut RenderContext, x: f32, y: f32);

    /// A `(level, text)` pair the driver forwards to the TOC accumulator
    /// when the item is placed.
    fn outline_entry(&self) -> Option<(usize, String)> {
        None
    }

    /// Whether this item's forward references resolved to the same values
    /// as in the prior pass. The driver re-renders until every story item
    /// answers true.
    fn is_satisfied(&self, _current: &PassSnapshot, _prior: &PassSnapshot) -> bool {
        true
    }

    /// Replaces page-number / page-count placeholders with concrete values.
    /// Static-frame stories receive this before every page draw.
    fn substitute_page_refs(&mut self, _page_number: usize, _page_count: usize) {}

    /// A template-selection request the driver intercepts instead of
    /// placing the item.
    fn template_directive(&self) -> Option<TemplateDirective> {
        None
    }

    fn debug_name(&self) -> &'static str {
        std::any::type_name::<Self>()
    }
}

/// Clone support for boxed trait objects. Static frames and the multi-pass
/// driver both deep-copy whole stories.
pub trait FlowableClone {
    fn clone_box(&self) -> Box<dyn Flowable>;
}

impl<T> FlowableClone for T
where
    T: 'static + Flowable + Clone,
{
    fn clone_box(&self) -> Box<dyn Flowable> {
        Box::new(self.clone())
    }
}

impl Clone for Box<dyn Flowable> {
    fn clone(&self) -> Self {
        self.clone_box()
    }
}

/// Fixed vertical gap between story items.
#[derive(Debug, Clone)]
pub struct Spacer {
    height: f32,
}

impl Spacer {
    pub fn new(height: f32) -> Self {
        Self { height }
    }
}

impl Flowable for Spacer {
    fn wrap(&mut self, _ctx: &mut RenderContext, _avail_width: f32, _avail_height: f32) -> Size {
        Size::new(0.0, self.height)
    }

    fn draw(&self, _canvas: &mut Canvas, _ctx: &mut RenderContext, _x: f32, _y: f32) {}
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageParity {
    Odd,
    Even,
}

impl PageParity {
    pub fn matches(self, page_number: usize) -> bool {
        match self {
            PageParity::Odd => page_number % 2 == 1,
            PageParity::Even => page_number % 2 == 0,
        }
    }
}

/// Breaks to the next frame unless the current page already has the target
/// parity. Measuring as the full available size exhausts the frame; there
/// is nothing to draw.
#[derive(Debug, Clone)]
pub struct ConditionalPageBreak {
    parity: PageParity,
}

impl ConditionalPageBreak {
    pub fn new(parity: PageParity) -> Self {
        Self { parity }
    }
}

impl Flowable for ConditionalPageBreak {
    fn wrap(&mut self, ctx: &mut RenderContext, avail_width: f32, avail_height: f32) -> Size {
        if self.parity.matches(ctx.page_number()) {
            Size::ZERO
        } else {
            Size::new(avail_width, avail_height)
        }
    }

    fn draw(&self, _canvas: &mut Canvas, _ctx: &mut RenderContext, _x: f32, _y: f32) {}
}

/// Unconditional break: always consumes the rest of the frame.
#[derive(Debug, Clone)]
pub struct PageBreak;

impl Flowable for PageBreak {
    fn wrap(&mut self, _ctx: &mut RenderContext, avail_width: f32, avail_height: f32) -> Size {
        Size::new(avail_width, avail_height)
    }

    fn draw(&self, _canvas: &mut Canvas, _ctx: &mut RenderContext, _x: f32, _y: f32) {}
}

/// Zero-size sentinel that forces at least one re-render, so page-count
/// placeholders elsewhere in the document pick up the final total.
#[derive(Debug, Default)]
pub struct PageCountPlaceholder {
    evaluated: AtomicBool,
}

impl PageCountPlaceholder {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Clone for PageCountPlaceholder {
    fn clone(&self) -> Self {
        Self {
            evaluated: AtomicBool::new(self.evaluated.load(Ordering::Relaxed)),
        }
    }
}

impl Flowable for PageCountPlaceholder {
    fn wrap(&mut self, _ctx: &mut RenderContext, _avail_width: f32, _avail_height: f32) -> Size {
        Size::ZERO
    }

    fn draw(&self, _canvas: &mut Canvas, _ctx: &mut RenderContext, _x: f32, _y: f32) {}

    /// False exactly once per document; the swap records that one full pass
    /// has been evaluated and the next pass sees the real page count.
    fn is_satisfied(&self, _current: &PassSnapshot, _prior: &PassSnapshot) -> bool {
        self.evaluated.swap(true, Ordering::Relaxed)
    }
}

/// Zero-size story item the driver intercepts to switch page templates
/// starting with the next page.
#[derive(Debug, Clone)]
pub struct NextPageTemplate {
    directive: TemplateDirective,
}

impl NextPageTemplate {
    pub fn by_name(name: impl Into<String>) -> Self {
        Self {
            directive: TemplateDirective::Name(name.into()),
        }
    }

    pub fn by_index(index: usize) -> Self {
        Self {
            directive: TemplateDirective::Index(index),
        }
    }

    pub fn cycle(names: Vec<String>) -> Self {
        Self {
            directive: TemplateDirective::List(names),
        }
    }
}

impl Flowable for NextPageTemplate {
    fn wrap(&mut self, _ctx: &mut RenderContext, _avail_width: f32, _avail_height: f32) -> Size {
        Size::ZERO
    }

    fn draw(&self, _canvas: &mut Canvas, _ctx: &mut RenderContext, _x: f32, _y: f32) {}

    fn template_directive(&self) -> Option<TemplateDirective> {
        Some(self.directive.clone())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum FieldKind {
    Text { value: String },
    Checkbox { checked: bool },
    Select { options: Vec<String>, selected: usize },
}

/// Interactive form placeholder drawn as a plain outline plus its current
/// value. Widget behavior is the output layer's concern.
#[derive(Debug, Clone)]
pub struct FormField {
    name: String,
    kind: FieldKind,
    width: f32,
    height: f32,
}

impl FormField {
    pub fn new(name: impl Into<String>, kind: FieldKind, width: f32, height: f32) -> Self {
        Self {
            name: name.into(),
            kind,
            width,
            height,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }
}

impl Flowable for FormField {
    fn wrap(&mut self, _ctx: &mut RenderContext, _avail_width: f32, _avail_height: f32) -> Size {
        Size::new(self.width, self.height)
    }

    fn draw(&self, canvas: &mut Canvas, _ctx: &mut RenderContext, x: f32, y: f32) {
        canvas.set_stroke_color(Color::BLACK);
        canvas.set_line_width(0.5);
        canvas.stroke_rect(crate::types::Rect::new(x, y, self.width, self.height));
        let label = match &self.kind {
            FieldKind::Text { value } => value.clone(),
            FieldKind::Checkbox { checked: true } => "x".to_string(),
            FieldKind::Checkbox { checked: false } => String::new(),
            FieldKind::Select { options, selected } => {
                options.get(*selected).cloned().unwrap_or_default()
            }
        };
        if !label.is_empty() {
            canvas.draw_string(x + 2.0, y + self.height - 2.0, &label);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::image_box::ImageCache;

    fn ctx_on_page(page: usize) -> RenderContext {
        let mut ctx = RenderContext::new(0, PassSnapshot::default(), ImageCache::new());
        ctx.begin_page(page);
        ctx
    }

    #[test]
    fn conditional_break_is_inert_when_parity_matches() {
        let mut brk = ConditionalPageBreak::new(PageParity::Odd);
        let mut ctx = ctx_on_page(3);
        assert_eq!(brk.wrap(&mut ctx, 400.0, 600.0), Size::ZERO);
    }

    #[test]
    fn conditional_break_exhausts_the_frame_on_the_wrong_parity() {
        let mut brk = ConditionalPageBreak::new(PageParity::Odd);
        let mut ctx = ctx_on_page(2);
        assert_eq!(brk.wrap(&mut ctx, 400.0, 600.0), Size::new(400.0, 600.0));
    }

    #[test]
    fn page_count_placeholder_demands_exactly_one_extra_pass() {
        let placeholder = PageCountPlaceholder::new();
        let snap = PassSnapshot::default();
        assert!(!placeholder.is_satisfied(&snap, &snap));
        assert!(placeholder.is_satisfied(&snap, &snap));
        assert!(placeholder.is_satisfied(&snap, &snap));
    }

    #[test]
    fn cloned_stories_keep_independent_satisfaction_flags() {
        let original = PageCountPlaceholder::new();
        let copy = original.clone_box();
        let snap = PassSnapshot::default();
        // Evaluating the pass copy must not mark the original satisfied.
        assert!(!copy.is_satisfied(&snap, &snap));
        assert!(!original.is_satisfied(&snap, &snap));
    }

    #[test]
    fn form_fields_draw_an_outline_and_their_value() {
        use crate::canvas::{Canvas, Command};
        let mut field = FormField::new(
            "subscribe",
            FieldKind::Checkbox { checked: true },
            12.0,
            12.0,
        );
        let mut ctx = ctx_on_page(1);
        assert_eq!(field.wrap(&mut ctx, 500.0, 500.0), Size::new(12.0, 12.0));
        let mut canvas = Canvas::new(crate::types::Size::a4());
        field.draw(&mut canvas, &mut ctx, 10.0, 10.0);
        canvas.show_page();
        let doc = canvas.finish();
        assert!(
            doc.pages[0]
                .commands
                .iter()
                .any(|c| matches!(c, Command::StrokeRect { .. }))
        );
        assert!(doc.pages[0].commands.iter().any(|c| matches!(
            c,
            Command::DrawString { text, .. } if text == "x"
        )));
    }

    #[test]
    fn next_page_template_carries_its_directive() {
        let item = NextPageTemplate::by_name("landscape");
        assert_eq!(
            item.template_directive(),
            Some(TemplateDirective::Name("landscape".to_string()))
        );
    }
}
