//! Page templates: content frames, per-page static decorations, backgrounds
//! and the template selection state machine.

use crate::canvas::Canvas;
use crate::context::RenderContext;
use crate::error::PlatenError;
use crate::flowable::{Flowable, TemplateDirective};
use crate::frame::Frame;
use crate::types::{Rect, Size};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Orientation {
    #[default]
    Portrait,
    Landscape,
}

/// Full-page backdrop painted (or queued) before any content.
#[derive(Debug, Clone)]
pub enum Background {
    /// Encoded raster bytes, decoded through the image cache and scaled to
    /// the page.
    Raster(Vec<u8>),
    /// Opaque reference to an embeddable page, merged under the content by
    /// the output layer.
    PdfPage(String),
}

/// A region outside the content flow that repaints on every page, with its
/// own captured story.
#[derive(Debug, Clone)]
pub struct StaticFrame {
    pub rect: Rect,
    pub story: Vec<Box<dyn Flowable>>,
}

#[derive(Debug, Clone)]
pub struct PageTemplate {
    name: String,
    page_size: Size,
    orientation: Orientation,
    frames: Vec<Rect>,
    static_frames: Vec<StaticFrame>,
    background: Option<Background>,
}

impl PageTemplate {
    pub fn new(name: impl Into<String>, page_size: Size) -> Self {
        Self {
            name: name.into(),
            page_size,
            orientation: Orientation::Portrait,
            frames: Vec::new(),
            static_frames: Vec::new(),
            background: None,
        }
    }

    pub fn with_orientation(mut self, orientation: Orientation) -> Self {
        self.orientation = orientation;
        self
    }

    /// Appends a content frame; flow content fills frames in order.
    pub fn with_frame(mut self, rect: Rect) -> Self {
        self.frames.push(rect);
        self
    }

    pub fn with_static_frame(mut self, rect: Rect, story: Vec<Box<dyn Flowable>>) -> Self {
        self.static_frames.push(StaticFrame { rect, story });
        self
    }

    pub fn with_background(mut self, background: Background) -> Self {
        self.background = Some(background);
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn frames(&self) -> &[Rect] {
        &self.frames
    }

    /// Declared size with the orientation applied.
    pub fn effective_size(&self) -> Size {
        match self.orientation {
            Orientation::Portrait => self.page_size,
            Orientation::Landscape => {
                if self.page_size.width >= self.page_size.height {
                    self.page_size
                } else {
                    self.page_size.rotated()
                }
            }
        }
    }

    /// Paints everything that is not flow content: background, then the
    /// static frames with page references substituted. Failures here are
    /// logged and skipped; a bad header image must not kill the document.
    pub fn draw_decorations(&self, canvas: &mut Canvas, ctx: &mut RenderContext) {
        canvas.save_state();
        match &self.background {
            Some(Background::Raster(bytes)) => self.draw_raster_background(canvas, ctx, bytes),
            Some(Background::PdfPage(reference)) => canvas.queue_background_merge(reference),
            None => {}
        }
        for static_frame in &self.static_frames {
            let mut story = static_frame.story.clone();
            for item in &mut story {
                item.substitute_page_refs(canvas.page_number(), ctx.page_count());
            }
            let leftover = Frame::new(static_frame.rect).add_from_list(story, canvas, ctx);
            if leftover > 0 {
                log::warn!(
                    "static frame on page {} overflowed, {} item(s) not drawn",
                    canvas.page_number(),
                    leftover
                );
            }
        }
        canvas.restore_state();
    }

    fn draw_raster_background(&self, canvas: &mut Canvas, ctx: &mut RenderContext, bytes: &[u8]) {
        let decoded = match ctx.images().load(bytes) {
            Ok(decoded) => decoded,
            Err(err) => {
                log::warn!(
                    "background image on page {} skipped: {}",
                    canvas.page_number(),
                    err
                );
                return;
            }
        };
        let page = canvas.page_size();
        let (iw, ih) = (decoded.width as f32, decoded.height as f32);
        if iw <= 0.0 || ih <= 0.0 {
            return;
        }
        let factor_w = page.width / iw;
        let factor_h = page.height / ih;
        let factor_min = factor_w.min(factor_h);
        let factor_max = factor_w.max(factor_h);
        // Landscape pages historically swap the image axes into the factor
        // mix; kept for output compatibility.
        let (w, h) = match self.orientation {
            Orientation::Portrait => (iw * factor_min, ih * factor_min),
            Orientation::Landscape => (ih * factor_max, iw * factor_min),
        };
        canvas.draw_image(0.0, 0.0, w, h, &decoded.resource, decoded.has_alpha);
    }
}

/// A repeating sequence of template indices. After the end it resumes from
/// `restart`, not from the beginning.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TemplateCycle {
    sequence: Vec<usize>,
    cursor: usize,
    restart: usize,
}

impl TemplateCycle {
    pub fn new(sequence: Vec<usize>, restart: usize) -> Result<Self, PlatenError> {
        if sequence.is_empty() {
            return Err(PlatenError::InvalidTemplateCycle(
                "cycle resolved to no templates".to_string(),
            ));
        }
        if restart >= sequence.len() {
            return Err(PlatenError::InvalidTemplateCycle(format!(
                "restart position {} is past the end of a {}-template cycle",
                restart,
                sequence.len()
            )));
        }
        Ok(Self {
            sequence,
            cursor: 0,
            restart,
        })
    }

    /// Yields the template index for the next page.
    pub fn advance(&mut self) -> usize {
        let index = self.sequence[self.cursor.min(self.sequence.len() - 1)];
        self.cursor += 1;
        if self.cursor >= self.sequence.len() {
            self.cursor = self.restart;
        }
        index
    }
}

/// Which template the next page gets.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TemplateSelection {
    Fixed(usize),
    Cycling(TemplateCycle),
}

impl TemplateSelection {
    pub fn next_template(&mut self) -> usize {
        match self {
            TemplateSelection::Fixed(index) => *index,
            TemplateSelection::Cycling(cycle) => cycle.advance(),
        }
    }
}

fn index_of(templates: &[PageTemplate], name: &str) -> Option<usize> {
    templates.iter().position(|t| t.name() == name)
}

/// Resolves a story directive into a selection state.
///
/// A name with a `<name>_left` / `<name>_right` pair becomes a
/// two-template duplex cycle; the pair wins even when a template with the
/// exact name also exists. Unknown names inside a list are skipped; a
/// `"*"` entry marks where the cycle resumes after its first full run.
pub(crate) fn apply_directive(
    templates: &[PageTemplate],
    directive: &TemplateDirective,
) -> Result<TemplateSelection, PlatenError> {
    match directive {
        TemplateDirective::Name(name) => {
            let left = index_of(templates, &format!("{name}_left"));
            let right = index_of(templates, &format!("{name}_right"));
            if let (Some(left), Some(right)) = (left, right) {
                return Ok(TemplateSelection::Cycling(TemplateCycle::new(
                    vec![left, right],
                    0,
                )?));
            }
            match index_of(templates, name) {
                Some(index) => Ok(TemplateSelection::Fixed(index)),
                None => Err(PlatenError::UnknownTemplate(name.clone())),
            }
        }
        TemplateDirective::Index(index) => {
            if *index < templates.len() {
                Ok(TemplateSelection::Fixed(*index))
            } else {
                Err(PlatenError::UnknownTemplateIndex(*index))
            }
        }
        TemplateDirective::List(names) => {
            let mut sequence = Vec::new();
            let mut restart = 0;
            for name in names {
                if name == "*" {
                    restart = sequence.len();
                } else if let Some(index) = index_of(templates, name) {
                    sequence.push(index);
                } else {
                    log::debug!("template '{name}' not defined, skipped from cycle");
                }
            }
            Ok(TemplateSelection::Cycling(TemplateCycle::new(
                sequence, restart,
            )?))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::canvas::Command;
    use crate::context::{PassSnapshot, RenderContext};
    use crate::image_box::ImageCache;
    use crate::paragraph::{Paragraph, ParagraphStyle};
    use crate::text::Fragment;

    fn templates(names: &[&str]) -> Vec<PageTemplate> {
        names
            .iter()
            .map(|n| PageTemplate::new(*n, Size::a4()))
            .collect()
    }

    fn ctx() -> RenderContext {
        RenderContext::new(0, PassSnapshot::default(), ImageCache::new())
    }

    #[test]
    fn cycle_resumes_from_the_restart_marker() {
        let templates = templates(&["A", "B", "C"]);
        let directive = TemplateDirective::List(vec![
            "A".to_string(),
            "*".to_string(),
            "B".to_string(),
            "C".to_string(),
        ]);
        let mut selection = apply_directive(&templates, &directive).unwrap();
        let picks: Vec<usize> = (0..6).map(|_| selection.next_template()).collect();
        assert_eq!(picks, vec![0, 1, 2, 1, 2, 1]);
    }

    #[test]
    fn unknown_names_in_a_list_are_skipped() {
        let templates = templates(&["A", "B"]);
        let directive = TemplateDirective::List(vec![
            "A".to_string(),
            "missing".to_string(),
            "B".to_string(),
        ]);
        let mut selection = apply_directive(&templates, &directive).unwrap();
        assert_eq!(selection.next_template(), 0);
        assert_eq!(selection.next_template(), 1);
        assert_eq!(selection.next_template(), 0);
    }

    #[test]
    fn empty_cycle_is_an_error() {
        let templates = templates(&["A"]);
        let directive = TemplateDirective::List(vec!["missing".to_string()]);
        assert!(matches!(
            apply_directive(&templates, &directive),
            Err(PlatenError::InvalidTemplateCycle(_))
        ));
    }

    #[test]
    fn trailing_restart_marker_is_an_error() {
        let templates = templates(&["A"]);
        let directive = TemplateDirective::List(vec!["A".to_string(), "*".to_string()]);
        assert!(matches!(
            apply_directive(&templates, &directive),
            Err(PlatenError::InvalidTemplateCycle(_))
        ));
    }

    #[test]
    fn duplex_name_expands_to_an_alternating_cycle() {
        let templates = templates(&["cover", "body_left", "body_right"]);
        let directive = TemplateDirective::Name("body".to_string());
        let mut selection = apply_directive(&templates, &directive).unwrap();
        assert_eq!(selection.next_template(), 1);
        assert_eq!(selection.next_template(), 2);
        assert_eq!(selection.next_template(), 1);
    }

    #[test]
    fn duplex_pair_wins_over_an_exact_name_match() {
        let templates = templates(&["body", "body_left", "body_right"]);
        let directive = TemplateDirective::Name("body".to_string());
        let mut selection = apply_directive(&templates, &directive).unwrap();
        assert_eq!(selection.next_template(), 1);
        assert_eq!(selection.next_template(), 2);
        assert_eq!(selection.next_template(), 1);
    }

    #[test]
    fn unknown_single_name_is_fatal() {
        let templates = templates(&["A"]);
        let directive = TemplateDirective::Name("missing".to_string());
        assert!(matches!(
            apply_directive(&templates, &directive),
            Err(PlatenError::UnknownTemplate(_))
        ));
    }

    #[test]
    fn index_selection_is_bounds_checked() {
        let templates = templates(&["A", "B"]);
        assert_eq!(
            apply_directive(&templates, &TemplateDirective::Index(1)).unwrap(),
            TemplateSelection::Fixed(1)
        );
        assert!(matches!(
            apply_directive(&templates, &TemplateDirective::Index(2)),
            Err(PlatenError::UnknownTemplateIndex(2))
        ));
    }

    fn background_draw(orientation: Orientation, page: Size, px: (u32, u32)) -> Command {
        let bytes = crate::image_box::tests::png_bytes(px.0, px.1, false);
        let template = PageTemplate::new("main", page)
            .with_orientation(orientation)
            .with_background(Background::Raster(bytes));
        let mut canvas = Canvas::new(template.effective_size());
        let mut ctx = ctx();
        template.draw_decorations(&mut canvas, &mut ctx);
        canvas.show_page();
        let doc = canvas.finish();
        doc.pages[0]
            .commands
            .iter()
            .find(|c| matches!(c, Command::DrawImage { .. }))
            .cloned()
            .expect("background image command")
    }

    #[test]
    fn portrait_background_scales_proportionally() {
        let cmd = background_draw(Orientation::Portrait, Size::new(100.0, 200.0), (50, 50));
        // min factor is 2.0 on both axes.
        let Command::DrawImage { width, height, .. } = cmd else {
            panic!("expected an image");
        };
        assert_eq!((width, height), (100.0, 100.0));
    }

    #[test]
    fn landscape_background_uses_mixed_factors() {
        // 200x100 page, 50x25 image: factors are 4.0 both ways here, so
        // pick an uneven image instead.
        let cmd = background_draw(Orientation::Landscape, Size::new(200.0, 100.0), (50, 20));
        let Command::DrawImage { width, height, .. } = cmd else {
            panic!("expected an image");
        };
        // factor_w = 4.0, factor_h = 5.0; the historical formula draws
        // width from the image height and the max factor, height from the
        // image width and the min factor.
        assert_eq!((width, height), (100.0, 200.0));
    }

    #[test]
    fn bad_background_bytes_do_not_abort_decoration() {
        let template = PageTemplate::new("main", Size::a4())
            .with_background(Background::Raster(b"garbage".to_vec()))
            .with_static_frame(
                Rect::new(0.0, 0.0, 200.0, 50.0),
                vec![Box::new(Paragraph::new("header", ParagraphStyle::default()))],
            );
        let mut canvas = Canvas::new(Size::a4());
        let mut ctx = ctx();
        template.draw_decorations(&mut canvas, &mut ctx);
        canvas.show_page();
        let doc = canvas.finish();
        assert!(doc.pages[0].commands.iter().any(|c| matches!(
            c,
            Command::DrawString { text, .. } if text == "header"
        )));
    }

    #[test]
    fn pdf_background_is_queued_not_drawn() {
        let template = PageTemplate::new("main", Size::a4())
            .with_background(Background::PdfPage("letterhead#0".to_string()));
        let mut canvas = Canvas::new(Size::a4());
        let mut ctx = ctx();
        template.draw_decorations(&mut canvas, &mut ctx);
        canvas.show_page();
        let doc = canvas.finish();
        assert_eq!(doc.background_merges.len(), 1);
        assert!(
            !doc.pages[0]
                .commands
                .iter()
                .any(|c| matches!(c, Command::DrawImage { .. }))
        );
    }

    #[test]
    fn static_frames_substitute_page_references() {
        let footer = Paragraph::from_fragments(
            vec![Fragment::text("Page "), Fragment::page_number()],
            ParagraphStyle::default(),
        );
        let template = PageTemplate::new("main", Size::a4())
            .with_static_frame(Rect::new(0.0, 800.0, 200.0, 30.0), vec![Box::new(footer)]);
        let mut canvas = Canvas::new(Size::a4());
        let mut ctx = ctx();
        canvas.show_page();
        canvas.show_page();
        ctx.begin_page(3);
        template.draw_decorations(&mut canvas, &mut ctx);
        canvas.show_page();
        let doc = canvas.finish();
        assert!(doc.pages[2].commands.iter().any(|c| matches!(
            c,
            Command::DrawString { text, .. } if text == "3"
        )));
    }
}
