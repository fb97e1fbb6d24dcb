//! Rich text block: styled fragments, padding, per-edge borders, inline
//! images, line splitting and outline registration.

use crate::canvas::Canvas;
use crate::context::RenderContext;
use crate::flowable::Flowable;
use crate::image_box::fit_factor;
use crate::text::{CharMetrics, Fragment, FragmentKind, LineBox, TextEngine};
use crate::types::{Color, Margins, Rect, Size};
use std::sync::Arc;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Alignment {
    #[default]
    Left,
    Center,
    Right,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BorderStyle {
    Solid,
    Dashed,
    Dotted,
}

impl BorderStyle {
    fn dash_pattern(self) -> &'static [f32] {
        match self {
            BorderStyle::Solid => &[],
            BorderStyle::Dashed => &[4.0, 2.0],
            BorderStyle::Dotted => &[1.0, 2.0],
        }
    }
}

/// One border edge. An edge without a style draws nothing and contributes
/// no thickness; a styled edge without a color falls back to the text
/// color.
#[derive(Debug, Clone, Copy, Default)]
pub struct BorderEdge {
    pub style: Option<BorderStyle>,
    pub width: f32,
    pub color: Option<Color>,
}

impl BorderEdge {
    pub fn solid(width: f32, color: Color) -> Self {
        Self {
            style: Some(BorderStyle::Solid),
            width,
            color: Some(color),
        }
    }

    fn thickness(&self) -> f32 {
        if self.style.is_some() { self.width } else { 0.0 }
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct BorderEdges {
    pub top: BorderEdge,
    pub right: BorderEdge,
    pub bottom: BorderEdge,
    pub left: BorderEdge,
}

impl BorderEdges {
    pub fn all(edge: BorderEdge) -> Self {
        Self {
            top: edge,
            right: edge,
            bottom: edge,
            left: edge,
        }
    }
}

#[derive(Debug, Clone)]
pub struct ParagraphStyle {
    pub font_name: String,
    pub font_size: f32,
    pub leading: f32,
    pub text_color: Color,
    pub back_color: Option<Color>,
    pub alignment: Alignment,
    pub left_indent: f32,
    pub right_indent: f32,
    pub padding: Margins,
    pub borders: BorderEdges,
}

impl Default for ParagraphStyle {
    fn default() -> Self {
        Self {
            font_name: "Helvetica".to_string(),
            font_size: 10.0,
            leading: 12.0,
            text_color: Color::BLACK,
            back_color: None,
            alignment: Alignment::Left,
            left_indent: 0.0,
            right_indent: 0.0,
            padding: Margins::zero(),
            borders: BorderEdges::default(),
        }
    }
}

/// Outline registration carried by a heading paragraph.
#[derive(Debug, Clone)]
pub struct OutlineTag {
    pub level: usize,
    pub closed: bool,
}

#[derive(Debug, Clone)]
pub struct Paragraph {
    frags: Vec<Fragment>,
    style: ParagraphStyle,
    engine: Arc<dyn TextEngine>,
    outline: Option<OutlineTag>,
    lines: Option<Vec<LineBox>>,
    width: f32,
    height: f32,
}

impl Paragraph {
    pub fn new(text: impl Into<String>, style: ParagraphStyle) -> Self {
        Self::from_fragments(vec![Fragment::text(text)], style)
    }

    pub fn from_fragments(frags: Vec<Fragment>, style: ParagraphStyle) -> Self {
        Self {
            frags,
            style,
            engine: Arc::new(CharMetrics::default()),
            outline: None,
            lines: None,
            width: 0.0,
            height: 0.0,
        }
    }

    pub fn with_engine(mut self, engine: Arc<dyn TextEngine>) -> Self {
        self.engine = engine;
        self
    }

    /// Marks this paragraph as a document outline entry at `level`.
    pub fn with_outline(mut self, level: usize) -> Self {
        self.outline = Some(OutlineTag {
            level,
            closed: false,
        });
        self
    }

    pub fn with_outline_closed(mut self, level: usize) -> Self {
        self.outline = Some(OutlineTag {
            level,
            closed: true,
        });
        self
    }

    fn plain_text(&self) -> String {
        self.frags.iter().map(|f| f.text.as_str()).collect()
    }

    /// Horizontal thickness that is not text: indents, padding, borders.
    fn dx(&self) -> f32 {
        let s = &self.style;
        s.left_indent
            + s.right_indent
            + s.padding.x()
            + s.borders.left.thickness()
            + s.borders.right.thickness()
    }

    fn dy(&self) -> f32 {
        let s = &self.style;
        s.padding.y() + s.borders.top.thickness() + s.borders.bottom.thickness()
    }

    fn substituted(&self, frag: &Fragment, ctx: &RenderContext) -> String {
        match frag.kind {
            FragmentKind::PageNumber => ctx.page_number().to_string(),
            FragmentKind::PageCount => ctx.page_count().to_string(),
            _ => frag.text.clone(),
        }
    }

    fn draw_edge(&self, canvas: &mut Canvas, edge: &BorderEdge, line: (f32, f32, f32, f32)) {
        let Some(style) = edge.style else { return };
        if edge.width <= 0.0 {
            return;
        }
        canvas.set_stroke_color(edge.color.unwrap_or(self.style.text_color));
        canvas.set_line_width(edge.width);
        canvas.set_line_dash(style.dash_pattern());
        canvas.stroke_line(line.0, line.1, line.2, line.3);
    }
}

impl Flowable for Paragraph {
    fn wrap(&mut self, ctx: &mut RenderContext, avail_width: f32, avail_height: f32) -> Size {
        let avail_height = ctx.max_height.track(avail_height);
        let inner_w = (avail_width - self.dx()).max(0.0);
        let inner_h = (avail_height - self.dy()).max(0.0);
        // Inline images scale from their requested size every time, so
        // repeated measurement cannot compound the reduction.
        let mut frags = self.frags.clone();
        for frag in &mut frags {
            if let FragmentKind::Image(image) = &mut frag.kind {
                let factor = fit_factor(image.width, image.height, inner_w, inner_h);
                image.width *= factor;
                image.height *= factor;
            }
        }
        let lines =
            self.engine
                .break_lines(&frags, self.style.font_size, self.style.leading, inner_w);
        let text_height: f32 = lines.iter().map(|l| l.height).sum();
        self.lines = Some(lines);
        self.width = avail_width;
        self.height = text_height + self.dy();
        Size::new(self.width, self.height)
    }

    fn split(
        &mut self,
        ctx: &mut RenderContext,
        avail_width: f32,
        avail_height: f32,
    ) -> Vec<Box<dyn Flowable>> {
        if self.frags.is_empty() {
            return Vec::new();
        }
        if self.lines.is_none() {
            self.wrap(ctx, avail_width, avail_height);
        }
        let Some(lines) = self.lines.as_ref() else {
            return Vec::new();
        };
        let budget = avail_height - self.dy();
        let mut used = 0.0;
        let mut fit = 0;
        for line in lines {
            if used + line.height > budget {
                break;
            }
            used += line.height;
            fit += 1;
        }
        if fit == 0 {
            return Vec::new();
        }
        if fit == lines.len() {
            return vec![Box::new(self.clone())];
        }
        let head_lines: Vec<LineBox> = lines[..fit].to_vec();
        let tail_frags: Vec<Fragment> = lines[fit..]
            .iter()
            .flat_map(|l| l.frags.iter().cloned())
            .collect();
        let head = Paragraph {
            frags: head_lines.iter().flat_map(|l| l.frags.clone()).collect(),
            style: self.style.clone(),
            engine: Arc::clone(&self.engine),
            outline: self.outline.clone(),
            width: self.width,
            height: used + self.dy(),
            lines: Some(head_lines),
        };
        // The continuation re-registers nothing: one heading, one entry.
        let tail = Paragraph {
            frags: tail_frags,
            style: self.style.clone(),
            engine: Arc::clone(&self.engine),
            outline: None,
            lines: None,
            width: 0.0,
            height: 0.0,
        };
        vec![Box::new(head), Box::new(tail)]
    }

    fn draw(&self, canvas: &mut Canvas, ctx: &mut RenderContext, x: f32, y: f32) {
        let s = &self.style;
        let box_x = x + s.left_indent;
        let box_w = self.width - s.left_indent - s.right_indent;
        if let Some(back) = s.back_color {
            canvas.set_fill_color(back);
            canvas.fill_rect(Rect::new(box_x, y, box_w, self.height));
        }
        let (x0, y0) = (box_x, y);
        let (x1, y1) = (box_x + box_w, y + self.height);
        self.draw_edge(canvas, &s.borders.top, (x0, y0, x1, y0));
        self.draw_edge(canvas, &s.borders.bottom, (x0, y1, x1, y1));
        self.draw_edge(canvas, &s.borders.left, (x0, y0, x0, y1));
        self.draw_edge(canvas, &s.borders.right, (x1, y0, x1, y1));

        canvas.set_font(&s.font_name, s.font_size);
        canvas.set_fill_color(s.text_color);
        let origin_x = box_x + s.borders.left.thickness() + s.padding.left;
        let inner_w = (self.width - self.dx()).max(0.0);
        let mut top = y + s.borders.top.thickness() + s.padding.top;
        for line in self.lines.iter().flatten() {
            let slack = (inner_w - line.width).max(0.0);
            let mut cursor = origin_x
                + match s.alignment {
                    Alignment::Left => 0.0,
                    Alignment::Center => slack / 2.0,
                    Alignment::Right => slack,
                };
            let baseline = top + s.font_size;
            for frag in &line.frags {
                match &frag.kind {
                    FragmentKind::Image(image) => {
                        canvas.draw_image(
                            cursor,
                            top,
                            image.width,
                            image.height,
                            &image.resource,
                            false,
                        );
                        cursor += image.width;
                    }
                    _ => {
                        let text = self.substituted(frag, ctx);
                        canvas.draw_string(cursor, baseline, &text);
                        cursor += self.engine.string_width(&text, s.font_size);
                    }
                }
            }
            top += line.height;
        }

        if let Some(tag) = &self.outline {
            let bookmark = canvas.bookmark_page();
            let text = self.plain_text();
            // A jump deeper than one level synthesizes the levels in
            // between, each reusing this entry's text.
            let mut next = ctx.last_outline_level().map_or(0, |l| l + 1);
            while next < tag.level {
                canvas.add_outline_entry(&text, bookmark, next, tag.closed);
                next += 1;
            }
            canvas.add_outline_entry(&text, bookmark, tag.level, tag.closed);
            ctx.set_last_outline_level(tag.level);
        }
    }

    fn outline_entry(&self) -> Option<(usize, String)> {
        self.outline
            .as_ref()
            .map(|tag| (tag.level, self.plain_text()))
    }

    fn substitute_page_refs(&mut self, page_number: usize, page_count: usize) {
        for frag in &mut self.frags {
            match frag.kind {
                FragmentKind::PageNumber => frag.text = page_number.to_string(),
                FragmentKind::PageCount => frag.text = page_count.to_string(),
                _ => {}
            }
        }
        // Cached line breaks hold the old digits.
        self.lines = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::canvas::Command;
    use crate::context::PassSnapshot;
    use crate::image_box::ImageCache;
    use crate::text::InlineImage;

    fn ctx() -> RenderContext {
        RenderContext::new(0, PassSnapshot::default(), ImageCache::new())
    }

    fn drawn_strings(canvas: Canvas) -> Vec<String> {
        let mut canvas = canvas;
        canvas.show_page();
        canvas
            .finish()
            .pages
            .remove(0)
            .commands
            .into_iter()
            .filter_map(|c| match c {
                Command::DrawString { text, .. } => Some(text),
                _ => None,
            })
            .collect()
    }

    #[test]
    fn height_is_lines_plus_padding_and_borders() {
        let style = ParagraphStyle {
            padding: Margins::all(3.0),
            borders: BorderEdges::all(BorderEdge::solid(1.0, Color::BLACK)),
            ..ParagraphStyle::default()
        };
        // 5pt/char at 10pt font; "aa bb cc dd" at 28pt inner width breaks
        // into two lines of 12pt leading.
        let mut para = Paragraph::new("aa bb cc dd", style);
        let size = para.wrap(&mut ctx(), 36.0, 500.0);
        assert_eq!(size.width, 36.0);
        assert_eq!(size.height, 24.0 + 6.0 + 2.0);
    }

    #[test]
    fn split_divides_at_a_line_boundary() {
        let mut para = Paragraph::new("aa bb cc dd ee ff", ParagraphStyle::default()).with_outline(0);
        let mut ctx = ctx();
        para.wrap(&mut ctx, 28.0, 500.0);
        // Three lines of 12pt; 25pt fits two.
        let parts = para.split(&mut ctx, 28.0, 25.0);
        assert_eq!(parts.len(), 2);
        let mut c = RenderContext::new(0, PassSnapshot::default(), ImageCache::new());
        let mut head = parts[0].clone();
        let mut tail = parts[1].clone();
        assert_eq!(head.wrap(&mut c, 28.0, 500.0).height, 24.0);
        assert_eq!(tail.wrap(&mut c, 28.0, 500.0).height, 12.0);
        assert!(head.outline_entry().is_some());
        assert!(tail.outline_entry().is_none());
    }

    #[test]
    fn split_refuses_when_not_even_one_line_fits() {
        let mut para = Paragraph::new("aa bb cc", ParagraphStyle::default());
        let mut ctx = ctx();
        para.wrap(&mut ctx, 28.0, 500.0);
        assert!(para.split(&mut ctx, 28.0, 5.0).is_empty());
    }

    #[test]
    fn empty_paragraph_refuses_to_split() {
        let mut para = Paragraph::from_fragments(Vec::new(), ParagraphStyle::default());
        assert!(para.split(&mut ctx(), 100.0, 100.0).is_empty());
    }

    #[test]
    fn page_refs_substitute_from_the_live_context() {
        let frags = vec![
            Fragment::text("Page "),
            Fragment::page_number(),
            Fragment::text(" of "),
            Fragment::page_count(),
        ];
        let mut para = Paragraph::from_fragments(frags, ParagraphStyle::default());
        let prior = PassSnapshot {
            page_count: 9,
            toc_entries: Vec::new(),
        };
        let mut ctx = RenderContext::new(1, prior, ImageCache::new());
        ctx.begin_page(4);
        para.wrap(&mut ctx, 500.0, 500.0);
        let mut canvas = Canvas::new(Size::a4());
        para.draw(&mut canvas, &mut ctx, 0.0, 0.0);
        let strings = drawn_strings(canvas);
        assert_eq!(strings, vec!["Page ", "4", " of ", "9"]);
    }

    #[test]
    fn border_color_falls_back_to_text_color() {
        let red = Color::rgb(1.0, 0.0, 0.0);
        let style = ParagraphStyle {
            text_color: red,
            borders: BorderEdges {
                top: BorderEdge {
                    style: Some(BorderStyle::Solid),
                    width: 1.0,
                    color: None,
                },
                ..BorderEdges::default()
            },
            ..ParagraphStyle::default()
        };
        let mut para = Paragraph::new("x", style);
        let mut ctx = ctx();
        para.wrap(&mut ctx, 100.0, 100.0);
        let mut canvas = Canvas::new(Size::a4());
        para.draw(&mut canvas, &mut ctx, 0.0, 0.0);
        canvas.show_page();
        let doc = canvas.finish();
        assert!(
            doc.pages[0]
                .commands
                .contains(&Command::SetStrokeColor(red))
        );
    }

    #[test]
    fn unstyled_edges_draw_nothing() {
        let mut para = Paragraph::new("x", ParagraphStyle::default());
        let mut ctx = ctx();
        para.wrap(&mut ctx, 100.0, 100.0);
        let mut canvas = Canvas::new(Size::a4());
        para.draw(&mut canvas, &mut ctx, 0.0, 0.0);
        canvas.show_page();
        let doc = canvas.finish();
        assert!(
            !doc.pages[0]
                .commands
                .iter()
                .any(|c| matches!(c, Command::StrokeLine { .. }))
        );
    }

    #[test]
    fn inline_image_is_capped_by_the_height_rule() {
        let mut cache = ImageCache::new();
        let bytes = crate::image_box::tests::png_bytes(10, 400, false);
        let decoded = cache.load(&bytes).unwrap();
        let frags = vec![Fragment::image(InlineImage {
            resource: decoded.resource.clone(),
            width: 10.0,
            height: 400.0,
        })];
        let mut para = Paragraph::from_fragments(frags, ParagraphStyle::default());
        let size = para.wrap(&mut ctx(), 500.0, 200.0);
        // 95% of 200pt available height.
        assert!((size.height - 190.0).abs() < 0.001);
    }

    #[test]
    fn outline_jump_synthesizes_intermediate_levels() {
        let mut ctx = ctx();
        let mut canvas = Canvas::new(Size::a4());
        let mut h1 = Paragraph::new("One", ParagraphStyle::default()).with_outline(0);
        h1.wrap(&mut ctx, 200.0, 200.0);
        h1.draw(&mut canvas, &mut ctx, 0.0, 0.0);
        let mut h4 = Paragraph::new("Deep", ParagraphStyle::default()).with_outline(3);
        h4.wrap(&mut ctx, 200.0, 200.0);
        h4.draw(&mut canvas, &mut ctx, 0.0, 20.0);
        let levels: Vec<usize> = canvas.outline_entries().iter().map(|e| e.level).collect();
        assert_eq!(levels, vec![0, 1, 2, 3]);
        assert_eq!(canvas.outline_entries()[1].text, "Deep");
    }

    #[test]
    fn outline_never_synthesizes_on_the_way_back_up() {
        let mut ctx = ctx();
        let mut canvas = Canvas::new(Size::a4());
        let mut deep = Paragraph::new("Deep", ParagraphStyle::default()).with_outline(2);
        deep.wrap(&mut ctx, 200.0, 200.0);
        deep.draw(&mut canvas, &mut ctx, 0.0, 0.0);
        let mut top = Paragraph::new("Top", ParagraphStyle::default()).with_outline(0);
        top.wrap(&mut ctx, 200.0, 200.0);
        top.draw(&mut canvas, &mut ctx, 0.0, 20.0);
        let levels: Vec<usize> = canvas.outline_entries().iter().map(|e| e.level).collect();
        assert_eq!(levels, vec![0, 1, 2, 0]);
    }
}
