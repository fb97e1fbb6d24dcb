//! Text measurement and line breaking seam.
//!
//! Real font metrics and shaping live outside this crate. Layout only needs
//! two answers, both behind the [`TextEngine`] trait: how wide is this
//! string, and where do these fragments break into lines. The built-in
//! [`CharMetrics`] engine answers with a flat per-character advance, which
//! is enough for layout tests and for callers that plug real metrics in
//! later.

use crate::canvas::ImageResource;
use std::fmt;

/// An image flowing inline with text, already scaled to its display size.
#[derive(Debug, Clone)]
pub struct InlineImage {
    pub resource: ImageResource,
    pub width: f32,
    pub height: f32,
}

#[derive(Debug, Clone)]
pub enum FragmentKind {
    Text,
    /// Placeholder substituted with the current page number at draw time.
    PageNumber,
    /// Placeholder substituted with the total page count at draw time.
    PageCount,
    Image(InlineImage),
}

/// A run of content with uniform treatment. `text` is the display text;
/// for placeholder kinds it holds the most recently substituted value.
#[derive(Debug, Clone)]
pub struct Fragment {
    pub text: String,
    pub kind: FragmentKind,
}

impl Fragment {
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            kind: FragmentKind::Text,
        }
    }

    pub fn page_number() -> Self {
        Self {
            text: "0".to_string(),
            kind: FragmentKind::PageNumber,
        }
    }

    pub fn page_count() -> Self {
        Self {
            text: "0".to_string(),
            kind: FragmentKind::PageCount,
        }
    }

    pub fn image(image: InlineImage) -> Self {
        Self {
            text: String::new(),
            kind: FragmentKind::Image(image),
        }
    }
}

/// One laid-out line: the fragments it carries, its measured width and its
/// height (the leading, or taller if an inline image demands it).
#[derive(Debug, Clone)]
pub struct LineBox {
    pub frags: Vec<Fragment>,
    pub width: f32,
    pub height: f32,
}

pub trait TextEngine: fmt::Debug + Send + Sync {
    fn string_width(&self, text: &str, font_size: f32) -> f32;

    /// Greedy word wrap. Words never break internally; a word wider than
    /// the whole line gets a line of its own and overflows.
    fn break_lines(
        &self,
        frags: &[Fragment],
        font_size: f32,
        leading: f32,
        avail_width: f32,
    ) -> Vec<LineBox> {
        let tokens = tokenize(frags);
        if tokens.is_empty() {
            return Vec::new();
        }
        let space = self.string_width(" ", font_size);
        let mut lines: Vec<LineBox> = Vec::new();
        let mut builder = LineBuilder::new(leading);
        for token in tokens {
            let width = match &token.kind {
                FragmentKind::Image(image) => image.width,
                _ => self.string_width(&token.text, font_size),
            };
            let lead = if builder.is_empty() || !token.space_before {
                0.0
            } else {
                space
            };
            if !builder.is_empty() && builder.width + lead + width > avail_width {
                lines.push(builder.finish());
                builder = LineBuilder::new(leading);
                builder.push(token, width, 0.0);
            } else {
                builder.push(token, width, lead);
            }
        }
        if !builder.is_empty() {
            lines.push(builder.finish());
        }
        lines
    }
}

struct Token {
    text: String,
    kind: FragmentKind,
    space_before: bool,
}

/// Splits text fragments into words while preserving whether whitespace
/// separated each token from the previous one. Boundary whitespace matters:
/// "Page " followed by a page-number placeholder must not fuse into
/// "Page3".
fn tokenize(frags: &[Fragment]) -> Vec<Token> {
    let mut tokens = Vec::new();
    let mut pending_space = false;
    for frag in frags {
        match &frag.kind {
            FragmentKind::Text => {
                if frag
                    .text
                    .chars()
                    .next()
                    .is_some_and(|c| c.is_whitespace())
                {
                    pending_space = true;
                }
                for word in frag.text.split_whitespace() {
                    tokens.push(Token {
                        text: word.to_string(),
                        kind: FragmentKind::Text,
                        space_before: pending_space,
                    });
                    pending_space = true;
                }
                pending_space = frag
                    .text
                    .chars()
                    .last()
                    .is_some_and(|c| c.is_whitespace());
            }
            kind => {
                tokens.push(Token {
                    text: frag.text.clone(),
                    kind: kind.clone(),
                    space_before: pending_space,
                });
                pending_space = false;
            }
        }
    }
    // The very first token never carries a leading space.
    if let Some(first) = tokens.first_mut() {
        first.space_before = false;
    }
    tokens
}

struct LineBuilder {
    frags: Vec<Fragment>,
    width: f32,
    height: f32,
}

impl LineBuilder {
    fn new(leading: f32) -> Self {
        Self {
            frags: Vec::new(),
            width: 0.0,
            height: leading,
        }
    }

    fn is_empty(&self) -> bool {
        self.frags.is_empty()
    }

    fn push(&mut self, token: Token, width: f32, lead: f32) {
        if let FragmentKind::Image(image) = &token.kind {
            self.height = self.height.max(image.height);
        }
        let separate = lead > 0.0;
        // Plain words merge into the trailing text fragment; everything
        // else stays its own fragment so draw can substitute or blit it.
        let merged = matches!(token.kind, FragmentKind::Text)
            && matches!(
                self.frags.last().map(|f| &f.kind),
                Some(FragmentKind::Text)
            );
        if merged {
            if let Some(last) = self.frags.last_mut() {
                if separate {
                    last.text.push(' ');
                }
                last.text.push_str(&token.text);
            }
        } else {
            let mut text = token.text;
            if separate {
                // The separating space has to live in some fragment's text
                // so draw advances over it. For placeholder and image
                // tokens it attaches to the preceding text fragment.
                match (&token.kind, self.frags.last_mut()) {
                    (FragmentKind::Text, _) => text.insert(0, ' '),
                    (_, Some(prev)) if matches!(prev.kind, FragmentKind::Text) => {
                        prev.text.push(' ');
                    }
                    _ => self.frags.push(Fragment::text(" ")),
                }
            }
            self.frags.push(Fragment {
                text,
                kind: token.kind,
            });
        }
        self.width += lead + width;
    }

    fn finish(self) -> LineBox {
        LineBox {
            frags: self.frags,
            width: self.width,
            height: self.height,
        }
    }
}

/// Flat average-advance metrics: every character is a fixed fraction of the
/// font size wide.
#[derive(Debug, Clone)]
pub struct CharMetrics {
    em_fraction: f32,
}

impl CharMetrics {
    pub fn new(em_fraction: f32) -> Self {
        Self { em_fraction }
    }
}

impl Default for CharMetrics {
    fn default() -> Self {
        Self { em_fraction: 0.5 }
    }
}

impl TextEngine for CharMetrics {
    fn string_width(&self, text: &str, font_size: f32) -> f32 {
        text.chars().count() as f32 * self.em_fraction * font_size
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn line_text(line: &LineBox) -> String {
        line.frags.iter().map(|f| f.text.as_str()).collect()
    }

    #[test]
    fn char_metrics_scale_with_font_size() {
        let engine = CharMetrics::default();
        assert_eq!(engine.string_width("abcd", 10.0), 20.0);
        assert_eq!(engine.string_width("abcd", 20.0), 40.0);
    }

    #[test]
    fn greedy_wrap_fills_each_line() {
        let engine = CharMetrics::default();
        let frags = [Fragment::text("aa bb cc dd")];
        // 10pt font, 5pt/char: each word is 10pt, a space 5pt. 28pt fits
        // "aa bb" (25pt) but not "aa bb cc".
        let lines = engine.break_lines(&frags, 10.0, 12.0, 28.0);
        assert_eq!(lines.len(), 2);
        assert_eq!(line_text(&lines[0]), "aa bb");
        assert_eq!(line_text(&lines[1]), "cc dd");
        assert_eq!(lines[0].width, 25.0);
        assert_eq!(lines[0].height, 12.0);
    }

    #[test]
    fn oversized_word_gets_its_own_line() {
        let engine = CharMetrics::default();
        let frags = [Fragment::text("a incomprehensibilities b")];
        let lines = engine.break_lines(&frags, 10.0, 12.0, 30.0);
        assert_eq!(lines.len(), 3);
        assert_eq!(line_text(&lines[1]), "incomprehensibilities");
    }

    #[test]
    fn boundary_whitespace_survives_around_placeholders() {
        let engine = CharMetrics::default();
        let frags = [
            Fragment::text("Page "),
            Fragment::page_number(),
            Fragment::text(" of "),
            Fragment::page_count(),
        ];
        let lines = engine.break_lines(&frags, 10.0, 12.0, 1000.0);
        assert_eq!(lines.len(), 1);
        // Placeholders stay separate fragments; the spacing is carried by
        // the measured width, not fused text.
        assert_eq!(lines[0].frags.len(), 4);
        assert_eq!(lines[0].frags[0].text, "Page ");
        assert!(matches!(lines[0].frags[1].kind, FragmentKind::PageNumber));
        assert_eq!(lines[0].frags[2].text, " of ");
        // "Page" + space + "0" + space + "of" + space + "0".
        assert_eq!(lines[0].width, 65.0);
    }

    #[test]
    fn empty_fragments_produce_no_lines() {
        let engine = CharMetrics::default();
        assert!(engine.break_lines(&[], 10.0, 12.0, 100.0).is_empty());
        assert!(
            engine
                .break_lines(&[Fragment::text("   ")], 10.0, 12.0, 100.0)
                .is_empty()
        );
    }
}
