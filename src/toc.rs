//! Two-pass table of contents.
//!
//! Entries collected while laying a pass out are only known *after* the TOC
//! itself has been placed, so the block always renders the previous pass's
//! entries and reports itself unsatisfied until two consecutive passes agree.

use crate::canvas::Canvas;
use crate::context::{PassSnapshot, RenderContext};
use crate::flowable::Flowable;
use crate::paragraph::{Alignment, Paragraph, ParagraphStyle};
use crate::table::{ColumnWidth, Table, TableCell, TableStyle};
use crate::types::Size;

#[derive(Debug, Clone)]
pub struct TableOfContents {
    level_styles: Vec<ParagraphStyle>,
    right_column_width: f32,
    table: Option<Table>,
}

impl Default for TableOfContents {
    fn default() -> Self {
        Self::new()
    }
}

impl TableOfContents {
    pub fn new() -> Self {
        Self {
            level_styles: Vec::new(),
            right_column_width: 72.0,
            table: None,
        }
    }

    pub fn with_right_column_width(mut self, width: f32) -> Self {
        self.right_column_width = width;
        self
    }

    /// Appends the style for the next outline level. Levels deeper than the
    /// configured styles reuse the last one.
    pub fn with_level_style(mut self, style: ParagraphStyle) -> Self {
        self.level_styles.push(style);
        self
    }

    fn style_for(&self, level: usize) -> ParagraphStyle {
        match self.level_styles.get(level.min(self.level_styles.len().saturating_sub(1))) {
            Some(style) => style.clone(),
            None => ParagraphStyle {
                left_indent: level as f32 * 12.0,
                ..ParagraphStyle::default()
            },
        }
    }

    fn build_table(&self, ctx: &RenderContext, avail_width: f32) -> Table {
        let right = self.right_column_width.min(avail_width / 2.0);
        let left = (avail_width - right).max(0.0);
        let page_style = ParagraphStyle {
            alignment: Alignment::Right,
            ..ParagraphStyle::default()
        };
        let entries = &ctx.prior().toc_entries;
        let rows: Vec<Vec<TableCell>> = if entries.is_empty() {
            vec![vec![
                TableCell::new(vec![Box::new(Paragraph::new(
                    "(empty)",
                    self.style_for(0),
                ))]),
                TableCell::empty(),
            ]]
        } else {
            entries
                .iter()
                .map(|entry| {
                    vec![
                        TableCell::new(vec![Box::new(Paragraph::new(
                            entry.text.clone(),
                            self.style_for(entry.level),
                        ))]),
                        TableCell::new(vec![Box::new(Paragraph::new(
                            entry.page.to_string(),
                            page_style.clone(),
                        ))]),
                    ]
                })
                .collect()
        };
        Table::new(vec![ColumnWidth::Fixed(left), ColumnWidth::Fixed(right)], rows).with_style(
            TableStyle {
                grid: None,
                cell_padding: 0.0,
            },
        )
    }
}

impl Flowable for TableOfContents {
    fn wrap(&mut self, ctx: &mut RenderContext, avail_width: f32, avail_height: f32) -> Size {
        let mut table = self.build_table(ctx, avail_width);
        let size = table.wrap(ctx, avail_width, avail_height);
        self.table = Some(table);
        size
    }

    fn split(
        &mut self,
        ctx: &mut RenderContext,
        avail_width: f32,
        avail_height: f32,
    ) -> Vec<Box<dyn Flowable>> {
        if self.table.is_none() {
            self.wrap(ctx, avail_width, avail_height);
        }
        match self.table.as_mut() {
            Some(table) => table.split(ctx, avail_width, avail_height),
            None => Vec::new(),
        }
    }

    fn draw(&self, canvas: &mut Canvas, ctx: &mut RenderContext, x: f32, y: f32) {
        if let Some(table) = self.table.as_ref() {
            table.draw(canvas, ctx, x, y);
        }
    }

    /// Stable once the entry list stopped moving between passes.
    fn is_satisfied(&self, current: &PassSnapshot, prior: &PassSnapshot) -> bool {
        current.toc_entries == prior.toc_entries
    }
}
