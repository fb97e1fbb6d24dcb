//! Table block: column resolution, row sizing, row-boundary splitting.

use crate::canvas::Canvas;
use crate::context::RenderContext;
use crate::flowable::Flowable;
use crate::types::{Color, Rect, Size};

/// Column (or table) width request.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ColumnWidth {
    Fixed(f32),
    /// Percent of the resolved table width.
    Percent(f32),
    /// Share the leftover evenly with the other unconstrained columns.
    Auto,
}

/// Resolves column requests against a fixed total width.
///
/// Fixed and percent columns resolve first, clamped to the total. Auto
/// columns share the leftover evenly, but never drop below 1% of the total
/// so an overcommitted table cannot zero them out. If the sum then exceeds
/// the total, every column compresses by the same ratio, and whatever
/// positive rounding residue is left comes out of the first column.
pub fn resolve_column_widths(specs: &[ColumnWidth], total: f32) -> Vec<f32> {
    if specs.is_empty() {
        return Vec::new();
    }
    let mut widths = vec![0.0_f32; specs.len()];
    let mut pending = Vec::new();
    let mut claimed = 0.0;
    for (i, spec) in specs.iter().enumerate() {
        match *spec {
            ColumnWidth::Fixed(w) => {
                widths[i] = w.min(total);
                claimed += widths[i];
            }
            ColumnWidth::Percent(p) => {
                widths[i] = (p / 100.0 * total).min(total);
                claimed += widths[i];
            }
            ColumnWidth::Auto => pending.push(i),
        }
    }
    if !pending.is_empty() {
        let share = ((total - claimed) / pending.len() as f32).max(total * 0.01);
        for &i in &pending {
            widths[i] = share;
        }
    }
    let sum: f32 = widths.iter().sum();
    if sum > total && sum > 0.0 {
        let ratio = total / sum;
        for w in &mut widths {
            *w *= ratio;
        }
    }
    let diff = widths.iter().sum::<f32>() - total;
    if diff > 0.0 {
        widths[0] -= diff;
    }
    widths
}

/// One table cell: a vertical stack of flowables.
#[derive(Debug, Clone, Default)]
pub struct TableCell {
    content: Vec<Box<dyn Flowable>>,
}

impl TableCell {
    pub fn new(content: Vec<Box<dyn Flowable>>) -> Self {
        Self { content }
    }

    pub fn empty() -> Self {
        Self::default()
    }
}

#[derive(Debug, Clone)]
pub struct TableStyle {
    /// Stroke width and color for cell outlines; `None` draws no grid.
    pub grid: Option<(f32, Color)>,
    pub cell_padding: f32,
}

impl Default for TableStyle {
    fn default() -> Self {
        Self {
            grid: None,
            cell_padding: 2.0,
        }
    }
}

#[derive(Debug, Clone)]
struct ResolvedGeometry {
    col_widths: Vec<f32>,
    row_heights: Vec<f32>,
    /// Wrapped height of every cell child, indexed row, column, child.
    /// Draw stacks children by these instead of re-measuring.
    child_heights: Vec<Vec<Vec<f32>>>,
}

#[derive(Debug, Clone)]
pub struct Table {
    col_specs: Vec<ColumnWidth>,
    rows: Vec<Vec<TableCell>>,
    total_width: Option<ColumnWidth>,
    style: TableStyle,
    resolved: Option<ResolvedGeometry>,
}

impl Table {
    pub fn new(col_specs: Vec<ColumnWidth>, rows: Vec<Vec<TableCell>>) -> Self {
        Self {
            col_specs,
            rows,
            total_width: None,
            style: TableStyle::default(),
            resolved: None,
        }
    }

    pub fn with_total_width(mut self, width: ColumnWidth) -> Self {
        self.total_width = Some(width);
        self
    }

    pub fn with_style(mut self, style: TableStyle) -> Self {
        self.style = style;
        self
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    fn resolve_total(&self, avail_width: f32) -> f32 {
        match self.total_width {
            Some(ColumnWidth::Fixed(w)) => w.min(avail_width),
            Some(ColumnWidth::Percent(p)) => p / 100.0 * avail_width,
            Some(ColumnWidth::Auto) | None => avail_width,
        }
    }

    fn size_from(geometry: &ResolvedGeometry) -> Size {
        Size::new(
            geometry.col_widths.iter().sum(),
            geometry.row_heights.iter().sum(),
        )
    }
}

impl Flowable for Table {
    fn wrap(&mut self, ctx: &mut RenderContext, avail_width: f32, avail_height: f32) -> Size {
        let avail_height = ctx.max_height.track(avail_height);
        let total = self.resolve_total(avail_width);
        let col_widths = resolve_column_widths(&self.col_specs, total);
        let pad = self.style.cell_padding;
        let mut row_heights = Vec::with_capacity(self.rows.len());
        let mut child_heights = Vec::with_capacity(self.rows.len());
        for row in &mut self.rows {
            let mut row_height = 0.0_f32;
            let mut row_children = Vec::with_capacity(row.len());
            for (col, cell) in row.iter_mut().enumerate() {
                let inner_w = (col_widths.get(col).copied().unwrap_or(0.0) - 2.0 * pad).max(0.0);
                let mut cell_height = 0.0;
                let mut heights = Vec::with_capacity(cell.content.len());
                for child in &mut cell.content {
                    let h = child.wrap(ctx, inner_w, avail_height).height;
                    heights.push(h);
                    cell_height += h;
                }
                row_children.push(heights);
                row_height = row_height.max(cell_height + 2.0 * pad);
            }
            child_heights.push(row_children);
            row_heights.push(row_height);
        }
        let geometry = ResolvedGeometry {
            col_widths,
            row_heights,
            child_heights,
        };
        let size = Self::size_from(&geometry);
        self.resolved = Some(geometry);
        size
    }

    fn split(
        &mut self,
        ctx: &mut RenderContext,
        avail_width: f32,
        avail_height: f32,
    ) -> Vec<Box<dyn Flowable>> {
        if self.rows.is_empty() {
            return Vec::new();
        }
        if self.resolved.is_none() {
            self.wrap(ctx, avail_width, avail_height);
        }
        let Some(geometry) = self.resolved.as_ref() else {
            return Vec::new();
        };
        let mut used = 0.0;
        let mut fit = 0;
        for height in &geometry.row_heights {
            if used + height > avail_height {
                break;
            }
            used += height;
            fit += 1;
        }
        if fit == 0 {
            return Vec::new();
        }
        if fit == self.rows.len() {
            return vec![Box::new(self.clone())];
        }
        let head = Table {
            col_specs: self.col_specs.clone(),
            rows: self.rows[..fit].to_vec(),
            total_width: self.total_width,
            style: self.style.clone(),
            resolved: Some(ResolvedGeometry {
                col_widths: geometry.col_widths.clone(),
                row_heights: geometry.row_heights[..fit].to_vec(),
                child_heights: geometry.child_heights[..fit].to_vec(),
            }),
        };
        let tail = Table {
            col_specs: self.col_specs.clone(),
            rows: self.rows[fit..].to_vec(),
            total_width: self.total_width,
            style: self.style.clone(),
            resolved: None,
        };
        vec![Box::new(head), Box::new(tail)]
    }

    fn draw(&self, canvas: &mut Canvas, ctx: &mut RenderContext, x: f32, y: f32) {
        let Some(geometry) = self.resolved.as_ref() else {
            return;
        };
        let pad = self.style.cell_padding;
        let mut row_y = y;
        for (row_index, row) in self.rows.iter().enumerate() {
            let row_height = geometry.row_heights.get(row_index).copied().unwrap_or(0.0);
            let mut cell_x = x;
            for (col, cell) in row.iter().enumerate() {
                let col_width = geometry.col_widths.get(col).copied().unwrap_or(0.0);
                let mut child_y = row_y + pad;
                for (index, child) in cell.content.iter().enumerate() {
                    child.draw(canvas, ctx, cell_x + pad, child_y);
                    child_y += geometry
                        .child_heights
                        .get(row_index)
                        .and_then(|r| r.get(col))
                        .and_then(|c| c.get(index))
                        .copied()
                        .unwrap_or(0.0);
                }
                cell_x += col_width;
            }
            row_y += row_height;
        }
        if let Some((width, color)) = self.style.grid {
            canvas.set_stroke_color(color);
            canvas.set_line_width(width);
            canvas.set_line_dash(&[]);
            let mut row_y = y;
            for row_height in &geometry.row_heights {
                let mut cell_x = x;
                for col_width in &geometry.col_widths {
                    canvas.stroke_rect(Rect::new(cell_x, row_y, *col_width, *row_height));
                    cell_x += col_width;
                }
                row_y += row_height;
            }
        }
    }

    fn substitute_page_refs(&mut self, page_number: usize, page_count: usize) {
        for row in &mut self.rows {
            for cell in row {
                for child in &mut cell.content {
                    child.substitute_page_refs(page_number, page_count);
                }
            }
        }
        self.resolved = None;
    }
}
