//! Command-recording drawing surface.
//!
//! Flowables never touch output bytes. They record drawing commands onto a
//! [`Canvas`], one page at a time; the finished [`Document`] is the paginated
//! command sequence plus document-level registrations (bookmarks, outline,
//! producer metadata, queued background merges). Serializing that sequence
//! to PDF is the downstream writer's job.

use crate::types::{Color, Rect, Size};
use std::collections::HashMap;
use std::sync::Arc;

/// A drawing primitive recorded onto a page.
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    SaveState,
    RestoreState,
    Translate(f32, f32),
    SetFillColor(Color),
    SetStrokeColor(Color),
    SetLineWidth(f32),
    /// On/off dash lengths; empty means solid.
    SetLineDash(Vec<f32>),
    SetFont {
        name: String,
        size: f32,
    },
    FillRect {
        x: f32,
        y: f32,
        width: f32,
        height: f32,
    },
    StrokeRect {
        x: f32,
        y: f32,
        width: f32,
        height: f32,
    },
    StrokeLine {
        x1: f32,
        y1: f32,
        x2: f32,
        y2: f32,
    },
    DrawString {
        x: f32,
        y: f32,
        text: String,
    },
    DrawImage {
        x: f32,
        y: f32,
        width: f32,
        height: f32,
        digest: String,
        masked: bool,
    },
}

/// Raw image bytes registered with the canvas, keyed by content digest.
#[derive(Debug, Clone)]
pub struct ImageResource {
    pub digest: String,
    pub data: Arc<Vec<u8>>,
    pub width: u32,
    pub height: u32,
}

#[derive(Debug, Clone)]
pub struct Page {
    pub size: Size,
    pub commands: Vec<Command>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BookmarkId(pub usize);

/// A named position registered for outline navigation. Pages are 1-based.
#[derive(Debug, Clone, PartialEq)]
pub struct Bookmark {
    pub id: BookmarkId,
    pub page: usize,
}

#[derive(Debug, Clone, PartialEq)]
pub struct OutlineEntry {
    pub text: String,
    pub bookmark: BookmarkId,
    pub level: usize,
    pub closed: bool,
}

/// A full-page backdrop the downstream writer merges under the page content.
#[derive(Debug, Clone, PartialEq)]
pub struct BackgroundMerge {
    pub page: usize,
    pub reference: String,
}

/// The finished paginated drawing sequence.
#[derive(Debug, Clone)]
pub struct Document {
    pub pages: Vec<Page>,
    pub bookmarks: Vec<Bookmark>,
    pub outline: Vec<OutlineEntry>,
    pub background_merges: Vec<BackgroundMerge>,
    pub resources: HashMap<String, ImageResource>,
    pub producer: Option<String>,
}

pub struct Canvas {
    page_size: Size,
    pages: Vec<Page>,
    current: Vec<Command>,
    bookmarks: Vec<Bookmark>,
    outline: Vec<OutlineEntry>,
    background_merges: Vec<BackgroundMerge>,
    resources: HashMap<String, ImageResource>,
    producer: Option<String>,
    next_bookmark: usize,
}

impl Canvas {
    pub fn new(page_size: Size) -> Self {
        Self {
            page_size,
            pages: Vec::new(),
            current: Vec::new(),
            bookmarks: Vec::new(),
            outline: Vec::new(),
            background_merges: Vec::new(),
            resources: HashMap::new(),
            producer: None,
            next_bookmark: 0,
        }
    }

    /// 1-based number of the page currently being recorded.
    pub fn page_number(&self) -> usize {
        self.pages.len() + 1
    }

    pub fn page_size(&self) -> Size {
        self.page_size
    }

    /// Changes the size the current page will be emitted with. Templates
    /// with different orientations call this at page start.
    pub fn set_page_size(&mut self, size: Size) {
        self.page_size = size;
    }

    pub fn is_page_empty(&self) -> bool {
        self.current.is_empty()
    }

    pub fn pages_recorded(&self) -> usize {
        self.pages.len()
    }

    pub fn save_state(&mut self) {
        self.current.push(Command::SaveState);
    }

    pub fn restore_state(&mut self) {
        self.current.push(Command::RestoreState);
    }

    pub fn translate(&mut self, dx: f32, dy: f32) {
        self.current.push(Command::Translate(dx, dy));
    }

    pub fn set_fill_color(&mut self, color: Color) {
        self.current.push(Command::SetFillColor(color));
    }

    pub fn set_stroke_color(&mut self, color: Color) {
        self.current.push(Command::SetStrokeColor(color));
    }

    pub fn set_line_width(&mut self, width: f32) {
        self.current.push(Command::SetLineWidth(width));
    }

    pub fn set_line_dash(&mut self, pattern: &[f32]) {
        self.current.push(Command::SetLineDash(pattern.to_vec()));
    }

    pub fn set_font(&mut self, name: &str, size: f32) {
        self.current.push(Command::SetFont {
            name: name.to_string(),
            size,
        });
    }

    pub fn fill_rect(&mut self, rect: Rect) {
        self.current.push(Command::FillRect {
            x: rect.x,
            y: rect.y,
            width: rect.width,
            height: rect.height,
        });
    }

    pub fn stroke_rect(&mut self, rect: Rect) {
        self.current.push(Command::StrokeRect {
            x: rect.x,
            y: rect.y,
            width: rect.width,
            height: rect.height,
        });
    }

    pub fn stroke_line(&mut self, x1: f32, y1: f32, x2: f32, y2: f32) {
        self.current.push(Command::StrokeLine { x1, y1, x2, y2 });
    }

    pub fn draw_string(&mut self, x: f32, y: f32, text: &str) {
        self.current.push(Command::DrawString {
            x,
            y,
            text: text.to_string(),
        });
    }

    /// Records an image blit and registers its bytes as a shared resource.
    pub fn draw_image(
        &mut self,
        x: f32,
        y: f32,
        width: f32,
        height: f32,
        resource: &ImageResource,
        masked: bool,
    ) {
        self.resources
            .entry(resource.digest.clone())
            .or_insert_with(|| resource.clone());
        self.current.push(Command::DrawImage {
            x,
            y,
            width,
            height,
            digest: resource.digest.clone(),
            masked,
        });
    }

    /// Registers a bookmark anchored to the current page.
    pub fn bookmark_page(&mut self) -> BookmarkId {
        let id = BookmarkId(self.next_bookmark);
        self.next_bookmark += 1;
        self.bookmarks.push(Bookmark {
            id,
            page: self.page_number(),
        });
        id
    }

    pub fn add_outline_entry(&mut self, text: &str, bookmark: BookmarkId, level: usize, closed: bool) {
        self.outline.push(OutlineEntry {
            text: text.to_string(),
            bookmark,
            level,
            closed,
        });
    }

    pub fn outline_entries(&self) -> &[OutlineEntry] {
        &self.outline
    }

    /// Queues an embeddable page to be merged under the current page after
    /// content drawing; the reference is opaque to the layout engine.
    pub fn queue_background_merge(&mut self, reference: &str) {
        self.background_merges.push(BackgroundMerge {
            page: self.page_number(),
            reference: reference.to_string(),
        });
    }

    pub fn set_producer(&mut self, producer: &str) {
        self.producer = Some(producer.to_string());
    }

    /// Closes the current page and starts recording the next one.
    pub fn show_page(&mut self) {
        let commands = std::mem::take(&mut self.current);
        self.pages.push(Page {
            size: self.page_size,
            commands,
        });
    }

    /// Consumes the canvas. All pages must already have been shown.
    pub fn finish(self) -> Document {
        Document {
            pages: self.pages,
            bookmarks: self.bookmarks,
            outline: self.outline,
            background_merges: self.background_merges,
            resources: self.resources,
            producer: self.producer,
        }
    }
}
