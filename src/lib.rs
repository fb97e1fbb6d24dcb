//! Pagination and flow layout for document rendering.
//!
//! `platen` is the middle of an HTML-to-PDF pipeline: upstream translation
//! turns markup into a story of [`Flowable`] items, and this crate measures
//! them, breaks them across pages and frames, runs page templates with
//! their static decorations, resolves forward references (total page count,
//! table of contents) over multiple layout passes, and records everything
//! as drawing commands on a [`Canvas`]. Serializing those commands into
//! actual PDF bytes is the downstream writer's job.
//!
//! ```
//! use platen::{DocTemplate, PageTemplate, Paragraph, ParagraphStyle, Size};
//!
//! let mut doc = DocTemplate::new().with_template(PageTemplate::new("main", Size::a4()));
//! doc.add_flowable(Box::new(Paragraph::new("Hello", ParagraphStyle::default())));
//! let document = doc.build()?;
//! assert_eq!(document.pages.len(), 1);
//! # Ok::<(), platen::PlatenError>(())
//! ```

pub mod canvas;
pub mod context;
pub mod doc_template;
pub mod error;
pub mod flowable;
pub mod frame;
pub mod image_box;
pub mod page_template;
pub mod paragraph;
pub mod table;
pub mod text;
pub mod toc;
pub mod types;

pub use canvas::{
    BackgroundMerge, Bookmark, BookmarkId, Canvas, Command, Document, ImageResource, OutlineEntry,
    Page,
};
pub use context::{
    MaxHeightTracker, PassSnapshot, RenderContext, SMALL_FRAME_THRESHOLD, TocEntry,
};
pub use doc_template::{DocTemplate, MAX_RENDER_PASSES};
pub use error::PlatenError;
pub use flowable::{
    ConditionalPageBreak, FieldKind, Flowable, FlowableClone, FormField, NextPageTemplate,
    PageBreak, PageCountPlaceholder, PageParity, Spacer, TemplateDirective,
};
pub use frame::{AddResult, Frame};
pub use image_box::{DecodedImage, ImageBox, ImageCache, MAX_IMAGE_RATIO};
pub use page_template::{
    Background, Orientation, PageTemplate, StaticFrame, TemplateCycle, TemplateSelection,
};
pub use paragraph::{
    Alignment, BorderEdge, BorderEdges, BorderStyle, OutlineTag, Paragraph, ParagraphStyle,
};
pub use table::{ColumnWidth, Table, TableCell, TableStyle, resolve_column_widths};
pub use text::{CharMetrics, Fragment, FragmentKind, InlineImage, LineBox, TextEngine};
pub use toc::TableOfContents;
pub use types::{Color, Margins, Rect, Size};
