use std::fmt;

/// Errors surfaced by document building.
///
/// Configuration problems (template lookup, cycle construction) and image
/// decode failures are fatal to the render; failures while painting page
/// decorations are recovered locally and never reach this type.
#[derive(Debug)]
pub enum PlatenError {
    /// The document was built without any page template.
    MissingPageTemplate,
    /// A template selection referenced a name not present in the document.
    UnknownTemplate(String),
    /// A template selection referenced an out-of-range position.
    UnknownTemplateIndex(usize),
    /// A template cycle resolved to nothing, or its restart position is
    /// beyond the end of the sequence.
    InvalidTemplateCycle(String),
    /// Image bytes could not be decoded.
    ImageDecode(String),
    /// A flowable could not be placed on an empty page and refused to split.
    UnplaceableFlowable(String),
    /// Forward references failed to stabilize within the pass budget.
    PassLimitExceeded(usize),
}

impl fmt::Display for PlatenError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PlatenError::MissingPageTemplate => write!(f, "no page template available"),
            PlatenError::UnknownTemplate(name) => {
                write!(f, "can't find page template '{}'", name)
            }
            PlatenError::UnknownTemplateIndex(index) => {
                write!(f, "page template index {} out of range", index)
            }
            PlatenError::InvalidTemplateCycle(message) => {
                write!(f, "invalid template cycle: {}", message)
            }
            PlatenError::ImageDecode(message) => write!(f, "image decode failed: {}", message),
            PlatenError::UnplaceableFlowable(message) => {
                write!(f, "flowable cannot fit on any page: {}", message)
            }
            PlatenError::PassLimitExceeded(passes) => {
                write!(
                    f,
                    "document did not stabilize within {} render passes",
                    passes
                )
            }
        }
    }
}

impl std::error::Error for PlatenError {}

impl From<image::ImageError> for PlatenError {
    fn from(err: image::ImageError) -> Self {
        PlatenError::ImageDecode(err.to_string())
    }
}
