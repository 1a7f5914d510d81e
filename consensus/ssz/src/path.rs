use std::fmt;

/// One step from a composite value into one of its children.
#[derive(Debug, PartialEq, Eq, Clone, Hash)]
pub enum PathSegment {
    /// A named container field.
    Field(String),
    /// An element of a vector or list.
    Index(usize),
}

impl fmt::Display for PathSegment {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            PathSegment::Field(name) => write!(f, ".{}", name),
            PathSegment::Index(i) => write!(f, "[{}]", i),
        }
    }
}

/// Renders segments as `a.b[3].c`, without a leading dot.
pub(crate) fn render_path<'a>(segments: impl Iterator<Item = &'a PathSegment>) -> String {
    let rendered = segments.map(|s| s.to_string()).collect::<String>();
    rendered.trim_start_matches('.').to_string()
}
