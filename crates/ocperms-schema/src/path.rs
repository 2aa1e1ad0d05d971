use std::fmt;

/// One step into a JSON document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PathSegment {
    /// Object member.
    Field(&'static str),
    /// Array element.
    Index(usize),
}

/// Location of a value inside a validated document.
///
/// Renders as `policies[2].type`; the document root renders as `$`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FieldPath {
    segments: Vec<PathSegment>,
}

impl FieldPath {
    /// The document root.
    pub fn root() -> Self {
        Self::default()
    }

    /// Path to member `name` of the value at this path.
    pub fn field(&self, name: &'static str) -> Self {
        self.with(PathSegment::Field(name))
    }

    /// Path to element `index` of the array at this path.
    pub fn index(&self, index: usize) -> Self {
        self.with(PathSegment::Index(index))
    }

    pub fn segments(&self) -> &[PathSegment] {
        &self.segments
    }

    pub fn is_root(&self) -> bool {
        self.segments.is_empty()
    }

    fn with(&self, segment: PathSegment) -> Self {
        let mut segments = Vec::with_capacity(self.segments.len() + 1);
        segments.extend_from_slice(&self.segments);
        segments.push(segment);
        Self { segments }
    }
}

impl fmt::Display for FieldPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.segments.is_empty() {
            return f.write_str("$");
        }

        for (position, segment) in self.segments.iter().enumerate() {
            match segment {
                PathSegment::Field(name) if position == 0 => f.write_str(name)?,
                PathSegment::Field(name) => write!(f, ".{name}")?,
                PathSegment::Index(index) => write!(f, "[{index}]")?,
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn root_renders_as_dollar() {
        assert_eq!(FieldPath::root().to_string(), "$");
        assert!(FieldPath::root().is_root());
    }

    #[test]
    fn mixed_segments_render_like_accessors() {
        let path = FieldPath::root().field("policies").index(2).field("type");
        assert_eq!(path.to_string(), "policies[2].type");

        let path = FieldPath::root().index(1).field("permission").field("data");
        assert_eq!(path.to_string(), "[1].permission.data");
    }

    #[test]
    fn extending_does_not_mutate_parent() {
        let parent = FieldPath::root().field("accountMeta");
        let child = parent.field("factory");
        assert_eq!(parent.segments().len(), 1);
        assert_eq!(child.segments().len(), 2);
    }
}
