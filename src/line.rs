use crate::transform::ParentTransform;

/// Two endpoints in the local frame of whatever placed them, plus the
/// transform from that frame to its parent.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct LineDefinition {
    start: [f64; 3],
    end: [f64; 3],
    parent_transform: Option<ParentTransform>,
}

impl LineDefinition {
    pub fn new(start: [f64; 3], end: [f64; 3]) -> Self {
        Self {
            start,
            end,
            parent_transform: None,
        }
    }

    pub fn with_parent_transform(mut self, parent: ParentTransform) -> Self {
        self.parent_transform = Some(parent);
        self
    }

    pub fn start(&self) -> [f64; 3] {
        self.start
    }

    pub fn end(&self) -> [f64; 3] {
        self.end
    }

    pub fn parent_transform(&self) -> Option<&ParentTransform> {
        self.parent_transform.as_ref()
    }

    pub(crate) fn is_finite(&self) -> bool {
        self.start.iter().chain(self.end.iter()).all(|c| c.is_finite())
    }
}
