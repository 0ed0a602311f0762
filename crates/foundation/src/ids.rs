use std::fmt;
use std::sync::Arc;

/// Identifier of a pickable scene object (a model instance).
///
/// Ids are namespaced by the overlay that produced them (`"<overlay>/<record>"`)
/// so two overlays can never report the same hover target.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ObjectId(Arc<str>);

impl ObjectId {
    pub fn new(id: impl AsRef<str>) -> Self {
        Self(Arc::from(id.as_ref()))
    }

    pub fn scoped(namespace: &str, local: &str) -> Self {
        Self::new(format!("{namespace}/{local}"))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The namespace part of a scoped id, if any.
    pub fn namespace(&self) -> Option<&str> {
        self.0.split_once('/').map(|(ns, _)| ns)
    }
}

impl fmt::Display for ObjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
