//! Lookups over a [`World`].

use super::ObjectKey;
use super::graph::World;
use crate::errors::{Result, SceneError};

impl World {
    /// First object (in insertion order) with the given manifest id.
    #[must_use]
    pub fn find_by_id(&self, id: &str) -> Option<ObjectKey> {
        self.iter().find(|o| o.id() == id).map(|o| o.key())
    }

    /// Direct child of `parent` with the given name.
    #[must_use]
    pub fn find_child(&self, parent: ObjectKey, name: &str) -> Option<ObjectKey> {
        self.children(parent)
            .iter()
            .copied()
            .find(|&child| self.get(child).is_some_and(|o| o.name() == name))
    }

    /// Resolves a `/`-separated path of object names.
    ///
    /// Without an origin, or when the path starts with `/`, the first segment
    /// names a root object. `..` steps to the parent and `.` stays put.
    ///
    /// ```rust,ignore
    /// let wheel = world.resolve_path("Car/Body/Wheel", None)?;
    /// let body = world.resolve_path("..", Some(wheel))?;
    /// let sibling = world.resolve_path("../Door", Some(wheel))?;
    /// ```
    pub fn resolve_path(&self, path: &str, from: Option<ObjectKey>) -> Result<ObjectKey> {
        let not_found = || SceneError::PathNotFound(path.to_string());

        if path.is_empty() {
            return Err(not_found().into());
        }

        if let Some(origin) = from
            && !self.contains(origin)
        {
            return Err(SceneError::ObjectNotFound.into());
        }

        // `None` is the virtual root above all root objects.
        let mut current = if path.starts_with('/') { None } else { from };

        for segment in path.split('/') {
            match segment {
                "" | "." => {}
                ".." => {
                    let key = current.ok_or_else(not_found)?;
                    current = self.parent(key);
                }
                name => {
                    let next = match current {
                        Some(key) => self.find_child(key, name),
                        None => self
                            .roots()
                            .find(|&root| self.get(root).is_some_and(|o| o.name() == name)),
                    };
                    current = Some(next.ok_or_else(not_found)?);
                }
            }
        }

        current.ok_or_else(|| not_found().into())
    }
}
