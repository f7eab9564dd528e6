//! Retained-mode drawing surface
//!
//! A [`DrawingSurface`] owns an ordered list of [`DrawingObject`]s (back to
//! front). Every mutation queues a [`SurfaceChange`]; the owner drains them
//! with [`DrawingSurface::take_changes`] and decides whether to re-rasterize.
//! Selection changes are queued too but are never structural.

use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use crate::constants::{GUIDE_WIDTH, SNAPSHOT_VERSION};
use crate::object::{DrawingObject, GuideLine, ObjectBase, ObjectId, ObjectKind, ObjectPatch};

#[derive(Debug, Error)]
pub enum SurfaceError {
    #[error("Unknown object {0}")]
    UnknownObject(ObjectId),

    #[error("Object {0} is not selectable")]
    NotSelectable(ObjectId),

    #[error("Invalid value for {field}: {reason}")]
    InvalidPatch { field: &'static str, reason: String },

    #[error("Text fields cannot be applied to {kind} object {id}")]
    PatchKindMismatch { id: ObjectId, kind: &'static str },

    #[error("Snapshot is {}x{} but surface is {}x{}", found.0, found.1, expected.0, expected.1)]
    DimensionMismatch {
        expected: (u32, u32),
        found: (u32, u32),
    },

    #[error("Unsupported snapshot version {0}")]
    UnsupportedVersion(u32),

    #[error("Snapshot encoding failed: {0}")]
    Snapshot(#[from] serde_json::Error),
}

/// Change notification queued by every surface mutation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SurfaceChange {
    ObjectAdded(ObjectId),
    ObjectRemoved(ObjectId),
    ObjectModified(ObjectId),
    /// Z-order of an object changed
    Reordered(ObjectId),
    /// All non-guide objects were removed
    Cleared { removed: usize },
    /// Content was replaced from a snapshot
    Reloaded,
    /// Selection moved; does not alter content
    SelectionChanged(Option<ObjectId>),
}

impl SurfaceChange {
    /// Whether the change alters rendered content
    pub fn is_structural(&self) -> bool {
        !matches!(self, SurfaceChange::SelectionChanged(_))
    }
}

/// Opaque serialized state of a surface's full object list
#[derive(Clone, PartialEq, Eq)]
pub struct Snapshot(Arc<str>);

impl Snapshot {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Debug for Snapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Snapshot({} bytes)", self.0.len())
    }
}

#[derive(Serialize)]
struct DocumentRef<'a> {
    version: u32,
    width: u32,
    height: u32,
    next_id: u64,
    objects: &'a [DrawingObject],
}

#[derive(Deserialize)]
struct Document {
    version: u32,
    width: u32,
    height: u32,
    next_id: u64,
    objects: Vec<DrawingObject>,
}

/// A 2D retained-mode canvas of placeable objects
#[derive(Debug)]
pub struct DrawingSurface {
    width: u32,
    height: u32,
    /// Objects in paint order (back to front)
    objects: Vec<DrawingObject>,
    next_id: u64,
    selection: Option<ObjectId>,
    changes: Vec<SurfaceChange>,
}

impl DrawingSurface {
    /// Create an empty surface without guides
    pub fn blank(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            objects: Vec::new(),
            next_id: 1,
            selection: None,
            changes: Vec::new(),
        }
    }

    /// Create a surface with the vertical and horizontal centre guides
    pub fn with_guides(width: u32, height: u32) -> Self {
        let mut surface = Self::blank(width, height);
        let (w, h) = (width as f32, height as f32);
        let center = ObjectBase::at(w / 2.0, h / 2.0);
        for (from, to) in [
            ([0.0, -h / 2.0], [0.0, h / 2.0]),
            ([-w / 2.0, 0.0], [w / 2.0, 0.0]),
        ] {
            surface.add_object(
                center.clone(),
                ObjectKind::Guide(GuideLine {
                    from,
                    to,
                    color: [0.6, 0.6, 0.6, 0.8],
                    width: GUIDE_WIDTH,
                    dashed: true,
                }),
            );
        }
        // Guides are part of the blank state, not an edit
        surface.changes.clear();
        surface
    }

    #[inline]
    pub fn width(&self) -> u32 {
        self.width
    }

    #[inline]
    pub fn height(&self) -> u32 {
        self.height
    }

    /// All objects in paint order, guides included
    pub fn objects(&self) -> &[DrawingObject] {
        &self.objects
    }

    /// Objects that are not guides
    pub fn content(&self) -> impl Iterator<Item = &DrawingObject> {
        self.objects.iter().filter(|o| !o.is_guide())
    }

    /// Number of non-guide objects
    pub fn content_count(&self) -> usize {
        self.content().count()
    }

    /// Number of objects, guides included
    pub fn object_count(&self) -> usize {
        self.objects.len()
    }

    /// Number of objects that end up in textures and exports
    pub fn exportable_count(&self) -> usize {
        self.objects.iter().filter(|o| !o.base.export_excluded).count()
    }

    pub fn object(&self, id: ObjectId) -> Option<&DrawingObject> {
        self.objects.iter().find(|o| o.id == id)
    }

    fn index_of(&self, id: ObjectId) -> Result<usize, SurfaceError> {
        self.objects
            .iter()
            .position(|o| o.id == id)
            .ok_or(SurfaceError::UnknownObject(id))
    }

    /// Add an object on top of the stack
    ///
    /// Guides are always forced non-selectable and export-excluded.
    pub fn add_object(&mut self, mut base: ObjectBase, kind: ObjectKind) -> ObjectId {
        if matches!(kind, ObjectKind::Guide(_)) {
            base.selectable = false;
            base.export_excluded = true;
        }
        let id = ObjectId(self.next_id);
        self.next_id += 1;
        debug!("Adding {} object {}", kind.name(), id);
        self.objects.push(DrawingObject { id, base, kind });
        self.changes.push(SurfaceChange::ObjectAdded(id));
        id
    }

    /// Remove an object, returning it
    pub fn remove_object(&mut self, id: ObjectId) -> Result<DrawingObject, SurfaceError> {
        let index = self.index_of(id)?;
        let object = self.objects.remove(index);
        if self.selection == Some(id) {
            self.selection = None;
            self.changes.push(SurfaceChange::SelectionChanged(None));
        }
        self.changes.push(SurfaceChange::ObjectRemoved(id));
        Ok(object)
    }

    /// Apply a partial update to an object
    ///
    /// Returns whether anything changed; unchanged patches queue nothing.
    pub fn mutate_object(&mut self, id: ObjectId, patch: &ObjectPatch) -> Result<bool, SurfaceError> {
        let index = self.index_of(id)?;
        let changed = self.objects[index].apply_patch(patch)?;
        if changed {
            self.changes.push(SurfaceChange::ObjectModified(id));
        }
        Ok(changed)
    }

    /// Select a single object
    pub fn select(&mut self, id: ObjectId) -> Result<(), SurfaceError> {
        let index = self.index_of(id)?;
        if !self.objects[index].base.selectable {
            return Err(SurfaceError::NotSelectable(id));
        }
        if self.selection != Some(id) {
            self.selection = Some(id);
            self.changes.push(SurfaceChange::SelectionChanged(Some(id)));
        }
        Ok(())
    }

    pub fn clear_selection(&mut self) {
        if self.selection.take().is_some() {
            self.changes.push(SurfaceChange::SelectionChanged(None));
        }
    }

    pub fn selection(&self) -> Option<ObjectId> {
        self.selection
    }

    /// Remove the selected object, if any
    pub fn remove_selected(&mut self) -> Result<Option<DrawingObject>, SurfaceError> {
        match self.selection {
            Some(id) => self.remove_object(id).map(Some),
            None => Ok(None),
        }
    }

    /// Remove every non-guide object. Returns how many were removed.
    pub fn clear(&mut self) -> usize {
        let before = self.objects.len();
        self.objects.retain(DrawingObject::is_guide);
        let removed = before - self.objects.len();
        if removed > 0 {
            self.clear_selection();
            self.changes.push(SurfaceChange::Cleared { removed });
        }
        removed
    }

    /// Move an object to the top of the stack
    pub fn bring_to_front(&mut self, id: ObjectId) -> Result<bool, SurfaceError> {
        let index = self.index_of(id)?;
        if index + 1 == self.objects.len() {
            return Ok(false);
        }
        let object = self.objects.remove(index);
        self.objects.push(object);
        self.changes.push(SurfaceChange::Reordered(id));
        Ok(true)
    }

    /// Move an object to the bottom of the stack
    pub fn send_to_back(&mut self, id: ObjectId) -> Result<bool, SurfaceError> {
        let index = self.index_of(id)?;
        if index == 0 {
            return Ok(false);
        }
        let object = self.objects.remove(index);
        self.objects.insert(0, object);
        self.changes.push(SurfaceChange::Reordered(id));
        Ok(true)
    }

    /// Serialize the full object list
    pub fn serialize(&self) -> Result<Snapshot, SurfaceError> {
        let json = serde_json::to_string(&DocumentRef {
            version: SNAPSHOT_VERSION,
            width: self.width,
            height: self.height,
            next_id: self.next_id,
            objects: &self.objects,
        })?;
        Ok(Snapshot(json.into()))
    }

    /// Replace all objects with the content of a snapshot
    ///
    /// The snapshot is fully decoded before the surface is touched.
    pub fn deserialize(&mut self, snapshot: &Snapshot) -> Result<(), SurfaceError> {
        let document: Document = serde_json::from_str(snapshot.as_str())?;
        if document.version > SNAPSHOT_VERSION {
            return Err(SurfaceError::UnsupportedVersion(document.version));
        }
        if (document.width, document.height) != (self.width, self.height) {
            return Err(SurfaceError::DimensionMismatch {
                expected: (self.width, self.height),
                found: (document.width, document.height),
            });
        }

        let max_id = document.objects.iter().map(|o| o.id.0).max().unwrap_or(0);
        self.next_id = document.next_id.max(max_id + 1);
        self.objects = document.objects;
        self.clear_selection();
        self.changes.push(SurfaceChange::Reloaded);
        debug!("Reloaded surface with {} objects", self.objects.len());
        Ok(())
    }

    /// Drain queued change notifications
    pub fn take_changes(&mut self) -> Vec<SurfaceChange> {
        std::mem::take(&mut self.changes)
    }

    /// Whether any queued change alters content
    pub fn has_structural_changes(&self) -> bool {
        self.changes.iter().any(SurfaceChange::is_structural)
    }
}
