//! Face/canvas registry
//!
//! The registry owns one lazily created [`DrawingSurface`] per face, the
//! latest texture of each, and the undo history. "Active" is an index into
//! the owned slots; switching faces never drops the outgoing surface.
//!
//! Every mutation goes through [`FaceRegistry::edit`], which drains the
//! surface's change queue afterwards. Structural changes re-rasterize the
//! face and record a history entry; selection changes do neither.

use drawing::{
    DrawingSurface, HistoryLedger, RasterError, Rasterizer, Snapshot, SurfaceChange,
    SurfaceError, Texture,
};
use foldcard_config::{CARD_HEIGHT, CARD_WIDTH, EditorConfig, HistoryScope};
use foldcard_ipc::Face;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::export::{self, ExportError, ExportedImage};

#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("{0} has no surface")]
    NoSurface(Face),

    #[error(transparent)]
    Surface(#[from] SurfaceError),
}

/// Identifies one specific surface instance of a face
///
/// Disposing a face bumps its generation, invalidating older handles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SurfaceHandle {
    pub face: Face,
    pub generation: u64,
}

/// Per-face record
#[derive(Debug, Default)]
struct FaceSlot {
    surface: Option<DrawingSurface>,
    texture: Option<Texture>,
    generation: u64,
}

/// Result of regenerating a face texture
#[derive(Debug)]
pub enum TextureOutcome {
    /// New texture stored under this revision
    Updated(u64),
    /// Rasterization failed; the previous texture is still in place
    Failed(RasterError),
}

/// What happened after a surface reported structural changes
#[derive(Debug)]
pub struct SurfaceUpdate {
    pub face: Face,
    pub changes: Vec<SurfaceChange>,
    pub texture: TextureOutcome,
    /// Whether a history entry was recorded
    pub recorded: bool,
}

/// Return value of a surface edit plus the resulting update, if any
#[derive(Debug)]
pub struct EditOutcome<R> {
    pub value: R,
    pub update: Option<SurfaceUpdate>,
}

/// Latest texture of every face
#[derive(Debug, Clone, Default)]
pub struct TextureSet([Option<Texture>; 4]);

impl TextureSet {
    pub fn get(&self, face: Face) -> Option<&Texture> {
        self.0[face.index()].as_ref()
    }

    pub fn set(&mut self, face: Face, texture: Option<Texture>) {
        self.0[face.index()] = texture;
    }

    pub fn iter(&self) -> impl Iterator<Item = (Face, Option<&Texture>)> {
        Face::ALL.into_iter().map(|face| (face, self.get(face)))
    }

    pub fn is_empty(&self) -> bool {
        self.0.iter().all(Option::is_none)
    }
}

#[derive(Debug)]
enum HistoryLedgers {
    PerFace([HistoryLedger; 4]),
    Shared(HistoryLedger),
}

impl HistoryLedgers {
    fn new(scope: HistoryScope, limit: Option<usize>) -> Self {
        match scope {
            HistoryScope::PerFace => {
                HistoryLedgers::PerFace(std::array::from_fn(|_| HistoryLedger::new(limit)))
            }
            HistoryScope::Shared => HistoryLedgers::Shared(HistoryLedger::new(limit)),
        }
    }

    fn get(&self, face: Face) -> &HistoryLedger {
        match self {
            HistoryLedgers::PerFace(ledgers) => &ledgers[face.index()],
            HistoryLedgers::Shared(ledger) => ledger,
        }
    }

    fn get_mut(&mut self, face: Face) -> &mut HistoryLedger {
        match self {
            HistoryLedgers::PerFace(ledgers) => &mut ledgers[face.index()],
            HistoryLedgers::Shared(ledger) => ledger,
        }
    }

    /// Forget a disposed face's timeline. The shared ledger is left alone.
    fn forget(&mut self, face: Face) {
        if let HistoryLedgers::PerFace(ledgers) = self {
            ledgers[face.index()].clear();
        }
    }

    fn clear(&mut self) {
        match self {
            HistoryLedgers::PerFace(ledgers) => ledgers.iter_mut().for_each(HistoryLedger::clear),
            HistoryLedgers::Shared(ledger) => ledger.clear(),
        }
    }
}

/// Owner of all four face surfaces, their textures and history
#[derive(Debug)]
pub struct FaceRegistry {
    slots: [FaceSlot; 4],
    active: Face,
    histories: HistoryLedgers,
    rasterizer: Rasterizer,
    width: u32,
    height: u32,
    guides: bool,
    next_revision: u64,
}

impl FaceRegistry {
    /// Create a registry with the front-left face selected
    pub fn new(config: &EditorConfig, rasterizer: Rasterizer) -> Self {
        let mut registry = Self {
            slots: Default::default(),
            active: Face::FrontLeft,
            histories: HistoryLedgers::new(config.history.scope, config.history.max_entries()),
            rasterizer,
            width: CARD_WIDTH,
            height: CARD_HEIGHT,
            guides: config.canvas.guides,
            next_revision: 1,
        };
        registry.ensure_surface(Face::FrontLeft);
        registry
    }

    pub fn rasterizer(&self) -> &Rasterizer {
        &self.rasterizer
    }

    pub fn dimensions(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    /// Create the face's surface if it does not exist yet
    fn ensure_surface(&mut self, face: Face) -> &mut DrawingSurface {
        let (width, height) = (self.width, self.height);
        let slot = &mut self.slots[face.index()];
        if slot.surface.is_none() {
            let surface = if self.guides {
                DrawingSurface::with_guides(width, height)
            } else {
                DrawingSurface::blank(width, height)
            };
            // Seed history so the first edit can be undone back to a blank face
            match surface.serialize() {
                Ok(snapshot) => {
                    self.histories.get_mut(face).push(snapshot);
                }
                Err(e) => warn!("Could not record initial state of {}: {}", face, e),
            }
            debug!("Created surface for {} (generation {})", face, slot.generation);
            slot.surface = Some(surface);
        }
        slot.surface.get_or_insert_with(|| DrawingSurface::blank(width, height))
    }

    /// Make `face` the live surface, creating it on first visit
    ///
    /// Returns whether the active face changed.
    pub fn select_face(&mut self, face: Face) -> bool {
        self.ensure_surface(face);
        if self.active == face {
            return false;
        }
        info!("Switching live surface {} -> {}", self.active, face);
        self.active = face;
        true
    }

    pub fn active_face(&self) -> Face {
        self.active
    }

    /// The surface bound to the editing UI
    pub fn live_surface(&self) -> Option<&DrawingSurface> {
        self.surface(self.active)
    }

    pub fn surface(&self, face: Face) -> Option<&DrawingSurface> {
        self.slots[face.index()].surface.as_ref()
    }

    /// Handle to the face's current surface instance
    pub fn handle(&self, face: Face) -> Option<SurfaceHandle> {
        let slot = &self.slots[face.index()];
        slot.surface.as_ref().map(|_| SurfaceHandle {
            face,
            generation: slot.generation,
        })
    }

    pub fn is_valid(&self, handle: SurfaceHandle) -> bool {
        let slot = &self.slots[handle.face.index()];
        slot.surface.is_some() && slot.generation == handle.generation
    }

    /// Mutate the live surface
    pub fn edit<R>(&mut self, f: impl FnOnce(&mut DrawingSurface) -> R) -> EditOutcome<R> {
        self.edit_face(self.active, f)
    }

    /// Mutate a face's surface, creating it if needed
    pub fn edit_face<R>(
        &mut self,
        face: Face,
        f: impl FnOnce(&mut DrawingSurface) -> R,
    ) -> EditOutcome<R> {
        let value = f(self.ensure_surface(face));
        let update = self.on_surface_changed(face);
        EditOutcome { value, update }
    }

    /// Mutate the surface a handle points at, if it is still valid
    pub fn edit_handle<R>(
        &mut self,
        handle: SurfaceHandle,
        f: impl FnOnce(&mut DrawingSurface) -> R,
    ) -> Option<EditOutcome<R>> {
        if !self.is_valid(handle) {
            debug!("Dropping edit for stale surface {:?}", handle);
            return None;
        }
        Some(self.edit_face(handle.face, f))
    }

    /// Drain a face's change queue; on structural changes regenerate its
    /// texture and record a history entry
    pub fn on_surface_changed(&mut self, face: Face) -> Option<SurfaceUpdate> {
        let surface = self.slots[face.index()].surface.as_mut()?;
        let changes = surface.take_changes();
        if !changes.iter().any(SurfaceChange::is_structural) {
            return None;
        }

        let recorded = match surface.serialize() {
            Ok(snapshot) => self.histories.get_mut(face).push(snapshot),
            Err(e) => {
                warn!("Could not record history for {}: {}", face, e);
                false
            }
        };
        let texture = self.refresh_texture(face)?;
        Some(SurfaceUpdate {
            face,
            changes,
            texture,
            recorded,
        })
    }

    /// Rasterize a face into a new texture
    ///
    /// On failure the previous texture is kept. None if the face has no surface.
    pub fn refresh_texture(&mut self, face: Face) -> Option<TextureOutcome> {
        let slot = &mut self.slots[face.index()];
        let surface = slot.surface.as_ref()?;
        Some(match self.rasterizer.rasterize(surface) {
            Ok(pixels) => {
                let revision = self.next_revision;
                self.next_revision += 1;
                slot.texture = Some(Texture::new(pixels, revision));
                debug!("Updated {} texture to revision {}", face, revision);
                TextureOutcome::Updated(revision)
            }
            Err(e) => {
                warn!("Rasterizing {} failed, keeping previous texture: {}", face, e);
                TextureOutcome::Failed(e)
            }
        })
    }

    /// Load a snapshot into a face without recording history
    pub fn apply_snapshot(
        &mut self,
        face: Face,
        snapshot: &Snapshot,
    ) -> Result<SurfaceUpdate, RegistryError> {
        let surface = self.slots[face.index()]
            .surface
            .as_mut()
            .ok_or(RegistryError::NoSurface(face))?;
        surface.deserialize(snapshot)?;
        let changes = surface.take_changes();
        let texture = self
            .refresh_texture(face)
            .ok_or(RegistryError::NoSurface(face))?;
        Ok(SurfaceUpdate {
            face,
            changes,
            texture,
            recorded: false,
        })
    }

    /// Step the active face's history back
    ///
    /// Ok(None) when there is nothing to undo.
    pub fn undo(&mut self) -> Result<Option<SurfaceUpdate>, RegistryError> {
        let face = self.active;
        let Some(snapshot) = self.histories.get_mut(face).undo() else {
            return Ok(None);
        };
        debug!("Undo on {}", face);
        self.apply_snapshot(face, &snapshot).map(Some).inspect_err(|_| {
            // Surface never changed, put the cursor back
            self.histories.get_mut(face).redo();
        })
    }

    /// Step the active face's history forward
    pub fn redo(&mut self) -> Result<Option<SurfaceUpdate>, RegistryError> {
        let face = self.active;
        let Some(snapshot) = self.histories.get_mut(face).redo() else {
            return Ok(None);
        };
        debug!("Redo on {}", face);
        self.apply_snapshot(face, &snapshot).map(Some).inspect_err(|_| {
            self.histories.get_mut(face).undo();
        })
    }

    pub fn can_undo(&self) -> bool {
        self.histories.get(self.active).can_undo()
    }

    pub fn can_redo(&self) -> bool {
        self.histories.get(self.active).can_redo()
    }

    pub fn texture(&self, face: Face) -> Option<&Texture> {
        self.slots[face.index()].texture.as_ref()
    }

    pub fn textures(&self) -> TextureSet {
        TextureSet(std::array::from_fn(|i| self.slots[i].texture.clone()))
    }

    /// Encode the cached texture of a face for download
    pub fn export_face(&self, face: Face) -> Result<ExportedImage, ExportError> {
        export::export_face(face, self.texture(face))
    }

    /// Tear down a face's surface and texture
    ///
    /// Handles captured before this call become invalid.
    pub fn dispose(&mut self, face: Face) {
        let slot = &mut self.slots[face.index()];
        if slot.surface.take().is_some() {
            debug!("Disposed surface for {}", face);
        }
        slot.texture = None;
        slot.generation += 1;
        self.histories.forget(face);
    }

    /// Tear down every surface; the registry starts over on next use
    pub fn end_session(&mut self) {
        for face in Face::ALL {
            self.dispose(face);
        }
        self.histories.clear();
        info!("Editor session ended");
    }
}
