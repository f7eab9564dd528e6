//! Editor facade
//!
//! [`Editor`] ties the registry, scene binder and image loader together. UI
//! commands come in through [`Editor::dispatch`] or the individual methods;
//! everything worth telling the user goes out as an [`EditorEvent`], both to
//! subscribed listeners and to an outbound queue the host drains.

use std::path::PathBuf;

use drawing::{
    DrawingSurface, FontBook, FontWeight, ObjectBase, ObjectId, ObjectKind, ObjectPatch,
    Rasterizer, SurfaceChange, SurfaceError, TextObject, mime_for_path, placed_image, validate,
};
use foldcard_config::{EditorConfig, OVERSAMPLE};
use foldcard_ipc::{AddTextRequest, EditorCommand, EditorEvent, Face};
use glam::Vec3;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::binder::{SceneBinder, SceneSink};
use crate::export::{self, ExportError, ExportedImage};
use crate::loader::{ImageLoader, ImportCompletion, ImportTicket};
use crate::registry::{FaceRegistry, RegistryError, SurfaceHandle, SurfaceUpdate, TextureOutcome};

#[derive(Debug, Error)]
pub enum EditorError {
    #[error(transparent)]
    Surface(#[from] SurfaceError),

    #[error(transparent)]
    Export(#[from] ExportError),

    #[error(transparent)]
    Registry(#[from] RegistryError),
}

/// Callback receiving every editor event
pub type Listener = Box<dyn FnMut(&EditorEvent) + Send>;

/// The four-faced card editor
pub struct Editor {
    config: EditorConfig,
    registry: FaceRegistry,
    binder: SceneBinder,
    loader: ImageLoader,
    listeners: Vec<Listener>,
    outbound: Vec<EditorEvent>,
}

impl Editor {
    /// Create an editor using system fonts plus the configured font dirs
    pub fn new(config: EditorConfig) -> Self {
        let mut fonts = FontBook::system();
        for dir in &config.text.font_dirs {
            fonts.load_fonts_dir(dir);
        }
        if fonts.is_empty() {
            warn!("No fonts found, text objects will not render");
        }
        let rasterizer =
            Rasterizer::new(fonts, OVERSAMPLE).with_background(config.canvas.background);
        Self::with_rasterizer(config, rasterizer)
    }

    pub fn with_rasterizer(config: EditorConfig, rasterizer: Rasterizer) -> Self {
        let registry = FaceRegistry::new(&config, rasterizer);
        let binder = SceneBinder::new(config.scene.clone());
        let loader = ImageLoader::new(config.import.max_bytes);
        info!("Editor ready on {}", registry.active_face());
        Self {
            config,
            registry,
            binder,
            loader,
            listeners: Vec::new(),
            outbound: Vec::new(),
        }
    }

    pub fn config(&self) -> &EditorConfig {
        &self.config
    }

    pub fn registry(&self) -> &FaceRegistry {
        &self.registry
    }

    pub fn binder(&self) -> &SceneBinder {
        &self.binder
    }

    pub fn active_face(&self) -> Face {
        self.registry.active_face()
    }

    pub fn live_surface(&self) -> Option<&DrawingSurface> {
        self.registry.live_surface()
    }

    /// Register a listener for all future events
    pub fn subscribe(&mut self, listener: impl FnMut(&EditorEvent) + Send + 'static) {
        self.listeners.push(Box::new(listener));
    }

    /// Take every event queued since the last drain
    pub fn drain_events(&mut self) -> Vec<EditorEvent> {
        std::mem::take(&mut self.outbound)
    }

    fn emit(&mut self, event: EditorEvent) {
        for listener in &mut self.listeners {
            listener(&event);
        }
        self.outbound.push(event);
    }

    /// Report what a surface update did
    fn publish(&mut self, update: Option<SurfaceUpdate>) {
        let Some(update) = update else {
            return;
        };
        let face = update.face;
        for change in &update.changes {
            match change {
                SurfaceChange::ObjectAdded(id) => {
                    self.emit(EditorEvent::ObjectAdded { face, id: *id })
                }
                SurfaceChange::ObjectRemoved(id) => {
                    self.emit(EditorEvent::ObjectRemoved { face, id: *id })
                }
                _ => {}
            }
        }
        match update.texture {
            TextureOutcome::Updated(revision) => {
                self.emit(EditorEvent::TextureUpdated { face, revision })
            }
            TextureOutcome::Failed(e) => self.emit(EditorEvent::TextureFailed {
                face,
                reason: e.to_string(),
            }),
        }
    }

    /// Run a mutation on the live surface and publish the result
    fn edit<R>(&mut self, f: impl FnOnce(&mut DrawingSurface) -> R) -> R {
        let outcome = self.registry.edit(f);
        self.publish(outcome.update);
        outcome.value
    }

    /// Make `face` the live surface (face button)
    pub fn select_face(&mut self, face: Face) -> bool {
        let changed = self.registry.select_face(face);
        if changed {
            self.emit(EditorEvent::FaceSelected { face });
        }
        changed
    }

    /// Face clicked in the 3D preview
    pub fn click_face(&mut self, face: Face) -> bool {
        debug!("3D click on {}", face);
        self.select_face(face)
    }

    pub fn hover_face(&mut self, face: Option<Face>) -> bool {
        self.binder.hover(face)
    }

    /// Resolve a click ray against the card and select the face it hits
    pub fn pick_at(&mut self, origin: Vec3, dir: Vec3, time: f32) -> Option<Face> {
        let face = self.binder.click(origin, dir, time)?;
        self.click_face(face);
        Some(face)
    }

    /// Update hover from a pointer ray
    pub fn hover_at(&mut self, origin: Vec3, dir: Vec3, time: f32) -> Option<Face> {
        self.binder.hover_at(origin, dir, time)
    }

    /// Add a text object to the live surface
    ///
    /// Values are checked with the same rules as [`ObjectPatch`] edits.
    pub fn add_text(&mut self, request: AddTextRequest) -> Result<ObjectId, EditorError> {
        let defaults = &self.config.text;
        let (width, height) = self.registry.dimensions();
        let [x, y] = request
            .position
            .unwrap_or([width as f32 / 2.0, height as f32 / 2.0]);
        let family = request
            .font_family
            .unwrap_or_else(|| defaults.font_family.clone());
        let size = request.font_size.unwrap_or(defaults.font_size);
        let fill = request.fill.unwrap_or(defaults.fill);
        ObjectPatch {
            x: Some(x),
            y: Some(y),
            font_family: Some(family.clone()),
            font_size: Some(size),
            fill: Some(fill),
            ..Default::default()
        }
        .validate()?;

        let weight = if request.bold.unwrap_or(defaults.bold) {
            FontWeight::Bold
        } else {
            FontWeight::Normal
        };
        let text = TextObject::new(request.text)
            .with_font(family, size, weight)
            .with_fill(fill);
        Ok(self.edit(|s| s.add_object(ObjectBase::at(x, y), ObjectKind::Text(text))))
    }

    pub fn mutate_object(&mut self, id: ObjectId, patch: &ObjectPatch) -> Result<bool, EditorError> {
        Ok(self.edit(|s| s.mutate_object(id, patch))?)
    }

    pub fn remove_object(&mut self, id: ObjectId) -> Result<(), EditorError> {
        self.edit(|s| s.remove_object(id))?;
        Ok(())
    }

    pub fn select_object(&mut self, id: ObjectId) -> Result<(), EditorError> {
        Ok(self.edit(|s| s.select(id))?)
    }

    /// Remove the selected object; returns its id if there was one
    pub fn remove_selected(&mut self) -> Result<Option<ObjectId>, EditorError> {
        let removed = self.edit(|s| s.remove_selected())?;
        Ok(removed.map(|object| object.id))
    }

    pub fn bring_to_front(&mut self, id: ObjectId) -> Result<bool, EditorError> {
        Ok(self.edit(|s| s.bring_to_front(id))?)
    }

    pub fn send_to_back(&mut self, id: ObjectId) -> Result<bool, EditorError> {
        Ok(self.edit(|s| s.send_to_back(id))?)
    }

    /// Step the live face's history back; returns whether anything changed
    pub fn undo(&mut self) -> Result<bool, EditorError> {
        let face = self.active_face();
        match self.registry.undo()? {
            Some(update) => {
                self.emit(EditorEvent::Undone { face });
                self.publish(Some(update));
                Ok(true)
            }
            None => {
                self.emit(EditorEvent::NothingToUndo { face });
                Ok(false)
            }
        }
    }

    pub fn redo(&mut self) -> Result<bool, EditorError> {
        let face = self.active_face();
        match self.registry.redo()? {
            Some(update) => {
                self.emit(EditorEvent::Redone { face });
                self.publish(Some(update));
                Ok(true)
            }
            None => {
                self.emit(EditorEvent::NothingToRedo { face });
                Ok(false)
            }
        }
    }

    /// Remove every content object from the live surface
    pub fn clear_face(&mut self) -> usize {
        let face = self.active_face();
        let removed = self.edit(|s| s.clear());
        self.emit(EditorEvent::CanvasCleared { face, removed });
        removed
    }

    /// Export the live face's current texture as PNG
    pub fn export_active(&mut self) -> Result<ExportedImage, EditorError> {
        let face = self.active_face();
        let result = self.registry.export_face(face);
        self.report_export(Some(face), result)
    }

    /// Export every textured face into one zip archive
    pub fn export_all(&mut self) -> Result<ExportedImage, EditorError> {
        let result = export::export_archive(&self.registry.textures());
        self.report_export(None, result)
    }

    fn report_export(
        &mut self,
        face: Option<Face>,
        result: Result<ExportedImage, ExportError>,
    ) -> Result<ExportedImage, EditorError> {
        match result {
            Ok(exported) => {
                info!("Exported {}", exported.file_name);
                self.emit(EditorEvent::Exported {
                    file_name: exported.file_name.clone(),
                    bytes: exported.bytes.len(),
                });
                Ok(exported)
            }
            Err(e) => {
                warn!("Export failed: {}", e);
                self.emit(EditorEvent::ExportFailed {
                    face,
                    reason: e.to_string(),
                });
                Err(e.into())
            }
        }
    }

    /// Handle of the live surface, recreating it after a session end
    fn live_handle(&mut self) -> Option<SurfaceHandle> {
        let face = self.active_face();
        self.registry.select_face(face);
        self.registry.handle(face)
    }

    fn reject_import(&mut self, reason: String) {
        warn!("Image import rejected: {}", reason);
        self.emit(EditorEvent::ImageRejected { reason });
    }

    /// Start importing an image file onto the live face
    ///
    /// The file type is checked up front; size, read and decode happen on
    /// the loader. Returns whether a load was started.
    pub fn request_image_import(&mut self, path: impl Into<PathBuf>) -> bool {
        let path = path.into();
        let mime = mime_for_path(&path);
        // Size is checked later against file metadata
        if let Err(e) = validate(&mime, 0, self.loader.max_bytes()) {
            self.reject_import(e.to_string());
            return false;
        }
        let Some(handle) = self.live_handle() else {
            return false;
        };
        let source = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());
        debug!("Importing {} onto {}", source, handle.face);
        self.loader.load_file(ImportTicket { handle, source }, path);
        true
    }

    /// Start importing in-memory image data onto the live face
    pub fn import_image_bytes(&mut self, name: &str, mime: &str, bytes: Vec<u8>) -> bool {
        if let Err(e) = validate(mime, bytes.len() as u64, self.loader.max_bytes()) {
            self.reject_import(e.to_string());
            return false;
        }
        let Some(handle) = self.live_handle() else {
            return false;
        };
        let ticket = ImportTicket {
            handle,
            source: name.to_string(),
        };
        self.loader.decode_bytes(ticket, bytes);
        true
    }

    /// Number of imports still in flight
    pub fn pending_imports(&self) -> usize {
        self.loader.pending()
    }

    /// Apply every import that has finished; returns how many were added
    pub fn pump_imports(&mut self) -> usize {
        let mut added = 0;
        while let Some(completion) = self.loader.try_recv() {
            if self.complete_import(completion) {
                added += 1;
            }
        }
        added
    }

    /// Wait for all in-flight imports and apply them
    pub async fn wait_for_imports(&mut self) -> usize {
        let mut added = self.pump_imports();
        while let Some(completion) = self.loader.recv().await {
            if self.complete_import(completion) {
                added += 1;
            }
        }
        added
    }

    fn complete_import(&mut self, completion: ImportCompletion) -> bool {
        let ImportCompletion { ticket, result } = completion;
        let source = match result {
            Ok(source) => source,
            Err(e) => {
                self.reject_import(format!("{}: {}", ticket.source, e));
                return false;
            }
        };

        let (width, height) = self.registry.dimensions();
        let (base, kind) = placed_image(source, width, height, self.config.import.fit_ratio);
        let Some(outcome) = self
            .registry
            .edit_handle(ticket.handle, |s| s.add_object(base, kind))
        else {
            debug!("Dropping import of {} for a disposed surface", ticket.source);
            return false;
        };

        let face = ticket.handle.face;
        info!("Added image {} to {}", ticket.source, face);
        self.emit(EditorEvent::ImageAdded {
            face,
            id: outcome.value,
        });
        self.publish(outcome.update);
        true
    }

    /// Push changed face materials to the renderer
    pub fn sync_scene(&mut self, sink: &mut dyn SceneSink) -> usize {
        let textures = self.registry.textures();
        self.binder.sync(&textures, self.registry.active_face(), sink)
    }

    /// Tear down one face's surface; pending imports for it are dropped
    pub fn dispose_face(&mut self, face: Face) {
        self.registry.dispose(face);
    }

    pub fn end_session(&mut self) {
        self.registry.end_session();
        self.binder.reset();
    }

    /// Apply one UI command
    ///
    /// Export commands return the produced file.
    pub fn dispatch(&mut self, command: EditorCommand) -> Result<Option<ExportedImage>, EditorError> {
        debug!("Dispatching {:?}", command);
        match command {
            EditorCommand::SelectFace { face } => {
                self.select_face(face);
            }
            EditorCommand::ClickFace { face } => {
                self.click_face(face);
            }
            EditorCommand::HoverFace { face } => {
                self.hover_face(face);
            }
            EditorCommand::AddText(request) => {
                self.add_text(request)?;
            }
            EditorCommand::ImportImage { path } => {
                self.request_image_import(path);
            }
            EditorCommand::MutateObject { id, patch } => {
                self.mutate_object(id, &patch)?;
            }
            EditorCommand::RemoveObject { id } => self.remove_object(id)?,
            EditorCommand::SelectObject { id } => self.select_object(id)?,
            EditorCommand::RemoveSelected => {
                self.remove_selected()?;
            }
            EditorCommand::BringToFront { id } => {
                self.bring_to_front(id)?;
            }
            EditorCommand::SendToBack { id } => {
                self.send_to_back(id)?;
            }
            EditorCommand::Undo => {
                self.undo()?;
            }
            EditorCommand::Redo => {
                self.redo()?;
            }
            EditorCommand::ClearCanvas => {
                self.clear_face();
            }
            EditorCommand::ExportActive => return self.export_active().map(Some),
            EditorCommand::ExportAll => return self.export_all().map(Some),
        }
        Ok(None)
    }
}
