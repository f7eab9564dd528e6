//! PNG and archive export of face textures

use std::io::{Cursor, Write};
use std::path::{Path, PathBuf};

use drawing::{EncodeError, Texture};
use foldcard_ipc::Face;
use thiserror::Error;
use tracing::info;
use zip::ZipWriter;
use zip::write::SimpleFileOptions;

use crate::registry::TextureSet;

/// File name of the all-faces archive
pub const ARCHIVE_FILE_NAME: &str = "card-faces.zip";

#[derive(Debug, Error)]
pub enum ExportError {
    #[error("{0} has no texture to export yet")]
    NoTexture(Face),

    #[error("No face has been drawn on yet")]
    NothingToExport,

    #[error("Failed to encode texture: {0}")]
    Encode(#[from] EncodeError),

    #[error("Failed to build archive: {0}")]
    Archive(#[from] zip::result::ZipError),

    #[error("Failed to write export: {0}")]
    Io(#[from] std::io::Error),
}

/// An encoded file ready to hand to the user
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportedImage {
    pub file_name: String,
    pub mime: &'static str,
    pub bytes: Vec<u8>,
}

impl ExportedImage {
    /// Write the file into `dir`, returning its path
    pub fn write_to(&self, dir: &Path) -> Result<PathBuf, ExportError> {
        let path = dir.join(&self.file_name);
        std::fs::write(&path, &self.bytes)?;
        info!("Wrote {} ({} bytes)", path.display(), self.bytes.len());
        Ok(path)
    }
}

/// `card-<face-id>.png`
pub fn face_file_name(face: Face) -> String {
    format!("card-{}.png", face.id())
}

/// Encode the cached texture of one face
pub fn export_face(face: Face, texture: Option<&Texture>) -> Result<ExportedImage, ExportError> {
    let texture = texture.ok_or(ExportError::NoTexture(face))?;
    Ok(ExportedImage {
        file_name: face_file_name(face),
        mime: "image/png",
        bytes: texture.to_png()?,
    })
}

/// Bundle every textured face into one zip archive
///
/// PNG data is already compressed, so entries are stored.
pub fn export_archive(textures: &TextureSet) -> Result<ExportedImage, ExportError> {
    let mut zip = ZipWriter::new(Cursor::new(Vec::new()));
    let options = SimpleFileOptions::default().compression_method(zip::CompressionMethod::Stored);

    let mut written = 0;
    for (face, texture) in textures.iter() {
        let Some(texture) = texture else {
            continue;
        };
        zip.start_file(face_file_name(face), options)?;
        zip.write_all(&texture.to_png()?)?;
        written += 1;
    }
    if written == 0 {
        return Err(ExportError::NothingToExport);
    }

    let bytes = zip.finish()?.into_inner();
    Ok(ExportedImage {
        file_name: ARCHIVE_FILE_NAME.to_string(),
        mime: "application/zip",
        bytes,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::RgbaImage;

    fn texture(color: [u8; 4]) -> Texture {
        Texture::new(RgbaImage::from_pixel(4, 4, image::Rgba(color)), 1)
    }

    #[test]
    fn test_file_names() {
        assert_eq!(face_file_name(Face::FrontLeft), "card-front-left.png");
        assert_eq!(face_file_name(Face::BackRight), "card-back-right.png");
    }

    #[test]
    fn test_export_face() {
        let exported = export_face(Face::BackLeft, Some(&texture([9, 8, 7, 255]))).unwrap();
        assert_eq!(exported.file_name, "card-back-left.png");
        let decoded = image::load_from_memory(&exported.bytes).unwrap().to_rgba8();
        assert_eq!(decoded.get_pixel(0, 0).0, [9, 8, 7, 255]);
    }

    #[test]
    fn test_export_without_texture() {
        assert!(matches!(
            export_face(Face::FrontRight, None),
            Err(ExportError::NoTexture(Face::FrontRight))
        ));
    }

    #[test]
    fn test_archive_contains_textured_faces() {
        let mut textures = TextureSet::default();
        textures.set(Face::FrontLeft, Some(texture([255, 0, 0, 255])));
        textures.set(Face::BackRight, Some(texture([0, 0, 255, 255])));

        let archive = export_archive(&textures).unwrap();
        assert_eq!(archive.file_name, ARCHIVE_FILE_NAME);

        let mut zip = zip::ZipArchive::new(Cursor::new(archive.bytes)).unwrap();
        let mut names: Vec<String> = zip.file_names().map(str::to_string).collect();
        names.sort();
        assert_eq!(names, vec!["card-back-right.png", "card-front-left.png"]);
        assert!(zip.by_name("card-front-left.png").unwrap().size() > 0);
    }

    #[test]
    fn test_empty_archive_is_refused() {
        assert!(matches!(
            export_archive(&TextureSet::default()),
            Err(ExportError::NothingToExport)
        ));
    }

    #[test]
    fn test_write_to_dir() {
        let dir = tempfile::tempdir().unwrap();
        let exported = export_face(Face::FrontLeft, Some(&texture([1, 2, 3, 255]))).unwrap();
        let path = exported.write_to(dir.path()).unwrap();
        assert_eq!(std::fs::read(path).unwrap(), exported.bytes);
    }
}
