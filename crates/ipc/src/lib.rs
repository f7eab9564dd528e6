//! IPC message protocol for Foldcard
//!
//! Defines the commands the UI sends to the editor core, the events the
//! core reports back, and the material description consumed by the 3D view.

mod commands;
mod error;
mod messages;
mod types;

pub use commands::*;
pub use error::*;
pub use messages::*;
pub use types::*;

/// Parse a JSON array of commands (a replay script)
pub fn parse_commands(json: &str) -> Result<Vec<EditorCommand>, IpcError> {
    let value: serde_json::Value = serde_json::from_str(json)?;
    if !value.is_array() {
        return Err(IpcError::InvalidFormat(
            "expected a JSON array of commands".to_string(),
        ));
    }
    Ok(serde_json::from_value(value)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use drawing::{ObjectId, ObjectPatch};

    #[test]
    fn test_command_wire_format() {
        let json = serde_json::to_value(EditorCommand::SelectFace {
            face: Face::BackRight,
        })
        .unwrap();
        assert_eq!(
            json,
            serde_json::json!({"type": "SelectFace", "data": {"face": "back-right"}})
        );

        let undo = serde_json::to_value(EditorCommand::Undo).unwrap();
        assert_eq!(undo, serde_json::json!({"type": "Undo"}));
    }

    #[test]
    fn test_parse_script() {
        let commands = parse_commands(
            r#"[
                {"type": "AddText", "data": {"text": "Hello", "font_size": 40.0}},
                {"type": "MutateObject", "data": {"id": 3, "patch": {"angle": 15.0}}},
                {"type": "ImportImage", "data": {"path": "photo.png"}},
                {"type": "ExportActive"}
            ]"#,
        )
        .unwrap();

        assert_eq!(commands.len(), 4);
        assert_eq!(
            commands[0],
            EditorCommand::AddText(AddTextRequest {
                font_size: Some(40.0),
                ..AddTextRequest::new("Hello")
            })
        );
        assert_eq!(
            commands[1],
            EditorCommand::MutateObject {
                id: ObjectId(3),
                patch: ObjectPatch {
                    angle: Some(15.0),
                    ..Default::default()
                },
            }
        );
    }

    #[test]
    fn test_parse_rejects_non_array() {
        assert!(matches!(
            parse_commands(r#"{"type": "Undo"}"#),
            Err(IpcError::InvalidFormat(_))
        ));
        assert!(matches!(
            parse_commands(r#"[{"type": "Explode"}]"#),
            Err(IpcError::Serialize(_))
        ));
    }

    #[test]
    fn test_notifications() {
        let rejected = EditorEvent::ImageRejected {
            reason: "not an image".to_string(),
        };
        assert_eq!(rejected.notification().level, NotificationLevel::Error);
        assert!(rejected.is_toast());

        let selected = EditorEvent::FaceSelected {
            face: Face::FrontLeft,
        };
        let note = selected.notification();
        assert_eq!(note.level, NotificationLevel::Info);
        assert!(note.message.contains("Front left"));

        let updated = EditorEvent::TextureUpdated {
            face: Face::FrontLeft,
            revision: 2,
        };
        assert!(!updated.is_toast());
    }

    #[test]
    fn test_event_round_trip() {
        let event = EditorEvent::CanvasCleared {
            face: Face::FrontRight,
            removed: 2,
        };
        let json = serde_json::to_string(&event).unwrap();
        let back: EditorEvent = serde_json::from_str(&json).unwrap();
        assert_eq!(back, event);
    }

    #[test]
    fn test_default_material_is_untextured() {
        let material = MaterialProperties::default();
        assert!(!material.is_textured());
        assert_eq!(MaterialProperties::solid([0.5; 4]).base_color, [0.5; 4]);
    }
}
