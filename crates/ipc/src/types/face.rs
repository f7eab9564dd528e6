//! The four editable faces of the card.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::IpcError;

/// One of the four faces of the folded card.
///
/// The card opens like a book: a left and a right panel, each with a front
/// (outside) and a back (inside) side.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Face {
    FrontLeft,
    BackLeft,
    FrontRight,
    BackRight,
}

impl Face {
    pub const ALL: [Face; 4] = [
        Face::FrontLeft,
        Face::BackLeft,
        Face::FrontRight,
        Face::BackRight,
    ];

    /// Stable slot index (0-3)
    #[inline]
    pub fn index(self) -> usize {
        match self {
            Face::FrontLeft => 0,
            Face::BackLeft => 1,
            Face::FrontRight => 2,
            Face::BackRight => 3,
        }
    }

    pub fn from_index(index: usize) -> Option<Face> {
        Face::ALL.get(index).copied()
    }

    /// Identifier used in file names and messages
    pub fn id(self) -> &'static str {
        match self {
            Face::FrontLeft => "front-left",
            Face::BackLeft => "back-left",
            Face::FrontRight => "front-right",
            Face::BackRight => "back-right",
        }
    }

    /// Human readable name
    pub fn label(self) -> &'static str {
        match self {
            Face::FrontLeft => "Front left",
            Face::BackLeft => "Back left",
            Face::FrontRight => "Front right",
            Face::BackRight => "Back right",
        }
    }

    pub fn is_front(self) -> bool {
        matches!(self, Face::FrontLeft | Face::FrontRight)
    }

    pub fn is_left(self) -> bool {
        matches!(self, Face::FrontLeft | Face::BackLeft)
    }
}

impl fmt::Display for Face {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.id())
    }
}

impl FromStr for Face {
    type Err = IpcError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Face::ALL
            .into_iter()
            .find(|face| face.id() == s)
            .ok_or_else(|| IpcError::UnknownFace(s.to_string()))
    }
}
