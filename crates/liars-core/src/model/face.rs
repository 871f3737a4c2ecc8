use core::fmt;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
#[repr(u8)]
pub enum Face {
    One = 1,
    Two = 2,
    Three = 3,
    Four = 4,
    Five = 5,
    Six = 6,
}

impl Face {
    pub const ALL: [Face; 6] = [
        Face::One,
        Face::Two,
        Face::Three,
        Face::Four,
        Face::Five,
        Face::Six,
    ];

    pub const MAX: Face = Face::Six;

    pub const fn from_value(value: u8) -> Option<Self> {
        match value {
            1 => Some(Face::One),
            2 => Some(Face::Two),
            3 => Some(Face::Three),
            4 => Some(Face::Four),
            5 => Some(Face::Five),
            6 => Some(Face::Six),
            _ => None,
        }
    }

    pub const fn from_index(index: usize) -> Option<Self> {
        if index < 6 {
            Self::from_value(index as u8 + 1)
        } else {
            None
        }
    }

    pub const fn value(self) -> u8 {
        self as u8
    }

    /// Zero-based position used to index per-face count arrays.
    pub const fn index(self) -> usize {
        self as usize - 1
    }

    pub const fn next(self) -> Option<Face> {
        Self::from_value(self.value() + 1)
    }

    pub const fn is_max(self) -> bool {
        matches!(self, Face::Six)
    }

    /// Faces strictly above `self`, in ascending order.
    pub fn higher(self) -> impl Iterator<Item = Face> {
        Face::ALL.into_iter().filter(move |face| *face > self)
    }
}

impl TryFrom<u8> for Face {
    type Error = String;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        Face::from_value(value).ok_or_else(|| format!("face {value} is outside 1-6"))
    }
}

impl From<Face> for u8 {
    fn from(face: Face) -> u8 {
        face.value()
    }
}

impl fmt::Display for Face {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.value())
    }
}

#[cfg(test)]
mod tests {
    use super::Face;

    #[test]
    fn value_and_index_roundtrip() {
        for (i, face) in Face::ALL.iter().enumerate() {
            assert_eq!(Face::from_index(i), Some(*face));
            assert_eq!(face.index(), i);
            assert_eq!(Face::from_value(face.value()), Some(*face));
        }
        assert_eq!(Face::from_value(0), None);
        assert_eq!(Face::from_value(7), None);
    }

    #[test]
    fn next_stops_at_six() {
        assert_eq!(Face::Five.next(), Some(Face::Six));
        assert_eq!(Face::Six.next(), None);
        assert!(Face::Six.is_max());
    }

    #[test]
    fn higher_lists_faces_above() {
        let above: Vec<_> = Face::Four.higher().collect();
        assert_eq!(above, vec![Face::Five, Face::Six]);
        assert_eq!(Face::Six.higher().count(), 0);
    }
}
