use std::fmt;

use serde::{Deserialize, Serialize};


// Side to move. Serialized as "w"/"b" to match the wire protocol.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug, Serialize, Deserialize)]
pub enum Force {
    #[serde(rename = "w")]
    White,
    #[serde(rename = "b")]
    Black,
}

impl Force {
    pub fn to_fen(self) -> char {
        match self {
            Force::White => 'w',
            Force::Black => 'b',
        }
    }
}

impl fmt::Display for Force {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_fen())
    }
}

impl From<chess::Color> for Force {
    fn from(color: chess::Color) -> Self {
        match color {
            chess::Color::White => Force::White,
            chess::Color::Black => Force::Black,
        }
    }
}

impl From<Force> for chess::Color {
    fn from(force: Force) -> Self {
        match force {
            Force::White => chess::Color::White,
            Force::Black => chess::Color::Black,
        }
    }
}
