use std::fmt;


pub const NUM_ROWS: u8 = 8;
pub const NUM_COLS: u8 = 8;


// A square on the board as the client grid sees it: row 0 is rank 8
// (the top row from white's point of view), col 0 is file 'a'.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub struct Coord {
    row: u8,
    col: u8,
}

impl Coord {
    pub fn from_grid(row: u8, col: u8) -> Option<Self> {
        (row < NUM_ROWS && col < NUM_COLS).then_some(Coord { row, col })
    }

    pub fn from_algebraic(s: &str) -> Option<Self> {
        let mut chars = s.chars();
        let file = chars.next()?;
        let rank = chars.next()?;
        if chars.next().is_some() {
            return None;
        }
        if !('a'..='h').contains(&file) || !('1'..='8').contains(&rank) {
            return None;
        }
        let col = file as u8 - b'a';
        let row = NUM_ROWS - (rank as u8 - b'0');
        Some(Coord { row, col })
    }

    pub fn to_algebraic(self) -> String {
        format!("{}{}", (b'a' + self.col) as char, NUM_ROWS - self.row)
    }

    pub fn to_square(self) -> chess::Square {
        chess::Square::make_square(
            chess::Rank::from_index((NUM_ROWS - 1 - self.row) as usize),
            chess::File::from_index(self.col as usize),
        )
    }

    pub fn from_square(sq: chess::Square) -> Self {
        Coord {
            row: NUM_ROWS - 1 - sq.get_rank().to_index() as u8,
            col: sq.get_file().to_index() as u8,
        }
    }

    pub fn all() -> impl Iterator<Item = Self> + Clone {
        (0..NUM_ROWS).flat_map(|row| (0..NUM_COLS).map(move |col| Coord { row, col }))
    }
}

impl fmt::Display for Coord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_algebraic())
    }
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn algebraic_round_trip() {
        for coord in Coord::all() {
            assert_eq!(Coord::from_algebraic(&coord.to_algebraic()), Some(coord));
            assert_eq!(Coord::from_square(coord.to_square()), coord);
        }
    }

    #[test]
    fn grid_to_algebraic() {
        // Top-left of the rendered grid is a8, bottom-right is h1.
        assert_eq!(Coord::from_grid(0, 0).unwrap().to_algebraic(), "a8");
        assert_eq!(Coord::from_grid(7, 7).unwrap().to_algebraic(), "h1");
        assert_eq!(Coord::from_grid(6, 4).unwrap().to_algebraic(), "e2");
        assert_eq!(Coord::from_grid(8, 0), None);
    }

    #[test]
    fn rejects_bad_squares() {
        assert_eq!(Coord::from_algebraic("i1"), None);
        assert_eq!(Coord::from_algebraic("a9"), None);
        assert_eq!(Coord::from_algebraic("e22"), None);
        assert_eq!(Coord::from_algebraic(""), None);
    }
}
