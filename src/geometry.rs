use shakmaty::{File, Rank, Square};

/// A pointer location in UI coordinates. Opaque to the game logic apart from
/// square lookup; it is echoed back for drag rendering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct PointerPos {
    pub x: i32,
    pub y: i32,
}

impl PointerPos {
    #[inline]
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }
}

/// Board layout on screen: square tiles to the right of a left margin.
///
/// Row `r` from the top holds square indices `r * 8 .. r * 8 + 8`, so rank
/// index 0 (the first rank) is drawn on top.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BoardGeometry {
    pub tile_size: u32,
    pub left_margin: u32,
}

impl Default for BoardGeometry {
    fn default() -> Self {
        Self {
            tile_size: 64,
            left_margin: 30,
        }
    }
}

impl BoardGeometry {
    /// Square under the pointer, or `None` when it is off the board.
    pub fn square_at(&self, pointer: PointerPos) -> Option<Square> {
        let x = u32::try_from(pointer.x).ok()?.checked_sub(self.left_margin)?;
        let y = u32::try_from(pointer.y).ok()?;
        if self.tile_size == 0 {
            return None;
        }

        let col = x / self.tile_size;
        let row = y / self.tile_size;
        if col >= 8 || row >= 8 {
            return None;
        }
        Some(Square::from_coords(File::new(col), Rank::new(row)))
    }

    /// Pointer position at the centre of a square's tile.
    ///
    /// Saturates at `i32::MAX` for layouts too large for pointer coordinates.
    pub fn center_of(&self, square: Square) -> PointerPos {
        let tile = i64::from(self.tile_size);
        let half = tile / 2;
        let x = i64::from(self.left_margin) + i64::from(u32::from(square.file())) * tile + half;
        let y = i64::from(u32::from(square.rank())) * tile + half;
        PointerPos::new(saturate(x), saturate(y))
    }
}

fn saturate(coord: i64) -> i32 {
    i32::try_from(coord).unwrap_or(i32::MAX)
}
