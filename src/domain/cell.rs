/// Cell codes of the generated grid and their properties.
/// Properties are queried via methods, not stored as flags,
/// so cell semantics are centralized here.

#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Default)]
pub enum Cell {
    #[default]
    Empty,
    Wall,
    Start,
    Exit,
    Key,
    Weapon,
    Ammo,
}

impl Cell {
    /// Integer tag handed to renderers
    /// (`EMPTY=0, WALL=1, START=2, EXIT=3, KEY=4, WEAPON=5, AMMO=6`).
    pub fn code(self) -> u8 {
        match self {
            Cell::Empty => 0,
            Cell::Wall => 1,
            Cell::Start => 2,
            Cell::Exit => 3,
            Cell::Key => 4,
            Cell::Weapon => 5,
            Cell::Ammo => 6,
        }
    }

    /// Can an entity occupy this cell? Only walls block; items and the
    /// exit are stood on (the exit blocks the player separately, see `Game::try_move`).
    pub fn is_walkable(self) -> bool {
        !matches!(self, Cell::Wall)
    }

    /// Is this a pickup?
    pub fn is_item(self) -> bool {
        matches!(self, Cell::Key | Cell::Weapon | Cell::Ammo)
    }
}
