/// One of the four camera movement keys.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Direction {
    Forward,
    Backward,
    Left,
    Right,
}

impl Direction {
    pub const ALL: [Direction; 4] = [
        Direction::Forward,
        Direction::Backward,
        Direction::Left,
        Direction::Right,
    ];

    fn bit(self) -> u8 {
        match self {
            Direction::Forward => 1 << 0,
            Direction::Backward => 1 << 1,
            Direction::Left => 1 << 2,
            Direction::Right => 1 << 3,
        }
    }
}

/// Set of directional keys held at one instant.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct DirectionSet(u8);

impl DirectionSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, direction: Direction) {
        self.0 |= direction.bit();
    }

    pub fn contains(&self, direction: Direction) -> bool {
        self.0 & direction.bit() != 0
    }

    pub fn is_empty(&self) -> bool {
        self.0 == 0
    }

    pub fn len(&self) -> usize {
        self.0.count_ones() as usize
    }

    /// Held directions in declaration order.
    pub fn iter(&self) -> impl Iterator<Item = Direction> + '_ {
        Direction::ALL.into_iter().filter(|d| self.contains(*d))
    }
}

impl FromIterator<Direction> for DirectionSet {
    fn from_iter<I: IntoIterator<Item = Direction>>(iter: I) -> Self {
        let mut set = DirectionSet::new();
        for direction in iter {
            set.insert(direction);
        }
        set
    }
}

/// Instantaneous key-down query.
///
/// Implementors answer "is this direction held right now", which is what the
/// frame loop samples whenever a key press arrives.
pub trait KeyState {
    fn is_down(&self, direction: Direction) -> bool;

    /// Sample every direction currently held.
    fn sample(&self) -> DirectionSet {
        Direction::ALL
            .into_iter()
            .filter(|d| self.is_down(*d))
            .collect()
    }
}

impl KeyState for DirectionSet {
    fn is_down(&self, direction: Direction) -> bool {
        self.contains(direction)
    }
}
