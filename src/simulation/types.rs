//! Core types for the intersection simulation
//!
//! These are standalone types that don't depend on Bevy.

use anyhow::{bail, Result};

/// Number of approaches feeding the intersection
pub const DIRECTION_COUNT: usize = 4;

/// Number of lanes per approach
pub const LANES_PER_DIRECTION: usize = 3;

/// Total number of lane queues (4 directions x 3 lanes)
pub const QUEUE_COUNT: usize = DIRECTION_COUNT * LANES_PER_DIRECTION;

/// Heading of travel, in canonical clockwise order.
///
/// Every turn table is derived from this ordering through [`Direction::rotate_left`]
/// and [`Direction::rotate_right`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Direction {
    /// Towards the top of the map
    North,
    /// Towards the right of the map
    East,
    /// Towards the bottom of the map
    South,
    /// Towards the left of the map
    West,
}

impl Direction {
    pub const ALL: [Direction; DIRECTION_COUNT] = [
        Direction::North,
        Direction::East,
        Direction::South,
        Direction::West,
    ];

    pub fn index(self) -> usize {
        self as usize
    }

    pub fn from_index(index: usize) -> Option<Self> {
        Self::ALL.get(index).copied()
    }

    /// Heading after a left turn (one step counter-clockwise)
    pub fn rotate_left(self) -> Self {
        Self::ALL[(self.index() + DIRECTION_COUNT - 1) % DIRECTION_COUNT]
    }

    /// Heading after a right turn (one step clockwise)
    pub fn rotate_right(self) -> Self {
        Self::ALL[(self.index() + 1) % DIRECTION_COUNT]
    }

    pub fn opposite(self) -> Self {
        Self::ALL[(self.index() + 2) % DIRECTION_COUNT]
    }

    /// Unit vector of this heading in screen coordinates (y grows downward)
    pub fn unit(self) -> Position {
        match self {
            Direction::North => Position::new(0.0, -1.0),
            Direction::East => Position::new(1.0, 0.0),
            Direction::South => Position::new(0.0, 1.0),
            Direction::West => Position::new(-1.0, 0.0),
        }
    }

    /// Unit vector pointing to the right-hand side of this heading
    pub fn right_hand(self) -> Position {
        self.rotate_right().unit()
    }

    pub fn short_name(self) -> char {
        match self {
            Direction::North => 'N',
            Direction::East => 'E',
            Direction::South => 'S',
            Direction::West => 'W',
        }
    }
}

impl TryFrom<u8> for Direction {
    type Error = anyhow::Error;

    fn try_from(code: u8) -> Result<Self> {
        match Self::from_index(code as usize) {
            Some(direction) => Ok(direction),
            None => bail!("direction code {} out of range", code),
        }
    }
}

/// Lane within an approach
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LanePosition {
    /// Dedicated left-turn lane
    Left,
    /// Priority lane, always turns
    Center,
    /// Straight-through lane, also receives turned traffic
    Right,
}

impl LanePosition {
    pub const ALL: [LanePosition; LANES_PER_DIRECTION] =
        [LanePosition::Left, LanePosition::Center, LanePosition::Right];

    pub fn index(self) -> usize {
        self as usize
    }

    pub fn from_index(index: usize) -> Option<Self> {
        Self::ALL.get(index).copied()
    }
}

impl TryFrom<u8> for LanePosition {
    type Error = anyhow::Error;

    fn try_from(code: u8) -> Result<Self> {
        match Self::from_index(code as usize) {
            Some(lane) => Ok(lane),
            None => bail!("lane code {} out of range", code),
        }
    }
}

/// Type of vehicle in the simulation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum VehicleType {
    #[default]
    Regular,
    Ambulance,
    Police,
    FireTruck,
}

impl VehicleType {
    pub const EMERGENCY: [VehicleType; 3] = [
        VehicleType::Ambulance,
        VehicleType::Police,
        VehicleType::FireTruck,
    ];

    /// Anything other than a regular vehicle has emergency rights
    pub fn is_emergency(self) -> bool {
        self != VehicleType::Regular
    }

    /// Numeric code used by the vehicle record format
    pub fn code(self) -> u8 {
        self as u8
    }
}

impl TryFrom<u8> for VehicleType {
    type Error = anyhow::Error;

    fn try_from(code: u8) -> Result<Self> {
        Ok(match code {
            0 => VehicleType::Regular,
            1 => VehicleType::Ambulance,
            2 => VehicleType::Police,
            3 => VehicleType::FireTruck,
            other => bail!("vehicle type code {} out of range", other),
        })
    }
}

/// Which way a vehicle leaves a turning lane
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Turn {
    Left,
    Right,
}

/// A wrapper type for vehicle IDs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct VehicleId(pub u32);

/// A 2D position in screen coordinates
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Position {
    pub x: f32,
    pub y: f32,
}

impl Position {
    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    pub fn distance(&self, other: &Position) -> f32 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        (dx * dx + dy * dy).sqrt()
    }

    pub fn dot(&self, other: &Position) -> f32 {
        self.x * other.x + self.y * other.y
    }

    pub fn offset(&self, direction: &Position, amount: f32) -> Position {
        Position {
            x: self.x + direction.x * amount,
            y: self.y + direction.y * amount,
        }
    }

    pub fn sub(&self, other: &Position) -> Position {
        Position {
            x: self.x - other.x,
            y: self.y - other.y,
        }
    }
}

/// Queue slot for a (direction, lane) pair
pub fn queue_index(direction: Direction, lane: LanePosition) -> usize {
    direction.index() * LANES_PER_DIRECTION + lane.index()
}

/// Queue slot for raw record codes, `None` when the codes address no queue
pub fn queue_index_from_codes(direction: u8, lane: u8) -> Option<usize> {
    let direction = direction as usize;
    let lane = lane as usize;
    if direction < DIRECTION_COUNT && lane < LANES_PER_DIRECTION {
        Some(direction * LANES_PER_DIRECTION + lane)
    } else {
        None
    }
}
