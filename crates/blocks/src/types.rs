//! Block and action types emitted by a replay container parser.

/// One timeslot: a declared time increment plus the command blocks that
/// executed during it.
#[derive(Debug, Clone, PartialEq)]
pub struct TimeslotBlock {
    /// Milliseconds the game clock advanced for this slot.
    pub time_increment_ms: u32,
    pub commands: Vec<CommandBlock>,
}

/// Actions issued by a single player within one timeslot.
#[derive(Debug, Clone, PartialEq)]
pub struct CommandBlock {
    pub player_id: u8,
    pub actions: Vec<Action>,
}

/// A decoded command action.
///
/// Only the shapes the metadata pipeline cares about are modeled
/// individually; everything else collapses into [`Action::Other`]. Order
/// identifiers are kept as the raw little-endian 4-byte field exactly as
/// stored in the container.
#[derive(Debug, Clone, PartialEq)]
pub enum Action {
    /// Ability order with no target (0x10).
    ImmediateOrder { flags: u16, order: [u8; 4] },
    /// Ability order targeting a ground point (0x11).
    PointOrder {
        flags: u16,
        order: [u8; 4],
        x: f32,
        y: f32,
    },
    /// Ability order targeting an object (0x12).
    TargetOrder {
        flags: u16,
        order: [u8; 4],
        target: u64,
    },
    /// Map-data sync (0x6b): the map script's key/value side channel.
    MapData {
        filename: String,
        mission_key: String,
        key: String,
    },
    /// Any other action opcode, retained only for accounting.
    Other { id: u8 },
}

impl Action {
    /// The raw order-identifier field, when this action carries one.
    pub fn order_bytes(&self) -> Option<&[u8; 4]> {
        match self {
            Action::ImmediateOrder { order, .. }
            | Action::PointOrder { order, .. }
            | Action::TargetOrder { order, .. } => Some(order),
            _ => None,
        }
    }
}

/// A chat message block.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatBlock {
    pub player_id: u8,
    /// Chat mode flag (all / allies / observers / private).
    pub mode: u32,
    pub message: String,
}
