//! Deterministic block source for tests and diagnostics.

use crate::{Action, BlockSink, ChatBlock, CommandBlock, ParseError, ReplayParser, TimeslotBlock};

#[derive(Debug, Clone)]
enum Block {
    Timeslot(TimeslotBlock),
    Chat(ChatBlock),
}

/// A scripted replay: blocks are recorded up front and replayed into a sink
/// on [`ReplayParser::parse`].
///
/// The byte buffer handed to `parse` is ignored — this type stands in for a
/// real container parser wherever the pipeline needs a known block stream,
/// including failure injection partway through.
#[derive(Debug, Default, Clone)]
pub struct SyntheticReplay {
    blocks: Vec<Block>,
    fail_after: Option<(usize, ParseError)>,
}

impl SyntheticReplay {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a timeslot block.
    pub fn timeslot(mut self, time_increment_ms: u32, commands: Vec<CommandBlock>) -> Self {
        self.blocks.push(Block::Timeslot(TimeslotBlock {
            time_increment_ms,
            commands,
        }));
        self
    }

    /// Appends a timeslot containing a single immediate order from one
    /// player.
    pub fn order(self, time_increment_ms: u32, player_id: u8, order: [u8; 4]) -> Self {
        self.timeslot(
            time_increment_ms,
            vec![CommandBlock {
                player_id,
                actions: vec![Action::ImmediateOrder { flags: 0, order }],
            }],
        )
    }

    /// Appends a timeslot carrying one map-data sync entry.
    pub fn map_data(self, time_increment_ms: u32, player_id: u8, key: &str) -> Self {
        self.timeslot(
            time_increment_ms,
            vec![CommandBlock {
                player_id,
                actions: vec![Action::MapData {
                    filename: "MMD.Dat".to_string(),
                    mission_key: "val".to_string(),
                    key: key.to_string(),
                }],
            }],
        )
    }

    /// Appends a chat block.
    pub fn chat(mut self, player_id: u8, message: &str) -> Self {
        self.blocks.push(Block::Chat(ChatBlock {
            player_id,
            mode: 0,
            message: message.to_string(),
        }));
        self
    }

    /// Makes `parse` return `error` after delivering the first `count`
    /// blocks.
    pub fn fail_after(mut self, count: usize, error: ParseError) -> Self {
        self.fail_after = Some((count, error));
        self
    }

    /// Number of recorded blocks.
    pub fn len(&self) -> usize {
        self.blocks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }
}

impl ReplayParser for SyntheticReplay {
    fn parse(&mut self, _bytes: &[u8], sink: &mut dyn BlockSink) -> Result<(), ParseError> {
        for (i, block) in self.blocks.iter().enumerate() {
            if let Some((count, error)) = &self.fail_after {
                if i == *count {
                    return Err(error.clone());
                }
            }
            match block {
                Block::Timeslot(ts) => sink.timeslot(ts),
                Block::Chat(chat) => sink.chat(chat),
            }
        }
        if let Some((count, error)) = &self.fail_after {
            if *count >= self.blocks.len() {
                return Err(error.clone());
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::CollectSink;

    #[test]
    fn replays_blocks_in_recorded_order() {
        let mut replay = SyntheticReplay::new()
            .order(100, 1, [1, 0, 0x0d, 0])
            .chat(2, "hello")
            .order(250, 1, [2, 0, 0x0d, 0]);

        let mut sink = CollectSink::new();
        replay.parse(&[], &mut sink).unwrap();
        assert_eq!(sink.timeslots.len(), 2);
        assert_eq!(sink.chats.len(), 1);
        assert_eq!(sink.chats[0].message, "hello");
    }

    #[test]
    fn fail_after_delivers_prefix_then_errors() {
        let mut replay = SyntheticReplay::new()
            .order(100, 1, [1, 0, 0x0d, 0])
            .order(100, 1, [2, 0, 0x0d, 0])
            .fail_after(1, ParseError::Truncated(42));

        let mut sink = CollectSink::new();
        let err = replay.parse(&[], &mut sink).unwrap_err();
        assert_eq!(err, ParseError::Truncated(42));
        assert_eq!(sink.timeslots.len(), 1);
    }

    #[test]
    fn fail_after_end_still_errors() {
        let mut replay = SyntheticReplay::new()
            .order(100, 1, [1, 0, 0x0d, 0])
            .fail_after(1, ParseError::NotAReplay("bad magic"));

        let mut sink = CollectSink::new();
        assert!(replay.parse(&[], &mut sink).is_err());
        assert_eq!(sink.timeslots.len(), 1);
    }
}
