//! Typed replay blocks and the narrow interface to the replay container
//! parser.
//!
//! The `.w3g` container format (header, zlib segments, the full action
//! opcode catalog) is deliberately out of scope here. A container parser is
//! anything that implements [`ReplayParser`]: it walks a raw byte buffer and
//! pushes typed blocks into a [`BlockSink`]. The decode pipeline in the
//! `w3meta` crate depends only on these traits, so a real container library
//! and the [`SyntheticReplay`] test double are interchangeable.

mod error;
mod sink;
mod synthetic;
mod types;

pub use error::ParseError;
pub use sink::{BlockSink, CollectSink, ReplayParser};
pub use synthetic::SyntheticReplay;
pub use types::{Action, ChatBlock, CommandBlock, TimeslotBlock};
