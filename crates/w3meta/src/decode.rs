//! Channel selection: try each delivery channel in priority order and
//! return the first validated result.
//!
//! Priority is MMD, then the order stream, then chat. MMD is the richest
//! and cheapest channel when present; the order channel works on any build
//! but leans on the timing heuristic; chat is the legacy fallback. A
//! channel that is definitely absent (no `itt_chunks`, no alphabet events,
//! no prefixed messages) falls through to the next one, but a channel whose
//! data is present and fails validation stops the pipeline — corrupt data
//! must surface as an error, never as a silent downgrade to another
//! channel's answer.

use log::debug;
use w3meta_blocks::ReplayParser;

use crate::chat::read_chat;
use crate::extract::{extract_metadata_order_ids, ExtractConfig};
use crate::mmd::read_mmd;
use crate::payload::{parse_payload, MatchMetadata, ParseOptions};
use crate::stream::read_order_stream;
use crate::{MetadataSpec, MetaError};

/// Which channel produced the decoded metadata.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MetadataSource {
    OrderStream,
    Mmd,
    Chat,
}

/// A successful decode: the validated record plus provenance.
#[derive(Debug, Clone, PartialEq)]
pub struct DecodeOutcome {
    pub metadata: MatchMetadata,
    pub source: MetadataSource,
    /// The reconstructed payload the metadata was parsed from.
    pub payload: String,
    pub spec_version: u32,
}

/// Pipeline tunables.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DecodeConfig {
    pub extract: ExtractConfig,
}

/// Translates a chronological order-id list into the payload character
/// string through the registry's alphabet.
pub fn translate_order_ids(order_ids: &[String], spec: &MetadataSpec) -> Result<String, MetaError> {
    order_ids
        .iter()
        .map(|id| {
            spec.char_for_order(id).ok_or_else(|| MetaError::UnknownSymbol {
                order_id: id.clone(),
            })
        })
        .collect()
}

/// Decodes via the order channel only.
pub fn decode_order_channel(
    parser: &mut dyn ReplayParser,
    bytes: &[u8],
    spec: &MetadataSpec,
    config: &DecodeConfig,
) -> Result<DecodeOutcome, MetaError> {
    let (events, failure) = read_order_stream(parser, bytes);
    if events.is_empty() {
        // Nothing captured at all: an unrecoverable container failure is
        // not the same thing as "this replay carries no metadata".
        if let Some(err) = failure {
            return Err(err.into());
        }
    }
    let order_ids = extract_metadata_order_ids(&events, spec, &config.extract)?;
    let payload = translate_order_ids(&order_ids, spec)?;
    let metadata = parse_payload(&payload, spec, &ParseOptions::default())?;
    Ok(DecodeOutcome {
        metadata,
        source: MetadataSource::OrderStream,
        payload,
        spec_version: spec.version,
    })
}

/// Decodes via the MMD channel only. `Ok(None)` means the replay carries no
/// MMD transmission at all.
pub fn decode_mmd_channel(
    parser: &mut dyn ReplayParser,
    bytes: &[u8],
    spec: &MetadataSpec,
) -> Result<Option<DecodeOutcome>, MetaError> {
    let (scan, _failure) = read_mmd(parser, bytes);
    let Some(mmd) = scan.metadata else {
        return Ok(None);
    };
    debug!(
        "mmd transmission found: version={:?} schema={:?} chunks={}",
        mmd.version, mmd.schema, mmd.chunk_count
    );
    // Channel escaping perturbs the checksum input; field-level validation
    // still applies.
    let metadata = parse_payload(&mmd.payload, spec, &ParseOptions { skip_checksum: true })?;
    Ok(Some(DecodeOutcome {
        metadata,
        source: MetadataSource::Mmd,
        payload: mmd.payload,
        spec_version: spec.version,
    }))
}

/// Decodes via the chat channel only. `Ok(None)` means no prefixed chat
/// messages exist.
pub fn decode_chat_channel(
    parser: &mut dyn ReplayParser,
    bytes: &[u8],
    spec: &MetadataSpec,
) -> Result<Option<DecodeOutcome>, MetaError> {
    let (scan, _failure) = read_chat(parser, bytes);
    let Some(payload) = scan.payload else {
        return Ok(None);
    };
    debug!(
        "chat transmission found: {} of {} messages carried metadata",
        scan.metadata_messages, scan.total_messages
    );
    let metadata = parse_payload(&payload, spec, &ParseOptions::default())?;
    Ok(Some(DecodeOutcome {
        metadata,
        source: MetadataSource::Chat,
        payload,
        spec_version: spec.version,
    }))
}

/// Decodes a replay, attempting MMD, then the order stream, then chat.
pub fn decode_replay(
    parser: &mut dyn ReplayParser,
    bytes: &[u8],
    spec: &MetadataSpec,
    config: &DecodeConfig,
) -> Result<DecodeOutcome, MetaError> {
    if let Some(outcome) = decode_mmd_channel(parser, bytes, spec)? {
        return Ok(outcome);
    }
    debug!("no mmd transmission, trying the order channel");

    match decode_order_channel(parser, bytes, spec, config) {
        Ok(outcome) => Ok(outcome),
        // Only a definitively absent stream falls through to chat;
        // validation failures propagate.
        Err(stream_err @ MetaError::StreamNotFound { .. }) => {
            debug!("no order-channel transmission, trying chat");
            match decode_chat_channel(parser, bytes, spec)? {
                Some(outcome) => Ok(outcome),
                None => Err(stream_err),
            }
        }
        Err(err) => Err(err),
    }
}
