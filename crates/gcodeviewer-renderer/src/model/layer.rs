//! Layer storage: plain command lists or zlib-compressed JSON blobs.

use super::command::Command;
use flate2::read::ZlibDecoder;
use flate2::write::ZlibEncoder;
use flate2::Compression;
use gcodeviewer_core::ModelError;
use serde::{Deserialize, Serialize};
use std::io::Write;

/// One layer of a model.
///
/// Serialized untagged: an array of command objects is [`Layer::Raw`], an
/// array of bytes is [`Layer::Compressed`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Layer {
    Raw(Vec<Command>),
    Compressed(Vec<u8>),
}

impl Default for Layer {
    fn default() -> Self {
        Layer::Raw(Vec::new())
    }
}

impl From<Vec<Command>> for Layer {
    fn from(commands: Vec<Command>) -> Self {
        Layer::Raw(commands)
    }
}

impl Layer {
    /// Encode commands as a zlib-compressed JSON blob.
    pub fn compress(commands: &[Command]) -> Result<Self, ModelError> {
        let mut encoder = ZlibEncoder::new(Vec::new(), Compression::default());
        serde_json::to_writer(&mut encoder, commands)?;
        encoder.flush().map_err(|e| ModelError::Deflate {
            reason: e.to_string(),
        })?;
        let blob = encoder.finish().map_err(|e| ModelError::Deflate {
            reason: e.to_string(),
        })?;
        Ok(Layer::Compressed(blob))
    }

    pub fn is_compressed(&self) -> bool {
        matches!(self, Layer::Compressed(_))
    }

    /// Borrow the commands of an uncompressed layer.
    pub fn raw(&self) -> Option<&[Command]> {
        match self {
            Layer::Raw(commands) => Some(commands),
            Layer::Compressed(_) => None,
        }
    }

    /// Decode into an owned command list. Raw layers are cloned.
    pub fn decode(&self) -> Result<Vec<Command>, ModelError> {
        match self {
            Layer::Raw(commands) => Ok(commands.clone()),
            Layer::Compressed(blob) => decode_blob(blob),
        }
    }

    /// Size in bytes of the stored representation (compressed size for blobs).
    pub fn stored_size(&self) -> usize {
        match self {
            Layer::Raw(commands) => commands.len() * std::mem::size_of::<Command>(),
            Layer::Compressed(blob) => blob.len(),
        }
    }
}

/// Inflate a zlib blob and parse the JSON command array it holds.
pub fn decode_blob(blob: &[u8]) -> Result<Vec<Command>, ModelError> {
    let mut json = Vec::with_capacity(blob.len() * 4);
    std::io::Read::read_to_end(&mut ZlibDecoder::new(blob), &mut json).map_err(|e| {
        ModelError::Inflate {
            reason: e.to_string(),
        }
    })?;
    Ok(serde_json::from_slice(&json)?)
}
