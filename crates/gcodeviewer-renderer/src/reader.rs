//! Reader-side model preparation
//!
//! Collects layers as they arrive from a parser (possibly out of order and
//! with gaps), drops missing and empty layers, and maps job progress back to
//! a `(layer, command)` position.

use crate::model::{Command, Layer, Model};
use crate::visualizer::options::ReaderOptions;
use gcodeviewer_core::ModelError;
use tracing::{debug, trace, warn};

/// What the parser knows about a layer besides its commands.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct LayerMeta {
    /// The layer contains no extrusion.
    pub is_empty: bool,
    /// File progress (0..=100) of the layer's first command.
    pub first_percentage: Option<f64>,
}

impl LayerMeta {
    pub fn of(commands: &[Command]) -> Self {
        Self {
            is_empty: !commands.iter().any(|cmd| cmd.extrude),
            first_percentage: commands.iter().find_map(|cmd| cmd.percentage),
        }
    }
}

/// A `(layer, command)` position inside the prepared model.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CommandPosition {
    pub layer: usize,
    pub command: usize,
}

#[derive(Debug, Default)]
pub struct ModelReader {
    options: ReaderOptions,
    compress: bool,
    received: Vec<Option<(Layer, LayerMeta)>>,
    prepared: Vec<Layer>,
    /// First-command percentage of each prepared layer that has one.
    percentages: Vec<(f64, usize)>,
    last_hit: Option<CommandPosition>,
}

impl ModelReader {
    pub fn new(options: ReaderOptions) -> Self {
        Self {
            options,
            ..Self::default()
        }
    }

    pub fn options(&self) -> &ReaderOptions {
        &self.options
    }

    /// Replace the options. Returns whether anything changed; a change
    /// re-prepares the received layers.
    pub fn set_options(&mut self, options: ReaderOptions) -> bool {
        if self.options == options {
            return false;
        }
        self.options = options;
        if !self.received.is_empty() {
            self.prepare();
        }
        true
    }

    /// Whether a model of `total_size` bytes should be kept compressed.
    pub fn should_compress(&self, total_size: u64) -> bool {
        self.options.force_compression
            || self.options.always_compress
            || total_size >= self.options.compression_size_threshold
    }

    /// Start a new model of `total_size` bytes, dropping everything received so far.
    pub fn begin(&mut self, total_size: u64) {
        self.clear();
        self.compress = self.should_compress(total_size);
        debug!(
            "Reading model of {} bytes (compressed: {})",
            total_size, self.compress
        );
    }

    pub fn clear(&mut self) {
        self.received.clear();
        self.prepared.clear();
        self.percentages.clear();
        self.last_hit = None;
    }

    /// Store parsed commands for layer `index`, compressing them when the
    /// model is large.
    pub fn receive_commands(
        &mut self,
        index: usize,
        commands: Vec<Command>,
    ) -> Result<(), ModelError> {
        let meta = LayerMeta::of(&commands);
        let layer = if self.compress {
            Layer::compress(&commands)?
        } else {
            Layer::Raw(commands)
        };
        self.receive_layer(index, layer, meta);
        Ok(())
    }

    /// Store an already built layer. Layers may arrive in any order.
    pub fn receive_layer(&mut self, index: usize, layer: Layer, meta: LayerMeta) {
        if self.received.len() <= index {
            self.received.resize_with(index + 1, || None);
        }
        trace!(
            "Received layer {} ({} bytes, empty: {})",
            index,
            layer.stored_size(),
            meta.is_empty
        );
        self.received[index] = Some((layer, meta));
    }

    /// Number of layer slots received so far, gaps included.
    pub fn received_len(&self) -> usize {
        self.received.len()
    }

    /// Build the renderable model: drop gaps and, when configured, layers
    /// without extrusion, then rebuild the progress lookup.
    pub fn prepare(&mut self) -> &[Layer] {
        let purge = self.options.purge_empty_layers;
        self.prepared.clear();
        self.percentages.clear();
        self.last_hit = None;

        let mut purged = 0;
        for (layer, meta) in self.received.iter().flatten() {
            if purge && meta.is_empty {
                purged += 1;
                continue;
            }
            if let Some(pct) = meta.first_percentage {
                self.percentages.push((pct, self.prepared.len()));
            }
            self.prepared.push(layer.clone());
        }
        self.percentages.sort_by(|a, b| a.0.total_cmp(&b.0));

        debug!(
            "Prepared {} layers from {} received ({} purged)",
            self.prepared.len(),
            self.received.len(),
            purged
        );
        &self.prepared
    }

    pub fn layers(&self) -> &[Layer] {
        &self.prepared
    }

    /// The prepared layers as a model for rendering.
    pub fn to_model(&self) -> Model {
        Model::new(self.prepared.clone())
    }

    /// Position of the last command at or before `percentage` of the file.
    ///
    /// `None` progress (a stopped job) returns the previous hit again.
    pub fn cmd_index_for_percentage(&mut self, percentage: Option<f64>) -> Option<CommandPosition> {
        let Some(pct) = percentage else {
            return self.last_hit;
        };

        let slot = self.percentages.partition_point(|(first, _)| *first <= pct);
        let (_, layer) = *self.percentages.get(slot.checked_sub(1)?)?;

        let decoded;
        let commands: &[Command] = match &self.prepared[layer] {
            Layer::Raw(commands) => commands,
            compressed => match compressed.decode() {
                Ok(commands) => {
                    decoded = commands;
                    &decoded
                }
                Err(e) => {
                    warn!("Layer {} could not be decoded: {}", layer, e);
                    return None;
                }
            },
        };

        let command = commands
            .partition_point(|cmd| cmd.percentage.map_or(true, |p| p <= pct))
            .checked_sub(1)?;
        let hit = CommandPosition { layer, command };
        self.last_hit = Some(hit);
        Some(hit)
    }
}
