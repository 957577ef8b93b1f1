use crate::model::{decode_blob, Command, Layer};
use std::collections::BTreeMap;
use tracing::{debug, trace, warn};

/// Holds the layers of the active model and decodes compressed ones on demand.
///
/// Decoded layers are kept in a small window around the layer being viewed;
/// see [`LayerCache::clean_cache`].
#[derive(Debug, Default, Clone)]
pub struct LayerCache {
    layers: Vec<Layer>,
    decoded: BTreeMap<usize, Vec<Command>>,
}

impl LayerCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the whole model, dropping every decoded layer.
    pub fn replace(&mut self, layers: Vec<Layer>) {
        debug!(
            "Layer cache holds {} layers ({} compressed)",
            layers.len(),
            layers.iter().filter(|l| l.is_compressed()).count()
        );
        self.layers = layers;
        self.decoded.clear();
    }

    pub fn layers(&self) -> &[Layer] {
        &self.layers
    }

    pub fn len(&self) -> usize {
        self.layers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.layers.is_empty()
    }

    /// Commands of layer `index`, decoding and caching compressed layers.
    ///
    /// A blob that cannot be decoded is logged and cached as an empty layer.
    pub fn get_layer(&mut self, index: usize) -> Option<&[Command]> {
        match self.layers.get(index)? {
            Layer::Raw(commands) => Some(commands.as_slice()),
            Layer::Compressed(blob) => {
                let commands = self.decoded.entry(index).or_insert_with(|| {
                    trace!("Decoding layer {} ({} bytes)", index, blob.len());
                    decode_blob(blob).unwrap_or_else(|e| {
                        warn!("Layer {} could not be decoded: {}", index, e);
                        Vec::new()
                    })
                });
                Some(commands.as_slice())
            }
        }
    }

    /// Number of commands in layer `index`.
    pub fn layer_len(&mut self, index: usize) -> Option<usize> {
        self.get_layer(index).map(<[Command]>::len)
    }

    /// Keep only `current`, `current + 1` and, when `keep_previous`, `current - 1`.
    pub fn clean_cache(&mut self, current: usize, keep_previous: bool) {
        let before = self.decoded.len();
        self.decoded.retain(|&index, _| {
            index == current
                || Some(index) == current.checked_add(1)
                || (keep_previous && Some(index) == current.checked_sub(1))
        });
        let evicted = before - self.decoded.len();
        if evicted > 0 {
            trace!("Evicted {} decoded layers around layer {}", evicted, current);
        }
    }

    /// Indices of currently decoded layers, ascending.
    pub fn cached_indices(&self) -> Vec<usize> {
        self.decoded.keys().copied().collect()
    }

    pub fn clear(&mut self) {
        self.replace(Vec::new());
    }
}
