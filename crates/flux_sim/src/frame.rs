use flux_core::{ParticleStore, RenderInstance};

/// Immutable render snapshot published after each `step`.
///
/// Frames are handed out behind an `Arc`, so a renderer on another thread
/// can keep reading one while the simulation advances.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Frame {
    /// Tick count at capture time
    pub tick: u64,
    /// One instance per live particle, in id order
    pub instances: Vec<RenderInstance>,
}

impl Frame {
    pub fn capture(tick: u64, store: &ParticleStore) -> Self {
        Self {
            tick,
            instances: store.iter().map(RenderInstance::from).collect(),
        }
    }

    /// Raw bytes for a GPU instance buffer.
    pub fn as_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.instances)
    }

    pub fn len(&self) -> usize {
        self.instances.len()
    }

    pub fn is_empty(&self) -> bool {
        self.instances.is_empty()
    }
}
