//! Render sync bridge.
//!
//! Moves finished simulation state into an instanced render buffer, once per
//! render frame and only when a tick has produced something new.

use crate::particle::Particle;
use crate::simulation::{SharedState, lock};
use bytemuck::{Pod, Zeroable};
use std::sync::Arc;
use std::sync::atomic::Ordering;

// --- Render Instance Layout ---
// `repr(C)` so the byte view can be uploaded as an instance buffer directly.
#[repr(C)]
#[derive(Debug, Copy, Clone, PartialEq, Pod, Zeroable)]
pub struct ParticleInstance {
    pub position: [f32; 3],
    pub _padding: f32, // Keeps color 16-byte aligned for the shader side
    pub color: [f32; 4],
}

impl ParticleInstance {
    pub fn from_particle(particle: &Particle) -> Self {
        Self {
            position: particle.position.as_vec3().into(),
            _padding: 0.0,
            color: particle.color().into(),
        }
    }
}

/// Fixed-length instance buffer owned by the renderer side.
#[derive(Debug, Clone)]
pub struct InstanceBuffer {
    instances: Vec<ParticleInstance>,
    needs_upload: bool,
}

impl InstanceBuffer {
    pub fn new(len: usize) -> Self {
        Self {
            instances: vec![ParticleInstance::zeroed(); len],
            needs_upload: false,
        }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.instances.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.instances.is_empty()
    }

    #[inline]
    pub fn instances(&self) -> &[ParticleInstance] {
        &self.instances
    }

    #[inline]
    pub fn as_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.instances)
    }

    /// Set by a sync that wrote new data; the renderer clears it after uploading.
    #[inline]
    pub fn needs_upload(&self) -> bool {
        self.needs_upload
    }

    pub fn mark_uploaded(&mut self) {
        self.needs_upload = false;
    }
}

/// Render-side handle. Cheap to clone; every clone drains the same dirty flag.
#[derive(Clone)]
pub struct RenderSync {
    shared: Arc<SharedState>,
}

impl RenderSync {
    pub(crate) fn new(shared: Arc<SharedState>) -> Self {
        Self { shared }
    }

    pub fn is_dirty(&self) -> bool {
        self.shared.dirty.load(Ordering::Acquire)
    }

    /// Copies the latest published tick into `buffer` if one is pending.
    /// Returns `false` (and leaves `buffer` untouched) otherwise.
    pub fn sync(&self, buffer: &mut InstanceBuffer) -> bool {
        // Only this side ever moves the flag from true to false.
        if self
            .shared
            .dirty
            .compare_exchange(true, false, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            return false;
        }

        let front = lock(&self.shared.front);
        if buffer.instances.len() != front.len() {
            log::debug!(
                "Resizing instance buffer from {} to {} particles",
                buffer.instances.len(),
                front.len()
            );
        }
        buffer.instances.clone_from(&*front);
        buffer.needs_upload = true;
        true
    }
}
