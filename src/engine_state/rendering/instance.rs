//! Per-instance data handed to the renderer.
//!
//! Every tile column and every bush leaf is drawn from one shared mesh (a box and
//! a sphere respectively), so the scene only has to describe where each copy goes
//! and which material it uses.

use cgmath::Matrix4;

/// One instanced mesh copy.
///
/// # Memory Layout
/// - Model matrix: 4x [f32; 4] (64 bytes)
/// - Material index: u32 (4 bytes)
/// - Padding: 3x u32 (12 bytes)
///
/// Total size: 80 bytes, a multiple of 16 so the struct can also back a storage buffer.
#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct InstanceRaw {
    /// Column-major model matrix
    model: [[f32; 4]; 4],
    /// Index of the material variant, see `MaterialKind::index`
    material: u32,
    _padding: [u32; 3],
}

impl InstanceRaw {
    /// Packs a model matrix and material index.
    pub fn new(model: Matrix4<f32>, material: u32) -> Self {
        Self {
            model: model.into(),
            material,
            _padding: [0; 3],
        }
    }

    /// The model matrix.
    pub fn model(&self) -> Matrix4<f32> {
        self.model.into()
    }

    /// The material index.
    pub fn material(&self) -> u32 {
        self.material
    }

    /// Views a slice of instances as bytes ready for a buffer upload.
    pub fn as_bytes(instances: &[InstanceRaw]) -> &[u8] {
        bytemuck::cast_slice(instances)
    }
}
