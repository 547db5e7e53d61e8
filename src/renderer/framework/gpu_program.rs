//! GPU shader program interface.

use crate::renderer::framework::{error::FrameworkError, gpu_texture::SharedGpuTexture};
use nalgebra::{Matrix4, Vector2, Vector3, Vector4};
use std::{any::Any, rc::Rc};

/// Opaque handle to a uniform of a specific program. Locations are resolved
/// once at pass construction and reused every frame.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct UniformLocation {
    pub(crate) id: usize,
}

/// A value bound to a uniform for a single draw call.
#[derive(Clone)]
pub enum UniformValue {
    /// Boolean flag.
    Bool(bool),
    /// Signed integer.
    Int(i32),
    /// Single float.
    Float(f32),
    /// Two-component vector.
    Vector2(Vector2<f32>),
    /// Three-component vector.
    Vector3(Vector3<f32>),
    /// Four-component vector.
    Vector4(Vector4<f32>),
    /// 4x4 matrix.
    Matrix4(Matrix4<f32>),
    /// Texture bound to a sampler unit.
    Sampler {
        /// Texture unit index.
        index: u32,
        /// Texture to bind.
        texture: SharedGpuTexture,
    },
}

impl std::fmt::Debug for UniformValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Bool(v) => write!(f, "Bool({v})"),
            Self::Int(v) => write!(f, "Int({v})"),
            Self::Float(v) => write!(f, "Float({v})"),
            Self::Vector2(v) => write!(f, "Vector2({v:?})"),
            Self::Vector3(v) => write!(f, "Vector3({v:?})"),
            Self::Vector4(v) => write!(f, "Vector4({v:?})"),
            Self::Matrix4(v) => write!(f, "Matrix4({v:?})"),
            Self::Sampler { index, .. } => write!(f, "Sampler(unit {index})"),
        }
    }
}

/// A linked shader program living on the server.
pub trait GpuProgram: Any {
    /// Name the program was created with, for diagnostics.
    fn name(&self) -> &str;
    /// Resolves a uniform by name. Fails when the program has no such
    /// uniform.
    fn uniform_location(&self, name: &str) -> Result<UniformLocation, FrameworkError>;
    /// Backend-specific self access.
    fn as_any(&self) -> &dyn Any;
}

/// Shared handle to a program.
pub type SharedGpuProgram = Rc<dyn GpuProgram>;
