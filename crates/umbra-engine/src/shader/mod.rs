//! Shader programs.
//!
//! One WGSL source file holds both stages; it is preprocessed once per stage
//! with `VERTEX_SHADER` or `PIXEL_SHADER` defined, then parsed and validated
//! with naga before the backend sees it. Both stages use the entry point
//! [`ENTRY_POINT`].

mod compile;
mod layout;
mod preprocess;
mod program;

pub use compile::{compile, compile_stage, ENTRY_POINT};
pub use layout::{ShaderLayout, TextureSampleKind};
pub use preprocess::{preprocess, PreprocessError};
pub use program::{Shader, ShaderProgram, TransformData, VectorsData};

use std::fmt;

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum ShaderStage {
    Vertex,
    Pixel,
}

impl ShaderStage {
    /// Preprocessor symbol defined while compiling this stage.
    pub const fn define(self) -> &'static str {
        match self {
            ShaderStage::Vertex => "VERTEX_SHADER",
            ShaderStage::Pixel => "PIXEL_SHADER",
        }
    }

    pub(crate) fn naga(self) -> naga::ShaderStage {
        match self {
            ShaderStage::Vertex => naga::ShaderStage::Vertex,
            ShaderStage::Pixel => naga::ShaderStage::Fragment,
        }
    }
}

impl fmt::Display for ShaderStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ShaderStage::Vertex => "vertex",
            ShaderStage::Pixel => "pixel",
        })
    }
}
