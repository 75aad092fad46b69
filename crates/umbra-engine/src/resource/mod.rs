//! Bindable GPU resources.
//!
//! Every resource binds itself to a fixed slot through `enable` and releases
//! the same slots through `disable`; nothing else touches its slots.

mod buffer;
mod target;
mod texture;

pub use buffer::{ConstantBuffer, UniformBlock};
pub use target::{FrameBuffer, GeometryBuffer, RenderTarget};
pub use texture::{Texture, TextureKind};
