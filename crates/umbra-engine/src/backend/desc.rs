use bitflags::bitflags;

/// Formats the engine creates textures in.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum TextureFormat {
    /// 4 x 32-bit float; G-buffer color targets. Not filterable.
    Rgba32Float,
    /// 24-bit depth + 8-bit stencil.
    Depth24PlusStencil8,
}

bitflags! {
    #[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
    pub struct TextureUsage: u8 {
        const RENDER_TARGET = 0b001;
        const DEPTH_STENCIL = 0b010;
        const SHADER_RESOURCE = 0b100;
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextureDesc {
    pub label: String,
    pub width: u32,
    pub height: u32,
    pub format: TextureFormat,
    pub usage: TextureUsage,
}

/// Decoded RGBA8 pixels, row-major, tightly packed.
#[derive(Debug, Clone, Copy)]
pub struct ImageDesc<'a> {
    pub label: &'a str,
    pub width: u32,
    pub height: u32,
    pub rgba: &'a [u8],
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum BufferKind {
    Constant,
    Vertex { stride: u32 },
    Index,
}

#[derive(Debug, Clone, Copy)]
pub struct BufferDesc<'a> {
    pub label: &'a str,
    pub kind: BufferKind,
    pub size: u64,
    /// Initial contents; zero-filled when `None`.
    pub contents: Option<&'a [u8]>,
}
