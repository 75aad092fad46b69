use std::fmt;

macro_rules! resource_id {
    ($(#[$meta:meta])* $name:ident, $kind:literal) => {
        $(#[$meta])*
        #[derive(Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
        pub struct $name(pub(crate) u32);

        impl $name {
            /// Kind name used in diagnostics.
            pub const KIND: &'static str = $kind;

            #[inline]
            pub const fn raw(self) -> u32 {
                self.0
            }
        }

        impl fmt::Debug for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}#{}", $kind, self.0)
            }
        }
    };
}

resource_id!(
    /// GPU texture handle. Views (render target, depth-stencil, shader
    /// resource) are derived from it by the backend.
    TextureId,
    "texture"
);
resource_id!(
    /// GPU buffer handle (constant, vertex or index).
    BufferId,
    "buffer"
);
resource_id!(
    /// GPU sampler handle.
    SamplerId,
    "sampler"
);
resource_id!(
    /// Compiled vertex + pixel program pair.
    ShaderId,
    "shader"
);

impl TextureId {
    /// The swap chain's current back buffer. Reserved by every backend.
    pub const BACK_BUFFER: TextureId = TextureId(0);

    #[inline]
    pub const fn is_back_buffer(self) -> bool {
        self.0 == Self::BACK_BUFFER.0
    }
}
