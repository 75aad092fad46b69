use std::collections::{HashMap, VecDeque};

use crate::device::{GraphicsError, Result};
use crate::pipeline::{BufferId, Command, SamplerDesc, SamplerId, ShaderId, TextureId};
use crate::shader::ShaderProgram;

use super::{Backend, BufferDesc, BufferKind, IdAllocator, ImageDesc, PresentStatus, TextureDesc};

/// Buffer as seen by the headless backend. Contents track every
/// `UpdateBuffer` in submitted frames.
#[derive(Debug, Clone, PartialEq)]
pub struct HeadlessBuffer {
    pub label: String,
    pub kind: BufferKind,
    pub contents: Vec<u8>,
}

/// Backend without a GPU.
///
/// Resource creation only records descriptions. `present` checks that every
/// referenced id exists, applies buffer updates to the stored contents and
/// keeps the command lists of the most recent frames for inspection, up to
/// [`DEFAULT_RETAINED_FRAMES`] unless changed with
/// [`with_retained_frames`](Self::with_retained_frames).
/// Frames kept by [`HeadlessBackend::new`].
pub const DEFAULT_RETAINED_FRAMES: usize = 4;

#[derive(Debug)]
pub struct HeadlessBackend {
    ids: IdAllocator,
    size: (u32, u32),
    textures: HashMap<TextureId, TextureDesc>,
    images: HashMap<TextureId, (u32, u32)>,
    buffers: HashMap<BufferId, HeadlessBuffer>,
    samplers: HashMap<SamplerId, SamplerDesc>,
    shaders: HashMap<ShaderId, String>,
    frames: VecDeque<Vec<Command>>,
    retained_frames: usize,
    presented: u64,
}

impl HeadlessBackend {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            ids: IdAllocator::default(),
            size: (width, height),
            textures: HashMap::new(),
            images: HashMap::new(),
            buffers: HashMap::new(),
            samplers: HashMap::new(),
            shaders: HashMap::new(),
            frames: VecDeque::new(),
            retained_frames: DEFAULT_RETAINED_FRAMES,
            presented: 0,
        }
    }

    /// Keeps the command lists of the last `count` frames. Zero keeps none.
    pub fn with_retained_frames(mut self, count: usize) -> Self {
        self.retained_frames = count;
        self.frames.truncate(count);
        self
    }

    /// Command lists of the retained frames, oldest first.
    pub fn frames(&self) -> &VecDeque<Vec<Command>> {
        &self.frames
    }

    pub fn last_frame(&self) -> Option<&[Command]> {
        self.frames.back().map(Vec::as_slice)
    }

    /// Frames presented so far, retained or not.
    pub fn presented_count(&self) -> u64 {
        self.presented
    }

    pub fn texture(&self, id: TextureId) -> Option<&TextureDesc> {
        self.textures.get(&id)
    }

    /// Size of an image texture created through [`Backend::create_image`].
    pub fn image_size(&self, id: TextureId) -> Option<(u32, u32)> {
        self.images.get(&id).copied()
    }

    pub fn buffer(&self, id: BufferId) -> Option<&HeadlessBuffer> {
        self.buffers.get(&id)
    }

    pub fn sampler(&self, id: SamplerId) -> Option<&SamplerDesc> {
        self.samplers.get(&id)
    }

    pub fn shader_label(&self, id: ShaderId) -> Option<&str> {
        self.shaders.get(&id).map(String::as_str)
    }

    /// Number of live render/depth textures (images excluded).
    pub fn texture_count(&self) -> usize {
        self.textures.len()
    }

    fn check_texture(&self, id: TextureId) -> Result<()> {
        if id.is_back_buffer() || self.textures.contains_key(&id) || self.images.contains_key(&id) {
            Ok(())
        } else {
            Err(unknown(TextureId::KIND, id.raw()))
        }
    }

    fn check(&self, command: &Command) -> Result<()> {
        for t in command.textures() {
            self.check_texture(t)?;
        }
        for b in command.buffers() {
            if !self.buffers.contains_key(&b) {
                return Err(unknown(BufferId::KIND, b.raw()));
            }
        }
        match command {
            Command::SetShader(Some(s)) if !self.shaders.contains_key(s) => {
                Err(unknown(ShaderId::KIND, s.raw()))
            }
            Command::SetSampler { sampler: Some(s), .. } if !self.samplers.contains_key(s) => {
                Err(unknown(SamplerId::KIND, s.raw()))
            }
            _ => Ok(()),
        }
    }
}

impl Backend for HeadlessBackend {
    fn back_buffer_size(&self) -> (u32, u32) {
        self.size
    }

    fn create_texture(&mut self, desc: &TextureDesc) -> Result<TextureId> {
        if desc.width == 0 || desc.height == 0 {
            return Err(GraphicsError::InvalidSize { width: desc.width, height: desc.height });
        }
        let id = self.ids.texture();
        log::debug!("headless: texture {id:?} `{}` {}x{}", desc.label, desc.width, desc.height);
        self.textures.insert(id, desc.clone());
        Ok(id)
    }

    fn create_image(&mut self, desc: &ImageDesc<'_>) -> Result<TextureId> {
        if desc.width == 0 || desc.height == 0 {
            return Err(GraphicsError::InvalidSize { width: desc.width, height: desc.height });
        }
        let id = self.ids.texture();
        self.images.insert(id, (desc.width, desc.height));
        Ok(id)
    }

    fn create_sampler(&mut self, desc: &SamplerDesc) -> Result<SamplerId> {
        let id = self.ids.sampler();
        self.samplers.insert(id, *desc);
        Ok(id)
    }

    fn create_buffer(&mut self, desc: &BufferDesc<'_>) -> Result<BufferId> {
        let id = self.ids.buffer();
        let contents = match desc.contents {
            Some(bytes) => bytes.to_vec(),
            None => vec![0; desc.size as usize],
        };
        self.buffers.insert(
            id,
            HeadlessBuffer { label: desc.label.to_string(), kind: desc.kind, contents },
        );
        Ok(id)
    }

    fn create_shader(&mut self, program: &ShaderProgram) -> Result<ShaderId> {
        let id = self.ids.shader();
        self.shaders.insert(id, program.label.clone());
        Ok(id)
    }

    fn release_texture(&mut self, id: TextureId) {
        self.textures.remove(&id);
        self.images.remove(&id);
    }

    fn resize(&mut self, width: u32, height: u32) -> Result<()> {
        self.size = (width, height);
        Ok(())
    }

    fn present(&mut self, commands: &[Command]) -> Result<PresentStatus> {
        for command in commands {
            self.check(command)?;
        }
        for command in commands {
            if let Command::UpdateBuffer { buffer, data } = command {
                if let Some(b) = self.buffers.get_mut(buffer) {
                    b.contents.clear();
                    b.contents.extend_from_slice(data);
                }
            }
        }
        self.presented += 1;
        if self.retained_frames > 0 {
            if self.frames.len() == self.retained_frames {
                self.frames.pop_front();
            }
            self.frames.push_back(commands.to_vec());
        }
        Ok(PresentStatus::Presented)
    }
}

fn unknown(kind: &'static str, id: u32) -> GraphicsError {
    GraphicsError::UnknownResource { kind, id }
}
