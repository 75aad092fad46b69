use std::marker::PhantomData;

use bytemuck::Pod;

use crate::backend::{Backend, BufferDesc, BufferKind};
use crate::device::Result;
use crate::pipeline::{BufferId, PipelineState, StageMask};

/// Fixed-size constant buffer holding one `T`, bound at one slot.
#[derive(Debug)]
pub struct ConstantBuffer<T> {
    id: BufferId,
    slot: u32,
    stages: StageMask,
    _data: PhantomData<T>,
}

impl<T: Pod> ConstantBuffer<T> {
    pub fn new(backend: &mut dyn Backend, label: &str, slot: u32, stages: StageMask) -> Result<Self> {
        let id = backend.create_buffer(&BufferDesc {
            label,
            kind: BufferKind::Constant,
            size: std::mem::size_of::<T>() as u64,
            contents: None,
        })?;
        log::debug!("constant buffer `{label}` {id:?} at slot {slot}");
        Ok(Self { id, slot, stages, _data: PhantomData })
    }

    pub fn id(&self) -> BufferId {
        self.id
    }

    pub fn slot(&self) -> u32 {
        self.slot
    }

    pub fn stages(&self) -> StageMask {
        self.stages
    }

    /// Overwrites the whole buffer with `data`.
    pub fn update(&self, state: &mut PipelineState, data: &T) {
        state.update_buffer(self.id, bytemuck::bytes_of(data));
    }

    pub fn enable(&self, state: &mut PipelineState) -> Result<()> {
        state.set_constant_buffer(self.stages, self.slot, Some(self.id))
    }

    pub fn disable(&self, state: &mut PipelineState) -> Result<()> {
        state.set_constant_buffer(self.stages, self.slot, None)
    }
}

/// CPU copy of a constant buffer's contents with a dirty flag.
///
/// Setters only touch the CPU copy. The buffer is rewritten, once, on the next
/// [`flush`](Self::flush) or [`enable`](Self::enable) after a change, so the
/// GPU contents may lag the CPU fields in between.
#[derive(Debug)]
pub struct UniformBlock<T> {
    data: T,
    buffer: ConstantBuffer<T>,
    dirty: bool,
}

impl<T: Pod> UniformBlock<T> {
    /// Starts dirty so the first `enable` uploads `data`.
    pub fn new(
        backend: &mut dyn Backend,
        label: &str,
        slot: u32,
        stages: StageMask,
        data: T,
    ) -> Result<Self> {
        let buffer = ConstantBuffer::new(backend, label, slot, stages)?;
        Ok(Self { data, buffer, dirty: true })
    }

    pub fn get(&self) -> &T {
        &self.data
    }

    /// Mutates the CPU copy and marks it dirty.
    pub fn modify(&mut self, f: impl FnOnce(&mut T)) {
        f(&mut self.data);
        self.dirty = true;
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    pub fn buffer(&self) -> &ConstantBuffer<T> {
        &self.buffer
    }

    /// Uploads the CPU copy if it changed since the last upload.
    pub fn flush(&mut self, state: &mut PipelineState) {
        if self.dirty {
            self.buffer.update(state, &self.data);
            self.dirty = false;
        }
    }

    pub fn enable(&mut self, state: &mut PipelineState) -> Result<()> {
        self.flush(state);
        self.buffer.enable(state)
    }

    pub fn disable(&self, state: &mut PipelineState) -> Result<()> {
        self.buffer.disable(state)
    }
}
