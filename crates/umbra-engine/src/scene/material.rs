use bytemuck::{Pod, Zeroable};

use crate::backend::Backend;
use crate::device::Result;
use crate::pipeline::slots::MATERIAL_SLOT;
use crate::pipeline::{PipelineState, StageMask};
use crate::resource::UniformBlock;

#[repr(C)]
#[derive(Debug, Copy, Clone, PartialEq, Pod, Zeroable)]
pub struct MaterialData {
    pub ambient_intensity: f32,
    pub diffuse_intensity: f32,
    pub specular_intensity: f32,
    pub specular_hardness: i32,
}

impl Default for MaterialData {
    fn default() -> Self {
        Self {
            ambient_intensity: 1.0,
            diffuse_intensity: 1.0,
            specular_intensity: 1.0,
            specular_hardness: 100,
        }
    }
}

/// Surface response parameters, uploaded on `enable` when changed.
#[derive(Debug)]
pub struct Material {
    block: UniformBlock<MaterialData>,
}

impl Material {
    pub fn new(backend: &mut dyn Backend) -> Result<Self> {
        let block = UniformBlock::new(
            backend,
            "material",
            MATERIAL_SLOT,
            StageMask::PIXEL,
            MaterialData::default(),
        )?;
        Ok(Self { block })
    }

    pub fn data(&self) -> &MaterialData {
        self.block.get()
    }

    pub fn block(&self) -> &UniformBlock<MaterialData> {
        &self.block
    }

    pub fn ambient_intensity(&self) -> f32 {
        self.data().ambient_intensity
    }

    pub fn set_ambient_intensity(&mut self, intensity: f32) {
        self.block.modify(|d| d.ambient_intensity = intensity);
    }

    pub fn diffuse_intensity(&self) -> f32 {
        self.data().diffuse_intensity
    }

    pub fn set_diffuse_intensity(&mut self, intensity: f32) {
        self.block.modify(|d| d.diffuse_intensity = intensity);
    }

    pub fn specular_intensity(&self) -> f32 {
        self.data().specular_intensity
    }

    pub fn set_specular_intensity(&mut self, intensity: f32) {
        self.block.modify(|d| d.specular_intensity = intensity);
    }

    pub fn specular_hardness(&self) -> i32 {
        self.data().specular_hardness
    }

    pub fn set_specular_hardness(&mut self, hardness: i32) {
        self.block.modify(|d| d.specular_hardness = hardness);
    }

    pub fn enable(&mut self, state: &mut PipelineState) -> Result<()> {
        self.block.enable(state)
    }

    pub fn disable(&self, state: &mut PipelineState) -> Result<()> {
        self.block.disable(state)
    }
}
