//! Scene descriptors drawn by the device: meshes, camera, materials, lights.

mod camera;
mod light;
mod material;
mod mesh;
mod vertex;

pub use camera::Camera;
pub use light::{Light, LightData, LightKind};
pub use material::{Material, MaterialData};
pub use mesh::Mesh;
pub use vertex::{MeshData, Vertex};
