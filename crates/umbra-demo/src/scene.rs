use std::path::Path;

use anyhow::{Context, Result};
use glam::Vec3;
use winit::keyboard::KeyCode;

use umbra_engine::backend::{Backend, PresentStatus};
use umbra_engine::resource::Texture;
use umbra_engine::scene::{Camera, Light, LightKind, Material, Mesh, MeshData};
use umbra_engine::Device;

use crate::clock::FrameTime;
use crate::input::InputState;

const MOVE_SPEED: f32 = 3.0;
/// Degrees of camera rotation per pixel of mouse drag.
const DRAG_SENSITIVITY: f32 = 0.2;
const CUBE_SPIN: f32 = 30.0;
const POINT_ORBIT: f32 = 45.0;

/// A spinning cube on a floor slab, lit by one light of each kind.
pub struct DemoScene {
    camera: Camera,
    cube: Mesh,
    floor: Mesh,
    cube_material: Material,
    floor_material: Material,
    texture: Option<Texture>,

    ambient: Light,
    sun: Light,
    point: Light,
    spot: Light,
}

impl DemoScene {
    pub fn new<B: Backend>(device: &mut Device<B>, texture: Option<&Path>) -> Result<Self> {
        let (width, height) = device.backend().back_buffer_size();

        let mut camera = Camera::new();
        camera.set_aspect_ratio(width as f32 / height.max(1) as f32);
        camera.set_far_plane(50.0);
        camera.move_by(Vec3::new(0.0, 1.5, -4.0));
        camera.rotate(Vec3::X, 15.0);

        let texture = texture
            .map(|path| device.load_texture(path, 16).with_context(|| format!("loading {}", path.display())))
            .transpose()?;

        let backend = device.backend_mut();
        let cube = Mesh::new(backend, &MeshData::cube())?;
        let mut floor = Mesh::new(backend, &MeshData::cube())?;
        floor.scale(Vec3::new(12.0, 0.1, 12.0));
        floor.move_by(Vec3::new(0.0, -1.1, 0.0));

        let mut cube_material = Material::new(backend)?;
        cube_material.set_specular_hardness(64);
        let mut floor_material = Material::new(backend)?;
        floor_material.set_specular_intensity(0.2);

        let mut ambient = Light::new(backend, LightKind::Ambient)?;
        ambient.set_intensity(0.15);

        let mut sun = Light::new(backend, LightKind::Direction)?;
        sun.rotate(Vec3::X, 50.0);
        sun.rotate(Vec3::Y, 30.0);
        sun.set_intensity(0.6);

        let mut point = Light::new(backend, LightKind::Point)?;
        point.move_by(Vec3::new(2.0, 0.5, 0.0));
        point.set_color(Vec3::new(1.0, 0.6, 0.2));
        point.set_falloff(6.0);

        let mut spot = Light::new(backend, LightKind::Spot)?;
        spot.move_by(Vec3::new(0.0, 3.0, 0.0));
        spot.rotate(Vec3::X, 90.0);
        spot.set_color(Vec3::new(0.3, 0.5, 1.0));
        spot.set_intensity(2.0);

        Ok(Self { camera, cube, floor, cube_material, floor_material, texture, ambient, sun, point, spot })
    }

    pub fn resized(&mut self, width: u32, height: u32) {
        if width > 0 && height > 0 {
            self.camera.set_aspect_ratio(width as f32 / height as f32);
        }
    }

    /// Applies camera input and advances the animation.
    pub fn update(&mut self, time: FrameTime, input: &mut InputState) {
        let step = MOVE_SPEED * time.dt;
        let mut offset = Vec3::ZERO;
        for (key, dir) in [
            (KeyCode::KeyW, self.camera.forward()),
            (KeyCode::KeyS, -self.camera.forward()),
            (KeyCode::KeyD, self.camera.right()),
            (KeyCode::KeyA, -self.camera.right()),
        ] {
            if input.is_held(key) {
                offset += dir;
            }
        }
        if offset != Vec3::ZERO {
            self.camera.move_by(offset.normalize() * step);
        }

        let (dx, dy) = input.take_drag();
        if dx != 0.0 {
            self.camera.rotate(Vec3::Y, dx * DRAG_SENSITIVITY);
        }
        if dy != 0.0 {
            let right = self.camera.right();
            self.camera.rotate(right, dy * DRAG_SENSITIVITY);
        }

        self.cube.rotate(Vec3::Y, CUBE_SPIN * time.dt);

        // Orbit the point light around the cube.
        let p = self.point.position();
        let orbited = glam::Quat::from_rotation_y((POINT_ORBIT * time.dt).to_radians()) * p;
        self.point.move_by(orbited - p);
    }

    /// Records and submits one frame.
    pub fn render<B: Backend>(&mut self, device: &mut Device<B>) -> umbra_engine::Result<PresentStatus> {
        device.set_camera(&self.camera);

        device.geometry_begin()?;
        if let Some(texture) = &self.texture {
            texture.enable(device.pipeline())?;
        }
        device.draw_mesh(&self.floor, &mut self.floor_material)?;
        device.draw_mesh(&self.cube, &mut self.cube_material)?;
        if let Some(texture) = &self.texture {
            texture.disable(device.pipeline())?;
        }
        device.geometry_end()?;

        device.ambient_light_begin()?;
        device.draw_light(&mut self.ambient)?;
        device.ambient_light_end()?;

        device.dynamic_light_begin()?;
        for light in [&mut self.sun, &mut self.point, &mut self.spot] {
            device.draw_light(light)?;
        }
        device.dynamic_light_end()?;

        device.frame_end()
    }
}
