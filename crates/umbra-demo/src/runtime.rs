use std::path::PathBuf;

use anyhow::{Context, Result};
use ouroboros::self_referencing;
use winit::application::ApplicationHandler;
use winit::dpi::LogicalSize;
use winit::event::WindowEvent;
use winit::event_loop::{ActiveEventLoop, ControlFlow, EventLoop};
use winit::window::{Window, WindowId};

use umbra_engine::backend::{Backend, PresentStatus, WgpuBackend};
use umbra_engine::device::SurfaceErrorAction;
use umbra_engine::{Device, DeviceConfig, DeviceInit, GraphicsError};

use crate::clock::FrameClock;
use crate::input::InputState;
use crate::scene::DemoScene;

/// Window/runtime configuration.
#[derive(Debug, Clone)]
pub struct RuntimeConfig {
    pub title: String,
    pub initial_size: LogicalSize<f64>,
    /// Image applied to every mesh; blank white when unset.
    pub texture: Option<PathBuf>,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            title: "umbra".to_string(),
            initial_size: LogicalSize::new(1280.0, 720.0),
            texture: None,
        }
    }
}

/// Entry point for the runtime.
pub struct Runtime;

impl Runtime {
    pub fn run(config: RuntimeConfig, init: DeviceInit, device_config: DeviceConfig) -> Result<()> {
        let event_loop = EventLoop::new().context("failed to create winit EventLoop")?;
        let mut state = AppState::new(config, init, device_config);

        event_loop.run_app(&mut state).context("winit event loop terminated with error")?;

        state.failure.map_or(Ok(()), Err)
    }
}

#[self_referencing]
struct WindowEntry {
    input: InputState,
    clock: FrameClock,
    scene: Option<DemoScene>,

    window: Window,

    #[borrows(window)]
    #[covariant]
    device: Device<WgpuBackend<'this>>,
}

struct AppState {
    config: RuntimeConfig,
    init: DeviceInit,
    device_config: DeviceConfig,

    entry: Option<WindowEntry>,
    window_id: Option<WindowId>,
    failure: Option<anyhow::Error>,
}

impl AppState {
    fn new(config: RuntimeConfig, init: DeviceInit, device_config: DeviceConfig) -> Self {
        Self { config, init, device_config, entry: None, window_id: None, failure: None }
    }

    fn fail(&mut self, event_loop: &ActiveEventLoop, err: anyhow::Error) {
        log::error!("{err:#}");
        self.failure = Some(err);
        event_loop.exit();
    }

    fn create_window_entry(&mut self, event_loop: &ActiveEventLoop) -> Result<()> {
        let attrs = Window::default_attributes()
            .with_title(self.config.title.clone())
            .with_inner_size(self.config.initial_size);
        let window = event_loop.create_window(attrs).context("failed to create window")?;
        let id = window.id();

        let init = self.init.clone();
        let device_config = self.device_config.clone();
        let mut entry = WindowEntryTryBuilder {
            input: InputState::default(),
            clock: FrameClock::default(),
            scene: None,
            window,
            device_builder: |w| {
                pollster::block_on(WgpuBackend::new(w, init))
                    .context("GPU initialization failed")
                    .and_then(|backend| {
                        Device::new(backend, device_config).context("renderer initialization failed")
                    })
            },
        }
        .try_build()?;

        let gpu = entry.borrow_device().backend().gpu();
        let info = gpu.adapter().get_info();
        log::info!("rendering on {} via {:?}", info.name, info.backend);
        log::debug!("device features: {:?}", gpu.features());

        let texture = self.config.texture.clone();
        entry.with_mut(|fields| -> Result<()> {
            *fields.scene = Some(DemoScene::new(fields.device, texture.as_deref())?);
            Ok(())
        })?;

        self.window_id = Some(id);
        self.entry = Some(entry);
        Ok(())
    }

    fn redraw(&mut self, event_loop: &ActiveEventLoop) {
        let Some(entry) = self.entry.as_mut() else { return };

        let result = entry.with_mut(|fields| {
            let (width, height) = fields.device.backend().back_buffer_size();
            if width == 0 || height == 0 {
                fields.clock.reset();
                return Ok(PresentStatus::Skipped(SurfaceErrorAction::SkipFrame));
            }
            let Some(scene) = fields.scene.as_mut() else {
                return Ok(PresentStatus::Skipped(SurfaceErrorAction::SkipFrame));
            };

            let time = fields.clock.tick();
            scene.update(time, fields.input);
            if time.frame_index % 600 == 0 {
                log::debug!("frame {} dt {:.2} ms", time.frame_index, time.dt * 1000.0);
            }
            scene.render(fields.device)
        });

        match result {
            Ok(PresentStatus::Presented) => {}
            Ok(PresentStatus::Skipped(action)) => log::trace!("frame skipped ({action:?})"),
            Err(err @ GraphicsError::Surface(_)) => self.fail(event_loop, anyhow::Error::new(err).context("surface lost")),
            Err(err) => self.fail(event_loop, anyhow::Error::new(err).context("frame failed")),
        }
    }

    fn resize(&mut self, event_loop: &ActiveEventLoop, width: u32, height: u32) {
        let Some(entry) = self.entry.as_mut() else { return };

        let result = entry.with_mut(|fields| {
            fields.device.resize(width, height)?;
            if let Some(scene) = fields.scene.as_mut() {
                scene.resized(width, height);
            }
            fields.window.request_redraw();
            Ok::<_, GraphicsError>(())
        });
        if let Err(err) = result {
            self.fail(event_loop, anyhow::Error::new(err).context("resize failed"));
        }
    }
}

impl ApplicationHandler for AppState {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.entry.is_some() {
            return;
        }

        if let Err(e) = self.create_window_entry(event_loop) {
            self.fail(event_loop, e.context("failed to create initial window"));
            return;
        }

        if let Some(entry) = &self.entry {
            entry.with_window(|w| w.request_redraw());
        }
    }

    fn about_to_wait(&mut self, event_loop: &ActiveEventLoop) {
        event_loop.set_control_flow(ControlFlow::Poll);

        // Continuous redraw.
        if let Some(entry) = &self.entry {
            entry.with_window(|w| w.request_redraw());
        }
    }

    fn window_event(&mut self, event_loop: &ActiveEventLoop, window_id: WindowId, event: WindowEvent) {
        if self.window_id != Some(window_id) {
            return;
        }

        let mut quit = false;
        if let Some(entry) = self.entry.as_mut() {
            entry.with_input_mut(|input| {
                input.apply(&event);
                quit = input.escape_pressed();
            });
        }
        if quit {
            event_loop.exit();
            return;
        }

        match event {
            WindowEvent::CloseRequested => {
                if let Some(entry) = self.entry.take() {
                    log::debug!("built {} render pipelines", entry.borrow_device().backend().pipeline_count());
                }
                event_loop.exit();
            }

            WindowEvent::Resized(size) => self.resize(event_loop, size.width, size.height),

            WindowEvent::ScaleFactorChanged { .. } => {
                let size = self.entry.as_ref().map(|e| e.with_window(|w| w.inner_size()));
                if let Some(size) = size {
                    self.resize(event_loop, size.width, size.height);
                }
            }

            WindowEvent::RedrawRequested => self.redraw(event_loop),

            _ => {}
        }
    }
}
