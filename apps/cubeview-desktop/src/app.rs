use crate::WindowConfig;
use crate::keys::HeldKeys;
use anyhow::Context;
use cubeview_geometry::Mesh;
use cubeview_input::{EventQueue, ViewerEvent};
use cubeview_render::{FrameConfig, FrameLoop, LoopState};
use cubeview_render_wgpu::WgpuDevice;
use std::sync::Arc;
use winit::application::ApplicationHandler;
use winit::dpi::PhysicalSize;
use winit::event::{ElementState, KeyEvent, WindowEvent};
use winit::event_loop::ActiveEventLoop;
use winit::keyboard::PhysicalKey;
use winit::window::{Window, WindowId};

/// winit host for the frame loop.
///
/// Window events are queued as viewer events and drained by the frame loop
/// at the start of each redraw.
pub struct ViewerApp {
    window_config: WindowConfig,
    frame_config: FrameConfig,
    mesh: Mesh,
    // Declared before `window` so the geometry is released while the surface
    // still exists.
    frame_loop: Option<FrameLoop<WgpuDevice>>,
    window: Option<Arc<Window>>,
    events: EventQueue,
    keys: HeldKeys,
    error: Option<anyhow::Error>,
}

impl ViewerApp {
    pub fn new(window_config: WindowConfig, frame_config: FrameConfig, mesh: Mesh) -> Self {
        Self {
            window_config,
            frame_config,
            mesh,
            frame_loop: None,
            window: None,
            events: EventQueue::new(),
            keys: HeldKeys::new(),
            error: None,
        }
    }

    /// The error that stopped the viewer, if any.
    pub fn finish(self) -> anyhow::Result<()> {
        match self.error {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }

    fn init(&mut self, event_loop: &ActiveEventLoop) -> anyhow::Result<()> {
        let attrs = Window::default_attributes()
            .with_title(self.window_config.title.clone())
            .with_inner_size(PhysicalSize::new(
                self.window_config.width,
                self.window_config.height,
            ));
        let window = Arc::new(event_loop.create_window(attrs).context("create window")?);

        let size = window.inner_size();
        let device = WgpuDevice::new(window.clone(), size.width, size.height)
            .context("initialize graphics device")?;
        let frame_loop = FrameLoop::new(
            device,
            &self.mesh,
            size.width,
            size.height,
            self.frame_config,
        )
        .context("upload geometry")?;

        self.window = Some(window);
        self.frame_loop = Some(frame_loop);
        Ok(())
    }

    fn fail(&mut self, event_loop: &ActiveEventLoop, error: anyhow::Error) {
        tracing::error!("{error:#}");
        self.error = Some(error);
        event_loop.exit();
    }

    /// Dispatch queued events now. Used for close requests so shutdown does
    /// not wait on the next redraw.
    fn drain(&mut self, event_loop: &ActiveEventLoop) {
        if let Some(frame_loop) = self.frame_loop.as_mut() {
            frame_loop.drain_events(&mut self.events, &self.keys);
            if frame_loop.is_closed() {
                event_loop.exit();
            }
        }
    }

    fn redraw(&mut self, event_loop: &ActiveEventLoop) {
        let Some(frame_loop) = self.frame_loop.as_mut() else {
            return;
        };
        match frame_loop.iterate(&mut self.events, &self.keys) {
            Ok(LoopState::Running) => {}
            Ok(LoopState::Closed) => event_loop.exit(),
            Err(e) => self.fail(event_loop, anyhow::Error::new(e).context("render frame")),
        }
    }
}

impl ApplicationHandler for ViewerApp {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.window.is_some() || self.error.is_some() {
            return;
        }
        if let Err(e) = self.init(event_loop) {
            self.fail(event_loop, e);
        }
    }

    fn window_event(
        &mut self,
        event_loop: &ActiveEventLoop,
        _window_id: WindowId,
        event: WindowEvent,
    ) {
        match event {
            WindowEvent::CloseRequested => {
                self.events.push(ViewerEvent::Close);
                self.drain(event_loop);
            }
            WindowEvent::Resized(new_size) => {
                self.events.push(ViewerEvent::Resized {
                    width: new_size.width,
                    height: new_size.height,
                });
            }
            WindowEvent::KeyboardInput {
                event:
                    KeyEvent {
                        physical_key: PhysicalKey::Code(key),
                        state: key_state,
                        ..
                    },
                is_synthetic,
                ..
            } => {
                let pressed = key_state == ElementState::Pressed;
                if let Some(event) = self.keys.key_event(key, pressed, is_synthetic) {
                    self.events.push(event);
                }
            }
            WindowEvent::Focused(false) => {
                self.keys.clear();
                self.events.push(ViewerEvent::Other);
            }
            WindowEvent::RedrawRequested => self.redraw(event_loop),
            _ => self.events.push(ViewerEvent::Other),
        }
    }

    fn about_to_wait(&mut self, _event_loop: &ActiveEventLoop) {
        if let Some(window) = &self.window {
            window.request_redraw();
        }
    }

    fn exiting(&mut self, _event_loop: &ActiveEventLoop) {
        if let Some(frame_loop) = self.frame_loop.take() {
            tracing::info!(frames = frame_loop.frames(), "viewer shut down");
        }
        self.window = None;
    }
}
