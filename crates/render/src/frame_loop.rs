use crate::animation::AnimationAngle;
use crate::camera::Camera;
use crate::config::FrameConfig;
use crate::device::{Device, FrameStatus};
use crate::error::RenderError;
use crate::geometry_store::GeometryStore;
use crate::projection::Viewport;
use crate::transform::TransformStack;
use cubeview_geometry::Mesh;
use cubeview_input::{EventSource, KeyState, ViewerEvent};

/// Whether the loop keeps going.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopState {
    Running,
    /// A close was observed. Terminal: nothing is drawn from here on.
    Closed,
}

/// Owns the device and all per-frame state, and drives one frame per
/// [`FrameLoop::iterate`].
///
/// Dropping the loop releases the geometry if no close event did.
pub struct FrameLoop<D: Device> {
    device: D,
    geometry: GeometryStore,
    camera: Camera,
    viewport: Viewport,
    transforms: TransformStack,
    angle: AnimationAngle,
    config: FrameConfig,
    state: LoopState,
    frames: u64,
}

impl<D: Device> FrameLoop<D> {
    /// Upload `mesh` and set up the startup viewport and projection.
    ///
    /// Fails if the device refuses the geometry; callers treat that as fatal.
    pub fn new(
        mut device: D,
        mesh: &Mesh,
        width: u32,
        height: u32,
        config: FrameConfig,
    ) -> Result<Self, RenderError> {
        let geometry = GeometryStore::initialize(&mut device, mesh)?;
        let viewport = Viewport::new(width, height, config.startup_projection);
        device.set_viewport(viewport.rect());
        device.set_projection(viewport.projection.matrix());

        tracing::info!(width, height, "frame loop ready");

        Ok(Self {
            device,
            geometry,
            camera: config.camera,
            viewport,
            transforms: TransformStack::new(),
            angle: AnimationAngle::default(),
            config,
            state: LoopState::Running,
            frames: 0,
        })
    }

    pub fn state(&self) -> LoopState {
        self.state
    }

    pub fn is_closed(&self) -> bool {
        self.state == LoopState::Closed
    }

    pub fn camera(&self) -> &Camera {
        &self.camera
    }

    pub fn viewport(&self) -> &Viewport {
        &self.viewport
    }

    pub fn angle(&self) -> AnimationAngle {
        self.angle
    }

    /// Frames rendered or skipped so far.
    pub fn frames(&self) -> u64 {
        self.frames
    }

    pub fn device(&self) -> &D {
        &self.device
    }

    pub fn device_mut(&mut self) -> &mut D {
        &mut self.device
    }

    /// One full iteration: drain events, then draw and present unless closed.
    pub fn iterate<E, K>(&mut self, events: &mut E, keys: &K) -> Result<LoopState, RenderError>
    where
        E: EventSource + ?Sized,
        K: KeyState + ?Sized,
    {
        self.drain_events(events, keys);
        if self.is_closed() {
            return Ok(LoopState::Closed);
        }
        self.render_frame()?;
        Ok(self.state)
    }

    /// Iterate until a close is observed. Returns the number of frames.
    ///
    /// The source must eventually yield a close; an exhausted source keeps
    /// producing empty frames.
    pub fn run<E, K>(&mut self, events: &mut E, keys: &K) -> Result<u64, RenderError>
    where
        E: EventSource + ?Sized,
        K: KeyState + ?Sized,
    {
        while self.iterate(events, keys)? == LoopState::Running {}
        Ok(self.frames)
    }

    /// Dispatch every pending event. Events that follow a close are
    /// discarded.
    pub fn drain_events<E, K>(&mut self, events: &mut E, keys: &K)
    where
        E: EventSource + ?Sized,
        K: KeyState + ?Sized,
    {
        let mut discarded = 0usize;
        while let Some(event) = events.poll_event() {
            if self.is_closed() {
                discarded += 1;
                continue;
            }
            self.dispatch(event, keys);
        }
        if discarded > 0 {
            tracing::debug!(discarded, "events after close discarded");
        }
    }

    pub fn dispatch<K: KeyState + ?Sized>(&mut self, event: ViewerEvent, keys: &K) {
        match event {
            ViewerEvent::Close => self.close(),
            ViewerEvent::KeyPressed => {
                let pressed = keys.sample();
                self.camera.handle_directional_input(pressed);
            }
            ViewerEvent::Resized { width, height } => self.resize(width, height),
            ViewerEvent::Other => {}
        }
    }

    /// Draw and present one frame. Does nothing once closed.
    pub fn render_frame(&mut self) -> Result<(), RenderError> {
        if self.is_closed() {
            return Ok(());
        }

        let status = self.device.begin_frame(self.config.clear_color)?;
        if status == FrameStatus::Ready {
            self.draw_scene()?;
        } else {
            tracing::debug!(frame = self.frames, "frame skipped");
        }

        self.angle.advance(self.config.angle_step_degrees);
        self.frames += 1;

        if status == FrameStatus::Ready {
            self.device.present()?;
        }
        Ok(())
    }

    /// Release device resources and enter the terminal state. Repeat calls
    /// do nothing.
    pub fn close(&mut self) {
        if self.geometry.release(&mut self.device) {
            tracing::info!(frames = self.frames, "closing");
        }
        self.state = LoopState::Closed;
    }

    fn draw_scene(&mut self) -> Result<(), RenderError> {
        self.transforms.reset();

        self.transforms.push();
        self.transforms.multiply(self.camera.view_transform());

        self.transforms.push();
        self.transforms.multiply(self.angle.rotation());
        self.device.set_color(self.config.mesh_color);
        self.device.set_model_view(self.transforms.top());
        self.geometry.draw(&mut self.device);
        self.transforms.pop()?;

        self.transforms.pop()?;
        Ok(())
    }

    fn resize(&mut self, width: u32, height: u32) {
        tracing::info!(width, height, "resized");
        self.device.resize_target(width, height);
        self.viewport = Viewport::new(
            width,
            height,
            self.config.resize_lens.projection(width, height),
        );
        self.device.set_viewport(self.viewport.rect());
        self.device.set_projection(self.viewport.projection.matrix());
    }
}

impl<D: Device> Drop for FrameLoop<D> {
    fn drop(&mut self) {
        self.geometry.release(&mut self.device);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::device::ViewportRect;
    use crate::projection::{Lens, Projection};
    use crate::recording::{DeviceCall, RecordingDevice};
    use cubeview_geometry::{Topology, unit_cube};
    use cubeview_input::{Direction, DirectionSet, EventQueue};
    use glam::{Mat4, Vec3};

    fn new_loop() -> FrameLoop<RecordingDevice> {
        FrameLoop::new(
            RecordingDevice::new(),
            &unit_cube(),
            800,
            600,
            FrameConfig::default(),
        )
        .unwrap()
    }

    fn queue(events: &[ViewerEvent]) -> EventQueue {
        let mut queue = EventQueue::new();
        for event in events {
            queue.push(*event);
        }
        queue
    }

    fn no_keys() -> DirectionSet {
        DirectionSet::new()
    }

    fn held(directions: &[Direction]) -> DirectionSet {
        directions.iter().copied().collect()
    }

    #[test]
    fn startup_uses_startup_projection() {
        let fl = new_loop();
        assert_eq!(fl.viewport().projection, Projection::STARTUP);
        assert_eq!(
            fl.device().last_projection(),
            Some(Projection::STARTUP.matrix())
        );
        assert_eq!(fl.device().last_viewport(), Some(ViewportRect::full(800, 600)));
        assert_eq!(fl.state(), LoopState::Running);
    }

    #[test]
    fn frame_follows_draw_order() {
        let mut fl = new_loop();
        fl.device_mut().take_calls();
        fl.iterate(&mut EventQueue::new(), &no_keys()).unwrap();

        let calls = fl.device().calls();
        assert_eq!(calls.len(), 5);
        assert!(matches!(calls[0], DeviceCall::BeginFrame { clear_color } if clear_color == [0.0; 4]));
        assert_eq!(calls[1], DeviceCall::SetColor([0.5, 0.5, 0.0]));
        assert!(matches!(calls[2], DeviceCall::SetModelView(_)));
        assert!(matches!(
            calls[3],
            DeviceCall::DrawIndexed {
                index_count: 24,
                topology: Topology::Quads,
                ..
            }
        ));
        assert_eq!(calls[4], DeviceCall::Present);
    }

    #[test]
    fn model_view_is_view_times_rotation() {
        let mut fl = new_loop();
        let mut events = EventQueue::new();
        fl.iterate(&mut events, &no_keys()).unwrap();
        let first = fl.device().last_model_view().unwrap();
        assert_eq!(first, fl.camera().view_transform());

        fl.iterate(&mut events, &no_keys()).unwrap();
        let second = fl.device().last_model_view().unwrap();
        let expected = fl.camera().view_transform() * Mat4::from_rotation_y(10f32.to_radians());
        assert!(second.abs_diff_eq(expected, 1e-6));
    }

    #[test]
    fn angle_is_frame_count_driven() {
        let mut fl = new_loop();
        let mut events = EventQueue::new();
        for _ in 0..50 {
            fl.iterate(&mut events, &no_keys()).unwrap();
        }
        assert_eq!(fl.frames(), 50);
        assert_eq!(fl.angle().degrees(), 500.0);
        assert_eq!(fl.angle().normalized(), 140.0);
    }

    #[test]
    fn skipped_frames_still_advance_angle() {
        let mut fl = new_loop();
        fl.device_mut().skip_frames(2);
        let mut events = EventQueue::new();
        for _ in 0..3 {
            fl.iterate(&mut events, &no_keys()).unwrap();
        }
        assert_eq!(fl.angle().degrees(), 30.0);
        assert_eq!(fl.device().draw_count(), 1);
        assert_eq!(fl.device().present_count(), 1);
        assert_eq!(fl.device().stray_draws(), 0);
    }

    #[test]
    fn key_press_samples_held_keys() {
        let mut fl = new_loop();
        let start = fl.camera().eye;
        let mut events = queue(&[ViewerEvent::KeyPressed]);
        fl.iterate(&mut events, &held(&[Direction::Forward, Direction::Right]))
            .unwrap();
        assert_eq!(fl.camera().eye, start + Vec3::new(1.0, 0.0, 1.0));
    }

    #[test]
    fn each_key_press_resamples() {
        let mut fl = new_loop();
        let start = fl.camera().eye;
        let mut events = queue(&[ViewerEvent::KeyPressed, ViewerEvent::KeyPressed]);
        fl.iterate(&mut events, &held(&[Direction::Backward])).unwrap();
        assert_eq!(fl.camera().eye, start + Vec3::new(0.0, 0.0, -2.0));
    }

    #[test]
    fn key_press_with_nothing_held_is_noop() {
        let mut fl = new_loop();
        let start = fl.camera().eye;
        fl.iterate(&mut queue(&[ViewerEvent::KeyPressed]), &no_keys())
            .unwrap();
        assert_eq!(fl.camera().eye, start);
    }

    #[test]
    fn other_events_are_ignored() {
        let mut fl = new_loop();
        let before = *fl.camera();
        fl.iterate(&mut queue(&[ViewerEvent::Other]), &held(&[Direction::Left]))
            .unwrap();
        assert_eq!(*fl.camera(), before);
        assert_eq!(fl.viewport().projection, Projection::STARTUP);
    }

    #[test]
    fn resize_rebuilds_projection() {
        let mut fl = new_loop();
        fl.iterate(
            &mut queue(&[ViewerEvent::Resized {
                width: 1280,
                height: 720,
            }]),
            &no_keys(),
        )
        .unwrap();

        let expected = Lens::RESIZE.projection(1280, 720);
        assert_eq!(fl.viewport().projection, expected);
        assert_eq!(expected.fov_y_degrees, 45.0);
        assert_eq!(expected.near, 0.1);
        assert_eq!(expected.far, 10_000.0);
        assert_ne!(expected, Projection::STARTUP);
        assert_eq!(fl.device().last_projection(), Some(expected.matrix()));
        assert!(
            fl.device()
                .calls()
                .contains(&DeviceCall::ResizeTarget {
                    width: 1280,
                    height: 720
                })
        );
    }

    #[test]
    fn close_stops_drawing_and_releases_once() {
        let mut fl = new_loop();
        let mut events = EventQueue::new();
        fl.iterate(&mut events, &no_keys()).unwrap();
        assert_eq!(fl.device().draw_count(), 1);

        events.push(ViewerEvent::Close);
        events.push(ViewerEvent::Close);
        let state = fl.iterate(&mut events, &no_keys()).unwrap();
        assert_eq!(state, LoopState::Closed);
        assert_eq!(fl.device().delete_count(), 2);
        assert_eq!(fl.device().live_buffers(), 0);

        events.push(ViewerEvent::Close);
        assert_eq!(fl.iterate(&mut events, &no_keys()).unwrap(), LoopState::Closed);
        fl.render_frame().unwrap();
        fl.close();

        assert_eq!(fl.device().draw_count(), 1);
        assert_eq!(fl.device().delete_count(), 2);
        assert_eq!(fl.device().stray_draws(), 0);
    }

    #[test]
    fn events_after_close_are_discarded() {
        let mut fl = new_loop();
        let start = fl.camera().eye;
        let mut events = queue(&[ViewerEvent::Close, ViewerEvent::KeyPressed]);
        fl.iterate(&mut events, &held(&[Direction::Forward])).unwrap();
        assert!(events.is_empty());
        assert_eq!(fl.camera().eye, start);
        assert_eq!(fl.device().draw_count(), 0);
    }

    #[test]
    fn run_ends_on_close() {
        let mut fl = new_loop();
        let mut events = vec![
            ViewerEvent::KeyPressed,
            ViewerEvent::Close,
            ViewerEvent::KeyPressed,
        ]
        .into_iter()
        .fuse();
        let frames = fl.run(&mut events, &no_keys()).unwrap();
        assert_eq!(frames, 0);
        assert!(fl.is_closed());
    }

    #[test]
    fn resize_then_forward_scenario() {
        let mut fl = new_loop();
        let start = fl.camera().eye;
        let mut events = queue(&[
            ViewerEvent::Resized {
                width: 1024,
                height: 768,
            },
            ViewerEvent::KeyPressed,
        ]);
        fl.iterate(&mut events, &held(&[Direction::Forward])).unwrap();

        assert_eq!(fl.camera().eye.z, start.z + 1.0);
        assert_eq!(fl.camera().eye.x, start.x);
        assert_eq!(fl.device().last_viewport(), Some(ViewportRect::full(1024, 768)));
        assert_eq!(fl.device().draw_count(), 1);
        let p = fl.viewport().projection;
        assert!((p.aspect - 1024.0 / 768.0).abs() < 1e-6);
    }

    #[test]
    fn drop_releases_unclosed_geometry() {
        struct Shared(std::rc::Rc<std::cell::Cell<usize>>, RecordingDevice);
        impl Device for Shared {
            fn upload_vertices(
                &mut self,
                v: &[cubeview_geometry::Vertex],
            ) -> Result<crate::BufferId, RenderError> {
                self.1.upload_vertices(v)
            }
            fn upload_indices(
                &mut self,
                i: &[u32],
                t: Topology,
            ) -> Result<crate::BufferId, RenderError> {
                self.1.upload_indices(i, t)
            }
            fn delete_buffer(&mut self, buffer: crate::BufferId) {
                self.0.set(self.0.get() + 1);
                self.1.delete_buffer(buffer);
            }
            fn set_viewport(&mut self, v: ViewportRect) {
                self.1.set_viewport(v)
            }
            fn set_projection(&mut self, m: Mat4) {
                self.1.set_projection(m)
            }
            fn set_model_view(&mut self, m: Mat4) {
                self.1.set_model_view(m)
            }
            fn set_color(&mut self, c: [f32; 3]) {
                self.1.set_color(c)
            }
            fn begin_frame(&mut self, c: [f32; 4]) -> Result<FrameStatus, RenderError> {
                self.1.begin_frame(c)
            }
            fn draw_indexed(
                &mut self,
                v: crate::BufferId,
                i: crate::BufferId,
                n: u32,
                t: Topology,
            ) {
                self.1.draw_indexed(v, i, n, t)
            }
            fn present(&mut self) -> Result<(), RenderError> {
                self.1.present()
            }
        }

        let deletes = std::rc::Rc::new(std::cell::Cell::new(0));
        let device = Shared(deletes.clone(), RecordingDevice::new());
        let fl = FrameLoop::new(device, &unit_cube(), 8, 8, FrameConfig::default()).unwrap();
        drop(fl);
        assert_eq!(deletes.get(), 2);
    }
}
