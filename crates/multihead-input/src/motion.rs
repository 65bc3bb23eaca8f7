//! Motion normalization.
//!
//! Core devices move the one global cursor; extension devices report
//! device-local motion. Which path a sample takes is decided by the
//! device's role.

use multihead_types::{
    pack_valuators, CanonicalEvent, DeviceId, DeviceRole, MotionType, ValuatorMask,
    ValuatorMode, MAX_AXES,
};
use tracing::debug;

use crate::lock::Block;
use crate::registry::LogicalDevice;
use crate::translate::{Dispatch, EventTranslator};
use crate::{HostQueue, KeyboardState};

/// How the cursor behaves at the far edges of the global canvas.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Boundary {
    #[default]
    Free,
    /// Kept one pixel inside the far edge.
    Confined,
}

impl Boundary {
    fn delta(self) -> i32 {
        match self {
            Self::Free => 0,
            Self::Confined => -1,
        }
    }
}

/// Clamp a global coordinate onto a `width` x `height` canvas.
pub fn clamp_to_canvas(x: i32, y: i32, width: i32, height: i32, boundary: Boundary) -> (i32, i32) {
    let clamp = |v: i32, extent: i32| {
        if v < 0 {
            0
        } else if v >= extent {
            extent + boundary.delta() - 1
        } else {
            v
        }
    };
    (clamp(x, width), clamp(y, height))
}

impl LogicalDevice {
    /// Turn a two-axis sample into deltas for a relative device.
    ///
    /// Relative samples are negated and accumulated into the running
    /// position, which is pushed to the backend. Absolute samples are
    /// differenced against the previous one; the very first gives a zero
    /// delta.
    pub fn reconcile(&mut self, motion: MotionType, x: i32, y: i32) -> (i32, i32) {
        match motion {
            MotionType::Relative => {
                let (dx, dy) = (x.saturating_neg(), y.saturating_neg());
                self.last_x = self.last_x.saturating_add(dx);
                self.last_y = self.last_y.saturating_add(dy);
                self.has_baseline = true;
                if let Some(backend) = self.backend() {
                    backend.update_position(self.last_x, self.last_y);
                }
                (dx, dy)
            }
            MotionType::Absolute | MotionType::AbsoluteConfined => {
                let delta = if self.has_baseline {
                    (x.saturating_sub(self.last_x), y.saturating_sub(self.last_y))
                } else {
                    (0, 0)
                };
                self.last_x = x;
                self.last_y = y;
                self.has_baseline = true;
                delta
            }
        }
    }
}

impl<H: HostQueue, K: KeyboardState> EventTranslator<H, K> {
    /// Driver entry point for valuator motion.
    ///
    /// Core devices only understand two-axis samples, which move the global
    /// cursor; everything else goes down the extension path.
    pub fn motion(
        &mut self,
        device: DeviceId,
        values: &[i32],
        first_axis: u8,
        motion: MotionType,
        block: Block,
    ) -> Dispatch {
        let Some(role) = self.ctx.registry.device(device).map(|d| d.role) else {
            debug!(%device, "motion from unknown device, discarding");
            return Dispatch::Discarded;
        };

        match role {
            DeviceRole::Extension { .. } => {
                self.ext_motion(device, values, first_axis, motion, block);
                Dispatch::Queued
            }
            DeviceRole::Core => {
                let &[v0, v1] = values else {
                    debug!(%device, axes = values.len(), "core motion needs exactly two axes");
                    return Dispatch::Swallowed;
                };
                let (gx, gy) = self.ctx.cursor.read();
                match motion {
                    MotionType::Relative => {
                        let (x, y) = (gx.saturating_sub(v0), gy.saturating_sub(v1));
                        self.core_motion(Some(device), x, y, Boundary::Free, block);
                    }
                    MotionType::Absolute => {
                        self.core_motion(Some(device), v0, v1, Boundary::Free, block);
                    }
                    MotionType::AbsoluteConfined => {
                        self.core_motion(Some(device), v0, v1, Boundary::Confined, block);
                    }
                }
                Dispatch::Queued
            }
        }
    }

    /// Move the global cursor and tell everyone who needs to know.
    ///
    /// `source` may be omitted to update global state without queueing a
    /// motion event. The input lock, if requested, covers queue mutation
    /// only.
    pub fn core_motion(
        &mut self,
        source: Option<DeviceId>,
        x: i32,
        y: i32,
        boundary: Boundary,
        block: Block,
    ) {
        if self.ctx.cursor.is_unchanged(x, y) {
            return;
        }
        let (gx, gy) = self.ctx.cursor.read();
        debug!(x, y, ?boundary, gx, gy, "core motion");

        let (x, y) = clamp_to_canvas(
            x,
            y,
            self.ctx.layout.width(),
            self.ctx.layout.height(),
            boundary,
        );
        self.ctx.cursor.update(x, y);

        let located = self.ctx.layout.locate(x, y).copied();
        if let Some(screen) = located {
            let (local_x, local_y) = screen.to_local(x, y);
            let _guard = self.lock.acquire(block);
            let current = self.host.pointer_screen();
            if current != Some(screen.index) {
                debug!(old = ?current, new = screen.index, local_x, local_y, "pointer crossed screens");
                // Motion for the old screen must drain before the switch.
                self.host.flush();
                self.host.set_pointer_screen(screen.index, local_x, local_y);
            }
            if let Some(device) = source {
                self.host.queue(CanonicalEvent::Motion {
                    device,
                    screen: true,
                    valuators: ValuatorMask::new(0, vec![local_x, local_y]),
                });
            }
        }

        for device in self.ctx.registry.core_bindings() {
            if let Some(backend) = device.backend() {
                backend.update_position(x, y);
            }
        }

        if located.is_none() {
            self.host.process_input_events();
        }
    }

    /// Device-local motion for extension devices.
    ///
    /// Values are packed into chained records and queued as one absolute
    /// motion; axes past the cap are dropped.
    pub fn ext_motion(
        &mut self,
        device: DeviceId,
        values: &[i32],
        first_axis: u8,
        motion: MotionType,
        block: Block,
    ) {
        let mut values: Vec<i32> = values.iter().copied().take(MAX_AXES).collect();

        let Some(dev) = self.ctx.registry.device_mut(device) else {
            debug!(%device, "extension motion from unknown device, discarding");
            return;
        };
        let relative = matches!(
            dev.role,
            DeviceRole::Extension {
                mode: ValuatorMode::Relative
            }
        );
        if relative && values.len() == 2 {
            let (dx, dy) = dev.reconcile(motion, values[0], values[1]);
            values = vec![dx, dy];
        }

        let records = pack_valuators(device, first_axis, &values);
        if records.is_empty() {
            debug!(%device, "extension motion without axes");
            return;
        }
        self.emit(CanonicalEvent::DeviceMotion { device, records }, block);
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use multihead_types::{MotionRecord, ScreenDescriptor, ScreenLayout};

    use super::*;
    use crate::keymap::StaticKeymaps;
    use crate::mock::{HostCall, MockBackend, MockHost, MockHostHandle};
    use crate::registry::{DeviceRegistry, InputGroup};
    use crate::translate::InputContext;

    const POINTER: DeviceId = DeviceId(1);
    const OTHER_CORE: DeviceId = DeviceId(2);
    const MOUSE: DeviceId = DeviceId(3);
    const STYLUS: DeviceId = DeviceId(4);

    struct Fixture {
        translator: EventTranslator<MockHost, StaticKeymaps>,
        host: MockHostHandle,
        pointer_backend: MockBackend,
        other_backend: MockBackend,
        mouse_backend: MockBackend,
    }

    /// Two 100x100 screens side by side; a 200x100 canvas.
    fn fixture() -> Fixture {
        let pointer_backend = MockBackend::new(true);
        let other_backend = MockBackend::new(true);
        let mouse_backend = MockBackend::new(true);

        let mut registry = DeviceRegistry::new();
        registry
            .add_group(InputGroup::new("console").with_device(
                LogicalDevice::new(POINTER, "console", DeviceRole::Core)
                    .with_backend(Arc::new(pointer_backend.clone())),
            ))
            .unwrap();
        registry
            .add_group(
                InputGroup::new("backend")
                    .with_device(
                        LogicalDevice::new(OTHER_CORE, "backend pointer", DeviceRole::Core)
                            .with_backend(Arc::new(other_backend.clone())),
                    )
                    .with_device(
                        LogicalDevice::new(
                            MOUSE,
                            "relative mouse",
                            DeviceRole::Extension {
                                mode: ValuatorMode::Relative,
                            },
                        )
                        .with_backend(Arc::new(mouse_backend.clone())),
                    )
                    .with_device(LogicalDevice::new(
                        STYLUS,
                        "stylus",
                        DeviceRole::Extension {
                            mode: ValuatorMode::Absolute,
                        },
                    )),
            )
            .unwrap();
        registry.set_core_pointer(POINTER).unwrap();

        let layout = ScreenLayout::new(vec![
            ScreenDescriptor::new(0, 0, 0, 100, 100),
            ScreenDescriptor::new(1, 100, 0, 100, 100),
        ]);
        let (host, handle) = MockHost::new();
        handle.set_pointer_screen(Some(0));
        Fixture {
            translator: EventTranslator::new(
                InputContext::new(layout, registry),
                host,
                StaticKeymaps::new(),
            ),
            host: handle,
            pointer_backend,
            other_backend,
            mouse_backend,
        }
    }

    fn motion_at(x: i32, y: i32) -> CanonicalEvent {
        CanonicalEvent::Motion {
            device: POINTER,
            screen: true,
            valuators: ValuatorMask::new(0, vec![x, y]),
        }
    }

    #[test]
    fn clamp_free_and_confined() {
        assert_eq!(clamp_to_canvas(205, 50, 200, 100, Boundary::Free), (199, 50));
        assert_eq!(clamp_to_canvas(205, 50, 200, 100, Boundary::Confined), (198, 50));
        assert_eq!(clamp_to_canvas(-3, -9, 200, 100, Boundary::Free), (0, 0));
        assert_eq!(clamp_to_canvas(10, 100, 200, 100, Boundary::Confined), (10, 98));
    }

    #[test]
    fn repeated_position_is_idempotent() {
        let mut f = fixture();
        f.translator.core_motion(Some(POINTER), 10, 10, Boundary::Free, Block::No);
        f.translator.core_motion(Some(POINTER), 10, 10, Boundary::Free, Block::No);
        assert_eq!(f.host.events(), vec![motion_at(10, 10)]);
    }

    #[test]
    fn invalidate_forces_update() {
        let mut f = fixture();
        f.translator.core_motion(Some(POINTER), 10, 10, Boundary::Free, Block::No);
        f.translator.invalidate_position();
        f.translator.core_motion(Some(POINTER), 10, 10, Boundary::Free, Block::No);
        assert_eq!(f.host.events(), vec![motion_at(10, 10), motion_at(10, 10)]);
    }

    #[test]
    fn clamping_updates_global_position() {
        let mut f = fixture();
        f.translator.core_motion(Some(POINTER), 205, 50, Boundary::Free, Block::No);
        assert_eq!(f.translator.global_position(), (199, 50));
        f.translator.core_motion(Some(POINTER), 205, 50, Boundary::Confined, Block::No);
        assert_eq!(f.translator.global_position(), (198, 50));
        f.translator.core_motion(Some(POINTER), -7, -1, Boundary::Free, Block::No);
        assert_eq!(f.translator.global_position(), (0, 0));
    }

    #[test]
    fn crossing_screens_flushes_then_rebinds() {
        let mut f = fixture();
        f.translator.core_motion(Some(POINTER), 50, 50, Boundary::Free, Block::No);
        f.translator.core_motion(Some(POINTER), 150, 20, Boundary::Free, Block::No);

        assert_eq!(
            f.host.calls(),
            vec![
                HostCall::Queue(motion_at(50, 50)),
                HostCall::Flush,
                HostCall::SetPointerScreen {
                    screen: 1,
                    x: 50,
                    y: 20
                },
                HostCall::Queue(motion_at(50, 20)),
            ]
        );
    }

    #[test]
    fn no_source_updates_state_only() {
        let mut f = fixture();
        f.translator.core_motion(None, 40, 40, Boundary::Free, Block::No);
        assert!(f.host.events().is_empty());
        assert_eq!(f.translator.global_position(), (40, 40));
        assert_eq!(f.pointer_backend.positions(), vec![(40, 40)]);
    }

    #[test]
    fn every_core_backend_hears_about_motion() {
        let mut f = fixture();
        f.translator.core_motion(Some(POINTER), 30, 60, Boundary::Free, Block::No);
        assert_eq!(f.pointer_backend.positions(), vec![(30, 60)]);
        assert_eq!(f.other_backend.positions(), vec![(30, 60)]);
        assert!(f.mouse_backend.positions().is_empty());

        let backend_group = f.translator.context().registry.locate(OTHER_CORE).unwrap();
        f.translator
            .context_mut()
            .registry
            .group_mut(backend_group)
            .unwrap()
            .detached = true;
        f.translator.core_motion(Some(POINTER), 31, 60, Boundary::Free, Block::No);
        assert_eq!(f.other_backend.positions(), vec![(30, 60)]);
    }

    #[test]
    fn off_canvas_runs_pending_input() {
        let mut f = fixture();
        // A gap between two screens on a wider canvas.
        f.translator.context_mut().layout = ScreenLayout::with_canvas(
            vec![
                ScreenDescriptor::new(0, 0, 0, 100, 100),
                ScreenDescriptor::new(1, 150, 0, 100, 100),
            ],
            250,
            100,
        );
        f.translator.core_motion(Some(POINTER), 120, 10, Boundary::Free, Block::No);
        assert_eq!(f.host.calls(), vec![HostCall::ProcessInputEvents]);
        assert_eq!(f.pointer_backend.positions(), vec![(120, 10)]);
    }

    #[test]
    fn core_relative_motion_subtracts() {
        let mut f = fixture();
        f.translator.core_motion(None, 50, 50, Boundary::Free, Block::No);
        f.translator.motion(POINTER, &[5, -5], 0, MotionType::Relative, Block::No);
        assert_eq!(f.translator.global_position(), (45, 55));
    }

    #[test]
    fn extreme_core_relative_samples_saturate_onto_canvas() {
        let mut f = fixture();
        f.translator.core_motion(None, 50, 50, Boundary::Free, Block::No);
        f.translator.motion(POINTER, &[i32::MIN, 0], 0, MotionType::Relative, Block::No);
        assert_eq!(f.translator.global_position(), (199, 50));
        f.translator.motion(POINTER, &[i32::MAX, i32::MIN], 0, MotionType::Relative, Block::No);
        assert_eq!(f.translator.global_position(), (0, 99));
    }

    #[test]
    fn core_motion_ignores_other_axis_counts() {
        let mut f = fixture();
        let dispatch = f.translator.motion(POINTER, &[1, 2, 3], 0, MotionType::Absolute, Block::No);
        assert_eq!(dispatch, Dispatch::Swallowed);
        assert!(f.host.calls().is_empty());
    }

    #[test]
    fn core_confined_motion_stays_inside() {
        let mut f = fixture();
        f.translator.motion(POINTER, &[500, 500], 0, MotionType::AbsoluteConfined, Block::No);
        assert_eq!(f.translator.global_position(), (198, 98));
    }

    #[test]
    fn absolute_samples_on_relative_device_become_deltas() {
        let mut f = fixture();
        f.translator.motion(MOUSE, &[10, 10], 0, MotionType::Absolute, Block::No);
        f.translator.motion(MOUSE, &[13, 7], 0, MotionType::Absolute, Block::No);

        let deltas: Vec<Vec<i32>> = f
            .host
            .events()
            .into_iter()
            .map(|e| match e {
                CanonicalEvent::DeviceMotion { records, .. } => records[0].values.clone(),
                other => panic!("unexpected event {other:?}"),
            })
            .collect();
        assert_eq!(deltas, vec![vec![0, 0], vec![3, -3]]);

        let mouse = f.translator.context().registry.device(MOUSE).unwrap();
        assert_eq!(mouse.last_position(), (13, 7));
    }

    #[test]
    fn relative_samples_accumulate_negated() {
        let mut f = fixture();
        f.translator.motion(MOUSE, &[2, -3], 0, MotionType::Relative, Block::No);
        f.translator.motion(MOUSE, &[1, 1], 0, MotionType::Relative, Block::No);
        assert_eq!(f.mouse_backend.positions(), vec![(-2, 3), (-3, 2)]);
        let mouse = f.translator.context().registry.device(MOUSE).unwrap();
        assert_eq!(mouse.last_position(), (-3, 2));
    }

    #[test]
    fn extreme_relative_samples_saturate() {
        let mut f = fixture();
        f.translator.motion(MOUSE, &[i32::MIN, i32::MAX], 0, MotionType::Relative, Block::No);
        f.translator.motion(MOUSE, &[i32::MIN, i32::MAX], 0, MotionType::Relative, Block::No);
        assert_eq!(
            f.mouse_backend.positions(),
            vec![(i32::MAX, -i32::MAX), (i32::MAX, i32::MIN)]
        );
        let values: Vec<Vec<i32>> = f
            .host
            .events()
            .into_iter()
            .map(|e| match e {
                CanonicalEvent::DeviceMotion { records, .. } => records[0].values.clone(),
                other => panic!("unexpected event {other:?}"),
            })
            .collect();
        assert_eq!(values, vec![vec![i32::MAX, -i32::MAX]; 2]);
    }

    #[test]
    fn extreme_absolute_deltas_saturate() {
        let mut f = fixture();
        f.translator.motion(MOUSE, &[i32::MAX, i32::MIN], 0, MotionType::Absolute, Block::No);
        f.translator.motion(MOUSE, &[i32::MIN, i32::MAX], 0, MotionType::Absolute, Block::No);
        let Some(CanonicalEvent::DeviceMotion { records, .. }) = f.host.events().pop() else {
            panic!("expected device motion");
        };
        assert_eq!(records[0].values, vec![i32::MIN, i32::MAX]);
    }

    #[test]
    fn absolute_device_values_pass_unchanged() {
        let mut f = fixture();
        f.translator.motion(STYLUS, &[10, 10], 0, MotionType::Absolute, Block::No);
        assert_eq!(
            f.host.events(),
            vec![CanonicalEvent::DeviceMotion {
                device: STYLUS,
                records: vec![MotionRecord {
                    device_id: STYLUS,
                    first_axis: 0,
                    values: vec![10, 10],
                    more: false,
                }],
            }]
        );
    }

    #[test]
    fn many_axes_are_chained() {
        let mut f = fixture();
        let values: Vec<i32> = (100..114).collect();
        f.translator.ext_motion(STYLUS, &values, 0, MotionType::Absolute, Block::Yes);

        let events = f.host.events();
        let CanonicalEvent::DeviceMotion { records, .. } = &events[0] else {
            panic!("expected device motion");
        };
        let counts: Vec<usize> = records.iter().map(MotionRecord::count).collect();
        let firsts: Vec<u8> = records.iter().map(|r| r.first_axis).collect();
        assert_eq!(counts, vec![6, 6, 2]);
        assert_eq!(firsts, vec![0, 6, 12]);
    }

    #[test]
    fn relative_device_with_more_axes_is_not_reconciled() {
        let mut f = fixture();
        f.translator.motion(MOUSE, &[4, 4, 4], 0, MotionType::Relative, Block::No);
        assert!(f.mouse_backend.positions().is_empty());
        assert_eq!(
            f.translator.context().registry.device(MOUSE).unwrap().last_position(),
            (0, 0)
        );
    }

    #[test]
    fn lock_covers_enqueue_only() {
        let mut f = fixture();
        f.host.watch_lock(f.translator.lock().clone());
        f.translator.core_motion(Some(POINTER), 150, 50, Boundary::Free, Block::Yes);
        assert_eq!(f.host.queued_under_lock(), vec![true]);
        assert!(!f.translator.lock().is_held());
    }
}
