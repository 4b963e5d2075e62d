//! A scripted pointer that drains or repels the fluid, in place of a mouse.

use glam::Vec2;

use fluid::population::{PointForce, PointForceKind};

use crate::config::main::PointerEvent;

/// The point forces that are active on a given frame.
///
/// Drains are always applied before repels, like holding the left and right mouse buttons at the
/// same time.
#[must_use]
pub fn active_forces(events: &[PointerEvent], frame: u64) -> Vec<PointForce> {
    let active = || events.iter().filter(move |event| event.is_active(frame));
    let drains = active().filter(|event| matches!(event.action, PointForceKind::Drain));
    let repels = active().filter(|event| matches!(event.action, PointForceKind::Repel));

    drains
        .chain(repels)
        .map(|event| PointForce {
            kind: event.action,
            position: Vec2::new(event.x, event.y),
        })
        .collect()
}

#[cfg(test)]
#[expect(clippy::indexing_slicing, reason = "Tests aren't so strict")]
mod test {
    use super::*;

    fn events() -> Vec<PointerEvent> {
        vec![
            PointerEvent::new(PointForceKind::Repel, 10.0, 20.0, (5, 10)),
            PointerEvent::new(PointForceKind::Drain, 30.0, 40.0, (8, 12)),
        ]
    }

    #[test]
    fn nothing_active_outside_frames() {
        assert!(active_forces(&events(), 4).is_empty());
        assert!(active_forces(&events(), 13).is_empty());
    }

    #[test]
    fn single_active_pointer() {
        let forces = active_forces(&events(), 6);
        assert_eq!(forces.len(), 1);
        assert_eq!(forces[0].kind, PointForceKind::Repel);
        assert_eq!(forces[0].position, Vec2::new(10.0, 20.0));
    }

    #[test]
    fn drain_comes_before_repel() {
        let forces = active_forces(&events(), 9);
        assert_eq!(forces.len(), 2);
        assert_eq!(forces[0].kind, PointForceKind::Drain);
        assert_eq!(forces[1].kind, PointForceKind::Repel);
    }
}
