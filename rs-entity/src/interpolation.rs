//! Per-proxy motion smoothing. Updates arrive at network rate; each attribute keeps a
//! single tween that is retargeted from its current value, so a late update never
//! snaps the proxy back to a stale start.

use std::f32::consts::{PI, TAU};
use std::time::Duration;

use bevy::prelude::*;

use crate::registry::EntityRegistry;

pub trait Lerp: Copy {
    fn lerp_to(self, target: Self, t: f32) -> Self;
}

impl Lerp for f32 {
    fn lerp_to(self, target: Self, t: f32) -> Self {
        self + (target - self) * t
    }
}

impl Lerp for Vec3 {
    fn lerp_to(self, target: Self, t: f32) -> Self {
        self.lerp(target, t)
    }
}

/// Linear transition of one value over a fixed duration.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Tween<T> {
    start: T,
    target: T,
    elapsed: Duration,
    duration: Duration,
}

impl<T: Lerp> Tween<T> {
    pub fn settled(value: T) -> Self {
        Self {
            start: value,
            target: value,
            elapsed: Duration::ZERO,
            duration: Duration::ZERO,
        }
    }

    pub fn value(&self) -> T {
        if self.elapsed >= self.duration {
            return self.target;
        }
        let t = self.elapsed.as_secs_f32() / self.duration.as_secs_f32();
        self.start.lerp_to(self.target, t)
    }

    pub fn target(&self) -> T {
        self.target
    }

    pub fn is_active(&self) -> bool {
        self.elapsed < self.duration
    }

    /// Supersedes the current target; the new transition starts wherever the old one is now.
    pub fn retarget(&mut self, target: T, duration: Duration) {
        self.start = self.value();
        self.target = target;
        self.elapsed = Duration::ZERO;
        self.duration = duration;
    }

    pub fn advance(&mut self, dt: Duration) -> T {
        self.elapsed = (self.elapsed + dt).min(self.duration);
        self.value()
    }
}

/// Signed shortest rotation from `from` to `to`, in `(-PI, PI]`.
pub fn shortest_angle_delta(from: f32, to: f32) -> f32 {
    let delta = (to - from).rem_euclid(TAU);
    if delta > PI { delta - TAU } else { delta }
}

#[derive(Debug, Clone, Copy)]
pub struct ProxyMotion {
    pub position: Tween<Vec3>,
    /// Unwrapped yaw in radians; may drift outside one turn.
    pub yaw: Tween<f32>,
    dirty: bool,
}

impl ProxyMotion {
    pub fn new(position: Vec3, yaw: f32) -> Self {
        Self {
            position: Tween::settled(position),
            yaw: Tween::settled(yaw),
            dirty: false,
        }
    }

    pub fn retarget_position(&mut self, target: Vec3, duration: Duration) {
        self.position.retarget(target, duration);
        self.dirty = true;
    }

    pub fn retarget_yaw(&mut self, yaw: f32, duration: Duration) {
        let current = self.yaw.value();
        self.yaw
            .retarget(current + shortest_angle_delta(current, yaw), duration);
        self.dirty = true;
    }

    /// Returns false when nothing moved and the transform can be left alone.
    pub fn advance(&mut self, dt: Duration) -> bool {
        let moving = self.dirty || self.position.is_active() || self.yaw.is_active();
        self.position.advance(dt);
        self.yaw.advance(dt);
        self.dirty = false;
        moving
    }

    pub fn transform(&self) -> Transform {
        Transform::from_translation(self.position.value())
            .with_rotation(Quat::from_rotation_y(self.yaw.value()))
    }
}

pub fn advance_interpolation(
    time: Res<Time>,
    mut registry: ResMut<EntityRegistry>,
    mut transforms: Query<&mut Transform>,
) {
    let dt = time.delta();
    for (root, motion) in registry.motions_mut() {
        if !motion.advance(dt) {
            continue;
        }
        if let Ok(mut transform) = transforms.get_mut(root) {
            transform.translation = motion.position.value();
            transform.rotation = Quat::from_rotation_y(motion.yaw.value());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const STEP: Duration = Duration::from_millis(10);
    const DURATION: Duration = Duration::from_millis(50);

    #[test]
    fn yaw_takes_the_short_way_round() {
        let delta = shortest_angle_delta(0.1, TAU - 0.1);
        assert!((delta + 0.2).abs() < 1e-5, "got {delta}");
        assert!((shortest_angle_delta(TAU - 0.1, 0.1) - 0.2).abs() < 1e-5);
        assert!((shortest_angle_delta(0.0, PI) - PI).abs() < 1e-6);
        assert!((shortest_angle_delta(0.0, -PI) - PI).abs() < 1e-6);
        assert_eq!(shortest_angle_delta(1.0, 1.0), 0.0);
    }

    #[test]
    fn retarget_mid_flight_is_continuous() {
        let mut tween = Tween::settled(0.0f32);
        tween.retarget(5.0, DURATION);
        tween.advance(Duration::from_millis(20));
        let before = tween.value();
        assert!((before - 2.0).abs() < 1e-4);

        tween.retarget(8.0, DURATION);
        assert_eq!(tween.value(), before);

        let mut last = before;
        for _ in 0..10 {
            let value = tween.advance(STEP);
            assert!(value >= last);
            assert!(value - last <= (8.0 - before) * 0.2 + 1e-4);
            last = value;
        }
        assert_eq!(last, 8.0);
        assert!(!tween.is_active());
    }

    #[test]
    fn motion_rotates_through_the_seam() {
        let mut motion = ProxyMotion::new(Vec3::ZERO, 0.1);
        motion.retarget_yaw(TAU - 0.1, DURATION);
        assert!((motion.yaw.target() + 0.1).abs() < 1e-5);

        assert!(motion.advance(Duration::from_millis(25)));
        assert!((motion.yaw.value()).abs() < 1e-5);
        assert!(motion.advance(Duration::from_millis(25)));
        assert!(!motion.advance(STEP));
    }

    #[test]
    fn zero_duration_snaps_but_still_reports_movement() {
        let mut motion = ProxyMotion::new(Vec3::ZERO, 0.0);
        motion.retarget_position(Vec3::X, Duration::ZERO);
        assert_eq!(motion.position.value(), Vec3::X);
        assert!(motion.advance(Duration::ZERO));
        assert!(!motion.advance(Duration::ZERO));
    }
}
