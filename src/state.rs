// Shared command state between the ingress task and the control loop
//
// The seven velocity fields must always be observed as one consistent group,
// so every read or write goes through a single mutex-guarded critical
// section; no field is reachable from outside it. Concurrent senders are not
// arbitrated: the last writer wins (single-operator assumption).

use std::sync::Arc;

use parking_lot::Mutex;

use crate::config::{MAX_ANGULAR_VELOCITY, MAX_LINEAR_VELOCITY, UI_DEAD_ZONE};
use crate::messages::{Command, ServoLimit, VelocityCommand};

pub const NUM_LEDS: usize = 3;
pub const NUM_SERVOS: usize = 4;

/// One consistent view of the command state, taken under the lock.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CommandSnapshot {
    pub vx: f32,
    pub vy: f32,
    pub omega: f32,
    pub servo_vel: [f32; NUM_SERVOS],
    pub led: [bool; NUM_LEDS],
    pub servo_min: [f32; NUM_SERVOS],
    pub servo_max: [f32; NUM_SERVOS],
}

impl Default for CommandSnapshot {
    fn default() -> Self {
        Self {
            vx: 0.0,
            vy: 0.0,
            omega: 0.0,
            servo_vel: [0.0; NUM_SERVOS],
            led: [false; NUM_LEDS],
            servo_min: [0.0; NUM_SERVOS],
            servo_max: [180.0; NUM_SERVOS],
        }
    }
}

/// Cloneable handle to the process-wide command state.
#[derive(Clone, Default)]
pub struct SharedCommandState {
    inner: Arc<Mutex<CommandSnapshot>>,
}

/// Small inputs below the UI dead-band are noise from the joystick
/// widget, not intent.
fn dead_band(v: f32) -> f32 {
    if v.abs() < UI_DEAD_ZONE { 0.0 } else { v }
}

impl SharedCommandState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Dispatch one parsed command into the state.
    pub fn apply(&self, cmd: &Command) {
        match cmd {
            Command::Drive(v) => self.apply_velocity(v),
            Command::ToggleLed { toggle_led } => self.toggle_led(*toggle_led),
            Command::SetLimit { set_limit } => self.set_servo_limit(set_limit),
        }
    }

    /// Replace all seven velocity fields as one group.
    pub fn apply_velocity(&self, cmd: &VelocityCommand) {
        let mut s = self.inner.lock();
        s.vx = dead_band(cmd.vx).clamp(-MAX_LINEAR_VELOCITY, MAX_LINEAR_VELOCITY);
        s.vy = dead_band(cmd.vy).clamp(-MAX_LINEAR_VELOCITY, MAX_LINEAR_VELOCITY);
        s.omega = dead_band(cmd.omega).clamp(-MAX_ANGULAR_VELOCITY, MAX_ANGULAR_VELOCITY);
        let servo_vel = [cmd.s1_vel, cmd.s2_vel, cmd.s3_vel, cmd.s4_vel];
        for (slot, vel) in s.servo_vel.iter_mut().zip(servo_vel) {
            *slot = dead_band(vel).clamp(-1.0, 1.0);
        }
    }

    /// Flip one LED; out-of-range indices are ignored.
    pub fn toggle_led(&self, index: i32) {
        if let Ok(i) = usize::try_from(index)
            && i < NUM_LEDS
        {
            let mut s = self.inner.lock();
            s.led[i] = !s.led[i];
        }
    }

    /// Update one servo's travel limits; out-of-range indices are ignored
    /// and bounds are clamped to the mechanical range.
    pub fn set_servo_limit(&self, limit: &ServoLimit) {
        if let Ok(i) = usize::try_from(limit.servo)
            && i < NUM_SERVOS
        {
            let mut s = self.inner.lock();
            s.servo_min[i] = limit.min.clamp(0.0, 180.0);
            s.servo_max[i] = limit.max.clamp(0.0, 180.0);
        }
    }

    /// Safety stop: zero every velocity field in one critical section.
    /// LED states and servo limits are configuration, not motion, and
    /// survive a disconnect.
    pub fn safety_stop(&self) {
        let mut s = self.inner.lock();
        s.vx = 0.0;
        s.vy = 0.0;
        s.omega = 0.0;
        s.servo_vel = [0.0; NUM_SERVOS];
    }

    /// Copy the whole state out under the lock.
    pub fn snapshot(&self) -> CommandSnapshot {
        *self.inner.lock()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn drive(vx: f32, vy: f32, omega: f32) -> VelocityCommand {
        VelocityCommand {
            vx,
            vy,
            omega,
            s1_vel: 0.0,
            s2_vel: 0.0,
            s3_vel: 0.0,
            s4_vel: 0.0,
        }
    }

    #[test]
    fn test_apply_and_snapshot() {
        let state = SharedCommandState::new();
        let mut cmd = drive(0.5, -0.25, 2.0);
        cmd.s2_vel = 0.8;
        state.apply_velocity(&cmd);

        let snap = state.snapshot();
        assert_eq!(snap.vx, 0.5);
        assert_eq!(snap.vy, -0.25);
        assert_eq!(snap.omega, 2.0);
        assert_eq!(snap.servo_vel, [0.0, 0.8, 0.0, 0.0]);
    }

    #[test]
    fn test_dead_band_and_clamp() {
        let state = SharedCommandState::new();
        state.apply_velocity(&drive(0.04, -0.049, 25.0));

        let snap = state.snapshot();
        assert_eq!(snap.vx, 0.0); // below dead-band
        assert_eq!(snap.vy, 0.0);
        assert_eq!(snap.omega, MAX_ANGULAR_VELOCITY); // clamped
    }

    #[test]
    fn test_safety_stop_zeroes_all_seven() {
        let state = SharedCommandState::new();
        let mut cmd = drive(1.0, -1.0, 5.0);
        cmd.s1_vel = 1.0;
        cmd.s4_vel = -1.0;
        state.apply_velocity(&cmd);
        state.toggle_led(1);

        state.safety_stop();

        let snap = state.snapshot();
        assert_eq!(snap.vx, 0.0);
        assert_eq!(snap.vy, 0.0);
        assert_eq!(snap.omega, 0.0);
        assert_eq!(snap.servo_vel, [0.0; NUM_SERVOS]);
        // LEDs are not motion; they stay
        assert_eq!(snap.led, [false, true, false]);
    }

    #[test]
    fn test_led_toggle_bounds() {
        let state = SharedCommandState::new();
        state.toggle_led(0);
        state.toggle_led(0);
        state.toggle_led(2);
        state.toggle_led(3); // ignored
        state.toggle_led(-1); // ignored

        assert_eq!(state.snapshot().led, [false, false, true]);
    }

    #[test]
    fn test_servo_limit_clamped() {
        let state = SharedCommandState::new();
        state.set_servo_limit(&ServoLimit {
            servo: 2,
            min: -20.0,
            max: 400.0,
        });
        state.set_servo_limit(&ServoLimit {
            servo: 9,
            min: 10.0,
            max: 20.0,
        }); // ignored

        let snap = state.snapshot();
        assert_eq!(snap.servo_min[2], 0.0);
        assert_eq!(snap.servo_max[2], 180.0);
        assert_eq!(snap.servo_min[0], 0.0);
        assert_eq!(snap.servo_max[0], 180.0);
    }

    #[test]
    fn test_last_writer_wins() {
        let state = SharedCommandState::new();
        state.apply_velocity(&drive(0.3, 0.0, 0.0));
        state.apply_velocity(&drive(-0.6, 0.1, 1.0));

        let snap = state.snapshot();
        assert_eq!(snap.vx, -0.6);
        assert_eq!(snap.vy, 0.1);
        assert_eq!(snap.omega, 1.0);
    }
}
