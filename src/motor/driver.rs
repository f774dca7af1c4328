// High-level actuator driver
//
// Maps normalized motor powers and servo angles to drive signals and ships
// them to the drive board. Bounds every channel index; an out-of-range
// index is a no-op, never a fault.

use tracing::warn;

use super::actuation::{motor_signal, servo_signal};
use super::bus::{DriveBus, Result};
use crate::config::{MOTOR_PWM_BITS, SERVO_PWM_BITS};

pub const NUM_MOTORS: usize = 4;
pub const NUM_SERVOS: usize = 4;
pub const NUM_LEDS: usize = 3;

pub struct DriveController {
    bus: Box<dyn DriveBus + Send>,
    duty: [f32; NUM_MOTORS],
}

impl DriveController {
    pub fn new(bus: Box<dyn DriveBus + Send>) -> Self {
        Self {
            bus,
            duty: [0.0; NUM_MOTORS],
        }
    }

    /// Drive one motor at a normalized power in [-1, 1]. Values outside the
    /// range are clamped; an out-of-range index does nothing.
    pub fn drive_motor(&mut self, index: usize, power: f32) -> Result<()> {
        if index >= NUM_MOTORS {
            return Ok(());
        }

        let signal = motor_signal(power, MOTOR_PWM_BITS);
        self.duty[index] = signal.duty;
        self.bus
            .write_motor(index as u8, signal.forward, signal.pulse)
    }

    /// Position one servo, angle clamped to [0, 180] degrees.
    pub fn set_servo_angle(&mut self, index: usize, angle_deg: f32) -> Result<()> {
        if index >= NUM_SERVOS {
            return Ok(());
        }

        let signal = servo_signal(angle_deg, SERVO_PWM_BITS);
        self.bus.write_servo(index as u8, signal.pulse)
    }

    pub fn set_led(&mut self, index: usize, on: bool) -> Result<()> {
        if index >= NUM_LEDS {
            return Ok(());
        }

        self.bus.write_led(index as u8, on)
    }

    /// Most recently applied duty fraction, 0.0 for an out-of-range index.
    pub fn duty(&self, index: usize) -> f32 {
        self.duty.get(index).copied().unwrap_or(0.0)
    }

    pub fn duties(&self) -> [f32; NUM_MOTORS] {
        self.duty
    }

    /// Zero every motor channel.
    pub fn stop_all(&mut self) -> Result<()> {
        for i in 0..NUM_MOTORS {
            self.drive_motor(i, 0.0)?;
        }
        Ok(())
    }
}

impl Drop for DriveController {
    fn drop(&mut self) {
        // Leave the motors stopped when the driver goes away
        if let Err(e) = self.stop_all() {
            warn!("Failed to stop motors on drop: {}", e);
        }
    }
}
