// Normalized power / servo angle -> hardware drive signals
//
// Pure mapping layer: dead-zone compensation, duty scaling and pulse
// quantization. No I/O happens here.

use crate::config::{MAX_DUTY, MOTOR_MIN_POWER_FWD, MOTOR_MIN_POWER_REV};

/// Servo pulse-position protocol: 50 Hz period, 0.5 ms at 0 degrees,
/// 2.4 ms at 180 degrees.
const SERVO_PERIOD_US: f32 = 20_000.0;
const SERVO_MIN_PULSE_US: f32 = 500.0;
const SERVO_MAX_PULSE_US: f32 = 2_400.0;

/// Drive signal for one motor channel.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MotorSignal {
    /// Direction flag, derived from the sign of the *compensated* power.
    pub forward: bool,
    /// Duty fraction actually applied, retained for telemetry.
    pub duty: f32,
    /// Quantized pulse count in [0, 2^bits - 1].
    pub pulse: u16,
}

/// Drive signal for one servo channel.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ServoSignal {
    pub pulse: u16,
}

fn map_range(x: f32, in_min: f32, in_max: f32, out_min: f32, out_max: f32) -> f32 {
    (x - in_min) * (out_max - out_min) / (in_max - in_min) + out_min
}

/// Remap a normalized power onto the motor's effective range.
///
/// Inputs below the stiction threshold would not turn the motor at all, so
/// positive powers map [0, 1] onto [MIN_FWD, 1] and negative powers map
/// [0, -1] onto [-MIN_REV, -1]. Exactly zero stays zero. The jump at zero
/// is intentional: any nonzero request must actually move the wheel.
pub fn compensate_dead_zone(power: f32) -> f32 {
    if power > 0.0 {
        map_range(power, 0.0, 1.0, MOTOR_MIN_POWER_FWD, 1.0)
    } else if power < 0.0 {
        map_range(power, 0.0, -1.0, -MOTOR_MIN_POWER_REV, -1.0)
    } else {
        0.0
    }
}

/// Quantize a duty fraction to a pulse count at the given resolution.
pub fn duty_to_pulse(duty: f32, resolution_bits: u32) -> u16 {
    let max = ((1u32 << resolution_bits) - 1) as f32;
    (duty.clamp(0.0, 1.0) * max).round() as u16
}

/// Full motor mapping: clamp, compensate, scale, quantize.
pub fn motor_signal(power: f32, resolution_bits: u32) -> MotorSignal {
    let power = power.clamp(-1.0, 1.0);
    let output = compensate_dead_zone(power);

    let forward = output >= 0.0;
    let duty = output.abs() * MAX_DUTY;

    MotorSignal {
        forward,
        duty,
        pulse: duty_to_pulse(duty, resolution_bits),
    }
}

/// Full servo mapping: clamp the angle to [0, 180], interpolate the pulse
/// width over the 20 ms period, quantize. Travel limits narrower than the
/// mechanical range are enforced upstream, never here.
pub fn servo_signal(angle_deg: f32, resolution_bits: u32) -> ServoSignal {
    let angle = angle_deg.clamp(0.0, 180.0);

    let min_duty = SERVO_MIN_PULSE_US / SERVO_PERIOD_US;
    let max_duty = SERVO_MAX_PULSE_US / SERVO_PERIOD_US;
    let duty = (max_duty - min_duty) / 180.0 * angle + min_duty;

    ServoSignal {
        pulse: duty_to_pulse(duty, resolution_bits),
    }
}
