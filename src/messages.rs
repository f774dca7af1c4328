// JSON message types exchanged with command clients

use serde::{Deserialize, Serialize};

/// Inbound command, dispatched by which key the JSON object carries.
///
/// Variant order matters for `untagged`: a velocity message is identified by
/// the presence of `vx`, so it is tried first and wins even if a client packs
/// extra keys into the same object.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum Command {
    Drive(VelocityCommand),
    ToggleLed { toggle_led: i32 },
    SetLimit { set_limit: ServoLimit },
}

/// Body-frame velocity target plus the four servo jog velocities.
/// `vx` is required (it selects the message type); everything else
/// defaults to 0.0 when absent.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct VelocityCommand {
    pub vx: f32,
    #[serde(default)]
    pub vy: f32,
    #[serde(default)]
    pub omega: f32,
    #[serde(default)]
    pub s1_vel: f32,
    #[serde(default)]
    pub s2_vel: f32,
    #[serde(default)]
    pub s3_vel: f32,
    #[serde(default)]
    pub s4_vel: f32,
}

/// Per-servo travel limit update. Missing bounds fall back to the full
/// mechanical range.
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct ServoLimit {
    pub servo: i32,
    #[serde(default)]
    pub min: f32,
    #[serde(default = "full_travel")]
    pub max: f32,
}

fn full_travel() -> f32 {
    180.0
}

/// State broadcast to every connected client each control tick.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Telemetry {
    pub wheel_speeds: Vec<f32>,
    pub duty: [f32; 4],
    pub led: [bool; 3],
    pub servo_angle: [f32; 4],
}
