// Loop cadence, topics, geometry and actuator constants

// Control loop frequency (10 ms period)
pub const LOOP_HZ: u64 = 100;

// Zenoh topics
pub const TOPIC_CMD: &str = "omnibase/cmd"; // inbound JSON commands
pub const TOPIC_TELEMETRY: &str = "omnibase/telemetry"; // outbound state broadcast

// Liveliness key declared by command clients; a dropped token here
// triggers the safety stop.
pub const LIVELINESS_CLIENTS: &str = "omnibase/client/*";

// Drive base geometry
pub const ROBOT_RADIUS_M: f32 = 0.075; // center to wheel contact
pub const WHEEL_RADIUS_M: f32 = 0.0325;
pub const WHEEL_ANGLES_DEG: [f32; 3] = [270.0, 60.0, 120.0]; // 0 deg = +X (right)

// Command envelope, used to normalize wheel speeds into motor power
pub const MAX_LINEAR_VELOCITY: f32 = 1.0; // m/s
pub const MAX_ANGULAR_VELOCITY: f32 = 10.0; // rad/s

// Command values smaller than this in magnitude are treated as zero at ingress
pub const UI_DEAD_ZONE: f32 = 0.05;

// PWM channel resolutions on the drive board
pub const MOTOR_PWM_BITS: u32 = 8; // 0..255
pub const SERVO_PWM_BITS: u32 = 12; // 0..4095

// Duty ceiling, kept under 1.0 to leave the driver some headroom
pub const MAX_DUTY: f32 = 0.99;

// Minimum normalized power at which the motors actually start turning,
// measured on the bench; the dead-zone remap targets these.
pub const MOTOR_MIN_POWER_FWD: f32 = 0.7;
pub const MOTOR_MIN_POWER_REV: f32 = 0.7;

// Servo jog rate applied to the s1..s4 velocity commands, deg/s at full scale
pub const SERVO_JOG_RATE_DEG_S: f32 = 90.0;

// Serial port for the drive board
pub const BUS_PORT: &str = "/dev/ttyUSB0";
pub const BUS_BAUDRATE: u32 = 115_200;

// Enable hardware output (set to false for simulation/testing)
pub const BUS_ENABLED: bool = true;
