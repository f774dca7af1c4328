// Actuation module for the omniwheel base
//
// Provides:
// - Omniwheel inverse kinematics (body velocity -> wheel angular speeds)
// - Dead-zone compensation and PWM pulse quantization
// - Drive-board serial protocol and the high-level driver API

pub mod actuation;
pub mod bus;
mod driver;
pub mod kinematics;

pub use actuation::{MotorSignal, ServoSignal};
pub use bus::{BusError, DriveBus, NullBus, SerialBus};
pub use driver::{DriveController, NUM_LEDS, NUM_MOTORS, NUM_SERVOS};
pub use kinematics::OmniKinematics;
