// Serial protocol for the PWM drive board
//
// The board owns the raw pins and PWM timers; this side only ships framed
// channel writes to it. Packet format:
// [0xFF, 0xFF, Opcode, Length, Params..., Checksum]
// Length counts params + checksum. Checksum is the ones' complement of the
// byte sum over opcode, length and params. Writes are fire-and-forget; the
// board sends no responses.

use std::io::Write;
use std::time::Duration;

use serialport::{self, SerialPort};
use tracing::debug;

pub const DEFAULT_TIMEOUT_MS: u64 = 100;

/// Packet header bytes
const HEADER: [u8; 2] = [0xFF, 0xFF];

/// Channel opcodes understood by the drive board
#[repr(u8)]
#[derive(Debug, Clone, Copy)]
pub enum Opcode {
    Motor = 0x01,
    Servo = 0x02,
    Led = 0x03,
}

/// Error types for drive-board communication
#[derive(Debug, thiserror::Error)]
pub enum BusError {
    #[error("Serial port error: {0}")]
    Serial(#[from] serialport::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, BusError>;

/// Hardware output boundary: one write per actuator channel.
///
/// Motor channels take a direction flag and a pulse count, servo channels a
/// pulse count, LED channels an on/off state. Implementations do not check
/// indices; the driver layer bounds them.
pub trait DriveBus {
    fn write_motor(&mut self, index: u8, forward: bool, pulse: u16) -> Result<()>;
    fn write_servo(&mut self, index: u8, pulse: u16) -> Result<()>;
    fn write_led(&mut self, index: u8, on: bool) -> Result<()>;
}

/// Drive board attached over a serial port.
pub struct SerialBus {
    port: Box<dyn SerialPort>,
}

impl SerialBus {
    pub fn open(port_name: &str, baudrate: u32) -> Result<Self> {
        let port = serialport::new(port_name, baudrate)
            .timeout(Duration::from_millis(DEFAULT_TIMEOUT_MS))
            .open()?;

        Ok(Self { port })
    }

    /// Calculate checksum for a packet (excluding header)
    fn checksum(data: &[u8]) -> u8 {
        let sum: u16 = data.iter().map(|&b| b as u16).sum();
        (!sum & 0xFF) as u8
    }

    /// Build a packet with header and checksum
    fn build_packet(opcode: Opcode, params: &[u8]) -> Vec<u8> {
        let length = (params.len() + 1) as u8; // params + checksum
        let mut packet = Vec::with_capacity(5 + params.len());

        packet.extend_from_slice(&HEADER);
        packet.push(opcode as u8);
        packet.push(length);
        packet.extend_from_slice(params);

        // Checksum over opcode, length, params
        let checksum_data = &packet[2..]; // skip header
        packet.push(Self::checksum(checksum_data));

        packet
    }

    fn send_packet(&mut self, packet: &[u8]) -> Result<()> {
        self.port.write_all(packet)?;
        self.port.flush()?;
        Ok(())
    }
}

impl DriveBus for SerialBus {
    fn write_motor(&mut self, index: u8, forward: bool, pulse: u16) -> Result<()> {
        let params = [index, forward as u8, (pulse & 0xFF) as u8, (pulse >> 8) as u8];
        debug!(
            "Motor {} write: forward={}, pulse={}",
            index, forward, pulse
        );
        self.send_packet(&Self::build_packet(Opcode::Motor, &params))
    }

    fn write_servo(&mut self, index: u8, pulse: u16) -> Result<()> {
        let params = [index, (pulse & 0xFF) as u8, (pulse >> 8) as u8];
        debug!("Servo {} write: pulse={}", index, pulse);
        self.send_packet(&Self::build_packet(Opcode::Servo, &params))
    }

    fn write_led(&mut self, index: u8, on: bool) -> Result<()> {
        debug!("LED {} write: on={}", index, on);
        self.send_packet(&Self::build_packet(Opcode::Led, &[index, on as u8]))
    }
}

/// Bus that discards every write. Used when hardware output is disabled
/// (simulation, development off the robot).
pub struct NullBus;

impl DriveBus for NullBus {
    fn write_motor(&mut self, index: u8, forward: bool, pulse: u16) -> Result<()> {
        debug!(
            "NullBus motor {}: forward={}, pulse={}",
            index, forward, pulse
        );
        Ok(())
    }

    fn write_servo(&mut self, index: u8, pulse: u16) -> Result<()> {
        debug!("NullBus servo {}: pulse={}", index, pulse);
        Ok(())
    }

    fn write_led(&mut self, index: u8, on: bool) -> Result<()> {
        debug!("NullBus LED {}: on={}", index, on);
        Ok(())
    }
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_checksum() {
        // Opcode=Motor, Length=5, index=2, forward=1, pulse=0x0100
        let data = [0x01u8, 5, 2, 1, 0, 1];
        let checksum = SerialBus::checksum(&data);
        // ~(1+5+2+1+0+1) = ~10 = 245
        assert_eq!(checksum, 245);
    }

    #[test]
    fn test_build_packet() {
        let packet = SerialBus::build_packet(Opcode::Led, &[2, 1]);
        // Header (2) + Opcode (1) + Length (1) + Params (2) + Checksum (1)
        assert_eq!(packet.len(), 7);
        assert_eq!(packet[0], 0xFF);
        assert_eq!(packet[1], 0xFF);
        assert_eq!(packet[2], 0x03); // LED opcode
        assert_eq!(packet[3], 3); // params + checksum
        assert_eq!(packet[4], 2); // LED index
        assert_eq!(packet[5], 1); // on
        assert_eq!(packet[6], SerialBus::checksum(&packet[2..6]));
    }

    #[test]
    fn test_motor_packet_pulse_little_endian() {
        let packet = SerialBus::build_packet(Opcode::Motor, &[0, 1, 0x34, 0x12]);
        assert_eq!(packet[2], 0x01);
        assert_eq!(&packet[4..8], &[0, 1, 0x34, 0x12]);
    }
}
