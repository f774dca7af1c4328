// Fixed-cadence control loop plus the async command ingress task
//
// Two concurrency domains share SharedCommandState: ingress (zenoh
// subscriber + liveliness watcher) writes it, the control loop snapshots it
// every tick. The loop itself is state-agnostic: a safety stop is nothing
// more than zeros already sitting in the shared state when the next tick
// reads it. There are no staleness timers; a client disconnect is the only
// stop trigger.

use std::time::Duration;

use tokio::time::interval;
use tracing::{info, warn};
use zenoh::sample::SampleKind;

use crate::config::{
    BUS_BAUDRATE, BUS_ENABLED, BUS_PORT, LIVELINESS_CLIENTS, LOOP_HZ, MAX_ANGULAR_VELOCITY,
    MAX_LINEAR_VELOCITY, ROBOT_RADIUS_M, SERVO_JOG_RATE_DEG_S, TOPIC_CMD, TOPIC_TELEMETRY,
    WHEEL_ANGLES_DEG, WHEEL_RADIUS_M,
};
use crate::messages::{Command, Telemetry};
use crate::motor::{
    DriveBus, DriveController, NullBus, OmniKinematics, SerialBus, NUM_LEDS, NUM_SERVOS,
};
use crate::state::{CommandSnapshot, SharedCommandState};

pub struct ControlLoop {
    kinematics: OmniKinematics,
    driver: DriveController,
    servo_angle: [f32; NUM_SERVOS],
    max_wheel_speed: f32,
    dt: f32,
}

impl ControlLoop {
    pub fn new(driver: DriveController) -> Self {
        let kinematics = OmniKinematics::new(ROBOT_RADIUS_M, WHEEL_RADIUS_M, &WHEEL_ANGLES_DEG);

        // Fastest wheel at full linear plus full angular command; dividing
        // by this normalizes wheel speeds into motor power
        let max_wheel_speed =
            (MAX_LINEAR_VELOCITY + ROBOT_RADIUS_M * MAX_ANGULAR_VELOCITY) / WHEEL_RADIUS_M;

        Self {
            kinematics,
            driver,
            servo_angle: [90.0; NUM_SERVOS],
            max_wheel_speed,
            dt: 1.0 / LOOP_HZ as f32,
        }
    }

    /// One control tick over a consistent snapshot: kinematics, motor
    /// actuation, servo jog integration, LED refresh. Bus failures are
    /// logged and never break the cadence.
    pub fn tick(&mut self, snap: &CommandSnapshot) {
        self.kinematics.set_target(snap.vx, snap.vy, snap.omega);
        self.kinematics.compute_wheel_speeds();

        for i in 0..self.kinematics.wheel_count() {
            let power = self.kinematics.wheel_speed(i) / self.max_wheel_speed;
            if let Err(e) = self.driver.drive_motor(i, power) {
                warn!("Motor {} write failed: {}", i, e);
            }
        }

        for i in 0..NUM_SERVOS {
            // Jog the servo by its commanded velocity, bounded by the
            // operator-set travel limits (order-normalized so an inverted
            // pair cannot fault)
            let lo = snap.servo_min[i].min(snap.servo_max[i]);
            let hi = snap.servo_min[i].max(snap.servo_max[i]);
            let angle = (self.servo_angle[i] + snap.servo_vel[i] * SERVO_JOG_RATE_DEG_S * self.dt)
                .clamp(lo, hi);
            self.servo_angle[i] = angle;

            if let Err(e) = self.driver.set_servo_angle(i, angle) {
                warn!("Servo {} write failed: {}", i, e);
            }
        }

        for i in 0..NUM_LEDS {
            if let Err(e) = self.driver.set_led(i, snap.led[i]) {
                warn!("LED {} write failed: {}", i, e);
            }
        }
    }

    /// Current actuator state for the telemetry broadcast.
    pub fn telemetry(&self, snap: &CommandSnapshot) -> Telemetry {
        Telemetry {
            wheel_speeds: self.kinematics.wheel_speeds().to_vec(),
            duty: self.driver.duties(),
            led: snap.led,
            servo_angle: self.servo_angle,
        }
    }
}

pub async fn run() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    info!("Opening Zenoh session...");
    let session = zenoh::open(zenoh::Config::default()).await?;

    info!("Setting up publishers and subscribers...");
    let subscriber = session.declare_subscriber(TOPIC_CMD).await?;
    let liveliness = session.liveliness().declare_subscriber(LIVELINESS_CLIENTS).await?;
    let pub_telemetry = session.declare_publisher(TOPIC_TELEMETRY).await?;

    let state = SharedCommandState::new();

    // Ingress task: parses JSON commands into the shared state and watches
    // client liveliness for the disconnect safety stop
    let ingress_state = state.clone();
    tokio::spawn(async move {
        loop {
            tokio::select! {
                sample = subscriber.recv_async() => {
                    let Ok(sample) = sample else { break };
                    let payload = sample.payload().to_bytes();
                    match serde_json::from_slice::<Command>(&payload) {
                        Ok(cmd) => ingress_state.apply(&cmd),
                        Err(e) => warn!("Failed to parse command: {}", e),
                    }
                }
                sample = liveliness.recv_async() => {
                    let Ok(sample) = sample else { break };
                    match sample.kind() {
                        SampleKind::Put => {
                            info!("Client connected: {}", sample.key_expr());
                        }
                        SampleKind::Delete => {
                            warn!("Client disconnected: {}, safety stop", sample.key_expr());
                            ingress_state.safety_stop();
                        }
                    }
                }
            }
        }
    });

    let bus: Box<dyn DriveBus + Send> = if BUS_ENABLED {
        info!("Opening drive board on {}", BUS_PORT);
        Box::new(SerialBus::open(BUS_PORT, BUS_BAUDRATE)?)
    } else {
        info!("Hardware output disabled, using null bus");
        Box::new(NullBus)
    };

    let mut control = ControlLoop::new(DriveController::new(bus));
    let mut tick = interval(Duration::from_millis(1000 / LOOP_HZ));

    info!("Runtime started: {}Hz control loop", LOOP_HZ);
    info!("Subscribed to: {}", TOPIC_CMD);
    info!("Publishing to: {}", TOPIC_TELEMETRY);

    loop {
        tick.tick().await;

        // One consistent snapshot per tick; the lock is never held across
        // the computation below
        let snap = state.snapshot();
        control.tick(&snap);

        let telemetry_json = serde_json::to_string(&control.telemetry(&snap))?;
        pub_telemetry.put(telemetry_json).await?;
    }
}
