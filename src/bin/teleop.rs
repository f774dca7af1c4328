// Keyboard teleop: WASD move, Z/X rotate, R/F speed, 1/2/3 LEDs, Q quit
use clap::Parser;
use crossterm::{
    event::{self, Event, KeyCode, KeyEvent, KeyEventKind},
    terminal::{disable_raw_mode, enable_raw_mode},
};
use serde_json::json;
use std::time::{Duration, Instant};
use tracing::info;

use omnibase_runtime::config::TOPIC_CMD;

const SPEEDS: [f32; 3] = [0.1, 0.3, 0.6]; // m/s
const OMEGA_SPEEDS: [f32; 3] = [1.0, 2.5, 5.0]; // rad/s
const INPUT_TIMEOUT_MS: u64 = 100; // Reset velocities after this much time with no input

#[derive(Parser)]
#[command(about = "Keyboard teleop for the omnibase runtime")]
struct Args {
    /// Command topic to publish on
    #[arg(long, default_value = TOPIC_CMD)]
    topic: String,

    /// Client name, used for the liveliness token the runtime watches
    #[arg(long, default_value = "teleop")]
    name: String,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    tracing_subscriber::fmt().with_env_filter("info").init();

    let args = Args::parse();

    info!("Opening Zenoh session...");
    let session = zenoh::open(zenoh::Config::default()).await?;
    let publisher = session.declare_publisher(args.topic.clone()).await?;

    // Dropping this token on exit is what triggers the runtime's safety stop
    let token_key = format!("omnibase/client/{}", args.name);
    let _token = session.liveliness().declare_token(token_key).await?;

    info!("Controls: WASD=move, Z/X=rotate, R/F=speed, 1/2/3=LEDs, Q=quit");
    info!("Speed: LOW");

    enable_raw_mode()?;
    let result = run_teleop(&publisher).await;
    disable_raw_mode()?;

    result
}

async fn run_teleop(
    publisher: &zenoh::pubsub::Publisher<'_>,
) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let mut speed_idx: usize = 0;

    // Persistent velocity state
    let mut vx = 0.0f32;
    let mut vy = 0.0f32;
    let mut omega = 0.0f32;
    let mut last_movement_input = Instant::now();

    loop {
        // Poll for key with 20ms timeout (50Hz effective rate)
        if event::poll(Duration::from_millis(20))? {
            if let Event::Key(KeyEvent { code, kind, .. }) = event::read()? {
                let pressed = kind == KeyEventKind::Press || kind == KeyEventKind::Repeat;

                match code {
                    // Movement - update velocity and refresh timestamp
                    KeyCode::Char('w') if pressed => {
                        vx = SPEEDS[speed_idx];
                        last_movement_input = Instant::now();
                    }
                    KeyCode::Char('s') if pressed => {
                        vx = -SPEEDS[speed_idx];
                        last_movement_input = Instant::now();
                    }
                    KeyCode::Char('a') if pressed => {
                        vy = SPEEDS[speed_idx];
                        last_movement_input = Instant::now();
                    }
                    KeyCode::Char('d') if pressed => {
                        vy = -SPEEDS[speed_idx];
                        last_movement_input = Instant::now();
                    }

                    // Rotation
                    KeyCode::Char('z') if pressed => {
                        omega = OMEGA_SPEEDS[speed_idx];
                        last_movement_input = Instant::now();
                    }
                    KeyCode::Char('x') if pressed => {
                        omega = -OMEGA_SPEEDS[speed_idx];
                        last_movement_input = Instant::now();
                    }

                    // Speed control
                    KeyCode::Char('r') if pressed => {
                        speed_idx = (speed_idx + 1).min(2);
                        info!("Speed: {}", ["LOW", "MED", "HIGH"][speed_idx]);
                    }
                    KeyCode::Char('f') if pressed => {
                        speed_idx = speed_idx.saturating_sub(1);
                        info!("Speed: {}", ["LOW", "MED", "HIGH"][speed_idx]);
                    }

                    // LED toggles
                    KeyCode::Char(c @ '1'..='3') if pressed => {
                        let index = c as u32 - '1' as u32;
                        publisher
                            .put(json!({ "toggle_led": index }).to_string())
                            .await?;
                    }

                    KeyCode::Char('q') if pressed => {
                        info!("Quitting");
                        return Ok(());
                    }
                    _ => {}
                }
            }
        }

        // Decay velocities when no movement key has arrived recently
        if last_movement_input.elapsed() > Duration::from_millis(INPUT_TIMEOUT_MS) {
            vx = 0.0;
            vy = 0.0;
            omega = 0.0;
        }

        let cmd = json!({ "vx": vx, "vy": vy, "omega": omega });
        publisher.put(cmd.to_string()).await?;
    }
}
