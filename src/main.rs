use chrono::Local;
use color_eyre::Result;
use std::time::Duration;
use tracing::{debug, info};
use tracing_subscriber::{EnvFilter, FmtSubscriber};
use wiimote_wrapper::driver::{
    CoreButtons, DeviceId, ExtensionType, NunchuckData, RawReport, SimulatedDriver,
};
use wiimote_wrapper::{Running, WiimoteButton, WiimoteConfig, WiimoteContext};

const DEMO_REMOTES: usize = 3;
const DEMO_FRAMES: u64 = 600;
const FRAME_INTERVAL_MS: u64 = 16;
const DEFAULT_LOG_FILTER: &str = "wiimote_wrapper=info";

#[tokio::main]
async fn main() -> Result<()> {
    setup()?;

    let config = setup_config().await?;
    info!("Initializing wiimote context with config: {:?}", config);

    let driver = SimulatedDriver::new();
    let remotes: Vec<DeviceId> = (0..DEMO_REMOTES).map(|_| driver.add_remote()).collect();
    info!("Simulating {} remotes", remotes.len());

    let mut context = WiimoteContext::create(config, Box::new(driver.clone()))?.init()?;

    run_frames(&mut context, &driver, &remotes).await;

    context.shutdown();
    Ok(())
}

/// Error reports and logging. `RUST_LOG` overrides the default filter.
fn setup() -> Result<()> {
    color_eyre::config::HookBuilder::default()
        .display_env_section(false)
        .install()?;

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));

    FmtSubscriber::builder()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(true)
        .with_file(true)
        .with_line_number(true)
        .pretty()
        .init();
    Ok(())
}

async fn setup_config() -> Result<WiimoteConfig> {
    match WiimoteConfig::default_path() {
        Some(path) => WiimoteConfig::load_or_create(&path).await,
        None => {
            info!("No config directory available, using defaults");
            Ok(WiimoteConfig::default())
        }
    }
}

async fn run_frames(
    context: &mut WiimoteContext<Running>,
    driver: &SimulatedDriver,
    remotes: &[DeviceId],
) {
    let mut interval = tokio::time::interval(Duration::from_millis(FRAME_INTERVAL_MS));
    let mut reports_read = 0;
    let mut last_log_time = Local::now();
    let log_interval = chrono::Duration::seconds(1);

    for frame in 0..DEMO_FRAMES {
        interval.tick().await;

        for (idx, device) in remotes.iter().enumerate() {
            driver.push_report(*device, demo_report(frame, idx));
        }
        let stats = context.tick();
        reports_read += stats.reports_read;

        for slot in 0..context.max_players() {
            if !context.has_device(slot) {
                continue;
            }
            if context.button_down(slot, WiimoteButton::A) {
                info!("Player {} pressed A", slot);
            }
            if context.button_up(slot, WiimoteButton::A) {
                info!("Player {} released A", slot);
            }
            let pointer = context.pointer_position(slot);
            debug!(
                "Player {} pointer ({:.3}, {:.3}), stick {:?}",
                slot,
                pointer.x,
                pointer.y,
                context.axis_2d(slot)
            );
        }

        let now = Local::now();
        if now - last_log_time > log_interval {
            for slot in 0..context.max_players() {
                if context.has_device(slot) {
                    let pointer = context.pointer_position(slot);
                    info!(
                        "Player {} pointer at ({:.3}, {:.3}), up vector {:?}",
                        slot,
                        pointer.x,
                        pointer.y,
                        context.accel_vector(slot)
                    );
                } else {
                    info!("Player {} has no wiimote", slot);
                }
            }
            info!(
                "Frame {}: read {} reports since {}",
                frame,
                reports_read,
                last_log_time.format("%H:%M:%S.%3f")
            );
            reports_read = 0;
            last_log_time = now;
        }
    }
}

/// Scripted input: each remote traces a circle with the pointer, sweeps the
/// stick and taps A once a second.
fn demo_report(frame: u64, remote: usize) -> RawReport {
    let phase = frame as f32 / 60.0 + remote as f32;
    let jitter = if frame % 2 == 0 { 0.004 } else { -0.004 };

    let mut buttons = CoreButtons::empty();
    if frame % 60 < 10 {
        buttons |= CoreButtons::A;
    }

    let stick_x = (128.0 + 100.0 * phase.sin()) as u8;
    RawReport {
        buttons,
        extension: ExtensionType::Nunchuck,
        nunchuck: NunchuckData {
            stick: [stick_x, 128],
            z: false,
            c: frame % 120 == 0,
        },
        ir_pointer: Some([
            0.5 + 0.3 * phase.cos() + jitter,
            0.5 + 0.3 * phase.sin() + jitter,
        ]),
        accel: [0.0, 0.0, 1.0],
    }
}
