mod graphics; // brings `graphics.rs` in as `crate::graphics`

use anyhow::Context;
use graphics::{WindowRenderer, window_conf};
use macroquad::prelude::*;
use segway_physics::RapierWorld;
use segway_sim::config::{FrontendMode, SimulationConfig, load_config};
use segway_sim::{NodeTable, SimulationController, SimulationError};
use spin_sleep::SpinSleeper;
use std::cell::RefCell;
use std::rc::Rc;
use std::time::{Duration, Instant};
use tracing::{error, info};
use tracing_subscriber::{self, EnvFilter};

// Log a progress line every this many frames.
const REPORT_INTERVAL: u64 = 60;

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive(tracing::Level::INFO.into()))
        .init();

    info!("Segway simulation starting.");

    let config = load_config().context("failed to load the simulation configuration")?;
    let world = RapierWorld::new(&config.physics).context("failed to build the physics world")?;

    match config.frontend.mode {
        FrontendMode::Headless => run_headless(world, &config),
        FrontendMode::Window => run_window(world, &config),
    }
}

fn run_headless(world: RapierWorld, config: &SimulationConfig) -> anyhow::Result<()> {
    let mut controller = SimulationController::new(world, NodeTable::new(), config.controller_settings())
        .context("failed to set up the controller")?;

    let sleeper = SpinSleeper::new(100_000);
    let period = Duration::from_secs_f64(1.0 / config.frontend.frame_rate);
    let frames = config.frontend.frames.unwrap_or(u64::MAX);
    info!(frames, rate = config.frontend.frame_rate, "Headless loop started.");

    while controller.frame() < frames {
        let started = Instant::now();
        let report = controller.update().context("simulation frame failed")?;
        if report.frame % REPORT_INTERVAL == 0 {
            info!(frame = report.frame, control = %report.control, command = %report.command, "Progress.");
        }
        if let Some(remaining) = period.checked_sub(started.elapsed()) {
            sleeper.sleep(remaining);
        }
    }

    controller.stop();
    info!(frames = controller.frame(), "Headless loop finished.");
    Ok(())
}

fn run_window(world: RapierWorld, config: &SimulationConfig) -> anyhow::Result<()> {
    let mut controller = SimulationController::new(world, WindowRenderer::new(), config.controller_settings())
        .context("failed to set up the controller")?;
    let frames = config.frontend.frames.unwrap_or(u64::MAX);

    // The window future cannot return a value, so a fatal frame error is handed back through here.
    let failure: Rc<RefCell<Option<SimulationError>>> = Rc::default();
    let failure_slot = Rc::clone(&failure);

    info!("Opening the visualization window...");
    macroquad::Window::from_config(window_conf(), async move {
        while controller.frame() < frames && !is_key_pressed(KeyCode::Escape) {
            let report = match controller.update() {
                Ok(report) => report,
                Err(e) => {
                    error!("Simulation stopped: {}", e);
                    *failure_slot.borrow_mut() = Some(e);
                    break;
                }
            };
            if report.frame % REPORT_INTERVAL == 0 {
                info!(frame = report.frame, control = %report.control, command = %report.command, "Progress.");
            }
            controller.renderer().render(&report);
            next_frame().await
        }
        controller.stop();
        info!(frames = controller.frame(), "Visualization loop finished.");
    });

    let failed = failure.borrow_mut().take();
    window_outcome(failed)
}

// A window closed by the user or by the frame cap is a clean exit; a failed frame is not.
fn window_outcome(failure: Option<SimulationError>) -> anyhow::Result<()> {
    match failure {
        Some(e) => Err(e).context("simulation frame failed"),
        None => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use segway_physics::Part;

    #[test]
    fn test_failed_window_run_is_an_error() {
        let err = window_outcome(Some(SimulationError::Diverged { part: Part::Handle, frame: 12 })).unwrap_err();
        assert!(err.to_string().contains("simulation frame failed"));
        assert!(matches!(
            err.downcast_ref::<SimulationError>(),
            Some(SimulationError::Diverged { frame: 12, .. })
        ));
    }

    #[test]
    fn test_closed_window_is_clean_exit() {
        assert!(window_outcome(None).is_ok());
    }
}
