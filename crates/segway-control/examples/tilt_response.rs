use nalgebra::{UnitQuaternion, Vector3};
use segway_control::*;

fn main() {
    let gains = ControlGains::symmetric(-60.0).with_offsets(0.0, 0.5);
    let limits = ActuatorLimits::new(50.0, 50.0);

    match limits {
        Ok(limits) => {
            println!("Balance law parameters:");
            println!("  Gains:  {}", gains);
            println!("  Limits: {}", limits);
            println!("\nSweeping handle pitch...");

            for degrees in (-20..=20).step_by(5) {
                // Negative rotation about X leans the handle forward.
                let rotation = UnitQuaternion::from_axis_angle(&Vector3::x_axis(), -(degrees as f64).to_radians());
                match ControlState::from_rotation(&rotation) {
                    Ok(state) => {
                        let command = ActuatorCommand::new(&limits, target_speeds(state.inclination, &gains));
                        println!("Lean {:>3}°: {} -> {}", degrees, state, command);
                    }
                    Err(e) => {
                        eprintln!("Failed to derive inclination at {}°: {}", degrees, e);
                        break;
                    }
                }
            }
        }
        Err(e) => {
            eprintln!("Invalid actuator limits: {}", e);
        }
    }
}
