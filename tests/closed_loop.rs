use nalgebra::Vector3;
use segway_control::{ActuatorLimits, ControlGains};
use segway_physics::{Part, PhysicsWorld, RapierWorld, WorldSettings};
use segway_sim::config::load_config_from_str;
use segway_sim::{ControllerSettings, ControllerState, NodeTable, SimulationController};

fn controller(gains: ControlGains) -> SimulationController<RapierWorld, NodeTable> {
    let world = RapierWorld::new(&WorldSettings::default()).unwrap();
    let settings = ControllerSettings {
        limits: ActuatorLimits::new(50.0, 50.0).unwrap(),
        gains,
        reference_part: Part::Handle,
    };
    SimulationController::new(world, NodeTable::new(), settings).unwrap()
}

#[test]
fn test_balance_loop_runs_two_seconds() {
    let mut controller = controller(ControlGains::symmetric(-25.0));

    for n in 1..=120 {
        let report = controller.update().unwrap();
        assert_eq!(report.frame, n);
        assert!(report.control.inclination.is_finite());
        assert!(report.command.left.target_speed.is_finite());
        assert_eq!(report.command.right.max_torque, 50.0);
    }

    assert_eq!(controller.state(), ControllerState::Running);
    assert_eq!(controller.renderer().writes(), 120 * Part::COUNT as u64);
    for (_, transform) in controller.renderer().iter() {
        assert!(transform.is_finite());
    }
    assert_eq!(controller.renderer().iter().count(), Part::COUNT);
}

#[test]
fn test_shipped_gains_keep_the_rig_upright() {
    let path = concat!(env!("CARGO_MANIFEST_DIR"), "/config/default.toml");
    let config = load_config_from_str(&std::fs::read_to_string(path).unwrap()).unwrap();
    let world = RapierWorld::new(&config.physics).unwrap();
    let mut controller = SimulationController::new(world, NodeTable::new(), config.controller_settings()).unwrap();

    for n in 1..=600 {
        if n == 60 {
            // Shove the handle forwards, then backwards.
            controller.world_mut().apply_impulse(Part::Handle, &Vector3::new(0.0, 0.0, -0.005)).unwrap();
        }
        if n == 300 {
            controller.world_mut().apply_impulse(Part::Handle, &Vector3::new(0.0, 0.0, 0.005)).unwrap();
        }
        let report = controller.update().unwrap();
        assert!(
            report.control.inclination.abs() < 0.3,
            "inclination {} in frame {n}",
            report.control.inclination
        );

        let base = controller.world().get_part_position(Part::Base).unwrap();
        let handle = controller.world().get_part_position(Part::Handle).unwrap();
        assert!(handle.y > base.y + 0.4, "handle at {handle} below base at {base} in frame {n}");
    }
}

#[test]
fn test_rendered_transforms_match_world() {
    let mut controller = controller(ControlGains::symmetric(-25.0));
    for _ in 0..30 {
        controller.update().unwrap();
    }
    for part in Part::ALL {
        let position = controller.world().get_part_position(part).unwrap();
        let rendered = controller.renderer().transform(part).unwrap().translation();
        assert!((rendered - position).norm() < 1e-9, "{part}");
    }
}

#[test]
fn test_forward_bias_spins_the_wheels() {
    let gains = ControlGains::symmetric(0.0).with_offsets(2.0, 0.0);
    let mut controller = controller(gains);
    for _ in 0..60 {
        let report = controller.update().unwrap();
        assert_eq!(report.command.left.target_speed, 2.0);
        assert_eq!(report.command.right.target_speed, 2.0);
    }
    let left = controller.world().get_part_rotation(Part::LeftWheel).unwrap();
    let right = controller.world().get_part_rotation(Part::RightWheel).unwrap();
    assert!(left.angle() > 0.1);
    assert!(right.angle() > 0.1);
}
