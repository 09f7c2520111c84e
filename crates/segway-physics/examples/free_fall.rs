use segway_physics::*;

fn main() {
    let settings = WorldSettings::default();
    let num_steps = 120;

    match RapierWorld::new(&settings) {
        Ok(mut world) => {
            println!("Initializing rig...");
            println!("  Timestep: {} s", world.timestep());
            println!("  Gravity:  {} m/s²", settings.gravity);
            for part in Part::ALL {
                if let Ok(pose) = world.get_part_pose(part) {
                    println!("  {:<11} {}", part, pose);
                }
            }
            println!("\nDropping the unpowered rig...");

            for i in 0..num_steps {
                if let Err(e) = world.step() {
                    eprintln!("Error during simulation step {}: {}", i + 1, e);
                    break;
                }
                if (i + 1) % 20 == 0 {
                    match world.get_part_pose(Part::Handle) {
                        Ok(pose) => println!("Step {:>3}: handle {}", i + 1, pose),
                        Err(e) => eprintln!("Failed to read handle pose: {}", e),
                    }
                }
            }

            println!("\nSimulation complete after {} steps.", world.steps());
        }
        Err(e) => {
            eprintln!("Failed to build the world: {}", e);
        }
    }
}
