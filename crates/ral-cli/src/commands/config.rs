use ral_simulation::{GridConfig, WorldConfig};

use super::WorldKind;

pub fn run(world: WorldKind) -> Result<(), String> {
    let json = match world {
        WorldKind::Ball => serde_json::to_string_pretty(&WorldConfig::default()),
        WorldKind::Grid => serde_json::to_string_pretty(&GridConfig::default()),
    }
    .map_err(|e| format!("cannot encode config: {e}"))?;
    println!("{json}");
    Ok(())
}
