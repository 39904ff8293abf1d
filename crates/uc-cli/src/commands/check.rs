use std::path::Path;

use comfy_table::{ContentArrangement, Table};

pub fn run(file: &Path) -> Result<(), String> {
    let (track, network) = super::load_track(file)?;

    let powered = network.segments().filter(|s| s.powered).count();
    let checkpoints = network.segments().filter(|s| s.final_checkpoint).count();
    let on_rail = network.cars().filter(|c| c.is_on_rail()).count();

    println!("  All checks passed for '{}'.", track.name);
    println!();

    let mut table = Table::new();
    table.set_content_arrangement(ContentArrangement::Dynamic);
    table.set_header(vec!["Segments", "Powered", "Checkpoints", "Cars", "On rail"]);
    table.add_row(vec![
        network.segment_count().to_string(),
        powered.to_string(),
        checkpoints.to_string(),
        network.car_count().to_string(),
        on_rail.to_string(),
    ]);
    println!("{table}");

    if checkpoints == 0 {
        println!("  warning: no final checkpoint; the train will run until it derails");
    }

    Ok(())
}
