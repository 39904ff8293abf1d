use std::fs;
use std::path::PathBuf;

use uc_core::TrackFile;

pub fn run(name: &str, segments: usize, waypoints: usize, cars: usize) -> Result<(), String> {
    let path = PathBuf::from(format!("{name}.track.json"));

    if path.exists() {
        return Err(format!("file '{}' already exists", path.display()));
    }
    if segments == 0 || waypoints == 0 || cars == 0 {
        return Err("segments, waypoints and cars must all be at least 1".into());
    }
    if cars > segments {
        return Err(format!(
            "{cars} cars need at least {cars} segments, got {segments}"
        ));
    }

    let track = TrackFile::straight_line(name, segments, waypoints, cars);
    let json = track
        .to_json()
        .map_err(|e| format!("cannot serialize track: {e}"))?;
    fs::write(&path, json).map_err(|e| format!("cannot write {}: {e}", path.display()))?;

    println!("Created track '{}' in {}", name, path.display());
    println!("  {segments} segments, {waypoints} waypoints each, {cars} cars");
    println!();
    println!("Get started:");
    println!("  uc check {}     # Validate the track", path.display());
    println!("  uc simulate {}  # Run the train", path.display());

    Ok(())
}
