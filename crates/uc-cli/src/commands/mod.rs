pub mod check;
pub mod init;
pub mod simulate;

use std::fs;
use std::path::Path;

use uc_core::{RailNetwork, TrackFile};

/// Read a track file and build its network.
fn load_track(path: &Path) -> Result<(TrackFile, RailNetwork), String> {
    let text = fs::read_to_string(path)
        .map_err(|e| format!("cannot read {}: {e}", path.display()))?;
    let track = TrackFile::from_json(&text)
        .map_err(|e| format!("cannot parse {}: {e}", path.display()))?;
    let network = track
        .build()
        .map_err(|e| format!("invalid track '{}': {e}", track.name))?;
    Ok((track, network))
}
