//! JSON event files.
//!
//! ```json
//! {
//!   "crystals": [{ "position": [0.0, 0.0, 0.0], "neighbors": [1] }, ...],
//!   "neighbor_radius": 40.0,
//!   "online_neighbors": [[1], [0]],
//!   "hits": [{ "crystal": 0, "time": 12.5, "energy": 40.0 }],
//!   "events": [[{ "crystal": 0, "time": 3.0, "energy": 8.0 }]]
//! }
//! ```
//!
//! When `neighbor_radius` is present the adjacency is derived from the
//! crystal positions and any explicit `neighbors` lists are ignored.
//! `hits` holds a single event, `events` any number of them; both may be
//! given.

use std::fs;
use std::path::Path;

use calopix_core::{CaloHit, ClusteringConfig, Crystal, CrystalMap, EventHits};
use log::debug;
use nalgebra::Vector3;
use serde::Deserialize;

use crate::{CliError, Result};

#[derive(Debug, Deserialize)]
struct EventFile {
    crystals: Vec<Crystal>,
    #[serde(default)]
    neighbor_radius: Option<f64>,
    #[serde(default)]
    online_neighbors: Option<Vec<Vec<usize>>>,
    #[serde(default)]
    hits: Vec<CaloHit>,
    #[serde(default)]
    events: Vec<Vec<CaloHit>>,
}

/// Geometry and events read from one file.
#[derive(Debug)]
pub struct LoadedEvents {
    pub geometry: CrystalMap,
    pub events: Vec<EventHits>,
}

fn build_geometry(file: &EventFile) -> Result<CrystalMap> {
    let map = match file.neighbor_radius {
        Some(radius) => {
            let positions: Vec<Vector3<f64>> = file.crystals.iter().map(|c| c.position).collect();
            CrystalMap::from_positions(&positions, radius)?
        }
        None => CrystalMap::new(file.crystals.clone())?,
    };
    match &file.online_neighbors {
        Some(online) => Ok(map.with_online_neighbors(online.clone())?),
        None => Ok(map),
    }
}

/// Parses an event file from a JSON string.
///
/// # Errors
/// Fails on malformed JSON, invalid geometry or invalid hits.
pub fn parse_events(json: &str) -> Result<LoadedEvents> {
    let file: EventFile = serde_json::from_str(json)?;
    if file.crystals.is_empty() {
        return Err(CliError::Input("event file lists no crystals".to_string()));
    }
    let geometry = build_geometry(&file)?;
    let count = file.crystals.len();

    let single = (!file.hits.is_empty()).then_some(file.hits);
    let events = single
        .into_iter()
        .chain(file.events)
        .map(|hits| EventHits::from_hits(count, hits))
        .collect::<calopix_core::Result<Vec<_>>>()?;
    if events.is_empty() {
        return Err(CliError::Input("event file contains no hits".to_string()));
    }

    debug!("loaded {count} crystals and {} events", events.len());
    Ok(LoadedEvents { geometry, events })
}

/// Reads an event file.
///
/// # Errors
/// Fails if the file cannot be read or [`parse_events`] fails.
pub fn load_events(path: &Path) -> Result<LoadedEvents> {
    let json = fs::read_to_string(path)?;
    parse_events(&json)
}

/// Reads a JSON clustering configuration. Missing fields take defaults.
///
/// # Errors
/// Fails if the file cannot be read or parsed.
pub fn load_config(path: &Path) -> Result<ClusteringConfig> {
    let json = fs::read_to_string(path)?;
    Ok(serde_json::from_str(&json)?)
}
