use std::convert::Infallible;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use anyhow::{bail, Context, Result};
use serde::Deserialize;
use shared::coordinates::{self, Grid};
use shared::models::Coordinate;

/// Where the coordinate set comes from.
#[derive(Clone, Debug, PartialEq)]
pub enum CoordinateSource {
    Landmarks,
    Grid,
    File(PathBuf),
}

impl FromStr for CoordinateSource {
    type Err = Infallible;

    fn from_str(s: &str) -> Result<Self, Infallible> {
        Ok(match s {
            "landmarks" => CoordinateSource::Landmarks,
            "grid" => CoordinateSource::Grid,
            path => CoordinateSource::File(PathBuf::from(path)),
        })
    }
}

#[derive(Debug, Deserialize)]
struct CoordinateEntry {
    label: Option<String>,
    latitude: f64,
    longitude: f64,
}

impl From<CoordinateEntry> for Coordinate {
    fn from(entry: CoordinateEntry) -> Self {
        match entry.label {
            Some(label) => Coordinate::new(label, entry.latitude, entry.longitude),
            None => Coordinate::unlabeled(entry.latitude, entry.longitude),
        }
    }
}

impl CoordinateSource {
    pub fn load(&self) -> Result<Vec<Coordinate>> {
        let coordinates = match self {
            CoordinateSource::Landmarks => coordinates::landmarks(),
            CoordinateSource::Grid => Grid::default().coordinates(),
            CoordinateSource::File(path) => from_file(path)?,
        };
        if coordinates.is_empty() {
            bail!("Coordinate set is empty");
        }
        Ok(coordinates)
    }
}

fn from_file(path: &Path) -> Result<Vec<Coordinate>> {
    let contents = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read coordinates from {}", path.display()))?;
    parse(&contents).with_context(|| format!("Invalid coordinates file {}", path.display()))
}

pub fn parse(json: &str) -> Result<Vec<Coordinate>> {
    let entries: Vec<CoordinateEntry> = serde_json::from_str(json)?;
    for entry in &entries {
        if !(-90.0..=90.0).contains(&entry.latitude) || !(-180.0..=180.0).contains(&entry.longitude) {
            bail!(
                "Coordinate out of range: ({}, {})",
                entry.latitude,
                entry.longitude
            );
        }
    }
    Ok(entries.into_iter().map(Coordinate::from).collect())
}
