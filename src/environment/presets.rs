//! Built-in lighting presets.
//!
//! Every preset is a six-face cube map hosted under [`CUBEMAP_ROOT`].

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::errors::Error;

/// Remote root of the preset cube maps.
pub const CUBEMAP_ROOT: &str =
    "https://rawcdn.githack.com/pmndrs/drei-assets/aa3600359ba664d546d05821bcbca42013587df2";

/// Face file names in `+X, -X, +Y, -Y, +Z, -Z` order.
pub const CUBE_FACES: [&str; 6] = ["px.png", "nx.png", "py.png", "ny.png", "pz.png", "nz.png"];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Preset {
    Sunset,
    Dawn,
    Night,
    Warehouse,
    Forest,
    Apartment,
    Studio,
    City,
    Park,
    Lobby,
}

impl Preset {
    pub const ALL: [Preset; 10] = [
        Preset::Sunset,
        Preset::Dawn,
        Preset::Night,
        Preset::Warehouse,
        Preset::Forest,
        Preset::Apartment,
        Preset::Studio,
        Preset::City,
        Preset::Park,
        Preset::Lobby,
    ];

    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            Preset::Sunset => "sunset",
            Preset::Dawn => "dawn",
            Preset::Night => "night",
            Preset::Warehouse => "warehouse",
            Preset::Forest => "forest",
            Preset::Apartment => "apartment",
            Preset::Studio => "studio",
            Preset::City => "city",
            Preset::Park => "park",
            Preset::Lobby => "lobby",
        }
    }

    /// The six face files, relative to [`Preset::base_path`].
    #[must_use]
    pub fn files(self) -> [String; 6] {
        CUBE_FACES.map(|face| format!("{}/{face}", self.name()))
    }

    /// Base path every preset resolves against.
    #[must_use]
    pub fn base_path() -> String {
        format!("{CUBEMAP_ROOT}/hdri/")
    }

    /// Comma-separated list of valid names.
    #[must_use]
    pub fn valid_names() -> String {
        Self::ALL.map(Preset::name).join(", ")
    }
}

impl fmt::Display for Preset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Preset {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|p| p.name() == s)
            .ok_or_else(|| Error::UnknownPreset {
                name: s.to_string(),
                valid: Self::valid_names(),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn names_round_trip_through_from_str() {
        for preset in Preset::ALL {
            assert_eq!(preset.name().parse::<Preset>().unwrap(), preset);
        }
    }

    #[test]
    fn unknown_name_lists_valid_options() {
        let err = "moon".parse::<Preset>().unwrap_err();
        let msg = err.to_string();
        assert!(msg.starts_with("Preset must be one of: sunset, dawn"));
        assert!(msg.ends_with("lobby"));
    }
}
