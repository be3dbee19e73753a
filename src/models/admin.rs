//! Administrative level tags reported by the boundary provider.

use serde::{Deserialize, Serialize};

/// OSM admin_level mapping to semantic level names.
/// See: https://wiki.openstreetmap.org/wiki/Tag:boundary%3Dadministrative
///
/// For India, level 4 is the state / union territory outline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, PartialOrd, Ord)]
#[serde(rename_all = "snake_case")]
pub enum AdminLevel {
    /// Country (admin_level=2)
    Country,
    /// Macro region / zonal council (admin_level=3)
    MacroRegion,
    /// State / union territory (admin_level=4)
    Region,
    /// Division (admin_level=5)
    MacroCounty,
    /// District (admin_level=6)
    County,
    /// Sub-district / tehsil (admin_level=7)
    LocalAdmin,
    /// Locality / city / town / village (admin_level=8)
    Locality,
    /// Ward / city district (admin_level=9)
    Borough,
    /// Neighbourhood (admin_level=10)
    Neighbourhood,
}

impl AdminLevel {
    /// Level that denotes state boundaries for the target country.
    pub const STATE: AdminLevel = AdminLevel::Region;

    /// Convert OSM admin_level number to AdminLevel
    pub fn from_osm_level(level: u8) -> Option<Self> {
        match level {
            2 => Some(AdminLevel::Country),
            3 => Some(AdminLevel::MacroRegion),
            4 => Some(AdminLevel::Region),
            5 => Some(AdminLevel::MacroCounty),
            6 => Some(AdminLevel::County),
            7 => Some(AdminLevel::LocalAdmin),
            8 => Some(AdminLevel::Locality),
            9 => Some(AdminLevel::Borough),
            10 | 11 => Some(AdminLevel::Neighbourhood),
            _ => None,
        }
    }

    /// Get the OSM admin_level number
    pub fn to_osm_level(&self) -> u8 {
        match self {
            AdminLevel::Country => 2,
            AdminLevel::MacroRegion => 3,
            AdminLevel::Region => 4,
            AdminLevel::MacroCounty => 5,
            AdminLevel::County => 6,
            AdminLevel::LocalAdmin => 7,
            AdminLevel::Locality => 8,
            AdminLevel::Borough => 9,
            AdminLevel::Neighbourhood => 10,
        }
    }

    /// Human-readable label used in logs and the session view
    pub fn label(&self) -> &'static str {
        match self {
            AdminLevel::Country => "country",
            AdminLevel::MacroRegion => "macro_region",
            AdminLevel::Region => "state",
            AdminLevel::MacroCounty => "division",
            AdminLevel::County => "district",
            AdminLevel::LocalAdmin => "sub_district",
            AdminLevel::Locality => "locality",
            AdminLevel::Borough => "ward",
            AdminLevel::Neighbourhood => "neighbourhood",
        }
    }
}
