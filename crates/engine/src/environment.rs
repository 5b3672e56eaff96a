use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

// =============================================================================
// Region
// =============================================================================

/// Cities the model service has air-quality history for.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize,
)]
pub enum Region {
    #[default]
    Delhi,
    Mumbai,
    Kolkata,
    Chennai,
    Bangalore,
    Hyderabad,
    Ahmedabad,
    Pune,
    Kanpur,
    Lucknow,
    Patna,
}

impl Region {
    pub const ALL: [Region; 11] = [
        Region::Delhi,
        Region::Mumbai,
        Region::Kolkata,
        Region::Chennai,
        Region::Bangalore,
        Region::Hyderabad,
        Region::Ahmedabad,
        Region::Pune,
        Region::Kanpur,
        Region::Lucknow,
        Region::Patna,
    ];

    /// City name as sent on the wire.
    pub fn name(self) -> &'static str {
        match self {
            Region::Delhi => "Delhi",
            Region::Mumbai => "Mumbai",
            Region::Kolkata => "Kolkata",
            Region::Chennai => "Chennai",
            Region::Bangalore => "Bangalore",
            Region::Hyderabad => "Hyderabad",
            Region::Ahmedabad => "Ahmedabad",
            Region::Pune => "Pune",
            Region::Kanpur => "Kanpur",
            Region::Lucknow => "Lucknow",
            Region::Patna => "Patna",
        }
    }

    /// Case-insensitive lookup by city name.
    pub fn from_name(name: &str) -> Option<Region> {
        let name = name.trim();
        Self::ALL
            .into_iter()
            .find(|r| r.name().eq_ignore_ascii_case(name))
    }

    /// Historical air-quality risk tier: 0.8 for the most polluted cities,
    /// 0.5 for the rest.
    pub fn risk_factor(self) -> f64 {
        match self {
            Region::Delhi
            | Region::Kolkata
            | Region::Mumbai
            | Region::Kanpur
            | Region::Lucknow
            | Region::Patna => 0.8,
            Region::Chennai
            | Region::Bangalore
            | Region::Hyderabad
            | Region::Ahmedabad
            | Region::Pune => 0.5,
        }
    }
}

impl fmt::Display for Region {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Region {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Region::from_name(s).ok_or_else(|| format!("unknown region `{s}`"))
    }
}

// =============================================================================
// Season
// =============================================================================

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum Season {
    #[default]
    Winter,
    Summer,
    Monsoon,
    Autumn,
}

impl Season {
    pub const ALL: [Season; 4] = [
        Season::Winter,
        Season::Summer,
        Season::Monsoon,
        Season::Autumn,
    ];

    /// Lowercase wire name.
    pub fn name(self) -> &'static str {
        match self {
            Season::Winter => "winter",
            Season::Summer => "summer",
            Season::Monsoon => "monsoon",
            Season::Autumn => "autumn",
        }
    }

    /// Display label with the months the season covers.
    pub fn label(self) -> &'static str {
        match self {
            Season::Winter => "Winter (Jan-Feb)",
            Season::Summer => "Summer (Mar-May)",
            Season::Monsoon => "Monsoon (Jun-Sep)",
            Season::Autumn => "Autumn (Oct-Dec)",
        }
    }

    pub fn from_name(name: &str) -> Option<Season> {
        let name = name.trim();
        Self::ALL
            .into_iter()
            .find(|s| s.name().eq_ignore_ascii_case(name))
    }
}

impl fmt::Display for Season {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Season {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Season::from_name(s).ok_or_else(|| format!("unknown season `{s}`"))
    }
}

// =============================================================================
// Pollutants
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Pollutant {
    So2,
    No2,
    Pm10,
    Pm25,
}

impl Pollutant {
    /// Wire field name.
    pub fn field(self) -> &'static str {
        match self {
            Pollutant::So2 => "so2",
            Pollutant::No2 => "no2",
            Pollutant::Pm10 => "pm10",
            Pollutant::Pm25 => "pm25",
        }
    }
}

/// Rejected pollutant reading.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SampleError {
    Negative { pollutant: Pollutant, value: f64 },
    NotFinite { pollutant: Pollutant },
}

impl fmt::Display for SampleError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SampleError::Negative { pollutant, value } => write!(
                f,
                "{} reading must be non-negative, got {value}",
                pollutant.field()
            ),
            SampleError::NotFinite { pollutant } => {
                write!(f, "{} reading is not a finite number", pollutant.field())
            }
        }
    }
}

impl std::error::Error for SampleError {}

// =============================================================================
// EnvironmentalSample
// =============================================================================

/// Pollutant concentrations (µg/m³) for one region and season.
///
/// Immutable once built; every reading is finite and non-negative.
/// Deserialization goes through the same validation as [`EnvironmentalSample::new`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawSample")]
pub struct EnvironmentalSample {
    so2: f64,
    no2: f64,
    pm10: f64,
    pm25: f64,
    region: Region,
    season: Season,
}

#[derive(Deserialize)]
struct RawSample {
    so2: f64,
    no2: f64,
    pm10: f64,
    pm25: f64,
    region: Region,
    season: Season,
}

impl TryFrom<RawSample> for EnvironmentalSample {
    type Error = SampleError;

    fn try_from(raw: RawSample) -> Result<Self, Self::Error> {
        EnvironmentalSample::new(
            raw.so2, raw.no2, raw.pm10, raw.pm25, raw.region, raw.season,
        )
    }
}

fn checked(pollutant: Pollutant, value: f64) -> Result<f64, SampleError> {
    if !value.is_finite() {
        return Err(SampleError::NotFinite { pollutant });
    }
    if value < 0.0 {
        return Err(SampleError::Negative { pollutant, value });
    }
    Ok(value)
}

impl EnvironmentalSample {
    pub fn new(
        so2: f64,
        no2: f64,
        pm10: f64,
        pm25: f64,
        region: Region,
        season: Season,
    ) -> Result<Self, SampleError> {
        Ok(Self {
            so2: checked(Pollutant::So2, so2)?,
            no2: checked(Pollutant::No2, no2)?,
            pm10: checked(Pollutant::Pm10, pm10)?,
            pm25: checked(Pollutant::Pm25, pm25)?,
            region,
            season,
        })
    }

    pub fn so2(&self) -> f64 {
        self.so2
    }

    pub fn no2(&self) -> f64 {
        self.no2
    }

    pub fn pm10(&self) -> f64 {
        self.pm10
    }

    pub fn pm25(&self) -> f64 {
        self.pm25
    }

    pub fn region(&self) -> Region {
        self.region
    }

    pub fn season(&self) -> Season {
        self.season
    }

    pub fn reading(&self, pollutant: Pollutant) -> f64 {
        match pollutant {
            Pollutant::So2 => self.so2,
            Pollutant::No2 => self.no2,
            Pollutant::Pm10 => self.pm10,
            Pollutant::Pm25 => self.pm25,
        }
    }
}

/// The capacity predictor's starting form: a typical Delhi winter.
impl Default for EnvironmentalSample {
    fn default() -> Self {
        Self {
            so2: 10.0,
            no2: 20.0,
            pm10: 60.0,
            pm25: 30.0,
            region: Region::Delhi,
            season: Season::Winter,
        }
    }
}
