//! Air-quality parameters with pre-rendered raster products.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::ViewerError;

/// An air-quality parameter the backing store carries rasters for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Parameter {
    Pm25,
    Pm10,
}

impl Parameter {
    /// Path component used in raster locators.
    pub fn as_str(&self) -> &'static str {
        match self {
            Parameter::Pm25 => "pm25",
            Parameter::Pm10 => "pm10",
        }
    }

    /// Human-readable label for dropdowns and logs.
    pub fn label(&self) -> &'static str {
        match self {
            Parameter::Pm25 => "PM 2.5",
            Parameter::Pm10 => "PM 10",
        }
    }

    /// All parameters in display order.
    pub fn all() -> &'static [Parameter] {
        &[Parameter::Pm25, Parameter::Pm10]
    }
}

impl fmt::Display for Parameter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Parameter {
    type Err = ViewerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "pm25" | "pm2.5" => Ok(Parameter::Pm25),
            "pm10" => Ok(Parameter::Pm10),
            other => Err(ViewerError::UnknownParameter(other.to_string())),
        }
    }
}
