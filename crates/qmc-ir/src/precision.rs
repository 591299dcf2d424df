//! Numeric precision of a simulation run.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Width of the floating-point components of every amplitude and gate matrix in a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Precision {
    /// `f32` components, 8 bytes per complex amplitude.
    Single,
    /// `f64` components, 16 bytes per complex amplitude.
    #[default]
    Double,
}

impl Precision {
    /// Bytes occupied by one complex amplitude.
    pub const fn bytes_per_amplitude(self) -> u64 {
        match self {
            Precision::Single => 8,
            Precision::Double => 16,
        }
    }

    /// Parse from a configuration string (`"single"` or `"double"`).
    pub fn from_name(name: &str) -> Option<Self> {
        match name.to_ascii_lowercase().as_str() {
            "single" | "f32" | "complex64" => Some(Precision::Single),
            "double" | "f64" | "complex128" => Some(Precision::Double),
            _ => None,
        }
    }

    /// Lowercase name.
    pub const fn name(self) -> &'static str {
        match self {
            Precision::Single => "single",
            Precision::Double => "double",
        }
    }
}

impl fmt::Display for Precision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bytes_per_amplitude() {
        assert_eq!(Precision::Single.bytes_per_amplitude(), 8);
        assert_eq!(Precision::Double.bytes_per_amplitude(), 16);
    }

    #[test]
    fn test_from_name() {
        assert_eq!(Precision::from_name("Single"), Some(Precision::Single));
        assert_eq!(Precision::from_name("double"), Some(Precision::Double));
        assert_eq!(Precision::from_name("half"), None);
    }
}
