//! Axial design resistance and utilization.

use std::fmt;

use serde::Serialize;

/// `Nrd = fc · A / γ`, with `fc` in N/mm² and `A` in m², returned in kN.
#[must_use]
pub fn design_resistance_kn(strength: Option<f64>, area_m2: Option<f64>, gamma_m: f64) -> Option<f64> {
    let area_mm2 = area_m2? * 1e6;
    Some(strength? * area_mm2 / gamma_m / 1000.0)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum CapacityStatus {
    #[serde(rename = "OK")]
    Ok,
    #[serde(rename = "NOT OK")]
    NotOk,
    #[serde(rename = "UNKNOWN")]
    Unknown,
}

impl fmt::Display for CapacityStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            CapacityStatus::Ok => "OK",
            CapacityStatus::NotOk => "NOT OK",
            CapacityStatus::Unknown => "UNKNOWN",
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct CapacityCheck {
    pub resistance_kn: Option<f64>,
    pub demand_kn: f64,
    /// Percent; infinite for a zero resistance.
    pub utilization: Option<f64>,
    pub status: CapacityStatus,
}

impl CapacityCheck {
    #[must_use]
    pub fn evaluate(resistance_kn: Option<f64>, demand_kn: f64) -> Self {
        let Some(nrd) = resistance_kn else {
            return Self {
                resistance_kn: None,
                demand_kn,
                utilization: None,
                status: CapacityStatus::Unknown,
            };
        };

        let utilization = if nrd == 0.0 {
            f64::INFINITY
        } else {
            demand_kn / nrd * 100.0
        };
        let status = if nrd >= demand_kn {
            CapacityStatus::Ok
        } else {
            CapacityStatus::NotOk
        };

        Self {
            resistance_kn: Some(nrd),
            demand_kn,
            utilization: Some(utilization),
            status,
        }
    }
}
