//! The telemetry payload returned by `/sensor_data/{machine_id}`.
//!
//! The sensor API has shipped a few different shapes over time.  This is the
//! canonical one: flat snake_case numeric fields, every one optional so that a
//! partially populated reading still decodes.  Unknown fields are ignored.

use serde::Deserialize;

/// One reading from a machine's power meter.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct SensorReading {
    /// Total active power.
    pub watts_total: Option<f64>,
    /// Energy received.
    pub wh_received: Option<f64>,

    pub pf_ave: Option<f64>,
    pub pf_r_phase: Option<f64>,
    pub pf_y_phase: Option<f64>,
    pub pf_b_phase: Option<f64>,

    pub current_total: Option<f64>,
    pub current_r_phase: Option<f64>,
    pub current_y_phase: Option<f64>,
    pub current_b_phase: Option<f64>,

    /// Average line-to-neutral voltage.
    pub vln_average: Option<f64>,
    /// Total apparent power.
    pub va_total: Option<f64>,
    pub frequency: Option<f64>,
}

/// A displayable field of [`SensorReading`].
pub struct Metric {
    pub label: &'static str,
    pub unit: &'static str,
    /// Number of decimal places shown.
    pub precision: usize,
    get: fn(&SensorReading) -> Option<f64>,
}

impl Metric {
    /// Value formatted to this metric's precision.  No reading at all renders
    /// the same as a zero reading.
    pub fn format(&self, reading: Option<&SensorReading>) -> String {
        format_fixed(reading.and_then(self.get), self.precision)
    }
}

/// Render `value` with exactly `precision` decimals, substituting `0` when absent.
pub fn format_fixed(value: Option<f64>, precision: usize) -> String {
    format!("{:.*}", precision, value.unwrap_or(0.0))
}

/// Every metric shown on the machine panel, in display order.
pub const METRICS: &[Metric] = &[
    Metric { label: "Total Power", unit: "W", precision: 2, get: |r| r.watts_total },
    Metric { label: "Energy Received", unit: "Wh", precision: 2, get: |r| r.wh_received },
    Metric { label: "Avg Power Factor", unit: "", precision: 4, get: |r| r.pf_ave },
    Metric { label: "PF R Phase", unit: "", precision: 4, get: |r| r.pf_r_phase },
    Metric { label: "PF Y Phase", unit: "", precision: 4, get: |r| r.pf_y_phase },
    Metric { label: "PF B Phase", unit: "", precision: 4, get: |r| r.pf_b_phase },
    Metric { label: "Total Current", unit: "A", precision: 2, get: |r| r.current_total },
    Metric { label: "Current R Phase", unit: "A", precision: 2, get: |r| r.current_r_phase },
    Metric { label: "Current Y Phase", unit: "A", precision: 2, get: |r| r.current_y_phase },
    Metric { label: "Current B Phase", unit: "A", precision: 2, get: |r| r.current_b_phase },
    Metric { label: "Avg Voltage (L-N)", unit: "V", precision: 2, get: |r| r.vln_average },
    Metric { label: "Apparent Power", unit: "VA", precision: 2, get: |r| r.va_total },
    Metric { label: "Frequency", unit: "Hz", precision: 2, get: |r| r.frequency },
];

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
