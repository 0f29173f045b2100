//! Status → colour/label mapping.
//!
//! Every place that shows a machine or fetch status goes through the functions
//! here, so the legend, the machine list and the status bar always agree.

use ratatui::style::Color;

use crate::poll::{FetchStatus, ResourceState};
use crate::source::SensorReading;

/// Operating state of a machine, as far as the dashboard can tell.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MachineStatus {
    Running,
    Idle,
    /// Stopped, or unreachable.
    Stopped,
    /// No reading yet.
    Unknown,
}

/// How a status is drawn.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Presentation {
    pub color: Color,
    pub label: &'static str,
}

impl MachineStatus {
    /// Derive a machine's status from its latest poll.
    ///
    /// A failed poll reads as stopped even if older data is still shown.  A
    /// successful reading with positive total power is running; zero or
    /// missing power is idle.
    pub fn from_state<K>(state: &ResourceState<K, SensorReading>) -> Self {
        match (state.status, &state.data) {
            (FetchStatus::Failed, _) => MachineStatus::Stopped,
            (FetchStatus::Pending, _) | (FetchStatus::Success, None) => MachineStatus::Unknown,
            (FetchStatus::Success, Some(reading)) => {
                if reading.watts_total.unwrap_or(0.0) > 0.0 {
                    MachineStatus::Running
                } else {
                    MachineStatus::Idle
                }
            }
        }
    }
}

pub fn status_presentation(status: MachineStatus) -> Presentation {
    match status {
        MachineStatus::Running => Presentation { color: Color::Green, label: "Running" },
        MachineStatus::Idle => Presentation { color: Color::Yellow, label: "Idle" },
        MachineStatus::Stopped => Presentation { color: Color::Red, label: "Stopped/Error" },
        MachineStatus::Unknown => Presentation { color: Color::DarkGray, label: "Unknown" },
    }
}

/// Presentation of the poll itself, for the status bar.
pub fn fetch_status_presentation(status: FetchStatus, loading: bool) -> Presentation {
    if loading {
        return Presentation { color: Color::Yellow, label: "Loading…" };
    }
    match status {
        FetchStatus::Pending => Presentation { color: Color::DarkGray, label: "Waiting" },
        FetchStatus::Success => Presentation { color: Color::Green, label: "Live" },
        FetchStatus::Failed => Presentation { color: Color::Red, label: "Error" },
    }
}

/// Legend entries in display order.
pub const LEGEND: [MachineStatus; 3] =
    [MachineStatus::Running, MachineStatus::Idle, MachineStatus::Stopped];

#[cfg(test)]
mod tests {
    use super::*;

    fn state(status: FetchStatus, watts: Option<Option<f64>>) -> ResourceState<u32, SensorReading> {
        let mut s = ResourceState::default();
        s.status = status;
        s.data = watts.map(|w| SensorReading { watts_total: w, ..Default::default() });
        s
    }

    #[test]
    fn positive_power_is_running() {
        let s = state(FetchStatus::Success, Some(Some(12.34)));
        assert_eq!(MachineStatus::from_state(&s), MachineStatus::Running);
    }

    #[test]
    fn zero_or_missing_power_is_idle() {
        let zero = state(FetchStatus::Success, Some(Some(0.0)));
        let missing = state(FetchStatus::Success, Some(None));
        assert_eq!(MachineStatus::from_state(&zero), MachineStatus::Idle);
        assert_eq!(MachineStatus::from_state(&missing), MachineStatus::Idle);
    }

    #[test]
    fn failure_is_stopped_even_with_old_data() {
        let s = state(FetchStatus::Failed, Some(Some(50.0)));
        assert_eq!(MachineStatus::from_state(&s), MachineStatus::Stopped);
    }

    #[test]
    fn pending_is_unknown() {
        let s = state(FetchStatus::Pending, None);
        assert_eq!(MachineStatus::from_state(&s), MachineStatus::Unknown);
    }

    #[test]
    fn legend_colours_are_distinct() {
        let colours: Vec<_> = LEGEND.iter().map(|s| status_presentation(*s).color).collect();
        assert_eq!(colours, vec![Color::Green, Color::Yellow, Color::Red]);
    }

    #[test]
    fn loading_overrides_fetch_status() {
        let p = fetch_status_presentation(FetchStatus::Failed, true);
        assert_eq!(p.label, "Loading…");
        assert_eq!(fetch_status_presentation(FetchStatus::Failed, false).label, "Error");
        assert_eq!(fetch_status_presentation(FetchStatus::Success, false).label, "Live");
    }
}
