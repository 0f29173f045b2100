use ratatui::widgets::ListState;

use crate::config::{Machine, MachineId};
use crate::poll::ResourceState;
use crate::presentation::MachineStatus;
use crate::source::SensorReading;

/// State of the polled machine, as seen by the UI.
pub type TelemetryState = ResourceState<MachineId, SensorReading>;

pub struct App {
    /// Machines from the config, ordered by id.
    pub machines: Vec<Machine>,
    /// List selection state for the machine list.
    pub list_state: ListState,
    /// Latest telemetry for the selected machine.
    pub telemetry: TelemetryState,
    /// Whether the user has requested to quit.
    pub quit: bool,
    /// Set by the `r` key; the main loop restarts polling and clears it.
    pub refresh_requested: bool,
    /// Shown in the header.
    pub endpoint: String,
}

impl App {
    pub fn new(machines: Vec<Machine>, endpoint: impl Into<String>) -> Self {
        let mut list_state = ListState::default();
        if !machines.is_empty() {
            list_state.select(Some(0));
        }
        Self {
            machines,
            list_state,
            telemetry: TelemetryState::default(),
            quit: false,
            refresh_requested: false,
            endpoint: endpoint.into(),
        }
    }

    /// Select the machine with `id`, if it exists.
    pub fn select_machine(&mut self, id: MachineId) {
        if let Some(i) = self.machines.iter().position(|m| m.id == id) {
            self.list_state.select(Some(i));
        }
    }

    pub fn selected_machine(&self) -> Option<&Machine> {
        self.list_state.selected().and_then(|i| self.machines.get(i))
    }

    pub fn selected_id(&self) -> Option<MachineId> {
        self.selected_machine().map(|m| m.id)
    }

    /// Replace the telemetry snapshot with a newer one from the poller.
    pub fn apply_telemetry(&mut self, state: TelemetryState) {
        self.telemetry = state;
    }

    /// Telemetry for `id`, if it is the machine currently being polled.
    pub fn telemetry_for(&self, id: MachineId) -> Option<&TelemetryState> {
        (self.telemetry.key == Some(id)).then_some(&self.telemetry)
    }

    pub fn machine_status(&self, id: MachineId) -> MachineStatus {
        self.telemetry_for(id)
            .map(MachineStatus::from_state)
            .unwrap_or(MachineStatus::Unknown)
    }

    // -- navigation ----------------------------------------------------------

    pub fn select_next(&mut self) {
        if self.machines.is_empty() {
            return;
        }
        let i = match self.list_state.selected() {
            Some(i) => (i + 1).min(self.machines.len() - 1),
            None => 0,
        };
        self.list_state.select(Some(i));
    }

    pub fn select_previous(&mut self) {
        if self.machines.is_empty() {
            return;
        }
        let i = match self.list_state.selected() {
            Some(i) => i.saturating_sub(1),
            None => 0,
        };
        self.list_state.select(Some(i));
    }

    pub fn select_first(&mut self) {
        if !self.machines.is_empty() {
            self.list_state.select(Some(0));
        }
    }

    pub fn select_last(&mut self) {
        if !self.machines.is_empty() {
            self.list_state.select(Some(self.machines.len() - 1));
        }
    }
}
