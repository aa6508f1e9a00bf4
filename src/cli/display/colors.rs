//! Color theme for CLI output

use crate::infrastructure::vsphere::types::{EntityStatus, PowerState};
use comfy_table::Color as TableColor;

/// Color theme for terminal output
#[derive(Debug, Clone)]
pub struct ColorTheme {
    pub success: TableColor,
    pub warning: TableColor,
    pub error: TableColor,
    pub info: TableColor,
    pub muted: TableColor,
}

impl Default for ColorTheme {
    fn default() -> Self {
        Self {
            success: TableColor::Green,
            warning: TableColor::Yellow,
            error: TableColor::Red,
            info: TableColor::Cyan,
            muted: TableColor::DarkGrey,
        }
    }
}

impl ColorTheme {
    /// Color for a vCenter health status
    pub fn status_color(&self, status: EntityStatus) -> TableColor {
        match status {
            EntityStatus::Green => self.success,
            EntityStatus::Yellow => self.warning,
            EntityStatus::Red => self.error,
            EntityStatus::Gray => self.muted,
        }
    }

    pub fn power_color(&self, state: PowerState) -> TableColor {
        match state {
            PowerState::PoweredOn => self.success,
            PowerState::Suspended => self.warning,
            PowerState::PoweredOff => self.muted,
        }
    }

    /// Green above 25% free, yellow above 10%, red below
    pub fn free_space_color(&self, free: u64, capacity: u64) -> TableColor {
        if capacity == 0 {
            self.muted
        } else if free * 4 > capacity {
            self.success
        } else if free * 10 > capacity {
            self.warning
        } else {
            self.error
        }
    }
}
