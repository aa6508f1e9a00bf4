//! Status icons for CLI output

use crate::infrastructure::vsphere::types::{EntityStatus, PowerState};

pub struct StatusIcon;

impl StatusIcon {
    pub const SUCCESS: &'static str = "✓";

    pub const WARNING: &'static str = "⚠";

    pub const ERROR: &'static str = "✗";

    pub const UNKNOWN: &'static str = "?";

    /// Powered on
    pub const RUNNING: &'static str = "▶";

    /// Powered off
    pub const STOPPED: &'static str = "■";

    /// Suspended
    pub const PAUSED: &'static str = "⏸";

    pub fn status_icon(status: EntityStatus) -> &'static str {
        match status {
            EntityStatus::Green => Self::SUCCESS,
            EntityStatus::Yellow => Self::WARNING,
            EntityStatus::Red => Self::ERROR,
            EntityStatus::Gray => Self::UNKNOWN,
        }
    }

    pub fn power_icon(state: PowerState) -> &'static str {
        match state {
            PowerState::PoweredOn => Self::RUNNING,
            PowerState::PoweredOff => Self::STOPPED,
            PowerState::Suspended => Self::PAUSED,
        }
    }

    /// Row kind marker used by `list-vms`: v(m), t(emplate) or d(irectory)
    pub fn entry_kind(is_folder: bool, is_template: bool) -> &'static str {
        if is_folder {
            "d"
        } else if is_template {
            "t"
        } else {
            "v"
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_icon() {
        assert_eq!(StatusIcon::status_icon(EntityStatus::Green), StatusIcon::SUCCESS);
        assert_eq!(StatusIcon::status_icon(EntityStatus::Yellow), StatusIcon::WARNING);
        assert_eq!(StatusIcon::status_icon(EntityStatus::Red), StatusIcon::ERROR);
        assert_eq!(StatusIcon::status_icon(EntityStatus::Gray), StatusIcon::UNKNOWN);
    }

    #[test]
    fn test_entry_kind() {
        assert_eq!(StatusIcon::entry_kind(true, false), "d");
        assert_eq!(StatusIcon::entry_kind(false, true), "t");
        assert_eq!(StatusIcon::entry_kind(false, false), "v");
    }
}
