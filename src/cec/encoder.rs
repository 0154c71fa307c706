//! Outbound command encoding for the cec-client text protocol

use std::fmt;

use serde::Serialize;

/// Command intents the gateway can put on the bus
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CecCommand {
    /// Give Device Power Status, addressed to the TV
    PowerQuery,
    /// Switch the TV on
    PowerOn,
    /// Put the TV into standby
    PowerStandby,
    /// Set OSD Name to "RPi"
    SetOsdName,
}

impl CecCommand {
    /// Colon-separated opcode string as written after `tx`
    pub fn opcode(&self) -> &'static str {
        match self {
            CecCommand::PowerQuery => "10:8f",
            CecCommand::PowerOn => "01:90:00",
            CecCommand::PowerStandby => "01:90:01",
            CecCommand::SetOsdName => "10:47:52:50:69",
        }
    }

    /// Full adapter line, newline terminated
    pub fn to_line(&self) -> String {
        format!("tx {}\n", self.opcode())
    }

    /// Command that drives the TV towards the requested power state
    pub fn for_power(on: bool) -> Self {
        if on {
            CecCommand::PowerOn
        } else {
            CecCommand::PowerStandby
        }
    }
}

impl fmt::Display for CecCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "tx {}", self.opcode())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lines() {
        assert_eq!(CecCommand::PowerQuery.to_line(), "tx 10:8f\n");
        assert_eq!(CecCommand::PowerOn.to_line(), "tx 01:90:00\n");
        assert_eq!(CecCommand::PowerStandby.to_line(), "tx 01:90:01\n");
        assert_eq!(CecCommand::SetOsdName.to_line(), "tx 10:47:52:50:69\n");
    }

    #[test]
    fn test_for_power() {
        assert_eq!(CecCommand::for_power(true), CecCommand::PowerOn);
        assert_eq!(CecCommand::for_power(false), CecCommand::PowerStandby);
    }

    #[test]
    fn test_display_has_no_newline() {
        assert_eq!(CecCommand::PowerQuery.to_string(), "tx 10:8f");
    }
}
