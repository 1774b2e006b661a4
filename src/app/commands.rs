//! Inbound broker commands.
//!
//! Payloads are matched exactly: `sw1:0` .. `sw4:1`, `sw1234:0|1`, `ping`.
//! Anything else, including surrounding whitespace, is not a command.

use super::switch_bank::SwitchId;

/// Commands the broker can send to the device.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    SetSwitch(SwitchId, bool),
    SetAll(bool),
    Ping,
}

impl Command {
    pub fn parse(text: &str) -> Option<Self> {
        if text == "ping" {
            return Some(Self::Ping);
        }

        let (target, value) = text.split_once(':')?;
        let on = match value {
            "0" => false,
            "1" => true,
            _ => return None,
        };

        match target {
            "sw1234" => Some(Self::SetAll(on)),
            "sw1" | "sw2" | "sw3" | "sw4" => {
                let n = target.as_bytes()[2] - b'0';
                SwitchId::from_number(n).map(|id| Self::SetSwitch(id, on))
            }
            _ => None,
        }
    }
}
