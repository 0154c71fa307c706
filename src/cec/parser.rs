//! Frame classification against a fixed, ordered rule table
//!
//! Rules are evaluated top to bottom and the first match wins, so a frame
//! produces at most one action. Frames no rule matches are dropped.

use serde::Serialize;
use tracing::trace;

use super::encoder::CecCommand;
use super::frame::{frames, Direction, RawFrame};
use super::SemanticEvent;

/// What the session should do with a classified frame
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "action", content = "value", rename_all = "snake_case")]
pub enum FrameAction {
    /// Forward to the state machine
    Event(SemanticEvent),
    /// Write a reply to the adapter immediately, without producing an event
    Reply(CecCommand),
}

/// Frame matcher used by a [`Rule`]
#[derive(Debug, Clone, Copy)]
pub enum Pattern {
    /// Exact byte prefix, yielding a fixed action
    Prefix {
        bytes: &'static [u8],
        action: FrameAction,
    },
    /// Broadcast routing opcode whose last operand pair is a physical
    /// address `X0:00`, yielding `InputSwitched(X)`
    RoutedPort {
        opcode: u8,
        operand_lens: &'static [usize],
    },
}

/// One entry of the classification table
#[derive(Debug, Clone, Copy)]
pub struct Rule {
    pub name: &'static str,
    /// Required direction, `None` matches both
    pub direction: Option<Direction>,
    pub pattern: Pattern,
}

/// Broadcast logical address used as the destination of routing messages
const BROADCAST: u8 = 0x0f;

/// Default classification table
pub const DEFAULT_RULES: &[Rule] = &[
    // The adapter announcing its OSD name as "CEC"; answer with "RPi"
    Rule {
        name: "osd-name",
        direction: None,
        pattern: Pattern::Prefix {
            bytes: &[0x10, 0x47, 0x43, 0x45, 0x43],
            action: FrameAction::Reply(CecCommand::SetOsdName),
        },
    },
    Rule {
        name: "standby-broadcast",
        direction: Some(Direction::Received),
        pattern: Pattern::Prefix {
            bytes: &[0x0f, 0x36],
            action: FrameAction::Event(SemanticEvent::PowerOff),
        },
    },
    Rule {
        name: "power-on",
        direction: Some(Direction::Received),
        pattern: Pattern::Prefix {
            bytes: &[0x01, 0x90, 0x00],
            action: FrameAction::Event(SemanticEvent::PowerOn),
        },
    },
    Rule {
        name: "power-standby",
        direction: Some(Direction::Received),
        pattern: Pattern::Prefix {
            bytes: &[0x01, 0x90, 0x01],
            action: FrameAction::Event(SemanticEvent::PowerStandby),
        },
    },
    // Routing Change carries old and new address; the short form only the new one
    Rule {
        name: "routing-change",
        direction: Some(Direction::Received),
        pattern: Pattern::RoutedPort {
            opcode: 0x80,
            operand_lens: &[2, 4],
        },
    },
    Rule {
        name: "set-stream-path",
        direction: Some(Direction::Received),
        pattern: Pattern::RoutedPort {
            opcode: 0x86,
            operand_lens: &[2],
        },
    },
];

impl Rule {
    /// Try this rule against a frame
    pub fn apply(&self, frame: &RawFrame) -> Option<FrameAction> {
        if self.direction.is_some_and(|d| d != frame.direction) {
            return None;
        }

        match self.pattern {
            Pattern::Prefix { bytes, action } => frame.starts_with(bytes).then_some(action),
            Pattern::RoutedPort {
                opcode,
                operand_lens,
            } => {
                if frame.header() != BROADCAST || frame.opcode() != Some(opcode) {
                    return None;
                }
                let operands = frame.operands();
                if !operand_lens.contains(&operands.len()) {
                    return None;
                }
                input_port(&operands[operands.len() - 2..])
                    .map(|port| FrameAction::Event(SemanticEvent::InputSwitched(port)))
            }
        }
    }
}

/// Extract X from a physical address `X0:00`, accepting inputs 1 through 9
fn input_port(addr: &[u8]) -> Option<u8> {
    match addr {
        [hi, 0x00] if hi & 0x0f == 0 => {
            let port = hi >> 4;
            (1..=9).contains(&port).then_some(port)
        }
        _ => None,
    }
}

/// Stateless classifier turning adapter output into [`FrameAction`]s
#[derive(Debug, Clone, Copy)]
pub struct LineParser {
    rules: &'static [Rule],
}

impl LineParser {
    pub fn new() -> Self {
        Self {
            rules: DEFAULT_RULES,
        }
    }

    pub fn with_rules(rules: &'static [Rule]) -> Self {
        Self { rules }
    }

    /// Classify a single frame
    pub fn classify(&self, frame: &RawFrame) -> Option<FrameAction> {
        let matched = self
            .rules
            .iter()
            .find_map(|rule| rule.apply(frame).map(|action| (rule.name, action)));

        match matched {
            Some((rule, action)) => {
                trace!(%frame, rule, ?action, "Frame matched");
                Some(action)
            }
            None => {
                trace!(%frame, "Frame ignored");
                None
            }
        }
    }

    /// Lazily classify every frame found in a chunk, in arrival order
    pub fn parse<'a>(&self, chunk: &'a str) -> impl Iterator<Item = FrameAction> + 'a {
        let parser = *self;
        frames(chunk).filter_map(move |frame| parser.classify(&frame))
    }
}

impl Default for LineParser {
    fn default() -> Self {
        Self::new()
    }
}
