//! Roll lifecycle log
//!
//! Every significant step of a roll is appended to a [`RollLog`]: start,
//! the silent prediction, each rig, the replay, each die settling and the
//! final outcome. The log makes a roll auditable after the fact (what was
//! natural, what was rigged, whether the replay matched).
//!
//! # Example
//!
//! ```rust
//! use dice_box_core_rs::models::{RollEvent, RollLog};
//!
//! let mut log = RollLog::new();
//! log.log(RollEvent::DieRigged {
//!     tick: 0,
//!     die: "die-0".to_string(),
//!     from: 3,
//!     to: 5,
//! });
//!
//! assert_eq!(log.events_for_die("die-0").len(), 1);
//! ```

use crate::dice::DieType;

/// A state change in the dice box
#[derive(Debug, Clone, PartialEq)]
pub enum RollEvent {
    /// A roll began (natural or predicted)
    RollStarted {
        tick: usize,
        roll_id: String,
        seed: i64,
        predicted: bool,
        dice: usize,
    },

    /// The silent pass settled naturally
    PredictionFinished {
        tick: usize,
        roll_id: String,
        natural: Vec<u32>,
    },

    /// The silent pass hit the tick cap; `natural` was read at the cap
    PredictionCapped {
        tick: usize,
        roll_id: String,
        natural: Vec<u32>,
    },

    /// A die's faces were relabeled
    DieRigged {
        tick: usize,
        die: String,
        from: u32,
        to: u32,
    },

    /// The visible replay of a predicted roll began
    ReplayStarted {
        tick: usize,
        roll_id: String,
        seed: i64,
    },

    /// One die came to rest in the visible pass
    DieSettled {
        tick: usize,
        die: String,
        value: Option<u32>,
    },

    /// Every die came to rest; the outcome is final
    RollSettled {
        tick: usize,
        roll_id: String,
        values: Vec<u32>,
        total: u32,
    },

    /// The operator cancelled the roll
    RollStopped { tick: usize, roll_id: String },

    DiceAdded {
        tick: usize,
        die: String,
        die_type: DieType,
    },

    DiceRemoved { tick: usize, die: String },

    DiceCleared { tick: usize, count: usize },

    /// Silent and visible trajectories differed
    ReplayDiverged {
        tick: usize,
        roll_id: String,
        predicted_digest: String,
        replay_digest: String,
    },
}

impl RollEvent {
    /// Tick at which the event happened
    pub fn tick(&self) -> usize {
        match self {
            RollEvent::RollStarted { tick, .. } => *tick,
            RollEvent::PredictionFinished { tick, .. } => *tick,
            RollEvent::PredictionCapped { tick, .. } => *tick,
            RollEvent::DieRigged { tick, .. } => *tick,
            RollEvent::ReplayStarted { tick, .. } => *tick,
            RollEvent::DieSettled { tick, .. } => *tick,
            RollEvent::RollSettled { tick, .. } => *tick,
            RollEvent::RollStopped { tick, .. } => *tick,
            RollEvent::DiceAdded { tick, .. } => *tick,
            RollEvent::DiceRemoved { tick, .. } => *tick,
            RollEvent::DiceCleared { tick, .. } => *tick,
            RollEvent::ReplayDiverged { tick, .. } => *tick,
        }
    }

    pub fn event_type(&self) -> &'static str {
        match self {
            RollEvent::RollStarted { .. } => "RollStarted",
            RollEvent::PredictionFinished { .. } => "PredictionFinished",
            RollEvent::PredictionCapped { .. } => "PredictionCapped",
            RollEvent::DieRigged { .. } => "DieRigged",
            RollEvent::ReplayStarted { .. } => "ReplayStarted",
            RollEvent::DieSettled { .. } => "DieSettled",
            RollEvent::RollSettled { .. } => "RollSettled",
            RollEvent::RollStopped { .. } => "RollStopped",
            RollEvent::DiceAdded { .. } => "DiceAdded",
            RollEvent::DiceRemoved { .. } => "DiceRemoved",
            RollEvent::DiceCleared { .. } => "DiceCleared",
            RollEvent::ReplayDiverged { .. } => "ReplayDiverged",
        }
    }

    /// Die name if the event concerns a single die
    pub fn die(&self) -> Option<&str> {
        match self {
            RollEvent::DieRigged { die, .. } => Some(die),
            RollEvent::DieSettled { die, .. } => Some(die),
            RollEvent::DiceAdded { die, .. } => Some(die),
            RollEvent::DiceRemoved { die, .. } => Some(die),
            _ => None,
        }
    }

    /// Roll id if the event belongs to a roll
    pub fn roll_id(&self) -> Option<&str> {
        match self {
            RollEvent::RollStarted { roll_id, .. } => Some(roll_id),
            RollEvent::PredictionFinished { roll_id, .. } => Some(roll_id),
            RollEvent::PredictionCapped { roll_id, .. } => Some(roll_id),
            RollEvent::ReplayStarted { roll_id, .. } => Some(roll_id),
            RollEvent::RollSettled { roll_id, .. } => Some(roll_id),
            RollEvent::RollStopped { roll_id, .. } => Some(roll_id),
            RollEvent::ReplayDiverged { roll_id, .. } => Some(roll_id),
            _ => None,
        }
    }
}

/// Append-only log of [`RollEvent`]s
#[derive(Debug, Clone, Default)]
pub struct RollLog {
    events: Vec<RollEvent>,
}

impl RollLog {
    pub fn new() -> Self {
        Self { events: Vec::new() }
    }

    pub fn log(&mut self, event: RollEvent) {
        self.events.push(event);
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    pub fn events(&self) -> &[RollEvent] {
        &self.events
    }

    /// Most recent event, if any
    pub fn last(&self) -> Option<&RollEvent> {
        self.events.last()
    }

    pub fn events_at_tick(&self, tick: usize) -> Vec<&RollEvent> {
        self.events.iter().filter(|e| e.tick() == tick).collect()
    }

    pub fn events_of_type(&self, event_type: &str) -> Vec<&RollEvent> {
        self.events
            .iter()
            .filter(|e| e.event_type() == event_type)
            .collect()
    }

    pub fn events_for_die(&self, die: &str) -> Vec<&RollEvent> {
        self.events
            .iter()
            .filter(|e| e.die() == Some(die))
            .collect()
    }

    pub fn events_for_roll(&self, roll_id: &str) -> Vec<&RollEvent> {
        self.events
            .iter()
            .filter(|e| e.roll_id() == Some(roll_id))
            .collect()
    }

    pub fn clear(&mut self) {
        self.events.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn started(tick: usize, roll_id: &str) -> RollEvent {
        RollEvent::RollStarted {
            tick,
            roll_id: roll_id.to_string(),
            seed: 42,
            predicted: true,
            dice: 2,
        }
    }

    #[test]
    fn test_event_tick_and_type() {
        let event = RollEvent::DiceCleared { tick: 7, count: 3 };
        assert_eq!(event.tick(), 7);
        assert_eq!(event.event_type(), "DiceCleared");
        assert_eq!(event.die(), None);
        assert_eq!(event.roll_id(), None);
    }

    #[test]
    fn test_event_die_and_roll() {
        let rigged = RollEvent::DieRigged {
            tick: 0,
            die: "die-1".to_string(),
            from: 2,
            to: 6,
        };
        assert_eq!(rigged.die(), Some("die-1"));
        assert_eq!(started(0, "r1").roll_id(), Some("r1"));
    }

    #[test]
    fn test_log_queries() {
        let mut log = RollLog::new();
        assert!(log.is_empty());

        log.log(started(0, "r1"));
        log.log(RollEvent::DieSettled {
            tick: 40,
            die: "die-0".to_string(),
            value: Some(5),
        });
        log.log(RollEvent::RollSettled {
            tick: 40,
            roll_id: "r1".to_string(),
            values: vec![5],
            total: 5,
        });
        log.log(started(41, "r2"));

        assert_eq!(log.len(), 4);
        assert_eq!(log.events_at_tick(40).len(), 2);
        assert_eq!(log.events_of_type("RollStarted").len(), 2);
        assert_eq!(log.events_for_die("die-0").len(), 1);
        assert_eq!(log.events_for_roll("r1").len(), 2);
        assert_eq!(log.last().map(RollEvent::tick), Some(41));

        log.clear();
        assert!(log.is_empty());
    }
}
