//! Threshold-alert de-duplication.
//!
//! Each (site, alert kind) pair owns a small state machine:
//! inactive → active → inactive. An alert is raised only on the
//! false→true edge of the threshold predicate, so a breach sustained over
//! many poll cycles produces exactly one notification. The poller task is
//! the single writer.

use std::collections::HashMap;

use chrono::{DateTime, Utc};

use sitepulse_models::{AlertKind, SiteId};

/// Current phase of one alert condition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AlertPhase {
    /// The condition is not present.
    Inactive,
    /// The condition has been present since the recorded instant.
    Active {
        /// When the condition first breached.
        since: DateTime<Utc>,
    },
}

/// What one observation did to the state machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    /// False→true edge: emit an alert.
    Raised,
    /// True→false edge: the condition cleared.
    Cleared,
    /// No edge; stay quiet.
    Unchanged,
}

/// De-duplication state for all sites and alert kinds.
#[derive(Debug, Default)]
pub struct AlertMonitor {
    states: HashMap<(SiteId, AlertKind), AlertPhase>,
}

impl AlertMonitor {
    /// Creates an empty monitor; every condition starts inactive.
    pub fn new() -> Self {
        Self::default()
    }

    /// Feeds one observation into the machine and reports the edge.
    pub fn observe(
        &mut self,
        site_id: &SiteId,
        kind: AlertKind,
        breached: bool,
        now: DateTime<Utc>,
    ) -> Transition {
        let key = (site_id.clone(), kind);
        let phase = self.states.entry(key).or_insert(AlertPhase::Inactive);

        match (*phase, breached) {
            (AlertPhase::Inactive, true) => {
                *phase = AlertPhase::Active { since: now };
                Transition::Raised
            }
            (AlertPhase::Active { .. }, false) => {
                *phase = AlertPhase::Inactive;
                Transition::Cleared
            }
            _ => Transition::Unchanged,
        }
    }

    /// True while the condition is in its active phase.
    pub fn is_active(&self, site_id: &SiteId, kind: AlertKind) -> bool {
        matches!(
            self.states.get(&(site_id.clone(), kind)),
            Some(AlertPhase::Active { .. })
        )
    }
}
