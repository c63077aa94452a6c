//! Alert thresholds: more than 3 events in an hour warns; a component
//! degraded for over 24 hours is critical.

use std::collections::BTreeSet;

use chrono::{Duration, Utc};
use serde::{Deserialize, Serialize};

use super::tracker::DegradationTracker;

const WARNING_EVENTS_PER_HOUR: usize = 3;
const CRITICAL_HOURS: i64 = 24;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AlertLevel {
    Warning,
    Critical,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DegradationAlert {
    pub level: AlertLevel,
    pub component: String,
    pub message: String,
}

pub fn evaluate_alerts(tracker: &DegradationTracker) -> Vec<DegradationAlert> {
    let components: BTreeSet<&str> = tracker
        .events()
        .iter()
        .map(|e| e.component.as_str())
        .collect();

    components
        .into_iter()
        .filter_map(|component| {
            if let Some(since) = tracker.degraded_since(component) {
                if Utc::now() - since > Duration::hours(CRITICAL_HOURS) {
                    return Some(DegradationAlert {
                        level: AlertLevel::Critical,
                        component: component.to_string(),
                        message: format!(
                            "{component} degraded for over {CRITICAL_HOURS} hours"
                        ),
                    });
                }
            }
            let recent = tracker.count_recent(component, Duration::hours(1));
            (recent > WARNING_EVENTS_PER_HOUR).then(|| DegradationAlert {
                level: AlertLevel::Warning,
                component: component.to_string(),
                message: format!("{component} degraded {recent} times in the last hour"),
            })
        })
        .collect()
}
