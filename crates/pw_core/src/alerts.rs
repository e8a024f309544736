//! Alert (admin notice) queue.
//!
//! # Responsibility
//! - Collect alert messages raised while handling a request.
//! - Render queued alerts as notice markup and clear the queue.
//!
//! # Invariants
//! - Rendering drains the queue; an alert is shown at most once.
//! - Lower priority values render first; equal priorities keep insertion order.

use crate::zen::{self, ZenArg};
use log::debug;
use serde::{Deserialize, Serialize};

/// Priority used when callers do not care about ordering.
pub const DEFAULT_PRIORITY: i32 = 10;

/// Alert class used for success notices.
pub const KIND_UPDATED: &str = "updated";
/// Alert class used for failure notices.
pub const KIND_ERROR: &str = "error";

/// One queued notice.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Alert {
    /// Rendered as the CSS class of the wrapping `div`.
    #[serde(rename = "type")]
    pub kind: String,
    /// Markup placed inside the wrapper as-is.
    pub message: String,
    pub priority: i32,
}

/// Request-scoped queue of alerts.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AlertQueue {
    alerts: Vec<Alert>,
}

impl AlertQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queues an alert.
    pub fn add(&mut self, kind: impl Into<String>, message: impl Into<String>, priority: i32) {
        let alert = Alert {
            kind: kind.into(),
            message: message.into(),
            priority,
        };
        debug!(
            "event=alert_add module=alerts kind={} priority={}",
            alert.kind, alert.priority
        );
        self.alerts.push(alert);
    }

    /// Queues an `updated` alert at the default priority.
    pub fn updated(&mut self, message: impl Into<String>) {
        self.add(KIND_UPDATED, message, DEFAULT_PRIORITY);
    }

    /// Queues an `error` alert ahead of default-priority notices.
    pub fn error(&mut self, message: impl Into<String>) {
        self.add(KIND_ERROR, message, DEFAULT_PRIORITY - 1);
    }

    pub fn alerts(&self) -> &[Alert] {
        &self.alerts
    }

    pub fn len(&self) -> usize {
        self.alerts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.alerts.is_empty()
    }

    /// Renders every alert as `<div class="{kind}">{message}</div>` and
    /// empties the queue.
    pub fn render(&mut self) -> String {
        let mut alerts = std::mem::take(&mut self.alerts);
        alerts.sort_by_key(|alert| alert.priority);

        alerts
            .iter()
            .map(|alert| {
                let selector = format!("div.{}", alert.kind);
                zen::expand(&selector, &[ZenArg::text(alert.message.as_str())]).unwrap_or_default()
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::{AlertQueue, DEFAULT_PRIORITY};

    #[test]
    fn render_orders_by_priority_and_drains() {
        let mut queue = AlertQueue::new();
        queue.add("updated", "<p>second</p>", DEFAULT_PRIORITY);
        queue.add("error", "<p>first</p>", 1);
        queue.add("updated", "<p>third</p>", DEFAULT_PRIORITY);

        let html = queue.render();
        assert_eq!(
            html,
            "<div class=\"error\"><p>first</p></div>\
             <div class=\"updated\"><p>second</p></div>\
             <div class=\"updated\"><p>third</p></div>"
        );
        assert!(queue.is_empty());
        assert_eq!(queue.render(), "");
    }

    #[test]
    fn error_alerts_precede_updates() {
        let mut queue = AlertQueue::new();
        queue.updated("<p>saved</p>");
        queue.error("<p>failed</p>");

        assert_eq!(
            queue.render(),
            "<div class=\"error\"><p>failed</p></div><div class=\"updated\"><p>saved</p></div>"
        );
    }
}
