use crate::domain::notification::NotificationEvent;
use std::sync::{Arc, Mutex};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum NotificationPermission {
    #[default]
    NotRequested,
    Granted,
    Denied,
}

/// Platform alert channel.
pub trait NotificationSink: Send + Sync {
    fn deliver(&self, event: &NotificationEvent);
}

/// Forwards events only while permission is granted; otherwise drops them
/// silently.
pub struct PermissionGated<S> {
    inner: S,
    permission: Mutex<NotificationPermission>,
}

impl<S: NotificationSink> PermissionGated<S> {
    pub fn new(inner: S, permission: NotificationPermission) -> Self {
        Self {
            inner,
            permission: Mutex::new(permission),
        }
    }

    pub fn permission(&self) -> NotificationPermission {
        self.permission
            .lock()
            .map(|p| *p)
            .unwrap_or(NotificationPermission::Denied)
    }

    pub fn set_permission(&self, permission: NotificationPermission) {
        if let Ok(mut p) = self.permission.lock() {
            *p = permission;
        }
    }
}

impl<S: NotificationSink> NotificationSink for PermissionGated<S> {
    fn deliver(&self, event: &NotificationEvent) {
        if self.permission() != NotificationPermission::Granted {
            tracing::debug!(title = %event.title, "notification dropped; permission not granted");
            return;
        }
        self.inner.deliver(event);
    }
}

impl<S: NotificationSink + ?Sized> NotificationSink for Arc<S> {
    fn deliver(&self, event: &NotificationEvent) {
        (**self).deliver(event);
    }
}

/// Keeps every delivered event in memory.
#[derive(Debug, Default)]
pub struct RecordingSink {
    events: Mutex<Vec<NotificationEvent>>,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<NotificationEvent> {
        self.events.lock().map(|e| e.clone()).unwrap_or_default()
    }
}

impl NotificationSink for RecordingSink {
    fn deliver(&self, event: &NotificationEvent) {
        if let Ok(mut events) = self.events.lock() {
            events.push(event.clone());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn event() -> NotificationEvent {
        NotificationEvent {
            title: "Signal change: AAPL".into(),
            body: "body".into(),
            urgent: false,
        }
    }

    #[test]
    fn gated_sink_only_delivers_when_granted() {
        let recorder = Arc::new(RecordingSink::new());
        let gated = PermissionGated::new(recorder.clone(), NotificationPermission::NotRequested);

        gated.deliver(&event());
        gated.set_permission(NotificationPermission::Denied);
        gated.deliver(&event());
        assert!(recorder.events().is_empty());

        gated.set_permission(NotificationPermission::Granted);
        gated.deliver(&event());
        assert_eq!(recorder.events(), vec![event()]);
    }
}
