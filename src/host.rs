//! Bridge to the hosting chat platform (viewport, colours, haptics)

/// Notification haptic kinds
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotificationKind {
    Success,
    Warning,
    Error,
}

/// Impact haptic strengths
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImpactStyle {
    Light,
    Medium,
    Heavy,
}

/// Host calls used by the app. Every method defaults to a no-op, which is
/// the behaviour when the bridge is unavailable.
pub trait HostBridge {
    fn expand(&mut self) {}
    fn set_header_color(&mut self, _color: &str) {}
    fn set_background_color(&mut self, _color: &str) {}
    fn notification_occurred(&mut self, _kind: NotificationKind) {}
    fn impact_occurred(&mut self, _style: ImpactStyle) {}
    fn open_link(&mut self, _url: &str) {}
}

/// No host available
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopHost;

impl HostBridge for NoopHost {}

/// Logs every host call; used by the headless runner
#[derive(Debug, Default, Clone, Copy)]
pub struct LogHost;

impl HostBridge for LogHost {
    fn expand(&mut self) {
        log::info!("host: expand viewport");
    }

    fn set_header_color(&mut self, color: &str) {
        log::info!("host: header color {}", color);
    }

    fn set_background_color(&mut self, color: &str) {
        log::info!("host: background color {}", color);
    }

    fn notification_occurred(&mut self, kind: NotificationKind) {
        log::info!("host: haptic notification {:?}", kind);
    }

    fn impact_occurred(&mut self, style: ImpactStyle) {
        log::info!("host: haptic impact {:?}", style);
    }

    fn open_link(&mut self, url: &str) {
        log::info!("host: open {}", url);
    }
}
