//! Small state machines behind taps, timers and scrolling

use std::time::{Duration, Instant};

use rand::Rng;

use crate::models::Movie;

/// Inactivity window for the logo tap gesture
pub const TAP_WINDOW: Duration = Duration::from_millis(2000);
/// Tap counts that open the admin panel
pub const UNLOCK_TAPS: std::ops::RangeInclusive<u32> = 5..=7;
/// Banner auto-advance period
pub const BANNER_INTERVAL: Duration = Duration::from_millis(6000);
/// Splash screen dismissal
pub const SPLASH_DELAY: Duration = Duration::from_millis(1500);
/// Hard limit on the loading state
pub const LOADING_FAILSAFE: Duration = Duration::from_millis(3000);
/// Below this offset the nav bar is always shown
pub const NAV_TOP_THRESHOLD: f32 = 50.0;
/// Scroll distance that flips nav visibility
pub const NAV_SCROLL_DELTA: f32 = 20.0;

/// Hidden admin gesture: a burst of taps on the logo.
///
/// State is the running count plus the deadline of the single pending
/// timeout. Every tap pushes the deadline out by [`TAP_WINDOW`].
#[derive(Debug, Clone, Default)]
pub struct TapUnlock {
    count: u32,
    deadline: Option<Instant>,
}

impl TapUnlock {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a tap; true when this tap unlocks the admin panel
    pub fn tap(&mut self, now: Instant) -> bool {
        self.expire(now);
        self.count += 1;
        self.deadline = Some(now + TAP_WINDOW);

        if UNLOCK_TAPS.contains(&self.count) {
            log::info!("Admin gesture recognised after {} taps", self.count);
            self.clear();
            return true;
        }
        false
    }

    /// Timeout: drop the running count once the window has passed
    pub fn expire(&mut self, now: Instant) {
        if self.deadline.is_some_and(|d| now >= d) {
            self.clear();
        }
    }

    pub fn clear(&mut self) {
        self.count = 0;
        self.deadline = None;
    }

    pub fn count(&self) -> u32 {
        self.count
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }
}

/// Auto-advancing banner index
#[derive(Debug, Clone, Default)]
pub struct BannerRotator {
    index: usize,
    len: usize,
    revision: Option<u64>,
    next_due: Option<Instant>,
}

impl BannerRotator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Bind to the current banner sequence. A new sequence restarts the timer;
    /// an empty one stops it.
    pub fn sync(&mut self, len: usize, revision: u64, now: Instant) {
        if self.revision == Some(revision) && self.len == len {
            return;
        }
        self.revision = Some(revision);
        self.len = len;
        if self.index >= len {
            self.index = 0;
        }
        self.next_due = (len > 0).then(|| now + BANNER_INTERVAL);
    }

    /// Advance once per elapsed period
    pub fn tick(&mut self, now: Instant) -> bool {
        let mut advanced = false;
        while let Some(due) = self.next_due {
            if now < due || self.len == 0 {
                break;
            }
            self.index = (self.index + 1) % self.len;
            self.next_due = Some(due + BANNER_INTERVAL);
            advanced = true;
        }
        advanced
    }

    /// Dot control; out-of-range requests are ignored
    pub fn select(&mut self, index: usize) -> bool {
        if index < self.len {
            self.index = index;
            true
        } else {
            false
        }
    }

    pub fn stop(&mut self) {
        self.next_due = None;
    }

    pub fn index(&self) -> usize {
        self.index
    }

    pub fn next_due(&self) -> Option<Instant> {
        self.next_due
    }
}

/// Scroll-driven visibility of the bottom navigation
#[derive(Debug, Clone)]
pub struct NavVisibility {
    visible: bool,
    last_y: f32,
    pending_y: Option<f32>,
    attached: bool,
}

impl Default for NavVisibility {
    fn default() -> Self {
        Self {
            visible: true,
            last_y: 0.0,
            pending_y: None,
            attached: true,
        }
    }
}

impl NavVisibility {
    pub fn new() -> Self {
        Self::default()
    }

    /// Scroll event; returns true when a frame should be requested
    pub fn on_scroll(&mut self, y: f32) -> bool {
        if !self.attached {
            return false;
        }
        let request_frame = self.pending_y.is_none();
        self.pending_y = Some(y);
        request_frame
    }

    /// Animation frame; evaluates the latest offset at most once
    pub fn on_frame(&mut self) -> bool {
        let Some(y) = self.pending_y.take() else {
            return false;
        };
        let before = self.visible;

        if y < NAV_TOP_THRESHOLD {
            self.visible = true;
        } else if y > self.last_y + NAV_SCROLL_DELTA {
            self.visible = false;
        } else if y < self.last_y - NAV_SCROLL_DELTA {
            self.visible = true;
        }
        self.last_y = y;

        before != self.visible
    }

    /// Stop listening; later events are ignored
    pub fn detach(&mut self) {
        self.attached = false;
        self.pending_y = None;
    }

    pub fn is_visible(&self) -> bool {
        self.visible
    }
}

/// Splash screen with a hard failsafe
#[derive(Debug, Clone, Default)]
pub struct LoadingGate {
    loading: bool,
    splash_due: Option<Instant>,
    failsafe_due: Option<Instant>,
}

impl LoadingGate {
    pub fn start(now: Instant) -> Self {
        Self {
            loading: true,
            splash_due: Some(now + SPLASH_DELAY),
            failsafe_due: Some(now + LOADING_FAILSAFE),
        }
    }

    /// Returns true on the tick that leaves the loading state
    pub fn tick(&mut self, now: Instant) -> bool {
        let splash = self.splash_due.is_some_and(|d| now >= d);
        let failsafe = self.failsafe_due.is_some_and(|d| now >= d);
        if splash {
            self.splash_due = None;
        }
        if failsafe {
            self.failsafe_due = None;
        }

        if self.loading && (splash || failsafe) {
            self.loading = false;
            log::debug!("Leaving splash ({})", if splash { "splash timer" } else { "failsafe" });
            return true;
        }
        false
    }

    pub fn cancel(&mut self) {
        self.splash_due = None;
        self.failsafe_due = None;
    }

    pub fn is_loading(&self) -> bool {
        self.loading
    }

    pub fn has_pending_timers(&self) -> bool {
        self.splash_due.is_some() || self.failsafe_due.is_some()
    }
}

/// Uniform random pick; `None` on an empty catalog
pub fn pick_random<'a, R: Rng + ?Sized>(movies: &'a [Movie], rng: &mut R) -> Option<&'a Movie> {
    if movies.is_empty() {
        return None;
    }
    Some(&movies[rng.random_range(0..movies.len())])
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn ms(base: Instant, ms: u64) -> Instant {
        base + Duration::from_millis(ms)
    }

    #[test]
    fn test_five_quick_taps_unlock() {
        let t0 = Instant::now();
        let mut gesture = TapUnlock::new();
        for i in 0..4 {
            assert!(!gesture.tap(ms(t0, i * 300)));
        }
        assert!(gesture.tap(ms(t0, 1200)));
        assert_eq!(gesture.count(), 0);
    }

    #[test]
    fn test_unlock_once_per_burst() {
        let t0 = Instant::now();
        let mut gesture = TapUnlock::new();
        let unlocks = (0..7).filter(|i| gesture.tap(ms(t0, i * 100))).count();
        assert_eq!(unlocks, 1);
        assert_eq!(gesture.count(), 2);
    }

    #[test]
    fn test_gap_restarts_count() {
        let t0 = Instant::now();
        let mut gesture = TapUnlock::new();
        for i in 0..4 {
            gesture.tap(ms(t0, i * 100));
        }
        // Exactly two seconds after the last tap: window has closed
        assert!(!gesture.tap(ms(t0, 300 + 2000)));
        assert_eq!(gesture.count(), 1);
    }

    #[test]
    fn test_expire_resets_count() {
        let t0 = Instant::now();
        let mut gesture = TapUnlock::new();
        gesture.tap(t0);
        gesture.tap(ms(t0, 500));
        gesture.expire(ms(t0, 1000));
        assert_eq!(gesture.count(), 2);
        gesture.expire(ms(t0, 2500));
        assert_eq!(gesture.count(), 0);
        assert!(gesture.deadline().is_none());
    }

    #[test]
    fn test_banner_rotation() {
        let t0 = Instant::now();
        let mut rot = BannerRotator::new();
        rot.sync(3, 1, t0);

        assert!(!rot.tick(ms(t0, 5999)));
        assert!(rot.tick(ms(t0, 6000)));
        assert_eq!(rot.index(), 1);
        assert!(rot.tick(ms(t0, 18000)));
        assert_eq!(rot.index(), 0);
    }

    #[test]
    fn test_banner_new_sequence_restarts_timer() {
        let t0 = Instant::now();
        let mut rot = BannerRotator::new();
        rot.sync(3, 1, t0);
        rot.tick(ms(t0, 6000));
        rot.tick(ms(t0, 12000));
        assert_eq!(rot.index(), 2);

        // Shorter sequence arrives: index falls back, timer restarts
        rot.sync(2, 2, ms(t0, 13000));
        assert_eq!(rot.index(), 0);
        assert!(!rot.tick(ms(t0, 18000)));
        assert!(rot.tick(ms(t0, 19000)));
        assert_eq!(rot.index(), 1);
    }

    #[test]
    fn test_banner_empty_sequence_stops() {
        let t0 = Instant::now();
        let mut rot = BannerRotator::new();
        rot.sync(0, 1, t0);
        assert!(rot.next_due().is_none());
        assert!(!rot.tick(ms(t0, 60000)));
        assert!(!rot.select(0));
    }

    #[test]
    fn test_nav_visibility_rules() {
        let mut nav = NavVisibility::new();

        nav.on_scroll(100.0);
        nav.on_frame();
        assert!(!nav.is_visible());

        // Small upward move: unchanged
        nav.on_scroll(90.0);
        nav.on_frame();
        assert!(!nav.is_visible());

        nav.on_scroll(60.0);
        nav.on_frame();
        assert!(nav.is_visible());

        nav.on_scroll(300.0);
        nav.on_frame();
        assert!(!nav.is_visible());

        nav.on_scroll(10.0);
        nav.on_frame();
        assert!(nav.is_visible());
    }

    #[test]
    fn test_nav_throttled_per_frame() {
        let mut nav = NavVisibility::new();
        assert!(nav.on_scroll(100.0));
        assert!(!nav.on_scroll(200.0));
        assert!(!nav.on_scroll(400.0));
        assert!(nav.on_frame());
        assert!(!nav.is_visible());
        // Nothing new since the last frame
        assert!(!nav.on_frame());
    }

    #[test]
    fn test_nav_detached_ignores_scroll() {
        let mut nav = NavVisibility::new();
        nav.detach();
        assert!(!nav.on_scroll(500.0));
        assert!(!nav.on_frame());
        assert!(nav.is_visible());
    }

    #[test]
    fn test_loading_gate() {
        let t0 = Instant::now();
        let mut gate = LoadingGate::start(t0);
        assert!(gate.is_loading());
        assert!(!gate.tick(ms(t0, 1000)));
        assert!(gate.tick(ms(t0, 1500)));
        assert!(!gate.is_loading());
        assert!(!gate.tick(ms(t0, 3000)));
        assert!(!gate.has_pending_timers());
    }

    #[test]
    fn test_loading_failsafe_alone() {
        let t0 = Instant::now();
        let mut gate = LoadingGate::start(t0);
        gate.splash_due = None;
        assert!(!gate.tick(ms(t0, 2000)));
        assert!(gate.tick(ms(t0, 3000)));
    }

    #[test]
    fn test_pick_random() {
        let mut rng = StdRng::seed_from_u64(7);
        assert!(pick_random(&Vec::<Movie>::new(), &mut rng).is_none());

        let movies: Vec<_> = (0..5).map(|i| Movie::new(&format!("m{}", i), "t", "Movies")).collect();
        for _ in 0..50 {
            let picked = pick_random(&movies, &mut rng).unwrap();
            assert!(movies.iter().any(|m| m.id == picked.id));
        }
    }
}
