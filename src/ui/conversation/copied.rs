use std::time::{Duration, Instant};

/// Transient "Copied!" badge, kept apart from the messages themselves.
/// Only one message carries it at a time; it expires on its own.
#[derive(Debug, Clone)]
pub struct CopiedMarker {
    ttl: Duration,
    current: Option<(usize, Instant)>,
}

impl CopiedMarker {
    pub fn new(ttl: Duration) -> Self {
        Self { ttl, current: None }
    }

    /// Mark `index`, replacing any earlier mark
    pub fn mark(&mut self, index: usize, now: Instant) {
        self.current = Some((index, now + self.ttl));
    }

    /// The marked index, if the mark has not expired at `now`
    pub fn index(&self, now: Instant) -> Option<usize> {
        self.current
            .filter(|&(_, expires_at)| now < expires_at)
            .map(|(index, _)| index)
    }

    /// Drop an expired mark. Returns true when something was cleared.
    pub fn sweep(&mut self, now: Instant) -> bool {
        match self.current {
            Some((_, expires_at)) if now >= expires_at => {
                self.current = None;
                true
            }
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mark_expires_after_ttl() {
        let start = Instant::now();
        let mut marker = CopiedMarker::new(Duration::from_millis(1200));
        marker.mark(3, start);

        assert_eq!(marker.index(start), Some(3));
        assert_eq!(marker.index(start + Duration::from_millis(1199)), Some(3));
        assert_eq!(marker.index(start + Duration::from_millis(1200)), None);

        assert!(!marker.sweep(start + Duration::from_millis(500)));
        assert!(marker.sweep(start + Duration::from_millis(1300)));
        assert_eq!(marker.index(start), None);
    }

    #[test]
    fn later_mark_replaces_and_restarts_timer() {
        let start = Instant::now();
        let mut marker = CopiedMarker::new(Duration::from_millis(1200));
        marker.mark(1, start);
        marker.mark(4, start + Duration::from_millis(1000));

        let later = start + Duration::from_millis(1500);
        assert_eq!(marker.index(later), Some(4));
        assert!(!marker.sweep(later));
    }
}
