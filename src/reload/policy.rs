/// Decides whether a detected source change is reloaded on this poll.
///
/// An idle poll (no queries served since the previous one) reloads at once.
/// Under load the reload is deferred, but for at most `force_after` polls,
/// which bounds staleness without reloading in the middle of a burst.
#[derive(Debug, Clone)]
pub struct ReloadPolicy {
    force_after: u32,
    pending: u32,
}

impl ReloadPolicy {
    pub fn new(force_after: u32) -> Self {
        Self {
            force_after: force_after.max(1),
            pending: 0,
        }
    }

    /// Polls the current change has been waiting.
    pub fn pending(&self) -> u32 {
        self.pending
    }

    pub fn should_reload(&mut self, changed: bool, queries_since_last_poll: u64) -> bool {
        if !changed {
            return false;
        }
        self.pending += 1;
        if queries_since_last_poll == 0 || self.pending >= self.force_after {
            self.pending = 0;
            return true;
        }
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unchanged_source_never_reloads() {
        let mut p = ReloadPolicy::new(10);
        for _ in 0..100 {
            assert!(!p.should_reload(false, 0));
        }
        assert_eq!(p.pending(), 0);
    }

    #[test]
    fn idle_poll_reloads_immediately() {
        let mut p = ReloadPolicy::new(10);
        assert!(p.should_reload(true, 0));
        assert_eq!(p.pending(), 0);
    }

    #[test]
    fn busy_polls_defer_up_to_bound() {
        let mut p = ReloadPolicy::new(10);
        for i in 1..10 {
            assert!(!p.should_reload(true, 5), "poll {} must defer", i);
            assert_eq!(p.pending(), i);
        }
        assert!(p.should_reload(true, 5), "10th busy poll must force");
        assert_eq!(p.pending(), 0);
    }

    #[test]
    fn idle_poll_cuts_deferral_short() {
        let mut p = ReloadPolicy::new(10);
        assert!(!p.should_reload(true, 3));
        assert!(!p.should_reload(true, 1));
        assert!(p.should_reload(true, 0));
    }

    #[test]
    fn zero_bound_behaves_like_one() {
        let mut p = ReloadPolicy::new(0);
        assert!(p.should_reload(true, 100));
    }
}
