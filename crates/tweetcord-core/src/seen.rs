use std::collections::HashMap;

use crate::domain::PostId;

/// Per-account high-water marks of delivered posts.
///
/// Process lifetime only: after a restart the first post fetched for each
/// account is treated as new.
#[derive(Debug, Default)]
pub struct SeenTracker {
    marks: HashMap<String, PostId>,
}

impl SeenTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns true and records `id` when it is strictly above the stored mark
    /// (or no mark exists). Otherwise returns false without mutating.
    pub fn should_deliver(&mut self, account: &str, id: PostId) -> bool {
        match self.marks.get_mut(account) {
            Some(mark) if *mark >= id => false,
            Some(mark) => {
                *mark = id;
                true
            }
            None => {
                self.marks.insert(account.to_string(), id);
                true
            }
        }
    }

    pub fn mark(&self, account: &str) -> Option<PostId> {
        self.marks.get(account).copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn equal_and_lower_ids_are_rejected() {
        let mut seen = SeenTracker::new();
        assert!(seen.should_deliver("a", PostId(5)));
        assert!(!seen.should_deliver("a", PostId(5)));
        assert!(!seen.should_deliver("a", PostId(3)));
        assert_eq!(seen.mark("a"), Some(PostId(5)));
        assert!(seen.should_deliver("a", PostId(7)));
        assert_eq!(seen.mark("a"), Some(PostId(7)));
    }

    #[test]
    fn marks_are_per_account() {
        let mut seen = SeenTracker::new();
        assert!(seen.should_deliver("a", PostId(100)));
        assert!(seen.should_deliver("b", PostId(1)));
        assert_eq!(seen.mark("a"), Some(PostId(100)));
        assert_eq!(seen.mark("b"), Some(PostId(1)));
        assert_eq!(seen.mark("c"), None);
    }
}
