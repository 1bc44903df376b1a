//! Checkpoint tracking for a scenario run

use std::fmt;

const CHECKPOINT_COUNT: usize = 5;

/// One milestone of the smoke scenario, in execution order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Checkpoint {
    Startup,
    Connection,
    ToolListing,
    ReadOperation,
    CreateOperation,
}

impl Checkpoint {
    /// Every checkpoint, in the order the runner executes them
    pub const ALL: [Checkpoint; CHECKPOINT_COUNT] = [
        Checkpoint::Startup,
        Checkpoint::Connection,
        Checkpoint::ToolListing,
        Checkpoint::ReadOperation,
        Checkpoint::CreateOperation,
    ];

    fn index(self) -> usize {
        self as usize
    }

    /// Stable key, as used in reports
    pub fn key(self) -> &'static str {
        match self {
            Checkpoint::Startup => "startup",
            Checkpoint::Connection => "connection",
            Checkpoint::ToolListing => "toolListing",
            Checkpoint::ReadOperation => "readOperation",
            Checkpoint::CreateOperation => "createOperation",
        }
    }

    /// Label shown in the summary table
    pub fn label(self) -> &'static str {
        match self {
            Checkpoint::Startup => "Server startup",
            Checkpoint::Connection => "MCP connection",
            Checkpoint::ToolListing => "Tool listing",
            Checkpoint::ReadOperation => "Read operation",
            Checkpoint::CreateOperation => "Create operation",
        }
    }
}

impl fmt::Display for Checkpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

/// Pass/fail state of every checkpoint
///
/// Starts all-false. A checkpoint can only be marked passed, never reset.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Checkpoints {
    passed: [bool; CHECKPOINT_COUNT],
}

impl Checkpoints {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record that a checkpoint passed
    pub fn mark(&mut self, checkpoint: Checkpoint) {
        self.passed[checkpoint.index()] = true;
    }

    pub fn is_passed(&self, checkpoint: Checkpoint) -> bool {
        self.passed[checkpoint.index()]
    }

    /// True iff every checkpoint passed
    pub fn all_passed(&self) -> bool {
        self.passed.iter().all(|&p| p)
    }

    /// Checkpoints with their state, in execution order
    pub fn iter(&self) -> impl Iterator<Item = (Checkpoint, bool)> + '_ {
        Checkpoint::ALL.iter().map(move |&c| (c, self.is_passed(c)))
    }

    pub fn passed_count(&self) -> usize {
        self.passed.iter().filter(|&&p| p).count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_starts_all_false() {
        let checkpoints = Checkpoints::new();
        assert!(Checkpoint::ALL.iter().all(|&c| !checkpoints.is_passed(c)));
        assert!(!checkpoints.all_passed());
        assert_eq!(checkpoints.passed_count(), 0);
    }

    #[test]
    fn test_overall_is_and_of_all() {
        // Every subset short of the full set fails overall
        for mask in 0u32..(1 << 5) {
            let mut checkpoints = Checkpoints::new();
            for (i, &c) in Checkpoint::ALL.iter().enumerate() {
                if mask & (1 << i) != 0 {
                    checkpoints.mark(c);
                }
            }
            assert_eq!(checkpoints.all_passed(), mask == 0b11111, "mask {mask:05b}");
        }
    }

    #[test]
    fn test_mark_is_idempotent() {
        let mut checkpoints = Checkpoints::new();
        checkpoints.mark(Checkpoint::ToolListing);
        checkpoints.mark(Checkpoint::ToolListing);
        assert!(checkpoints.is_passed(Checkpoint::ToolListing));
        assert_eq!(checkpoints.passed_count(), 1);
    }

    #[test]
    fn test_iter_order_and_keys() {
        let keys: Vec<&str> = Checkpoints::new().iter().map(|(c, _)| c.key()).collect();
        assert_eq!(
            keys,
            ["startup", "connection", "toolListing", "readOperation", "createOperation"]
        );
    }
}
