//! Arena configuration parameters.

use crate::error::ArenaError;
use crate::tag::WORD_SIZE;

/// Configuration for the arena allocator.
///
/// Controls the arena's fixed capacity and whether live allocations are
/// attributed to labels. Validated at construction; all values are
/// immutable after creation.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ArenaConfig {
    /// Total arena size in bytes.
    ///
    /// Default: 1 MiB. Rounded down to a multiple of [`WORD_SIZE`] when the
    /// arena is created; must be at least [`ArenaConfig::MIN_CAPACITY`].
    /// The arena never grows past this size.
    pub capacity: u32,

    /// Whether allocation labels are recorded for diagnostics.
    ///
    /// When disabled, labels passed to `allocate` are ignored and every
    /// chunk lists as `"unknown"`.
    pub debug_tracking: bool,
}

impl ArenaConfig {
    /// Default arena size: 1 MiB.
    pub const DEFAULT_CAPACITY: u32 = 1024 * 1024;

    /// Smallest capacity that can hold one allocation: header word,
    /// offset word and footer word.
    pub const MIN_CAPACITY: u32 = 3 * WORD_SIZE;

    /// Create a config for an arena of `capacity` bytes with debug
    /// tracking enabled.
    pub fn new(capacity: u32) -> Self {
        Self {
            capacity,
            debug_tracking: true,
        }
    }

    /// Enable or disable label tracking.
    pub fn with_debug_tracking(mut self, enabled: bool) -> Self {
        self.debug_tracking = enabled;
        self
    }

    /// Capacity actually managed by the arena: `capacity` rounded down to
    /// whole words.
    pub fn effective_capacity(&self) -> u32 {
        self.capacity - self.capacity % WORD_SIZE
    }

    /// Check that the configuration describes a usable arena.
    pub fn validate(&self) -> Result<(), ArenaError> {
        if self.effective_capacity() < Self::MIN_CAPACITY {
            return Err(ArenaError::InvalidConfig {
                reason: format!(
                    "capacity must be at least {} bytes (got {})",
                    Self::MIN_CAPACITY,
                    self.capacity,
                ),
            });
        }
        Ok(())
    }
}

impl Default for ArenaConfig {
    fn default() -> Self {
        Self::new(Self::DEFAULT_CAPACITY)
    }
}
