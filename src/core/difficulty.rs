use log::{info, warn};
use serde::{Deserialize, Serialize};
use std::time::Duration;

const DEFAULT_CEILING: u32 = 6;
const DEFAULT_RESET_TO: u32 = 4;
const DEFAULT_FAST_BLOCK_SECS: u64 = 10;
const DEFAULT_SLOW_BLOCK_SECS: u64 = 5;

/// Thresholds for the per-block difficulty adjustment
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DifficultySettings {
    /// A parent at or above this difficulty is reset before adjusting
    pub ceiling: u32,
    /// Value the ceiling guard resets to
    pub reset_to: u32,
    /// Blocks arriving sooner than this raise the difficulty
    pub fast_block_secs: u64,
    /// Blocks arriving later than this lower the difficulty
    pub slow_block_secs: u64,
}

impl Default for DifficultySettings {
    fn default() -> Self {
        Self {
            ceiling: DEFAULT_CEILING,
            reset_to: DEFAULT_RESET_TO,
            fast_block_secs: DEFAULT_FAST_BLOCK_SECS,
            slow_block_secs: DEFAULT_SLOW_BLOCK_SECS,
        }
    }
}

/// Difficulty adjustment applied each time a block is built on a parent
pub struct DifficultyAdjustment;

impl DifficultyAdjustment {
    /// Next difficulty from the parent's difficulty and timestamps in
    /// milliseconds.
    ///
    /// Guards run first (ceiling reset, then floor), then one time check:
    /// faster than `fast_block_secs` adds one, otherwise slower than
    /// `slow_block_secs` subtracts one. The fast check is evaluated first, so
    /// with the default thresholds any gap of ten seconds or more lowers the
    /// difficulty and anything shorter raises it.
    pub fn adjust(
        settings: &DifficultySettings,
        current_difficulty: u32,
        previous_timestamp: i64,
        now: i64,
    ) -> u32 {
        let elapsed = Self::elapsed(previous_timestamp, now);
        let mut difficulty = current_difficulty;

        if difficulty >= settings.ceiling {
            difficulty = settings.reset_to;
            warn!("High difficulty {current_difficulty} reset to {difficulty}");
        } else if difficulty == 0 {
            info!("Difficulty cannot be less than 0, kept at 0");
        }

        if elapsed < Duration::from_secs(settings.fast_block_secs) {
            difficulty += 1;
            info!(
                "Time since last block {}ms, difficulty increased to {difficulty}",
                elapsed.as_millis()
            );
        } else if elapsed > Duration::from_secs(settings.slow_block_secs) {
            difficulty = difficulty.saturating_sub(1);
            info!(
                "Time since last block {}ms, difficulty decreased to {difficulty}",
                elapsed.as_millis()
            );
        }

        difficulty
    }

    /// Clock skew that puts `now` before the parent counts as zero elapsed.
    fn elapsed(previous_timestamp: i64, now: i64) -> Duration {
        let millis = now.saturating_sub(previous_timestamp).max(0);
        Duration::from_millis(millis as u64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const PARENT: i64 = 1_700_000_000_000;

    fn adjust(current: u32, elapsed_ms: i64) -> u32 {
        DifficultyAdjustment::adjust(
            &DifficultySettings::default(),
            current,
            PARENT,
            PARENT + elapsed_ms,
        )
    }

    #[test]
    fn test_fast_blocks_increase_difficulty() {
        assert_eq!(adjust(3, 1_000), 4);
        assert_eq!(adjust(3, 9_999), 4);
    }

    #[test]
    fn test_slow_blocks_decrease_difficulty() {
        assert_eq!(adjust(3, 10_000), 2);
        assert_eq!(adjust(3, 60_000), 2);
    }

    #[test]
    fn test_ceiling_resets_before_time_adjustment() {
        // 6 -> 4, then +1 for a fast block
        assert_eq!(adjust(6, 1_000), 5);
        // 9 -> 4, then -1 for a slow block
        assert_eq!(adjust(9, 30_000), 3);
    }

    #[test]
    fn test_floor_holds_at_zero() {
        assert_eq!(adjust(0, 30_000), 0);
        assert_eq!(adjust(0, 1_000), 1);
    }

    #[test]
    fn test_clock_skew_counts_as_fast() {
        assert_eq!(adjust(2, -5_000), 3);
    }

    #[test]
    fn test_custom_settings() {
        let settings = DifficultySettings {
            ceiling: 3,
            reset_to: 1,
            fast_block_secs: 2,
            slow_block_secs: 1,
        };
        assert_eq!(
            DifficultyAdjustment::adjust(&settings, 3, PARENT, PARENT + 500),
            2
        );
        assert_eq!(
            DifficultyAdjustment::adjust(&settings, 2, PARENT, PARENT + 5_000),
            1
        );
    }
}
