// Worker constants (No magic values)
use std::time::Duration;

/// Sleep duration when no task is eligible (1s)
pub const IDLE_DELAY: Duration = Duration::from_millis(1000);

/// Re-arm delay after a task settled, drains bursts without a hot spin (100ms)
pub const REARM_DELAY: Duration = Duration::from_millis(100);

/// Sleep duration after an engine error before the next claim (5s)
pub const ERROR_RECOVERY_DELAY: Duration = Duration::from_secs(5);

/// Per-attempt handler deadline (60s)
pub const HANDLER_TIMEOUT: Duration = Duration::from_secs(60);

/// Pause between stop and start on restart (1s)
pub const RESTART_PAUSE: Duration = Duration::from_secs(1);

/// Lost-race budget for a single claim before yielding to the next cycle
pub const MAX_CLAIM_ATTEMPTS: usize = 8;
