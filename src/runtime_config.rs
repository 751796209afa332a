//! Environment variable-based runtime configuration.
//!
//! ## Environment Variables
//!
//! - `APIDRIFT_SCAN_WORKERS` — number of worker coroutines per layer scan
//!   (default: 4). Extraction is embarrassingly parallel across files, so
//!   this scales with available cores.
//! - `APIDRIFT_STACK_SIZE` — stack size for scan coroutines in bytes,
//!   decimal (`65536`) or hexadecimal (`0x10000`). Default: `0x10000` (64 KB).

use std::env;

/// Runtime configuration loaded from environment variables.
#[derive(Debug, Clone, Copy)]
pub struct RuntimeConfig {
    /// Number of scan worker coroutines (default: 4)
    pub scan_workers: usize,
    /// Stack size for scan coroutines in bytes (default: 64 KB / 0x10000)
    pub stack_size: usize,
}

impl RuntimeConfig {
    /// Load configuration from environment variables.
    pub fn from_env() -> Self {
        let scan_workers = env::var("APIDRIFT_SCAN_WORKERS")
            .ok()
            .and_then(|s| s.parse().ok())
            .filter(|n| *n > 0)
            .unwrap_or(4);

        let stack_size = match env::var("APIDRIFT_STACK_SIZE") {
            Ok(val) => {
                if let Some(hex) = val.strip_prefix("0x") {
                    usize::from_str_radix(hex, 16).unwrap_or(0x10000)
                } else {
                    val.parse().unwrap_or(0x10000)
                }
            }
            Err(_) => 0x10000,
        };

        RuntimeConfig {
            scan_workers,
            stack_size,
        }
    }
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        RuntimeConfig {
            scan_workers: 4,
            stack_size: 0x10000,
        }
    }
}
