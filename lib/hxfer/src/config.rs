/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2025 the hxfer authors.
 */

use std::sync::OnceLock;
use std::time::Duration;

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Process-wide timeout defaults, consulted once when a transfer resource
/// is constructed.
#[derive(Debug, Clone, Copy)]
pub struct TransferDefaults {
    pub connect_timeout: Duration,
    pub transfer_timeout: Duration,
}

impl Default for TransferDefaults {
    fn default() -> Self {
        TransferDefaults {
            connect_timeout: DEFAULT_TIMEOUT,
            transfer_timeout: DEFAULT_TIMEOUT,
        }
    }
}

static DEFAULTS: OnceLock<TransferDefaults> = OnceLock::new();

/// Install process-wide defaults. Effective only before the first resource
/// is constructed; returns false if the defaults were already fixed.
pub fn set_transfer_defaults(defaults: TransferDefaults) -> bool {
    DEFAULTS.set(defaults).is_ok()
}

pub(crate) fn transfer_defaults() -> TransferDefaults {
    DEFAULTS.get().copied().unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_fix_once() {
        let custom = TransferDefaults {
            connect_timeout: Duration::from_secs(30),
            transfer_timeout: Duration::from_secs(30),
        };
        // other tests may have raced us to the cell; either way the second
        // set must be rejected and the stored values must hold
        let _ = set_transfer_defaults(custom);
        assert!(!set_transfer_defaults(TransferDefaults {
            connect_timeout: Duration::from_secs(1),
            transfer_timeout: Duration::from_secs(1),
        }));
        assert_eq!(transfer_defaults().connect_timeout, Duration::from_secs(30));
    }
}
