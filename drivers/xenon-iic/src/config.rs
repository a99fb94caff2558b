// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 KylinSoft Co., Ltd. <https://www.kylinos.cn/>
// See LICENSES for license details.

use crate::{iic::MAX_CPUS, prio::NR_IRQS};

/// Runtime parameters of one controller instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IicConfig {
    /// Number of hardware threads with an IIC register block.
    pub cpu_count: usize,
    /// Pending register reads allowed while draining a core at bring-up.
    /// Bring-up fails if none of them reads idle, so a core can shed at most
    /// `drain_spin_limit - 1` stale codes.
    pub drain_spin_limit: usize,
    /// Upper bound on live virtual IRQ mappings.
    pub max_mappings: usize,
}

impl IicConfig {
    /// Six hardware threads, a generous drain bound and a full domain.
    pub const fn new() -> Self {
        Self {
            cpu_count: MAX_CPUS,
            drain_spin_limit: 0x10_0000,
            max_mappings: NR_IRQS,
        }
    }

    /// Sets the number of hardware threads, clamped to `1..=MAX_CPUS`.
    ///
    /// Core 0 always exists: it routes the bridge and takes every
    /// peripheral interrupt.
    pub const fn with_cpu_count(mut self, cpu_count: usize) -> Self {
        self.cpu_count = if cpu_count > MAX_CPUS {
            MAX_CPUS
        } else if cpu_count == 0 {
            1
        } else {
            cpu_count
        };
        self
    }

    /// Sets the bound on pending register reads while draining a core. See
    /// [`IicConfig::drain_spin_limit`].
    pub const fn with_drain_spin_limit(mut self, limit: usize) -> Self {
        self.drain_spin_limit = limit;
        self
    }

    /// Caps the number of live virtual IRQ mappings in the domain.
    pub const fn with_max_mappings(mut self, max: usize) -> Self {
        self.max_mappings = max;
        self
    }
}

impl Default for IicConfig {
    fn default() -> Self {
        Self::new()
    }
}
