// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 KylinSoft Co., Ltd. <https://www.kylinos.cn/>
// See LICENSES for license details.

//! Platform configuration module.

/// Platform-level configuration constants
pub mod plat {
    /// Hardware threads: three cores, two threads each.
    pub const CPU_NUM: usize = 6;
    pub const BOOT_CPU_ID: usize = 0;
    pub const PHYS_VIRT_OFFSET: usize = 0xc000_0000_0000_0000;
    /// Non-idle pending reads tolerated while a core drains at bring-up.
    pub const IIC_DRAIN_SPIN_LIMIT: usize = 0x10_0000;
    pub const MAX_IRQ_MAPPINGS: usize = 0x80;
    /// Polls allowed while waiting on the SMC FIFO or for an SMC reply.
    pub const SMC_SPIN_LIMIT: usize = 0x10_0000;
}

/// Device-related configuration constants
pub mod devices {
    pub const IIC_NODE_NAME: &str = "interrupt-controller";
    pub const IIC_COMPATIBLE: &str = "xenon";
    pub const IIC_SIZE: usize = 0x1_0000;

    pub const BRIDGE_PADDR: usize = 0xea00_0000;
    pub const BRIDGE_SIZE: usize = 0x1_0000;
    pub const BIU_PADDR: usize = 0xe100_0000;
    pub const BIU_SIZE: usize = 0x200_0000;
    pub const GRAPHICS_PADDR: usize = 0xec80_0000;
    pub const GRAPHICS_SIZE: usize = 0x1_0000;
    /// SMC FIFO window (PCI function 0x580d, BAR 0).
    pub const SMC_PADDR: usize = 0xea00_1000;
}
