// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 KylinSoft Co., Ltd. <https://www.kylinos.cn/>
// See LICENSES for license details.

//! Register windows and their access primitives.
//!
//! The IIC block is big-endian and accessed 64 bits at a time; the bridge and
//! the auxiliary peripheral windows are little-endian 32-bit registers. Every
//! driver access goes through [`MmioOps`] so the controller protocol can run
//! against real hardware ([`MmioRegion`]) or a simulated board.

use core::ptr::NonNull;

/// Per-core IIC register offsets.
pub mod iic {
    /// Distance between two cores' register blocks.
    pub const CPU_STRIDE: usize = 0x1000;
    pub const WHO_AM_I: usize = 0x00;
    pub const CURRENT_TASK_PRIORITY: usize = 0x08;
    pub const IPI_DISPATCH: usize = 0x10;
    /// Destructive read of the highest pending priority.
    pub const ACK: usize = 0x50;
    pub const EOI: usize = 0x60;
    pub const EOI_PRI: usize = 0x68;
    pub const SPURIOUS_VECTOR: usize = 0x70;
    /// Size of the whole controller window.
    pub const WINDOW_SIZE: usize = 0x1_0000;
}

/// Bridge register offsets.
pub mod bridge {
    pub const CONFIG: usize = 0x00;
    pub const TIMEOUT: usize = 0x04;
    pub const ERROR_MASK: usize = 0x0c;
    /// First of the sixteen per-slot routing registers.
    pub const SLOT_BASE: usize = 0x10;
    pub const CLOCK_ACK: usize = 0x106c;
    pub const WINDOW_SIZE: usize = 0x1_0000;
}

/// Bus interface unit register offsets.
pub mod biu {
    pub const BRIDGE_WINDOW: usize = 0x4_0074;
    pub const BRIDGE_TARGET: usize = 0x4_0078;
    pub const IOC_ACK: usize = 0x4_002c;
    pub const WINDOW_SIZE: usize = 0x200_0000;
}

/// Graphics engine register offsets.
pub mod graphics {
    pub const IRQ_ACK: usize = 0xed0;
    pub const IRQ_STATUS: usize = 0x6540;
    pub const WINDOW_SIZE: usize = 0x1_0000;
}

/// Register-level access to one memory-mapped window.
pub trait MmioOps {
    fn read_be64(&self, offset: usize) -> u64;

    fn write_be64(&self, offset: usize, value: u64);

    fn read_le32(&self, offset: usize) -> u32;

    fn write_le32(&self, offset: usize, value: u32);

    /// Full memory barrier ordering all prior accesses before later ones.
    fn barrier(&self);
}

/// A mapped, uncached register window.
#[derive(Debug)]
pub struct MmioRegion {
    base: NonNull<u8>,
    size: usize,
}

// The region is plain device memory; ordering is provided by `barrier`.
unsafe impl Send for MmioRegion {}
unsafe impl Sync for MmioRegion {}

impl MmioRegion {
    /// Wraps an already-mapped window.
    ///
    /// # Safety
    ///
    /// `base..base + size` must be a valid, uncached device mapping for the
    /// whole lifetime of the returned value.
    pub const unsafe fn new(base: NonNull<u8>, size: usize) -> Self {
        Self { base, size }
    }

    pub fn base(&self) -> usize {
        self.base.as_ptr() as usize
    }

    pub fn size(&self) -> usize {
        self.size
    }

    #[inline]
    fn reg<T>(&self, offset: usize) -> *mut T {
        debug_assert!(offset + core::mem::size_of::<T>() <= self.size);
        debug_assert_eq!(offset % core::mem::align_of::<T>(), 0);
        self.base.as_ptr().wrapping_add(offset).cast()
    }
}

impl MmioOps for MmioRegion {
    #[inline]
    fn read_be64(&self, offset: usize) -> u64 {
        u64::from_be(unsafe { self.reg::<u64>(offset).read_volatile() })
    }

    #[inline]
    fn write_be64(&self, offset: usize, value: u64) {
        unsafe { self.reg::<u64>(offset).write_volatile(value.to_be()) }
    }

    #[inline]
    fn read_le32(&self, offset: usize) -> u32 {
        u32::from_le(unsafe { self.reg::<u32>(offset).read_volatile() })
    }

    #[inline]
    fn write_le32(&self, offset: usize, value: u32) {
        unsafe { self.reg::<u32>(offset).write_volatile(value.to_le()) }
    }

    #[inline]
    fn barrier(&self) {
        #[cfg(target_arch = "powerpc64")]
        unsafe {
            core::arch::asm!("sync", options(nostack, preserves_flags))
        };
        #[cfg(not(target_arch = "powerpc64"))]
        core::sync::atomic::fence(core::sync::atomic::Ordering::SeqCst);
    }
}

/// Every window the controller touches.
pub struct XenonWindows<M> {
    /// Per-core IIC blocks, `CPU_STRIDE` apart.
    pub iic: M,
    /// Routing bridge in front of the external interrupt lines.
    pub bridge: M,
    /// Bus interface unit.
    pub biu: M,
    /// Graphics engine.
    pub graphics: M,
}
