// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 KylinSoft Co., Ltd. <https://www.kylinos.cn/>
// See LICENSES for license details.

//! Per-core pending/ack/EOI protocol.
//!
//! A core's block moves through idle, pending (a code latched), dispatched
//! (code consumed by [`CpuInterface::claim`]) and back to idle on
//! [`CpuInterface::eoi`]. Routine accesses only ever touch the calling core's
//! own block; the one cross-core path is the IPI dispatch register, and that
//! is written on the *sending* core's block.

use crate::{
    error::{IicError, IicResult},
    ipi::{CpuMask, dispatch_word},
    prio::{CODE_MASK, IDLE, Priority},
    regs::{MmioOps, iic::*},
};

/// Hardware threads with an IIC block.
pub const MAX_CPUS: usize = 6;

/// The controller window, shared by all cores.
pub struct Iic<'a, M> {
    mmio: &'a M,
    cpu_count: usize,
}

impl<'a, M: MmioOps> Iic<'a, M> {
    pub fn new(mmio: &'a M, cpu_count: usize) -> Self {
        Self { mmio, cpu_count }
    }

    pub fn cpu_count(&self) -> usize {
        self.cpu_count
    }

    /// Register block of `cpu`.
    pub fn cpu(&self, cpu: usize) -> IicResult<CpuInterface<'a, M>> {
        if cpu >= self.cpu_count {
            return Err(IicError::InvalidCpu(cpu));
        }
        Ok(CpuInterface {
            mmio: self.mmio,
            cpu,
        })
    }

    /// Clears the ack register of every core so a freshly unmasked line is
    /// seen by whichever core observes it first.
    pub fn clear_ack_all(&self) {
        for cpu in 0..self.cpu_count {
            self.mmio.write_be64(cpu * CPU_STRIDE + EOI_PRI, 0);
        }
    }
}

/// One core's register block.
pub struct CpuInterface<'a, M> {
    mmio: &'a M,
    cpu: usize,
}

impl<M: MmioOps> CpuInterface<'_, M> {
    pub fn id(&self) -> usize {
        self.cpu
    }

    #[inline]
    fn read(&self, reg: usize) -> u64 {
        self.mmio.read_be64(self.cpu * CPU_STRIDE + reg)
    }

    #[inline]
    fn write(&self, reg: usize, value: u64) {
        self.mmio.write_be64(self.cpu * CPU_STRIDE + reg, value)
    }

    /// Programs the block and drains whatever was latched before the core
    /// came online. Returns the number of stale codes drained.
    ///
    /// The drain reads the pending register until it reports idle, at most
    /// `drain_limit` times. If every one of those reads returned a code, the
    /// block is reported as [`IicError::DrainTimeout`] with `spins` equal to
    /// the number of reads made.
    pub fn init(&self, drain_limit: usize) -> IicResult<usize> {
        info!("xenon IIC: init on cpu {}", self.cpu);
        self.write(SPURIOUS_VECTOR, IDLE as u64);
        self.write(CURRENT_TASK_PRIORITY, 0);
        self.write(WHO_AM_I, CpuMask::of(self.cpu).bits());

        let mut drained = 0;
        loop {
            if drained >= drain_limit {
                return Err(IicError::DrainTimeout {
                    cpu: self.cpu,
                    spins: drained,
                });
            }
            let pending = self.read(ACK);
            if pending == IDLE as u64 {
                break;
            }
            trace!("xenon IIC: cpu {} drained stale {pending:#x}", self.cpu);
            drained += 1;
            core::hint::spin_loop();
        }
        self.write(EOI_PRI, 0);
        Ok(drained)
    }

    /// Consumes the highest pending code and raises the task priority so no
    /// further code is latched until EOI.
    ///
    /// The priority write must retire before anything else can be latched,
    /// hence the barrier and read-back.
    pub fn claim(&self) -> u8 {
        let code = (self.read(ACK) & CODE_MASK) as u8;
        self.write(CURRENT_TASK_PRIORITY, IDLE as u64);
        self.mmio.barrier();
        self.read(CURRENT_TASK_PRIORITY);
        code
    }

    /// Signals end of interrupt and re-arms the core.
    ///
    /// The read-back forces the posted EOI write out before interrupts are
    /// re-enabled at the core.
    pub fn eoi(&self) {
        self.write(EOI_PRI, 0);
        self.mmio.barrier();
        self.read(CURRENT_TASK_PRIORITY);
    }

    /// Retires a claimed code nobody will handle.
    pub fn local_eoi(&self) {
        self.write(EOI, 0);
        self.eoi();
    }

    /// Raises `prio` on every core in `targets`.
    pub fn trigger_ipi(&self, targets: CpuMask, prio: Priority) {
        self.write(IPI_DISPATCH, dispatch_word(targets, prio));
    }
}
