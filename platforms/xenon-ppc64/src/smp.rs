// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 KylinSoft Co., Ltd. <https://www.kylinos.cn/>
// See LICENSES for license details.

//! SMP hooks: message passing, per-core setup and boot probe.

use xenon_iic::{IpiTarget, MmioOps, XenonIic, ipi::message_from_raw};

use crate::{
    config::plat::{BOOT_CPU_ID, CPU_NUM},
    irq,
};

/// Host-side target index to an IPI target; any index past the last core
/// means every online core, the sender included.
pub const fn ipi_target(target: usize) -> IpiTarget {
    if target < CPU_NUM {
        IpiTarget::Cpu(target)
    } else {
        IpiTarget::AllOnline
    }
}

/// [`message_pass`] on an explicit controller and sender.
///
/// # Panics
///
/// Panics if `msg` is not a known message number.
pub fn message_pass_on<M: MmioOps>(iic: &XenonIic<M>, src: usize, target: usize, msg: usize) {
    let msg = message_from_raw(msg);
    let target = ipi_target(target);
    if let Err(e) = iic.cause_ipi(src, target, msg) {
        warn!("smp_xenon_message_pass: {msg:?} to {target:?}: {e}");
    }
}

/// Sends host message number `msg` from the current core to `target`.
pub fn message_pass(target: usize, msg: usize) {
    message_pass_on(irq::controller(), irq::current_cpu(), target, msg);
}

/// Per-core setup; the boot core was brought up with the controller.
pub fn setup_cpu(cpu: usize) {
    if cpu != BOOT_CPU_ID {
        irq::init_secondary(cpu);
    }
}

/// Wires the IPI classes and reports how many cores may be started.
pub fn probe() -> usize {
    irq::request_ipis();
    CPU_NUM
}
