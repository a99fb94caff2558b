// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 KylinSoft Co., Ltd. <https://www.kylinos.cn/>
// See LICENSES for license details.

//! External interrupt handling on top of the Xenon IIC.

use core::ptr::NonNull;

use lazyinit::LazyInit;
use memory_addr::{PhysAddr, VirtAddr};
use xenon_iic::{
    Handler, IicConfig, IicError, IicResult, IpiMessage, IpiTarget, IrqChip, MmioOps, MmioRegion,
    Priority, Virq, XenonIic, XenonWindows,
};

use crate::{
    config::{devices::*, plat::*},
    dtb::DescriptorTree,
};

static IIC: LazyInit<XenonIic<MmioRegion>> = LazyInit::new();

/// Services the controller glue needs from the kernel.
#[crate_interface::def_interface]
pub trait XenonCpuIf {
    /// Index of the hardware thread running the caller.
    fn this_cpu_id() -> usize;

    /// Runs the kernel's receiver for an IPI message.
    fn handle_ipi(msg: IpiMessage);
}

/// Index of the current core.
#[inline]
pub fn current_cpu() -> usize {
    crate_interface::call_interface!(XenonCpuIf::this_cpu_id)
}

fn ipi_call_function() {
    crate_interface::call_interface!(XenonCpuIf::handle_ipi, IpiMessage::CallFunction);
}

fn ipi_call_function_single() {
    crate_interface::call_interface!(XenonCpuIf::handle_ipi, IpiMessage::CallFunctionSingle);
}

fn ipi_reschedule() {
    crate_interface::call_interface!(XenonCpuIf::handle_ipi, IpiMessage::Reschedule);
}

#[cfg(feature = "debugger")]
fn ipi_debugger_break() {
    crate_interface::call_interface!(XenonCpuIf::handle_ipi, IpiMessage::DebuggerBreak);
}

/// IPI classes wired at boot, with their names and receivers.
pub const IPI_CLASSES: &[(IpiMessage, &str, Handler)] = &[
    (IpiMessage::CallFunction, "IPI-call", ipi_call_function),
    (IpiMessage::Reschedule, "IPI-resched", ipi_reschedule),
    (
        IpiMessage::CallFunctionSingle,
        "IPI-call-single",
        ipi_call_function_single,
    ),
];

/// Runtime configuration derived from the platform constants.
pub const fn iic_config() -> IicConfig {
    IicConfig::new()
        .with_cpu_count(CPU_NUM)
        .with_drain_spin_limit(IIC_DRAIN_SPIN_LIMIT)
        .with_max_mappings(MAX_IRQ_MAPPINGS)
}

#[inline]
const fn phys_to_virt(paddr: PhysAddr) -> VirtAddr {
    VirtAddr::from_usize(paddr.as_usize() + PHYS_VIRT_OFFSET)
}

pub(crate) fn map_window(paddr: PhysAddr, size: usize) -> IicResult<MmioRegion> {
    let vaddr = phys_to_virt(paddr);
    let base = NonNull::new(vaddr.as_mut_ptr()).ok_or(IicError::BadRegisterWindow)?;
    debug!("xenon: map {paddr:#x}+{size:#x} at {vaddr:#x}");
    Ok(unsafe { MmioRegion::new(base, size) })
}

/// Finds the controller in `tree`, maps its windows through `map` and
/// brings it up on the boot core.
pub fn probe_controller<M: MmioOps>(
    tree: &impl DescriptorTree,
    mut map: impl FnMut(PhysAddr, usize) -> IicResult<M>,
) -> IicResult<XenonIic<M>> {
    let found = tree.find_interrupt_controller()?;
    info!("xenon IIC: controller at {:#x}", found.reg);

    let windows = XenonWindows {
        iic: map(found.reg, IIC_SIZE)?,
        bridge: map(PhysAddr::from(BRIDGE_PADDR), BRIDGE_SIZE)?,
        biu: map(PhysAddr::from(BIU_PADDR), BIU_SIZE)?,
        graphics: map(PhysAddr::from(GRAPHICS_PADDR), GRAPHICS_SIZE)?,
    };
    let iic = XenonIic::new(windows, iic_config(), found.node);
    iic.init()?;
    Ok(iic)
}

/// Registers every class in [`IPI_CLASSES`] with `iic`, plus the debugger
/// break when that feature is on.
///
/// A class that cannot be mapped is logged and skipped.
pub fn request_ipis_on<M: MmioOps>(iic: &XenonIic<M>) {
    for &(msg, name, handler) in IPI_CLASSES {
        let _ = iic.request_ipi_class(msg, name, handler);
    }
    #[cfg(feature = "debugger")]
    let _ = iic.request_ipi_class(IpiMessage::DebuggerBreak, "IPI-debug", ipi_debugger_break);
}

/// Boot-time controller bring-up, reporting failures.
pub fn try_init_controller(tree: &impl DescriptorTree) -> IicResult {
    if IIC.is_inited() {
        return Err(IicError::AlreadyInitialized);
    }
    let iic = probe_controller(tree, map_window)?;
    IIC.init_once(iic);
    Ok(())
}

/// Boot-time controller bring-up.
///
/// # Panics
///
/// Panics if the controller cannot be found or brought up, or if it was
/// already initialized.
pub fn init_controller(tree: &impl DescriptorTree) {
    if let Err(e) = try_init_controller(tree) {
        panic!("xenon IIC: {e}");
    }
}

/// The controller instance.
pub fn controller() -> &'static XenonIic<MmioRegion> {
    &IIC
}

/// Brings a secondary core's controller block online.
///
/// # Panics
///
/// Panics if the core cannot be brought up.
pub fn init_secondary(cpu: usize) {
    if let Err(e) = IIC.init_cpu(cpu) {
        panic!("xenon IIC: {e}");
    }
}

/// Handles the pending external interrupt of the current core.
///
/// Returns the dispatched virtual IRQ, if any.
pub fn dispatch_irq() -> Option<Virq> {
    IIC.dispatch(current_cpu())
}

/// Installs `handler` for `prio` and unmasks it.
pub fn register_handler(prio: Priority, handler: Handler) -> bool {
    match IIC.request_irq(prio, handler) {
        Ok(virq) => {
            trace!("reg_handler handler IRQ {virq:#x}");
            true
        }
        Err(e) => {
            warn!("reg_handler handler for IRQ {prio:?} failed: {e}");
            false
        }
    }
}

pub fn mask(virq: Virq) {
    IIC.irq_mask(virq);
}

pub fn unmask(virq: Virq) {
    IIC.irq_unmask(virq);
}

pub fn eoi(virq: Virq) {
    IIC.irq_eoi(current_cpu(), virq);
}

/// Wires the IPI classes to the kernel's receivers.
pub fn request_ipis() {
    request_ipis_on(&*IIC);
}

/// Sends `msg` from the current core.
pub fn cause_ipi(target: IpiTarget, msg: IpiMessage) {
    if let Err(e) = IIC.cause_ipi(current_cpu(), target, msg) {
        warn!("xenon IIC: cause_ipi {msg:?} to {target:?}: {e}");
    }
}
