// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 KylinSoft Co., Ltd. <https://www.kylinos.cn/>
// See LICENSES for license details.

//! The SMC channel, with replies delivered by the controller's SMM line.

use lazyinit::LazyInit;
use memory_addr::PhysAddr;
use xenon_iic::{IicError, IicResult, MmioOps, MmioRegion, Priority, Virq, XenonIic};
use xenon_smc::{SMC_WINDOW_SIZE, SmcClient, SmcFifo};

use crate::{
    config::{devices::SMC_PADDR, plat::SMC_SPIN_LIMIT},
    irq,
};

/// Controller line the SMC raises when a reply is waiting.
pub const SMC_IRQ: Priority = Priority::Smm;

static SMC: LazyInit<SmcFifo<MmioRegion>> = LazyInit::new();

fn smc_irq() {
    SMC.handle_irq();
}

/// Installs the FIFO at `window` and hooks its handler into `iic`.
///
/// The FIFO is in place before the line is unmasked, so the handler never
/// runs without it.
pub fn init_smc_on<M: MmioOps>(iic: &XenonIic<M>, window: MmioRegion) -> IicResult<Virq> {
    if SMC.is_inited() {
        return Err(IicError::AlreadyInitialized);
    }
    SMC.init_once(SmcFifo::new(window, SMC_SPIN_LIMIT));
    let virq = iic.request_irq(SMC_IRQ, smc_irq)?;
    info!("xenon SMC: reply interrupt on virq {virq:#x}");
    Ok(virq)
}

/// Maps the SMC window and attaches it to the controller, reporting failures.
pub fn try_init_smc() -> IicResult<Virq> {
    let window = irq::map_window(PhysAddr::from(SMC_PADDR), SMC_WINDOW_SIZE)?;
    init_smc_on(irq::controller(), window)
}

/// Boot-time SMC bring-up. Runs after [`irq::init_controller`].
///
/// # Panics
///
/// Panics if the reply interrupt cannot be wired or the channel was already
/// initialized.
pub fn init_smc() {
    if let Err(e) = try_init_smc() {
        panic!("xenon SMC: {e}");
    }
}

/// Message client over the interrupt-backed FIFO.
pub fn smc() -> SmcClient<&'static SmcFifo<MmioRegion>> {
    SmcClient::new(&*SMC)
}
