// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 KylinSoft Co., Ltd. <https://www.kylinos.cn/>
// See LICENSES for license details.

use core::sync::atomic::{AtomicU64, Ordering};

use crate::{
    IicConfig,
    ack::side_channel_acks,
    domain::{Handler, IrqChip, IrqDomain, NodeId, Virq},
    error::{IicError, IicResult},
    iic::{CpuInterface, Iic},
    ipi::{CpuMask, IpiMessage, IpiTarget, message_from_raw},
    prio::{IDLE, Priority},
    regs::{MmioOps, XenonWindows},
    route::Bridge,
};

/// State of one Xenon interrupt controller.
///
/// Owns the register windows, the virtual IRQ domain and the set of cores
/// that have been brought online. Platform code creates exactly one of these
/// at boot and shares it by reference.
pub struct XenonIic<M> {
    windows: XenonWindows<M>,
    config: IicConfig,
    domain: IrqDomain,
    online: AtomicU64,
}

impl<M: MmioOps> XenonIic<M> {
    /// Wraps the controller found at descriptor node `host`.
    pub fn new(windows: XenonWindows<M>, config: IicConfig, host: NodeId) -> Self {
        Self {
            windows,
            config,
            domain: IrqDomain::new(host, config.max_mappings),
            online: AtomicU64::new(0),
        }
    }

    pub fn config(&self) -> &IicConfig {
        &self.config
    }

    pub fn windows(&self) -> &XenonWindows<M> {
        &self.windows
    }

    pub fn domain(&self) -> &IrqDomain {
        &self.domain
    }

    pub fn iic(&self) -> Iic<'_, M> {
        Iic::new(&self.windows.iic, self.config.cpu_count)
    }

    pub fn bridge(&self) -> Bridge<'_, M> {
        Bridge::new(&self.windows.bridge, &self.windows.biu)
    }

    fn cpu(&self, cpu: usize) -> IicResult<CpuInterface<'_, M>> {
        self.iic().cpu(cpu)
    }

    /// Boot-time bring-up: bridge setup, every routed line detached, then
    /// core 0 online.
    pub fn init(&self) -> IicResult {
        info!("xenon IIC: init");
        let bridge = self.bridge();
        bridge.init();
        bridge.disconnect_all();
        self.init_cpu(0)
    }

    /// Brings `cpu`'s block online and marks the core as an IPI target.
    pub fn init_cpu(&self, cpu: usize) -> IicResult {
        let drained = self.cpu(cpu)?.init(self.config.drain_spin_limit)?;
        if drained > 0 {
            debug!("xenon IIC: cpu {cpu} drained {drained} stale interrupts");
        }
        self.online
            .fetch_or(CpuMask::of(cpu).bits(), Ordering::AcqRel);
        Ok(())
    }

    pub fn online_cpus(&self) -> CpuMask {
        CpuMask::from_bits_retain(self.online.load(Ordering::Acquire))
    }

    /// Asks `cpu`'s block what fired.
    ///
    /// Returns the virtual IRQ to dispatch, or `None` when nothing is pending
    /// or the code has no handler. Unhandled codes are retired here so they
    /// cannot re-assert forever.
    pub fn poll_pending(&self, cpu: usize) -> Option<Virq> {
        let iic = match self.cpu(cpu) {
            Ok(iic) => iic,
            Err(e) => {
                warn!("xenon IIC: poll on {e}");
                return None;
            }
        };
        let code = iic.claim();
        if code == IDLE {
            return None;
        }

        for ack in side_channel_acks(code) {
            ack.apply(&self.windows);
        }

        match self
            .domain
            .find_mapping(code as usize)
            .filter(|&virq| self.domain.has_handler(virq))
        {
            Some(virq) => Some(virq),
            None => {
                warn!("IRQ {code:#04x} unhandled, doing local EOI");
                iic.local_eoi();
                None
            }
        }
    }

    /// Polls `cpu`, runs the handler of whatever fired and ends the interrupt.
    pub fn dispatch(&self, cpu: usize) -> Option<Virq> {
        let virq = self.poll_pending(cpu)?;
        trace!("IRQ: {virq:#04x} on cpu {cpu}");
        if !self.domain.handle(virq) {
            debug!("Undispatched IRQ {virq:#04x}");
        }
        self.eoi(cpu);
        Some(virq)
    }

    /// Detaches the bridge slots of `code`.
    pub fn mask(&self, code: u8) {
        self.bridge().disconnect(code);
    }

    /// Reconnects the bridge slots of `code` and clears every core's ack.
    pub fn unmask(&self, code: u8) {
        self.bridge().connect(code);
        self.iic().clear_ack_all();
    }

    /// Ends the interrupt in service on `cpu`.
    pub fn eoi(&self, cpu: usize) {
        match self.cpu(cpu) {
            Ok(iic) => iic.eoi(),
            Err(e) => warn!("xenon IIC: eoi on {e}"),
        }
    }

    /// Maps `prio`, installs `handler` and unmasks the line.
    pub fn request_irq(&self, prio: Priority, handler: Handler) -> IicResult<Virq> {
        let virq = self.domain.create_mapping(prio.code() as usize)?;
        self.domain.register_handler(virq, handler)?;
        self.irq_unmask(virq);
        Ok(virq)
    }

    /// Registers the handler for an IPI message class.
    ///
    /// Failure is not fatal; the class is then never delivered this boot.
    pub fn request_ipi_class(
        &self,
        msg: IpiMessage,
        name: &str,
        handler: Handler,
    ) -> IicResult<Virq> {
        let prio = msg.priority();
        self.request_irq(prio, handler).inspect_err(|e| {
            error!(
                "xenon_request_ipi: failed to map IPI{:#04x} ({name}): {e}",
                prio.code()
            )
        })
    }

    /// [`XenonIic::request_ipi_class`] for a host message number.
    ///
    /// # Panics
    ///
    /// Panics if `raw` is not a known message.
    pub fn request_ipi_raw(&self, raw: usize, name: &str, handler: Handler) -> IicResult<Virq> {
        self.request_ipi_class(message_from_raw(raw), name, handler)
    }

    /// Sends `msg` from `src` to `target`.
    pub fn cause_ipi(&self, src: usize, target: IpiTarget, msg: IpiMessage) -> IicResult {
        let iic = self.cpu(src)?;
        let prio = msg.priority();
        match target {
            IpiTarget::Cpu(dest) => {
                if dest >= self.config.cpu_count {
                    return Err(IicError::InvalidCpu(dest));
                }
                iic.trigger_ipi(CpuMask::of(dest), prio);
            }
            IpiTarget::AllOnline => {
                for dest in self.online_cpus().cpus() {
                    iic.trigger_ipi(CpuMask::of(dest), prio);
                }
            }
        }
        Ok(())
    }

    /// Resolves `hw` on behalf of a consumer that found it under `node`.
    ///
    /// Only the node this controller was created for is served.
    pub fn irq_of_node(&self, node: NodeId, hw: usize) -> Option<Virq> {
        if !self.domain.matches(node) {
            return None;
        }
        self.domain.create_mapping(hw).ok()
    }
}

impl<M: MmioOps> IrqChip for XenonIic<M> {
    fn name(&self) -> &'static str {
        " XENON-PIC "
    }

    fn irq_mask(&self, virq: Virq) {
        if let Some(code) = self.domain.hwirq(virq) {
            self.mask(code);
        }
    }

    fn irq_unmask(&self, virq: Virq) {
        if let Some(code) = self.domain.hwirq(virq) {
            self.unmask(code);
        }
    }

    fn irq_eoi(&self, cpu: usize, _virq: Virq) {
        self.eoi(cpu);
    }
}
