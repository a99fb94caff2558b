// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 KylinSoft Co., Ltd. <https://www.kylinos.cn/>
// See LICENSES for license details.

//! Virtual IRQ domain of the controller.
//!
//! The domain is a no-map domain: a virtual IRQ number is the priority code
//! itself. Mappings are created on first request and live for the rest of the
//! boot. The domain is bound to the descriptor node the controller was found
//! at and only answers lookups for that exact node.

use core::sync::atomic::{AtomicBool, Ordering};

use handler_table::HandlerTable;
use kspin::SpinNoIrq;

use crate::{
    error::{IicError, IicResult},
    prio::NR_IRQS,
};

/// Virtual IRQ number.
pub type Virq = usize;

/// Interrupt handler.
pub type Handler = handler_table::Handler;

/// Identity of a node in the platform descriptor tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeId(pub usize);

/// Chip operations the generic dispatcher drives.
pub trait IrqChip {
    fn name(&self) -> &'static str;

    /// Stops delivery of `virq`.
    fn irq_mask(&self, virq: Virq);

    /// Resumes delivery of `virq`.
    fn irq_unmask(&self, virq: Virq);

    /// Ends the interrupt being serviced on `cpu`.
    fn irq_eoi(&self, cpu: usize, virq: Virq);
}

struct MappingState {
    mapped: [bool; NR_IRQS],
    count: usize,
}

pub struct IrqDomain {
    host: NodeId,
    capacity: usize,
    mappings: SpinNoIrq<MappingState>,
    handled: [AtomicBool; NR_IRQS],
    handlers: HandlerTable<NR_IRQS>,
}

impl IrqDomain {
    pub fn new(host: NodeId, capacity: usize) -> Self {
        Self {
            host,
            capacity: capacity.min(NR_IRQS),
            mappings: SpinNoIrq::new(MappingState {
                mapped: [false; NR_IRQS],
                count: 0,
            }),
            handled: [const { AtomicBool::new(false) }; NR_IRQS],
            handlers: HandlerTable::new(),
        }
    }

    pub fn host(&self) -> NodeId {
        self.host
    }

    /// Whether this domain serves `node`.
    pub fn matches(&self, node: NodeId) -> bool {
        node == self.host
    }

    /// Maps hardware code `hw`, returning the existing mapping if there is one.
    pub fn create_mapping(&self, hw: usize) -> IicResult<Virq> {
        if hw >= NR_IRQS {
            return Err(IicError::InvalidHwIrq(hw));
        }
        let mut state = self.mappings.lock();
        if state.mapped[hw] {
            return Ok(hw);
        }
        if state.count >= self.capacity {
            return Err(IicError::MappingExhausted);
        }
        state.mapped[hw] = true;
        state.count += 1;
        trace!("xenon IIC: mapped hwirq {hw:#04x} -> virq {hw}");
        Ok(hw)
    }

    pub fn find_mapping(&self, hw: usize) -> Option<Virq> {
        (hw < NR_IRQS && self.mappings.lock().mapped[hw]).then_some(hw)
    }

    /// Hardware code behind `virq`.
    pub fn hwirq(&self, virq: Virq) -> Option<u8> {
        self.find_mapping(virq).map(|hw| hw as u8)
    }

    pub fn mapping_count(&self) -> usize {
        self.mappings.lock().count
    }

    pub fn register_handler(&self, virq: Virq, handler: Handler) -> IicResult {
        if self.find_mapping(virq).is_none() {
            return Err(IicError::NotMapped(virq));
        }
        if !self.handlers.register_handler(virq, handler) {
            return Err(IicError::AlreadyRegistered(virq));
        }
        self.handled[virq].store(true, Ordering::Release);
        Ok(())
    }

    pub fn has_handler(&self, virq: Virq) -> bool {
        self.handled
            .get(virq)
            .is_some_and(|h| h.load(Ordering::Acquire))
    }

    /// Runs the handler of `virq`. Returns `false` if there is none.
    pub fn handle(&self, virq: Virq) -> bool {
        self.handlers.handle(virq)
    }
}
