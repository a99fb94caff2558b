// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 KylinSoft Co., Ltd. <https://www.kylinos.cn/>
// See LICENSES for license details.

//! FIFO transport to the SMC.
//!
//! A message is written as four 32-bit words to the transmit data register
//! while the transmit status register holds the ready bit; replies are read
//! the same way from the receive side. Reply arrival raises the SMC
//! interrupt, whose handler ([`SmcFifo::handle_irq`]) moves the reply into the
//! cache and releases the waiter.
//!
//! Both waits are bounded by the spin limit given at construction: the
//! transmit ready poll and the poll for a reply.

use core::sync::atomic::{AtomicU8, Ordering};

use kspin::SpinNoIrq;
use xenon_iic::MmioOps;

use crate::{SmcError, SmcResult, SmcTransport, cache::ReplyCache, message::SmcMessage};

mod regs {
    pub const IRQ_STATUS: usize = 0x50;
    pub const IRQ_ACK: usize = 0x58;
    pub const TX_DATA: usize = 0x80;
    pub const TX_STATUS: usize = 0x84;
    pub const RX_DATA: usize = 0x90;
    pub const RX_STATUS: usize = 0x94;

    /// FIFO status: ready for a transfer.
    pub const FIFO_READY: u32 = 0x4;
    /// Interrupt status: a reply is waiting.
    pub const IRQ_REPLY: u32 = 0x1000_0000;

    pub const WINDOW_SIZE: usize = 0x100;
}

pub use regs::WINDOW_SIZE;

/// The SMC's FIFO window together with its reply cache.
pub struct SmcFifo<M> {
    mmio: M,
    spin_limit: usize,
    fifo_lock: SpinNoIrq<()>,
    cache: SpinNoIrq<ReplyCache>,
    last_reply: AtomicU8,
}

impl<M: MmioOps> SmcFifo<M> {
    /// Binds the FIFO window. Each wait gives up after `spin_limit` polls.
    pub fn new(mmio: M, spin_limit: usize) -> Self {
        Self {
            mmio,
            spin_limit,
            fifo_lock: SpinNoIrq::new(()),
            cache: SpinNoIrq::new(ReplyCache::new()),
            last_reply: AtomicU8::new(0),
        }
    }

    pub fn mmio(&self) -> &M {
        &self.mmio
    }

    pub fn spin_limit(&self) -> usize {
        self.spin_limit
    }

    /// Command of the most recent reply moved into the cache.
    pub fn last_reply(&self) -> u8 {
        self.last_reply.load(Ordering::Acquire)
    }

    /// SMC interrupt handler: caches a waiting reply and acknowledges the
    /// interrupt. Returns the cached reply, if any.
    pub fn handle_irq(&self) -> Option<SmcMessage> {
        let irqs = self.mmio.read_le32(regs::IRQ_STATUS);
        debug!(
            "xenon_smc_irq() = {irqs:08x},{:08x}",
            self.mmio.read_le32(regs::RX_STATUS)
        );

        let mut reply = None;
        if irqs & regs::IRQ_REPLY != 0 {
            let mut msg = SmcMessage::default();
            if self.take_reply(&mut msg) {
                self.cache.lock().store(&msg);
                self.last_reply.store(msg.command(), Ordering::Release);
                reply = Some(msg);
            }
        }

        self.mmio.write_le32(regs::IRQ_ACK, irqs);
        reply
    }
}

impl<M: MmioOps> SmcTransport for SmcFifo<M> {
    fn send(&self, msg: &SmcMessage) -> SmcResult {
        debug!("_xenon_smc_send: {msg:?}");
        if msg.expects_reply() {
            self.last_reply.store(0, Ordering::Release);
        }

        let _guard = self.fifo_lock.lock();
        let mut spins = 0;
        while self.mmio.read_le32(regs::TX_STATUS) & regs::FIFO_READY == 0 {
            spins += 1;
            if spins >= self.spin_limit {
                return Err(SmcError::FifoBusy { spins });
            }
            core::hint::spin_loop();
        }
        self.mmio.write_le32(regs::TX_STATUS, regs::FIFO_READY);
        for word in msg.words() {
            self.mmio.write_le32(regs::TX_DATA, word);
        }
        self.mmio.write_le32(regs::TX_STATUS, 0);
        Ok(())
    }

    fn await_reply(&self, msg: &SmcMessage) -> SmcResult {
        if !msg.expects_reply() {
            return Ok(());
        }
        let command = msg.command();
        let mut spins = 0;
        while self.last_reply.load(Ordering::Acquire) != command {
            spins += 1;
            if spins >= self.spin_limit {
                warn!("smc: no reply to {command:#04x}");
                return Err(SmcError::ReplyTimeout { command, spins });
            }
            core::hint::spin_loop();
        }
        Ok(())
    }

    fn take_reply(&self, out: &mut SmcMessage) -> bool {
        let _guard = self.fifo_lock.lock();
        if self.mmio.read_le32(regs::RX_STATUS) & regs::FIFO_READY == 0 {
            *out = SmcMessage::default();
            return false;
        }
        self.mmio.write_le32(regs::RX_STATUS, regs::FIFO_READY);
        let words = [(); 4].map(|_| self.mmio.read_le32(regs::RX_DATA));
        self.mmio.write_le32(regs::RX_STATUS, 0);
        *out = SmcMessage::from_words(words);
        true
    }

    fn cached_lookup(&self, msg: &mut SmcMessage) -> bool {
        self.cache.lock().lookup(msg)
    }
}
