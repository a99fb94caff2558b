#![cfg(test)]

use std::{
    cell::{Cell, RefCell},
    collections::VecDeque,
};

use xenon_iic::MmioOps;

use super::*;

/// Transport that records traffic and answers from a canned cache.
#[derive(Default)]
struct MockTransport {
    sent: RefCell<Vec<SmcMessage>>,
    waited: RefCell<Vec<u8>>,
    cache: RefCell<ReplyCache>,
}

impl SmcTransport for MockTransport {
    fn send(&self, msg: &SmcMessage) -> SmcResult {
        self.sent.borrow_mut().push(*msg);
        Ok(())
    }

    fn await_reply(&self, msg: &SmcMessage) -> SmcResult {
        if msg.expects_reply() {
            self.waited.borrow_mut().push(msg.command());
        }
        Ok(())
    }

    fn take_reply(&self, out: &mut SmcMessage) -> bool {
        *out = SmcMessage::default();
        false
    }

    fn cached_lookup(&self, msg: &mut SmcMessage) -> bool {
        self.cache.borrow().lookup(msg)
    }
}

#[test]
fn test_message_layout() {
    let msg = SmcMessage::new(&[0x82, 0x04, 0x30]);
    assert_eq!(msg.command(), 0x82);
    assert!(!msg.expects_reply());
    assert_eq!(&msg.as_bytes()[..4], &[0x82, 0x04, 0x30, 0x00]);
    assert_eq!(msg.payload().len(), 15);
    assert!(SmcMessage::new(&[0x04]).expects_reply());

    let words = msg.words();
    assert_eq!(words[0], 0x0030_0482);
    assert_eq!(SmcMessage::from_words(words), msg);
}

#[test]
fn test_reply_cache_store_and_lookup() {
    let mut cache = ReplyCache::new();
    let mut reply = SmcMessage::new(&[0x04]);
    reply.payload_mut().copy_from_slice(&[1, 2, 3, 4, 5, 6, 7, 8, 9, 10, 11, 12, 13, 14, 15]);
    assert!(cache.store(&reply));

    let mut query = SmcMessage::new(&[0x04]);
    assert!(cache.lookup(&mut query));
    assert_eq!(query, reply);
}

#[test]
fn test_reply_cache_drops_unknown_commands() {
    let mut cache = ReplyCache::new();
    assert!(!cache.store(&SmcMessage::new(&[0x05, 0xaa])));
    let mut query = SmcMessage::new(&[0x05]);
    assert!(!cache.lookup(&mut query));
    assert_eq!(query, SmcMessage::new(&[0x05]));
    assert!(ReplyCache::is_cached(0x83));
    assert!(!ReplyCache::is_cached(0x82));
}

#[test]
fn test_client_fire_and_forget_helpers() {
    let client = SmcClient::new(MockTransport::default());
    client.show_logo().unwrap();
    client.restart().unwrap();
    client.power_off().unwrap();

    let sent = client.transport().sent.borrow();
    assert_eq!(
        *sent,
        [
            SmcMessage::new(&[0x99, 0x01, 0x63]),
            SmcMessage::new(&[0x82, 0x04, 0x30]),
            SmcMessage::new(&[0x82, 0x01, 0x00]),
        ]
    );
    assert!(client.transport().waited.borrow().is_empty());
}

#[test]
fn test_client_message_wait_fills_from_cache() {
    let transport = MockTransport::default();
    transport
        .cache
        .borrow_mut()
        .store(&SmcMessage::new(&[0x12, 0x41, 0x02, 0x03]));
    let client = SmcClient::new(transport);

    let mut msg = SmcMessage::new(&[0x12]);
    assert_eq!(client.message_wait(&mut msg), Ok(true));
    assert_eq!(msg, SmcMessage::new(&[0x12, 0x41, 0x02, 0x03]));
    assert_eq!(*client.transport().waited.borrow(), [0x12]);

    let mut unknown = SmcMessage::new(&[0x05, 0x01]);
    assert_eq!(client.message_wait(&mut unknown), Ok(false));
    assert_eq!(unknown, SmcMessage::new(&[0x05, 0x01]));
}

const IRQ_STATUS: usize = 0x50;
const IRQ_ACK: usize = 0x58;
const TX_DATA: usize = 0x80;
const TX_STATUS: usize = 0x84;
const RX_DATA: usize = 0x90;
const RX_STATUS: usize = 0x94;

const SPIN_LIMIT: usize = 32;

/// SMC FIFO window with a transmit side that is ready unless told otherwise.
#[derive(Default)]
struct FakeFifo {
    tx_busy: Cell<bool>,
    status_reads: Cell<usize>,
    irq_status: Cell<u32>,
    rx: RefCell<VecDeque<u32>>,
    writes: RefCell<Vec<(usize, u32)>>,
}

impl FakeFifo {
    fn queue_reply(&self, reply: SmcMessage) {
        self.rx.borrow_mut().extend(reply.words());
        self.irq_status.set(0x1000_0000);
    }
}

impl MmioOps for FakeFifo {
    fn read_be64(&self, _offset: usize) -> u64 {
        unreachable!()
    }

    fn write_be64(&self, _offset: usize, _value: u64) {
        unreachable!()
    }

    fn read_le32(&self, offset: usize) -> u32 {
        match offset {
            IRQ_STATUS => self.irq_status.get(),
            TX_STATUS => {
                self.status_reads.set(self.status_reads.get() + 1);
                if self.tx_busy.get() { 0 } else { 0x4 }
            }
            RX_STATUS if !self.rx.borrow().is_empty() => 0x4,
            RX_DATA => self.rx.borrow_mut().pop_front().unwrap_or(0),
            _ => 0,
        }
    }

    fn write_le32(&self, offset: usize, value: u32) {
        self.writes.borrow_mut().push((offset, value));
        if offset == IRQ_ACK {
            self.irq_status.set(self.irq_status.get() & !value);
        }
    }

    fn barrier(&self) {}
}

#[test]
fn test_fifo_send_writes_four_words() {
    let fifo = SmcFifo::new(FakeFifo::default(), SPIN_LIMIT);
    let msg = SmcMessage::new(&[0x99, 0x01, 0x63]);
    fifo.send(&msg).unwrap();

    let words = msg.words();
    assert_eq!(
        *fifo.mmio().writes.borrow(),
        [
            (TX_STATUS, 0x4),
            (TX_DATA, words[0]),
            (TX_DATA, words[1]),
            (TX_DATA, words[2]),
            (TX_DATA, words[3]),
            (TX_STATUS, 0),
        ]
    );
}

#[test]
fn test_fifo_irq_caches_reply() {
    let fifo = SmcFifo::new(FakeFifo::default(), SPIN_LIMIT);
    let reply = SmcMessage::new(&[0x07, 0x30, 0x31]);
    fifo.mmio().queue_reply(reply);

    assert_eq!(fifo.handle_irq(), Some(reply));
    assert_eq!(fifo.last_reply(), 0x07);
    assert_eq!(fifo.mmio().irq_status.get(), 0);

    // The reply is already here, so waiting returns at once.
    let mut query = SmcMessage::new(&[0x07]);
    assert_eq!(fifo.await_reply(&query), Ok(()));
    assert!(fifo.cached_lookup(&mut query));
    assert_eq!(query, reply);
}

#[test]
fn test_fifo_irq_without_reply() {
    let fifo = SmcFifo::new(FakeFifo::default(), SPIN_LIMIT);
    fifo.mmio().irq_status.set(0x1);
    assert_eq!(fifo.handle_irq(), None);
    assert_eq!(fifo.mmio().writes.borrow().last(), Some(&(IRQ_ACK, 0x1)));

    let mut out = SmcMessage::new(&[0xff; 16]);
    assert!(!fifo.take_reply(&mut out));
    assert_eq!(out, SmcMessage::default());
}

#[test]
fn test_fifo_reply_wait_is_bounded() {
    // No interrupt ever delivers the reply.
    let client = SmcClient::new(SmcFifo::new(FakeFifo::default(), SPIN_LIMIT));
    let mut msg = SmcMessage::new(&[0x07]);
    assert_eq!(
        client.message_wait(&mut msg),
        Err(SmcError::ReplyTimeout {
            command: 0x07,
            spins: SPIN_LIMIT,
        })
    );
    assert_eq!(msg, SmcMessage::new(&[0x07]));
}

#[test]
fn test_fifo_reply_after_send_releases_waiter() {
    let client = SmcClient::new(SmcFifo::new(FakeFifo::default(), SPIN_LIMIT));
    let fifo = client.transport();
    fifo.mmio().queue_reply(SmcMessage::new(&[0x12, 0x41]));
    fifo.handle_irq();

    // A stale reply from before the send does not count.
    let msg = SmcMessage::new(&[0x12]);
    fifo.send(&msg).unwrap();
    assert_eq!(fifo.last_reply(), 0);
    assert!(fifo.await_reply(&msg).is_err());

    fifo.mmio().queue_reply(SmcMessage::new(&[0x12, 0x42]));
    assert!(fifo.handle_irq().is_some());
    assert_eq!(fifo.await_reply(&msg), Ok(()));

    let mut query = msg;
    assert!(fifo.cached_lookup(&mut query));
    assert_eq!(query, SmcMessage::new(&[0x12, 0x42]));
}

#[test]
fn test_fifo_send_gives_up_when_busy() {
    let fifo = SmcFifo::new(FakeFifo::default(), SPIN_LIMIT);
    fifo.mmio().tx_busy.set(true);

    assert_eq!(
        fifo.send(&SmcMessage::new(&[0x82, 0x01])),
        Err(SmcError::FifoBusy { spins: SPIN_LIMIT })
    );
    assert_eq!(fifo.mmio().status_reads.get(), SPIN_LIMIT);
    assert!(fifo.mmio().writes.borrow().is_empty());
}

#[test]
fn test_no_reply_commands_never_wait() {
    let fifo = SmcFifo::new(FakeFifo::default(), 0);
    assert_eq!(fifo.await_reply(&SmcMessage::new(&[0x82, 0x04, 0x30])), Ok(()));
}
