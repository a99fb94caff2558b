#![cfg(test)]

use core::ptr::NonNull;
use std::sync::{Arc, Mutex};

use memory_addr::PhysAddr;
use xenon_iic::{
    CpuMask, IicError, IicResult, IpiMessage, IpiTarget, MmioOps, MmioRegion, NodeId,
    XenonIic, XenonWindows,
    regs::iic as reg,
    sim::{Access, SimBoard, SimWindow, WindowKind},
};

use xenon_smc::{SMC_WINDOW_SIZE, SmcMessage, SmcTransport};

use crate::{
    config::{devices::*, plat::*},
    dtb::{ControllerNode, DescriptorTree, FdtDescriptors, is_controller_node},
    irq::{self, XenonCpuIf, iic_config, probe_controller, request_ipis_on},
    smc::{SMC_IRQ, init_smc_on, smc},
    smp::{ipi_target, message_pass_on},
};

static RECEIVED: Mutex<Vec<IpiMessage>> = Mutex::new(Vec::new());

struct CpuIfImpl;

#[crate_interface::impl_interface]
impl XenonCpuIf for CpuIfImpl {
    fn this_cpu_id() -> usize {
        0
    }

    fn handle_ipi(msg: IpiMessage) {
        RECEIVED.lock().unwrap().push(msg);
    }
}

const IIC_PADDR: usize = 0x200_0005_0000;

struct FakeTree(IicResult<ControllerNode>);

impl DescriptorTree for FakeTree {
    fn find_interrupt_controller(&self) -> IicResult<ControllerNode> {
        self.0
    }
}

fn xenon_tree() -> FakeTree {
    FakeTree(Ok(ControllerNode {
        node: NodeId(3),
        reg: PhysAddr::from(IIC_PADDR),
    }))
}

/// Probes `tree` against a simulated board, recording every mapping request.
fn probe_sim(
    tree: &FakeTree,
    mapped: &mut Vec<(usize, usize)>,
) -> (Arc<SimBoard>, IicResult<XenonIic<SimWindow>>) {
    let board = SimBoard::new();
    let XenonWindows {
        iic,
        bridge,
        biu,
        graphics,
    } = board.windows();
    let mut pool = vec![
        (IIC_PADDR, iic),
        (BRIDGE_PADDR, bridge),
        (BIU_PADDR, biu),
        (GRAPHICS_PADDR, graphics),
    ];
    let result = probe_controller(tree, |paddr: PhysAddr, size| {
        mapped.push((paddr.as_usize(), size));
        let index = pool
            .iter()
            .position(|(base, _)| *base == paddr.as_usize())
            .ok_or(IicError::BadRegisterWindow)?;
        Ok(pool.swap_remove(index).1)
    });
    (board, result)
}

#[test]
fn test_controller_node_match() {
    assert!(is_controller_node("interrupt-controller", ["xenon"].into_iter()));
    assert!(is_controller_node(
        "interrupt-controller@20000050000",
        ["ibm,cell", "xenon"].into_iter()
    ));
    assert!(!is_controller_node("interrupt-controller", ["arm,gic-400"].into_iter()));
    assert!(!is_controller_node("interrupt-controller", core::iter::empty()));
    assert!(!is_controller_node("pic@0", ["xenon"].into_iter()));
}

/// Minimal flattened device tree writer.
#[derive(Default)]
struct DtbBuilder {
    structs: Vec<u8>,
    strings: Vec<u8>,
}

impl DtbBuilder {
    const MAGIC: u32 = 0xd00d_feed;
    const BEGIN_NODE: u32 = 1;
    const END_NODE: u32 = 2;
    const PROP: u32 = 3;
    const END: u32 = 9;

    fn token(&mut self, token: u32) {
        self.structs.extend_from_slice(&token.to_be_bytes());
    }

    fn pad(&mut self) {
        while self.structs.len() % 4 != 0 {
            self.structs.push(0);
        }
    }

    fn begin_node(&mut self, name: &str) -> &mut Self {
        self.token(Self::BEGIN_NODE);
        self.structs.extend_from_slice(name.as_bytes());
        self.structs.push(0);
        self.pad();
        self
    }

    fn end_node(&mut self) -> &mut Self {
        self.token(Self::END_NODE);
        self
    }

    fn prop(&mut self, name: &str, value: &[u8]) -> &mut Self {
        let name_offset = self.strings.len() as u32;
        self.strings.extend_from_slice(name.as_bytes());
        self.strings.push(0);
        self.token(Self::PROP);
        self.token(value.len() as u32);
        self.token(name_offset);
        self.structs.extend_from_slice(value);
        self.pad();
        self
    }

    fn prop_cells(&mut self, name: &str, cells: &[u32]) -> &mut Self {
        let value: Vec<u8> = cells.iter().flat_map(|c| c.to_be_bytes()).collect();
        self.prop(name, &value)
    }

    fn finish(&mut self) -> Vec<u8> {
        self.token(Self::END);
        let header_len = 40;
        let rsvmap_len = 16;
        let off_struct = header_len + rsvmap_len;
        let off_strings = off_struct + self.structs.len();
        let total = off_strings + self.strings.len();

        let header = [
            Self::MAGIC,
            total as u32,
            off_struct as u32,
            off_strings as u32,
            header_len as u32,
            17,
            16,
            0,
            self.strings.len() as u32,
            self.structs.len() as u32,
        ];
        let mut blob: Vec<u8> = header.iter().flat_map(|w| w.to_be_bytes()).collect();
        blob.resize(off_struct, 0);
        blob.extend_from_slice(&self.structs);
        blob.extend_from_slice(&self.strings);
        blob
    }
}

/// A board tree whose controller node carries `controller_props`.
fn xenon_dtb(controller_props: impl FnOnce(&mut DtbBuilder)) -> Vec<u8> {
    let mut dtb = DtbBuilder::default();
    dtb.begin_node("")
        .prop_cells("#address-cells", &[2])
        .prop_cells("#size-cells", &[2])
        .begin_node("cpus")
        .prop_cells("#address-cells", &[1])
        .prop_cells("#size-cells", &[0])
        .end_node()
        .begin_node("interrupt-controller@20000050000");
    controller_props(&mut dtb);
    dtb.end_node().end_node().finish()
}

#[test]
fn test_fdt_finds_controller() {
    let blob = xenon_dtb(|node| {
        node.prop("compatible", b"ibm,xenon-pic\0xenon\0")
            .prop_cells("reg", &[0x200, 0x0005_0000, 0, 0x1_0000]);
    });
    let tree = FdtDescriptors::new(&blob).unwrap();
    assert_eq!(
        tree.find_interrupt_controller(),
        Ok(ControllerNode {
            node: NodeId(2),
            reg: PhysAddr::from(IIC_PADDR),
        })
    );
}

#[test]
fn test_fdt_controller_without_reg() {
    let blob = xenon_dtb(|node| {
        node.prop("compatible", b"xenon\0");
    });
    let tree = FdtDescriptors::new(&blob).unwrap();
    assert_eq!(
        tree.find_interrupt_controller(),
        Err(IicError::BadRegisterWindow)
    );
}

#[test]
fn test_fdt_ignores_other_controllers() {
    let blob = xenon_dtb(|node| {
        node.prop("compatible", b"arm,gic-400\0")
            .prop_cells("reg", &[0x200, 0x0005_0000, 0, 0x1_0000]);
    });
    let tree = FdtDescriptors::new(&blob).unwrap();
    assert_eq!(
        tree.find_interrupt_controller(),
        Err(IicError::ControllerNotFound)
    );
}

#[test]
fn test_iic_config_from_platform() {
    let config = iic_config();
    assert_eq!(config.cpu_count, CPU_NUM);
    assert_eq!(config.drain_spin_limit, IIC_DRAIN_SPIN_LIMIT);
    assert_eq!(config.max_mappings, MAX_IRQ_MAPPINGS);
}

#[test]
fn test_probe_maps_windows_and_brings_up_boot_core() {
    let mut mapped = Vec::new();
    let (board, iic) = probe_sim(&xenon_tree(), &mut mapped);
    let iic = iic.unwrap();

    assert_eq!(
        mapped,
        [
            (IIC_PADDR, IIC_SIZE),
            (BRIDGE_PADDR, BRIDGE_SIZE),
            (BIU_PADDR, BIU_SIZE),
            (GRAPHICS_PADDR, GRAPHICS_SIZE),
        ]
    );
    assert_eq!(iic.online_cpus(), CpuMask::CPU0);
    assert!(iic.domain().matches(NodeId(3)));
    assert!(!iic.domain().matches(NodeId(4)));
    assert_eq!(board.iic_reg(0, reg::WHO_AM_I), 1);
}

#[test]
fn test_probe_without_controller_node() {
    let mut mapped = Vec::new();
    let (_board, iic) = probe_sim(&FakeTree(Err(IicError::ControllerNotFound)), &mut mapped);
    assert_eq!(iic.err(), Some(IicError::ControllerNotFound));
    assert!(mapped.is_empty());
}

#[test]
fn test_try_init_controller_reports_missing_node() {
    let tree = FakeTree(Err(IicError::ControllerNotFound));
    assert_eq!(
        irq::try_init_controller(&tree),
        Err(IicError::ControllerNotFound)
    );
}

#[test]
fn test_request_ipis_maps_each_class() {
    let mut mapped = Vec::new();
    let (_board, iic) = probe_sim(&xenon_tree(), &mut mapped);
    let iic = iic.unwrap();

    request_ipis_on(&iic);

    let domain = iic.domain();
    for code in [0x78, 0x70, 0x10] {
        assert!(domain.has_handler(code), "{code:#x}");
    }
    assert_eq!(domain.has_handler(0x08), cfg!(feature = "debugger"));
}

#[test]
fn test_ipi_target_mapping() {
    assert_eq!(ipi_target(0), IpiTarget::Cpu(0));
    assert_eq!(ipi_target(CPU_NUM - 1), IpiTarget::Cpu(CPU_NUM - 1));
    assert_eq!(ipi_target(CPU_NUM), IpiTarget::AllOnline);
    assert_eq!(ipi_target(usize::MAX), IpiTarget::AllOnline);
}

#[test]
fn test_message_pass_broadcast_includes_sender() {
    let mut mapped = Vec::new();
    let (board, iic) = probe_sim(&xenon_tree(), &mut mapped);
    let iic = iic.unwrap();
    iic.init_cpu(1).unwrap();
    board.clear_accesses();

    // Host message 2 is reschedule.
    message_pass_on(&iic, 1, CPU_NUM, 2);

    let dispatch = |value| Access::Write(WindowKind::Iic, reg::CPU_STRIDE + reg::IPI_DISPATCH, value);
    assert_eq!(board.accesses(), [dispatch(0x1_0010), dispatch(0x2_0010)]);
    assert_eq!(board.pending(0), [0x10]);
    assert_eq!(board.pending(1), [0x10]);
}

#[test]
#[should_panic(expected = "unhandled ipi 9")]
fn test_message_pass_unknown_message_panics() {
    let mut mapped = Vec::new();
    let (_board, iic) = probe_sim(&xenon_tree(), &mut mapped);
    message_pass_on(&iic.unwrap(), 0, 1, 9);
}

#[test]
fn test_ipi_reaches_kernel_receiver() {
    let mut mapped = Vec::new();
    let (_board, iic) = probe_sim(&xenon_tree(), &mut mapped);
    let iic = iic.unwrap();
    iic.init_cpu(2).unwrap();
    request_ipis_on(&iic);

    // Host message 1 is call-function-single.
    message_pass_on(&iic, 0, 2, 1);

    assert_eq!(iic.dispatch(2), Some(0x70));
    assert_eq!(iic.dispatch(2), None);
    assert!(
        RECEIVED
            .lock()
            .unwrap()
            .contains(&IpiMessage::CallFunctionSingle)
    );
}

/// Heap memory standing in for a device window.
fn ram_window(size: usize) -> NonNull<u8> {
    let words = vec![0u32; size / 4].into_boxed_slice();
    NonNull::new(Box::into_raw(words).cast::<u8>()).unwrap()
}

#[test]
fn test_smc_reply_delivered_through_controller() {
    let mut mapped = Vec::new();
    let (board, iic) = probe_sim(&xenon_tree(), &mut mapped);
    let iic = iic.unwrap();

    let base = ram_window(SMC_WINDOW_SIZE);
    let fifo = unsafe { MmioRegion::new(base, SMC_WINDOW_SIZE) };
    let virq = init_smc_on(&iic, unsafe { MmioRegion::new(base, SMC_WINDOW_SIZE) }).unwrap();
    assert!(iic.domain().has_handler(virq));
    assert!(iic.bridge().is_connected(3));

    // A reply to command 0x07 waits in the receive FIFO.
    fifo.write_le32(0x94, 0x4);
    fifo.write_le32(0x90, 0x0000_3107);
    fifo.write_le32(0x50, 0x1000_0000);

    assert!(board.raise(SMC_IRQ));
    assert_eq!(iic.dispatch(0), Some(virq));
    assert_eq!(fifo.read_le32(0x58), 0x1000_0000);

    let client = smc();
    assert_eq!(client.transport().last_reply(), 0x07);
    let mut query = SmcMessage::new(&[0x07]);
    assert!(client.transport().cached_lookup(&mut query));
    assert_eq!(&query.as_bytes()[..6], &[0x07, 0x31, 0x00, 0x00, 0x07, 0x31]);

    assert_eq!(
        init_smc_on(&iic, unsafe { MmioRegion::new(base, SMC_WINDOW_SIZE) }),
        Err(IicError::AlreadyInitialized)
    );
}
