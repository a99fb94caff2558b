// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 KylinSoft Co., Ltd. <https://www.kylinos.cn/>
// See LICENSES for license details.

//! Locating the controller in the platform descriptor tree.

use fdt::Fdt;
use memory_addr::PhysAddr;
use xenon_iic::{IicError, IicResult, NodeId};

use crate::config::devices::{IIC_COMPATIBLE, IIC_NODE_NAME};

/// The controller node found at boot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ControllerNode {
    /// Identity of the node; the IRQ domain only serves this node.
    pub node: NodeId,
    /// Physical base of the first register window.
    pub reg: PhysAddr,
}

/// A source of platform device descriptions.
pub trait DescriptorTree {
    /// Finds the Xenon interrupt controller node.
    fn find_interrupt_controller(&self) -> IicResult<ControllerNode>;
}

/// Whether a node is the Xenon interrupt controller.
///
/// `name` may carry a unit address (`interrupt-controller@...`).
pub fn is_controller_node<'a>(name: &str, mut compatible: impl Iterator<Item = &'a str>) -> bool {
    let base = name.split('@').next().unwrap_or(name);
    base == IIC_NODE_NAME && compatible.any(|c| c == IIC_COMPATIBLE)
}

/// Flattened device tree handed over by the boot loader.
pub struct FdtDescriptors<'a> {
    fdt: Fdt<'a>,
}

impl<'a> FdtDescriptors<'a> {
    pub fn new(blob: &'a [u8]) -> Result<Self, fdt::FdtError> {
        Ok(Self {
            fdt: Fdt::new(blob)?,
        })
    }

    /// # Safety
    ///
    /// `ptr` must point to a valid device tree blob that outlives `'a`.
    pub unsafe fn from_ptr(ptr: *const u8) -> Result<Self, fdt::FdtError> {
        Ok(Self {
            fdt: unsafe { Fdt::from_ptr(ptr)? },
        })
    }
}

impl DescriptorTree for FdtDescriptors<'_> {
    fn find_interrupt_controller(&self) -> IicResult<ControllerNode> {
        for (index, node) in self.fdt.all_nodes().enumerate() {
            let compatible = node.compatible().into_iter().flat_map(|c| c.all());
            if !is_controller_node(node.name, compatible) {
                continue;
            }
            let Some(region) = node.reg().and_then(|mut regs| regs.next()) else {
                warn!("xenon IIC: Can't resolve addresses");
                return Err(IicError::BadRegisterWindow);
            };
            return Ok(ControllerNode {
                node: NodeId(index),
                reg: PhysAddr::from(region.starting_address as usize),
            });
        }
        Err(IicError::ControllerNotFound)
    }
}
