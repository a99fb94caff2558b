// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 KylinSoft Co., Ltd. <https://www.kylinos.cn/>
// See LICENSES for license details.

//! Xenon Integrated Interrupt Controller (IIC) driver.
//!
//! The IIC exposes one register block per hardware thread. Each block latches
//! the highest pending priority code, which is consumed by a destructive read
//! and retired by an EOI write. External peripheral lines do not reach the IIC
//! directly: they pass through a routing bridge whose per-slot registers decide
//! whether an assertion is forwarded (always to core 0).
//!
//! This crate is split along those hardware seams:
//!
//! - [`prio`]: the fixed priority-code space and the bridge slot table.
//! - [`route`]: the bridge slot registers (connect/disconnect).
//! - [`iic`]: per-core pending/ack/EOI protocol.
//! - [`ack`]: auxiliary acknowledgments for self-latching peripherals.
//! - [`ipi`]: inter-processor message encoding and delivery.
//! - [`domain`]: virtual IRQ mapping, handler table and chip operations.
//!
//! [`XenonIic`] owns all of the above for one board and is the only stateful
//! object; platform code keeps a single instance of it.
//!
//! # Example
//!
//! ```rust,ignore
//! use xenon_iic::{IicConfig, NodeId, XenonIic, XenonWindows};
//!
//! let iic = XenonIic::new(windows, IicConfig::new(), NodeId(3));
//! iic.init().expect("IIC bring-up failed");
//! iic.request_irq(Priority::Enet, enet_irq)?;
//!
//! // From the external interrupt vector on `cpu`:
//! iic.dispatch(cpu);
//! ```

#![cfg_attr(not(test), no_std)]

#[macro_use]
extern crate log;
#[cfg(any(test, feature = "sim"))]
extern crate alloc;

pub mod ack;
mod config;
mod controller;
pub mod domain;
mod error;
pub mod iic;
pub mod ipi;
pub mod prio;
pub mod regs;
pub mod route;
#[cfg(any(test, feature = "sim"))]
pub mod sim;

pub use config::IicConfig;
pub use controller::XenonIic;
pub use domain::{Handler, IrqChip, NodeId, Virq};
pub use error::{IicError, IicResult};
pub use ipi::{CpuMask, IpiMessage, IpiTarget};
pub use prio::Priority;
pub use regs::{MmioOps, MmioRegion, XenonWindows};
