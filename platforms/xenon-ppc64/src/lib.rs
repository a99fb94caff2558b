// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 KylinSoft Co., Ltd. <https://www.kylinos.cn/>
// See LICENSES for license details.

//! Platform support for the Xenon board: interrupt controller glue, the SMC
//! channel and SMP hooks.
//!
//! The kernel provides [`irq::XenonCpuIf`] and then drives bring-up in this
//! order: [`irq::init_controller`] on the boot core, [`smc::init_smc`],
//! [`smp::probe`], and [`smp::setup_cpu`] on every core as it starts.

#![cfg_attr(not(test), no_std)]

#[macro_use]
extern crate log;

pub mod config;
pub mod dtb;
pub mod irq;
pub mod smc;
#[cfg(feature = "smp")]
pub mod smp;

#[cfg(test)]
mod tests;
