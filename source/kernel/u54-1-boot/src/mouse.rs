// Copyright 2024 U54 Bring-up Contributors
// SPDX-License-Identifier: Apache-2.0

//! Binding to the USB HID mouse application and its interrupt handlers,
//! linked in from the vendor USB stack.

use u54_bringup::trap::IrqAction;
use u54_bringup::HidFeature;

extern "C" {
    fn MOUSE_init();
    fn MOUSE_task();
    fn PLIC_usb_dma_IRQHandler() -> u8;
    fn PLIC_usb_mc_IRQHandler() -> u8;
}

/// The externally linked mouse application.
pub struct ExternMouse;

impl HidFeature for ExternMouse {
    fn init(&mut self) {
        // SAFETY: called once, after the USB block is clocked and its
        // interrupt lines are routed to this hart.
        unsafe { MOUSE_init() }
    }

    fn task(&mut self) {
        // SAFETY: only ever called from the single bring-up loop after init.
        unsafe { MOUSE_task() }
    }
}

pub fn usb_dma_irq() -> IrqAction {
    // SAFETY: invoked from the PLIC dispatcher for source USB_DMA only.
    IrqAction::from_raw(unsafe { PLIC_usb_dma_IRQHandler() })
}

pub fn usb_mc_irq() -> IrqAction {
    // SAFETY: invoked from the PLIC dispatcher for source USB_MC only.
    IrqAction::from_raw(unsafe { PLIC_usb_mc_IRQHandler() })
}
