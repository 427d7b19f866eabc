// Copyright 2024 U54 Bring-up Contributors
// SPDX-License-Identifier: Apache-2.0

//! Boundary to the USB HID application that runs once bring-up is done.

/// The application driven by the final loop.
///
/// Implementations own the USB device stack; bring-up only sequences the
/// calls.
pub trait HidFeature {
    /// One-time setup, called with interrupts globally enabled.
    fn init(&mut self);
    /// One iteration of the application's polling loop.
    fn task(&mut self);
}

impl<F: HidFeature + ?Sized> HidFeature for &mut F {
    fn init(&mut self) {
        (**self).init()
    }

    fn task(&mut self) {
        (**self).task()
    }
}
