// Copyright 2024 U54 Bring-up Contributors
// SPDX-License-Identifier: Apache-2.0

//! Fixed console output of the bring-up sequence.
//!
//! These are payload for whoever watches the serial port, not log records,
//! and are written byte-for-byte without a `[LEVEL target]` prefix.

pub const MPU_USB_FAILED: &[u8] = b"\r\nMSS MPU configuration for USB failed\r\n";
pub const MPU_USB_CONFIGURED: &[u8] = b"\r\nMSS MPU configured for USB\r\n";
pub const USB_DRIVER_READY: &[u8] = b"\n\rInitialized USB driver\n\r";
pub const MOUSE_FEATURE_BANNER: &[u8] = b"\r\nThis feature automatically moves the mouse pointer horizontally (x-direction) on the desktop to which this USB port is connected.\r\n";
