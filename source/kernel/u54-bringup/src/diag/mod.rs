// Copyright 2024 U54 Bring-up Contributors
// SPDX-License-Identifier: Apache-2.0

//! CONTEXT: Diagnostics for the bring-up path
//! OWNERS: @bringup
//! PUBLIC API: log (levels, sink registration, log_* macros)

pub mod log;
