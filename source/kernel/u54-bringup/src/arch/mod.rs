// Copyright 2024 U54 Bring-up Contributors
// SPDX-License-Identifier: Apache-2.0

//! CONTEXT: Architecture specific support code
//! OWNERS: @bringup
//! PUBLIC API: arch backends under `arch::<isa>`
//! INVARIANTS: Keep per-arch code isolated behind module boundaries

pub mod riscv;
