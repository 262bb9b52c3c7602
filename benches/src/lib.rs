// Copyright 2025 the Copperline Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Benchmark-only crate; the benchmarks live in the `benches` directory.

#![no_std]
