// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2012-2025 Andrei Maltsev

//! Wire primitives shared by every packet: varints, little-endian
//! scalars, varstrings, UUIDs and the outer frame codec.

/// Encode/decode failure taxonomy.
pub mod error;
/// Outer `{id, length, payload}` framing and the compression seam.
pub mod frame;
/// The `HytaleCodec` trait and scalar implementations.
pub mod primitives;
/// Unsigned LEB128 varints.
pub mod varint;

pub use error::{DecodeError, EncodeError};
pub use primitives::HytaleCodec;
