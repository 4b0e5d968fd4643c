// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Plug state as seen by the coordinator.
//!
//! A [`Snapshot`] is what one successful poll produced. The coordinator keeps
//! the most recent one; entities read from it.

mod snapshot;

pub use snapshot::{DeviceInfo, Snapshot};
