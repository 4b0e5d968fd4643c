// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Power state of the plug's relay.

use std::fmt;
use std::str::FromStr;

use crate::error::ValueError;

/// Relay state of an Edimax smart plug.
///
/// The plug only knows two states. Parsing is strict: the plug accepts
/// `ON`/`OFF` in either all-upper or all-lower case and nothing else.
///
/// # Examples
///
/// ```
/// use edimax_plug::types::PowerState;
///
/// assert_eq!("on".parse::<PowerState>().unwrap(), PowerState::On);
/// assert_eq!(PowerState::Off.as_str(), "OFF");
/// assert!("toggle".parse::<PowerState>().is_err());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum PowerState {
    /// Relay is open.
    Off,
    /// Relay is closed.
    On,
}

impl PowerState {
    /// Returns the value the plug uses on the wire.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Off => "OFF",
            Self::On => "ON",
        }
    }

    /// Returns `true` for [`PowerState::On`].
    #[must_use]
    pub const fn is_on(&self) -> bool {
        matches!(self, Self::On)
    }
}

impl fmt::Display for PowerState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PowerState {
    type Err = ValueError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "ON" | "on" => Ok(Self::On),
            "OFF" | "off" => Ok(Self::Off),
            _ => Err(ValueError::InvalidPowerState(s.to_string())),
        }
    }
}

impl From<bool> for PowerState {
    fn from(value: bool) -> Self {
        if value { Self::On } else { Self::Off }
    }
}
