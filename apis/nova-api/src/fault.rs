// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright 2026 Edgecast Cloud LLC.

//! Compute API error bodies
//!
//! Nova wraps errors in an envelope keyed by the fault name, e.g.
//! `{"itemNotFound": {"code": 404, "message": "..."}}` or
//! `{"badRequest": {...}}`. The key varies, so the envelope is parsed as a
//! one-entry map.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// Body of a compute API fault
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Fault {
    #[serde(default)]
    pub code: Option<u16>,
    pub message: String,
}

impl Fault {
    /// Extract the fault message from a raw error body, if it has the
    /// usual envelope shape.
    pub fn from_body(body: &str) -> Option<Fault> {
        let envelope: HashMap<String, Fault> = serde_json::from_str(body).ok()?;
        envelope.into_values().next()
    }
}
