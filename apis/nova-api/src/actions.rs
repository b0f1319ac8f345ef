// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright 2026 Edgecast Cloud LLC.

//! Request bodies for `POST /servers/{id}/action`

use serde::{Deserialize, Serialize};

/// Parameters of the `os-migrateLive` server action
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LiveMigrate {
    /// Destination compute host. `None` lets the scheduler pick.
    pub host: Option<String>,
    /// Copy disks as part of the migration (no shared storage)
    pub block_migration: bool,
}

/// `{"os-migrateLive": {...}}`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LiveMigrateAction {
    #[serde(rename = "os-migrateLive")]
    pub live_migrate: LiveMigrate,
}

impl LiveMigrateAction {
    pub fn new(host: Option<String>, block_migration: bool) -> Self {
        Self {
            live_migrate: LiveMigrate {
                host,
                block_migration,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn serializes_under_action_key() {
        let body = LiveMigrateAction::new(Some("node-2".to_string()), true);
        assert_eq!(
            serde_json::to_value(&body).unwrap(),
            json!({"os-migrateLive": {"host": "node-2", "block_migration": true}})
        );
    }

    #[test]
    fn scheduler_choice_is_an_explicit_null() {
        let body = LiveMigrateAction::new(None, true);
        assert_eq!(
            serde_json::to_value(&body).unwrap(),
            json!({"os-migrateLive": {"host": null, "block_migration": true}})
        );
    }
}
