// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright 2026 Edgecast Cloud LLC.

//! Service catalog returned alongside a token

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

use crate::AuthError;

/// Which flavour of endpoint to use for a service
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Display, EnumString, Serialize, Deserialize)]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
#[serde(rename_all = "lowercase")]
pub enum Interface {
    #[default]
    Public,
    Internal,
    Admin,
}

/// One endpoint of a catalog entry
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Endpoint {
    pub interface: Interface,
    pub url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub region_id: Option<String>,
    /// Deprecated alias of `region_id`, still sent by most deployments
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub region: Option<String>,
}

impl Endpoint {
    fn in_region(&self, region: &str) -> bool {
        self.region_id.as_deref() == Some(region) || self.region.as_deref() == Some(region)
    }
}

/// A service with its endpoints
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogEntry {
    #[serde(rename = "type")]
    pub service_type: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub endpoints: Vec<Endpoint>,
}

/// Find the URL for `service_type` on `interface`, optionally restricted to
/// `region`. The first match in catalog order wins.
pub fn find_endpoint<'a>(
    catalog: &'a [CatalogEntry],
    service_type: &str,
    interface: Interface,
    region: Option<&str>,
) -> Result<&'a str, AuthError> {
    catalog
        .iter()
        .filter(|entry| entry.service_type == service_type)
        .flat_map(|entry| entry.endpoints.iter())
        .find(|ep| ep.interface == interface && region.is_none_or(|r| ep.in_region(r)))
        .map(|ep| ep.url.as_str())
        .ok_or_else(|| AuthError::NoEndpoint {
            service_type: service_type.to_string(),
            interface: interface.to_string(),
            region: region.map(str::to_string),
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn catalog() -> Vec<CatalogEntry> {
        serde_json::from_str(
            r#"[
                {"type": "identity", "name": "keystone", "endpoints": [
                    {"interface": "public", "region_id": "RegionOne",
                     "url": "http://10.0.0.2:5000/v3"}
                ]},
                {"type": "compute", "name": "nova", "endpoints": [
                    {"interface": "internal", "region_id": "RegionOne",
                     "url": "http://192.168.0.2:8774/v2.1"},
                    {"interface": "public", "region": "RegionTwo",
                     "url": "http://172.16.1.2:8774/v2.1"},
                    {"interface": "public", "region_id": "RegionOne",
                     "url": "http://172.16.0.2:8774/v2.1"}
                ]}
            ]"#,
        )
        .unwrap()
    }

    #[test]
    fn picks_matching_interface_and_region() {
        let catalog = catalog();
        assert_eq!(
            find_endpoint(&catalog, "compute", Interface::Public, Some("RegionOne")).unwrap(),
            "http://172.16.0.2:8774/v2.1"
        );
        assert_eq!(
            find_endpoint(&catalog, "compute", Interface::Public, Some("RegionTwo")).unwrap(),
            "http://172.16.1.2:8774/v2.1"
        );
        assert_eq!(
            find_endpoint(&catalog, "compute", Interface::Internal, None).unwrap(),
            "http://192.168.0.2:8774/v2.1"
        );
    }

    #[test]
    fn without_region_first_match_wins() {
        let catalog = catalog();
        assert_eq!(
            find_endpoint(&catalog, "compute", Interface::Public, None).unwrap(),
            "http://172.16.1.2:8774/v2.1"
        );
    }

    #[test]
    fn missing_endpoint_is_reported() {
        let err = find_endpoint(&catalog(), "compute", Interface::Admin, Some("RegionOne"))
            .unwrap_err();
        assert_eq!(
            err.to_string(),
            "No admin endpoint for service type 'compute' in region 'RegionOne'"
        );
    }

    #[test]
    fn interface_parses_case_insensitively() {
        assert_eq!("Internal".parse::<Interface>().unwrap(), Interface::Internal);
        assert!("private".parse::<Interface>().is_err());
    }
}
