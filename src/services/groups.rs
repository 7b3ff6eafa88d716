//! Systemd unit group resolution.
//!
//! Logical services that map to the same systemd unit vector form a group
//! and must be enabled or disabled together.

use std::collections::BTreeMap;

/// All logical services sharing `service`'s unit group, including itself.
/// Empty when the service is unknown on the node.
pub fn peers_in_group(
    systemd_services: &BTreeMap<String, Vec<String>>,
    service: &str,
) -> Vec<String> {
    let group = match systemd_services.get(service) {
        Some(units) => units,
        None => return Vec::new(),
    };
    systemd_services
        .iter()
        .filter(|(_, units)| *units == group)
        .map(|(name, _)| name.clone())
        .collect()
}

/// Every logical service whose unit list (joined by comma) equals `unit`,
/// as the flat services file is keyed by unit name. Several logical
/// services can share one unit and all of them carry the toggle.
pub fn logicals_for_unit(
    systemd_services: &BTreeMap<String, Vec<String>>,
    unit: &str,
) -> Vec<String> {
    systemd_services
        .iter()
        .filter(|(_, units)| units.join(",") == unit)
        .map(|(name, _)| name.clone())
        .collect()
}

/// Whether any logical service on the node maps to this systemd unit.
pub fn unit_known(systemd_services: &BTreeMap<String, Vec<String>>, unit: &str) -> bool {
    systemd_services
        .values()
        .any(|units| units.iter().any(|u| u == unit))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> BTreeMap<String, Vec<String>> {
        let mut map = BTreeMap::new();
        map.insert("svcA".to_string(), vec!["g1".to_string()]);
        map.insert("svcB".to_string(), vec!["g1".to_string()]);
        map.insert("svcC".to_string(), vec!["g2".to_string()]);
        map
    }

    #[test]
    fn test_peers_share_group() {
        let peers = peers_in_group(&sample(), "svcA");
        assert_eq!(peers, vec!["svcA".to_string(), "svcB".to_string()]);
        assert_eq!(peers_in_group(&sample(), "svcC"), vec!["svcC".to_string()]);
    }

    #[test]
    fn test_unknown_service_has_no_peers() {
        assert!(peers_in_group(&sample(), "ghost").is_empty());
    }

    #[test]
    fn test_logicals_for_unit() {
        assert_eq!(
            logicals_for_unit(&sample(), "g1"),
            vec!["svcA".to_string(), "svcB".to_string()]
        );
        assert_eq!(logicals_for_unit(&sample(), "g2"), vec!["svcC".to_string()]);
        assert!(logicals_for_unit(&sample(), "nope").is_empty());
    }

    #[test]
    fn test_unit_known() {
        assert!(unit_known(&sample(), "g2"));
        assert!(!unit_known(&sample(), "g3"));
    }
}
