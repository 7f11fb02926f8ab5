// Copyright 2026 MedBox Companion Team
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Heuristics for picking the MedBox out of the paired-device catalogue.
//!
//! Pure functions over catalogue snapshots; the manager never calls the
//! host transport from here.

use tracing::debug;

use super::catalogue::PeerDescriptor;

/// Target name assumed when the user never configured one.
pub const DEFAULT_TARGET_NAME: &str = "HC-05";

/// Name tokens that mark a peer as a likely serial-bridge / MedBox module.
const KEYWORDS: &[&str] = &[
    "hc-05",
    "hc-06",
    "medbox",
    "box",
    "bt05",
    "bt06",
    "arduino",
    "servo",
    "bluetooth module",
];

/// Common serial-bridge modules ship with addresses in this vendor range.
const BRIDGE_ADDRESS_PREFIX: &str = "00:";

fn name_matches_keywords(name: &str) -> bool {
    let lower = name.to_lowercase();
    KEYWORDS.iter().any(|keyword| lower.contains(keyword))
        || (lower.contains("bluetooth") && lower.contains("serial"))
}

/// Whether a catalogue entry looks like MedBox hardware.
///
/// Nameless peers never match; the address prefix alone is too weak a
/// signal without at least some advertised name.
pub fn looks_like_medbox(peer: &PeerDescriptor) -> bool {
    let Some(name) = peer.name.as_deref() else {
        return false;
    };
    name_matches_keywords(name) || peer.address.starts_with(BRIDGE_ADDRESS_PREFIX)
}

/// Filter the catalogue down to MedBox-like peers.
///
/// When nothing matches, the whole catalogue is returned unchanged. This
/// fallback is intentional policy: the UI degrades to "let the user pick
/// any paired device" instead of reporting failure.
pub fn find_candidates(catalogue: &[PeerDescriptor]) -> Vec<PeerDescriptor> {
    let matched: Vec<PeerDescriptor> = catalogue
        .iter()
        .filter(|peer| looks_like_medbox(peer))
        .cloned()
        .collect();

    if matched.is_empty() {
        debug!("No MedBox-like peers matched, returning the full catalogue");
        return catalogue.to_vec();
    }

    for peer in &matched {
        debug!(
            "Found potential MedBox device: {} [{}]",
            peer.display_name(),
            peer.address
        );
    }
    matched
}

/// Resolve the connect target from the catalogue.
///
/// Tie-break order, first satisfied rule wins, catalogue order within a
/// rule:
/// 1. exact address match,
/// 2. case-insensitive bidirectional substring match on the name,
/// 3. keyword heuristic (only when no explicit name preference is set),
/// 4. first peer named after the default serial-bridge modules.
pub fn resolve_target(
    catalogue: &[PeerDescriptor],
    preferred_name: &str,
    preferred_address: &str,
) -> Option<PeerDescriptor> {
    if !preferred_address.is_empty() {
        if let Some(peer) = catalogue
            .iter()
            .find(|peer| peer.address.eq_ignore_ascii_case(preferred_address))
        {
            debug!("Target found by address: {}", peer.address);
            return Some(peer.clone());
        }
    }

    if !preferred_name.is_empty() {
        let wanted = preferred_name.to_lowercase();
        if let Some(peer) = catalogue.iter().find(|peer| {
            peer.name.as_deref().is_some_and(|name| {
                let name = name.to_lowercase();
                name.contains(&wanted) || wanted.contains(&name)
            })
        }) {
            debug!("Target found by name: {}", peer.display_name());
            return Some(peer.clone());
        }
    }

    if preferred_name.is_empty() || preferred_name == DEFAULT_TARGET_NAME {
        if let Some(peer) = catalogue.iter().find(|peer| {
            peer.name.as_deref().is_some_and(|name| {
                let name = name.to_lowercase();
                name.contains("hc-05")
                    || name.contains("hc-06")
                    || name.contains("medbox")
                    || name.contains("arduino")
            })
        }) {
            debug!("Found MedBox device: {}", peer.display_name());
            return Some(peer.clone());
        }
    }

    let fallback = catalogue.iter().find(|peer| {
        peer.name.as_deref().is_some_and(|name| {
            let name = name.to_lowercase();
            name.contains("hc-05") || name.contains("hc-06")
        })
    });
    if let Some(peer) = fallback {
        debug!("Using first HC-05/HC-06 device: {}", peer.display_name());
    }
    fallback.cloned()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn peer(name: Option<&str>, address: &str) -> PeerDescriptor {
        PeerDescriptor::new(name, address)
    }

    #[test]
    fn test_keyword_match_filters_catalogue() {
        let catalogue = vec![
            peer(Some("HC-05-A"), "00:11:22:33:44:55"),
            peer(Some("Printer"), "AA:BB:CC:DD:EE:FF"),
        ];

        let candidates = find_candidates(&catalogue);
        assert_eq!(candidates, vec![catalogue[0].clone()]);
    }

    #[test]
    fn test_no_match_falls_back_to_full_catalogue() {
        let catalogue = vec![peer(Some("Printer"), "AA:BB:CC:DD:EE:FF")];

        let candidates = find_candidates(&catalogue);
        assert_eq!(candidates, catalogue);
    }

    #[test]
    fn test_nameless_peers_never_match_keywords() {
        let catalogue = vec![
            peer(None, "00:11:22:33:44:55"),
            peer(Some("MedBox"), "AA:BB:CC:DD:EE:FF"),
        ];

        let candidates = find_candidates(&catalogue);
        assert_eq!(candidates, vec![catalogue[1].clone()]);
    }

    #[test]
    fn test_address_prefix_heuristic() {
        let catalogue = vec![
            peer(Some("Mystery"), "00:14:03:05:59:02"),
            peer(Some("Headphones"), "F4:4E:FD:12:34:56"),
        ];

        let candidates = find_candidates(&catalogue);
        assert_eq!(candidates, vec![catalogue[0].clone()]);
    }

    #[test]
    fn test_resolve_by_exact_address_outranks_name() {
        let catalogue = vec![
            peer(Some("HC-05"), "AA:BB:CC:DD:EE:01"),
            peer(Some("Lamp"), "00:11:22:33:44:55"),
        ];

        let target = resolve_target(&catalogue, "HC-05", "00:11:22:33:44:55");
        assert_eq!(target, Some(catalogue[1].clone()));
    }

    #[test]
    fn test_resolve_address_match_is_case_insensitive() {
        let catalogue = vec![peer(Some("MedBox"), "AA:BB:CC:DD:EE:01")];

        let target = resolve_target(&catalogue, "", "aa:bb:cc:dd:ee:01");
        assert_eq!(target, Some(catalogue[0].clone()));
    }

    #[test]
    fn test_resolve_by_bidirectional_name_substring() {
        let catalogue = vec![
            peer(Some("Printer"), "AA:BB:CC:DD:EE:01"),
            peer(Some("MedBox Mk2"), "AA:BB:CC:DD:EE:02"),
        ];

        // Preference is a substring of the peer name.
        let target = resolve_target(&catalogue, "MedBox", "");
        assert_eq!(target, Some(catalogue[1].clone()));

        // Peer name is a substring of the preference.
        let catalogue = vec![peer(Some("Box"), "AA:BB:CC:DD:EE:03")];
        let target = resolve_target(&catalogue, "MedBox Mk2 Box Unit", "");
        assert_eq!(target, Some(catalogue[0].clone()));
    }

    #[test]
    fn test_resolve_default_name_uses_keyword_heuristic() {
        let catalogue = vec![
            peer(Some("Printer"), "AA:BB:CC:DD:EE:01"),
            peer(Some("arduino nano"), "AA:BB:CC:DD:EE:02"),
        ];

        let target = resolve_target(&catalogue, DEFAULT_TARGET_NAME, "");
        assert_eq!(target, Some(catalogue[1].clone()));
    }

    #[test]
    fn test_resolve_custom_name_skips_keyword_heuristic() {
        let catalogue = vec![peer(Some("arduino nano"), "AA:BB:CC:DD:EE:02")];

        // An explicit non-default preference must not fall back to the
        // generic keyword rule, only to the HC-05/HC-06 rule.
        let target = resolve_target(&catalogue, "MyBridge", "");
        assert_eq!(target, None);
    }

    #[test]
    fn test_resolve_falls_back_to_first_default_module() {
        let catalogue = vec![
            peer(Some("Printer"), "AA:BB:CC:DD:EE:01"),
            peer(Some("hc-06 bridge"), "AA:BB:CC:DD:EE:02"),
        ];

        let target = resolve_target(&catalogue, "Nonexistent", "");
        assert_eq!(target, Some(catalogue[1].clone()));
    }

    #[test]
    fn test_resolve_empty_catalogue() {
        assert_eq!(resolve_target(&[], "HC-05", ""), None);
    }
}
