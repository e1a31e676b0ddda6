use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use tracing::{debug, warn};

use crate::driver::LedPattern;

/// LED pattern shown on a remote assigned to `player`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LightProfile {
    pub player: usize,
    pub leds: LedPattern,
}

impl LightProfile {
    pub fn new(player: usize, leds: LedPattern) -> Self {
        Self { player, leds }
    }
}

/// One profile per player with the classic single-LED layout
pub fn classic_profiles(max_players: usize) -> Vec<LightProfile> {
    (0..max_players)
        .map(|player| LightProfile::new(player, LedPattern::player(player)))
        .collect()
}

/// Bring a profile list in line with the player count.
///
/// Keeps the first profile per player, drops entries beyond `max_players` and,
/// when `pad` is set, fills missing players with `default_lights`. The result is
/// ordered by player.
pub fn normalize_profiles(
    profiles: &[LightProfile],
    max_players: usize,
    default_lights: LedPattern,
    pad: bool,
) -> Vec<LightProfile> {
    let mut seen = HashSet::new();
    let mut normalized: Vec<LightProfile> = Vec::with_capacity(max_players);

    for profile in profiles {
        if profile.player >= max_players {
            debug!(
                "Dropping light profile for player {} (max players: {})",
                profile.player, max_players
            );
            continue;
        }
        if !seen.insert(profile.player) {
            warn!(
                "Duplicate light profile for player {}, keeping the first one",
                profile.player
            );
            continue;
        }
        normalized.push(*profile);
    }

    if pad {
        for player in 0..max_players {
            if !seen.contains(&player) {
                debug!("Padding light profile for player {} with default lights", player);
                normalized.push(LightProfile::new(player, default_lights));
            }
        }
    }

    normalized.sort_by_key(|profile| profile.player);
    normalized
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalize_pads_and_truncates() {
        let profiles = vec![
            LightProfile::new(5, LedPattern::player(1)),
            LightProfile::new(1, LedPattern::player(1)),
        ];
        let normalized = normalize_profiles(&profiles, 3, LedPattern::ALL_ON, true);

        assert_eq!(
            normalized,
            vec![
                LightProfile::new(0, LedPattern::ALL_ON),
                LightProfile::new(1, LedPattern::player(1)),
                LightProfile::new(2, LedPattern::ALL_ON),
            ]
        );
    }

    #[test]
    fn normalize_keeps_first_duplicate() {
        let profiles = vec![
            LightProfile::new(0, LedPattern::player(2)),
            LightProfile::new(0, LedPattern::player(3)),
        ];
        let normalized = normalize_profiles(&profiles, 2, LedPattern::ALL_ON, false);

        assert_eq!(normalized, vec![LightProfile::new(0, LedPattern::player(2))]);
    }

    #[test]
    fn classic_profiles_cover_every_player() {
        let profiles = classic_profiles(4);
        assert_eq!(profiles.len(), 4);
        assert_eq!(profiles[2].leds, LedPattern::new(false, false, true, false));
    }
}
