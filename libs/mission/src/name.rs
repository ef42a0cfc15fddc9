//! Mission name generation.

use rand::Rng;

/// Prefix shared by every mission name.
pub const MISSION_NAME_PREFIX: &str = "dm";

const SUFFIX_LEN: usize = 6;
const SUFFIX_CHARSET: &[u8] = b"abcdefghijklmnopqrstuvwxyz0123456789";

/// Build a mission name from a drone ID and an explicit suffix.
pub fn mission_name_with_suffix(drone_id: &str, suffix: &str) -> String {
    format!(
        "{MISSION_NAME_PREFIX}-{}-{suffix}",
        drone_id.to_ascii_lowercase()
    )
}

/// Generate a unique mission name: `dm-<drone id>-<6 random [a-z0-9]>`.
pub fn generate_mission_name(drone_id: &str) -> String {
    let mut rng = rand::rng();
    let suffix: String = (0..SUFFIX_LEN)
        .map(|_| SUFFIX_CHARSET[rng.random_range(0..SUFFIX_CHARSET.len())] as char)
        .collect();
    mission_name_with_suffix(drone_id, &suffix)
}
