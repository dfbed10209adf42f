use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};

pub fn stable_hash(id: &str) -> u64 {
    let mut hasher = DefaultHasher::new();
    id.hash(&mut hasher);
    hasher.finish()
}

/// Maps an id onto a point in `[-1, 1]^2` that stays the same across runs.
pub fn stable_pair(id: &str) -> (f32, f32) {
    let hash = stable_hash(id);

    let x = ((hash & 0xffff_ffff) as f64 / u32::MAX as f64) as f32;
    let y = (((hash >> 32) & 0xffff_ffff) as f64 / u32::MAX as f64) as f32;
    ((x * 2.0) - 1.0, (y * 2.0) - 1.0)
}

/// Uniform value in `[0, 1]` derived from an id and a salt.
pub fn stable_unit(id: &str, salt: u64) -> f32 {
    let hash = stable_hash(id) ^ salt.wrapping_mul(0x9e37_79b9_7f4a_7c15);
    let mixed = hash.rotate_left((salt % 63) as u32 + 1);
    ((mixed >> 11) as f64 / (1u64 << 53) as f64) as f32
}

pub fn truncate_label(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        return text.to_owned();
    }

    let mut truncated = text.chars().take(max_chars.saturating_sub(1)).collect::<String>();
    truncated.push('…');
    truncated
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stable_pair_is_repeatable_and_bounded() {
        let first = stable_pair("dopamine");
        let second = stable_pair("dopamine");
        assert_eq!(first, second);
        assert!((-1.0..=1.0).contains(&first.0));
        assert!((-1.0..=1.0).contains(&first.1));
    }

    #[test]
    fn stable_unit_stays_in_unit_interval() {
        for salt in 0..32 {
            let value = stable_unit("node-17", salt);
            assert!((0.0..=1.0).contains(&value), "salt {salt} gave {value}");
        }
    }

    #[test]
    fn truncate_label_appends_ellipsis() {
        assert_eq!(truncate_label("Hippocampus", 20), "Hippocampus");
        assert_eq!(truncate_label("Synaptic Plasticity Enhancement", 10), "Synaptic …");
    }
}
