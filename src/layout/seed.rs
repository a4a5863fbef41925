//! Deterministic start positions for entities with no cached position.

use bevy::math::Vec2;

/// Stable 64-bit hash of a string (FNV-1a with a final avalanche mix).
/// Same input, same output, on every run and platform.
pub fn stable_hash(s: &str) -> u64 {
    let h = s
        .bytes()
        .fold(0xcbf2_9ce4_8422_2325u64, |acc, b| {
            (acc ^ b as u64).wrapping_mul(0x0000_0100_0000_01b3)
        });
    mix64(h)
}

fn mix64(mut z: u64) -> u64 {
    z = (z ^ (z >> 30)).wrapping_mul(0xbf58_476d_1ce4_e5b9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94d0_49bb_1331_11eb);
    z ^ (z >> 31)
}

/// Map 24 bits of `bits` to `[-1, 1]`.
fn unit(bits: u64) -> f32 {
    let v = (bits & 0x00ff_ffff) as f32 / 0x00ff_ffff as f32;
    v * 2.0 - 1.0
}

/// Pair of offsets in `[-1, 1]²` derived from an id.
pub fn jitter(id: &str) -> Vec2 {
    let h = stable_hash(id);
    Vec2::new(unit(h), unit(h >> 32))
}

/// Start position for an uncached entity: its target, nudged by an id-derived jitter.
pub fn seed_position(id: &str, target: Vec2, amplitude: f32) -> Vec2 {
    target + jitter(id) * amplitude
}

/// Unit direction used to separate two bodies whose centers coincide.
pub fn separation_direction(i: usize, j: usize) -> Vec2 {
    let angle = unit(mix64(((i as u64) << 32) ^ j as u64)) * std::f32::consts::PI;
    Vec2::from_angle(angle)
}
