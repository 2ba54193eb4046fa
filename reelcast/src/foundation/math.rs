#[derive(Clone, Copy, Debug)]
pub(crate) struct Fnv1a64(u64);

impl Fnv1a64 {
    pub(crate) const OFFSET_BASIS: u64 = 0xcbf2_9ce4_8422_2325;
    const PRIME: u64 = 0x0000_0100_0000_01B3;

    pub(crate) fn new(seed: u64) -> Self {
        Self(seed)
    }

    pub(crate) fn new_default() -> Self {
        Self(Self::OFFSET_BASIS)
    }

    pub(crate) fn write_u8(&mut self, v: u8) {
        self.write_bytes(&[v]);
    }

    pub(crate) fn write_u64(&mut self, v: u64) {
        self.write_bytes(&v.to_le_bytes());
    }

    pub(crate) fn write_bytes(&mut self, bytes: &[u8]) {
        let mut h = self.0;
        for &b in bytes {
            h ^= u64::from(b);
            h = h.wrapping_mul(Self::PRIME);
        }
        self.0 = h;
    }

    pub(crate) fn finish(self) -> u64 {
        self.0
    }
}

pub(crate) fn mul_div255_u16(x: u16, y: u16) -> u16 {
    (((u32::from(x) * u32::from(y)) + 127) / 255) as u16
}

pub(crate) fn mul_div255_u8(x: u16, y: u16) -> u8 {
    mul_div255_u16(x, y) as u8
}

/// Deterministic 32-bit hash of `(seed, a, b)`.
pub(crate) fn hash_u32(seed: u64, a: u32, b: u32) -> u32 {
    let mut h = Fnv1a64::new(seed ^ Fnv1a64::OFFSET_BASIS);
    h.write_u64(u64::from(a));
    h.write_u64(u64::from(b));
    let v = h.finish();
    ((v >> 32) ^ (v & 0xFFFF_FFFF)) as u32
}

/// Deterministic pseudo-random value in `[0, 1)` for `(seed, a, b)`.
pub(crate) fn hash_unit(seed: u64, a: u32, b: u32) -> f64 {
    f64::from(hash_u32(seed, a, b)) / (f64::from(u32::MAX) + 1.0)
}

/// Seed derived from a timestamp quantized to `steps_per_sec` buckets.
///
/// Effects that "re-roll" every frame use this so a given time always renders identically.
pub(crate) fn time_seed(t: f64, steps_per_sec: f64) -> u64 {
    let q = (t.max(0.0) * steps_per_sec).floor() as u64;
    let mut h = Fnv1a64::new_default();
    h.write_u64(q);
    h.finish()
}

pub(crate) fn smoothstep(a: f32, b: f32, x: f32) -> f32 {
    if x <= a {
        return 0.0;
    }
    if x >= b {
        return 1.0;
    }
    let t = (x - a) / (b - a);
    (t * t * (3.0 - 2.0 * t)).clamp(0.0, 1.0)
}

pub(crate) fn lerp(a: f64, b: f64, t: f64) -> f64 {
    a + (b - a) * t
}
