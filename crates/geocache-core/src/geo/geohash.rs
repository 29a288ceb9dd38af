//! Base-32 geohash encoding.

/// Geohash alphabet; omits `a`, `i`, `l` and `o`.
const BASE32: &[u8; 32] = b"0123456789bcdefghjkmnpqrstuvwxyz";

/// Precision used for cache keys (cells of roughly ±2.4 km).
pub const DEFAULT_PRECISION: usize = 5;

/// Encode a coordinate as a geohash of `precision` characters.
///
/// Bits alternate between longitude (even positions) and latitude (odd
/// positions); each bit halves the corresponding range. Inputs outside
/// lat ∈ [-90, 90] and lon ∈ [-180, 180] produce an unspecified hash.
pub fn encode(latitude: f64, longitude: f64, precision: usize) -> String {
    let mut lat_range = (-90.0_f64, 90.0_f64);
    let mut lon_range = (-180.0_f64, 180.0_f64);

    let mut hash = String::with_capacity(precision);
    let mut bit_index = 0usize;
    let mut char_bits = 0usize;
    let mut value = 0usize;

    while hash.len() < precision {
        let (range, coordinate) = if bit_index % 2 == 0 {
            (&mut lon_range, longitude)
        } else {
            (&mut lat_range, latitude)
        };

        let mid = (range.0 + range.1) / 2.0;
        value <<= 1;
        if coordinate >= mid {
            value |= 1;
            range.0 = mid;
        } else {
            range.1 = mid;
        }

        bit_index += 1;
        char_bits += 1;
        if char_bits == 5 {
            hash.push(BASE32[value] as char);
            char_bits = 0;
            value = 0;
        }
    }

    hash
}
