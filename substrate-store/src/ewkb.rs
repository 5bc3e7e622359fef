//! Extended Well-Known Binary encoding for the `POINTZM`/`GEOMETRYZM`
//! columns the schema stores geometry in. All SRID fields are `0`
//! (these points live on the unit sphere, not on earth).

use substrate_core::point::Point4;

const WKB_LITTLE_ENDIAN: u8 = 1;
const WKB_POINT: u32 = 1;
const WKB_LINESTRING: u32 = 2;
const WKB_Z_FLAG: u32 = 0x8000_0000;
const WKB_M_FLAG: u32 = 0x4000_0000;
const WKB_SRID_FLAG: u32 = 0x2000_0000;

/// Byte length of an EWKB `POINT ZM` with SRID: 1 (endian) + 4 (type) +
/// 4 (SRID) + 4 * 8 (x, y, z, m).
pub const POINT_ZM_LEN: usize = 1 + 4 + 4 + 4 * 8;

/// Encodes a single point as EWKB `POINT ZM`, SRID 0.
pub fn encode_point_zm(p: &Point4) -> [u8; POINT_ZM_LEN] {
    let mut buf = [0u8; POINT_ZM_LEN];
    let type_word = WKB_POINT | WKB_Z_FLAG | WKB_M_FLAG | WKB_SRID_FLAG;
    buf[0] = WKB_LITTLE_ENDIAN;
    buf[1..5].copy_from_slice(&type_word.to_le_bytes());
    buf[5..9].copy_from_slice(&0u32.to_le_bytes());
    buf[9..17].copy_from_slice(&p.x.to_le_bytes());
    buf[17..25].copy_from_slice(&p.y.to_le_bytes());
    buf[25..33].copy_from_slice(&p.z.to_le_bytes());
    buf[33..41].copy_from_slice(&p.m.to_le_bytes());
    buf
}

/// Encodes a trajectory as EWKB `LINESTRING ZM`, SRID 0.
pub fn encode_linestring_zm(points: &[Point4]) -> Vec<u8> {
    let mut buf = Vec::with_capacity(9 + points.len() * 32);
    let type_word = WKB_LINESTRING | WKB_Z_FLAG | WKB_M_FLAG | WKB_SRID_FLAG;
    buf.push(WKB_LITTLE_ENDIAN);
    buf.extend_from_slice(&type_word.to_le_bytes());
    buf.extend_from_slice(&0u32.to_le_bytes());
    buf.extend_from_slice(&(points.len() as u32).to_le_bytes());
    for p in points {
        buf.extend_from_slice(&p.x.to_le_bytes());
        buf.extend_from_slice(&p.y.to_le_bytes());
        buf.extend_from_slice(&p.z.to_le_bytes());
        buf.extend_from_slice(&p.m.to_le_bytes());
    }
    buf
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn point_is_exactly_41_bytes() {
        let p = Point4::new(0.1, 0.2, 0.3, 0.4);
        assert_eq!(encode_point_zm(&p).len(), 41);
    }

    #[test]
    fn point_round_trips_coordinates() {
        let p = Point4::new(0.5, -0.5, 0.25, -0.25);
        let buf = encode_point_zm(&p);
        assert_eq!(buf[0], 1);
        let x = f64::from_le_bytes(buf[9..17].try_into().unwrap());
        let m = f64::from_le_bytes(buf[33..41].try_into().unwrap());
        assert_eq!(x, 0.5);
        assert_eq!(m, -0.25);
    }

    #[test]
    fn linestring_length_matches_point_count() {
        let pts = vec![
            Point4::new(0.0, 0.0, 0.0, 1.0),
            Point4::new(1.0, 0.0, 0.0, 0.0),
            Point4::new(0.0, 1.0, 0.0, 0.0),
        ];
        let buf = encode_linestring_zm(&pts);
        assert_eq!(buf.len(), 9 + 3 * 32);
        let count = u32::from_le_bytes(buf[5..9].try_into().unwrap());
        assert_eq!(count, 3);
    }
}
