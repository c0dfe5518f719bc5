//! # GDSII 8-byte reals
//!
//! GDSII stores floating-point numbers in the IBM 370 format: a sign bit,
//! a 7-bit base-16 exponent biased by 64, and a 56-bit base-16 significand
//! stored big-endian.  Conversion to `f64` loses the bottom three bits of
//! the significand.

/// Convert the 8-byte IBM 370 representation to a host double.
pub fn gds_real_to_f64(buf: &[u8]) -> f64 {
    // 16**n == 2**(4*n), so the base-16 exponent converts directly to a
    // base-2 exponent.  The significand has no hidden bit; treat each of
    // the 7 bytes as a base-256 digit.
    let sign = match buf[0] & 0x80 { 0 => 1.0, _ => -1.0 };
    let exponent = 4 * ((buf[0] & 0x7f) as i32 - 64);
    let mut significand = 0.0;
    let mut divisor = 256.0;
    for j in 1..8 {
        significand += buf[j] as f64 / divisor;
        divisor *= 256.0;
    }
    sign * significand * f64::powi(2.0,exponent)
}

/// Split a positive finite double into (significand, exponent) with the
/// significand in [0.5,1.0), i.e. val = significand * 2^exponent.
fn frexp(val: f64) -> (f64,i32) {
    let bits = val.to_bits();
    let raw_exp = ((bits >> 52) & 0x7ff) as i32;
    if raw_exp==0 {
        // subnormal: scale up into the normal range first
        let (m,e) = frexp(val * f64::powi(2.0,64));
        return (m,e-64);
    }
    let mantissa = f64::from_bits((bits & !(0x7ffu64 << 52)) | (1022u64 << 52));
    (mantissa,raw_exp - 1022)
}

/// Convert a double to the GDSII 8-byte representation.
/// Returns None if the value is outside the representable range.
pub fn f64_to_gds_real(val: f64) -> Option<[u8;8]> {
    let mut buf = [0;8];
    // without this special case 0 would get biased exponent 64
    if val==0.0 {
        return Some(buf);
    }
    let sign_bit: u8 = match val < 0.0 { true => 0x80, false => 0 };
    let val = val.abs();
    let (mut significand,mut exponent) = frexp(val);

    // The base-2 exponent must be a multiple of 4 before it can become a
    // base-16 exponent.  Shift the significand right to round it up; the
    // significand ends in [1/16,1) as GDSII requires.
    let excess = exponent.rem_euclid(4);
    if excess != 0 {
        exponent += 4 - excess;
        significand *= f64::powi(2.0,excess - 4);
    }
    let mut exponent = exponent/4 + 64;
    if exponent < 0 || exponent > 127 {
        // GDSII has 56 significand bits to the double's 53, so the largest
        // GDSII real reads back as 1.0 * 16^63 = 0.0625 * 16^64, which is
        // out of range.  Re-encode that one value as (1-eps) * 16^63.
        if exponent==128 && significand==0.0625 {
            exponent -= 1;
            significand = 1.0 - f64::EPSILON;
        } else {
            return None;
        }
    }
    buf[0] = sign_bit | exponent as u8;
    // each output byte is a base-256 digit of the significand
    for j in 1..8 {
        significand *= 256.0;
        buf[j] = significand as u8;
        significand -= significand.floor();
    }
    Some(buf)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn round_trip(d: f64) -> f64 {
        gds_real_to_f64(&f64_to_gds_real(d).expect("out of range"))
    }
    #[test]
    fn exact_values() {
        // values with short base-16 significands survive exactly
        for d in [0.0,1.0,-1.0,0.5,2.0,1e-3,-1e-3,0.0625,256.0,1.0e9,6.25e-10] {
            assert_eq!(round_trip(d),d);
        }
    }
    #[test]
    fn precision_bound() {
        // anything in range must come back within 8 ulp
        for d in [std::f64::consts::PI,1.0e-9,2.5e-7,1.0/3.0,9.87654321e20] {
            let diff = (round_trip(d) - d).abs();
            let ulp = f64::powi(2.0,d.abs().log2().floor() as i32 - 52);
            assert!(diff <= 8.0*ulp,"{} came back as {}",d,round_trip(d));
        }
    }
    #[test]
    fn boundary_value() {
        // 0.0625 * 16^64 re-encodes as (1-eps) * 16^63
        let d = 0.0625 * f64::powi(16.0,64);
        let buf = f64_to_gds_real(d).expect("boundary value must encode");
        assert_eq!(buf[0] & 0x7f,127);
        assert_eq!(gds_real_to_f64(&buf),(1.0 - f64::EPSILON) * f64::powi(16.0,63));
    }
    #[test]
    fn out_of_range() {
        assert!(f64_to_gds_real(1.0e80).is_none());
        assert!(f64_to_gds_real(f64::powi(2.0,-300)).is_none());
    }
    #[test]
    fn known_bytes() {
        // 1.0 = 0.0625 * 16^1: exponent 65, significand 0x10...
        assert_eq!(f64_to_gds_real(1.0).unwrap(),[0x41,0x10,0,0,0,0,0,0]);
        assert_eq!(f64_to_gds_real(-1.0).unwrap(),[0xc1,0x10,0,0,0,0,0,0]);
        // 1e-3 appears in most UNITS records
        assert_eq!(f64_to_gds_real(0.001).unwrap(),[0x3e,0x41,0x89,0x37,0x4b,0xc6,0xa7,0xef]);
    }
}
