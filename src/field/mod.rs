//! Arithmetic in the cell ring ℤ/256ℤ.
//!
//! Cells are `u8` with wrapping arithmetic. Loop folding needs two things
//! beyond that: multiplicative inverses of odd elements, and solving
//! `n·d ≡ x (mod 256)` for the iteration count of a counted loop.

/// Number of elements in the cell ring.
pub const MODULUS: u32 = 256;

/// Interpret a cell delta as a signed value in `-128..=127`.
pub fn signed(value: u8) -> i16 {
    value as i8 as i16
}

/// Reduce a signed quantity into the cell ring.
pub fn reduce(value: i64) -> u8 {
    value.rem_euclid(MODULUS as i64) as u8
}

/// Multiplicative inverse mod 256. Only odd elements are units.
///
/// Newton iteration: an odd `d` is its own inverse mod 8, and each step
/// doubles the number of correct low bits (3 → 6 → 12).
pub fn inverse(d: u8) -> Option<u8> {
    if d % 2 == 0 {
        return None;
    }
    let mut x = d;
    for _ in 0..2 {
        x = x.wrapping_mul(2u8.wrapping_sub(d.wrapping_mul(x)));
    }
    debug_assert_eq!(d.wrapping_mul(x), 1);
    Some(x)
}

/// Smallest `n` with `n·d ≡ x (mod 256)`: the iteration count of a loop
/// that subtracts `d` from a control cell starting at `x`.
///
/// `None` means no such `n` exists and the loop never reaches zero.
pub fn iterations(x: u8, d: u8) -> Option<u8> {
    if x == 0 {
        return Some(0);
    }
    if d == 0 {
        return None;
    }
    let shift = d.trailing_zeros();
    let g = 1u32 << shift;
    if (x as u32) % g != 0 {
        return None;
    }
    // Odd part of d is a unit, so its inverse also works mod 256/g.
    let unit = inverse(d >> shift)?;
    let modulus = MODULUS / g;
    let n = ((x as u32 >> shift) * unit as u32) % modulus;
    Some(n as u8)
}
