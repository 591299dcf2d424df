//! Gate kernels over amplitude slices.
//!
//! Every kernel works on a slice whose length is a power of two and at least
//! `2^(q+1)` for the highest qubit `q` it touches. An aligned chunk of the
//! full state satisfies this as well, which is what lets a dependency level
//! be applied chunk by chunk.
//!
//! Each kernel visits an index group exactly once: the group is enumerated
//! from its representative with all touched bits cleared (or, for controlled
//! kernels, with the control bits set and the target bits cleared).

use num_complex::Complex;
use rayon::prelude::*;

use crate::real::Real;

/// 2×2 complex matrix in the run's precision.
pub type Mat2<T> = [[Complex<T>; 2]; 2];

/// 4×4 complex matrix in the run's precision, first operand most significant.
pub type Mat4<T> = [[Complex<T>; 4]; 4];

#[inline]
fn mul2<T: Real>(m: &Mat2<T>, a: Complex<T>, b: Complex<T>) -> (Complex<T>, Complex<T>) {
    (m[0][0] * a + m[0][1] * b, m[1][0] * a + m[1][1] * b)
}

/// Apply a single-qubit matrix to every `(i, i | 1<<qubit)` pair.
pub fn apply_single<T: Real>(amps: &mut [Complex<T>], m: &Mat2<T>, qubit: usize) {
    let stride = 1usize << qubit;
    for block in amps.chunks_exact_mut(stride << 1) {
        let (lo, hi) = block.split_at_mut(stride);
        for (a, b) in lo.iter_mut().zip(hi.iter_mut()) {
            let (x, y) = mul2(m, *a, *b);
            *a = x;
            *b = y;
        }
    }
}

/// Parallel form of [`apply_single`], splitting both across blocks and within each block.
pub fn apply_single_par<T: Real>(amps: &mut [Complex<T>], m: &Mat2<T>, qubit: usize) {
    let stride = 1usize << qubit;
    amps.par_chunks_exact_mut(stride << 1).for_each(|block| {
        let (lo, hi) = block.split_at_mut(stride);
        lo.par_iter_mut()
            .zip(hi.par_iter_mut())
            .for_each(|(a, b)| {
                let (x, y) = mul2(m, *a, *b);
                *a = x;
                *b = y;
            });
    });
}

/// Apply `m` to the target pair of every index whose control bit is set.
pub fn apply_controlled<T: Real>(amps: &mut [Complex<T>], m: &Mat2<T>, control: usize, target: usize) {
    let cmask = 1usize << control;
    let tmask = 1usize << target;
    for i in 0..amps.len() {
        if i & cmask != 0 && i & tmask == 0 {
            let j = i | tmask;
            let (x, y) = mul2(m, amps[i], amps[j]);
            amps[i] = x;
            amps[j] = y;
        }
    }
}

/// CNOT: swap the target pair wherever the control bit is set.
pub fn apply_cnot<T: Real>(amps: &mut [Complex<T>], control: usize, target: usize) {
    let cmask = 1usize << control;
    let tmask = 1usize << target;
    for i in 0..amps.len() {
        if i & cmask != 0 && i & tmask == 0 {
            amps.swap(i, i | tmask);
        }
    }
}

/// CZ: negate amplitudes with both bits set.
pub fn apply_cz<T: Real>(amps: &mut [Complex<T>], a: usize, b: usize) {
    let mask = (1usize << a) | (1usize << b);
    for (i, amp) in amps.iter_mut().enumerate() {
        if i & mask == mask {
            *amp = -*amp;
        }
    }
}

/// Controlled phase: multiply amplitudes with both bits set by `phase`.
pub fn apply_controlled_phase<T: Real>(amps: &mut [Complex<T>], phase: Complex<T>, a: usize, b: usize) {
    let mask = (1usize << a) | (1usize << b);
    for (i, amp) in amps.iter_mut().enumerate() {
        if i & mask == mask {
            *amp = *amp * phase;
        }
    }
}

/// Apply a 4×4 matrix to each quadruple of indices differing in bits `q0`, `q1`.
pub fn apply_two_qubit<T: Real>(amps: &mut [Complex<T>], m: &Mat4<T>, q0: usize, q1: usize) {
    let m0 = 1usize << q0;
    let m1 = 1usize << q1;
    for i in 0..amps.len() {
        if i & (m0 | m1) == 0 {
            let idx = [i, i | m1, i | m0, i | m0 | m1];
            let v = idx.map(|k| amps[k]);
            for (r, &k) in idx.iter().enumerate() {
                amps[k] = m[r][0] * v[0] + m[r][1] * v[1] + m[r][2] * v[2] + m[r][3] * v[3];
            }
        }
    }
}

/// SWAP: exchange amplitudes whose bits `a` and `b` differ.
pub fn apply_swap<T: Real>(amps: &mut [Complex<T>], a: usize, b: usize) {
    let amask = 1usize << a;
    let bmask = 1usize << b;
    for i in 0..amps.len() {
        if i & amask != 0 && i & bmask == 0 {
            amps.swap(i, (i & !amask) | bmask);
        }
    }
}

/// Toffoli: swap the target pair wherever both controls are set.
pub fn apply_toffoli<T: Real>(amps: &mut [Complex<T>], c0: usize, c1: usize, target: usize) {
    let cmask = (1usize << c0) | (1usize << c1);
    let tmask = 1usize << target;
    for i in 0..amps.len() {
        if i & cmask == cmask && i & tmask == 0 {
            amps.swap(i, i | tmask);
        }
    }
}

/// Fredkin: swap `a` and `b` wherever the control is set.
pub fn apply_cswap<T: Real>(amps: &mut [Complex<T>], control: usize, a: usize, b: usize) {
    let cmask = 1usize << control;
    let amask = 1usize << a;
    let bmask = 1usize << b;
    for i in 0..amps.len() {
        if i & cmask != 0 && i & amask != 0 && i & bmask == 0 {
            amps.swap(i, (i & !amask) | bmask);
        }
    }
}

/// CCZ: negate amplitudes with all three bits set.
pub fn apply_ccz<T: Real>(amps: &mut [Complex<T>], a: usize, b: usize, c: usize) {
    let mask = (1usize << a) | (1usize << b) | (1usize << c);
    for (i, amp) in amps.iter_mut().enumerate() {
        if i & mask == mask {
            *amp = -*amp;
        }
    }
}

/// Compute `output = U · input` for a dense `2^k × 2^k` unitary on `qubits`.
///
/// `qubits[0]` is the most significant bit of the matrix index. The output
/// is written element by element in parallel, reading only `input`.
pub fn apply_dense_into<T: Real>(
    input: &[Complex<T>],
    output: &mut [Complex<T>],
    matrix: &[Complex<T>],
    qubits: &[usize],
) {
    let k = qubits.len();
    let dim = 1usize << k;
    // masks[pos] is the state bit for matrix bit (k - 1 - pos)
    let masks: Vec<usize> = qubits.iter().map(|&q| 1usize << q).collect();
    let clear = !masks.iter().fold(0, |acc, m| acc | m);

    output.par_iter_mut().enumerate().for_each(|(i, out)| {
        let mut row = 0usize;
        for (pos, mask) in masks.iter().enumerate() {
            if i & mask != 0 {
                row |= 1 << (k - 1 - pos);
            }
        }
        let base = i & clear;
        let mut acc = Complex::new(T::zero(), T::zero());
        for col in 0..dim {
            let mut idx = base;
            for (pos, mask) in masks.iter().enumerate() {
                if col & (1 << (k - 1 - pos)) != 0 {
                    idx |= mask;
                }
            }
            acc = acc + matrix[row * dim + col] * input[idx];
        }
        *out = acc;
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use num_complex::Complex64;

    fn approx_eq(a: Complex64, b: Complex64) -> bool {
        (a - b).norm() < 1e-10
    }

    fn ramp(n: usize) -> Vec<Complex64> {
        (0..n)
            .map(|i| Complex64::new(i as f64 + 1.0, -(i as f64) * 0.5))
            .collect()
    }

    fn x() -> Mat2<f64> {
        let o = Complex64::new(0.0, 0.0);
        let l = Complex64::new(1.0, 0.0);
        [[o, l], [l, o]]
    }

    #[test]
    fn test_single_touches_each_pair_once() {
        let mut amps = ramp(8);
        apply_single(&mut amps, &x(), 1);
        let expected = [2, 3, 0, 1, 6, 7, 4, 5];
        let original = ramp(8);
        for (i, &src) in expected.iter().enumerate() {
            assert!(approx_eq(amps[i], original[src]));
        }
    }

    #[test]
    fn test_single_par_matches_sequential() {
        let m = x();
        for qubit in 0..4 {
            let mut seq = ramp(16);
            let mut par = ramp(16);
            apply_single(&mut seq, &m, qubit);
            apply_single_par(&mut par, &m, qubit);
            assert_eq!(seq, par);
        }
    }

    #[test]
    fn test_cnot_equals_controlled_x() {
        let mut a = ramp(8);
        let mut b = ramp(8);
        apply_cnot(&mut a, 2, 0);
        apply_controlled(&mut b, &x(), 2, 0);
        assert_eq!(a, b);
    }

    #[test]
    fn test_swap_moves_bits() {
        let mut amps = vec![Complex64::new(0.0, 0.0); 4];
        amps[0b01] = Complex64::new(1.0, 0.0);
        apply_swap(&mut amps, 0, 1);
        assert!(approx_eq(amps[0b10], Complex64::new(1.0, 0.0)));
        assert!(approx_eq(amps[0b01], Complex64::new(0.0, 0.0)));
    }

    #[test]
    fn test_toffoli_and_cswap() {
        let mut amps = vec![Complex64::new(0.0, 0.0); 8];
        amps[0b011] = Complex64::new(1.0, 0.0);
        apply_toffoli(&mut amps, 0, 1, 2);
        assert!(approx_eq(amps[0b111], Complex64::new(1.0, 0.0)));

        apply_cswap(&mut amps, 2, 1, 0);
        // bits 1 and 0 are equal, nothing moves
        assert!(approx_eq(amps[0b111], Complex64::new(1.0, 0.0)));

        let mut amps = vec![Complex64::new(0.0, 0.0); 8];
        amps[0b110] = Complex64::new(1.0, 0.0);
        apply_cswap(&mut amps, 2, 1, 0);
        assert!(approx_eq(amps[0b101], Complex64::new(1.0, 0.0)));
    }

    #[test]
    fn test_dense_matches_cnot() {
        let o = Complex64::new(0.0, 0.0);
        let l = Complex64::new(1.0, 0.0);
        let cnot = vec![l, o, o, o, o, l, o, o, o, o, o, l, o, o, l, o];

        let input = ramp(8);
        let mut output = vec![o; 8];
        apply_dense_into(&input, &mut output, &cnot, &[1, 2]);

        let mut expected = ramp(8);
        apply_cnot(&mut expected, 1, 2);
        for (a, b) in output.iter().zip(expected.iter()) {
            assert!(approx_eq(*a, *b));
        }
    }
}
