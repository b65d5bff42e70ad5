//! Hermite Gaussian building blocks of the McMurchie-Davidson scheme.
use nalgebra::Vector3;

/// Coefficient E_t^{ij} expanding the product of two 1D cartesian gaussians with exponents `a`
/// and `b` into hermite gaussians. `distance` is A - B along the axis.
pub(crate) fn hermite_expansion([i, j, t]: [i32; 3], distance: f64, a: f64, b: f64) -> f64 {
    if i < 0 || j < 0 || t < 0 || t > i + j {
        return 0.0;
    }

    let p = a + b;
    let q = a * b / p;

    if i == 0 && j == 0 && t == 0 {
        (-q * distance.powi(2)).exp()
    } else if j == 0 {
        // decrement i
        (2.0 * p).recip() * hermite_expansion([i - 1, j, t - 1], distance, a, b)
            - (q * distance / a) * hermite_expansion([i - 1, j, t], distance, a, b)
            + (t + 1) as f64 * hermite_expansion([i - 1, j, t + 1], distance, a, b)
    } else {
        // decrement j
        (2.0 * p).recip() * hermite_expansion([i, j - 1, t - 1], distance, a, b)
            + (q * distance / b) * hermite_expansion([i, j - 1, t], distance, a, b)
            + (t + 1) as f64 * hermite_expansion([i, j - 1, t + 1], distance, a, b)
    }
}

/// F_n(x). Arguments this close to zero are taken from the first two Taylor terms, where the
/// incomplete gamma form divides by a vanishing power of x.
fn boys_function(n: i32, x: f64) -> f64 {
    const SMALL_ARGUMENT: f64 = 1e-10;

    if x < SMALL_ARGUMENT {
        let two_n = 2.0 * n as f64;
        (two_n + 1.0).recip() - x / (two_n + 3.0)
    } else {
        boys::exact::boys(n as u64, x)
    }
}

/// Hermite coulomb integral R_{tuv}^n for a composite exponent `p` and the vector `pc` from the
/// charge center C to the gaussian product center P.
pub(crate) fn coulomb_auxiliary(t: i32, u: i32, v: i32, n: i32, p: f64, pc: Vector3<f64>) -> f64 {
    if t < 0 || u < 0 || v < 0 {
        return 0.0;
    }

    if t == 0 && u == 0 && v == 0 {
        return (-2.0 * p).powi(n) * boys_function(n, p * pc.norm_squared());
    }

    if t == 0 && u == 0 {
        (v - 1) as f64 * coulomb_auxiliary(t, u, v - 2, n + 1, p, pc)
            + pc.z * coulomb_auxiliary(t, u, v - 1, n + 1, p, pc)
    } else if t == 0 {
        (u - 1) as f64 * coulomb_auxiliary(t, u - 2, v, n + 1, p, pc)
            + pc.y * coulomb_auxiliary(t, u - 1, v, n + 1, p, pc)
    } else {
        (t - 1) as f64 * coulomb_auxiliary(t - 2, u, v, n + 1, p, pc)
            + pc.x * coulomb_auxiliary(t - 1, u, v, n + 1, p, pc)
    }
}
