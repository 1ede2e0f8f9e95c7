//! Complex-valued quadratic interpolation between neighbouring bins.

use rustfft::num_complex::Complex64;

/// Evaluates, at `offset`, the quadratics through the real and imaginary parts
/// of `(-1, xm)`, `(0, x0)`, `(+1, xp)`.
///
/// The parabola through three equally spaced points is exact, so this matches
/// a degree-2 least-squares polynomial fit of each component.
pub fn interpolate_complex(xm: Complex64, x0: Complex64, xp: Complex64, offset: f64) -> Complex64 {
    let a = (xp + xm) * 0.5 - x0;
    let b = (xp - xm) * 0.5;
    (a * offset + b) * offset + x0
}

#[cfg(test)]
mod tests {
    use super::interpolate_complex;
    use rustfft::num_complex::Complex64;

    #[test]
    fn reproduces_samples_at_nodes() {
        let xm = Complex64::new(1.0, -2.0);
        let x0 = Complex64::new(3.0, 0.5);
        let xp = Complex64::new(-1.0, 4.0);
        assert_eq!(interpolate_complex(xm, x0, xp, 0.0), x0);
        assert!((interpolate_complex(xm, x0, xp, -1.0) - xm).norm() < 1e-12);
        assert!((interpolate_complex(xm, x0, xp, 1.0) - xp).norm() < 1e-12);
    }

    #[test]
    fn matches_independent_quadratics() {
        let re = |x: f64| 0.5 * x * x - 1.5 * x + 2.0;
        let im = |x: f64| -2.0 * x * x + 0.25 * x - 1.0;
        let at = |x: f64| Complex64::new(re(x), im(x));
        let got = interpolate_complex(at(-1.0), at(0.0), at(1.0), 0.3);
        assert!((got - at(0.3)).norm() < 1e-12);
    }
}
