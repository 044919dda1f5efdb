//! Single-cell pulse shape: a normalized double-exponential response,
//! precomputed once as a template (fast mode) or evaluated on demand (exact
//! mode). Both modes must agree to floating point roundoff; `PulseShape`'s
//! two `add_pulse*` methods are tested against each other directly.

/// A cell's response to an avalanche at `x = 0` (x in samples):
///
///   s(x) = K * (exp(-x / tfall) - exp(-x / trise))      x >= 0
///
/// normalized so that `max_x s(x) == 1`.
pub struct PulseShape {
    tfall: f64,
    trise: f64,
    /// Normalization constant K.
    k: f64,
    /// Precomputed s(x) for x = 0..sigpts-1, used by the fast shift-and-scale path.
    template: Vec<f64>,
}

impl PulseShape {
    /// Builds the shape for the given time constants (already expressed in
    /// samples, see `Config::tf_samples` / `Config::tr_samples`) and
    /// precomputes the `sigpts`-long template.
    pub fn new(tfall: f64, trise: f64, sigpts: usize) -> Self {
        let k = 1.0 / Self::unnormalized(tfall, trise, Self::peak_location(tfall, trise));
        let template = (0..sigpts)
            .map(|x| k * Self::unnormalized(tfall, trise, x as f64))
            .collect();
        PulseShape {
            tfall,
            trise,
            k,
            template,
        }
    }

    fn unnormalized(tfall: f64, trise: f64, x: f64) -> f64 {
        if x < 0.0 {
            0.0
        } else {
            (-x / tfall).exp() - (-x / trise).exp()
        }
    }

    /// The extremum of the unnormalized shape: x* = ln(trise/tfall) * tfall * trise / (tfall - trise).
    fn peak_location(tfall: f64, trise: f64) -> f64 {
        (trise / tfall).ln() * tfall * trise / (tfall - trise)
    }

    /// Value of the normalized shape at sample offset `x` (x may be
    /// fractional; used only by the exact path, which is otherwise only
    /// ever called with integer offsets in this crate).
    pub fn eval(&self, x: f64) -> f64 {
        self.k * Self::unnormalized(self.tfall, self.trise, x)
    }

    pub fn template(&self) -> &[f64] {
        &self.template
    }

    /// Fast path: output[t+i] += h * template[i] for i in [0, len(template) - t).
    /// `t` beyond the template length is a no-op (the pulse starts after the
    /// end of the signal window).
    pub fn add_pulse_fast(&self, output: &mut [f64], t: usize, h: f64) {
        if t >= output.len() {
            return;
        }
        let n = output.len() - t;
        for i in 0..n {
            output[t + i] += h * self.template[i];
        }
    }

    /// Exact path: recompute s(x - t) sample by sample instead of reusing the
    /// template. Used for validation and when `exact_signal` is configured.
    pub fn add_pulse_exact(&self, output: &mut [f64], t: usize, h: f64) {
        for (i, sample) in output.iter_mut().enumerate() {
            let x = i as f64 - t as f64;
            *sample += h * Self::unnormalized(self.tfall, self.trise, x) * self.k;
        }
    }
}
