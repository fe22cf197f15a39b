use std::fmt;
use std::time::Duration;

/// Timings of a reference run and a variant run on identical inputs.
#[derive(Debug, Clone, Copy)]
pub struct Comparison {
    pub reference: Duration,
    pub variant: Duration,
    /// Worker count for parallel runs; `None` for single-threaded ones,
    /// which report no efficiency.
    pub workers: Option<usize>,
}

impl Comparison {
    /// `t_reference / t_variant`.
    pub fn speedup(&self) -> f64 {
        let variant = self.variant.as_secs_f64();
        if variant == 0.0 {
            return f64::INFINITY;
        }
        self.reference.as_secs_f64() / variant
    }

    /// Speedup per worker.
    pub fn efficiency(&self) -> Option<f64> {
        self.workers.map(|w| self.speedup() / w.max(1) as f64)
    }

    /// Time saved relative to the reference, as a percentage.
    pub fn improvement_pct(&self) -> f64 {
        let reference = self.reference.as_secs_f64();
        if reference == 0.0 {
            return 0.0;
        }
        (reference - self.variant.as_secs_f64()) / reference * 100.0
    }
}

impl fmt::Display for Comparison {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Speedup: {:.2}x", self.speedup())?;
        if let Some(efficiency) = self.efficiency() {
            writeln!(f, "Efficiency: {:.2}%", efficiency * 100.0)?;
        }
        write!(f, "Improvement: {:.1}%", self.improvement_pct())
    }
}
