// src/simd.rs

//! Runtime CPU capability detection.
//!
//! Detection runs once per process and is cached; every dispatch site asks
//! `SimdLevel::detect()` (or validates a caller-forced level against
//! `is_available`) instead of probing the CPU again.

use std::fmt;
use std::sync::OnceLock;

use log::info;

/// Execution paths the kernels can run on, ordered from narrowest to widest.
///
/// `Sse` is the 128-bit path (SSE2, the x86_64 baseline). `Avx` is the
/// 256-bit path and is only reported available when both AVX2 and FMA are
/// present, which is the gate the 256-bit kernels assume.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum SimdLevel {
    Scalar,
    Sse,
    Avx,
}

impl SimdLevel {
    /// Best level supported by the running CPU.
    pub fn detect() -> SimdLevel {
        Capabilities::get().best
    }

    /// Capability-flag check: is this path usable on the running CPU?
    pub fn is_available(self) -> bool {
        self <= Capabilities::get().best
    }
}

impl fmt::Display for SimdLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SimdLevel::Scalar => write!(f, "scalar"),
            SimdLevel::Sse => write!(f, "SSE"),
            SimdLevel::Avx => write!(f, "AVX"),
        }
    }
}

/// Detected CPU features relevant to the kernels.
#[derive(Debug, Clone)]
pub struct Capabilities {
    pub has_sse2: bool,
    pub has_sse41: bool,
    pub has_avx: bool,
    pub has_avx2: bool,
    pub has_fma: bool,
    pub best: SimdLevel,
}

static CAPS: OnceLock<Capabilities> = OnceLock::new();

impl Capabilities {
    /// Detection result for this process, computed on first use.
    pub fn get() -> &'static Capabilities {
        CAPS.get_or_init(|| {
            let caps = Capabilities::probe();
            info!("SIMD detection: {}", caps.summary());
            caps
        })
    }

    fn probe() -> Capabilities {
        let mut caps = Capabilities {
            has_sse2: false,
            has_sse41: false,
            has_avx: false,
            has_avx2: false,
            has_fma: false,
            best: SimdLevel::Scalar,
        };

        #[cfg(target_arch = "x86_64")]
        {
            // SSE2 is part of the x86_64 baseline.
            caps.has_sse2 = true;
            caps.has_sse41 = is_x86_feature_detected!("sse4.1");
            caps.has_avx = is_x86_feature_detected!("avx");
            caps.has_avx2 = is_x86_feature_detected!("avx2");
            caps.has_fma = is_x86_feature_detected!("fma");

            caps.best = if caps.has_avx2 && caps.has_fma {
                SimdLevel::Avx
            } else {
                SimdLevel::Sse
            };
        }

        caps
    }

    /// Number of f32 lanes the best path processes per operation.
    pub fn f32_lane_count(&self) -> usize {
        match self.best {
            SimdLevel::Scalar => 1,
            SimdLevel::Sse => 4,
            SimdLevel::Avx => 8,
        }
    }

    /// Human-readable report of the detected features.
    pub fn summary(&self) -> String {
        let mut features = Vec::new();
        if self.has_sse2 {
            features.push("SSE2");
        }
        if self.has_sse41 {
            features.push("SSE4.1");
        }
        if self.has_avx {
            features.push("AVX");
        }
        if self.has_avx2 {
            features.push("AVX2");
        }
        if self.has_fma {
            features.push("FMA");
        }

        if features.is_empty() {
            format!("best path: {} (no x86 SIMD features)", self.best)
        } else {
            format!(
                "best path: {} | features: {} | {} f32 lanes",
                self.best,
                features.join(", "),
                self.f32_lane_count()
            )
        }
    }
}

impl fmt::Display for Capabilities {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.summary())
    }
}
