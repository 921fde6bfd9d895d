use std::f64::consts::PI;
use std::sync::{Arc, OnceLock};

use emo_core::Kernel;
use log::debug;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// The closed set of kernels the detector knows about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum KernelKind {
    SobelX,
    SobelY,
    Gaussian5Sigma1,
    Gaussian5Sigma3,
    Gaussian9Sigma3,
}

const KIND_COUNT: usize = 5;

impl KernelKind {
    pub const ALL: [KernelKind; KIND_COUNT] = [
        KernelKind::SobelX,
        KernelKind::SobelY,
        KernelKind::Gaussian5Sigma1,
        KernelKind::Gaussian5Sigma3,
        KernelKind::Gaussian9Sigma3,
    ];

    fn slot(self) -> usize {
        self as usize
    }

    pub fn is_gaussian(self) -> bool {
        !matches!(self, KernelKind::SobelX | KernelKind::SobelY)
    }

    /// Construct the kernel's coefficients from scratch.
    pub fn build(self) -> Kernel {
        match self {
            KernelKind::SobelX => Kernel::new(
                3,
                3,
                vec![
                    -1.0, 0.0, 1.0, //
                    -2.0, 0.0, 2.0, //
                    -1.0, 0.0, 1.0,
                ],
                1.0,
                0.0,
            ),
            KernelKind::SobelY => Kernel::new(
                3,
                3,
                vec![
                    -1.0, -2.0, -1.0, //
                    0.0, 0.0, 0.0, //
                    1.0, 2.0, 1.0,
                ],
                1.0,
                0.0,
            ),
            KernelKind::Gaussian5Sigma1 => gaussian_kernel(5, 1.0),
            KernelKind::Gaussian5Sigma3 => gaussian_kernel(5, 3.0),
            KernelKind::Gaussian9Sigma3 => gaussian_kernel(9, 3.0),
        }
    }
}

/// Square Gaussian sampled from the 2D density, rescaled so the
/// coefficients sum to one (`scale = 1 / sum`).
pub fn gaussian_kernel(size: usize, sigma: f64) -> Kernel {
    assert!(size % 2 == 1, "Gaussian size must be odd (got {})", size);
    assert!(sigma > 0.0, "sigma must be positive");

    let half = (size / 2) as f64;
    let two_sigma_sq = 2.0 * sigma * sigma;
    let norm = 1.0 / (PI * two_sigma_sq);

    let mut values = Vec::with_capacity(size * size);
    for r in 0..size {
        let y = r as f64 - half;
        for c in 0..size {
            let x = c as f64 - half;
            values.push(norm * (-(x * x + y * y) / two_sigma_sq).exp());
        }
    }
    Kernel::normalized(size, size, values)
}

/// Anything that can hand out kernels by kind.
pub trait KernelSource: Send + Sync {
    fn kernel(&self, kind: KernelKind) -> &Kernel;
}

/// Lazily populated kernel cache, one instance per kind.
///
/// First construction of a kind is serialised by its `OnceLock`; afterwards
/// lookups are plain reads.
#[derive(Debug, Default)]
pub struct KernelRegistry {
    slots: [OnceLock<Kernel>; KIND_COUNT],
}

impl KernelRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Process-wide registry.
    pub fn global() -> &'static KernelRegistry {
        static GLOBAL: OnceLock<KernelRegistry> = OnceLock::new();
        GLOBAL.get_or_init(KernelRegistry::new)
    }

    pub fn get(&self, kind: KernelKind) -> &Kernel {
        self.slots[kind.slot()].get_or_init(|| {
            let kernel = kind.build();
            debug!(
                "Built {:?} kernel ({}x{}, scale {:.6})",
                kind,
                kernel.rows(),
                kernel.cols(),
                kernel.scale()
            );
            kernel
        })
    }

    /// Whether `kind` has been constructed yet.
    pub fn is_built(&self, kind: KernelKind) -> bool {
        self.slots[kind.slot()].get().is_some()
    }
}

impl KernelSource for KernelRegistry {
    fn kernel(&self, kind: KernelKind) -> &Kernel {
        self.get(kind)
    }
}

impl<T: KernelSource + ?Sized> KernelSource for &T {
    fn kernel(&self, kind: KernelKind) -> &Kernel {
        (**self).kernel(kind)
    }
}

impl<T: KernelSource + ?Sized> KernelSource for Arc<T> {
    fn kernel(&self, kind: KernelKind) -> &Kernel {
        (**self).kernel(kind)
    }
}
