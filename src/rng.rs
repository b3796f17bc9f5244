//! Process-wide, swappable random source.
//!
//! Unrelated subsystems (map generation here; dice-style rolls in client
//! code) share one default generator rather than each carrying their own.
//! The FOV engine itself never draws randomness.

use std::sync::Mutex;

use once_cell::sync::Lazy;
use rand::rngs::SmallRng;
use rand::{RngCore, SeedableRng};

/// The default generator: a fast non-cryptographic RNG seeded from OS
/// entropy at first use.
static GLOBAL_RNG: Lazy<Mutex<Box<dyn RngCore + Send>>> =
    Lazy::new(|| Mutex::new(Box::new(SmallRng::from_entropy())));

/// Replace the global generator.
///
/// Tests install a seeded generator here to make generation deterministic.
pub fn set_global_rng(rng: impl RngCore + Send + 'static) {
    *GLOBAL_RNG.lock().expect("global rng lock poisoned") = Box::new(rng);
}

/// Reseed the global generator deterministically.
pub fn seed_global_rng(seed: u64) {
    set_global_rng(SmallRng::seed_from_u64(seed));
}

/// Run `f` with exclusive access to the global generator.
///
/// Panics if the lock is poisoned (a previous user panicked mid-draw);
/// there is no sensible recovery from a torn generator state.
pub fn with_global_rng<T>(f: impl FnOnce(&mut dyn RngCore) -> T) -> T {
    let mut rng = GLOBAL_RNG.lock().expect("global rng lock poisoned");
    f(rng.as_mut())
}
