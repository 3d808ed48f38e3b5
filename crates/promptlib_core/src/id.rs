//! Opaque identifier generation.
//!
//! # Responsibility
//! - Produce globally unique string ids for lists and prompts.
//!
//! # Invariants
//! - Generated ids are never empty.
//! - OS randomness is preferred; a time+random composite is used only when
//!   the OS source fails.

use log::warn;
use rand::rngs::{OsRng, StdRng};
use rand::{Rng, RngCore, SeedableRng};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{SystemTime, UNIX_EPOCH};
use uuid::Builder;

const FALLBACK_SUFFIX_LEN: usize = 8;
const BASE36_DIGITS: &[u8; 36] = b"0123456789abcdefghijklmnopqrstuvwxyz";

static FALLBACK_COUNTER: AtomicU64 = AtomicU64::new(0);

/// Source of fresh record ids.
pub trait IdGenerator {
    fn generate(&self) -> String;
}

/// Default generator backed by random v4 UUIDs.
#[derive(Debug, Clone, Copy, Default)]
pub struct RandomIdGenerator;

impl IdGenerator for RandomIdGenerator {
    fn generate(&self) -> String {
        generate_id()
    }
}

/// Generates one id using OS randomness, or the composite fallback.
pub fn generate_id() -> String {
    let mut bytes = [0_u8; 16];
    match OsRng.try_fill_bytes(&mut bytes) {
        Ok(()) => Builder::from_random_bytes(bytes).into_uuid().to_string(),
        Err(err) => {
            warn!("event=id_generate module=id status=fallback error={err}");
            fallback_id()
        }
    }
}

/// Builds `id-<millis base36>-<random base36>`.
pub fn fallback_id() -> String {
    let millis = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|elapsed| elapsed.as_millis() as u64)
        .unwrap_or_default();
    let counter = FALLBACK_COUNTER.fetch_add(1, Ordering::Relaxed);
    let mut rng = StdRng::seed_from_u64(millis.rotate_left(17) ^ counter);
    let suffix: String = (0..FALLBACK_SUFFIX_LEN)
        .map(|_| char::from(BASE36_DIGITS[rng.gen_range(0..BASE36_DIGITS.len())]))
        .collect();
    format!("id-{}-{suffix}", to_base36(millis))
}

fn to_base36(mut value: u64) -> String {
    if value == 0 {
        return "0".to_string();
    }
    let mut digits = Vec::new();
    while value > 0 {
        digits.push(BASE36_DIGITS[(value % 36) as usize]);
        value /= 36;
    }
    digits.reverse();
    String::from_utf8_lossy(&digits).into_owned()
}
