//! Random string helpers available in name templates
//!
//! Every helper draws from one generator shared by a single render. The
//! generator is seeded by the caller, which keeps rendering reproducible.

use minijinja::{Environment, Error, ErrorKind};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::sync::{Arc, Mutex};

const ALPHA: &[u8] = b"abcdefghijklmnopqrstuvwxyzABCDEFGHIJKLMNOPQRSTUVWXYZ";
const NUMERIC: &[u8] = b"0123456789";
const ALPHA_NUM: &[u8] = b"abcdefghijklmnopqrstuvwxyzABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";

/// Upper bound on generated string length
const MAX_RANDOM_LEN: usize = 253;

/// Generator shared by the random helpers of one render
#[derive(Clone)]
pub struct SharedRng(Arc<Mutex<StdRng>>);

impl SharedRng {
    pub fn from_seed(seed: [u8; 32]) -> Self {
        Self(Arc::new(Mutex::new(StdRng::from_seed(seed))))
    }

    fn string(&self, charset: &[u8], length: usize) -> Result<String, Error> {
        if length > MAX_RANDOM_LEN {
            return Err(Error::new(
                ErrorKind::InvalidOperation,
                format!("random string length {} exceeds {}", length, MAX_RANDOM_LEN),
            ));
        }

        let mut rng = self.0.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        Ok((0..length)
            .map(|_| charset[rng.random_range(0..charset.len())] as char)
            .collect())
    }

    fn ascii(&self, length: usize) -> Result<String, Error> {
        // Printable ASCII, space excluded
        let printable: Vec<u8> = (b'!'..=b'~').collect();
        self.string(&printable, length)
    }
}

/// Register `randAlphaNum`, `randAlpha`, `randNumeric` and `randAscii`
///
/// Usage: {{ randAlphaNum(5) }}
pub fn register_random(env: &mut Environment<'_>, rng: &SharedRng) {
    let r = rng.clone();
    env.add_function("randAlphaNum", move |n: usize| r.string(ALPHA_NUM, n));

    let r = rng.clone();
    env.add_function("randAlpha", move |n: usize| r.string(ALPHA, n));

    let r = rng.clone();
    env.add_function("randNumeric", move |n: usize| r.string(NUMERIC, n));

    let r = rng.clone();
    env.add_function("randAscii", move |n: usize| r.ascii(n));
}
