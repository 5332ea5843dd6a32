//! Short codes and the public `/s/<code>/` links built from them.
//!
//! [`ShortCodeGenerator::generate_unique`] only pre-checks the store. Two
//! concurrent publishers can still draw the same free code, so the unique
//! constraint on `recipes.short_code` has the final word and
//! [`RecipePublisher`](crate::services::recipes::RecipePublisher) redraws when the
//! insert is rejected.

use std::{fmt, str::FromStr};

use itertools::Itertools;
use rand::{rngs::ThreadRng, Rng};
use thiserror::Error;
use tracing::{debug, trace_span};

use crate::database::{
    models::recipe::Recipe,
    store::{ShortCodeLookup, Store, StoreError},
};

pub const DEFAULT_SHORT_CODE_LENGTH: usize = 6;
/// Width of the `recipes.short_code` column.
pub const MAX_LENGTH_SHORT_CODE: usize = 10;
pub const SHORT_CODE_ALPHABET: &str =
    "ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ShortCodeError {
    #[error("Short code alphabet is empty")]
    EmptyAlphabet,

    #[error("Short code alphabet contains '{0}', only ASCII letters and digits are allowed")]
    InvalidSymbol(char),

    #[error("Short code alphabet repeats '{0}'")]
    DuplicateSymbol(char),

    #[error("Short code length must be between 1 and {max}, got {0}", max = MAX_LENGTH_SHORT_CODE)]
    InvalidLength(usize),

    #[error("Malformed short code: '{0}'")]
    Malformed(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ShortCode(String);

impl ShortCode {
    pub fn parse(code: &str) -> Result<Self, ShortCodeError> {
        let well_formed = (1..=MAX_LENGTH_SHORT_CODE).contains(&code.len())
            && code.chars().all(|c| c.is_ascii_alphanumeric());

        if !well_formed {
            return Err(ShortCodeError::Malformed(code.to_owned()));
        }

        Ok(Self(code.to_owned()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl FromStr for ShortCode {
    type Err = ShortCodeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for ShortCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

pub struct ShortCodeGenerator<R = ThreadRng> {
    alphabet: Vec<char>,
    length: usize,
    rng: R,
}

impl ShortCodeGenerator {
    pub fn new() -> Self {
        Self {
            alphabet: SHORT_CODE_ALPHABET.chars().collect(),
            length: DEFAULT_SHORT_CODE_LENGTH,
            rng: rand::rng(),
        }
    }

    pub fn with_length(length: usize) -> Result<Self, ShortCodeError> {
        Self::with_config(SHORT_CODE_ALPHABET, length, rand::rng())
    }
}

impl Default for ShortCodeGenerator {
    fn default() -> Self {
        Self::new()
    }
}

impl<R: Rng> ShortCodeGenerator<R> {
    pub fn with_config(alphabet: &str, length: usize, rng: R) -> Result<Self, ShortCodeError> {
        if alphabet.is_empty() {
            return Err(ShortCodeError::EmptyAlphabet);
        }
        if let Some(symbol) = alphabet.chars().find(|c| !c.is_ascii_alphanumeric()) {
            return Err(ShortCodeError::InvalidSymbol(symbol));
        }
        if let Some(symbol) = alphabet.chars().duplicates().next() {
            return Err(ShortCodeError::DuplicateSymbol(symbol));
        }
        if !(1..=MAX_LENGTH_SHORT_CODE).contains(&length) {
            return Err(ShortCodeError::InvalidLength(length));
        }

        Ok(Self {
            alphabet: alphabet.chars().collect(),
            length,
            rng,
        })
    }

    pub fn length(&self) -> usize {
        self.length
    }

    /// One uniform draw, not checked against anything.
    pub fn candidate(&mut self) -> ShortCode {
        let code = (0..self.length)
            .map(|_| self.alphabet[self.rng.random_range(0..self.alphabet.len())])
            .collect();

        ShortCode(code)
    }

    /// Draws until a code unknown to `lookup` comes up.
    ///
    /// There is no retry limit. The result is only free at the time of the
    /// check; the caller persists it and must redraw on a unique violation.
    pub fn generate_unique<L>(&mut self, lookup: &L) -> Result<ShortCode, StoreError>
    where
        L: ShortCodeLookup + ?Sized,
    {
        let span = trace_span!("generating short code", length = self.length);
        let _guard = span.enter();

        let mut attempts = 0u64;
        loop {
            attempts += 1;
            let code = self.candidate();

            if !lookup.exists_short_code(code.as_str())? {
                debug!(%code, attempts, "Found free short code");
                return Ok(code);
            }

            debug!(%code, attempts, "Short code already taken");
        }
    }
}

pub fn short_link_path(code: &str) -> String {
    format!("/s/{code}/")
}

/// `site_url` is an origin such as `https://foodgram.example`; empty gives a
/// relative link.
pub fn short_link_url(site_url: &str, code: &str) -> String {
    format!("{}{}", site_url.trim_end_matches('/'), short_link_path(code))
}

pub fn resolve_short_link<S>(store: &S, code: &ShortCode) -> Result<Recipe, StoreError>
where
    S: Store + ?Sized,
{
    store
        .find_recipe_by_short_code(code)?
        .ok_or_else(|| StoreError::NotFound(format!("recipe with short code {code}")))
}
