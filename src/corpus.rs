use std::collections::BTreeMap;

use include_dir::{include_dir, Dir};
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::error::{Result, TypespeedError};
use crate::session::Difficulty;

static PHRASE_DIR: Dir = include_dir!("$CARGO_MANIFEST_DIR/src/phrases");

#[derive(Deserialize, Debug)]
struct PhraseFile {
    difficulty: Difficulty,
    phrases: Vec<String>,
}

/// Per-difficulty phrase lists as they appear in the config file.
/// A `Some` entry replaces the builtin pool for that difficulty.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PhrasePools {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub easy: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub medium: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hard: Option<Vec<String>>,
}

impl PhrasePools {
    fn get(&self, difficulty: Difficulty) -> Option<&Vec<String>> {
        match difficulty {
            Difficulty::Easy => self.easy.as_ref(),
            Difficulty::Medium => self.medium.as_ref(),
            Difficulty::Hard => self.hard.as_ref(),
        }
    }
}

/// Difficulty tiered phrase pools. Every tier is guaranteed non-empty.
#[derive(Debug, Clone)]
pub struct Corpus {
    pools: BTreeMap<Difficulty, Vec<String>>,
}

impl Corpus {
    pub fn new(pools: BTreeMap<Difficulty, Vec<String>>) -> Result<Self> {
        for difficulty in Difficulty::ALL {
            let empty = pools
                .get(&difficulty)
                .map_or(true, |pool| pool.iter().all(|p| p.trim().is_empty()));
            if empty {
                return Err(TypespeedError::EmptyPool(difficulty));
            }
        }

        let pools = pools
            .into_iter()
            .map(|(d, pool)| {
                let pool = pool.into_iter().filter(|p| !p.trim().is_empty()).collect();
                (d, pool)
            })
            .collect();

        Ok(Self { pools })
    }

    /// The pools compiled into the binary
    pub fn builtin() -> Result<Self> {
        let mut pools = BTreeMap::new();
        for file in PHRASE_DIR.files() {
            let contents = file
                .contents_utf8()
                .ok_or_else(|| TypespeedError::Corpus(file.path().display().to_string()))?;
            let parsed: PhraseFile = serde_json::from_str(contents)?;
            pools.insert(parsed.difficulty, parsed.phrases);
        }
        Self::new(pools)
    }

    /// One phrase for every difficulty, used for `--prompt`
    pub fn single(phrase: impl Into<String>) -> Result<Self> {
        let phrase = phrase.into();
        let pools = Difficulty::ALL
            .into_iter()
            .map(|d| (d, vec![phrase.clone()]))
            .collect();
        Self::new(pools)
    }

    pub fn with_overrides(self, overrides: &PhrasePools) -> Result<Self> {
        let mut pools = self.pools;
        for difficulty in Difficulty::ALL {
            if let Some(pool) = overrides.get(difficulty) {
                pools.insert(difficulty, pool.clone());
            }
        }
        Self::new(pools)
    }

    pub fn pool(&self, difficulty: Difficulty) -> &[String] {
        self.pools.get(&difficulty).map_or(&[], Vec::as_slice)
    }

    /// Uniformly picks a phrase from the pool for `difficulty`
    pub fn select_phrase<R: Rng + ?Sized>(&self, difficulty: Difficulty, rng: &mut R) -> &str {
        let pool = self.pool(difficulty);
        &pool[rng.gen_range(0..pool.len())]
    }
}
