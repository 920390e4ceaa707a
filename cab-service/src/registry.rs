//! Game registry.
//!
//! Maps a cabinet's `model` attribute to a `(game, version)` pair and keeps
//! the linear predecessor chain the dispatcher walks for fallback handlers.
//! Built once at startup and read-only afterwards; the whole structure is
//! shared by reference across workers.

use hashbrown::HashMap;

use crate::error::ServiceError;

/// Parsed `model` attribute: `family:region:revision:code:date`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Model {
    pub family: String,
    pub region: String,
    pub revision: String,
    pub code: String,
    /// Firmware date, `YYYYMMDDNN`
    pub date: u64,
}

impl Model {
    /// Parse a model code. Anything that does not split into the five
    /// fields with a numeric date is an [`ServiceError::UnknownModel`] -
    /// the registry could never match it anyway.
    pub fn parse(raw: &str) -> Result<Model, ServiceError> {
        let unknown = || ServiceError::UnknownModel {
            model: raw.to_owned(),
        };
        let fields: Vec<&str> = raw.split(':').collect();
        let [family, region, revision, code, date] = fields.as_slice() else {
            return Err(unknown());
        };
        let date: u64 = date.parse().map_err(|_| unknown())?;
        Ok(Model {
            family: (*family).to_owned(),
            region: (*region).to_owned(),
            revision: (*revision).to_owned(),
            code: (*code).to_owned(),
            date,
        })
    }
}

/// A specific release of a game family.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct GameVersion {
    pub game: String,
    pub version: u32,
}

impl GameVersion {
    pub fn new(game: &str, version: u32) -> GameVersion {
        GameVersion {
            game: game.to_owned(),
            version,
        }
    }
}

struct ModelEntry {
    family: String,
    since_date: u64,
    target: GameVersion,
}

/// Immutable after startup: model table plus the predecessor chain.
#[derive(Default)]
pub struct GameRegistry {
    models: Vec<ModelEntry>,
    predecessors: HashMap<GameVersion, GameVersion>,
}

impl GameRegistry {
    pub fn new() -> GameRegistry {
        GameRegistry::default()
    }

    /// Register a model family mapping: cabinets of `family` with firmware
    /// dated `since_date` or later resolve to `target` (until a later
    /// entry for the same family takes over).
    pub fn register_model(&mut self, family: &str, since_date: u64, target: GameVersion) {
        self.models.push(ModelEntry {
            family: family.to_owned(),
            since_date,
            target,
        });
    }

    /// Declare `previous` as the version the dispatcher falls back to when
    /// `version` has no handler for a method.
    pub fn register_predecessor(&mut self, version: GameVersion, previous: GameVersion) {
        self.predecessors.insert(version, previous);
    }

    /// Resolve a parsed model: the entry of the same family with the
    /// greatest `since_date` not after the firmware date wins.
    pub fn resolve_model(&self, model: &Model) -> Result<GameVersion, ServiceError> {
        self.models
            .iter()
            .filter(|e| e.family == model.family && e.since_date <= model.date)
            .max_by_key(|e| e.since_date)
            .map(|e| e.target.clone())
            .ok_or_else(|| ServiceError::UnknownModel {
                model: format!(
                    "{}:{}:{}:{}:{}",
                    model.family, model.region, model.revision, model.code, model.date
                ),
            })
    }

    pub fn predecessor(&self, version: &GameVersion) -> Option<&GameVersion> {
        self.predecessors.get(version)
    }
}
