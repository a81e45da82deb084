//! Writing artifact bundles to the models directory

use super::{ArtifactPaths, ModelArtifact, Profile};
use crate::error::{PotabilityError, Result};
use crate::preprocessing::FittedPipeline;
use serde::Serialize;
use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Writes complete bundles, superseding whatever the profile held before
pub struct ArtifactWriter {
    dir: PathBuf,
}

impl ArtifactWriter {
    pub fn new(dir: impl Into<PathBuf>) -> Result<Self> {
        let dir = dir.into();
        fs::create_dir_all(&dir).map_err(|e| PotabilityError::io(&dir, e))?;
        Ok(Self { dir })
    }

    /// Persist one bundle under `profile`.
    ///
    /// Every file is staged to a temp sibling first. Stages are moved into
    /// place before the model, since the resolver keys on the model file. A
    /// pipeline without a polynomial stage removes any stale poly file so the
    /// old expansion is never paired with the new scaler.
    pub fn write(
        &self,
        profile: Profile,
        model: &ModelArtifact,
        pipeline: &FittedPipeline,
    ) -> Result<ArtifactPaths> {
        if pipeline.poly.is_some() && !profile.supports_polynomial() {
            return Err(PotabilityError::InvalidBundle {
                profile: profile.to_string(),
                reason: "profile cannot carry a polynomial stage".to_string(),
            });
        }

        let paths = ArtifactPaths::new(&self.dir, profile);

        let mut staged = vec![
            (stage_json(&paths.imputer, &pipeline.imputer)?, paths.imputer.clone()),
            (stage_json(&paths.scaler, &pipeline.scaler)?, paths.scaler.clone()),
        ];
        if let Some(poly) = &pipeline.poly {
            staged.push((stage_json(&paths.poly, poly)?, paths.poly.clone()));
        }
        let staged_model = stage_json(&paths.model, model)?;

        for (temp, target) in &staged {
            commit(temp, target)?;
        }
        if pipeline.poly.is_none() && paths.poly.exists() {
            fs::remove_file(&paths.poly).map_err(|e| PotabilityError::io(&paths.poly, e))?;
            debug!(path = %paths.poly.display(), "Removed stale polynomial stage");
        }
        commit(&staged_model, &paths.model)?;

        info!(
            profile = %profile,
            dir = %self.dir.display(),
            model = %model.metadata.variant,
            polynomial = pipeline.poly.is_some(),
            "Artifact bundle written"
        );
        Ok(paths)
    }
}

fn stage_json<T: Serialize>(target: &Path, value: &T) -> Result<PathBuf> {
    let temp = target.with_extension("json.tmp");
    let bytes = serde_json::to_vec_pretty(value).map_err(|source| PotabilityError::ArtifactFormat {
        path: target.to_path_buf(),
        source,
    })?;

    let mut file = File::create(&temp).map_err(|e| PotabilityError::io(&temp, e))?;
    file.write_all(&bytes).map_err(|e| PotabilityError::io(&temp, e))?;
    file.sync_all().map_err(|e| PotabilityError::io(&temp, e))?;
    Ok(temp)
}

fn commit(temp: &Path, target: &Path) -> Result<()> {
    fs::rename(temp, target).map_err(|e| PotabilityError::io(target, e))
}
