//! Locating and loading the best available bundle

use super::{ArtifactBundle, ArtifactPaths, ModelArtifact, Profile};
use crate::error::{PotabilityError, Result};
use crate::preprocessing::FittedPipeline;
use serde::de::DeserializeOwned;
use std::fs;
use std::path::Path;
use tracing::{debug, info};

/// Load the preferred bundle from `dir`: deep if its model file exists,
/// otherwise advanced, otherwise [`PotabilityError::ArtifactsNotFound`].
///
/// Once a profile's model file is found that profile is final. A broken
/// deep bundle is an error, never a silent fallback to advanced.
pub fn resolve(dir: &Path) -> Result<ArtifactBundle> {
    for profile in Profile::PREFERENCE {
        let paths = ArtifactPaths::new(dir, profile);
        if paths.model.exists() {
            return load_profile(dir, profile);
        }
        debug!(profile = %profile, path = %paths.model.display(), "No model file for profile");
    }

    let tried: Vec<String> = Profile::PREFERENCE
        .iter()
        .map(|p| format!("best_model_{}.json", p))
        .collect();
    Err(PotabilityError::ArtifactsNotFound {
        dir: dir.to_path_buf(),
        reason: format!("none of {} present", tried.join(", ")),
    })
}

/// Load one profile's bundle. Model, scaler and imputer are required; the
/// polynomial stage is loaded only for profiles that support it and only if
/// its file exists.
pub fn load_profile(dir: &Path, profile: Profile) -> Result<ArtifactBundle> {
    let paths = ArtifactPaths::new(dir, profile);

    for required in [&paths.model, &paths.scaler, &paths.imputer] {
        if !required.exists() {
            return Err(PotabilityError::ArtifactsNotFound {
                dir: dir.to_path_buf(),
                reason: format!("{} bundle is missing {}", profile, file_name(required)),
            });
        }
    }

    let artifact: ModelArtifact = read_json(&paths.model)?;
    let scaler = read_json(&paths.scaler)?;
    let imputer = read_json(&paths.imputer)?;
    let poly = if profile.supports_polynomial() && paths.poly.exists() {
        Some(read_json(&paths.poly)?)
    } else {
        None
    };

    let pipeline = FittedPipeline {
        imputer,
        poly,
        scaler,
    };
    let bundle = ArtifactBundle::new(profile, Box::new(artifact.model), pipeline)?
        .with_metadata(artifact.metadata);

    info!(
        profile = %profile,
        model = %bundle.model().name(),
        polynomial = bundle.has_polynomial(),
        width = bundle.pipeline().n_features_out(),
        "Loaded artifact bundle"
    );
    Ok(bundle)
}

fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let bytes = fs::read(path).map_err(|e| PotabilityError::io(path, e))?;
    serde_json::from_slice(&bytes).map_err(|source| PotabilityError::ArtifactFormat {
        path: path.to_path_buf(),
        source,
    })
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

#[cfg(test)]
mod tests {
    use super::super::test_support::{fitted_parts, metadata};
    use super::super::ArtifactWriter;
    use super::*;
    use crate::classifier::{SavedModel, SoftVotingEnsemble};
    use tempfile::TempDir;

    fn write_profile(dir: &Path, profile: Profile, polynomial: bool, variant: &str) {
        let writer = ArtifactWriter::new(dir).unwrap();
        let (pipeline, model) = fitted_parts(polynomial);
        let artifact = ModelArtifact {
            model,
            metadata: metadata(variant),
        };
        writer.write(profile, &artifact, &pipeline).unwrap();
    }

    #[test]
    fn test_deep_preferred_over_advanced() {
        let dir = TempDir::new().unwrap();
        write_profile(dir.path(), Profile::Advanced, false, "advanced");
        write_profile(dir.path(), Profile::Deep, true, "deep");

        let bundle = resolve(dir.path()).unwrap();
        assert_eq!(bundle.profile(), Profile::Deep);
        assert!(bundle.has_polynomial());
        assert_eq!(bundle.metadata().unwrap().variant, "deep");
    }

    #[test]
    fn test_advanced_when_deep_absent() {
        let dir = TempDir::new().unwrap();
        write_profile(dir.path(), Profile::Advanced, false, "advanced");

        let bundle = resolve(dir.path()).unwrap();
        assert_eq!(bundle.profile(), Profile::Advanced);
        assert!(!bundle.has_polynomial());
    }

    #[test]
    fn test_empty_dir_is_artifacts_not_found() {
        let dir = TempDir::new().unwrap();
        let err = resolve(dir.path()).unwrap_err();
        assert!(matches!(err, PotabilityError::ArtifactsNotFound { .. }));
    }

    #[test]
    fn test_deep_without_poly_file_is_valid() {
        let dir = TempDir::new().unwrap();
        write_profile(dir.path(), Profile::Deep, false, "demo");

        let bundle = resolve(dir.path()).unwrap();
        assert_eq!(bundle.profile(), Profile::Deep);
        assert!(!bundle.has_polynomial());
        assert_eq!(bundle.pipeline().n_features_out(), 9);
    }

    #[test]
    fn test_advanced_poly_file_is_ignored() {
        let dir = TempDir::new().unwrap();
        write_profile(dir.path(), Profile::Advanced, false, "advanced");
        fs::write(dir.path().join("poly_advanced.json"), "not even json").unwrap();

        let bundle = resolve(dir.path()).unwrap();
        assert!(!bundle.has_polynomial());
    }

    #[test]
    fn test_partial_deep_bundle_is_fatal_not_fallback() {
        let dir = TempDir::new().unwrap();
        write_profile(dir.path(), Profile::Advanced, false, "advanced");
        write_profile(dir.path(), Profile::Deep, true, "deep");
        fs::remove_file(dir.path().join("imputer_deep.json")).unwrap();

        let err = resolve(dir.path()).unwrap_err();
        match err {
            PotabilityError::ArtifactsNotFound { reason, .. } => {
                assert!(reason.contains("imputer_deep.json"), "{}", reason)
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_corrupt_scaler_reported_with_path() {
        let dir = TempDir::new().unwrap();
        write_profile(dir.path(), Profile::Advanced, false, "advanced");
        fs::write(dir.path().join("scaler_advanced.json"), "{").unwrap();

        let err = resolve(dir.path()).unwrap_err();
        assert!(matches!(err, PotabilityError::ArtifactFormat { .. }));
        assert!(err.to_string().contains("scaler_advanced.json"));
    }

    #[test]
    fn test_tampered_ensemble_weights_fail_at_resolve() {
        let dir = TempDir::new().unwrap();
        let (pipeline, model) = fitted_parts(false);
        let ensemble = SoftVotingEnsemble::new(vec![model.clone(), model]).unwrap();
        let artifact = ModelArtifact {
            model: SavedModel::SoftVoting(ensemble),
            metadata: metadata("advanced"),
        };
        let paths = ArtifactWriter::new(dir.path())
            .unwrap()
            .write(Profile::Advanced, &artifact, &pipeline)
            .unwrap();
        assert!(resolve(dir.path()).is_ok());

        let mut json: serde_json::Value = serde_json::from_slice(&fs::read(&paths.model).unwrap()).unwrap();
        json["model"]["weights"] = serde_json::json!([0.25]);
        fs::write(&paths.model, serde_json::to_vec(&json).unwrap()).unwrap();

        let err = resolve(dir.path()).unwrap_err();
        assert!(matches!(err, PotabilityError::ArtifactFormat { .. }), "{err}");
        assert!(err.to_string().contains("best_model_advanced.json"));
    }

    #[test]
    fn test_zero_scaler_divisor_fails_at_resolve() {
        let dir = TempDir::new().unwrap();
        write_profile(dir.path(), Profile::Advanced, false, "advanced");
        let scaler_path = dir.path().join("scaler_advanced.json");
        let mut json: serde_json::Value = serde_json::from_slice(&fs::read(&scaler_path).unwrap()).unwrap();
        json["scale"][3] = serde_json::json!(0.0);
        fs::write(&scaler_path, serde_json::to_vec(&json).unwrap()).unwrap();

        let err = resolve(dir.path()).unwrap_err();
        assert!(matches!(err, PotabilityError::InvalidBundle { .. }), "{err}");
    }

    #[test]
    fn test_stages_never_mixed_across_profiles() {
        let dir = TempDir::new().unwrap();
        // deep model with a 54-wide input, advanced stages 9 wide
        write_profile(dir.path(), Profile::Advanced, false, "advanced");
        write_profile(dir.path(), Profile::Deep, true, "deep");

        let bundle = resolve(dir.path()).unwrap();
        assert_eq!(bundle.model().n_features(), bundle.pipeline().n_features_out());
        assert_eq!(bundle.pipeline().scaler.mean().len(), 54);
    }
}
