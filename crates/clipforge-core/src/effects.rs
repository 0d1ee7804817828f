use crate::{
    error::EngineError,
    model::{Effect, EffectKind, EffectParameter},
};

/// The fixed catalogue of effect kinds the engine can instantiate, each with
/// its default parameter set. This is the effect library collaborator: pure
/// data, no I/O.
#[derive(Debug, Clone, Default)]
pub struct EffectLibrary;

const CATALOGUE: &[EffectKind] = &[
    EffectKind::Vintage,
    EffectKind::BlackWhite,
    EffectKind::Sepia,
    EffectKind::Warm,
    EffectKind::Cool,
    EffectKind::Vivid,
    EffectKind::Brightness,
    EffectKind::Contrast,
    EffectKind::Saturation,
    EffectKind::Temperature,
    EffectKind::Blur,
    EffectKind::Sharpen,
    EffectKind::Vignette,
    EffectKind::Invert,
];

impl EffectLibrary {
    /// One default-parameterized instance of every known effect kind.
    #[must_use]
    pub fn available_effects(&self) -> Vec<Effect> {
        CATALOGUE.iter().map(|kind| default_effect(*kind)).collect()
    }

    /// Builds a default-parameterized effect from its display name.
    pub fn create_effect(&self, type_name: &str) -> Result<Effect, EngineError> {
        CATALOGUE
            .iter()
            .find(|kind| kind.display_name().eq_ignore_ascii_case(type_name))
            .map(|kind| default_effect(*kind))
            .ok_or_else(|| EngineError::UnknownEffectType(type_name.to_string()))
    }
}

fn default_effect(kind: EffectKind) -> Effect {
    let parameters = match kind {
        EffectKind::Brightness => {
            vec![EffectParameter::new("brightness", 0.0, -1.0, 1.0, 0.0)]
        }
        EffectKind::Contrast => vec![EffectParameter::new("contrast", 1.0, 0.5, 2.0, 1.0)],
        EffectKind::Saturation => vec![EffectParameter::new("saturation", 1.0, 0.0, 2.0, 1.0)],
        EffectKind::Temperature => {
            vec![EffectParameter::new("temperature", 0.0, -1.0, 1.0, 0.0)]
        }
        EffectKind::Blur => vec![EffectParameter::new("radius", 4.0, 0.0, 32.0, 4.0)],
        EffectKind::Sharpen => vec![EffectParameter::new("amount", 0.5, 0.0, 1.0, 0.5)],
        EffectKind::Vignette => vec![
            EffectParameter::new("strength", 0.5, 0.0, 1.0, 0.5),
            EffectParameter::new("radius", 0.75, 0.0, 1.0, 0.75),
        ],
        EffectKind::Vintage
        | EffectKind::BlackWhite
        | EffectKind::Sepia
        | EffectKind::Warm
        | EffectKind::Cool
        | EffectKind::Vivid
        | EffectKind::Invert => Vec::new(),
    };
    Effect::new(kind, parameters)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn catalogue_covers_every_kind_once() {
        let library = EffectLibrary;
        let effects = library.available_effects();
        assert_eq!(effects.len(), CATALOGUE.len());
    }

    #[test]
    fn create_effect_is_case_insensitive() {
        let library = EffectLibrary;
        let effect = library.create_effect("sepia").expect("known effect");
        assert_eq!(effect.kind, EffectKind::Sepia);
    }

    #[test]
    fn unknown_effect_name_is_rejected() {
        let library = EffectLibrary;
        let error = library.create_effect("Hologram").expect_err("unknown effect");
        assert!(matches!(error, EngineError::UnknownEffectType(name) if name == "Hologram"));
    }

    #[test]
    fn brightness_defaults_match_declared_range() {
        let library = EffectLibrary;
        let effect = library.create_effect("Brightness").expect("known effect");
        let param = &effect.parameters[0];
        assert_eq!(param.value, 0.0);
        assert_eq!((param.min_value, param.max_value), (-1.0, 1.0));
    }
}
