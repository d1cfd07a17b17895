//! # User-Facing Messages
//!
//! Localized strings for everything the assistant says outside of AI-generated
//! text: degraded-mode apologies, generated list names, redirection nudges.
//! Messages live in Fluent resources under `locales/`.

use fluent_bundle::concurrent::FluentBundle;
use fluent_bundle::{FluentArgs, FluentResource, FluentValue};
use std::collections::HashMap;
use std::sync::{Arc, LazyLock};
use unic_langid::LanguageIdentifier;

static LOCALIZATION: LazyLock<Localization> =
    LazyLock::new(|| Localization::new().expect("embedded locale resources must parse"));

/// Localization manager holding one bundle per supported locale.
pub struct Localization {
    bundles: HashMap<String, Arc<FluentBundle<FluentResource>>>,
}

impl Localization {
    fn new() -> anyhow::Result<Self> {
        let mut bundles = HashMap::new();

        let en_locale: LanguageIdentifier = "en".parse()?;
        let bundle = Self::create_bundle(en_locale, include_str!("../locales/en/main.ftl"))?;
        bundles.insert("en".to_string(), Arc::new(bundle));

        Ok(Self { bundles })
    }

    fn create_bundle(
        locale: LanguageIdentifier,
        source: &str,
    ) -> anyhow::Result<FluentBundle<FluentResource>> {
        let mut bundle = FluentBundle::new_concurrent(vec![locale]);
        // Skip the bidi isolation marks; messages are plain terminal text.
        bundle.set_use_isolating(false);

        let resource = FluentResource::try_new(source.to_string())
            .map_err(|(_, errors)| anyhow::anyhow!("invalid fluent resource: {:?}", errors))?;
        bundle
            .add_resource(resource)
            .map_err(|errors| anyhow::anyhow!("conflicting fluent messages: {:?}", errors))?;

        Ok(bundle)
    }

    /// Resolve a message key, with optional arguments.
    pub fn get_message(&self, key: &str, args: Option<&FluentArgs>) -> String {
        let bundle = match self.bundles.get("en") {
            Some(bundle) => bundle,
            None => return format!("Missing translation: {}", key),
        };

        let message = match bundle.get_message(key) {
            Some(message) => message,
            None => return format!("Missing translation: {}", key),
        };

        let pattern = match message.value() {
            Some(pattern) => pattern,
            None => return format!("Missing value for key: {}", key),
        };

        let mut errors = Vec::new();
        bundle.format_pattern(pattern, args, &mut errors).into_owned()
    }
}

/// Get a localized message.
pub fn t(key: &str) -> String {
    LOCALIZATION.get_message(key, None)
}

/// Get a localized message with string arguments.
pub fn t_args(key: &str, args: &[(&str, &str)]) -> String {
    let mut fluent_args = FluentArgs::new();
    for (name, value) in args {
        fluent_args.set(*name, FluentValue::from(*value));
    }
    LOCALIZATION.get_message(key, Some(&fluent_args))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_message() {
        let message = t("error-ai-provider");
        assert!(message.contains("Sorry"));
    }

    #[test]
    fn test_message_with_arguments() {
        let message = t_args("grocery-list-for-recipe", &[("recipe", "Pancakes")]);
        assert_eq!(message, "Shopping for Pancakes");
    }

    #[test]
    fn test_missing_key_degrades_gracefully() {
        let message = t("no-such-key");
        assert!(message.contains("Missing translation"));
    }
}
