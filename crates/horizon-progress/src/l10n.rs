//! Localized strings shown by progress dialogs.
//!
//! Every user-visible string is looked up by a [`StringKey`]. English text is
//! built in; a `[strings]` table in the progress config overrides any subset
//! of it:
//!
//! ```toml
//! [strings]
//! defaultDialogTitle = "Fortschritt"
//! cancelButton = "Abbrechen"
//! ```

use serde::Deserialize;

use crate::error::Result;

/// Keys of the string resource table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StringKey {
    /// Window title used when the caller gives none.
    DefaultDialogTitle,
    /// Label of the details toggle.
    DetailsButton,
    /// Label of the action button while the operation runs.
    CancelButton,
    /// Label of the action button after completion.
    CloseButton,
    /// Status text shown when a cancellation carries no text.
    DefaultCanceledText,
}

impl StringKey {
    /// All keys, in table order.
    pub const ALL: [StringKey; 5] = [
        StringKey::DefaultDialogTitle,
        StringKey::DetailsButton,
        StringKey::CancelButton,
        StringKey::CloseButton,
        StringKey::DefaultCanceledText,
    ];

    /// The resource key as it appears in string tables.
    pub fn as_str(self) -> &'static str {
        match self {
            StringKey::DefaultDialogTitle => "defaultDialogTitle",
            StringKey::DetailsButton => "detailsButton",
            StringKey::CancelButton => "cancelButton",
            StringKey::CloseButton => "closeButton",
            StringKey::DefaultCanceledText => "defaultCanceledText",
        }
    }

    /// Built-in English text.
    pub fn default_text(self) -> &'static str {
        match self {
            StringKey::DefaultDialogTitle => "Progress",
            StringKey::DetailsButton => "Details",
            StringKey::CancelButton => "Cancel",
            StringKey::CloseButton => "Close",
            StringKey::DefaultCanceledText => "Canceled",
        }
    }
}

/// A string table: built-in defaults plus optional overrides.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, rename_all = "camelCase", deny_unknown_fields)]
pub struct Strings {
    default_dialog_title: Option<String>,
    details_button: Option<String>,
    cancel_button: Option<String>,
    close_button: Option<String>,
    default_canceled_text: Option<String>,
}

impl Strings {
    /// A table with only the built-in English text.
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse overrides from a TOML document whose top level holds the keys.
    pub fn from_toml_str(s: &str) -> Result<Self> {
        Ok(toml::from_str(s)?)
    }

    /// Look up the text for `key`.
    pub fn get(&self, key: StringKey) -> &str {
        self.slot(key)
            .as_deref()
            .unwrap_or_else(|| key.default_text())
    }

    /// Override the text for `key`.
    pub fn set(&mut self, key: StringKey, text: impl Into<String>) {
        *self.slot_mut(key) = Some(text.into());
    }

    /// Builder form of [`set`](Self::set).
    pub fn with(mut self, key: StringKey, text: impl Into<String>) -> Self {
        self.set(key, text);
        self
    }

    /// Whether `key` has an override.
    pub fn is_overridden(&self, key: StringKey) -> bool {
        self.slot(key).is_some()
    }

    fn slot(&self, key: StringKey) -> &Option<String> {
        match key {
            StringKey::DefaultDialogTitle => &self.default_dialog_title,
            StringKey::DetailsButton => &self.details_button,
            StringKey::CancelButton => &self.cancel_button,
            StringKey::CloseButton => &self.close_button,
            StringKey::DefaultCanceledText => &self.default_canceled_text,
        }
    }

    fn slot_mut(&mut self, key: StringKey) -> &mut Option<String> {
        match key {
            StringKey::DefaultDialogTitle => &mut self.default_dialog_title,
            StringKey::DetailsButton => &mut self.details_button,
            StringKey::CancelButton => &mut self.cancel_button,
            StringKey::CloseButton => &mut self.close_button,
            StringKey::DefaultCanceledText => &mut self.default_canceled_text,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_english() {
        let strings = Strings::new();
        assert_eq!(strings.get(StringKey::DefaultDialogTitle), "Progress");
        assert_eq!(strings.get(StringKey::CancelButton), "Cancel");
        assert_eq!(strings.get(StringKey::CloseButton), "Close");
        for key in StringKey::ALL {
            assert!(!strings.is_overridden(key));
            assert_eq!(strings.get(key), key.default_text());
        }
    }

    #[test]
    fn test_toml_overrides_subset() {
        let strings = Strings::from_toml_str(
            r#"
            cancelButton = "Abbrechen"
            defaultCanceledText = "Abgebrochen"
            "#,
        )
        .unwrap();

        assert_eq!(strings.get(StringKey::CancelButton), "Abbrechen");
        assert_eq!(strings.get(StringKey::DefaultCanceledText), "Abgebrochen");
        assert_eq!(strings.get(StringKey::DetailsButton), "Details");
    }

    #[test]
    fn test_unknown_key_is_rejected() {
        assert!(Strings::from_toml_str("okButton = \"OK\"").is_err());
    }

    #[test]
    fn test_builder_override() {
        let strings = Strings::new().with(StringKey::CloseButton, "Done");
        assert_eq!(strings.get(StringKey::CloseButton), "Done");
        assert!(strings.is_overridden(StringKey::CloseButton));
    }

    #[test]
    fn test_key_names_match_resource_table() {
        let names: Vec<&str> = StringKey::ALL.iter().map(|k| k.as_str()).collect();
        assert_eq!(
            names,
            vec![
                "defaultDialogTitle",
                "detailsButton",
                "cancelButton",
                "closeButton",
                "defaultCanceledText"
            ]
        );
    }
}
