use std::{
    io::{self, Write},
    path::Path,
};

use figment::{
    providers::{Format, Serialized, Toml},
    value::{Dict, Value},
    Figment, Profile, Provider,
};
use serde::Deserialize;

use crate::error::MulticonfError;

/// Dotted prefix grouping this application's configuration entries.
const NAMESPACE: &str = "app.properties";

/// Environment variables named `APP_PROPERTIES_<key>` feed the environment tier.
const ENV_PREFIX: &str = "APP_PROPERTIES_";

const FIRST_PROPERTY_KEY: &str = "app.properties.firstProperty";
const SECOND_PROPERTY_KEY: &str = "app.properties.secondProperty";

/// The two `app.properties` values, bound exactly once at startup.
///
/// Immutable for the life of the process: fields are private and only
/// read-only accessors are exposed.
#[derive(Debug)]
pub struct AppConfig {
    first_property: String,
    second_property: String,
}

/// Highest-precedence property values, taken from command-line flags.
/// `None` means "no override for this key".
#[derive(Debug, Default)]
pub struct PropertyOverrides {
    pub first_property: Option<String>,
    pub second_property: Option<String>,
}

/// Deserialization target for the merged namespace, before presence is
/// validated. Keys are matched in their canonical form.
#[derive(Deserialize)]
struct RawProperties {
    #[serde(rename = "firstproperty")]
    first_property: Option<String>,
    #[serde(rename = "secondproperty")]
    second_property: Option<String>,
}

impl AppConfig {
    /// Resolve both properties from the layered sources and construct the
    /// holder.
    ///
    /// Tiers, in increasing precedence: the TOML file at `config_file` (a
    /// missing file contributes nothing), environment variables under
    /// `APP_PROPERTIES_`, and `overrides`. A key absent from every tier
    /// fails with [`MulticonfError::MissingKey`] naming its full dotted
    /// name; anything the underlying binder rejects (unreadable file,
    /// invalid TOML, non-string file value) propagates as
    /// [`MulticonfError::ConfigError`].
    pub fn build(config_file: &Path, overrides: &PropertyOverrides) -> Result<Self, MulticonfError> {
        let figment = figment(config_file, overrides)?;
        let (first_property, second_property) = resolve_properties(&figment)?;

        Ok(Self::new(first_property, second_property))
    }

    /// Construct the holder from the two resolved values, printing both to
    /// stdout.
    pub fn new(first_property: String, second_property: String) -> Self {
        let config = Self {
            first_property,
            second_property,
        };
        config
            .print(&mut io::stdout().lock())
            .expect("failed to write to stdout");

        config
    }

    pub fn first_property(&self) -> &str {
        &self.first_property
    }

    pub fn second_property(&self) -> &str {
        &self.second_property
    }

    /// Write the labeled pair, in order. This is the program's only stdout
    /// output.
    fn print<W: Write>(&self, out: &mut W) -> io::Result<()> {
        writeln!(out, "first property: {}", self.first_property)?;
        writeln!(out, "second property: {}", self.second_property)
    }
}

/// Merge the three tiers into one `Figment`; later merges shadow earlier
/// ones, so precedence is file < environment < flags.
fn figment(config_file: &Path, overrides: &PropertyOverrides) -> Result<Figment, MulticonfError> {
    Ok(Figment::new()
        .merge(Serialized::defaults(file_properties(config_file)?))
        .merge(Serialized::defaults(env_properties()))
        .merge(Serialized::defaults(override_properties(overrides))))
}

/// Extract the merged namespace and validate that both keys are present.
/// With both keys absent, `firstProperty` is reported (declaration order).
fn resolve_properties(figment: &Figment) -> Result<(String, String), MulticonfError> {
    let raw: RawProperties = figment.extract()?;

    let first_property = raw
        .first_property
        .ok_or_else(|| MulticonfError::missing_key(FIRST_PROPERTY_KEY))?;
    let second_property = raw
        .second_property
        .ok_or_else(|| MulticonfError::missing_key(SECOND_PROPERTY_KEY))?;

    Ok((first_property, second_property))
}

/// The `app.properties` subtree of the TOML file, keyed canonically.
/// Both the `[app.properties]` table form and the dotted-key form parse to
/// the same document structure.
fn file_properties(path: &Path) -> Result<Dict, MulticonfError> {
    let mut data = Toml::file(path).data()?;

    let mut cursor = data.remove(&Profile::Default).unwrap_or_default();
    for segment in NAMESPACE.split('.') {
        cursor = match cursor.remove(segment) {
            Some(Value::Dict(_, nested)) => nested,
            _ => Dict::new(),
        };
    }

    Ok(cursor
        .into_iter()
        .map(|(key, value)| (canonicalize(&key), value))
        .collect())
}

/// Properties from `APP_PROPERTIES_*` environment variables. Values are taken
/// verbatim as strings, matching properties-file semantics for a string-typed
/// namespace. Entries whose name or value is not valid Unicode are skipped.
fn env_properties() -> Dict {
    std::env::vars_os()
        .filter_map(|(name, value)| {
            let name = name.to_str()?;
            let key = name.strip_prefix(ENV_PREFIX)?;
            let value = value.into_string().ok()?;
            Some((canonicalize(key), Value::from(value)))
        })
        .collect()
}

/// Properties set on the command line; only keys that were actually given
/// enter the tier.
fn override_properties(overrides: &PropertyOverrides) -> Dict {
    let mut dict = Dict::new();
    if let Some(value) = &overrides.first_property {
        dict.insert("firstproperty".into(), Value::from(value.clone()));
    }
    if let Some(value) = &overrides.second_property {
        dict.insert("secondproperty".into(), Value::from(value.clone()));
    }

    dict
}

/// Canonical key form: lowercase with `_` and `-` removed, so
/// `firstProperty`, `first_property`, and `FIRST_PROPERTY` all name the same
/// property in any tier.
fn canonicalize(key: &str) -> String {
    key.chars()
        .filter(|c| !matches!(c, '_' | '-'))
        .collect::<String>()
        .to_ascii_lowercase()
}
