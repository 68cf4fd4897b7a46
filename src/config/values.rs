//! Individual configured values
// (c) 2024 Ross Younger

use std::collections::BTreeMap;

use figment::{Figment, Metadata, Profile, Source};
use serde::de::DeserializeOwned;

use super::{document::Document, errors::ExtractError, resolve::supports_multiple};

#[derive(Debug, Clone, PartialEq, Eq)]
/// A setting we read from a config file
pub struct Setting {
    /// where the value came from
    pub source: String,
    /// line number within the source
    pub line_number: usize,
    /// the setting data itself (not parsed; we assert nothing beyond the parser has applied the ssh quoting logic)
    pub args: Vec<String>,
}

impl Setting {
    /// The first argument, or an empty string
    #[must_use]
    pub fn first_arg(&self) -> String {
        self.args.first().cloned().unwrap_or_default()
    }
}

/// Everything a configuration document says about a particular host.
#[derive(Debug, Clone, PartialEq)]
pub struct HostConfiguration {
    /// The host we were interested in
    host: String,
    /// Output data, keyed by lowercase directive name
    data: BTreeMap<String, Setting>,
}

impl HostConfiguration {
    /// The host this configuration applies to
    #[must_use]
    pub fn host(&self) -> &str {
        &self.host
    }

    /// Looks up a setting. Keys are case-insensitive.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&Setting> {
        self.data.get(&key.to_ascii_lowercase())
    }

    /// Iterates over all settings, in key order
    pub fn iter(&self) -> impl Iterator<Item = (&String, &Setting)> {
        self.data.iter()
    }

    /// Presents this configuration as a [`Figment`], with a profile named after the host selected
    #[must_use]
    pub fn as_figment(&self) -> Figment {
        let mut figment = Figment::new();
        let profile = Profile::new(&self.host);
        for (k, v) in &self.data {
            figment = figment.merge(ValueProvider::new(k, v, &profile));
        }
        figment.select(profile)
    }

    /// Deserializes this configuration into a struct of the caller's choosing.
    ///
    /// Field names are matched against lowercase directive names.
    pub fn extract<T: DeserializeOwned>(&self) -> Result<T, ExtractError> {
        self.as_figment().extract().map_err(ExtractError::from)
    }
}

impl Document {
    /// Resolves every directive that applies to `alias`.
    ///
    /// For each key the first value found wins, except for keys that
    /// [`supports_multiple`](super::supports_multiple), whose arguments accumulate.
    #[must_use]
    pub fn host_configuration(&self, alias: &str) -> HostConfiguration {
        let mut data = BTreeMap::<String, Setting>::new();
        self.for_each_applicable(alias, &mut |doc, kv| {
            let key = kv.key().to_ascii_lowercase();
            if let Some(existing) = data.get_mut(&key) {
                if supports_multiple(&key) {
                    existing.args.extend(kv.args().iter().cloned());
                }
                return;
            }
            let _ = data.insert(
                key,
                Setting {
                    source: doc.source().to_string(),
                    line_number: kv.line_number(),
                    args: kv.args().to_vec(),
                },
            );
        });
        HostConfiguration {
            host: alias.to_string(),
            data,
        }
    }
}

///////////////////////////////////////////////////////////////////////////////////////

/// Wraps a Setting into something Figment can deal with
struct ValueProvider<'a> {
    key: &'a str,
    value: &'a Setting,
    profile: &'a Profile,
}

impl<'a> ValueProvider<'a> {
    fn new(key: &'a str, value: &'a Setting, profile: &'a Profile) -> Self {
        Self {
            key,
            value,
            profile,
        }
    }
}

impl figment::Provider for ValueProvider<'_> {
    fn metadata(&self) -> figment::Metadata {
        Metadata::from(
            "configuration file",
            Source::Custom(format!(
                "{src} (line {line})",
                src = self.value.source,
                line = self.value.line_number
            )),
        )
        .interpolater(|profile, path| {
            let key = path.to_vec();
            format!("key `{key}` of host `{profile}`", key = key.join("."))
        })
    }

    fn data(
        &self,
    ) -> std::result::Result<
        figment::value::Map<figment::Profile, figment::value::Dict>,
        figment::Error,
    > {
        use figment::value::{Dict, Empty, Value};
        let mut dict = Dict::new();
        let value: Value = match self.value.args.as_slice() {
            [] => Empty::Unit.into(),
            [one] => one.clone().into(),
            many => many.to_vec().into(),
        };
        let _ = dict.insert(self.key.to_string(), value);
        Ok(self.profile.collect(dict))
    }

    fn profile(&self) -> Option<Profile> {
        Some(self.profile.clone())
    }
}

///////////////////////////////////////////////////////////////////////////////////////
