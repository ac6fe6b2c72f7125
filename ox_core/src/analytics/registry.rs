//! Named reports and generators.
//!
//! The registry is an ordinary value: built once at startup, read during
//! queries, and cleared and rebuilt on plugin reload. Registering a name
//! that already exists replaces the earlier entry.

use super::e1rm::estimated_1rm;
use super::generators::wendler531;
use super::reports::{session_matrix, volume_over_time};
use super::{Formula, Granularity, ReportTable};
use crate::args::{parse_args, usage, ParamSpec, ParamValue, ParsedArgs, ValueType};
use crate::config::Config;
use crate::store::TrainingStore;
use crate::units::MassUnit;
use crate::{Error, Result};
use chrono::Local;
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;
use tracing::{debug, warn};

pub type ReportFn = Arc<dyn Fn(&TrainingStore, &ParsedArgs) -> Result<ReportTable> + Send + Sync>;
pub type GeneratorFn =
    Arc<dyn Fn(Option<&TrainingStore>, &ParsedArgs) -> Result<String> + Send + Sync>;

/// A report: queries the store and returns a table
#[derive(Clone)]
pub struct ReportDescriptor {
    pub name: String,
    pub description: String,
    pub params: Vec<ParamSpec>,
    pub invoke: ReportFn,
}

impl ReportDescriptor {
    pub fn new(
        name: impl Into<String>,
        description: impl Into<String>,
        params: Vec<ParamSpec>,
        invoke: impl Fn(&TrainingStore, &ParsedArgs) -> Result<ReportTable> + Send + Sync + 'static,
    ) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            params,
            invoke: Arc::new(invoke),
        }
    }
}

impl fmt::Debug for ReportDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ReportDescriptor")
            .field("name", &self.name)
            .field("params", &self.params)
            .finish_non_exhaustive()
    }
}

/// A generator: turns parameters into `.ox` text
#[derive(Clone)]
pub struct GeneratorDescriptor {
    pub name: String,
    pub description: String,
    pub params: Vec<ParamSpec>,
    /// Whether `invoke` expects a store
    pub needs_store: bool,
    pub invoke: GeneratorFn,
}

impl GeneratorDescriptor {
    pub fn new(
        name: impl Into<String>,
        description: impl Into<String>,
        params: Vec<ParamSpec>,
        needs_store: bool,
        invoke: impl Fn(Option<&TrainingStore>, &ParsedArgs) -> Result<String>
            + Send
            + Sync
            + 'static,
    ) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            params,
            needs_store,
            invoke: Arc::new(invoke),
        }
    }
}

impl fmt::Debug for GeneratorDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GeneratorDescriptor")
            .field("name", &self.name)
            .field("params", &self.params)
            .field("needs_store", &self.needs_store)
            .finish_non_exhaustive()
    }
}

/// What a plugin hands to the registry
#[derive(Clone, Debug)]
pub enum PluginDescriptor {
    Report(ReportDescriptor),
    Generator(GeneratorDescriptor),
}

impl PluginDescriptor {
    pub fn name(&self) -> &str {
        match self {
            PluginDescriptor::Report(r) => &r.name,
            PluginDescriptor::Generator(g) => &g.name,
        }
    }
}

#[derive(Debug, Default)]
pub struct Registry {
    config: Config,
    reports: BTreeMap<String, ReportDescriptor>,
    generators: BTreeMap<String, GeneratorDescriptor>,
}

impl Registry {
    /// Empty registry; built-ins are added by [`Registry::with_builtins`]
    pub fn new(config: Config) -> Self {
        Self {
            config,
            reports: BTreeMap::new(),
            generators: BTreeMap::new(),
        }
    }

    pub fn with_builtins(config: &Config) -> Self {
        let mut registry = Self::new(config.clone());
        registry.register_builtins();
        registry
    }

    fn register_builtins(&mut self) {
        for descriptor in builtin_descriptors(&self.config) {
            self.register(descriptor);
        }
    }

    /// Add a report or generator. Empty names are skipped.
    pub fn register(&mut self, descriptor: PluginDescriptor) {
        if descriptor.name().trim().is_empty() {
            warn!("Skipping descriptor with an empty name: {:?}", descriptor);
            return;
        }
        match descriptor {
            PluginDescriptor::Report(report) => {
                if self.reports.contains_key(&report.name) {
                    warn!("Report '{}' redefined", report.name);
                }
                debug!("Registered report '{}'", report.name);
                self.reports.insert(report.name.clone(), report);
            }
            PluginDescriptor::Generator(generator) => {
                if self.generators.contains_key(&generator.name) {
                    warn!("Generator '{}' redefined", generator.name);
                }
                debug!("Registered generator '{}'", generator.name);
                self.generators.insert(generator.name.clone(), generator);
            }
        }
    }

    /// Clear everything, re-add built-ins, then `plugins` in order
    pub fn reload_plugins(&mut self, plugins: impl IntoIterator<Item = PluginDescriptor>) {
        self.reports.clear();
        self.generators.clear();
        self.register_builtins();
        for plugin in plugins {
            self.register(plugin);
        }
    }

    pub fn reports(&self) -> impl Iterator<Item = &ReportDescriptor> {
        self.reports.values()
    }

    pub fn generators(&self) -> impl Iterator<Item = &GeneratorDescriptor> {
        self.generators.values()
    }

    pub fn report(&self, name: &str) -> Result<&ReportDescriptor> {
        self.reports.get(name).ok_or_else(|| Error::UnknownReport {
            name: name.to_string(),
            available: join_names(self.reports.keys()),
        })
    }

    pub fn generator(&self, name: &str) -> Result<&GeneratorDescriptor> {
        self.generators
            .get(name)
            .ok_or_else(|| Error::UnknownGenerator {
                name: name.to_string(),
                available: join_names(self.generators.keys()),
            })
    }

    pub fn report_usage(&self, name: &str) -> Result<String> {
        let report = self.report(name)?;
        Ok(usage("report", &report.name, &report.params))
    }

    pub fn generator_usage(&self, name: &str) -> Result<String> {
        let generator = self.generator(name)?;
        Ok(usage("generate", &generator.name, &generator.params))
    }

    /// Parse `args` against the report's params and run it
    pub fn run_report(&self, name: &str, store: &TrainingStore, args: &str) -> Result<ReportTable> {
        let report = self.report(name)?;
        let parsed = parse_args(&report.params, args)?;
        debug!("Running report '{}' with {:?}", name, parsed);
        (report.invoke)(store, &parsed)
    }

    /// Parse `args` and run the generator. The store is only passed to
    /// generators that declare they need one.
    pub fn run_generator(
        &self,
        name: &str,
        store: Option<&TrainingStore>,
        args: &str,
    ) -> Result<String> {
        let generator = self.generator(name)?;
        let parsed = parse_args(&generator.params, args)?;
        debug!("Running generator '{}' with {:?}", name, parsed);
        if generator.needs_store {
            let store = store.ok_or_else(|| {
                Error::Other(format!("Generator '{}' needs a loaded log", name))
            })?;
            (generator.invoke)(Some(store), &parsed)
        } else {
            (generator.invoke)(None, &parsed)
        }
    }
}

fn join_names<'a>(names: impl Iterator<Item = &'a String>) -> String {
    names.map(String::as_str).collect::<Vec<_>>().join(", ")
}

fn text_default(value: &str) -> Option<ParamValue> {
    Some(ParamValue::Str(value.to_string()))
}

fn unit_arg(parsed: &ParsedArgs) -> Result<MassUnit> {
    MassUnit::parse(parsed.require_str("unit")?)
}

/// `volume`, `matrix`, `e1rm` and `wendler531`, with defaults from `config`
pub fn builtin_descriptors(config: &Config) -> Vec<PluginDescriptor> {
    let movement = || ParamSpec::required("movement", ValueType::Str).short('m');
    let bin = || {
        ParamSpec::optional("bin", ValueType::Str, text_default(&config.reports.default_bin))
            .short('b')
    };
    let unit = || {
        ParamSpec::optional("unit", ValueType::Str, text_default(&config.units.default)).short('u')
    };

    let volume = ReportDescriptor::new(
        "volume",
        "Volume over time for a movement",
        vec![movement(), bin(), unit()],
        |store, args| {
            let granularity: Granularity = args.require_str("bin")?.parse()?;
            volume_over_time(store, args.require_str("movement")?, granularity, unit_arg(args)?)
        },
    );

    let matrix = ReportDescriptor::new(
        "matrix",
        "Session count per movement per time period",
        vec![bin()],
        |store, args| session_matrix(store, args.require_str("bin")?.parse()?),
    );

    let e1rm = ReportDescriptor::new(
        "e1rm",
        "Estimated 1RM progression for a movement",
        vec![
            movement(),
            ParamSpec::optional(
                "formula",
                ValueType::Str,
                text_default(&config.reports.e1rm_formula),
            )
            .short('f'),
            unit(),
            ParamSpec::optional(
                "marker",
                ValueType::Str,
                text_default(&config.reports.max_effort_marker),
            ),
        ],
        |store, args| {
            let formula: Formula = args.require_str("formula")?.parse()?;
            estimated_1rm(
                store,
                args.require_str("movement")?,
                formula,
                unit_arg(args)?,
                args.require_str("marker")?,
            )
        },
    );

    let wendler = GeneratorDescriptor::new(
        "wendler531",
        "Generate a Wendler 5/3/1 cycle",
        vec![
            movement(),
            ParamSpec::required("training_max", ValueType::Float).short('t'),
            unit(),
            ParamSpec::optional("start_date", ValueType::Date, None).short('d'),
        ],
        false,
        |_, args| {
            let start = args
                .date("start_date")
                .unwrap_or_else(|| Local::now().date_naive());
            Ok(wendler531(
                args.require_str("movement")?,
                args.require_float("training_max")?,
                unit_arg(args)?,
                start,
            ))
        },
    );

    vec![
        PluginDescriptor::Report(volume),
        PluginDescriptor::Report(matrix),
        PluginDescriptor::Report(e1rm),
        PluginDescriptor::Generator(wendler),
    ]
}
