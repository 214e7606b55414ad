//! Taint configuration: where taint is born, where it is reported, and
//! how it moves across method boundaries.
//!
//! The on-disk schema (YAML or JSON) references methods by signature and
//! types by name:
//!
//! ```yaml
//! sources:
//!   - { method: "<Src: T get()>", type: "T" }
//! sinks:
//!   - { method: "<Snk: void use(T)>", index: 0 }
//! transfers:
//!   - { method: "<Wrap: T of(T)>", from: 0, to: result, type: "T" }
//! ```
//!
//! Transfer ends are parameter indices or the symbolic names `base` and
//! `result`. Entries naming unknown methods are skipped with a warning so
//! a partial configuration still yields a usable overlay.

use std::path::Path;

use rustc_hash::{FxHashMap, FxHashSet};
use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use tracing::warn;

use crate::errors::{PointgraphError, Result};
use crate::shared::models::{MethodId, Program, TypeId};

/// Transfer end designating the call's receiver.
pub const BASE: i32 = -1;
/// Transfer end designating the call's result.
pub const RESULT: i32 = -2;

/// An endpoint of a taint transfer: a parameter index, [`BASE`], or
/// [`RESULT`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TransferEnd(pub i32);

impl TransferEnd {
    pub fn param(index: u32) -> Self {
        TransferEnd(index as i32)
    }

    pub fn base() -> Self {
        TransferEnd(BASE)
    }

    pub fn result() -> Self {
        TransferEnd(RESULT)
    }
}

impl Serialize for TransferEnd {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        match self.0 {
            BASE => serializer.serialize_str("base"),
            RESULT => serializer.serialize_str("result"),
            index => serializer.serialize_i32(index),
        }
    }
}

impl<'de> Deserialize<'de> for TransferEnd {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Raw {
            Index(i32),
            Name(String),
        }
        match Raw::deserialize(deserializer)? {
            Raw::Index(index) => Ok(TransferEnd(index)),
            Raw::Name(name) => match name.as_str() {
                "base" => Ok(TransferEnd(BASE)),
                "result" => Ok(TransferEnd(RESULT)),
                other => Err(D::Error::custom(format!("unknown transfer end `{other}`"))),
            },
        }
    }
}

/// A call to `method` returns a fresh taint object of type `ty`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SourceSpec {
    pub method: String,
    #[serde(rename = "type")]
    pub ty: String,
}

/// Taint reaching argument `index` of `method` is a finding.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SinkSpec {
    pub method: String,
    pub index: u32,
}

/// Taint flows from `from` to `to` across calls to `method`, rewriting the
/// taint object's type to `ty`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct TransferSpec {
    pub method: String,
    pub from: TransferEnd,
    pub to: TransferEnd,
    #[serde(rename = "type")]
    pub ty: String,
}

/// The unresolved, on-disk configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct TaintConfig {
    #[serde(default)]
    pub sources: Vec<SourceSpec>,
    #[serde(default)]
    pub sinks: Vec<SinkSpec>,
    #[serde(default)]
    pub transfers: Vec<TransferSpec>,
}

impl TaintConfig {
    pub fn from_yaml(text: &str) -> Result<Self> {
        serde_yaml::from_str(text)
            .map_err(|e| PointgraphError::config(format!("taint config: {e}")))
    }

    pub fn from_json(text: &str) -> Result<Self> {
        serde_json::from_str(text)
            .map_err(|e| PointgraphError::config(format!("taint config: {e}")))
    }

    /// Load from a file; `.json` files parse as JSON, everything else as
    /// YAML.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)?;
        if path.extension().is_some_and(|ext| ext == "json") {
            Self::from_json(&text)
        } else {
            Self::from_yaml(&text)
        }
    }

    /// Resolve method signatures and type names against `program`.
    ///
    /// Type names are interned (a rewritten taint type need not occur in
    /// the analyzed code); entries naming unknown methods are dropped with
    /// a warning.
    pub fn resolve(&self, program: &mut Program) -> ResolvedTaintConfig {
        let mut resolved = ResolvedTaintConfig::default();
        let lookup = |program: &Program, sig: &str, what: &str| -> Option<MethodId> {
            let found = program.method_by_signature(sig);
            if found.is_none() {
                warn!(method = sig, "skipping {what} for unknown method");
            }
            found
        };
        for source in &self.sources {
            if let Some(method) = lookup(program, &source.method, "taint source") {
                let ty = program.types.intern(&source.ty);
                let types = resolved.sources.entry(method).or_default();
                if !types.contains(&ty) {
                    types.push(ty);
                }
            }
        }
        for sink in &self.sinks {
            if let Some(method) = lookup(program, &sink.method, "taint sink") {
                resolved.sinks.insert((method, sink.index));
            }
        }
        for transfer in &self.transfers {
            if let Some(method) = lookup(program, &transfer.method, "taint transfer") {
                let ty = program.types.intern(&transfer.ty);
                let types = resolved
                    .transfers
                    .entry((method, transfer.from.0, transfer.to.0))
                    .or_default();
                if !types.contains(&ty) {
                    types.push(ty);
                }
            }
        }
        resolved
    }
}

/// Configuration with methods and types resolved to dense ids. An empty
/// value turns the whole overlay into a no-op.
#[derive(Debug, Clone, Default)]
pub struct ResolvedTaintConfig {
    sources: FxHashMap<MethodId, Vec<TypeId>>,
    sinks: FxHashSet<(MethodId, u32)>,
    transfers: FxHashMap<(MethodId, i32, i32), Vec<TypeId>>,
}

impl ResolvedTaintConfig {
    pub fn is_empty(&self) -> bool {
        self.sources.is_empty() && self.sinks.is_empty() && self.transfers.is_empty()
    }

    /// Taint types produced by calls to `method`; empty for non-sources.
    pub fn sources_of(&self, method: MethodId) -> &[TypeId] {
        self.sources.get(&method).map_or(&[], Vec::as_slice)
    }

    pub fn is_sink(&self, method: MethodId, index: u32) -> bool {
        self.sinks.contains(&(method, index))
    }

    /// Rewrite types of transfers from `from` to `to` on `method`.
    pub fn transfers_of(&self, method: MethodId, from: i32, to: i32) -> &[TypeId] {
        self.transfers
            .get(&(method, from, to))
            .map_or(&[], Vec::as_slice)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shared::models::ProgramBuilder;

    const YAML: &str = r#"
sources:
  - { method: "<Src: T get()>", type: "T" }
sinks:
  - { method: "<Snk: void use(T)>", index: 0 }
transfers:
  - { method: "<Wrap: T of(T)>", from: 0, to: result, type: "T" }
  - { method: "<Box: void set(T)>", from: 0, to: base, type: "T" }
  - { method: "<Box: T get()>", from: base, to: -2, type: "T" }
"#;

    #[test]
    fn test_yaml_parsing_accepts_symbolic_and_numeric_ends() {
        let config = TaintConfig::from_yaml(YAML).unwrap();
        assert_eq!(config.sources.len(), 1);
        assert_eq!(config.sinks.len(), 1);
        assert_eq!(config.transfers[0].to, TransferEnd::result());
        assert_eq!(config.transfers[1].to, TransferEnd::base());
        assert_eq!(config.transfers[2].from, TransferEnd::base());
        assert_eq!(config.transfers[2].to, TransferEnd::result());
    }

    #[test]
    fn test_json_parsing() {
        let json = r#"{
            "sources": [{ "method": "<Src: T get()>", "type": "T" }],
            "sinks": [{ "method": "<Snk: void use(T)>", "index": 0 }]
        }"#;
        let config = TaintConfig::from_json(json).unwrap();
        assert_eq!(config.sources.len(), 1);
        assert!(config.transfers.is_empty());
    }

    #[test]
    fn test_unknown_transfer_end_is_rejected() {
        let yaml = r#"
transfers:
  - { method: "<M: void m()>", from: 0, to: sideways, type: "T" }
"#;
        assert!(TaintConfig::from_yaml(yaml).is_err());
    }

    #[test]
    fn test_empty_document_is_a_valid_config() {
        let config = TaintConfig::from_yaml("{}").unwrap();
        assert_eq!(config, TaintConfig::default());
    }

    #[test]
    fn test_resolution_skips_unknown_methods() {
        let mut b = ProgramBuilder::new();
        let src = b.method("<Src: T get()>");
        let mut program = b.finish();

        let config = TaintConfig::from_yaml(YAML).unwrap();
        let resolved = config.resolve(&mut program);

        let t = program.types.get("T").unwrap();
        assert_eq!(resolved.sources_of(src), &[t]);
        // the sink and transfer methods do not exist in this program
        assert!(!resolved.is_sink(src, 0));
        assert!(resolved.transfers_of(src, 0, RESULT).is_empty());
    }

    #[test]
    fn test_resolution_interns_result_types() {
        let mut b = ProgramBuilder::new();
        let wrap = b.method("<Wrap: T of(T)>");
        let mut program = b.finish();

        let config = TaintConfig::from_yaml(YAML).unwrap();
        let resolved = config.resolve(&mut program);

        let t = program.types.get("T").expect("type interned by resolve");
        assert_eq!(resolved.transfers_of(wrap, 0, RESULT), &[t]);
        assert!(resolved.transfers_of(wrap, 1, RESULT).is_empty());
    }

    #[test]
    fn test_round_trip_preserves_symbolic_ends() {
        let config = TaintConfig::from_yaml(YAML).unwrap();
        let json = serde_json::to_string(&config).unwrap();
        let back = TaintConfig::from_json(&json).unwrap();
        assert_eq!(config, back);
    }
}
