// ABOUTME: Selector specification data models, field rules, and the domain rule registry.
// ABOUTME: Defines configurable fallback selector chains and per-domain named field rules.

//! Selector specifications and per-domain field rules.
//!
//! A [`SelectorSpec`] names one way to locate a field in a document: by
//! element id, by CSS selector, or by CSS selector plus attribute. A
//! [`FieldRule`] is an ordered fallback chain of specs; the first spec that
//! yields a non-empty match wins. [`RuleRegistry`] maps domains to named
//! field rules so callers can say "the price on this amazon.com page" without
//! carrying selectors around.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Specifies how to locate the target node(s) in a parsed document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SelectorSpec {
    /// Match by element id, e.g. `priceblock_ourprice`.
    Id { value: String },
    /// A CSS selector path, e.g. `h1.product-title-text`.
    Css { value: String },
    /// A CSS selector with attribute extraction, e.g. `img.hero` / `src`.
    Attr { selector: String, attr: String },
}

impl SelectorSpec {
    /// Selector matching an element by id.
    pub fn id(value: impl Into<String>) -> Self {
        SelectorSpec::Id {
            value: value.into(),
        }
    }

    /// Selector matching elements by CSS path.
    pub fn css(value: impl Into<String>) -> Self {
        SelectorSpec::Css {
            value: value.into(),
        }
    }

    /// Selector extracting an attribute value from matching elements.
    pub fn attr(selector: impl Into<String>, attr: impl Into<String>) -> Self {
        SelectorSpec::Attr {
            selector: selector.into(),
            attr: attr.into(),
        }
    }
}

/// An ordered fallback chain of selectors for a single field.
///
/// Selectors are tried in order; within one selector, nodes are considered in
/// document order. The first non-empty match wins.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct FieldRule {
    #[serde(default)]
    pub selectors: Vec<SelectorSpec>,
}

impl FieldRule {
    /// A rule with a single selector.
    pub fn single(spec: SelectorSpec) -> Self {
        Self {
            selectors: vec![spec],
        }
    }

    /// A rule trying several selectors in order.
    pub fn chain(selectors: Vec<SelectorSpec>) -> Self {
        Self { selectors }
    }

    /// Returns true if the rule names no selectors (can never match).
    pub fn is_empty(&self) -> bool {
        self.selectors.is_empty()
    }
}

/// Named field rules for one domain.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct DomainRules {
    /// Primary domain these rules apply to.
    pub domain: String,
    /// Additional domains sharing the same rules.
    #[serde(default)]
    pub supported_domains: Vec<String>,
    /// Field name (e.g. "price") to fallback chain.
    #[serde(default)]
    pub fields: HashMap<String, FieldRule>,
}

/// Registry for looking up domain rules by host name.
#[derive(Debug, Default, Clone)]
pub struct RuleRegistry {
    map: HashMap<String, DomainRules>,
}

impl RuleRegistry {
    /// Creates a new empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers rules for their primary and supported domains.
    pub fn register(&mut self, rules: DomainRules) {
        let primary = rules.domain.clone();
        let shared = rules.clone();
        self.map.insert(primary, rules);
        for dom in &shared.supported_domains {
            self.map.insert(dom.clone(), shared.clone());
        }
    }

    /// Looks up rules by domain.
    pub fn get(&self, domain: &str) -> Option<&DomainRules> {
        self.map.get(domain)
    }

    /// Looks up a single named field rule for a domain.
    pub fn field(&self, domain: &str, field: &str) -> Option<&FieldRule> {
        self.map.get(domain).and_then(|r| r.fields.get(field))
    }

    /// Returns the number of registered domain mappings.
    pub fn len(&self) -> usize {
        self.map.len()
    }

    /// Returns true if no rules are registered.
    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }
}

/// Embedded JSON with the builtin per-domain rules.
const BUILTIN_RULES_JSON: &str = include_str!("../data/builtin_rules.json");

/// Loads the builtin rule registry from embedded JSON.
///
/// # Panics
///
/// Panics if the embedded JSON is malformed or cannot be deserialized.
pub fn builtin_rules() -> RuleRegistry {
    let rules: Vec<DomainRules> =
        serde_json::from_str(BUILTIN_RULES_JSON).expect("failed to parse builtin rules");

    let mut registry = RuleRegistry::new();
    for r in rules {
        registry.register(r);
    }
    registry
}
