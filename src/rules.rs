//! Window-match rules: authoring format, compiler, and evaluator
//!
//! Rules are authored as nested records with a fixed field set and compiled
//! once at load time into a normalized predicate tree. All validation and
//! regex compilation happens here; evaluation runs on every keystroke against
//! every rule and must not allocate or fail.

use anyhow::{bail, Context, Result};
use regex::{Regex, RegexBuilder};
use serde::Deserialize;

use crate::context::WindowContext;

/// A rule record as authored in the config file.
///
/// `deny_unknown_fields` makes a field name outside this set a fatal load-time
/// error, and the typed fields make a non-boolean `numlk`/`capslk`/`cse`
/// fatal at load as well - never a per-keystroke surprise.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RawRule {
    /// Application class pattern (positive match).
    pub clas: Option<String>,
    /// Window title pattern (positive match).
    pub name: Option<String>,
    /// Input device name pattern (positive match).
    pub devn: Option<String>,
    pub not_clas: Option<String>,
    pub not_name: Option<String>,
    pub not_devn: Option<String>,
    /// Required Num Lock LED state. Omitted means don't-care.
    pub numlk: Option<bool>,
    /// Required Caps Lock LED state. Omitted means don't-care.
    pub capslk: Option<bool>,
    /// Case-sensitive pattern matching (default: insensitive).
    pub cse: Option<bool>,
    /// OR over a list of sub-records. Must not be mixed with scalar fields.
    pub lst: Option<Vec<RawRule>>,
    /// NOR over a list of sub-records. Must not be mixed with scalar fields.
    pub not_lst: Option<Vec<RawRule>>,
    /// Opaque diagnostic label, carried through but never evaluated.
    pub dbg: Option<String>,
}

/// Which string field of the context a leaf matches against.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContextField {
    Class,
    Name,
    Device,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LedField {
    NumLock,
    CapsLock,
}

/// Normalized predicate tree, built once per rule at load time.
#[derive(Debug, Clone)]
pub enum MatchRule {
    /// Regex search against one context field, optionally complemented.
    Leaf {
        field: ContextField,
        pattern: Regex,
        negated: bool,
    },
    /// Exact LED-state requirement (tri-state: absent leaf = don't-care).
    Led { led: LedField, want: bool },
    /// All children must match (the implicit AND of one record's fields).
    All(Vec<MatchRule>),
    /// Any child matches (the `lst` form).
    Any(Vec<MatchRule>),
    /// No child matches (the `not_lst` form).
    NotAny(Vec<MatchRule>),
}

impl MatchRule {
    /// Evaluate this rule against a context snapshot.
    ///
    /// Pure and reentrant; all regexes were compiled by [`compile`]. A `None`
    /// context field never matches a positive leaf (and therefore always
    /// satisfies a negated one).
    #[must_use]
    pub fn matches(&self, ctx: &WindowContext) -> bool {
        match self {
            Self::Leaf {
                field,
                pattern,
                negated,
            } => {
                let value = match field {
                    ContextField::Class => ctx.wm_class.as_deref(),
                    ContextField::Name => ctx.wm_name.as_deref(),
                    ContextField::Device => Some(ctx.device_name.as_str()),
                };
                let found = value.is_some_and(|v| pattern.is_match(v));
                found != *negated
            }
            Self::Led { led, want } => {
                let state = match led {
                    LedField::NumLock => ctx.numlock_on,
                    LedField::CapsLock => ctx.capslock_on,
                };
                state == *want
            }
            Self::All(children) => children.iter().all(|c| c.matches(ctx)),
            Self::Any(children) => children.iter().any(|c| c.matches(ctx)),
            Self::NotAny(children) => !children.iter().any(|c| c.matches(ctx)),
        }
    }
}

/// A compiled rule with its diagnostic label.
#[derive(Debug, Clone)]
pub struct CompiledRule {
    /// The `dbg` label of the top-level record, for log output only.
    pub label: Option<String>,
    pub rule: MatchRule,
}

impl CompiledRule {
    #[must_use]
    pub fn matches(&self, ctx: &WindowContext) -> bool {
        self.rule.matches(ctx)
    }
}

/// Compile a raw record into a normalized tree.
///
/// Fails with a descriptive configuration error when the record is empty,
/// mixes a field's positive and negative forms, combines `lst`/`not_lst` with
/// scalar fields, or contains an invalid regex. Unknown field names and
/// mistyped booleans were already rejected during deserialization.
pub fn compile(raw: &RawRule) -> Result<CompiledRule> {
    let rule = compile_tree(raw)?;
    Ok(CompiledRule {
        label: raw.dbg.clone(),
        rule,
    })
}

fn compile_tree(raw: &RawRule) -> Result<MatchRule> {
    let has_scalar = raw.clas.is_some()
        || raw.name.is_some()
        || raw.devn.is_some()
        || raw.not_clas.is_some()
        || raw.not_name.is_some()
        || raw.not_devn.is_some()
        || raw.numlk.is_some()
        || raw.capslk.is_some()
        || raw.cse.is_some();
    let has_list = raw.lst.is_some() || raw.not_lst.is_some();

    if !has_scalar && !has_list {
        bail!("rule record has no match fields (dbg: {:?})", raw.dbg);
    }

    if raw.clas.is_some() && raw.not_clas.is_some() {
        bail!("rule mixes 'clas' and 'not_clas' (dbg: {:?})", raw.dbg);
    }
    if raw.name.is_some() && raw.not_name.is_some() {
        bail!("rule mixes 'name' and 'not_name' (dbg: {:?})", raw.dbg);
    }
    if raw.devn.is_some() && raw.not_devn.is_some() {
        bail!("rule mixes 'devn' and 'not_devn' (dbg: {:?})", raw.dbg);
    }
    if raw.lst.is_some() && raw.not_lst.is_some() {
        bail!("rule mixes 'lst' and 'not_lst' (dbg: {:?})", raw.dbg);
    }

    if has_list {
        if has_scalar {
            bail!(
                "'lst'/'not_lst' must be used alone, not with scalar fields (dbg: {:?})",
                raw.dbg
            );
        }
        let (records, negated) = match (&raw.lst, &raw.not_lst) {
            (Some(records), None) => (records, false),
            (None, Some(records)) => (records, true),
            _ => unreachable!("checked above"),
        };
        if records.is_empty() {
            bail!("'lst'/'not_lst' needs at least one record (dbg: {:?})", raw.dbg);
        }
        let children = records
            .iter()
            .map(compile_tree)
            .collect::<Result<Vec<_>>>()?;
        return Ok(if negated {
            MatchRule::NotAny(children)
        } else {
            MatchRule::Any(children)
        });
    }

    let case_sensitive = raw.cse.unwrap_or(false);
    let mut leaves = Vec::new();

    let mut push_field = |field: ContextField,
                          positive: &Option<String>,
                          negative: &Option<String>|
     -> Result<()> {
        let (pattern, negated) = match (positive, negative) {
            (Some(p), None) => (p, false),
            (None, Some(p)) => (p, true),
            (None, None) => return Ok(()),
            _ => unreachable!("checked above"),
        };
        let regex = RegexBuilder::new(pattern)
            .case_insensitive(!case_sensitive)
            .build()
            .with_context(|| format!("invalid regex '{pattern}' (dbg: {:?})", raw.dbg))?;
        leaves.push(MatchRule::Leaf {
            field,
            pattern: regex,
            negated,
        });
        Ok(())
    };

    push_field(ContextField::Class, &raw.clas, &raw.not_clas)?;
    push_field(ContextField::Name, &raw.name, &raw.not_name)?;
    push_field(ContextField::Device, &raw.devn, &raw.not_devn)?;

    if let Some(want) = raw.numlk {
        leaves.push(MatchRule::Led {
            led: LedField::NumLock,
            want,
        });
    }
    if let Some(want) = raw.capslk {
        leaves.push(MatchRule::Led {
            led: LedField::CapsLock,
            want,
        });
    }

    if leaves.is_empty() {
        // Only `cse` (and possibly `dbg`) was given - nothing to match on.
        bail!("rule record has no match fields (dbg: {:?})", raw.dbg);
    }

    Ok(MatchRule::All(leaves))
}
