// rpmpq: RPM spec patch-queue tool
//
// SPDX-FileCopyrightText: 2026 Romeo Ahmed
// SPDX-License-Identifier: GPL-3.0-or-later

//! Minimal RPM macro expander.
//!
//! Knows plain `%name` / `%{name}` references, `%{?name}` and
//! `%{?name:text}` conditionals and the `%%` escape. Definitions come from
//! `%define` / `%global` lines and from the `name`, `version` and `release`
//! tags.

use regex::Regex;
use std::collections::BTreeMap;
use std::sync::LazyLock;

use crate::error::{PqResult, SpecError};

static MACRO_REF_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"%%|%\{\?(?P<cond>[A-Za-z_][A-Za-z0-9_]*)(?::(?P<alt>[^}]*))?\}|%\{(?P<braced>[A-Za-z_][A-Za-z0-9_]*)\}|%(?P<bare>[A-Za-z_][A-Za-z0-9_]*)",
    )
    .expect("valid macro reference regex")
});

static DEFINE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\s*%(?:define|global)\s+(?P<name>[A-Za-z_][A-Za-z0-9_]*)(?P<params>\([^)]*\))?\s+(?P<value>.*?)\s*$")
        .expect("valid macro definition regex")
});

const MAX_DEPTH: usize = 16;

/// Macro definitions collected from a spec file.
#[derive(Debug, Clone, Default)]
pub struct MacroTable {
    defs: BTreeMap<String, String>,
}

impl MacroTable {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds or replaces a definition.
    pub fn define(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.defs.insert(name.into(), value.into());
    }

    #[must_use]
    pub fn get(&self, name: &str) -> Option<&str> {
        self.defs.get(name).map(String::as_str)
    }

    /// Records the definition on `line`, if it is a `%define` / `%global`.
    ///
    /// Parametric macros are ignored. Returns whether a definition was added.
    pub fn define_from_line(&mut self, line: &str) -> bool {
        let Some(caps) = DEFINE_RE.captures(line) else {
            return false;
        };
        if caps.name("params").is_some() {
            return false;
        }
        self.define(&caps["name"], &caps["value"]);
        true
    }

    /// Expands every macro reference in `text`.
    ///
    /// # Errors
    ///
    /// Returns `SpecError::MacroExpand` for an unknown unconditional macro or
    /// definitions nested too deeply.
    pub fn expand(&self, text: &str) -> PqResult<String> {
        self.expand_depth(text, 0)
    }

    fn expand_depth(&self, text: &str, depth: usize) -> PqResult<String> {
        if depth > MAX_DEPTH {
            return Err(SpecError::MacroExpand(format!("{text} (recursion too deep)")).into());
        }

        let mut out = String::with_capacity(text.len());
        let mut last = 0;
        for caps in MACRO_REF_RE.captures_iter(text) {
            let Some(whole) = caps.get(0) else { continue };
            out.push_str(&text[last..whole.start()]);
            last = whole.end();

            if whole.as_str() == "%%" {
                out.push('%');
            } else if let Some(name) = caps.name("cond") {
                if let Some(value) = self.get(name.as_str()) {
                    match caps.name("alt") {
                        Some(alt) => out.push_str(&self.expand_depth(alt.as_str(), depth + 1)?),
                        None => out.push_str(&self.expand_depth(value, depth + 1)?),
                    }
                }
            } else if let Some(name) = caps.name("braced").or_else(|| caps.name("bare")) {
                let value = self
                    .get(name.as_str())
                    .ok_or_else(|| SpecError::MacroExpand(name.as_str().to_string()))?;
                out.push_str(&self.expand_depth(value, depth + 1)?);
            }
        }
        out.push_str(&text[last..]);
        Ok(out)
    }
}
