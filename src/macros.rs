// src/macros.rs

//! RPM macro evaluation
//!
//! Paths in mappings may reference RPM macros such as `%{_bindir}`. They are
//! resolved once per distinct name for the lifetime of a build: explicit
//! `%define` statements win, anything else is asked of a [`MacroBackend`] and
//! memoized.

use crate::error::Result;
use crate::process::CommandRunner;
use regex::Regex;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;
use tracing::debug;

static MACRO_REFERENCE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"%\{([^}]*)\}").expect("macro reference pattern is valid"));

/// Source of macro values for names not covered by `%define` statements
pub trait MacroBackend {
    /// Evaluate a macro; `None` means the macro is undefined
    fn evaluate(&self, name: &str) -> Result<Option<String>>;
}

/// Evaluates macros with `rpm --eval`
pub struct RpmEvalBackend<'a> {
    runner: &'a dyn CommandRunner,
    workdir: PathBuf,
}

impl<'a> RpmEvalBackend<'a> {
    pub fn new(runner: &'a dyn CommandRunner, workdir: &Path) -> Self {
        Self {
            runner,
            workdir: workdir.to_path_buf(),
        }
    }
}

impl MacroBackend for RpmEvalBackend<'_> {
    fn evaluate(&self, name: &str) -> Result<Option<String>> {
        let reference = format!("%{{{}}}", name);
        let output = self.runner.run_checked(
            &self.workdir,
            "rpm",
            &["--eval".to_string(), reference.clone()],
        )?;

        // rpm echoes undefined macros back unchanged
        let value = output.stdout.trim_end_matches(['\r', '\n']);
        if value == reference {
            Ok(None)
        } else {
            Ok(Some(value.to_string()))
        }
    }
}

/// Memoizing macro resolver scoped to one build run
pub struct MacroEvaluator<'a> {
    backend: Box<dyn MacroBackend + 'a>,
    overrides: HashMap<String, String>,
    cache: HashMap<String, String>,
}

impl<'a> MacroEvaluator<'a> {
    /// Create an evaluator from a backend and `%define` statements ("name value")
    ///
    /// Statements that do not split into exactly a name and a value are ignored.
    pub fn new(backend: impl MacroBackend + 'a, defines: &[String]) -> Self {
        let overrides = defines
            .iter()
            .filter_map(|define| {
                let mut parts = define.splitn(2, ' ');
                match (parts.next(), parts.next()) {
                    (Some(name), Some(value)) if !name.is_empty() => {
                        Some((name.to_string(), value.to_string()))
                    }
                    _ => None,
                }
            })
            .collect();

        Self {
            backend: Box::new(backend),
            overrides,
            cache: HashMap::new(),
        }
    }

    /// Resolve a single macro name
    pub fn resolve(&mut self, name: &str) -> Result<String> {
        if let Some(value) = self.overrides.get(name) {
            return Ok(value.clone());
        }
        if let Some(value) = self.cache.get(name) {
            return Ok(value.clone());
        }

        let value = match self.backend.evaluate(name)? {
            Some(value) => value,
            None => format!("%{{{}}}", name),
        };
        debug!("Macro %{{{}}} evaluated to '{}'", name, value);
        self.cache.insert(name.to_string(), value.clone());
        Ok(value)
    }

    /// Replace every `%{name}` reference in `text`
    pub fn expand(&mut self, text: &str) -> Result<String> {
        if !text.contains("%{") {
            return Ok(text.to_string());
        }

        let mut expanded = String::with_capacity(text.len());
        let mut last = 0;
        let names: Vec<(usize, usize, String)> = MACRO_REFERENCE
            .captures_iter(text)
            .filter_map(|caps| {
                let whole = caps.get(0)?;
                Some((whole.start(), whole.end(), caps[1].to_string()))
            })
            .collect();

        for (start, end, name) in names {
            expanded.push_str(&text[last..start]);
            expanded.push_str(&self.resolve(&name)?);
            last = end;
        }
        expanded.push_str(&text[last..]);
        Ok(expanded)
    }
}

/// Backend that knows no macros; every reference is left as written
#[derive(Debug, Clone, Copy, Default)]
pub struct NoMacros;

impl MacroBackend for NoMacros {
    fn evaluate(&self, _name: &str) -> Result<Option<String>> {
        Ok(None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::process::testing::ScriptedRunner;
    use std::cell::RefCell;
    use std::rc::Rc;

    struct CountingBackend {
        calls: Rc<RefCell<Vec<String>>>,
    }

    impl MacroBackend for CountingBackend {
        fn evaluate(&self, name: &str) -> Result<Option<String>> {
            self.calls.borrow_mut().push(name.to_string());
            Ok(match name {
                "_bindir" => Some("/usr/bin".to_string()),
                _ => None,
            })
        }
    }

    fn counting() -> (CountingBackend, Rc<RefCell<Vec<String>>>) {
        let calls = Rc::new(RefCell::new(Vec::new()));
        (
            CountingBackend {
                calls: Rc::clone(&calls),
            },
            calls,
        )
    }

    #[test]
    fn test_backend_called_once_per_name() {
        let (backend, calls) = counting();
        let mut macros = MacroEvaluator::new(backend, &[]);

        assert_eq!(macros.resolve("_bindir").unwrap(), "/usr/bin");
        assert_eq!(macros.resolve("_bindir").unwrap(), "/usr/bin");
        assert_eq!(
            macros.expand("%{_bindir}/a:%{_bindir}/b").unwrap(),
            "/usr/bin/a:/usr/bin/b"
        );
        assert_eq!(calls.borrow().as_slice(), ["_bindir"]);
    }

    #[test]
    fn test_defines_override_backend() {
        let (backend, calls) = counting();
        let defines = vec![
            "_bindir /opt/bin".to_string(),
            "app_home /opt/my app".to_string(),
            "malformed".to_string(),
        ];
        let mut macros = MacroEvaluator::new(backend, &defines);

        assert_eq!(macros.resolve("_bindir").unwrap(), "/opt/bin");
        assert_eq!(macros.resolve("app_home").unwrap(), "/opt/my app");
        assert_eq!(macros.resolve("malformed").unwrap(), "%{malformed}");
        assert_eq!(calls.borrow().as_slice(), ["malformed"]);
    }

    #[test]
    fn test_undefined_macro_left_in_place() {
        let mut macros = MacroEvaluator::new(NoMacros, &[]);
        assert_eq!(
            macros.expand("/opt/%{unknown}/lib").unwrap(),
            "/opt/%{unknown}/lib"
        );
        assert_eq!(macros.expand("/plain/path").unwrap(), "/plain/path");
    }

    #[test]
    fn test_rpm_eval_backend() {
        let runner = ScriptedRunner::default();
        runner.push(0, "/usr/lib64\n");
        runner.push(0, "%{nothing}\n");
        let backend = RpmEvalBackend::new(&runner, Path::new("."));

        assert_eq!(backend.evaluate("_libdir").unwrap().as_deref(), Some("/usr/lib64"));
        assert_eq!(backend.evaluate("nothing").unwrap(), None);

        let calls = runner.calls.borrow();
        assert_eq!(calls[0].0, "rpm");
        assert_eq!(calls[0].1, vec!["--eval".to_string(), "%{_libdir}".to_string()]);
    }

    #[test]
    fn test_rpm_eval_failure_is_fatal() {
        let runner = ScriptedRunner::default();
        runner.push(1, "");
        let backend = RpmEvalBackend::new(&runner, Path::new("."));
        assert!(backend.evaluate("_libdir").is_err());
    }
}
