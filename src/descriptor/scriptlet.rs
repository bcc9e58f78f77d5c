// src/descriptor/scriptlet.rs

//! Lifecycle scriptlets and triggers

use crate::error::{Error, Result};
use serde::Deserialize;
use std::fmt;
use tracing::warn;

/// When a scriptlet runs, in the order sections appear in the spec
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ScriptletPhase {
    /// `%install`, appended after the build-root move and links
    Install,
    Prepare,
    PreTransaction,
    PreInstall,
    PostInstall,
    PreUninstall,
    PostUninstall,
    PostTransaction,
    Verify,
    Clean,
}

impl ScriptletPhase {
    /// Phases written as their own sections after `%files`, in spec order
    pub const LIFECYCLE: [ScriptletPhase; 9] = [
        ScriptletPhase::Prepare,
        ScriptletPhase::PreTransaction,
        ScriptletPhase::PreInstall,
        ScriptletPhase::PostInstall,
        ScriptletPhase::PreUninstall,
        ScriptletPhase::PostUninstall,
        ScriptletPhase::PostTransaction,
        ScriptletPhase::Verify,
        ScriptletPhase::Clean,
    ];

    pub const ALL: [ScriptletPhase; 10] = [
        ScriptletPhase::Install,
        ScriptletPhase::Prepare,
        ScriptletPhase::PreTransaction,
        ScriptletPhase::PreInstall,
        ScriptletPhase::PostInstall,
        ScriptletPhase::PreUninstall,
        ScriptletPhase::PostUninstall,
        ScriptletPhase::PostTransaction,
        ScriptletPhase::Verify,
        ScriptletPhase::Clean,
    ];

    /// Section directive in the spec file
    pub fn directive(&self) -> &'static str {
        match self {
            Self::Install => "%install",
            Self::Prepare => "%prep",
            Self::PreTransaction => "%pretrans",
            Self::PreInstall => "%pre",
            Self::PostInstall => "%post",
            Self::PreUninstall => "%preun",
            Self::PostUninstall => "%postun",
            Self::PostTransaction => "%posttrans",
            Self::Verify => "%verifyscript",
            Self::Clean => "%clean",
        }
    }

    /// Key used in the `[scriptlets]` descriptor table
    pub fn key(&self) -> &'static str {
        match self {
            Self::Install => "install",
            Self::Prepare => "prepare",
            Self::PreTransaction => "pre_transaction",
            Self::PreInstall => "pre_install",
            Self::PostInstall => "post_install",
            Self::PreUninstall => "pre_uninstall",
            Self::PostUninstall => "post_uninstall",
            Self::PostTransaction => "post_transaction",
            Self::Verify => "verify",
            Self::Clean => "clean",
        }
    }
}

impl fmt::Display for ScriptletPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

/// Script content for one phase
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct Scriptlet {
    /// Inline script text
    pub script: Option<String>,
    /// Script file; `classpath:` prefix reads from the resource root
    pub script_file: Option<String>,
    /// Interpreter (`-p`)
    pub program: Option<String>,
    /// Subpackage name (`-n`)
    pub subpackage: Option<String>,
    /// Encoding of `script_file`; defaults to the package source encoding
    pub encoding: Option<String>,
    /// Pass the script file through the token filter
    pub filter: bool,
}

impl Scriptlet {
    pub fn inline(script: &str) -> Self {
        Self {
            script: Some(script.to_string()),
            ..Default::default()
        }
    }

    /// A directive is written only when there is something to run
    pub fn is_set(&self) -> bool {
        self.script.is_some() || self.script_file.is_some() || self.program.is_some()
    }

    /// `%<phase>[ -n sub][ -p program]`
    pub fn directive_line(&self, directive: &str) -> String {
        let mut line = directive.to_string();
        if let Some(sub) = &self.subpackage {
            line.push_str(" -n ");
            line.push_str(sub);
        }
        if let Some(program) = &self.program {
            line.push_str(" -p ");
            line.push_str(program);
        }
        line
    }
}

/// Coalesce the legacy and canonical ways of declaring one scriptlet
///
/// The canonical table wins; legacy inline script, script file and program
/// keys are folded into one scriptlet when no canonical table is given.
pub fn resolve_scriptlet(
    phase: ScriptletPhase,
    canonical: Option<Scriptlet>,
    legacy_script: Option<String>,
    legacy_file: Option<String>,
    legacy_program: Option<String>,
) -> Option<Scriptlet> {
    let has_legacy = legacy_script.is_some() || legacy_file.is_some() || legacy_program.is_some();

    if let Some(scriptlet) = canonical {
        if has_legacy {
            warn!(
                "Scriptlet '{}' declared both as a table and with legacy keys; using the table",
                phase
            );
        }
        return Some(scriptlet);
    }

    if !has_legacy {
        return None;
    }

    Some(Scriptlet {
        script: legacy_script,
        script_file: legacy_file,
        program: legacy_program,
        ..Default::default()
    })
}

/// Which trigger section a trigger produces
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TriggerKind {
    PreInstall,
    Install,
    Uninstall,
    PostUninstall,
}

impl TriggerKind {
    pub fn directive(&self) -> &'static str {
        match self {
            Self::PreInstall => "%triggerprein",
            Self::Install => "%triggerin",
            Self::Uninstall => "%triggerun",
            Self::PostUninstall => "%triggerpostun",
        }
    }
}

/// A scriptlet run when other packages are installed or removed
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Trigger {
    pub kind: TriggerKind,
    #[serde(flatten)]
    pub scriptlet: Scriptlet,
    /// Package conditions such as "httpd >= 2.4"
    #[serde(default)]
    pub conditions: Vec<String>,
}

impl Trigger {
    pub fn validate(&self) -> Result<()> {
        if self.conditions.iter().all(|c| c.trim().is_empty()) {
            return Err(Error::ConfigError(format!(
                "Trigger {} has no package conditions",
                self.kind.directive()
            )));
        }
        Ok(())
    }

    /// Directive line followed by ` -- ` and the comma-joined conditions
    pub fn directive_line(&self) -> String {
        format!(
            "{} -- {}",
            self.scriptlet.directive_line(self.kind.directive()),
            self.conditions.join(", ")
        )
    }
}
