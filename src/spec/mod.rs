// src/spec/mod.rs

//! Spec file composition
//!
//! The composer turns a validated [`PackageDescriptor`] plus what the
//! installer and link planner did into the text of an RPM spec file:
//!
//! - header: `%define`s, Name/Version/Release, metadata and relations
//! - `%description`
//! - `%install`: move of the staging root into `$RPM_BUILD_ROOT`, link
//!   commands and the install scriptlet
//! - `%files`
//! - lifecycle scriptlets, triggers and `%changelog`

mod files;
mod scriptlet;

pub use files::{entry, mapping_entries};
pub use scriptlet::{CLASSPATH_PREFIX, ScriptReader};

use crate::descriptor::{PackageDescriptor, Scriptlet, ScriptletPhase};
use crate::error::{Error, Result};
use crate::filter::Filter;
use crate::install::{InstallReport, LinkPlan};
use std::path::{Path, PathBuf};
use tracing::debug;

/// Writes the spec file text for one package
pub struct SpecComposer<'a> {
    descriptor: &'a PackageDescriptor,
    staging: PathBuf,
    buildroot: PathBuf,
    scripts: ScriptReader<'a>,
}

impl<'a> SpecComposer<'a> {
    pub fn new(
        descriptor: &'a PackageDescriptor,
        staging: &Path,
        buildroot: &Path,
        filter: &'a dyn Filter,
    ) -> Self {
        Self {
            descriptor,
            staging: staging.to_path_buf(),
            buildroot: buildroot.to_path_buf(),
            scripts: ScriptReader::new(
                &descriptor.build.base_dir,
                &descriptor.build.resource_root,
                descriptor.source_encoding,
                filter,
            ),
        }
    }

    /// Compose the complete spec
    pub fn compose(&self, report: &InstallReport, links: &LinkPlan) -> Result<String> {
        let mut sections = vec![
            self.header(),
            self.description(),
            self.install(links)?,
            self.files(report)?,
        ];

        for phase in ScriptletPhase::LIFECYCLE {
            if let Some(scriptlet) = self.descriptor.scriptlets.get(&phase) {
                if scriptlet.is_set() {
                    let directive = scriptlet.directive_line(phase.directive());
                    sections.push(self.scriptlet(&directive, scriptlet)?);
                }
            }
        }

        for trigger in &self.descriptor.triggers {
            sections.push(self.scriptlet(&trigger.directive_line(), &trigger.scriptlet)?);
        }

        if let Some(changelog) = &self.descriptor.changelog {
            sections.push(vec![
                "%changelog".to_string(),
                changelog.trim_end_matches('\n').to_string(),
            ]);
        }

        debug!("Composed spec with {} sections", sections.len());
        let mut text = sections
            .into_iter()
            .map(|lines| lines.join("\n"))
            .collect::<Vec<_>>()
            .join("\n\n");
        text.push('\n');
        Ok(text)
    }

    fn header(&self) -> Vec<String> {
        let d = self.descriptor;
        let mut lines: Vec<String> = d.defines.iter().map(|def| format!("%define {}", def)).collect();

        lines.push(format!("Name: {}", d.name));
        lines.push(format!("Version: {}", d.version.version));
        lines.push(format!("Release: {}", d.version.release));

        let tags = [
            ("Summary", &d.summary),
            ("License", &d.license),
            ("Distribution", &d.distribution),
            ("Icon", &d.icon),
            ("Vendor", &d.vendor),
            ("URL", &d.url),
            ("Group", &d.group),
            ("Packager", &d.packager),
        ];
        for (tag, value) in tags {
            if let Some(value) = value {
                lines.push(format!("{}: {}", tag, value));
            }
        }

        let relations = [
            ("Provides", &d.provides),
            ("Requires", &d.requires),
            ("PreReq", &d.prereqs),
            ("Obsoletes", &d.obsoletes),
            ("Conflicts", &d.conflicts),
        ];
        for (tag, values) in relations {
            lines.extend(values.iter().map(|v| format!("{}: {}", tag, v)));
        }

        lines.push(format!("autoprov: {}", yes_no(d.auto_provides)));
        lines.push(format!("autoreq: {}", yes_no(d.auto_requires)));
        lines.extend(d.prefixes.iter().map(|p| format!("Prefix: {}", p)));

        if d.is_noarch() {
            lines.push("BuildArch: noarch".to_string());
        }
        lines.push(format!("BuildRoot: {}", self.buildroot.display()));
        lines
    }

    fn description(&self) -> Vec<String> {
        let text = self
            .descriptor
            .description
            .as_deref()
            .or(self.descriptor.summary.as_deref())
            .unwrap_or("");
        vec!["%description".to_string(), text.trim_end_matches('\n').to_string()]
    }

    fn install(&self, links: &LinkPlan) -> Result<Vec<String>> {
        let staging = self.staging.display();
        let mut lines = vec![
            "%install".to_string(),
            "if [ -d $RPM_BUILD_ROOT ];".to_string(),
            "then".to_string(),
            format!("  mv {}/* $RPM_BUILD_ROOT", staging),
            "else".to_string(),
            format!("  mv {} $RPM_BUILD_ROOT", staging),
            "fi".to_string(),
        ];
        lines.extend(links.commands.iter().cloned());

        if let Some(install) = self.descriptor.scriptlets.get(&ScriptletPhase::Install) {
            if let Some(body) = self.scripts.body(install)? {
                lines.push(body.trim_end_matches('\n').to_string());
            }
        }
        Ok(lines)
    }

    fn files(&self, report: &InstallReport) -> Result<Vec<String>> {
        let mappings = &self.descriptor.mappings;
        if mappings.len() != report.mappings.len() {
            return Err(Error::ResolutionError(format!(
                "Install report covers {} of {} mappings",
                report.mappings.len(),
                mappings.len()
            )));
        }

        let mut lines = vec!["%files".to_string()];
        if let Some(defattr) = self.descriptor.defaults.defattr() {
            lines.push(defattr);
        }
        for (mapping, outcome) in mappings.iter().zip(&report.mappings) {
            lines.extend(mapping_entries(
                mapping,
                outcome,
                &self.staging,
                &self.descriptor.defaults,
            )?);
        }
        Ok(lines)
    }

    fn scriptlet(&self, directive: &str, scriptlet: &Scriptlet) -> Result<Vec<String>> {
        let mut lines = vec![directive.to_string()];
        if let Some(body) = self.scripts.body(scriptlet)? {
            lines.push(body.trim_end_matches('\n').to_string());
        }
        Ok(lines)
    }
}

fn yes_no(flag: bool) -> &'static str {
    if flag { "yes" } else { "no" }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::descriptor::PackageManifest;
    use crate::filter::TokenFilter;
    use crate::install::MappingOutcome;

    fn descriptor(toml_text: &str) -> PackageDescriptor {
        let manifest = PackageManifest::parse(toml_text).unwrap();
        PackageDescriptor::from_manifest(&manifest, Path::new("/work")).unwrap()
    }

    fn compose(d: &PackageDescriptor, report: &InstallReport, links: &LinkPlan) -> String {
        let filter = TokenFilter::default();
        SpecComposer::new(
            d,
            Path::new("/work/target/rpm/tmp-buildroot"),
            Path::new("/work/target/rpm/buildroot"),
            &filter,
        )
        .compose(report, links)
        .unwrap()
    }

    #[test]
    fn test_header_and_sections_in_order() {
        let d = descriptor(
            r#"
[package]
name = "tool"
version = "2.0"
architecture = "noarch"
summary = "A tool"
license = "MIT"
requires = ["bash"]
obsoletes = ["oldtool"]
auto_requires = false
defines = ["_unpackaged_files_terminate_build 0"]
changelog = "* Mon Jan 01 2024 Dev <dev@example.com> - 2.0-1\n- release\n"

[scriptlets]
post_install_script = "echo post"
pre_install_script = "echo pre"
install_script = "chmod 700 $RPM_BUILD_ROOT/opt"

[[trigger]]
kind = "install"
script = "echo trig"
conditions = ["httpd", "nginx"]
"#,
        );
        let links = LinkPlan {
            commands: vec!["ln -s /a $RPM_BUILD_ROOT/b/a".to_string()],
        };
        let spec = compose(&d, &InstallReport::default(), &links);

        let expected = "\
%define _unpackaged_files_terminate_build 0
Name: tool
Version: 2.0
Release: 1
Summary: A tool
License: MIT
Provides: oldtool
Requires: bash
Obsoletes: oldtool
autoprov: yes
autoreq: no
BuildArch: noarch
BuildRoot: /work/target/rpm/buildroot

%description
A tool

%install
if [ -d $RPM_BUILD_ROOT ];
then
  mv /work/target/rpm/tmp-buildroot/* $RPM_BUILD_ROOT
else
  mv /work/target/rpm/tmp-buildroot $RPM_BUILD_ROOT
fi
ln -s /a $RPM_BUILD_ROOT/b/a
chmod 700 $RPM_BUILD_ROOT/opt

%files

%pre
echo pre

%post
echo post

%triggerin -- httpd, nginx
echo trig

%changelog
* Mon Jan 01 2024 Dev <dev@example.com> - 2.0-1
- release
";
        assert_eq!(spec, expected);
    }

    #[test]
    fn test_files_section_with_defattr() {
        let d = descriptor(
            r#"
[package]
name = "tool"
version = "1"
architecture = "x86_64"

[defaults]
file_mode = "644"
dir_mode = "755"
user = "root"
group = "root"

[[mapping]]
directory = "/var/lib/tool"
user = "tool"
"#,
        );
        let report = InstallReport {
            mappings: vec![MappingOutcome {
                directory: "/var/lib/tool".to_string(),
                ..Default::default()
            }],
        };
        let spec = compose(&d, &report, &LinkPlan::default());
        assert!(!spec.contains("BuildArch"));
        assert!(spec.contains(
            "%files\n%defattr(644,root,root,755)\n%dir %attr(644,tool,root) \"/var/lib/tool\"\n"
        ));
    }

    #[test]
    fn test_program_only_scriptlet() {
        let d = descriptor(
            r#"
[package]
name = "lib"
version = "1"

[scriptlets.post_install]
program = "/sbin/ldconfig"
"#,
        );
        let spec = compose(&d, &InstallReport::default(), &LinkPlan::default());
        assert!(spec.ends_with("%post -p /sbin/ldconfig\n"));
    }

    #[test]
    fn test_report_must_cover_mappings() {
        let d = descriptor(
            r#"
[package]
name = "tool"
version = "1"

[[mapping]]
directory = "/opt/tool"
"#,
        );
        let filter = TokenFilter::default();
        let err = SpecComposer::new(&d, Path::new("/s"), Path::new("/b"), &filter)
            .compose(&InstallReport::default(), &LinkPlan::default())
            .unwrap_err();
        assert!(matches!(err, Error::ResolutionError(_)));
    }
}
