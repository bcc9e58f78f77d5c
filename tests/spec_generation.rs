// tests/spec_generation.rs

//! End-to-end spec generation from a descriptor on disk.
//!
//! These tests verify that:
//! 1. A mapping that owns its whole directory is listed as the directory
//! 2. Partial includes are enumerated file by file
//! 3. Soft links collapse to one directory link only when safe
//! 4. Header, scriptlets and triggers land in the expected order

mod common;

use common::{Project, files_section, install_commands};
use rpmweave::Error;

#[test]
fn test_whole_directory_is_one_entry() {
    let project = Project::new();
    project.file("dist/a.txt", "a");
    project.file("dist/b/c.txt", "c");
    project.descriptor(
        r#"
[package]
name = "app"
version = "1.0"
architecture = "noarch"

[[mapping]]
directory = "/opt/app"

[[mapping.source]]
location = "dist"
"#,
    );

    let generated = project.generate().unwrap();
    assert_eq!(files_section(&generated.spec), vec!["\"/opt/app\""]);
    assert!(project.staging().join("opt/app/b/c.txt").is_file());
}

#[test]
fn test_partial_includes_are_enumerated() {
    let project = Project::new();
    project.file("dist/a.txt", "a");
    project.file("dist/b/c.txt", "c");
    project.descriptor(
        r#"
[package]
name = "app"
version = "1.0"

[[mapping]]
directory = "/opt/app"

[[mapping.source]]
location = "dist"
includes = ["a.txt"]
"#,
    );

    let generated = project.generate().unwrap();
    assert_eq!(files_section(&generated.spec), vec!["\"/opt/app/a.txt\""]);
}

#[test]
fn test_shared_directory_is_not_claimed_twice() {
    let project = Project::new();
    project.file("bin/tool", "#!/bin/sh\n");
    project.file("conf/tool.conf", "x=1\n");
    project.descriptor(
        r#"
[package]
name = "tool"
version = "2.1-rc-1"

[defaults]
user = "root"
group = "root"

[[mapping]]
directory = "/opt/tool"
file_mode = "755"

[[mapping.source]]
location = "bin"

[[mapping]]
directory = "/opt/tool"
configuration = "noreplace"

[[mapping.source]]
location = "conf"
"#,
    );

    let generated = project.generate().unwrap();
    assert!(generated.spec.contains("Version: 2.1\nRelease: rc_1_1\n"));
    assert_eq!(
        files_section(&generated.spec),
        vec![
            "%defattr(-,root,root,-)",
            "%attr(755,root,root) \"/opt/tool/tool\"",
            "%config(noreplace) \"/opt/tool/tool.conf\"",
        ]
    );
}

#[test]
fn test_soft_link_replaces_destination() {
    let project = Project::new();
    project.file("dist/lib/a.jar", "a");
    project.descriptor(
        r#"
[package]
name = "app"
version = "1.0"

[[mapping]]
directory = "/opt/app/lib"

[[mapping.source]]
location = "dist/lib"

[[mapping]]
directory = "/usr/share/java/app"

[[mapping.source]]
location = "/opt/app/lib"
soft_link = true
"#,
    );

    let generated = project.generate().unwrap();
    assert_eq!(
        install_commands(&generated.spec),
        vec!["ln -s /opt/app/lib $RPM_BUILD_ROOT/usr/share/java/app"]
    );
    assert_eq!(
        files_section(&generated.spec),
        vec!["\"/opt/app/lib\"", "\"/usr/share/java/app\""]
    );
    assert!(generated.staged.report.mappings[1].replaced);
}

#[test]
fn test_two_link_sources_link_each_file() {
    let project = Project::new();
    project.file("dist/lib/a.jar", "a");
    project.file("dist/lib/b.jar", "b");
    project.descriptor(
        r#"
[package]
name = "app"
version = "1.0"

[[mapping]]
directory = "/opt/app/lib"

[[mapping.source]]
location = "dist/lib"

[[mapping]]
directory = "/usr/share/java/app"

[[mapping.source]]
location = "/opt/app/lib"
soft_link = true

[[mapping.source]]
location = "/usr/lib/jvm/jre/lib/tools.jar"
soft_link = true
"#,
    );

    let generated = project.generate().unwrap();
    assert_eq!(
        install_commands(&generated.spec),
        vec![
            "ln -s /opt/app/lib/a.jar $RPM_BUILD_ROOT/usr/share/java/app/a.jar",
            "ln -s /opt/app/lib/b.jar $RPM_BUILD_ROOT/usr/share/java/app/b.jar",
            "ln -s /usr/lib/jvm/jre/lib/tools.jar $RPM_BUILD_ROOT/usr/share/java/app/tools.jar",
        ]
    );
    assert_eq!(
        files_section(&generated.spec),
        vec![
            "\"/opt/app/lib\"",
            "\"/usr/share/java/app/a.jar\"",
            "\"/usr/share/java/app/b.jar\"",
            "\"/usr/share/java/app/tools.jar\"",
        ]
    );
}

#[test]
fn test_macros_from_defines_are_expanded() {
    let project = Project::new();
    project.file("dist/run.sh", "run");
    project.descriptor(
        r#"
[package]
name = "app"
version = "1.0"
defines = ["app_home /srv/app"]

[[mapping]]
directory = "%{app_home}/bin"

[[mapping.source]]
location = "dist"
"#,
    );

    let generated = project.generate().unwrap();
    assert!(generated.spec.starts_with("%define app_home /srv/app\nName: app\n"));
    assert_eq!(files_section(&generated.spec), vec!["\"/srv/app/bin\""]);
    assert!(project.staging().join("srv/app/bin/run.sh").is_file());
}

#[test]
fn test_scriptlets_and_triggers_follow_files() {
    let project = Project::new();
    project.file("scripts/post.sh", "echo installed ${rpm.version}\n");
    project.descriptor(
        r#"
[package]
name = "svc"
version = "4.0"

[scriptlets.post_install]
script_file = "scripts/post.sh"
filter = true

[scriptlets.pre_uninstall]
script = "systemctl stop svc"
subpackage = "svc-core"

[[trigger]]
kind = "uninstall"
script = "systemctl reload svc"
conditions = ["httpd < 2.4"]
"#,
    );

    let spec = project.generate().unwrap().spec;
    let post = spec.find("%post\necho installed 4.0\n").unwrap();
    let preun = spec.find("%preun -n svc-core\nsystemctl stop svc\n").unwrap();
    let trigger = spec.find("%triggerun -- httpd < 2.4\nsystemctl reload svc\n").unwrap();
    let files = spec.find("%files").unwrap();
    assert!(files < post && post < preun && preun < trigger);
}

#[test]
fn test_missing_required_source_fails() {
    let project = Project::new();
    project.descriptor(
        r#"
[package]
name = "app"
version = "1.0"

[[mapping]]
directory = "/opt/app"

[[mapping.source]]
location = "does-not-exist"
"#,
    );

    let err = project.generate().unwrap_err();
    assert!(matches!(err, Error::ConfigError(_)));
}
