// src/spec/scriptlet.rs

//! Scriptlet bodies

use crate::descriptor::{Scriptlet, TextEncoding};
use crate::error::Result;
use crate::filter::Filter;
use std::path::{Path, PathBuf};

/// Prefix selecting a script file below the resource root
pub const CLASSPATH_PREFIX: &str = "classpath:";

/// Reads the text of scriptlets
pub struct ScriptReader<'a> {
    base_dir: PathBuf,
    resource_root: PathBuf,
    encoding: TextEncoding,
    filter: &'a dyn Filter,
}

impl<'a> ScriptReader<'a> {
    pub fn new(
        base_dir: &Path,
        resource_root: &Path,
        encoding: TextEncoding,
        filter: &'a dyn Filter,
    ) -> Self {
        Self {
            base_dir: base_dir.to_path_buf(),
            resource_root: resource_root.to_path_buf(),
            encoding,
            filter,
        }
    }

    /// Where a script file lives
    pub fn locate(&self, script_file: &str) -> PathBuf {
        match script_file.strip_prefix(CLASSPATH_PREFIX) {
            Some(resource) => self.resource_root.join(resource.trim_start_matches('/')),
            None => self.base_dir.join(script_file),
        }
    }

    /// The inline script, or the script file's contents; `None` when neither
    /// is set
    pub fn body(&self, scriptlet: &Scriptlet) -> Result<Option<String>> {
        let text = match (&scriptlet.script, &scriptlet.script_file) {
            (Some(script), _) => script.clone(),
            (None, Some(file)) => {
                let encoding = match &scriptlet.encoding {
                    Some(label) => TextEncoding::parse(label)?,
                    None => self.encoding,
                };
                encoding.read(&self.locate(file))?
            }
            (None, None) => return Ok(None),
        };

        if scriptlet.filter {
            Ok(Some(self.filter.filter(&text)))
        } else {
            Ok(Some(text))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use crate::filter::TokenFilter;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_inline_and_missing() {
        let filter = TokenFilter::default();
        let reader = ScriptReader::new(Path::new("."), Path::new("res"), TextEncoding::Utf8, &filter);
        assert_eq!(
            reader.body(&Scriptlet::inline("echo hi")).unwrap().as_deref(),
            Some("echo hi")
        );
        assert_eq!(reader.body(&Scriptlet::default()).unwrap(), None);
    }

    #[test]
    fn test_classpath_file_is_filtered() {
        let dir = TempDir::new().unwrap();
        fs::create_dir_all(dir.path().join("resources/scripts")).unwrap();
        fs::write(
            dir.path().join("resources/scripts/post.sh"),
            "useradd @user@\n",
        )
        .unwrap();
        let filter = TokenFilter::default().with_property("user", "acme");
        let reader = ScriptReader::new(
            dir.path(),
            &dir.path().join("resources"),
            TextEncoding::Utf8,
            &filter,
        );
        let scriptlet = Scriptlet {
            script_file: Some("classpath:/scripts/post.sh".to_string()),
            filter: true,
            ..Default::default()
        };
        assert_eq!(reader.body(&scriptlet).unwrap().as_deref(), Some("useradd acme\n"));
    }

    #[test]
    fn test_latin1_script_file() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("pre.sh"), b"echo caf\xe9\n").unwrap();
        let filter = TokenFilter::default();
        let reader = ScriptReader::new(dir.path(), dir.path(), TextEncoding::Utf8, &filter);
        let scriptlet = Scriptlet {
            script_file: Some("pre.sh".to_string()),
            encoding: Some("ISO-8859-1".to_string()),
            ..Default::default()
        };
        assert_eq!(reader.body(&scriptlet).unwrap().as_deref(), Some("echo café\n"));
    }

    #[test]
    fn test_missing_script_file() {
        let dir = TempDir::new().unwrap();
        let filter = TokenFilter::default();
        let reader = ScriptReader::new(dir.path(), dir.path(), TextEncoding::Utf8, &filter);
        let scriptlet = Scriptlet {
            script_file: Some("nope.sh".to_string()),
            ..Default::default()
        };
        assert!(matches!(reader.body(&scriptlet), Err(Error::Io { .. })));
    }
}
