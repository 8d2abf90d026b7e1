use serde::{Deserialize, Deserializer, Serialize, de};

use crate::config::ConfigError;
use crate::types::Limits;

const INVALID_FILE_EXT_CHARS: [char; 2] = ['/', '.'];

/// Configuration for a programming language
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Language {
    /// Human-readable name for the language (e.g., "C++ (GCC)")
    pub name: String,

    /// File extension
    pub extension: FileExtension,

    /// Alternative identifiers accepted for this language (e.g., "js")
    #[serde(default)]
    pub aliases: Vec<String>,

    /// How the source file is named on disk
    #[serde(default)]
    pub source_name: SourceNaming,

    /// Compilation configuration (None for interpreted languages)
    #[serde(default)]
    pub compile: Option<CompileConfig>,

    /// Execution configuration (None for document languages)
    #[serde(default)]
    pub run: Option<RunConfig>,

    /// Document rendering configuration
    #[serde(default)]
    pub document: Option<DocumentConfig>,
}

/// The shape of the pipeline a language runs through
#[derive(Debug, Clone, Copy)]
pub enum Pipeline<'a> {
    /// Compile step followed by a run step
    Compiled(&'a CompileConfig, &'a RunConfig),
    /// Run step only
    Interpreted(&'a RunConfig),
    /// Multi-pass render producing a binary artifact
    Document(&'a DocumentConfig),
}

impl Language {
    /// Check if the language is compiled
    pub fn is_compiled(&self) -> bool {
        self.compile.is_some()
    }

    /// Check if the language renders a document instead of producing stdout
    pub fn is_document(&self) -> bool {
        self.document.is_some()
    }

    /// Resolve the pipeline described by this configuration.
    ///
    /// Returns None for configurations that describe no runnable pipeline;
    /// these are rejected when the configuration is loaded.
    pub fn pipeline(&self) -> Option<Pipeline<'_>> {
        match (&self.document, &self.compile, &self.run) {
            (Some(document), None, None) => Some(Pipeline::Document(document)),
            (None, Some(compile), Some(run)) => Some(Pipeline::Compiled(compile, run)),
            (None, None, Some(run)) => Some(Pipeline::Interpreted(run)),
            _ => None,
        }
    }

    /// Short label for listings
    pub fn kind(&self) -> &'static str {
        match self.pipeline() {
            Some(Pipeline::Compiled(..)) => "compiled",
            Some(Pipeline::Interpreted(_)) => "interpreted",
            Some(Pipeline::Document(_)) => "document",
            None => "invalid",
        }
    }

    /// Check whether `id` names this language through one of its aliases
    pub fn has_alias(&self, id: &str) -> bool {
        self.aliases.iter().any(|alias| alias.eq_ignore_ascii_case(id))
    }

    /// Per-language limit overrides
    pub fn limits(&self) -> Limits {
        Limits {
            compile_time_limit: self
                .compile
                .as_ref()
                .and_then(|compile| compile.time_limit)
                .or_else(|| self.document.as_ref().and_then(|doc| doc.time_limit)),
            run_time_limit: self.run.as_ref().and_then(|run| run.time_limit),
            max_output: None,
        }
    }

    /// Expand placeholders in a shell command template.
    ///
    /// Every substituted value is shell-quoted, so paths containing spaces or
    /// quotes reach the toolchain as a single argument.
    pub fn expand_command(template: &str, values: &Placeholders) -> String {
        substitute(template, |key| values.get(key).map(shell_quote))
    }

    /// Expand placeholders in a file name template (no quoting)
    pub fn expand_name(template: &str, values: &Placeholders) -> String {
        substitute(template, |key| values.get(key).map(str::to_owned))
    }
}

/// Rule deciding the base name of the source file
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceNaming {
    /// `<request id>.<extension>` in the shared temp root
    #[default]
    RequestId,

    /// `<declared public type>.<extension>` in a request-scoped directory
    PublicClass,
}

/// Values substituted into command and file name templates
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Placeholders {
    /// `{source}`: absolute path of the source file
    pub source: String,
    /// `{binary}`: absolute path of the native binary (`<dir>/<id>`)
    pub binary: String,
    /// `{artifact}`: absolute path of the compile artifact
    pub artifact: String,
    /// `{dir}`: workspace directory
    pub dir: String,
    /// `{id}`: request identifier
    pub id: String,
    /// `{stem}`: source file name without extension
    pub stem: String,
    /// `{file}`: source file name
    pub file: String,
}

impl Placeholders {
    fn get(&self, key: &str) -> Option<&str> {
        let value = match key {
            "source" => &self.source,
            "binary" | "output" => &self.binary,
            "artifact" => &self.artifact,
            "dir" => &self.dir,
            "id" => &self.id,
            "stem" => &self.stem,
            "file" => &self.file,
            _ => return None,
        };
        Some(value)
    }
}

/// Replace `{key}` occurrences for which `lookup` returns a value.
///
/// Unknown keys and unbalanced braces are copied through untouched.
fn substitute(template: &str, lookup: impl Fn(&str) -> Option<String>) -> String {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;

    while let Some(open) = rest.find('{') {
        out.push_str(&rest[..open]);
        let after = &rest[open + 1..];
        // Shell brace groups like `{ cmd {file}; }` leave an opening brace
        // that is not a placeholder; only that brace is copied through.
        let value = after.find('}').and_then(|close| {
            lookup(&after[..close]).map(|value| (value, &after[close + 1..]))
        });
        match value {
            Some((value, tail)) => {
                out.push_str(&value);
                rest = tail;
            }
            None => {
                out.push('{');
                rest = after;
            }
        }
    }
    out.push_str(rest);
    out
}

/// Quote a value for POSIX `sh`
pub fn shell_quote(value: &str) -> String {
    let safe = !value.is_empty()
        && value
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || "_-./:=+,@%".contains(c));
    if safe {
        return value.to_owned();
    }
    format!("'{}'", value.replace('\'', r"'\''"))
}

/// File extension without dot (e.g., "cpp")
#[derive(Debug, Clone, Serialize)]
pub struct FileExtension(String);

impl FileExtension {
    pub fn new(extension: &str) -> Result<Self, ConfigError> {
        let contains_invalid = extension
            .chars()
            .any(|c| INVALID_FILE_EXT_CHARS.contains(&c));
        if contains_invalid {
            return Err(ConfigError::InvalidFileExtChars);
        }
        Ok(Self(extension.to_owned()))
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl<'de> Deserialize<'de> for FileExtension {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        FileExtension::new(&s).map_err(|_| {
            de::Error::invalid_value(
                de::Unexpected::Str(&s),
                &"a file extension without '/' or '.' characters",
            )
        })
    }
}

impl std::fmt::Display for FileExtension {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Configuration for the compilation step
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompileConfig {
    /// Shell command template
    pub command: String,

    /// Artifact file name template, relative to the workspace directory.
    /// Defaults to the request id (a native binary).
    #[serde(default)]
    pub artifact: Option<String>,

    /// Wall clock limit in seconds (overrides the default compile limit)
    #[serde(default)]
    pub time_limit: Option<f64>,
}

impl CompileConfig {
    pub fn artifact_template(&self) -> &str {
        self.artifact.as_deref().unwrap_or("{id}")
    }
}

/// Configuration for the execution step
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunConfig {
    /// Shell command template
    pub command: String,

    /// Run from the workspace directory and redirect stdin by base name
    #[serde(default)]
    pub in_workspace_dir: bool,

    /// Wall clock limit in seconds (overrides the default run limit)
    #[serde(default)]
    pub time_limit: Option<f64>,
}

/// Configuration for document rendering
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DocumentConfig {
    /// Shell command template, run from the workspace directory
    pub command: String,

    /// Number of times the command is run (later passes resolve references)
    #[serde(default = "default_passes")]
    pub passes: u32,

    /// Extension of the rendered artifact
    #[serde(default = "default_artifact_extension")]
    pub artifact_extension: FileExtension,

    /// Extension of the processor's log file
    #[serde(default = "default_log_extension")]
    pub log_extension: FileExtension,

    /// Extra files the processor leaves behind
    #[serde(default)]
    pub aux_extensions: Vec<FileExtension>,

    /// Log lines containing any of these are reported on failure
    #[serde(default = "default_error_markers")]
    pub error_markers: Vec<String>,

    /// Wall clock limit per pass in seconds
    #[serde(default)]
    pub time_limit: Option<f64>,
}

fn default_passes() -> u32 {
    2
}

fn default_artifact_extension() -> FileExtension {
    FileExtension("pdf".to_owned())
}

fn default_log_extension() -> FileExtension {
    FileExtension("log".to_owned())
}

fn default_error_markers() -> Vec<String> {
    vec!["Error".to_owned(), "!".to_owned()]
}
