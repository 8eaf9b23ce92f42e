/// Placeholder expansion for configured compile and run commands.
///
/// Templates understand exactly two placeholders, `{name}` and `{file}`.
/// Literal braces are written `{{` and `}}`.
use std::fmt;

/// The placeholders a command template may reference.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Placeholder {
    /// The executable's registered name.
    Name,
    /// The source file (compile) or the compiled artifact (run).
    File,
}

impl Placeholder {
    fn parse(key: &str) -> Option<Self> {
        match key {
            "name" => Some(Self::Name),
            "file" => Some(Self::File),
            _ => None,
        }
    }
}

/// Values substituted into a template.
#[derive(Debug, Clone, Copy)]
pub struct TemplateVars<'a> {
    pub name: &'a str,
    pub file: &'a str,
}

impl TemplateVars<'_> {
    fn get(&self, placeholder: Placeholder) -> &str {
        match placeholder {
            Placeholder::Name => self.name,
            Placeholder::File => self.file,
        }
    }
}

/// Why a template could not be expanded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TemplateError {
    /// `{something}` where `something` is not a known placeholder.
    UnknownPlaceholder(String),
    /// A `{` with no closing `}`.
    Unclosed,
    /// A single `}` outside a placeholder.
    StrayBrace,
    /// The argv template has no program.
    EmptyCommand,
}

impl fmt::Display for TemplateError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnknownPlaceholder(key) => write!(
                f,
                "unknown placeholder '{{{key}}}' (known placeholders: {{name}}, {{file}})"
            ),
            Self::Unclosed => write!(f, "unclosed '{{' in template"),
            Self::StrayBrace => write!(f, "single '}}' in template (write '}}}}' for a literal brace)"),
            Self::EmptyCommand => write!(f, "command is empty"),
        }
    }
}

/// Expand a single template string.
///
/// # Errors
///
/// Returns `TemplateError` for unknown placeholders or unbalanced braces.
pub fn expand(template: &str, vars: &TemplateVars<'_>) -> Result<String, TemplateError> {
    let mut out = String::with_capacity(template.len());
    let mut chars = template.chars().peekable();

    while let Some(c) = chars.next() {
        match c {
            '{' if chars.peek() == Some(&'{') => {
                chars.next();
                out.push('{');
            }
            '{' => {
                let mut key = String::new();
                loop {
                    match chars.next() {
                        Some('}') => break,
                        Some(k) => key.push(k),
                        None => return Err(TemplateError::Unclosed),
                    }
                }
                let placeholder = Placeholder::parse(&key)
                    .ok_or_else(|| TemplateError::UnknownPlaceholder(key.clone()))?;
                out.push_str(vars.get(placeholder));
            }
            '}' if chars.peek() == Some(&'}') => {
                chars.next();
                out.push('}');
            }
            '}' => return Err(TemplateError::StrayBrace),
            c => out.push(c),
        }
    }

    Ok(out)
}

/// Expand every element of an argv template.
///
/// # Errors
///
/// Returns `TemplateError::EmptyCommand` for an empty argv, or the first
/// element's expansion error.
pub fn expand_argv(argv: &[String], vars: &TemplateVars<'_>) -> Result<Vec<String>, TemplateError> {
    if argv.is_empty() {
        return Err(TemplateError::EmptyCommand);
    }
    argv.iter().map(|part| expand(part, vars)).collect()
}
