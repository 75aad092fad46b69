use std::collections::HashSet;
use std::fmt;

/// Preprocessor failure with the 1-based source line it was detected on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PreprocessError {
    pub line: usize,
    pub message: String,
}

impl fmt::Display for PreprocessError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "line {}: {}", self.line, self.message)
    }
}

impl std::error::Error for PreprocessError {}

struct Branch {
    parent_active: bool,
    condition: bool,
    in_else: bool,
    line: usize,
}

impl Branch {
    fn active(&self) -> bool {
        self.parent_active && (self.condition != self.in_else)
    }
}

/// Resolves `#ifdef`, `#ifndef`, `#else`, `#endif` and `#define` against
/// `defines`.
///
/// Directive lines and inactive lines are replaced by empty lines so that
/// line numbers in later diagnostics still match the file.
pub fn preprocess(source: &str, defines: &[&str]) -> Result<String, PreprocessError> {
    let mut defined: HashSet<&str> = defines.iter().copied().collect();
    let mut stack: Vec<Branch> = Vec::new();
    let mut out = String::with_capacity(source.len());

    for (index, line) in source.lines().enumerate() {
        let number = index + 1;
        let active = stack.last().is_none_or(Branch::active);

        let Some(directive) = line.trim_start().strip_prefix('#') else {
            if active {
                out.push_str(line);
            }
            out.push('\n');
            continue;
        };

        let mut parts = directive.split_whitespace();
        let keyword = parts.next().unwrap_or_default();
        let argument = parts.next();
        let error = |message: String| PreprocessError { line: number, message };

        match keyword {
            "ifdef" | "ifndef" => {
                let name = argument.ok_or_else(|| error(format!("#{keyword} without a symbol")))?;
                let is_defined = defined.contains(name);
                stack.push(Branch {
                    parent_active: active,
                    condition: is_defined == (keyword == "ifdef"),
                    in_else: false,
                    line: number,
                });
            }
            "else" => {
                let branch = stack.last_mut().ok_or_else(|| error("#else without #ifdef".into()))?;
                if branch.in_else {
                    return Err(error("duplicate #else".into()));
                }
                branch.in_else = true;
            }
            "endif" => {
                stack.pop().ok_or_else(|| error("#endif without #ifdef".into()))?;
            }
            "define" => {
                let name = argument.ok_or_else(|| error("#define without a symbol".into()))?;
                if active {
                    defined.insert(name);
                }
            }
            other => return Err(error(format!("unknown directive #{other}"))),
        }
        out.push('\n');
    }

    if let Some(open) = stack.last() {
        return Err(PreprocessError { line: open.line, message: "unterminated #ifdef".into() });
    }

    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kept(out: &str) -> Vec<&str> {
        out.lines().filter(|l| !l.is_empty()).collect()
    }

    // ── conditionals ──────────────────────────────────────────────────────

    #[test]
    fn ifdef_keeps_defined_block() {
        let src = "a\n#ifdef VERTEX_SHADER\nb\n#endif\nc\n";
        assert_eq!(kept(&preprocess(src, &["VERTEX_SHADER"]).unwrap()), ["a", "b", "c"]);
        assert_eq!(kept(&preprocess(src, &["PIXEL_SHADER"]).unwrap()), ["a", "c"]);
    }

    #[test]
    fn ifndef_inverts() {
        let src = "#ifndef X\nnot_x\n#else\nx\n#endif\n";
        assert_eq!(kept(&preprocess(src, &[]).unwrap()), ["not_x"]);
        assert_eq!(kept(&preprocess(src, &["X"]).unwrap()), ["x"]);
    }

    #[test]
    fn nested_blocks_respect_parent() {
        let src = "#ifdef A\n#ifdef B\nab\n#else\na\n#endif\n#else\n#ifdef B\nb\n#endif\n#endif\n";
        assert_eq!(kept(&preprocess(src, &["A", "B"]).unwrap()), ["ab"]);
        assert_eq!(kept(&preprocess(src, &["A"]).unwrap()), ["a"]);
        assert_eq!(kept(&preprocess(src, &["B"]).unwrap()), ["b"]);
        assert!(kept(&preprocess(src, &[]).unwrap()).is_empty());
    }

    #[test]
    fn define_only_in_active_block() {
        let src = "#ifdef A\n#define B\n#endif\n#ifdef B\nb\n#endif\n";
        assert_eq!(kept(&preprocess(src, &["A"]).unwrap()), ["b"]);
        assert!(kept(&preprocess(src, &[]).unwrap()).is_empty());
    }

    #[test]
    fn line_count_is_preserved() {
        let src = "one\n#ifdef X\ntwo\n#endif\nthree\n";
        let out = preprocess(src, &[]).unwrap();
        assert_eq!(out.lines().count(), src.lines().count());
        assert_eq!(out.lines().nth(4), Some("three"));
    }

    // ── errors ────────────────────────────────────────────────────────────

    #[test]
    fn unterminated_block_reports_opening_line() {
        let err = preprocess("x\n#ifdef A\ny\n", &[]).unwrap_err();
        assert_eq!(err.line, 2);
    }

    #[test]
    fn stray_endif_and_else_rejected() {
        assert_eq!(preprocess("#endif\n", &[]).unwrap_err().line, 1);
        assert_eq!(preprocess("a\n#else\n", &[]).unwrap_err().line, 2);
        assert!(preprocess("#ifdef A\n#else\n#else\n#endif\n", &[]).is_err());
    }

    #[test]
    fn unknown_directive_rejected() {
        let err = preprocess("#include \"common.wgsl\"\n", &[]).unwrap_err();
        assert!(err.message.contains("include"));
    }
}
