//! Content-addressed patch rules.
//!
//! A [`PatchRule`] names a target file, a regex selecting the line to edit,
//! a predicate telling whether that line is already in the desired state,
//! and the transformation to apply when it is not. Only the first matching
//! line is considered.

use std::fmt;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use regex::Regex;
use tracing::{info, warn};

use super::{backup_file, split_lines, split_terminator, MissingFile, PatchError, PatchMode};

type LinePredicate = Box<dyn Fn(&str) -> bool>;
type LineTransform = Box<dyn Fn(&str) -> String>;

/// Fallback when no line matches the rule.
#[derive(Debug, Clone)]
pub enum MissingLine {
    /// Leave the file alone and report [`Change::NoMatch`].
    Warn,
    /// Append this line at the end of the file.
    Append(String),
    /// Insert this line right after the first line matching `anchor`.
    /// Reports [`Change::NoMatch`] when the anchor is absent too.
    InsertAfter { anchor: Regex, line: String },
}

pub struct PatchRule {
    target: PathBuf,
    line_match: Regex,
    applied: LinePredicate,
    transform: LineTransform,
    missing_line: MissingLine,
    missing_file: MissingFile,
}

impl fmt::Debug for PatchRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PatchRule")
            .field("target", &self.target)
            .field("line_match", &self.line_match.as_str())
            .field("missing_line", &self.missing_line)
            .field("missing_file", &self.missing_file)
            .finish_non_exhaustive()
    }
}

impl PatchRule {
    /// Build a rule from its parts. Defaults: warn on no match, fail on a
    /// missing file.
    pub fn new<A, T>(target: impl Into<PathBuf>, line_match: Regex, applied: A, transform: T) -> Self
    where
        A: Fn(&str) -> bool + 'static,
        T: Fn(&str) -> String + 'static,
    {
        Self {
            target: target.into(),
            line_match,
            applied: Box::new(applied),
            transform: Box::new(transform),
            missing_line: MissingLine::Warn,
            missing_file: MissingFile::Fail,
        }
    }

    /// Append `token` to the line starting with `key` unless it already
    /// carries `token` as a whole whitespace-separated word.
    ///
    /// Anything from the first `#` on is a comment: it is ignored by the
    /// check and the token goes in front of it.
    pub fn append_token(target: impl Into<PathBuf>, key: &str, token: &str) -> Result<Self, PatchError> {
        let line_match = Regex::new(&format!("^{}", regex::escape(key)))?;
        let check = token.to_string();
        let add = token.to_string();
        Ok(Self::new(
            target,
            line_match,
            move |line| has_token(split_comment(line).0, &check),
            move |line| match split_comment(line) {
                (body, "") => format!("{} {}", body.trim_end(), add),
                (body, comment) => format!("{} {} {}", body.trim_end(), add, comment),
            },
        ))
    }

    /// Set `key = value` inside an INI `[section]`, inserting the key after
    /// the section header when it is missing.
    pub fn ini_value(
        target: impl Into<PathBuf>,
        section: &str,
        key: &str,
        value: &str,
    ) -> Result<Self, PatchError> {
        let line_match = Regex::new(&format!(r"^\s*{}\s*=", regex::escape(key)))?;
        let anchor = Regex::new(&format!(r"^\s*\[{}\]\s*$", regex::escape(section)))?;
        let wanted = value.to_string();
        let rendered_key = key.to_string();
        let rendered_value = value.to_string();

        Ok(Self::new(
            target,
            line_match,
            move |line| {
                line.split_once('=')
                    .map(|(_, v)| v.trim() == wanted)
                    .unwrap_or(false)
            },
            move |line| {
                let indent: String = line.chars().take_while(|c| c.is_whitespace()).collect();
                format!("{}{} = {}", indent, rendered_key, rendered_value)
            },
        )
        .on_missing_line(MissingLine::InsertAfter {
            anchor,
            line: format!("   {} = {}", key, value),
        }))
    }

    pub fn on_missing_line(mut self, policy: MissingLine) -> Self {
        self.missing_line = policy;
        self
    }

    pub fn on_missing_file(mut self, policy: MissingFile) -> Self {
        self.missing_file = policy;
        self
    }

    pub fn target(&self) -> &Path {
        &self.target
    }
}

/// What [`apply`] did to the file contents.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Change {
    /// The matched line (1-based) was rewritten.
    Transformed { line: usize },
    /// A fallback line was appended at the end.
    Appended,
    /// A fallback line was inserted at this 1-based position.
    Inserted { line: usize },
    /// The matched line already satisfied the rule.
    AlreadyApplied,
    /// Nothing matched and the fallback made no change.
    NoMatch,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PatchOutcome {
    pub change: Change,
    /// Backup taken before the edit. `None` in dry-run mode.
    pub backup: Option<PathBuf>,
    /// The target was missing and was created from its default content.
    pub created: bool,
}

impl PatchOutcome {
    /// True when the file content differs (or would differ) afterwards.
    pub fn changed(&self) -> bool {
        self.created
            || matches!(
                self.change,
                Change::Transformed { .. } | Change::Appended | Change::Inserted { .. }
            )
    }
}

/// True if `token` appears in `text` as a whole whitespace-separated word.
///
/// `has_token("hosts: files winsxs", "wins")` is false.
pub fn has_token(text: &str, token: &str) -> bool {
    text.split_whitespace().any(|word| word == token)
}

/// Split `line` at its first `#` into the setting and the comment.
fn split_comment(line: &str) -> (&str, &str) {
    match line.find('#') {
        Some(at) => line.split_at(at),
        None => (line, ""),
    }
}

/// Read `path`, or materialise its default according to `policy`.
///
/// Returns the content and whether it was created.
pub(crate) fn read_or_create(path: &Path, policy: &MissingFile, mode: PatchMode) -> Result<(String, bool), PatchError> {
    match fs::read_to_string(path) {
        Ok(content) => Ok((content, false)),
        Err(e) if e.kind() == ErrorKind::NotFound => match policy {
            MissingFile::Fail => Err(PatchError::MissingTarget(path.to_path_buf())),
            MissingFile::Create(default) => {
                if mode == PatchMode::Write {
                    if let Some(parent) = path.parent() {
                        fs::create_dir_all(parent).map_err(|e| PatchError::io("creating", parent, e))?;
                    }
                    fs::write(path, default).map_err(|e| PatchError::io("creating", path, e))?;
                }
                info!(file = %path.display(), "created default file");
                Ok((default.clone(), true))
            }
        },
        Err(e) => Err(PatchError::io("reading", path, e)),
    }
}

/// Apply `rule` to its target file.
pub fn apply(rule: &PatchRule, mode: PatchMode) -> Result<PatchOutcome, PatchError> {
    let path = rule.target();
    let (content, created) = read_or_create(path, &rule.missing_file, mode)?;

    let backup = match mode {
        PatchMode::Write => Some(backup_file(path)?),
        PatchMode::DryRun => None,
    };

    let lines = split_lines(&content);
    let found = lines
        .iter()
        .position(|line| rule.line_match.is_match(split_terminator(line).0));

    let (updated, change) = match found {
        Some(index) => {
            let (body, terminator) = split_terminator(lines[index]);
            if (rule.applied)(body) {
                info!(file = %path.display(), line = index + 1, "already applied");
                return Ok(PatchOutcome {
                    change: Change::AlreadyApplied,
                    backup,
                    created,
                });
            }
            let replacement = format!("{}{}", (rule.transform)(body), terminator);
            let updated = replace_line(&lines, index, &replacement);
            (updated, Change::Transformed { line: index + 1 })
        }
        None => match &rule.missing_line {
            MissingLine::Warn => {
                warn!(
                    file = %path.display(),
                    pattern = rule.line_match.as_str(),
                    "no matching line, leaving file unchanged"
                );
                return Ok(PatchOutcome {
                    change: Change::NoMatch,
                    backup,
                    created,
                });
            }
            MissingLine::Append(line) => {
                let mut updated = content.clone();
                if !updated.is_empty() && !updated.ends_with('\n') {
                    updated.push('\n');
                }
                updated.push_str(line);
                updated.push('\n');
                (updated, Change::Appended)
            }
            MissingLine::InsertAfter { anchor, line } => {
                let Some(at) = lines
                    .iter()
                    .position(|l| anchor.is_match(split_terminator(l).0))
                else {
                    warn!(
                        file = %path.display(),
                        anchor = anchor.as_str(),
                        "neither line nor anchor found, leaving file unchanged"
                    );
                    return Ok(PatchOutcome {
                        change: Change::NoMatch,
                        backup,
                        created,
                    });
                };
                let (anchor_body, terminator) = split_terminator(lines[at]);
                // An unterminated anchor on the last line needs its newline first.
                let terminator = if terminator.is_empty() { "\n" } else { terminator };
                let merged = format!("{}{}{}{}", anchor_body, terminator, line, terminator);
                let mut updated: String = lines[..at].concat();
                updated.push_str(&merged);
                updated.push_str(&lines[at + 1..].concat());
                (updated, Change::Inserted { line: at + 2 })
            }
        },
    };

    if mode == PatchMode::Write {
        fs::write(path, &updated).map_err(|e| PatchError::io("writing", path, e))?;
    }
    info!(file = %path.display(), change = ?change, "patched");

    Ok(PatchOutcome {
        change,
        backup,
        created,
    })
}

fn replace_line(lines: &[&str], index: usize, replacement: &str) -> String {
    let mut out = String::with_capacity(lines.iter().map(|l| l.len()).sum::<usize>() + replacement.len());
    for (i, line) in lines.iter().enumerate() {
        if i == index {
            out.push_str(replacement);
        } else {
            out.push_str(line);
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    const DEFAULT_HOSTS: &str = "hosts: files mdns4_minimal [NOTFOUND=return] dns wins";

    fn nsswitch_rule(path: &Path) -> PatchRule {
        PatchRule::append_token(path, "hosts:", "wins")
            .unwrap()
            .on_missing_line(MissingLine::Append(DEFAULT_HOSTS.to_string()))
    }

    #[test]
    fn test_has_token_whole_words_only() {
        assert!(has_token("hosts: files dns wins", "wins"));
        assert!(!has_token("hosts: files winsxs", "wins"));
        assert!(!has_token("hosts: files xwins", "wins"));
        assert!(has_token("hosts:\twins\tdns", "wins"));
    }

    #[test]
    fn test_appends_token_to_hosts_line() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nsswitch.conf");
        fs::write(&path, "passwd: files\nhosts: files dns\nnetworks: files\n").unwrap();

        let outcome = apply(&nsswitch_rule(&path), PatchMode::Write).unwrap();

        assert_eq!(outcome.change, Change::Transformed { line: 2 });
        assert_eq!(
            fs::read_to_string(&path).unwrap(),
            "passwd: files\nhosts: files dns wins\nnetworks: files\n"
        );
    }

    #[test]
    fn test_substring_is_not_treated_as_applied() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nsswitch.conf");
        fs::write(&path, "hosts: files winsxs dns\n").unwrap();

        apply(&nsswitch_rule(&path), PatchMode::Write).unwrap();

        assert_eq!(fs::read_to_string(&path).unwrap(), "hosts: files winsxs dns wins\n");
    }

    #[test]
    fn test_token_goes_before_inline_comment() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nsswitch.conf");
        fs::write(&path, "hosts: files dns # local only\n").unwrap();

        let first = apply(&nsswitch_rule(&path), PatchMode::Write).unwrap();
        let second = apply(&nsswitch_rule(&path), PatchMode::Write).unwrap();

        assert_eq!(first.change, Change::Transformed { line: 1 });
        assert_eq!(second.change, Change::AlreadyApplied);
        assert_eq!(fs::read_to_string(&path).unwrap(), "hosts: files dns wins # local only\n");
    }

    #[test]
    fn test_token_inside_comment_does_not_count() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nsswitch.conf");
        fs::write(&path, "hosts: files dns # wins disabled\n").unwrap();

        let outcome = apply(&nsswitch_rule(&path), PatchMode::Write).unwrap();

        assert_eq!(outcome.change, Change::Transformed { line: 1 });
        assert_eq!(
            fs::read_to_string(&path).unwrap(),
            "hosts: files dns wins # wins disabled\n"
        );
    }

    #[test]
    fn test_second_run_is_noop() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nsswitch.conf");
        fs::write(&path, "hosts: files dns\n").unwrap();

        apply(&nsswitch_rule(&path), PatchMode::Write).unwrap();
        let after_first = fs::read_to_string(&path).unwrap();
        let second = apply(&nsswitch_rule(&path), PatchMode::Write).unwrap();

        assert_eq!(second.change, Change::AlreadyApplied);
        assert!(!second.changed());
        assert_eq!(fs::read_to_string(&path).unwrap(), after_first);
        assert_eq!(after_first.matches("wins").count(), 1);
    }

    #[test]
    fn test_appends_default_hosts_line_when_missing() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nsswitch.conf");
        fs::write(&path, "passwd: files\ngroup: files").unwrap();

        let outcome = apply(&nsswitch_rule(&path), PatchMode::Write).unwrap();

        assert_eq!(outcome.change, Change::Appended);
        assert_eq!(
            fs::read_to_string(&path).unwrap(),
            format!("passwd: files\ngroup: files\n{}\n", DEFAULT_HOSTS)
        );
    }

    #[test]
    fn test_backup_holds_pre_patch_content() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nsswitch.conf");
        fs::write(&path, "hosts: files dns\n").unwrap();

        let outcome = apply(&nsswitch_rule(&path), PatchMode::Write).unwrap();
        let backup = outcome.backup.unwrap();

        assert_eq!(fs::read_to_string(backup).unwrap(), "hosts: files dns\n");
    }

    #[test]
    fn test_crlf_and_other_lines_preserved() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nsswitch.conf");
        fs::write(&path, "# comment  \r\nhosts: files\r\n\ttrailing\t\n").unwrap();

        apply(&nsswitch_rule(&path), PatchMode::Write).unwrap();

        assert_eq!(
            fs::read_to_string(&path).unwrap(),
            "# comment  \r\nhosts: files wins\r\n\ttrailing\t\n"
        );
    }

    #[test]
    fn test_missing_required_file_fails() {
        let dir = TempDir::new().unwrap();
        let err = apply(&nsswitch_rule(&dir.path().join("absent")), PatchMode::Write).unwrap_err();
        assert!(matches!(err, PatchError::MissingTarget(_)));
    }

    #[test]
    fn test_warn_policy_leaves_file_untouched() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nsswitch.conf");
        fs::write(&path, "passwd: files\n").unwrap();

        let rule = PatchRule::append_token(&path, "hosts:", "wins").unwrap();
        let outcome = apply(&rule, PatchMode::Write).unwrap();

        assert_eq!(outcome.change, Change::NoMatch);
        assert_eq!(fs::read_to_string(&path).unwrap(), "passwd: files\n");
    }

    #[test]
    fn test_dry_run_writes_nothing() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nsswitch.conf");
        fs::write(&path, "hosts: files dns\n").unwrap();

        let outcome = apply(&nsswitch_rule(&path), PatchMode::DryRun).unwrap();

        assert!(outcome.changed());
        assert!(outcome.backup.is_none());
        assert_eq!(fs::read_to_string(&path).unwrap(), "hosts: files dns\n");
        assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 1);
    }

    #[test]
    fn test_ini_value_inserted_after_section() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("smb.conf");
        fs::write(&path, "[global]\n   workgroup = WORKGROUP\n[homes]\n   browseable = no\n").unwrap();

        let rule = PatchRule::ini_value(&path, "global", "name resolve order", "lmhosts bcast").unwrap();
        let outcome = apply(&rule, PatchMode::Write).unwrap();

        assert_eq!(outcome.change, Change::Inserted { line: 2 });
        assert_eq!(
            fs::read_to_string(&path).unwrap(),
            "[global]\n   name resolve order = lmhosts bcast\n   workgroup = WORKGROUP\n[homes]\n   browseable = no\n"
        );

        let again = apply(&rule, PatchMode::Write).unwrap();
        assert_eq!(again.change, Change::AlreadyApplied);
    }

    #[test]
    fn test_ini_value_rewrites_existing_key() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("smb.conf");
        fs::write(&path, "[global]\n\tname resolve order = host wins\n").unwrap();

        let rule = PatchRule::ini_value(&path, "global", "name resolve order", "lmhosts bcast").unwrap();
        apply(&rule, PatchMode::Write).unwrap();

        assert_eq!(
            fs::read_to_string(&path).unwrap(),
            "[global]\n\tname resolve order = lmhosts bcast\n"
        );
    }

    #[test]
    fn test_created_file_is_patched() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("etc/nsswitch.conf");

        let rule = nsswitch_rule(&path).on_missing_file(MissingFile::Create("hosts: files\n".into()));
        let outcome = apply(&rule, PatchMode::Write).unwrap();

        assert!(outcome.created);
        assert_eq!(fs::read_to_string(&path).unwrap(), "hosts: files wins\n");
    }
}
