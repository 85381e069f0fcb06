//! Git working-copy handle.
//!
//! A [`Repository`] owns exactly one on-disk working copy inside the run's
//! temporary workspace and drives the `git` client through
//! checkout/merge/reset cycles. No two handles ever share a directory, so
//! handles on different directories may be used concurrently without
//! coordination.
//!
//! The handle guarantees deterministic tree state: callers run
//! [`Repository::sanitize`] (hard reset plus untracked/ignored-file removal)
//! before trusting the tree.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use chrono::{DateTime, Duration, NaiveDate, NaiveTime, Utc};
use regex::Regex;
use tracing::debug;

use crate::errors::DriftError;
use crate::relation::Distance;
use crate::run_log::RunLog;
use crate::shell::Shell;

/// Identity used for setup commits inside disposable working copies.
const COMMIT_USER_NAME: &str = "gitdrift";
const COMMIT_USER_EMAIL: &str = "analysis@gitdrift.invalid";

/// Handle for one isolated git working copy.
#[derive(Debug)]
pub struct Repository {
    location: PathBuf,
    worker: Option<usize>,
    log: Arc<RunLog>,
    all_branches: Vec<String>,
    branches_of_interest: Vec<String>,
    current_branch: Option<String>,
}

impl Repository {
    /// Create a handle by copying a full source repository into `dest`.
    ///
    /// Both paths must be absolute; `dest` must exist and be empty (freshly
    /// allocated by the workspace). The copy also receives a local committer
    /// identity so later setup commits succeed in bare environments.
    ///
    /// # Errors
    ///
    /// [`DriftError::CloneFailed`] when the copy command exits non-zero.
    pub fn clone_from_path(
        source: &Path,
        dest: &Path,
        worker: Option<usize>,
        log: Arc<RunLog>,
    ) -> Result<Self, DriftError> {
        log.append(format!(
            "cloning repository from {} into {}",
            source.display(),
            dest.display()
        ));
        let result = Shell::copy_recursive(source, dest, worker)?;
        if !result.is_successful() {
            return Err(DriftError::CloneFailed {
                source_path: source.to_path_buf(),
                dest: dest.to_path_buf(),
                reason: result.stderr.trim().to_string(),
            });
        }

        let repository = Self {
            location: dest.to_path_buf(),
            worker,
            log,
            all_branches: Vec::new(),
            branches_of_interest: Vec::new(),
            current_branch: None,
        };
        // Best effort; an existing global identity also works.
        let _ = repository.git(&["config", "user.name", COMMIT_USER_NAME])?;
        let _ = repository.git(&["config", "user.email", COMMIT_USER_EMAIL])?;
        Ok(repository)
    }

    /// The working-copy directory this handle owns.
    pub fn location(&self) -> &Path {
        &self.location
    }

    /// The branch currently checked out, when known.
    pub fn current_branch(&self) -> Option<&str> {
        self.current_branch.as_deref()
    }

    /// All known branches, sorted. Populated by [`Self::find_all_branches`].
    pub fn all_branches(&self) -> &[String] {
        &self.all_branches
    }

    /// The frozen of-interest subset, sorted.
    pub fn branches_of_interest(&self) -> &[String] {
        &self.branches_of_interest
    }

    /// Discover every local and remote branch.
    ///
    /// Remote-prefix decoration and the current-branch marker are stripped,
    /// `HEAD ->` pointer lines dropped, duplicates collapsed, and the result
    /// sorted and cached on the handle.
    pub fn find_all_branches(&mut self) -> Result<Vec<String>, DriftError> {
        let result = self.git(&["branch", "--all"])?;
        if !result.is_successful() {
            return Err(self.repo_error(format!(
                "could not list branches: {}",
                result.stderr.trim()
            )));
        }
        let branches = clean_branch_listing(&result.stdout);
        for branch in &branches {
            self.log_line(format!("discovered branch: {branch}"));
        }
        self.all_branches = branches.clone();
        Ok(branches)
    }

    /// Ask git which branch the working copy currently has checked out.
    pub fn initialize_current_branch(&mut self) -> Result<(), DriftError> {
        let result = self.git(&["branch", "--show-current"])?;
        if !result.is_successful() {
            return Err(self.repo_error("could not determine current branch".to_string()));
        }
        self.current_branch = Some(result.stdout.trim().to_string());
        Ok(())
    }

    /// Last-modification date per branch, from one batch query.
    ///
    /// Runs `git branch -a --format="%(committerdate:short)~%(refname:short)"`
    /// piped through `grep -v HEAD` and parses `YYYY-MM-DD~ref` lines. Dates
    /// are normalized to 12:00 UTC so repeated same-day runs select the same
    /// branches.
    pub fn find_modification_dates(
        &self,
    ) -> Result<BTreeMap<String, DateTime<Utc>>, DriftError> {
        let script =
            r#"git branch -a --format="%(committerdate:short)~%(refname:short)" | grep -v HEAD"#;
        let result = Shell::run_script(script, &self.location, self.worker)?;
        if !result.is_successful() {
            return Err(self.repo_error(format!(
                "could not query branch modification dates: {}",
                result.stderr.trim()
            )));
        }
        let dates = parse_modification_dates(&result.stdout);
        for (branch, date) in &dates {
            self.log_line(format!("branch {branch} last modified {date}"));
        }
        Ok(dates)
    }

    /// Compute and cache the of-interest subset of [`Self::all_branches`].
    ///
    /// A branch is excluded when any ignore pattern matches anywhere in its
    /// name (regex search, not full match), when its last modification
    /// predates `now - timeout_days` (only for `timeout_days > 0`), or when
    /// it is missing from the modification-date map (logged as a parsing
    /// anomaly).
    pub fn find_branches_of_interest(
        &mut self,
        timeout_days: u32,
        ignore_patterns: &[String],
    ) -> Result<Vec<String>, DriftError> {
        let patterns = compile_patterns(ignore_patterns)?;
        let modification_dates = self.find_modification_dates()?;
        let cutoff = today_noon_utc() - Duration::days(i64::from(timeout_days));

        let mut of_interest = Vec::new();
        for branch in &self.all_branches {
            if patterns.iter().any(|p| p.is_match(branch)) {
                self.log_line(format!("branch {branch} ignored by pattern"));
                continue;
            }
            match modification_dates.get(branch) {
                Some(date) => {
                    if timeout_days > 0 && *date < cutoff {
                        self.log_line(format!("branch {branch} ignored: inactive since {date}"));
                        continue;
                    }
                }
                None => {
                    self.log_line(format!(
                        "parsing anomaly: branch {branch} missing from modification dates"
                    ));
                    continue;
                }
            }
            of_interest.push(branch.clone());
        }
        of_interest.sort();
        self.branches_of_interest = of_interest.clone();
        Ok(of_interest)
    }

    /// Replace the of-interest subset verbatim.
    ///
    /// Used when seeding worker clones from the reference handle so every
    /// worker agrees on the same pair universe.
    pub fn override_branches_of_interest(&mut self, branches: &[String]) {
        self.branches_of_interest = branches.to_vec();
        self.branches_of_interest.sort();
    }

    /// Switch the working copy to `branch`.
    ///
    /// Does not guarantee a clean tree; callers follow up with
    /// [`Self::sanitize`] before relying on the state.
    pub fn checkout(&mut self, branch: &str) -> Result<(), DriftError> {
        self.log_line(format!(
            "checkout from {:?} into {branch}",
            self.current_branch
        ));
        let result = self.git(&["checkout", branch])?;
        if !result.is_successful() {
            return Err(self.repo_error(format!(
                "could not checkout {branch}: {}",
                result.stderr.trim()
            )));
        }
        self.current_branch = Some(branch.to_string());
        Ok(())
    }

    /// Hard-reset the tree and remove untracked and ignored files, in that
    /// order. Idempotent.
    pub fn sanitize(&mut self) -> Result<(), DriftError> {
        self.log_line(format!("sanitizing at {:?}", self.current_branch));
        let reset = self.git(&["reset", "--hard"])?;
        if !reset.is_successful() {
            return Err(self.repo_error(format!(
                "could not reset working copy: {}",
                reset.stderr.trim()
            )));
        }
        let clean = self.git(&["clean", "-fdx"])?;
        if !clean.is_successful() {
            return Err(self.repo_error(format!(
                "could not clean working copy: {}",
                clean.stderr.trim()
            )));
        }
        Ok(())
    }

    /// Delete every file whose path (relative to the repository root)
    /// matches none of the patterns. Symbolic links are always deleted.
    /// An empty pattern list applies no filtering at all.
    pub fn apply_whitelist(&self, patterns: &[String]) -> Result<(), DriftError> {
        if patterns.is_empty() {
            return Ok(());
        }
        self.log_line(format!("applying whitelist at {:?}", self.current_branch));
        let patterns = compile_patterns(patterns)?;
        self.apply_path_filter(&self.location, &patterns, true)
    }

    /// Delete every file whose path matches at least one pattern. Applied
    /// after the whitelist.
    pub fn apply_blacklist(&self, patterns: &[String]) -> Result<(), DriftError> {
        if patterns.is_empty() {
            return Ok(());
        }
        self.log_line(format!("applying blacklist at {:?}", self.current_branch));
        let patterns = compile_patterns(patterns)?;
        self.apply_path_filter(&self.location, &patterns, false)
    }

    fn apply_path_filter(
        &self,
        dir: &Path,
        patterns: &[Regex],
        keep_matches: bool,
    ) -> Result<(), DriftError> {
        for entry in fs::read_dir(dir)? {
            let entry = entry?;
            let path = entry.path();

            // Skip everything git-related: the metadata directory and files
            // like .gitignore / .gitkeep anywhere in the tree.
            if path.to_string_lossy().contains(".git") {
                continue;
            }

            let file_type = entry.file_type()?;
            if file_type.is_symlink() {
                self.log_line(format!("deleting symbolic link {}", path.display()));
                self.delete_tree_entry(&path);
                continue;
            }
            if file_type.is_dir() {
                self.apply_path_filter(&path, patterns, keep_matches)?;
                continue;
            }

            let relative = path
                .strip_prefix(&self.location)
                .unwrap_or(&path)
                .to_string_lossy();
            let matched = patterns.iter().any(|p| p.is_match(&relative));
            let delete = if keep_matches { !matched } else { matched };
            if delete {
                self.log_line(format!("deleting {relative}"));
                self.delete_tree_entry(&path);
            }
        }
        Ok(())
    }

    fn delete_tree_entry(&self, path: &Path) {
        // Symlinks to directories need remove_file too, so try file first.
        if let Err(e) = fs::remove_file(path).or_else(|_| fs::remove_dir_all(path)) {
            self.log_line(format!("could not delete {}: {e}", path.display()));
        }
    }

    /// Stage everything and commit.
    ///
    /// A failing commit is tolerated ("nothing to commit" is the common
    /// benign case); a failing add is not.
    pub fn commit_changes(&self, message: &str) -> Result<(), DriftError> {
        self.log_line(format!(
            "committing changes at {:?}: {message}",
            self.current_branch
        ));
        let add = self.git(&["add", "--all"])?;
        if !add.is_successful() {
            return Err(self.repo_error(format!(
                "could not stage files: {}",
                add.stderr.trim()
            )));
        }
        let commit = self.git(&["commit", "-m", message])?;
        if !commit.is_successful() {
            self.log_line(format!(
                "commit tolerated failure: {}",
                commit.stdout.trim()
            ));
        }
        Ok(())
    }

    /// Simulate merging `incoming_branch` into `base_branch` and count the
    /// resulting conflicts.
    ///
    /// The working copy is sanitized, switched to the base branch, sanitized
    /// again, and then merged. Conflicts are counted from the merge output
    /// (`Merge conflict in <path>` lines) and by scanning each conflicting
    /// file for `<<<<<<<` / `>>>>>>>` marker pairs; unreadable files are
    /// logged and skipped. Afterwards the merge is unwound so the branch
    /// pointer is exactly where it started.
    ///
    /// # Errors
    ///
    /// Returns an error when the merge fails for a reason other than
    /// conflicts (including checkout failures and command timeouts). Callers
    /// surface this as an error-sentinel observation, not a run abort.
    pub fn merge_and_count_conflicts(
        &mut self,
        base_branch: &str,
        incoming_branch: &str,
    ) -> Result<Distance, DriftError> {
        self.log_line(format!("merging {incoming_branch} into {base_branch}"));
        self.sanitize()?;
        self.checkout(base_branch)?;
        self.sanitize()?;

        // Remember where the base branch points so the merge can be unwound
        // even when it fast-forwards or commits cleanly.
        let head = self.git(&["rev-parse", "HEAD"])?;
        let head = head.is_successful().then(|| head.stdout.trim().to_string());

        let merge = self.git(&["merge", incoming_branch])?;
        let conflict_files = conflict_files_from_merge_output(&merge.stdout);

        let distance = if conflict_files.is_empty() {
            if !merge.is_successful() {
                self.unwind_merge(head.as_deref());
                return Err(self.repo_error(format!(
                    "could not merge {incoming_branch} into {base_branch}: {}",
                    merge.stderr.trim()
                )));
            }
            self.log_line("no conflicts found".to_string());
            Distance::default()
        } else {
            let mut distance = Distance {
                file_distance: conflict_files.len() as u32,
                ..Distance::default()
            };
            for file in &conflict_files {
                let path = self.location.join(file);
                let content = match fs::read_to_string(&path) {
                    Ok(content) => content,
                    Err(e) => {
                        self.log_line(format!(
                            "cannot open conflicting file {file}: {e}; proceeding without it"
                        ));
                        continue;
                    }
                };
                let (conflicts, conflict_lines) = scan_conflict_markers(&content);
                self.log_line(format!(
                    "file {file} has {conflicts} conflicts and {conflict_lines} conflicting lines"
                ));
                distance.conflict_distance += conflicts;
                distance.line_distance += conflict_lines;
            }
            self.log_line(format!(
                "total: {} files, {} conflicts, {} conflicting lines",
                distance.file_distance, distance.conflict_distance, distance.line_distance
            ));
            distance
        };

        self.unwind_merge(head.as_deref());
        Ok(distance)
    }

    /// Undo whatever the merge attempt did to the tree and the branch
    /// pointer. Best effort; the next pair sanitizes again anyway.
    fn unwind_merge(&self, pre_merge_head: Option<&str>) {
        if let Ok(abort) = self.git(&["merge", "--abort"]) {
            if abort.is_successful() {
                self.log_line("aborted conflicted merge".to_string());
            }
        }
        if let Some(head) = pre_merge_head {
            if let Ok(reset) = self.git(&["reset", "--hard", head]) {
                if !reset.is_successful() {
                    self.log_line(format!(
                        "could not rewind to pre-merge head {head}: {}",
                        reset.stderr.trim()
                    ));
                }
            }
        }
    }

    /// Recursively remove the working directory.
    pub fn delete_repository(&self) -> Result<(), DriftError> {
        self.log_line(format!("deleting repository at {}", self.location.display()));
        let result = Shell::remove_recursive(&self.location, self.worker)?;
        if !result.is_successful() {
            return Err(self.repo_error(format!(
                "could not delete repository: {}",
                result.stderr.trim()
            )));
        }
        Ok(())
    }

    fn git(&self, args: &[&str]) -> Result<crate::shell::ShellResult, DriftError> {
        let mut argv = Vec::with_capacity(args.len() + 1);
        argv.push("git");
        argv.extend_from_slice(args);
        Shell::run(&argv, Some(&self.location), self.worker)
    }

    fn log_line(&self, message: String) {
        debug!(worker = self.worker, "{message}");
        match self.worker {
            Some(idx) => self.log.append_worker(idx, message),
            None => self.log.append(message),
        }
    }

    fn repo_error(&self, reason: String) -> DriftError {
        DriftError::Repository {
            location: self.location.clone(),
            reason,
        }
    }
}

/// Today at 12:00 UTC. Fixing the time of day makes same-day runs pick the
/// same branch subset regardless of when they execute.
fn today_noon_utc() -> DateTime<Utc> {
    let noon = NaiveTime::from_hms_opt(12, 0, 0).unwrap_or_default();
    Utc::now().date_naive().and_time(noon).and_utc()
}

fn compile_patterns(patterns: &[String]) -> Result<Vec<Regex>, DriftError> {
    patterns
        .iter()
        .map(|pattern| {
            Regex::new(pattern).map_err(|e| DriftError::InvalidPattern {
                pattern: pattern.clone(),
                reason: e.to_string(),
            })
        })
        .collect()
}

/// Normalize `git branch --all` output to a sorted, deduplicated branch set.
pub fn clean_branch_listing(stdout: &str) -> Vec<String> {
    let mut branches: Vec<String> = Vec::new();
    for line in stdout.lines() {
        let cleaned = line
            .replace("remotes/origin/", "")
            .replace('*', "")
            .replace(' ', "");
        if cleaned.is_empty() || cleaned.contains("HEAD->") {
            continue;
        }
        if !branches.contains(&cleaned) {
            branches.push(cleaned);
        }
    }
    branches.sort();
    branches
}

/// Parse `YYYY-MM-DD~ref` lines into a branch → date map.
///
/// Remote `origin/` prefixes are stripped; dates are normalized to 12:00
/// UTC. Unparseable lines are skipped.
pub fn parse_modification_dates(stdout: &str) -> BTreeMap<String, DateTime<Utc>> {
    let mut dates = BTreeMap::new();
    for line in stdout.lines() {
        let Some((date_part, ref_part)) = line.split_once('~') else {
            continue;
        };
        let Ok(date) = NaiveDate::parse_from_str(date_part.trim(), "%Y-%m-%d") else {
            continue;
        };
        let Some(noon) = date.and_hms_opt(12, 0, 0) else {
            continue;
        };
        let branch = ref_part
            .trim()
            .strip_prefix("origin/")
            .unwrap_or(ref_part.trim())
            .to_string();
        dates.insert(branch, noon.and_utc());
    }
    dates
}

/// Extract the conflicting-file paths from merge stdout.
///
/// Git reports one `CONFLICT (...): Merge conflict in <path>` line per
/// conflicting file.
pub fn conflict_files_from_merge_output(stdout: &str) -> Vec<String> {
    stdout
        .lines()
        .filter_map(|line| line.split_once("Merge conflict in "))
        .map(|(_, path)| path.trim().to_string())
        .collect()
}

/// Count conflict-marker pairs and the lines strictly between them.
///
/// A single open/close boolean tracks marker state, so nested or repeated
/// `<<<<<<<` lines inside an open conflict do not start a second block.
pub fn scan_conflict_markers(content: &str) -> (u32, u32) {
    let mut conflicts = 0u32;
    let mut conflict_lines = 0u32;
    let mut inside_conflict = false;
    let mut conflict_start = 0usize;

    for (idx, line) in content.lines().enumerate() {
        let trimmed = line.trim_start();
        if trimmed.starts_with("<<<<<<<") && !inside_conflict {
            conflicts += 1;
            inside_conflict = true;
            conflict_start = idx;
        } else if trimmed.starts_with(">>>>>>>") && inside_conflict {
            inside_conflict = false;
            conflict_lines += (idx - conflict_start - 1) as u32;
        }
    }
    (conflicts, conflict_lines)
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clean_branch_listing_strips_decoration() {
        let stdout = "\
* main
  feature/a
  remotes/origin/HEAD -> origin/main
  remotes/origin/main
  remotes/origin/feature/a
  remotes/origin/feature/b
";
        assert_eq!(
            clean_branch_listing(stdout),
            vec!["feature/a", "feature/b", "main"]
        );
    }

    #[test]
    fn test_clean_branch_listing_ignores_blank_lines() {
        assert!(clean_branch_listing("\n\n   \n").is_empty());
    }

    #[test]
    fn test_parse_modification_dates_normalizes_to_noon_utc() {
        let stdout = "\
2024-11-20~main
2024-11-18~origin/feature/a
garbage line
2024-11-19~origin/main
";
        let dates = parse_modification_dates(stdout);
        // `main` and `origin/main` collapse to one entry.
        assert_eq!(dates.len(), 2);
        let main = dates.get("main").unwrap();
        assert_eq!(main.format("%H:%M:%S").to_string(), "12:00:00");
        assert_eq!(main.format("%Y-%m-%d").to_string(), "2024-11-19");
        assert!(dates.contains_key("feature/a"));
    }

    #[test]
    fn test_conflict_files_from_merge_output() {
        let stdout = "\
Auto-merging a.txt
CONFLICT (content): Merge conflict in a.txt
Auto-merging src/b.rs
CONFLICT (content): Merge conflict in src/b.rs
Automatic merge failed; fix conflicts and then commit the result.
";
        assert_eq!(
            conflict_files_from_merge_output(stdout),
            vec!["a.txt", "src/b.rs"]
        );
    }

    #[test]
    fn test_scan_conflict_markers_counts_lines_between_pair() {
        let content = "\
before
<<<<<<< HEAD
ours
theirs
=======
>>>>>>> feature
after
";
        let (conflicts, lines) = scan_conflict_markers(content);
        assert_eq!(conflicts, 1);
        // `ours`, `theirs`, `=======` sit strictly between the markers.
        assert_eq!(lines, 3);
    }

    #[test]
    fn test_scan_conflict_markers_two_files_sum() {
        // One marker pair with exactly two lines in between.
        let file = "\
<<<<<<< HEAD
one
two
>>>>>>> other
";
        let (conflicts, lines) = scan_conflict_markers(file);
        assert_eq!(conflicts, 1);
        assert_eq!(lines, 2);

        // Two such files sum to conflictDistance=2, fileDistance=2,
        // lineDistance=4; the per-file scan contributes 1 and 2 each.
        let (c2, l2) = scan_conflict_markers(file);
        assert_eq!(conflicts + c2, 2);
        assert_eq!(lines + l2, 4);
    }

    #[test]
    fn test_scan_conflict_markers_tolerates_nested_open_markers() {
        let content = "\
<<<<<<< HEAD
inner
<<<<<<< again
payload
>>>>>>> feature
tail
";
        let (conflicts, lines) = scan_conflict_markers(content);
        assert_eq!(conflicts, 1);
        assert_eq!(lines, 3);
    }

    #[test]
    fn test_scan_conflict_markers_ignores_unmatched_close() {
        let content = ">>>>>>> stray\nplain\n";
        assert_eq!(scan_conflict_markers(content), (0, 0));
    }

    /// Build a repository handle directly over a scratch tree with a few
    /// files and a fake `.git` directory. The filter walk never talks to
    /// git, so no history or git client is needed here.
    fn scratch_repository() -> (tempfile::TempDir, Repository) {
        let dest = tempfile::TempDir::new().unwrap();
        fs::create_dir(dest.path().join(".git")).unwrap();
        fs::write(dest.path().join(".git").join("HEAD"), "ref: x\n").unwrap();
        fs::write(dest.path().join("keep.rs"), "fn main() {}\n").unwrap();
        fs::write(dest.path().join("notes.md"), "notes\n").unwrap();
        fs::create_dir(dest.path().join("src")).unwrap();
        fs::write(dest.path().join("src").join("lib.rs"), "pub fn f() {}\n").unwrap();
        fs::write(dest.path().join("src").join("data.bin"), "bin\n").unwrap();

        let repository = Repository {
            location: dest.path().to_path_buf(),
            worker: None,
            log: Arc::new(RunLog::new(0)),
            all_branches: Vec::new(),
            branches_of_interest: Vec::new(),
            current_branch: None,
        };
        (dest, repository)
    }

    #[test]
    fn test_apply_whitelist_keeps_only_matching_files() {
        let (dest, repository) = scratch_repository();
        repository
            .apply_whitelist(&[".*\\.rs".to_string()])
            .unwrap();

        assert!(dest.path().join("keep.rs").exists());
        assert!(dest.path().join("src/lib.rs").exists());
        assert!(!dest.path().join("notes.md").exists());
        assert!(!dest.path().join("src/data.bin").exists());
        // Git metadata is never touched by the walk.
        assert!(dest.path().join(".git/HEAD").exists());
    }

    #[test]
    fn test_apply_whitelist_empty_patterns_is_a_no_op() {
        let (dest, repository) = scratch_repository();
        repository.apply_whitelist(&[]).unwrap();
        assert!(dest.path().join("notes.md").exists());
        assert!(dest.path().join("src/data.bin").exists());
    }

    #[test]
    fn test_apply_blacklist_deletes_matching_files() {
        let (dest, repository) = scratch_repository();
        repository
            .apply_blacklist(&[".*\\.bin".to_string(), "notes\\.md".to_string()])
            .unwrap();

        assert!(dest.path().join("keep.rs").exists());
        assert!(dest.path().join("src/lib.rs").exists());
        assert!(!dest.path().join("notes.md").exists());
        assert!(!dest.path().join("src/data.bin").exists());
    }

    #[test]
    fn test_filter_walk_deletes_symlinks() {
        let (dest, repository) = scratch_repository();
        let link = dest.path().join("link.rs");
        std::os::unix::fs::symlink(dest.path().join("keep.rs"), &link).unwrap();

        // The link matches the whitelist but is removed regardless.
        repository
            .apply_whitelist(&[".*\\.rs".to_string()])
            .unwrap();
        assert!(!link.exists());
        assert!(dest.path().join("keep.rs").exists());
    }
}
