//! Output path derivation for a single camera.
//!
//! [`resolve`] turns the run's base directory, the scene's current output
//! path setting, a camera name and a file extension into the file path the
//! renderer writes to. Paths starting with [`RELATIVE_PATH_MARKER`] are
//! relative to the project directory and stay relative in the result, so a
//! resolved path can be fed back in as the next override and resolves to
//! itself.

use camino::{Utf8Component, Utf8Path, Utf8PathBuf};

/// Prefix marking a path as relative to the project directory
pub const RELATIVE_PATH_MARKER: &str = "//";

/// Whether `path` is relative to the project directory.
pub fn is_project_relative(path: &str) -> bool {
    path.starts_with(RELATIVE_PATH_MARKER)
}

/// Compute the output file path for `job_name`.
///
/// - An empty `override_path` means the file goes into `base_directory`.
/// - A project-relative override contributes its directory, normalized and
///   re-expressed relative to `project_dir`.
/// - An absolute override contributes everything before its last separator,
///   untouched.
///
/// Trailing `/` and `\` are stripped from the chosen directory, an empty
/// directory becomes `/`, and exactly one separator joins it to
/// `job_name + extension`.
///
/// Pure: no filesystem access and no shared state. An empty `job_name`
/// yields a syntactically valid path; callers validate names.
pub fn resolve(
    base_directory: &str,
    override_path: &str,
    job_name: &str,
    extension: &str,
    project_dir: &Utf8Path,
) -> String {
    let directory = if override_path.is_empty() {
        base_directory.to_string()
    } else if is_project_relative(override_path) {
        project_relative_directory(override_path, project_dir)
    } else {
        parent_directory(override_path).to_string()
    };

    join_file_name(&directory, job_name, extension)
}

/// Turn a possibly project-relative path into a filesystem path.
///
/// Absolute paths are returned unchanged.
pub fn to_absolute(path: &str, project_dir: &Utf8Path) -> Utf8PathBuf {
    match path.strip_prefix(RELATIVE_PATH_MARKER) {
        Some(rest) => normalize_lexically(&join_to_project(project_dir, rest)),
        None => Utf8PathBuf::from(path),
    }
}

fn is_separator(c: char) -> bool {
    c == '/' || c == '\\'
}

/// Everything before the last separator, or "" when there is none.
fn parent_directory(path: &str) -> &str {
    match path.rfind(is_separator) {
        Some(index) => &path[..index],
        None => "",
    }
}

fn join_to_project(project_dir: &Utf8Path, rest: &str) -> String {
    let project = project_dir.as_str().trim_end_matches(is_separator);
    format!("{}/{}", project, rest).replace('\\', "/")
}

fn project_relative_directory(override_path: &str, project_dir: &Utf8Path) -> String {
    let rest = &override_path[RELATIVE_PATH_MARKER.len()..];
    let absolute = join_to_project(project_dir, rest);

    let directory = normalize_lexically(parent_directory(&absolute));
    let project = normalize_lexically(&project_dir.as_str().replace('\\', "/"));

    format!("{}{}", RELATIVE_PATH_MARKER, relative_to(&directory, &project))
}

fn join_file_name(directory: &str, job_name: &str, extension: &str) -> String {
    if let Some(rest) = directory.strip_prefix(RELATIVE_PATH_MARKER) {
        let rest = rest.trim_end_matches(is_separator);
        // A bare marker is the project directory itself
        if rest.is_empty() {
            return format!("{}{}{}", RELATIVE_PATH_MARKER, job_name, extension);
        }
        return format!("{}{}/{}{}", RELATIVE_PATH_MARKER, rest, job_name, extension);
    }

    let trimmed = directory.trim_end_matches(is_separator);
    if trimmed.is_empty() {
        format!("/{}{}", job_name, extension)
    } else {
        format!("{}/{}{}", trimmed, job_name, extension)
    }
}

/// Resolve `.` and `..` segments without touching the filesystem.
///
/// `..` never climbs above the root of an absolute path; leading `..` of a
/// relative path are kept.
fn normalize_lexically(path: &str) -> Utf8PathBuf {
    let mut normalized = Utf8PathBuf::new();
    let mut depth = 0usize;

    for component in Utf8Path::new(path).components() {
        match component {
            Utf8Component::Prefix(_) | Utf8Component::RootDir => {
                normalized.push(component.as_str());
            }
            Utf8Component::CurDir => {}
            Utf8Component::ParentDir => {
                if depth > 0 {
                    normalized.pop();
                    depth -= 1;
                } else if !normalized.has_root() {
                    normalized.push("..");
                }
            }
            Utf8Component::Normal(name) => {
                normalized.push(name);
                depth += 1;
            }
        }
    }

    normalized
}

/// Express `target` relative to `base`. Both must already be normalized.
/// Returns "" when they are the same directory.
fn relative_to(target: &Utf8Path, base: &Utf8Path) -> String {
    let target: Vec<Utf8Component<'_>> = target.components().collect();
    let base: Vec<Utf8Component<'_>> = base.components().collect();

    let common = target
        .iter()
        .zip(base.iter())
        .take_while(|(a, b)| a == b)
        .count();

    let mut parts: Vec<&str> = Vec::with_capacity(base.len() - common + target.len() - common);
    parts.extend(std::iter::repeat_n("..", base.len() - common));
    parts.extend(target[common..].iter().map(|c| c.as_str()));

    parts.join("/")
}
