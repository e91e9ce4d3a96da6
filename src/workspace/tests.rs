use super::*;
use std::fs;
use tempfile::TempDir;

fn touch(root: &Path, relative: &str) {
    let path = root.join(relative);
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).expect("should create parent dirs");
    }
    fs::write(&path, "class X {}").expect("should write file");
}

#[test]
fn absolute_paths_are_untouched() {
    let workspace = Path::new("/workspace");
    let absolute = if cfg!(windows) {
        "C:\\src\\Hello.java"
    } else {
        "/src/Hello.java"
    };
    assert_eq!(
        resolve_workspace_path(absolute, workspace),
        PathBuf::from(absolute)
    );
}

#[test]
fn relative_paths_join_workspace() {
    let workspace = Path::new("/workspace");
    assert_eq!(
        resolve_workspace_path("main/bin", workspace),
        workspace.join("main/bin")
    );
}

#[test]
fn empty_classpath_is_current_dir() {
    assert_eq!(resolve_classpath("", Path::new("/workspace")), ".");
}

#[test]
fn classpath_entries_resolved() {
    let workspace = Path::new("/workspace");
    let sep = CLASSPATH_SEPARATOR;
    let classpath = format!("lib/a.jar{sep}lib/*");

    let resolved = resolve_classpath(&classpath, workspace);
    let entries: Vec<&str> = resolved.split(sep).collect();

    assert_eq!(entries.len(), 2);
    assert_eq!(
        PathBuf::from(entries[0]),
        workspace.join("lib/a.jar")
    );
    assert_eq!(PathBuf::from(entries[1]), workspace.join("lib/*"));
}

#[test]
fn join_skips_empty_entries() {
    let sep = CLASSPATH_SEPARATOR;
    assert_eq!(join_classpath(["a", "", "b"]), format!("a{sep}b"));
    assert_eq!(join_classpath(Vec::<String>::new()), "");
    assert_eq!(join_classpath(["", "only"]), "only");
}

#[test]
fn plain_files_are_not_checked() {
    let temp_dir = TempDir::new().expect("should create temp dir");
    let files = vec!["src/Missing.java".to_string()];

    let resolved = resolve_file_list(&files, temp_dir.path()).expect("should resolve");
    assert_eq!(resolved.len(), 1);
    assert_eq!(
        PathBuf::from(&resolved[0]),
        temp_dir.path().join("src/Missing.java")
    );
}

#[test]
fn single_star_stays_in_directory() {
    let temp_dir = TempDir::new().expect("should create temp dir");
    touch(temp_dir.path(), "src/B.java");
    touch(temp_dir.path(), "src/A.java");
    touch(temp_dir.path(), "src/nested/C.java");
    touch(temp_dir.path(), "src/notes.txt");

    let files = vec!["src/*.java".to_string()];
    let resolved = resolve_file_list(&files, temp_dir.path()).expect("should resolve");

    let names: Vec<String> = resolved
        .iter()
        .map(|p| {
            Path::new(p)
                .file_name()
                .expect("has file name")
                .to_string_lossy()
                .into_owned()
        })
        .collect();
    assert_eq!(names, vec!["A.java", "B.java"]);
}

#[test]
fn double_star_recurses() {
    let temp_dir = TempDir::new().expect("should create temp dir");
    touch(temp_dir.path(), "tests/src/com/example/HelloTest.java");
    touch(temp_dir.path(), "tests/src/com/example/util/MathTest.java");
    touch(temp_dir.path(), "tests/src/com/example/Hello.java");

    let files = vec!["tests/src/**/*Test.java".to_string()];
    let resolved = resolve_file_list(&files, temp_dir.path()).expect("should resolve");

    assert_eq!(resolved.len(), 2);
    assert!(resolved.iter().all(|p| p.ends_with("Test.java")));
}

#[test]
fn unmatched_pattern_yields_nothing() {
    let temp_dir = TempDir::new().expect("should create temp dir");
    let files = vec!["src/**/*.java".to_string()];

    let resolved = resolve_file_list(&files, temp_dir.path()).expect("should resolve");
    assert!(resolved.is_empty());
}
