use std::cell::RefCell;
use std::collections::BTreeSet;
use std::fs;
use std::path::Path;

use cdnpack_core::{CdnError, CdnResult, InstalledEntry, RemovalPolicy};
use cdnpack_registry::AssetSource;
use tempfile::TempDir;

use super::*;

struct RecordingSource {
    fail_on: Option<&'static str>,
    fetched: RefCell<Vec<String>>,
}

impl RecordingSource {
    fn new() -> Self {
        Self {
            fail_on: None,
            fetched: RefCell::new(Vec::new()),
        }
    }

    fn failing_on(path: &'static str) -> Self {
        Self {
            fail_on: Some(path),
            fetched: RefCell::new(Vec::new()),
        }
    }
}

impl AssetSource for RecordingSource {
    fn fetch(&self, name: &str, version: &str, path: &str) -> CdnResult<Vec<u8>> {
        if self.fail_on == Some(path) {
            return Err(CdnError::InstallFailed {
                name: name.to_string(),
                version: version.to_string(),
                reason: format!("download failed for {path}: HTTP 500"),
            });
        }
        self.fetched.borrow_mut().push(path.to_string());
        Ok(format!("{name}/{version}/{path}").into_bytes())
    }
}

fn test_layout() -> (TempDir, AssetLayout) {
    let dir = TempDir::new().expect("must create temp dir");
    let layout = AssetLayout::new(dir.path().join("js"), dir.path().join("css"));
    (dir, layout)
}

fn seed_package(root: &Path, folder: &str, files: &[&str]) {
    let dir = root.join(folder);
    fs::create_dir_all(&dir).expect("must create package dir");
    for file in files {
        fs::write(dir.join(file), b"seed").expect("must write file");
    }
}

fn no_progress() -> impl FnMut(SyncProgress<'_>) {
    |_| {}
}

#[test]
fn asset_kind_routes_only_css_to_css_root() {
    assert_eq!(AssetKind::for_path("dist/app.css"), AssetKind::Css);
    assert_eq!(AssetKind::for_path("dist/app.min.js"), AssetKind::Js);
    assert_eq!(AssetKind::for_path("dist/app.js.map"), AssetKind::Js);
    assert_eq!(AssetKind::for_path("fonts/icons.woff2"), AssetKind::Js);
    assert_eq!(AssetKind::for_path("LICENSE"), AssetKind::Js);
}

#[test]
fn package_dir_uses_slugged_folder_name() {
    let layout = AssetLayout::new("/srv/js", "/srv/css");
    assert_eq!(
        layout.package_dir(AssetKind::Css, "Font Awesome", "6.5.1"),
        Path::new("/srv/css/font-awesome@6.5.1")
    );
    assert_eq!(
        AssetLayout::folder_name("Font Awesome", "6.5.1"),
        AssetLayout::folder_name("font-awesome", "6.5.1")
    );
}

#[test]
fn shared_root_is_scanned_once() {
    let layout = AssetLayout::new("/srv/assets", "/srv/assets");
    assert_eq!(layout.roots(), vec![Path::new("/srv/assets")]);
}

#[test]
fn parse_folder_name_splits_at_versioned_at_sign() {
    assert_eq!(
        parse_folder_name("jquery@3.6.0"),
        Some(InstalledEntry::new("jquery", "3.6.0"))
    );
    assert_eq!(
        parse_folder_name("foo@1.2.3-beta"),
        Some(InstalledEntry::new("foo", "1.2.3"))
    );
    assert_eq!(
        parse_folder_name("a@b@1.0"),
        Some(InstalledEntry::new("a@b", "1.0"))
    );
    assert_eq!(
        parse_folder_name("@scope@.5"),
        Some(InstalledEntry::new("@scope", ".5"))
    );
    assert_eq!(parse_folder_name("no-version"), None);
    assert_eq!(parse_folder_name("pkg@latest"), None);
    assert_eq!(parse_folder_name("@1.0.0"), None);
}

#[test]
fn list_installed_merges_roots_and_ignores_non_packages() {
    let (_dir, layout) = test_layout();
    seed_package(layout.js_root(), "bootstrap@5.3.2", &["bootstrap.min.js"]);
    seed_package(layout.css_root(), "bootstrap@5.3.2", &["bootstrap.min.css"]);
    seed_package(layout.css_root(), "animate.css@4.1.1", &["animate.min.css"]);
    seed_package(layout.js_root(), "scratch", &[]);
    fs::write(layout.js_root().join("loose@1.0.0"), b"file").expect("must write file");

    let installed = list_installed(&layout).expect("must list");
    assert_eq!(
        installed,
        BTreeSet::from([
            InstalledEntry::new("animate.css", "4.1.1"),
            InstalledEntry::new("bootstrap", "5.3.2"),
        ])
    );
}

#[test]
fn list_installed_treats_missing_roots_as_empty() {
    let (_dir, layout) = test_layout();
    assert!(list_installed(&layout).expect("must list").is_empty());
}

#[test]
fn is_installed_checks_either_root() {
    let (_dir, layout) = test_layout();
    seed_package(layout.css_root(), "font-awesome@6.5.1", &[]);

    assert!(is_installed(&layout, "Font Awesome", "6.5.1"));
    assert!(!is_installed(&layout, "Font Awesome", "6.5.0"));
    assert!(!is_installed(&layout, "jquery", "3.6.0"));
}

#[test]
fn prefix_removal_also_removes_packages_sharing_the_prefix() {
    let (_dir, layout) = test_layout();
    seed_package(layout.js_root(), "foo@1.0.0", &["foo.js"]);
    seed_package(layout.js_root(), "foo@2.0.0", &["foo.js"]);
    seed_package(layout.css_root(), "foo@2.0.0", &["foo.css"]);
    seed_package(layout.js_root(), "foobar@1.0.0", &["foobar.js"]);
    seed_package(layout.js_root(), "bar@1.0.0", &["bar.js"]);

    let removed = remove_all(&layout, "Foo", RemovalPolicy::Prefix).expect("must remove");
    assert_eq!(removed, 4);
    assert_eq!(
        list_installed(&layout).expect("must list"),
        BTreeSet::from([InstalledEntry::new("bar", "1.0.0")])
    );
}

#[test]
fn exact_removal_keeps_packages_sharing_the_prefix() {
    let (_dir, layout) = test_layout();
    seed_package(layout.js_root(), "foo@1.0.0", &["foo.js"]);
    seed_package(layout.css_root(), "foo@1.0.0", &["foo.css"]);
    seed_package(layout.js_root(), "foobar@1.0.0", &["foobar.js"]);

    let removed = remove_all(&layout, "foo", RemovalPolicy::Exact).expect("must remove");
    assert_eq!(removed, 2);
    assert_eq!(
        list_installed(&layout).expect("must list"),
        BTreeSet::from([InstalledEntry::new("foobar", "1.0.0")])
    );
}

#[test]
fn removal_without_matches_is_not_an_error() {
    let (_dir, layout) = test_layout();
    assert_eq!(
        remove_all(&layout, "ghost", RemovalPolicy::Prefix).expect("must succeed"),
        0
    );
}

#[test]
fn storage_failures_keep_asset_paths_out_of_the_message() {
    let (dir, _layout) = test_layout();
    let missing = dir.path().join("private-root");

    let err = crate::fs_utils::logged(
        fs::read_dir(&missing),
        &missing,
        crate::fs_utils::READ_ROOT_FAILED,
    )
    .expect_err("missing directory must fail");
    let message = CdnError::from(err).to_string();

    assert!(message.starts_with("local package state unavailable: failed reading installed packages"));
    assert!(!message.contains(&dir.path().display().to_string()));
    assert!(!message.contains("private-root"));
}

#[test]
fn removal_rejects_empty_name() {
    let (_dir, layout) = test_layout();
    seed_package(layout.js_root(), "jquery@3.6.0", &[]);
    remove_all(&layout, "", RemovalPolicy::Prefix).expect_err("must refuse to match everything");
    assert!(is_installed(&layout, "jquery", "3.6.0"));
}

#[test]
fn sync_splits_files_between_roots_flat() {
    let (_dir, layout) = test_layout();
    let source = RecordingSource::new();
    let files = vec![
        "css/bootstrap.min.css".to_string(),
        "js/bootstrap.bundle.min.js".to_string(),
        "js/bootstrap.bundle.min.js.map".to_string(),
    ];
    let mut reported = Vec::new();

    let written = sync_package_files(
        &layout,
        &source,
        "Bootstrap",
        "5.3.2",
        &files,
        &mut |progress| reported.push((progress.done, progress.total, progress.path.to_string())),
    )
    .expect("sync must succeed");

    assert_eq!(written.len(), 3);
    let css = layout.css_root().join("bootstrap@5.3.2/bootstrap.min.css");
    let js = layout.js_root().join("bootstrap@5.3.2/bootstrap.bundle.min.js");
    let map = layout.js_root().join("bootstrap@5.3.2/bootstrap.bundle.min.js.map");
    assert_eq!(
        fs::read_to_string(&css).expect("css must exist"),
        "Bootstrap/5.3.2/css/bootstrap.min.css"
    );
    assert!(js.is_file());
    assert!(map.is_file());
    assert_eq!(
        reported,
        vec![
            (1, 3, "css/bootstrap.min.css".to_string()),
            (2, 3, "js/bootstrap.bundle.min.js".to_string()),
            (3, 3, "js/bootstrap.bundle.min.js.map".to_string()),
        ]
    );
}

#[test]
fn sync_overwrites_existing_files() {
    let (_dir, layout) = test_layout();
    seed_package(layout.js_root(), "vue@3.4.0", &["vue.global.js"]);
    let source = RecordingSource::new();

    sync_package_files(
        &layout,
        &source,
        "vue",
        "3.4.0",
        &["dist/vue.global.js".to_string()],
        &mut no_progress(),
    )
    .expect("sync must succeed");

    assert_eq!(
        fs::read_to_string(layout.js_root().join("vue@3.4.0/vue.global.js")).expect("must read"),
        "vue/3.4.0/dist/vue.global.js"
    );
}

#[test]
fn sync_failure_leaves_earlier_files_in_place() {
    let (_dir, layout) = test_layout();
    let source = RecordingSource::failing_on("b.js");
    let files = vec!["a.js".to_string(), "b.js".to_string(), "c.js".to_string()];

    let err = sync_package_files(&layout, &source, "abc", "1.0.0", &files, &mut no_progress())
        .expect_err("sync must fail");

    assert_eq!(err.kind(), "install_failed");
    assert!(err.to_string().contains("b.js"));
    assert!(layout.js_root().join("abc@1.0.0/a.js").is_file());
    assert!(!layout.js_root().join("abc@1.0.0/c.js").exists());
    assert_eq!(*source.fetched.borrow(), vec!["a.js".to_string()]);
}

#[test]
fn sync_of_empty_version_still_marks_it_installed() {
    let (_dir, layout) = test_layout();
    let source = RecordingSource::new();

    let written = sync_package_files(&layout, &source, "empty", "0.1.0", &[], &mut no_progress())
        .expect("sync must succeed");

    assert!(written.is_empty());
    assert!(is_installed(&layout, "empty", "0.1.0"));
}

#[test]
fn sync_rejects_paths_without_file_name() {
    let (_dir, layout) = test_layout();
    let source = RecordingSource::new();
    let err = sync_package_files(
        &layout,
        &source,
        "odd",
        "1.0.0",
        &["..".to_string()],
        &mut no_progress(),
    )
    .expect_err("must reject");
    assert!(err.to_string().contains("invalid asset path"));
}

#[test]
fn selector_parse_covers_three_variants() {
    assert_eq!(Selector::parse("*"), Selector::All);
    assert_eq!(Selector::parse("true"), Selector::All);
    assert_eq!(Selector::parse(""), Selector::All);
    assert_eq!(Selector::parse("  "), Selector::All);
    assert_eq!(Selector::parse("false"), Selector::None);
    assert_eq!(Selector::parse("none"), Selector::None);
    assert_eq!(
        Selector::parse("jquery, vue,,jquery"),
        Selector::Explicit(vec!["jquery".to_string(), "vue".to_string()])
    );
}

fn seeded_selection_layout() -> (TempDir, AssetLayout) {
    let (dir, layout) = test_layout();
    seed_package(layout.js_root(), "jquery@3.6.0", &["jquery.min.js", "jquery.min.map"]);
    seed_package(layout.js_root(), "jquery@3.5.1", &["jquery.js"]);
    seed_package(
        layout.js_root(),
        "bootstrap@5.3.2",
        &["bootstrap.min.js", "popper.min.js"],
    );
    seed_package(layout.css_root(), "bootstrap@5.3.2", &["bootstrap.min.css"]);
    (dir, layout)
}

fn paths(files: &[SelectedFile]) -> Vec<String> {
    files
        .iter()
        .map(|file| format!("{}:{}", file.kind, file.path))
        .collect()
}

#[test]
fn select_all_lists_every_js_and_css_file() {
    let (_dir, layout) = seeded_selection_layout();
    let files = select_files(&layout, &FileQuery::default()).expect("must select");
    assert_eq!(
        paths(&files),
        vec![
            "js:bootstrap@5.3.2/bootstrap.min.js",
            "js:bootstrap@5.3.2/popper.min.js",
            "css:bootstrap@5.3.2/bootstrap.min.css",
            "js:jquery@3.5.1/jquery.js",
            "js:jquery@3.6.0/jquery.min.js",
        ]
    );
}

#[test]
fn select_with_empty_filters_behaves_like_defaults() {
    let (_dir, layout) = seeded_selection_layout();
    let query = FileQuery {
        packages: Selector::parse(""),
        types: Selector::parse(""),
        skip_packages: Selector::parse(""),
        skip_files: Selector::parse(""),
    };

    let files = select_files(&layout, &query).expect("must select");
    let everything = select_files(&layout, &FileQuery::default()).expect("must select");
    assert_eq!(files.len(), 5);
    assert_eq!(files, everything);
}

#[test]
fn select_explicit_packages_keep_request_order_and_versions() {
    let (_dir, layout) = seeded_selection_layout();
    let query = FileQuery {
        packages: Selector::explicit(["jquery@3.6.0", "Bootstrap"]),
        types: Selector::explicit(["js"]),
        ..FileQuery::default()
    };
    let files = select_files(&layout, &query).expect("must select");
    assert_eq!(
        paths(&files),
        vec![
            "js:jquery@3.6.0/jquery.min.js",
            "js:bootstrap@5.3.2/bootstrap.min.js",
            "js:bootstrap@5.3.2/popper.min.js",
        ]
    );
}

#[test]
fn select_applies_skip_lists() {
    let (_dir, layout) = seeded_selection_layout();
    let query = FileQuery {
        skip_packages: Selector::explicit(["jquery"]),
        skip_files: Selector::explicit(["popper.min.js"]),
        ..FileQuery::default()
    };
    let files = select_files(&layout, &query).expect("must select");
    assert_eq!(
        paths(&files),
        vec![
            "js:bootstrap@5.3.2/bootstrap.min.js",
            "css:bootstrap@5.3.2/bootstrap.min.css",
        ]
    );
}

#[test]
fn select_custom_extension_reads_js_root() {
    let (_dir, layout) = seeded_selection_layout();
    let query = FileQuery {
        types: Selector::explicit([".map"]),
        ..FileQuery::default()
    };
    let files = select_files(&layout, &query).expect("must select");
    assert_eq!(paths(&files), vec!["js:jquery@3.6.0/jquery.min.map"]);
}

#[test]
fn select_with_any_none_axis_is_empty() {
    let (_dir, layout) = seeded_selection_layout();
    for query in [
        FileQuery {
            packages: Selector::None,
            ..FileQuery::default()
        },
        FileQuery {
            types: Selector::None,
            ..FileQuery::default()
        },
        FileQuery {
            skip_packages: Selector::None,
            ..FileQuery::default()
        },
        FileQuery {
            skip_files: Selector::None,
            ..FileQuery::default()
        },
    ] {
        assert!(select_files(&layout, &query).expect("must select").is_empty());
    }
}

#[test]
fn select_unknown_package_is_empty() {
    let (_dir, layout) = seeded_selection_layout();
    let query = FileQuery {
        packages: Selector::explicit(["react"]),
        ..FileQuery::default()
    };
    assert!(select_files(&layout, &query).expect("must select").is_empty());
}
