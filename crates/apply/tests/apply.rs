//! Applier behaviour with a scripted tool and with GNU patch

use async_trait::async_trait;
use portpatch_apply::{local_patch_set, GnuPatch, PatchApplier, PatchTool, SourceTree};
use portpatch_errors::{Error, PatchError};
use portpatch_events::{channel, AppEvent, PatchEvent};
use portpatch_types::{ApplyPass, PatchOutcome, PatchSet, ResolvedPatch};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use tempfile::{tempdir, TempDir};

/// Patch files hold one line per rule:
/// `create NAME` adds a file and must not collide, `require NAME` needs NAME
/// to exist already.
#[derive(Default)]
struct MarkerTool {
    calls: Mutex<Vec<String>>,
    fail_commit: bool,
}

impl MarkerTool {
    fn rules(patch: &Path) -> Vec<(String, String)> {
        std::fs::read_to_string(patch)
            .unwrap()
            .lines()
            .filter_map(|l| l.split_once(' '))
            .map(|(op, name)| (op.to_string(), name.to_string()))
            .collect()
    }

    fn log(&self, entry: String) {
        self.calls.lock().unwrap().push(entry);
    }
}

#[async_trait]
impl PatchTool for MarkerTool {
    async fn ensure_available(&self) -> Result<(), Error> {
        Ok(())
    }

    async fn check(&self, tree: &SourceTree, patch: &Path) -> Result<bool, Error> {
        self.log(format!("check {}", patch.file_name().unwrap().to_string_lossy()));
        Ok(Self::rules(patch).iter().all(|(op, name)| {
            let exists = tree.root().join(name).exists();
            match op.as_str() {
                "create" => !exists,
                "require" => exists,
                _ => false,
            }
        }))
    }

    async fn apply(&self, tree: &mut SourceTree, patch: &Path) -> Result<(), Error> {
        self.log(format!("apply {}", patch.file_name().unwrap().to_string_lossy()));
        if self.fail_commit {
            return Err(PatchError::CommitFailed {
                patch: patch.display().to_string(),
                message: "disk full".into(),
            }
            .into());
        }
        for (op, name) in Self::rules(patch) {
            if op == "create" {
                std::fs::write(tree.root().join(&name), &name).unwrap();
            }
        }
        Ok(())
    }
}

fn write_patch(dir: &Path, source: &str, name: &str, body: &str) -> ResolvedPatch {
    let path = dir.join(format!("{source}-{name}"));
    std::fs::write(&path, body).unwrap();
    ResolvedPatch {
        source: source.to_string(),
        file_name: name.to_string(),
        path,
        url: None,
        digest: None,
    }
}

fn snapshot(root: &Path) -> BTreeMap<PathBuf, Vec<u8>> {
    fn walk(root: &Path, dir: &Path, out: &mut BTreeMap<PathBuf, Vec<u8>>) {
        for entry in std::fs::read_dir(dir).unwrap() {
            let path = entry.unwrap().path();
            if path.is_dir() {
                walk(root, &path, out);
            } else {
                let rel = path.strip_prefix(root).unwrap().to_path_buf();
                out.insert(rel, std::fs::read(&path).unwrap());
            }
        }
    }
    let mut out = BTreeMap::new();
    walk(root, root, &mut out);
    out
}

async fn fresh_tree() -> (TempDir, SourceTree) {
    let temp = tempdir().unwrap();
    std::fs::write(temp.path().join("base"), "base").unwrap();
    let tree = SourceTree::open(temp.path()).await.unwrap();
    (temp, tree)
}

#[tokio::test]
async fn test_applies_in_order_and_skips_non_applying() {
    let patches_dir = tempdir().unwrap();
    let set = PatchSet::from(vec![
        write_patch(patches_dir.path(), "A", "a.patch", "create one\n"),
        write_patch(patches_dir.path(), "A", "b.patch", "require missing\n"),
        write_patch(patches_dir.path(), "B", "c.patch", "require one\ncreate two\n"),
    ]);

    let (_temp, mut tree) = fresh_tree().await;
    let tool = Arc::new(MarkerTool::default());
    let (tx, mut rx) = channel();
    let applier = PatchApplier::new(tool.clone(), tx);

    let report = applier
        .apply(&mut tree, &set, ApplyPass::Remote)
        .await
        .unwrap();

    assert_eq!(report.applied, 2);
    assert_eq!(report.skipped, 1);
    assert_eq!(
        report.outcomes(),
        vec![
            PatchOutcome::Applied,
            PatchOutcome::SkippedDoesNotApply,
            PatchOutcome::Applied
        ]
    );
    assert_eq!(
        *tool.calls.lock().unwrap(),
        vec![
            "check A-a.patch",
            "apply A-a.patch",
            "check A-b.patch",
            "check B-c.patch",
            "apply B-c.patch"
        ]
    );

    let mut skipped = Vec::new();
    while let Ok(event) = rx.try_recv() {
        if let AppEvent::Patch(PatchEvent::Skipped { file_name, .. }) = event {
            skipped.push(file_name);
        }
    }
    assert_eq!(skipped, vec!["b.patch"]);
}

#[tokio::test]
async fn test_skipped_patch_leaves_tree_identical() {
    let patches_dir = tempdir().unwrap();
    let set = PatchSet::from(vec![write_patch(
        patches_dir.path(),
        "A",
        "conflict.patch",
        "create base\n",
    )]);

    let (temp, mut tree) = fresh_tree().await;
    let before = snapshot(temp.path());

    let (tx, _rx) = channel();
    let applier = PatchApplier::new(Arc::new(MarkerTool::default()), tx);
    let report = applier
        .apply(&mut tree, &set, ApplyPass::Remote)
        .await
        .unwrap();

    assert_eq!((report.applied, report.skipped), (0, 1));
    assert_eq!(snapshot(temp.path()), before);
}

#[tokio::test]
async fn test_same_inputs_give_same_tree_and_outcomes() {
    let patches_dir = tempdir().unwrap();
    let set = PatchSet::from(vec![
        write_patch(patches_dir.path(), "A", "a.patch", "create x\n"),
        write_patch(patches_dir.path(), "A", "b.patch", "create x\n"),
        write_patch(patches_dir.path(), "A", "c.patch", "require x\ncreate y\n"),
    ]);

    let mut runs = Vec::new();
    for _ in 0..2 {
        let (temp, mut tree) = fresh_tree().await;
        let (tx, _rx) = channel();
        let applier = PatchApplier::new(Arc::new(MarkerTool::default()), tx);
        let report = applier
            .apply(&mut tree, &set, ApplyPass::Remote)
            .await
            .unwrap();
        runs.push((report.outcomes(), snapshot(temp.path())));
    }

    assert_eq!(runs[0], runs[1]);
}

#[tokio::test]
async fn test_commit_failure_after_dry_run_is_fatal() {
    let patches_dir = tempdir().unwrap();
    let set = PatchSet::from(vec![write_patch(
        patches_dir.path(),
        "A",
        "a.patch",
        "create one\n",
    )]);

    let (_temp, mut tree) = fresh_tree().await;
    let (tx, _rx) = channel();
    let tool = MarkerTool {
        fail_commit: true,
        ..MarkerTool::default()
    };
    let applier = PatchApplier::new(Arc::new(tool), tx);

    let err = applier
        .apply(&mut tree, &set, ApplyPass::Remote)
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        Error::Patch(PatchError::CommitFailed { .. })
    ));
}

#[tokio::test]
async fn test_empty_set_reports_zero() {
    let (_temp, mut tree) = fresh_tree().await;
    let (tx, _rx) = channel();
    let applier = PatchApplier::new(Arc::new(MarkerTool::default()), tx);
    let report = applier
        .apply(&mut tree, &PatchSet::new(), ApplyPass::Local)
        .await
        .unwrap();
    assert_eq!((report.applied, report.skipped), (0, 0));
    assert_eq!(report.pass, ApplyPass::Local);
}

#[tokio::test]
async fn test_local_pass_reads_patch_directory() {
    let local = tempdir().unwrap();
    std::fs::write(local.path().join("b.patch"), "require one\n").unwrap();
    std::fs::write(local.path().join("a.patch"), "create one\n").unwrap();

    let set = local_patch_set(local.path(), &[".patch"]).await.unwrap();
    let (_temp, mut tree) = fresh_tree().await;
    let (tx, _rx) = channel();
    let applier = PatchApplier::new(Arc::new(MarkerTool::default()), tx);
    let report = applier
        .apply(&mut tree, &set, ApplyPass::Local)
        .await
        .unwrap();

    assert_eq!((report.applied, report.skipped), (2, 0));
    assert!(report.records.iter().all(|r| r.source == "local"));
}

const HELLO_PATCH: &str = "\
--- a/hello.txt
+++ b/hello.txt
@@ -1 +1 @@
-hello
+hello world
";

const CONFLICTING_PATCH: &str = "\
--- a/hello.txt
+++ b/hello.txt
@@ -1 +1 @@
-goodbye
+farewell
";

async fn gnu_patch() -> Option<GnuPatch> {
    let tool = GnuPatch::new("patch", 1);
    tool.ensure_available().await.ok().map(|()| tool)
}

#[tokio::test]
async fn test_gnu_patch_applies_and_skips() {
    let Some(tool) = gnu_patch().await else {
        eprintln!("patch not installed, skipping");
        return;
    };

    let patches_dir = tempdir().unwrap();
    let set = PatchSet::from(vec![
        write_patch(patches_dir.path(), "A", "hello.patch", HELLO_PATCH),
        write_patch(patches_dir.path(), "A", "conflict.patch", CONFLICTING_PATCH),
        write_patch(patches_dir.path(), "B", "hello.patch", HELLO_PATCH),
    ]);

    let temp = tempdir().unwrap();
    std::fs::write(temp.path().join("hello.txt"), "hello\n").unwrap();
    let mut tree = SourceTree::open(temp.path()).await.unwrap();

    let (tx, _rx) = channel();
    let applier = PatchApplier::new(Arc::new(tool), tx);
    let report = applier
        .apply(&mut tree, &set, ApplyPass::Remote)
        .await
        .unwrap();

    // The second copy of hello.patch is already applied and is skipped
    assert_eq!(
        report.outcomes(),
        vec![
            PatchOutcome::Applied,
            PatchOutcome::SkippedDoesNotApply,
            PatchOutcome::SkippedDoesNotApply
        ]
    );
    assert_eq!(
        std::fs::read_to_string(temp.path().join("hello.txt")).unwrap(),
        "hello world\n"
    );
}

#[tokio::test]
async fn test_gnu_patch_dry_run_does_not_touch_tree() {
    let Some(tool) = gnu_patch().await else {
        eprintln!("patch not installed, skipping");
        return;
    };

    let patches_dir = tempdir().unwrap();
    let conflict = write_patch(patches_dir.path(), "A", "c.patch", CONFLICTING_PATCH);

    let temp = tempdir().unwrap();
    std::fs::write(temp.path().join("hello.txt"), "hello\n").unwrap();
    let tree = SourceTree::open(temp.path()).await.unwrap();
    let before = snapshot(temp.path());

    assert!(!tool.check(&tree, &conflict.path).await.unwrap());
    assert_eq!(snapshot(temp.path()), before);

    let ok = write_patch(patches_dir.path(), "A", "h.patch", HELLO_PATCH);
    assert!(tool.check(&tree, &ok.path).await.unwrap());
    assert_eq!(snapshot(temp.path()), before);
}
