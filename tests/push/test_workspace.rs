//! Tests for workspace discovery and repository resolution.

use git_push_mr::{GitError, TitleSource, TrackInfo, Workspace, changelist_title, resolve};
use tempfile::TempDir;

use super::support::{ORIGIN, init_repo};

#[tokio::test]
async fn test_resolve_repository_at_root() {
    let dir = TempDir::new().unwrap();
    let upstream = "[remote \"upstream\"]\n\
        \turl = https://gitlab.example.com/upstream/proj.git\n\
        \tpushurl = git@gitlab.example.com:upstream/proj.git\n\
        [branch \"hotfix/1.2\"]\n\
        \tremote = upstream\n\
        \tmerge = refs/heads/hotfix/1.2\n";
    init_repo(dir.path(), "hotfix/1.2", &format!("{ORIGIN}{upstream}"));

    let workspace = Workspace::discover(dir.path(), 2).await.unwrap();
    assert_eq!(workspace.repositories().len(), 1);

    let repository = resolve(&workspace).await.unwrap();
    assert_eq!(repository.root, dir.path().canonicalize().unwrap());
    assert_eq!(repository.current_branch.as_deref(), Some("hotfix/1.2"));

    let names: Vec<_> = repository.remotes.iter().map(|r| r.name.as_str()).collect();
    assert_eq!(names, vec!["origin", "upstream"]);

    assert_eq!(
        repository.tracking,
        Some(TrackInfo {
            remote: "upstream".to_string(),
            remote_branch: "hotfix/1.2".to_string(),
        })
    );
    let push_remote = repository.push_remote().unwrap();
    assert_eq!(push_remote.name, "upstream");
    assert_eq!(
        push_remote.url(),
        Some("git@gitlab.example.com:upstream/proj.git")
    );
}

#[tokio::test]
async fn test_resolve_without_upstream() {
    let dir = TempDir::new().unwrap();
    init_repo(dir.path(), "feature/login", ORIGIN);

    let workspace = Workspace::discover(dir.path(), 2).await.unwrap();
    let repository = resolve(&workspace).await.unwrap();

    assert_eq!(repository.tracking, None);
    assert_eq!(repository.push_remote().map(|r| r.name.as_str()), Some("origin"));
}

#[tokio::test]
async fn test_discover_from_subdirectory() {
    let dir = TempDir::new().unwrap();
    init_repo(dir.path(), "main", "");
    let nested = dir.path().join("src").join("module");
    std::fs::create_dir_all(&nested).unwrap();

    let workspace = Workspace::discover(&nested, 2).await.unwrap();

    assert_eq!(
        workspace.repositories(),
        &[dir.path().canonicalize().unwrap()]
    );
}

#[tokio::test]
async fn test_discover_nested_repositories_in_order() {
    let dir = TempDir::new().unwrap();
    init_repo(&dir.path().join("beta"), "main", "");
    init_repo(&dir.path().join("alpha"), "main", "");
    init_repo(&dir.path().join("deep").join("er").join("gamma"), "main", "");

    let workspace = Workspace::discover(dir.path(), 1).await.unwrap();
    let root = dir.path().canonicalize().unwrap();

    assert_eq!(
        workspace.repositories(),
        &[root.join("alpha"), root.join("beta")]
    );

    let repository = resolve(&workspace).await.unwrap();
    assert_eq!(repository.root, root.join("alpha"));
}

#[tokio::test]
async fn test_empty_workspace() {
    let dir = TempDir::new().unwrap();

    let workspace = Workspace::discover(dir.path(), 2).await.unwrap();
    assert!(workspace.repositories().is_empty());

    let result = resolve(&workspace).await;
    assert!(matches!(result, Err(GitError::NoRepositoryFound)));
}

#[tokio::test]
async fn test_discover_rejects_missing_directory() {
    let dir = TempDir::new().unwrap();
    let result = Workspace::discover(dir.path().join("missing"), 2).await;
    assert!(matches!(result, Err(GitError::InvalidInput(_))));
}

#[tokio::test]
async fn test_current_branch_of_unborn_head() {
    let dir = TempDir::new().unwrap();
    init_repo(dir.path(), "feature/x", "");

    let workspace = Workspace::discover(dir.path(), 0).await.unwrap();
    let repository = resolve(&workspace).await.unwrap();
    assert_eq!(repository.current_branch.as_deref(), Some("feature/x"));
}

#[tokio::test]
async fn test_head_commit_title_source() {
    let dir = TempDir::new().unwrap();
    init_repo(
        dir.path(),
        "main",
        "[user]\n\tname = Test User\n\temail = test@example.com\n",
    );

    let repo = gix::open(dir.path()).unwrap();
    let tree = repo.empty_tree().id;
    repo.commit(
        "HEAD",
        "Add login form\n\nLonger description of the change.\n",
        tree,
        gix::commit::NO_PARENT_IDS,
    )
    .unwrap();

    let workspace = Workspace::discover(dir.path(), 0).await.unwrap();
    let repository = resolve(&workspace).await.unwrap();

    assert_eq!(
        changelist_title(&repository, &TitleSource::HeadCommit),
        "Add login form"
    );
    assert_eq!(changelist_title(&repository, &TitleSource::None), "");
}

#[tokio::test]
async fn test_head_commit_title_of_unborn_head_is_empty() {
    let dir = TempDir::new().unwrap();
    init_repo(dir.path(), "main", "");

    let workspace = Workspace::discover(dir.path(), 0).await.unwrap();
    let repository = resolve(&workspace).await.unwrap();

    assert_eq!(changelist_title(&repository, &TitleSource::HeadCommit), "");
}
