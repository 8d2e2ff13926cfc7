mod common;

use common::MockBackend;
use rdrive::{
    dashboard::{Crumb, Dashboard, View, ROOT_NAME},
    notify::{Level, MemoryNotifier},
    upload::UploadEntry,
};
use std::{collections::HashSet, sync::Arc};

fn dashboard(api: MockBackend) -> (Dashboard<MockBackend>, Arc<MemoryNotifier>) {
    let notifier = common::notifier();
    let dashboard = Dashboard::new(api, notifier.clone(), &common::config());
    (dashboard, notifier)
}

fn file_ids(dashboard: &Dashboard<MockBackend>) -> HashSet<String> {
    dashboard.contents().files.iter().map(|v| v.id.clone()).collect()
}

fn crumb_names(dashboard: &Dashboard<MockBackend>) -> Vec<&str> {
    dashboard.breadcrumbs().iter().map(|v| v.name.as_str()).collect()
}

#[tokio::test]
async fn load_root_contents_and_usage() {
    let api = MockBackend::new().with_limit(1000);
    let docs = api.add_folder("Docs", None);
    api.add_folder("Nested", Some(&docs.id));
    api.add_file("a.txt", 10, None);
    api.add_file("b.txt", 20, Some(&docs.id));
    let (mut dashboard, notifier) = dashboard(api);

    assert!(dashboard.load_content(None).await);

    assert_eq!(dashboard.view(), &View::Root);
    assert_eq!(dashboard.breadcrumbs(), [Crumb::root()]);
    assert_eq!(dashboard.contents().folders.len(), 1);
    assert_eq!(dashboard.contents().files.len(), 1);
    assert_eq!(dashboard.usage().total_usage, 30);
    assert_eq!(dashboard.storage_limit(), 1000);
    assert!(notifier.notices().is_empty());
}

#[tokio::test]
async fn failed_load_keeps_listing() {
    let api = MockBackend::new();
    api.add_file("a.txt", 1, None);
    let (mut dashboard, notifier) = dashboard(api);
    dashboard.load_content(None).await;

    dashboard.api().fail_listing(true);
    assert!(!dashboard.load_content(None).await);

    assert_eq!(dashboard.contents().files.len(), 1);
    assert_eq!(notifier.messages(Level::Error), ["Failed to load content"]);
}

#[tokio::test]
async fn navigate_and_jump_back_with_breadcrumbs() {
    let api = MockBackend::new();
    let a = api.add_folder("A", None);
    let b = api.add_folder("B", Some(&a.id));
    let c = api.add_folder("C", Some(&b.id));
    let (mut dashboard, _) = dashboard(api);
    dashboard.load_content(None).await;

    assert!(dashboard.navigate(&a.id, &a.name).await);
    assert!(dashboard.navigate(&b.id, &b.name).await);
    assert!(dashboard.navigate(&c.id, &c.name).await);
    assert_eq!(crumb_names(&dashboard), [ROOT_NAME, "A", "B", "C"]);
    assert_eq!(dashboard.view(), &View::Folder(c.id.clone()));

    // Opening a folder of the trail cuts the trail after it.
    assert!(dashboard.navigate(&a.id, &a.name).await);
    assert_eq!(crumb_names(&dashboard), [ROOT_NAME, "A"]);

    assert!(dashboard.navigate(&b.id, &b.name).await);
    assert!(dashboard.breadcrumb(1).await);
    assert_eq!(crumb_names(&dashboard), [ROOT_NAME, "A"]);
    assert_eq!(dashboard.current_folder().map(|v| v.id.as_str()), Some(a.id.as_str()));

    assert!(dashboard.breadcrumb(0).await);
    assert_eq!(dashboard.breadcrumbs(), [Crumb::root()]);
    assert_eq!(dashboard.view(), &View::Root);

    assert!(!dashboard.breadcrumb(5).await);
}

#[tokio::test]
async fn failed_navigation_keeps_breadcrumbs() {
    let api = MockBackend::new();
    let a = api.add_folder("A", None);
    let (mut dashboard, notifier) = dashboard(api);
    dashboard.load_content(None).await;

    assert!(!dashboard.navigate("missing", "Missing").await);

    assert_eq!(dashboard.breadcrumbs(), [Crumb::root()]);
    assert_eq!(dashboard.view(), &View::Root);
    assert_eq!(notifier.messages(Level::Error), ["Failed to load content"]);
    assert!(dashboard.navigate(&a.id, &a.name).await);
}

#[tokio::test]
async fn create_folder_reloads_listing() {
    let (mut dashboard, notifier) = dashboard(MockBackend::new());
    dashboard.load_content(None).await;

    let folder = dashboard.create_folder("  Reports ").await.unwrap();

    assert_eq!(folder.name, "Reports");
    assert_eq!(dashboard.contents().folders, vec![folder]);
    assert_eq!(notifier.messages(Level::Success), ["Folder \"Reports\" created"]);
    assert!(dashboard.create_folder("   ").await.is_none());
}

#[tokio::test]
async fn duplicate_folder_name_is_rejected() {
    let api = MockBackend::new();
    api.add_folder("Reports", None);
    let (mut dashboard, notifier) = dashboard(api);
    dashboard.load_content(None).await;
    let before = dashboard.contents().clone();

    assert!(dashboard.create_folder("Reports").await.is_none());

    assert_eq!(dashboard.contents(), &before);
    assert_eq!(
        notifier.messages(Level::Error),
        ["Failed to create folder. Name might be taken."]
    );
}

#[tokio::test]
async fn delete_file_removes_it() {
    let api = MockBackend::new();
    let a = api.add_file("a.txt", 10, None);
    api.add_file("b.txt", 20, None);
    let (mut dashboard, notifier) = dashboard(api);
    dashboard.load_content(None).await;

    let mut asked = None;
    assert!(
        dashboard
            .delete_file(&a.id, |name| {
                asked = Some(name.to_owned());
                true
            })
            .await
    );

    assert_eq!(asked.as_deref(), Some("a.txt"));
    assert!(!file_ids(&dashboard).contains(&a.id));
    assert_eq!(dashboard.usage().total_usage, 20);
    assert_eq!(
        notifier.messages(Level::Success),
        ["File \"a.txt\" deleted permanently"]
    );
}

#[tokio::test]
async fn declined_delete_does_nothing() {
    let api = MockBackend::new();
    let a = api.add_file("a.txt", 10, None);
    let (mut dashboard, notifier) = dashboard(api);
    dashboard.load_content(None).await;

    assert!(!dashboard.delete_file(&a.id, |_| false).await);

    assert!(file_ids(&dashboard).contains(&a.id));
    assert_eq!(dashboard.api().files().len(), 1);
    assert!(notifier.notices().is_empty());
}

#[tokio::test]
async fn failed_delete_restores_listing() {
    let api = MockBackend::new();
    let a = api.add_file("a.txt", 10, None);
    api.add_file("b.txt", 20, None);
    api.add_file("c.txt", 30, None);
    api.fail_delete(&a.id);
    let (mut dashboard, notifier) = dashboard(api);
    dashboard.load_content(None).await;
    let before = file_ids(&dashboard);

    assert!(!dashboard.delete_file(&a.id, |_| true).await);

    assert_eq!(file_ids(&dashboard), before);
    assert_eq!(notifier.messages(Level::Error), ["Failed to delete \"a.txt\""]);
}

#[tokio::test]
async fn delete_folder_with_rollback() {
    let api = MockBackend::new();
    let keep = api.add_folder("Keep", None);
    let gone = api.add_folder("Gone", None);
    api.add_file("inner.txt", 5, Some(&gone.id));
    api.fail_delete(&keep.id);
    let (mut dashboard, notifier) = dashboard(api);
    dashboard.load_content(None).await;

    assert!(dashboard.delete_folder(&gone.id, |_| true).await);
    assert!(dashboard.api().files().is_empty());
    assert_eq!(
        notifier.messages(Level::Success),
        ["Folder \"Gone\" and its contents deleted"]
    );

    assert!(!dashboard.delete_folder(&keep.id, |_| true).await);
    let names = dashboard
        .contents()
        .folders
        .iter()
        .map(|v| v.name.as_str())
        .collect::<Vec<_>>();
    assert_eq!(names, ["Keep"]);
    assert_eq!(notifier.messages(Level::Error), ["Failed to delete \"Keep\""]);
}

#[tokio::test]
async fn download_link() {
    let api = MockBackend::new();
    let a = api.add_file("a.txt", 10, None);
    let (mut dashboard, notifier) = dashboard(api);
    dashboard.load_content(None).await;

    let link = dashboard.download(&a.id).await.unwrap();
    assert_eq!(link.file_name, "a.txt");
    assert!(link.url.starts_with("https://storage.test/"));

    assert!(dashboard.download("missing").await.is_none());
    assert_eq!(
        notifier.messages(Level::Error),
        ["Download failed. Please try again."]
    );
}

#[tokio::test]
async fn search_filters_case_insensitively() {
    let api = MockBackend::new();
    api.add_folder("Photos", None);
    api.add_folder("Music", None);
    api.add_file("holiday-PHOTO.jpg", 1, None);
    api.add_file("notes.txt", 1, None);
    let (mut dashboard, _) = dashboard(api);
    dashboard.load_content(None).await;

    dashboard.set_search("photo");

    let files = dashboard.visible_files();
    assert_eq!(files.len(), 1);
    assert_eq!(files[0].name, "holiday-PHOTO.jpg");
    let folders = dashboard.visible_folders();
    assert_eq!(folders.len(), 1);
    assert_eq!(folders[0].name, "Photos");

    dashboard.set_search("");
    assert_eq!(dashboard.visible_files().len(), 2);
}

#[tokio::test]
async fn folder_tree_loads_lazily() {
    let api = MockBackend::new();
    let a = api.add_folder("A", None);
    api.add_folder("A1", Some(&a.id));
    api.add_folder("B", None);
    let (mut dashboard, _) = dashboard(api);

    assert!(dashboard.load_root_folders().await);
    assert_eq!(dashboard.tree().len(), 2);
    assert!(dashboard.tree().iter().all(|v| !v.loaded));

    assert!(dashboard.expand_folder(&a.id).await);
    let node = dashboard.tree().iter().find(|v| v.id == a.id).unwrap();
    assert!(node.loaded);
    assert_eq!(node.children.len(), 1);
    assert_eq!(node.children[0].name, "A1");

    assert!(!dashboard.expand_folder("missing").await);
}

#[tokio::test]
async fn upload_into_current_folder() {
    let api = MockBackend::new();
    let target = api.add_folder("Target", None);
    api.fail_save("b.txt");
    let (mut dashboard, notifier) = dashboard(api);
    dashboard.load_content(None).await;
    dashboard.navigate(&target.id, &target.name).await;

    let entries = vec![
        UploadEntry::from_bytes("a.txt", vec![1; 100]),
        UploadEntry::from_bytes("b.txt", vec![2; 200]),
        UploadEntry::from_bytes("c.txt", vec![3; 300]),
    ];
    let summary = dashboard.upload(entries).await;

    assert_eq!(summary.uploaded.len(), 2);
    let names = dashboard
        .contents()
        .files
        .iter()
        .map(|v| v.name.as_str())
        .collect::<Vec<_>>();
    assert_eq!(names, ["a.txt", "c.txt"]);
    assert_eq!(dashboard.usage().total_usage, 400);
    assert_eq!(
        notifier.messages(Level::Error),
        ["b.txt: Database unavailable"]
    );
    assert_eq!(
        dashboard.remaining_space(),
        common::config().storage_limit_bytes() - 400
    );
}
