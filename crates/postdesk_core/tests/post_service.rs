mod support;

use postdesk_core::{
    LocalPostStorage, NewPost, PostService, PostStorage, RepositoryMode, ServiceError,
    StorageError,
};
use std::sync::Arc;
use support::harness;

#[tokio::test]
async fn toggle_flips_enablement_and_reports_missing_posts() {
    for mode in RepositoryMode::ALL {
        let h = harness(mode).await;
        let service = PostService::new(h.repo.clone());
        let post = service.create(&NewPost::named("switch")).await.unwrap();

        assert_eq!(service.toggle_active(post.id).await.unwrap(), Some(false), "{mode}");
        assert_eq!(service.toggle_active(post.id).await.unwrap(), Some(true), "{mode}");
        assert_eq!(service.toggle_active(404).await.unwrap(), None, "{mode}");
    }
}

#[tokio::test]
async fn toggle_treats_unset_enablement_as_active() {
    let h = harness(RepositoryMode::LightweightMapping).await;
    let service = PostService::new(h.repo.clone());
    let post = service.create(&NewPost::named("legacy")).await.unwrap();
    h.raw()
        .execute("UPDATE posts SET active = NULL WHERE id = ?1;", [post.id])
        .unwrap();

    assert_eq!(service.get(post.id).await.unwrap().unwrap().active, None);
    assert_eq!(service.toggle_active(post.id).await.unwrap(), Some(false));
}

#[tokio::test]
async fn delete_removes_attachment_before_soft_delete() {
    for mode in RepositoryMode::ALL {
        let h = harness(mode).await;
        let files = tempfile::tempdir().unwrap();
        let storage = Arc::new(LocalPostStorage::new(files.path()));
        let service = PostService::new(h.repo.clone()).with_storage(storage.clone());

        let reference = storage.upload(&mut &b"pdf"[..], "brief.pdf").await.unwrap();
        let post = service
            .create(&NewPost::named("brief").with_file_name(reference.clone()))
            .await
            .unwrap();
        let plain = service.create(&NewPost::named("plain")).await.unwrap();

        assert!(service.delete(post.id).await.unwrap(), "{mode}");
        assert!(!files.path().join("brief.pdf").exists(), "{mode}");
        assert!(service.get(post.id).await.unwrap().is_none(), "{mode}");

        assert!(service.delete(plain.id).await.unwrap(), "{mode}");
        assert!(!service.delete(plain.id).await.unwrap(), "{mode}");
        assert!(!service.delete(31_337).await.unwrap(), "{mode}");
    }
}

#[tokio::test]
async fn rejected_attachment_keeps_the_post() {
    let h = harness(RepositoryMode::DirectStatement).await;
    let files = tempfile::tempdir().unwrap();
    let service = PostService::new(h.repo.clone())
        .with_storage(Arc::new(LocalPostStorage::new(files.path())));
    let post = service
        .create(&NewPost::named("odd").with_file_name("../escape.txt"))
        .await
        .unwrap();

    let err = service.delete(post.id).await.unwrap_err();
    assert!(matches!(
        err,
        ServiceError::Storage(StorageError::InvalidName(_))
    ));
    assert!(service.get(post.id).await.unwrap().is_some());
}

#[tokio::test]
async fn delete_without_storage_only_soft_deletes() {
    let h = harness(RepositoryMode::FullMapping).await;
    let service = PostService::new(h.repo.clone());
    let post = service
        .create(&NewPost::named("kept file").with_file_name("/files/posts/kept.txt"))
        .await
        .unwrap();

    assert!(service.delete(post.id).await.unwrap());
    assert!(service.get(post.id).await.unwrap().is_none());
}

#[tokio::test]
async fn moves_delegate_to_the_repository() {
    let h = harness(RepositoryMode::FullMapping).await;
    let service = PostService::new(h.repo.clone());
    let posts = h.seed(&["a", "b"]).await;

    assert!(service.move_down(posts[0].id).await.unwrap());
    assert!(!service.move_down(posts[0].id).await.unwrap());
    assert!(service.move_up(posts[0].id).await.unwrap());
    assert_eq!(h.names().await, vec!["a", "b"]);
}
