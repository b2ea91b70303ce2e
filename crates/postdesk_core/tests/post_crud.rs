mod support;

use chrono::Utc;
use postdesk_core::{NewPost, RepoError, RepositoryMode};
use support::harness;

#[tokio::test]
async fn add_appends_after_current_max_order() {
    for mode in RepositoryMode::ALL {
        let h = harness(mode).await;

        let first = h.repo.add(&NewPost::named("first")).await.unwrap();
        assert_eq!(first.display_order, 1, "{mode}");

        h.set_display_order(first.id, 7);
        let second = h.repo.add(&NewPost::named("second")).await.unwrap();
        assert_eq!(second.display_order, 8, "{mode}");
        assert_ne!(first.id, second.id, "{mode}");
    }
}

#[tokio::test]
async fn add_assigns_store_fields_and_keeps_input() {
    for mode in RepositoryMode::ALL {
        let h = harness(mode).await;
        let before = Utc::now();

        let input = NewPost::named("launch")
            .with_title("Launch notes")
            .with_category("news")
            .created_by("editor")
            .with_file_name("/files/posts/launch.pdf");
        let created = h.repo.add(&input).await.unwrap();

        assert_eq!(created.active, Some(true), "{mode}");
        assert!(!created.is_deleted, "{mode}");
        assert!(created.created >= before - chrono::Duration::seconds(1), "{mode}");
        assert!(created.created <= Utc::now(), "{mode}");

        let loaded = h.repo.get_by_id(created.id).await.unwrap().unwrap();
        assert_eq!(loaded, created, "{mode}");
        assert_eq!(loaded.title.as_deref(), Some("Launch notes"), "{mode}");
        assert_eq!(loaded.created_by.as_deref(), Some("editor"), "{mode}");
        assert_eq!(
            loaded.file_name.as_deref(),
            Some("/files/posts/launch.pdf"),
            "{mode}"
        );
    }
}

#[tokio::test]
async fn add_keeps_explicitly_disabled_posts_disabled() {
    for mode in RepositoryMode::ALL {
        let h = harness(mode).await;
        let input = NewPost {
            active: Some(false),
            ..NewPost::named("draft")
        };

        let created = h.repo.add(&input).await.unwrap();
        let loaded = h.repo.get_by_id(created.id).await.unwrap().unwrap();
        assert_eq!(loaded.active, Some(false), "{mode}");
        assert!(!loaded.is_active(), "{mode}");
    }
}

#[tokio::test]
async fn get_by_id_returns_none_for_unknown_id() {
    for mode in RepositoryMode::ALL {
        let h = harness(mode).await;
        h.seed(&["only"]).await;
        assert!(h.repo.get_by_id(9_999).await.unwrap().is_none(), "{mode}");
    }
}

#[tokio::test]
async fn update_writes_only_active_name_and_category() {
    for mode in RepositoryMode::ALL {
        let h = harness(mode).await;
        let created = h
            .repo
            .add(&NewPost::named("before").with_title("kept title").with_category("old"))
            .await
            .unwrap();

        let mut changed = created.clone();
        changed.name = Some("after".to_string());
        changed.category = None;
        changed.active = None;
        changed.title = Some("ignored".to_string());
        changed.display_order = 99;
        assert!(h.repo.update(&changed).await.unwrap(), "{mode}");

        let loaded = h.repo.get_by_id(created.id).await.unwrap().unwrap();
        assert_eq!(loaded.name.as_deref(), Some("after"), "{mode}");
        assert_eq!(loaded.category, None, "{mode}");
        assert_eq!(loaded.active, Some(true), "{mode}");
        assert_eq!(loaded.title.as_deref(), Some("kept title"), "{mode}");
        assert_eq!(loaded.display_order, created.display_order, "{mode}");
        assert_eq!(loaded.created, created.created, "{mode}");
    }
}

#[tokio::test]
async fn update_reports_false_for_missing_or_deleted_posts() {
    for mode in RepositoryMode::ALL {
        let h = harness(mode).await;
        let created = h.repo.add(&NewPost::named("gone")).await.unwrap();

        let mut ghost = created.clone();
        ghost.id = 4_242;
        assert!(!h.repo.update(&ghost).await.unwrap(), "{mode}");

        assert!(h.repo.delete(created.id).await.unwrap(), "{mode}");
        let mut stale = created.clone();
        stale.name = Some("revived".to_string());
        assert!(!h.repo.update(&stale).await.unwrap(), "{mode}");
    }
}

#[tokio::test]
async fn delete_is_soft_and_not_repeatable() {
    for mode in RepositoryMode::ALL {
        let h = harness(mode).await;
        let posts = h.seed(&["a", "b"]).await;

        assert!(h.repo.delete(posts[0].id).await.unwrap(), "{mode}");
        assert!(h.repo.get_by_id(posts[0].id).await.unwrap().is_none(), "{mode}");
        assert!(!h.repo.delete(posts[0].id).await.unwrap(), "{mode}");
        assert!(!h.repo.delete(12_345).await.unwrap(), "{mode}");

        let is_deleted: i64 = h
            .raw()
            .query_row(
                "SELECT is_deleted FROM posts WHERE id = ?1;",
                [posts[0].id],
                |row| row.get(0),
            )
            .unwrap();
        assert_eq!(is_deleted, 1, "{mode}: row must persist as a tombstone");
    }
}

#[tokio::test]
async fn get_all_lists_live_posts_by_display_order() {
    for mode in RepositoryMode::ALL {
        let h = harness(mode).await;
        let posts = h.seed(&["a", "b", "c", "d"]).await;
        h.set_display_order(posts[0].id, 40);
        h.set_display_order(posts[2].id, 10);
        h.repo.delete(posts[3].id).await.unwrap();

        assert_eq!(h.names().await, vec!["c", "b", "a"], "{mode}");
        let orders: Vec<i32> = h
            .repo
            .get_all()
            .await
            .unwrap()
            .iter()
            .map(|post| post.display_order)
            .collect();
        assert!(orders.windows(2).all(|pair| pair[0] <= pair[1]), "{mode}");
    }
}

#[tokio::test]
async fn get_all_breaks_order_ties_by_id() {
    for mode in RepositoryMode::ALL {
        let h = harness(mode).await;
        let posts = h.seed(&["x", "y", "z"]).await;
        for post in &posts {
            h.set_display_order(post.id, 5);
        }

        let ids: Vec<i64> = h.repo.get_all().await.unwrap().iter().map(|p| p.id).collect();
        let mut sorted = ids.clone();
        sorted.sort_unstable();
        assert_eq!(ids, sorted, "{mode}");
    }
}

#[tokio::test]
async fn add_ignores_deleted_rows_when_computing_next_order() {
    for mode in RepositoryMode::ALL {
        let h = harness(mode).await;
        let posts = h.seed(&["a", "b", "c"]).await;
        h.repo.delete(posts[2].id).await.unwrap();

        let next = h.repo.add(&NewPost::named("d")).await.unwrap();
        assert_eq!(next.display_order, 3, "{mode}");
    }
}

#[tokio::test]
async fn add_at_max_display_order_is_refused_without_writing() {
    for mode in RepositoryMode::ALL {
        let h = harness(mode).await;
        let top = h.seed(&["top"]).await.remove(0);
        h.set_display_order(top.id, i32::MAX);

        let err = h.repo.add(&NewPost::named("overflow")).await.unwrap_err();
        assert!(matches!(err, RepoError::InvalidData(_)), "{mode}: {err}");
        assert!(!err.is_store_fault(), "{mode}");

        let rows: i64 = h
            .raw()
            .query_row("SELECT COUNT(*) FROM posts;", [], |row| row.get(0))
            .unwrap();
        assert_eq!(rows, 1, "{mode}");
        assert_eq!(h.names().await, vec!["top"], "{mode}");

        h.repo.delete(top.id).await.unwrap();
        let next = h.repo.add(&NewPost::named("fresh")).await.unwrap();
        assert_eq!(next.display_order, 1, "{mode}");
    }
}
