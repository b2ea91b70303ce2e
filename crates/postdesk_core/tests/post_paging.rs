mod support;

use postdesk_core::{NewPost, PageRequest, RepoError, RepositoryMode, SortOrder};
use support::{harness, Harness};

async fn seed_foo_catalog(h: &Harness) {
    for index in 0..25 {
        let category = if index % 5 == 0 { "news" } else { "blog" };
        h.repo
            .add(&NewPost::named(format!("foo {index:02}")).with_category(category))
            .await
            .unwrap();
    }
    for name in ["bar", "baz", "qux"] {
        h.repo.add(&NewPost::named(name)).await.unwrap();
    }
}

#[tokio::test]
async fn search_pages_report_full_match_count() {
    for mode in RepositoryMode::ALL {
        let h = harness(mode).await;
        seed_foo_catalog(&h).await;

        let first = h
            .repo
            .get_all_paged(&PageRequest::new(0, 10).search("foo").sort(SortOrder::Name))
            .await
            .unwrap();
        assert_eq!(first.items.len(), 10, "{mode}");
        assert_eq!(first.total_count, 25, "{mode}");
        assert_eq!(first.items[0].name.as_deref(), Some("foo 00"), "{mode}");

        let last = h
            .repo
            .get_all_paged(&PageRequest::new(2, 10).search("foo").sort(SortOrder::Name))
            .await
            .unwrap();
        assert_eq!(last.items.len(), 5, "{mode}");
        assert_eq!(last.total_count, 25, "{mode}");
        assert_eq!(last.items[4].name.as_deref(), Some("foo 24"), "{mode}");

        let beyond = h
            .repo
            .get_all_paged(&PageRequest::new(3, 10).search("foo"))
            .await
            .unwrap();
        assert!(beyond.items.is_empty(), "{mode}");
        assert_eq!(beyond.total_count, 25, "{mode}");
    }
}

#[tokio::test]
async fn blank_filters_match_every_live_post() {
    for mode in RepositoryMode::ALL {
        let h = harness(mode).await;
        seed_foo_catalog(&h).await;
        let removed = h.repo.get_all().await.unwrap()[0].id;
        h.repo.delete(removed).await.unwrap();

        let page = h
            .repo
            .get_all_paged(&PageRequest::new(0, 100).search("  ").category(" "))
            .await
            .unwrap();
        assert_eq!(page.total_count, 27, "{mode}");
        assert_eq!(page.items.len(), 27, "{mode}");
        assert!(page.items.iter().all(|post| post.id != removed), "{mode}");
    }
}

#[tokio::test]
async fn category_filter_is_exact_and_combines_with_search() {
    for mode in RepositoryMode::ALL {
        let h = harness(mode).await;
        seed_foo_catalog(&h).await;

        let news = h
            .repo
            .get_all_paged(&PageRequest::new(0, 10).category("news"))
            .await
            .unwrap();
        assert_eq!(news.total_count, 5, "{mode}");
        assert!(
            news.items
                .iter()
                .all(|post| post.category.as_deref() == Some("news")),
            "{mode}"
        );

        let partial = h
            .repo
            .get_all_paged(&PageRequest::new(0, 10).category("new"))
            .await
            .unwrap();
        assert_eq!(partial.total_count, 0, "{mode}");

        let combined = h
            .repo
            .get_all_paged(&PageRequest::new(0, 10).category("news").search("foo 1"))
            .await
            .unwrap();
        let names: Vec<_> = combined
            .items
            .iter()
            .filter_map(|post| post.name.as_deref())
            .collect();
        assert_eq!(names, vec!["foo 10", "foo 15"], "{mode}");
    }
}

#[tokio::test]
async fn search_is_case_insensitive_substring() {
    for mode in RepositoryMode::ALL {
        let h = harness(mode).await;
        h.seed(&["Alpha Release", "beta", "ALPHAbet"]).await;

        let page = h
            .repo
            .get_all_paged(&PageRequest::new(0, 10).search("alpha"))
            .await
            .unwrap();
        assert_eq!(page.total_count, 2, "{mode}");
    }
}

#[tokio::test]
async fn search_treats_wildcards_literally() {
    for mode in RepositoryMode::ALL {
        let h = harness(mode).await;
        h.seed(&["50% off", "500 off", "a_b", "axb", "back\\slash", "wow!", "wowza"])
            .await;

        let percent = h
            .repo
            .get_all_paged(&PageRequest::new(0, 10).search("50%"))
            .await
            .unwrap();
        assert_eq!(percent.total_count, 1, "{mode}");
        assert_eq!(percent.items[0].name.as_deref(), Some("50% off"), "{mode}");

        let underscore = h
            .repo
            .get_all_paged(&PageRequest::new(0, 10).search("a_b"))
            .await
            .unwrap();
        assert_eq!(underscore.total_count, 1, "{mode}");

        let backslash = h
            .repo
            .get_all_paged(&PageRequest::new(0, 10).search("k\\s"))
            .await
            .unwrap();
        assert_eq!(backslash.total_count, 1, "{mode}");

        let bang = h
            .repo
            .get_all_paged(&PageRequest::new(0, 10).search("wow!"))
            .await
            .unwrap();
        assert_eq!(bang.total_count, 1, "{mode}");
    }
}

#[tokio::test]
async fn sort_orders_are_applied_with_id_tie_break() {
    for mode in RepositoryMode::ALL {
        let h = harness(mode).await;
        let posts = h.seed(&["delta", "alpha", "charlie", "alpha"]).await;

        let by_name = h
            .repo
            .get_all_paged(&PageRequest::new(0, 10).sort(SortOrder::Name))
            .await
            .unwrap();
        let ids: Vec<_> = by_name.items.iter().map(|post| post.id).collect();
        assert_eq!(
            ids,
            vec![posts[1].id, posts[3].id, posts[2].id, posts[0].id],
            "{mode}"
        );

        let by_name_desc = h
            .repo
            .get_all_paged(&PageRequest::new(0, 10).sort(SortOrder::NameDesc))
            .await
            .unwrap();
        let ids: Vec<_> = by_name_desc.items.iter().map(|post| post.id).collect();
        assert_eq!(
            ids,
            vec![posts[0].id, posts[2].id, posts[1].id, posts[3].id],
            "{mode}"
        );

        h.set_display_order(posts[0].id, 0);
        let by_order = h
            .repo
            .get_all_paged(&PageRequest::new(0, 10))
            .await
            .unwrap();
        assert_eq!(by_order.items[0].id, posts[0].id, "{mode}");
    }
}

#[tokio::test]
async fn zero_page_size_is_rejected() {
    for mode in RepositoryMode::ALL {
        let h = harness(mode).await;
        h.seed(&["one"]).await;

        let err = h
            .repo
            .get_all_paged(&PageRequest::new(0, 0))
            .await
            .unwrap_err();
        assert!(matches!(err, RepoError::InvalidRequest(_)), "{mode}: {err}");
        assert!(!err.is_store_fault(), "{mode}");
    }
}

#[tokio::test]
async fn empty_store_yields_empty_page() {
    for mode in RepositoryMode::ALL {
        let h = harness(mode).await;
        let page = h
            .repo
            .get_all_paged(&PageRequest::new(0, 10).search("anything"))
            .await
            .unwrap();
        assert!(page.items.is_empty(), "{mode}");
        assert_eq!(page.total_count, 0, "{mode}");
    }
}

#[tokio::test]
async fn parent_and_search_field_do_not_narrow_results() {
    for mode in RepositoryMode::ALL {
        let h = harness(mode).await;
        h.seed(&["a", "b"]).await;

        let page = h
            .repo
            .get_all_paged(
                &PageRequest::new(0, 10)
                    .parent(77_i64)
                    .search_field("Title"),
            )
            .await
            .unwrap();
        assert_eq!(page.total_count, 2, "{mode}");
    }
}
