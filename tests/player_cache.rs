mod common;

use chrono::Duration;

use common::{Failure, GIANT_BEATDOWN, HOG_CYCLE, harness, raw_player};
use deck_analyzer::Error;
use deck_analyzer::database::{decks, players};

#[tokio::test]
async fn first_request_fetches_and_stores_player_with_deck() {
    let h = harness().await;
    h.provider.set_player(raw_player("#ABC123", "Alice", 6200, &HOG_CYCLE));

    let view = h.analyzer.get_or_create_player("abc123", false).await.unwrap();

    assert_eq!(h.provider.player_calls(), 1);
    assert_eq!(view.player.tag, "#ABC123");
    assert_eq!(view.player.name, "Alice");
    assert_eq!(view.player.trophies, 6200);
    assert_eq!(view.player.arena_name.as_deref(), Some("Legendary Arena"));
    assert_eq!(view.player.clan_tag.as_deref(), Some("#CLAN1"));
    assert_eq!(view.favourite_card.map(|c| c.name), Some("Hog Rider".to_string()));

    let deck = view.current_deck.expect("deck should be stored");
    assert!(deck.is_current);
    assert_eq!(deck.cards.len(), 8);
    assert_eq!(deck.cards[0].card.name, "Hog Rider");
    assert_eq!(deck.cards[0].level, 11);
    assert!((deck.avg_elixir - 2.63).abs() < 1e-9);
}

#[tokio::test]
async fn repeated_requests_within_window_hit_upstream_once() {
    let h = harness().await;
    h.provider.set_player(raw_player("#ABC123", "Alice", 6200, &HOG_CYCLE));

    let first = h.analyzer.get_or_create_player("#ABC123", false).await.unwrap();
    h.clock.advance(Duration::seconds(120));
    let second = h.analyzer.get_or_create_player("#abc123", false).await.unwrap();

    assert_eq!(h.provider.player_calls(), 1);
    assert_eq!(first.player, second.player);
    assert_eq!(first.current_deck, second.current_deck);
    assert!(second.favourite_card.is_none());
}

#[tokio::test]
async fn record_exactly_at_cache_duration_is_still_served() {
    let h = harness().await;
    h.provider.set_player(raw_player("#ABC123", "Alice", 6200, &HOG_CYCLE));
    h.analyzer.get_or_create_player("#ABC123", false).await.unwrap();

    h.clock.advance(Duration::seconds(300));
    h.analyzer.get_or_create_player("#ABC123", false).await.unwrap();
    assert_eq!(h.provider.player_calls(), 1);

    h.clock.advance(Duration::seconds(1));
    h.analyzer.get_or_create_player("#ABC123", false).await.unwrap();
    assert_eq!(h.provider.player_calls(), 2);
}

#[tokio::test]
async fn stale_record_is_refreshed_with_new_values() {
    let h = harness().await;
    h.provider.set_player(raw_player("#ABC123", "Alice", 6200, &HOG_CYCLE));
    let first = h.analyzer.get_or_create_player("#ABC123", false).await.unwrap();

    h.provider.set_player(raw_player("#ABC123", "Alice", 6350, &HOG_CYCLE));
    h.clock.advance(Duration::minutes(10));
    let second = h.analyzer.get_or_create_player("#ABC123", false).await.unwrap();

    assert_eq!(second.player.id, first.player.id);
    assert_eq!(second.player.trophies, 6350);
    assert_eq!(second.player.created_at, first.player.created_at);
    assert!(second.player.last_fetched > first.player.last_fetched);
}

#[tokio::test]
async fn force_refresh_bypasses_fresh_cache() {
    let h = harness().await;
    h.provider.set_player(raw_player("#ABC123", "Alice", 6200, &HOG_CYCLE));

    h.analyzer.get_or_create_player("#ABC123", false).await.unwrap();
    h.analyzer.get_or_create_player("#ABC123", true).await.unwrap();

    assert_eq!(h.provider.player_calls(), 2);
}

#[tokio::test]
async fn concurrent_requests_for_one_tag_fetch_once() {
    let h = harness().await;
    h.provider.set_player(raw_player("#ABC123", "Alice", 6200, &HOG_CYCLE));

    let (a, b) = tokio::join!(
        h.analyzer.get_or_create_player("#ABC123", false),
        h.analyzer.get_or_create_player("abc123", false),
    );

    assert_eq!(a.unwrap().player, b.unwrap().player);
    assert_eq!(h.provider.player_calls(), 1);

    let mut conn = h.database.acquire().await.unwrap();
    assert_eq!(players::count(&mut conn).await.unwrap(), 1);
}

#[tokio::test]
async fn unknown_player_is_not_found_and_nothing_is_stored() {
    let h = harness().await;

    let err = h.analyzer.get_or_create_player("#NOPE", false).await.unwrap_err();
    assert!(matches!(err, Error::NotFound { .. }));

    let mut conn = h.database.acquire().await.unwrap();
    assert_eq!(players::count(&mut conn).await.unwrap(), 0);
}

#[tokio::test]
async fn upstream_failure_on_stale_record_is_surfaced_not_masked() {
    let h = harness().await;
    h.provider.set_player(raw_player("#ABC123", "Alice", 6200, &HOG_CYCLE));
    let cached = h.analyzer.get_or_create_player("#ABC123", false).await.unwrap();

    h.clock.advance(Duration::minutes(6));
    h.provider.fail_with(Some(Failure::Transient));

    let err = h.analyzer.get_or_create_player("#ABC123", false).await.unwrap_err();
    assert!(matches!(err, Error::TransientProvider { .. }));
    assert!(err.is_retryable());

    // The stored row is untouched by the failed refresh
    let stored = h.analyzer.get_player("#ABC123").await.unwrap();
    assert_eq!(stored.player, cached.player);

    h.provider.fail_with(Some(Failure::Forbidden));
    let err = h.analyzer.get_or_create_player("#ABC123", false).await.unwrap_err();
    assert!(matches!(err, Error::Provider { status: Some(403), .. }));
    assert!(!err.is_retryable());
}

#[tokio::test]
async fn malformed_tags_are_rejected_before_any_fetch() {
    let h = harness().await;

    for tag in ["", "#", "#AB-12"] {
        let err = h.analyzer.get_or_create_player(tag, false).await.unwrap_err();
        assert!(matches!(err, Error::InvalidTag { .. }), "{tag:?}");
    }
    assert_eq!(h.provider.player_calls(), 0);
}

#[tokio::test]
async fn get_player_reads_local_data_only() {
    let h = harness().await;

    let err = h.analyzer.get_player("#ABC123").await.unwrap_err();
    assert!(matches!(err, Error::NotFound { .. }));

    h.provider.set_player(raw_player("#ABC123", "Alice", 6200, &HOG_CYCLE));
    h.analyzer.get_or_create_player("#ABC123", false).await.unwrap();
    h.clock.advance(Duration::days(1));

    let view = h.analyzer.get_player("#ABC123").await.unwrap();
    assert_eq!(view.player.name, "Alice");
    assert!(view.current_deck.is_some());
    assert_eq!(h.provider.player_calls(), 1);
}

#[tokio::test]
async fn players_are_paged_by_trophies() {
    let h = harness().await;
    for (tag, trophies) in [("#AAA", 5000), ("#BBB", 7000), ("#CCC", 6000)] {
        h.provider.set_player(raw_player(tag, tag, trophies, &HOG_CYCLE));
        h.analyzer.get_or_create_player(tag, false).await.unwrap();
    }

    let page = h.analyzer.get_all_players(2, 0).await.unwrap();
    assert_eq!(page.total, 3);
    assert_eq!((page.limit, page.offset), (2, 0));
    let tags: Vec<_> = page.players.iter().map(|p| p.tag.as_str()).collect();
    assert_eq!(tags, vec!["#BBB", "#CCC"]);

    let page = h.analyzer.get_all_players(2, 2).await.unwrap();
    assert_eq!(page.players.len(), 1);
    assert_eq!(page.players[0].tag, "#AAA");
}

#[tokio::test]
async fn invalid_pagination_is_rejected() {
    let h = harness().await;

    for (limit, offset) in [(0, 0), (101, 0), (10, -1)] {
        let err = h.analyzer.get_all_players(limit, offset).await.unwrap_err();
        assert!(matches!(err, Error::InvalidPagination { .. }), "{limit} {offset}");
    }
    assert!(h.analyzer.get_all_players(100, 0).await.is_ok());
}

#[tokio::test]
async fn deleting_a_player_removes_its_decks_and_analyses() {
    let h = harness().await;
    h.provider.set_player(raw_player("#ABC123", "Alice", 6200, &HOG_CYCLE));
    h.provider.set_player(raw_player("#XYZ789", "Bob", 5800, &GIANT_BEATDOWN));

    let alice = h.analyzer.analyze_player_deck("#ABC123").await.unwrap();
    h.analyzer.analyze_player_deck("#XYZ789").await.unwrap();

    h.analyzer.delete_player("#ABC123").await.unwrap();

    assert!(matches!(
        h.analyzer.get_player("#ABC123").await.unwrap_err(),
        Error::NotFound { .. }
    ));
    assert!(h.analyzer.get_player("#XYZ789").await.unwrap().current_deck.is_some());

    let mut conn = h.database.acquire().await.unwrap();
    assert!(decks::load(&mut conn, alice.deck.id, None).await.unwrap().is_none());
    assert_eq!(players::count(&mut conn).await.unwrap(), 1);
    drop(conn);

    assert!(matches!(
        h.analyzer.delete_player("#ABC123").await.unwrap_err(),
        Error::NotFound { .. }
    ));
}

#[tokio::test]
async fn battles_pass_through_from_upstream() {
    let h = harness().await;

    let battles = h.analyzer.player_battles("abc123").await.unwrap();
    assert_eq!(battles.len(), 1);
    assert_eq!(battles[0].team[0].tag.as_deref(), Some("#ABC123"));
}
