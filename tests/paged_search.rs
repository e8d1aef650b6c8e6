mod util;

use keysearch::model::types::{IndexResult, QueryKeyword};
use keysearch::search::query::{OPTION_SORT_BY_SCORE_ASC, OPTION_SORT_BY_SCORE_DESC};
use keysearch::search::searcher::TantivyResults;
use tempfile::TempDir;
use util::{TestTracing, open_searcher, put, seed_scored};

/// Every page of `results`, walked forward from page 1.
fn walk_pages(results: &mut TantivyResults) -> Vec<IndexResult> {
    let mut all = Vec::new();
    let mut page = 1;
    while results.goto_page(page).expect("goto page") {
        all.extend(results.results().iter().cloned());
        page += 1;
    }
    all
}

fn keys(results: &[IndexResult]) -> Vec<&str> {
    results.iter().map(|r| r.key.as_str()).collect()
}

#[test]
fn two_users_paged_one_at_a_time() {
    let dir = TempDir::new().unwrap();
    let searcher = open_searcher(dir.path(), "user");
    put(&searcher, "user1", 10, &["bossky"]);
    put(&searcher, "user2", 20, &["bossky"]);

    let mut results = searcher
        .search_keywords(OPTION_SORT_BY_SCORE_DESC, &["bossky"])
        .unwrap();
    results.set_page_size(1).unwrap();

    assert!(results.goto_page(1).unwrap());
    assert_eq!(results.next(), Some(IndexResult::new("user2", 20)));
    assert_eq!(results.next(), None);
    assert!(results.goto_page(2).unwrap());
    assert_eq!(results.next(), Some(IndexResult::new("user1", 10)));
    assert!(!results.goto_page(3).unwrap());
    assert_eq!(results.total_count().unwrap(), 2);
    assert_eq!(results.page_count().unwrap(), 2);
}

#[test]
fn sequential_pages_match_a_single_large_page() {
    let dir = TempDir::new().unwrap();
    let searcher = open_searcher(dir.path(), "scores");
    seed_scored(&searcher, 23, &["all"]);

    for options in [OPTION_SORT_BY_SCORE_DESC, OPTION_SORT_BY_SCORE_ASC, 0] {
        let mut whole = searcher.search_keywords(options, &["all"]).unwrap();
        whole.set_page_size(100).unwrap();
        assert!(whole.goto_page(1).unwrap());
        let expected = whole.results().to_vec();
        assert_eq!(expected.len(), 23);

        let mut paged = searcher.search_keywords(options, &["all"]).unwrap();
        paged.set_page_size(5).unwrap();
        let walked = walk_pages(&mut paged);
        assert_eq!(walked, expected, "options {options}");
        assert_eq!(paged.page_count().unwrap(), 5);
    }
}

#[test]
fn descending_and_ascending_orders_are_monotonic() {
    let dir = TempDir::new().unwrap();
    let searcher = open_searcher(dir.path(), "scores");
    seed_scored(&searcher, 17, &["all"]);

    let mut desc = searcher
        .search_keywords(OPTION_SORT_BY_SCORE_DESC, &["all"])
        .unwrap();
    desc.set_page_size(4).unwrap();
    let desc = walk_pages(&mut desc);
    assert!(desc.windows(2).all(|w| w[0].score >= w[1].score));

    let mut asc = searcher
        .search_keywords(OPTION_SORT_BY_SCORE_ASC, &["all"])
        .unwrap();
    asc.set_page_size(4).unwrap();
    let asc = walk_pages(&mut asc);
    assert!(asc.windows(2).all(|w| w[0].score <= w[1].score));
    assert_eq!(asc.len(), desc.len());
}

#[test]
fn jumping_around_returns_the_same_pages_as_walking() {
    let dir = TempDir::new().unwrap();
    let searcher = open_searcher(dir.path(), "scores");
    seed_scored(&searcher, 20, &["all"]);

    let mut walked = searcher
        .search_keywords(OPTION_SORT_BY_SCORE_DESC, &["all"])
        .unwrap();
    walked.set_page_size(3).unwrap();
    let walked = walk_pages(&mut walked);

    let mut jumper = searcher
        .search_keywords(OPTION_SORT_BY_SCORE_DESC, &["all"])
        .unwrap();
    jumper.set_page_size(3).unwrap();
    for page in [5, 2, 7, 1, 6, 3] {
        assert!(jumper.goto_page(page).unwrap());
        let start = (page - 1) * 3;
        let end = (start + 3).min(walked.len());
        assert_eq!(jumper.results(), &walked[start..end], "page {page}");
    }
    assert!(!jumper.goto_page(8).unwrap());
}

#[test]
fn walking_forward_resumes_from_the_previous_page() {
    let dir = TempDir::new().unwrap();
    let searcher = open_searcher(dir.path(), "scores");
    seed_scored(&searcher, 9, &["all"]);

    let tracing = TestTracing::new();
    let _guard = tracing.install();

    let mut results = searcher
        .search_keywords(OPTION_SORT_BY_SCORE_DESC, &["all"])
        .unwrap();
    results.set_page_size(3).unwrap();
    walk_pages(&mut results);

    let fetches = tracing.lines_with("fetching result page");
    // Page 4 is past the memoized count and never fetched.
    assert_eq!(fetches.len(), 3, "{fetches:?}");
    assert!(fetches[0].contains("resumed=false"));
    assert!(fetches[1..].iter().all(|line| line.contains("resumed=true")));
}

#[test]
fn new_cursor_sees_writes_and_old_cursor_keeps_its_count() {
    let dir = TempDir::new().unwrap();
    let searcher = open_searcher(dir.path(), "user");
    put(&searcher, "user1", 10, &["bossky"]);
    put(&searcher, "user2", 20, &["bossky"]);

    let mut before = searcher
        .search_keywords(OPTION_SORT_BY_SCORE_DESC, &["bossky"])
        .unwrap();
    assert!(before.goto_page(1).unwrap());
    assert_eq!(before.total_count().unwrap(), 2);

    put(&searcher, "user3", 30, &["bossky"]);

    assert_eq!(before.total_count().unwrap(), 2);
    assert_eq!(keys(before.results()), ["user2", "user1"]);

    let mut after = searcher
        .search_keywords(OPTION_SORT_BY_SCORE_DESC, &["bossky"])
        .unwrap();
    assert!(after.goto_page(1).unwrap());
    assert_eq!(keys(after.results()), ["user3", "user2", "user1"]);
    assert_eq!(after.total_count().unwrap(), 3);
}

#[test]
fn upsert_replaces_keywords_and_score() {
    let dir = TempDir::new().unwrap();
    let searcher = open_searcher(dir.path(), "user");
    put(&searcher, "user1", 10, &["old"]);
    put(&searcher, "user1", 99, &["new"]);

    assert_eq!(searcher.search_keywords(0, &["old"]).unwrap().total_count().unwrap(), 0);
    let mut results = searcher.search_keywords(0, &["new"]).unwrap();
    assert!(results.goto_page(1).unwrap());
    assert_eq!(results.results(), [IndexResult::new("user1", 99)]);
}

#[test]
fn removed_entries_disappear_from_new_searches() {
    let dir = TempDir::new().unwrap();
    let searcher = open_searcher(dir.path(), "user");
    put(&searcher, "user1", 10, &["k"]);
    put(&searcher, "user2", 20, &["k"]);

    searcher.remove_entry("user2").unwrap();
    searcher.remove_entry("never-added").unwrap();

    let mut results = searcher
        .search_keywords(OPTION_SORT_BY_SCORE_DESC, &["k"])
        .unwrap();
    assert!(results.goto_page(1).unwrap());
    assert_eq!(keys(results.results()), ["user1"]);
}

#[test]
fn keyword_range_is_half_open() {
    let dir = TempDir::new().unwrap();
    let searcher = open_searcher(dir.path(), "events");
    put(&searcher, "jan", 1, &["2021-01"]);
    put(&searcher, "feb", 2, &["2021-02"]);
    put(&searcher, "mar", 3, &["2021-03"]);

    let mut results = searcher
        .search(OPTION_SORT_BY_SCORE_ASC, Some("2021-02"), Some("2021-03"), &[])
        .unwrap();
    assert!(results.goto_page(1).unwrap());
    assert_eq!(keys(results.results()), ["feb"]);

    let mut open_ended = searcher
        .search(OPTION_SORT_BY_SCORE_ASC, Some("2021-02"), None, &[])
        .unwrap();
    assert!(open_ended.goto_page(1).unwrap());
    assert_eq!(keys(open_ended.results()), ["feb", "mar"]);
}

#[test]
fn key_prefix_narrows_keyword_matches() {
    let dir = TempDir::new().unwrap();
    let searcher = open_searcher(dir.path(), "mixed");
    put(&searcher, "user1", 1, &["red"]);
    put(&searcher, "user2", 2, &["red", "blue"]);
    put(&searcher, "group1", 3, &["red"]);

    let mut results = searcher
        .search(
            OPTION_SORT_BY_SCORE_DESC,
            None,
            None,
            &[
                QueryKeyword::EntryPrefix("user".into()),
                QueryKeyword::KeywordAll("red".into()),
            ],
        )
        .unwrap();
    assert!(results.goto_page(1).unwrap());
    assert_eq!(keys(results.results()), ["user2", "user1"]);
}

#[test]
fn empty_result_set_has_no_pages() {
    let dir = TempDir::new().unwrap();
    let searcher = open_searcher(dir.path(), "empty");

    let mut results = searcher
        .search_keywords(OPTION_SORT_BY_SCORE_DESC, &["nothing"])
        .unwrap();
    assert!(!results.goto_page(1).unwrap());
    assert_eq!(results.total_count().unwrap(), 0);
    assert_eq!(results.page_count().unwrap(), 0);
    assert!(results.results().is_empty());
}

#[test]
fn total_count_is_the_whole_result_set() {
    let dir = TempDir::new().unwrap();
    let searcher = open_searcher(dir.path(), "scores");
    seed_scored(&searcher, 5, &["all"]);

    let mut results = searcher
        .search_keywords(OPTION_SORT_BY_SCORE_DESC, &["all"])
        .unwrap();
    results.set_page_size(2).unwrap();
    assert!(results.goto_page(1).unwrap());
    let total = results.total_count().unwrap();
    assert_eq!(total, 5);
    assert_eq!(results.page_count().unwrap(), 3);
}

#[test]
fn huge_page_size_fits_the_index() {
    let dir = TempDir::new().unwrap();
    let searcher = open_searcher(dir.path(), "scores");
    seed_scored(&searcher, 4, &["all"]);

    let mut results = searcher
        .search_keywords(OPTION_SORT_BY_SCORE_DESC, &["all"])
        .unwrap();
    results.set_page_size(usize::MAX / 2).unwrap();
    assert!(results.goto_page(1).unwrap());
    assert_eq!(results.results().len(), 4);
    assert_eq!(results.page_count().unwrap(), 1);
}
