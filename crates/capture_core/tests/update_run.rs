use std::sync::Once;

use capture_core::{
    update, Effect, Msg, PageKey, PageSource, RunOptions, RunPhase, RunState, WorkRecord,
    YearConfig, YearStop,
};
use pretty_assertions::assert_eq;

fn init_logging() {
    static INIT: Once = Once::new();
    INIT.call_once(capture_logging::initialize_for_tests);
}

fn year(year: u32, start_page: u32, end_page: u32) -> YearConfig {
    YearConfig {
        year,
        list_url: format!("https://example.org/{year}?page="),
        start_page,
        end_page,
    }
}

fn record(year: u32, id: u32) -> WorkRecord {
    WorkRecord {
        year,
        title: format!("Work {id}"),
        author: "someone".into(),
        fandom: "Original Work".into(),
        date_updated: "01 Jan 2020".into(),
        language: "English".into(),
        word_count: "1,000".into(),
        chapter_count: "1/1".into(),
        collection_count: "0".into(),
        comment_count: "0".into(),
        kudos_count: "3".into(),
        bookmark_count: "0".into(),
        hit_count: "42".into(),
        canonical_url: format!("https://archiveofourown.org/works/{id}"),
    }
}

fn extracted(key: PageKey, source: PageSource, has_next: bool) -> Msg {
    Msg::PageExtracted {
        key,
        source,
        records: vec![record(key.year, key.year * 100 + key.page)],
        has_next,
    }
}

#[test]
fn start_enters_first_year_and_visits_start_page() {
    init_logging();
    let state = RunState::new(vec![year(2011, 3, 10)], RunOptions::default());
    let (state, effects) = update(state, Msg::Start);

    assert_eq!(state.phase(), RunPhase::Running);
    assert_eq!(
        effects,
        vec![
            Effect::YearStarted {
                year: 2011,
                first_page: 3,
                last_page: 10
            },
            Effect::VisitPage {
                key: PageKey::new(2011, 3),
                url: "https://example.org/2011?page=3".into(),
            },
        ]
    );
    assert_eq!(state.in_flight(), Some(PageKey::new(2011, 3)));
}

#[test]
fn empty_configuration_finishes_immediately() {
    let (state, effects) = update(RunState::new(Vec::new(), RunOptions::default()), Msg::Start);
    assert_eq!(state.phase(), RunPhase::Finished);
    assert_eq!(effects, vec![Effect::Finish]);
}

#[test]
fn missing_next_control_stops_year_before_end_page() {
    init_logging();
    let state = RunState::new(vec![year(2012, 1, 100), year(2013, 1, 2)], RunOptions::default());
    let (state, _) = update(state, Msg::Start);

    let (state, effects) = update(state, extracted(PageKey::new(2012, 1), PageSource::Checkpoint, false));
    assert_eq!(
        effects,
        vec![
            Effect::YearFinished {
                year: 2012,
                stop: YearStop::LastPage
            },
            Effect::YearStarted {
                year: 2013,
                first_page: 1,
                last_page: 2
            },
            Effect::VisitPage {
                key: PageKey::new(2013, 1),
                url: "https://example.org/2013?page=1".into(),
            },
        ]
    );
    assert_eq!(state.summary().years[0].last_page, Some(1));
}

#[test]
fn live_pages_throttle_and_cached_pages_do_not() {
    let state = RunState::new(vec![year(2014, 1, 3)], RunOptions::default());
    let (state, _) = update(state, Msg::Start);

    let (state, effects) = update(state, extracted(PageKey::new(2014, 1), PageSource::Checkpoint, true));
    assert!(!effects.contains(&Effect::Throttle));

    let (state, effects) = update(state, extracted(PageKey::new(2014, 2), PageSource::Live, true));
    assert_eq!(effects[0], Effect::Throttle);
    assert_eq!(state.live_fetches(), 1);
    assert_eq!(state.summary().pages_from_checkpoint, 1);
    assert_eq!(state.summary().pages_fetched, 1);
}

#[test]
fn end_of_range_finishes_run() {
    let state = RunState::new(vec![year(2015, 1, 2)], RunOptions::default());
    let (state, _) = update(state, Msg::Start);
    let (state, _) = update(state, extracted(PageKey::new(2015, 1), PageSource::Live, true));
    let (state, effects) = update(state, extracted(PageKey::new(2015, 2), PageSource::Live, true));

    assert_eq!(
        effects,
        vec![
            Effect::Throttle,
            Effect::YearFinished {
                year: 2015,
                stop: YearStop::EndOfRange
            },
            Effect::Finish,
        ]
    );
    assert_eq!(state.phase(), RunPhase::Finished);
    let (records, summary) = state.into_parts();
    assert_eq!(records.len(), 2);
    assert_eq!(summary.records, 2);
}

#[test]
fn session_recycles_on_cadence_of_live_fetches() {
    let options = RunOptions {
        page_limit: None,
        recycle_every: 2,
    };
    let state = RunState::new(vec![year(2016, 1, 10)], options);
    let (mut state, _) = update(state, Msg::Start);

    let mut recycled_after = Vec::new();
    for page in 1..=5 {
        let (next, effects) = update(state, extracted(PageKey::new(2016, page), PageSource::Live, true));
        if effects.contains(&Effect::RecycleSession) {
            recycled_after.push(page);
        }
        state = next;
    }
    assert_eq!(recycled_after, vec![2, 4]);
}

#[test]
fn fetch_failure_stops_only_the_current_year() {
    let state = RunState::new(vec![year(2017, 1, 5), year(2018, 1, 5)], RunOptions::default());
    let (state, _) = update(state, Msg::Start);
    let (state, _) = update(state, extracted(PageKey::new(2017, 1), PageSource::Live, true));
    let (state, effects) = update(
        state,
        Msg::PageFailed {
            key: PageKey::new(2017, 2),
            stop: YearStop::RenderTimeout,
        },
    );

    assert_eq!(
        effects[0],
        Effect::YearFinished {
            year: 2017,
            stop: YearStop::RenderTimeout
        }
    );
    assert!(matches!(effects.last(), Some(Effect::VisitPage { key, .. }) if *key == PageKey::new(2018, 1)));

    let failed: Vec<_> = state.summary().failed_years().map(|o| (o.year, o.last_page)).collect();
    assert_eq!(failed, vec![(2017, Some(1))]);
}

#[test]
fn page_limit_caps_each_year() {
    let options = RunOptions {
        page_limit: Some(2),
        ..RunOptions::default()
    };
    let state = RunState::new(vec![year(2019, 1, 400)], options);
    let (state, effects) = update(state, Msg::Start);
    assert_eq!(
        effects[0],
        Effect::YearStarted {
            year: 2019,
            first_page: 1,
            last_page: 2
        }
    );
    let (state, _) = update(state, extracted(PageKey::new(2019, 1), PageSource::Live, true));
    let (state, effects) = update(state, extracted(PageKey::new(2019, 2), PageSource::Live, true));
    assert!(effects.contains(&Effect::Finish));
    assert_eq!(state.phase(), RunPhase::Finished);
}

#[test]
fn empty_range_years_are_skipped() {
    let state = RunState::new(vec![year(2020, 9, 3), year(2021, 1, 1)], RunOptions::default());
    let (state, effects) = update(state, Msg::Start);

    assert_eq!(
        effects[1],
        Effect::YearFinished {
            year: 2020,
            stop: YearStop::EmptyRange
        }
    );
    assert_eq!(state.in_flight(), Some(PageKey::new(2021, 1)));
}

#[test]
fn stale_and_late_messages_are_ignored() {
    let state = RunState::new(vec![year(2022, 1, 1)], RunOptions::default());
    let (state, _) = update(state, Msg::Start);

    let (state, effects) = update(state, extracted(PageKey::new(2022, 7), PageSource::Live, true));
    assert!(effects.is_empty());
    assert!(state.records().is_empty());

    let (state, _) = update(state, extracted(PageKey::new(2022, 1), PageSource::Live, false));
    assert_eq!(state.phase(), RunPhase::Finished);

    let (state, effects) = update(state, Msg::Start);
    assert!(effects.is_empty());
    let (_state, effects) = update(
        state,
        Msg::PageFailed {
            key: PageKey::new(2022, 1),
            stop: YearStop::FetchExhausted,
        },
    );
    assert!(effects.is_empty());
}
