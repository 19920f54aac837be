use crate::{
    Effect, Msg, PageKey, PageSource, RunPhase, RunState, YearOutcome, YearStop,
};

/// Pure update function: applies a message to the run state and returns the
/// effects the driver must execute, in order.
pub fn update(mut state: RunState, msg: Msg) -> (RunState, Vec<Effect>) {
    let effects = match msg {
        Msg::Start => {
            if state.phase != RunPhase::Idle {
                return (state, Vec::new());
            }
            state.phase = RunPhase::Running;
            enter_year(&mut state, 0)
        }
        Msg::PageExtracted {
            key,
            source,
            records,
            has_next,
        } => {
            if state.phase != RunPhase::Running || state.in_flight != Some(key) {
                return (state, Vec::new());
            }
            state.record_page(source, records);

            let mut effects = Vec::new();
            if source == PageSource::Live {
                effects.push(Effect::Throttle);
                if state.recycle_due() {
                    effects.push(Effect::RecycleSession);
                }
            }

            // A missing "next" control wins over the configured range.
            if !has_next {
                effects.extend(finish_year(&mut state, YearStop::LastPage));
            } else if key.page >= state.last_page {
                effects.extend(finish_year(&mut state, YearStop::EndOfRange));
            } else {
                effects.push(visit(&mut state, key.page + 1));
            }
            effects
        }
        Msg::PageFailed { key, stop } => {
            if state.phase != RunPhase::Running || state.in_flight != Some(key) {
                return (state, Vec::new());
            }
            finish_year(&mut state, stop)
        }
    };

    (state, effects)
}

fn enter_year(state: &mut RunState, mut index: usize) -> Vec<Effect> {
    let mut effects = Vec::new();
    loop {
        state.year_index = index;
        let Some(config) = state.years.get(index) else {
            state.phase = RunPhase::Finished;
            state.in_flight = None;
            effects.push(Effect::Finish);
            return effects;
        };

        let year = config.year;
        let first_page = config.start_page.max(1);
        let last_page = config.last_page(state.options.page_limit);
        effects.push(Effect::YearStarted {
            year,
            first_page,
            last_page,
        });

        if first_page > last_page {
            state.summary.years.push(YearOutcome {
                year,
                stop: YearStop::EmptyRange,
                last_page: None,
                records: 0,
            });
            effects.push(Effect::YearFinished {
                year,
                stop: YearStop::EmptyRange,
            });
            index += 1;
            continue;
        }

        state.first_page = first_page;
        state.last_page = last_page;
        state.year_records = 0;
        effects.push(visit(state, first_page));
        return effects;
    }
}

fn visit(state: &mut RunState, page: u32) -> Effect {
    let config = &state.years[state.year_index];
    let key = PageKey::new(config.year, page);
    let url = config.page_url(page);
    state.in_flight = Some(key);
    Effect::VisitPage { key, url }
}

fn finish_year(state: &mut RunState, stop: YearStop) -> Vec<Effect> {
    let year = state.years[state.year_index].year;
    let last_page = state.in_flight.and_then(|key| {
        if stop.is_failure() {
            (key.page > state.first_page).then(|| key.page - 1)
        } else {
            Some(key.page)
        }
    });
    state.summary.years.push(YearOutcome {
        year,
        stop,
        last_page,
        records: state.year_records,
    });
    state.in_flight = None;

    let mut effects = vec![Effect::YearFinished { year, stop }];
    let next = state.year_index + 1;
    effects.extend(enter_year(state, next));
    effects
}
