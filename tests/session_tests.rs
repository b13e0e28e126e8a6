mod common;

use common::{CatalogState, ScriptedMonitor, StubCatalog, session, session_with};
use iaseek::app::{Command, Flow, NoticeLevel, Session, SessionSettings, View};
use iaseek::core::model::FileRecord;
use std::error;
use std::rc::Rc;

fn run(session: &mut Session, cmd: Command) -> Flow {
    session.dispatch(cmd, &mut ScriptedMonitor::default())
}

fn identifiers(session: &Session) -> Vec<String> {
    session
        .results_window()
        .items()
        .iter()
        .map(|r| r.identifier().to_string())
        .collect()
}

#[test]
fn pages_through_remote_results_and_stops_at_the_end() -> Result<(), Box<dyn error::Error>> {
    let state = Rc::new(CatalogState::default());
    let mut s = session(state.clone())?;

    assert_eq!(s.remote_pages(), 3);
    assert_eq!(s.results_window().len(), 10);

    run(&mut s, Command::Next);
    run(&mut s, Command::Next);
    assert_eq!(s.query().page(), 3);
    assert_eq!(s.results_window().len(), 5);
    assert_eq!(identifiers(&s)[0], "distro-21-src");

    let searches = state.searches.get();
    run(&mut s, Command::Next);
    assert_eq!(s.query().page(), 3);
    assert_eq!(state.searches.get(), searches, "next on the last page must not fetch");

    run(&mut s, Command::Prev);
    assert_eq!(s.query().page(), 2);
    assert_eq!(identifiers(&s)[0], "distro-11-src");
    Ok(())
}

#[test]
fn filter_is_local_to_the_fetched_page() -> Result<(), Box<dyn error::Error>> {
    let state = Rc::new(CatalogState::default());
    let mut s = session(state.clone())?;
    let searches = state.searches.get();

    run(&mut s, Command::Filter(Some("ISO".into())));
    assert_eq!(state.searches.get(), searches);
    assert_eq!(s.active_filter(), Some("iso"));
    assert_eq!(
        identifiers(&s),
        ["distro-2-iso", "distro-4-iso", "distro-6-iso", "distro-8-iso", "distro-10-iso"]
    );

    run(&mut s, Command::Filter(Some("nothing-like-this".into())));
    assert!(s.results_window().is_empty());

    run(&mut s, Command::Filter(None));
    assert_eq!(s.results_window().len(), 10);
    Ok(())
}

#[test]
fn selection_maps_through_the_filtered_window() -> Result<(), Box<dyn error::Error>> {
    let state = Rc::new(CatalogState::default());
    let mut s = session(state)?;

    run(&mut s, Command::Filter(Some("iso".into())));
    run(&mut s, Command::Select(2));

    let View::ItemFiles(ctx) = s.view() else {
        return Err("expected the files view".into());
    };
    assert_eq!(ctx.meta().identifier, "distro-4-iso");
    assert_eq!(ctx.files().backing().len(), 4);
    Ok(())
}

#[test]
fn out_of_range_selection_is_reported_without_moving() -> Result<(), Box<dyn error::Error>> {
    let state = Rc::new(CatalogState::default());
    let mut s = session(state.clone())?;

    run(&mut s, Command::Select(11));
    assert!(matches!(s.view(), View::Results));
    assert_eq!(state.details.get(), 0);

    let notices = s.take_notices();
    assert_eq!(notices.len(), 1);
    assert_eq!(notices[0].level(), NoticeLevel::Warn);
    Ok(())
}

#[test]
fn back_returns_to_unchanged_results() -> Result<(), Box<dyn error::Error>> {
    let state = Rc::new(CatalogState::default());
    let mut s = session(state.clone())?;

    run(&mut s, Command::Next);
    run(&mut s, Command::Filter(Some("iso".into())));
    let before = identifiers(&s);
    let searches = state.searches.get();

    run(&mut s, Command::Select(1));
    run(&mut s, Command::Filter(Some("disc".into())));
    run(&mut s, Command::Back);

    assert!(matches!(s.view(), View::Results));
    assert_eq!(s.query().page(), 2);
    assert_eq!(s.active_filter(), Some("iso"));
    assert_eq!(identifiers(&s), before);
    assert_eq!(state.searches.get(), searches, "back must not re-fetch");
    Ok(())
}

#[test]
fn failed_fetch_keeps_page_filter_and_data() -> Result<(), Box<dyn error::Error>> {
    let state = Rc::new(CatalogState::default());
    let mut s = session(state.clone())?;
    run(&mut s, Command::Filter(Some("iso".into())));
    let before = identifiers(&s);

    state.fail.set(true);
    assert_eq!(run(&mut s, Command::Next), Flow::Continue);
    assert_eq!(s.query().page(), 1);
    assert_eq!(s.active_filter(), Some("iso"));
    assert_eq!(identifiers(&s), before);

    run(&mut s, Command::Select(1));
    assert!(matches!(s.view(), View::Results));

    let notices = s.take_notices();
    assert_eq!(notices.len(), 2);
    assert!(notices.iter().all(|n| n.level() == NoticeLevel::Error));

    // Retrying the same command works once the catalog recovers.
    state.fail.set(false);
    run(&mut s, Command::Next);
    assert_eq!(s.query().page(), 2);
    Ok(())
}

#[test]
fn reset_refetches_the_first_page_without_filter() -> Result<(), Box<dyn error::Error>> {
    let state = Rc::new(CatalogState::default());
    let mut s = session(state)?;

    run(&mut s, Command::Next);
    run(&mut s, Command::Filter(Some("iso".into())));
    run(&mut s, Command::Reset);

    assert_eq!(s.query().page(), 1);
    assert_eq!(s.active_filter(), None);
    assert_eq!(identifiers(&s)[0], "distro-1-src");
    Ok(())
}

#[test]
fn search_replaces_the_query_and_starts_on_page_one() -> Result<(), Box<dyn error::Error>> {
    let state = Rc::new(CatalogState::default());
    let mut s = session(state.clone())?;
    run(&mut s, Command::Next);

    let searches = state.searches.get();
    run(&mut s, Command::Search("   ".into()));
    assert_eq!(state.searches.get(), searches, "blank search is ignored");

    run(&mut s, Command::Search("gentoo".into()));
    assert_eq!(s.query().query(), "gentoo");
    assert_eq!(s.query().page(), 1);
    Ok(())
}

#[test]
fn file_paging_and_filter_stay_local() -> Result<(), Box<dyn error::Error>> {
    let state = Rc::new(CatalogState::default());
    let files = (1..=45).map(|i| FileRecord::new(format!("track{:02}.flac", i))).collect();
    let catalog = StubCatalog::new(3, state.clone()).with_files(files);
    let mut s = session_with(catalog, SessionSettings::default())?;

    run(&mut s, Command::Select(1));
    let fetches = (state.searches.get(), state.details.get());

    let window = s.files_window().ok_or("no files window")?;
    assert_eq!((window.page(), window.total_pages(), window.len()), (1, 3, 20));

    run(&mut s, Command::Next);
    run(&mut s, Command::Next);
    run(&mut s, Command::Next);
    let window = s.files_window().ok_or("no files window")?;
    assert_eq!((window.page(), window.len()), (3, 5));

    run(&mut s, Command::Filter(Some("track4".into())));
    let window = s.files_window().ok_or("no files window")?;
    assert_eq!((window.page(), window.len()), (1, 6));

    assert_eq!((state.searches.get(), state.details.get()), fetches);
    Ok(())
}

#[test]
fn extension_restriction_applies_to_every_item() -> Result<(), Box<dyn error::Error>> {
    let state = Rc::new(CatalogState::default());
    let settings = SessionSettings {
        ext_filter: Some(".ISO".into()),
        ..SessionSettings::default()
    };
    let mut s = session_with(StubCatalog::new(3, state), settings)?;

    run(&mut s, Command::Select(1));
    let View::ItemFiles(ctx) = s.view() else {
        return Err("expected the files view".into());
    };
    let names: Vec<&str> = ctx.files().backing().iter().map(|f| f.name()).collect();
    assert_eq!(names, ["disc1.iso", "disc2.iso"]);
    assert_eq!(ctx.unrestricted_len(), 4);
    Ok(())
}

#[test]
fn file_actions_route_and_return_to_files() -> Result<(), Box<dyn error::Error>> {
    let state = Rc::new(CatalogState::default());
    let mut s = session(state)?;

    run(&mut s, Command::Select(1));
    run(&mut s, Command::Select(1));
    let View::FileAction(_, info) = s.view() else {
        return Err("expected the file action view".into());
    };
    assert_eq!(info.name(), "disc1.iso");
    assert_eq!(info.digest().map(|(_, d)| d), Some("aaaa"));

    // Not a file action: reported, view kept.
    run(&mut s, Command::Next);
    assert!(matches!(s.view(), View::FileAction(..)));
    s.take_notices();

    // Dry run downloads report and go back to the file list.
    run(&mut s, Command::Download);
    assert!(matches!(s.view(), View::ItemFiles(_)));
    let notices = s.take_notices();
    assert!(notices[0].text().starts_with("Dry run"));

    run(&mut s, Command::Select(1));
    run(&mut s, Command::Hash);
    assert!(matches!(s.view(), View::ItemFiles(_)));
    let notices = s.take_notices();
    assert!(notices.iter().any(|n| n.text().contains("ubuntu-22.04-desktop-amd64.iso")));

    run(&mut s, Command::Select(1));
    assert_eq!(run(&mut s, Command::Quit), Flow::Quit);
    Ok(())
}

#[test]
fn raw_json_mode_hands_over_the_payload_and_stays_on_results() -> Result<(), Box<dyn error::Error>>
{
    let state = Rc::new(CatalogState::default());
    let settings = SessionSettings {
        raw_json: true,
        ..SessionSettings::default()
    };
    let mut s = session_with(StubCatalog::new(25, state.clone()), settings)?;
    let first = identifiers(&s)[0].clone();

    run(&mut s, Command::Select(1));
    assert!(matches!(s.view(), View::Results));
    assert_eq!(state.details.get(), 1);

    let raw = s.take_raw_detail().ok_or("no raw detail")?;
    assert_eq!(raw.identifier, first);
    assert!(raw.text.contains(&format!("\"identifier\": \"{}\"", first)));
    assert!(raw.text.contains("disc1.iso"));
    assert!(raw.text.lines().count() > 3, "payload must be pretty-printed");
    assert!(s.take_raw_detail().is_none());

    state.fail.set(true);
    run(&mut s, Command::Select(2));
    assert!(matches!(s.view(), View::Results));
    assert!(s.take_raw_detail().is_none());
    let notices = s.take_notices();
    assert_eq!(notices.len(), 1);
    assert_eq!(notices[0].level(), NoticeLevel::Error);
    assert!(notices[0].text().starts_with("Could not load"));
    Ok(())
}
