mod common;

use std::fs;

use common::{data_lines, paged, quick_config, row, tmp_path, FakeSource, Script};
use liftscrape::config::OutputSchema;
use liftscrape::process::run;
use liftscrape::Error;

const RANKED_HEADER: &str = "id,event_id,meet,date,name,age,body_weight,snatch1,snatch2,snatch3,snatch_best,cj1,cj2,cj3,cj_best,total";

#[tokio::test]
async fn inverted_range_writes_header_only() {
    let out = tmp_path("inverted");
    let mut source = FakeSource::default().with(5, paged(5, 1, 2));

    let ctx = run(&quick_config(3, 5, out.clone()), &mut source).await.unwrap();

    assert!(ctx.events.is_empty());
    assert!(source.resolved.is_empty());
    assert_eq!(fs::read_to_string(&out).unwrap(), format!("{RANKED_HEADER}\n"));
}

#[tokio::test]
async fn one_bad_id_leaves_the_other_four() {
    let out = tmp_path("isolation");
    let mut source = FakeSource::default()
        .with(105, paged(105, 1, 1))
        .with(104, paged(104, 2, 1))
        .with(103, Script::NavFail)
        .with(102, paged(102, 1, 2))
        .with(101, paged(101, 1, 1));

    let ctx = run(&quick_config(105, 101, out.clone()), &mut source).await.unwrap();

    let ids: Vec<u32> = ctx.events.iter().map(|e| e.id).collect();
    assert_eq!(ids, vec![105, 104, 102, 101]);
    assert_eq!(ctx.report.failed, 1);
    assert_eq!(ctx.report.visited, 5);
    assert_eq!(source.resolved, vec![105, 104, 103, 102, 101]);

    let event_ids: Vec<String> = data_lines(&out)
        .iter()
        .map(|l| l.split(',').nth(1).unwrap().to_string())
        .collect();
    assert_eq!(event_ids, vec!["105", "104", "104", "102", "102", "101"]);
}

#[tokio::test]
async fn multi_page_event_keeps_page_then_row_order() {
    let out = tmp_path("pages");
    let mut source = FakeSource::default().with(7, paged(7, 3, 2));

    let ctx = run(&quick_config(7, 7, out.clone()), &mut source).await.unwrap();

    let names: Vec<&str> = ctx.events[0].records.iter().map(|r| r.name.as_str()).collect();
    assert_eq!(
        names,
        vec!["e7p0r0", "e7p0r1", "e7p1r0", "e7p1r1", "e7p2r0", "e7p2r1"]
    );
    assert_eq!(ctx.events[0].name, "Meet 7");
    assert_eq!(data_lines(&out).len(), 6);
}

#[tokio::test]
async fn empty_and_unready_events_are_skipped() {
    let out = tmp_path("skips");
    let mut source = FakeSource::default()
        .with(3, Script::Pages(vec![]))
        .with(2, Script::NeverReady)
        .with(1, paged(1, 1, 1));

    let ctx = run(&quick_config(3, 1, out.clone()), &mut source).await.unwrap();

    assert_eq!(ctx.events.len(), 1);
    assert_eq!(ctx.events[0].id, 1);
    assert_eq!(ctx.report.skipped, 2);
    assert_eq!(ctx.report.failed, 0);
}

#[tokio::test]
async fn ready_event_without_rows_is_skipped() {
    let out = tmp_path("ready_empty");
    let mut source = FakeSource::default().with(1, Script::ReadyButEmpty);

    let ctx = run(&quick_config(1, 1, out.clone()), &mut source).await.unwrap();

    assert!(ctx.events.is_empty());
    assert_eq!(ctx.report.skipped, 1);
    assert_eq!(ctx.report.failed, 0);
    // only the up-front snapshot
    assert_eq!(ctx.report.checkpoints, 1);
    assert!(data_lines(&out).is_empty());
}

#[tokio::test]
async fn stalls_and_hangs_fail_only_their_own_id() {
    let out = tmp_path("timeouts");
    let mut source = FakeSource::default()
        .with(4, Script::Hang)
        .with(3, Script::StallOnAdvance(vec![row("Stalled", "1")]))
        .with(2, Script::EndlessNext(vec![row("Looping", "1")]))
        .with(1, paged(1, 1, 1));

    let ctx = run(&quick_config(4, 1, out.clone()), &mut source).await.unwrap();

    let ids: Vec<u32> = ctx.events.iter().map(|e| e.id).collect();
    assert_eq!(ids, vec![2, 1]);
    assert_eq!(ctx.report.failed, 2);
    // capped at max_pages
    assert_eq!(ctx.events[0].records.len(), 20);
}

#[tokio::test]
async fn row_ids_are_contiguous_from_base() {
    let out = tmp_path("row_ids");
    let mut source = FakeSource::default()
        .with(9, paged(9, 1, 2))
        .with(8, paged(8, 2, 1))
        .with(7, paged(7, 1, 3));

    let ctx = run(&quick_config(9, 7, out.clone()), &mut source).await.unwrap();

    let ids: Vec<u64> = data_lines(&out)
        .iter()
        .map(|l| l.split(',').next().unwrap().parse().unwrap())
        .collect();
    assert_eq!(ids, (312270..312277).collect::<Vec<u64>>());
    assert_eq!(ctx.report.rows_written, 7);
    // one up-front snapshot plus one per event
    assert_eq!(ctx.report.checkpoints, 4);
}

#[tokio::test]
async fn legacy_schema_drops_ids() {
    let out = tmp_path("legacy");
    let mut source = FakeSource::default().with(1, paged(1, 1, 1));
    let config = quick_config(1, 1, out.clone()).with_schema(OutputSchema::Legacy);

    run(&config, &mut source).await.unwrap();

    let text = fs::read_to_string(&out).unwrap();
    let mut lines = text.lines();
    assert_eq!(
        lines.next().unwrap(),
        "meet,date,lifter,age,bodyWeight,snatch1,snatch2,snatch3,snatch,cj1,cj2,cj3,cj,total"
    );
    assert_eq!(
        lines.next().unwrap(),
        "BKTH March Closed Meet,03/01/2025,e1p0r0,Open Men's 109kg,1,1,1,1,1,1,1,1,1,100"
    );
}

#[tokio::test]
async fn unwritable_sink_aborts_the_run() {
    let dir = tmp_path("unwritable");
    // parent of the checkpoint is a regular file
    let blocker = dir.with_file_name("blocker");
    fs::write(&blocker, "not a directory").unwrap();
    let out = blocker.join("results.csv");
    let mut source = FakeSource::default().with(1, paged(1, 1, 1));

    let err = run(&quick_config(1, 1, out), &mut source).await.unwrap_err();

    assert!(err.is_fatal());
    assert!(matches!(err, Error::Checkpoint { .. }));
}

#[tokio::test]
async fn resume_continues_below_checkpointed_events() {
    let out = tmp_path("resume");
    let mut first = FakeSource::default()
        .with(10, paged(10, 1, 1))
        .with(9, paged(9, 1, 2));
    run(&quick_config(10, 9, out.clone()), &mut first).await.unwrap();

    let mut second = FakeSource::default()
        .with(8, paged(8, 1, 1))
        .with(7, paged(7, 1, 1));
    let mut config = quick_config(10, 7, out.clone());
    config.resume = true;
    let ctx = run(&config, &mut second).await.unwrap();

    assert_eq!(second.resolved, vec![8, 7]);
    let ids: Vec<u32> = ctx.events.iter().map(|e| e.id).collect();
    assert_eq!(ids, vec![10, 9, 8, 7]);
    assert_eq!(data_lines(&out).len(), 5);
}

#[tokio::test]
async fn resume_fills_ids_above_and_below_the_checkpoint() {
    let out = tmp_path("resume_gaps");
    let mut first = FakeSource::default()
        .with(5, paged(5, 1, 1))
        .with(4, paged(4, 1, 1))
        .with(3, paged(3, 1, 1));
    run(&quick_config(5, 3, out.clone()), &mut first).await.unwrap();

    let mut second = (1..=10).fold(FakeSource::default(), |s, id| s.with(id, paged(id, 1, 1)));
    let mut config = quick_config(10, 1, out.clone());
    config.resume = true;
    let ctx = run(&config, &mut second).await.unwrap();

    assert_eq!(second.resolved, vec![10, 9, 8, 7, 6, 2, 1]);
    let mut ids: Vec<u32> = ctx.events.iter().map(|e| e.id).collect();
    ids.sort_unstable();
    assert_eq!(ids, (1..=10).collect::<Vec<u32>>());
    assert_eq!(ctx.report.visited, 7);
    assert_eq!(data_lines(&out).len(), 10);
}
