//! End-to-end behaviour of the two machines on small built games
//!
//! Each test builds its game in memory with `GameBuilder`, boots an engine
//! on a headless host and drives it through the public API.

use agos::builder::{GameBuilder, ScriptBuilder, ZoneBuilder};
use agos::config::GameVariant;
use agos::item::{ObjectFlags, PLAYER_ITEM};
use agos::opcode_tables::ScriptOp;
use agos::sprite::SpriteTable;
use test_log::test;

fn line() -> ScriptBuilder {
    ScriptBuilder::new(GameVariant::Simon1)
}

/// Big-endian word stream as the Simon 1 zone scripts use it
fn words(ws: &[i32]) -> Vec<u8> {
    ws.iter().flat_map(|w| (*w as u16).to_be_bytes()).collect()
}

#[test]
fn oversized_item_is_not_placed() {
    let mut b = GameBuilder::new(GameVariant::Simon1);
    let room = b.room(0);
    let boxed = b.container(room, 20, 10);
    let crate_item = b.object(room, 21, -1, ObjectFlags::SIZE);
    b.prop(crate_item, ObjectFlags::SIZE, 12);
    b.player_in(room);
    let mut engine = b.engine();

    let code = line()
        .op(ScriptOp::Place, &[crate_item as i16, boxed as i16])
        .op(ScriptOp::CanPut, &[crate_item as i16, boxed as i16, 5])
        .build();
    engine.run_line(&code).unwrap();

    assert_eq!(engine.items.get(crate_item).unwrap().parent, room);
    assert!(!engine.items.children(boxed).contains(&crate_item));
    assert_eq!(engine.vm.variables[5], -1);
}

#[test]
fn item_that_fits_is_placed() {
    let mut b = GameBuilder::new(GameVariant::Simon1);
    let room = b.room(0);
    let boxed = b.container(room, 20, 10);
    let coin = b.object(room, 22, -1, ObjectFlags::SIZE);
    b.prop(coin, ObjectFlags::SIZE, 2);
    let mut engine = b.engine();

    let code = line()
        .op(ScriptOp::Place, &[coin as i16, boxed as i16])
        .build();
    engine.run_line(&code).unwrap();
    assert_eq!(engine.items.get(coin).unwrap().parent, boxed);
    assert_eq!(engine.items.children(boxed), vec![coin]);
}

#[test]
fn matching_verb_lines_run_until_one_returns() {
    let mut b = GameBuilder::new(GameVariant::Simon1);
    b.verb_line(5, -1, -1, line().op(ScriptOp::Let, &[1, 1]).build());
    b.verb_line(6, -1, -1, line().op(ScriptOp::Let, &[3, 1]).build());
    b.verb_line(-2, -2, -2, line().op(ScriptOp::Let, &[2, 1]).build());
    let mut engine = b.engine();
    engine.handle_verb_clicked(5).unwrap();
    assert_eq!(engine.vm.variables[1..4], [1, 1, 0]);

    let mut b = GameBuilder::new(GameVariant::Simon1);
    b.verb_line(
        5,
        -1,
        -1,
        line()
            .op(ScriptOp::Let, &[1, 1])
            .op(ScriptOp::End, &[])
            .build(),
    );
    b.verb_line(-2, -2, -2, line().op(ScriptOp::Let, &[2, 1]).build());
    let mut engine = b.engine();
    engine.handle_verb_clicked(5).unwrap();
    assert_eq!(engine.vm.variables[1..3], [1, 0]);
}

#[test]
fn unmatched_verb_says_so() {
    let mut b = GameBuilder::new(GameVariant::Simon1);
    b.verb_line(5, -1, -1, line().op(ScriptOp::Done, &[]).build());
    let (mut engine, host, _) = b.engine_with_handles();
    engine.handle_verb_clicked(5).unwrap();
    assert_eq!(host.output(), vec!["I don't understand".to_string()]);
}

#[test]
fn time_events_fire_in_timeout_order() {
    let mut b = GameBuilder::new(GameVariant::Simon1);
    // each event appends its own number to v1 as a decimal digit string
    for id in [3i16, 7, 10] {
        let mut code = line()
            .op(ScriptOp::Mul, &[1, 10])
            .op(ScriptOp::Add, &[1, id]);
        if id == 3 {
            code = code.op(ScriptOp::When, &[0, 20]);
        }
        b.subroutine(id as u16, &[code.build()]);
    }
    b.subroutine(20, &[line().op(ScriptOp::Inc, &[2]).build()]);
    let (mut engine, host, _) = b.engine_with_handles();

    for timeout in [10, 3, 7] {
        engine.add_time_event(timeout, timeout as u16);
    }
    host.advance(4_000);
    assert!(engine.kickoff_time_events().unwrap());
    // the zero-timeout event queued by event 3 ran in the same pass
    assert_eq!(engine.vm.variables[1..3], [3, 1]);

    host.advance(7_000);
    engine.kickoff_time_events().unwrap();
    assert_eq!(engine.vm.variables[1], 3 * 100 + 7 * 10 + 10);
    assert!(engine.time_events.is_empty());
}

#[test]
fn paused_clock_holds_time_events() {
    let mut b = GameBuilder::new(GameVariant::Simon1);
    b.subroutine(9, &[line().op(ScriptOp::Let, &[1, 1]).build()]);
    let (mut engine, host, _) = b.engine_with_handles();
    engine.add_time_event(2, 9);
    engine.paused = true;
    for _ in 0..3 {
        host.advance(1_000);
        engine.step().unwrap();
    }
    assert_eq!(engine.vm.variables[1], 0);
    engine.paused = false;
    host.advance(1_000);
    engine.step().unwrap();
    assert_eq!(engine.vm.variables[1], 0);
    host.advance(1_000);
    engine.step().unwrap();
    assert_eq!(engine.vm.variables[1], 1);
}

#[test]
fn sprite_started_mid_pass_runs_in_that_pass() {
    let mut zone = ZoneBuilder::new(1, false);
    zone.animation(101, &words(&[3, 0, 102, 0, 0, 0, 0]));
    zone.animation(102, &words(&[39, 5, 7, 0]));
    let mut b = GameBuilder::new(GameVariant::Simon1);
    b.zone(zone);
    let mut engine = b.engine();

    engine.start_vga_code(0, 1, 101, 0, 0, 0).unwrap();
    engine.expire_vga_timers().unwrap();
    assert_eq!(engine.vm.variables[5], 7);
    assert!(engine.vga.sprites.contains(102, 1));
    assert!(engine.vga.timers.is_empty());
}

#[test]
fn equal_priorities_keep_insertion_order() {
    let mut table = SpriteTable::new(true);
    for id in 1..=4 {
        table.add(id, 1, 0, 0, 0, 0);
    }
    for (id, priority) in [(1, 5), (2, 5), (3, 3), (4, 5)] {
        table.set_priority(id, 1, priority);
    }
    let order = |t: &SpriteTable| t.iter().map(|s| s.id).collect::<Vec<u16>>();
    assert_eq!(order(&table), vec![3, 1, 2, 4]);

    table.set_priority(2, 1, 5);
    table.set_priority(4, 1, 5);
    assert_eq!(order(&table), vec![3, 1, 2, 4]);

    table.set_priority(3, 1, 5);
    assert_eq!(order(&table), vec![1, 2, 3, 4]);
}

#[test]
fn subroutines_page_in_from_table_files() {
    let mut b = GameBuilder::new(GameVariant::Simon1);
    b.table_file(1, &[(40, vec![line().op(ScriptOp::Let, &[1, 4]).build()])]);
    b.table_file(2, &[(50, vec![line().op(ScriptOp::Let, &[2, 5]).build()])]);
    b.subroutine(
        1,
        &[line()
            .op(ScriptOp::Process, &[40])
            .op(ScriptOp::Process, &[50])
            .build()],
    );
    let mut engine = b.engine();
    engine.start_subroutine_by_id(1).unwrap();
    assert_eq!(engine.vm.variables[1..3], [4, 5]);
    let resident: Vec<u16> = engine.pager.subroutines().iter().map(|s| s.id).collect();
    assert!(resident.contains(&50));
    assert!(!resident.contains(&40));
}

#[test]
fn save_and_load_restore_the_world() {
    let dir = std::env::temp_dir().join(format!("agos-scenario-{}", std::process::id()));
    std::fs::create_dir_all(&dir).unwrap();
    let build = |dir: &std::path::Path| {
        let mut b = GameBuilder::new(GameVariant::Simon2);
        let hall = b.room(0);
        let attic = b.room(0);
        b.object(hall, 3, -1, ObjectFlags::empty());
        b.player_in(hall);
        b.save_dir(dir);
        (b.engine(), hall, attic)
    };

    let (mut engine, hall, attic) = build(&dir);
    engine.items.set_item_parent(PLAYER_ITEM, attic).unwrap();
    engine.vm.variables[30] = 1234;
    engine.add_time_event(60, 7);
    engine.save_game(2, "in the attic").unwrap();

    let (mut fresh, _, _) = build(&dir);
    assert_eq!(fresh.items.get(PLAYER_ITEM).unwrap().parent, hall);
    assert!(fresh.load_game(2).unwrap());
    assert_eq!(fresh.items.get(PLAYER_ITEM).unwrap().parent, attic);
    assert!(fresh.items.children(attic).contains(&PLAYER_ITEM));
    assert!(!fresh.items.children(hall).contains(&PLAYER_ITEM));
    assert_eq!(fresh.vm.variables[30], 1234);
    assert_eq!(fresh.time_events.len(), 1);

    std::fs::remove_dir_all(&dir).unwrap();
}
