use std::time::Duration;

use async_trait::async_trait;
use runtime::{
    EmptySeeder, Event, Result, Runtime, RuntimeConfig, RuntimeError, SeedRequest, Topic,
    TurnEnd, TurnSeeder,
};
use tokio::sync::broadcast;
use turn_core::{
    ActionContext, ActionError, Delay, DiagnosticCause, FnAction, Phase, SchedulerState,
    SchedulingError, Side, StepResult, Suspension, TurnEvent, TurnSeed, from_fn,
};

type World = Vec<String>;

fn record(
    name: &'static str,
) -> FnAction<World, impl FnMut(&mut ActionContext<'_, World>) -> StepResult + Send> {
    from_fn::<World, _>(name, move |ctx| {
        ctx.world_mut().push(name.to_string());
        Ok(Suspension::Done)
    })
}

/// Seeds `turns` turns, each recording its number, then ends the session.
struct ScriptedSeeder {
    turns: u64,
}

#[async_trait]
impl TurnSeeder<World> for ScriptedSeeder {
    async fn seed(&self, request: SeedRequest, world: &World) -> Result<Option<TurnSeed<World>>> {
        if request.turn > self.turns {
            return Ok(None);
        }
        assert_eq!(world.len() as u64, request.turn - 1, "snapshot is current");
        let name = from_fn::<World, _>("Record", move |ctx| {
            let entry = format!("turn {} ({})", ctx.turn_number(), ctx.side());
            ctx.world_mut().push(entry);
            Ok(Suspension::Done)
        });
        Ok(Some(TurnSeed::new(request.next_side()).with(Phase::Move, name)))
    }
}

async fn build(config: RuntimeConfig) -> Runtime<World> {
    Runtime::builder()
        .config(config)
        .world(World::new())
        .build()
        .await
        .expect("runtime builds")
}

async fn wait_for_end(rx: &mut broadcast::Receiver<Event>, turn: u64) -> TurnEvent {
    loop {
        match rx.recv().await.expect("turn stream open") {
            Event::Turn(event) if event.is_terminal() && event.turn() == turn => return event,
            _ => {}
        }
    }
}

#[tokio::test(start_paused = true)]
async fn run_plays_turns_until_seeder_ends_session() {
    let mut runtime = build(RuntimeConfig::default()).await;
    runtime.set_seeder(ScriptedSeeder { turns: 3 });

    let summaries = runtime.run().await.expect("session runs");

    assert_eq!(summaries.len(), 3);
    let sides: Vec<Side> = summaries.iter().map(|summary| summary.side).collect();
    assert_eq!(sides, [Side::Player, Side::Enemy, Side::Player]);
    assert!(
        summaries
            .iter()
            .all(|summary| matches!(summary.end, TurnEnd::Completed { .. }))
    );

    let world = runtime.handle().query_world().await.expect("world");
    assert_eq!(
        world,
        ["turn 1 (player)", "turn 2 (enemy)", "turn 3 (player)"]
    );
    assert_eq!(runtime.metrics().snapshot().turns_completed, 3);
    assert_eq!(runtime.metrics().snapshot().actions_completed, 3);

    runtime.shutdown().await.expect("clean shutdown");
}

#[tokio::test(start_paused = true)]
async fn run_stops_at_max_turns() {
    let config = RuntimeConfig {
        max_turns: Some(2),
        ..RuntimeConfig::default()
    };
    let mut runtime = Runtime::builder()
        .config(config)
        .world(World::new())
        .seeder(EmptySeeder)
        .build()
        .await
        .expect("runtime builds");

    let summaries = runtime.run().await.expect("session runs");

    assert_eq!(summaries.len(), 2);
    assert_eq!(summaries[1].turn, 2);
    runtime.shutdown().await.expect("clean shutdown");
}

#[tokio::test(start_paused = true)]
async fn play_turn_requires_seeder() {
    let mut runtime = build(RuntimeConfig::default()).await;

    let error = runtime.play_turn().await.expect_err("no seeder");
    assert!(matches!(error, RuntimeError::SeederNotSet));
}

#[tokio::test]
async fn build_requires_world() {
    let error = Runtime::<World>::builder()
        .build()
        .await
        .err()
        .expect("world is required");
    assert!(matches!(error, RuntimeError::MissingWorld));
}

#[tokio::test]
async fn build_rejects_invalid_scheduler_config() {
    let mut config = RuntimeConfig::default();
    config.scheduler.phases.clear();

    let error = Runtime::<World>::builder()
        .config(config)
        .world(World::new())
        .build()
        .await
        .err()
        .expect("empty phase order is invalid");
    assert!(matches!(error, RuntimeError::Config(_)));
}

#[tokio::test(start_paused = true)]
async fn handle_enqueues_into_active_turn() {
    let runtime = build(RuntimeConfig::default()).await;
    let handle = runtime.handle();
    let mut turn_rx = handle.subscribe(Topic::Turn);

    let seed =
        TurnSeed::new(Side::Player).with(Phase::Start, Delay::new(Duration::from_millis(200)));
    let turn = handle.advance_turn(seed).await.expect("turn starts");
    handle
        .enqueue(Phase::End, record("late"))
        .await
        .expect("end phase still ahead");

    let end = wait_for_end(&mut turn_rx, turn).await;
    assert!(matches!(end, TurnEvent::TurnEnded { .. }));
    assert_eq!(handle.query_world().await.expect("world"), ["late"]);
}

#[tokio::test(start_paused = true)]
async fn handle_rejects_enqueue_while_idle() {
    let runtime = build(RuntimeConfig::default()).await;
    let handle = runtime.handle();

    let error = handle
        .enqueue(Phase::Move, record("orphan"))
        .await
        .expect_err("no active turn");
    assert!(matches!(
        error,
        RuntimeError::Scheduling(SchedulingError::NoActiveTurn)
    ));

    let diagnostics = handle.diagnostics().await.expect("diagnostics");
    assert_eq!(diagnostics.len(), 1);
}

#[tokio::test(start_paused = true)]
async fn cancel_abandons_suspended_turn() {
    let runtime = build(RuntimeConfig::default()).await;
    let handle = runtime.handle();
    let mut turn_rx = handle.subscribe(Topic::Turn);

    let seed = TurnSeed::new(Side::Enemy)
        .with(Phase::Start, Delay::new(Duration::from_secs(60)))
        .with(Phase::End, record("never"));
    let turn = handle.advance_turn(seed).await.expect("turn starts");

    let error = handle.prepare_turn().await.expect_err("turn still running");
    assert!(matches!(error, RuntimeError::TurnInProgress { turn: running } if running == turn));

    tokio::time::sleep(Duration::from_millis(100)).await;
    assert_eq!(handle.cancel_turn().await.expect("cancel"), turn);

    let end = wait_for_end(&mut turn_rx, turn).await;
    assert_eq!(end, TurnEvent::TurnCancelled { turn, abandoned: 2 });

    let status = handle.status().await.expect("status");
    assert_eq!(status.state, SchedulerState::Idle);
    assert!(handle.query_world().await.expect("world").is_empty());
    assert_eq!(handle.metrics().snapshot().turns_cancelled, 1);
}

#[tokio::test(start_paused = true)]
async fn paused_clock_holds_suspended_turn() {
    let runtime = build(RuntimeConfig::default()).await;
    let handle = runtime.handle();
    let mut turn_rx = handle.subscribe(Topic::Turn);

    handle.set_paused(true).await.expect("pause");
    let seed = TurnSeed::new(Side::Player)
        .with(Phase::Start, Delay::new(Duration::from_millis(100)))
        .with(Phase::End, record("after"));
    let turn = handle.advance_turn(seed).await.expect("turn starts");

    tokio::time::sleep(Duration::from_secs(1)).await;
    let status = handle.status().await.expect("status");
    assert_eq!(status.turn, Some(turn));
    assert!(status.paused);
    assert_eq!(status.game_time, Duration::ZERO);
    assert!(status.suspension.is_some());

    handle.set_paused(false).await.expect("resume");
    wait_for_end(&mut turn_rx, turn).await;
    assert_eq!(handle.query_world().await.expect("world"), ["after"]);
}

#[tokio::test(start_paused = true)]
async fn invalid_speed_is_rejected() {
    let runtime = build(RuntimeConfig::default()).await;

    let error = runtime
        .handle()
        .set_speed(-1.0)
        .await
        .expect_err("negative speed");
    assert!(matches!(error, RuntimeError::Config(_)));
}

#[tokio::test(start_paused = true)]
async fn watchdog_reports_stalled_action_once() {
    let config = RuntimeConfig {
        watchdog_threshold: Some(Duration::from_millis(100)),
        ..RuntimeConfig::default()
    };
    let runtime = build(config).await;
    let handle = runtime.handle();
    let mut watchdog_rx = handle.subscribe(Topic::Watchdog);
    let mut turn_rx = handle.subscribe(Topic::Turn);

    let seed =
        TurnSeed::new(Side::Player).with(Phase::Start, Delay::new(Duration::from_secs(1)));
    let turn = handle.advance_turn(seed).await.expect("turn starts");

    let Event::Watchdog(report) = watchdog_rx.recv().await.expect("watchdog report") else {
        panic!("unexpected event on watchdog topic");
    };
    assert_eq!(report.turn, Some(turn));
    assert_eq!(report.action.name, "Delay");
    assert!(report.stalled_for >= Duration::from_millis(100));

    wait_for_end(&mut turn_rx, turn).await;
    assert!(matches!(
        watchdog_rx.try_recv(),
        Err(broadcast::error::TryRecvError::Empty)
    ));
    assert_eq!(handle.metrics().snapshot().stalls, 1);
}

#[tokio::test(start_paused = true)]
async fn faulting_action_is_published_as_diagnostic() {
    let runtime = build(RuntimeConfig::default()).await;
    let handle = runtime.handle();
    let mut diagnostics_rx = handle.subscribe(Topic::Diagnostics);
    let mut turn_rx = handle.subscribe(Topic::Turn);

    let fault = from_fn::<World, _>("Strike", |_| Err(ActionError::new("target vanished")));
    let seed = TurnSeed::new(Side::Player)
        .with(Phase::Action, fault)
        .with(Phase::End, record("cleanup"));
    let turn = handle.advance_turn(seed).await.expect("turn starts");

    let Event::Diagnostic(diagnostic) = diagnostics_rx.recv().await.expect("diagnostic") else {
        panic!("unexpected event on diagnostics topic");
    };
    assert_eq!(diagnostic.turn, Some(turn));
    assert_eq!(diagnostic.phase, Some(Phase::Action));
    assert!(matches!(
        diagnostic.cause,
        DiagnosticCause::ActionFailed { ref message } if message.contains("target vanished")
    ));

    wait_for_end(&mut turn_rx, turn).await;
    assert_eq!(handle.query_world().await.expect("world"), ["cleanup"]);
    assert_eq!(handle.metrics().snapshot().actions_faulted, 1);
}

#[test]
fn runtime_config_fills_missing_fields_with_defaults() {
    let config: RuntimeConfig =
        serde_json::from_str(r#"{ "max_turns": 5, "scheduler": { "speed": 2.0 } }"#)
            .expect("partial config parses");

    assert_eq!(config.max_turns, Some(5));
    assert_eq!(config.scheduler.speed, 2.0);
    assert_eq!(config.frame_interval, RuntimeConfig::default().frame_interval);
    assert_eq!(
        config.scheduler.phases,
        RuntimeConfig::default().scheduler.phases
    );
}
