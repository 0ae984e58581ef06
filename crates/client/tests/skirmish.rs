use runtime::TurnEnd;
use tactics_client::{Client, ClientConfig, Skirmish};
use turn_core::Side;

fn config(max_turns: u64) -> ClientConfig {
    let mut config = ClientConfig::default();
    config.runtime.max_turns = Some(max_turns);
    config.skirmish.grid_size = 5;
    config.skirmish.effect_polls = 2;
    config
}

#[tokio::test(start_paused = true)]
async fn invincible_player_survives_turn_limit() {
    let mut config = config(6);
    config.overrides.invincible = true;

    let report = Client::builder()
        .config(config)
        .build()
        .await
        .unwrap()
        .run()
        .await
        .unwrap();

    assert_eq!(report.turns.len(), 6);
    let sides: Vec<Side> = report.turns.iter().map(|turn| turn.side).collect();
    assert_eq!(
        sides,
        [Side::Player, Side::Enemy, Side::Player, Side::Enemy, Side::Player, Side::Enemy]
    );
    assert!(
        report
            .turns
            .iter()
            .all(|turn| matches!(turn.end, TurnEnd::Completed { .. }))
    );
    assert_eq!(report.world.player.health, Skirmish::PLAYER_HEALTH);
    assert!(report.world.spawned() > 0);
    assert!(report.diagnostics.is_empty());
    assert_eq!(report.metrics.turns_completed, 6);
}

#[tokio::test(start_paused = true)]
async fn killing_blow_ends_the_session() {
    let mut world = Skirmish::new(5);
    let enemy = world.spawn_enemy().unwrap();
    while world.enemy(enemy).unwrap().position.distance(world.player.position) > 1 {
        world.advance_enemy(enemy);
    }
    world.player.health = 2;

    let mut config = config(10);
    config.skirmish.seeder.enemy_damage = 2;

    let report = Client::builder()
        .config(config)
        .world(world)
        .build()
        .await
        .unwrap()
        .run()
        .await
        .unwrap();

    // Player strikes first, the enemy answers with the killing blow and the
    // seeder ends the session before turn three.
    assert_eq!(report.turns.len(), 2);
    assert_eq!(report.turns[1].side, Side::Enemy);
    assert_eq!(report.world.player.health, 0);
    assert_eq!(
        report.world.enemy(enemy).unwrap().health,
        Skirmish::ENEMY_HEALTH - 3
    );
}

#[tokio::test(start_paused = true)]
async fn report_serializes_to_json() {
    let report = Client::builder()
        .config(config(2))
        .build()
        .await
        .unwrap()
        .run()
        .await
        .unwrap();

    let json = serde_json::to_value(&report).unwrap();
    assert_eq!(json["turns"].as_array().map(Vec::len), Some(2));
    assert_eq!(json["turns"][0]["side"], "player");
    assert_eq!(json["turns"][0]["end"]["end"], "completed");
    assert!(json["metrics"]["ticks"].as_u64().unwrap() > 0);
}
