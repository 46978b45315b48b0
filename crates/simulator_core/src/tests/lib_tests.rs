use super::*;

fn simulator() -> Simulator {
    Simulator::new(SimulatorOptions {
        autoplay_interval: Duration::from_millis(50),
        ..SimulatorOptions::default()
    })
}

#[tokio::test]
async fn starts_on_map_reduce_with_default_preset() {
    let mut sim = simulator();
    let snapshot = sim.snapshot().await;
    assert_eq!(snapshot.module, Module::MapReduce);
    assert_eq!(snapshot.stage, Stage::Input);
    assert!(!snapshot.auto_play);
    assert_eq!(snapshot.lines.len(), 3);
    assert_eq!(snapshot.mapped.len(), 9);
    assert_eq!(
        sim.active_preset().map(|preset| preset.id),
        Some(catalog::DEFAULT_PRESET_ID.to_string())
    );
}

#[tokio::test]
async fn preset_selection_replaces_text_and_resets() {
    let mut sim = simulator();
    sim.jump_to(Stage::Shuffle).await;
    sim.select_preset("sales-agg").await.unwrap();

    let snapshot = sim.snapshot().await;
    assert_eq!(snapshot.stage, Stage::Input);
    let reduced: Vec<_> = snapshot.reduced.iter().map(|r| r.pair()).collect();
    assert_eq!(reduced, vec![("East", 300.0), ("North", 250.0), ("South", 250.0)]);
}

#[tokio::test]
async fn unknown_preset_is_rejected_without_side_effects() {
    let mut sim = simulator();
    sim.next().await;
    let err = sim.select_preset("nope").await.unwrap_err();
    assert_eq!(err, SimulatorError::UnknownPreset("nope".into()));
    assert_eq!(sim.sequencer().current().await, Stage::Split);
}

#[tokio::test]
async fn editing_input_keeps_stage_and_recomputes() {
    let mut sim = simulator();
    sim.jump_to(Stage::Reduce).await;
    sim.set_input("x 1\nx 2").unwrap();

    let snapshot = sim.snapshot().await;
    assert_eq!(snapshot.stage, Stage::Reduce);
    assert_eq!(snapshot.reduced.len(), 1);
    assert_eq!(snapshot.reduced[0].pair(), ("x", 3.0));
    assert!(sim.active_preset().is_none());
}

#[tokio::test]
async fn pipeline_is_reused_while_text_is_unchanged() {
    let mut sim = simulator();
    let first = sim.pipeline();
    let second = sim.pipeline();
    assert!(Arc::ptr_eq(&first, &second));

    sim.set_input("other").unwrap();
    assert!(!Arc::ptr_eq(&first, &sim.pipeline()));
}

#[tokio::test]
async fn input_is_locked_outside_map_reduce() {
    let mut sim = simulator();
    sim.select_module(Module::Hdfs).await;
    assert_eq!(
        sim.set_input("a b"),
        Err(SimulatorError::InputLocked(Module::Hdfs))
    );
    assert_eq!(
        sim.select_preset("sales-agg").await,
        Err(SimulatorError::PresetsUnavailable(Module::Hdfs))
    );
}

#[tokio::test]
async fn hive_view_still_offers_presets() {
    let mut sim = simulator();
    sim.select_module(Module::Hive).await;
    sim.select_preset("sales-agg").await.unwrap();
    assert_eq!(sim.active_preset().map(|p| p.id), Some("sales-agg".into()));
}

#[tokio::test(start_paused = true)]
async fn switching_module_stops_auto_play() {
    let mut sim = simulator();
    assert!(sim.toggle_auto_play().await);
    sim.select_module(Module::Yarn).await;
    assert!(!sim.sequencer().is_auto_playing().await);
    assert!(!sim.sequencer().has_active_timer().await);

    tokio::time::sleep(Duration::from_millis(200)).await;
    assert_eq!(sim.sequencer().current().await, Stage::Input);
}

#[tokio::test(start_paused = true)]
async fn reselecting_same_module_still_stops_auto_play() {
    let mut sim = simulator();
    sim.toggle_auto_play().await;
    sim.select_module(Module::MapReduce).await;
    assert!(!sim.sequencer().is_auto_playing().await);
}

#[tokio::test]
async fn auto_play_is_unavailable_outside_map_reduce() {
    let mut sim = simulator();
    sim.select_module(Module::HBase).await;
    assert!(!sim.toggle_auto_play().await);
    assert!(!sim.sequencer().has_active_timer().await);
}

#[tokio::test]
async fn apply_dispatches_commands() {
    let mut sim = simulator();
    let snapshot = sim
        .apply(SimulatorCommand::JumpTo {
            stage: Stage::Map,
        })
        .await
        .unwrap();
    assert_eq!(snapshot.stage, Stage::Map);

    let snapshot = sim.apply(SimulatorCommand::Next).await.unwrap();
    assert_eq!(snapshot.stage, Stage::Shuffle);

    let snapshot = sim
        .apply(SimulatorCommand::SetInput {
            text: "42".into(),
        })
        .await
        .unwrap();
    assert_eq!(snapshot.mapped[0].pair(), ("42", 1.0));

    let snapshot = sim.apply(SimulatorCommand::Reset).await.unwrap();
    assert_eq!(snapshot.stage, Stage::Input);
}

#[tokio::test]
async fn apply_surfaces_errors() {
    let mut sim = simulator();
    let err = sim
        .apply(SimulatorCommand::SelectPreset {
            preset_id: "missing".into(),
        })
        .await
        .unwrap_err();
    assert!(err.to_string().contains("missing"));
}

#[tokio::test]
async fn snapshot_serializes_for_renderer() {
    let mut sim = simulator();
    let value = serde_json::to_value(sim.snapshot().await).unwrap();
    assert_eq!(value["module"], "map_reduce");
    assert_eq!(value["stage"], "input");
    assert_eq!(value["groups"][0]["key"], "Apple");
    assert_eq!(value["groups"][0]["values"].as_array().unwrap().len(), 3);
}
