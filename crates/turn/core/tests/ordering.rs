use std::time::Duration;

use proptest::prelude::*;
use turn_core::{
    ActionError, Phase, SchedulerConfig, Side, Suspension, TurnEvent, TurnScheduler, TurnSeed,
    from_fn,
};

type Trace = Vec<(Phase, u32)>;

const PHASES: [Phase; 4] = [Phase::Start, Phase::Move, Phase::Action, Phase::End];
const CHILD: u32 = 1_000;

fn seeded_action(
    phase: Phase,
    label: u32,
    spawns_child: bool,
    suspends: bool,
) -> impl turn_core::Action<Trace> {
    let mut waited = !suspends;
    from_fn::<Trace, _>("Seeded", move |ctx| {
        if !waited {
            waited = true;
            return Ok(Suspension::Continue);
        }
        ctx.world_mut().push((phase, label));
        if spawns_child {
            ctx.enqueue(
                phase,
                from_fn::<Trace, _>("Child", move |ctx| {
                    ctx.world_mut().push((phase, CHILD + label));
                    Ok(Suspension::Done)
                }),
            )
            .map_err(|error| ActionError::with_source("child rejected", error))?;
        }
        Ok(Suspension::Done)
    })
}

proptest! {
    /// Phases run in declared order and each queue drains strictly FIFO,
    /// re-entrant enqueues landing behind everything queued before them.
    #[test]
    fn execution_follows_phase_order_and_fifo(
        entries in prop::collection::vec((0usize..4, any::<bool>(), any::<bool>()), 0..40),
        budget in 1usize..8,
    ) {
        let mut scheduler = TurnScheduler::<Trace>::new(
            SchedulerConfig::new().with_max_steps_per_tick(budget),
        )
        .unwrap();

        let mut seed = TurnSeed::new(Side::Enemy);
        for (label, (phase_index, spawns_child, suspends)) in entries.iter().enumerate() {
            let phase = PHASES[*phase_index];
            seed.push(phase, seeded_action(phase, label as u32, *spawns_child, *suspends));
        }
        scheduler.advance_turn(seed).unwrap();

        let mut trace = Trace::new();
        let mut ticks = 0;
        while scheduler.is_turn_active() {
            scheduler.tick(&mut trace, Duration::from_millis(16));
            ticks += 1;
            prop_assert!(ticks < 10_000);
        }

        let mut expected = Trace::new();
        for (index, phase) in PHASES.iter().enumerate() {
            let seeded: Vec<u32> = entries
                .iter()
                .enumerate()
                .filter(|(_, (phase_index, _, _))| *phase_index == index)
                .map(|(label, _)| label as u32)
                .collect();
            expected.extend(seeded.iter().map(|label| (*phase, *label)));
            expected.extend(
                seeded
                    .iter()
                    .filter(|label| entries[**label as usize].1)
                    .map(|label| (*phase, CHILD + label)),
            );
        }
        prop_assert_eq!(&trace, &expected);
        prop_assert_eq!(scheduler.diagnostic_count(), 0);

        let entered: Vec<Phase> = scheduler
            .drain_events()
            .into_iter()
            .filter_map(|event| match event {
                TurnEvent::PhaseEntered { phase, .. } => Some(phase),
                _ => None,
            })
            .collect();
        prop_assert_eq!(entered, PHASES.to_vec());
    }

    /// Enqueueing is accepted exactly for the active phase and later ones.
    #[test]
    fn enqueue_accepts_only_current_and_later_phases(active in 0usize..4, target in 0usize..4) {
        let mut scheduler = TurnScheduler::<Trace>::new(SchedulerConfig::default()).unwrap();
        scheduler.advance_turn(TurnSeed::new(Side::Player)).unwrap();
        if active > 0 {
            scheduler.request_phase_jump(PHASES[active]).unwrap();
        }
        prop_assert_eq!(scheduler.current_phase(), Some(PHASES[active]));

        let result = scheduler.enqueue(
            PHASES[target],
            from_fn::<Trace, _>("Probe", |_| Ok(Suspension::Done)),
        );
        prop_assert_eq!(result.is_ok(), target >= active);
        prop_assert_eq!(scheduler.diagnostic_count(), usize::from(target < active));
    }
}
