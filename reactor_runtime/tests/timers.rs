//! A periodic timer rearms itself and keeps driving its trigger reaction
//! until the reaction itself asks the run to stop.

use std::sync::{Arc, Mutex};

use reactor_runtime::{Direction, EmptyState, Env, ReactionSpec, Scheduler, TimeValue};

#[test]
fn periodic_timer_fires_repeatedly_until_stopped() {
    let mut env = Env::new();
    let reactor = env.new_reactor("ticker", None, Box::new(EmptyState));

    let timer = env.new_timer(reactor, "tick", TimeValue::ZERO, TimeValue::from_millis(1));

    let ticks = Arc::new(Mutex::new(0u32));
    let ticks_in_reaction = Arc::clone(&ticks);
    env.add_reaction(ReactionSpec {
        name: "on_tick".to_string(),
        reactor_key: reactor,
        trigger_ports: Vec::new(),
        trigger_actions: vec![timer],
        triggers_startup: false,
        triggers_shutdown: false,
        source_ports: Vec::new(),
        effect_ports: Vec::new(),
        effect_actions: Vec::new(),
        deadline: None,
        is_mutation: false,
        body: Box::new(move |ctx| {
            let mut count = ticks_in_reaction.lock().unwrap();
            *count += 1;
            if *count >= 3 {
                ctx.request_stop();
            }
        }),
    }).expect("unique writer per port");

    let mut scheduler = Scheduler::new(env).expect("acyclic graph builds");
    scheduler.run().expect("run completes without error");

    assert_eq!(*ticks.lock().unwrap(), 3);
}

#[test]
fn a_reaction_triggered_by_two_simultaneous_timers_runs_once_per_tag() {
    let mut env = Env::new();
    let reactor = env.new_reactor("cuckoo", None, Box::new(EmptyState));

    let hour = env.new_timer(reactor, "hour", TimeValue::ZERO, TimeValue::from_millis(1));
    let half = env.new_timer(reactor, "half", TimeValue::ZERO, TimeValue::from_millis(1));

    let runs = Arc::new(Mutex::new(0u32));
    let seen_both = Arc::new(Mutex::new(0u32));
    let runs_in_reaction = Arc::clone(&runs);
    let seen_both_in_reaction = Arc::clone(&seen_both);
    env.add_reaction(ReactionSpec {
        name: "cuckoo".to_string(),
        reactor_key: reactor,
        trigger_ports: Vec::new(),
        trigger_actions: vec![hour, half],
        triggers_startup: false,
        triggers_shutdown: false,
        source_ports: Vec::new(),
        effect_ports: Vec::new(),
        effect_actions: Vec::new(),
        deadline: None,
        is_mutation: false,
        body: Box::new(move |ctx| {
            let hour_present = ctx.get_action::<()>(hour).unwrap().is_some();
            let half_present = ctx.get_action::<()>(half).unwrap().is_some();
            if hour_present && half_present {
                *seen_both_in_reaction.lock().unwrap() += 1;
            }
            let mut count = runs_in_reaction.lock().unwrap();
            *count += 1;
            if *count >= 3 {
                ctx.request_stop();
            }
        }),
    })
    .expect("unique writer per port");

    let mut scheduler = Scheduler::new(env).expect("acyclic graph builds");
    scheduler.run().expect("run completes without error");

    assert_eq!(*runs.lock().unwrap(), 3, "one invocation per tag, not one per timer");
    assert_eq!(*seen_both.lock().unwrap(), 3, "both timers must be present at every tag");
}
