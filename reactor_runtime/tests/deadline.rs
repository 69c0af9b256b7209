//! A reaction's deadline handler runs in place of its body once physical
//! time has fallen behind the reaction's logical tag by more than the
//! deadline's duration.

use std::sync::{Arc, Mutex};

use reactor_runtime::{Deadline, EmptyState, Env, ReactionSpec, Scheduler, TimeValue};

#[test]
fn deadline_handler_runs_instead_of_the_body_once_exceeded() {
    let mut env = Env::new();
    let reactor = env.new_reactor("watcher", None, Box::new(EmptyState));

    let ran = Arc::new(Mutex::new(Vec::new()));
    let ran_in_body = Arc::clone(&ran);
    let ran_in_handler = Arc::clone(&ran);

    env.add_reaction(ReactionSpec {
        name: "slow".to_string(),
        reactor_key: reactor,
        trigger_ports: Vec::new(),
        trigger_actions: Vec::new(),
        triggers_startup: true,
        triggers_shutdown: false,
        source_ports: Vec::new(),
        effect_ports: Vec::new(),
        effect_actions: Vec::new(),
        deadline: Some(Deadline {
            duration: TimeValue::ZERO,
            handler: Box::new(move |ctx| {
                ran_in_handler.lock().unwrap().push("deadline");
                ctx.request_stop();
            }),
        }),
        is_mutation: false,
        body: Box::new(move |ctx| {
            ran_in_body.lock().unwrap().push("body");
            ctx.request_stop();
        }),
    }).expect("unique writer per port");

    let mut scheduler = Scheduler::new(env).expect("acyclic graph builds");
    scheduler.run().expect("run completes without error");

    assert_eq!(*ran.lock().unwrap(), vec!["deadline"]);
}

#[test]
fn deadline_never_fires_when_generous() {
    let mut env = Env::new();
    let reactor = env.new_reactor("watcher", None, Box::new(EmptyState));

    let ran = Arc::new(Mutex::new(Vec::new()));
    let ran_in_body = Arc::clone(&ran);
    let ran_in_handler = Arc::clone(&ran);

    env.add_reaction(ReactionSpec {
        name: "fast".to_string(),
        reactor_key: reactor,
        trigger_ports: Vec::new(),
        trigger_actions: Vec::new(),
        triggers_startup: true,
        triggers_shutdown: false,
        source_ports: Vec::new(),
        effect_ports: Vec::new(),
        effect_actions: Vec::new(),
        deadline: Some(Deadline {
            duration: TimeValue::from_seconds(3600),
            handler: Box::new(move |ctx| {
                ran_in_handler.lock().unwrap().push("deadline");
                ctx.request_stop();
            }),
        }),
        is_mutation: false,
        body: Box::new(move |ctx| {
            ran_in_body.lock().unwrap().push("body");
            ctx.request_stop();
        }),
    }).expect("unique writer per port");

    let mut scheduler = Scheduler::new(env).expect("acyclic graph builds");
    scheduler.run().expect("run completes without error");

    assert_eq!(*ran.lock().unwrap(), vec!["body"]);
}
