//! End-to-end: a value written by one reactor's reaction is propagated
//! across a connection and observed by another reactor's reaction within
//! the same tag.

use std::sync::{Arc, Mutex};

use reactor_runtime::{Direction, EmptyState, Env, ReactionSpec, Scheduler};

#[test]
fn value_propagates_across_a_connection_in_the_same_tag() {
    let mut env = Env::new();

    let source = env.new_reactor("source", None, Box::new(EmptyState));
    let destination = env.new_reactor("destination", None, Box::new(EmptyState));

    let out_port = env.new_port::<i32>(source, "out", Direction::Output);
    let in_port = env.new_port::<i32>(destination, "in", Direction::Input);

    env.add_reaction(ReactionSpec {
        name: "emit".to_string(),
        reactor_key: source,
        trigger_ports: Vec::new(),
        trigger_actions: Vec::new(),
        triggers_startup: true,
        triggers_shutdown: false,
        source_ports: Vec::new(),
        effect_ports: vec![out_port],
        effect_actions: Vec::new(),
        deadline: None,
        is_mutation: false,
        body: Box::new(move |ctx| {
            ctx.set(out_port, 42).unwrap();
            ctx.request_stop();
        }),
    }).expect("unique writer per port");

    env.connect(out_port, in_port).expect("sibling output->input connection is legal");

    let received = Arc::new(Mutex::new(Vec::new()));
    let received_in_reaction = Arc::clone(&received);
    env.add_reaction(ReactionSpec {
        name: "receive".to_string(),
        reactor_key: destination,
        trigger_ports: vec![in_port],
        trigger_actions: Vec::new(),
        triggers_startup: false,
        triggers_shutdown: false,
        source_ports: Vec::new(),
        effect_ports: Vec::new(),
        effect_actions: Vec::new(),
        deadline: None,
        is_mutation: false,
        body: Box::new(move |ctx| {
            if let Some(value) = ctx.get(in_port).unwrap() {
                received_in_reaction.lock().unwrap().push(value);
            }
        }),
    }).expect("unique writer per port");

    let mut scheduler = Scheduler::new(env).expect("acyclic graph builds");
    let stats = scheduler.run().expect("run completes without error");

    assert_eq!(*received.lock().unwrap(), vec![42]);
    assert_eq!(stats.tags_processed, 2); // startup tag, then the shutdown tag
}

#[test]
fn destination_never_observes_a_value_without_a_connection() {
    let mut env = Env::new();

    let source = env.new_reactor("source", None, Box::new(EmptyState));
    let destination = env.new_reactor("destination", None, Box::new(EmptyState));

    let out_port = env.new_port::<i32>(source, "out", Direction::Output);
    let in_port = env.new_port::<i32>(destination, "in", Direction::Input);

    env.add_reaction(ReactionSpec {
        name: "emit".to_string(),
        reactor_key: source,
        trigger_ports: Vec::new(),
        trigger_actions: Vec::new(),
        triggers_startup: true,
        triggers_shutdown: false,
        source_ports: Vec::new(),
        effect_ports: vec![out_port],
        effect_actions: Vec::new(),
        deadline: None,
        is_mutation: false,
        body: Box::new(move |ctx| {
            ctx.set(out_port, 7).unwrap();
            ctx.request_stop();
        }),
    }).expect("unique writer per port");

    let received = Arc::new(Mutex::new(Vec::new()));
    let received_in_reaction = Arc::clone(&received);
    env.add_reaction(ReactionSpec {
        name: "receive".to_string(),
        reactor_key: destination,
        trigger_ports: vec![in_port],
        trigger_actions: Vec::new(),
        triggers_startup: false,
        triggers_shutdown: false,
        source_ports: Vec::new(),
        effect_ports: Vec::new(),
        effect_actions: Vec::new(),
        deadline: None,
        is_mutation: false,
        body: Box::new(move |ctx| {
            if let Some(value) = ctx.get(in_port).unwrap() {
                received_in_reaction.lock().unwrap().push(value);
            }
        }),
    }).expect("unique writer per port");

    let mut scheduler = Scheduler::new(env).expect("acyclic graph builds");
    scheduler.run().expect("run completes without error");

    assert!(received.lock().unwrap().is_empty());
}
