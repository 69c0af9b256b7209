//! `run_to_completion` is just `Scheduler::new(env)?.run()`; this exercises
//! it end to end rather than re-testing scheduler internals already covered
//! in `reactor_runtime`.

use std::sync::{Arc, Mutex};

use reactor_rt::{run_to_completion, Direction, EmptyState, Env, ReactionSpec};

#[test]
fn runs_a_startup_reaction_and_reports_stats() {
    let mut env = Env::new();
    let reactor = env.new_reactor("greeter", None, Box::new(EmptyState));
    let out_port = env.new_port::<i32>(reactor, "out", Direction::Output);

    let sent = Arc::new(Mutex::new(Vec::new()));
    let sent_in_reaction = Arc::clone(&sent);
    env.add_reaction(ReactionSpec {
        name: "greet".to_string(),
        reactor_key: reactor,
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
            sent_in_reaction.lock().unwrap().push(7);
            ctx.request_stop();
        }),
    }).expect("unique writer per port");

    let stats = run_to_completion(env).expect("run completes without error");

    assert_eq!(*sent.lock().unwrap(), vec![7]);
    assert_eq!(stats.reactions_invoked, 1);
    assert_eq!(stats.tags_processed, 1);
}
