//! A connection that would close a cycle in the reaction precedence graph
//! must be rejected, and rejection must leave the graph exactly as it was.

use reactor_runtime::{Direction, EmptyState, Env, ReactionSpec, RuntimeError};

fn passthrough_reaction(
    env: &mut Env,
    reactor: reactor_runtime::ReactorKey,
    name: &str,
    input: reactor_runtime::PortKey,
    output: reactor_runtime::PortKey,
) {
    env.add_reaction(ReactionSpec {
        name: name.to_string(),
        reactor_key: reactor,
        trigger_ports: vec![input],
        trigger_actions: Vec::new(),
        triggers_startup: false,
        triggers_shutdown: false,
        source_ports: Vec::new(),
        effect_ports: vec![output],
        effect_actions: Vec::new(),
        deadline: None,
        is_mutation: false,
        body: Box::new(move |ctx| {
            if let Some(v) = ctx.get::<i32>(input).unwrap() {
                ctx.set(output, v).unwrap();
            }
        }),
    }).expect("unique writer per port");
}

#[test]
fn connect_rejects_a_connection_that_closes_a_cycle() {
    let mut env = Env::new();

    let a = env.new_reactor("a", None, Box::new(EmptyState));
    let b = env.new_reactor("b", None, Box::new(EmptyState));

    let a_in = env.new_port::<i32>(a, "in", Direction::Input);
    let a_out = env.new_port::<i32>(a, "out", Direction::Output);
    let b_in = env.new_port::<i32>(b, "in", Direction::Input);
    let b_out = env.new_port::<i32>(b, "out", Direction::Output);

    passthrough_reaction(&mut env, a, "a_react", a_in, a_out);
    passthrough_reaction(&mut env, b, "b_react", b_in, b_out);

    env.connect(a_out, b_in).expect("a -> b is acyclic");

    let before = env.precedence_graph_snapshot();
    let result = env.connect(b_out, a_in);
    assert!(matches!(result, Err(RuntimeError::CycleIntroduced)));

    let after = env.precedence_graph_snapshot();
    assert_eq!(before, after, "a rejected connection must not mutate the graph");
}

#[test]
fn can_connect_reports_a_would_be_cycle_without_mutating_anything() {
    let mut env = Env::new();

    let a = env.new_reactor("a", None, Box::new(EmptyState));
    let b = env.new_reactor("b", None, Box::new(EmptyState));

    let a_in = env.new_port::<i32>(a, "in", Direction::Input);
    let a_out = env.new_port::<i32>(a, "out", Direction::Output);
    let b_in = env.new_port::<i32>(b, "in", Direction::Input);
    let b_out = env.new_port::<i32>(b, "out", Direction::Output);

    passthrough_reaction(&mut env, a, "a_react", a_in, a_out);
    passthrough_reaction(&mut env, b, "b_react", b_in, b_out);

    assert!(env.can_connect(a_out, b_in));
    env.connect(a_out, b_in).unwrap();

    assert!(!env.can_connect(b_out, a_in));
}
