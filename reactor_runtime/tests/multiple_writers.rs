//! At most one reaction may write a given port. A second reaction declaring
//! the same effect port must be rejected at `add_reaction` time rather than
//! silently racing the first at run time.

use reactor_runtime::{Direction, EmptyState, Env, ReactionSpec, RuntimeError};

#[test]
fn a_second_reaction_writing_the_same_port_is_rejected() {
    let mut env = Env::new();
    let reactor = env.new_reactor("writer", None, Box::new(EmptyState));
    let out_port = env.new_port::<i32>(reactor, "out", Direction::Output);

    let first = env
        .add_reaction(ReactionSpec {
            name: "first".to_string(),
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
                ctx.set(out_port, 1).unwrap();
            }),
        })
        .expect("first writer is fine");

    let result = env.add_reaction(ReactionSpec {
        name: "second".to_string(),
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
            ctx.set(out_port, 2).unwrap();
        }),
    });

    match result {
        Err(RuntimeError::MultipleWriters { port, existing }) => {
            assert_eq!(port, out_port);
            assert_eq!(existing, first);
        }
        other => panic!("expected MultipleWriters, got {other:?}"),
    }
}
